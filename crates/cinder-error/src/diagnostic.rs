//! Diagnostic - structured errors recorded by the middle-end
//!
//! Every user-facing problem is a `Diagnostic`: an error kind with a stable
//! code, the contextual argument (the offending node kind, the assembly name,
//! ...) and an optional source context. Rendering mimics the rustc layout.

use crate::document::SourceContext;
use std::fmt;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Recorded problem; the caller decides whether to keep going
    Error,
    /// Does not block later passes
    Warning,
    /// Additional information
    Note,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Note => "note",
        }
    }

    /// Returns the ANSI code for coloring (if terminal supports it)
    pub fn color_code(&self) -> &'static str {
        match self {
            Level::Error => "\x1b[1;31m",   // Bold Red
            Level::Warning => "\x1b[1;33m", // Bold Yellow
            Level::Note => "\x1b[1;36m",    // Bold Cyan
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kinds of recoverable problems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A code tree node whose shape the translator does not know
    StructuralTranslation,
    /// A referenced assembly that could not be resolved
    ReferenceResolution,
}

impl ErrorKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            ErrorKind::StructuralTranslation => ErrorCode::DID_NOT_EXPECT,
            ErrorKind::ReferenceResolution => ErrorCode::UNRESOLVED_REFERENCE,
        }
    }

    /// Message template; `{0}` is replaced by the diagnostic argument
    pub fn template(&self) -> &'static str {
        match self {
            ErrorKind::StructuralTranslation => "did not expect a node of kind `{0}`",
            ErrorKind::ReferenceResolution => "could not resolve assembly reference `{0}`",
        }
    }
}

/// Structured error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode {
    /// Category (T = Translation, R = References)
    pub category: char,
    /// Error number
    pub number: u16,
}

impl ErrorCode {
    pub const fn new(category: char, number: u16) -> Self {
        Self { category, number }
    }

    // Translation errors
    pub const DID_NOT_EXPECT: Self = Self::new('T', 1);

    // Reference errors
    pub const UNRESOLVED_REFERENCE: Self = Self::new('R', 1);
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}{:03}", self.category, self.number)
    }
}

/// A complete diagnostic
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: Level,
    pub kind: ErrorKind,
    /// Contextual argument substituted into the message
    pub argument: String,
    pub source: Option<SourceContext>,
    /// Additional notes
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(kind: ErrorKind, argument: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            kind,
            argument: argument.into(),
            source: None,
            notes: Vec::new(),
        }
    }

    pub fn warning(kind: ErrorKind, argument: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            ..Self::error(kind, argument)
        }
    }

    pub fn with_source(mut self, source: Option<SourceContext>) -> Self {
        self.source = source;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    pub fn message(&self) -> String {
        self.kind.template().replace("{0}", &self.argument)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.level, self.code(), self.message())
    }
}

/// Renders a diagnostic for display
pub struct DiagnosticRenderer {
    use_colors: bool,
}

impl Default for DiagnosticRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticRenderer {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Renders the diagnostic as a string
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();

        // Line 1: error[ET001]: message
        let reset = if self.use_colors { "\x1b[0m" } else { "" };
        let color = if self.use_colors {
            diagnostic.level.color_code()
        } else {
            ""
        };
        let bold = if self.use_colors { "\x1b[1m" } else { "" };
        let blue = if self.use_colors { "\x1b[1;34m" } else { "" };

        output.push_str(color);
        output.push_str(diagnostic.level.as_str());
        output.push('[');
        output.push_str(&diagnostic.code().to_string());
        output.push(']');
        output.push_str(reset);
        output.push_str(bold);
        output.push_str(": ");
        output.push_str(&diagnostic.message());
        output.push_str(reset);
        output.push('\n');

        if let Some(source) = &diagnostic.source {
            let start = source.start();
            let end = source.end();
            let document = &source.document;

            // --> file:line:column
            output.push_str(&format!(
                " {}-->{} {}:{}:{}\n",
                blue,
                reset,
                document.display_name(),
                start.line,
                start.column
            ));

            if let Some(line_content) = document.get_line(start.line) {
                let line_num_width = start.line.to_string().len();
                let padding = " ".repeat(line_num_width);

                output.push_str(&format!(" {} {}|{}\n", padding, blue, reset));
                output.push_str(&format!(
                    " {}{}{} |{} {}\n",
                    blue, start.line, reset, reset, line_content
                ));

                let col_start = start.column as usize;
                let underline_len = if start.line == end.line {
                    (end.column.saturating_sub(start.column)).max(1) as usize
                } else {
                    line_content.len().saturating_sub(col_start - 1).max(1)
                };
                let spaces = " ".repeat(col_start.saturating_sub(1));
                let underline = "^".repeat(underline_len);

                output.push_str(&format!(
                    " {} {}|{} {}{}{}{}\n",
                    padding, blue, reset, spaces, color, underline, reset
                ));
            }
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("   = {}note{}: {}\n", bold, reset, note));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use std::sync::Arc;

    #[test]
    fn test_diagnostic_rendering() {
        let doc = Arc::new(Document::new(
            Some("Widget.cs".to_string()),
            1,
            "class Widget {\n  int x = $;\n}",
        ));
        let source = SourceContext::new(doc, 25, 1);

        let diagnostic = Diagnostic::error(ErrorKind::StructuralTranslation, "CodeDollarExpression")
            .with_source(Some(source))
            .with_note("the node was skipped");

        let renderer = DiagnosticRenderer::new().without_colors();
        let output = renderer.render(&diagnostic);

        assert!(output.contains("error[ET001]"));
        assert!(output.contains("`CodeDollarExpression`"));
        assert!(output.contains("Widget.cs:2:11"));
        assert!(output.contains("note: the node was skipped"));
    }

    #[test]
    fn test_display_without_source() {
        let diagnostic = Diagnostic::error(ErrorKind::ReferenceResolution, "Contracts.Lib");
        assert_eq!(
            diagnostic.to_string(),
            "error[ER001]: could not resolve assembly reference `Contracts.Lib`"
        );
    }
}
