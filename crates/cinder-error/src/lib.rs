//! cinder-error - Diagnostics for the Cinder middle-end
//!
//! User-facing problems (unrecognized code tree shapes, unresolvable
//! assembly references) are recorded in an [`ErrorSink`] and never abort a
//! run. Invariant violations inside the pipeline itself are reported as
//! [`InternalError`] values and are the only thing that stops a unit.
//!
//! # Example
//!
//! ```rust
//! use cinder_error::{Diagnostic, DiagnosticRenderer, ErrorKind, ErrorSink};
//!
//! let mut errors = ErrorSink::new();
//! errors.report(ErrorKind::ReferenceResolution, "Contracts.Lib", None);
//!
//! assert!(errors.has_errors());
//! let renderer = DiagnosticRenderer::new().without_colors();
//! println!("{}", errors.render(&renderer));
//! ```

pub mod diagnostic;
pub mod document;

pub use diagnostic::{Diagnostic, DiagnosticRenderer, ErrorCode, ErrorKind, Level};
pub use document::{DefaultDocumentFactory, Document, DocumentFactory, Position, SourceContext};

use thiserror::Error;

/// Result type for operations that can only fail on an internal invariant
pub type Result<T> = std::result::Result<T, InternalError>;

/// Violation of an invariant that an earlier phase should have established
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("well-known symbol `{0}` is missing from the type universe")]
    MissingWellKnown(String),

    #[error("module id {0} does not name a module in the universe")]
    DanglingModule(String),

    #[error("type id {0} does not name a type in the universe")]
    DanglingType(String),

    #[error("member {index} does not exist on type {ty}")]
    DanglingMember { ty: String, index: usize },

    #[error("body of `{0}` was reattached while another body is present")]
    BodyConflict(String),
}

/// Failure reported by a reference resolver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("assembly `{0}` was not found")]
    NotFound(String),

    #[error("assembly `{name}` could not be loaded: {reason}")]
    Unreadable { name: String, reason: String },
}

impl ResolveError {
    /// The assembly name the failure refers to
    pub fn assembly_name(&self) -> &str {
        match self {
            ResolveError::NotFound(name) => name,
            ResolveError::Unreadable { name, .. } => name,
        }
    }
}

/// Append-only collection of diagnostics accumulated during a run
#[derive(Debug, Default, Clone)]
pub struct ErrorSink {
    items: Vec<Diagnostic>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Records an error of the given kind
    pub fn report(
        &mut self,
        kind: ErrorKind,
        argument: impl Into<String>,
        source: Option<SourceContext>,
    ) {
        self.items
            .push(Diagnostic::error(kind, argument).with_source(source));
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.level == Level::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Number of recorded diagnostics of a kind
    pub fn count(&self, kind: ErrorKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Renders all diagnostics
    pub fn render(&self, renderer: &DiagnosticRenderer) -> String {
        self.items
            .iter()
            .map(|d| renderer.render(d))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl IntoIterator for ErrorSink {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorSink {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_is_append_only_and_ordered() {
        let mut sink = ErrorSink::new();
        sink.report(ErrorKind::StructuralTranslation, "CodeFooMember", None);
        sink.report(ErrorKind::ReferenceResolution, "Missing.Lib", None);

        assert_eq!(sink.len(), 2);
        assert!(sink.has_errors());
        assert_eq!(sink.count(ErrorKind::ReferenceResolution), 1);

        let arguments: Vec<_> = sink.iter().map(|d| d.argument.as_str()).collect();
        assert_eq!(arguments, ["CodeFooMember", "Missing.Lib"]);
    }

    #[test]
    fn test_warnings_are_not_errors() {
        let mut sink = ErrorSink::new();
        sink.push(Diagnostic::warning(ErrorKind::ReferenceResolution, "Old.Lib"));
        assert!(!sink.has_errors());
        assert!(!sink.is_empty());
    }

    #[test]
    fn test_internal_error_messages() {
        let err = InternalError::MissingWellKnown("Microsoft.Contracts.Guard".to_string());
        assert_eq!(
            err.to_string(),
            "well-known symbol `Microsoft.Contracts.Guard` is missing from the type universe"
        );
        let err = ResolveError::NotFound("System.Xml".to_string());
        assert_eq!(err.assembly_name(), "System.Xml");
    }
}
