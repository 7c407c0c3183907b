//! Documents and source contexts
//!
//! A `Document` holds a piece of original source text and the place it came
//! from. A `SourceContext` points at a region of a document and is attached to
//! IR nodes purely for diagnostics.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable source text with an optional origin file and starting line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDocument", into = "RawDocument")]
pub struct Document {
    /// Origin file name, if the text came from a file
    pub name: Option<String>,
    /// Line number (1-indexed) of the first line of `text`
    pub start_line: u32,
    /// The source text itself
    pub text: String,
    /// Offset of each line (for fast lookup)
    line_starts: Vec<usize>,
}

/// Serialized form of a document; line offsets are rebuilt on load
#[derive(Serialize, Deserialize)]
struct RawDocument {
    name: Option<String>,
    start_line: u32,
    text: String,
}

impl From<RawDocument> for Document {
    fn from(raw: RawDocument) -> Self {
        Document::new(raw.name, raw.start_line, raw.text)
    }
}

impl From<Document> for RawDocument {
    fn from(doc: Document) -> Self {
        RawDocument {
            name: doc.name,
            start_line: doc.start_line,
            text: doc.text,
        }
    }
}

impl Document {
    pub fn new(name: Option<String>, start_line: u32, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            name,
            start_line,
            text,
            line_starts,
        }
    }

    /// Name used when rendering diagnostics
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<snippet>")
    }

    /// Converts a byte offset into a position
    pub fn position_of(&self, offset: usize) -> Position {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line_idx).copied().unwrap_or(0);
        let column = self
            .text
            .get(line_start..offset.min(self.text.len()))
            .map(|s| s.chars().count())
            .unwrap_or(0);

        Position {
            line: self.start_line + line_idx as u32,
            column: column as u32 + 1,
            offset,
        }
    }

    /// Returns the text of a line, numbered the way `start_line` numbers them
    pub fn get_line(&self, line: u32) -> Option<&str> {
        let line_idx = line.checked_sub(self.start_line)? as usize;
        let start = *self.line_starts.get(line_idx)?;
        let end = self
            .line_starts
            .get(line_idx + 1)
            .map(|&e| e.saturating_sub(1))
            .unwrap_or(self.text.len());

        Some(&self.text[start..end])
    }
}

/// A position in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Line (1-indexed, offset by the document's start line)
    pub line: u32,
    /// Column (1-indexed)
    pub column: u32,
    /// Byte offset from the beginning of the document
    pub offset: usize,
}

/// A region of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceContext {
    pub document: Arc<Document>,
    pub offset: usize,
    pub length: usize,
}

impl SourceContext {
    pub fn new(document: Arc<Document>, offset: usize, length: usize) -> Self {
        Self {
            document,
            offset,
            length,
        }
    }

    /// A context covering the whole document
    pub fn whole(document: Arc<Document>) -> Self {
        let length = document.text.len();
        Self {
            document,
            offset: 0,
            length,
        }
    }

    pub fn start(&self) -> Position {
        self.document.position_of(self.offset)
    }

    pub fn end(&self) -> Position {
        self.document.position_of(self.offset + self.length)
    }

    /// The covered text
    pub fn text(&self) -> &str {
        let end = (self.offset + self.length).min(self.document.text.len());
        self.document.text.get(self.offset..end).unwrap_or("")
    }
}

/// Creates documents for snippets and compilation units
pub trait DocumentFactory {
    fn create(&self, file_name: Option<&str>, start_line: u32, text: &str) -> Arc<Document>;
}

/// Allocates a fresh document for every request
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDocumentFactory;

impl DocumentFactory for DefaultDocumentFactory {
    fn create(&self, file_name: Option<&str>, start_line: u32, text: &str) -> Arc<Document> {
        Arc::new(Document::new(file_name.map(str::to_string), start_line, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_respects_start_line() {
        let doc = Document::new(Some("gen.cs".to_string()), 10, "int x;\nint y;");
        let pos = doc.position_of(11);
        assert_eq!(pos.line, 11);
        assert_eq!(pos.column, 5);
    }

    #[test]
    fn test_whole_context() {
        let doc = Arc::new(Document::new(None, 1, "a = b;"));
        let ctx = SourceContext::whole(doc);
        assert_eq!(ctx.length, 6);
        assert_eq!(ctx.text(), "a = b;");
        assert_eq!(ctx.document.display_name(), "<snippet>");
    }

    #[test]
    fn test_get_line() {
        let doc = Document::new(None, 3, "first\nsecond\nthird");
        assert_eq!(doc.get_line(4), Some("second"));
        assert_eq!(doc.get_line(2), None);
    }
}
