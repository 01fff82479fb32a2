//! Uploaded study documents.
//!
//! A document is the extracted text of one uploaded file. Documents are
//! immutable once created and live only as long as the session that
//! ingested them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ExtractionError;

/// Number of characters shown in document previews.
pub const PREVIEW_CHARS: usize = 500;

/// Session-scoped document identifier.
///
/// Assigned in upload order, so ordering by id is ordering by upload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Declared format of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Plain UTF-8 text.
    Text,
    /// Markdown, read as plain text.
    Markdown,
    /// Office Open XML word processing document.
    Docx,
    /// Page-based PDF document.
    Pdf,
}

impl DocumentFormat {
    /// All formats recognized by the extractor.
    pub const ALL: [Self; 4] = [Self::Text, Self::Markdown, Self::Docx, Self::Pdf];

    /// Returns the canonical short name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Markdown => "md",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    /// Infers the format from a file name's extension.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnsupportedFormat`] for unknown or missing extensions.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let extension = std::path::Path::new(filename)
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        extension.parse()
    }
}

impl FromStr for DocumentFormat {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "txt" | "text" | "plain" | "text/plain" => Ok(Self::Text),
            "md" | "markdown" | "text/markdown" => Ok(Self::Markdown),
            "docx"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Ok(Self::Docx)
            }
            "pdf" | "application/pdf" => Ok(Self::Pdf),
            _ => Err(ExtractionError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The extracted text of one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Session-scoped identifier.
    pub id: DocumentId,

    /// Original file name.
    pub filename: String,

    /// Format the text was extracted from.
    pub format: DocumentFormat,

    /// Extracted text.
    pub raw_text: String,

    /// Unix timestamp when the document was ingested.
    pub created_at: i64,
}

impl Document {
    /// Creates a new document.
    ///
    /// # Examples
    ///
    /// ```
    /// use casewise::core::{Document, DocumentFormat, DocumentId};
    ///
    /// let doc = Document::new(DocumentId(1), "notes.txt", DocumentFormat::Text, "ADHD notes".to_string());
    /// assert_eq!(doc.size(), 10);
    /// ```
    #[must_use]
    pub fn new(id: DocumentId, filename: &str, format: DocumentFormat, raw_text: String) -> Self {
        Self {
            id,
            filename: filename.to_string(),
            format,
            raw_text,
            created_at: current_timestamp(),
        }
    }

    /// Returns the size of the text in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.raw_text.len()
    }

    /// Returns the first `max_chars` characters, with an ellipsis when truncated.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.raw_text, max_chars)
    }

    /// Builds a summary of this document for display.
    #[must_use]
    pub fn summary(&self, chunk_count: usize) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            filename: self.filename.clone(),
            format: self.format,
            size: self.size(),
            chunks: chunk_count,
            preview: self.preview(PREVIEW_CHARS),
        }
    }
}

/// What the caller sees after a document has been processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Session-scoped identifier.
    pub id: DocumentId,
    /// Original file name.
    pub filename: String,
    /// Declared format.
    pub format: DocumentFormat,
    /// Text size in bytes.
    pub size: usize,
    /// Number of chunks produced.
    pub chunks: usize,
    /// Leading text of the document.
    pub preview: String,
}

/// Returns the first `max_chars` characters of `text`, appending `...` when truncated.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Returns the current Unix timestamp in seconds.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("txt", DocumentFormat::Text; "txt")]
    #[test_case("TXT", DocumentFormat::Text; "uppercase")]
    #[test_case(".md", DocumentFormat::Markdown; "leading dot")]
    #[test_case("markdown", DocumentFormat::Markdown; "long name")]
    #[test_case("docx", DocumentFormat::Docx; "docx")]
    #[test_case("application/pdf", DocumentFormat::Pdf; "pdf mime")]
    #[test_case("pdf", DocumentFormat::Pdf; "pdf")]
    fn test_format_parse(input: &str, expected: DocumentFormat) {
        assert_eq!(input.parse::<DocumentFormat>().unwrap(), expected);
    }

    #[test_case("xlsx"; "spreadsheet")]
    #[test_case("doc"; "legacy word")]
    #[test_case(""; "empty")]
    fn test_format_parse_unsupported(input: &str) {
        let err = input.parse::<DocumentFormat>().unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_format_from_filename() {
        assert_eq!(
            DocumentFormat::from_filename("Lecture 3.PDF").unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_filename("cases/notes.md").unwrap(),
            DocumentFormat::Markdown
        );
        assert!(DocumentFormat::from_filename("README").is_err());
    }

    #[test]
    fn test_format_display_round_trips() {
        for format in DocumentFormat::ALL {
            assert_eq!(format.to_string().parse::<DocumentFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_document_counts() {
        let doc = Document::new(
            DocumentId(3),
            "notes.txt",
            DocumentFormat::Text,
            "héllo".to_string(),
        );
        assert_eq!(doc.size(), 6);
        assert_eq!(doc.id.to_string(), "3");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("héllo world", 5), "héllo...");
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("exact", 5), "exact");
    }

    #[test]
    fn test_summary() {
        let doc = Document::new(
            DocumentId(1),
            "notes.txt",
            DocumentFormat::Text,
            "a".repeat(600),
        );
        let summary = doc.summary(4);
        assert_eq!(summary.chunks, 4);
        assert_eq!(summary.size, 600);
        assert_eq!(summary.preview.len(), PREVIEW_CHARS + 3);
    }
}
