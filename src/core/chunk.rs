//! Chunk representation.
//!
//! Chunks are overlapping windows of a document's text produced by the
//! chunker. Each chunk records where it sits in the source document both in
//! characters (for the window arithmetic) and in bytes (for slicing).

use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::document::DocumentId;

/// A bounded contiguous slice of a document's text.
///
/// # Examples
///
/// ```
/// use casewise::core::{Chunk, DocumentId};
///
/// let chunk = Chunk::new(DocumentId(1), 0, "Hello, world!".to_string(), 0, 0..13);
/// assert_eq!(chunk.char_len(), 13);
/// assert_eq!(chunk.end_offset(), 13);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Document this chunk was cut from.
    pub document_id: DocumentId,

    /// Sequential index within the document (0-based, contiguous).
    pub index: usize,

    /// Chunk text.
    pub text: String,

    /// Character offset of the first character in the document.
    pub start_offset: usize,

    /// Byte range in the document text.
    pub byte_range: Range<usize>,
}

impl Chunk {
    /// Creates a new chunk.
    #[must_use]
    pub const fn new(
        document_id: DocumentId,
        index: usize,
        text: String,
        start_offset: usize,
        byte_range: Range<usize>,
    ) -> Self {
        Self {
            document_id,
            index,
            text,
            start_offset,
            byte_range,
        }
    }

    /// Returns the size of the chunk in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.text.len()
    }

    /// Returns the length of the chunk in characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Returns the character offset one past the last character.
    #[must_use]
    pub fn end_offset(&self) -> usize {
        self.start_offset + self.char_len()
    }

    /// Checks if the chunk is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns a preview of the chunk text (first `max_chars` characters).
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_new() {
        let chunk = Chunk::new(DocumentId(2), 1, "world".to_string(), 7, 7..12);
        assert_eq!(chunk.document_id, DocumentId(2));
        assert_eq!(chunk.index, 1);
        assert_eq!(chunk.start_offset, 7);
        assert_eq!(chunk.end_offset(), 12);
        assert_eq!(chunk.byte_range, 7..12);
    }

    #[test]
    fn test_chunk_multibyte_lengths() {
        let chunk = Chunk::new(DocumentId(1), 0, "世界".to_string(), 0, 0..6);
        assert_eq!(chunk.size(), 6);
        assert_eq!(chunk.char_len(), 2);
        assert_eq!(chunk.preview(1), "世");
    }

    #[test]
    fn test_chunk_empty() {
        let chunk = Chunk::new(DocumentId(1), 0, String::new(), 0, 0..0);
        assert!(chunk.is_empty());
    }

    #[test]
    fn test_chunk_serialization() {
        let chunk = Chunk::new(DocumentId(4), 2, "text".to_string(), 8, 8..12);
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(json.contains("\"document_id\":4"));
        let back: Chunk = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chunk);
    }
}
