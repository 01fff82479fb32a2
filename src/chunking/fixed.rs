//! Fixed-size sliding-window chunking.
//!
//! A window of `chunk_size` characters slides across the text, advancing by
//! `chunk_size - overlap` characters each step, and stops after the first
//! window that reaches the end of the text. Windows are counted in
//! characters, so multi-byte UTF-8 sequences are never split.

use crate::chunking::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use crate::core::{Chunk, DocumentId};
use crate::error::{ChunkingError, Result};

/// Fixed-size chunker with overlapping windows.
///
/// # Examples
///
/// ```
/// use casewise::chunking::FixedChunker;
/// use casewise::core::DocumentId;
///
/// let chunker = FixedChunker::new(10, 3).unwrap();
/// let chunks: Vec<_> = chunker.chunks(DocumentId(1), "0123456789ABCDEFGHIJ").collect();
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(chunks[1].start_offset, 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedChunker {
    /// Window size in characters.
    chunk_size: usize,
    /// Characters shared by consecutive windows.
    overlap: usize,
}

impl Default for FixedChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl FixedChunker {
    /// Creates a chunker.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkingError::InvalidChunkParameters`] if `chunk_size` is zero
    /// or `overlap >= chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(ChunkingError::invalid(chunk_size, overlap).into());
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Window size in characters.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap in characters.
    #[must_use]
    pub const fn overlap(&self) -> usize {
        self.overlap
    }

    /// Characters the window advances per step.
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Number of chunks produced for a text of `char_len` characters.
    #[must_use]
    pub const fn expected_count(&self, char_len: usize) -> usize {
        if char_len <= self.chunk_size {
            1
        } else {
            (char_len - self.overlap).div_ceil(self.stride())
        }
    }

    /// Lazily chunks `text` in document order.
    ///
    /// The returned iterator is finite and not restartable; call `chunks`
    /// again to start over. Text no longer than one window, including empty
    /// text, yields exactly one chunk.
    #[must_use]
    pub const fn chunks<'a>(&self, document_id: DocumentId, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            document_id,
            chunk_size: self.chunk_size,
            stride: self.chunk_size - self.overlap,
            byte_start: 0,
            char_start: 0,
            index: 0,
            done: false,
        }
    }

    /// Chunks `text` eagerly.
    #[must_use]
    pub fn chunk_all(&self, document_id: DocumentId, text: &str) -> Vec<Chunk> {
        self.chunks(document_id, text).collect()
    }
}

/// Lazy iterator over the chunks of one text.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    document_id: DocumentId,
    chunk_size: usize,
    stride: usize,
    byte_start: usize,
    char_start: usize,
    index: usize,
    done: bool,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done {
            return None;
        }

        let rest = &self.text[self.byte_start..];
        let window_end = byte_offset_of(rest, self.chunk_size);
        let byte_end = self.byte_start + window_end;

        let chunk = Chunk::new(
            self.document_id,
            self.index,
            self.text[self.byte_start..byte_end].to_string(),
            self.char_start,
            self.byte_start..byte_end,
        );

        if byte_end >= self.text.len() {
            self.done = true;
        } else {
            self.byte_start += byte_offset_of(rest, self.stride);
            self.char_start += self.stride;
            self.index += 1;
        }

        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            // Remaining bytes bound the remaining characters from above.
            let remaining_bytes = self.text.len() - self.byte_start;
            let upper = if remaining_bytes <= self.chunk_size {
                1
            } else {
                remaining_bytes.div_ceil(self.stride)
            };
            (1, Some(upper))
        }
    }
}

impl std::iter::FusedIterator for Chunks<'_> {}

/// Byte offset of the `n`th character of `s`, or `s.len()` if it has fewer.
fn byte_offset_of(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}
