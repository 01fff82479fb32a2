//! Chunking of document text.
//!
//! Documents are split into overlapping fixed-size character windows, the
//! unit of retrieval. See [`FixedChunker`] for the window arithmetic.

pub mod fixed;

pub use fixed::{Chunks, FixedChunker};

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap size in characters (for context continuity).
pub const DEFAULT_OVERLAP: usize = 200;
