//! Lexical retrieval over the chunk store.
//!
//! Queries and chunks are reduced to case-insensitive sets of words and each
//! chunk is scored by the size of the intersection with the query's set.
//! There is no weighting, no inverse document frequency, no stop-word
//! removal and no stemming. Ties keep store order, so for a fixed store and
//! query the ranking is deterministic.

use serde::Serialize;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

use crate::core::{Chunk, ChunkStore};

/// Default number of chunks to retrieve.
pub const DEFAULT_TOP_K: usize = 3;

/// A retrieved chunk with its overlap score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoredChunk<'a> {
    /// The chunk, borrowed from the store.
    pub chunk: &'a Chunk,
    /// Number of distinct query words found in the chunk.
    pub score: usize,
}

/// Keyword-overlap retriever.
///
/// # Examples
///
/// ```
/// use casewise::chunking::FixedChunker;
/// use casewise::core::{ChunkStore, DocumentId};
/// use casewise::search::Retriever;
///
/// let mut store = ChunkStore::new();
/// let chunker = FixedChunker::new(20, 0).unwrap();
/// store.insert(DocumentId(1), chunker.chunk_all(DocumentId(1), "sleep problems....  attention deficit"));
///
/// let hits = Retriever::new(1).retrieve("attention span", &store);
/// assert_eq!(hits[0].chunk.index, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retriever {
    top_k: usize,
    min_score: usize,
}

impl Default for Retriever {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

impl Retriever {
    /// Creates a retriever returning at most `top_k` chunks.
    #[must_use]
    pub const fn new(top_k: usize) -> Self {
        Self { top_k, min_score: 0 }
    }

    /// Drops chunks scoring below `min_score`.
    ///
    /// The default of 0 keeps every chunk; 1 keeps only chunks sharing at
    /// least one word with the query.
    #[must_use]
    pub const fn with_min_score(mut self, min_score: usize) -> Self {
        self.min_score = min_score;
        self
    }

    /// Maximum number of chunks returned.
    #[must_use]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    /// Returns the top-K chunks of `store` for `query`, best first.
    ///
    /// Returns fewer than K chunks when the store holds fewer, and nothing
    /// for an empty store.
    #[must_use]
    pub fn retrieve<'a>(&self, query: &str, store: &'a ChunkStore) -> Vec<ScoredChunk<'a>> {
        if self.top_k == 0 || store.is_empty() {
            return Vec::new();
        }

        let query_words = word_set(query);
        let mut scored: Vec<ScoredChunk<'a>> = store
            .iter()
            .map(|chunk| ScoredChunk {
                chunk,
                score: overlap(&query_words, &chunk.text),
            })
            .filter(|hit| hit.score >= self.min_score)
            .collect();

        // Stable: equal scores keep store order
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(self.top_k);

        tracing::debug!(
            query_words = query_words.len(),
            candidates = store.len(),
            returned = scored.len(),
            best = scored.first().map_or(0, |hit| hit.score),
            "retrieved chunks"
        );

        scored
    }
}

/// Splits `text` into its set of lowercase words.
#[must_use]
pub fn word_set(text: &str) -> HashSet<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}

/// Counts the distinct words of `query_words` that also occur in `text`.
#[must_use]
pub fn overlap(query_words: &HashSet<String>, text: &str) -> usize {
    if query_words.is_empty() {
        return 0;
    }
    word_set(text).intersection(query_words).count()
}
