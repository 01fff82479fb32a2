//! In-memory chunk store.
//!
//! Maps each document to its ordered chunks. Iteration visits documents in
//! id (upload) order and chunks in index order, which is the order the
//! retriever uses to break score ties.

use std::collections::BTreeMap;

use super::chunk::Chunk;
use super::document::DocumentId;

/// Session-lifetime mapping from document id to ordered chunks.
#[derive(Debug, Clone, Default)]
pub struct ChunkStore {
    documents: BTreeMap<DocumentId, Vec<Chunk>>,
}

impl ChunkStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the chunks of one document, replacing any previous entry.
    pub fn insert(&mut self, document_id: DocumentId, chunks: Vec<Chunk>) {
        debug_assert!(chunks.iter().all(|c| c.document_id == document_id));
        self.documents.insert(document_id, chunks);
    }

    /// Returns the chunks of one document.
    #[must_use]
    pub fn get(&self, document_id: DocumentId) -> Option<&[Chunk]> {
        self.documents.get(&document_id).map(Vec::as_slice)
    }

    /// Iterates over every chunk in store order.
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.documents.values().flatten()
    }

    /// Total number of chunks across all documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.values().map(Vec::len).sum()
    }

    /// Returns `true` if the store holds no chunks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.values().all(Vec::is_empty)
    }

    /// Drops every chunk.
    pub fn clear(&mut self) {
        self.documents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(doc: u64, texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(DocumentId(doc), i, (*t).to_string(), i * 10, 0..t.len()))
            .collect()
    }

    #[test]
    fn test_empty_store() {
        let store = ChunkStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.iter().count(), 0);
    }

    #[test]
    fn test_iteration_order_follows_document_ids() {
        let mut store = ChunkStore::new();
        store.insert(DocumentId(2), chunks(2, &["c", "d"]));
        store.insert(DocumentId(1), chunks(1, &["a", "b"]));

        let texts: Vec<&str> = store.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_get_and_clear() {
        let mut store = ChunkStore::new();
        store.insert(DocumentId(1), chunks(1, &["a"]));
        store.insert(DocumentId(2), chunks(2, &["b", "c"]));

        assert_eq!(store.get(DocumentId(2)).map(<[Chunk]>::len), Some(2));
        assert!(store.get(DocumentId(9)).is_none());

        store.clear();
        assert!(store.is_empty());
        assert!(store.get(DocumentId(1)).is_none());
    }
}
