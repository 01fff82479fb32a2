//! A chat session: uploaded documents, their chunks and the conversation.
//!
//! The session owns everything that lives for the length of one user's
//! conversation. Nothing is persisted; dropping the session drops it all.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::chunking::FixedChunker;
use crate::config::SessionConfig;
use crate::core::document::current_timestamp;
use crate::core::{Chunk, ChunkStore, Document, DocumentId, DocumentSummary, Query};
use crate::error::Result;
use crate::extract::extract;
use crate::io::Upload;
use crate::prompt::{ContextSource, PromptComposer};
use crate::provider::{Dispatcher, ProviderResponse};
use crate::search::{Retriever, ScoredChunk};

/// A retrieved chunk as recorded in the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    /// Document the chunk belongs to.
    pub document_id: DocumentId,
    /// Document file name.
    pub filename: String,
    /// Chunk index within the document.
    pub chunk_index: usize,
    /// Retrieval score.
    pub score: usize,
}

/// One question and every provider's answer to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    /// The query as asked.
    pub query: Query,
    /// Chunks placed in the prompt, best first.
    pub sources: Vec<SourceRef>,
    /// One response per dispatched provider, in provider order.
    pub responses: Vec<ProviderResponse>,
    /// Unix timestamp of the question.
    pub timestamp: i64,
}

/// Per-conversation state.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    chunker: FixedChunker,
    retriever: Retriever,
    composer: PromptComposer,
    documents: BTreeMap<DocumentId, Document>,
    store: ChunkStore,
    history: Vec<Turn>,
    next_id: u64,
}

impl Session {
    /// Creates an empty session with the default instruction template.
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk window in `config` is invalid.
    pub fn new(config: SessionConfig) -> Result<Self> {
        Ok(Self {
            chunker: config.chunker()?,
            retriever: config.retriever(),
            config,
            composer: PromptComposer::default(),
            documents: BTreeMap::new(),
            store: ChunkStore::new(),
            history: Vec::new(),
            next_id: 1,
        })
    }

    /// Replaces the prompt composer.
    #[must_use]
    pub fn with_composer(mut self, composer: PromptComposer) -> Self {
        self.composer = composer;
        self
    }

    /// The session's configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Extracts, chunks and stores one upload.
    ///
    /// # Errors
    ///
    /// Returns an extraction error; the session is unchanged in that case.
    pub fn ingest(&mut self, upload: &Upload) -> Result<DocumentSummary> {
        let id = self.allocate_ids(1);
        let processed = process(&self.chunker, id, upload);
        self.store_processed(upload, processed)
    }

    /// Ingests several uploads, extracting and chunking them in parallel.
    ///
    /// Each upload succeeds or fails on its own. Successful documents are
    /// stored in input order and the results line up with `uploads`.
    pub fn ingest_all(&mut self, uploads: &[Upload]) -> Vec<Result<DocumentSummary>> {
        let first = self.allocate_ids(uploads.len());
        let chunker = self.chunker;

        let processed: Vec<_> = uploads
            .par_iter()
            .enumerate()
            .map(|(i, upload)| process(&chunker, DocumentId(first.0 + i as u64), upload))
            .collect();

        uploads
            .iter()
            .zip(processed)
            .map(|(upload, result)| self.store_processed(upload, result))
            .collect()
    }

    fn allocate_ids(&mut self, count: usize) -> DocumentId {
        let first = DocumentId(self.next_id);
        self.next_id += count as u64;
        first
    }

    fn store_processed(
        &mut self,
        upload: &Upload,
        processed: Result<(Document, Vec<Chunk>)>,
    ) -> Result<DocumentSummary> {
        match processed {
            Ok((document, chunks)) => {
                let summary = document.summary(chunks.len());
                tracing::info!(
                    id = %document.id,
                    filename = %document.filename,
                    format = %document.format,
                    chunks = chunks.len(),
                    "ingested document"
                );
                self.store.insert(document.id, chunks);
                self.documents.insert(document.id, document);
                Ok(summary)
            }
            Err(e) => {
                tracing::warn!(filename = %upload.filename, error = %e, "failed to ingest document");
                Err(e)
            }
        }
    }

    /// Documents in upload order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Looks up a document.
    #[must_use]
    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id)
    }

    /// Summaries of every document in upload order.
    #[must_use]
    pub fn summaries(&self) -> Vec<DocumentSummary> {
        self.documents
            .values()
            .map(|doc| doc.summary(self.store.get(doc.id).map_or(0, <[Chunk]>::len)))
            .collect()
    }

    /// The chunk store.
    #[must_use]
    pub const fn chunk_store(&self) -> &ChunkStore {
        &self.store
    }

    /// Completed turns, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Returns the best chunks for `query`.
    #[must_use]
    pub fn retrieve(&self, query: &str) -> Vec<ScoredChunk<'_>> {
        self.retriever.retrieve(query, &self.store)
    }

    /// Composes the prompt for `query` over the session's documents.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PromptError::EmptyQuery`] for a blank query.
    pub fn compose(&self, query: &Query) -> Result<String> {
        let hits = self.retrieve(&query.text);
        self.composer.compose(query, &self.context_sources(&hits))
    }

    fn context_sources<'a>(&'a self, hits: &[ScoredChunk<'a>]) -> Vec<ContextSource<'a>> {
        hits.iter()
            .map(|hit| ContextSource {
                filename: self.filename(hit.chunk.document_id),
                chunk_index: hit.chunk.index,
                score: hit.score,
                text: &hit.chunk.text,
            })
            .collect()
    }

    fn filename(&self, id: DocumentId) -> &str {
        self.documents
            .get(&id)
            .map_or("unknown", |doc| doc.filename.as_str())
    }

    /// Answers `query` with every provider of `dispatcher` and records the turn.
    ///
    /// Provider failures are captured in the turn's responses.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PromptError::EmptyQuery`] for a blank query;
    /// nothing is dispatched or recorded in that case.
    pub async fn ask(&mut self, query: Query, dispatcher: &Dispatcher) -> Result<Turn> {
        let (prompt, sources) = {
            let hits = self.retrieve(&query.text);
            let prompt = self.composer.compose(&query, &self.context_sources(&hits))?;
            let sources: Vec<SourceRef> = hits
                .iter()
                .map(|hit| SourceRef {
                    document_id: hit.chunk.document_id,
                    filename: self.filename(hit.chunk.document_id).to_string(),
                    chunk_index: hit.chunk.index,
                    score: hit.score,
                })
                .collect();
            (prompt, sources)
        };

        tracing::info!(
            kind = %query.kind,
            sources = sources.len(),
            providers = dispatcher.len(),
            "dispatching query"
        );

        let timestamp = current_timestamp();
        let responses = dispatcher.dispatch(&prompt).await;

        let turn = Turn {
            query,
            sources,
            responses,
            timestamp,
        };
        self.history.push(turn.clone());
        Ok(turn)
    }

    /// Drops every document, chunk and turn.
    pub fn reset(&mut self) {
        self.documents.clear();
        self.store.clear();
        self.history.clear();
        tracing::debug!("session reset");
    }

    /// Drops the conversation history, keeping documents.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

fn process(
    chunker: &FixedChunker,
    id: DocumentId,
    upload: &Upload,
) -> Result<(Document, Vec<Chunk>)> {
    let text = extract(&upload.bytes, upload.format)?;
    let chunks = chunker.chunk_all(id, &text);
    Ok((Document::new(id, &upload.filename, upload.format, text), chunks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationSettings;
    use crate::core::{DocumentFormat, QueryKind};
    use crate::error::{Error, ProviderError};
    use crate::provider::Provider;
    use async_trait::async_trait;

    struct Canned(&'static str);

    #[async_trait]
    impl Provider for Canned {
        fn name(&self) -> &str {
            "Canned"
        }

        fn model(&self) -> &str {
            "canned-1"
        }

        async fn generate(
            &self,
            prompt: &str,
            _settings: &GenerationSettings,
        ) -> std::result::Result<String, ProviderError> {
            Ok(format!("{} ({} chars)", self.0, prompt.len()))
        }
    }

    fn session() -> Session {
        Session::new(SessionConfig::default().with_chunking(40, 10).with_top_k(2)).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_window() {
        let err = Session::new(SessionConfig::default().with_chunking(10, 10)).unwrap_err();
        assert_eq!(err.kind(), "invalid_chunk_parameters");
    }

    #[test]
    fn test_ingest_stores_document_and_chunks() {
        let mut session = session();
        let text = "Separation anxiety disorder involves excessive fear about separation from attachment figures.";
        let summary = session.ingest(&Upload::text("anxiety.txt", text)).unwrap();

        assert_eq!(summary.id, DocumentId(1));
        assert_eq!(summary.filename, "anxiety.txt");
        assert_eq!(summary.format, DocumentFormat::Text);
        assert_eq!(summary.chunks, session.chunk_store().len());
        assert!(summary.chunks > 1);
        assert_eq!(session.documents().count(), 1);
    }

    #[test]
    fn test_ingest_failure_leaves_session_unchanged() {
        let mut session = session();
        let upload = Upload::new("broken.docx", DocumentFormat::Docx, b"not a zip".to_vec());
        let err = session.ingest(&upload).unwrap_err();

        assert!(matches!(err, Error::Extraction(_)));
        assert_eq!(session.documents().count(), 0);
        assert!(session.chunk_store().is_empty());
    }

    #[test]
    fn test_ingest_all_keeps_input_order() {
        let mut session = session();
        let uploads = vec![
            Upload::text("first.txt", "alpha"),
            Upload::new("bad.txt", DocumentFormat::Text, vec![0xff, 0xfe]),
            Upload::text("third.txt", "gamma"),
        ];
        let results = session.ingest_all(&uploads);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().kind(), "extraction_failure");
        assert!(results[2].is_ok());

        let names: Vec<&str> = session.documents().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["first.txt", "third.txt"]);
    }

    #[test]
    fn test_compose_without_documents_has_no_context() {
        let session = session();
        let prompt = session.compose(&Query::new("What is pica?")).unwrap();
        assert!(!prompt.contains("<context>"));
    }

    #[test]
    fn test_compose_cites_filename() {
        let mut session = session();
        session
            .ingest(&Upload::text("tics.md", "Tourette disorder requires motor and vocal tics."))
            .unwrap();
        let prompt = session.compose(&Query::new("vocal tics")).unwrap();
        assert!(prompt.contains("document=\"tics.md\""));
    }

    #[tokio::test]
    async fn test_ask_records_turn() {
        let mut session = session();
        session
            .ingest(&Upload::text("mood.txt", "Disruptive mood dysregulation disorder"))
            .unwrap();
        let dispatcher = Dispatcher::new(GenerationSettings::default())
            .with_provider(Box::new(Canned("ok")));

        let query = Query::new("mood dysregulation").kind(QueryKind::Dsm5Criteria);
        let turn = session.ask(query, &dispatcher).await.unwrap();

        assert_eq!(turn.responses.len(), 1);
        assert!(turn.responses[0].text.as_deref().unwrap().starts_with("ok"));
        assert_eq!(turn.sources[0].filename, "mood.txt");
        assert_eq!(session.history(), std::slice::from_ref(&turn));
    }

    #[tokio::test]
    async fn test_ask_blank_query_records_nothing() {
        let mut session = session();
        let dispatcher = Dispatcher::new(GenerationSettings::default())
            .with_provider(Box::new(Canned("ok")));

        let err = session.ask(Query::new("   "), &dispatcher).await.unwrap_err();
        assert_eq!(err.kind(), "empty_query");
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_reset_and_clear_history() {
        let mut session = session();
        session.ingest(&Upload::text("a.txt", "enuresis")).unwrap();
        let dispatcher = Dispatcher::new(GenerationSettings::default());
        session.ask(Query::new("enuresis"), &dispatcher).await.unwrap();

        session.clear_history();
        assert!(session.history().is_empty());
        assert_eq!(session.documents().count(), 1);

        session.ask(Query::new("enuresis"), &dispatcher).await.unwrap();
        session.reset();
        assert!(session.history().is_empty());
        assert_eq!(session.documents().count(), 0);
        assert!(session.chunk_store().is_empty());
    }

    #[test]
    fn test_ids_keep_increasing_after_reset() {
        let mut session = session();
        session.ingest(&Upload::text("a.txt", "one")).unwrap();
        session.reset();
        let summary = session.ingest(&Upload::text("b.txt", "two")).unwrap();
        assert_eq!(summary.id, DocumentId(2));
    }
}
