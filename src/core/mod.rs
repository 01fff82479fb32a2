//! Core domain models for casewise.
//!
//! This module contains the fundamental data structures used throughout the
//! pipeline: documents, chunks, the chunk store and queries. These are pure
//! domain models with no I/O dependencies.

pub mod chunk;
pub mod document;
pub mod query;
pub mod store;

pub use chunk::Chunk;
pub use document::{Document, DocumentFormat, DocumentId, DocumentSummary};
pub use query::{Query, QueryKind};
pub use store::ChunkStore;
