//! # Casewise
//!
//! Document-grounded study assistant for child and adolescent mental health.
//!
//! Casewise turns uploaded course material into retrievable chunks, picks
//! the chunks that share the most words with a question, wraps them in a
//! structured prompt and sends that prompt to one or more LLM providers at
//! once, returning every provider's answer or error.
//!
//! ## Pipeline
//!
//! - **Extraction**: plain text, Markdown, DOCX and PDF to text
//! - **Chunking**: fixed-size overlapping character windows
//! - **Retrieval**: keyword-overlap ranking over the session's chunks
//! - **Prompting**: instructions, retrieved context and the query in delimited sections
//! - **Dispatch**: concurrent fan-out to OpenAI, Claude and Grok

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
// Note: unsafe is needed for memory-mapped I/O (memmap2)
#![warn(unsafe_code)]

pub mod chunking;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod extract;
pub mod io;
pub mod prompt;
pub mod provider;
pub mod search;
pub mod session;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{Chunk, ChunkStore, Document, DocumentFormat, DocumentId, Query, QueryKind};

// Re-export pipeline types
pub use chunking::FixedChunker;
pub use config::{GenerationSettings, SessionConfig};
pub use extract::extract;
pub use io::{Upload, read_upload};
pub use prompt::{PromptComposer, PromptTemplate};
pub use provider::{
    Dispatcher, Provider, ProviderConfig, ProviderKind, ProviderResponse, build_provider,
};
pub use search::{Retriever, ScoredChunk};
pub use session::{Session, Turn};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
