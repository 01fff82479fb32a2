//! Session and generation settings.
//!
//! Both structs deserialize with defaults for missing fields so partial
//! JSON configuration works. Values are checked by `validate` before use.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::chunking::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP, FixedChunker};
use crate::error::{Error, Result};
use crate::search::{DEFAULT_TOP_K, Retriever};

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default completion token limit.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Highest temperature accepted by every supported provider.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Chunking and retrieval parameters for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Window size in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive windows.
    pub overlap: usize,
    /// Chunks included in each prompt.
    pub top_k: usize,
    /// Minimum overlap score for a chunk to be retrieved.
    pub min_score: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
            top_k: DEFAULT_TOP_K,
            min_score: 0,
        }
    }
}

impl SessionConfig {
    /// Sets the chunk window.
    #[must_use]
    pub const fn with_chunking(mut self, chunk_size: usize, overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.overlap = overlap;
        self
    }

    /// Sets the number of retrieved chunks.
    #[must_use]
    pub const fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets the minimum retrieval score.
    #[must_use]
    pub const fn with_min_score(mut self, min_score: usize) -> Self {
        self.min_score = min_score;
        self
    }

    /// Builds the chunker described by this config.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot make progress.
    pub fn chunker(&self) -> Result<FixedChunker> {
        FixedChunker::new(self.chunk_size, self.overlap)
    }

    /// Builds the retriever described by this config.
    #[must_use]
    pub const fn retriever(&self) -> Retriever {
        Retriever::new(self.top_k).with_min_score(self.min_score)
    }

    /// Checks that the chunk window is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if `chunk_size` is zero or `overlap >= chunk_size`.
    pub fn validate(&self) -> Result<()> {
        self.chunker().map(|_| ())
    }
}

/// Sampling settings sent with every provider request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Sampling temperature, 0.0 to 2.0.
    pub temperature: f32,
    /// Maximum completion tokens.
    pub max_tokens: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GenerationSettings {
    /// Creates validated settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an out-of-range value.
    pub fn new(temperature: f32, max_tokens: u32, timeout_secs: u64) -> Result<Self> {
        let settings = Self {
            temperature,
            max_tokens,
            timeout_secs,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(Error::config(format!(
                "temperature {} must be between 0.0 and {MAX_TEMPERATURE}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(Error::config("max tokens must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("timeout must be > 0"));
        }
        Ok(())
    }

    /// The request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
