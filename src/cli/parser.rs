//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::chunking::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use crate::config::{
    DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS, GenerationSettings,
    SessionConfig,
};
use crate::core::{DocumentFormat, Query, QueryKind};
use crate::error::{CommandError, Result};
use crate::prompt::template::TEMPLATE_DIR_ENV;
use crate::provider::{ProviderConfig, ProviderKind};
use crate::search::DEFAULT_TOP_K;

/// Casewise: document-grounded study assistant for child and adolescent
/// mental health.
///
/// Answers questions and analyzes case studies with one or more LLM
/// providers, grounding each prompt in excerpts from the documents you
/// supply.
#[derive(Parser, Debug)]
#[command(name = "casewise")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging on stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Directory holding `instructions.md`.
    ///
    /// Defaults to `~/.config/casewise/templates`.
    #[arg(long, env = TEMPLATE_DIR_ENV, global = true)]
    pub template_dir: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question and print every provider's answer.
    Ask {
        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        documents: DocumentArgs,

        #[command(flatten)]
        providers: ProviderArgs,
    },

    /// Print the prompt that `ask` would send, without sending it.
    Prompt {
        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        documents: DocumentArgs,
    },

    /// Show the chunks retrieved for a query.
    Search {
        /// Search text.
        query: String,

        #[command(flatten)]
        documents: DocumentArgs,
    },

    /// Show how a document is split into chunks.
    Chunk {
        /// Path to the document.
        file: PathBuf,

        /// Document type (txt, md, docx, pdf); inferred from the extension by default.
        #[arg(long = "type")]
        doc_type: Option<String>,

        /// Chunk size in characters.
        #[arg(long, env = "CASEWISE_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Overlap between chunks in characters.
        #[arg(long, env = "CASEWISE_OVERLAP", default_value_t = DEFAULT_OVERLAP)]
        overlap: usize,
    },

    /// Print the text extracted from a document.
    Extract {
        /// Path to the document.
        file: PathBuf,

        /// Document type (txt, md, docx, pdf); inferred from the extension by default.
        #[arg(long = "type")]
        doc_type: Option<String>,
    },

    /// List providers, their models and whether an API key is set.
    Providers {
        #[command(flatten)]
        providers: ProviderArgs,
    },

    /// Interactive session: questions on stdin, answers on stdout.
    ///
    /// Lines starting with `:` are commands (`:help` lists them).
    Chat {
        #[command(flatten)]
        documents: DocumentArgs,

        #[command(flatten)]
        providers: ProviderArgs,

        /// Query kind for questions (see `ask --kind`).
        #[arg(long, default_value = "general")]
        kind: String,
    },

    /// Write the default instruction template for editing.
    ///
    /// Existing files are not overwritten.
    InitTemplates {
        /// Target directory (default: `~/.config/casewise/templates`).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

/// The question and optional patient details.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Question or case description.
    pub question: String,

    /// Query kind (general, case-study, differential, treatment, assessment, dsm5, study-notes).
    #[arg(long, default_value = "general")]
    pub kind: String,

    /// Patient age in years.
    #[arg(long)]
    pub age: Option<u8>,

    /// Patient gender.
    #[arg(long)]
    pub gender: Option<String>,

    /// Additional context (family history, prior diagnoses, medications).
    #[arg(long)]
    pub context: Option<String>,
}

impl QueryArgs {
    /// Builds the query.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown query kind.
    pub fn to_query(&self) -> Result<Query> {
        let kind: QueryKind = self.kind.parse()?;
        let mut query = Query::new(self.question.clone()).kind(kind);
        if let Some(age) = self.age {
            query = query.age(age);
        }
        if let Some(ref gender) = self.gender {
            query = query.gender(gender.clone());
        }
        if let Some(ref context) = self.context {
            query = query.context(context.clone());
        }
        Ok(query)
    }
}

/// Documents and the chunking and retrieval parameters applied to them.
#[derive(Args, Debug, Clone)]
pub struct DocumentArgs {
    /// Document to upload (repeatable).
    #[arg(short = 'd', long = "document")]
    pub documents: Vec<PathBuf>,

    /// Chunk size in characters.
    #[arg(long, env = "CASEWISE_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Overlap between chunks in characters.
    #[arg(long, env = "CASEWISE_OVERLAP", default_value_t = DEFAULT_OVERLAP)]
    pub overlap: usize,

    /// Number of chunks placed in the prompt.
    #[arg(short = 'k', long, env = "CASEWISE_TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Minimum number of shared words for a chunk to be retrieved.
    #[arg(long, default_value_t = 0)]
    pub min_score: usize,

    /// Fail on the first document that cannot be read or extracted
    /// instead of skipping it.
    #[arg(long)]
    pub strict: bool,
}

impl DocumentArgs {
    /// Session configuration from these arguments.
    #[must_use]
    pub const fn session_config(&self) -> SessionConfig {
        SessionConfig {
            chunk_size: self.chunk_size,
            overlap: self.overlap,
            top_k: self.top_k,
            min_score: self.min_score,
        }
    }
}

/// Provider selection, credentials and sampling settings.
#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    /// Provider to ask (openai, claude, grok; repeatable).
    ///
    /// Defaults to every provider with an API key, or all of them when no
    /// key is set.
    #[arg(short = 'p', long = "provider")]
    pub providers: Vec<String>,

    /// OpenAI API key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_key: Option<String>,

    /// Anthropic API key.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_key: Option<String>,

    /// xAI API key.
    #[arg(long, env = "XAI_API_KEY", hide_env_values = true)]
    pub xai_key: Option<String>,

    /// OpenAI model.
    #[arg(long, default_value = ProviderKind::OpenAi.default_model())]
    pub openai_model: String,

    /// Claude model.
    #[arg(long, default_value = ProviderKind::Claude.default_model())]
    pub claude_model: String,

    /// Grok model.
    #[arg(long, default_value = ProviderKind::Grok.default_model())]
    pub grok_model: String,

    /// Sampling temperature (0.0 to 2.0).
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Maximum tokens per response.
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,
}

impl ProviderArgs {
    /// Config for one provider kind from these arguments.
    #[must_use]
    pub fn config(&self, kind: ProviderKind) -> ProviderConfig {
        let (key, model) = match kind {
            ProviderKind::OpenAi => (&self.openai_key, &self.openai_model),
            ProviderKind::Claude => (&self.anthropic_key, &self.claude_model),
            ProviderKind::Grok => (&self.xai_key, &self.grok_model),
        };
        let config = ProviderConfig::new(kind).with_model(model.clone());
        match key {
            Some(key) => config.with_api_key(key.clone()),
            None => config,
        }
    }

    /// Configs for every provider, in default order.
    #[must_use]
    pub fn all_configs(&self) -> Vec<ProviderConfig> {
        ProviderKind::ALL.iter().map(|&k| self.config(k)).collect()
    }

    /// Configs for the selected providers.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown provider name.
    pub fn selected_configs(&self) -> Result<Vec<ProviderConfig>> {
        if self.providers.is_empty() {
            let all = self.all_configs();
            let with_keys: Vec<ProviderConfig> =
                all.iter().filter(|c| c.has_credential()).cloned().collect();
            return Ok(if with_keys.is_empty() { all } else { with_keys });
        }

        let mut kinds: Vec<ProviderKind> = Vec::new();
        for name in &self.providers {
            let kind: ProviderKind = name.parse()?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds.into_iter().map(|k| self.config(k)).collect())
    }

    /// Validated generation settings.
    ///
    /// # Errors
    ///
    /// Returns an error for an out-of-range value.
    pub fn settings(&self) -> Result<GenerationSettings> {
        GenerationSettings::new(self.temperature, self.max_tokens, self.timeout)
    }
}

/// Parses a `--type` value.
///
/// # Errors
///
/// Returns an error for an unknown document type.
pub fn parse_doc_type(value: Option<&str>) -> Result<Option<DocumentFormat>> {
    value
        .map(|v| {
            v.parse::<DocumentFormat>()
                .map_err(|e| CommandError::InvalidArgument(e.to_string()).into())
        })
        .transpose()
}
