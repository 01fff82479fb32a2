//! LLM provider backends and the dispatcher that fans a prompt out to them.
//!
//! Every backend implements [`Provider`]. OpenAI and xAI Grok both speak the
//! chat completions protocol and share [`OpenAiProvider`]; Anthropic Claude
//! uses the Messages API through [`AnthropicProvider`].

pub mod anthropic;
pub mod dispatcher;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use dispatcher::{Dispatcher, ProviderFailure, ProviderResponse};
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::GenerationSettings;
use crate::error::ProviderError;

/// Base URL of the xAI chat completions API.
pub const XAI_BASE_URL: &str = "https://api.x.ai/v1";

/// A backend that turns a prompt into generated text.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Display name, e.g. "Claude".
    fn name(&self) -> &str;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Sends `prompt` as a single user message and returns the reply text.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] describing why no text was produced.
    async fn generate(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<String, ProviderError>;
}

/// The supported provider backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions.
    OpenAi,
    /// Anthropic Claude.
    Claude,
    /// xAI Grok.
    Grok,
}

impl ProviderKind {
    /// All kinds, in default dispatch order.
    pub const ALL: [Self; 3] = [Self::OpenAi, Self::Claude, Self::Grok];

    /// Short identifier used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Claude => "claude",
            Self::Grok => "grok",
        }
    }

    /// Name shown next to this provider's answer.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI GPT",
            Self::Claude => "Claude",
            Self::Grok => "Grok",
        }
    }

    /// Model used when none is configured.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4",
            Self::Claude => "claude-sonnet-4-20250514",
            Self::Grok => "grok-beta",
        }
    }

    /// Environment variable holding the API key.
    #[must_use]
    pub const fn env_key(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Claude => "ANTHROPIC_API_KEY",
            Self::Grok => "XAI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "gpt" | "chatgpt" => Ok(Self::OpenAi),
            "claude" | "anthropic" => Ok(Self::Claude),
            "grok" | "xai" => Ok(Self::Grok),
            _ => Err(ProviderError::UnknownProvider {
                name: s.to_string(),
            }),
        }
    }
}

/// Connection settings for one provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Backend kind.
    pub kind: ProviderKind,
    /// Model identifier.
    pub model: String,
    /// API key; `None` fails at call time with `MissingCredential`.
    pub api_key: Option<String>,
    /// Overrides the backend's default base URL.
    pub base_url: Option<String>,
}

// Keeps API keys out of logs
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderConfig {
    /// Creates a config with the default model and no credential.
    #[must_use]
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            model: kind.default_model().to_string(),
            api_key: None,
            base_url: None,
        }
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the API key. A blank key counts as none.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = (!key.trim().is_empty()).then_some(key);
        self
    }

    /// Overrides the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Whether an API key is configured.
    #[must_use]
    pub const fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Creates the backend described by `config`.
#[must_use]
pub fn build_provider(config: &ProviderConfig) -> Box<dyn Provider> {
    match config.kind {
        ProviderKind::OpenAi | ProviderKind::Grok => Box::new(OpenAiProvider::from_config(config)),
        ProviderKind::Claude => Box::new(AnthropicProvider::from_config(config)),
    }
}
