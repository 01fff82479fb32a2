//! Concurrent fan-out of one prompt to every enabled provider.

use futures_util::future::join_all;
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::Instrument;

use super::{Provider, ProviderConfig, build_provider};
use crate::config::GenerationSettings;
use crate::error::ProviderError;

/// Why a provider produced no text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFailure {
    /// Stable category, see [`ProviderError::category`].
    pub category: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl From<&ProviderError> for ProviderFailure {
    fn from(err: &ProviderError) -> Self {
        Self {
            category: err.category(),
            message: err.to_string(),
        }
    }
}

/// One provider's outcome for a dispatched prompt.
///
/// Exactly one of `text` and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderResponse {
    /// Provider display name.
    pub provider: String,
    /// Model that was asked.
    pub model: String,
    /// Generated text on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Failure description otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderFailure>,
    /// Wall time of the call in milliseconds.
    pub elapsed_ms: u64,
}

impl ProviderResponse {
    fn new(provider: &dyn Provider, result: Result<String, ProviderError>, elapsed_ms: u64) -> Self {
        let (text, error) = match result {
            Ok(text) => (Some(text), None),
            Err(ref err) => (None, Some(ProviderFailure::from(err))),
        };
        Self {
            provider: provider.name().to_string(),
            model: provider.model().to_string(),
            text,
            error,
            elapsed_ms,
        }
    }

    /// Whether the provider returned text.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.text.is_some()
    }
}

/// Sends a prompt to a fixed, ordered list of providers.
pub struct Dispatcher {
    providers: Vec<Box<dyn Provider>>,
    settings: GenerationSettings,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("providers", &self.names())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Dispatcher {
    /// Creates a dispatcher with no providers.
    #[must_use]
    pub const fn new(settings: GenerationSettings) -> Self {
        Self {
            providers: Vec::new(),
            settings,
        }
    }

    /// Creates a dispatcher with one provider per config, in order.
    #[must_use]
    pub fn from_configs(configs: &[ProviderConfig], settings: GenerationSettings) -> Self {
        Self {
            providers: configs.iter().map(build_provider).collect(),
            settings,
        }
    }

    /// Appends a provider.
    #[must_use]
    pub fn with_provider(mut self, provider: Box<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Provider names in dispatch order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Number of providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no providers are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Generation settings sent with each request.
    #[must_use]
    pub const fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Sends `prompt` to every provider concurrently.
    ///
    /// Returns one response per provider in configured order, whatever the
    /// order of completion. Each call is attempted once; a failure is
    /// recorded in its response and never affects the others.
    pub async fn dispatch(&self, prompt: &str) -> Vec<ProviderResponse> {
        let calls = self.providers.iter().map(|provider| {
            let span = tracing::info_span!(
                "generate",
                provider = provider.name(),
                model = provider.model()
            );
            async move {
                let started = Instant::now();
                let result = provider.generate(prompt, &self.settings).await;
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

                match result {
                    Ok(ref text) => {
                        tracing::info!(elapsed_ms, chars = text.len(), "provider responded");
                    }
                    Err(ref err) => {
                        tracing::warn!(elapsed_ms, category = err.category(), error = %err, "provider failed");
                    }
                }
                ProviderResponse::new(&**provider, result, elapsed_ms)
            }
            .instrument(span)
        });

        join_all(calls).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Echo {
        name: &'static str,
        delay_ms: u64,
    }

    #[async_trait]
    impl Provider for Echo {
        fn name(&self) -> &str {
            self.name
        }

        fn model(&self) -> &str {
            "echo-1"
        }

        async fn generate(
            &self,
            prompt: &str,
            _settings: &GenerationSettings,
        ) -> Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            Ok(format!("{}: {prompt}", self.name))
        }
    }

    struct Failing(ProviderError);

    #[async_trait]
    impl Provider for Failing {
        fn name(&self) -> &str {
            "Failing"
        }

        fn model(&self) -> &str {
            "broken-1"
        }

        async fn generate(
            &self,
            _prompt: &str,
            _settings: &GenerationSettings,
        ) -> Result<String, ProviderError> {
            Err(self.0.clone())
        }
    }

    fn echo(name: &'static str, delay_ms: u64) -> Box<dyn Provider> {
        Box::new(Echo { name, delay_ms })
    }

    #[tokio::test]
    async fn test_one_failure_does_not_affect_others() {
        let dispatcher = Dispatcher::new(GenerationSettings::default())
            .with_provider(echo("Echo", 0))
            .with_provider(Box::new(Failing(ProviderError::Quota(
                "quota exhausted".to_string(),
            ))));

        let responses = dispatcher.dispatch("hello").await;
        assert_eq!(responses.len(), 2);

        assert_eq!(responses[0].text.as_deref(), Some("Echo: hello"));
        assert!(responses[0].error.is_none());
        assert!(responses[0].is_success());

        assert!(responses[1].text.is_none());
        let failure = responses[1].error.as_ref().unwrap();
        assert_eq!(failure.category, "quota");
        assert!(failure.message.contains("quota exhausted"));
        assert_eq!(responses[1].model, "broken-1");
    }

    #[tokio::test]
    async fn test_empty_dispatcher_returns_nothing() {
        let dispatcher = Dispatcher::new(GenerationSettings::default());
        assert!(dispatcher.is_empty());
        assert!(dispatcher.dispatch("hello").await.is_empty());
    }

    #[tokio::test]
    async fn test_results_follow_configured_order() {
        let dispatcher = Dispatcher::new(GenerationSettings::default())
            .with_provider(echo("Slow", 50))
            .with_provider(echo("Fast", 0));

        let names: Vec<String> = dispatcher
            .dispatch("x")
            .await
            .into_iter()
            .map(|r| r.provider)
            .collect();
        assert_eq!(names, vec!["Slow", "Fast"]);
    }

    #[tokio::test]
    async fn test_unconfigured_providers_report_missing_credentials() {
        let configs = [
            ProviderConfig::new(ProviderKind::OpenAi),
            ProviderConfig::new(ProviderKind::Claude),
        ];
        let dispatcher = Dispatcher::from_configs(&configs, GenerationSettings::default());
        assert_eq!(dispatcher.names(), vec!["OpenAI GPT", "Claude"]);

        let responses = dispatcher.dispatch("prompt").await;
        assert_eq!(responses.len(), 2);
        assert!(
            responses
                .iter()
                .all(|r| r.error.as_ref().map(|e| e.category) == Some("missing_credential"))
        );
    }

    #[test]
    fn test_response_serializes_one_outcome() {
        let response = ProviderResponse {
            provider: "Claude".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            text: Some("answer".to_string()),
            error: None,
            elapsed_ms: 12,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["text"], "answer");
        assert!(json.get("error").is_none());
    }
}
