//! Chat completions backend for OpenAI and OpenAI-compatible APIs (xAI Grok).

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};
use async_trait::async_trait;

use super::{Provider, ProviderConfig, ProviderKind, XAI_BASE_URL};
use crate::config::GenerationSettings;
use crate::error::ProviderError;

/// Provider speaking the chat completions protocol.
pub struct OpenAiProvider {
    name: &'static str,
    model: String,
    client: Option<Client<OpenAIConfig>>,
}

impl OpenAiProvider {
    /// Creates the provider. Grok configs get the xAI base URL unless overridden.
    #[must_use]
    pub fn from_config(config: &ProviderConfig) -> Self {
        let base_url = config.base_url.clone().or_else(|| {
            (config.kind == ProviderKind::Grok).then(|| XAI_BASE_URL.to_string())
        });

        let client = config.api_key.as_ref().map(|key| {
            let mut openai = OpenAIConfig::new().with_api_key(key);
            if let Some(ref base) = base_url {
                openai = openai.with_api_base(base.trim_end_matches('/'));
            }
            Client::with_config(openai)
        });

        Self {
            name: config.kind.label(),
            model: config.model.clone(),
            client,
        }
    }
}

/// Builds a single-message chat completion request.
#[allow(deprecated)]
pub(crate) fn build_request(
    model: &str,
    prompt: &str,
    settings: &GenerationSettings,
) -> Result<CreateChatCompletionRequest, ProviderError> {
    let message = ChatCompletionRequestUserMessageArgs::default()
        .content(prompt)
        .build()?;

    // xAI reads `max_tokens`, not `max_completion_tokens`
    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages([message.into()])
        .temperature(settings.temperature)
        .max_tokens(settings.max_tokens)
        .build()?;
    Ok(request)
}

/// Returns the text of the first choice.
pub(crate) fn first_choice_text(
    response: CreateChatCompletionResponse,
) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::MalformedResponse("response has no message content".into()))
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<String, ProviderError> {
        let Some(ref client) = self.client else {
            return Err(ProviderError::MissingCredential {
                provider: self.name.to_string(),
            });
        };

        let request = build_request(&self.model, prompt, settings)?;
        let response = tokio::time::timeout(settings.timeout(), client.chat().create(request))
            .await
            .map_err(|_| ProviderError::Timeout {
                seconds: settings.timeout_secs,
            })??;

        first_choice_text(response)
    }
}
