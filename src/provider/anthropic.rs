//! Anthropic Messages API backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Provider, ProviderConfig};
use crate::config::GenerationSettings;
use crate::error::ProviderError;

/// Default Anthropic API base URL.
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Provider for Claude models.
pub struct AnthropicProvider {
    model: String,
    api_key: Option<String>,
    endpoint: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Creates the provider from its config.
    #[must_use]
    pub fn from_config(config: &ProviderConfig) -> Self {
        let base = config
            .base_url
            .as_deref()
            .unwrap_or(ANTHROPIC_BASE_URL)
            .trim_end_matches('/');
        Self {
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            endpoint: format!("{base}/v1/messages"),
            client: reqwest::Client::new(),
        }
    }

    /// The messages endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn request_body<'a>(
    model: &'a str,
    prompt: &'a str,
    settings: &GenerationSettings,
) -> MessagesRequest<'a> {
    MessagesRequest {
        model,
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
        messages: [Message {
            role: "user",
            content: prompt,
        }],
    }
}

/// Joins the text blocks of a successful response.
pub(crate) fn parse_response(body: &str) -> Result<String, ProviderError> {
    let response: MessagesResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

    let text: Vec<String> = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();

    if text.is_empty() {
        return Err(ProviderError::MalformedResponse(
            "response has no text content".to_string(),
        ));
    }
    Ok(text.join(""))
}

/// Classifies an error response.
pub(crate) fn parse_error(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error }) => match error.kind.as_str() {
            "authentication_error" | "permission_error" => ProviderError::Auth(error.message),
            "rate_limit_error" => ProviderError::Quota(error.message),
            _ => ProviderError::from_status(status, error.message),
        },
        Err(_) => ProviderError::from_status(status, body.trim().to_string()),
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "Claude"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<String, ProviderError> {
        let Some(ref api_key) = self.api_key else {
            return Err(ProviderError::MissingCredential {
                provider: self.name().to_string(),
            });
        };

        let timeout = |e: reqwest::Error| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    seconds: settings.timeout_secs,
                }
            } else {
                e.into()
            }
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(settings.timeout())
            .json(&request_body(&self.model, prompt, settings))
            .send()
            .await
            .map_err(timeout)?;

        let status = response.status();
        let body = response.text().await.map_err(timeout)?;

        if !status.is_success() {
            return Err(parse_error(status.as_u16(), &body));
        }
        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;

    #[test]
    fn test_request_body_shape() {
        let settings = GenerationSettings::new(0.5, 1024, 60).unwrap();
        let request = request_body("claude-sonnet-4-20250514", "Explain PTSD in children", &settings);
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.is_object());

        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Explain PTSD in children");
    }

    #[test]
    fn test_parse_response_text() {
        let body = r#"{
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Re-experiencing, "}, {"type": "text", "text": "avoidance."}],
            "stop_reason": "end_turn"
        }"#;
        assert_eq!(parse_response(body).unwrap(), "Re-experiencing, avoidance.");
    }

    #[test]
    fn test_parse_response_without_text() {
        let err = parse_response(r#"{"content": []}"#).unwrap_err();
        assert_eq!(err.category(), "malformed_response");

        let err = parse_response("not json").unwrap_err();
        assert_eq!(err.category(), "malformed_response");
    }

    #[test]
    fn test_parse_error_categories() {
        let auth = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        assert_eq!(
            parse_error(401, auth),
            ProviderError::Auth("invalid x-api-key".to_string())
        );

        let quota = r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#;
        assert_eq!(parse_error(429, quota).category(), "quota");

        let overloaded = r#"{"type":"error","error":{"type":"overloaded_error","message":"busy"}}"#;
        assert_eq!(
            parse_error(529, overloaded),
            ProviderError::Api {
                status: 529,
                message: "busy".to_string()
            }
        );

        assert_eq!(
            parse_error(502, "<html>bad gateway</html>"),
            ProviderError::Api {
                status: 502,
                message: "<html>bad gateway</html>".to_string()
            }
        );
    }

    #[test]
    fn test_endpoint_from_base_url() {
        let provider = AnthropicProvider::from_config(&ProviderConfig::new(ProviderKind::Claude));
        assert_eq!(provider.endpoint(), "https://api.anthropic.com/v1/messages");

        let config =
            ProviderConfig::new(ProviderKind::Claude).with_base_url("http://localhost:8080/");
        let provider = AnthropicProvider::from_config(&config);
        assert_eq!(provider.endpoint(), "http://localhost:8080/v1/messages");
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let provider = AnthropicProvider::from_config(&ProviderConfig::new(ProviderKind::Claude));
        let err = provider
            .generate("prompt", &GenerationSettings::default())
            .await
            .unwrap_err();
        assert_eq!(err.category(), "missing_credential");
    }
}
