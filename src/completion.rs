//! Completion gateway abstraction and implementations.
//!
//! Defines the [`CompletionGateway`] trait and two implementations:
//! - **[`DisabledGateway`]**: always fails with [`CompletionError::Configuration`].
//! - **[`OpenAiGateway`]**: one `POST` to an OpenAI-compatible
//!   chat-completions endpoint.
//!
//! Every call is a single attempt. There is no retry or backoff; callers
//! decide how to degrade when a call fails.
//!
//! # Wire Format
//!
//! ```json
//! { "model": "gpt-3.5-turbo", "messages": [...], "max_tokens": 1500, "temperature": 0.3 }
//! ```
//!
//! The generated text is read from `choices[0].message.content`.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::CompletionConfig;
use crate::models::ConversationMessage;

/// Why a completion call produced no text.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// No credential is configured.
    #[error("completion API key not configured")]
    Configuration,
    /// The service answered with a non-success status.
    #[error("completion API error {status}: {body}")]
    Upstream { status: u16, body: String },
    /// The request never produced a response (connect, TLS, timeout).
    #[error("completion request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// A success status whose body lacks generated text.
    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
}

/// A service that turns a conversation into generated text.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    async fn complete(&self, messages: &[ConversationMessage]) -> Result<String, CompletionError>;
}

// ============ Disabled Gateway ============

/// A gateway with no backing service.
pub struct DisabledGateway;

#[async_trait]
impl CompletionGateway for DisabledGateway {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _messages: &[ConversationMessage]) -> Result<String, CompletionError> {
        Err(CompletionError::Configuration)
    }
}

// ============ OpenAI Gateway ============

/// Gateway for OpenAI-compatible `chat/completions` endpoints.
///
/// The credential is injected at construction. A gateway built without
/// one still exists, but every call fails with
/// [`CompletionError::Configuration`] before touching the network.
pub struct OpenAiGateway {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct CompletionRequestBody<'a> {
    model: &'a str,
    messages: &'a [ConversationMessage],
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiGateway {
    /// Create a gateway from configuration and an optional credential.
    ///
    /// # Errors
    ///
    /// Returns an error only if the HTTP client cannot be built.
    pub fn new(config: &CompletionConfig, api_key: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            api_key,
        })
    }

    /// Build a gateway whose credential comes from `config.api_key`.
    pub fn from_config(config: &CompletionConfig) -> anyhow::Result<Self> {
        Self::new(config, config.resolve_api_key())
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl CompletionGateway for OpenAiGateway {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ConversationMessage]) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CompletionError::Configuration)?;

        let body = CompletionRequestBody {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;
        parse_completion_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String, CompletionError> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CompletionError::InvalidResponse("missing choices[0].message.content".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_content() {
        let json = json!({
            "choices": [{ "message": { "role": "assistant", "content": "print('hi')" } }]
        });
        assert_eq!(parse_completion_response(&json).unwrap(), "print('hi')");
    }

    #[test]
    fn test_parse_missing_choices() {
        let err = parse_completion_response(&json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, CompletionError::InvalidResponse(_)));
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![
            ConversationMessage::system("sys"),
            ConversationMessage::user("hi"),
        ];
        let body = CompletionRequestBody {
            model: "gpt-3.5-turbo",
            messages: &messages,
            max_tokens: 1500,
            temperature: 0.3,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["max_tokens"], 1500);
        assert_eq!(json["messages"][1], json!({"role": "user", "content": "hi"}));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_without_network() {
        let gateway = OpenAiGateway::new(&CompletionConfig::default(), None).unwrap();
        assert!(!gateway.has_credential());
        let err = gateway
            .complete(&[ConversationMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Configuration));
    }

    #[tokio::test]
    async fn test_disabled_gateway() {
        let err = DisabledGateway.complete(&[]).await.unwrap_err();
        assert!(matches!(err, CompletionError::Configuration));
    }
}
