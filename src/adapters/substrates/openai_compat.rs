//! OpenAI-compatible chat completions reply source.
//!
//! Posts a single user message to `{base_url}/chat/completions` and returns
//! the first choice's content. Works with any endpoint speaking this schema
//! (hosted APIs, local inference servers, proxies).

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::domain::models::SubstrateConfig;
use crate::domain::ports::{non_blank, ReplySource, SubstrateError};

/// One chat message. Prompts are always sent with the `user` role.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Request body for `/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP reply source for OpenAI-compatible endpoints.
pub struct OpenAiCompatSource {
    config: SubstrateConfig,
    api_key: String,
    client: Client,
}

impl OpenAiCompatSource {
    /// Create a source; fails when no API key can be resolved.
    pub fn new(config: SubstrateConfig) -> Result<Self, SubstrateError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            SubstrateError::NotConfigured(format!(
                "no API key: set substrate.api_key or {}",
                config.api_key_env
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                SubstrateError::NotConfigured(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Build the request body for a prompt.
    pub fn build_request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: self.config.temperature,
        }
    }

    fn map_status(&self, status: StatusCode, body: String) -> SubstrateError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                SubstrateError::AuthError(format!("API error {status}: {body}"))
            }
            StatusCode::TOO_MANY_REQUESTS => SubstrateError::RateLimitExceeded(body),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                SubstrateError::Timeout(self.config.timeout_secs)
            }
            _ => SubstrateError::Unavailable(format!("API error {status}: {body}")),
        }
    }
}

#[async_trait]
impl ReplySource for OpenAiCompatSource {
    fn name(&self) -> &'static str {
        "openai-compat"
    }

    async fn request_reply(&self, prompt: &str) -> Result<Option<String>, SubstrateError> {
        let request = self.build_request(prompt);
        debug!(model = %request.model, prompt_len = prompt.len(), "requesting reply");

        let response = self
            .client
            .post(self.endpoint())
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SubstrateError::Timeout(self.config.timeout_secs)
                } else {
                    SubstrateError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.map_status(status, body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| {
                SubstrateError::MalformedResponse(format!("Failed to parse response: {e}"))
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        Ok(non_blank(content))
    }
}
