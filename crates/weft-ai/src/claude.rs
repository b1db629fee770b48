//! Anthropic Messages API backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::backend::{AiBackend, Message, ModelInfo};
use crate::retry::RetryPolicy;
use crate::{AI_REQUEST_TIMEOUT_SECS, DEFAULT_MAX_TOKENS, Error, Result};

pub const API_VERSION: &str = "2023-06-01";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Longest slice of an error body surfaced to the user.
const MAX_ERROR_BODY: usize = 200;

#[derive(Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClaudeConfig {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(AI_REQUEST_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Trim an error body and redact anything resembling a key.
fn sanitize_error(body: &str) -> String {
    let redacted: String = body
        .split_whitespace()
        .map(|word| if word.contains("sk-") { "[redacted]" } else { word })
        .collect::<Vec<_>>()
        .join(" ");
    if redacted.chars().count() > MAX_ERROR_BODY {
        let cut: String = redacted.chars().take(MAX_ERROR_BODY).collect();
        format!("{cut}...")
    } else {
        redacted
    }
}

/// Claude via the Anthropic Messages API, with retries on transient failures.
#[derive(Debug, Clone)]
pub struct ClaudeBackend {
    client: Client,
    config: ClaudeConfig,
}

impl ClaudeBackend {
    pub fn new(config: ClaudeConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(Error::from_reqwest)?;
        Ok(Self { client, config })
    }

    async fn send(&self, messages: &[Message]) -> Result<String> {
        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages,
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Error::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::from_reqwest)?;

        if status.as_u16() == 429 {
            return Err(Error::RateLimited);
        }
        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(err) => format!("{}: {}", err.error.kind, err.error.message),
                Err(_) => body,
            };
            return Err(Error::Api {
                status: status.as_u16(),
                message: sanitize_error(&message),
            });
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&body).map_err(|e| Error::InvalidResponse {
                message: e.to_string(),
            })?;
        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();
        if text.is_empty() {
            return Err(Error::InvalidResponse {
                message: "response contained no text".into(),
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl AiBackend for ClaudeBackend {
    async fn generate(&self, prompt: &str, history: &[Message]) -> Result<String> {
        let prompt_hash = weft_fs::checksum::sha256_hex(prompt);
        let mut messages = history.to_vec();
        messages.push(Message::user(prompt));

        tracing::info!(
            model = %self.config.model,
            prompt_hash = %prompt_hash,
            history = history.len(),
            "Sending request to Claude"
        );

        let output = self
            .config
            .retry
            .run("claude.generate", || self.send(&messages))
            .await?;

        tracing::info!(
            prompt_hash = %prompt_hash,
            output_len = output.len(),
            "Received response from Claude"
        );
        Ok(output)
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "anthropic".into(),
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_shape() {
        let messages = vec![Message::user("hi")];
        let request = MessagesRequest {
            model: "claude-x",
            max_tokens: 10,
            messages: &messages,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "model": "claude-x",
                "max_tokens": 10,
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }

    #[test]
    fn non_text_blocks_are_ignored() {
        let body = r#"{"content":[{"type":"thinking","thinking":"..."},{"type":"text","text":"ok"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(parsed.content[0], ContentBlock::Other));
    }

    #[test]
    fn error_bodies_are_sanitized() {
        let cleaned = sanitize_error("invalid key sk-ant-abc123 provided");
        assert_eq!(cleaned, "invalid key [redacted] provided");
        assert!(sanitize_error(&"x ".repeat(300)).ends_with("..."));
    }

    #[test]
    fn debug_hides_key() {
        let config = ClaudeConfig::new("sk-ant-secret", "m");
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(
            ClaudeBackend::new(ClaudeConfig::new("", "m")),
            Err(Error::MissingApiKey)
        ));
    }
}
