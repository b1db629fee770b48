//! The backend trait and factory

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::claude::{ClaudeBackend, ClaudeConfig};
use crate::local::LocalBackend;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Flatten `(prompt, response)` pairs into alternating messages.
    pub fn from_exchanges(exchanges: &[(String, String)]) -> Vec<Self> {
        exchanges
            .iter()
            .flat_map(|(prompt, response)| [Self::user(prompt), Self::assistant(response)])
            .collect()
    }
}

/// Describes the model behind a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub provider: String,
    pub model: String,
    pub max_tokens: u32,
}

/// A text-generation backend.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Generate a response to `prompt`, preceded by earlier turns in `history`.
    async fn generate(&self, prompt: &str, history: &[Message]) -> Result<String>;

    fn model_info(&self) -> ModelInfo;
}

/// Build a backend by name.
///
/// `claude` and `anthropic` need an API key; `local` is accepted but not yet
/// functional.
pub fn create_backend(
    name: &str,
    model: &str,
    api_key: Option<&str>,
) -> Result<Box<dyn AiBackend>> {
    match name.to_lowercase().as_str() {
        "claude" | "anthropic" => {
            let api_key = api_key.ok_or(Error::MissingApiKey)?;
            let config = ClaudeConfig::new(api_key, model);
            Ok(Box::new(ClaudeBackend::new(config)?))
        }
        "local" => Ok(Box::new(LocalBackend::new(model))),
        other => Err(Error::UnknownBackend {
            name: other.to_string(),
        }),
    }
}
