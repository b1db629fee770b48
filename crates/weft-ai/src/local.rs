//! Placeholder for self-hosted models

use async_trait::async_trait;

use crate::backend::{AiBackend, Message, ModelInfo};
use crate::{DEFAULT_MAX_TOKENS, Error, Result};

#[derive(Debug, Clone)]
pub struct LocalBackend {
    model: String,
}

impl LocalBackend {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl AiBackend for LocalBackend {
    async fn generate(&self, _prompt: &str, _history: &[Message]) -> Result<String> {
        Err(Error::NotImplemented {
            backend: "local".into(),
        })
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "local".into(),
            model: self.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}
