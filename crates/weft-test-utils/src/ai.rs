//! In-memory [`AiBackend`] for tests that must not reach the network.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use weft_ai::{AiBackend, Error, Message, ModelInfo, Result};

/// A call received by [`ScriptedBackend`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub history: Vec<Message>,
}

/// Replies with queued responses in order, then with the fallback.
///
/// ```rust,no_run
/// use weft_test_utils::ai::ScriptedBackend;
///
/// let backend = ScriptedBackend::new(["first reply", "second reply"]);
/// let echo = ScriptedBackend::always("## Domain Model\n...");
/// ```
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<String>>,
    fallback: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Every call returns `response`.
    pub fn always(response: impl Into<String>) -> Self {
        Self {
            fallback: Some(response.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AiBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str, history: &[Message]) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            history: history.to_vec(),
        });

        let next = self.responses.lock().unwrap().pop_front();
        next.or_else(|| self.fallback.clone())
            .ok_or_else(|| Error::InvalidResponse {
                message: "scripted backend has no responses left".to_string(),
            })
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "scripted".to_string(),
            model: "scripted".to_string(),
            max_tokens: 0,
        }
    }
}
