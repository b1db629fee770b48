//! AI backends for weft
//!
//! Agents talk to models through the [`AiBackend`] trait. The production
//! backend is [`ClaudeBackend`] (Anthropic Messages API); [`LocalBackend`]
//! reserves the slot for self-hosted models.
//!
//! Prompts are never logged. Requests are identified in logs by the SHA-256
//! of the prompt text.

pub mod backend;
pub mod claude;
pub mod error;
pub mod local;
pub mod retry;

pub use backend::{AiBackend, Message, ModelInfo, Role, create_backend};
pub use claude::{ClaudeBackend, ClaudeConfig};
pub use error::{Error, Result};
pub use local::LocalBackend;

/// Per-request timeout for model calls.
pub const AI_REQUEST_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
