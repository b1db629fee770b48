//! Error types for weft-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from weft-core
    #[error(transparent)]
    Core(#[from] weft_core::Error),

    /// Error from weft-git
    #[error(transparent)]
    Git(#[from] weft_git::Error),

    /// Error from weft-ai
    #[error(transparent)]
    Ai(#[from] weft_ai::Error),

    /// Error from weft-agents
    #[error(transparent)]
    Agents(#[from] weft_agents::AgentError),

    /// Error from weft-fs
    #[error(transparent)]
    Fs(#[from] weft_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Interactive prompt error
    #[error("Interactive prompt error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
