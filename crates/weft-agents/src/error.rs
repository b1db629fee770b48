//! Error types for agent operations

use std::path::PathBuf;

/// Errors that can occur while running agents
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The prompt body was empty after trimming
    #[error("Empty prompt for agent {agent}")]
    EmptyPrompt { agent: String },

    /// Model output lacks sections the agent's role requires
    #[error("Agent {agent} output is missing required sections: {}", missing.join(", "))]
    MissingSections { agent: String, missing: Vec<String> },

    /// No Meta result exists to derive downstream prompts from
    #[error("No Meta output found for feature '{feature}'. Run 'weft feature create {feature}' first.")]
    MissingMetaOutput { feature: String },

    /// A prompt spec file exists but could not be read
    #[error("Could not read prompt spec at {path}: {message}")]
    SpecUnreadable { path: PathBuf, message: String },

    /// No result arrived before the deadline
    #[error("Timed out after {seconds}s waiting for agent {agent}")]
    Timeout { agent: String, seconds: u64 },

    /// The agent is not enabled for this project
    #[error("Agent '{agent}' is not enabled in .weftrc.yaml. Enabled agents: {enabled}")]
    AgentNotEnabled { agent: String, enabled: String },

    /// Core error (config, queue, state, patches)
    #[error(transparent)]
    Core(#[from] weft_core::Error),

    /// Backend error
    #[error(transparent)]
    Ai(#[from] weft_ai::Error),

    /// Filesystem error
    #[error(transparent)]
    Fs(#[from] weft_fs::Error),
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
