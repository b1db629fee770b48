//! Error types for weft-core

use std::path::PathBuf;

/// Result type for weft-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in weft-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file could not be parsed or failed validation
    #[error("Invalid configuration in {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// A config file contains something that looks like a credential
    #[error(
        "Security violation: secrets detected in {path}\n\
         Secrets must be provided via WEFT_* environment variables only.\n\
         Remove API keys, passwords, or tokens from the file"
    )]
    SecretsInConfig { path: PathBuf },

    /// A value for a new config would be rejected as a credential on load
    #[error(
        "'{value}' looks like a credential and would be rejected in .weftrc.yaml\n\
         Choose a different project name with --name or history path with --history-path"
    )]
    SecretLikeValue { value: String },

    /// A secret-looking pattern was found in a runtime file
    #[error("Potential secret found in {path} (pattern: {pattern}). Secrets must never be written to disk.")]
    SecretLeak { path: PathBuf, pattern: String },

    /// A configuration key resolved to nothing in every layer
    #[error("Configuration key not found: {key}")]
    MissingKey { key: String },

    /// A secret was requested but is not in the environment
    #[error(
        "Required secret not found: {env_key}\n\
         Secrets must be provided via environment variables.\n\
         Set with: export {env_key}=your-secret-here"
    )]
    MissingSecret { env_key: String },

    /// The current directory is not inside a weft project
    #[error("Not in a weft project (searched from {path})\nRun 'weft init' to initialize a project")]
    NotInProject { path: PathBuf },

    /// The AI history repository path is unset or does not exist
    #[error("AI history repository not found at {path}\nRun 'weft init' to create it, or set WEFT_AI_HISTORY_PATH")]
    HistoryPathMissing { path: PathBuf },

    /// Feature identifier failed validation
    #[error("Invalid feature name '{id}': {reason}")]
    InvalidFeatureId { id: String, reason: String },

    /// A feature state transition that the lifecycle does not allow
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// No state file for the feature
    #[error("Feature state not found: {path}")]
    StateNotFound { path: PathBuf },

    /// Prompt or result file is malformed
    #[error("Invalid task file: {message}")]
    InvalidTask { message: String },

    /// Unknown agent name or id
    #[error("Unknown agent: {name}. Valid agents: {valid}")]
    UnknownAgent { name: String, valid: String },

    /// Feature worktree is missing when patches need applying
    #[error("Worktree does not exist: {path}")]
    WorktreeMissing { path: PathBuf },

    /// Filesystem error from weft-fs
    #[error(transparent)]
    Fs(#[from] weft_fs::Error),

    /// Git error from weft-git
    #[error(transparent)]
    Git(#[from] weft_git::Error),

    /// YAML serialization/deserialization error
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_task(message: impl Into<String>) -> Self {
        Self::InvalidTask {
            message: message.into(),
        }
    }
}
