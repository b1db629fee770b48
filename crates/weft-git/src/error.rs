//! Error types for weft-git

use std::path::PathBuf;

/// Result type for weft-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in weft-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] weft_fs::Error),

    #[error("Not a git repository: {path}")]
    NotARepository { path: PathBuf },

    #[error("Worktree already exists: {path}")]
    WorktreeExists { name: String, path: PathBuf },

    #[error(
        "Branch '{branch}' already exists.\n\
         This feature may have been created previously.\n\
         To resume: check existing features with 'weft feature list'\n\
         To remove: run 'weft feature drop {feature}'"
    )]
    BranchExists { branch: String, feature: String },

    #[error(
        "Base branch '{name}' not found.\nMake sure the base branch exists in your repository."
    )]
    BaseBranchNotFound { name: String },

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Merge of '{branch}' failed: {message}")]
    MergeConflict { branch: String, message: String },

    #[error("Git is not installed or not on PATH")]
    GitNotInstalled,

    #[error("Git {key} is not configured. Run: git config --global {key} \"...\"")]
    GitConfigMissing { key: String },

    #[error(
        "Invalid AI history repository: {path}\n\
         The directory must be a git repository.\n\
         Fix: run 'weft init' to initialize it"
    )]
    InvalidHistoryRepo { path: PathBuf },

    #[error("Feature directory not found: {path}")]
    FeatureNotFound { path: PathBuf },
}
