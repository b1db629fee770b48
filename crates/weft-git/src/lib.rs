//! Git layer for weft
//!
//! Two repositories are managed here:
//!
//! - the **code repository**, where every feature gets an isolated
//!   `feature/<id>` branch checked out under `worktrees/<id>`, and which
//!   only receives agent output through an explicit merge;
//! - the **AI history repository**, a separate git repo holding every
//!   prompt and result per feature and agent for audit.
//!
//! Worktree and merge operations shell out to the `git` CLI so they behave
//! exactly like the commands a reviewer would run by hand. The history
//! repository uses libgit2 since it only needs init and commit.

pub mod command;
pub mod error;
pub mod history;
pub mod merge;
pub mod worktree;

pub use command::{GitEnvironment, run_git, validate_git_environment};
pub use error::{Error, Result};
pub use history::{AGENT_SUBDIRS, HistoryRepo};
pub use merge::{MergeOutcome, changed_files, commit_all, diff_files, merge_feature};
pub use worktree::{
    FEATURE_BRANCH_PREFIX, WorktreeInfo, WorktreeManager, WorktreeStatus, feature_branch,
    get_worktree_status,
};
