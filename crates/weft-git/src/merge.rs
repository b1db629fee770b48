//! Merging accepted features back into the base branch

use std::path::Path;

use crate::command::run_git;
use crate::worktree::{feature_branch, get_worktree_status};
use crate::{Error, Result};

/// Result of a successful feature merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub merge_commit: String,
    /// Whether uncommitted worktree changes were committed first.
    pub committed_pending: bool,
}

impl MergeOutcome {
    pub fn short_commit(&self) -> &str {
        &self.merge_commit[..self.merge_commit.len().min(8)]
    }
}

/// Stage and commit everything in `worktree`. Returns `false` if it was clean.
pub fn commit_all(worktree: &Path, message: &str) -> Result<bool> {
    if get_worktree_status(worktree)?.is_clean() {
        return Ok(false);
    }
    run_git(worktree, &["add", "."])?;
    run_git(worktree, &["commit", "-m", message])?;
    tracing::info!(worktree = %worktree.display(), message, "Committed pending changes");
    Ok(true)
}

/// Merge `feature/<id>` into `base_branch` with a merge commit.
///
/// Pending changes in the feature worktree are committed with
/// `commit_message` first. A failed merge is left in place for manual
/// resolution and reported as [`Error::MergeConflict`].
pub fn merge_feature(
    repo: &Path,
    worktree: &Path,
    feature_id: &str,
    base_branch: &str,
    commit_message: &str,
) -> Result<MergeOutcome> {
    let committed_pending = if worktree.exists() {
        commit_all(worktree, commit_message)?
    } else {
        false
    };

    let branch = feature_branch(feature_id);
    run_git(repo, &["checkout", base_branch])?;

    let merge_message = format!("Merge feature: {feature_id}");
    if let Err(e) = run_git(repo, &["merge", "--no-ff", &branch, "-m", &merge_message]) {
        let message = match e {
            Error::CommandFailed { stderr, .. } => stderr,
            other => other.to_string(),
        };
        tracing::warn!(%branch, %message, "Merge failed");
        return Err(Error::MergeConflict { branch, message });
    }

    let merge_commit = run_git(repo, &["rev-parse", "HEAD"])?;
    tracing::info!(%branch, base = base_branch, %merge_commit, "Merged feature");

    Ok(MergeOutcome {
        merge_commit,
        committed_pending,
    })
}

/// Files added or modified in `worktree` relative to its `HEAD`.
pub fn changed_files(worktree: &Path) -> Result<Vec<String>> {
    diff_names(worktree, "HEAD")
}

/// Files added or modified in `worktree` relative to `base_branch`,
/// counting both feature-branch commits and staged work.
pub fn diff_files(worktree: &Path, base_branch: &str) -> Result<Vec<String>> {
    diff_names(worktree, base_branch)
}

fn diff_names(worktree: &Path, against: &str) -> Result<Vec<String>> {
    let output = run_git(
        worktree,
        &["diff", "--name-only", "--diff-filter=AM", against],
    )?;
    Ok(output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}
