//! Per-feature git worktrees
//!
//! Each feature is developed on its own `feature/<id>` branch, checked out at
//! `<repo>/worktrees/<id>`. Agents write into that worktree; the main checkout
//! is never touched until the feature is accepted.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::command::{run_git, run_git_raw};
use crate::{Error, Result};

/// Branch prefix for feature branches created by weft.
pub const FEATURE_BRANCH_PREFIX: &str = "feature/";

/// Older projects used this prefix; listed worktrees accept both.
const LEGACY_BRANCH_PREFIX: &str = "feat/";

const WORKTREES_DIR: &str = "worktrees";

/// Branch name for a feature.
pub fn feature_branch(feature_id: &str) -> String {
    format!("{FEATURE_BRANCH_PREFIX}{feature_id}")
}

/// A feature worktree discovered from `git worktree list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeInfo {
    pub path: PathBuf,
    pub branch: String,
    pub feature_id: String,
    pub created_at: DateTime<Utc>,
}

/// Working-tree state of a feature checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    pub current_branch: String,
    pub modified_files: Vec<String>,
    pub untracked_files: Vec<String>,
}

impl WorktreeStatus {
    pub fn is_clean(&self) -> bool {
        self.modified_files.is_empty() && self.untracked_files.is_empty()
    }
}

/// Manages feature worktrees inside one code repository.
#[derive(Debug, Clone)]
pub struct WorktreeManager {
    repo: PathBuf,
}

impl WorktreeManager {
    /// Open the manager for a repository root. Fails if `.git` is missing.
    pub fn new(repo: impl Into<PathBuf>) -> Result<Self> {
        let repo = repo.into();
        let repo = weft_fs::path::canonical(&repo);
        if !repo.join(".git").exists() {
            return Err(Error::NotARepository { path: repo });
        }
        Ok(Self { repo })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo
    }

    /// Where the worktree for `feature_id` lives, whether or not it exists.
    pub fn worktree_path(&self, feature_id: &str) -> PathBuf {
        self.repo.join(WORKTREES_DIR).join(feature_id)
    }

    /// Create the branch and worktree for a feature from `base_branch`.
    pub fn create(&self, feature_id: &str, base_branch: &str) -> Result<PathBuf> {
        let worktree_path = self.worktree_path(feature_id);
        if worktree_path.exists() {
            return Err(Error::WorktreeExists {
                name: feature_id.to_string(),
                path: worktree_path,
            });
        }

        let worktrees_dir = self.repo.join(WORKTREES_DIR);
        weft_fs::io::ensure_dir(&worktrees_dir)?;

        let branch = feature_branch(feature_id);
        tracing::info!(feature = feature_id, %branch, base = base_branch, "Creating worktree");

        let path_arg = worktree_path.to_string_lossy().to_string();
        let result = run_git(
            &self.repo,
            &["worktree", "add", "-b", &branch, &path_arg, base_branch],
        );

        match result {
            Ok(_) => Ok(worktree_path),
            Err(Error::CommandFailed { stderr, .. }) => {
                if worktree_path.exists() {
                    let _ = std::fs::remove_dir_all(&worktree_path);
                }
                tracing::debug!(%stderr, "git worktree add failed");

                if stderr.contains("already exists") {
                    Err(Error::BranchExists {
                        branch,
                        feature: feature_id.to_string(),
                    })
                } else if stderr.contains("not a valid")
                    || stderr.contains("unknown revision")
                    || stderr.contains("invalid reference")
                {
                    Err(Error::BaseBranchNotFound {
                        name: base_branch.to_string(),
                    })
                } else {
                    Err(Error::CommandFailed {
                        command: "worktree add".into(),
                        stderr,
                    })
                }
            }
            Err(e) => Err(e),
        }
    }

    /// List worktrees whose branch is a feature branch.
    pub fn list(&self) -> Result<Vec<WorktreeInfo>> {
        let output = run_git(&self.repo, &["worktree", "list", "--porcelain"])?;
        Ok(parse_worktree_list(&output))
    }

    /// Remove a feature worktree and optionally its branch.
    ///
    /// Returns `true` if either the worktree or the branch was removed.
    pub fn remove(&self, feature_id: &str, delete_branch: bool) -> Result<bool> {
        let worktree_path = self.worktree_path(feature_id);
        let mut worktree_removed = false;
        let mut branch_deleted = false;

        if worktree_path.exists() {
            let path_arg = worktree_path.to_string_lossy().to_string();
            match run_git(&self.repo, &["worktree", "remove", "--force", &path_arg]) {
                Ok(_) => {
                    tracing::info!(path = %worktree_path.display(), "Removed worktree");
                    worktree_removed = true;
                }
                Err(e) => tracing::error!(error = %e, "Error removing worktree"),
            }
        } else {
            tracing::debug!(path = %worktree_path.display(), "Worktree does not exist");
        }

        if delete_branch {
            let branch = feature_branch(feature_id);
            match run_git(&self.repo, &["branch", "-D", &branch]) {
                Ok(_) => {
                    tracing::info!(%branch, "Deleted branch");
                    branch_deleted = true;
                }
                Err(e) => tracing::debug!(%branch, error = %e, "Error deleting branch"),
            }
        }

        Ok(worktree_removed || branch_deleted)
    }

    /// Status of the worktree belonging to `feature_id`.
    pub fn status(&self, feature_id: &str) -> Result<WorktreeStatus> {
        get_worktree_status(&self.worktree_path(feature_id))
    }
}

/// Current branch plus modified and untracked files of a checkout.
pub fn get_worktree_status(worktree: &Path) -> Result<WorktreeStatus> {
    let current_branch = run_git(worktree, &["branch", "--show-current"])?;
    let porcelain = run_git_raw(worktree, &["status", "--porcelain"])?;

    let mut status = WorktreeStatus {
        current_branch,
        ..Default::default()
    };

    for line in porcelain.lines().filter(|l| l.len() > 2) {
        let (code, rest) = line.split_at(2);
        let file = rest.trim_start().to_string();
        if code == "??" {
            status.untracked_files.push(file);
        } else {
            status.modified_files.push(file);
        }
    }

    tracing::debug!(
        clean = status.is_clean(),
        modified = status.modified_files.len(),
        untracked = status.untracked_files.len(),
        "Worktree status"
    );
    Ok(status)
}

fn created_at(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .and_then(|m| m.created().or_else(|_| m.modified()))
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(SystemTime::now()))
}

fn parse_worktree_list(output: &str) -> Vec<WorktreeInfo> {
    let mut worktrees = Vec::new();
    let mut current_path: Option<PathBuf> = None;

    for line in output.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            current_path = Some(PathBuf::from(path));
        } else if let Some(branch) = line.strip_prefix("branch refs/heads/")
            && let Some(path) = current_path.take()
        {
            let feature_id = branch
                .strip_prefix(FEATURE_BRANCH_PREFIX)
                .or_else(|| branch.strip_prefix(LEGACY_BRANCH_PREFIX));
            if let Some(feature_id) = feature_id {
                worktrees.push(WorktreeInfo {
                    created_at: created_at(&path),
                    feature_id: feature_id.to_string(),
                    branch: branch.to_string(),
                    path,
                });
            }
        }
    }

    tracing::debug!(count = worktrees.len(), "Found feature worktrees");
    worktrees
}
