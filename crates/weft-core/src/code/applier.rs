use std::path::Path;

use weft_fs::io;
use weft_git::run_git;

use super::models::{ApplyResult, CodePatch, PatchAction};
use crate::{Error, Result};

/// Apply every patch to `worktree` and stage the changes.
///
/// Each patch is attempted independently; failures are reported in the
/// returned results rather than aborting the batch. Only a missing worktree
/// is a hard error.
pub fn apply_patches(worktree: &Path, patches: &[CodePatch]) -> Result<Vec<ApplyResult>> {
    if !worktree.is_dir() {
        return Err(Error::WorktreeMissing {
            path: worktree.to_path_buf(),
        });
    }

    let results: Vec<ApplyResult> = patches.iter().map(|p| apply_patch(worktree, p)).collect();

    let failed = results.iter().filter(|r| !r.success).count();
    tracing::info!(
        worktree = %worktree.display(),
        applied = results.len() - failed,
        failed,
        "Applied code patches"
    );
    Ok(results)
}

/// Apply a single patch. Never panics and never commits.
pub fn apply_patch(worktree: &Path, patch: &CodePatch) -> ApplyResult {
    let rel = patch.file_path.as_str();
    let target = match weft_fs::safe_join(worktree, rel) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(path = rel, "Rejected patch outside worktree");
            return ApplyResult::failed(rel, e.to_string());
        }
    };

    let outcome = match patch.action {
        PatchAction::Create | PatchAction::Update => {
            let existed = target.exists();
            let warning = match (patch.action, existed) {
                (PatchAction::Create, true) => Some("File already existed and was overwritten"),
                (PatchAction::Update, false) => Some("File did not exist and was created"),
                _ => None,
            };
            write_and_stage(worktree, &target, rel, &patch.content).map(|_| warning)
        }
        PatchAction::Delete => delete_and_stage(worktree, &target, rel),
    };

    match outcome {
        Ok(Some(warning)) => {
            tracing::warn!(path = rel, action = %patch.action, warning, "Patch applied with warning");
            ApplyResult::warn(rel, warning)
        }
        Ok(None) => {
            tracing::debug!(path = rel, action = %patch.action, "Patch applied");
            ApplyResult::ok(rel)
        }
        Err(e) => {
            tracing::warn!(path = rel, action = %patch.action, error = %e, "Patch failed");
            ApplyResult::failed(rel, e.to_string())
        }
    }
}

fn write_and_stage(worktree: &Path, target: &Path, rel: &str, content: &str) -> Result<()> {
    let mut body = content.to_string();
    if !body.is_empty() && !body.ends_with('\n') {
        body.push('\n');
    }
    io::write_text(target, &body)?;
    run_git(worktree, &["add", "--", rel])?;
    Ok(())
}

fn delete_and_stage(
    worktree: &Path,
    target: &Path,
    rel: &str,
) -> Result<Option<&'static str>> {
    if !target.exists() {
        return Ok(Some("File did not exist, nothing to delete"));
    }
    if run_git(worktree, &["rm", "-f", "--quiet", "--", rel]).is_ok() {
        return Ok(None);
    }
    std::fs::remove_file(target).map_err(|e| weft_fs::Error::io(target, e))?;
    Ok(Some("File was not tracked by git and was removed directly"))
}
