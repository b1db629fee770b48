use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use weft_git::{Error, WorktreeManager, changed_files, diff_files, merge_feature};
use weft_test_utils::git::{git, real_git_repo_with_commit};

fn setup_repo() -> (TempDir, WorktreeManager) {
    let temp = TempDir::new().unwrap();
    real_git_repo_with_commit(temp.path());
    let manager = WorktreeManager::new(temp.path()).unwrap();
    (temp, manager)
}

#[test]
fn test_new_rejects_non_repository() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
        WorktreeManager::new(temp.path()),
        Err(Error::NotARepository { .. })
    ));
}

#[test]
fn test_create_and_list_worktree() {
    let (_temp, manager) = setup_repo();

    let path = manager.create("user-auth", "main").unwrap();

    assert!(path.join("README.md").exists());
    assert_eq!(path, manager.worktree_path("user-auth"));

    let listed = manager.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].feature_id, "user-auth");
    assert_eq!(listed[0].branch, "feature/user-auth");
}

#[test]
fn test_create_twice_fails_with_existing_path() {
    let (_temp, manager) = setup_repo();
    manager.create("dup", "main").unwrap();

    assert!(matches!(
        manager.create("dup", "main"),
        Err(Error::WorktreeExists { .. })
    ));
}

#[test]
fn test_create_with_existing_branch_is_friendly() {
    let (temp, manager) = setup_repo();
    git(temp.path(), &["branch", "feature/taken"]);

    let err = manager.create("taken", "main").unwrap_err();

    assert!(matches!(err, Error::BranchExists { .. }));
    assert!(err.to_string().contains("weft feature drop taken"));
    assert!(!manager.worktree_path("taken").exists());
}

#[test]
fn test_create_with_missing_base_branch() {
    let (_temp, manager) = setup_repo();

    let err = manager.create("orphan", "does-not-exist").unwrap_err();

    assert!(matches!(err, Error::BaseBranchNotFound { .. }));
}

#[test]
fn test_remove_worktree_and_branch() {
    let (temp, manager) = setup_repo();
    manager.create("gone", "main").unwrap();

    assert!(manager.remove("gone", true).unwrap());
    assert!(!manager.worktree_path("gone").exists());
    assert!(git(temp.path(), &["branch", "--list", "feature/gone"]).is_empty());
}

#[test]
fn test_remove_missing_returns_false() {
    let (_temp, manager) = setup_repo();
    assert!(!manager.remove("never", false).unwrap());
}

#[test]
fn test_status_counts_modified_and_untracked() {
    let (_temp, manager) = setup_repo();
    let path = manager.create("stat", "main").unwrap();
    fs::write(path.join("README.md"), "# Changed").unwrap();
    fs::write(path.join("new.txt"), "new").unwrap();

    let status = manager.status("stat").unwrap();

    assert_eq!(status.current_branch, "feature/stat");
    assert_eq!(status.modified_files, vec!["README.md".to_string()]);
    assert_eq!(status.untracked_files, vec!["new.txt".to_string()]);
    assert!(!status.is_clean());
}

#[test]
fn test_changed_files_sees_staged_additions() {
    let (_temp, manager) = setup_repo();
    let path = manager.create("diff", "main").unwrap();
    fs::write(path.join("api.rs"), "fn main() {}").unwrap();
    git(&path, &["add", "api.rs"]);

    assert_eq!(changed_files(&path).unwrap(), vec!["api.rs".to_string()]);
}

#[test]
fn test_diff_files_against_base_includes_branch_commits() {
    let (_temp, manager) = setup_repo();
    let path = manager.create("diff-base", "main").unwrap();
    fs::write(path.join("committed.rs"), "// one").unwrap();
    git(&path, &["add", "committed.rs"]);
    git(&path, &["commit", "-m", "first"]);
    fs::write(path.join("staged.rs"), "// two").unwrap();
    git(&path, &["add", "staged.rs"]);

    assert!(changed_files(&path).unwrap() == vec!["staged.rs".to_string()]);
    assert_eq!(
        diff_files(&path, "main").unwrap(),
        vec!["committed.rs".to_string(), "staged.rs".to_string()]
    );
}

#[test]
fn test_merge_feature_commits_pending_and_merges() {
    let (temp, manager) = setup_repo();
    let path = manager.create("merge-me", "main").unwrap();
    fs::write(path.join("feature.txt"), "done").unwrap();

    let outcome = merge_feature(
        temp.path(),
        &path,
        "merge-me",
        "main",
        "Complete merge-me",
    )
    .unwrap();

    assert!(outcome.committed_pending);
    assert_eq!(outcome.short_commit().len(), 8);
    assert!(temp.path().join("feature.txt").exists());
    assert!(
        git(temp.path(), &["log", "-1", "--pretty=%s"]).contains("Merge feature: merge-me")
    );
}

#[test]
fn test_merge_conflict_is_reported() {
    let (temp, manager) = setup_repo();
    let path = manager.create("clash", "main").unwrap();
    fs::write(path.join("README.md"), "feature side").unwrap();
    git(&path, &["commit", "-am", "feature edit"]);
    fs::write(temp.path().join("README.md"), "main side").unwrap();
    git(temp.path(), &["commit", "-am", "main edit"]);

    let err = merge_feature(temp.path(), &path, "clash", "main", "unused").unwrap_err();

    assert!(matches!(err, Error::MergeConflict { .. }));
}
