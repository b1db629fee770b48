use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use weft_core::Error;
use weft_core::code::{CodePatch, PatchAction, apply_patches, extract_code_blocks};
use weft_test_utils::git::{git, real_git_repo_with_commit};

fn worktree() -> TempDir {
    let temp = TempDir::new().unwrap();
    real_git_repo_with_commit(temp.path());
    temp
}

fn patch(path: &str, action: PatchAction, content: &str) -> CodePatch {
    CodePatch {
        file_path: path.to_string(),
        content: content.to_string(),
        language: "rust".to_string(),
        action,
    }
}

#[test]
fn test_create_writes_and_stages() {
    let wt = worktree();
    let results = apply_patches(
        wt.path(),
        &[patch("src/api.rs", PatchAction::Create, "fn api() {}")],
    )
    .unwrap();

    assert!(results[0].success);
    assert_eq!(results[0].warning, None);
    assert_eq!(
        fs::read_to_string(wt.path().join("src/api.rs")).unwrap(),
        "fn api() {}\n"
    );
    let staged = git(wt.path(), &["diff", "--cached", "--name-only"]);
    assert_eq!(staged, "src/api.rs");
}

#[test]
fn test_create_over_existing_warns() {
    let wt = worktree();
    let results = apply_patches(
        wt.path(),
        &[patch("README.md", PatchAction::Create, "# New")],
    )
    .unwrap();

    assert!(results[0].success);
    assert!(results[0].has_issues());
}

#[test]
fn test_update_missing_file_warns_and_creates() {
    let wt = worktree();
    let results = apply_patches(
        wt.path(),
        &[patch("new.rs", PatchAction::Update, "// new")],
    )
    .unwrap();

    assert!(results[0].success);
    assert!(results[0].warning.is_some());
    assert!(wt.path().join("new.rs").exists());
}

#[test]
fn test_delete_tracked_and_missing() {
    let wt = worktree();
    let results = apply_patches(
        wt.path(),
        &[
            patch("README.md", PatchAction::Delete, ""),
            patch("ghost.rs", PatchAction::Delete, ""),
        ],
    )
    .unwrap();

    assert!(results[0].success);
    assert!(!wt.path().join("README.md").exists());
    assert!(results[1].success);
    assert!(results[1].warning.is_some());
}

#[test]
fn test_escaping_paths_are_rejected_but_batch_continues() {
    let wt = worktree();
    let results = apply_patches(
        wt.path(),
        &[
            patch("../outside.rs", PatchAction::Create, "x"),
            patch("/etc/passwd", PatchAction::Create, "x"),
            patch("ok.rs", PatchAction::Create, "x"),
        ],
    )
    .unwrap();

    assert!(!results[0].success);
    assert!(!results[1].success);
    assert!(results[2].success);
    assert!(!wt.path().parent().unwrap().join("outside.rs").exists());
}

#[test]
fn test_missing_worktree_is_an_error() {
    let temp = TempDir::new().unwrap();
    let err = apply_patches(&temp.path().join("nope"), &[]).unwrap_err();
    assert!(matches!(err, Error::WorktreeMissing { .. }));
}

#[test]
fn test_extract_then_apply_never_commits() {
    let wt = worktree();
    let head_before = git(wt.path(), &["rev-parse", "HEAD"]);
    let output = "```rust path=lib.rs\npub fn x() {}\n```\n";

    let artifact = extract_code_blocks(output);
    apply_patches(wt.path(), &artifact.patches).unwrap();

    assert_eq!(git(wt.path(), &["rev-parse", "HEAD"]), head_before);
}
