use std::fs;

use tempfile::TempDir;
use weft_fs::io;

#[test]
fn test_write_atomic_creates_file_and_parents() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/dir/test.txt");

    io::write_atomic(&path, b"hello world").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "hello world");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.txt");
    fs::write(&path, "original").unwrap();

    io::write_atomic(&path, b"updated").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "updated");
}

#[test]
fn test_write_atomic_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    io::write_text(&temp.path().join("a.md"), "content").unwrap();

    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with(io::TEMP_PREFIX))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_read_text_nonexistent_file_reports_path() {
    let err = io::read_text(std::path::Path::new("/nonexistent/file.txt")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/file.txt"));
}

#[test]
fn test_rename_moves_file() {
    let temp = TempDir::new().unwrap();
    let from = temp.path().join("task.md");
    let to = temp.path().join("task.processed");
    fs::write(&from, "x").unwrap();

    io::rename(&from, &to).unwrap();

    assert!(!from.exists());
    assert!(to.exists());
}
