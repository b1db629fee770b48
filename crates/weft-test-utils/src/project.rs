//! [`TestProject`] builder for weft test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::git::{real_git_repo, real_git_repo_with_commit};

/// A temporary weft project.
///
/// Layout inside the temp dir:
///
/// ```text
/// code/               project root (git repo, .weftrc.yaml)
/// weft-ai-history/    AI history repo (the default `../weft-ai-history`)
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create the directories without initialising anything.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("code")).unwrap();
        Self { temp_dir }
    }

    /// A project with a committed code repo, `.weftrc.yaml` and history repo.
    pub fn initialized(name: &str, project_type: &str) -> Self {
        let project = Self::new();
        project.init_git();
        project.write_weftrc(name, project_type);
        project.init_history();
        project
    }

    pub fn temp_root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The project root (code repository).
    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join("code")
    }

    pub fn history_root(&self) -> PathBuf {
        self.temp_dir.path().join("weft-ai-history")
    }

    /// Make the code directory a git repo with one commit on `main`.
    pub fn init_git(&self) {
        real_git_repo_with_commit(&self.root());
    }

    /// `git init` the sibling history directory.
    pub fn init_history(&self) {
        let history = self.history_root();
        fs::create_dir_all(&history).unwrap();
        real_git_repo(&history);
    }

    /// Write a minimal valid `.weftrc.yaml`.
    pub fn write_weftrc(&self, name: &str, project_type: &str) {
        let content = format!(
            "project:\n  name: {name}\n  type: {project_type}\nai:\n  provider: anthropic\n  history_path: ../weft-ai-history\n"
        );
        fs::write(self.root().join(".weftrc.yaml"), content).unwrap();
    }

    /// Write a file relative to the project root, creating parents.
    pub fn write_file(&self, path: &str, content: &str) -> PathBuf {
        let full = self.root().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, content).unwrap();
        full
    }

    /// Assert that `path` (relative to the project root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the project root) does **not** exist.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `path` (relative to root) contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let full_path = self.root().join(path);
        let file_content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            full_path.display(),
            content,
            file_content
        );
    }
}
