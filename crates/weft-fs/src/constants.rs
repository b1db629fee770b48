//! Well-known weft filesystem markers.

use std::path::Path;

/// Standard weft filesystem markers and paths, relative to the project root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeftPath {
    /// The `.weftrc.yaml` project configuration file
    ProjectConfig,
    /// The `.weft` runtime directory
    RuntimeDir,
    /// The `worktrees` directory holding per-feature worktrees
    WorktreesDir,
    /// The `.git` directory
    GitDir,
    /// The `.gitignore` file
    GitIgnore,
}

impl WeftPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectConfig => ".weftrc.yaml",
            Self::RuntimeDir => ".weft",
            Self::WorktreesDir => "worktrees",
            Self::GitDir => ".git",
            Self::GitIgnore => ".gitignore",
        }
    }
}

impl AsRef<Path> for WeftPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for WeftPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for WeftPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
