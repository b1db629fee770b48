//! The `.weft/` runtime directory inside a project

use std::path::{Path, PathBuf};

use weft_fs::{WeftPath, io};

use crate::{Error, Result};

const GITIGNORE: &str = "\
# weft runtime state is local to this machine.
# Prompt specs are kept so teams can share customisations.
*
!.gitignore
!prompts/
";

/// Patterns flagged when scanning runtime files for leaked credentials.
const LEAK_PATTERNS: &[&str] = &["WEFT_", "sk-ant-", "sk-", "api_key", "password"];

const SCANNED_EXTENSIONS: &[&str] = &["md", "txt", "json", "yaml", "log"];

/// Layout of `<project>/.weft/`.
#[derive(Debug, Clone)]
pub struct WeftRuntime {
    root: PathBuf,
}

impl WeftRuntime {
    /// Runtime rooted at `<project_root>/.weft`.
    pub fn new(project_root: &Path) -> Self {
        Self {
            root: project_root.join(WeftPath::RuntimeDir),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn features_dir(&self) -> PathBuf {
        self.root.join("features")
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join("tasks")
    }

    pub fn history_dir(&self) -> PathBuf {
        self.root.join("history")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.root.join("prompts")
    }

    pub fn agent_input_dir(&self, agent: &str) -> PathBuf {
        self.tasks_dir().join("in").join(agent)
    }

    pub fn agent_output_dir(&self, agent: &str) -> PathBuf {
        self.tasks_dir().join("out").join(agent)
    }

    /// Create the full directory tree and `.gitignore`. Idempotent.
    pub fn initialize(&self) -> Result<()> {
        let tasks = self.tasks_dir();
        let history = self.history_dir();
        for dir in [
            self.features_dir(),
            tasks.join("in"),
            tasks.join("out"),
            tasks.join("processed"),
            history.join("sessions"),
            history.join("prompts"),
            self.cache_dir(),
            self.prompts_dir(),
        ] {
            io::ensure_dir(&dir)?;
        }

        let gitignore = self.root.join(WeftPath::GitIgnore);
        if !gitignore.exists() {
            io::write_text(&gitignore, GITIGNORE)?;
        }

        tracing::debug!(path = %self.root.display(), "Initialized runtime directory");
        Ok(())
    }

    /// Create `tasks/in/<agent>` and `tasks/out/<agent>`.
    pub fn ensure_agent_dirs(&self, agent: &str) -> Result<()> {
        io::ensure_dir(&self.agent_input_dir(agent))?;
        io::ensure_dir(&self.agent_output_dir(agent))?;
        Ok(())
    }

    /// Agents that have an input directory, sorted.
    pub fn list_agents(&self) -> Result<Vec<String>> {
        let dir = self.tasks_dir().join("in");
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut agents = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(|e| weft_fs::Error::io(&dir, e))? {
            let entry = entry.map_err(|e| weft_fs::Error::io(&dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_dir() && !name.starts_with('.') {
                agents.push(name);
            }
        }
        agents.sort();
        Ok(agents)
    }

    /// Delete every file in `cache/`, returning how many were removed.
    pub fn clean_cache(&self) -> Result<usize> {
        let dir = self.cache_dir();
        if !dir.is_dir() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in std::fs::read_dir(&dir).map_err(|e| weft_fs::Error::io(&dir, e))? {
            let path = entry.map_err(|e| weft_fs::Error::io(&dir, e))?.path();
            if path.is_file() {
                std::fs::remove_file(&path).map_err(|e| weft_fs::Error::io(&path, e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Fail if any text file under `.weft/` contains a credential-like pattern.
    pub fn ensure_no_secrets(&self) -> Result<()> {
        if !self.exists() {
            return Ok(());
        }
        scan_for_leaks(&self.root, LEAK_PATTERNS)
    }
}

/// Walk `dir` recursively and fail on the first text file containing any of `patterns`.
pub(crate) fn scan_for_leaks(dir: &Path, patterns: &[&str]) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| weft_fs::Error::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| weft_fs::Error::io(dir, e))?.path();
        if path.is_dir() {
            if path.file_name().is_some_and(|n| n == ".git") {
                continue;
            }
            scan_for_leaks(&path, patterns)?;
            continue;
        }
        let scanned = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SCANNED_EXTENSIONS.contains(&e));
        if !scanned {
            continue;
        }
        // Binary or non-UTF-8 files are not ours to judge.
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        if let Some(pattern) = patterns.iter().find(|p| content.contains(*p)) {
            return Err(Error::SecretLeak {
                path,
                pattern: pattern.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn initialize_creates_layout() {
        let temp = tempfile::tempdir().unwrap();
        let runtime = WeftRuntime::new(temp.path());

        runtime.initialize().unwrap();
        runtime.initialize().unwrap();

        for rel in [
            "features",
            "tasks/in",
            "tasks/out",
            "tasks/processed",
            "history/sessions",
            "history/prompts",
            "cache",
            "prompts",
        ] {
            assert!(runtime.root().join(rel).is_dir(), "missing {rel}");
        }
        let ignore = std::fs::read_to_string(runtime.root().join(".gitignore")).unwrap();
        assert!(ignore.ends_with("*\n!.gitignore\n!prompts/\n"));
    }

    #[test]
    fn existing_gitignore_is_kept() {
        let temp = tempfile::tempdir().unwrap();
        let runtime = WeftRuntime::new(temp.path());
        std::fs::create_dir_all(runtime.root()).unwrap();
        std::fs::write(runtime.root().join(".gitignore"), "custom\n").unwrap();

        runtime.initialize().unwrap();

        let ignore = std::fs::read_to_string(runtime.root().join(".gitignore")).unwrap();
        assert_eq!(ignore, "custom\n");
    }

    #[test]
    fn agent_dirs_are_listed() {
        let temp = tempfile::tempdir().unwrap();
        let runtime = WeftRuntime::new(temp.path());
        runtime.initialize().unwrap();
        runtime.ensure_agent_dirs("openapi").unwrap();
        runtime.ensure_agent_dirs("meta").unwrap();

        assert_eq!(runtime.list_agents().unwrap(), vec!["meta", "openapi"]);
        assert!(runtime.agent_output_dir("meta").is_dir());
    }

    #[test]
    fn clean_cache_removes_files() {
        let temp = tempfile::tempdir().unwrap();
        let runtime = WeftRuntime::new(temp.path());
        runtime.initialize().unwrap();
        std::fs::write(runtime.cache_dir().join("a.json"), "{}").unwrap();
        std::fs::write(runtime.cache_dir().join("b.json"), "{}").unwrap();

        assert_eq!(runtime.clean_cache().unwrap(), 2);
        assert_eq!(runtime.clean_cache().unwrap(), 0);
    }

    #[test]
    fn leaked_key_is_detected() {
        let temp = tempfile::tempdir().unwrap();
        let runtime = WeftRuntime::new(temp.path());
        runtime.initialize().unwrap();
        std::fs::write(
            runtime.history_dir().join("sessions/s1.log"),
            "called with sk-ant-123",
        )
        .unwrap();

        let err = runtime.ensure_no_secrets().unwrap_err();
        assert!(matches!(err, Error::SecretLeak { .. }));
    }

    #[test]
    fn clean_runtime_passes_scan() {
        let temp = tempfile::tempdir().unwrap();
        let runtime = WeftRuntime::new(temp.path());
        runtime.initialize().unwrap();
        std::fs::write(runtime.cache_dir().join("notes.md"), "all good").unwrap();

        runtime.ensure_no_secrets().unwrap();
    }
}
