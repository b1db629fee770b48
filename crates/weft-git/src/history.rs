//! The AI history repository
//!
//! Layout: `<root>/<feature>/<agent>/{in,out,log}` plus per-feature
//! `COMPLETED.md` / `DROPPED.md` markers. The repository is committed to
//! whenever a feature reaches a terminal state.

use std::path::{Path, PathBuf};

use git2::{IndexAddOption, Repository, Signature};

use crate::{Error, Result};

/// Subdirectories every agent directory must contain.
pub const AGENT_SUBDIRS: [&str; 3] = ["in", "out", "log"];

/// Handle on an AI history repository.
#[derive(Debug, Clone)]
pub struct HistoryRepo {
    root: PathBuf,
}

impl HistoryRepo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if needed and `git init` it. Idempotent.
    pub fn initialize(&self) -> Result<()> {
        weft_fs::io::ensure_dir(&self.root)?;
        if self.is_valid() {
            tracing::debug!(path = %self.root.display(), "History repository already initialized");
            return Ok(());
        }
        Repository::init(&self.root)?;
        tracing::info!(path = %self.root.display(), "Initialized AI history repository");
        Ok(())
    }

    /// True if the root is a directory holding a usable git repository.
    pub fn is_valid(&self) -> bool {
        self.root.is_dir() && self.root.join(".git").exists() && Repository::open(&self.root).is_ok()
    }

    fn ensure_valid(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::InvalidHistoryRepo {
                path: self.root.clone(),
            })
        }
    }

    pub fn feature_dir(&self, feature_id: &str) -> PathBuf {
        self.root.join(feature_id)
    }

    pub fn agent_dir(&self, feature_id: &str, agent_id: &str) -> PathBuf {
        self.feature_dir(feature_id).join(agent_id)
    }

    /// Create `<feature>/<agent>/{in,out,log}` for every agent.
    pub fn create_feature_structure(&self, feature_id: &str, agents: &[&str]) -> Result<PathBuf> {
        self.ensure_valid()?;
        let feature_dir = self.feature_dir(feature_id);
        for agent in agents {
            for sub in AGENT_SUBDIRS {
                weft_fs::io::ensure_dir(&feature_dir.join(agent).join(sub))?;
            }
        }
        tracing::debug!(feature = feature_id, agents = agents.len(), "Created history structure");
        Ok(feature_dir)
    }

    /// Agent directories of a feature that have the full `in/out/log` layout, sorted.
    pub fn feature_agents(&self, feature_id: &str) -> Result<Vec<String>> {
        self.ensure_valid()?;
        let feature_dir = self.feature_dir(feature_id);
        if !feature_dir.exists() {
            return Err(Error::FeatureNotFound { path: feature_dir });
        }

        let entries =
            std::fs::read_dir(&feature_dir).map_err(|e| weft_fs::Error::io(&feature_dir, e))?;
        let mut agents: Vec<String> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir() && AGENT_SUBDIRS.iter().all(|s| p.join(s).is_dir()))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect();
        agents.sort();
        Ok(agents)
    }

    /// Write a marker file (e.g. `DROPPED.md`) into the feature directory.
    pub fn write_marker(&self, feature_id: &str, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.feature_dir(feature_id).join(name);
        weft_fs::io::write_text(&path, content)?;
        Ok(path)
    }

    pub fn has_marker(&self, feature_id: &str, name: &str) -> bool {
        self.feature_dir(feature_id).join(name).exists()
    }

    /// Remove everything recorded for a feature.
    pub fn delete_feature(&self, feature_id: &str) -> Result<()> {
        let dir = self.feature_dir(feature_id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| weft_fs::Error::io(&dir, e))?;
            tracing::info!(feature = feature_id, "Deleted AI history");
        }
        Ok(())
    }

    /// Stage all changes under `paths` (relative to the root) and commit.
    ///
    /// Returns the new commit id, or `None` if nothing changed.
    pub fn commit(&self, paths: &[&str], message: &str) -> Result<Option<String>> {
        let repo = Repository::open(&self.root)?;
        let mut index = repo.index()?;
        index.add_all(paths.iter().copied(), IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let tree_id = index.write_tree()?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        if let Some(parent) = &parent
            && parent.tree_id() == tree_id
        {
            return Ok(None);
        }

        let tree = repo.find_tree(tree_id)?;
        let signature = repo
            .signature()
            .or_else(|_| Signature::now("weft", "weft@localhost"))?;
        let parents: Vec<_> = parent.iter().collect();
        let oid = repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;

        tracing::debug!(%oid, message, "Committed to AI history");
        Ok(Some(oid.to_string()))
    }
}
