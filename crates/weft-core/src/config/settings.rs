//! Resolved runtime settings for commands and watchers

use std::path::{Path, PathBuf};

use weft_fs::WeftPath;

use super::env::{WeftEnv, expand_home};
use super::project::{WeftRc, load_weftrc};
use super::resolver::ConfigResolver;
use super::{WeftRuntime, find_project_root};
use crate::{Error, Result};

/// Everything a command needs to locate the project and talk to a model.
#[derive(Debug, Clone)]
pub struct Settings {
    pub project_root: Option<PathBuf>,
    pub code_repo_path: PathBuf,
    pub ai_history_path: PathBuf,
    pub model: String,
    pub api_key: Option<String>,
    pub poll_interval: u64,
    pub log_level: String,
    pub weftrc: Option<WeftRc>,
}

impl Settings {
    /// Resolve settings starting from `cwd`.
    ///
    /// `WEFT_CODE_REPO_PATH` overrides project root discovery; a relative
    /// history path resolves against the code repo.
    pub fn load(cwd: &Path, env: &WeftEnv) -> Result<Self> {
        let project_root = find_project_root(cwd);
        let code_repo_path = env
            .code_repo_path()
            .or_else(|| project_root.clone())
            .unwrap_or_else(|| cwd.to_path_buf());

        let weftrc = load_weftrc(&code_repo_path.join(WeftPath::ProjectConfig))?;

        let resolver = Self::resolver(env, weftrc.as_ref());
        let ai_history_path = expand_home(&resolver.resolve_string("ai.history_path")?);
        let ai_history_path = if ai_history_path.is_absolute() {
            ai_history_path
        } else {
            code_repo_path.join(ai_history_path)
        };

        Ok(Self {
            project_root,
            code_repo_path,
            ai_history_path,
            model: resolver.resolve_string("ai.model")?,
            api_key: env.anthropic_api_key().map(str::to_string),
            poll_interval: env.poll_interval(),
            log_level: resolver.resolve_string("defaults.log_level")?.to_uppercase(),
            weftrc,
        })
    }

    /// `WEFT_AI_HISTORY_PATH`, `WEFT_MODEL` and `WEFT_LOG_LEVEL` override the
    /// project config the way command-line flags would.
    fn resolver(env: &WeftEnv, weftrc: Option<&WeftRc>) -> ConfigResolver {
        let resolver = ConfigResolver::new(env.clone())
            .with_cli("ai.history_path", env.get("AI_HISTORY_PATH"))
            .with_cli("ai.model", env.model())
            .with_cli("defaults.log_level", env.log_level());
        match weftrc {
            Some(rc) => resolver.with_project(rc),
            None => resolver,
        }
    }

    /// The project root, or an error suggesting `weft init`.
    pub fn require_project_root(&self) -> Result<&Path> {
        self.project_root
            .as_deref()
            .ok_or_else(|| Error::NotInProject {
                path: self.code_repo_path.clone(),
            })
    }

    /// The AI history path, which must already exist.
    pub fn require_history_path(&self) -> Result<&Path> {
        if self.ai_history_path.is_dir() {
            Ok(&self.ai_history_path)
        } else {
            Err(Error::HistoryPathMissing {
                path: self.ai_history_path.clone(),
            })
        }
    }

    /// The project config, or an error suggesting `weft init`.
    pub fn require_weftrc(&self) -> Result<&WeftRc> {
        self.weftrc.as_ref().ok_or_else(|| Error::NotInProject {
            path: self.code_repo_path.clone(),
        })
    }

    pub fn runtime(&self) -> WeftRuntime {
        WeftRuntime::new(&self.code_repo_path)
    }

    pub fn base_branch(&self) -> &str {
        self.weftrc
            .as_ref()
            .map(|rc| rc.git.worktree.base_branch.as_str())
            .unwrap_or(crate::DEFAULT_BASE_BRANCH)
    }
}
