//! Project context shared by every command
//!
//! Resolves settings once from the working directory and hands out the
//! stores and managers commands operate on.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use weft_ai::AiBackend;
use weft_core::config::AiProvider;
use weft_core::config::user::user_config_path;
use weft_core::queue::TaskQueue;
use weft_core::{FeatureStore, Settings, UserConfig, WeftEnv, WeftRc};
use weft_git::{HistoryRepo, WorktreeManager};

use crate::error::{CliError, Result};

/// Resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub cwd: PathBuf,
    pub env: WeftEnv,
    pub settings: Settings,
    pub user: UserConfig,
}

impl Context {
    pub fn load(cwd: &Path) -> Result<Self> {
        Self::with_env(cwd, WeftEnv::from_process())
    }

    pub fn with_env(cwd: &Path, env: WeftEnv) -> Result<Self> {
        let settings = Settings::load(cwd, &env)?;
        let user = UserConfig::load_or_default(user_config_path().as_deref());
        Ok(Self {
            cwd: cwd.to_path_buf(),
            env,
            settings,
            user,
        })
    }

    /// The project root, or an error pointing at `weft init`.
    pub fn project_root(&self) -> Result<&Path> {
        Ok(self.settings.require_project_root()?)
    }

    pub fn weftrc(&self) -> Result<&WeftRc> {
        Ok(self.settings.require_weftrc()?)
    }

    /// The AI history repository, which must already be initialized.
    pub fn history(&self) -> Result<HistoryRepo> {
        let path = self.settings.require_history_path()?;
        let repo = HistoryRepo::new(path);
        if !repo.is_valid() {
            return Err(weft_git::Error::InvalidHistoryRepo {
                path: path.to_path_buf(),
            }
            .into());
        }
        Ok(repo)
    }

    pub fn queue(&self) -> Result<TaskQueue> {
        Ok(TaskQueue::new(self.settings.require_history_path()?))
    }

    pub fn store(&self) -> Result<FeatureStore> {
        Ok(FeatureStore::new(self.project_root()?))
    }

    pub fn worktrees(&self) -> Result<WorktreeManager> {
        Ok(WorktreeManager::new(&self.settings.code_repo_path)?)
    }

    pub fn base_branch(&self) -> &str {
        self.settings.base_branch()
    }

    /// Backend for the configured provider.
    pub fn backend(&self) -> Result<Arc<dyn AiBackend>> {
        let provider = match self.settings.weftrc.as_ref().map(|rc| rc.ai.provider) {
            Some(AiProvider::Local) => "local",
            Some(AiProvider::Openai) => {
                return Err(CliError::user(
                    "The openai provider is not supported. Use 'anthropic' or 'local'.",
                ));
            }
            Some(AiProvider::Anthropic) | None => "anthropic",
        };
        let backend = weft_ai::create_backend(
            provider,
            &self.settings.model,
            self.settings.api_key.as_deref(),
        )?;
        Ok(Arc::from(backend))
    }
}

/// Drive a future to completion on a fresh multi-threaded runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}
