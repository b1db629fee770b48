//! Queue watcher for one agent
//!
//! A watcher polls `<history>/<feature>/<agent>/in/` for prompt files, runs
//! each through its [`SpecAgent`], and writes the result to `out/`. In
//! multi-feature mode it rediscovers features on every pass.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use weft_ai::{AiBackend, Message};
use weft_core::code::{apply_patches, extract_code_blocks, has_code_patches};
use weft_core::queue::{ResultTask, TaskQueue, read_prompt};
use weft_core::{agents, audit};
use weft_fs::WeftPath;

use crate::error::Result;
use crate::spec::SpecAgent;

const FAILED_EXT: &str = "failed";

/// Settings for one [`Watcher`].
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Normalised agent id, e.g. `01-architect`
    pub agent_id: String,
    pub history_root: PathBuf,
    /// Code repository holding `worktrees/<feature>`; patches are skipped without it
    pub code_repo: Option<PathBuf>,
    /// Watch only this feature; `None` watches every feature
    pub feature: Option<String>,
    pub poll_interval: Duration,
}

impl WatcherConfig {
    /// Config for `agent` (id or short name) over `history_root`.
    pub fn new(agent: &str, history_root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            agent_id: agents::normalize_agent_id(agent)?.to_string(),
            history_root: history_root.into(),
            code_repo: None,
            feature: None,
            poll_interval: Duration::from_secs(weft_core::DEFAULT_POLL_INTERVAL_SECS),
        })
    }

    pub fn with_code_repo(mut self, repo: impl Into<PathBuf>) -> Self {
        self.code_repo = Some(repo.into());
        self
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Stops a running [`Watcher`] after its current pass.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Feature directories under `history_root` that contain agent directories.
///
/// Hidden directories are skipped. Sorted by name.
pub fn discover_features(history_root: &Path) -> Result<Vec<String>> {
    if !history_root.is_dir() {
        return Ok(Vec::new());
    }

    let mut features = Vec::new();
    let entries =
        std::fs::read_dir(history_root).map_err(|e| weft_fs::Error::io(history_root, e))?;
    for entry in entries {
        let path = entry.map_err(|e| weft_fs::Error::io(history_root, e))?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') || !path.is_dir() {
            continue;
        }
        if has_agent_dirs(&path) {
            features.push(name.to_string());
        }
    }
    features.sort();
    Ok(features)
}

fn has_agent_dirs(feature_dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(feature_dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        entry.path().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(agents::is_agent_dir_name)
    })
}

/// Polls one agent's queues and processes prompts as they arrive.
pub struct Watcher {
    config: WatcherConfig,
    agent: SpecAgent,
    backend: Arc<dyn AiBackend>,
    queue: TaskQueue,
    stop: StopHandle,
    known_features: BTreeSet<String>,
}

impl Watcher {
    pub fn new(config: WatcherConfig, agent: SpecAgent, backend: Arc<dyn AiBackend>) -> Self {
        let queue = TaskQueue::new(&config.history_root);
        Self {
            config,
            agent,
            backend,
            queue,
            stop: StopHandle::default(),
            known_features: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Handle that ends [`Watcher::run`].
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Features this pass should look at.
    fn features(&mut self) -> Result<Vec<String>> {
        if let Some(feature) = &self.config.feature {
            return Ok(vec![feature.clone()]);
        }

        let features = discover_features(&self.config.history_root)?;
        for feature in &features {
            if self.known_features.insert(feature.clone()) {
                tracing::info!(agent = %self.config.agent_id, feature = %feature, "Watching new feature");
            }
        }
        Ok(features)
    }

    /// Process every pending prompt once. Returns how many succeeded.
    ///
    /// A prompt that fails is renamed to `.failed` with an error log in the
    /// agent's `log/` directory, so it is not retried on the next pass.
    pub async fn process_once(&mut self) -> Result<usize> {
        let agent_id = self.config.agent_id.clone();
        let mut processed = 0;

        for feature in self.features()? {
            for prompt in self.queue.list_pending_prompts(&feature, &agent_id)? {
                if self.stop.is_stopped() {
                    return Ok(processed);
                }
                match self.process_prompt(&feature, &prompt).await {
                    Ok(result_path) => {
                        processed += 1;
                        tracing::info!(
                            agent = %agent_id,
                            feature = %feature,
                            result = %result_path.display(),
                            "Processed prompt"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            agent = %agent_id,
                            feature = %feature,
                            prompt = %prompt.display(),
                            error = %e,
                            "Failed to process prompt"
                        );
                        self.quarantine(&feature, &prompt, &e.to_string());
                    }
                }
            }
        }
        Ok(processed)
    }

    /// Read, generate, apply code and write the result for one prompt file.
    pub async fn process_prompt(&self, feature: &str, prompt_path: &Path) -> Result<PathBuf> {
        let task = read_prompt(prompt_path)?;

        let history = match &task.conversation_id {
            Some(id) => {
                let exchanges = self.queue.conversation_history(feature, &task.agent_id, id)?;
                Message::from_exchanges(&exchanges)
            }
            None => Vec::new(),
        };
        if !history.is_empty() {
            tracing::debug!(feature, messages = history.len(), "Continuing conversation");
        }

        let output = self.agent.process(self.backend.as_ref(), &task, &history).await?;
        let prompt_hash = audit::compute_hash(&task.prompt_text);
        let mut result = ResultTask::for_prompt(&task, prompt_hash, output);

        if has_code_patches(&result.output_text) {
            let artifact = extract_code_blocks(&result.output_text);
            self.apply_artifact(feature, &artifact);
            result.code_artifact = Some(artifact);
        }

        let path = self.queue.write_result(&result)?;
        self.queue.mark_processed(prompt_path)?;
        Ok(path)
    }

    fn apply_artifact(&self, feature: &str, artifact: &weft_core::code::CodeArtifact) {
        let Some(repo) = &self.config.code_repo else {
            tracing::debug!(feature, "No code repository configured, patches not applied");
            return;
        };
        let worktree = repo.join(WeftPath::WorktreesDir).join(feature);
        if !worktree.is_dir() {
            tracing::warn!(feature, worktree = %worktree.display(), "Worktree missing, patches not applied");
            return;
        }

        match apply_patches(&worktree, &artifact.patches) {
            Ok(results) => {
                for r in results.iter().filter(|r| r.has_issues()) {
                    tracing::warn!(
                        file = %r.file_path,
                        error = r.error.as_deref().unwrap_or_default(),
                        warning = r.warning.as_deref().unwrap_or_default(),
                        "Patch reported an issue"
                    );
                }
            }
            Err(e) => tracing::error!(feature, error = %e, "Failed to apply patches"),
        }
    }

    fn quarantine(&self, feature: &str, prompt_path: &Path, error: &str) {
        let log_dir = self.queue.log_dir(feature, &self.config.agent_id);
        let stem = prompt_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("prompt");
        let log = log_dir.join(format!("{stem}.error.log"));
        if let Err(e) = weft_fs::io::write_text(&log, &format!("{error}\n")) {
            tracing::warn!(path = %log.display(), error = %e, "Could not write error log");
        }

        let failed = prompt_path.with_extension(FAILED_EXT);
        if let Err(e) = weft_fs::io::rename(prompt_path, &failed) {
            tracing::warn!(path = %prompt_path.display(), error = %e, "Could not mark prompt as failed");
        }
    }

    /// Poll until stopped.
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(
            agent = %self.config.agent_id,
            feature = self.config.feature.as_deref().unwrap_or("*"),
            history = %self.config.history_root.display(),
            interval_secs = self.config.poll_interval.as_secs(),
            "Watcher started"
        );

        while !self.stop.is_stopped() {
            if let Err(e) = self.process_once().await {
                tracing::error!(agent = %self.config.agent_id, error = %e, "Watcher pass failed");
            }
            if self.stop.is_stopped() {
                break;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }

        tracing::info!(agent = %self.config.agent_id, "Watcher stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn discovers_features_with_agent_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("login/01-architect/in")).unwrap();
        std::fs::create_dir_all(root.join("billing/00-meta")).unwrap();
        std::fs::create_dir_all(root.join("notes/drafts")).unwrap();
        std::fs::create_dir_all(root.join(".git/00-meta")).unwrap();

        assert_eq!(discover_features(root).unwrap(), vec!["billing", "login"]);
    }

    #[test]
    fn missing_history_has_no_features() {
        let temp = tempfile::tempdir().unwrap();
        assert!(discover_features(&temp.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn config_normalizes_agent() {
        let config = WatcherConfig::new("meta", "/tmp/h").unwrap().with_feature("login");
        assert_eq!(config.agent_id, "00-meta");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert!(WatcherConfig::new("reviewer", "/tmp/h").is_err());
    }

    #[test]
    fn stop_handle_is_shared() {
        let handle = StopHandle::default();
        let other = handle.clone();
        other.stop();
        assert!(handle.is_stopped());
    }
}
