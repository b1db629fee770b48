//! `WEFT_*` environment variables
//!
//! [`WeftEnv`] snapshots the relevant variables once so the rest of the code
//! (and tests) never touch the process environment directly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::{DEFAULT_POLL_INTERVAL_SECS, Error, Result};

/// Strings that must never appear in the AI history repository.
const HISTORY_LEAK_PATTERNS: &[&str] = &[
    "WEFT_ANTHROPIC_API_KEY",
    "WEFT_OPENAI_API_KEY",
    "sk-ant-",
    "sk-",
];

pub const ENV_PREFIX: &str = "WEFT_";

/// Snapshot of the environment variables weft cares about.
#[derive(Debug, Clone, Default)]
pub struct WeftEnv {
    vars: HashMap<String, String>,
}

impl WeftEnv {
    /// Capture `WEFT_*` variables plus the unprefixed `ANTHROPIC_API_KEY`.
    pub fn from_process() -> Self {
        Self::from_pairs(std::env::vars())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(ENV_PREFIX) || k == "ANTHROPIC_API_KEY")
            .collect();
        Self { vars }
    }

    /// Raw lookup of a full variable name.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// `WEFT_<KEY>` with the key uppercased.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw(&env_key(key))
    }

    /// All `WEFT_*` variables with the prefix stripped.
    pub fn weft_vars(&self) -> HashMap<String, String> {
        self.vars
            .iter()
            .filter_map(|(k, v)| k.strip_prefix(ENV_PREFIX).map(|s| (s.to_string(), v.clone())))
            .collect()
    }

    /// Secret lookup: environment only, never files.
    pub fn secret(&self, key: &str) -> Result<&str> {
        let env_key = env_key(key);
        self.raw(&env_key).ok_or(Error::MissingSecret { env_key })
    }

    /// `WEFT_ANTHROPIC_API_KEY`, then `ANTHROPIC_API_KEY`.
    pub fn anthropic_api_key(&self) -> Option<&str> {
        self.raw("WEFT_ANTHROPIC_API_KEY")
            .or_else(|| self.raw("ANTHROPIC_API_KEY"))
    }

    pub fn code_repo_path(&self) -> Option<PathBuf> {
        self.get("CODE_REPO_PATH").map(expand_home)
    }

    pub fn ai_history_path(&self) -> Option<PathBuf> {
        self.get("AI_HISTORY_PATH").map(expand_home)
    }

    pub fn model(&self) -> Option<&str> {
        self.get("MODEL")
    }

    /// Poll interval in seconds; absent or unparsable values give the default.
    pub fn poll_interval(&self) -> u64 {
        self.get("POLL_INTERVAL")
            .and_then(|v| v.trim().parse().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.get("LOG_LEVEL")
    }
}

/// `ai.model` -> `WEFT_AI_MODEL`
pub fn env_key(key: &str) -> String {
    format!("{ENV_PREFIX}{}", key.to_uppercase().replace('.', "_"))
}

/// Read a single `WEFT_<KEY>` from the process environment.
pub fn get_env_var(key: &str) -> Option<String> {
    std::env::var(env_key(key)).ok().filter(|v| !v.is_empty())
}

/// Fail if any text file in the AI history repo contains an API key or its variable name.
pub fn ensure_no_env_in_history(history_root: &Path) -> Result<()> {
    if !history_root.is_dir() {
        return Ok(());
    }
    super::runtime::scan_for_leaks(history_root, HISTORY_LEAK_PATTERNS)
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return home;
    }
    PathBuf::from(path)
}
