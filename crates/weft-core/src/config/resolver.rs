//! Layered configuration lookup by dotted key

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::env::{WeftEnv, env_key};
use super::project::WeftRc;
use super::user::UserConfig;
use crate::{
    DEFAULT_BASE_BRANCH, DEFAULT_HISTORY_PATH, DEFAULT_MODEL, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_TIMEOUT_SECS, Error, Result,
};

/// Resolves dotted keys like `ai.model` across every configuration layer.
///
/// Precedence, highest first: CLI overrides, `.weftrc.yaml`, user config,
/// `WEFT_*` environment, built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli: BTreeMap<String, Value>,
    project: Option<Value>,
    user: Option<Value>,
    env: WeftEnv,
}

fn builtin_defaults() -> BTreeMap<&'static str, Value> {
    BTreeMap::from([
        ("ai.provider", Value::from("anthropic")),
        ("ai.model", Value::from(DEFAULT_MODEL)),
        ("ai.model_profile", Value::from("standard")),
        ("ai.history_path", Value::from(DEFAULT_HISTORY_PATH)),
        ("git.worktree.base_branch", Value::from(DEFAULT_BASE_BRANCH)),
        ("git.worktree.prefix", Value::from("feat/")),
        ("defaults.log_level", Value::from("info")),
        ("watcher.poll_interval", Value::from(DEFAULT_POLL_INTERVAL_SECS)),
        ("watcher.timeout", Value::from(DEFAULT_TIMEOUT_SECS)),
    ])
}

fn to_value<T: Serialize>(value: &T) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(error = %e, "Could not convert config layer");
            None
        }
    }
}

fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(root, |node, part| node.get(part))
        .filter(|v| !v.is_null())
}

fn flatten(prefix: &str, value: &Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&key, v, out);
            }
        }
        Value::Null => {}
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

impl ConfigResolver {
    pub fn new(env: WeftEnv) -> Self {
        Self {
            env,
            ..Self::default()
        }
    }

    pub fn with_project(mut self, config: &WeftRc) -> Self {
        self.project = to_value(config);
        self
    }

    pub fn with_user(mut self, config: &UserConfig) -> Self {
        self.user = to_value(config);
        self
    }

    /// Add a CLI override. `None` values are ignored so unset flags fall through.
    pub fn with_cli(mut self, key: &str, value: Option<impl Into<Value>>) -> Self {
        if let Some(value) = value {
            self.cli.insert(key.to_string(), value.into());
        }
        self
    }

    /// Resolve a non-secret key.
    pub fn resolve(&self, key: &str) -> Result<Value> {
        self.resolve_optional(key).ok_or_else(|| Error::MissingKey {
            key: key.to_string(),
        })
    }

    /// Resolve a key that must be a string (numbers and booleans are rendered).
    pub fn resolve_string(&self, key: &str) -> Result<String> {
        Ok(match self.resolve(key)? {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }

    pub fn resolve_optional(&self, key: &str) -> Option<Value> {
        if let Some(v) = self.cli.get(key).filter(|v| !v.is_null()) {
            return Some(v.clone());
        }
        for layer in [&self.project, &self.user].into_iter().flatten() {
            if let Some(v) = lookup(layer, key) {
                return Some(v.clone());
            }
        }
        if let Some(v) = self.env.raw(&env_key(key)) {
            return Some(Value::from(v));
        }
        builtin_defaults().remove(key)
    }

    /// Secrets only ever come from the environment.
    pub fn resolve_secret(&self, key: &str) -> Result<String> {
        self.env.secret(key).map(str::to_string)
    }

    /// Every known key with its effective value, for display.
    pub fn all_config(&self) -> BTreeMap<String, Value> {
        let mut out: BTreeMap<String, Value> = builtin_defaults()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        for (k, v) in self.env.weft_vars() {
            if k.ends_with("API_KEY") {
                continue;
            }
            out.insert(format!("env.{}", k.to_lowercase()), Value::from(v));
        }
        for layer in [&self.user, &self.project].into_iter().flatten() {
            flatten("", layer, &mut out);
        }
        for (k, v) in &self.cli {
            out.insert(k.clone(), v.clone());
        }
        out
    }
}
