//! Per-user configuration (`<config_dir>/weft/config.yaml`)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use weft_fs::ConfigStore;

use super::project::contains_secrets;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDefaults {
    pub provider: String,
    pub model_profile: String,
    pub log_level: String,
}

impl Default for UserDefaults {
    fn default() -> Self {
        Self {
            provider: "anthropic".into(),
            model_profile: "standard".into(),
            log_level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserNotifications {
    pub enabled: bool,
    pub sound: bool,
}

impl Default for UserNotifications {
    fn default() -> Self {
        Self {
            enabled: false,
            sound: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserEditor {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for UserEditor {
    fn default() -> Self {
        Self {
            command: "vim".into(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserGit {
    pub auto_commit: bool,
    /// Supports `{agent}` and `{feature}` placeholders
    pub commit_message: String,
}

impl Default for UserGit {
    fn default() -> Self {
        Self {
            auto_commit: false,
            commit_message: "weft: {agent} completed {feature}".into(),
        }
    }
}

impl UserGit {
    pub fn render_commit_message(&self, agent: &str, feature: &str) -> String {
        self.commit_message
            .replace("{agent}", agent)
            .replace("{feature}", feature)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub defaults: UserDefaults,
    pub notifications: UserNotifications,
    pub editor: UserEditor,
    pub git: UserGit,
}

/// Directory holding `weft/config.yaml`.
///
/// `XDG_CONFIG_HOME` wins when set, otherwise the platform config dir.
pub fn user_config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .map(|base| base.join("weft"))
}

pub fn user_config_path() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join("config.yaml"))
}

impl UserConfig {
    /// Load from an explicit path, failing on invalid content.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw: serde_yaml::Value = ConfigStore::new().load(path)?;
        if raw.is_null() {
            return Ok(Self::default());
        }
        if contains_secrets(&raw) {
            return Err(Error::SecretsInConfig {
                path: path.to_path_buf(),
            });
        }
        serde_yaml::from_value(raw).map_err(|e| Error::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load the user's config, falling back to defaults with a warning.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not load user config, using defaults");
                Self::default()
            }
        }
    }

    /// Write this config to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        ConfigStore::new().save(path, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "editor:\n  command: code\n  args: [--wait]\n").unwrap();

        let config = UserConfig::load_from(&path).unwrap();

        assert_eq!(config.editor.command, "code");
        assert_eq!(config.editor.args, vec!["--wait".to_string()]);
        assert_eq!(config.defaults.log_level, "info");
        assert!(config.notifications.sound);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "defaults: [not, a, map]\n").unwrap();

        assert!(UserConfig::load_from(&path).is_err());
        assert_eq!(UserConfig::load_or_default(Some(&path)), UserConfig::default());
    }

    #[test]
    fn save_then_load() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("weft/config.yaml");
        let mut config = UserConfig::default();
        config.git.auto_commit = true;

        config.save(&path).unwrap();

        assert_eq!(UserConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn commit_message_placeholders() {
        let git = UserGit::default();
        assert_eq!(
            git.render_commit_message("01-architect", "login"),
            "weft: 01-architect completed login"
        );
    }
}
