//! Project configuration (`.weftrc.yaml`)

use std::path::Path;

use serde::{Deserialize, Serialize};
use weft_fs::ConfigStore;

use crate::agents::{self, AgentDescriptor};
use crate::{DEFAULT_BASE_BRANCH, DEFAULT_HISTORY_PATH, DEFAULT_MODEL, Error, Result};

/// Substrings that mark a config value as a probable credential.
const SECRET_PATTERNS: &[&str] = &[
    "api_key", "api-key", "apikey", "secret", "password", "token", "sk-ant-", "sk-", "bearer",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    #[default]
    Backend,
    Frontend,
    Fullstack,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Frontend => "frontend",
            Self::Fullstack => "fullstack",
        }
    }

    /// Agents enabled by default for this kind of project.
    pub fn default_agents(&self) -> Vec<String> {
        let names: &[&str] = match self {
            Self::Backend => &["meta", "architect", "openapi", "test"],
            Self::Frontend => &["meta", "architect", "ui", "integration", "test"],
            Self::Fullstack => &["meta", "architect", "openapi", "ui", "integration", "test"],
        };
        names.iter().map(|s| s.to_string()).collect()
    }
}

impl std::str::FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "backend" => Ok(Self::Backend),
            "frontend" => Ok(Self::Frontend),
            "fullstack" => Ok(Self::Fullstack),
            other => Err(format!(
                "Invalid project type '{other}'. Must be one of: backend, frontend, fullstack"
            )),
        }
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSection {
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendLanguage {
    pub language: Option<String>,
    pub framework: Option<String>,
    pub package_manager: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendLanguage {
    pub language: Option<String>,
    pub framework: Option<String>,
    pub state_management: Option<String>,
    pub ui_library: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestingLanguage {
    pub unit: Option<String>,
    pub integration: Option<String>,
    pub e2e: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(rename = "type")]
    pub db_type: Option<String>,
    pub orm: Option<String>,
}

/// Language and framework hints passed along to agents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub stack: Option<String>,
    pub backend: Option<BackendLanguage>,
    pub frontend: Option<FrontendLanguage>,
    pub testing: Option<TestingLanguage>,
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Anthropic,
    Openai,
    Local,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProfile {
    Fast,
    #[default]
    Standard,
    Quality,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub provider: AiProvider,
    pub model: String,
    pub model_profile: ModelProfile,
    pub history_path: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            model: DEFAULT_MODEL.to_string(),
            model_profile: ModelProfile::default(),
            history_path: DEFAULT_HISTORY_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            enabled: ProjectType::Fullstack.default_agents(),
            disabled: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorktreeConfig {
    pub base_branch: String,
    pub prefix: String,
}

impl Default for WorktreeConfig {
    fn default() -> Self {
        Self {
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            prefix: "feat/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub worktree: WorktreeConfig,
    pub ignore_patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub root: String,
    pub features: String,
    pub tasks: String,
    pub history: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: ".weft".into(),
            features: ".weft/features".into(),
            tasks: ".weft/tasks".into(),
            history: ".weft/history".into(),
        }
    }
}

/// The complete `.weftrc.yaml` schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeftRc {
    pub project: ProjectSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<LanguageConfig>,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

impl WeftRc {
    /// Default configuration for a new project, with agents chosen by type.
    pub fn new(name: &str, project_type: ProjectType) -> Self {
        Self {
            project: ProjectSection {
                name: name.to_string(),
                project_type,
            },
            language: None,
            ai: AiConfig::default(),
            agents: AgentsConfig {
                enabled: project_type.default_agents(),
                disabled: Vec::new(),
            },
            git: GitConfig::default(),
            paths: PathsConfig::default(),
        }
    }

    /// Check cross-field rules serde cannot express.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let invalid: Vec<&str> = self
            .agents
            .enabled
            .iter()
            .chain(self.agents.disabled.iter())
            .map(String::as_str)
            .filter(|name| agents::AGENTS.iter().all(|a| a.short_name != *name))
            .collect();

        if !invalid.is_empty() {
            let valid: Vec<_> = agents::AGENTS.iter().map(|a| a.short_name).collect();
            return Err(format!(
                "Invalid agents: {}\nValid agents: {}",
                invalid.join(", "),
                valid.join(", ")
            ));
        }
        Ok(())
    }

    /// Enabled and not disabled agents, in execution order.
    pub fn active_agents(&self) -> Vec<&'static AgentDescriptor> {
        agents::execution_order()
            .into_iter()
            .filter(|a| {
                self.agents.enabled.iter().any(|n| n == a.short_name)
                    && !self.agents.disabled.iter().any(|n| n == a.short_name)
            })
            .collect()
    }
}

/// True if any string anywhere in `value` looks like a credential.
pub fn contains_secrets(value: &serde_yaml::Value) -> bool {
    find_secret(value).is_some()
}

/// First string in `value` that looks like a credential.
pub fn find_secret(value: &serde_yaml::Value) -> Option<&str> {
    match value {
        serde_yaml::Value::String(s) => {
            let lower = s.to_lowercase();
            SECRET_PATTERNS
                .iter()
                .any(|p| lower.contains(p))
                .then_some(s.as_str())
        }
        serde_yaml::Value::Sequence(items) => items.iter().find_map(find_secret),
        serde_yaml::Value::Mapping(map) => map.values().find_map(find_secret),
        serde_yaml::Value::Tagged(tagged) => find_secret(&tagged.value),
        _ => None,
    }
}

/// Load and validate `.weftrc.yaml`. A missing file yields `Ok(None)`.
pub fn load_weftrc(path: &Path) -> Result<Option<WeftRc>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw: serde_yaml::Value = ConfigStore::new().load(path)?;
    if contains_secrets(&raw) {
        return Err(Error::SecretsInConfig {
            path: path.to_path_buf(),
        });
    }

    let config: WeftRc = serde_yaml::from_value(raw).map_err(|e| Error::InvalidConfig {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    config.validate().map_err(|message| Error::InvalidConfig {
        path: path.to_path_buf(),
        message,
    })?;

    tracing::debug!(path = %path.display(), project = %config.project.name, "Loaded project config");
    Ok(Some(config))
}

/// Write `.weftrc.yaml` atomically.
pub fn save_weftrc(path: &Path, config: &WeftRc) -> Result<()> {
    ConfigStore::new().save(path, config)?;
    Ok(())
}

/// Create a default `.weftrc.yaml` in `project_root` and return it.
///
/// Nothing is written if a value would trip the secret scan in
/// [`load_weftrc`].
pub fn create_default_weftrc(
    project_root: &Path,
    name: &str,
    project_type: ProjectType,
    history_path: Option<&str>,
) -> Result<WeftRc> {
    let mut config = WeftRc::new(name, project_type);
    if let Some(history) = history_path {
        config.ai.history_path = history.to_string();
    }

    let raw = serde_yaml::to_value(&config)?;
    if let Some(value) = find_secret(&raw) {
        return Err(Error::SecretLikeValue {
            value: value.to_string(),
        });
    }
    save_weftrc(&project_root.join(weft_fs::WeftPath::ProjectConfig), &config)?;
    Ok(config)
}
