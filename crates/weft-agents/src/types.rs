//! Shared types for agent operations

use std::path::PathBuf;

use serde::Serialize;

/// Where an agent's prompt spec was loaded from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "path")]
pub enum SpecSource {
    /// `.weft/prompts/v1.0.0/<file>` in the project
    Project(PathBuf),
    /// Compiled into the binary
    BuiltIn,
}

impl std::fmt::Display for SpecSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project(path) => write!(f, "{}", path.display()),
            Self::BuiltIn => f.write_str("built-in"),
        }
    }
}

/// Information about a discovered agent
#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    /// Agent id, e.g. `01-architect`
    pub id: String,
    pub name: String,
    pub stage: String,
    pub spec_version: String,
    pub spec_source: SpecSource,
    /// Whether `.weftrc.yaml` enables this agent
    pub enabled: bool,
}

/// Health report for the agent subsystem
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// True when an API key is present and every enabled agent has a spec
    pub available: bool,
    pub api_key_present: bool,
    pub agents: Vec<AgentInfo>,
    /// Human-readable status messages
    pub messages: Vec<String>,
}
