//! The fixed catalogue of weft agents
//!
//! Six roles run in a fixed sequence per feature. Each is identified by a
//! two-digit ordinal plus a short name (`00-meta`), which is also the name of
//! its directory in the AI history repository.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Pipeline stage an agent belongs to. Declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Specification,
    Architecture,
    Implementation,
    Validation,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Specification => "specification",
            Self::Architecture => "architecture",
            Self::Implementation => "implementation",
            Self::Validation => "validation",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of one agent role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentDescriptor {
    /// Directory id, e.g. `01-architect`
    pub id: &'static str,
    /// Name used in `.weftrc.yaml`, e.g. `architect`
    pub short_name: &'static str,
    /// Human-facing name, e.g. `Architect`
    pub display_name: &'static str,
    pub stage: Stage,
    pub order_in_stage: u32,
    pub description: &'static str,
    /// Markers that must appear in the agent's output
    pub required_sections: &'static [&'static str],
    /// File name of the prompt spec under `prompts/v1.0.0/`
    pub spec_filename: &'static str,
}

impl AgentDescriptor {
    /// Two-digit ordinal, e.g. `01`.
    pub fn ordinal(&self) -> &'static str {
        let id: &'static str = self.id;
        &id[..2]
    }
}

pub const META: &str = "00-meta";
pub const ARCHITECT: &str = "01-architect";
pub const OPENAPI: &str = "02-openapi";
pub const UI: &str = "03-ui";
pub const INTEGRATION: &str = "04-integration";
pub const TEST: &str = "05-test";

pub static AGENTS: [AgentDescriptor; 6] = [
    AgentDescriptor {
        id: META,
        short_name: "meta",
        display_name: "Meta",
        stage: Stage::Specification,
        order_in_stage: 0,
        description: "feature understanding and prompt generation for downstream agents",
        required_sections: &[],
        spec_filename: "00_meta.md",
    },
    AgentDescriptor {
        id: ARCHITECT,
        short_name: "architect",
        display_name: "Architect",
        stage: Stage::Architecture,
        order_in_stage: 0,
        description: "domain modeling and technical architecture",
        required_sections: &[
            "## Domain Model",
            "## Use Cases",
            "## API Requirements",
            "## Data Flow",
            "## Trade-offs",
        ],
        spec_filename: "01_architect.md",
    },
    AgentDescriptor {
        id: OPENAPI,
        short_name: "openapi",
        display_name: "OpenAPI",
        stage: Stage::Implementation,
        order_in_stage: 0,
        description: "OpenAPI 3.0 contract generation",
        required_sections: &["openapi:", "info:", "paths:", "components:"],
        spec_filename: "02_openapi.md",
    },
    AgentDescriptor {
        id: UI,
        short_name: "ui",
        display_name: "UI",
        stage: Stage::Implementation,
        order_in_stage: 1,
        description: "frontend skeleton and component design",
        required_sections: &[
            "# UI Skeleton:",
            "## Component Hierarchy",
            "## Routing Structure",
            "## Component Specifications",
        ],
        spec_filename: "03_ui.md",
    },
    AgentDescriptor {
        id: INTEGRATION,
        short_name: "integration",
        display_name: "Integration",
        stage: Stage::Implementation,
        order_in_stage: 2,
        description: "wiring the frontend to the API",
        required_sections: &[
            "# Integration Layer:",
            "## API Client Configuration",
            "## API Service Layer",
            "## Data Fetching Strategy",
        ],
        spec_filename: "04_integration.md",
    },
    AgentDescriptor {
        id: TEST,
        short_name: "test",
        display_name: "Test",
        stage: Stage::Validation,
        order_in_stage: 0,
        description: "test generation and verification",
        required_sections: &[],
        spec_filename: "05_test.md",
    },
];

/// Look up an agent by id (`01-architect`) or short name (`architect`).
pub fn find(name: &str) -> Option<&'static AgentDescriptor> {
    AGENTS
        .iter()
        .find(|a| a.id == name || a.short_name == name)
}

/// Like [`find`] but returns an error listing the valid ids.
pub fn resolve(name: &str) -> Result<&'static AgentDescriptor> {
    find(name).ok_or_else(|| Error::UnknownAgent {
        name: name.to_string(),
        valid: AGENTS.iter().map(|a| a.id).collect::<Vec<_>>().join(", "),
    })
}

/// Map a short name to its directory id; ids pass through unchanged.
pub fn normalize_agent_id(name: &str) -> Result<&'static str> {
    resolve(name).map(|a| a.id)
}

/// All agents sorted by stage, then by order within the stage.
pub fn execution_order() -> Vec<&'static AgentDescriptor> {
    let mut ordered: Vec<_> = AGENTS.iter().collect();
    ordered.sort_by_key(|a| (a.stage, a.order_in_stage));
    ordered
}

/// True if `name` looks like an agent directory (`00-` … `05-`).
pub fn is_agent_dir_name(name: &str) -> bool {
    AGENTS
        .iter()
        .any(|a| name.starts_with(&format!("{}-", a.ordinal())))
}
