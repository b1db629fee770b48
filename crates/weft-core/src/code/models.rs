use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchAction {
    #[default]
    Create,
    Update,
    Delete,
}

impl PatchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::str::FromStr for PatchAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(format!("Unknown patch action '{other}'")),
        }
    }
}

impl std::fmt::Display for PatchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file operation extracted from model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePatch {
    /// Path relative to the worktree root
    pub file_path: String,
    pub content: String,
    pub language: String,
    pub action: PatchAction,
}

/// All patches found in one agent output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeArtifact {
    pub patches: Vec<CodePatch>,
    pub summary: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl CodeArtifact {
    pub fn file_count(&self) -> usize {
        self.patches.len()
    }

    pub fn file_paths(&self) -> Vec<&str> {
        self.patches.iter().map(|p| p.file_path.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

/// Outcome of applying one [`CodePatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub success: bool,
    pub file_path: String,
    pub error: Option<String>,
    pub warning: Option<String>,
}

impl ApplyResult {
    pub(crate) fn ok(file_path: &str) -> Self {
        Self {
            success: true,
            file_path: file_path.to_string(),
            error: None,
            warning: None,
        }
    }

    pub(crate) fn warn(file_path: &str, warning: impl Into<String>) -> Self {
        Self {
            warning: Some(warning.into()),
            ..Self::ok(file_path)
        }
    }

    pub(crate) fn failed(file_path: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            file_path: file_path.to_string(),
            error: Some(error.into()),
            warning: None,
        }
    }

    pub fn has_issues(&self) -> bool {
        !self.success || self.warning.is_some()
    }
}
