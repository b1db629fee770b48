use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::AuditRecord;
use crate::code::CodeArtifact;
use crate::{Error, Result};

/// Prompt format version written into every task file.
pub const PROMPT_SPEC_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Error,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `login` + `01-architect` -> `login-01-architect`
pub fn default_conversation_id(feature: &str, agent: &str) -> String {
    format!("{}-{}", feature.replace('/', "-"), agent)
}

#[derive(Debug, Serialize, Deserialize)]
struct PromptHeader {
    feature: String,
    agent: String,
    #[serde(default = "default_spec_version")]
    prompt_spec_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conversation_id: Option<String>,
}

fn default_spec_version() -> String {
    PROMPT_SPEC_VERSION.to_string()
}

/// A prompt waiting in an agent's `in/` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTask {
    pub feature_id: String,
    pub agent_id: String,
    pub prompt_text: String,
    pub spec_version: String,
    /// Explicit revision; `None` means the file is named by timestamp.
    pub revision: Option<u32>,
    pub conversation_id: Option<String>,
}

impl PromptTask {
    pub fn new(feature_id: &str, agent_id: &str, prompt_text: impl Into<String>) -> Self {
        Self {
            feature_id: feature_id.to_string(),
            agent_id: agent_id.to_string(),
            prompt_text: prompt_text.into(),
            spec_version: PROMPT_SPEC_VERSION.to_string(),
            revision: None,
            conversation_id: None,
        }
    }

    pub fn with_revision(mut self, revision: u32) -> Self {
        self.revision = Some(revision);
        self
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    /// Revision number, 1 when unspecified.
    pub fn revision_or_default(&self) -> u32 {
        self.revision.unwrap_or(1)
    }

    pub fn to_markdown(&self) -> Result<String> {
        let header = PromptHeader {
            feature: self.feature_id.clone(),
            agent: self.agent_id.clone(),
            prompt_spec_version: self.spec_version.clone(),
            revision: self.revision,
            conversation_id: self.conversation_id.clone(),
        };
        let yaml = serde_yaml::to_string(&header)?;
        Ok(format!("---\n{yaml}---\n\n{}", self.prompt_text))
    }

    pub fn from_markdown(content: &str) -> Result<Self> {
        let Some((frontmatter, body)) = crate::audit::split_frontmatter(content.trim_start())
        else {
            return Err(Error::invalid_task("missing YAML frontmatter"));
        };

        let header: PromptHeader = serde_yaml::from_str(frontmatter)
            .map_err(|e| Error::invalid_task(format!("bad frontmatter: {e}")))?;

        Ok(Self {
            feature_id: header.feature,
            agent_id: header.agent,
            prompt_text: body.to_string(),
            spec_version: header.prompt_spec_version,
            revision: Some(header.revision.unwrap_or(1)),
            conversation_id: header.conversation_id,
        })
    }
}

/// The outcome of processing a [`PromptTask`].
#[derive(Debug, Clone)]
pub struct ResultTask {
    pub feature_id: String,
    pub agent_id: String,
    pub output_text: String,
    pub prompt_hash: String,
    pub output_hash: String,
    pub timestamp: DateTime<Utc>,
    pub spec_version: String,
    pub code_artifact: Option<CodeArtifact>,
    pub conversation_id: Option<String>,
}

impl ResultTask {
    /// Build a result for `prompt`, hashing both sides.
    pub fn for_prompt(prompt: &PromptTask, prompt_hash: String, output_text: String) -> Self {
        Self {
            feature_id: prompt.feature_id.clone(),
            agent_id: prompt.agent_id.clone(),
            output_hash: crate::audit::hash_output(&output_text),
            output_text,
            prompt_hash,
            timestamp: Utc::now(),
            spec_version: prompt.spec_version.clone(),
            code_artifact: None,
            conversation_id: prompt.conversation_id.clone(),
        }
    }

    pub fn audit_record(&self) -> AuditRecord {
        AuditRecord {
            feature: self.feature_id.clone(),
            agent: self.agent_id.clone(),
            prompt_spec_version: self.spec_version.clone(),
            generated_at: self.timestamp,
            prompt_hash: self.prompt_hash.clone(),
            output_hash: self.output_hash.clone(),
            conversation_id: self.conversation_id.clone(),
        }
    }

    pub fn to_markdown(&self) -> String {
        format!("{}\n{}", self.audit_record().to_frontmatter(), self.output_text)
    }
}
