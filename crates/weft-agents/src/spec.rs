//! Spec-driven agents
//!
//! Each agent's behaviour is a Markdown prompt spec. A project may override
//! the built-in spec by placing its own copy under
//! `.weft/prompts/v1.0.0/<file>`.

use std::path::{Path, PathBuf};

use weft_ai::{AiBackend, Message};
use weft_core::queue::PromptTask;
use weft_core::{AgentDescriptor, WeftRuntime};

use crate::error::{AgentError, Result};
use crate::types::SpecSource;

/// Version directory for prompt specs inside `.weft/prompts/`.
pub const SPEC_VERSION_DIR: &str = "v1.0.0";

const DEFAULT_SPEC_VERSION: &str = "1.0.0";

/// Built-in prompt specs, keyed by file name.
pub const BUILTIN_SPECS: [(&str, &str); 6] = [
    ("00_meta.md", include_str!("../specs/00_meta.md")),
    ("01_architect.md", include_str!("../specs/01_architect.md")),
    ("02_openapi.md", include_str!("../specs/02_openapi.md")),
    ("03_ui.md", include_str!("../specs/03_ui.md")),
    ("04_integration.md", include_str!("../specs/04_integration.md")),
    ("05_test.md", include_str!("../specs/05_test.md")),
];

pub fn builtin_spec(filename: &str) -> Option<&'static str> {
    BUILTIN_SPECS
        .iter()
        .find(|(name, _)| *name == filename)
        .map(|(_, body)| *body)
}

/// `.weft/prompts/v1.0.0` for a project.
pub fn project_spec_dir(project_root: &Path) -> PathBuf {
    WeftRuntime::new(project_root)
        .prompts_dir()
        .join(SPEC_VERSION_DIR)
}

/// Copy the built-in specs into the project, keeping existing files.
///
/// Returns the paths that were written.
pub fn install_builtin_specs(project_root: &Path) -> Result<Vec<PathBuf>> {
    let dir = project_spec_dir(project_root);
    weft_fs::io::ensure_dir(&dir)?;
    let mut written = Vec::new();
    for (name, body) in BUILTIN_SPECS {
        let path = dir.join(name);
        if path.exists() {
            continue;
        }
        weft_fs::io::write_text(&path, body)?;
        written.push(path);
    }
    Ok(written)
}

/// Extract `x.y.z` from a `**Version:** x.y.z` line.
pub fn parse_spec_version(spec: &str) -> Option<&str> {
    spec.lines().find_map(|line| {
        line.trim()
            .strip_prefix("**Version:**")
            .map(str::trim)
            .filter(|v| !v.is_empty())
    })
}

/// One agent role bound to its prompt spec.
#[derive(Debug, Clone)]
pub struct SpecAgent {
    descriptor: &'static AgentDescriptor,
    spec: String,
    source: SpecSource,
}

impl SpecAgent {
    /// Load the agent's spec, preferring the project's copy.
    pub fn load(descriptor: &'static AgentDescriptor, project_root: Option<&Path>) -> Result<Self> {
        if let Some(root) = project_root {
            let path = project_spec_dir(root).join(descriptor.spec_filename);
            if path.is_file() {
                let spec = std::fs::read_to_string(&path).map_err(|e| AgentError::SpecUnreadable {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                tracing::debug!(agent = descriptor.id, path = %path.display(), "Loaded project prompt spec");
                return Ok(Self {
                    descriptor,
                    spec,
                    source: SpecSource::Project(path),
                });
            }
        }

        let spec = builtin_spec(descriptor.spec_filename).unwrap_or_default();
        Ok(Self {
            descriptor,
            spec: spec.to_string(),
            source: SpecSource::BuiltIn,
        })
    }

    /// An agent with an explicit spec body.
    pub fn with_spec(descriptor: &'static AgentDescriptor, spec: impl Into<String>) -> Self {
        Self {
            descriptor,
            spec: spec.into(),
            source: SpecSource::BuiltIn,
        }
    }

    pub fn descriptor(&self) -> &'static AgentDescriptor {
        self.descriptor
    }

    pub fn id(&self) -> &'static str {
        self.descriptor.id
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }

    pub fn source(&self) -> &SpecSource {
        &self.source
    }

    pub fn spec_version(&self) -> &str {
        parse_spec_version(&self.spec).unwrap_or(DEFAULT_SPEC_VERSION)
    }

    /// Wrap `input` in the agent's role and spec.
    pub fn build_prompt(&self, input: &str) -> String {
        format!(
            "You are {name} agent, responsible for {description}.\n\n\
             Your role and behavior are defined by this specification:\n\n\
             {spec}\n\n---\n\n\
             You have received this input:\n\n\
             {input}\n\n---\n\n\
             Please process this input according to your role specification above.\n\
             Generate output that follows the format and requirements specified in your role definition.",
            name = self.descriptor.display_name,
            description = self.descriptor.description,
            spec = self.spec,
        )
    }

    /// Required sections absent from `output`.
    pub fn missing_sections(&self, output: &str) -> Vec<String> {
        self.descriptor
            .required_sections
            .iter()
            .filter(|section| !output.contains(*section))
            .map(|s| s.to_string())
            .collect()
    }

    /// Run `task` through `backend` and validate the output.
    pub async fn process(
        &self,
        backend: &dyn AiBackend,
        task: &PromptTask,
        history: &[Message],
    ) -> Result<String> {
        if task.prompt_text.trim().is_empty() {
            return Err(AgentError::EmptyPrompt {
                agent: self.id().to_string(),
            });
        }

        let prompt = self.build_prompt(&task.prompt_text);
        let output = backend.generate(&prompt, history).await?;

        let missing = self.missing_sections(&output);
        if !missing.is_empty() {
            return Err(AgentError::MissingSections {
                agent: self.id().to_string(),
                missing,
            });
        }
        Ok(output)
    }
}
