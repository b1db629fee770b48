//! Prompt submission, result waiting and the downstream agent pipeline
//!
//! Meta's output contains one `### For Agent NN (Name)` section per
//! downstream agent. [`AgentOrchestrator`] hands each agent its section plus
//! the outputs of the agents it depends on, then waits for the agent's
//! watcher to write a result.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use weft_core::agents::{self, AgentDescriptor};
use weft_core::audit::strip_frontmatter;
use weft_core::queue::{PromptTask, ResultTask, TaskQueue, default_conversation_id, read_result};

use crate::error::{AgentError, Result};

const SECTION_PREFIX: &str = "### For Agent";

/// Conversation id to attach to a submitted prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversationId {
    /// `<feature>-<agent>`
    #[default]
    Auto,
    /// Standalone prompt with no history
    None,
    Explicit(String),
}

impl ConversationId {
    pub fn resolve(&self, feature: &str, agent: &str) -> Option<String> {
        match self {
            Self::Auto => Some(default_conversation_id(feature, agent)),
            Self::None => None,
            Self::Explicit(id) => Some(id.clone()),
        }
    }
}

/// Write a prompt into an agent's `in/` queue.
pub fn submit_prompt_to_agent(
    queue: &TaskQueue,
    feature: &str,
    agent: &str,
    prompt: &str,
    revision: Option<u32>,
    conversation: &ConversationId,
) -> Result<PathBuf> {
    let mut task = PromptTask::new(feature, agent, prompt);
    task.revision = revision;
    task.conversation_id = conversation.resolve(feature, agent);

    let path = queue.write_prompt(&task)?;
    tracing::info!(feature, agent, path = %path.display(), "Submitted prompt");
    Ok(path)
}

/// Poll `out/` until a result written at or after `since` appears.
///
/// Returns the newest such result, or `None` when `timeout` elapses.
pub async fn wait_for_agent_result(
    queue: &TaskQueue,
    feature: &str,
    agent: &str,
    since: SystemTime,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Option<ResultTask>> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(path) = queue.results_since(feature, agent, since)?.pop() {
            tracing::debug!(feature, agent, path = %path.display(), "Result arrived");
            return Ok(Some(read_result(&path)?));
        }

        let now = tokio::time::Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}

/// The part of Meta's output addressed to `agent`.
///
/// The section starts at the line naming the agent and ends before the next
/// `### For Agent` heading or a `---` rule. Without a matching heading the
/// whole output is returned.
pub fn extract_agent_section(meta_output: &str, agent: &AgentDescriptor) -> String {
    let header = format!("For Agent {} ({}", agent.ordinal(), agent.display_name);
    let lines: Vec<&str> = meta_output.lines().collect();

    let Some(start) = lines.iter().position(|line| line.contains(&header)) else {
        tracing::warn!(agent = agent.id, "No section for agent in Meta output, using full output");
        return meta_output.to_string();
    };

    let end = lines[start + 1..]
        .iter()
        .position(|line| line.starts_with(SECTION_PREFIX) || line.trim() == "---")
        .map_or(lines.len(), |offset| start + 1 + offset);

    lines[start..end].join("\n").trim().to_string()
}

/// Agents whose latest output is passed to `agent` as context.
fn upstream_of(agent: &str) -> &'static [&'static str] {
    match agent {
        agents::OPENAPI => &[agents::ARCHITECT],
        agents::UI => &[agents::ARCHITECT, agents::OPENAPI],
        agents::INTEGRATION => &[agents::ARCHITECT, agents::OPENAPI, agents::UI],
        agents::TEST => &[
            agents::ARCHITECT,
            agents::OPENAPI,
            agents::UI,
            agents::INTEGRATION,
        ],
        _ => &[],
    }
}

/// Heading an upstream output is filed under in a downstream prompt.
fn context_heading(agent: &AgentDescriptor) -> &'static str {
    match agent.id {
        agents::ARCHITECT => "Architect Design",
        agents::OPENAPI => "OpenAPI Specification",
        _ => agent.display_name,
    }
}

/// Modification time of a submitted prompt, on the filesystem's clock.
///
/// Result files are compared against this rather than the process clock,
/// which can run ahead of file timestamps. The watcher may already have
/// renamed the prompt to `.processed`.
pub fn submitted_at(prompt: &Path, fallback: SystemTime) -> SystemTime {
    [prompt.to_path_buf(), prompt.with_extension("processed")]
        .iter()
        .find_map(|p| std::fs::metadata(p).and_then(|m| m.modified()).ok())
        .map_or(fallback, |t| t.min(fallback))
}

/// What to do after an agent produced no result in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Wait again for the same prompt
    Retry,
    /// Continue with the next agent
    Skip,
    /// Stop the pipeline
    Abort,
}

/// Progress callbacks for [`AgentOrchestrator::run`].
pub trait PipelineObserver {
    fn on_agent_start(&mut self, _agent: &AgentDescriptor) {}

    fn on_submitted(&mut self, _agent: &AgentDescriptor, _prompt: &Path) {}

    fn on_agent_complete(&mut self, _agent: &AgentDescriptor, _result: &ResultTask) {}

    /// Decide how to continue after `error`. Aborts by default.
    fn on_failure(&mut self, _agent: &AgentDescriptor, _error: &AgentError) -> FailureAction {
        FailureAction::Abort
    }
}

/// Observer that only logs and aborts on failure.
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl PipelineObserver for LoggingObserver {}

/// Summary of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub completed: Vec<String>,
    pub skipped: Vec<String>,
    /// Agent at which the run was aborted
    pub aborted_at: Option<String>,
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        self.aborted_at.is_none()
    }
}

/// Runs downstream agents for one feature, in order.
#[derive(Debug, Clone)]
pub struct AgentOrchestrator {
    queue: TaskQueue,
    feature: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl AgentOrchestrator {
    pub fn new(history_root: impl Into<PathBuf>, feature: &str) -> Self {
        Self {
            queue: TaskQueue::new(history_root),
            feature: feature.to_string(),
            timeout: Duration::from_secs(weft_core::DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(weft_core::DEFAULT_POLL_INTERVAL_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Latest output of `agent`, without frontmatter.
    pub fn latest_output(&self, agent: &str) -> Result<Option<String>> {
        let Some(path) = self.queue.latest_result(&self.feature, agent)? else {
            return Ok(None);
        };
        let content = weft_fs::io::read_text(&path)?;
        Ok(Some(strip_frontmatter(&content).trim().to_string()))
    }

    pub fn meta_output(&self) -> Result<String> {
        self.latest_output(agents::META)?
            .ok_or_else(|| AgentError::MissingMetaOutput {
                feature: self.feature.clone(),
            })
    }

    /// Prompt for `agent`: its Meta section followed by upstream outputs.
    pub fn agent_input(&self, agent: &AgentDescriptor, meta_output: &str) -> Result<String> {
        let section = extract_agent_section(meta_output, agent);

        let mut previous = Vec::new();
        for upstream in upstream_of(agent.id) {
            match self.latest_output(upstream)? {
                Some(output) => previous.push((context_heading(agents::resolve(upstream)?), output)),
                None => tracing::debug!(agent = agent.id, upstream, "No upstream output yet"),
            }
        }

        if previous.is_empty() {
            return Ok(section);
        }

        let mut input = format!("{section}\n\n---\n\n# Previous Agent Outputs\n");
        for (name, output) in previous {
            input.push_str(&format!("\n## {name}\n\n{output}\n"));
        }
        Ok(input)
    }

    /// Submit to and wait for each agent in `pipeline`.
    ///
    /// Meta is skipped; its output is the pipeline's input.
    pub async fn run(
        &self,
        pipeline: &[&'static AgentDescriptor],
        observer: &mut dyn PipelineObserver,
    ) -> Result<PipelineOutcome> {
        let meta_output = self.meta_output()?;
        let mut outcome = PipelineOutcome::default();

        for &agent in pipeline {
            if agent.id == agents::META {
                tracing::debug!("Meta runs during feature creation, skipping");
                continue;
            }

            observer.on_agent_start(agent);
            let input = self.agent_input(agent, &meta_output)?;

            let before = SystemTime::now();
            let prompt = submit_prompt_to_agent(
                &self.queue,
                &self.feature,
                agent.id,
                &input,
                None,
                &ConversationId::Auto,
            )?;
            observer.on_submitted(agent, &prompt);
            let since = submitted_at(&prompt, before);

            loop {
                let waited = wait_for_agent_result(
                    &self.queue,
                    &self.feature,
                    agent.id,
                    since,
                    self.timeout,
                    self.poll_interval,
                )
                .await?;

                if let Some(result) = waited {
                    observer.on_agent_complete(agent, &result);
                    outcome.completed.push(agent.id.to_string());
                    break;
                }

                let error = AgentError::Timeout {
                    agent: agent.id.to_string(),
                    seconds: self.timeout.as_secs(),
                };
                tracing::warn!(feature = %self.feature, agent = agent.id, "Agent timed out");
                match observer.on_failure(agent, &error) {
                    FailureAction::Retry => continue,
                    FailureAction::Skip => {
                        outcome.skipped.push(agent.id.to_string());
                        break;
                    }
                    FailureAction::Abort => {
                        outcome.aborted_at = Some(agent.id.to_string());
                        return Ok(outcome);
                    }
                }
            }
        }
        Ok(outcome)
    }
}
