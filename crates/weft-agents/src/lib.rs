//! Agents, watchers and orchestration for weft
//!
//! - [`SpecAgent`]: one role, defined by a Markdown prompt spec, that wraps
//!   user input and validates model output
//! - [`AgentManager`]: discovers the agents and where their specs come from
//! - [`Watcher`]: polls an agent's `in/` queues and writes results to `out/`
//! - [`AgentOrchestrator`]: feeds Meta's brief and upstream outputs through
//!   the downstream agents in order

pub mod discovery;
pub mod error;
pub mod orchestration;
pub mod spec;
pub mod types;
pub mod watcher;

pub use discovery::AgentManager;
pub use error::{AgentError, Result};
pub use orchestration::{
    AgentOrchestrator, ConversationId, FailureAction, LoggingObserver, PipelineObserver,
    PipelineOutcome, extract_agent_section, submit_prompt_to_agent, submitted_at,
    wait_for_agent_result,
};
pub use spec::SpecAgent;
pub use types::{AgentInfo, HealthReport, SpecSource};
pub use watcher::{StopHandle, Watcher, WatcherConfig, discover_features};
