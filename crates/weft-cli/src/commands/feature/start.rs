//! `weft feature start`
//!
//! Runs the downstream agents over the accepted brief and moves the feature
//! to ready once every agent has answered.

use std::path::Path;
use std::time::{Duration, Instant};

use colored::Colorize;
use weft_agents::{AgentError, AgentOrchestrator, FailureAction, PipelineObserver};
use weft_core::agents::{self, META};
use weft_core::queue::ResultTask;
use weft_core::{AgentDescriptor, DEFAULT_TIMEOUT_SECS, FeatureState, FeatureStatus, FeatureStore};

use crate::cli::FailureChoice;
use crate::context::{Context, block_on};
use crate::error::{CliError, Result};
use crate::interactive;

/// Prints pipeline progress and decides what to do on timeouts.
pub struct CliObserver {
    on_failure: Option<FailureChoice>,
    started: Option<Instant>,
}

impl CliObserver {
    pub fn new(on_failure: Option<FailureChoice>) -> Self {
        Self {
            on_failure,
            started: None,
        }
    }
}

impl From<FailureChoice> for FailureAction {
    fn from(choice: FailureChoice) -> Self {
        match choice {
            FailureChoice::Retry => FailureAction::Retry,
            FailureChoice::Skip => FailureAction::Skip,
            FailureChoice::Abort => FailureAction::Abort,
        }
    }
}

impl PipelineObserver for CliObserver {
    fn on_agent_start(&mut self, agent: &AgentDescriptor) {
        self.started = Some(Instant::now());
        println!(
            "{} Running {} agent...",
            "=>".blue().bold(),
            agent.display_name.cyan()
        );
    }

    fn on_submitted(&mut self, agent: &AgentDescriptor, prompt: &Path) {
        tracing::debug!(agent = agent.id, prompt = %prompt.display(), "Waiting for result");
    }

    fn on_agent_complete(&mut self, agent: &AgentDescriptor, result: &ResultTask) {
        let elapsed = self.started.map(|s| s.elapsed().as_secs()).unwrap_or(0);
        let patches = result
            .code_artifact
            .as_ref()
            .map(|a| a.file_count())
            .unwrap_or(0);
        let mut line = format!(
            "{} {} finished in {}s",
            "OK".green().bold(),
            agent.display_name,
            elapsed
        );
        if patches > 0 {
            line.push_str(&format!(", {patches} file(s) staged"));
        }
        println!("{line}");
    }

    fn on_failure(&mut self, agent: &AgentDescriptor, error: &AgentError) -> FailureAction {
        println!("{}: {}", "warning".yellow(), error);
        if let Some(choice) = self.on_failure {
            return choice.into();
        }
        match interactive::select_failure_action(agent.display_name) {
            Ok(action) => action,
            Err(e) => {
                tracing::warn!(error = %e, "No interactive answer, aborting");
                FailureAction::Abort
            }
        }
    }
}

/// Move the feature into in-progress if it may be started.
pub fn prepare_start(store: &FeatureStore, id: &str) -> Result<FeatureState> {
    if !store.exists(id) {
        return Err(CliError::user(format!(
            "Feature '{id}' not found. Create it with: weft feature create {id}"
        )));
    }
    let state = store.load(id)?;
    match state.status {
        FeatureStatus::InProgress => Ok(state),
        FeatureStatus::Draft => {
            Ok(store.transition(id, FeatureStatus::InProgress, Some("Pipeline started"))?)
        }
        FeatureStatus::Ready => {
            Ok(store.transition(id, FeatureStatus::InProgress, Some("Pipeline restarted"))?)
        }
        other => Err(CliError::user(format!(
            "Feature '{id}' is {other}; only draft, in-progress or ready features can be started."
        ))),
    }
}

fn pipeline_for(ctx: &Context, agent: Option<&str>) -> Result<Vec<&'static AgentDescriptor>> {
    match agent {
        Some(name) => {
            let descriptor = agents::resolve(name)?;
            if descriptor.id == META {
                return Err(CliError::user(
                    "The Meta agent runs during 'weft feature create'. \
                     Pick a downstream agent, e.g. --agent architect",
                ));
            }
            Ok(vec![descriptor])
        }
        None => Ok(ctx
            .weftrc()?
            .active_agents()
            .into_iter()
            .filter(|a| a.id != META)
            .collect()),
    }
}

/// Run the feature start command
pub fn run_start(
    ctx: &Context,
    id: &str,
    agent: Option<&str>,
    timeout: Option<u64>,
    on_failure: Option<FailureChoice>,
) -> Result<()> {
    weft_core::validate_feature_id(id)?;
    let store = ctx.store()?;
    let pipeline = pipeline_for(ctx, agent)?;
    if pipeline.is_empty() {
        return Err(CliError::user("No downstream agents enabled in .weftrc.yaml"));
    }
    prepare_start(&store, id)?;

    let orchestrator = AgentOrchestrator::new(ctx.settings.require_history_path()?, id)
        .with_timeout(Duration::from_secs(timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)))
        .with_poll_interval(Duration::from_secs(ctx.settings.poll_interval));

    let names: Vec<&str> = pipeline.iter().map(|a| a.display_name).collect();
    println!(
        "{} Starting {} with {}",
        "=>".blue().bold(),
        id.cyan(),
        names.join(" -> ").yellow()
    );

    let mut observer = CliObserver::new(on_failure);
    let outcome = block_on(orchestrator.run(&pipeline, &mut observer))??;

    if !outcome.skipped.is_empty() {
        println!("   Skipped: {}", outcome.skipped.join(", ").yellow());
    }
    if let Some(agent) = &outcome.aborted_at {
        return Err(CliError::user(format!(
            "Pipeline aborted at {agent}. Re-run 'weft feature start {id}' to continue."
        )));
    }

    if agent.is_some() {
        println!("{} Agent finished", "OK".green().bold());
        return Ok(());
    }

    store.transition(id, FeatureStatus::Ready, Some("All agents completed"))?;
    println!(
        "{} {} agent(s) completed, feature is ready for review",
        "OK".green().bold(),
        outcome.completed.len()
    );
    println!();
    println!("Next: {}", format!("weft feature review {id}").cyan());
    Ok(())
}
