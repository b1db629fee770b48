//! `weft feature create`
//!
//! Sets up the worktree, history queues and state for a new feature, then
//! agrees on a brief with the Meta agent.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use colored::Colorize;
use weft_agents::{ConversationId, submit_prompt_to_agent, submitted_at, wait_for_agent_result};
use weft_core::agents::META;
use weft_core::queue::{ResultTask, TaskQueue};
use weft_core::{DEFAULT_TIMEOUT_SECS, FeatureStatus, FeatureStore, validate_feature_id};
use weft_git::HistoryRepo;

use super::{COMPLETED_MARKER, DROPPED_MARKER};
use crate::context::{Context, block_on};
use crate::error::{CliError, Result};
use crate::interactive::{self, BriefDecision};

/// Options for `weft feature create`.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub id: String,
    pub spec_file: Option<PathBuf>,
    pub description: Option<String>,
    pub yes: bool,
    pub no_wait: bool,
    pub timeout: Option<u64>,
}

/// Run the feature create command
pub fn run_create(ctx: &Context, options: &CreateOptions) -> Result<()> {
    let id = options.id.as_str();
    validate_feature_id(id)?;

    let history = ctx.history()?;
    let store = ctx.store()?;
    ensure_can_create(&history, &store, id)?;

    let mut description = read_description(options)?;

    println!("{} Creating feature {}...", "=>".blue().bold(), id.cyan());
    let worktree = prepare_feature(ctx, &history, &store, id)?;
    println!("   Worktree: {}", worktree.display().to_string().yellow());

    let queue = ctx.queue()?;
    let mut revision = next_revision(&queue, id)?;
    let mut since = submit_brief(&queue, id, &description, revision)?;

    if options.no_wait {
        println!("{} Submitted to Meta agent", "OK".green().bold());
        println!();
        println!("Run {} to process it.", "weft watch --agent meta".cyan());
        return Ok(());
    }

    let timeout = Duration::from_secs(options.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));
    let poll = Duration::from_secs(ctx.settings.poll_interval);

    loop {
        println!(
            "{} Waiting for Meta agent (timeout {}s)...",
            "=>".blue().bold(),
            timeout.as_secs()
        );
        let result = block_on(wait_for_agent_result(&queue, id, META, since, timeout, poll))??;
        let Some(result) = result else {
            return Err(CliError::user(format!(
                "Meta agent did not respond within {}s. Is a watcher running? \
                 ('weft up' or 'weft watch'). The feature stays in draft.",
                timeout.as_secs()
            )));
        };
        print_brief(&result);

        let decision = if options.yes {
            BriefDecision::Accept
        } else {
            interactive::brief_decision()?
        };

        match decision {
            BriefDecision::Accept => {
                store.transition(id, FeatureStatus::InProgress, Some("Brief accepted"))?;
                println!("{} Feature {} is in progress", "OK".green().bold(), id.cyan());
                println!();
                println!("Next: {}", format!("weft feature start {id}").cyan());
                return Ok(());
            }
            BriefDecision::Iterate(feedback) => {
                description = refine_description(&description, &feedback);
                revision += 1;
                since = submit_brief(&queue, id, &description, revision)?;
            }
            BriefDecision::Cancel => {
                println!("Feature {} left in draft.", id.cyan());
                return Ok(());
            }
        }
    }
}

/// Refuse ids that were dropped, completed or are already in use.
pub fn ensure_can_create(history: &HistoryRepo, store: &FeatureStore, id: &str) -> Result<()> {
    if history.has_marker(id, DROPPED_MARKER) {
        return Err(CliError::user(format!(
            "Feature '{id}' was dropped. To reuse the id, remove its history first:\n  \
             weft feature drop {id} --delete-history"
        )));
    }
    if history.has_marker(id, COMPLETED_MARKER) {
        return Err(CliError::user(format!(
            "Feature '{id}' is already completed."
        )));
    }
    if store.exists(id) {
        let state = store.load(id)?;
        let hint = match state.status {
            FeatureStatus::Completed => String::new(),
            _ => format!("\nContinue with: weft feature start {id}"),
        };
        return Err(CliError::user(format!(
            "Feature '{id}' already exists ({}).{hint}",
            state.status
        )));
    }
    Ok(())
}

/// Create the worktree, history structure and draft state.
///
/// The worktree is removed again if the history cannot be prepared.
pub fn prepare_feature(
    ctx: &Context,
    history: &HistoryRepo,
    store: &FeatureStore,
    id: &str,
) -> Result<PathBuf> {
    let worktrees = ctx.worktrees()?;
    let worktree = worktrees.create(id, ctx.base_branch())?;

    let agent_ids: Vec<&str> = ctx.weftrc()?.active_agents().iter().map(|a| a.id).collect();
    if let Err(e) = history.create_feature_structure(id, &agent_ids) {
        tracing::error!(feature = id, error = %e, "History setup failed, removing worktree");
        if let Err(cleanup) = worktrees.remove(id, true) {
            tracing::warn!(feature = id, error = %cleanup, "Worktree cleanup failed");
        }
        return Err(e.into());
    }

    store.get_or_create(id)?;
    tracing::info!(feature = id, worktree = %worktree.display(), "Feature created");
    Ok(worktree)
}

fn read_description(options: &CreateOptions) -> Result<String> {
    let text = match (&options.spec_file, &options.description) {
        (Some(path), _) => weft_fs::io::read_text(path)?,
        (None, Some(text)) => text.clone(),
        (None, None) => interactive::input_description(&options.id)?,
    };
    if text.trim().is_empty() {
        return Err(CliError::user("The feature description is empty."));
    }
    Ok(text)
}

/// Revision for the next Meta prompt of `feature`.
pub fn next_revision(queue: &TaskQueue, feature: &str) -> Result<u32> {
    let pending = queue.list_pending_prompts(feature, META)?.len();
    let processed = queue.list_processed_prompts(feature, META)?.len();
    Ok(u32::try_from(pending + processed).unwrap_or(u32::MAX - 1) + 1)
}

pub fn refine_description(description: &str, feedback: &str) -> String {
    format!("{description}\n\nRefinement: {}", feedback.trim())
}

fn submit_brief(
    queue: &TaskQueue,
    feature: &str,
    description: &str,
    revision: u32,
) -> Result<SystemTime> {
    let before = SystemTime::now();
    let prompt = submit_prompt_to_agent(
        queue,
        feature,
        META,
        description,
        Some(revision),
        &ConversationId::Auto,
    )?;
    println!("   Submitted brief revision {revision}");
    Ok(submitted_at(&prompt, before))
}

fn print_brief(result: &ResultTask) {
    println!();
    println!("{}", "Feature brief:".bold());
    println!("{}", "-".repeat(60).dimmed());
    println!("{}", result.output_text.trim());
    println!("{}", "-".repeat(60).dimmed());
    println!();
}
