//! `weft feature status`
//!
//! Queue counts per agent, read straight from the AI history directories.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use colored::Colorize;
use weft_core::agents;
use weft_core::queue::TaskQueue;
use weft_git::HistoryRepo;

use super::list::{humanize_time, status_label};
use crate::context::Context;
use crate::error::{CliError, Result};

/// Queue state of one agent for one feature.
#[derive(Debug, Clone)]
pub struct AgentQueueStatus {
    pub agent_id: String,
    pub pending: Vec<PathBuf>,
    pub completed: Vec<PathBuf>,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Collect queue status for `feature`, optionally for one agent only.
pub fn collect_status(
    queue: &TaskQueue,
    history: &HistoryRepo,
    feature: &str,
    agent: Option<&str>,
) -> Result<Vec<AgentQueueStatus>> {
    if !history.feature_dir(feature).is_dir() {
        return Err(CliError::user(format!(
            "No AI history for feature '{feature}'"
        )));
    }

    let mut statuses = Vec::new();
    for agent_id in history.feature_agents(feature)? {
        if agent.is_some_and(|a| a != agent_id) {
            continue;
        }
        let pending = queue.list_pending_prompts(feature, &agent_id)?;
        let completed = queue.list_results(feature, &agent_id)?;
        let processed = queue.list_processed_prompts(feature, &agent_id)?;
        let last_activity = pending
            .iter()
            .chain(&completed)
            .chain(&processed)
            .filter_map(|p| modified_at(p))
            .max();

        statuses.push(AgentQueueStatus {
            agent_id,
            pending,
            completed,
            last_activity,
        });
    }
    Ok(statuses)
}

fn modified_at(path: &Path) -> Option<DateTime<Utc>> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

/// Run the feature status command
pub fn run_status(
    ctx: &Context,
    id: Option<&str>,
    agent: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let history = ctx.history()?;
    let queue = ctx.queue()?;
    let store = ctx.store()?;
    let agent = agent.map(agents::normalize_agent_id).transpose()?;

    let features: Vec<String> = match id {
        Some(id) => {
            weft_core::validate_feature_id(id)?;
            vec![id.to_string()]
        }
        None => store
            .list(None)?
            .into_iter()
            .filter(|s| !s.status.is_terminal())
            .map(|s| s.feature_name)
            .collect(),
    };

    if features.is_empty() {
        println!("No active features.");
        return Ok(());
    }

    let now = Utc::now();
    for (i, feature) in features.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let status = if store.exists(feature) {
            status_label(store.load(feature)?.status).to_string()
        } else {
            "unknown".dimmed().to_string()
        };
        println!("{} {} ({})", "=>".blue().bold(), feature.cyan(), status);
        print_worktree(ctx, feature);

        let statuses = collect_status(&queue, &history, feature, agent)?;
        let (mut pending, mut completed) = (0, 0);
        for s in &statuses {
            pending += s.pending.len();
            completed += s.completed.len();
            let last = s
                .last_activity
                .map(|t| humanize_time(t, now))
                .unwrap_or_else(|| "never".to_string());
            println!(
                "   {:<16} pending {:<3} completed {:<3} last {}",
                s.agent_id,
                s.pending.len(),
                s.completed.len(),
                last.dimmed()
            );
            if verbose {
                for path in &s.pending {
                    println!("      {} {}", "in ".yellow(), file_name(path));
                }
                for path in &s.completed {
                    println!("      {} {}", "out".green(), file_name(path));
                }
            }
        }
        println!("   Total: {pending} pending, {completed} completed");
    }
    Ok(())
}

fn print_worktree(ctx: &Context, feature: &str) {
    let Ok(worktrees) = ctx.worktrees() else {
        return;
    };
    let path = worktrees.worktree_path(feature);
    if !path.exists() {
        println!("   Worktree: {}", "missing".dimmed());
        return;
    }
    match worktrees.status(feature) {
        Ok(status) if status.is_clean() => {
            println!("   Worktree: {} ({})", status.current_branch, "clean".green());
        }
        Ok(status) => println!(
            "   Worktree: {} ({}: {} modified, {} untracked)",
            status.current_branch,
            "dirty".yellow(),
            status.modified_files.len(),
            status.untracked_files.len()
        ),
        Err(e) => tracing::warn!(feature, error = %e, "Could not read worktree status"),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use weft_core::audit::compute_hash;
    use weft_core::queue::{PromptTask, ResultTask};

    fn setup() -> (tempfile::TempDir, HistoryRepo, TaskQueue) {
        let dir = tempfile::tempdir().unwrap();
        let history = HistoryRepo::new(dir.path());
        history.initialize().unwrap();
        history
            .create_feature_structure("login", &["00-meta", "01-architect"])
            .unwrap();
        let queue = TaskQueue::new(dir.path());
        (dir, history, queue)
    }

    #[test]
    fn counts_pending_and_completed() {
        let (_dir, history, queue) = setup();
        let prompt = PromptTask::new("login", "00-meta", "brief");
        let path = queue.write_prompt(&prompt).unwrap();
        queue.mark_processed(&path).unwrap();
        queue
            .write_result(&ResultTask::for_prompt(&prompt, compute_hash("brief"), "out".into()))
            .unwrap();
        queue
            .write_prompt(&PromptTask::new("login", "01-architect", "design"))
            .unwrap();

        let statuses = collect_status(&queue, &history, "login", None).unwrap();
        let summary: Vec<(&str, usize, usize)> = statuses
            .iter()
            .map(|s| (s.agent_id.as_str(), s.pending.len(), s.completed.len()))
            .collect();
        assert_eq!(summary, vec![("00-meta", 0, 1), ("01-architect", 1, 0)]);
        assert!(statuses.iter().all(|s| s.last_activity.is_some()));
    }

    #[test]
    fn filters_by_agent() {
        let (_dir, history, queue) = setup();
        let statuses = collect_status(&queue, &history, "login", Some("01-architect")).unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].agent_id, "01-architect");
        assert!(statuses[0].last_activity.is_none());
    }

    #[test]
    fn unknown_feature_is_an_error() {
        let (_dir, history, queue) = setup();
        assert!(collect_status(&queue, &history, "signup", None).is_err());
    }
}
