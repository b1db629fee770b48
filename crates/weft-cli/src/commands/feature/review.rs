//! `weft feature review`
//!
//! Shows what the agents produced and records the human decision. Accepting
//! is the only path from a feature branch into the base branch.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use chrono::Utc;
use colored::Colorize;
use regex::Regex;
use weft_agents::AgentOrchestrator;
use weft_core::agents;
use weft_core::audit::format_timestamp;
use weft_core::{FeatureStatus, validate_feature_id};
use weft_git::{diff_files, get_worktree_status, merge_feature};

use super::COMPLETED_MARKER;
use super::drop::{drop_feature, print_drop_report};
use crate::cli::ReviewAction;
use crate::context::Context;
use crate::error::{CliError, Result};
use crate::interactive;

const SUMMARY_LINES: usize = 3;
const SUMMARY_CHARS: usize = 150;

static TESTS_PASSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Tests passed:\s*(\d+)/(\d+)").expect("Invalid test results regex")
});

/// Options for `weft feature review`.
#[derive(Debug, Clone)]
pub struct ReviewOptions {
    pub id: String,
    pub action: Option<ReviewAction>,
    pub reason: Option<String>,
    pub delete_history: bool,
    pub yes: bool,
}

/// What the test agent reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestVerdict {
    Counted { passed: u32, total: u32 },
    Passed,
    Failed,
    Executed,
    NotExecuted,
    Missing,
}

impl TestVerdict {
    pub fn passed(&self) -> bool {
        match self {
            Self::Counted { passed, total } => passed == total,
            Self::Failed => false,
            _ => true,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Counted { passed, total } => format!("{passed}/{total} tests passed"),
            Self::Passed => "All tests passed".to_string(),
            Self::Failed => "Some tests failed".to_string(),
            Self::Executed => "Tests generated and executed".to_string(),
            Self::NotExecuted => "Test specifications generated (not executed)".to_string(),
            Self::Missing => "No test agent output".to_string(),
        }
    }
}

/// Interpret the test agent's output.
pub fn parse_test_results(content: &str) -> TestVerdict {
    if content.contains("test_results") {
        if let Some(caps) = TESTS_PASSED.captures(content)
            && let (Ok(passed), Ok(total)) = (caps[1].parse(), caps[2].parse())
        {
            return TestVerdict::Counted { passed, total };
        }
        let lowered = content.to_lowercase();
        if lowered.contains("tests_passed: true") {
            return TestVerdict::Passed;
        }
        if lowered.contains("tests_passed: false") {
            return TestVerdict::Failed;
        }
    }
    if ["pytest", "jest", "test suite"]
        .iter()
        .any(|keyword| content.contains(keyword))
    {
        TestVerdict::Executed
    } else {
        TestVerdict::NotExecuted
    }
}

/// First few prose lines of an agent output, capped in length.
pub fn summarize_output(output: &str) -> String {
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && *line != "---")
        .take(SUMMARY_LINES)
        .collect();
    let joined = lines.join(" ");
    if joined.chars().count() > SUMMARY_CHARS {
        let cut: String = joined.chars().take(SUMMARY_CHARS).collect();
        format!("{cut}...")
    } else {
        joined
    }
}

/// Changed files grouped by parent directory.
pub fn group_files(files: &[String]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for file in files {
        let (dir, name) = match file.rsplit_once('/') {
            Some((dir, name)) => (dir.to_string(), name.to_string()),
            None => ("<root>".to_string(), file.clone()),
        };
        groups.entry(dir).or_default().push(name);
    }
    for names in groups.values_mut() {
        names.sort();
    }
    groups
}

/// Result of an accept attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    Merged {
        merge_commit: String,
        worktree_removed: bool,
    },
    Conflict {
        message: String,
    },
}

/// Merge the feature into the base branch and record completion.
///
/// A failed merge moves the feature to merge-conflict and is reported as
/// [`AcceptOutcome::Conflict`].
pub fn accept_feature(ctx: &Context, id: &str) -> Result<AcceptOutcome> {
    let store = ctx.store()?;
    let history = ctx.history()?;
    let worktrees = ctx.worktrees()?;

    let state = store.load(id)?;
    if !matches!(
        state.status,
        FeatureStatus::Ready | FeatureStatus::MergeConflict
    ) {
        return Err(CliError::user(format!(
            "Feature '{id}' is {}; it must be ready before it can be accepted. \
             Run 'weft feature start {id}' first.",
            state.status
        )));
    }

    let worktree = worktrees.worktree_path(id);
    let merge = merge_feature(
        worktrees.repo_path(),
        &worktree,
        id,
        ctx.base_branch(),
        &format!("Complete {id}"),
    );
    let outcome = match merge {
        Ok(outcome) => outcome,
        Err(weft_git::Error::MergeConflict { message, .. }) => {
            let mut state = store.load(id)?;
            state.merge_error = Some(message.clone());
            state.transition_to(FeatureStatus::MergeConflict, Some("Merge failed"))?;
            store.save(&state)?;
            return Ok(AcceptOutcome::Conflict { message });
        }
        Err(e) => return Err(e.into()),
    };

    let content = format!(
        "# Feature Completed\n\nFeature: {id}\nMerge Commit: {}\nCompleted: {}\n",
        outcome.merge_commit,
        format_timestamp(&Utc::now())
    );
    history.write_marker(id, COMPLETED_MARKER, &content)?;
    let marker = format!("{id}/{COMPLETED_MARKER}");
    let message = format!(
        "Mark {id} as completed (merge: {})",
        outcome.short_commit()
    );
    if let Err(e) = history.commit(&[&marker], &message) {
        tracing::warn!(feature = id, error = %e, "Could not commit completion marker");
    }

    let mut state = store.load(id)?;
    state.merge_commit = Some(outcome.merge_commit.clone());
    state.merge_error = None;
    state.transition_to(FeatureStatus::Completed, Some("Feature accepted and merged"))?;
    store.save(&state)?;

    let worktree_removed = match worktrees.remove(id, true) {
        Ok(removed) => removed,
        Err(e) => {
            tracing::warn!(feature = id, error = %e, "Could not remove worktree");
            false
        }
    };

    Ok(AcceptOutcome::Merged {
        merge_commit: outcome.merge_commit,
        worktree_removed,
    })
}

fn section(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "=".repeat(title.len()).dimmed());
}

fn show_summary(ctx: &Context, id: &str) -> Result<TestVerdict> {
    let history = ctx.history()?;
    let orchestrator = AgentOrchestrator::new(history.root(), id);

    section("Agent summary");
    let mut verdict = TestVerdict::Missing;
    if !history.feature_dir(id).is_dir() {
        println!("   No AI history for this feature");
        return Ok(verdict);
    }
    for agent_id in history.feature_agents(id)? {
        let Some(agent) = agents::find(&agent_id) else {
            continue;
        };
        match orchestrator.latest_output(agent.id)? {
            Some(output) => {
                println!("{} {}", "OK".green().bold(), agent.display_name);
                println!("   {}", summarize_output(&output).dimmed());
                if agent.id == agents::TEST {
                    verdict = parse_test_results(&output);
                }
            }
            None => println!("{} {}: no output", "--".yellow(), agent.display_name),
        }
    }
    Ok(verdict)
}

fn show_files(worktree: &Path, base: &str) {
    section("Changed files");
    match diff_files(worktree, base) {
        Ok(files) if files.is_empty() => println!("   (no files added or modified)"),
        Ok(files) => {
            for (dir, names) in group_files(&files) {
                println!("   {dir}/");
                for name in names {
                    println!("     {name}");
                }
            }
            println!("   Total: {} file(s)", files.len());
        }
        Err(e) => println!("{}: could not list files: {}", "warning".yellow(), e),
    }
}

/// Run the feature review command
pub fn run_review(ctx: &Context, options: &ReviewOptions) -> Result<()> {
    let id = options.id.as_str();
    validate_feature_id(id)?;
    let store = ctx.store()?;

    println!("{} Reviewing feature {}", "=>".blue().bold(), id.cyan());
    if store.exists(id) {
        let state = store.load(id)?;
        println!("   Status: {}", state.status);
        if state.status.is_terminal() {
            return Err(CliError::user(format!(
                "Feature '{id}' is {} and cannot be reviewed",
                state.status
            )));
        }
        if state.status == FeatureStatus::MergeConflict {
            println!("{}: previous merge attempt failed", "warning".yellow());
            if let Some(error) = &state.merge_error {
                println!("   {error}");
            }
        }
    } else {
        println!("{}: no state recorded for this feature", "warning".yellow());
    }

    let worktree = ctx.worktrees()?.worktree_path(id);
    if !worktree.exists() {
        return Err(CliError::user(format!(
            "Worktree not found at {}. See 'weft feature list'.",
            worktree.display()
        )));
    }

    let verdict = show_summary(ctx, id)?;
    show_files(&worktree, ctx.base_branch());
    section("Test results");
    println!("   {}", verdict.describe());
    if !verdict.passed() {
        println!("{}: some tests failed", "warning".yellow());
    }
    println!();

    let action = match options.action {
        Some(action) => action,
        None => interactive::select_review_action()?,
    };

    match action {
        ReviewAction::Accept => {
            let status = get_worktree_status(&worktree)?;
            if !status.is_clean() {
                println!("{}: worktree has uncommitted changes", "warning".yellow());
                for file in &status.modified_files {
                    println!("   M {file}");
                }
                for file in &status.untracked_files {
                    println!("   ? {file}");
                }
                if !options.yes
                    && !interactive::confirm("Commit these changes before merging?", true)?
                {
                    println!("Accept cancelled.");
                    return Ok(());
                }
            }

            println!("{} Merging into {}...", "=>".blue().bold(), ctx.base_branch().cyan());
            match accept_feature(ctx, id)? {
                AcceptOutcome::Merged {
                    merge_commit,
                    worktree_removed,
                } => {
                    let short = &merge_commit[..merge_commit.len().min(8)];
                    println!("   Merge commit: {short}");
                    if !worktree_removed {
                        println!(
                            "{}: remove the worktree manually: git worktree remove {}",
                            "warning".yellow(),
                            worktree.display()
                        );
                    }
                    println!("{} Feature {} accepted and merged", "OK".green().bold(), id.cyan());
                    Ok(())
                }
                AcceptOutcome::Conflict { message } => {
                    println!("{}", message.red());
                    println!();
                    println!("To resolve:");
                    println!("  1. cd {}", ctx.settings.code_repo_path.display());
                    println!("  2. Resolve the conflicts, then git add <files>");
                    println!("  3. git merge --continue");
                    println!("  4. weft feature review {id} --action accept");
                    Err(CliError::user(format!(
                        "Merge failed; feature '{id}' is now merge-conflict"
                    )))
                }
            }
        }
        ReviewAction::Drop => {
            if !options.yes && !interactive::confirm(&format!("Permanently drop feature '{id}'?"), false)? {
                println!("Drop cancelled.");
                return Ok(());
            }
            let report = drop_feature(ctx, id, options.reason.as_deref(), options.delete_history)?;
            print_drop_report(id, &report);
            Ok(())
        }
        ReviewAction::Continue => {
            println!("Continue working in the worktree:");
            println!("   {}", worktree.display());
            Ok(())
        }
    }
}
