//! `weft feature drop`
//!
//! Abandons a feature: worktree and branch go away, the AI history is kept
//! with a `DROPPED.md` marker unless `--delete-history` is given.

use chrono::Utc;
use colored::Colorize;
use weft_core::FeatureStatus;
use weft_core::audit::format_timestamp;

use super::DROPPED_MARKER;
use crate::context::Context;
use crate::error::{CliError, Result};
use crate::interactive;

/// What happened to the feature's AI history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDisposition {
    Marked,
    Deleted,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropReport {
    pub already_dropped: bool,
    pub worktree_removed: bool,
    pub history: HistoryDisposition,
}

pub fn dropped_marker_content(id: &str, reason: Option<&str>) -> String {
    let mut content = format!(
        "# Feature Dropped\n\nFeature: {id}\nDropped: {}\n",
        format_timestamp(&Utc::now())
    );
    if let Some(reason) = reason {
        content.push_str(&format!("Reason: {reason}\n"));
    }
    content
}

/// Drop `id` without asking.
pub fn drop_feature(
    ctx: &Context,
    id: &str,
    reason: Option<&str>,
    delete_history: bool,
) -> Result<DropReport> {
    let history = ctx.history()?;
    let store = ctx.store()?;
    let worktrees = ctx.worktrees()?;

    if history.has_marker(id, DROPPED_MARKER) {
        let disposition = if delete_history {
            history.delete_feature(id)?;
            HistoryDisposition::Deleted
        } else {
            HistoryDisposition::Marked
        };
        return Ok(DropReport {
            already_dropped: true,
            worktree_removed: false,
            history: disposition,
        });
    }

    let has_state = store.exists(id);
    let has_history = history.feature_dir(id).is_dir();
    let has_worktree = worktrees.worktree_path(id).exists();
    if !has_state && !has_history && !has_worktree {
        return Err(CliError::user(format!("Feature '{id}' not found")));
    }

    if has_state {
        let status = store.load(id)?.status;
        if status == FeatureStatus::Completed {
            return Err(CliError::user(format!(
                "Feature '{id}' is completed and cannot be dropped"
            )));
        }
    }

    let worktree_removed = match worktrees.remove(id, true) {
        Ok(removed) => removed,
        Err(e) => {
            tracing::warn!(feature = id, error = %e, "Could not remove worktree");
            false
        }
    };

    let disposition = if !has_history {
        HistoryDisposition::Missing
    } else if delete_history {
        history.delete_feature(id)?;
        HistoryDisposition::Deleted
    } else {
        history.write_marker(id, DROPPED_MARKER, &dropped_marker_content(id, reason))?;
        let marker = format!("{id}/{DROPPED_MARKER}");
        if let Err(e) = history.commit(&[&marker], &format!("Mark {id} as dropped")) {
            tracing::warn!(feature = id, error = %e, "Could not commit drop marker");
        }
        HistoryDisposition::Marked
    };

    let mut state = store.get_or_create(id)?;
    if state.status != FeatureStatus::Dropped {
        state.drop_reason = reason.map(str::to_string);
        state.transition_to(
            FeatureStatus::Dropped,
            Some(reason.unwrap_or("Feature dropped by user")),
        )?;
        store.save(&state)?;
    }
    tracing::info!(feature = id, ?disposition, "Feature dropped");

    Ok(DropReport {
        already_dropped: false,
        worktree_removed,
        history: disposition,
    })
}

/// Print the outcome of a drop.
pub fn print_drop_report(id: &str, report: &DropReport) {
    if report.already_dropped {
        println!("Feature {} was already dropped.", id.cyan());
    }
    if report.worktree_removed {
        println!("   Worktree and branch removed");
    }
    match report.history {
        HistoryDisposition::Marked if report.already_dropped => {
            println!("   Use {} to remove its AI history", "--delete-history".cyan());
        }
        HistoryDisposition::Marked => println!("   AI history marked as dropped"),
        HistoryDisposition::Deleted => println!("   AI history deleted"),
        HistoryDisposition::Missing => {}
    }
    println!("{} Feature {} dropped", "OK".green().bold(), id.cyan());
}

/// Run the feature drop command
pub fn run_drop(
    ctx: &Context,
    id: &str,
    reason: Option<&str>,
    delete_history: bool,
    force: bool,
) -> Result<()> {
    weft_core::validate_feature_id(id)?;

    if !force {
        let prompt = if delete_history {
            format!("Permanently drop feature '{id}' and delete its AI history?")
        } else {
            format!("Permanently drop feature '{id}'?")
        };
        if !interactive::confirm(&prompt, false)? {
            println!("Drop cancelled.");
            return Ok(());
        }
    }

    println!("{} Dropping feature {}...", "=>".blue().bold(), id.cyan());
    let report = drop_feature(ctx, id, reason, delete_history)?;
    print_drop_report(id, &report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use weft_core::WeftEnv;
    use weft_test_utils::TestProject;

    use crate::commands::feature::create::prepare_feature;

    fn created(project: &TestProject, id: &str) -> Context {
        let ctx = Context::with_env(&project.root(), WeftEnv::default()).unwrap();
        prepare_feature(&ctx, &ctx.history().unwrap(), &ctx.store().unwrap(), id).unwrap();
        ctx
    }

    #[test]
    fn marker_includes_reason() {
        let content = dropped_marker_content("login", Some("superseded"));
        assert!(content.starts_with("# Feature Dropped\n\nFeature: login\nDropped: "));
        assert!(content.ends_with("Reason: superseded\n"));
        assert!(!dropped_marker_content("login", None).contains("Reason"));
    }

    #[test]
    fn drop_marks_history_and_removes_worktree() {
        let project = TestProject::initialized("demo", "backend");
        let ctx = created(&project, "login");

        let report = drop_feature(&ctx, "login", Some("not needed"), false).unwrap();

        assert_eq!(
            report,
            DropReport {
                already_dropped: false,
                worktree_removed: true,
                history: HistoryDisposition::Marked,
            }
        );
        assert!(!project.root().join("worktrees/login").exists());
        let marker = std::fs::read_to_string(project.history_root().join("login/DROPPED.md")).unwrap();
        assert!(marker.contains("Reason: not needed"));

        let state = ctx.store().unwrap().load("login").unwrap();
        assert_eq!(state.status, FeatureStatus::Dropped);
        assert_eq!(state.drop_reason.as_deref(), Some("not needed"));
    }

    #[test]
    fn dropping_again_can_delete_history() {
        let project = TestProject::initialized("demo", "backend");
        let ctx = created(&project, "login");
        drop_feature(&ctx, "login", None, false).unwrap();

        let again = drop_feature(&ctx, "login", None, false).unwrap();
        assert!(again.already_dropped);
        assert!(project.history_root().join("login").exists());

        let deleted = drop_feature(&ctx, "login", None, true).unwrap();
        assert_eq!(deleted.history, HistoryDisposition::Deleted);
        assert!(!project.history_root().join("login").exists());
    }

    #[test]
    fn unknown_feature_is_an_error() {
        let project = TestProject::initialized("demo", "backend");
        let ctx = Context::with_env(&project.root(), WeftEnv::default()).unwrap();
        assert!(drop_feature(&ctx, "ghost", None, false).is_err());
    }
}
