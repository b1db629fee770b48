//! Interactive prompts for CLI commands
//!
//! Uses dialoguer for terminal-based selection. Every prompt here has a
//! flag that skips it.

use std::path::Path;

use colored::Colorize;
use dialoguer::{Confirm, Input, Select};
use weft_agents::FailureAction;
use weft_core::DEFAULT_HISTORY_PATH;

use crate::cli::ReviewAction;
use crate::commands::init::InitOptions;
use crate::error::{CliError, Result};

/// Project types offered by `weft init --interactive`
const PROJECT_TYPES: &[&str] = &["backend", "frontend", "fullstack"];

const REVIEW_CHOICES: &[(&str, ReviewAction)] = &[
    ("Accept and merge", ReviewAction::Accept),
    ("Continue working", ReviewAction::Continue),
    ("Drop feature", ReviewAction::Drop),
];

const FAILURE_CHOICES: &[(&str, FailureAction)] = &[
    ("Retry (keep waiting)", FailureAction::Retry),
    ("Skip this agent", FailureAction::Skip),
    ("Abort pipeline", FailureAction::Abort),
];

/// What to do with a brief produced by the Meta agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BriefDecision {
    Accept,
    Iterate(String),
    Cancel,
}

/// Run interactive init prompts.
pub fn interactive_init(cwd: &Path, force: bool) -> Result<InitOptions> {
    println!();

    let default_name = cwd
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "my-project".to_string());

    let name: String = Input::new()
        .with_prompt("Project name")
        .default(default_name)
        .interact_text()?;

    let type_idx = Select::new()
        .with_prompt("Project type")
        .items(PROJECT_TYPES)
        .default(2)
        .interact()?;
    let project_type = PROJECT_TYPES[type_idx].to_string();

    let history_path: String = Input::new()
        .with_prompt("AI history path")
        .default(DEFAULT_HISTORY_PATH.to_string())
        .interact_text()?;

    println!();
    println!("{}", "Summary:".bold());
    println!("  {}: {}", "Project".dimmed(), name.cyan());
    println!("  {}: {}", "Type".dimmed(), project_type.cyan());
    println!("  {}: {}", "History".dimmed(), history_path.cyan());
    println!();

    if !confirm("Proceed?", true)? {
        return Err(CliError::user("Init cancelled by user."));
    }

    Ok(InitOptions {
        name: Some(name),
        project_type,
        history_path: Some(history_path),
        force,
    })
}

pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// Ask for a feature description.
pub fn input_description(feature: &str) -> Result<String> {
    let text: String = Input::new()
        .with_prompt(format!("Describe feature '{feature}'"))
        .interact_text()?;
    if text.trim().is_empty() {
        return Err(CliError::user("A feature description is required."));
    }
    Ok(text)
}

pub fn brief_decision() -> Result<BriefDecision> {
    let idx = Select::new()
        .with_prompt("What next?")
        .items(&["Accept brief", "Iterate with feedback", "Cancel"])
        .default(0)
        .interact()?;
    Ok(match idx {
        0 => BriefDecision::Accept,
        1 => {
            let feedback: String = Input::new()
                .with_prompt("Feedback for the Meta agent")
                .interact_text()?;
            BriefDecision::Iterate(feedback)
        }
        _ => BriefDecision::Cancel,
    })
}

pub fn select_review_action() -> Result<ReviewAction> {
    let labels: Vec<&str> = REVIEW_CHOICES.iter().map(|(label, _)| *label).collect();
    let idx = Select::new()
        .with_prompt("Decision")
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(REVIEW_CHOICES[idx].1)
}

pub fn select_failure_action(agent: &str) -> Result<FailureAction> {
    let labels: Vec<&str> = FAILURE_CHOICES.iter().map(|(label, _)| *label).collect();
    let idx = Select::new()
        .with_prompt(format!("{agent} did not finish"))
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(FAILURE_CHOICES[idx].1)
}
