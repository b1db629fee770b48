//! Init command implementation
//!
//! Sets up a git repository for weft: project config, runtime directory,
//! prompt specs, AI history repository and ignore rules.

use std::path::{Path, PathBuf};

use colored::Colorize;
use weft_core::config::project::create_default_weftrc;
use weft_core::{ProjectType, Settings, WeftEnv, WeftRuntime};
use weft_fs::WeftPath;
use weft_git::HistoryRepo;

use crate::error::{CliError, Result};

/// Ignore entries weft adds to the project's `.gitignore`
const GITIGNORE_ENTRIES: &[&str] = &[".weft/", "worktrees/"];
const GITIGNORE_HEADER: &str = "# Weft AI workflow directories";

/// Settings for `weft init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOptions {
    pub name: Option<String>,
    pub project_type: String,
    pub history_path: Option<String>,
    pub force: bool,
}

/// What `init_project` created.
#[derive(Debug, Clone)]
pub struct InitReport {
    pub name: String,
    pub project_type: ProjectType,
    pub history_path: PathBuf,
    pub specs_installed: usize,
    pub gitignore_updated: bool,
}

/// Run the init command
pub fn run_init(path: &Path, options: &InitOptions) -> Result<()> {
    println!(
        "{} Initializing weft project in {}...",
        "=>".blue().bold(),
        path.display().to_string().cyan()
    );

    let git = weft_git::validate_git_environment(path)?;
    tracing::debug!(version = %git.version, user = %git.user_name, "Git environment ok");

    let report = init_project(path, options, &WeftEnv::from_process())?;

    println!("   Project: {}", report.name.yellow());
    println!("   Type: {}", report.project_type.as_str().yellow());
    println!(
        "   AI history: {}",
        report.history_path.display().to_string().yellow()
    );
    if report.specs_installed > 0 {
        println!("   Installed {} prompt specs", report.specs_installed);
    }
    if report.gitignore_updated {
        println!("   Updated .gitignore");
    }
    println!("{} Project initialized!", "OK".green().bold());
    println!();
    println!("Next: {}", "weft feature create <id>".cyan());
    Ok(())
}

/// Create every weft artifact under `root`.
pub fn init_project(root: &Path, options: &InitOptions, env: &WeftEnv) -> Result<InitReport> {
    if !root.join(WeftPath::GitDir).exists() {
        return Err(weft_git::Error::NotARepository {
            path: root.to_path_buf(),
        }
        .into());
    }

    let config_path = root.join(WeftPath::ProjectConfig);
    if config_path.exists() && !options.force {
        return Err(CliError::user(format!(
            "Project already initialized ({} exists). Use --force to overwrite.",
            WeftPath::ProjectConfig
        )));
    }

    let project_type: ProjectType = options.project_type.parse().map_err(CliError::user)?;
    let name = match &options.name {
        Some(name) => name.clone(),
        None => default_project_name(root),
    };

    create_default_weftrc(root, &name, project_type, options.history_path.as_deref())?;
    tracing::info!(name = %name, project_type = project_type.as_str(), "Wrote project config");

    WeftRuntime::new(root).initialize()?;
    let specs = weft_agents::spec::install_builtin_specs(root)?;

    let settings = Settings::load(root, env)?;
    let history = HistoryRepo::new(&settings.ai_history_path);
    history.initialize()?;

    let gitignore_updated = update_gitignore(root)?;

    Ok(InitReport {
        name,
        project_type,
        history_path: settings.ai_history_path,
        specs_installed: specs.len(),
        gitignore_updated,
    })
}

fn default_project_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "weft-project".to_string())
}

/// Append missing weft entries to `.gitignore`. Returns whether it changed.
pub fn update_gitignore(root: &Path) -> Result<bool> {
    let path = root.join(WeftPath::GitIgnore);
    let existing = if path.exists() {
        weft_fs::io::read_text(&path)?
    } else {
        String::new()
    };

    let present: Vec<&str> = existing.lines().map(str::trim).collect();
    let missing: Vec<&str> = GITIGNORE_ENTRIES
        .iter()
        .copied()
        .filter(|entry| {
            let bare = entry.trim_end_matches('/');
            !present.iter().any(|line| *line == *entry || *line == bare)
        })
        .collect();

    if missing.is_empty() {
        return Ok(false);
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    if !content.is_empty() {
        content.push('\n');
    }
    content.push_str(GITIGNORE_HEADER);
    content.push('\n');
    for entry in missing {
        content.push_str(entry);
        content.push('\n');
    }
    weft_fs::io::write_text(&path, &content)?;
    Ok(true)
}
