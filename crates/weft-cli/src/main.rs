//! Weft CLI
//!
//! Drives features through the agent pipeline: project setup, the docker
//! watchers, in-process watchers and the feature lifecycle commands.

mod cli;
mod commands;
mod context;
mod error;
mod interactive;

use std::path::Path;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use weft_core::config::user::user_config_path;
use weft_core::{UserConfig, WeftEnv};

use cli::{Cli, Commands, FeatureAction};
use commands::feature::{CreateOptions, ReviewOptions};
use commands::init::InitOptions;
use context::Context;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    load_dotenv(&cwd, cli.config.as_deref())?;
    init_tracing(&cli);

    match cli.command {
        Some(cmd) => execute_command(&cwd, cmd, cli.verbose),
        None => {
            println!("{} AI-assisted feature development", "weft".green().bold());
            println!();
            println!("Run {} for available commands.", "weft --help".cyan());
            Ok(())
        }
    }
}

/// Load `--config`, else the project's `.env`, else `.env` in `cwd`.
/// Variables already set in the environment win.
fn load_dotenv(cwd: &Path, explicit: Option<&Path>) -> Result<()> {
    if let Some(path) = explicit {
        dotenvy::from_path(path).map_err(|e| {
            CliError::user(format!("Could not load {}: {}", path.display(), e))
        })?;
        return Ok(());
    }
    let project_env = weft_core::find_project_root(cwd).map(|root| root.join(".env"));
    match project_env.filter(|p| p.is_file()) {
        Some(path) => {
            dotenvy::from_path(&path).ok();
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }
    Ok(())
}

fn init_tracing(cli: &Cli) {
    let env = WeftEnv::from_process();
    let is_watch = matches!(cli.command, Some(Commands::Watch { .. }));

    let level = if cli.verbose {
        Level::DEBUG
    } else if let Some(level) = env.log_level().and_then(parse_level) {
        level
    } else if is_watch {
        let user = UserConfig::load_or_default(user_config_path().as_deref());
        parse_level(&user.defaults.log_level).unwrap_or(Level::INFO)
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(cli.verbose)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        tracing::debug!(%level, "Logging initialized");
    }
}

fn parse_level(value: &str) -> Option<Level> {
    value.trim().parse().ok()
}

fn execute_command(cwd: &Path, cmd: Commands, verbose: bool) -> Result<()> {
    match cmd {
        Commands::Init {
            name,
            project_type,
            history_path,
            force,
            interactive,
        } => {
            let options = if interactive {
                interactive::interactive_init(cwd, force)?
            } else {
                InitOptions {
                    name,
                    project_type,
                    history_path,
                    force,
                }
            };
            commands::run_init(cwd, &options)
        }
        Commands::Up { build, detach } => commands::run_up(&Context::load(cwd)?, build, detach),
        Commands::Down { volumes } => commands::run_down(&Context::load(cwd)?, volumes),
        Commands::Logs {
            agent,
            follow,
            tail,
        } => commands::run_logs(&Context::load(cwd)?, agent.as_deref(), follow, tail),
        Commands::Watch {
            feature,
            agent,
            once,
        } => commands::run_watch(
            &Context::load(cwd)?,
            feature.as_deref(),
            agent.as_deref(),
            once,
        ),
        Commands::Feature { action } => execute_feature(&Context::load(cwd)?, action, verbose),
    }
}

fn execute_feature(ctx: &Context, action: FeatureAction, verbose: bool) -> Result<()> {
    use commands::feature;

    match action {
        FeatureAction::Create {
            id,
            spec_file,
            description,
            yes,
            no_wait,
            timeout,
        } => feature::run_create(
            ctx,
            &CreateOptions {
                id,
                spec_file,
                description,
                yes,
                no_wait,
                timeout,
            },
        ),
        FeatureAction::Start {
            id,
            agent,
            timeout,
            on_failure,
        } => feature::run_start(ctx, &id, agent.as_deref(), timeout, on_failure),
        FeatureAction::List { all, sort_by } => feature::run_list(ctx, all, sort_by),
        FeatureAction::Status { id, agent } => {
            feature::run_status(ctx, id.as_deref(), agent.as_deref(), verbose)
        }
        FeatureAction::Review {
            id,
            action,
            reason,
            delete_history,
            yes,
        } => feature::run_review(
            ctx,
            &ReviewOptions {
                id,
                action,
                reason,
                delete_history,
                yes,
            },
        ),
        FeatureAction::Drop {
            id,
            reason,
            delete_history,
            force,
        } => feature::run_drop(ctx, &id, reason.as_deref(), delete_history, force),
    }
}
