//! Docker runtime commands: `up`, `down` and `logs`
//!
//! Each enabled agent runs as a `watcher-<agent>` compose service defined
//! in `.weft/docker-compose.yml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use colored::Colorize;
use regex::Regex;
use serde::Serialize;
use weft_core::AgentDescriptor;
use weft_core::agents;
use weft_fs::WeftPath;

use crate::context::Context;
use crate::error::{CliError, Result};

const COMPOSE_FILE: &str = "docker-compose.yml";
const FALLBACK_PROJECT_NAME: &str = "weft-project";

static INVALID_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_-]+").expect("Invalid project name regex"));

/// Compose project names allow only `[a-z0-9_-]` and must start
/// alphanumeric.
pub fn sanitize_docker_project_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let replaced = INVALID_NAME_CHARS.replace_all(&lowered, "-");
    let trimmed = replaced.trim_matches(|c| c == '-' || c == '_');

    if trimmed.is_empty() {
        return FALLBACK_PROJECT_NAME.to_string();
    }
    if trimmed.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        trimmed.to_string()
    } else {
        format!("project-{trimmed}")
    }
}

pub fn service_name(agent: &AgentDescriptor) -> String {
    format!("watcher-{}", agent.short_name)
}

#[derive(Debug, Serialize)]
struct ComposeFile {
    services: BTreeMap<String, ComposeService>,
}

#[derive(Debug, Serialize)]
struct ComposeService {
    build: ComposeBuild,
    image: String,
    command: Vec<String>,
    environment: BTreeMap<String, String>,
    volumes: Vec<String>,
    restart: String,
}

#[derive(Debug, Serialize)]
struct ComposeBuild {
    context: String,
    dockerfile: String,
}

/// Compose definition with one watcher service per agent.
pub fn render_compose(agents: &[&AgentDescriptor]) -> Result<String> {
    let services = agents
        .iter()
        .map(|agent| {
            let environment = BTreeMap::from([
                ("WEFT_CODE_REPO_PATH".to_string(), "/workspace/code".to_string()),
                (
                    "WEFT_AI_HISTORY_PATH".to_string(),
                    "/workspace/history".to_string(),
                ),
                ("WEFT_MODEL".to_string(), "${WEFT_MODEL}".to_string()),
                (
                    "WEFT_ANTHROPIC_API_KEY".to_string(),
                    "${WEFT_ANTHROPIC_API_KEY:-${ANTHROPIC_API_KEY:-}}".to_string(),
                ),
                ("WEFT_LOG_LEVEL".to_string(), "${WEFT_LOG_LEVEL:-INFO}".to_string()),
            ]);
            let service = ComposeService {
                build: ComposeBuild {
                    context: "${WEFT_PACKAGE_DIR:-..}".to_string(),
                    dockerfile: "Dockerfile.watcher".to_string(),
                },
                image: "${WEFT_WATCHER_IMAGE:-weft-watcher:latest}".to_string(),
                command: ["weft", "watch", "--agent", agent.short_name]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                environment,
                volumes: vec![
                    "${WEFT_CODE_REPO_PATH}:/workspace/code".to_string(),
                    "${WEFT_AI_HISTORY_PATH}:/workspace/history".to_string(),
                ],
                restart: "unless-stopped".to_string(),
            };
            (service_name(agent), service)
        })
        .collect();

    let body = serde_yaml::to_string(&ComposeFile { services })
        .map_err(|e| CliError::user(format!("Failed to render compose file: {e}")))?;
    Ok(format!(
        "# Generated by weft. Edits are kept; delete the file to regenerate.\n{body}"
    ))
}

pub fn compose_path(project_root: &Path) -> PathBuf {
    project_root.join(WeftPath::RuntimeDir).join(COMPOSE_FILE)
}

/// The compose file, generated from the enabled agents when missing.
fn ensure_compose_file(ctx: &Context) -> Result<PathBuf> {
    let root = ctx.project_root()?;
    let path = compose_path(root);
    if path.exists() {
        return Ok(path);
    }
    let enabled = ctx.weftrc()?.active_agents();
    weft_fs::io::write_text(&path, &render_compose(&enabled)?)?;
    tracing::info!(path = %path.display(), "Generated compose file");
    Ok(path)
}

/// Environment passed to `docker compose`.
pub fn compose_env(ctx: &Context) -> Result<Vec<(String, String)>> {
    let rc = ctx.weftrc()?;
    let project_name = sanitize_docker_project_name(&rc.project.name);
    if project_name != rc.project.name {
        tracing::info!(
            name = %rc.project.name,
            sanitized = %project_name,
            "Project name sanitized for docker compose"
        );
    }
    let settings = &ctx.settings;
    Ok(vec![
        (
            "WEFT_CODE_REPO_PATH".to_string(),
            settings.code_repo_path.display().to_string(),
        ),
        (
            "WEFT_AI_HISTORY_PATH".to_string(),
            settings.ai_history_path.display().to_string(),
        ),
        ("WEFT_MODEL".to_string(), settings.model.clone()),
        ("COMPOSE_PROJECT_NAME".to_string(), project_name),
    ])
}

fn ensure_docker() -> Result<()> {
    let available = Command::new("docker")
        .args(["compose", "version"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if available {
        Ok(())
    } else {
        Err(CliError::user(
            "Docker with the compose plugin is not installed or not on PATH",
        ))
    }
}

fn docker_compose(ctx: &Context, compose: &Path, args: &[String]) -> Result<()> {
    ensure_docker()?;
    tracing::debug!(compose = %compose.display(), ?args, "Running docker compose");

    let status = Command::new("docker")
        .arg("compose")
        .arg("-f")
        .arg(compose)
        .args(args)
        .envs(compose_env(ctx)?)
        .current_dir(ctx.project_root()?)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        let code = status.code().unwrap_or(-1);
        Err(CliError::user(format!(
            "docker compose {} failed (exit code {code})",
            args.first().map(String::as_str).unwrap_or_default()
        )))
    }
}

pub fn up_args(agents: &[&AgentDescriptor], build: bool, detach: bool) -> Vec<String> {
    let mut args = vec!["up".to_string()];
    if build {
        args.push("--build".to_string());
    }
    if detach {
        args.push("-d".to_string());
    }
    args.extend(agents.iter().map(|a| service_name(a)));
    args
}

pub fn logs_args(agent: Option<&AgentDescriptor>, follow: bool, tail: Option<u32>) -> Vec<String> {
    let mut args = vec!["logs".to_string()];
    if follow {
        args.push("--follow".to_string());
    }
    if let Some(tail) = tail {
        args.push("--tail".to_string());
        args.push(tail.to_string());
    }
    if let Some(agent) = agent {
        args.push(service_name(agent));
    }
    args
}

/// Run the up command
pub fn run_up(ctx: &Context, build: bool, detach: bool) -> Result<()> {
    let enabled = ctx.weftrc()?.active_agents();
    if enabled.is_empty() {
        println!("{}: no agents enabled in .weftrc.yaml", "warning".yellow());
    }
    let compose = ensure_compose_file(ctx)?;

    println!("{} Starting weft runtime...", "=>".blue().bold());
    let names: Vec<&str> = enabled.iter().map(|a| a.short_name).collect();
    println!("   Agents: {}", names.join(", ").yellow());

    docker_compose(ctx, &compose, &up_args(&enabled, build, detach))?;

    if detach {
        println!("{} Runtime started", "OK".green().bold());
        println!();
        println!("View logs: {}", "weft logs <agent>".cyan());
        println!("Stop: {}", "weft down".cyan());
    }
    Ok(())
}

/// Run the down command
pub fn run_down(ctx: &Context, volumes: bool) -> Result<()> {
    let compose = ensure_compose_file(ctx)?;
    println!("{} Stopping weft runtime...", "=>".blue().bold());

    let mut args = vec!["down".to_string()];
    if volumes {
        args.push("--volumes".to_string());
    }
    docker_compose(ctx, &compose, &args)?;

    println!("{} Runtime stopped", "OK".green().bold());
    Ok(())
}

/// Run the logs command
pub fn run_logs(ctx: &Context, agent: Option<&str>, follow: bool, tail: Option<u32>) -> Result<()> {
    let agent = agent.map(agents::resolve).transpose()?;
    let compose = ensure_compose_file(ctx)?;
    docker_compose(ctx, &compose, &logs_args(agent, follow, tail))
}
