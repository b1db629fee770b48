//! Watch command implementation
//!
//! Runs agent watchers inside this process, one tokio task per agent.

use std::time::Duration;

use colored::Colorize;
use tokio::task::JoinSet;
use weft_agents::{AgentManager, Watcher, WatcherConfig};

use crate::context::{Context, block_on};
use crate::error::{CliError, Result};

/// Build one watcher per selected agent.
pub fn build_watchers(
    ctx: &Context,
    feature: Option<&str>,
    agent: Option<&str>,
) -> Result<Vec<Watcher>> {
    let history = ctx.settings.require_history_path()?.to_path_buf();
    let manager = AgentManager::discover(
        ctx.settings.project_root.as_deref(),
        ctx.settings.weftrc.as_ref(),
    )?;

    let selected = match agent {
        Some(name) => {
            let found = manager
                .get(name)
                .ok_or_else(|| CliError::user(format!("Unknown agent '{name}'")))?;
            vec![found]
        }
        None => manager.enabled_agents(),
    };
    if selected.is_empty() {
        return Err(CliError::user("No agents enabled in .weftrc.yaml"));
    }

    if let Some(feature) = feature {
        weft_core::validate_feature_id(feature)?;
    }

    let backend = ctx.backend()?;
    let poll_interval = Duration::from_secs(ctx.settings.poll_interval);

    selected
        .into_iter()
        .map(|spec_agent| {
            let mut config = WatcherConfig::new(spec_agent.id(), &history)?
                .with_code_repo(&ctx.settings.code_repo_path)
                .with_poll_interval(poll_interval);
            if let Some(feature) = feature {
                config = config.with_feature(feature);
            }
            Ok(Watcher::new(config, spec_agent.clone(), backend.clone()))
        })
        .collect()
}

/// Run the watch command
pub fn run_watch(
    ctx: &Context,
    feature: Option<&str>,
    agent: Option<&str>,
    once: bool,
) -> Result<()> {
    let watchers = build_watchers(ctx, feature, agent)?;
    let names: Vec<String> = watchers
        .iter()
        .map(|w| w.config().agent_id.clone())
        .collect();

    if once {
        let processed = block_on(process_all_once(watchers))??;
        println!(
            "{} Processed {} prompt(s) for {}",
            "OK".green().bold(),
            processed,
            names.join(", ").yellow()
        );
        return Ok(());
    }

    println!(
        "{} Watching {} (Ctrl-C to stop)",
        "=>".blue().bold(),
        names.join(", ").yellow()
    );
    block_on(run_until_interrupted(watchers))??;
    println!("{} Watchers stopped", "OK".green().bold());
    Ok(())
}

async fn process_all_once(watchers: Vec<Watcher>) -> Result<usize> {
    let mut total = 0;
    for mut watcher in watchers {
        total += watcher.process_once().await?;
    }
    Ok(total)
}

async fn run_until_interrupted(watchers: Vec<Watcher>) -> Result<()> {
    let handles: Vec<_> = watchers.iter().map(Watcher::stop_handle).collect();

    let mut tasks = JoinSet::new();
    for mut watcher in watchers {
        tasks.spawn(async move { watcher.run().await });
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping watchers");
            for handle in &handles {
                handle.stop();
            }
        }
    });

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => result?,
            Err(e) => return Err(CliError::user(format!("Watcher task failed: {e}"))),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::WeftEnv;
    use weft_test_utils::TestProject;

    fn local_project() -> TestProject {
        let project = TestProject::initialized("demo", "backend");
        project.write_file(
            ".weftrc.yaml",
            "project:\n  name: demo\n  type: backend\nai:\n  provider: local\n",
        );
        project
    }

    #[test]
    fn builds_one_watcher_per_enabled_agent() {
        let project = local_project();
        let ctx = Context::with_env(&project.root(), WeftEnv::default()).unwrap();

        let watchers = build_watchers(&ctx, None, None).unwrap();
        let ids: Vec<&str> = watchers
            .iter()
            .map(|w| w.config().agent_id.as_str())
            .collect();
        assert_eq!(ids, vec!["00-meta", "01-architect", "02-openapi", "05-test"]);
    }

    #[test]
    fn single_agent_and_feature() {
        let project = local_project();
        let ctx = Context::with_env(&project.root(), WeftEnv::default()).unwrap();

        let watchers = build_watchers(&ctx, Some("login"), Some("ui")).unwrap();
        assert_eq!(watchers.len(), 1);
        assert_eq!(watchers[0].config().agent_id, "03-ui");
        assert_eq!(watchers[0].config().feature.as_deref(), Some("login"));
    }

    #[test]
    fn unknown_agent_is_rejected() {
        let project = local_project();
        let ctx = Context::with_env(&project.root(), WeftEnv::default()).unwrap();
        assert!(build_watchers(&ctx, None, Some("designer")).is_err());
    }

    #[test]
    fn once_with_empty_queue_processes_nothing() {
        let project = local_project();
        let ctx = Context::with_env(&project.root(), WeftEnv::default()).unwrap();
        let watchers = build_watchers(&ctx, None, None).unwrap();
        let processed = block_on(process_all_once(watchers)).unwrap().unwrap();
        assert_eq!(processed, 0);
    }
}
