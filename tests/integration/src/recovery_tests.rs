//! Failure paths that span crates: agents that never answer, merges that
//! conflict and features that are abandoned.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use weft_agents::{
    AgentError, AgentOrchestrator, FailureAction, PipelineObserver, SpecAgent, Watcher,
    WatcherConfig,
};
use weft_core::agents::{self, AgentDescriptor, META};
use weft_core::audit;
use weft_core::queue::{PromptTask, ResultTask, TaskQueue};
use weft_core::{FeatureStatus, FeatureStore};
use weft_git::{Error as GitError, HistoryRepo, WorktreeManager, feature_branch, merge_feature};
use weft_test_utils::git::git;
use weft_test_utils::{ScriptedBackend, TestProject};

/// Skips every failing agent and records which ones failed.
#[derive(Default)]
struct SkipObserver {
    failed: Vec<String>,
}

impl PipelineObserver for SkipObserver {
    fn on_failure(&mut self, agent: &AgentDescriptor, _error: &AgentError) -> FailureAction {
        self.failed.push(agent.id.to_string());
        FailureAction::Skip
    }
}

fn seed_meta(queue: &TaskQueue, feature: &str) {
    let prompt = PromptTask::new(feature, META, "brief");
    let result = ResultTask::for_prompt(
        &prompt,
        audit::compute_hash("brief"),
        "### For Agent 01 (Architect)\nModel it.".to_string(),
    );
    queue.write_result(&result).unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_agent_output_is_quarantined_and_skipped() {
    let project = TestProject::initialized("shop", "backend");
    let history = project.history_root();
    let queue = TaskQueue::new(&history);
    seed_meta(&queue, "login");

    // Missing every required architect section.
    let backend = Arc::new(ScriptedBackend::always("Looks fine to me."));
    let config = WatcherConfig::new("architect", &history)
        .unwrap()
        .with_feature("login")
        .with_poll_interval(Duration::from_millis(20));
    let mut watcher = Watcher::new(
        config,
        SpecAgent::with_spec(agents::resolve("architect").unwrap(), "SPEC"),
        backend,
    );
    let stop = watcher.stop_handle();
    tokio::spawn(async move { watcher.run().await });

    let orchestrator = AgentOrchestrator::new(&history, "login")
        .with_poll_interval(Duration::from_millis(20))
        .with_timeout(Duration::from_millis(600));
    let mut observer = SkipObserver::default();
    let outcome = orchestrator
        .run(&[agents::resolve("architect").unwrap()], &mut observer)
        .await
        .unwrap();
    stop.stop();

    assert_eq!(observer.failed, vec!["01-architect"]);
    assert_eq!(outcome.skipped, vec!["01-architect"]);
    assert!(outcome.completed.is_empty());
    assert!(queue.list_results("login", "01-architect").unwrap().is_empty());

    let inbox = history.join("login/01-architect/in");
    let failed: Vec<_> = fs::read_dir(&inbox)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "failed"))
        .collect();
    assert_eq!(failed.len(), 1);
}

#[test]
fn test_conflicting_merge_is_left_for_manual_resolution() {
    let project = TestProject::initialized("shop", "backend");
    let root = project.root();
    let worktrees = WorktreeManager::new(&root).unwrap();
    let worktree = worktrees.create("login", "main").unwrap();

    fs::write(worktree.join("README.md"), "# Feature version\n").unwrap();
    project.write_file("README.md", "# Main version\n");
    git(&root, &["commit", "-am", "Edit README on main"]);

    let err = merge_feature(worktrees.repo_path(), &worktree, "login", "main", "Complete login")
        .unwrap_err();
    match err {
        GitError::MergeConflict { branch, message } => {
            assert_eq!(branch, feature_branch("login"));
            assert!(!message.is_empty());
        }
        other => panic!("expected a merge conflict, got {other}"),
    }
    assert!(root.join(".git/MERGE_HEAD").exists());

    let store = FeatureStore::new(&root);
    let mut state = store.get_or_create("login").unwrap();
    state.transition_to(FeatureStatus::InProgress, None).unwrap();
    state.transition_to(FeatureStatus::Ready, None).unwrap();
    state.transition_to(FeatureStatus::MergeConflict, Some("Merge failed")).unwrap();
    store.save(&state).unwrap();

    git(&root, &["merge", "--abort"]);
    let state = store.transition("login", FeatureStatus::Ready, Some("Conflict resolved")).unwrap();
    assert_eq!(state.status, FeatureStatus::Ready);
}

#[test]
fn test_dropped_feature_leaves_marked_history() {
    let project = TestProject::initialized("shop", "backend");
    let root = project.root();
    let worktrees = WorktreeManager::new(&root).unwrap();
    worktrees.create("login", "main").unwrap();
    let history = HistoryRepo::new(project.history_root());
    history
        .create_feature_structure("login", &[META, agents::ARCHITECT])
        .unwrap();

    assert!(worktrees.remove("login", true).unwrap());
    history
        .write_marker("login", "DROPPED.md", "# Feature Dropped\n\nFeature: login\n")
        .unwrap();
    let store = FeatureStore::new(&root);
    store
        .transition("login", FeatureStatus::Dropped, Some("Feature dropped by user"))
        .unwrap();

    assert!(!worktrees.worktree_path("login").exists());
    assert!(git(&root, &["branch", "--list", "feature/login"]).is_empty());
    assert!(history.has_marker("login", "DROPPED.md"));
    assert_eq!(
        history.feature_agents("login").unwrap(),
        vec!["00-meta".to_string(), "01-architect".to_string()]
    );
    assert!(store.load("login").unwrap().status.is_terminal());

    history.delete_feature("login").unwrap();
    assert!(!history.feature_dir("login").exists());
}
