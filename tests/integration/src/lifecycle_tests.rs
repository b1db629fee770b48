//! End-to-end feature lifecycle across the weft crates.
//!
//! create -> Meta brief -> downstream pipeline with live watchers -> merge.
//! AI calls go to scripted backends; git operations are real.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use weft_agents::{
    AgentOrchestrator, ConversationId, LoggingObserver, SpecAgent, StopHandle, Watcher,
    WatcherConfig, submit_prompt_to_agent,
};
use weft_core::agents::{self, META};
use weft_core::queue::TaskQueue;
use weft_core::{FeatureStatus, FeatureStore, Settings, WeftEnv};
use weft_fs::WeftPath;
use weft_git::{HistoryRepo, WorktreeManager, merge_feature};
use weft_test_utils::{ScriptedBackend, TestProject};

const META_OUTPUT: &str = "\
# Feature Brief: login

Users sign in with email and password.

### For Agent 01 (Architect)
Model users and sessions.

### For Agent 02 (OpenAPI)
Expose POST /login.

### For Agent 05 (Test)
Cover login success and failure.
";

const ARCHITECT_OUTPUT: &str = "\
## Domain Model
User, Session

## Use Cases
Log in

## API Requirements
POST /login

## Data Flow
Form to API

## Trade-offs
Sessions over JWT
";

const OPENAPI_OUTPUT: &str = "\
openapi: 3.0.0
info:
  title: Login
paths:
  /login: {}
components: {}
";

const TEST_OUTPUT: &str = "\
test_results:
Tests passed: 2/2

```python path=tests/test_login.py
def test_login():
    assert True
```
";

struct Harness {
    project: TestProject,
    settings: Settings,
}

impl Harness {
    fn new() -> Self {
        let project = TestProject::initialized("shop", "backend");
        let settings = Settings::load(&project.root(), &WeftEnv::default()).unwrap();
        Self { project, settings }
    }

    fn history_root(&self) -> &std::path::Path {
        self.settings.require_history_path().unwrap()
    }

    fn store(&self) -> FeatureStore {
        FeatureStore::new(&self.project.root())
    }

    fn watcher(&self, agent: &str, backend: Arc<ScriptedBackend>) -> Watcher {
        let config = WatcherConfig::new(agent, self.history_root())
            .unwrap()
            .with_code_repo(self.project.root())
            .with_feature("login")
            .with_poll_interval(Duration::from_millis(20));
        let spec = SpecAgent::with_spec(agents::resolve(agent).unwrap(), "SPEC");
        Watcher::new(config, spec, backend)
    }

    fn spawn_watcher(&self, agent: &str, output: &str) -> (StopHandle, Arc<ScriptedBackend>) {
        let backend = Arc::new(ScriptedBackend::always(output));
        let mut watcher = self.watcher(agent, backend.clone());
        let stop = watcher.stop_handle();
        tokio::spawn(async move { watcher.run().await });
        (stop, backend)
    }

    /// Worktree, history layout and draft state, as `weft feature create` does.
    fn create_feature(&self, id: &str) {
        let worktrees = WorktreeManager::new(self.project.root()).unwrap();
        worktrees.create(id, self.settings.base_branch()).unwrap();

        let active: Vec<&str> = self
            .settings
            .require_weftrc()
            .unwrap()
            .active_agents()
            .iter()
            .map(|a| a.id)
            .collect();
        HistoryRepo::new(self.history_root())
            .create_feature_structure(id, &active)
            .unwrap();
        self.store().get_or_create(id).unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_feature_lifecycle_from_brief_to_merge() {
    let harness = Harness::new();
    let root = harness.project.root();
    harness.create_feature("login");
    assert_eq!(
        harness.store().load("login").unwrap().status,
        FeatureStatus::Draft
    );

    // Brief
    let queue = TaskQueue::new(harness.history_root());
    submit_prompt_to_agent(
        &queue,
        "login",
        META,
        "Users sign in with email",
        Some(1),
        &ConversationId::Auto,
    )
    .unwrap();
    let meta_backend = Arc::new(ScriptedBackend::always(META_OUTPUT));
    let mut meta = harness.watcher("meta", meta_backend.clone());
    assert_eq!(meta.process_once().await.unwrap(), 1);
    assert_eq!(meta_backend.call_count(), 1);
    harness
        .store()
        .transition("login", FeatureStatus::InProgress, Some("Brief accepted"))
        .unwrap();

    // Pipeline
    let watchers = [
        harness.spawn_watcher("architect", ARCHITECT_OUTPUT),
        harness.spawn_watcher("openapi", OPENAPI_OUTPUT),
        harness.spawn_watcher("test", TEST_OUTPUT),
    ];
    let pipeline: Vec<_> = harness
        .settings
        .require_weftrc()
        .unwrap()
        .active_agents()
        .into_iter()
        .filter(|a| a.id != META)
        .collect();
    let orchestrator = AgentOrchestrator::new(harness.history_root(), "login")
        .with_poll_interval(Duration::from_millis(20))
        .with_timeout(Duration::from_secs(20));
    let outcome = orchestrator
        .run(&pipeline, &mut LoggingObserver)
        .await
        .unwrap();
    for (stop, _) in &watchers {
        stop.stop();
    }

    assert!(outcome.is_success());
    assert_eq!(outcome.completed, vec!["01-architect", "02-openapi", "05-test"]);

    let (_, openapi_backend) = &watchers[1];
    let openapi_prompt = &openapi_backend.calls()[0].prompt;
    assert!(openapi_prompt.contains("Expose POST /login."));
    assert!(openapi_prompt.contains("## Architect Design"));

    let worktree = root.join(WeftPath::WorktreesDir).join("login");
    assert!(worktree.join("tests/test_login.py").exists());

    harness
        .store()
        .transition("login", FeatureStatus::Ready, Some("All agents completed"))
        .unwrap();

    // Merge
    let merged = merge_feature(&root, &worktree, "login", "main", "Complete login").unwrap();
    assert!(merged.committed_pending);
    assert!(root.join("tests/test_login.py").exists());
    assert_eq!(merged.short_commit().len(), 8);

    let mut state = harness.store().load("login").unwrap();
    state.merge_commit = Some(merged.merge_commit.clone());
    state
        .transition_to(FeatureStatus::Completed, Some("Feature accepted and merged"))
        .unwrap();
    harness.store().save(&state).unwrap();

    let statuses: Vec<FeatureStatus> = harness
        .store()
        .load("login")
        .unwrap()
        .transitions
        .iter()
        .map(|t| t.to_state)
        .collect();
    assert_eq!(
        statuses,
        vec![
            FeatureStatus::Draft,
            FeatureStatus::InProgress,
            FeatureStatus::Ready,
            FeatureStatus::Completed
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_meta_revisions_share_one_conversation() {
    let harness = Harness::new();
    harness.create_feature("login");
    let queue = TaskQueue::new(harness.history_root());

    let backend = Arc::new(ScriptedBackend::new(["First brief", "Refined brief"]));
    let mut meta = harness.watcher("meta", backend.clone());

    submit_prompt_to_agent(&queue, "login", META, "Log in", Some(1), &ConversationId::Auto)
        .unwrap();
    meta.process_once().await.unwrap();
    submit_prompt_to_agent(
        &queue,
        "login",
        META,
        "Log in\n\nRefinement: add SSO",
        Some(2),
        &ConversationId::Auto,
    )
    .unwrap();
    meta.process_once().await.unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].history.is_empty());
    assert_eq!(calls[1].history.len(), 2);

    let orchestrator = AgentOrchestrator::new(harness.history_root(), "login");
    assert_eq!(orchestrator.meta_output().unwrap(), "Refined brief");
}
