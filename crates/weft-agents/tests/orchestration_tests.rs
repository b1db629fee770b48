use std::sync::Arc;
use std::time::{Duration, SystemTime};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use weft_agents::{
    AgentError, AgentOrchestrator, ConversationId, FailureAction, LoggingObserver,
    PipelineObserver, SpecAgent, StopHandle, Watcher, WatcherConfig, submit_prompt_to_agent,
    wait_for_agent_result,
};
use weft_core::agents::{self, AgentDescriptor};
use weft_core::audit;
use weft_core::queue::{PromptTask, ResultTask, TaskQueue, read_prompt};
use weft_test_utils::ScriptedBackend;

const META_OUTPUT: &str = "\
# Login Feature

### For Agent 01 (Architect)
Model users and sessions.

### For Agent 05 (Test)
Cover login success and failure.
";

const ARCHITECT_OUTPUT: &str = "## Domain Model\nUser\n## Use Cases\nLog in\n## API Requirements\nPOST /login\n## Data Flow\nForm\n## Trade-offs\nNone";

fn fast(orchestrator: AgentOrchestrator) -> AgentOrchestrator {
    orchestrator
        .with_poll_interval(Duration::from_millis(20))
        .with_timeout(Duration::from_secs(10))
}

fn write_result(queue: &TaskQueue, feature: &str, agent: &str, output: &str) {
    let prompt = PromptTask::new(feature, agent, "input");
    let result = ResultTask::for_prompt(&prompt, audit::compute_hash("input"), output.to_string());
    queue.write_result(&result).unwrap();
}

fn spawn_watcher(
    history: &std::path::Path,
    agent: &str,
    backend: Arc<ScriptedBackend>,
) -> StopHandle {
    let config = WatcherConfig::new(agent, history)
        .unwrap()
        .with_feature("login")
        .with_poll_interval(Duration::from_millis(20));
    let spec = SpecAgent::with_spec(agents::resolve(agent).unwrap(), "SPEC");
    let mut watcher = Watcher::new(config, spec, backend);
    let stop = watcher.stop_handle();
    tokio::spawn(async move { watcher.run().await });
    stop
}

#[tokio::test]
async fn test_pipeline_feeds_sections_and_previous_outputs() {
    let history = TempDir::new().unwrap();
    let queue = TaskQueue::new(history.path());
    write_result(&queue, "login", agents::META, META_OUTPUT);

    let architect = Arc::new(ScriptedBackend::always(ARCHITECT_OUTPUT));
    let tester = Arc::new(ScriptedBackend::always("Tests passed: 3/3"));
    let stops = [
        spawn_watcher(history.path(), "architect", architect.clone()),
        spawn_watcher(history.path(), "test", tester.clone()),
    ];

    let orchestrator = fast(AgentOrchestrator::new(history.path(), "login"));
    let pipeline = [
        agents::resolve("meta").unwrap(),
        agents::resolve("architect").unwrap(),
        agents::resolve("test").unwrap(),
    ];
    let outcome = orchestrator
        .run(&pipeline, &mut LoggingObserver)
        .await
        .unwrap();

    for stop in &stops {
        stop.stop();
    }

    assert!(outcome.is_success());
    assert_eq!(outcome.completed, vec!["01-architect", "05-test"]);

    let architect_prompt = &architect.calls()[0].prompt;
    assert!(architect_prompt.contains("### For Agent 01 (Architect)\nModel users and sessions."));
    assert!(!architect_prompt.contains("Previous Agent Outputs"));

    let test_prompt = &tester.calls()[0].prompt;
    assert!(test_prompt.contains("### For Agent 05 (Test)\nCover login success and failure."));
    assert!(test_prompt.contains("# Previous Agent Outputs\n\n## Architect Design\n\n## Domain Model"));
    assert!(!test_prompt.contains("Model users and sessions."));
}

#[tokio::test]
async fn test_pipeline_requires_meta_output() {
    let history = TempDir::new().unwrap();
    let orchestrator = fast(AgentOrchestrator::new(history.path(), "login"));

    let err = orchestrator
        .run(&[agents::resolve("architect").unwrap()], &mut LoggingObserver)
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::MissingMetaOutput { .. }));
}

#[derive(Default)]
struct Scripted {
    actions: Vec<FailureAction>,
    failures: Vec<String>,
    late_result: Option<TaskQueue>,
}

impl PipelineObserver for Scripted {
    fn on_failure(&mut self, agent: &AgentDescriptor, error: &AgentError) -> FailureAction {
        assert!(matches!(error, AgentError::Timeout { .. }));
        self.failures.push(agent.id.to_string());
        if let Some(queue) = self.late_result.take() {
            write_result(&queue, "login", agent.id, "late answer");
        }
        self.actions.remove(0)
    }
}

#[tokio::test]
async fn test_timeout_skip_and_abort() {
    let history = TempDir::new().unwrap();
    let queue = TaskQueue::new(history.path());
    write_result(&queue, "login", agents::META, META_OUTPUT);

    let orchestrator = AgentOrchestrator::new(history.path(), "login")
        .with_timeout(Duration::from_millis(100))
        .with_poll_interval(Duration::from_millis(20));
    let pipeline = [
        agents::resolve("architect").unwrap(),
        agents::resolve("test").unwrap(),
    ];

    let mut observer = Scripted {
        actions: vec![FailureAction::Skip, FailureAction::Abort],
        ..Scripted::default()
    };
    let outcome = orchestrator.run(&pipeline, &mut observer).await.unwrap();

    assert_eq!(observer.failures, vec!["01-architect", "05-test"]);
    assert_eq!(outcome.skipped, vec!["01-architect"]);
    assert_eq!(outcome.aborted_at.as_deref(), Some("05-test"));
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn test_retry_waits_again_without_resubmitting() {
    let history = TempDir::new().unwrap();
    let queue = TaskQueue::new(history.path());
    write_result(&queue, "login", agents::META, META_OUTPUT);

    let orchestrator = AgentOrchestrator::new(history.path(), "login")
        .with_timeout(Duration::from_millis(100))
        .with_poll_interval(Duration::from_millis(20));

    let mut observer = Scripted {
        actions: vec![FailureAction::Retry],
        late_result: Some(queue.clone()),
        ..Scripted::default()
    };
    let outcome = orchestrator
        .run(&[agents::resolve("test").unwrap()], &mut observer)
        .await
        .unwrap();

    assert_eq!(outcome.completed, vec!["05-test"]);
    assert_eq!(observer.failures.len(), 1);
    assert_eq!(queue.list_pending_prompts("login", "05-test").unwrap().len(), 1);
}

#[tokio::test]
async fn test_wait_ignores_results_older_than_start() {
    let history = TempDir::new().unwrap();
    let queue = TaskQueue::new(history.path());
    write_result(&queue, "login", "01-architect", "old");
    std::thread::sleep(Duration::from_millis(50));

    let since = SystemTime::now();
    let waited = wait_for_agent_result(
        &queue,
        "login",
        "01-architect",
        since,
        Duration::from_millis(60),
        Duration::from_millis(20),
    )
    .await
    .unwrap();

    assert!(waited.is_none());
}

#[test]
fn test_submit_uses_default_conversation_id() {
    let history = TempDir::new().unwrap();
    let queue = TaskQueue::new(history.path());

    let path = submit_prompt_to_agent(
        &queue,
        "login",
        "00-meta",
        "Build login",
        Some(1),
        &ConversationId::Auto,
    )
    .unwrap();

    assert_eq!(path.file_name().unwrap(), "login_prompt_v1.md");
    let task = read_prompt(&path).unwrap();
    assert_eq!(task.conversation_id.as_deref(), Some("login-00-meta"));
    assert_eq!(task.revision, Some(1));
}
