use std::time::{Duration, SystemTime};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use weft_core::audit;
use weft_core::queue::{PromptTask, ResultTask, TaskQueue, read_prompt, read_result};

fn queue() -> (TempDir, TaskQueue) {
    let temp = TempDir::new().unwrap();
    let queue = TaskQueue::new(temp.path());
    (temp, queue)
}

#[test]
fn test_revisioned_prompt_filename() {
    let (_temp, queue) = queue();
    let task = PromptTask::new("login", "00-meta", "Build login").with_revision(3);

    let path = queue.write_prompt(&task).unwrap();

    assert_eq!(path.file_name().unwrap(), "login_prompt_v3.md");
    assert_eq!(read_prompt(&path).unwrap(), task);
}

#[test]
fn test_timestamped_prompts_are_unique_and_fifo() {
    let (_temp, queue) = queue();
    let first = queue
        .write_prompt(&PromptTask::new("login", "01-architect", "one"))
        .unwrap();
    std::thread::sleep(Duration::from_millis(20));
    let second = queue
        .write_prompt(&PromptTask::new("login", "01-architect", "two"))
        .unwrap();

    assert_ne!(first, second);
    assert!(first.to_string_lossy().ends_with("_prompt.md"));
    assert_eq!(
        queue.list_pending_prompts("login", "01-architect").unwrap(),
        vec![first, second]
    );
}

#[test]
fn test_mark_processed_removes_from_pending() {
    let (_temp, queue) = queue();
    let path = queue
        .write_prompt(&PromptTask::new("login", "00-meta", "x"))
        .unwrap();

    let processed = queue.mark_processed(&path).unwrap();

    assert_eq!(processed.extension().unwrap(), "processed");
    assert!(queue.list_pending_prompts("login", "00-meta").unwrap().is_empty());
    assert!(queue.mark_processed(&path).is_err());
}

#[test]
fn test_temp_files_are_ignored() {
    let (_temp, queue) = queue();
    let dir = queue.input_dir("login", "00-meta");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(".weft_tmp_x_prompt.md.1"), "partial").unwrap();
    std::fs::write(dir.join(".weft_tmp_y.md"), "partial").unwrap();

    assert!(queue.list_pending_prompts("login", "00-meta").unwrap().is_empty());
}

#[test]
fn test_result_round_trip_and_audit() {
    let (_temp, queue) = queue();
    let prompt = PromptTask::new("login", "00-meta", "x").with_conversation_id("login-00-meta");
    let result = ResultTask::for_prompt(&prompt, audit::compute_hash("x"), "# Plan\n".into());

    let start = SystemTime::now() - Duration::from_secs(1);
    let path = queue.write_result(&result).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    let parsed = read_result(&path).unwrap();

    assert!(path.to_string_lossy().ends_with("_result.md"));
    assert!(audit::verify_result_file(&content));
    assert_eq!(parsed.output_text, "# Plan");
    assert_eq!(parsed.conversation_id.as_deref(), Some("login-00-meta"));
    assert_eq!(queue.latest_result("login", "00-meta").unwrap(), Some(path.clone()));
    assert_eq!(queue.results_since("login", "00-meta", start).unwrap(), vec![path]);
}

#[test]
fn test_conversation_history_pairs_matching_exchanges() {
    let (_temp, queue) = queue();
    let conv = "login-01-architect";

    for (input, output) in [("first ask", "first answer"), ("second ask", "second answer")] {
        let prompt = PromptTask::new("login", "01-architect", input).with_conversation_id(conv);
        let path = queue.write_prompt(&prompt).unwrap();
        let result = ResultTask::for_prompt(&prompt, audit::compute_hash(input), output.into());
        queue.write_result(&result).unwrap();
        queue.mark_processed(&path).unwrap();
        std::thread::sleep(Duration::from_millis(20));
    }
    let other = PromptTask::new("login", "01-architect", "unrelated").with_conversation_id("other");
    let path = queue.write_prompt(&other).unwrap();
    queue.mark_processed(&path).unwrap();

    let history = queue.conversation_history("login", "01-architect", conv).unwrap();

    assert_eq!(
        history,
        vec![
            ("first ask".to_string(), "first answer".to_string()),
            ("second ask".to_string(), "second answer".to_string()),
        ]
    );
}
