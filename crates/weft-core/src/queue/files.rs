use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Duration, Utc};
use weft_fs::io::{self, TEMP_PREFIX};

use super::models::{PromptTask, ResultTask};
use crate::audit::{parse_audit_frontmatter, strip_frontmatter};
use crate::{Error, Result};

const PROMPT_SUFFIX: &str = "_prompt.md";
const RESULT_SUFFIX: &str = "_result.md";
const PROCESSED_EXT: &str = "processed";

fn timestamp_stem(ts: &DateTime<Utc>) -> String {
    format!(
        "{}_{:06}",
        ts.format("%Y%m%d_%H%M%S"),
        ts.timestamp_subsec_micros()
    )
}

/// Unique path `<dir>/<timestamp><suffix>`, nudging the timestamp on collision.
fn timestamped_path(dir: &Path, suffix: &str) -> PathBuf {
    let mut ts = Utc::now();
    loop {
        let path = dir.join(format!("{}{suffix}", timestamp_stem(&ts)));
        if !path.exists() {
            return path;
        }
        ts += Duration::microseconds(1);
    }
}

fn file_time(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.created().or_else(|_| m.modified()))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

fn modified_time(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Files in `dir` accepted by `keep`, excluding in-flight temp files.
fn list_files(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| weft_fs::Error::io(dir, e))? {
        let path = entry.map_err(|e| weft_fs::Error::io(dir, e))?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(TEMP_PREFIX) || !path.is_file() || !keep(name) {
            continue;
        }
        files.push(path);
    }
    Ok(files)
}

fn sort_by_time(files: &mut [PathBuf], time: fn(&Path) -> SystemTime) {
    files.sort_by(|a, b| time(a).cmp(&time(b)).then_with(|| a.cmp(b)));
}

/// Parse a prompt file.
pub fn read_prompt(path: &Path) -> Result<PromptTask> {
    let content = io::read_text(path)?;
    PromptTask::from_markdown(&content).map_err(|e| match e {
        Error::InvalidTask { message } => {
            Error::invalid_task(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

/// Parse a result file written by [`TaskQueue::write_result`].
pub fn read_result(path: &Path) -> Result<ResultTask> {
    let content = io::read_text(path)?;
    let fields = parse_audit_frontmatter(&content).ok_or_else(|| {
        Error::invalid_task(format!("{}: missing audit frontmatter", path.display()))
    })?;
    let field = |key: &str| -> Result<String> {
        fields.get(key).cloned().ok_or_else(|| {
            Error::invalid_task(format!("{}: missing '{key}'", path.display()))
        })
    };

    let timestamp = field("generated_at")?
        .parse::<DateTime<Utc>>()
        .unwrap_or_else(|_| DateTime::<Utc>::from(modified_time(path)));

    Ok(ResultTask {
        feature_id: field("feature")?,
        agent_id: field("agent")?,
        output_text: strip_frontmatter(&content).to_string(),
        prompt_hash: field("prompt_hash")?,
        output_hash: field("output_hash")?,
        timestamp,
        spec_version: field("prompt_spec_version")?,
        code_artifact: None,
        conversation_id: fields.get("conversation_id").cloned(),
    })
}

/// Queue operations rooted at the AI history repository.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    history_root: PathBuf,
}

impl TaskQueue {
    pub fn new(history_root: impl Into<PathBuf>) -> Self {
        Self {
            history_root: history_root.into(),
        }
    }

    pub fn history_root(&self) -> &Path {
        &self.history_root
    }

    pub fn agent_dir(&self, feature: &str, agent: &str) -> PathBuf {
        self.history_root.join(feature).join(agent)
    }

    pub fn input_dir(&self, feature: &str, agent: &str) -> PathBuf {
        self.agent_dir(feature, agent).join("in")
    }

    pub fn output_dir(&self, feature: &str, agent: &str) -> PathBuf {
        self.agent_dir(feature, agent).join("out")
    }

    pub fn log_dir(&self, feature: &str, agent: &str) -> PathBuf {
        self.agent_dir(feature, agent).join("log")
    }

    /// Write a prompt into the agent's `in/` directory atomically.
    ///
    /// Revisioned prompts are named `<feature>_prompt_v<n>.md`, all others
    /// by UTC timestamp.
    pub fn write_prompt(&self, task: &PromptTask) -> Result<PathBuf> {
        let dir = self.input_dir(&task.feature_id, &task.agent_id);
        io::ensure_dir(&dir)?;

        let path = match task.revision {
            Some(rev) => dir.join(format!(
                "{}_prompt_v{rev}.md",
                task.feature_id.replace('/', "-")
            )),
            None => timestamped_path(&dir, PROMPT_SUFFIX),
        };
        io::write_text(&path, &task.to_markdown()?)?;

        tracing::debug!(
            feature = %task.feature_id,
            agent = %task.agent_id,
            path = %path.display(),
            "Wrote prompt"
        );
        Ok(path)
    }

    /// Write a result with audit frontmatter into the agent's `out/` directory.
    pub fn write_result(&self, result: &ResultTask) -> Result<PathBuf> {
        let dir = self.output_dir(&result.feature_id, &result.agent_id);
        io::ensure_dir(&dir)?;

        let path = timestamped_path(&dir, RESULT_SUFFIX);
        io::write_text(&path, &result.to_markdown())?;

        tracing::debug!(
            feature = %result.feature_id,
            agent = %result.agent_id,
            path = %path.display(),
            "Wrote result"
        );
        Ok(path)
    }

    /// Rename `<name>.md` to `<name>.processed`.
    pub fn mark_processed(&self, prompt_path: &Path) -> Result<PathBuf> {
        if !prompt_path.is_file() {
            return Err(Error::invalid_task(format!(
                "prompt file not found: {}",
                prompt_path.display()
            )));
        }
        let processed = prompt_path.with_extension(PROCESSED_EXT);
        io::rename(prompt_path, &processed)?;
        Ok(processed)
    }

    /// Unprocessed prompts, oldest first.
    pub fn list_pending_prompts(&self, feature: &str, agent: &str) -> Result<Vec<PathBuf>> {
        let mut files = list_files(&self.input_dir(feature, agent), |n| n.ends_with(".md"))?;
        sort_by_time(&mut files, file_time);
        Ok(files)
    }

    /// Consumed prompts, oldest first.
    pub fn list_processed_prompts(&self, feature: &str, agent: &str) -> Result<Vec<PathBuf>> {
        let suffix = format!(".{PROCESSED_EXT}");
        let mut files = list_files(&self.input_dir(feature, agent), |n| n.ends_with(&suffix))?;
        sort_by_time(&mut files, file_time);
        Ok(files)
    }

    /// Result files, oldest first.
    pub fn list_results(&self, feature: &str, agent: &str) -> Result<Vec<PathBuf>> {
        let mut files = list_files(&self.output_dir(feature, agent), |n| n.ends_with(RESULT_SUFFIX))?;
        sort_by_time(&mut files, modified_time);
        Ok(files)
    }

    pub fn latest_result(&self, feature: &str, agent: &str) -> Result<Option<PathBuf>> {
        Ok(self.list_results(feature, agent)?.pop())
    }

    /// Results written at or after `since`, oldest first.
    pub fn results_since(
        &self,
        feature: &str,
        agent: &str,
        since: SystemTime,
    ) -> Result<Vec<PathBuf>> {
        let mut files = self.list_results(feature, agent)?;
        files.retain(|p| modified_time(p) >= since);
        Ok(files)
    }

    /// Earlier exchanges in a conversation as `(prompt, output)` pairs, oldest first.
    pub fn conversation_history(
        &self,
        feature: &str,
        agent: &str,
        conversation_id: &str,
    ) -> Result<Vec<(String, String)>> {
        let mut prompts = Vec::new();
        for path in self.list_processed_prompts(feature, agent)? {
            match read_prompt(&path) {
                Ok(p) if p.conversation_id.as_deref() == Some(conversation_id) => {
                    prompts.push(p.prompt_text)
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable prompt"),
            }
        }

        let mut outputs = Vec::new();
        for path in self.list_results(feature, agent)? {
            match read_result(&path) {
                Ok(r) if r.conversation_id.as_deref() == Some(conversation_id) => {
                    outputs.push(r.output_text)
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable result"),
            }
        }

        Ok(prompts.into_iter().zip(outputs).collect())
    }
}
