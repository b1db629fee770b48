//! File-based task queue in the AI history repository
//!
//! ```text
//! <history>/<feature>/<agent>/
//!   in/    prompts waiting (*.md) and consumed (*.processed)
//!   out/   results (*_result.md) with audit frontmatter
//!   log/   watcher logs
//! ```
//!
//! Producers write prompts atomically; a watcher picks them up oldest
//! first, writes a result and renames the prompt to `.processed`.

mod files;
mod models;

pub use files::{TaskQueue, read_prompt, read_result};
pub use models::{PROMPT_SPEC_VERSION, PromptTask, ResultTask, TaskStatus, default_conversation_id};
