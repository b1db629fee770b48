//! Core layer for weft
//!
//! Everything that is neither git plumbing nor talking to a model lives here:
//!
//! - **Configuration**: `.weftrc.yaml`, user config, `WEFT_*` environment,
//!   the layered [`ConfigResolver`] and the `.weft/` runtime directory
//! - **Feature lifecycle**: the [`FeatureStatus`] state machine persisted
//!   under `.weft/features/<id>/state.yaml`
//! - **Task queue**: prompt/result markdown files in the AI history repo
//! - **Audit**: content hashes and result frontmatter
//! - **Code patches**: extracting annotated code fences from model output and
//!   staging them into a feature worktree
//!
//! # Architecture
//!
//! ```text
//!              weft-cli
//!                 |
//!            weft-agents ---- weft-ai
//!                 |
//!             weft-core
//!                 |
//!        +--------+--------+
//!        |                 |
//!     weft-fs          weft-git
//! ```

pub mod agents;
pub mod audit;
pub mod code;
pub mod config;
pub mod error;
pub mod queue;
pub mod state;

pub use agents::{AGENTS, AgentDescriptor, Stage};
pub use config::{
    ConfigResolver, ProjectType, Settings, UserConfig, WeftEnv, WeftRc, WeftRuntime,
    find_project_root,
};
pub use error::{Error, Result};
pub use state::{FeatureState, FeatureStatus, FeatureStore, StateTransition, validate_feature_id};

/// Seconds between queue polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Seconds to wait for an agent result before giving up.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Default location of the AI history repo, relative to the project root.
pub const DEFAULT_HISTORY_PATH: &str = "../weft-ai-history";
