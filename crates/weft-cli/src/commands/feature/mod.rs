//! Feature lifecycle commands
//!
//! `create` agrees on a brief with the Meta agent, `start` runs the
//! downstream agents, `review` is the only way code reaches the base branch.

pub mod create;
pub mod drop;
pub mod list;
pub mod review;
pub mod start;
pub mod status;

pub use create::{CreateOptions, run_create};
pub use drop::run_drop;
pub use list::run_list;
pub use review::{ReviewOptions, run_review};
pub use start::run_start;
pub use status::run_status;

/// Written to the feature's history directory once merged
pub const COMPLETED_MARKER: &str = "COMPLETED.md";
/// Written to the feature's history directory once abandoned
pub const DROPPED_MARKER: &str = "DROPPED.md";
