//! Shared test utilities for the weft workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`ai`]: scripted in-memory AI backend
//! - [`git`]: git repository fixtures
//! - [`project`]: [`TestProject`] builder: code repo plus sibling AI history repo

pub mod ai;
pub mod git;
pub mod project;

pub use ai::ScriptedBackend;
pub use project::TestProject;
