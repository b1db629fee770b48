//! Code patches carried in model output
//!
//! Agents emit files as annotated fences:
//!
//! ````text
//! ```rust path=src/api.rs action=update
//! fn main() {}
//! ```
//! ````
//!
//! [`extract_code_blocks`] turns those into [`CodePatch`]es and
//! [`apply_patches`] stages them in a feature worktree. Nothing here commits.

mod applier;
mod models;
mod parser;

pub use applier::{apply_patch, apply_patches};
pub use models::{ApplyResult, CodeArtifact, CodePatch, PatchAction};
pub use parser::{extract_code_blocks, has_code_patches};
