//! Configuration for weft projects
//!
//! Sources, highest precedence first:
//!
//! 1. CLI arguments
//! 2. Project config (`.weftrc.yaml`)
//! 3. User config (`<config_dir>/weft/config.yaml`)
//! 4. `WEFT_*` environment variables
//! 5. Built-in defaults
//!
//! Secrets (API keys) are never read from files, only from the environment.

pub mod env;
pub mod project;
pub mod resolver;
pub mod runtime;
pub mod settings;
pub mod user;

use std::path::{Path, PathBuf};

use weft_fs::WeftPath;

pub use env::WeftEnv;
pub use project::{AgentsConfig, AiConfig, AiProvider, ModelProfile, ProjectType, WeftRc};
pub use resolver::ConfigResolver;
pub use runtime::WeftRuntime;
pub use settings::Settings;
pub use user::UserConfig;

use crate::{Error, Result};

/// Find the project root by walking up from `start`.
///
/// A directory holding `.weftrc.yaml` wins; a bare `.weft/` directory is
/// accepted as a fallback for projects initialised without a config file.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    weft_fs::find_upwards(start, WeftPath::ProjectConfig).or_else(|| {
        weft_fs::find_upwards(start, WeftPath::RuntimeDir)
            .filter(|root| root.join(WeftPath::RuntimeDir).is_dir())
    })
}

/// Like [`find_project_root`] but fails with a hint to run `weft init`.
pub fn require_project_root(start: &Path) -> Result<PathBuf> {
    find_project_root(start).ok_or_else(|| Error::NotInProject {
        path: start.to_path_buf(),
    })
}
