//! Command implementations for weft-cli

pub mod feature;
pub mod init;
pub mod runtime;
pub mod watch;

pub use init::run_init;
pub use runtime::{run_down, run_logs, run_up};
pub use watch::run_watch;
