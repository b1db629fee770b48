//! Filesystem primitives for weft
//!
//! Atomic writes, format-agnostic config loading, content hashing and
//! path containment checks shared by every other weft crate.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use constants::WeftPath;
pub use error::{Error, Result};
pub use path::{canonical, find_upwards, safe_join};
