//! Thin wrapper around the `git` CLI

use std::path::Path;
use std::process::Command;

use crate::{Error, Result};

/// Run a git command in `dir` and return its trimmed stdout.
pub fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    tracing::debug!(dir = %dir.display(), ?args, "git");

    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::GitNotInstalled,
            _ => Error::Fs(weft_fs::Error::io(dir, e)),
        })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(Error::CommandFailed {
            command: args.first().copied().unwrap_or_default().to_string(),
            stderr,
        })
    }
}

/// Like [`run_git`] but keeps leading whitespace, which porcelain formats depend on.
pub(crate) fn run_git_raw(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| Error::Fs(weft_fs::Error::io(dir, e)))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    } else {
        Err(Error::CommandFailed {
            command: args.first().copied().unwrap_or_default().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Identity and version of the git installation weft will drive.
#[derive(Debug, Clone)]
pub struct GitEnvironment {
    pub version: String,
    pub user_name: String,
    pub user_email: String,
}

/// Check that git is installed and that commits can be authored.
pub fn validate_git_environment(dir: &Path) -> Result<GitEnvironment> {
    let version = run_git(dir, &["--version"])?;

    let read_key = |key: &str| -> Result<String> {
        match run_git(dir, &["config", key]) {
            Ok(value) if !value.is_empty() => Ok(value),
            _ => Err(Error::GitConfigMissing {
                key: key.to_string(),
            }),
        }
    };

    Ok(GitEnvironment {
        version,
        user_name: read_key("user.name")?,
        user_email: read_key("user.email")?,
    })
}
