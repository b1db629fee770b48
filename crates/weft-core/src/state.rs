//! Feature lifecycle state machine
//!
//! ```text
//! draft -> in-progress -> ready -> completed
//!   |          |  ^         |  \
//!   |          v  |         |   merge-conflict -> completed | ready
//!   +------> dropped <------+
//! ```
//!
//! State is persisted per feature at `.weft/features/<id>/state.yaml`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use weft_fs::ConfigStore;

use crate::{Error, Result};

static FEATURE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").expect("Invalid feature id regex")
});

/// Check a feature identifier: 3 to 50 characters, starting with a letter.
pub fn validate_feature_id(id: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidFeatureId {
        id: id.to_string(),
        reason: reason.to_string(),
    };
    if id.len() < 3 {
        return Err(invalid("must be at least 3 characters"));
    }
    if id.len() > 50 {
        return Err(invalid("must be at most 50 characters"));
    }
    if !FEATURE_ID_RE.is_match(id) {
        return Err(invalid(
            "must start with a letter and contain only letters, digits, '-' and '_'",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureStatus {
    Draft,
    InProgress,
    Ready,
    MergeConflict,
    Completed,
    Dropped,
}

impl FeatureStatus {
    pub const ALL: [FeatureStatus; 6] = [
        Self::Draft,
        Self::InProgress,
        Self::Ready,
        Self::MergeConflict,
        Self::Completed,
        Self::Dropped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in-progress",
            Self::Ready => "ready",
            Self::MergeConflict => "merge-conflict",
            Self::Completed => "completed",
            Self::Dropped => "dropped",
        }
    }

    pub fn allowed_transitions(&self) -> &'static [FeatureStatus] {
        use FeatureStatus::*;
        match self {
            Draft => &[InProgress, Dropped],
            InProgress => &[Ready, Draft, Dropped],
            Ready => &[Completed, MergeConflict, InProgress, Dropped],
            MergeConflict => &[Completed, Ready, Dropped],
            Completed | Dropped => &[],
        }
    }

    pub fn can_transition_to(&self, to: FeatureStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Dropped)
    }

    /// Position in listings: active work first, terminal states last.
    pub fn display_rank(&self) -> u8 {
        match self {
            Self::InProgress => 0,
            Self::Draft => 1,
            Self::Ready => 2,
            Self::MergeConflict => 3,
            Self::Completed => 4,
            Self::Dropped => 5,
        }
    }
}

impl std::fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FeatureStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // "pending" is what older docs call a draft
        if s == "pending" {
            return Ok(Self::Draft);
        }
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown feature status '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from_state: Option<FeatureStatus>,
    pub to_state: FeatureStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureState {
    pub feature_name: String,
    pub status: FeatureStatus,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub transitions: Vec<StateTransition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_reason: Option<String>,
}

impl FeatureState {
    /// A new draft with a single creation transition.
    pub fn create_initial(feature_name: &str) -> Self {
        let now = Utc::now();
        Self {
            feature_name: feature_name.to_string(),
            status: FeatureStatus::Draft,
            created_at: now,
            last_activity: now,
            transitions: vec![StateTransition {
                from_state: None,
                to_state: FeatureStatus::Draft,
                timestamp: now,
                reason: Some("Feature created".into()),
            }],
            merge_commit: None,
            merge_error: None,
            drop_reason: None,
        }
    }

    /// Move to `to`, recording the transition. Same-state moves are no-ops.
    pub fn transition_to(&mut self, to: FeatureStatus, reason: Option<&str>) -> Result<()> {
        if self.status == to {
            return Ok(());
        }
        if !self.status.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }

        let now = Utc::now();
        self.transitions.push(StateTransition {
            from_state: Some(self.status),
            to_state: to,
            timestamp: now,
            reason: reason.map(str::to_string),
        });
        tracing::info!(feature = %self.feature_name, from = %self.status, to = %to, "Feature state changed");
        self.status = to;
        self.last_activity = now;
        Ok(())
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

/// Loads and saves [`FeatureState`] under a project's `.weft/features/`.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    features_dir: PathBuf,
}

impl FeatureStore {
    pub fn new(project_root: &Path) -> Self {
        Self {
            features_dir: crate::WeftRuntime::new(project_root).features_dir(),
        }
    }

    pub fn state_path(&self, feature: &str) -> PathBuf {
        self.features_dir.join(feature).join("state.yaml")
    }

    pub fn exists(&self, feature: &str) -> bool {
        self.state_path(feature).is_file()
    }

    pub fn save(&self, state: &FeatureState) -> Result<()> {
        ConfigStore::new().save(&self.state_path(&state.feature_name), state)?;
        Ok(())
    }

    pub fn load(&self, feature: &str) -> Result<FeatureState> {
        let path = self.state_path(feature);
        if !path.is_file() {
            return Err(Error::StateNotFound { path });
        }
        Ok(ConfigStore::new().load(&path)?)
    }

    /// Load the state, creating and saving a draft if none exists yet.
    pub fn get_or_create(&self, feature: &str) -> Result<FeatureState> {
        if self.exists(feature) {
            return self.load(feature);
        }
        let state = FeatureState::create_initial(feature);
        self.save(&state)?;
        Ok(state)
    }

    /// Load, transition and save in one step.
    pub fn transition(
        &self,
        feature: &str,
        to: FeatureStatus,
        reason: Option<&str>,
    ) -> Result<FeatureState> {
        let mut state = self.get_or_create(feature)?;
        state.transition_to(to, reason)?;
        self.save(&state)?;
        Ok(state)
    }

    /// Every readable feature state, optionally filtered by status.
    ///
    /// Unreadable state files are skipped with a warning.
    pub fn list(&self, status: Option<FeatureStatus>) -> Result<Vec<FeatureState>> {
        if !self.features_dir.is_dir() {
            return Ok(Vec::new());
        }
        let dir = &self.features_dir;
        let mut states = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| weft_fs::Error::io(dir, e))? {
            let entry = entry.map_err(|e| weft_fs::Error::io(dir, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !self.exists(&name) {
                continue;
            }
            match self.load(&name) {
                Ok(state) if status.is_none_or(|s| s == state.status) => states.push(state),
                Ok(_) => {}
                Err(e) => tracing::warn!(feature = %name, error = %e, "Skipping unreadable feature state"),
            }
        }
        states.sort_by(|a, b| a.feature_name.cmp(&b.feature_name));
        Ok(states)
    }
}
