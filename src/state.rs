use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use declarative::{ApplyOutcome, StateTransition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::resource::{RepositoryDesired, WorkspaceDesired};

// ============================================================================
// State Structures
// ============================================================================

/// Resources created or imported by repoflow, keyed by manifest address
///
/// A repository's identity is its composite `<workspaceId>/<repositoryId>`
/// id; nothing derived from it is stored separately.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrackedState {
    /// Last time the state was written
    pub last_updated: DateTime<Utc>,

    #[serde(default)]
    pub workspaces: BTreeMap<String, WorkspaceDesired>,

    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryDesired>,
}

impl Default for TrackedState {
    fn default() -> Self {
        Self {
            last_updated: Utc::now(),
            workspaces: BTreeMap::new(),
            repositories: BTreeMap::new(),
        }
    }
}

// ============================================================================
// TrackedState Implementation
// ============================================================================

impl TrackedState {
    /// State file kept next to the manifest (`.repoflow/state.toml`)
    pub fn default_path(manifest: &Path) -> PathBuf {
        manifest
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(".repoflow")
            .join("state.toml")
    }

    /// Load state from disk, or return default if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using empty state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: TrackedState = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Update the last_updated timestamp and save
    pub fn touch(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Utc::now();
        self.save(path)
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty() && self.repositories.is_empty()
    }
}

/// Fold execution outcomes into a tracked map
pub fn record_outcomes<M>(tracked: &mut BTreeMap<String, M>, outcomes: Vec<ApplyOutcome<M>>) {
    for outcome in outcomes {
        match outcome.state {
            StateTransition::Keep => {}
            StateTransition::Set(record) => {
                tracked.insert(outcome.address, record);
            }
            StateTransition::Remove => {
                tracked.remove(&outcome.address);
            }
        }
    }
}
