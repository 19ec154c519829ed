//! Diff computation for resources

use crate::planner::Action;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder shown instead of a sensitive attribute value
pub const REDACTED: &str = "(sensitive value)";

/// A single attribute that differs between prior and planned state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub attribute: String,
    pub before: crate::types::Value,
    pub after: crate::types::Value,
    /// Whether this change alone forces delete + create
    pub forces_replacement: bool,
    pub sensitive: bool,
}

impl AttributeChange {
    /// Before value as shown to users
    pub fn before_display(&self) -> String {
        self.render(&self.before)
    }

    /// After value as shown to users
    pub fn after_display(&self) -> String {
        self.render(&self.after)
    }

    fn render(&self, value: &crate::types::Value) -> String {
        if self.sensitive && !value.is_null() {
            REDACTED.to_string()
        } else {
            value.to_string()
        }
    }
}

impl fmt::Display for AttributeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} → {}",
            self.attribute,
            self.before_display(),
            self.after_display()
        )?;
        if self.forces_replacement {
            f.write_str(" (forces replacement)")?;
        }
        Ok(())
    }
}

/// A diff between tracked and desired state of one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Address of the resource in the manifest
    pub address: String,
    /// Type of the resource
    pub resource_type: String,
    /// What the executor will do
    pub action: Action,
    /// Attribute-level changes
    pub changes: Vec<AttributeChange>,
}

impl ResourceDiff {
    /// Check if this diff represents an addition
    pub fn is_addition(&self) -> bool {
        matches!(self.action, Action::Create)
    }

    /// Check if this diff represents a removal
    pub fn is_removal(&self) -> bool {
        matches!(self.action, Action::Delete)
    }

    /// Check if this diff forces delete + create
    pub fn is_replacement(&self) -> bool {
        matches!(self.action, Action::Replace { .. })
    }

    /// Check if this diff represents an in-place modification
    pub fn is_modification(&self) -> bool {
        matches!(self.action, Action::Update { .. })
    }

    /// Check if there is anything to do
    pub fn has_changes(&self) -> bool {
        !matches!(self.action, Action::NoOp)
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    /// Number of resources to add
    pub additions: usize,
    /// Number of resources to remove
    pub removals: usize,
    /// Number of resources to re-create
    pub replacements: usize,
    /// Number of resources to modify in place
    pub modifications: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs<'a>(diffs: impl IntoIterator<Item = &'a ResourceDiff>) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            match diff.action {
                Action::NoOp => {}
                Action::Create => summary.additions += 1,
                Action::Delete => summary.removals += 1,
                Action::Replace { .. } => summary.replacements += 1,
                Action::Update { .. } => summary.modifications += 1,
            }
        }
        summary
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &DiffSummary) {
        self.additions += other.additions;
        self.removals += other.removals;
        self.replacements += other.replacements;
        self.modifications += other.modifications;
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.replacements + self.modifications
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}
