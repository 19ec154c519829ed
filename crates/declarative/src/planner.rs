//! Change planner - decides create / update / replace / delete per resource

use crate::diff::{DiffSummary, ResourceDiff};
use crate::resource::{Resource, StateModel};
use crate::schema::SchemaError;
use crate::types::Attributes;
use serde::{Deserialize, Serialize};

/// What the executor will do with a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Tracked and desired state agree
    NoOp,
    /// Not tracked yet
    Create,
    /// Changed attributes can be applied in place
    Update { changed: Vec<String> },
    /// At least one changed attribute forces delete + create
    Replace { triggers: Vec<String> },
    /// Tracked but no longer desired
    Delete,
}

/// A planned change for one resource address
#[derive(Debug, Clone)]
pub struct PlannedChange<M> {
    pub address: String,
    pub action: Action,
    /// Tracked record, if any
    pub prior: Option<M>,
    /// Desired record, if any
    pub planned: Option<M>,
    pub diff: ResourceDiff,
}

/// Plan a single resource
///
/// Desired records are validated against the schema before anything is
/// planned for them.
pub fn plan_change<R: Resource + ?Sized>(
    resource: &R,
    address: &str,
    prior: Option<&R::Model>,
    planned: Option<&R::Model>,
) -> Result<PlannedChange<R::Model>, SchemaError> {
    let schema = resource.schema();
    let prior_attrs = prior.map(StateModel::attributes).unwrap_or_default();
    let planned_attrs = planned.map(StateModel::attributes);

    if let Some(attrs) = &planned_attrs {
        schema.validate(attrs)?;
    }

    let changes = schema.diff(
        &prior_attrs,
        planned_attrs.as_ref().unwrap_or(&Attributes::new()),
    );

    let action = match (prior, planned) {
        (None, None) => Action::NoOp,
        (None, Some(_)) => Action::Create,
        (Some(_), None) => Action::Delete,
        (Some(_), Some(_)) if changes.is_empty() => Action::NoOp,
        (Some(_), Some(_)) => {
            let triggers: Vec<String> = changes
                .iter()
                .filter(|c| c.forces_replacement)
                .map(|c| c.attribute.clone())
                .collect();
            if triggers.is_empty() {
                Action::Update {
                    changed: changes.iter().map(|c| c.attribute.clone()).collect(),
                }
            } else {
                Action::Replace { triggers }
            }
        }
    };

    Ok(PlannedChange {
        address: address.to_string(),
        diff: ResourceDiff {
            address: address.to_string(),
            resource_type: resource.type_name().to_string(),
            action: action.clone(),
            changes,
        },
        action,
        prior: prior.cloned(),
        planned: planned.cloned(),
    })
}

/// All planned changes for one resource type
#[derive(Debug, Clone)]
pub struct Plan<M> {
    pub resource_type: &'static str,
    pub changes: Vec<PlannedChange<M>>,
}

impl<M> Plan<M> {
    /// Create a new empty plan
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            changes: Vec::new(),
        }
    }

    /// Add a planned change
    pub fn push(&mut self, change: PlannedChange<M>) {
        self.changes.push(change);
    }

    /// Diffs of every change that does something
    pub fn diffs(&self) -> Vec<&ResourceDiff> {
        self.changes
            .iter()
            .map(|c| &c.diff)
            .filter(|d| d.has_changes())
            .collect()
    }

    /// Summary statistics for the plan
    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_diffs(self.changes.iter().map(|c| &c.diff))
    }

    /// Check if the plan has nothing to do
    pub fn is_empty(&self) -> bool {
        !self.summary().has_changes()
    }

    /// Keep only changes matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&PlannedChange<M>) -> bool,
    {
        Self {
            resource_type: self.resource_type,
            changes: self.changes.into_iter().filter(|c| predicate(c)).collect(),
        }
    }

    /// Keep only changes matching a target pattern
    ///
    /// Target format: "type" or "type.address"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, address) = parse_target(t);
                let resource_type_matches =
                    resource_type.is_none_or(|rt| self.resource_type == rt);
                if !resource_type_matches {
                    return self.filter(|_| false);
                }
                self.filter(|c| address.is_none_or(|a| c.address == a))
            }
        }
    }
}

/// Parse a target string like "type.address" into (type, address)
fn parse_target(target: &str) -> (Option<&str>, Option<&str>) {
    match target.split_once('.') {
        None => (Some(target), None),
        Some((resource_type, address)) if !address.is_empty() => {
            (Some(resource_type), Some(address))
        }
        Some((resource_type, _)) => (Some(resource_type), None),
    }
}
