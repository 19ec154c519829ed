//! Execution planner - pairs manifest entries with tracked records

use anyhow::{Context, Result};
use declarative::{Action, Plan, Resource, plan_change};
use std::collections::{BTreeMap, BTreeSet};

use crate::resource::{RepositoryDesired, WorkspaceDesired};

/// Plan every address that is declared, tracked, or both
pub fn build_plan<R: Resource>(
    resource: &R,
    desired: &BTreeMap<String, R::Model>,
    tracked: &BTreeMap<String, R::Model>,
) -> Result<Plan<R::Model>> {
    let addresses: BTreeSet<&String> = desired.keys().chain(tracked.keys()).collect();

    let mut plan = Plan::new(resource.type_name());
    for address in addresses {
        let change = plan_change(resource, address, tracked.get(address), desired.get(address))
            .with_context(|| format!("Invalid {} '{}'", resource.type_name(), address))?;
        plan.push(change);
    }
    Ok(plan)
}

/// Plans in the order they must run
///
/// Repositories live inside workspaces, so workspaces are created (or
/// replaced) before any repository change, and deleted after all of them.
#[derive(Debug)]
pub struct ApplyStages {
    pub workspaces: Plan<WorkspaceDesired>,
    pub repositories: Plan<RepositoryDesired>,
    pub workspace_deletes: Plan<WorkspaceDesired>,
}

impl ApplyStages {
    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
            && self.repositories.is_empty()
            && self.workspace_deletes.is_empty()
    }
}

pub fn split_stages(
    workspaces: Plan<WorkspaceDesired>,
    repositories: Plan<RepositoryDesired>,
) -> ApplyStages {
    let workspace_deletes = workspaces
        .clone()
        .filter(|c| c.action == Action::Delete);
    let workspaces = workspaces.filter(|c| c.action != Action::Delete);

    ApplyStages {
        workspaces,
        repositories,
        workspace_deletes,
    }
}
