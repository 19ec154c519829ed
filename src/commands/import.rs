//! `import` - adopt resources that already exist on the service

use anyhow::{Result, bail};
use declarative::Resource;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{gateway, manifest_or_default, save_state};
use crate::Context;
use crate::cli::ImportCommand;
use crate::resource::{RepositoryReconciler, WorkspaceReconciler};
use crate::state::TrackedState;
use crate::ui;

pub fn run(ctx: &Context, cmd: ImportCommand) -> Result<()> {
    let manifest = manifest_or_default(ctx)?;
    let gateway = gateway(ctx, &manifest.provider)?;
    let mut state = TrackedState::load(&ctx.state_path)?;

    let (label, declared) = match cmd {
        ImportCommand::Repository { address, id } => {
            let reconciler = RepositoryReconciler::new(gateway);
            adopt(&reconciler, &mut state.repositories, &address, &id)?;
            let declared = manifest.repositories.contains_key(&address);
            (format!("repository.{address}"), declared)
        }
        ImportCommand::Workspace { address, reference } => {
            let reconciler = WorkspaceReconciler::new(gateway);
            adopt(&reconciler, &mut state.workspaces, &address, &reference)?;
            let declared = manifest.workspaces.contains_key(&address);
            (format!("workspace.{address}"), declared)
        }
    };

    save_state(ctx, &mut state)?;
    ui::success(&format!("Imported {label}"));
    if !declared {
        ui::warn(&format!(
            "{label} is not declared in {}; the next apply will delete it",
            ctx.manifest_path.display()
        ));
    }
    Ok(())
}

/// Read the resource behind `token` and track it under `address`.
fn adopt<R: Resource>(
    resource: &R,
    tracked: &mut BTreeMap<String, R::Model>,
    address: &str,
    token: &str,
) -> Result<()> {
    if tracked.contains_key(address) {
        bail!(
            "{}.{} is already tracked; remove it from state before importing again",
            resource.type_name(),
            address
        );
    }
    let record = resource.import(token)?;
    log::debug!("Imported {}.{}: {:?}", resource.type_name(), address, record);
    tracked.insert(address.to_string(), record);
    Ok(())
}
