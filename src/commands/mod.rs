//! Command implementations
//!
//! - `plan` / `apply` - converge the service towards the manifest
//! - `import` - start tracking existing resources
//! - `show` / `refresh` - inspect and re-read tracked state

pub mod apply;
pub mod import;
pub mod show;

use anyhow::Result;
use declarative::Resource;
use repoflow_api::{Gateway, HttpGateway};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::Context;
use crate::config::{Manifest, ProviderConfig, ProviderSection};
use crate::resource::{RepositoryReconciler, WorkspaceReconciler};
use crate::state::TrackedState;

/// Build the HTTP gateway from flags, manifest and environment
pub(crate) fn gateway(ctx: &Context, section: &ProviderSection) -> Result<Arc<dyn Gateway>> {
    let config = ProviderConfig::resolve(ctx.base_url.as_deref(), ctx.api_key.as_deref(), section)?;
    log::debug!("Using RepoFlow API at {}", config.base_url);
    Ok(Arc::new(HttpGateway::new(config.base_url, config.api_key)))
}

/// Manifest if present; commands that only need the provider table work without one
pub(crate) fn manifest_or_default(ctx: &Context) -> Result<Manifest> {
    if ctx.manifest_path.exists() {
        Manifest::load(&ctx.manifest_path)
    } else {
        log::debug!(
            "No manifest at {}, using defaults",
            ctx.manifest_path.display()
        );
        Ok(Manifest::default())
    }
}

pub(crate) fn save_state(ctx: &Context, state: &mut TrackedState) -> Result<()> {
    state.touch(&ctx.state_path)
}

/// Tracked resources that could not be refreshed
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// `type.address` of resources the service no longer has
    pub dropped: Vec<String>,
    /// `type.address` and error of resources that could not be read
    pub failed: Vec<(String, String)>,
}

/// Re-read every tracked resource, dropping the ones that are gone.
///
/// A resource that cannot be read keeps its tracked record.
pub fn refresh_tracked(gateway: &Arc<dyn Gateway>, state: &mut TrackedState) -> RefreshReport {
    let mut report = RefreshReport::default();
    let workspaces = WorkspaceReconciler::new(Arc::clone(gateway));
    let repositories = RepositoryReconciler::new(Arc::clone(gateway));

    refresh_map(&workspaces, &mut state.workspaces, &mut report);
    refresh_map(&repositories, &mut state.repositories, &mut report);
    report
}

fn refresh_map<R: Resource>(
    resource: &R,
    tracked: &mut BTreeMap<String, R::Model>,
    report: &mut RefreshReport,
) {
    let addresses: Vec<String> = tracked.keys().cloned().collect();
    for address in addresses {
        let label = format!("{}.{}", resource.type_name(), address);
        let Some(record) = tracked.get(&address) else {
            continue;
        };
        match resource.read(record) {
            Ok(Some(refreshed)) => {
                tracked.insert(address, refreshed);
            }
            Ok(None) => {
                tracked.remove(&address);
                report.dropped.push(label);
            }
            Err(e) => report.failed.push((label, format!("{e:#}"))),
        }
    }
}
