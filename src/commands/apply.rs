//! `plan` and `apply`

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{ExecuteOptions, ExecuteSummary, ResourceDiff};
use repoflow_api::Gateway;
use std::sync::Arc;

use super::{RefreshReport, gateway, refresh_tracked, save_state};
use crate::Context;
use crate::cli::{ApplyArgs, PlanArgs};
use crate::config::Manifest;
use crate::engine::{self, ApplyStages, build_plan, split_stages};
use crate::resource::{RepositoryReconciler, WorkspaceReconciler};
use crate::state::TrackedState;
use crate::ui;

/// Show what apply would change
pub fn plan(ctx: &Context, args: PlanArgs) -> Result<()> {
    ui::header("RepoFlow Plan");

    let manifest = Manifest::load(&ctx.manifest_path)?;
    let gateway = gateway(ctx, &manifest.provider)?;
    let mut state = TrackedState::load(&ctx.state_path)?;

    report_refresh(&refresh_tracked(&gateway, &mut state));
    let stages = stage_plans(&gateway, &manifest, &state, args.target.as_deref())?;
    engine::display_diff(&all_diffs(&stages));
    Ok(())
}

/// Converge the service towards the manifest
pub fn apply(ctx: &Context, args: ApplyArgs) -> Result<()> {
    ui::header("RepoFlow Apply");

    let manifest = Manifest::load(&ctx.manifest_path)?;
    let gateway = gateway(ctx, &manifest.provider)?;
    let mut state = TrackedState::load(&ctx.state_path)?;

    report_refresh(&refresh_tracked(&gateway, &mut state));
    let stages = stage_plans(&gateway, &manifest, &state, args.target.as_deref())?;
    engine::display_diff(&all_diffs(&stages));

    if stages.is_empty() {
        return Ok(());
    }

    if args.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(());
    }

    if !args.yes && !engine::confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    let opts = ExecuteOptions {
        dry_run: false,
        jobs: args.jobs.max(1),
        verbose: ctx.verbose > 0,
    };
    let summary = apply_stages(&gateway, stages, &mut state, &opts, |s| save_state(ctx, s))?;
    engine::print_summary(&summary);

    if !summary.is_success() {
        bail!("{} change(s) failed", summary.failed);
    }
    Ok(())
}

/// Plan workspaces and repositories, split into apply stages
pub fn stage_plans(
    gateway: &Arc<dyn Gateway>,
    manifest: &Manifest,
    state: &TrackedState,
    target: Option<&str>,
) -> Result<ApplyStages> {
    let workspaces = WorkspaceReconciler::new(Arc::clone(gateway));
    let repositories = RepositoryReconciler::new(Arc::clone(gateway));

    let workspace_plan =
        build_plan(&workspaces, &manifest.workspaces, &state.workspaces)?.filter_by_target(target);
    let repository_plan = build_plan(&repositories, &manifest.repositories, &state.repositories)?
        .filter_by_target(target);

    Ok(split_stages(workspace_plan, repository_plan))
}

/// Run the stages in order, persisting state after each one.
pub fn apply_stages(
    gateway: &Arc<dyn Gateway>,
    stages: ApplyStages,
    state: &mut TrackedState,
    opts: &ExecuteOptions,
    mut persist: impl FnMut(&mut TrackedState) -> Result<()>,
) -> Result<ExecuteSummary> {
    let workspaces = WorkspaceReconciler::new(Arc::clone(gateway));
    let repositories = RepositoryReconciler::new(Arc::clone(gateway));
    let mut summary = ExecuteSummary::default();

    let stage = engine::run_stage(&workspaces, stages.workspaces, &mut state.workspaces, opts)?;
    summary.merge(&stage);
    persist(state)?;

    let stage = engine::run_stage(
        &repositories,
        stages.repositories,
        &mut state.repositories,
        opts,
    )?;
    summary.merge(&stage);
    persist(state)?;

    let stage = engine::run_stage(
        &workspaces,
        stages.workspace_deletes,
        &mut state.workspaces,
        opts,
    )?;
    summary.merge(&stage);
    persist(state)?;

    Ok(summary)
}

fn all_diffs(stages: &ApplyStages) -> Vec<&ResourceDiff> {
    stages
        .workspaces
        .diffs()
        .into_iter()
        .chain(stages.repositories.diffs())
        .chain(stages.workspace_deletes.diffs())
        .collect()
}

fn report_refresh(report: &RefreshReport) {
    for address in &report.dropped {
        ui::warn(&format!("{address} no longer exists and is no longer tracked"));
    }
    for (address, error) in &report.failed {
        ui::warn(&format!("Could not refresh {address}: {error}"));
    }
}
