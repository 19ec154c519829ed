//! Execution engine - runs plans stage by stage with terminal output

use anyhow::Result;
use colored::Colorize;
use declarative::{
    ApplyResult, AutoConfirm, ExecuteOptions, ExecuteSummary, Plan, ProgressCallback, Resource,
};
use std::collections::BTreeMap;

use crate::state::record_outcomes;

/// Prints one line per finished change
pub struct TerminalProgress {
    verbose: bool,
}

impl TerminalProgress {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_batch_start(&mut self, resource_type: &str, count: usize) {
        println!();
        println!(
            "  {} Applying {} {} change(s)...",
            "→".cyan(),
            count,
            resource_type
        );
    }

    fn on_resource_start(&mut self, _address: &str, description: &str) {
        if self.verbose {
            println!("    {}", description.dimmed());
        }
    }

    fn on_resource_complete(&mut self, address: &str, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => {}
            ApplyResult::Created => println!("    {} {} created", "✓".green(), address),
            ApplyResult::Modified => println!("    {} {} updated", "✓".green(), address),
            ApplyResult::Replaced => println!("    {} {} replaced", "✓".green(), address),
            ApplyResult::Removed => println!("    {} {} deleted", "✓".green(), address),
            ApplyResult::Failed { error } => {
                println!("    {} {}: {}", "✗".red(), address, error);
            }
            ApplyResult::Skipped { reason } => {
                println!("    {} {} skipped: {}", "⚠".yellow(), address, reason);
            }
        }
    }

    fn on_batch_complete(&mut self) {}
}

/// Run one stage of an apply and fold the outcomes into the tracked map.
///
/// The caller has already confirmed; stages never prompt.
pub fn run_stage<R: Resource>(
    resource: &R,
    plan: Plan<R::Model>,
    tracked: &mut BTreeMap<String, R::Model>,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    if plan.is_empty() {
        return Ok(ExecuteSummary::default());
    }

    let mut progress = TerminalProgress::new(opts.verbose);
    let execution = declarative::execute(resource, plan, opts, &mut progress, &mut AutoConfirm)?;
    record_outcomes(tracked, execution.outcomes);
    Ok(execution.summary)
}

/// Confirm with user
pub fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Apply these changes?")
        .default(false)
        .interact()?;

    Ok(confirmed)
}

/// Print the totals of an apply
pub fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!(
            "  {} Apply complete: {} created, {} replaced, {} updated, {} deleted",
            "✓".green(),
            summary.created,
            summary.replaced,
            summary.modified,
            summary.removed
        );
    } else {
        println!(
            "  {} Apply finished with {} failure(s): {} created, {} replaced, {} updated, {} deleted",
            "✗".red(),
            summary.failed,
            summary.created,
            summary.replaced,
            summary.modified,
            summary.removed
        );
    }
}
