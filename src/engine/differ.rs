//! Plan display

use colored::Colorize;
use declarative::{Action, DiffSummary, ResourceDiff};
use std::collections::BTreeMap;

/// Display planned changes grouped by resource type
pub fn display_diff(diffs: &[&ResourceDiff]) {
    let pending: Vec<&ResourceDiff> = diffs.iter().copied().filter(|d| d.has_changes()).collect();

    if pending.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    let mut by_type: BTreeMap<&str, Vec<&ResourceDiff>> = BTreeMap::new();
    for &diff in &pending {
        by_type
            .entry(diff.resource_type.as_str())
            .or_default()
            .push(diff);
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Planned Changes".bold()
    );
    println!("│");

    for (resource_type, type_diffs) in &by_type {
        let type_name = match *resource_type {
            "workspace" => "Workspaces",
            "repository" => "Repositories",
            _ => resource_type,
        };
        println!("│ {}", type_name.bold());

        for diff in type_diffs {
            let (symbol, note) = match &diff.action {
                Action::Create => ("+".green(), "(will create)"),
                Action::Delete => ("-".red(), "(will delete)"),
                Action::Replace { .. } => ("±".yellow(), "(must be replaced)"),
                Action::Update { .. } => ("~".yellow(), "(update in place)"),
                Action::NoOp => ("=".dimmed(), ""),
            };
            println!("│   {} {:<30} {}", symbol, diff.address, note.dimmed());

            if !matches!(diff.action, Action::Create | Action::Delete) {
                for change in &diff.changes {
                    println!("│       {}", change.to_string().dimmed());
                }
            }
        }
        println!("│");
    }

    let summary = DiffSummary::from_diffs(pending.iter().copied());
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} to add, {} to replace, {} to change, {} to destroy",
        summary.additions.to_string().green(),
        summary.replacements.to_string().yellow(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}
