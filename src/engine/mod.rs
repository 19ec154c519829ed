//! Execution engine for repoflow
//!
//! The engine orchestrates:
//! 1. Planning - Pair manifest entries with tracked records per address
//! 2. Diffing - Show what each planned change touches
//! 3. Executing - Apply stages in dependency order

pub mod differ;
pub mod executor;
pub mod planner;

pub use differ::display_diff;
pub use executor::{confirm_proceed, print_summary, run_stage};
pub use planner::{ApplyStages, build_plan, split_stages};
