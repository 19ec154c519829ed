//! # Declarative
//!
//! Lifecycle plumbing for declaratively managed remote resources.
//!
//! A caller describes the records it wants, the crate compares them with the
//! records it tracks, and a per-type [`Resource`] reconciler converges the
//! remote side.
//!
//! ## Core Concepts
//!
//! - **Schema**: the attributes of a resource type, each tagged as required,
//!   optional, computed, sensitive and/or replace-on-change
//! - **Value / Attributes**: the flattened view of a record used for diffing
//! - **Plan**: one [`Action`] per resource address (create, update, replace,
//!   delete or nothing)
//! - **Executor**: runs a plan, replacing resources as delete-then-create
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{plan_change, execute, ExecuteOptions, NoProgress, AutoConfirm, Plan};
//!
//! let mut plan = Plan::new("repository");
//! plan.push(plan_change(&reconciler, "npm-local", tracked.as_ref(), Some(&desired))?);
//!
//! let execution = execute(&reconciler, plan, &ExecuteOptions::default(), &mut NoProgress, &mut AutoConfirm)?;
//! for outcome in execution.outcomes {
//!     // persist outcome.state
//! }
//! ```
//!
//! ## Provider Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations

pub mod context;
pub mod diff;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod schema;
pub mod types;

// Re-export main types at crate root
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use diff::{AttributeChange, DiffSummary, REDACTED, ResourceDiff};
pub use executor::{ApplyOutcome, Execution, StateTransition, execute};
pub use planner::{Action, Plan, PlannedChange, plan_change};
pub use resource::{Resource, StateModel};
pub use schema::{Attribute, AttributeType, PlanModifier, Schema, SchemaError};
pub use types::{ApplyResult, Attributes, ExecuteOptions, ExecuteSummary, Value};
