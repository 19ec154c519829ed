//! Execution engine - applies planned changes with bounded parallelism

use crate::context::{ConfirmCallback, ProgressCallback};
use crate::planner::{Action, Plan, PlannedChange};
use crate::resource::Resource;
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::{Context, Result};
use rayon::prelude::*;

/// What should happen to the tracked record after a change ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateTransition<M> {
    /// Leave the tracked record as it was
    Keep,
    /// Track this record from now on
    Set(M),
    /// Stop tracking the resource
    Remove,
}

/// Outcome of one planned change
#[derive(Debug, Clone)]
pub struct ApplyOutcome<M> {
    pub address: String,
    pub result: ApplyResult,
    pub state: StateTransition<M>,
}

/// Outcomes of executing a plan, in plan order
#[derive(Debug, Clone)]
pub struct Execution<M> {
    pub outcomes: Vec<ApplyOutcome<M>>,
    pub summary: ExecuteSummary,
}

impl<M> Default for Execution<M> {
    fn default() -> Self {
        Self {
            outcomes: Vec::new(),
            summary: ExecuteSummary::default(),
        }
    }
}

impl<M> Execution<M> {
    fn record(&mut self, outcome: ApplyOutcome<M>) {
        self.summary.add_result(&outcome.result);
        self.outcomes.push(outcome);
    }
}

/// Execute a plan with the given options and callbacks
///
/// # Arguments
/// * `resource` - Reconciler for the plan's resource type
/// * `plan` - The planned changes
/// * `opts` - Execution options (dry_run, jobs, verbose)
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback
///
/// A failed change never stops the remaining ones; its outcome carries the
/// error and keeps the prior tracked record unless the remote resource is
/// known to be gone.
pub fn execute<R, P, C>(
    resource: &R,
    plan: Plan<R::Model>,
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<Execution<R::Model>>
where
    R: Resource,
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let resource_type = plan.resource_type;
    let pending: Vec<PlannedChange<R::Model>> = plan
        .changes
        .into_iter()
        .filter(|c| c.action != Action::NoOp)
        .collect();

    if pending.is_empty() {
        return Ok(Execution::default());
    }

    // Confirm before proceeding (unless dry_run)
    let prompt = format!("Apply {} {} change(s)?", pending.len(), resource_type);
    if !opts.dry_run && !confirm.confirm(&prompt)? {
        let mut execution = Execution::default();
        for change in pending {
            execution.record(ApplyOutcome {
                address: change.address,
                result: ApplyResult::Skipped {
                    reason: "Declined".into(),
                },
                state: StateTransition::Keep,
            });
        }
        return Ok(execution);
    }

    if opts.dry_run {
        return Ok(Execution::default());
    }

    progress.on_batch_start(resource_type, pending.len());
    let outcomes = if opts.jobs <= 1 || pending.len() == 1 {
        let mut outcomes = Vec::with_capacity(pending.len());
        for change in &pending {
            progress.on_resource_start(&change.address, &describe(change));
            let outcome = apply_change(resource, change);
            progress.on_resource_complete(&outcome.address, &outcome.result);
            outcomes.push(outcome);
        }
        outcomes
    } else {
        execute_parallel(resource, &pending, opts.jobs, progress)?
    };
    progress.on_batch_complete();

    let mut execution = Execution::default();
    for outcome in outcomes {
        execution.record(outcome);
    }
    Ok(execution)
}

/// Execute changes in parallel using rayon
fn execute_parallel<R, P>(
    resource: &R,
    changes: &[PlannedChange<R::Model>],
    jobs: usize,
    progress: &mut P,
) -> Result<Vec<ApplyOutcome<R::Model>>>
where
    R: Resource,
    P: ProgressCallback,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    // The progress callback is not thread-safe, so results are reported after the batch.
    let outcomes: Vec<ApplyOutcome<R::Model>> = pool.install(|| {
        changes
            .par_iter()
            .map(|change| apply_change(resource, change))
            .collect()
    });

    for outcome in &outcomes {
        progress.on_resource_complete(&outcome.address, &outcome.result);
    }

    Ok(outcomes)
}

fn describe<M>(change: &PlannedChange<M>) -> String {
    let verb = match &change.action {
        Action::NoOp => "Keep",
        Action::Create => "Create",
        Action::Update { .. } => "Update",
        Action::Replace { .. } => "Replace",
        Action::Delete => "Delete",
    };
    format!("{} {}.{}", verb, change.diff.resource_type, change.address)
}

/// Apply a single planned change
fn apply_change<R: Resource + ?Sized>(
    resource: &R,
    change: &PlannedChange<R::Model>,
) -> ApplyOutcome<R::Model> {
    let (result, state) = match run_change(resource, change) {
        Ok(done) => done,
        Err(e) => (
            ApplyResult::Failed {
                error: format!("{e:#}"),
            },
            StateTransition::Keep,
        ),
    };

    ApplyOutcome {
        address: change.address.clone(),
        result,
        state,
    }
}

type Done<M> = (ApplyResult, StateTransition<M>);

fn run_change<R: Resource + ?Sized>(
    resource: &R,
    change: &PlannedChange<R::Model>,
) -> Result<Done<R::Model>> {
    match &change.action {
        Action::NoOp => Ok((ApplyResult::NoChange, StateTransition::Keep)),
        Action::Create => {
            let planned = planned(change)?;
            let created = resource.create(planned)?;
            Ok((ApplyResult::Created, StateTransition::Set(created)))
        }
        Action::Update { .. } => {
            let updated = resource.update(prior(change)?, planned(change)?)?;
            Ok((ApplyResult::Modified, StateTransition::Set(updated)))
        }
        Action::Replace { .. } => {
            let planned = planned(change)?;
            resource.delete(prior(change)?)?;
            match resource.create(planned) {
                Ok(created) => Ok((ApplyResult::Replaced, StateTransition::Set(created))),
                // The old resource is already gone; stop tracking it.
                Err(e) => Ok((
                    ApplyResult::Failed {
                        error: format!("deleted for replacement but re-creation failed: {e:#}"),
                    },
                    StateTransition::Remove,
                )),
            }
        }
        Action::Delete => {
            resource.delete(prior(change)?)?;
            Ok((ApplyResult::Removed, StateTransition::Remove))
        }
    }
}

fn prior<M>(change: &PlannedChange<M>) -> Result<&M> {
    change
        .prior
        .as_ref()
        .with_context(|| format!("{}: no tracked state to act on", change.address))
}

fn planned<M>(change: &PlannedChange<M>) -> Result<&M> {
    change
        .planned
        .as_ref()
        .with_context(|| format!("{}: no desired state to act on", change.address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, NoProgress};
    use crate::planner::plan_change;
    use crate::resource::StateModel;
    use crate::schema::{Attribute, Schema};
    use crate::types::{Attributes, Value};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item {
        name: String,
    }

    impl StateModel for Item {
        fn attributes(&self) -> Attributes {
            let mut attrs = Attributes::new();
            attrs.insert("name".into(), Value::from(self.name.clone()));
            attrs
        }
    }

    /// Records every call; creating an item named "bad" fails
    struct Recorder {
        schema: Schema,
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                schema: Schema::new(
                    "item",
                    "Test item",
                    vec![Attribute::string("name").required().requires_replace()],
                ),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Resource for Recorder {
        type Model = Item;

        fn schema(&self) -> &Schema {
            &self.schema
        }

        fn create(&self, planned: &Item) -> Result<Item> {
            self.calls.lock().unwrap().push(format!("create {}", planned.name));
            if planned.name == "bad" {
                anyhow::bail!("remote rejected {}", planned.name);
            }
            Ok(planned.clone())
        }

        fn read(&self, prior: &Item) -> Result<Option<Item>> {
            Ok(Some(prior.clone()))
        }

        fn update(&self, _prior: &Item, planned: &Item) -> Result<Item> {
            Ok(planned.clone())
        }

        fn delete(&self, prior: &Item) -> Result<()> {
            self.calls.lock().unwrap().push(format!("delete {}", prior.name));
            Ok(())
        }

        fn import(&self, token: &str) -> Result<Item> {
            Ok(item(token))
        }
    }

    fn item(name: &str) -> Item {
        Item { name: name.into() }
    }

    fn plan(r: &Recorder, changes: &[(&str, Option<Item>, Option<Item>)]) -> Plan<Item> {
        let mut plan = Plan::new("item");
        for (address, prior, planned) in changes {
            plan.push(plan_change(r, address, prior.as_ref(), planned.as_ref()).unwrap());
        }
        plan
    }

    #[test]
    fn test_execute_empty_plan() {
        let r = Recorder::new();
        let result = execute(
            &r,
            Plan::new("item"),
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(result.summary.total(), 0);
        assert!(r.calls().is_empty());
    }

    #[test]
    fn test_replace_deletes_before_create() {
        let r = Recorder::new();
        let p = plan(&r, &[("x", Some(item("old")), Some(item("new")))]);

        let result = execute(
            &r,
            p,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(r.calls(), vec!["delete old", "create new"]);
        assert_eq!(result.summary.replaced, 1);
        assert_eq!(
            result.outcomes[0].state,
            StateTransition::Set(item("new"))
        );
    }

    #[test]
    fn test_failed_recreate_stops_tracking() {
        let r = Recorder::new();
        let p = plan(&r, &[("x", Some(item("old")), Some(item("bad")))]);

        let result = execute(
            &r,
            p,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        assert_eq!(result.summary.failed, 1);
        assert_eq!(result.outcomes[0].state, StateTransition::Remove);
    }

    #[test]
    fn test_failure_does_not_stop_other_changes() {
        let r = Recorder::new();
        let p = plan(
            &r,
            &[
                ("a", None, Some(item("bad"))),
                ("b", None, Some(item("good"))),
                ("c", Some(item("gone")), None),
            ],
        );
        let opts = ExecuteOptions {
            jobs: 2,
            ..ExecuteOptions::default()
        };

        let result = execute(&r, p, &opts, &mut NoProgress, &mut AutoConfirm).unwrap();

        assert_eq!(result.summary.failed, 1);
        assert_eq!(result.summary.created, 1);
        assert_eq!(result.summary.removed, 1);
        // Outcomes keep plan order even when run in parallel
        let addresses: Vec<_> = result.outcomes.iter().map(|o| o.address.as_str()).collect();
        assert_eq!(addresses, vec!["a", "b", "c"]);
        assert_eq!(result.outcomes[0].state, StateTransition::Keep);
    }

    #[test]
    fn test_declined_changes_are_skipped() {
        let r = Recorder::new();
        let p = plan(&r, &[("a", None, Some(item("a")))]);

        let result = execute(
            &r,
            p,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();

        assert_eq!(result.summary.skipped, 1);
        assert!(r.calls().is_empty());
    }

    #[test]
    fn test_dry_run_makes_no_calls() {
        let r = Recorder::new();
        let p = plan(&r, &[("a", None, Some(item("a")))]);
        let opts = ExecuteOptions {
            dry_run: true,
            ..ExecuteOptions::default()
        };

        let result = execute(&r, p, &opts, &mut NoProgress, &mut AutoDecline).unwrap();

        assert_eq!(result.summary.total(), 0);
        assert!(r.calls().is_empty());
    }
}
