//! The `workspace` resource

use std::sync::Arc;

use declarative::{Attribute, Attributes, Resource, Schema, StateModel};
use repoflow_api::{Gateway, Workspace, WorkspaceOptions};
use serde::{Deserialize, Serialize};

use super::ReconcileError;

/// A workspace as declared in the manifest and tracked in state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceDesired {
    /// Assigned by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

impl From<Workspace> for WorkspaceDesired {
    fn from(ws: Workspace) -> Self {
        Self {
            id: Some(ws.id),
            name: ws.name,
        }
    }
}

impl StateModel for WorkspaceDesired {
    fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("id".into(), self.id.clone().into());
        attrs.insert("name".into(), self.name.clone().into());
        attrs
    }
}

pub fn schema() -> Schema {
    Schema::new(
        "workspace",
        "A RepoFlow workspace",
        vec![
            Attribute::string("id")
                .describe("Workspace id")
                .computed()
                .use_state_for_unknown(),
            Attribute::string("name")
                .describe("Workspace name")
                .required()
                .requires_replace(),
        ],
    )
}

pub struct WorkspaceReconciler {
    gateway: Arc<dyn Gateway>,
    schema: Schema,
}

impl WorkspaceReconciler {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            schema: schema(),
        }
    }

    /// Reference used to address a tracked workspace
    fn reference(tracked: &WorkspaceDesired) -> &str {
        tracked.id.as_deref().unwrap_or(&tracked.name)
    }

    fn remote_error(
        operation: &'static str,
        reference: &str,
        err: repoflow_api::Error,
    ) -> ReconcileError {
        if err.is_not_found() {
            ReconcileError::WorkspaceNotFound(reference.to_string())
        } else {
            ReconcileError::RemoteOperationFailed {
                operation,
                variant: None,
                workspace: reference.to_string(),
                source: err,
            }
        }
    }

    pub fn create(&self, desired: &WorkspaceDesired) -> Result<WorkspaceDesired, ReconcileError> {
        log::debug!("Creating workspace {}", desired.name);
        let ws = self
            .gateway
            .create_workspace(&WorkspaceOptions {
                name: desired.name.clone(),
            })
            .map_err(|e| Self::remote_error("create workspace", &desired.name, e))?;

        log::trace!("Created workspace: id={} name={}", ws.id, ws.name);
        Ok(ws.into())
    }

    /// Refresh a tracked workspace; a missing one is [`ReconcileError::NotFound`].
    pub fn read(&self, tracked: &WorkspaceDesired) -> Result<WorkspaceDesired, ReconcileError> {
        let reference = Self::reference(tracked);
        log::debug!("Reading workspace {reference}");
        let ws = self.gateway.get_workspace(reference).map_err(|e| {
            if e.is_not_found() {
                ReconcileError::NotFound(format!("workspace {reference}"))
            } else {
                Self::remote_error("read workspace", reference, e)
            }
        })?;

        log::trace!("Read workspace: id={}", ws.id);
        Ok(ws.into())
    }

    pub fn update(
        &self,
        tracked: &WorkspaceDesired,
        planned: &WorkspaceDesired,
    ) -> Result<WorkspaceDesired, ReconcileError> {
        let triggers: Vec<String> = self
            .schema
            .diff(&tracked.attributes(), &planned.attributes())
            .into_iter()
            .filter(|c| c.forces_replacement)
            .map(|c| c.attribute)
            .collect();
        if !triggers.is_empty() {
            return Err(ReconcileError::RequiresReplace {
                attributes: triggers,
            });
        }
        Ok(WorkspaceDesired {
            id: tracked.id.clone(),
            ..planned.clone()
        })
    }

    pub fn delete(&self, tracked: &WorkspaceDesired) -> Result<(), ReconcileError> {
        let reference = Self::reference(tracked);
        log::debug!("Deleting workspace {reference}");
        let ws = self.gateway.delete_workspace(reference).map_err(|e| {
            if e.is_not_found() {
                ReconcileError::NotFound(format!("workspace {reference}"))
            } else {
                Self::remote_error("delete workspace", reference, e)
            }
        })?;

        log::trace!("Deleted workspace: id={}", ws.id);
        Ok(())
    }

    /// Adopt an existing workspace by name or id.
    pub fn import(&self, reference: &str) -> Result<WorkspaceDesired, ReconcileError> {
        if reference.is_empty() {
            return Err(ReconcileError::InvalidImportFormat(reference.to_string()));
        }
        log::debug!("Importing workspace {reference}");
        let ws = self
            .gateway
            .get_workspace(reference)
            .map_err(|e| Self::remote_error("import workspace", reference, e))?;

        log::trace!("Imported workspace: id={}", ws.id);
        Ok(ws.into())
    }
}

impl Resource for WorkspaceReconciler {
    type Model = WorkspaceDesired;

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create(&self, planned: &WorkspaceDesired) -> anyhow::Result<WorkspaceDesired> {
        Ok(Self::create(self, planned)?)
    }

    fn read(&self, prior: &WorkspaceDesired) -> anyhow::Result<Option<WorkspaceDesired>> {
        match Self::read(self, prior) {
            Ok(ws) => Ok(Some(ws)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn update(
        &self,
        prior: &WorkspaceDesired,
        planned: &WorkspaceDesired,
    ) -> anyhow::Result<WorkspaceDesired> {
        Ok(Self::update(self, prior, planned)?)
    }

    fn delete(&self, prior: &WorkspaceDesired) -> anyhow::Result<()> {
        Ok(Self::delete(self, prior)?)
    }

    fn import(&self, token: &str) -> anyhow::Result<WorkspaceDesired> {
        Ok(Self::import(self, token)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{Action, plan_change};
    use repoflow_api::{Call, MockGateway};

    fn setup() -> (MockGateway, WorkspaceReconciler) {
        let mock = MockGateway::new();
        let reconciler = WorkspaceReconciler::new(Arc::new(mock.clone()));
        (mock, reconciler)
    }

    fn named(name: &str) -> WorkspaceDesired {
        WorkspaceDesired {
            id: None,
            name: name.into(),
        }
    }

    #[test]
    fn test_create_then_read() {
        let (_mock, reconciler) = setup();
        let tracked = reconciler.create(&named("example")).unwrap();
        assert_eq!(tracked.id.as_deref(), Some("w1"));

        let refreshed = reconciler.read(&tracked).unwrap();
        assert_eq!(refreshed, tracked);

        let change = plan_change(&reconciler, "example", Some(&refreshed), Some(&named("example")))
            .unwrap();
        assert_eq!(change.action, Action::NoOp);
    }

    #[test]
    fn test_rename_requires_replace() {
        let (_mock, reconciler) = setup();
        let tracked = reconciler.create(&named("example")).unwrap();

        let change =
            plan_change(&reconciler, "example", Some(&tracked), Some(&named("renamed"))).unwrap();
        assert_eq!(
            change.action,
            Action::Replace {
                triggers: vec!["name".into()]
            }
        );
        assert!(matches!(
            reconciler.update(&tracked, &named("renamed")),
            Err(ReconcileError::RequiresReplace { .. })
        ));
    }

    #[test]
    fn test_read_gone() {
        let (mock, reconciler) = setup();
        let tracked = reconciler.create(&named("example")).unwrap();
        mock.delete_workspace("w1").unwrap();

        assert!(reconciler.read(&tracked).unwrap_err().is_not_found());
        assert!(Resource::read(&reconciler, &tracked).unwrap().is_none());
    }

    #[test]
    fn test_delete_by_id() {
        let (mock, reconciler) = setup();
        let tracked = reconciler.create(&named("example")).unwrap();

        reconciler.delete(&tracked).unwrap();
        assert_eq!(mock.calls().last(), Some(&Call::DeleteWorkspace("w1".into())));
        assert!(reconciler.delete(&tracked).unwrap_err().is_not_found());
    }

    #[test]
    fn test_import_by_name() {
        let (mock, reconciler) = setup();
        mock.add_workspace("example");

        let imported = reconciler.import("example").unwrap();
        assert_eq!(imported.id.as_deref(), Some("w1"));
        assert!(matches!(
            reconciler.import("missing"),
            Err(ReconcileError::WorkspaceNotFound(_))
        ));
        assert!(matches!(
            reconciler.import(""),
            Err(ReconcileError::InvalidImportFormat(_))
        ));
    }

    #[test]
    fn test_create_failure() {
        let (mock, reconciler) = setup();
        mock.fail("create_workspace", 409);

        assert!(matches!(
            reconciler.create(&named("example")),
            Err(ReconcileError::RemoteOperationFailed {
                operation: "create workspace",
                ..
            })
        ));
    }
}
