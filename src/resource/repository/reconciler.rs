//! Repository reconciler: create, read, update, delete and import

use std::sync::Arc;

use declarative::{Resource, Schema, StateModel};
use repoflow_api::{Gateway, Workspace};

use super::identity;
use super::mapper::{self, CreateRequest};
use super::model::{self, RepositoryDesired};
use super::variant::{self, Variant};
use crate::resource::ReconcileError;

/// Drives one repository at a time against the service.
///
/// Holds no per-resource state; every call works on the records it is given.
pub struct RepositoryReconciler {
    gateway: Arc<dyn Gateway>,
    schema: Schema,
}

impl RepositoryReconciler {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            schema: model::schema(),
        }
    }

    fn resolve_workspace(&self, reference: &str) -> Result<Workspace, ReconcileError> {
        log::debug!("Resolving workspace {reference}");
        self.gateway.get_workspace(reference).map_err(|e| {
            if e.is_not_found() {
                ReconcileError::WorkspaceNotFound(reference.to_string())
            } else {
                ReconcileError::RemoteOperationFailed {
                    operation: "resolve workspace",
                    variant: None,
                    workspace: reference.to_string(),
                    source: e,
                }
            }
        })
    }

    fn tracked_identity(tracked: &RepositoryDesired) -> Result<(&str, &str), ReconcileError> {
        identity::decode(tracked.id.as_deref().unwrap_or_default())
    }

    /// Create the declared repository and return the record to track.
    ///
    /// Validation runs before the first gateway call.
    pub fn create(&self, desired: &RepositoryDesired) -> Result<RepositoryDesired, ReconcileError> {
        let variant = variant::classify(desired)?;
        let validated = variant::validate(desired, variant)?;

        let workspace = self.resolve_workspace(&desired.workspace_ref)?;
        let request = mapper::to_create_request(&validated);
        log::debug!(
            "Creating {variant} repository in workspace {}: {request:?}",
            workspace.id
        );

        let result = match &request {
            CreateRequest::Local(opts) => self.gateway.create_local_repository(&workspace.id, opts),
            CreateRequest::Remote(opts) => {
                self.gateway.create_remote_repository(&workspace.id, opts)
            }
            CreateRequest::Virtual(opts) => {
                self.gateway.create_virtual_repository(&workspace.id, opts)
            }
        };
        let created = result.map_err(|source| ReconcileError::RemoteOperationFailed {
            operation: "create",
            variant: Some(variant),
            workspace: workspace.id.clone(),
            source,
        })?;

        let tracked = mapper::merge_remote(desired, &created, &workspace.id)?;
        trace_lifecycle("Created", &created.id, &workspace.id, &tracked);
        Ok(tracked)
    }

    /// Refresh a tracked repository.
    ///
    /// Returns [`ReconcileError::NotFound`] when the service no longer has it.
    pub fn read(&self, tracked: &RepositoryDesired) -> Result<RepositoryDesired, ReconcileError> {
        let (workspace_id, repository_id) = Self::tracked_identity(tracked)?;

        log::debug!("Reading repository {repository_id} in workspace {workspace_id}");
        let remote = self
            .gateway
            .get_repository(workspace_id, repository_id)
            .map_err(|e| {
                if e.is_not_found() {
                    ReconcileError::NotFound(format!("repository {workspace_id}/{repository_id}"))
                } else {
                    ReconcileError::RemoteOperationFailed {
                        operation: "read",
                        variant: variant::classify(tracked).ok(),
                        workspace: workspace_id.to_string(),
                        source: e,
                    }
                }
            })?;

        let refreshed = mapper::merge_remote(tracked, &remote, workspace_id)?;
        trace_lifecycle("Read", &remote.id, workspace_id, &refreshed);
        Ok(refreshed)
    }

    /// Re-persist a planned record without contacting the service.
    ///
    /// Every attribute is replace-on-change, so any difference other than
    /// the computed id is refused with [`ReconcileError::RequiresReplace`].
    pub fn update(
        &self,
        tracked: &RepositoryDesired,
        planned: &RepositoryDesired,
    ) -> Result<RepositoryDesired, ReconcileError> {
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

        Ok(RepositoryDesired {
            id: tracked.id.clone(),
            ..planned.clone()
        })
    }

    /// Delete a tracked repository.
    ///
    /// A repository that is already gone is reported as
    /// [`ReconcileError::NotFound`].
    pub fn delete(&self, tracked: &RepositoryDesired) -> Result<(), ReconcileError> {
        let (workspace_id, repository_id) = Self::tracked_identity(tracked)?;

        log::debug!("Deleting repository {repository_id} in workspace {workspace_id}");
        let deleted = self
            .gateway
            .delete_repository(workspace_id, repository_id)
            .map_err(|e| {
                if e.is_not_found() {
                    ReconcileError::NotFound(format!("repository {workspace_id}/{repository_id}"))
                } else {
                    ReconcileError::RemoteOperationFailed {
                        operation: "delete",
                        variant: variant::classify(tracked).ok(),
                        workspace: workspace_id.to_string(),
                        source: e,
                    }
                }
            })?;

        trace_lifecycle("Deleted", &deleted.repository_id, workspace_id, tracked);
        Ok(())
    }

    /// Adopt an existing repository from a `<workspaceRef>/<repositoryId>` token.
    pub fn import(&self, token: &str) -> Result<RepositoryDesired, ReconcileError> {
        let (workspace_ref, repository_id) = identity::split_import(token)?;
        let workspace = self.resolve_workspace(workspace_ref)?;

        log::debug!(
            "Importing repository {repository_id} from workspace {}",
            workspace.id
        );
        let remote = self
            .gateway
            .get_repository(&workspace.id, repository_id)
            .map_err(|e| {
                if e.is_not_found() {
                    ReconcileError::NotFound(format!("repository {workspace_ref}/{repository_id}"))
                } else {
                    ReconcileError::RemoteOperationFailed {
                        operation: "import",
                        variant: None,
                        workspace: workspace.id.clone(),
                        source: e,
                    }
                }
            })?;

        let mut imported = mapper::from_remote(&remote, &workspace.id)?;
        imported.workspace_ref = workspace_ref.to_string();
        trace_lifecycle("Imported", &remote.id, &workspace.id, &imported);
        Ok(imported)
    }
}

impl Resource for RepositoryReconciler {
    type Model = RepositoryDesired;

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create(&self, planned: &RepositoryDesired) -> anyhow::Result<RepositoryDesired> {
        Ok(Self::create(self, planned)?)
    }

    fn read(&self, prior: &RepositoryDesired) -> anyhow::Result<Option<RepositoryDesired>> {
        match Self::read(self, prior) {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn update(
        &self,
        prior: &RepositoryDesired,
        planned: &RepositoryDesired,
    ) -> anyhow::Result<RepositoryDesired> {
        Ok(Self::update(self, prior, planned)?)
    }

    fn delete(&self, prior: &RepositoryDesired) -> anyhow::Result<()> {
        Ok(Self::delete(self, prior)?)
    }

    fn import(&self, token: &str) -> anyhow::Result<RepositoryDesired> {
        Ok(Self::import(self, token)?)
    }
}

fn trace_lifecycle(
    action: &str,
    repository_id: &str,
    workspace_id: &str,
    record: &RepositoryDesired,
) {
    log::trace!(
        "{action} repository: repository_id={repository_id} package_type={} repository_type={} workspace_id={workspace_id} id={}",
        record.package_type.as_deref().unwrap_or_default(),
        record.repository_type.as_deref().unwrap_or_default(),
        record.id.as_deref().unwrap_or_default()
    );
}

/// Variant of a tracked record, for display.
pub fn describe(record: &RepositoryDesired) -> String {
    match variant::classify(record) {
        Ok(v) => format!(
            "{v} {} repository",
            record.package_type.as_deref().unwrap_or("?")
        ),
        Err(_) => "repository".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{
        Action, AutoConfirm, ExecuteOptions, NoProgress, Plan, StateTransition, execute,
        plan_change,
    };
    use repoflow_api::{Call, LocalRepositoryOptions, MockGateway, Secret};

    fn setup() -> (MockGateway, RepositoryReconciler) {
        let mock = MockGateway::new();
        mock.add_workspace("example");
        let reconciler = RepositoryReconciler::new(Arc::new(mock.clone()));
        (mock, reconciler)
    }

    fn local(name: &str) -> RepositoryDesired {
        RepositoryDesired {
            name: name.into(),
            workspace_ref: "example".into(),
            repository_type: Some("local".into()),
            package_type: Some("npm".into()),
            ..RepositoryDesired::default()
        }
    }

    fn proxy() -> RepositoryDesired {
        RepositoryDesired {
            repository_type: Some("remote".into()),
            remote_url: Some("https://registry.npmjs.org".into()),
            remote_username: Some("bot".into()),
            remote_password: Some(Secret::new("hunter2")),
            ..local("npm-proxy")
        }
    }

    #[test]
    fn test_create_local() {
        let (mock, reconciler) = setup();

        let tracked = reconciler.create(&local("local-example")).unwrap();

        assert_eq!(tracked.id.as_deref(), Some("w1/r1"));
        assert_eq!(tracked.workspace_ref, "example");
        assert_eq!(
            mock.calls(),
            vec![
                Call::GetWorkspace("example".into()),
                Call::CreateLocalRepository(
                    "w1".into(),
                    LocalRepositoryOptions {
                        name: "local-example".into(),
                        package_type: "npm".into(),
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_create_uses_resolved_workspace_id() {
        let (mock, reconciler) = setup();
        reconciler.create(&proxy()).unwrap();

        assert!(matches!(
            &mock.calls()[1],
            Call::CreateRemoteRepository(ws, _) if ws == "w1"
        ));
    }

    #[test]
    fn test_create_virtual_missing_children_makes_no_calls() {
        let (mock, reconciler) = setup();
        let group = RepositoryDesired {
            repository_type: Some("virtual".into()),
            ..local("npm-group")
        };

        let err = reconciler.create(&group).unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Validation(variant::ValidationError::MissingRequiredField(
                "child_repository_ids"
            ))
        ));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_create_without_workspace_makes_no_calls() {
        let (mock, reconciler) = setup();
        let orphan = RepositoryDesired {
            workspace_ref: String::new(),
            ..local("npm-local")
        };

        let err = reconciler.create(&orphan).unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Validation(variant::ValidationError::MissingRequiredField(
                "workspace_ref"
            ))
        ));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_create_virtual_tracks_children_in_order() {
        let (_mock, reconciler) = setup();
        let a = reconciler.create(&local("a")).unwrap();
        let b = reconciler.create(&local("b")).unwrap();
        let (_, a_id) = identity::decode(a.id.as_deref().unwrap()).unwrap();
        let (_, b_id) = identity::decode(b.id.as_deref().unwrap()).unwrap();

        let group = RepositoryDesired {
            repository_type: Some("virtual".into()),
            child_repository_ids: Some(vec![b_id.into(), a_id.into()]),
            upload_target_local_repository_id: Some(a_id.into()),
            ..local("npm-group")
        };
        let tracked = reconciler.create(&group).unwrap();

        assert_eq!(tracked.child_repository_ids, group.child_repository_ids);
        assert_eq!(tracked.upload_target_local_repository_id.as_deref(), Some(a_id));
    }

    #[test]
    fn test_create_unknown_workspace() {
        let (_mock, reconciler) = setup();
        let mut desired = local("x");
        desired.workspace_ref = "missing".into();

        assert!(matches!(
            reconciler.create(&desired),
            Err(ReconcileError::WorkspaceNotFound(ws)) if ws == "missing"
        ));
    }

    #[test]
    fn test_create_failure_is_annotated() {
        let (mock, reconciler) = setup();
        mock.fail("create_remote_repository", 500);

        let err = reconciler.create(&proxy()).unwrap_err();
        match err {
            ReconcileError::RemoteOperationFailed {
                operation,
                variant,
                workspace,
                ..
            } => {
                assert_eq!(operation, "create");
                assert_eq!(variant, Some(Variant::Remote));
                assert_eq!(workspace, "w1");
            }
            other => panic!("Expected RemoteOperationFailed, got {other:?}"),
        }
        assert_eq!(mock.repository_count("w1"), 0);
    }

    #[test]
    fn test_null_and_zero_ttl_survive_create() {
        let (mock, reconciler) = setup();
        let desired = RepositoryDesired {
            metadata_cache_ttl_ms: Some(0),
            ..proxy()
        };

        let tracked = reconciler.create(&desired).unwrap();

        assert_eq!(tracked.file_cache_ttl_ms, None);
        assert_eq!(tracked.metadata_cache_ttl_ms, Some(0));
        let Call::CreateRemoteRepository(_, opts) = &mock.calls()[1] else {
            panic!("Expected remote create");
        };
        assert_eq!(opts.file_cache_time_till_revalidation, None);
        assert_eq!(opts.metadata_cache_time_till_revalidation, Some(0));
    }

    #[test]
    fn test_created_record_plans_no_change() {
        let (_mock, reconciler) = setup();
        for desired in [local("npm-local"), proxy()] {
            let tracked = reconciler.create(&desired).unwrap();
            let refreshed = reconciler.read(&tracked).unwrap();

            let change =
                plan_change(&reconciler, "r", Some(&refreshed), Some(&desired)).unwrap();
            assert_eq!(change.action, Action::NoOp, "{:?}", change.diff);
        }
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let (mock, reconciler) = setup();
        let tracked = reconciler.create(&local("gone")).unwrap();
        let (ws, id) = identity::decode(tracked.id.as_deref().unwrap()).unwrap();
        mock.delete_repository(ws, id).unwrap();

        assert!(reconciler.read(&tracked).unwrap_err().is_not_found());
        assert!(Resource::read(&reconciler, &tracked).unwrap().is_none());
    }

    #[test]
    fn test_read_without_identity_is_malformed() {
        let (mock, reconciler) = setup();
        assert!(matches!(
            reconciler.read(&local("x")),
            Err(ReconcileError::MalformedIdentity(_))
        ));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_read_keeps_declared_workspace_and_password() {
        let (_mock, reconciler) = setup();
        let tracked = reconciler.create(&proxy()).unwrap();

        let refreshed = reconciler.read(&tracked).unwrap();
        assert_eq!(refreshed.workspace_ref, "example");
        assert_eq!(refreshed.remote_password, Some(Secret::new("hunter2")));
    }

    #[test]
    fn test_update_refuses_replace_only_changes() {
        let (mock, reconciler) = setup();
        let tracked = reconciler.create(&local("npm-local")).unwrap();
        let calls_before = mock.calls().len();

        let mut renamed = local("npm-hosted");
        renamed.package_type = Some("pypi".into());
        match reconciler.update(&tracked, &renamed).unwrap_err() {
            ReconcileError::RequiresReplace { attributes } => {
                assert_eq!(attributes, vec!["name", "package_type"]);
            }
            other => panic!("Expected RequiresReplace, got {other:?}"),
        }

        let same = reconciler.update(&tracked, &local("npm-local")).unwrap();
        assert_eq!(same.id, tracked.id);
        assert_eq!(mock.calls().len(), calls_before);
    }

    #[test]
    fn test_delete() {
        let (mock, reconciler) = setup();
        let tracked = reconciler.create(&local("npm-local")).unwrap();

        reconciler.delete(&tracked).unwrap();
        assert_eq!(mock.repository_count("w1"), 0);

        assert!(reconciler.delete(&tracked).unwrap_err().is_not_found());
    }

    #[test]
    fn test_import() {
        let (_mock, reconciler) = setup();
        let created = reconciler.create(&proxy()).unwrap();
        let (_, id) = identity::decode(created.id.as_deref().unwrap()).unwrap();

        let imported = reconciler.import(&format!("example/{id}")).unwrap();

        assert_eq!(imported.id, created.id);
        assert_eq!(imported.workspace_ref, "example");
        assert_eq!(imported.remote_url, created.remote_url);
        assert_eq!(imported.remote_cache_enabled, created.remote_cache_enabled);
    }

    #[test]
    fn test_import_malformed_makes_no_calls() {
        let (mock, reconciler) = setup();
        assert!(matches!(
            reconciler.import("not-a-valid-id"),
            Err(ReconcileError::InvalidImportFormat(_))
        ));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_import_missing_repository() {
        let (_mock, reconciler) = setup();
        assert!(reconciler.import("example/r42").unwrap_err().is_not_found());
    }

    #[test]
    fn test_replace_deletes_before_creating() {
        let (mock, reconciler) = setup();
        let tracked = reconciler.create(&local("npm-local")).unwrap();

        let mut plan = Plan::new("repository");
        plan.push(
            plan_change(
                &reconciler,
                "npm",
                Some(&tracked),
                Some(&local("npm-hosted")),
            )
            .unwrap(),
        );
        assert!(matches!(plan.changes[0].action, Action::Replace { .. }));

        let execution = execute(
            &reconciler,
            plan,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoConfirm,
        )
        .unwrap();

        let ops: Vec<&str> = mock.calls().iter().skip(2).map(Call::operation).collect();
        assert_eq!(
            ops,
            vec!["delete_repository", "get_workspace", "create_local_repository"]
        );
        match &execution.outcomes[0].state {
            StateTransition::Set(record) => assert_eq!(record.name, "npm-hosted"),
            other => panic!("Expected Set, got {other:?}"),
        }
    }

    #[test]
    fn test_request_debug_hides_password() {
        let validated = variant::validate(&proxy(), Variant::Remote).unwrap();
        let request = mapper::to_create_request(&validated);
        assert!(!format!("{request:?}").contains("hunter2"));
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&proxy()), "remote npm repository");
    }
}
