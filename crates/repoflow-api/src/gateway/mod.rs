//! Gateway trait and implementations for the RepoFlow API.
//!
//! The [`Gateway`] trait is the only way reconcilers reach the remote
//! service. [`http::HttpGateway`] talks to a real instance;
//! [`MockGateway`] keeps everything in memory and records every call.
//!
//! # Testing
//!
//! ```
//! use repoflow_api::gateway::{Gateway, MockGateway};
//! use repoflow_api::LocalRepositoryOptions;
//!
//! let mock = MockGateway::new();
//! let ws = mock.add_workspace("example");
//!
//! let repo = mock
//!     .create_local_repository(
//!         &ws.id,
//!         &LocalRepositoryOptions { name: "npm-local".into(), package_type: "npm".into() },
//!     )
//!     .unwrap();
//! assert_eq!(mock.get_repository(&ws.id, &repo.id).unwrap().name, "npm-local");
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{
    ChildRepository, DeletedRepository, LocalRepositoryOptions, RemoteRepositoryOptions,
    Repository, VirtualRepositoryOptions, Workspace, WorkspaceOptions,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Remote operations on workspaces and repositories.
///
/// Every call blocks until the service answers. Implementations perform no
/// retries; a failed call is reported once.
pub trait Gateway: Send + Sync {
    /// Create a workspace.
    fn create_workspace(&self, options: &WorkspaceOptions) -> Result<Workspace>;

    /// Look up a workspace by name or id.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no workspace matches.
    fn get_workspace(&self, reference: &str) -> Result<Workspace>;

    /// Delete a workspace by name or id.
    fn delete_workspace(&self, reference: &str) -> Result<Workspace>;

    /// Create a local (hosted) repository.
    fn create_local_repository(
        &self,
        workspace_id: &str,
        options: &LocalRepositoryOptions,
    ) -> Result<Repository>;

    /// Create a remote (proxy) repository.
    fn create_remote_repository(
        &self,
        workspace_id: &str,
        options: &RemoteRepositoryOptions,
    ) -> Result<Repository>;

    /// Create a virtual (group) repository.
    fn create_virtual_repository(
        &self,
        workspace_id: &str,
        options: &VirtualRepositoryOptions,
    ) -> Result<Repository>;

    /// Fetch a repository.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the repository does not exist.
    fn get_repository(&self, workspace_id: &str, repository_id: &str) -> Result<Repository>;

    /// Delete a repository.
    fn delete_repository(&self, workspace_id: &str, repository_id: &str)
    -> Result<DeletedRepository>;
}

/// A call recorded by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateWorkspace(WorkspaceOptions),
    GetWorkspace(String),
    DeleteWorkspace(String),
    CreateLocalRepository(String, LocalRepositoryOptions),
    CreateRemoteRepository(String, RemoteRepositoryOptions),
    CreateVirtualRepository(String, VirtualRepositoryOptions),
    GetRepository(String, String),
    DeleteRepository(String, String),
}

impl Call {
    /// Operation name, as used by [`MockGateway::fail`].
    pub fn operation(&self) -> &'static str {
        match self {
            Self::CreateWorkspace(_) => "create_workspace",
            Self::GetWorkspace(_) => "get_workspace",
            Self::DeleteWorkspace(_) => "delete_workspace",
            Self::CreateLocalRepository(..) => "create_local_repository",
            Self::CreateRemoteRepository(..) => "create_remote_repository",
            Self::CreateVirtualRepository(..) => "create_virtual_repository",
            Self::GetRepository(..) => "get_repository",
            Self::DeleteRepository(..) => "delete_repository",
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    workspaces: Vec<Workspace>,
    /// Repositories keyed by workspace id
    repositories: HashMap<String, Vec<Repository>>,
    workspace_seq: u64,
    repository_seq: u64,
    calls: Vec<Call>,
    /// Injected failures: operation name -> HTTP status
    failures: HashMap<&'static str, u16>,
}

impl MockState {
    fn next_workspace_id(&mut self) -> String {
        self.workspace_seq += 1;
        format!("w{}", self.workspace_seq)
    }

    fn next_repository_id(&mut self) -> String {
        self.repository_seq += 1;
        format!("r{}", self.repository_seq)
    }

    fn workspace(&self, reference: &str) -> Option<&Workspace> {
        self.workspaces
            .iter()
            .find(|w| w.id == reference || w.name == reference)
    }

    fn record(&mut self, call: Call) -> Result<()> {
        let operation = call.operation();
        self.calls.push(call);
        match self.failures.get(operation) {
            Some(404) => Err(Error::NotFound(format!("mock {operation}"))),
            Some(&status) => Err(Error::Http {
                status,
                url: format!("mock://{operation}"),
            }),
            None => Ok(()),
        }
    }

    fn insert_repository(&mut self, workspace_id: &str, repository: Repository) -> Result<Repository> {
        if self.workspace(workspace_id).is_none() {
            return Err(Error::NotFound(format!("workspace {workspace_id}")));
        }
        self.repositories
            .entry(workspace_id.to_string())
            .or_default()
            .push(repository.clone());
        Ok(repository)
    }
}

/// In-memory gateway for testing without network access.
///
/// Ids are sequential per kind (`w1`, `w2`, `r1`, ...). Clones share state,
/// so a test can keep a handle while a reconciler owns another.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
}

impl MockGateway {
    /// Create a new empty mock gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a workspace without recording a call.
    pub fn add_workspace(&self, name: &str) -> Workspace {
        let mut state = self.state.lock().unwrap();
        let workspace = Workspace {
            id: state.next_workspace_id(),
            name: name.to_string(),
        };
        state.workspaces.push(workspace.clone());
        workspace
    }

    /// Seed a repository exactly as given, without recording a call.
    pub fn add_repository(&self, workspace_id: &str, repository: Repository) {
        let mut state = self.state.lock().unwrap();
        state
            .repositories
            .entry(workspace_id.to_string())
            .or_default()
            .push(repository);
    }

    /// Make every later call of `operation` fail with the given HTTP status.
    pub fn fail(&self, operation: &'static str, status: u16) {
        self.state.lock().unwrap().failures.insert(operation, status);
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of repositories currently stored in a workspace.
    pub fn repository_count(&self, workspace_id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .repositories
            .get(workspace_id)
            .map_or(0, Vec::len)
    }
}

impl Gateway for MockGateway {
    fn create_workspace(&self, options: &WorkspaceOptions) -> Result<Workspace> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::CreateWorkspace(options.clone()))?;
        let workspace = Workspace {
            id: state.next_workspace_id(),
            name: options.name.clone(),
        };
        state.workspaces.push(workspace.clone());
        Ok(workspace)
    }

    fn get_workspace(&self, reference: &str) -> Result<Workspace> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::GetWorkspace(reference.to_string()))?;
        state
            .workspace(reference)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("workspace {reference}")))
    }

    fn delete_workspace(&self, reference: &str) -> Result<Workspace> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::DeleteWorkspace(reference.to_string()))?;
        let workspace = state
            .workspace(reference)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("workspace {reference}")))?;
        state.workspaces.retain(|w| w.id != workspace.id);
        state.repositories.remove(&workspace.id);
        Ok(workspace)
    }

    fn create_local_repository(
        &self,
        workspace_id: &str,
        options: &LocalRepositoryOptions,
    ) -> Result<Repository> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::CreateLocalRepository(
            workspace_id.to_string(),
            options.clone(),
        ))?;
        let repository = Repository {
            id: state.next_repository_id(),
            name: options.name.clone(),
            repository_type: "local".into(),
            package_type: options.package_type.clone(),
            ..Repository::default()
        };
        state.insert_repository(workspace_id, repository)
    }

    fn create_remote_repository(
        &self,
        workspace_id: &str,
        options: &RemoteRepositoryOptions,
    ) -> Result<Repository> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::CreateRemoteRepository(
            workspace_id.to_string(),
            options.clone(),
        ))?;
        let repository = Repository {
            id: state.next_repository_id(),
            name: options.name.clone(),
            repository_type: "remote".into(),
            package_type: options.package_type.clone(),
            remote_repository_url: Some(options.remote_repository_url.clone()),
            remote_repository_username: options.remote_repository_username.clone(),
            remote_repository_password: options.remote_repository_password.clone(),
            is_remote_cache_enabled: options.is_remote_cache_enabled,
            file_cache_time_till_revalidation: options.file_cache_time_till_revalidation,
            metadata_cache_time_till_revalidation: options.metadata_cache_time_till_revalidation,
            ..Repository::default()
        };
        state.insert_repository(workspace_id, repository)
    }

    fn create_virtual_repository(
        &self,
        workspace_id: &str,
        options: &VirtualRepositoryOptions,
    ) -> Result<Repository> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::CreateVirtualRepository(
            workspace_id.to_string(),
            options.clone(),
        ))?;
        let siblings = state.repositories.get(workspace_id);
        let children = options
            .child_repository_ids
            .iter()
            .map(|id| ChildRepository {
                id: id.clone(),
                name: siblings
                    .and_then(|repos| repos.iter().find(|r| &r.id == id))
                    .map(|r| r.name.clone()),
            })
            .collect();
        let repository = Repository {
            id: state.next_repository_id(),
            name: options.name.clone(),
            repository_type: "virtual".into(),
            package_type: options.package_type.clone(),
            child_repositories: Some(children),
            upload_local_repository_id: options.upload_local_repository_id.clone(),
            ..Repository::default()
        };
        state.insert_repository(workspace_id, repository)
    }

    fn get_repository(&self, workspace_id: &str, repository_id: &str) -> Result<Repository> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::GetRepository(
            workspace_id.to_string(),
            repository_id.to_string(),
        ))?;
        state
            .repositories
            .get(workspace_id)
            .and_then(|repos| repos.iter().find(|r| r.id == repository_id))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("repository {workspace_id}/{repository_id}")))
    }

    fn delete_repository(
        &self,
        workspace_id: &str,
        repository_id: &str,
    ) -> Result<DeletedRepository> {
        let mut state = self.state.lock().unwrap();
        state.record(Call::DeleteRepository(
            workspace_id.to_string(),
            repository_id.to_string(),
        ))?;
        let repos = state
            .repositories
            .get_mut(workspace_id)
            .ok_or_else(|| Error::NotFound(format!("workspace {workspace_id}")))?;
        let before = repos.len();
        repos.retain(|r| r.id != repository_id);
        if repos.len() == before {
            return Err(Error::NotFound(format!(
                "repository {workspace_id}/{repository_id}"
            )));
        }
        Ok(DeletedRepository {
            repository_id: repository_id.to_string(),
        })
    }
}
