//! HTTP gateway.
//!
//! This module provides [`HttpGateway`], the [`Gateway`] implementation that
//! talks to a RepoFlow instance over its JSON API.
//!
//! Every request carries the API key as a bearer token. Path segments are
//! percent-encoded, so workspace names with spaces or slashes are safe to pass
//! as references.

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::types::{
    DeletedRepository, LocalRepositoryOptions, RemoteRepositoryOptions, Repository, Secret,
    VirtualRepositoryOptions, Workspace, WorkspaceOptions,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Gateway backed by the RepoFlow HTTP API.
///
/// # Example
///
/// ```no_run
/// use repoflow_api::gateway::Gateway;
/// use repoflow_api::gateway::http::HttpGateway;
///
/// let gateway = HttpGateway::new("https://repoflow.example.com/api", "key");
/// let workspace = gateway.get_workspace("example").unwrap();
/// println!("{}", workspace.id);
/// ```
pub struct HttpGateway {
    agent: ureq::Agent,
    base_url: String,
    api_key: Secret,
}

impl HttpGateway {
    /// Create a gateway for the given API base URL.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<Secret>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            agent: ureq::Agent::new_with_defaults(),
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Get the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.api_key.expose())
    }

    fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        log::debug!("GET {url}");
        self.agent
            .get(url)
            .header("Authorization", self.authorization())
            .header("Accept", "application/json")
            .call()
            .map_err(|e| Error::from_ureq(e, url))?
            .body_mut()
            .read_json()
            .map_err(|e| Error::InvalidResponse(format!("{url}: {e}")))
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> Result<T> {
        log::debug!("POST {url}");
        self.agent
            .post(url)
            .header("Authorization", self.authorization())
            .header("Accept", "application/json")
            .send_json(body)
            .map_err(|e| Error::from_ureq(e, url))?
            .body_mut()
            .read_json()
            .map_err(|e| Error::InvalidResponse(format!("{url}: {e}")))
    }

    fn delete<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        log::debug!("DELETE {url}");
        self.agent
            .delete(url)
            .header("Authorization", self.authorization())
            .header("Accept", "application/json")
            .call()
            .map_err(|e| Error::from_ureq(e, url))?
            .body_mut()
            .read_json()
            .map_err(|e| Error::InvalidResponse(format!("{url}: {e}")))
    }
}

impl Gateway for HttpGateway {
    fn create_workspace(&self, options: &WorkspaceOptions) -> Result<Workspace> {
        self.post(&self.url(&["workspaces"]), options)
    }

    fn get_workspace(&self, reference: &str) -> Result<Workspace> {
        self.get(&self.url(&["workspaces", reference]))
    }

    fn delete_workspace(&self, reference: &str) -> Result<Workspace> {
        self.delete(&self.url(&["workspaces", reference]))
    }

    fn create_local_repository(
        &self,
        workspace_id: &str,
        options: &LocalRepositoryOptions,
    ) -> Result<Repository> {
        let url = self.url(&["workspaces", workspace_id, "repositories", "local"]);
        self.post(&url, options)
    }

    fn create_remote_repository(
        &self,
        workspace_id: &str,
        options: &RemoteRepositoryOptions,
    ) -> Result<Repository> {
        let url = self.url(&["workspaces", workspace_id, "repositories", "remote"]);
        self.post(&url, options)
    }

    fn create_virtual_repository(
        &self,
        workspace_id: &str,
        options: &VirtualRepositoryOptions,
    ) -> Result<Repository> {
        let url = self.url(&["workspaces", workspace_id, "repositories", "virtual"]);
        self.post(&url, options)
    }

    fn get_repository(&self, workspace_id: &str, repository_id: &str) -> Result<Repository> {
        let url = self.url(&["workspaces", workspace_id, "repositories", repository_id]);
        self.get(&url)
    }

    fn delete_repository(
        &self,
        workspace_id: &str,
        repository_id: &str,
    ) -> Result<DeletedRepository> {
        let url = self.url(&["workspaces", workspace_id, "repositories", repository_id]);
        self.delete(&url)
    }
}
