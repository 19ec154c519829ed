//! Wire types for the RepoFlow API.
//!
//! Field names follow the service's camelCase JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A secret string (repository passwords, API keys).
///
/// `Debug` and `Display` never show the value, so a `Secret` can travel
/// through log statements and error messages. It serializes transparently
/// because request bodies and tracked state need the real value.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A workspace as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
}

/// Options for creating a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceOptions {
    pub name: String,
}

/// A member of a virtual repository, as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRepository {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A repository as returned by the service.
///
/// Variant-specific fields are absent for variants they do not apply to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub repository_type: String,
    #[serde(default)]
    pub package_type: String,
    #[serde(default)]
    pub remote_repository_url: Option<String>,
    #[serde(default)]
    pub remote_repository_username: Option<String>,
    #[serde(default)]
    pub remote_repository_password: Option<Secret>,
    #[serde(default)]
    pub is_remote_cache_enabled: bool,
    /// Milliseconds; `None` caches indefinitely.
    #[serde(default)]
    pub file_cache_time_till_revalidation: Option<i64>,
    /// Milliseconds; `None` caches indefinitely.
    #[serde(default)]
    pub metadata_cache_time_till_revalidation: Option<i64>,
    #[serde(default)]
    pub child_repositories: Option<Vec<ChildRepository>>,
    #[serde(default)]
    pub upload_local_repository_id: Option<String>,
}

/// Options for creating a local repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalRepositoryOptions {
    pub name: String,
    pub package_type: String,
}

/// Options for creating a remote (proxy) repository.
///
/// Cache TTLs serialize as explicit `null` when unset: the service reads
/// null as "cache indefinitely", which is not the same as `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRepositoryOptions {
    pub name: String,
    pub package_type: String,
    pub remote_repository_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_repository_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_repository_password: Option<Secret>,
    pub is_remote_cache_enabled: bool,
    pub file_cache_time_till_revalidation: Option<i64>,
    pub metadata_cache_time_till_revalidation: Option<i64>,
}

/// Options for creating a virtual (group) repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualRepositoryOptions {
    pub name: String,
    pub package_type: String,
    pub child_repository_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_local_repository_id: Option<String>,
}

/// Body returned when a repository is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedRepository {
    pub repository_id: String,
}
