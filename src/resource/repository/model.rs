//! Declared shape of a repository and its schema

use declarative::{Attribute, Attributes, Schema, StateModel, Value};
use repoflow_api::Secret;
use serde::{Deserialize, Serialize};

use super::variant::{PACKAGE_TYPES, Variant};

/// A repository as declared in the manifest and tracked in state.
///
/// One wide record for every variant. Fields that do not apply to the
/// record's variant stay unset; [`super::variant::validate`] narrows it to a
/// typed [`super::variant::RepositorySpec`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryDesired {
    /// Composite `<workspaceId>/<repositoryId>`, known once created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Workspace name or id
    pub workspace_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_password: Option<Secret>,
    #[serde(default)]
    pub remote_cache_enabled: bool,
    /// Unset caches indefinitely, which is not the same as `0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_cache_ttl_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_cache_ttl_ms: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_repository_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_target_local_repository_id: Option<String>,
}

impl StateModel for RepositoryDesired {
    fn attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("id".into(), self.id.clone().into());
        attrs.insert("name".into(), self.name.clone().into());
        attrs.insert("workspace_ref".into(), self.workspace_ref.clone().into());
        attrs.insert("repository_type".into(), self.repository_type.clone().into());
        attrs.insert("package_type".into(), self.package_type.clone().into());
        attrs.insert("remote_url".into(), self.remote_url.clone().into());
        attrs.insert("remote_username".into(), self.remote_username.clone().into());
        attrs.insert(
            "remote_password".into(),
            self.remote_password
                .as_ref()
                .map(|p| p.expose().to_string())
                .into(),
        );
        attrs.insert(
            "remote_cache_enabled".into(),
            Value::Bool(self.remote_cache_enabled),
        );
        attrs.insert("file_cache_ttl_ms".into(), self.file_cache_ttl_ms.into());
        attrs.insert(
            "metadata_cache_ttl_ms".into(),
            self.metadata_cache_ttl_ms.into(),
        );
        attrs.insert(
            "child_repository_ids".into(),
            self.child_repository_ids.clone().into(),
        );
        attrs.insert(
            "upload_target_local_repository_id".into(),
            self.upload_target_local_repository_id.clone().into(),
        );
        attrs
    }
}

/// Schema of the `repository` resource.
///
/// The service has no update endpoint, so every user-settable attribute
/// forces replacement.
pub fn schema() -> Schema {
    Schema::new(
        "repository",
        "A package repository inside a RepoFlow workspace",
        vec![
            Attribute::string("id")
                .describe("Tracked identity, <workspaceId>/<repositoryId>")
                .computed()
                .use_state_for_unknown(),
            Attribute::string("name")
                .describe("Repository name")
                .required()
                .requires_replace(),
            Attribute::string("workspace_ref")
                .describe("Workspace the repository lives in (name or id)")
                .required()
                .requires_replace(),
            Attribute::string("repository_type")
                .describe("local, remote or virtual")
                .required()
                .one_of(&Variant::NAMES)
                .requires_replace(),
            Attribute::string("package_type")
                .describe("Package format stored by the repository")
                .required()
                .one_of(PACKAGE_TYPES)
                .requires_replace(),
            Attribute::string("remote_url")
                .describe("Upstream URL (remote repositories)")
                .optional()
                .requires_replace(),
            Attribute::string("remote_username")
                .describe("Upstream username (remote repositories)")
                .optional()
                .requires_replace(),
            Attribute::string("remote_password")
                .describe("Upstream password (remote repositories)")
                .optional()
                .sensitive()
                .requires_replace(),
            Attribute::bool("remote_cache_enabled")
                .describe("Cache upstream artifacts (remote repositories)")
                .optional()
                .requires_replace(),
            Attribute::int64("file_cache_ttl_ms")
                .describe("Milliseconds before cached files are revalidated; unset caches indefinitely")
                .optional()
                .requires_replace(),
            Attribute::int64("metadata_cache_ttl_ms")
                .describe("Milliseconds before cached metadata is revalidated; unset caches indefinitely")
                .optional()
                .requires_replace(),
            Attribute::string_list("child_repository_ids")
                .describe("Member repository ids, in order (virtual repositories)")
                .optional()
                .requires_replace(),
            Attribute::string("upload_target_local_repository_id")
                .describe("Member that receives uploads (virtual repositories)")
                .optional()
                .requires_replace(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_settable_attribute_forces_replacement() {
        assert!(schema().updatable_attributes().is_empty());
    }

    #[test]
    fn test_manifest_entry_parses() {
        let desired: RepositoryDesired = toml::from_str(
            r#"
            name = "npm-proxy"
            workspace_ref = "example"
            repository_type = "remote"
            package_type = "npm"
            remote_url = "https://registry.npmjs.org"
            remote_password = "hunter2"
            metadata_cache_ttl_ms = 0
            "#,
        )
        .unwrap();

        assert_eq!(desired.file_cache_ttl_ms, None);
        assert_eq!(desired.metadata_cache_ttl_ms, Some(0));
        assert!(!desired.remote_cache_enabled);
        assert!(!format!("{desired:?}").contains("hunter2"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let parsed: Result<RepositoryDesired, _> = toml::from_str(
            r#"
            name = "x"
            workspace_ref = "example"
            remote_repository_url = "https://example.com"
            "#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_attributes_distinguish_null_and_zero_ttl() {
        let mut desired = RepositoryDesired {
            name: "proxy".into(),
            workspace_ref: "example".into(),
            ..RepositoryDesired::default()
        };
        assert_eq!(desired.attributes()["file_cache_ttl_ms"], Value::Null);

        desired.file_cache_ttl_ms = Some(0);
        assert_eq!(desired.attributes()["file_cache_ttl_ms"], Value::Int(0));
    }

    #[test]
    fn test_password_diff_is_redacted() {
        let prior = RepositoryDesired {
            remote_password: Some(Secret::new("old-secret")),
            ..RepositoryDesired::default()
        };
        let planned = RepositoryDesired {
            remote_password: Some(Secret::new("new-secret")),
            ..RepositoryDesired::default()
        };

        let changes = schema().diff(&prior.attributes(), &planned.attributes());
        let change = changes
            .iter()
            .find(|c| c.attribute == "remote_password")
            .unwrap();
        assert!(change.forces_replacement);
        assert!(!change.to_string().contains("secret"));
    }
}
