//! Repository variants and the checks that run before any remote call

use repoflow_api::Secret;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use super::model::RepositoryDesired;

/// Package formats the service can host
pub const PACKAGE_TYPES: &[&str] = &[
    "cargo",
    "composer",
    "debian",
    "docker",
    "gems",
    "go",
    "helm",
    "maven",
    "npm",
    "nuget",
    "pypi",
    "rpm",
    "universal",
];

/// Structural kind of a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Hosted packages
    Local,
    /// Proxy of an upstream registry
    Remote,
    /// Group of other repositories
    Virtual,
}

impl Variant {
    pub const NAMES: [&'static str; 3] = ["local", "remote", "virtual"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Virtual => "virtual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "local" => Some(Self::Local),
            "remote" => Some(Self::Remote),
            "virtual" => Some(Self::Virtual),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared repository that cannot be sent to the service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown repository type {0:?} (expected local, remote or virtual)")]
    UnknownVariant(String),

    #[error("'{0}' is required")]
    MissingRequiredField(&'static str),

    #[error("'{0}' must reference a member of 'child_repository_ids'")]
    InvalidReference(&'static str),

    #[error("'child_repository_ids' lists {0:?} more than once")]
    DuplicateReference(String),

    #[error("'{field}' does not apply to {variant} repositories")]
    NotApplicable {
        field: &'static str,
        variant: Variant,
    },

    #[error("unsupported package type {0:?}")]
    UnsupportedPackageType(String),
}

/// Settings only a remote repository has
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<Secret>,
    pub cache_enabled: bool,
    pub file_cache_ttl_ms: Option<i64>,
    pub metadata_cache_ttl_ms: Option<i64>,
}

/// Settings only a virtual repository has
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualSettings {
    /// Non-empty, no duplicates, declaration order
    pub child_repository_ids: Vec<String>,
    /// Always a member of `child_repository_ids`
    pub upload_target: Option<String>,
}

/// Variant-specific part of a validated repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositorySpec {
    Local,
    Remote(RemoteSettings),
    Virtual(VirtualSettings),
}

impl RepositorySpec {
    pub fn variant(&self) -> Variant {
        match self {
            Self::Local => Variant::Local,
            Self::Remote(_) => Variant::Remote,
            Self::Virtual(_) => Variant::Virtual,
        }
    }
}

/// A repository that passed validation and can be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRepository {
    pub name: String,
    pub package_type: String,
    pub spec: RepositorySpec,
}

/// Determine the variant from `repository_type`.
pub fn classify(desired: &RepositoryDesired) -> Result<Variant, ValidationError> {
    let declared = desired.repository_type.as_deref().unwrap_or_default();
    Variant::parse(declared).ok_or_else(|| ValidationError::UnknownVariant(declared.to_string()))
}

/// Check a declared repository against its variant and narrow it.
pub fn validate(
    desired: &RepositoryDesired,
    variant: Variant,
) -> Result<ValidatedRepository, ValidationError> {
    if desired.name.is_empty() {
        return Err(ValidationError::MissingRequiredField("name"));
    }
    if desired.workspace_ref.is_empty() {
        return Err(ValidationError::MissingRequiredField("workspace_ref"));
    }
    let package_type = match desired.package_type.as_deref() {
        None | Some("") => return Err(ValidationError::MissingRequiredField("package_type")),
        Some(p) if !PACKAGE_TYPES.contains(&p) => {
            return Err(ValidationError::UnsupportedPackageType(p.to_string()));
        }
        Some(p) => p.to_string(),
    };

    reject_foreign_fields(desired, variant)?;

    let spec = match variant {
        Variant::Local => RepositorySpec::Local,
        Variant::Remote => {
            let url = desired
                .remote_url
                .as_ref()
                .filter(|u| !u.is_empty())
                .ok_or(ValidationError::MissingRequiredField("remote_url"))?;
            RepositorySpec::Remote(RemoteSettings {
                url: url.clone(),
                username: desired.remote_username.clone(),
                password: desired.remote_password.clone(),
                cache_enabled: desired.remote_cache_enabled,
                file_cache_ttl_ms: desired.file_cache_ttl_ms,
                metadata_cache_ttl_ms: desired.metadata_cache_ttl_ms,
            })
        }
        Variant::Virtual => {
            let children = desired
                .child_repository_ids
                .as_ref()
                .filter(|ids| !ids.is_empty())
                .ok_or(ValidationError::MissingRequiredField("child_repository_ids"))?;

            let mut seen = HashSet::new();
            if let Some(dup) = children.iter().find(|id| !seen.insert(id.as_str())) {
                return Err(ValidationError::DuplicateReference(dup.clone()));
            }

            let upload_target = desired.upload_target_local_repository_id.clone();
            if let Some(target) = &upload_target
                && !children.contains(target)
            {
                return Err(ValidationError::InvalidReference(
                    "upload_target_local_repository_id",
                ));
            }

            RepositorySpec::Virtual(VirtualSettings {
                child_repository_ids: children.clone(),
                upload_target,
            })
        }
    };

    Ok(ValidatedRepository {
        name: desired.name.clone(),
        package_type,
        spec,
    })
}

fn reject_foreign_fields(
    desired: &RepositoryDesired,
    variant: Variant,
) -> Result<(), ValidationError> {
    let remote_fields = [
        ("remote_url", desired.remote_url.is_some()),
        ("remote_username", desired.remote_username.is_some()),
        ("remote_password", desired.remote_password.is_some()),
        ("remote_cache_enabled", desired.remote_cache_enabled),
        ("file_cache_ttl_ms", desired.file_cache_ttl_ms.is_some()),
        ("metadata_cache_ttl_ms", desired.metadata_cache_ttl_ms.is_some()),
    ];
    let virtual_fields = [
        ("child_repository_ids", desired.child_repository_ids.is_some()),
        (
            "upload_target_local_repository_id",
            desired.upload_target_local_repository_id.is_some(),
        ),
    ];

    let foreign: Vec<(&'static str, bool)> = match variant {
        Variant::Local => remote_fields.iter().chain(&virtual_fields).copied().collect(),
        Variant::Remote => virtual_fields.to_vec(),
        Variant::Virtual => remote_fields.to_vec(),
    };

    match foreign.into_iter().find(|(_, set)| *set) {
        Some((field, _)) => Err(ValidationError::NotApplicable { field, variant }),
        None => Ok(()),
    }
}
