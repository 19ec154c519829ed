//! Translation between declared repositories and the service's records
//!
//! Pure functions only: no gateway calls and no logging.

use repoflow_api::{
    LocalRepositoryOptions, RemoteRepositoryOptions, Repository, VirtualRepositoryOptions,
};

use super::identity;
use super::model::RepositoryDesired;
use super::variant::{RepositorySpec, ValidatedRepository, Variant};
use crate::resource::ReconcileError;

/// Variant-shaped body of a create call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateRequest {
    Local(LocalRepositoryOptions),
    Remote(RemoteRepositoryOptions),
    Virtual(VirtualRepositoryOptions),
}

impl CreateRequest {
    pub fn variant(&self) -> Variant {
        match self {
            Self::Local(_) => Variant::Local,
            Self::Remote(_) => Variant::Remote,
            Self::Virtual(_) => Variant::Virtual,
        }
    }
}

/// Build the create request for a validated repository.
pub fn to_create_request(repo: &ValidatedRepository) -> CreateRequest {
    let name = repo.name.clone();
    let package_type = repo.package_type.clone();

    match &repo.spec {
        RepositorySpec::Local => CreateRequest::Local(LocalRepositoryOptions { name, package_type }),
        RepositorySpec::Remote(remote) => CreateRequest::Remote(RemoteRepositoryOptions {
            name,
            package_type,
            remote_repository_url: remote.url.clone(),
            remote_repository_username: remote.username.clone(),
            remote_repository_password: remote.password.clone(),
            is_remote_cache_enabled: remote.cache_enabled,
            file_cache_time_till_revalidation: remote.file_cache_ttl_ms,
            metadata_cache_time_till_revalidation: remote.metadata_cache_ttl_ms,
        }),
        RepositorySpec::Virtual(group) => CreateRequest::Virtual(VirtualRepositoryOptions {
            name,
            package_type,
            child_repository_ids: group.child_repository_ids.clone(),
            upload_local_repository_id: group.upload_target.clone(),
        }),
    }
}

/// Convert a service record into a declared repository.
///
/// `workspace_ref` is set to the resolved workspace id.
pub fn from_remote(
    remote: &Repository,
    workspace_id: &str,
) -> Result<RepositoryDesired, ReconcileError> {
    project(remote, workspace_id, None)
}

/// Convert a service record, keeping what the service does not echo back.
///
/// The prior record supplies the declared workspace reference, the password
/// when the service omits it, and the repository/package type when the
/// service returns an empty string.
pub fn merge_remote(
    prior: &RepositoryDesired,
    remote: &Repository,
    workspace_id: &str,
) -> Result<RepositoryDesired, ReconcileError> {
    project(remote, workspace_id, Some(prior))
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn project(
    remote: &Repository,
    workspace_id: &str,
    prior: Option<&RepositoryDesired>,
) -> Result<RepositoryDesired, ReconcileError> {
    let repository_type = non_empty(&remote.repository_type)
        .or_else(|| prior.and_then(|p| p.repository_type.clone()));
    let package_type =
        non_empty(&remote.package_type).or_else(|| prior.and_then(|p| p.package_type.clone()));
    let variant = repository_type.as_deref().and_then(Variant::parse);

    let mut desired = RepositoryDesired {
        id: Some(identity::encode(workspace_id, &remote.id)?),
        name: remote.name.clone(),
        workspace_ref: prior.map_or_else(|| workspace_id.to_string(), |p| p.workspace_ref.clone()),
        repository_type,
        package_type,
        ..RepositoryDesired::default()
    };

    match variant {
        Some(Variant::Remote) => {
            desired.remote_url.clone_from(&remote.remote_repository_url);
            desired.remote_username.clone_from(&remote.remote_repository_username);
            desired.remote_password = remote
                .remote_repository_password
                .clone()
                .or_else(|| prior.and_then(|p| p.remote_password.clone()));
            desired.remote_cache_enabled = remote.is_remote_cache_enabled;
            desired.file_cache_ttl_ms = remote.file_cache_time_till_revalidation;
            desired.metadata_cache_ttl_ms = remote.metadata_cache_time_till_revalidation;
        }
        Some(Variant::Virtual) => {
            // Children come back as objects; only their ids are declared.
            desired.child_repository_ids = Some(
                remote
                    .child_repositories
                    .iter()
                    .flatten()
                    .map(|child| child.id.clone())
                    .collect(),
            );
            desired.upload_target_local_repository_id = remote
                .upload_local_repository_id
                .as_deref()
                .and_then(non_empty);
        }
        Some(Variant::Local) | None => {}
    }

    Ok(desired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::repository::variant::{PACKAGE_TYPES, classify, validate};
    use repoflow_api::{ChildRepository, Secret};

    fn local_remote() -> Repository {
        Repository {
            id: "r1".into(),
            name: "npm-local".into(),
            repository_type: "local".into(),
            package_type: "npm".into(),
            ..Repository::default()
        }
    }

    fn proxy_remote() -> Repository {
        Repository {
            id: "r2".into(),
            name: "pypi-proxy".into(),
            repository_type: "remote".into(),
            package_type: "pypi".into(),
            remote_repository_url: Some("https://pypi.org/simple".into()),
            remote_repository_username: Some("bot".into()),
            remote_repository_password: Some(Secret::new("hunter2")),
            is_remote_cache_enabled: true,
            file_cache_time_till_revalidation: None,
            metadata_cache_time_till_revalidation: Some(0),
            ..Repository::default()
        }
    }

    fn group_remote() -> Repository {
        Repository {
            id: "r3".into(),
            name: "npm-group".into(),
            repository_type: "virtual".into(),
            package_type: "npm".into(),
            child_repositories: Some(vec![
                ChildRepository {
                    id: "r1".into(),
                    name: Some("npm-local".into()),
                },
                ChildRepository {
                    id: "r9".into(),
                    name: None,
                },
            ]),
            upload_local_repository_id: Some("r1".into()),
            ..Repository::default()
        }
    }

    fn round_trip(remote: &Repository) -> CreateRequest {
        let desired = from_remote(remote, "w1").unwrap();
        let variant = classify(&desired).unwrap();
        to_create_request(&validate(&desired, variant).unwrap())
    }

    #[test]
    fn test_round_trip_local() {
        let remote = local_remote();
        assert_eq!(
            round_trip(&remote),
            CreateRequest::Local(LocalRepositoryOptions {
                name: remote.name.clone(),
                package_type: remote.package_type.clone(),
            })
        );
    }

    #[test]
    fn test_round_trip_remote() {
        let remote = proxy_remote();
        let CreateRequest::Remote(opts) = round_trip(&remote) else {
            panic!("Expected remote request");
        };
        assert_eq!(opts.name, remote.name);
        assert_eq!(opts.package_type, remote.package_type);
        assert_eq!(
            Some(opts.remote_repository_url),
            remote.remote_repository_url
        );
        assert_eq!(
            opts.remote_repository_username,
            remote.remote_repository_username
        );
        assert_eq!(
            opts.remote_repository_password,
            remote.remote_repository_password
        );
        assert_eq!(opts.is_remote_cache_enabled, remote.is_remote_cache_enabled);
        assert_eq!(opts.file_cache_time_till_revalidation, None);
        assert_eq!(opts.metadata_cache_time_till_revalidation, Some(0));
    }

    #[test]
    fn test_round_trip_local_every_package_type() {
        for package_type in PACKAGE_TYPES {
            for name in ["npm-local", "libs.internal", "repo_ü-01", "x"] {
                let remote = Repository {
                    name: name.into(),
                    package_type: (*package_type).into(),
                    ..local_remote()
                };
                assert_eq!(
                    round_trip(&remote),
                    CreateRequest::Local(LocalRepositoryOptions {
                        name: name.into(),
                        package_type: (*package_type).into(),
                    }),
                    "{name} ({package_type})"
                );
            }
        }
    }

    #[test]
    fn test_round_trip_remote_credentials_and_cache() {
        let secret = || Some(Secret::new("hunter2"));
        let table = [
            (Some("bot"), secret(), false, None, None),
            (Some("bot"), None, true, Some(0), None),
            (None, secret(), true, None, Some(60_000)),
            (None, None, false, Some(i64::MAX), Some(0)),
            (Some(""), None, true, Some(1), Some(1)),
        ];

        for (username, password, cache_enabled, file_ttl, metadata_ttl) in table {
            let remote = Repository {
                remote_repository_username: username.map(str::to_string),
                remote_repository_password: password,
                is_remote_cache_enabled: cache_enabled,
                file_cache_time_till_revalidation: file_ttl,
                metadata_cache_time_till_revalidation: metadata_ttl,
                ..proxy_remote()
            };
            let CreateRequest::Remote(opts) = round_trip(&remote) else {
                panic!("Expected remote request");
            };
            assert_eq!(
                opts.remote_repository_username, remote.remote_repository_username,
                "{remote:?}"
            );
            assert_eq!(
                opts.remote_repository_password,
                remote.remote_repository_password
            );
            assert_eq!(opts.is_remote_cache_enabled, cache_enabled);
            assert_eq!(opts.file_cache_time_till_revalidation, file_ttl);
            assert_eq!(opts.metadata_cache_time_till_revalidation, metadata_ttl);
        }
    }

    #[test]
    fn test_round_trip_virtual_keeps_child_order() {
        let remote = group_remote();
        assert_eq!(
            round_trip(&remote),
            CreateRequest::Virtual(VirtualRepositoryOptions {
                name: "npm-group".into(),
                package_type: "npm".into(),
                child_repository_ids: vec!["r1".into(), "r9".into()],
                upload_local_repository_id: Some("r1".into()),
            })
        );
    }

    #[test]
    fn test_from_remote_recomputes_identity() {
        let desired = from_remote(&local_remote(), "w1").unwrap();
        assert_eq!(desired.id.as_deref(), Some("w1/r1"));
        assert_eq!(desired.workspace_ref, "w1");

        let mut bad = local_remote();
        bad.id = "r/1".into();
        assert!(matches!(
            from_remote(&bad, "w1"),
            Err(ReconcileError::MalformedIdentity(_))
        ));
    }

    #[test]
    fn test_virtual_without_children_field_gets_empty_list() {
        let mut remote = group_remote();
        remote.child_repositories = None;
        let desired = from_remote(&remote, "w1").unwrap();
        assert_eq!(desired.child_repository_ids, Some(vec![]));
    }

    #[test]
    fn test_non_virtual_never_gets_children() {
        let mut remote = local_remote();
        remote.child_repositories = Some(vec![]);
        remote.remote_repository_url = Some("https://stray.example".into());
        let desired = from_remote(&remote, "w1").unwrap();
        assert_eq!(desired.child_repository_ids, None);
        assert_eq!(desired.remote_url, None);
    }

    #[test]
    fn test_empty_types_keep_prior_value() {
        let prior = from_remote(&local_remote(), "w1").unwrap();
        let mut sparse = local_remote();
        sparse.repository_type = String::new();
        sparse.package_type = String::new();

        let merged = merge_remote(&prior, &sparse, "w1").unwrap();
        assert_eq!(merged.repository_type.as_deref(), Some("local"));
        assert_eq!(merged.package_type.as_deref(), Some("npm"));

        let fresh = from_remote(&sparse, "w1").unwrap();
        assert_eq!(fresh.repository_type, None);
        assert_eq!(fresh.package_type, None);
    }

    #[test]
    fn test_merge_keeps_declared_workspace_and_password() {
        let mut prior = from_remote(&proxy_remote(), "w1").unwrap();
        prior.workspace_ref = "example".into();

        let mut echoed = proxy_remote();
        echoed.remote_repository_password = None;

        let merged = merge_remote(&prior, &echoed, "w1").unwrap();
        assert_eq!(merged.workspace_ref, "example");
        assert_eq!(merged.remote_password, Some(Secret::new("hunter2")));
        assert_eq!(merged.id.as_deref(), Some("w1/r2"));
    }

    #[test]
    fn test_null_ttl_distinct_from_zero() {
        let desired = from_remote(&proxy_remote(), "w1").unwrap();
        assert_eq!(desired.file_cache_ttl_ms, None);
        assert_eq!(desired.metadata_cache_ttl_ms, Some(0));
    }
}
