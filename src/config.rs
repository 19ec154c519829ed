//! Manifest and provider configuration
//!
//! The manifest is a TOML file declaring the provider connection and the
//! desired workspaces and repositories:
//!
//! ```toml
//! [provider]
//! base_url = "https://repoflow.example.com/api"
//!
//! [workspaces.example]
//! name = "example"
//!
//! [repositories.npm-local]
//! name = "npm-local"
//! workspace_ref = "example"
//! repository_type = "local"
//! package_type = "npm"
//! ```

use anyhow::{Context, Result, bail};
use repoflow_api::Secret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::resource::{RepositoryDesired, WorkspaceDesired};

/// Manifest file looked up in the working directory
pub const DEFAULT_MANIFEST: &str = "repoflow.toml";

/// Environment variable for the API base URL
pub const ENV_BASE_URL: &str = "REPOFLOW_BASE_URL";

/// Environment variable for the API key
pub const ENV_API_KEY: &str = "REPOFLOW_API_KEY";

/// `[provider]` table of the manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSection {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<Secret>,
}

/// Desired resources, keyed by address
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub provider: ProviderSection,
    #[serde(default)]
    pub workspaces: BTreeMap<String, WorkspaceDesired>,
    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryDesired>,
}

impl Manifest {
    /// Parse a manifest; ids are assigned by the service and are dropped here.
    pub fn parse(content: &str) -> Result<Self> {
        let mut manifest: Manifest = toml::from_str(content)?;
        for ws in manifest.workspaces.values_mut() {
            ws.id = None;
        }
        for repo in manifest.repositories.values_mut() {
            repo.id = None;
        }
        Ok(manifest)
    }

    /// Load the manifest at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        let manifest = Self::parse(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))?;

        log::debug!(
            "Loaded manifest {} ({} workspaces, {} repositories)",
            path.display(),
            manifest.workspaces.len(),
            manifest.repositories.len()
        );
        Ok(manifest)
    }
}

/// Resolved connection settings
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: Secret,
}

impl ProviderConfig {
    /// Resolve settings: flag, then manifest, then environment.
    pub fn resolve(
        base_url_flag: Option<&str>,
        api_key_flag: Option<&str>,
        section: &ProviderSection,
    ) -> Result<Self> {
        Self::resolve_with(base_url_flag, api_key_flag, section, |key| {
            std::env::var(key).ok()
        })
    }

    fn resolve_with(
        base_url_flag: Option<&str>,
        api_key_flag: Option<&str>,
        section: &ProviderSection,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let base_url = base_url_flag
            .map(str::to_string)
            .or_else(|| section.base_url.clone())
            .or_else(|| env(ENV_BASE_URL))
            .filter(|v| !v.is_empty());
        let api_key = api_key_flag
            .map(Secret::from)
            .or_else(|| section.api_key.clone())
            .or_else(|| env(ENV_API_KEY).map(Secret::from))
            .filter(|v| !v.is_empty());

        let Some(base_url) = base_url else {
            bail!("base_url must be set in the [provider] table or the {ENV_BASE_URL} env var");
        };
        let Some(api_key) = api_key else {
            bail!("api_key must be set in the [provider] table or the {ENV_API_KEY} env var");
        };

        Ok(Self { base_url, api_key })
    }
}

/// Expand `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_flag_beats_manifest_beats_env() {
        let section = ProviderSection {
            base_url: Some("http://manifest".into()),
            api_key: None,
        };
        let env = |key: &str| match key {
            ENV_BASE_URL => Some("http://env".to_string()),
            ENV_API_KEY => Some("env-key".to_string()),
            _ => None,
        };

        let from_flag =
            ProviderConfig::resolve_with(Some("http://flag"), None, &section, env).unwrap();
        assert_eq!(from_flag.base_url, "http://flag");
        assert_eq!(from_flag.api_key.expose(), "env-key");

        let from_manifest = ProviderConfig::resolve_with(None, None, &section, env).unwrap();
        assert_eq!(from_manifest.base_url, "http://manifest");

        let from_env =
            ProviderConfig::resolve_with(None, None, &ProviderSection::default(), env).unwrap();
        assert_eq!(from_env.base_url, "http://env");
    }

    #[test]
    fn test_missing_setting_names_env_var() {
        let err = ProviderConfig::resolve_with(None, Some("k"), &ProviderSection::default(), no_env)
            .unwrap_err();
        assert!(err.to_string().contains(ENV_BASE_URL));

        let err =
            ProviderConfig::resolve_with(Some("http://x"), None, &ProviderSection::default(), no_env)
                .unwrap_err();
        assert!(err.to_string().contains(ENV_API_KEY));
    }

    #[test]
    fn test_api_key_not_in_debug() {
        let config =
            ProviderConfig::resolve_with(Some("http://x"), Some("s3cret"), &ProviderSection::default(), no_env)
                .unwrap();
        assert!(!format!("{config:?}").contains("s3cret"));
    }

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::parse(
            r#"
            [provider]
            base_url = "http://localhost:9000"

            [workspaces.example]
            name = "example"
            id = "ignored"

            [repositories.npm-group]
            name = "npm-group"
            workspace_ref = "example"
            repository_type = "virtual"
            package_type = "npm"
            child_repository_ids = ["r1", "r2"]
            upload_target_local_repository_id = "r1"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.workspaces["example"].id, None);
        let group = &manifest.repositories["npm-group"];
        assert_eq!(
            group.child_repository_ids.as_deref(),
            Some(&["r1".to_string(), "r2".to_string()][..])
        );
    }

    #[test]
    fn test_load_missing_manifest_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(&dir.path().join("repoflow.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read manifest"));
    }

    #[test]
    fn test_load_manifest_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repoflow.toml");
        fs::write(&path, "[workspaces.example]\nname = \"example\"\n").unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.workspaces.len(), 1);
        assert!(manifest.repositories.is_empty());
    }

    #[test]
    fn test_expand_path_keeps_plain_paths() {
        assert_eq!(expand_path("state.toml"), PathBuf::from("state.toml"));
    }
}
