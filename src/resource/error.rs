//! Errors raised by the reconcilers

use thiserror::Error;

use super::repository::variant::{ValidationError, Variant};

/// Failure of a single reconcile operation.
///
/// Nothing is tracked when one of these is returned: the composite id is
/// only produced after the whole operation succeeded.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Declared record rejected before any remote call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("malformed identity {0:?} (expected <workspaceId>/<repositoryId>)")]
    MalformedIdentity(String),

    #[error("invalid import id {0:?} (expected <workspaceRef>/<repositoryId>)")]
    InvalidImportFormat(String),

    /// The tracked resource no longer exists remotely
    #[error("{0} not found")]
    NotFound(String),

    #[error("workspace {0:?} not found")]
    WorkspaceNotFound(String),

    #[error("{operation}{} failed in workspace {workspace}", .variant.map(|v| format!(" {v} repository")).unwrap_or_default())]
    RemoteOperationFailed {
        operation: &'static str,
        variant: Option<Variant>,
        workspace: String,
        #[source]
        source: repoflow_api::Error,
    },

    /// An update was asked for attributes the service cannot change
    #[error("cannot update in place, replace required for: {}", .attributes.join(", "))]
    RequiresReplace { attributes: Vec<String> },
}

impl ReconcileError {
    /// Whether the caller should treat the resource as gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
