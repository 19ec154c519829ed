//! Resources managed on a RepoFlow instance
//!
//! Each resource type has a declared record, a schema whose attributes are
//! all replace-on-change, and a reconciler implementing
//! [`declarative::Resource`] on top of a [`repoflow_api::Gateway`].

pub mod error;
pub mod repository;
pub mod workspace;

pub use error::ReconcileError;
pub use repository::{RepositoryDesired, RepositoryReconciler};
pub use workspace::{WorkspaceDesired, WorkspaceReconciler};
