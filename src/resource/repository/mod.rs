//! The `repository` resource
//!
//! Leaf-first: [`identity`] and [`variant`] are pure checks, [`mapper`]
//! translates records, [`reconciler`] is the only part that calls the
//! gateway.

pub mod identity;
pub mod mapper;
pub mod model;
pub mod reconciler;
pub mod variant;

pub use model::RepositoryDesired;
pub use reconciler::RepositoryReconciler;
