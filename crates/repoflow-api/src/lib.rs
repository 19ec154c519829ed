//! # RepoFlow API
//!
//! Blocking client for the RepoFlow workspace and repository API.
//!
//! The [`Gateway`] trait is the contract the reconcilers depend on:
//!
//! - [`HttpGateway`]: talks to a RepoFlow instance
//! - [`MockGateway`]: in-memory, records calls, injects failures
//!
//! Secrets ([`Secret`]) never appear in `Debug` or `Display` output.

pub mod error;
pub mod gateway;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use gateway::http::HttpGateway;
pub use gateway::{Call, Gateway, MockGateway};
pub use types::{
    ChildRepository, DeletedRepository, LocalRepositoryOptions, RemoteRepositoryOptions,
    Repository, Secret, VirtualRepositoryOptions, Workspace, WorkspaceOptions,
};
