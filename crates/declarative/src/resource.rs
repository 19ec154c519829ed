//! Resource lifecycle trait
//!
//! A [`Resource`] is the reconciler for one resource type. It owns no state
//! between calls: every operation receives the records it works on and
//! returns the record that should be tracked afterwards.

use crate::schema::Schema;
use crate::types::Attributes;
use anyhow::Result;
use std::fmt;

/// A tracked or desired record that can be flattened for planning
pub trait StateModel: Clone + Send + Sync + fmt::Debug {
    /// Flatten into attribute values keyed by schema attribute name
    fn attributes(&self) -> Attributes;
}

/// Core trait for declarative resources
///
/// # Example
///
/// ```ignore
/// use declarative::{Attribute, Resource, Schema};
///
/// struct TagResource { schema: Schema }
///
/// impl Resource for TagResource {
///     type Model = Tag;
///
///     fn schema(&self) -> &Schema { &self.schema }
///     fn create(&self, planned: &Tag) -> anyhow::Result<Tag> { /* call the API */ }
///     fn read(&self, prior: &Tag) -> anyhow::Result<Option<Tag>> { /* None when gone */ }
///     fn update(&self, _prior: &Tag, planned: &Tag) -> anyhow::Result<Tag> { Ok(planned.clone()) }
///     fn delete(&self, prior: &Tag) -> anyhow::Result<()> { /* call the API */ }
///     fn import(&self, id: &str) -> anyhow::Result<Tag> { /* read by id */ }
/// }
/// ```
pub trait Resource: Send + Sync {
    /// Record type tracked for this resource
    type Model: StateModel;

    /// Attribute schema, including replace triggers
    fn schema(&self) -> &Schema;

    /// Resource type name, used for grouping and targeting
    fn type_name(&self) -> &'static str {
        self.schema().type_name
    }

    /// Create the resource and return the record to track
    fn create(&self, planned: &Self::Model) -> Result<Self::Model>;

    /// Refresh a tracked record from the remote side
    ///
    /// Returns `Ok(None)` when the resource no longer exists, so the
    /// caller can drop it from tracked state.
    fn read(&self, prior: &Self::Model) -> Result<Option<Self::Model>>;

    /// Apply in-place changes
    fn update(&self, prior: &Self::Model, planned: &Self::Model) -> Result<Self::Model>;

    /// Delete the resource
    fn delete(&self, prior: &Self::Model) -> Result<()>;

    /// Adopt an existing remote resource from an import token
    fn import(&self, token: &str) -> Result<Self::Model>;
}
