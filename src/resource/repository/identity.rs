//! Composite repository identity: `<workspaceId>/<repositoryId>`

use crate::resource::ReconcileError;

const SEPARATOR: char = '/';

/// Join a workspace id and a repository id into the tracked identity.
///
/// Ids are not escaped, so a separator inside either id is rejected.
pub fn encode(workspace_id: &str, repository_id: &str) -> Result<String, ReconcileError> {
    if workspace_id.is_empty()
        || repository_id.is_empty()
        || workspace_id.contains(SEPARATOR)
        || repository_id.contains(SEPARATOR)
    {
        return Err(ReconcileError::MalformedIdentity(format!(
            "{workspace_id}{SEPARATOR}{repository_id}"
        )));
    }
    Ok(format!("{workspace_id}{SEPARATOR}{repository_id}"))
}

/// Split a tracked identity into `(workspace_id, repository_id)`.
pub fn decode(composite_id: &str) -> Result<(&str, &str), ReconcileError> {
    match composite_id.split_once(SEPARATOR) {
        Some((workspace, repository))
            if !workspace.is_empty()
                && !repository.is_empty()
                && !repository.contains(SEPARATOR) =>
        {
            Ok((workspace, repository))
        }
        _ => Err(ReconcileError::MalformedIdentity(composite_id.to_string())),
    }
}

/// Split an import token `<workspaceRef>/<repositoryId>`.
///
/// The left side is a workspace name or id and still has to be resolved.
pub fn split_import(token: &str) -> Result<(&str, &str), ReconcileError> {
    let mut parts = token.split(SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(workspace), Some(repository), None)
            if !workspace.is_empty() && !repository.is_empty() =>
        {
            Ok((workspace, repository))
        }
        _ => Err(ReconcileError::InvalidImportFormat(token.to_string())),
    }
}
