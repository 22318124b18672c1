use crate::types::DbId;

/// Domain error shared by every pressroom crate.
///
/// Guard violations (forbidden status targets, deleting a live contact)
/// are reported as [`CoreError::Conflict`] with a message that callers
/// surface verbatim.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
