//! Contact lifecycle: active, archived, and (terminal) deleted.
//!
//! Deletion is a two-step gate: a contact must be archived before it can
//! be removed permanently. Tags and `is_active` are orthogonal to this
//! state and may be edited whenever the contact exists.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Message returned when deleting a contact that is not archived.
pub const DELETE_REQUIRES_ARCHIVE_MSG: &str =
    "Contact must be archived before it can be permanently deleted. Archive it first.";

/// Lifecycle state of a stored contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactState {
    Active,
    Archived,
    /// The record no longer exists.
    Deleted,
}

impl ContactState {
    /// Derive the state of an existing row from its `archived_at` column.
    pub fn of(archived_at: Option<Timestamp>) -> Self {
        if archived_at.is_some() {
            Self::Archived
        } else {
            Self::Active
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ContactState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested lifecycle change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactAction {
    Archive,
    Restore,
    Delete,
}

impl ContactAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Restore => "restore",
            Self::Delete => "delete",
        }
    }
}

/// Apply `action` to a contact in `current` state.
///
/// Returns the resulting state, or a [`CoreError::Conflict`] naming why the
/// transition is not allowed. Deleting an active contact is always refused.
pub fn apply(current: ContactState, action: ContactAction) -> Result<ContactState, CoreError> {
    use ContactAction as A;
    use ContactState as S;

    match (current, action) {
        (S::Active, A::Archive) => Ok(S::Archived),
        (S::Archived, A::Restore) => Ok(S::Active),
        (S::Archived, A::Delete) => Ok(S::Deleted),
        (S::Active, A::Delete) => Err(CoreError::Conflict(DELETE_REQUIRES_ARCHIVE_MSG.into())),
        (S::Archived, A::Archive) => Err(CoreError::Conflict("Contact is already archived".into())),
        (S::Active, A::Restore) => Err(CoreError::Conflict("Contact is not archived".into())),
        (S::Deleted, _) => Err(CoreError::Conflict(format!(
            "Cannot {} a deleted contact",
            action.as_str()
        ))),
    }
}
