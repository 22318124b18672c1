//! Contact entity model and DTOs.

use pressroom_core::contact_lifecycle::ContactState;
use pressroom_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A contact row from the `contacts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Contact {
    pub id: DbId,
    pub client_id: DbId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub tags: Vec<String>,
    pub is_active: bool,
    pub archived_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Contact {
    pub fn state(&self) -> ContactState {
        ContactState::of(self.archived_at)
    }
}

/// DTO for adding a single contact by hand.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContact {
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// DTO for updating a contact. Email and lifecycle are not editable here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContact {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Which lifecycle slice a contact listing returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactView {
    /// Active contacts only.
    #[default]
    All,
    Archived,
}
