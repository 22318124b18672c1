//! Newsletter version (content snapshot) model.

use pressroom_core::types::{DbId, Timestamp};
use pressroom_core::versioning::VersionRef;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `newsletter_versions` table. Immutable once inserted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NewsletterVersion {
    pub id: DbId,
    pub newsletter_id: DbId,
    pub version_number: i32,
    pub content: serde_json::Value,
    pub change_summary: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NewsletterVersion {
    pub fn version_ref(&self) -> VersionRef {
        VersionRef {
            id: self.id,
            newsletter_id: self.newsletter_id,
            version_number: self.version_number,
        }
    }
}

/// Listing view without the content payload.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NewsletterVersionSummary {
    pub id: DbId,
    pub newsletter_id: DbId,
    pub version_number: i32,
    pub change_summary: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for saving new content.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveContent {
    pub document: serde_json::Value,
    pub change_summary: Option<String>,
}
