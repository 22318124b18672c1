//! Segment entity model and DTOs.

use pressroom_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A segment row from the `segments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Segment {
    pub id: DbId,
    pub client_id: DbId,
    pub name: String,
    pub tags: Vec<String>,
    pub is_default: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a segment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSegment {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// DTO for updating a segment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSegment {
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
}
