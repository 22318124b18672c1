//! Client (tenant) entity model and DTOs.

use pressroom_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A client row from the `clients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Client {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new client.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClient {
    pub name: String,
}

/// DTO for updating a client.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateClient {
    pub name: Option<String>,
}
