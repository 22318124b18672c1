//! Newsletter (campaign) entity model and DTOs.

use chrono::NaiveDate;
use pressroom_core::campaign_status::NewsletterStatus;
use pressroom_core::types::{DbId, StatusId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A newsletter row from the `newsletters` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Newsletter {
    pub id: DbId,
    pub client_id: DbId,
    pub title: String,
    pub status_id: StatusId,
    pub document: serde_json::Value,
    pub current_version_id: Option<DbId>,
    pub expected_send_date: Option<NaiveDate>,
    pub scheduled_for: Option<Timestamp>,
    pub sent_at: Option<Timestamp>,
    pub invoice_id: Option<String>,
    pub subscription_id: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Newsletter {
    /// Typed status. Rows always carry a seeded lookup id; an unknown id
    /// means the lookup table and the enum have drifted.
    pub fn status(&self) -> Option<NewsletterStatus> {
        NewsletterStatus::from_id(self.status_id)
    }
}

/// DTO for creating a newsletter.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNewsletter {
    pub title: String,
    /// Defaults to an empty object.
    pub document: Option<serde_json::Value>,
    pub expected_send_date: Option<NaiveDate>,
    pub invoice_id: Option<String>,
    pub subscription_id: Option<String>,
}

/// DTO for updating newsletter metadata. Status and content have their own
/// operations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNewsletter {
    pub title: Option<String>,
    pub expected_send_date: Option<NaiveDate>,
    pub invoice_id: Option<String>,
    pub subscription_id: Option<String>,
}
