//! Shared query parameter types for API handlers.

use pressroom_db::models::contact::ContactView;
use serde::Deserialize;

/// `?view=all|archived&tag=` for contact listings.
#[derive(Debug, Default, Deserialize)]
pub struct ContactListParams {
    #[serde(default)]
    pub view: ContactView,
    pub tag: Option<String>,
}

/// `?status=` for newsletter listings.
#[derive(Debug, Default, Deserialize)]
pub struct StatusFilterParams {
    pub status: Option<String>,
}

/// `?change_summary=` for version restores.
#[derive(Debug, Default, Deserialize)]
pub struct RestoreParams {
    pub change_summary: Option<String>,
}
