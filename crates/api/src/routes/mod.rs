pub mod clients;
pub mod health;
pub mod newsletters;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /clients                                         list, create
/// /clients/{client_id}                             get, update
/// /clients/{client_id}/contacts                    list (?view=, ?tag=), create
/// /clients/{client_id}/contacts/export             CSV download
/// /clients/{client_id}/contacts/import             commit
/// /clients/{client_id}/contacts/import/preview     preview (raw CSV body)
/// /clients/{client_id}/contacts/import/invalid-rows  invalid rows as CSV
/// /clients/{client_id}/contacts/{id}               get, update, delete
/// /clients/{client_id}/contacts/{id}/archive       archive (POST)
/// /clients/{client_id}/contacts/{id}/restore       restore (POST)
/// /clients/{client_id}/segments                    list, create
/// /clients/{client_id}/segments/{id}               get, update, delete
/// /clients/{client_id}/segments/{id}/members       matching contacts
/// /clients/{client_id}/newsletters                 list (?status=), create
///
/// /newsletters/{id}                                get, update
/// /newsletters/{id}/content                        save new version (PUT)
/// /newsletters/{id}/status                         change status (PUT)
/// /newsletters/{id}/schedule                       schedule (POST)
/// /newsletters/{id}/send                           deliver (POST)
/// /newsletters/{id}/send-test                      proof copy (POST)
/// /newsletters/{id}/versions                       history
/// /newsletters/{id}/versions/{version_id}          get
/// /newsletters/{id}/versions/{version_id}/restore  restore (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Clients and everything scoped to one client.
        .nest("/clients", clients::router())
        // Campaign workflow and content history.
        .nest("/newsletters", newsletters::router())
}
