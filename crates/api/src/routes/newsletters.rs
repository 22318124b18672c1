//! Route definitions for the `/newsletters` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{newsletters, versions};
use crate::state::AppState;

/// Routes mounted at `/newsletters`.
///
/// ```text
/// GET    /{id}                                  -> get_by_id
/// PUT    /{id}                                  -> update
/// PUT    /{id}/content                          -> versions::save_content
/// PUT    /{id}/status                           -> update_status
/// POST   /{id}/schedule                         -> schedule
/// POST   /{id}/send                             -> send
/// POST   /{id}/send-test                        -> send_test
/// GET    /{id}/versions                         -> versions::list
/// GET    /{id}/versions/{version_id}            -> versions::get_by_id
/// POST   /{id}/versions/{version_id}/restore    -> versions::restore
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(newsletters::get_by_id).put(newsletters::update))
        .route("/{id}/content", put(versions::save_content))
        .route("/{id}/status", put(newsletters::update_status))
        .route("/{id}/schedule", post(newsletters::schedule))
        .route("/{id}/send", post(newsletters::send))
        .route("/{id}/send-test", post(newsletters::send_test))
        .route("/{id}/versions", get(versions::list))
        .route("/{id}/versions/{version_id}", get(versions::get_by_id))
        .route(
            "/{id}/versions/{version_id}/restore",
            post(versions::restore),
        )
}
