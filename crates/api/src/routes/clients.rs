//! Route definitions for the `/clients` resource.
//!
//! Contacts, imports, segments, and newsletter listings are nested under
//! `/clients/{client_id}/...`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{clients, contacts, imports, newsletters, segments};
use crate::state::AppState;

/// Routes mounted at `/clients`.
///
/// ```text
/// GET    /                                          -> list
/// POST   /                                          -> create
/// GET    /{client_id}                               -> get_by_id
/// PUT    /{client_id}                               -> update
///
/// GET    /{client_id}/contacts                      -> list
/// POST   /{client_id}/contacts                      -> create
/// GET    /{client_id}/contacts/export               -> export
/// POST   /{client_id}/contacts/import               -> imports::commit
/// POST   /{client_id}/contacts/import/preview       -> imports::preview
/// POST   /{client_id}/contacts/import/invalid-rows  -> imports::invalid_rows
/// GET    /{client_id}/contacts/{id}                 -> get_by_id
/// PUT    /{client_id}/contacts/{id}                 -> update
/// DELETE /{client_id}/contacts/{id}                 -> delete
/// POST   /{client_id}/contacts/{id}/archive         -> archive
/// POST   /{client_id}/contacts/{id}/restore         -> restore
///
/// GET    /{client_id}/segments                      -> list
/// POST   /{client_id}/segments                      -> create
/// GET    /{client_id}/segments/{id}                 -> get_by_id
/// PUT    /{client_id}/segments/{id}                 -> update
/// DELETE /{client_id}/segments/{id}                 -> delete
/// GET    /{client_id}/segments/{id}/members         -> members
///
/// GET    /{client_id}/newsletters                   -> newsletters::list_by_client
/// POST   /{client_id}/newsletters                   -> newsletters::create
/// ```
pub fn router() -> Router<AppState> {
    let contact_routes = Router::new()
        .route("/", get(contacts::list).post(contacts::create))
        .route("/export", get(contacts::export))
        .route("/import", post(imports::commit))
        .route("/import/preview", post(imports::preview))
        .route("/import/invalid-rows", post(imports::invalid_rows))
        .route(
            "/{id}",
            get(contacts::get_by_id)
                .put(contacts::update)
                .delete(contacts::delete),
        )
        .route("/{id}/archive", post(contacts::archive))
        .route("/{id}/restore", post(contacts::restore));

    let segment_routes = Router::new()
        .route("/", get(segments::list).post(segments::create))
        .route(
            "/{id}",
            get(segments::get_by_id)
                .put(segments::update)
                .delete(segments::delete),
        )
        .route("/{id}/members", get(segments::members));

    let newsletter_routes = Router::new().route(
        "/",
        get(newsletters::list_by_client).post(newsletters::create),
    );

    Router::new()
        .route("/", get(clients::list).post(clients::create))
        .route("/{client_id}", get(clients::get_by_id).put(clients::update))
        .nest("/{client_id}/contacts", contact_routes)
        .nest("/{client_id}/segments", segment_routes)
        .nest("/{client_id}/newsletters", newsletter_routes)
}
