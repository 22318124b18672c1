//! Handlers for `/clients/{client_id}/contacts`.
//!
//! Lifecycle endpoints issue one conditional statement each. When it
//! matches nothing, the contact is re-read and the lifecycle rules decide
//! which error to report.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use pressroom_core::audience_import::{is_valid_email, normalize_email};
use pressroom_core::contact_lifecycle::{self, ContactAction};
use pressroom_core::csv_table::{build_contacts_csv, ContactCsvLine};
use pressroom_core::error::CoreError;
use pressroom_core::segment::normalize_segment_tags;
use pressroom_core::types::DbId;
use pressroom_db::models::contact::{Contact, ContactView, CreateContact, UpdateContact};
use pressroom_db::repositories::ContactRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::clients::ensure_client_exists;
use crate::query::ContactListParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Contact",
        id,
    })
}

/// Explain why a lifecycle statement for `action` matched no row.
async fn lifecycle_rejection(
    state: &AppState,
    client_id: DbId,
    id: DbId,
    action: ContactAction,
) -> AppError {
    let contact = match ContactRepo::find_by_id(&state.pool, client_id, id).await {
        Ok(Some(contact)) => contact,
        Ok(None) => return not_found(id),
        Err(e) => return e.into(),
    };
    match contact_lifecycle::apply(contact.state(), action) {
        Err(e) => e.into(),
        // The row changed between the statement and the re-read.
        Ok(_) => AppError::Core(CoreError::Conflict(format!(
            "Contact {id} changed while the {} was in progress; retry",
            action.as_str()
        ))),
    }
}

/// GET /api/v1/clients/{client_id}/contacts?view=all|archived&tag=
pub async fn list(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
    Query(params): Query<ContactListParams>,
) -> AppResult<Json<DataResponse<Vec<Contact>>>> {
    ensure_client_exists(&state.pool, client_id).await?;
    let tag = params
        .tag
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty());
    let contacts = ContactRepo::list(&state.pool, client_id, params.view, tag.as_deref()).await?;
    Ok(Json(DataResponse { data: contacts }))
}

/// POST /api/v1/clients/{client_id}/contacts
pub async fn create(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
    Json(input): Json<CreateContact>,
) -> AppResult<(StatusCode, Json<DataResponse<Contact>>)> {
    ensure_client_exists(&state.pool, client_id).await?;
    if !is_valid_email(&input.email) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Invalid email address '{}'",
            input.email.trim()
        ))));
    }

    let input = CreateContact {
        email: normalize_email(&input.email),
        first_name: input.first_name.trim().to_string(),
        last_name: input.last_name.trim().to_string(),
        tags: normalize_segment_tags(&input.tags),
    };
    let contact = ContactRepo::create(&state.pool, client_id, &input).await?;
    tracing::info!(client_id, contact_id = contact.id, "Contact created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: contact })))
}

/// GET /api/v1/clients/{client_id}/contacts/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Contact>>> {
    let contact = ContactRepo::find_by_id(&state.pool, client_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: contact }))
}

/// PUT /api/v1/clients/{client_id}/contacts/{id}
///
/// Names, tags, and `is_active` are editable whether or not the contact is
/// archived.
pub async fn update(
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateContact>,
) -> AppResult<Json<DataResponse<Contact>>> {
    let input = UpdateContact {
        first_name: input.first_name.map(|s| s.trim().to_string()),
        last_name: input.last_name.map(|s| s.trim().to_string()),
        tags: input.tags.map(normalize_segment_tags),
        is_active: input.is_active,
    };
    let contact = ContactRepo::update(&state.pool, client_id, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: contact }))
}

/// POST /api/v1/clients/{client_id}/contacts/{id}/archive
pub async fn archive(
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Contact>>> {
    match ContactRepo::archive(&state.pool, client_id, id).await? {
        Some(contact) => {
            tracing::info!(client_id, contact_id = id, "Contact archived");
            Ok(Json(DataResponse { data: contact }))
        }
        None => Err(lifecycle_rejection(&state, client_id, id, ContactAction::Archive).await),
    }
}

/// POST /api/v1/clients/{client_id}/contacts/{id}/restore
pub async fn restore(
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Contact>>> {
    match ContactRepo::restore(&state.pool, client_id, id).await? {
        Some(contact) => {
            tracing::info!(client_id, contact_id = id, "Contact restored");
            Ok(Json(DataResponse { data: contact }))
        }
        None => Err(lifecycle_rejection(&state, client_id, id, ContactAction::Restore).await),
    }
}

/// DELETE /api/v1/clients/{client_id}/contacts/{id}
///
/// Only archived contacts can be deleted; anything else is a 409.
pub async fn delete(
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if ContactRepo::delete_archived(&state.pool, client_id, id).await? {
        tracing::info!(client_id, contact_id = id, "Contact permanently deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(lifecycle_rejection(&state, client_id, id, ContactAction::Delete).await)
    }
}

/// GET /api/v1/clients/{client_id}/contacts/export
///
/// Active contacts as `email,first_name,last_name,tags` CSV.
pub async fn export(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_client_exists(&state.pool, client_id).await?;
    let contacts = ContactRepo::list(&state.pool, client_id, ContactView::All, None).await?;

    let csv = build_contacts_csv(contacts.iter().map(|c| ContactCsvLine {
        email: &c.email,
        first_name: &c.first_name,
        last_name: &c.last_name,
        tags: &c.tags,
    }));

    Ok(csv_attachment(csv, "contacts.csv"))
}

/// Wrap CSV text as a downloadable `text/csv` response.
pub(crate) fn csv_attachment(csv: String, filename: &str) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
}
