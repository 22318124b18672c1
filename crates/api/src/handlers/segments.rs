//! Handlers for `/clients/{client_id}/segments`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pressroom_core::error::CoreError;
use pressroom_core::segment::{
    ensure_deletable, matches_contact, normalize_segment_tags, validate_segment_name,
};
use pressroom_core::types::DbId;
use pressroom_db::models::contact::{Contact, ContactView};
use pressroom_db::models::segment::{CreateSegment, Segment, UpdateSegment};
use pressroom_db::repositories::{ContactRepo, SegmentRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::clients::ensure_client_exists;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Segment",
        id,
    })
}

async fn find_segment(state: &AppState, client_id: DbId, id: DbId) -> AppResult<Segment> {
    SegmentRepo::find_by_id(&state.pool, client_id, id)
        .await?
        .ok_or_else(|| not_found(id))
}

/// GET /api/v1/clients/{client_id}/segments
pub async fn list(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Segment>>>> {
    ensure_client_exists(&state.pool, client_id).await?;
    let segments = SegmentRepo::list(&state.pool, client_id).await?;
    Ok(Json(DataResponse { data: segments }))
}

/// POST /api/v1/clients/{client_id}/segments
pub async fn create(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
    Json(input): Json<CreateSegment>,
) -> AppResult<(StatusCode, Json<DataResponse<Segment>>)> {
    ensure_client_exists(&state.pool, client_id).await?;
    let input = CreateSegment {
        name: validate_segment_name(&input.name)?,
        tags: normalize_segment_tags(&input.tags),
    };
    let segment = SegmentRepo::create(&state.pool, client_id, &input).await?;
    tracing::info!(client_id, segment_id = segment.id, name = %segment.name, "Segment created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: segment })))
}

/// GET /api/v1/clients/{client_id}/segments/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Segment>>> {
    let segment = find_segment(&state, client_id, id).await?;
    Ok(Json(DataResponse { data: segment }))
}

/// PUT /api/v1/clients/{client_id}/segments/{id}
pub async fn update(
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateSegment>,
) -> AppResult<Json<DataResponse<Segment>>> {
    let input = UpdateSegment {
        name: input.name.as_deref().map(validate_segment_name).transpose()?,
        tags: input.tags.map(normalize_segment_tags),
    };
    let segment = SegmentRepo::update(&state.pool, client_id, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: segment }))
}

/// DELETE /api/v1/clients/{client_id}/segments/{id}
///
/// The client's default segment cannot be deleted.
pub async fn delete(
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    let segment = find_segment(&state, client_id, id).await?;
    ensure_deletable(segment.is_default)?;

    if SegmentRepo::delete(&state.pool, client_id, id).await? {
        tracing::info!(client_id, segment_id = id, "Segment deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// GET /api/v1/clients/{client_id}/segments/{id}/members
///
/// Active, non-archived contacts whose tags match the segment.
pub async fn members(
    State(state): State<AppState>,
    Path((client_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<Vec<Contact>>>> {
    let segment = find_segment(&state, client_id, id).await?;
    let contacts = ContactRepo::list(&state.pool, client_id, ContactView::All, None).await?;
    let members = contacts
        .into_iter()
        .filter(|c| c.is_active && matches_contact(&segment.tags, &c.tags))
        .collect();
    Ok(Json(DataResponse { data: members }))
}
