//! Handlers for newsletter content and its version history.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pressroom_core::error::CoreError;
use pressroom_core::types::DbId;
use pressroom_core::versioning::{validate_change_summary, validate_document};
use pressroom_db::models::newsletter_version::{
    NewsletterVersion, NewsletterVersionSummary, SaveContent,
};
use pressroom_db::repositories::NewsletterVersionRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::newsletters::find_newsletter;
use crate::middleware::auth::AuthUser;
use crate::query::RestoreParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn version_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "NewsletterVersion",
        id,
    })
}

/// Trimmed summary, `None` when blank.
fn clean_summary(summary: Option<&str>) -> AppResult<Option<&str>> {
    match summary.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => {
            validate_change_summary(s)?;
            Ok(Some(s))
        }
        None => Ok(None),
    }
}

/// PUT /api/v1/newsletters/{id}/content
///
/// Stores the document as a new version and makes it current.
pub async fn save_content(
    user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SaveContent>,
) -> AppResult<(StatusCode, Json<DataResponse<NewsletterVersion>>)> {
    validate_document(&input.document)?;
    let summary = clean_summary(input.change_summary.as_deref())?;

    let version = NewsletterVersionRepo::save_content(
        &state.pool,
        id,
        &input.document,
        summary,
        user.map(|u| u.user_id),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Newsletter",
        id,
    }))?;

    tracing::info!(
        newsletter_id = id,
        version_number = version.version_number,
        "Newsletter content saved",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}

/// GET /api/v1/newsletters/{id}/versions
///
/// Newest first, without content.
pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<NewsletterVersionSummary>>>> {
    find_newsletter(&state, id).await?;
    let versions = NewsletterVersionRepo::list_by_newsletter(&state.pool, id).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// GET /api/v1/newsletters/{id}/versions/{version_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path((id, version_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<NewsletterVersion>>> {
    let version = NewsletterVersionRepo::find_for_newsletter(&state.pool, id, version_id)
        .await?
        .ok_or_else(|| version_not_found(version_id))?;
    Ok(Json(DataResponse { data: version }))
}

/// POST /api/v1/newsletters/{id}/versions/{version_id}/restore?change_summary=
///
/// Appends a new version carrying the old content. History is never
/// rewritten.
pub async fn restore(
    user: Option<AuthUser>,
    State(state): State<AppState>,
    Path((id, version_id)): Path<(DbId, DbId)>,
    Query(params): Query<RestoreParams>,
) -> AppResult<(StatusCode, Json<DataResponse<NewsletterVersion>>)> {
    let summary = clean_summary(params.change_summary.as_deref())?;
    find_newsletter(&state, id).await?;

    let version = NewsletterVersionRepo::restore(
        &state.pool,
        id,
        version_id,
        summary,
        user.map(|u| u.user_id),
    )
    .await?
    .ok_or_else(|| version_not_found(version_id))?;

    tracing::info!(
        newsletter_id = id,
        source_version_id = version_id,
        version_number = version.version_number,
        "Newsletter version restored",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}
