//! Handlers for newsletters (campaigns) and their workflow actions.
//!
//! Every status write is conditional on the status the handler read. When
//! the condition fails another request got there first and the caller gets
//! a 409 instead of a silently overwritten status.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pressroom_core::campaign_status::{next_status, NewsletterStatus, SystemAction};
use pressroom_core::delivery::{self, OutboundMessage, TestSendOutcome};
use pressroom_core::error::CoreError;
use pressroom_core::readiness::{check_send_ready, SendCandidate};
use pressroom_core::types::{DbId, Timestamp};
use pressroom_core::versioning::validate_document;
use pressroom_db::models::contact::ContactView;
use pressroom_db::models::newsletter::{CreateNewsletter, Newsletter, UpdateNewsletter};
use pressroom_db::repositories::{ContactRepo, NewsletterRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::clients::ensure_client_exists;
use crate::middleware::auth::AuthUser;
use crate::query::StatusFilterParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /newsletters/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Request body for `POST /newsletters/{id}/schedule`.
#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub scheduled_for: Option<Timestamp>,
}

/// Request body for `POST /newsletters/{id}/send-test`.
#[derive(Debug, Deserialize)]
pub struct SendTestRequest {
    pub to_email: String,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Newsletter",
        id,
    })
}

fn changed_concurrently(id: DbId) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Newsletter {id} changed concurrently; reload and try again"
    )))
}

pub(crate) async fn find_newsletter(state: &AppState, id: DbId) -> AppResult<Newsletter> {
    NewsletterRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))
}

fn status_of(newsletter: &Newsletter) -> AppResult<NewsletterStatus> {
    newsletter.status().ok_or_else(|| {
        AppError::Core(CoreError::Internal(format!(
            "Newsletter {} has unknown status id {}",
            newsletter.id, newsletter.status_id
        )))
    })
}

fn validate_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Newsletter title must not be empty".into(),
        )));
    }
    Ok(title.to_string())
}

/// GET /api/v1/clients/{client_id}/newsletters?status=
pub async fn list_by_client(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
    Query(params): Query<StatusFilterParams>,
) -> AppResult<Json<DataResponse<Vec<Newsletter>>>> {
    ensure_client_exists(&state.pool, client_id).await?;
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(name) => Some(NewsletterStatus::parse(name).ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!("Unknown status '{name}'")))
        })?),
    };
    let newsletters = NewsletterRepo::list_by_client(&state.pool, client_id, status).await?;
    Ok(Json(DataResponse { data: newsletters }))
}

/// POST /api/v1/clients/{client_id}/newsletters
///
/// Creates the newsletter in `draft` together with its first version.
pub async fn create(
    user: Option<AuthUser>,
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
    Json(input): Json<CreateNewsletter>,
) -> AppResult<(StatusCode, Json<DataResponse<Newsletter>>)> {
    ensure_client_exists(&state.pool, client_id).await?;
    if let Some(document) = &input.document {
        validate_document(document)?;
    }
    let input = CreateNewsletter {
        title: validate_title(&input.title)?,
        ..input
    };

    let created_by = user.map(|u| u.user_id);
    let newsletter = NewsletterRepo::create(&state.pool, client_id, &input, created_by).await?;
    tracing::info!(client_id, newsletter_id = newsletter.id, "Newsletter created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: newsletter })))
}

/// GET /api/v1/newsletters/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Newsletter>>> {
    let newsletter = find_newsletter(&state, id).await?;
    Ok(Json(DataResponse { data: newsletter }))
}

/// PUT /api/v1/newsletters/{id}
///
/// Metadata only. Content goes through versions, status through its own
/// endpoints.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateNewsletter>,
) -> AppResult<Json<DataResponse<Newsletter>>> {
    let input = UpdateNewsletter {
        title: input.title.as_deref().map(validate_title).transpose()?,
        ..input
    };
    let newsletter = NewsletterRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: newsletter }))
}

/// PUT /api/v1/newsletters/{id}/status
///
/// Generic status change. `scheduled` and `sent` are refused here.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<Json<DataResponse<Newsletter>>> {
    let newsletter = find_newsletter(&state, id).await?;
    let current = status_of(&newsletter)?;
    let target = next_status(current, &input.status)?;

    if target == current {
        return Ok(Json(DataResponse { data: newsletter }));
    }

    let updated = NewsletterRepo::update_status(&state.pool, id, current, target)
        .await?
        .ok_or_else(|| changed_concurrently(id))?;

    tracing::info!(
        newsletter_id = id,
        from = %current,
        to = %target,
        "Newsletter status changed",
    );
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/newsletters/{id}/schedule
pub async fn schedule(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ScheduleRequest>,
) -> AppResult<Json<DataResponse<Newsletter>>> {
    let newsletter = find_newsletter(&state, id).await?;
    let current = status_of(&newsletter)?;

    let candidate = SendCandidate {
        status: current,
        document: Some(&newsletter.document),
        scheduled_for: input.scheduled_for,
    };
    check_send_ready(&candidate, SystemAction::Schedule, chrono::Utc::now())?;

    // check_send_ready guarantees a send time for scheduling.
    let Some(scheduled_for) = input.scheduled_for else {
        return Err(AppError::Core(CoreError::Validation(
            "A send time is required to schedule a newsletter".into(),
        )));
    };

    let updated = NewsletterRepo::schedule(&state.pool, id, current, scheduled_for)
        .await?
        .ok_or_else(|| changed_concurrently(id))?;

    tracing::info!(newsletter_id = id, %scheduled_for, "Newsletter scheduled");
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/newsletters/{id}/send
///
/// Hands the newsletter to the delivery provider. The status only becomes
/// `sent` once the provider has accepted it; a provider failure leaves the
/// newsletter as it was and returns 502.
///
/// The newsletter row stays locked from the readiness check until the status
/// is written, so a second send of the same newsletter waits and then gets
/// 409 without reaching the provider.
pub async fn send(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Newsletter>>> {
    let mut tx = state.pool.begin().await?;
    let newsletter = NewsletterRepo::lock_for_send(&mut *tx, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let current = status_of(&newsletter)?;

    let candidate = SendCandidate {
        status: current,
        document: Some(&newsletter.document),
        scheduled_for: newsletter.scheduled_for,
    };
    check_send_ready(&candidate, SystemAction::Deliver, chrono::Utc::now())?;

    let recipients: Vec<String> =
        ContactRepo::list(&state.pool, newsletter.client_id, ContactView::All, None)
            .await?
            .into_iter()
            .filter(|c| c.is_active)
            .map(|c| c.email)
            .collect();
    if recipients.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Client has no active contacts to send to".into(),
        )));
    }

    let message = OutboundMessage {
        newsletter_id: id,
        subject: newsletter.title.clone(),
        document: newsletter.document.clone(),
        recipients,
    };
    // Dropping `tx` on a provider error rolls back and releases the lock.
    let receipt = state
        .delivery
        .deliver(&message)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let updated = NewsletterRepo::mark_sent(&mut *tx, id, current)
        .await?
        .ok_or_else(|| changed_concurrently(id))?;
    tx.commit().await?;

    tracing::info!(
        newsletter_id = id,
        recipients = receipt.accepted_recipients,
        provider_message_id = ?receipt.provider_message_id,
        "Newsletter sent",
    );
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/newsletters/{id}/send-test
///
/// Sends one proof copy. Never changes the newsletter.
pub async fn send_test(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SendTestRequest>,
) -> AppResult<Json<DataResponse<TestSendOutcome>>> {
    let newsletter = find_newsletter(&state, id).await?;
    let outcome = delivery::send_test(
        state.delivery.as_ref(),
        id,
        &newsletter.title,
        &newsletter.document,
        &input.to_email,
    )
    .await?;

    if outcome.delivered {
        tracing::info!(newsletter_id = id, to = %outcome.to_email, "Test send delivered");
    } else {
        tracing::warn!(
            newsletter_id = id,
            to = %outcome.to_email,
            error = ?outcome.error,
            "Test send failed",
        );
    }
    Ok(Json(DataResponse { data: outcome }))
}
