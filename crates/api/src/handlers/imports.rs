//! Audience CSV import: preview, invalid-row download, and commit.
//!
//! Preview and invalid-row endpoints take the raw CSV as the request body.
//! Commit takes JSON so the segment options can travel with the file.

use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use pressroom_core::audience_import::{self, AudienceImportSummary};
use pressroom_core::import_commit::{plan_commit, ImportCommitReport};
use pressroom_core::segment::segments_to_create;
use pressroom_core::types::DbId;
use pressroom_db::repositories::{ContactRepo, SegmentRepo};
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::clients::ensure_client_exists;
use crate::handlers::contacts::csv_attachment;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for committing an import.
#[derive(Debug, Deserialize)]
pub struct CommitImportRequest {
    pub csv_text: String,
    /// Create one segment per tag after the contacts are written.
    #[serde(default)]
    pub create_segments: bool,
    /// Restrict segment creation to these tags instead of every detected tag.
    #[serde(default)]
    pub segment_tags: Vec<String>,
}

/// Every email already stored for the client, archived ones included.
async fn existing_emails(state: &AppState, client_id: DbId) -> AppResult<HashSet<String>> {
    let emails = ContactRepo::emails_for_client(&state.pool, client_id).await?;
    Ok(emails.into_iter().collect())
}

/// POST /api/v1/clients/{client_id}/contacts/import/preview
///
/// Returns `null` data when the file has no header row.
pub async fn preview(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
    csv_text: String,
) -> AppResult<Json<DataResponse<Option<AudienceImportSummary>>>> {
    ensure_client_exists(&state.pool, client_id).await?;
    let existing = existing_emails(&state, client_id).await?;
    let summary = audience_import::parse(&csv_text, &existing);
    Ok(Json(DataResponse { data: summary }))
}

/// POST /api/v1/clients/{client_id}/contacts/import/invalid-rows
///
/// The rows of the uploaded file that would be skipped, in the contact
/// export layout so they can be fixed and re-uploaded.
pub async fn invalid_rows(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
    csv_text: String,
) -> AppResult<impl IntoResponse> {
    ensure_client_exists(&state.pool, client_id).await?;
    let existing = existing_emails(&state, client_id).await?;
    let csv = audience_import::classify(&csv_text, &existing)
        .map(|classified| classified.invalid_rows_csv())
        .unwrap_or_default();
    Ok(csv_attachment(csv, "invalid-rows.csv"))
}

/// POST /api/v1/clients/{client_id}/contacts/import
///
/// Each contact is written on its own; a failed write is counted and
/// reported by line number without undoing the others. Segment creation
/// runs afterwards and its failures are listed in `segments_failed`.
pub async fn commit(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
    Json(input): Json<CommitImportRequest>,
) -> AppResult<Json<DataResponse<ImportCommitReport>>> {
    ensure_client_exists(&state.pool, client_id).await?;
    let existing = existing_emails(&state, client_id).await?;

    let Some(classified) = audience_import::classify(&input.csv_text, &existing) else {
        tracing::info!(client_id, "Import commit with empty file");
        return Ok(Json(DataResponse {
            data: ImportCommitReport::default(),
        }));
    };

    let mut report = ImportCommitReport::for_import(&classified);
    for upsert in plan_commit(&classified) {
        let result = ContactRepo::upsert_from_import(&state.pool, client_id, &upsert).await;
        if let Err(e) = &result {
            tracing::warn!(
                client_id,
                email = %upsert.email,
                lines = ?upsert.source_lines,
                error = %e,
                "Import row failed",
            );
        }
        report.record(&upsert, &result);
    }

    // Contacts are already written; segment errors are reported, not raised.
    if input.create_segments {
        let detected = classified.summary().detected_tags;
        let existing_names = SegmentRepo::names_for_client(&state.pool, client_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(client_id, error = %e, "Could not load segment names");
                Vec::new()
            });
        for tag in segments_to_create(&detected, &input.segment_tags, &existing_names) {
            let result = SegmentRepo::create_for_tag(&state.pool, client_id, &tag)
                .await
                .map(|segment| segment.map(|s| s.name));
            if let Err(e) = &result {
                tracing::warn!(client_id, %tag, error = %e, "Segment creation failed");
            }
            report.record_segment(&tag, &result);
        }
    }

    tracing::info!(
        client_id,
        imported = report.imported_count,
        updated = report.updated_count,
        invalid = report.invalid_rows_count,
        skipped_archived = report.skipped_archived_count,
        failed = report.failed_count,
        segments_created = report.segments_created.len(),
        segments_failed = report.segments_failed.len(),
        "Audience import committed",
    );

    Ok(Json(DataResponse { data: report }))
}
