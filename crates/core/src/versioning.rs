//! Newsletter content versioning rules.
//!
//! Versions are append-only snapshots. Every saved change and every
//! restore stamps a new version with the next number for its newsletter;
//! nothing here ever rewrites or removes an earlier one.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;

/// Maximum length of an optional change summary.
pub const MAX_CHANGE_SUMMARY_LENGTH: usize = 500;

/// Change summary stamped on the version created with a newsletter.
pub const INITIAL_VERSION_SUMMARY: &str = "Initial version";

/// The fields of a stored version that restore planning needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRef {
    pub id: DbId,
    pub newsletter_id: DbId,
    pub version_number: i32,
}

/// What a restore must write: the content comes from the source version,
/// the new version gets `version_number` and `change_summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestorePlan {
    pub source_version_id: DbId,
    pub version_number: i32,
    pub change_summary: String,
}

/// Number for the next version given the newsletter's current highest.
pub fn next_version_number(latest: Option<i32>) -> i32 {
    latest.unwrap_or(0) + 1
}

/// Summary used when the caller does not provide one for a restore.
pub fn restore_summary(source_version_number: i32) -> String {
    format!("Restored from version {source_version_number}")
}

/// Plan a restore of `source` onto `newsletter_id`.
///
/// Fails with `NotFound` when the version belongs to another newsletter.
/// The plan always moves forward: the new number is one past `latest`,
/// never the source's number. A caller-supplied summary is expected to have
/// passed [`validate_change_summary`] already.
pub fn plan_restore(
    newsletter_id: DbId,
    source: VersionRef,
    latest: i32,
    summary: Option<&str>,
) -> Result<RestorePlan, CoreError> {
    if source.newsletter_id != newsletter_id {
        return Err(CoreError::NotFound {
            entity: "NewsletterVersion",
            id: source.id,
        });
    }

    let change_summary = match summary.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.to_string(),
        None => restore_summary(source.version_number),
    };

    Ok(RestorePlan {
        source_version_id: source.id,
        version_number: next_version_number(Some(latest)),
        change_summary,
    })
}

/// Validate a newsletter document before it is stored as a snapshot.
///
/// The block editor produces either a JSON object or a list of blocks.
pub fn validate_document(document: &serde_json::Value) -> Result<(), CoreError> {
    if document.is_object() || document.is_array() {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Newsletter document must be a JSON object or array".to_string(),
        ))
    }
}

/// Validate an optional change summary.
pub fn validate_change_summary(summary: &str) -> Result<(), CoreError> {
    if summary.chars().count() > MAX_CHANGE_SUMMARY_LENGTH {
        return Err(CoreError::Validation(format!(
            "Change summary exceeds maximum length of {MAX_CHANGE_SUMMARY_LENGTH} characters"
        )));
    }
    Ok(())
}
