//! Send readiness: the last check before a newsletter is scheduled or
//! handed to the delivery provider.

use crate::campaign_status::{system_transition, NewsletterStatus, SystemAction};
use crate::error::CoreError;
use crate::types::Timestamp;

/// The parts of a newsletter readiness depends on.
#[derive(Debug, Clone, Copy)]
pub struct SendCandidate<'a> {
    pub status: NewsletterStatus,
    /// Content of the current version, if the newsletter has one.
    pub document: Option<&'a serde_json::Value>,
    /// Requested send time. Only consulted for [`SystemAction::Schedule`].
    pub scheduled_for: Option<Timestamp>,
}

/// Check that `candidate` may undergo `action` at time `now`.
///
/// Returns the status the newsletter moves to. Status problems are
/// conflicts; empty content and a missing or past send time are
/// validation errors.
pub fn check_send_ready(
    candidate: &SendCandidate<'_>,
    action: SystemAction,
    now: Timestamp,
) -> Result<NewsletterStatus, CoreError> {
    let target = system_transition(candidate.status, action)?;

    if !has_content(candidate.document) {
        return Err(CoreError::Validation(
            "Newsletter has no content to send".to_string(),
        ));
    }

    if action == SystemAction::Schedule {
        match candidate.scheduled_for {
            None => {
                return Err(CoreError::Validation(
                    "A send time is required to schedule a newsletter".to_string(),
                ))
            }
            Some(at) if at <= now => {
                return Err(CoreError::Validation(
                    "Scheduled send time must be in the future".to_string(),
                ))
            }
            Some(_) => {}
        }
    }

    Ok(target)
}

/// A document counts as content when it is a non-empty object or array.
fn has_content(document: Option<&serde_json::Value>) -> bool {
    match document {
        Some(serde_json::Value::Object(map)) => !map.is_empty(),
        Some(serde_json::Value::Array(items)) => !items.is_empty(),
        _ => false,
    }
}
