//! Newsletter workflow status and the guards on changing it.
//!
//! Two entry points exist. [`next_status`] is the generic user-facing
//! status update: it accepts every status except the two that only the
//! dedicated actions may set. [`system_transition`] is used by the
//! schedule and delivery actions themselves. Both are consulted before
//! any write reaches the store.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::StatusId;

/// Returned when a caller tries to set `sent` through the generic update.
pub const SENT_GUARD_MSG: &str =
    "A newsletter becomes \"sent\" automatically through delivery; its status cannot be set to sent directly";

/// Returned when a caller tries to set `scheduled` through the generic update.
pub const SCHEDULED_GUARD_MSG: &str =
    "Cannot set status to \"scheduled\" directly; use the schedule action to pick a send time";

/// Workflow status of a newsletter campaign.
///
/// Discriminants match the seed order of the `newsletter_statuses` lookup table.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsletterStatus {
    Draft = 1,
    InReview = 2,
    ClientReview = 3,
    Revisions = 4,
    Approved = 5,
    Scheduled = 6,
    Sent = 7,
}

impl NewsletterStatus {
    /// Every status, in workflow order.
    pub const ALL: [Self; 7] = [
        Self::Draft,
        Self::InReview,
        Self::ClientReview,
        Self::Revisions,
        Self::Approved,
        Self::Scheduled,
        Self::Sent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InReview => "in_review",
            Self::ClientReview => "client_review",
            Self::Revisions => "revisions",
            Self::Approved => "approved",
            Self::Scheduled => "scheduled",
            Self::Sent => "sent",
        }
    }

    /// Lookup-table id.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Status for a lookup-table id.
    pub fn from_id(id: StatusId) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Status for its string name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == name)
    }

    /// `true` for statuses only the schedule and delivery actions may set.
    pub fn is_system_only(self) -> bool {
        matches!(self, Self::Scheduled | Self::Sent)
    }
}

impl std::fmt::Display for NewsletterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<NewsletterStatus> for StatusId {
    fn from(value: NewsletterStatus) -> Self {
        value as StatusId
    }
}

/// Status changes performed by dedicated actions rather than by a user
/// setting the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemAction {
    Schedule,
    Deliver,
}

impl SystemAction {
    pub fn target(self) -> NewsletterStatus {
        match self {
            Self::Schedule => NewsletterStatus::Scheduled,
            Self::Deliver => NewsletterStatus::Sent,
        }
    }
}

/// Validate a generic, user-requested status change.
///
/// Unknown names are a validation error. `sent` and `scheduled` are
/// refused with their guard messages. Every other status is accepted from
/// any current status, so review loops such as `approved -> in_review`
/// are allowed.
pub fn next_status(
    current: NewsletterStatus,
    requested: &str,
) -> Result<NewsletterStatus, CoreError> {
    let target = NewsletterStatus::parse(requested.trim()).ok_or_else(|| {
        CoreError::Validation(format!(
            "Invalid status '{requested}'. Must be one of: {}",
            NewsletterStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })?;

    if target.is_system_only() {
        return Err(CoreError::Conflict(guard_message(target).into()));
    }
    if target == current {
        return Ok(current);
    }
    Ok(target)
}

/// Message refusing a generic update to a system-only status.
fn guard_message(target: NewsletterStatus) -> &'static str {
    match target {
        NewsletterStatus::Sent => SENT_GUARD_MSG,
        _ => SCHEDULED_GUARD_MSG,
    }
}

/// Validate a status change made by the schedule or delivery action.
///
/// Scheduling is allowed from `approved`, or from `scheduled` to move the
/// send time. Delivery is allowed from `approved` or `scheduled`.
pub fn system_transition(
    current: NewsletterStatus,
    action: SystemAction,
) -> Result<NewsletterStatus, CoreError> {
    match (action, current) {
        (_, NewsletterStatus::Approved | NewsletterStatus::Scheduled) => Ok(action.target()),
        (SystemAction::Schedule, _) => Err(CoreError::Conflict(format!(
            "Only approved newsletters can be scheduled (current status: {current})"
        ))),
        (SystemAction::Deliver, _) => Err(CoreError::Conflict(format!(
            "Only approved or scheduled newsletters can be sent (current status: {current})"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn ids_match_seed_data() {
        let ids: Vec<StatusId> = NewsletterStatus::ALL.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(NewsletterStatus::from_id(5), Some(NewsletterStatus::Approved));
        assert_eq!(NewsletterStatus::from_id(0), None);
    }

    #[test]
    fn names_parse_back() {
        for status in NewsletterStatus::ALL {
            assert_eq!(NewsletterStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(NewsletterStatus::parse("published"), None);
    }

    #[test]
    fn draft_cannot_be_set_to_sent() {
        let err = next_status(NewsletterStatus::Draft, "sent").unwrap_err();
        assert_matches!(err, CoreError::Conflict(ref msg) if msg.contains("automatically"));
    }

    #[test]
    fn draft_cannot_be_set_to_scheduled() {
        let err = next_status(NewsletterStatus::Draft, "scheduled").unwrap_err();
        assert_matches!(
            err,
            CoreError::Conflict(ref msg) if msg.contains("schedule") && msg.contains("use")
        );
    }

    #[test]
    fn review_then_approve_is_allowed() {
        let in_review = next_status(NewsletterStatus::Draft, "in_review").unwrap();
        assert_eq!(in_review, NewsletterStatus::InReview);
        let approved = next_status(in_review, "approved").unwrap();
        assert_eq!(approved, NewsletterStatus::Approved);
    }

    #[test]
    fn revision_loops_are_permissive() {
        assert_eq!(
            next_status(NewsletterStatus::Approved, "in_review").unwrap(),
            NewsletterStatus::InReview
        );
        assert_eq!(
            next_status(NewsletterStatus::Revisions, "client_review").unwrap(),
            NewsletterStatus::ClientReview
        );
        assert_eq!(
            next_status(NewsletterStatus::Scheduled, "draft").unwrap(),
            NewsletterStatus::Draft
        );
    }

    #[test]
    fn sent_is_refused_from_every_status() {
        for current in NewsletterStatus::ALL {
            assert_matches!(next_status(current, "sent"), Err(CoreError::Conflict(_)));
            assert_matches!(next_status(current, "scheduled"), Err(CoreError::Conflict(_)));
        }
    }

    #[test]
    fn unknown_status_is_validation_error() {
        assert_matches!(
            next_status(NewsletterStatus::Draft, "published"),
            Err(CoreError::Validation(msg)) if msg.contains("in_review")
        );
    }

    #[test]
    fn schedule_requires_approval() {
        assert_eq!(
            system_transition(NewsletterStatus::Approved, SystemAction::Schedule).unwrap(),
            NewsletterStatus::Scheduled
        );
        assert_eq!(
            system_transition(NewsletterStatus::Scheduled, SystemAction::Schedule).unwrap(),
            NewsletterStatus::Scheduled
        );
        assert_matches!(
            system_transition(NewsletterStatus::Draft, SystemAction::Schedule),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn delivery_from_approved_or_scheduled() {
        for from in [NewsletterStatus::Approved, NewsletterStatus::Scheduled] {
            assert_eq!(
                system_transition(from, SystemAction::Deliver).unwrap(),
                NewsletterStatus::Sent
            );
        }
        assert_matches!(
            system_transition(NewsletterStatus::Sent, SystemAction::Deliver),
            Err(CoreError::Conflict(_))
        );
        assert_matches!(
            system_transition(NewsletterStatus::ClientReview, SystemAction::Deliver),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn system_only_statuses() {
        let system_only: Vec<_> = NewsletterStatus::ALL
            .into_iter()
            .filter(|s| s.is_system_only())
            .collect();
        assert_eq!(
            system_only,
            vec![NewsletterStatus::Scheduled, NewsletterStatus::Sent]
        );
    }
}
