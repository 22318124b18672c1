//! Audience segments: named, tag-defined views over a client's contacts.
//!
//! A segment never stores contacts. Membership is computed from tags at
//! read time, so archiving or retagging a contact is reflected immediately.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexSet;

use crate::audience_import::{normalize_tags, RESERVED_TAG_ALL};
use crate::error::CoreError;

/// Name of the segment every client gets on creation.
pub const DEFAULT_SEGMENT_NAME: &str = "All";

/// Maximum length of a segment name.
pub const MAX_SEGMENT_NAME_LENGTH: usize = 120;

/// Tags of the default segment.
pub fn default_segment_tags() -> Vec<String> {
    vec![RESERVED_TAG_ALL.to_string()]
}

/// Trim and validate a segment name.
pub fn validate_segment_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation(
            "Segment name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_SEGMENT_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Segment name exceeds maximum length of {MAX_SEGMENT_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

/// Normalise user-supplied segment tags the same way import tags are
/// normalised. Entries may themselves contain separators.
pub fn normalize_segment_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags = IndexSet::new();
    for entry in raw {
        tags.extend(normalize_tags(entry.as_ref()));
    }
    tags.into_iter().collect()
}

/// Refuse deleting the default segment.
pub fn ensure_deletable(is_default: bool) -> Result<(), CoreError> {
    if is_default {
        return Err(CoreError::Conflict(
            "The default segment cannot be deleted".to_string(),
        ));
    }
    Ok(())
}

/// `true` when a contact with `contact_tags` is a member of a segment
/// defined by `segment_tags`. Archived contacts are filtered by the caller.
pub fn matches_contact(segment_tags: &[String], contact_tags: &[String]) -> bool {
    if segment_tags.iter().any(|t| t == RESERVED_TAG_ALL) {
        return true;
    }
    segment_tags.iter().any(|t| contact_tags.contains(t))
}

/// Names of the segments an import should create.
///
/// `requested` wins when it has any usable tag; otherwise every detected tag
/// is used. `all` is never materialised and names already taken by the
/// client (compared case-insensitively) are skipped. Each created segment is
/// named after its single tag.
pub fn segments_to_create(
    detected: &BTreeSet<String>,
    requested: &[String],
    existing_names: &[String],
) -> Vec<String> {
    let requested = normalize_segment_tags(requested);
    let candidates: Vec<String> = if requested.is_empty() {
        detected.iter().cloned().collect()
    } else {
        requested
    };

    let taken: HashSet<String> = existing_names.iter().map(|n| n.to_lowercase()).collect();

    candidates
        .into_iter()
        .filter(|tag| tag != RESERVED_TAG_ALL)
        .filter(|tag| !taken.contains(tag))
        .collect()
}
