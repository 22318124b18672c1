//! Turning a classified import into per-contact upserts, and tallying
//! the per-row outcomes into a report.
//!
//! Rows are written independently: a store error on one contact is
//! counted and reported, never rolled back across the file.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::audience_import::ClassifiedImport;

/// One contact write derived from one or more CSV rows sharing an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactUpsert {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub tags: Vec<String>,
    /// Line numbers of every row that contributed to this upsert.
    pub source_lines: Vec<usize>,
}

/// What the store did with a single [`ContactUpsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// No contact with this email existed for the client.
    Inserted,
    /// An active contact was updated in place.
    Updated,
    /// The contact is archived; it was left untouched. Only an explicit
    /// restore makes an archived contact active again.
    SkippedArchived,
}

/// Aggregate result of committing an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportCommitReport {
    pub imported_count: usize,
    pub updated_count: usize,
    pub invalid_rows_count: usize,
    pub skipped_archived_count: usize,
    pub failed_count: usize,
    /// Line numbers whose contact write failed.
    pub failed_rows: Vec<usize>,
    /// Names of segments created from detected tags.
    pub segments_created: Vec<String>,
    /// Tags whose segment could not be created. The contacts are still
    /// imported.
    pub segments_failed: Vec<String>,
}

impl ImportCommitReport {
    /// Start a report for `classified`, counting its invalid rows.
    pub fn for_import(classified: &ClassifiedImport) -> Self {
        Self {
            invalid_rows_count: classified.invalid_rows().count(),
            ..Self::default()
        }
    }

    /// Record the store result of one upsert.
    pub fn record<E>(&mut self, upsert: &ContactUpsert, result: &Result<UpsertOutcome, E>) {
        match result {
            Ok(UpsertOutcome::Inserted) => self.imported_count += 1,
            Ok(UpsertOutcome::Updated) => self.updated_count += 1,
            Ok(UpsertOutcome::SkippedArchived) => self.skipped_archived_count += 1,
            Err(_) => {
                self.failed_count += 1;
                self.failed_rows.extend(&upsert.source_lines);
            }
        }
    }

    /// Record the store result of creating the segment for `tag`.
    /// `Ok(None)` means a segment of that name already existed.
    pub fn record_segment<E>(&mut self, tag: &str, result: &Result<Option<String>, E>) {
        match result {
            Ok(Some(name)) => self.segments_created.push(name.clone()),
            Ok(None) => {}
            Err(_) => self.segments_failed.push(tag.to_owned()),
        }
    }
}

/// Collapse the valid rows of `classified` into one upsert per email, in
/// order of first appearance.
///
/// When an email repeats, later non-empty names replace earlier ones and
/// tags are unioned. Invalid rows produce nothing.
pub fn plan_commit(classified: &ClassifiedImport) -> Vec<ContactUpsert> {
    let mut merged: IndexMap<&str, (ContactUpsert, IndexSet<String>)> = IndexMap::new();

    for row in classified.rows.iter().filter(|r| r.is_valid_email) {
        let (upsert, tags) = merged.entry(row.email.as_str()).or_insert_with(|| {
            (
                ContactUpsert {
                    email: row.email.clone(),
                    first_name: String::new(),
                    last_name: String::new(),
                    tags: Vec::new(),
                    source_lines: Vec::new(),
                },
                IndexSet::new(),
            )
        });

        if !row.first_name.is_empty() {
            upsert.first_name.clone_from(&row.first_name);
        }
        if !row.last_name.is_empty() {
            upsert.last_name.clone_from(&row.last_name);
        }
        upsert.source_lines.push(row.line_number);
        tags.extend(row.tags.iter().cloned());
    }

    merged
        .into_values()
        .map(|(mut upsert, tags)| {
            upsert.tags = tags.into_iter().collect();
            upsert
        })
        .collect()
}
