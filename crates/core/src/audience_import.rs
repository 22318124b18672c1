//! Audience CSV import: validation, duplicate detection, tag extraction,
//! and preview/summary building.
//!
//! The pipeline is a pure fold. [`classify`] turns raw CSV text into an
//! ordered list of classified rows, and [`ClassifiedImport::summary`]
//! derives every count and set from that list. The bounded preview is
//! only a view; counts always cover every row.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;
use serde::Serialize;

use crate::csv_table::{build_contacts_csv, ContactCsvLine, CsvRow, CsvTable};
use crate::header_resolver::HeaderIndex;

/// Maximum number of rows returned in [`AudienceImportSummary::preview_rows`].
pub const PREVIEW_ROW_LIMIT: usize = 10;

/// Implicit tag every contact belongs to. Never reported as a detected tag.
pub const RESERVED_TAG_ALL: &str = "all";

/// Characters that separate tags inside a single tags cell.
pub const TAG_SEPARATORS: &[char] = &[';', ',', '|'];

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// One classified data row.
///
/// `is_duplicate_in_csv` and `is_existing_contact` are always `false`
/// when `is_valid_email` is `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudiencePreviewRow {
    pub line_number: usize,
    /// Lower-cased and trimmed.
    pub email: String,
    /// The email cell as uploaded, used when handing invalid rows back.
    #[serde(skip)]
    pub source_email: String,
    pub first_name: String,
    pub last_name: String,
    pub tags: IndexSet<String>,
    pub is_valid_email: bool,
    pub is_duplicate_in_csv: bool,
    pub is_existing_contact: bool,
}

/// Counts and preview shown to the operator before an import is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudienceImportSummary {
    pub headers: Vec<String>,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub duplicate_in_csv_count: usize,
    pub duplicate_existing_count: usize,
    pub preview_rows: Vec<AudiencePreviewRow>,
    pub detected_tags: BTreeSet<String>,
    pub has_email_column: bool,
}

/// Every data row of an import, classified, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedImport {
    pub headers: Vec<String>,
    pub header_index: HeaderIndex,
    /// `true` only when a header resolved to the email field. Rows rescued
    /// by the `@` fallback do not set this.
    pub has_email_column: bool,
    pub rows: Vec<AudiencePreviewRow>,
}

/// Parse `csv_text` and summarise it against the client's known emails.
///
/// Returns `None` when the text has no non-blank line or no header cells.
pub fn parse(csv_text: &str, existing_emails: &HashSet<String>) -> Option<AudienceImportSummary> {
    classify(csv_text, existing_emails).map(|classified| classified.summary())
}

/// Tokenize and classify every data row of `csv_text`.
pub fn classify(csv_text: &str, existing_emails: &HashSet<String>) -> Option<ClassifiedImport> {
    let table = CsvTable::parse(csv_text)?;
    let index = HeaderIndex::resolve(&table.headers);

    // First pass: occurrences of each valid email across the whole file.
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    for row in &table.rows {
        let email = email_cell(row, &index).map(normalize_email).unwrap_or_default();
        if is_valid_email(&email) {
            *occurrences.entry(email).or_default() += 1;
        }
    }

    // Second pass: build the classified rows.
    let rows = table
        .rows
        .iter()
        .map(|row| {
            let source_email = email_cell(row, &index).unwrap_or_default();
            let email = normalize_email(source_email);
            let is_valid_email = is_valid_email(&email);
            let is_duplicate_in_csv =
                is_valid_email && occurrences.get(&email).copied().unwrap_or(0) > 1;
            let is_existing_contact = is_valid_email && existing_emails.contains(&email);

            AudiencePreviewRow {
                line_number: row.line_number,
                first_name: optional_cell(row, index.first_name),
                last_name: optional_cell(row, index.last_name),
                tags: normalize_tags(&optional_cell(row, index.tags)),
                email,
                source_email: source_email.to_string(),
                is_valid_email,
                is_duplicate_in_csv,
                is_existing_contact,
            }
        })
        .collect();

    Some(ClassifiedImport {
        has_email_column: index.email.is_some(),
        headers: table.headers,
        header_index: index,
        rows,
    })
}

impl ClassifiedImport {
    /// Derive the summary counts, detected tags, and bounded preview.
    pub fn summary(&self) -> AudienceImportSummary {
        let valid_rows = self.rows.iter().filter(|r| r.is_valid_email).count();
        let detected_tags = self
            .rows
            .iter()
            .flat_map(|r| r.tags.iter())
            .filter(|tag| tag.as_str() != RESERVED_TAG_ALL)
            .cloned()
            .collect();

        AudienceImportSummary {
            headers: self.headers.clone(),
            total_rows: self.rows.len(),
            valid_rows,
            invalid_rows: self.rows.len() - valid_rows,
            duplicate_in_csv_count: self.rows.iter().filter(|r| r.is_duplicate_in_csv).count(),
            duplicate_existing_count: self.rows.iter().filter(|r| r.is_existing_contact).count(),
            preview_rows: self.rows.iter().take(PREVIEW_ROW_LIMIT).cloned().collect(),
            detected_tags,
            has_email_column: self.has_email_column,
        }
    }

    /// Rows whose email failed validation.
    pub fn invalid_rows(&self) -> impl Iterator<Item = &AudiencePreviewRow> {
        self.rows.iter().filter(|r| !r.is_valid_email)
    }

    /// The invalid rows rendered as a standard contact CSV for correction.
    /// The email cell is written as uploaded so the operator can find it.
    pub fn invalid_rows_csv(&self) -> String {
        let tag_lists: Vec<(&AudiencePreviewRow, Vec<String>)> = self
            .invalid_rows()
            .map(|r| (r, r.tags.iter().cloned().collect()))
            .collect();

        build_contacts_csv(tag_lists.iter().map(|(row, tags)| ContactCsvLine {
            email: &row.source_email,
            first_name: &row.first_name,
            last_name: &row.last_name,
            tags,
        }))
    }
}

/// `true` when `email` (after trimming) has the shape `local@domain.tld`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Normalize an email for comparison and storage.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Split a raw tags cell on `;`, `,`, or `|` into a lower-cased,
/// de-duplicated tag set. Order of first appearance is kept.
pub fn normalize_tags(raw: &str) -> IndexSet<String> {
    raw.split(TAG_SEPARATORS)
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// The row's email: the declared email column if one resolved, otherwise
/// the first cell containing `@`. Empty when neither exists.
/// The email column's cell, or the first cell containing `@` when no
/// header names the email column.
fn email_cell<'a>(row: &'a CsvRow, index: &HeaderIndex) -> Option<&'a str> {
    match index.email {
        Some(column) => row.cell(column),
        None => row.cells.iter().map(String::as_str).find(|c| c.contains('@')),
    }
}

fn optional_cell(row: &CsvRow, column: Option<usize>) -> String {
    column
        .and_then(|c| row.cell(c))
        .map(str::to_string)
        .unwrap_or_default()
}
