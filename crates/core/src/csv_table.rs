//! Comma-separated text tokenizing and rendering.
//!
//! Supports the one dialect the audience importer accepts: comma
//! separators, double-quote wrapping, and `""` as an escaped quote inside
//! a quoted field. Line breaks inside quoted fields are not supported
//! because input is split on newlines before tokenizing.

use std::borrow::Cow;

use serde::Serialize;

/// Header for the standard contact CSV (export and invalid-row download).
pub const CONTACT_CSV_HEADERS: &[&str] = &["email", "first_name", "last_name", "tags"];

/// Separator used when joining a tag set into a single CSV cell.
pub const TAG_JOIN_SEPARATOR: &str = ";";

/// One data row of a tokenized CSV document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvRow {
    /// Position in the normalized document, counting the header as line 1.
    pub line_number: usize,
    pub cells: Vec<String>,
}

impl CsvRow {
    /// Cell at `index`, or `None` when the row is shorter than that.
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }
}

/// A header row plus its data rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<CsvRow>,
}

impl CsvTable {
    /// Tokenize raw CSV text.
    ///
    /// Carriage returns are stripped, lines are trimmed, and blank lines
    /// are dropped before the first remaining line is taken as the header.
    /// Returns `None` when no line survives or the header yields no cells.
    pub fn parse(text: &str) -> Option<Self> {
        let normalized = text.replace('\r', "");
        let mut lines = normalized
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty());

        let headers = parse_csv_line(lines.next()?);
        if headers.is_empty() {
            return None;
        }

        let rows = lines
            .enumerate()
            .map(|(index, line)| CsvRow {
                line_number: index + 2,
                cells: parse_csv_line(line),
            })
            .collect();

        Some(Self { headers, rows })
    }
}

/// Split a single CSV line into trimmed fields.
///
/// A `"` outside a quoted field opens one; inside a quoted field `""`
/// yields a literal quote and a lone `"` closes it. Commas inside quotes
/// are literal.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    if line.is_empty() {
        return Vec::new();
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            other => current.push(other),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Quote a cell when it holds a separator, a quote, or a line break.
/// Plain cells are returned as-is.
pub fn csv_escape(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// A borrowed view of one contact for CSV rendering.
#[derive(Debug, Clone, Copy)]
pub struct ContactCsvLine<'a> {
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub tags: &'a [String],
}

/// Render contacts as CSV with the [`CONTACT_CSV_HEADERS`] column order.
///
/// Tags are joined with `;` so the output re-imports cleanly.
pub fn build_contacts_csv<'a, I>(rows: I) -> String
where
    I: IntoIterator<Item = ContactCsvLine<'a>>,
{
    let mut lines = vec![CONTACT_CSV_HEADERS.join(",")];

    for row in rows {
        let tags = row.tags.join(TAG_JOIN_SEPARATOR);
        let cells = [row.email, row.first_name, row.last_name, tags.as_str()];
        lines.push(
            cells
                .iter()
                .map(|cell| csv_escape(cell))
                .collect::<Vec<_>>()
                .join(","),
        );
    }

    lines.join("\n")
}
