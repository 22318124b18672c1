//! Maps free-form CSV header spellings onto the contact fields the
//! importer understands.

use serde::Serialize;

/// Accepted spellings for the email column, after normalization.
pub const EMAIL_SYNONYMS: &[&str] = &["email", "emailaddress", "eaddress"];

/// Accepted spellings for the first-name column, after normalization.
pub const FIRST_NAME_SYNONYMS: &[&str] = &["firstname", "fname", "first"];

/// Accepted spellings for the last-name column, after normalization.
pub const LAST_NAME_SYNONYMS: &[&str] = &["lastname", "lname", "last"];

/// Accepted spellings for the tags column, after normalization.
pub const TAG_SYNONYMS: &[&str] = &["tags", "tag", "segment", "segments", "group", "groups"];

/// A contact field the importer can read from a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContactField {
    Email,
    FirstName,
    LastName,
    Tags,
}

impl ContactField {
    fn synonyms(self) -> &'static [&'static str] {
        match self {
            Self::Email => EMAIL_SYNONYMS,
            Self::FirstName => FIRST_NAME_SYNONYMS,
            Self::LastName => LAST_NAME_SYNONYMS,
            Self::Tags => TAG_SYNONYMS,
        }
    }
}

/// Column index of each recognised field, built once per parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeaderIndex {
    pub email: Option<usize>,
    pub first_name: Option<usize>,
    pub last_name: Option<usize>,
    pub tags: Option<usize>,
}

impl HeaderIndex {
    /// Resolve each field to the first header whose normalized spelling
    /// is one of that field's synonyms.
    pub fn resolve(headers: &[String]) -> Self {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        let find = |field: ContactField| {
            normalized
                .iter()
                .position(|h| field.synonyms().contains(&h.as_str()))
        };

        Self {
            email: find(ContactField::Email),
            first_name: find(ContactField::FirstName),
            last_name: find(ContactField::LastName),
            tags: find(ContactField::Tags),
        }
    }
}

/// Lower-case a header and keep only ASCII letters and digits, so
/// `"E-mail Address"` and `"email_address"` both become `"emailaddress"`.
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(normalize_header("E-mail Address"), "emailaddress");
        assert_eq!(normalize_header("First_Name"), "firstname");
        assert_eq!(normalize_header("  TAGS  "), "tags");
        assert_eq!(normalize_header("#!"), "");
    }

    #[test]
    fn normalize_drops_non_ascii_letters() {
        assert_eq!(normalize_header("emailé"), "email");
        assert_eq!(normalize_header("Prénom"), "prnom");
        let index = HeaderIndex::resolve(&headers(&["Téléphone", "E-mailé"]));
        assert_eq!(index.email, Some(1));
    }

    #[test]
    fn resolves_standard_headers() {
        let index = HeaderIndex::resolve(&headers(&["email", "first_name", "last_name", "tags"]));
        assert_eq!(
            index,
            HeaderIndex {
                email: Some(0),
                first_name: Some(1),
                last_name: Some(2),
                tags: Some(3),
            }
        );
    }

    #[test]
    fn resolves_synonyms_in_any_order() {
        let index = HeaderIndex::resolve(&headers(&["Group", "LName", "E Address", "fname"]));
        assert_eq!(index.tags, Some(0));
        assert_eq!(index.last_name, Some(1));
        assert_eq!(index.email, Some(2));
        assert_eq!(index.first_name, Some(3));
    }

    #[test]
    fn first_matching_column_wins() {
        let index = HeaderIndex::resolve(&headers(&["Email", "Email Address"]));
        assert_eq!(index.email, Some(0));
    }

    #[test]
    fn unmatched_fields_are_none() {
        let index = HeaderIndex::resolve(&headers(&["phone", "company"]));
        assert_eq!(index, HeaderIndex::default());
    }

    #[test]
    fn partial_words_do_not_match() {
        let index = HeaderIndex::resolve(&headers(&["emails", "first name of spouse"]));
        assert_eq!(index.email, None);
        assert_eq!(index.first_name, None);
    }
}
