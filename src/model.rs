use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shown in place of a cover when the catalog has none.
pub const PLACEHOLDER_COVER_URL: &str = "https://via.placeholder.com/128x195.png?text=No+Cover";

/// Descriptions longer than this many characters are cut and get an ellipsis.
pub const DESCRIPTION_LIMIT: usize = 180;

pub const DEFAULT_TITLE: &str = "No Title";
pub const DEFAULT_AUTHORS: &str = "Unknown Author";
pub const DEFAULT_PUBLISHER: &str = "Unknown Publisher";
pub const DEFAULT_PUBLISHED_DATE: &str = "Unknown Date";
pub const DEFAULT_DESCRIPTION: &str = "No description available.";
pub const DEFAULT_RATING: &str = "N/A";

/// One normalized search result. Built fresh on every search; every field is
/// already defaulted and display-ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    /// Comma-joined list of author names.
    pub authors: String,
    pub publisher: String,
    pub published_date: String,
    pub description: String,
    /// Upstream sends a number, absent books get `N/A`; rendered as text either way.
    pub rating: String,
    pub cover_url: String,
}

/// What survives of a [`BookRecord`] once saved: the description is dropped
/// on purpose, the shelf shows metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedBook {
    pub title: String,
    pub authors: String,
    pub publisher: String,
    pub published_date: String,
    pub rating: String,
    pub cover_url: String,
    pub saved_at: DateTime<Utc>,
}

impl SavedBook {
    pub fn from_record(record: &BookRecord) -> Self {
        Self {
            title: record.title.clone(),
            authors: record.authors.clone(),
            publisher: record.publisher.clone(),
            published_date: record.published_date.clone(),
            rating: record.rating.clone(),
            cover_url: record.cover_url.clone(),
            saved_at: Utc::now(),
        }
    }
}

/// Cuts a raw catalog description down to [`DESCRIPTION_LIMIT`] characters and
/// marks the cut with an ellipsis. Counts characters, not bytes, so multibyte
/// text never splits mid-codepoint.
pub fn truncate_description(raw: &str) -> String {
    let mut chars = raw.char_indices();
    match chars.nth(DESCRIPTION_LIMIT) {
        Some((byte_end, _)) => format!("{}...", &raw[..byte_end]),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_description_is_untouched() {
        assert_eq!(truncate_description("brief"), "brief");
    }

    #[test]
    fn long_description_is_cut_at_limit_with_ellipsis() {
        let raw = "x".repeat(DESCRIPTION_LIMIT + 40);
        let out = truncate_description(&raw);
        assert_eq!(out.chars().count(), DESCRIPTION_LIMIT + 3);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn exactly_limit_characters_is_untouched() {
        let raw = "y".repeat(DESCRIPTION_LIMIT);
        assert_eq!(truncate_description(&raw), raw);
    }

    #[test]
    fn truncation_respects_multibyte_boundaries() {
        let raw = "ß".repeat(DESCRIPTION_LIMIT + 10);
        let out = truncate_description(&raw);
        assert_eq!(out.chars().count(), DESCRIPTION_LIMIT + 3);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn saved_book_keeps_metadata_and_drops_description() {
        let record = BookRecord {
            title: "Dune".to_string(),
            authors: "Frank Herbert".to_string(),
            publisher: "Chilton".to_string(),
            published_date: "1965".to_string(),
            description: "sand".to_string(),
            rating: "4.5".to_string(),
            cover_url: "http://covers/dune.png".to_string(),
        };

        let saved = SavedBook::from_record(&record);
        assert_eq!(saved.title, record.title);
        assert_eq!(saved.authors, record.authors);
        assert_eq!(saved.publisher, record.publisher);
        assert_eq!(saved.published_date, record.published_date);
        assert_eq!(saved.rating, record.rating);
        assert_eq!(saved.cover_url, record.cover_url);

        let json = serde_json::to_value(&saved).expect("serialize saved book");
        assert!(json.get("description").is_none());
    }
}
