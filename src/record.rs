//! Paper record shared by every pipeline stage.

use serde::{Deserialize, Serialize};

/// Column order used by both the CSV store and the Google Sheet.
pub const COLUMNS: &[&str] = &["title", "authors", "year", "doi", "ee", "abstract"];

/// One bibliographic entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Paper title as reported by the index (may be empty)
    #[serde(default)]
    pub title: String,
    /// Author names joined with ", "
    #[serde(default)]
    pub authors: String,
    /// Publication year, kept as text
    #[serde(default)]
    pub year: String,
    /// DOI without resolver prefix, empty when unknown
    #[serde(default)]
    pub doi: String,
    /// Electronic edition URL
    #[serde(default)]
    pub ee: String,
    /// `None` until enrichment; stays `None` when no source had one
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
}

impl PaperRecord {
    /// Identity used for deduplication.
    ///
    /// Lowercased DOI when present, otherwise the lowercased trimmed title.
    pub fn dedup_key(&self) -> String {
        dedup_key(&self.doi, &self.title)
    }

    /// Row values in [`COLUMNS`] order, with a missing abstract as an empty cell.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.authors.clone(),
            self.year.clone(),
            self.doi.clone(),
            self.ee.clone(),
            self.abstract_text.clone().unwrap_or_default(),
        ]
    }
}

/// Compute a dedup key from raw DOI and title values.
pub fn dedup_key(doi: &str, title: &str) -> String {
    if doi.is_empty() {
        title.trim().to_lowercase()
    } else {
        doi.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, doi: &str) -> PaperRecord {
        PaperRecord {
            title: title.to_string(),
            doi: doi.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_doi_key_is_case_insensitive() {
        assert_eq!(
            record("A", "10.1/ABC").dedup_key(),
            record("B", "10.1/abc").dedup_key()
        );
    }

    #[test]
    fn test_title_key_is_trimmed_and_lowercased() {
        assert_eq!(record("  Deep Learning ", "").dedup_key(), "deep learning");
        assert_eq!(
            record("Deep LEARNING", "").dedup_key(),
            record("deep learning  ", "").dedup_key()
        );
    }

    #[test]
    fn test_doi_takes_precedence_over_title() {
        assert_eq!(record("Some Title", "10.1/X").dedup_key(), "10.1/x");
        assert_ne!(
            record("Same Title", "10.1/a").dedup_key(),
            record("Same Title", "10.1/b").dedup_key()
        );
    }

    #[test]
    fn test_doi_is_not_trimmed() {
        // Only titles are normalized for whitespace.
        assert_eq!(dedup_key(" 10.1/A", "t"), " 10.1/a");
    }

    #[test]
    fn test_to_row_blank_abstract() {
        let row = record("T", "10.1/x").to_row();
        assert_eq!(row.len(), COLUMNS.len());
        assert_eq!(row[5], "");
    }
}
