//! Order-preserving merge of paper lists.

use crate::record::PaperRecord;
use std::collections::HashSet;

/// Collapse `records` to one entry per dedup key.
///
/// The first occurrence of each key wins and output keeps input order.
pub fn merge_deduplicate(records: Vec<PaperRecord>) -> Vec<PaperRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.dedup_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(title: &str, doi: &str, authors: &str) -> PaperRecord {
        PaperRecord {
            title: title.to_string(),
            doi: doi.to_string(),
            authors: authors.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let merged = merge_deduplicate(vec![
            paper("A", "10.1/a", "first"),
            paper("B", "", "b"),
            paper("A again", "10.1/A", "second"),
            paper(" b ", "", "b dup"),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].authors, "first");
        assert_eq!(merged[1].authors, "b");
    }

    #[test]
    fn test_order_preserved() {
        let merged = merge_deduplicate(vec![
            paper("Z", "", ""),
            paper("A", "", ""),
            paper("M", "", ""),
        ]);
        let titles: Vec<_> = merged.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Z", "A", "M"]);
    }

    #[test]
    fn test_idempotent() {
        let input = vec![
            paper("A", "10.1/a", ""),
            paper("a", "", ""),
            paper("A", "", ""),
            paper("x", "10.1/A", ""),
        ];
        let once = merge_deduplicate(input);
        let twice = merge_deduplicate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_titles_collapse() {
        // DOI-less records with empty titles share the empty key.
        let merged = merge_deduplicate(vec![paper("", "", "1"), paper("  ", "", "2")]);
        assert_eq!(merged.len(), 1);
    }
}
