//! Keyword relevance scoring over the snippet catalog.
//!
//! # Scoring Algorithm
//!
//! 1. Lower-case the query once.
//! 2. Score each record by the number of its keywords that occur as a
//!    substring of the query (`"tables"` matches keyword `"table"`).
//! 3. Keep records with a score above zero, or whose title contains the
//!    whole query.
//! 4. Stable sort by score (desc); equal scores keep catalog order.
//!
//! Results are unbounded; callers truncate (see [`MAX_COMBINED_SNIPPETS`]).

use crate::models::{ScoredSnippet, SnippetRecord};

/// Maximum number of ranked snippets forwarded for combination.
pub const MAX_COMBINED_SNIPPETS: usize = 3;

/// Rank `records` against `query`.
///
/// A blank query returns no results. Without that guard the title check
/// would match every record, since every title contains the empty string.
pub fn search(query: &str, records: &[SnippetRecord]) -> Vec<ScoredSnippet> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let query_lower = query.to_lowercase();

    let mut results: Vec<ScoredSnippet> = records
        .iter()
        .filter_map(|record| {
            let score = keyword_score(&query_lower, record);
            // Direction matters: the title must contain the query, not the reverse.
            let title_hit = record.title.to_lowercase().contains(&query_lower);
            (score > 0 || title_hit).then(|| ScoredSnippet {
                record: record.clone(),
                relevance_score: score,
            })
        })
        .collect();

    // `sort_by` is stable.
    results.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
    results
}

/// Count the record's keywords contained in the (already lower-cased) query.
fn keyword_score(query_lower: &str, record: &SnippetRecord) -> u32 {
    record
        .keywords
        .iter()
        .filter(|k| query_lower.contains(&k.to_lowercase()))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::builtin_snippets;

    fn record(title: &str, keywords: &[&str]) -> SnippetRecord {
        SnippetRecord::new(title, keywords, "return nil")
    }

    fn titles(results: &[ScoredSnippet]) -> Vec<&str> {
        results.iter().map(|r| r.record.title.as_str()).collect()
    }

    #[test]
    fn test_empty_catalog() {
        assert!(search("table", &[]).is_empty());
    }

    #[test]
    fn test_blank_query_returns_nothing() {
        let records = builtin_snippets();
        assert!(search("", &records).is_empty());
        assert!(search("   ", &records).is_empty());
    }

    #[test]
    fn test_keyword_hit_is_case_insensitive() {
        let records = builtin_snippets();
        let results = search("How do I READ a FILE?", &records);
        assert_eq!(results[0].record.title, "File Operations");
        assert_eq!(results[0].relevance_score, 2);
    }

    #[test]
    fn test_substring_not_word_boundary() {
        let records = vec![record("T", &["table"])];
        let results = search("tables please", &records);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].relevance_score, 1);
    }

    #[test]
    fn test_keyword_case_is_normalized() {
        let records = vec![record("T", &["JSON"])];
        assert_eq!(search("parse json", &records)[0].relevance_score, 1);
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(search("banana", &builtin_snippets()).is_empty());
    }

    #[test]
    fn test_title_contains_query() {
        let records = vec![record("Math Utilities", &["zzz"])];
        let results = search("math util", &records);
        assert_eq!(titles(&results), vec!["Math Utilities"]);
        assert_eq!(results[0].relevance_score, 0);
    }

    #[test]
    fn test_query_containing_title_does_not_match() {
        // Reverse direction: the query contains the title, not vice versa.
        let records = vec![record("Queue", &["zzz"])];
        assert!(search("I need a queue implementation", &records).is_empty());
    }

    #[test]
    fn test_sorted_by_score_desc() {
        let records = builtin_snippets();
        let results = search("read a file and split the string text", &records);
        assert_eq!(titles(&results), vec!["String Functions", "File Operations"]);
        assert_eq!(results[0].relevance_score, 3);
        assert_eq!(results[1].relevance_score, 2);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let records = vec![
            record("A", &["alpha"]),
            record("B", &["beta"]),
            record("C", &["alpha", "beta"]),
            record("D", &["delta"]),
        ];
        let results = search("alpha beta delta", &records);
        assert_eq!(titles(&results), vec!["C", "A", "B", "D"]);
    }
}
