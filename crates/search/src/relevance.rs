//! Relevance scoring for typeahead matches.

use unicode_segmentation::UnicodeSegmentation;

/// Relevance score levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelevanceScore {
    /// No match
    None = 0,
    /// Query characters appear in order
    Fuzzy = 10,
    /// Contains substring
    Contains = 20,
    /// Some word starts with the query
    WordBoundary = 30,
    /// Starts with query
    StartsWith = 40,
    /// Exact match
    Exact = 50,
}

impl RelevanceScore {
    /// True for substring-or-better matches
    pub fn is_substring_match(self) -> bool {
        self >= Self::Contains
    }
}

/// Score `text` against `query`, case-insensitively.
///
/// An empty query matches nothing.
pub fn calculate_relevance(text: &str, query: &str) -> RelevanceScore {
    let text_lower = text.to_lowercase();
    let query_lower = query.trim().to_lowercase();

    if query_lower.is_empty() {
        return RelevanceScore::None;
    }

    if text_lower == query_lower {
        return RelevanceScore::Exact;
    }

    if text_lower.starts_with(&query_lower) {
        return RelevanceScore::StartsWith;
    }

    if text_lower
        .unicode_words()
        .any(|word| word.starts_with(&query_lower))
    {
        return RelevanceScore::WordBoundary;
    }

    if text_lower.contains(&query_lower) {
        return RelevanceScore::Contains;
    }

    if crate::fuzzy::fuzzy_match(&text_lower, &query_lower) {
        return RelevanceScore::Fuzzy;
    }

    RelevanceScore::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert_eq!(calculate_relevance("Cafe", "cafe"), RelevanceScore::Exact);
    }

    #[test]
    fn test_starts_with() {
        assert_eq!(calculate_relevance("Fast Food", "fast"), RelevanceScore::StartsWith);
    }

    #[test]
    fn test_word_boundary() {
        assert_eq!(calculate_relevance("Ice Cream", "cream"), RelevanceScore::WordBoundary);
        assert_eq!(calculate_relevance("Place of Worship", "wor"), RelevanceScore::WordBoundary);
    }

    #[test]
    fn test_contains() {
        assert_eq!(calculate_relevance("Supermarket", "market"), RelevanceScore::Contains);
    }

    #[test]
    fn test_fuzzy_is_not_substring() {
        let score = calculate_relevance("Restaurant", "rstnt");
        assert_eq!(score, RelevanceScore::Fuzzy);
        assert!(!score.is_substring_match());
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(calculate_relevance("Cafe", "  "), RelevanceScore::None);
    }
}
