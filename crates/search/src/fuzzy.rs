//! Fuzzy matching.

/// True if every character of `query` appears in `text` in order, not
/// necessarily adjacent. Used as the weakest typeahead signal.
pub fn fuzzy_match(text: &str, query: &str) -> bool {
    let mut remaining = text.chars();
    query
        .chars()
        .all(|wanted| remaining.by_ref().any(|c| c == wanted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzy_in_order() {
        assert!(fuzzy_match("pharmacy", "phrm"));
        assert!(fuzzy_match("bar", ""));
    }

    #[test]
    fn test_fuzzy_out_of_order() {
        assert!(!fuzzy_match("pharmacy", "mph"));
        assert!(!fuzzy_match("bar", "bars"));
    }
}
