//! Answer normalization used by the keyword guess comparison: case-fold,
//! replace every non-alphanumeric character with a space, then collapse runs
//! of whitespace. Comparison of a guess against the stored answer is therefore
//! insensitive to case, punctuation, and spacing.

/// Normalize a free-text answer for comparison.
pub fn normalize_answer(raw: &str) -> String {
    raw.chars()
        .flat_map(|c| c.to_lowercase())
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a guess matches the stored answer once both are normalized.
pub fn keyword_matches(stored: &str, guess: &str) -> bool {
    let stored = normalize_answer(stored);
    !stored.is_empty() && stored == normalize_answer(guess)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_and_case_are_ignored() {
        assert_eq!(
            normalize_answer("PVOIL  vung-ang!"),
            normalize_answer("pvoil vung ang")
        );
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(normalize_answer("  hello   world  "), "hello world");
    }

    #[test]
    fn matching_is_symmetric_and_rejects_empty_keywords() {
        assert!(keyword_matches("Vung Ang", "vung-ang"));
        assert!(!keyword_matches("Vung Ang", "vung"));
        assert!(!keyword_matches("!!!", "anything"));
    }
}
