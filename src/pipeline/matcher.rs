//! Cross-document name check.

/// Whether the trimmed `name` appears verbatim in `full_text`.
///
/// Case-sensitive, no accent folding, no whitespace normalisation inside the
/// name. A blank name is a substring of anything, so callers skip the check
/// when no name was located.
pub fn name_in_text(name: &str, full_text: &str) -> bool {
    full_text.contains(name.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_case_matches() {
        assert!(name_in_text(
            "Maria Silva",
            "Conta de energia Maria Silva RUA das Flores, 123"
        ));
    }

    #[test]
    fn different_case_does_not_match() {
        assert!(!name_in_text("Maria Silva", "Conta de energia MARIA SILVA RUA A"));
    }

    #[test]
    fn name_is_trimmed() {
        assert!(name_in_text("  Maria Silva \n", "Titular: Maria Silva"));
    }

    #[test]
    fn diacritics_are_significant() {
        assert!(!name_in_text("José Souza", "Titular: Jose Souza"));
    }

    #[test]
    fn blank_name_is_a_substring_of_any_text() {
        assert!(name_in_text("   ", "anything at all"));
        assert!(name_in_text("", ""));
    }
}
