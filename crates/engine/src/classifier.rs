//! Grammar verdict parsing
//!
//! The grammar check asks the model for a one-word YES/NO answer, but
//! models pad verdicts with explanations. The first standalone YES or NO
//! word decides; a YES buried later in an explanation cannot override an
//! up-front NO, and substrings like "eyes" never match.

use once_cell::sync::Lazy;
use regex::Regex;

static VERDICT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(yes|no)\b").expect("verdict pattern compiles"));

/// Whether a grammar-check answer reports an error.
///
/// No standalone YES/NO at all reads as "no error": an unparseable
/// verdict must not send a clean sentence into correction.
pub fn parse_verdict(text: &str) -> bool {
    VERDICT
        .find(text)
        .map(|m| m.as_str().eq_ignore_ascii_case("yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_verdicts() {
        assert!(parse_verdict("YES"));
        assert!(parse_verdict("yes"));
        assert!(!parse_verdict("NO"));
        assert!(!parse_verdict("No."));
    }

    #[test]
    fn test_verdict_with_explanation() {
        assert!(parse_verdict("Yes, the verb does not agree with the subject."));
        assert!(!parse_verdict("No, this sentence is correct."));
    }

    #[test]
    fn test_first_token_wins() {
        assert!(!parse_verdict("No. If you had written \"I eats\", the answer would be yes."));
        assert!(parse_verdict("YES - although one could say no real meaning changes."));
    }

    #[test]
    fn test_substrings_do_not_match() {
        assert!(!parse_verdict("Keyes and Reynolds wrote about eyes."));
        assert!(!parse_verdict("nothing notable"));
    }

    #[test]
    fn test_punctuation_adjacent_verdicts() {
        assert!(parse_verdict("YES!"));
        assert!(parse_verdict("(yes)"));
        assert!(!parse_verdict("\"no\""));
    }

    #[test]
    fn test_unparseable_defaults_to_no_error() {
        assert!(!parse_verdict(""));
        assert!(!parse_verdict("   "));
        assert!(!parse_verdict("The sentence looks fine to me."));
    }
}
