//! Interrogative classifier for popularity tracking.
//!
//! Decides whether a user input "looks like a question" and therefore should
//! feed the popular-prompt counters. Deliberately approximate: an English
//! interrogative lead word or a trailing question mark. The lead-word list is
//! English-only even though the product is bilingual; Indonesian
//! interrogatives ("apakah", "bagaimana") only match via the trailing `?`.
//! That gap is documented rather than fixed, to keep behavioral parity.

/// Lead words that mark an input as interrogative, checked case-insensitively
/// against the first word of the input.
const INTERROGATIVE_LEAD_WORDS: &[&str] = &[
    "what", "who", "when", "where", "why", "how", "is", "are", "can", "could", "would", "will",
    "do", "does", "did", "have", "has", "may", "might",
];

/// True iff the input starts with an interrogative lead word or its trimmed
/// form ends with `?`.
///
/// The "first word" is the longest leading run of ASCII alphanumerics or
/// underscores, mirroring a `\b` word boundary, so "whatever" does not match
/// "what" but "what's" does.
pub fn is_interrogative(input: &str) -> bool {
    let first_word: String = input
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if !first_word.is_empty()
        && INTERROGATIVE_LEAD_WORDS
            .iter()
            .any(|w| first_word.eq_ignore_ascii_case(w))
    {
        return true;
    }

    input.trim().ends_with('?')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wh_question_matches() {
        assert!(is_interrogative("What is the capital of France?"));
        assert!(is_interrogative("why do birds sing"));
        assert!(is_interrogative("HOW does rain form"));
    }

    #[test]
    fn test_aux_verb_lead_matches() {
        assert!(is_interrogative("Can fish sleep"));
        assert!(is_interrogative("does the moon glow"));
        assert!(is_interrogative("is water wet"));
    }

    #[test]
    fn test_statement_does_not_match() {
        assert!(!is_interrogative("capital of france"));
        assert!(!is_interrogative("tell me about volcanoes"));
        assert!(!is_interrogative(""));
    }

    #[test]
    fn test_trailing_question_mark_matches() {
        assert!(is_interrogative("apakah bumi itu bulat?"));
        assert!(is_interrogative("the sky is blue?  "));
    }

    #[test]
    fn test_word_boundary_respected() {
        // "whatever" must not match the lead word "what".
        assert!(!is_interrogative("whatever happens, happens"));
        // An apostrophe ends the first word, so "what's" matches.
        assert!(is_interrogative("what's a black hole"));
    }

    #[test]
    fn test_indonesian_lead_word_gap() {
        // Known gap: Indonesian interrogatives without "?" are not detected.
        assert!(!is_interrogative("bagaimana hujan terbentuk"));
    }
}
