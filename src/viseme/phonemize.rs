//! Heuristic character-pattern phonemizer.
//!
//! This is not a grapheme-to-phoneme engine. Text is scanned left to right;
//! a small set of digraphs wins over single letters at the same position,
//! every other ASCII letter becomes its own token, and everything else is
//! skipped.

use std::fmt;

/// Digraphs tested before single letters, in priority order.
const DIGRAPHS: [&str; 5] = ["TH", "SH", "CH", "OO", "EE"];

const LETTERS: [&str; 26] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S",
    "T", "U", "V", "W", "X", "Y", "Z",
];

/// A phoneme tag produced by [`extract_phonemes`].
///
/// The set is closed: one of the five digraphs or a single uppercase ASCII
/// letter. Tokens are not validated against the viseme table here; a token
/// with no entry resolves to the rest pose at lookup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhonemeToken(&'static str);

impl PhonemeToken {
    /// The token's tag, e.g. `"TH"` or `"A"`.
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// True for the two-letter priority tokens.
    pub fn is_digraph(&self) -> bool {
        self.0.len() == 2
    }

    fn letter(c: char) -> Option<Self> {
        if c.is_ascii_uppercase() {
            Some(Self(LETTERS[(c as u8 - b'A') as usize]))
        } else {
            None
        }
    }

    fn digraph(first: char, second: char) -> Option<Self> {
        DIGRAPHS
            .iter()
            .find(|d| {
                let mut it = d.chars();
                it.next() == Some(first) && it.next() == Some(second)
            })
            .map(|d| Self(*d))
    }
}

impl fmt::Display for PhonemeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl PartialEq<&str> for PhonemeToken {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Convert text into an ordered sequence of phoneme tokens.
///
/// Pure and total: never fails, never filters against the viseme table, and
/// the result is never longer than the number of characters in `text`.
pub fn extract_phonemes(text: &str) -> Vec<PhonemeToken> {
    let chars: Vec<char> = text.chars().map(|c| c.to_ascii_uppercase()).collect();
    let mut tokens = Vec::with_capacity(chars.len());

    let mut i = 0;
    while i < chars.len() {
        if let Some(&next) = chars.get(i + 1) {
            if let Some(token) = PhonemeToken::digraph(chars[i], next) {
                tokens.push(token);
                i += 2;
                continue;
            }
        }
        if let Some(token) = PhonemeToken::letter(chars[i]) {
            tokens.push(token);
        }
        i += 1;
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(text: &str) -> Vec<&'static str> {
        extract_phonemes(text).iter().map(|t| t.as_str()).collect()
    }

    #[test]
    fn digraph_wins_over_single_letters() {
        assert_eq!(tags("THIN"), vec!["TH", "I", "N"]);
    }

    #[test]
    fn digits_and_punctuation_yield_nothing() {
        assert!(extract_phonemes("123!").is_empty());
        assert!(extract_phonemes("").is_empty());
        assert!(extract_phonemes("  ...  ").is_empty());
    }

    #[test]
    fn lowercase_is_uppercased() {
        assert_eq!(tags("moon"), vec!["M", "OO", "N"]);
    }

    #[test]
    fn scan_is_greedy_left_to_right() {
        // "SHH" -> SH then H; "EEE" -> EE then E.
        assert_eq!(tags("SHH"), vec!["SH", "H"]);
        assert_eq!(tags("EEE"), vec!["EE", "E"]);
    }

    #[test]
    fn digraph_does_not_span_separators() {
        assert_eq!(tags("T H"), vec!["T", "H"]);
    }

    #[test]
    fn every_digraph_is_recognised() {
        assert_eq!(tags("th sh ch oo ee"), vec!["TH", "SH", "CH", "OO", "EE"]);
        assert!(extract_phonemes("CH").iter().all(PhonemeToken::is_digraph));
    }

    #[test]
    fn non_ascii_letters_are_skipped() {
        assert_eq!(tags("café"), vec!["C", "A", "F"]);
        assert_eq!(tags("naïve"), vec!["N", "A", "V", "E"]);
    }

    #[test]
    fn sentence_with_mixed_content() {
        assert_eq!(tags("Hi, I'm 3!"), vec!["H", "I", "I", "M"]);
    }

    #[test]
    fn length_never_exceeds_input() {
        for text in ["", "a", "THE CHEESE", "!!??", "ööö", "The quick brown fox 42"] {
            assert!(extract_phonemes(text).len() <= text.chars().count());
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let text = "She sells sea shells by the shore";
        assert_eq!(extract_phonemes(text), extract_phonemes(text));
    }

    #[test]
    fn display_matches_tag() {
        let tokens = extract_phonemes("sh");
        assert_eq!(tokens[0].to_string(), "SH");
        assert_eq!(tokens[0], "SH");
    }
}
