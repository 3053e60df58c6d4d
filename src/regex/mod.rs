pub mod ast;
pub mod matcher;
pub mod parser;

pub use ast::{Quantifier, Token, TokenKind};
pub use matcher::{Captures, LineMatch, contains_match, find_match, min_match_length};
pub use parser::{ParseError, Pattern, parse_regex};

/// A compiled pattern together with its case mode.
///
/// Case-insensitivity is ASCII-lowercasing of both sides before parsing and
/// matching; since that is byte-for-byte, spans reported against the
/// normalized subject are valid for the original line too.
#[derive(Debug, Clone)]
pub struct Regex {
    pattern: Pattern,
    ignore_case: bool,
    source: String,
}

impl Regex {
    pub fn new(pattern: &str, ignore_case: bool) -> Result<Self, ParseError> {
        let normalized = if ignore_case {
            pattern.to_ascii_lowercase()
        } else {
            pattern.to_string()
        };
        Ok(Regex {
            pattern: parse_regex(&normalized)?,
            ignore_case,
            source: pattern.to_string(),
        })
    }

    /// The pattern text as the user wrote it.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, subject: &str) -> bool {
        self.find(subject).is_some()
    }

    /// Leftmost match with span and captures.
    pub fn find(&self, subject: &str) -> Option<LineMatch> {
        self.find_from(subject, 0)
    }

    /// Leftmost match starting at or after byte offset `from`.
    pub fn find_from(&self, subject: &str, from: usize) -> Option<LineMatch> {
        if self.ignore_case {
            let lowered = subject.to_ascii_lowercase();
            matcher::find_match_from(&self.pattern, &lowered, from)
        } else {
            matcher::find_match_from(&self.pattern, subject, from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ignore_case_lowers_both_sides() {
        let re = Regex::new("HeLLo", true).unwrap();
        assert!(re.is_match("saying hello there"));
        assert!(re.is_match("HELLO"));
        let sensitive = Regex::new("HeLLo", false).unwrap();
        assert!(!sensitive.is_match("hello"));
    }

    #[test]
    fn ignore_case_spans_index_the_original_line() {
        let re = Regex::new("world", true).unwrap();
        let m = re.find("Hello WORLD").unwrap();
        assert_eq!(&"Hello WORLD"[m.start..m.end], "WORLD");
    }

    #[test]
    fn find_from_enumerates_successive_matches() {
        let re = Regex::new("a+", false).unwrap();
        let first = re.find("baab caa").unwrap();
        assert_eq!((first.start, first.end), (1, 3));
        let second = re.find_from("baab caa", first.end).unwrap();
        assert_eq!((second.start, second.end), (6, 8));
        assert!(re.find_from("baab caa", second.end).is_none());
    }

    #[test]
    fn malformed_patterns_surface_parse_errors() {
        assert!(Regex::new("(ab", false).is_err());
        assert!(Regex::new("[ab", false).is_err());
        assert!(Regex::new("ab\\", false).is_err());
    }

    proptest! {
        // A pattern of plain literals is exactly substring search.
        #[test]
        fn literal_patterns_are_substring_search(
            pattern in "[a-z]{1,6}",
            subject in "[a-z ]{0,16}",
        ) {
            let re = Regex::new(&pattern, false).unwrap();
            prop_assert_eq!(re.is_match(&subject), subject.contains(&pattern));
        }

        // Same inputs, same verdict and same span.
        #[test]
        fn matching_is_deterministic(
            pattern in "[a-z.+?]{1,8}",
            subject in "[a-z]{0,12}",
        ) {
            let re = Regex::new(&pattern, false).unwrap();
            let first = re.find(&subject).map(|m| (m.start, m.end));
            let second = re.find(&subject).map(|m| (m.start, m.end));
            prop_assert_eq!(first, second);
        }

        // ignore_case is equivalent to lowercasing both sides up front.
        #[test]
        fn ignore_case_equals_prelowering(
            pattern in "[a-zA-Z]{1,5}",
            subject in "[a-zA-Z]{0,12}",
        ) {
            let insensitive = Regex::new(&pattern, true).unwrap();
            let lowered = Regex::new(&pattern.to_ascii_lowercase(), false).unwrap();
            prop_assert_eq!(
                insensitive.is_match(&subject),
                lowered.is_match(&subject.to_ascii_lowercase())
            );
        }

        // Anchoring can only ever shrink the set of matching subjects.
        #[test]
        fn anchors_are_monotone(
            pattern in "[a-z]{1,5}",
            subject in "[a-z]{0,10}",
        ) {
            let plain = Regex::new(&pattern, false).unwrap();
            let anchored = Regex::new(&format!("^{pattern}"), false).unwrap();
            if anchored.is_match(&subject) {
                prop_assert!(plain.is_match(&subject));
            }
        }
    }
}
