use std::collections::HashMap;
use std::ops::Range;

use crate::regex::ast::{ClassKind, EscapeClass, Quantifier, Token, TokenKind};
use crate::regex::parser::Pattern;

/// Group number → byte range of the captured substring.
pub type Captures = HashMap<usize, Range<usize>>;

/// A successful match: the byte span in the subject plus the captures of the
/// winning branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    pub start: usize,
    pub end: usize,
    pub captures: Captures,
}

impl LineMatch {
    pub fn group<'s>(&self, subject: &'s str, number: usize) -> Option<&'s str> {
        self.captures.get(&number).map(|r| &subject[r.clone()])
    }
}

/// Does a single subject character satisfy an atomic token?
fn matches_char(kind: &TokenKind, c: char) -> bool {
    match kind {
        TokenKind::Literal(l) => c == *l,
        TokenKind::Wildcard => true,
        TokenKind::Escape(EscapeClass::Digit) => c.is_ascii_digit(),
        TokenKind::Escape(EscapeClass::Word) => c.is_ascii_alphanumeric() || c == '_',
        TokenKind::Escape(EscapeClass::Literal(l)) => c == *l,
        TokenKind::CharClass(members, ClassKind::Positive) => members.contains(&c),
        TokenKind::CharClass(members, ClassKind::Negative) => !members.contains(&c),
        // Groups and backreferences never match a lone character.
        TokenKind::Group { .. } | TokenKind::Backreference(_) => false,
    }
}

/// Fewest characters the token sequence can consume. `?`-quantified tokens
/// count zero; a group counts the smallest of its alternatives. Used to prune
/// start positions that cannot possibly fit a match.
pub fn min_match_length(tokens: &[Token]) -> usize {
    tokens
        .iter()
        .map(|token| {
            if token.quantifier == Some(Quantifier::ZeroOrOne) {
                return 0;
            }
            match &token.kind {
                TokenKind::Group { alternatives, .. } => alternatives
                    .iter()
                    .map(|alt| min_match_length(alt))
                    .min()
                    .unwrap_or(0),
                _ => 1,
            }
        })
        .sum()
}

/// Consume one character at `pos` if it satisfies the token and fits under
/// `limit`; returns the new cursor.
fn advance_one(subject: &str, pos: usize, limit: usize, kind: &TokenKind) -> Option<usize> {
    let c = subject[pos..limit].chars().next()?;
    if matches_char(kind, c) {
        Some(pos + c.len_utf8())
    } else {
        None
    }
}

/// Cursor positions after consuming 1, 2, … k characters satisfying the
/// token, stopping at the first mismatch or at `limit`.
fn greedy_ends(subject: &str, pos: usize, limit: usize, kind: &TokenKind) -> Vec<usize> {
    let mut ends = Vec::new();
    let mut cursor = pos;
    while let Some(next) = advance_one(subject, cursor, limit, kind) {
        ends.push(next);
        cursor = next;
    }
    ends
}

/// Candidate end positions in `pos..=limit`, longest first. Every returned
/// position is a character boundary.
fn span_ends_desc(subject: &str, pos: usize, limit: usize) -> Vec<usize> {
    let mut ends: Vec<usize> = subject[pos..limit]
        .char_indices()
        .map(|(offset, _)| pos + offset)
        .collect();
    ends.push(limit);
    ends.reverse();
    ends
}

/// The single recursive matching routine.
///
/// Matches `tokens` against `subject` starting at `pos`. The cursor never
/// advances past `limit`; when `exact` is set, the sequence must consume
/// input up to exactly `limit` (this one flag expresses both the end anchor
/// and the bounded sub-match used for group length enumeration).
///
/// Returns the cursor after the match. On failure, `captures` is left
/// exactly as it was; on success it reflects the winning branch only.
fn match_seq(
    subject: &str,
    tokens: &[Token],
    pos: usize,
    limit: usize,
    exact: bool,
    captures: &mut Captures,
) -> Option<usize> {
    let Some((token, rest)) = tokens.split_first() else {
        return if !exact || pos == limit {
            Some(pos)
        } else {
            None
        };
    };

    match &token.kind {
        TokenKind::Group {
            alternatives,
            number,
        } => {
            let snapshot = captures.clone();
            match token.quantifier {
                // One mandatory iteration: each alternative is tried once,
                // greedily, and the tail continues from wherever it ended.
                Some(Quantifier::OneOrMore) => {
                    for alt in alternatives {
                        if let Some(alt_end) =
                            match_seq(subject, alt, pos, limit, false, captures)
                        {
                            captures.insert(*number, pos..alt_end);
                            if let Some(end) =
                                match_seq(subject, rest, alt_end, limit, exact, captures)
                            {
                                return Some(end);
                            }
                        }
                        *captures = snapshot.clone();
                    }
                    None
                }
                // Like the mandatory case, then fall back to skipping the
                // group entirely. A skipped group records no capture.
                Some(Quantifier::ZeroOrOne) => {
                    for alt in alternatives {
                        if let Some(alt_end) =
                            match_seq(subject, alt, pos, limit, false, captures)
                        {
                            captures.insert(*number, pos..alt_end);
                            if let Some(end) =
                                match_seq(subject, rest, alt_end, limit, exact, captures)
                            {
                                return Some(end);
                            }
                        }
                        *captures = snapshot.clone();
                    }
                    match_seq(subject, rest, pos, limit, exact, captures)
                }
                // The group's consumed length is not fixed, and the tail may
                // only succeed for some of them, so every candidate length is
                // tried from longest down to zero via an exact-length
                // sub-match.
                None => {
                    for alt in alternatives {
                        for alt_end in span_ends_desc(subject, pos, limit) {
                            if match_seq(subject, alt, pos, alt_end, true, captures).is_some() {
                                captures.insert(*number, pos..alt_end);
                                if let Some(end) =
                                    match_seq(subject, rest, alt_end, limit, exact, captures)
                                {
                                    return Some(end);
                                }
                            }
                            *captures = snapshot.clone();
                        }
                    }
                    None
                }
            }
        }

        // A backreference must find the referenced group already captured;
        // an unset group is a failed attempt, not an error. A quantifier on
        // a backreference has no effect.
        TokenKind::Backreference(number) => {
            let span = captures.get(number)?.clone();
            let captured = &subject[span];
            let end = pos + captured.len();
            if end > limit || !subject[pos..].starts_with(captured) {
                return None;
            }
            match_seq(subject, rest, end, limit, exact, captures)
        }

        _ => match token.quantifier {
            // Count the maximal run first, then give characters back one at
            // a time until the tail fits.
            Some(Quantifier::OneOrMore) => {
                let ends = greedy_ends(subject, pos, limit, &token.kind);
                for &end in ends.iter().rev() {
                    if let Some(total) = match_seq(subject, rest, end, limit, exact, captures) {
                        return Some(total);
                    }
                }
                None
            }
            // One character before zero.
            Some(Quantifier::ZeroOrOne) => {
                if let Some(end) = advance_one(subject, pos, limit, &token.kind) {
                    if let Some(total) = match_seq(subject, rest, end, limit, exact, captures) {
                        return Some(total);
                    }
                }
                match_seq(subject, rest, pos, limit, exact, captures)
            }
            None => {
                let end = advance_one(subject, pos, limit, &token.kind)?;
                match_seq(subject, rest, end, limit, exact, captures)
            }
        },
    }
}

/// Leftmost match in `subject`, trying candidate start positions in
/// ascending order with a fresh capture map per attempt.
pub fn find_match(pattern: &Pattern, subject: &str) -> Option<LineMatch> {
    find_match_from(pattern, subject, 0)
}

/// Like [`find_match`], but only considers candidate starts at or after
/// `from`. An anchored pattern therefore cannot match once `from > 0`.
pub fn find_match_from(pattern: &Pattern, subject: &str, from: usize) -> Option<LineMatch> {
    let min_len = min_match_length(&pattern.tokens);

    let mut boundaries: Vec<usize> = subject.char_indices().map(|(offset, _)| offset).collect();
    boundaries.push(subject.len());
    let char_count = boundaries.len() - 1;
    if min_len > char_count {
        return None;
    }

    let starts = if pattern.has_start_anchor {
        &boundaries[..1]
    } else {
        &boundaries[..=char_count - min_len]
    };

    for &start in starts {
        if start < from {
            continue;
        }
        let mut captures = Captures::new();
        if let Some(end) = match_seq(
            subject,
            &pattern.tokens,
            start,
            subject.len(),
            pattern.has_end_anchor,
            &mut captures,
        ) {
            return Some(LineMatch {
                start,
                end,
                captures,
            });
        }
    }
    None
}

pub fn contains_match(pattern: &Pattern, subject: &str) -> bool {
    find_match(pattern, subject).is_some()
}
