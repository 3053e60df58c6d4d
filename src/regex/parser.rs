use thiserror::Error;

use crate::regex::ast::{ClassKind, EscapeClass, Quantifier, Token, TokenKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unmatched '(' in pattern")]
    UnbalancedGroup,
    #[error("unterminated character class in pattern")]
    UnterminatedClass,
    #[error("trailing '\\' with nothing to escape")]
    DanglingEscape,
    #[error("invalid backreference number")]
    InvalidBackreference,
}

/// A parsed pattern: the token sequence, the anchor flags, and how many
/// capture groups were assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub tokens: Vec<Token>,
    pub has_start_anchor: bool,
    pub has_end_anchor: bool,
    pub group_count: usize,
}

pub fn parse_regex(pattern: &str) -> Result<Pattern, ParseError> {
    let mut group_counter = 0;
    let (tokens, has_start_anchor, has_end_anchor) = parse_with_counter(pattern, &mut group_counter)?;
    Ok(Pattern {
        tokens,
        has_start_anchor,
        has_end_anchor,
        group_count: group_counter,
    })
}

/// Recursive entry point. Group alternatives are parsed through here as well,
/// sharing `group_counter` so that numbering stays monotonic across nesting;
/// anchors peeled off an alternative are discarded.
fn parse_with_counter(
    pattern: &str,
    group_counter: &mut usize,
) -> Result<(Vec<Token>, bool, bool), ParseError> {
    let has_start_anchor = pattern.starts_with('^');
    let has_end_anchor = pattern.ends_with('$');

    let mut body = pattern;
    if has_start_anchor {
        body = &body[1..];
    }
    if has_end_anchor {
        body = &body[..body.len() - 1];
    }

    let chars: Vec<char> = body.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                if i + 1 >= chars.len() {
                    return Err(ParseError::DanglingEscape);
                }
                if chars[i + 1].is_ascii_digit() {
                    // Consume the digit run maximally: \12 is group 12.
                    let mut end = i + 1;
                    while end < chars.len() && chars[end].is_ascii_digit() {
                        end += 1;
                    }
                    let digits: String = chars[i + 1..end].iter().collect();
                    let number: usize = digits
                        .parse()
                        .map_err(|_| ParseError::InvalidBackreference)?;
                    if number == 0 {
                        return Err(ParseError::InvalidBackreference);
                    }
                    tokens.push(Token::new(TokenKind::Backreference(number)));
                    i = end;
                } else {
                    let class = match chars[i + 1] {
                        'd' => EscapeClass::Digit,
                        'w' => EscapeClass::Word,
                        other => EscapeClass::Literal(other),
                    };
                    tokens.push(Token::new(TokenKind::Escape(class)));
                    i += 2;
                }
            }
            '[' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&c| c == ']')
                    .map(|rel| i + 1 + rel)
                    .ok_or(ParseError::UnterminatedClass)?;
                let mut members = &chars[i + 1..close];
                let kind = if members.first() == Some(&'^') {
                    members = &members[1..];
                    ClassKind::Negative
                } else {
                    ClassKind::Positive
                };
                tokens.push(Token::new(TokenKind::CharClass(members.to_vec(), kind)));
                i = close + 1;
            }
            '.' => {
                tokens.push(Token::new(TokenKind::Wildcard));
                i += 1;
            }
            '(' => {
                // The group's number is assigned before descending, so an
                // enclosing group always numbers lower than its children.
                *group_counter += 1;
                let number = *group_counter;

                let close = find_matching_paren(&chars, i)?;
                let group_body: String = chars[i + 1..close].iter().collect();

                let mut alternatives = Vec::new();
                for alt in split_alternatives(&group_body) {
                    let (alt_tokens, _, _) = parse_with_counter(&alt, group_counter)?;
                    alternatives.push(alt_tokens);
                }
                tokens.push(Token::new(TokenKind::Group {
                    alternatives,
                    number,
                }));
                i = close + 1;
            }
            other => {
                tokens.push(Token::new(TokenKind::Literal(other)));
                i += 1;
            }
        }

        // A '+' or '?' right after a token decorates that token. Quantifiers
        // never stand alone, and a second one in a row parses as a literal.
        if i < chars.len() {
            let quantifier = match chars[i] {
                '+' => Some(Quantifier::OneOrMore),
                '?' => Some(Quantifier::ZeroOrOne),
                _ => None,
            };
            if quantifier.is_some() {
                if let Some(last) = tokens.last_mut() {
                    last.quantifier = quantifier;
                }
                i += 1;
            }
        }
    }

    Ok((tokens, has_start_anchor, has_end_anchor))
}

/// Index of the `)` closing the `(` at `open`, tracked by nesting depth.
fn find_matching_paren(chars: &[char], open: usize) -> Result<usize, ParseError> {
    let mut depth = 1;
    let mut i = open + 1;
    while i < chars.len() {
        match chars[i] {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(ParseError::UnbalancedGroup)
}

/// Splits a group body on `|` characters at parenthesis depth zero. Bracket
/// classes do not affect the depth.
fn split_alternatives(body: &str) -> Vec<String> {
    let mut alternatives = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in body.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            '|' if depth == 0 => {
                alternatives.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    alternatives.push(current);
    alternatives
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<&TokenKind> {
        tokens.iter().map(|t| &t.kind).collect()
    }

    #[test]
    fn detects_start_and_end_anchors() {
        let p = parse_regex("^abc$").unwrap();
        assert!(p.has_start_anchor);
        assert!(p.has_end_anchor);
        assert_eq!(
            kinds(&p.tokens),
            vec![
                &TokenKind::Literal('a'),
                &TokenKind::Literal('b'),
                &TokenKind::Literal('c'),
            ]
        );
    }

    #[test]
    fn anchors_absent_by_default() {
        let p = parse_regex("abc").unwrap();
        assert!(!p.has_start_anchor);
        assert!(!p.has_end_anchor);
    }

    #[test]
    fn parses_escape_sequences() {
        let p = parse_regex(r"\d\w\+").unwrap();
        assert_eq!(
            kinds(&p.tokens),
            vec![
                &TokenKind::Escape(EscapeClass::Digit),
                &TokenKind::Escape(EscapeClass::Word),
                &TokenKind::Escape(EscapeClass::Literal('+')),
            ]
        );
    }

    #[test]
    fn parses_character_classes() {
        let p = parse_regex("[abc][^xyz]").unwrap();
        assert_eq!(
            kinds(&p.tokens),
            vec![
                &TokenKind::CharClass(vec!['a', 'b', 'c'], ClassKind::Positive),
                &TokenKind::CharClass(vec!['x', 'y', 'z'], ClassKind::Negative),
            ]
        );
    }

    #[test]
    fn parses_groups_and_alternation_with_numbering() {
        let p = parse_regex("(ab|cd)(e(f|g))").unwrap();
        assert_eq!(p.tokens.len(), 2);
        assert_eq!(p.group_count, 3);

        let TokenKind::Group {
            alternatives: first_alts,
            number: first_number,
        } = &p.tokens[0].kind
        else {
            panic!("expected group, got {:?}", p.tokens[0]);
        };
        assert_eq!(*first_number, 1);
        assert_eq!(first_alts.len(), 2);
        assert_eq!(
            kinds(&first_alts[0]),
            vec![&TokenKind::Literal('a'), &TokenKind::Literal('b')]
        );
        assert_eq!(
            kinds(&first_alts[1]),
            vec![&TokenKind::Literal('c'), &TokenKind::Literal('d')]
        );

        let TokenKind::Group {
            alternatives: second_alts,
            number: second_number,
        } = &p.tokens[1].kind
        else {
            panic!("expected group, got {:?}", p.tokens[1]);
        };
        assert_eq!(*second_number, 2);
        assert_eq!(second_alts.len(), 1);
        // The nested group numbers after its enclosing group.
        let TokenKind::Group { number, .. } = &second_alts[0][1].kind else {
            panic!("expected nested group");
        };
        assert_eq!(*number, 3);
    }

    #[test]
    fn splits_only_top_level_alternatives() {
        let p = parse_regex("(stricter|(gun|laws))").unwrap();
        let TokenKind::Group { alternatives, .. } = &p.tokens[0].kind else {
            panic!("expected group");
        };
        assert_eq!(alternatives.len(), 2);
        // The inner pipe stays inside the nested group.
        assert_eq!(alternatives[1].len(), 1);
        let TokenKind::Group {
            alternatives: inner,
            number,
        } = &alternatives[1][0].kind
        else {
            panic!("expected nested group");
        };
        assert_eq!(*number, 2);
        assert_eq!(inner.len(), 2);
    }

    #[test]
    fn applies_quantifiers_to_previous_token() {
        let p = parse_regex("a+b?").unwrap();
        assert_eq!(p.tokens.len(), 2);
        assert_eq!(p.tokens[0].kind, TokenKind::Literal('a'));
        assert_eq!(p.tokens[0].quantifier, Some(Quantifier::OneOrMore));
        assert_eq!(p.tokens[1].kind, TokenKind::Literal('b'));
        assert_eq!(p.tokens[1].quantifier, Some(Quantifier::ZeroOrOne));
    }

    #[test]
    fn quantifier_applies_to_group() {
        let p = parse_regex("(ab)?c").unwrap();
        assert!(matches!(p.tokens[0].kind, TokenKind::Group { .. }));
        assert_eq!(p.tokens[0].quantifier, Some(Quantifier::ZeroOrOne));
        assert_eq!(p.tokens[1].quantifier, None);
    }

    #[test]
    fn second_quantifier_in_a_row_is_a_literal() {
        let p = parse_regex("a++").unwrap();
        assert_eq!(p.tokens.len(), 2);
        assert_eq!(p.tokens[0].quantifier, Some(Quantifier::OneOrMore));
        assert_eq!(p.tokens[1].kind, TokenKind::Literal('+'));
        assert_eq!(p.tokens[1].quantifier, None);
    }

    #[test]
    fn parses_backreference_tokens() {
        let p = parse_regex(r"(ab)\1").unwrap();
        assert!(matches!(p.tokens[0].kind, TokenKind::Group { number: 1, .. }));
        assert_eq!(p.tokens[1].kind, TokenKind::Backreference(1));
    }

    #[test]
    fn backreference_digit_run_is_maximal() {
        let p = parse_regex(r"\12").unwrap();
        assert_eq!(p.tokens.len(), 1);
        assert_eq!(p.tokens[0].kind, TokenKind::Backreference(12));
    }

    #[test]
    fn rejects_unbalanced_group() {
        assert_eq!(parse_regex("(ab"), Err(ParseError::UnbalancedGroup));
        assert_eq!(parse_regex("(a(b)"), Err(ParseError::UnbalancedGroup));
    }

    #[test]
    fn stray_closing_paren_is_a_literal() {
        let p = parse_regex("a)b").unwrap();
        assert_eq!(p.tokens[1].kind, TokenKind::Literal(')'));
    }

    #[test]
    fn rejects_unterminated_class() {
        assert_eq!(parse_regex("[abc"), Err(ParseError::UnterminatedClass));
    }

    #[test]
    fn rejects_dangling_escape() {
        assert_eq!(parse_regex("abc\\"), Err(ParseError::DanglingEscape));
    }

    #[test]
    fn rejects_backreference_to_group_zero() {
        assert_eq!(parse_regex(r"(a)\0"), Err(ParseError::InvalidBackreference));
    }

    #[test]
    fn reparsing_yields_identical_structure() {
        let first = parse_regex(r"^(cat|dog)s?\1[xyz]$").unwrap();
        let second = parse_regex(r"^(cat|dog)s?\1[xyz]$").unwrap();
        assert_eq!(first, second);
    }
}
