/// Quantifier attached to a token. Absence means exactly-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    OneOrMore, // +
    ZeroOrOne, // ?
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Positive, // [abc]
    Negative, // [^abc]
}

/// Resolved form of a two-character escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeClass {
    Digit,         // \d
    Word,          // \w
    Literal(char), // \. \+ \\ and friends
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Literal(char),
    Wildcard,
    Escape(EscapeClass),
    CharClass(Vec<char>, ClassKind),
    /// `|`-separated alternatives plus this group's capture number (1-based,
    /// assigned in order of opening parentheses).
    Group {
        alternatives: Vec<Vec<Token>>,
        number: usize,
    },
    Backreference(usize),
}

/// One element of a parsed pattern: a kind plus an optional quantifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub quantifier: Option<Quantifier>,
}

impl Token {
    pub fn new(kind: TokenKind) -> Self {
        Token {
            kind,
            quantifier: None,
        }
    }
}
