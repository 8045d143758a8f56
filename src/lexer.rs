use std::fmt;

use thiserror::Error;

/// Characters that may follow `\`, paired with the character they stand for.
const ESCAPES: [(char, char); 14] = [
    ('(', '('),
    (')', ')'),
    ('*', '*'),
    ('+', '+'),
    ('-', '-'),
    ('.', '.'),
    ('?', '?'),
    ('[', '['),
    ('\\', '\\'),
    (']', ']'),
    ('^', '^'),
    ('s', ' '),
    ('t', '\t'),
    ('|', '|'),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    Char,
    Escape,
    LBracket,
    LParen,
    RParen,
    Quantifier,
    Pipe,
    End,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Char => "character",
            TokenKind::Escape => "escape",
            TokenKind::LBracket => "'['",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Quantifier => "quantifier",
            TokenKind::Pipe => "'|'",
            TokenKind::End => "end of pattern",
        };
        f.write_str(s)
    }
}

/// A terminal of the pattern grammar.
///
/// `value` is the character the token stands for: for an escape it is the
/// unescaped character (`\s` has value `' '`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: char,
    pub position: usize,
}

impl Token {
    /// Whether this is a literal character token (not an escape) with value `c`.
    pub fn is_bare(&self, c: char) -> bool {
        self.kind == TokenKind::Char && self.value == c
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("invalid character {character:?} at {position}")]
    InvalidCharacter { position: usize, character: char },
    #[error("character {character:?} at {position} cannot be escaped")]
    InvalidEscape { position: usize, character: char },
    #[error("pattern ends after escape marker at {position}")]
    UnterminatedEscape { position: usize },
}

/// Forward-only tokenizer over a pattern.
#[derive(Debug)]
pub struct Lexer<'a> {
    chars: std::str::Chars<'a>,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(pattern: &'a str) -> Self {
        Self {
            chars: pattern.chars(),
            position: 0,
        }
    }

    /// Current offset, in characters, into the pattern.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Read the next significant character, skipping tabs and spaces.
    fn read(&mut self) -> Option<(usize, char)> {
        while let Some(c) = self.chars.next() {
            let at = self.position;
            self.position += 1;
            if !matches!(c, ' ' | '\t') {
                return Some((at, c));
            }
        }
        None
    }

    /// Produce the next token. Returns a token of kind `End` once the input is
    /// exhausted, and keeps doing so on further calls.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let Some((position, c)) = self.read() else {
            return Ok(Token {
                kind: TokenKind::End,
                value: '\0',
                position: self.position,
            });
        };

        let kind = match c {
            '[' => TokenKind::LBracket,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '*' | '+' | '?' => TokenKind::Quantifier,
            '|' => TokenKind::Pipe,
            '\\' => return self.escape(position),
            c if is_valid_char(c) => TokenKind::Char,
            character => {
                return Err(LexError::InvalidCharacter {
                    position,
                    character,
                })
            }
        };

        Ok(Token {
            kind,
            value: c,
            position,
        })
    }

    fn escape(&mut self, position: usize) -> Result<Token, LexError> {
        // The escaped character is taken verbatim, so `\ ` is not a way to spell a space.
        let Some(c) = self.chars.next() else {
            return Err(LexError::UnterminatedEscape { position });
        };
        let at = self.position;
        self.position += 1;

        match ESCAPES.iter().find(|(e, _)| *e == c) {
            Some(&(_, value)) => Ok(Token {
                kind: TokenKind::Escape,
                value,
                position,
            }),
            None => Err(LexError::InvalidEscape {
                position: at,
                character: c,
            }),
        }
    }
}

/// Everything above the space is a pattern character, including DEL and the
/// C1 controls.
fn is_valid_char(c: char) -> bool {
    c > ' '
}
