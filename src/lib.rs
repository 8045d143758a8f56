//! Regular expressions compiled to deterministic finite automata.
//!
//! A pattern is tokenized, parsed into a syntax tree, turned into an NFA by
//! Thompson construction and then into a DFA by subset construction. Matching
//! scans a character buffer with the DFA and reports the leftmost match.
//!
//! ```
//! use dfaregex::{compile, Cursor};
//!
//! let re = compile("[0-9]+").unwrap();
//! let text: Vec<char> = "ab12cd345".chars().collect();
//!
//! let mut cursor = Cursor::new();
//! assert!(re.match_at(&text, &mut cursor));
//! assert_eq!((cursor.match_start, cursor.match_length), (Some(2), 2));
//! ```
//!
//! Supported syntax: literals, `.`, `[...]` and `[^...]` classes with `a-z`
//! ranges, the quantifiers `*`, `+` and `?`, alternation with `|` and grouping
//! with parentheses. Spaces and tabs in a pattern are ignored; `\s` and `\t`
//! stand for them.

use std::fmt;

use log::{debug, trace};
use thiserror::Error;

pub mod automaton;
pub mod dfa;
mod dot;
pub mod lexer;
mod machine;
pub mod nfa;
pub mod parser;

use dfa::{build_dfa, DEFAULT_STATE_LIMIT};
use dot::Dot;
use lexer::LexError;
use machine::Machine;
use nfa::build_nfa;
use parser::{Parser, SyntaxError, DEFAULT_NEST_LIMIT};

pub use automaton::Automaton;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("lexical error: {0}")]
    Lexical(#[from] LexError),
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("pattern needs more than {limit} automaton states")]
    TooManyStates { limit: usize },
}

impl CompileError {
    /// Character offset in the pattern the error was detected at.
    pub fn position(&self) -> Option<usize> {
        match self {
            CompileError::Lexical(
                LexError::InvalidCharacter { position, .. }
                | LexError::InvalidEscape { position, .. }
                | LexError::UnterminatedEscape { position },
            ) => Some(*position),
            CompileError::Syntax(err) => match err {
                SyntaxError::EmptyPattern => None,
                SyntaxError::UnexpectedToken { position, .. }
                | SyntaxError::UnexpectedEnd { position, .. }
                | SyntaxError::UnclosedGroup { position }
                | SyntaxError::UnbalancedParenthesis { position }
                | SyntaxError::EmptyClass { position }
                | SyntaxError::UnclosedClass { position }
                | SyntaxError::MissingAlternative { position }
                | SyntaxError::InvalidRange { position, .. }
                | SyntaxError::NestTooDeep { position, .. } => Some(*position),
            },
            CompileError::TooManyStates { .. } => None,
        }
    }
}

/// Compile `pattern` with the default limits.
pub fn compile(pattern: &str) -> Result<Regex, CompileError> {
    Regex::new(pattern)
}

/// Configures and compiles a [`Regex`].
#[derive(Debug, Clone)]
pub struct RegexBuilder {
    pattern: String,
    nest_limit: u32,
    state_limit: usize,
}

impl RegexBuilder {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            nest_limit: DEFAULT_NEST_LIMIT,
            state_limit: DEFAULT_STATE_LIMIT,
        }
    }

    /// Maximum depth of nested groups. Deeper patterns fail
    /// with [`SyntaxError::NestTooDeep`].
    pub fn nest_limit(&mut self, limit: u32) -> &mut Self {
        self.nest_limit = limit;
        self
    }

    /// Maximum number of DFA states. Patterns needing more fail with
    /// [`CompileError::TooManyStates`].
    pub fn state_limit(&mut self, limit: usize) -> &mut Self {
        self.state_limit = limit;
        self
    }

    pub fn build(&self) -> Result<Regex, CompileError> {
        let pattern = self.pattern.as_str();
        let ast = Parser::new(pattern, self.nest_limit)?.parse()?;
        trace!("syntax tree of {pattern:?}:\n{}", Dot(&ast));

        let nfa = build_nfa(&ast);
        trace!("NFA of {pattern:?}:\n{}", Dot(&nfa));

        let dfa = build_dfa(&nfa, self.state_limit)?;
        debug!(
            "compiled {pattern:?}: {} NFA states, {} symbols, {} DFA states",
            nfa.len(),
            nfa.alphabet().iter().filter(|t| !t.is_epsilon()).count(),
            dfa.len()
        );
        trace!("DFA of {pattern:?}:\n{}", Dot(&dfa));

        Ok(Regex {
            pattern: self.pattern.clone(),
            machine: Machine::new(dfa),
        })
    }
}

/// Read position and last match of a scan over a buffer.
///
/// `match_at` starts reading at `position` and records the match it finds.
/// Set `position` to [`Cursor::match_end`] to continue after a match.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub position: usize,
    /// `None` until a match is found.
    pub match_start: Option<usize>,
    pub match_length: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(position: usize) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn match_end(&self) -> Option<usize> {
        self.match_start.map(|start| start + self.match_length)
    }
}

/// Span of a match, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Match {
    start: usize,
    end: usize,
}

impl Match {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// A compiled pattern. Immutable, and cheap to share between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regex {
    pattern: String,
    machine: Machine,
}

impl Regex {
    pub fn new(pattern: &str) -> Result<Self, CompileError> {
        RegexBuilder::new(pattern).build()
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// The DFA the pattern compiled to.
    pub fn automaton(&self) -> &Automaton {
        self.machine.automaton()
    }

    pub fn state_count(&self) -> usize {
        self.automaton().len()
    }

    /// Search `buffer` from `cursor.position` and record the leftmost match in
    /// the cursor. On failure the match fields are reset to `None` and `0`.
    /// The position is never changed.
    pub fn match_at(&self, buffer: &[char], cursor: &mut Cursor) -> bool {
        match self.machine.find_at(buffer, cursor.position) {
            Some((start, end)) => {
                cursor.match_start = Some(start);
                cursor.match_length = end - start;
                true
            }
            None => {
                cursor.match_start = None;
                cursor.match_length = 0;
                false
            }
        }
    }

    /// Leftmost match in `text`, with offsets counted in characters.
    pub fn find(&self, text: &str) -> Option<Match> {
        let chars: Vec<char> = text.chars().collect();
        self.find_iter(&chars).next()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Successive non-overlapping matches in `buffer`, left to right.
    pub fn find_iter<'r, 't>(&'r self, buffer: &'t [char]) -> Matches<'r, 't> {
        Matches {
            regex: self,
            buffer,
            position: 0,
        }
    }
}

/// Renders the DFA in Graphviz DOT form.
impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Dot(self.automaton()))
    }
}

/// Iterator returned by [`Regex::find_iter`].
#[derive(Debug)]
pub struct Matches<'r, 't> {
    regex: &'r Regex,
    buffer: &'t [char],
    position: usize,
}

impl Iterator for Matches<'_, '_> {
    type Item = Match;

    fn next(&mut self) -> Option<Match> {
        let (start, end) = self.regex.machine.find_at(self.buffer, self.position)?;
        // Step over empty matches so the scan always moves forward.
        self.position = if start == end { end + 1 } else { end };
        Some(Match { start, end })
    }
}
