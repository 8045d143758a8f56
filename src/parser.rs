use std::fmt;

use thiserror::Error;

use crate::lexer::{Lexer, Token, TokenKind};
use crate::CompileError;

/// Default maximum nesting depth of groups.
pub const DEFAULT_NEST_LIMIT: u32 = 250;

/// Tokens that may start a `quantified_expr`.
const EXPRESSION_START: [TokenKind; 4] = [
    TokenKind::Char,
    TokenKind::Escape,
    TokenKind::LBracket,
    TokenKind::LParen,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Top of the tree; exactly one `Regexp` child.
    Root,
    /// One or more `Quantified` children, then one `Alternation` per `|`.
    Regexp,
    /// Branch after a `|`; exactly one `Regexp` child without alternations.
    Alternation,
    /// One `Expression` child; the quantifier, if any, is the node's value.
    Quantified,
    /// One `Selector` or `Group` child.
    Expression,
    /// Parenthesized `Regexp`.
    Group,
    /// One `Literal`, `Any` or `Class` child.
    Selector,
    Literal,
    Any,
    /// Bracket expression; the value is `^` when negated. Children are
    /// `Literal` and `Range` members.
    Class,
    /// Two `Literal` children, the inclusive bounds.
    Range,
}

impl NodeKind {
    fn name(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Regexp => "regexp",
            NodeKind::Alternation => "alternation",
            NodeKind::Quantified => "quantified",
            NodeKind::Expression => "expression",
            NodeKind::Group => "group",
            NodeKind::Selector => "selector",
            NodeKind::Literal => "literal",
            NodeKind::Any => "any",
            NodeKind::Class => "class",
            NodeKind::Range => "range",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Node of the syntax tree. Children are owned and ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    pub kind: NodeKind,
    pub value: Option<char>,
    pub children: Vec<Ast>,
    /// Character offset in the pattern where the node begins.
    pub position: usize,
}

impl Ast {
    fn new(kind: NodeKind, position: usize) -> Self {
        Self {
            kind,
            value: None,
            children: Vec::new(),
            position,
        }
    }

    fn leaf(kind: NodeKind, value: char, position: usize) -> Self {
        Self {
            kind,
            value: Some(value),
            children: Vec::new(),
            position,
        }
    }

    fn with_child(mut self, child: Ast) -> Self {
        self.children.push(child);
        self
    }

    /// The single child of a node that the grammar gives exactly one.
    pub(crate) fn only_child(&self) -> &Ast {
        debug_assert_eq!(self.children.len(), 1, "{} node", self.kind);
        &self.children[0]
    }
}

/// Compact s-expression form, e.g. `regexp(quantified:+(...))`.
impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(value) = self.value {
            write!(f, ":{}", value.escape_debug())?;
        }
        if !self.children.is_empty() {
            f.write_str("(")?;
            for (i, child) in self.children.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{child}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

struct Expected<'a>(&'a [TokenKind]);

impl fmt::Display for Expected<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{kind}")?;
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("empty pattern")]
    EmptyPattern,
    #[error("unexpected {found} at {position}, expected one of: {}", Expected(.expected))]
    UnexpectedToken {
        position: usize,
        found: TokenKind,
        expected: Vec<TokenKind>,
    },
    #[error("unexpected end of pattern at {position}, expected one of: {}", Expected(.expected))]
    UnexpectedEnd {
        position: usize,
        expected: Vec<TokenKind>,
    },
    #[error("unclosed parenthesis opened at {position}")]
    UnclosedGroup { position: usize },
    #[error("unexpected parenthesis at {position}")]
    UnbalancedParenthesis { position: usize },
    #[error("empty character class at {position}")]
    EmptyClass { position: usize },
    #[error("unclosed character class opened at {position}")]
    UnclosedClass { position: usize },
    #[error("missing operand after '|' at {position}")]
    MissingAlternative { position: usize },
    #[error("invalid range {start:?}-{end:?} at {position}")]
    InvalidRange {
        position: usize,
        start: char,
        end: char,
    },
    #[error("nesting deeper than {limit} at {position}")]
    NestTooDeep { position: usize, limit: u32 },
}

/// Parse a pattern into a syntax tree using the default nesting limit.
pub fn parse(pattern: &str) -> Result<Ast, CompileError> {
    Parser::new(pattern, DEFAULT_NEST_LIMIT)?.parse()
}

/// Recursive-descent parser with one token of lookahead.
///
/// Grammar:
/// ```txt
/// regexp          ::= sequence { '|' sequence }
/// sequence        ::= quantified_expr { quantified_expr }
/// quantified_expr ::= expression [ quantifier ]
/// expression      ::= selector | '(' regexp ')'
/// selector        ::= symbol | range
/// range           ::= '[' char_range ']'
/// char_range      ::= [ '^' ] ( symbol | '-' )+
/// symbol          ::= char | escape
/// quantifier      ::= '*' | '+' | '?'
/// ```
#[derive(Debug)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    token: Token,
    depth: u32,
    nest_limit: u32,
}

impl<'a> Parser<'a> {
    pub fn new(pattern: &'a str, nest_limit: u32) -> Result<Self, CompileError> {
        let mut lexer = Lexer::new(pattern);
        let token = lexer.next_token()?;
        Ok(Self {
            lexer,
            token,
            depth: 0,
            nest_limit,
        })
    }

    pub fn parse(mut self) -> Result<Ast, CompileError> {
        if self.token.kind == TokenKind::End {
            return Err(SyntaxError::EmptyPattern.into());
        }

        let root = Ast::new(NodeKind::Root, 0);
        let regexp = self.regexp()?;

        // Everything must have been consumed by `regexp`.
        if self.token.kind != TokenKind::End {
            return Err(self.unexpected(&[TokenKind::Quantifier, TokenKind::Pipe, TokenKind::End]));
        }

        Ok(root.with_child(regexp))
    }

    fn advance(&mut self) -> Result<(), CompileError> {
        self.token = self.lexer.next_token()?;
        Ok(())
    }

    fn at_expression(&self) -> bool {
        EXPRESSION_START.contains(&self.token.kind)
    }

    /// Error for the current token not being one of `expected`.
    fn unexpected(&self, expected: &[TokenKind]) -> CompileError {
        let position = self.token.position;
        let err = match self.token.kind {
            TokenKind::End => SyntaxError::UnexpectedEnd {
                position,
                expected: expected.to_vec(),
            },
            TokenKind::RParen if self.depth == 0 => SyntaxError::UnbalancedParenthesis { position },
            found => SyntaxError::UnexpectedToken {
                position,
                found,
                expected: expected.to_vec(),
            },
        };
        err.into()
    }

    fn enter(&mut self, position: usize) -> Result<(), CompileError> {
        if self.depth >= self.nest_limit {
            return Err(SyntaxError::NestTooDeep {
                position,
                limit: self.nest_limit,
            }
            .into());
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// `regexp ::= sequence { '|' sequence }`
    ///
    /// Not LL(1): a sequence and an alternation share their first set, so a
    /// sequence is always consumed first and `|` is checked afterwards. The
    /// branches after the first hang off the node as `Alternation` children,
    /// so a long list of alternatives does not nest.
    fn regexp(&mut self) -> Result<Ast, CompileError> {
        let mut node = self.sequence()?;

        while self.token.kind == TokenKind::Pipe {
            let position = self.token.position;
            self.advance()?;
            if self.token.kind == TokenKind::End {
                return Err(SyntaxError::MissingAlternative { position }.into());
            }

            let branch = self.sequence()?;
            node.children
                .push(Ast::new(NodeKind::Alternation, position).with_child(branch));
        }

        Ok(node)
    }

    /// `sequence ::= quantified_expr { quantified_expr }`
    fn sequence(&mut self) -> Result<Ast, CompileError> {
        let mut node = Ast::new(NodeKind::Regexp, self.token.position);

        if !self.at_expression() {
            return Err(self.unexpected(&EXPRESSION_START));
        }
        while self.at_expression() {
            let quantified = self.quantified_expr()?;
            node.children.push(quantified);
        }

        Ok(node)
    }

    /// `quantified_expr ::= expression [ quantifier ]`
    fn quantified_expr(&mut self) -> Result<Ast, CompileError> {
        let mut node = Ast::new(NodeKind::Quantified, self.token.position);
        let expression = self.expression()?;
        node.children.push(expression);

        if self.token.kind == TokenKind::Quantifier {
            node.value = Some(self.token.value);
            self.advance()?;
        }
        Ok(node)
    }

    /// `expression ::= selector | '(' regexp ')'`
    fn expression(&mut self) -> Result<Ast, CompileError> {
        let node = Ast::new(NodeKind::Expression, self.token.position);
        let child = match self.token.kind {
            TokenKind::LParen => self.group()?,
            _ => self.selector()?,
        };
        Ok(node.with_child(child))
    }

    fn group(&mut self) -> Result<Ast, CompileError> {
        let position = self.token.position;
        self.enter(position)?;
        self.advance()?;

        if self.token.kind == TokenKind::End {
            return Err(SyntaxError::UnclosedGroup { position }.into());
        }
        let regexp = self.regexp()?;

        match self.token.kind {
            TokenKind::RParen => self.advance()?,
            TokenKind::End => return Err(SyntaxError::UnclosedGroup { position }.into()),
            _ => return Err(self.unexpected(&[TokenKind::RParen])),
        }
        self.leave();

        Ok(Ast::new(NodeKind::Group, position).with_child(regexp))
    }

    /// `selector ::= symbol | range`
    fn selector(&mut self) -> Result<Ast, CompileError> {
        let token = self.token;
        let node = Ast::new(NodeKind::Selector, token.position);

        let child = match token.kind {
            TokenKind::LBracket => return Ok(node.with_child(self.class()?)),
            TokenKind::Char if token.value == '.' => Ast::new(NodeKind::Any, token.position),
            TokenKind::Char | TokenKind::Escape => {
                Ast::leaf(NodeKind::Literal, token.value, token.position)
            }
            _ => return Err(self.unexpected(&EXPRESSION_START)),
        };
        self.advance()?;
        Ok(node.with_child(child))
    }

    /// `range ::= '[' char_range ']'`
    ///
    /// Every token up to the closing unescaped `]` is a class member, so
    /// `[.(+]` holds three literals. The first member must be a character or
    /// an escape.
    fn class(&mut self) -> Result<Ast, CompileError> {
        let position = self.token.position;
        let mut node = Ast::new(NodeKind::Class, position);
        self.advance()?;

        match self.token.kind {
            TokenKind::Char | TokenKind::Escape => {}
            TokenKind::End => return Err(SyntaxError::UnclosedClass { position }.into()),
            _ => return Err(self.unexpected(&[TokenKind::Char, TokenKind::Escape])),
        }
        if self.token.is_bare(']') {
            return Err(SyntaxError::EmptyClass { position }.into());
        }
        if self.token.is_bare('^') {
            node.value = Some('^');
            self.advance()?;
        }

        let mut members = Vec::new();
        loop {
            match self.token.kind {
                TokenKind::End => return Err(SyntaxError::UnclosedClass { position }.into()),
                _ if self.token.is_bare(']') => break,
                _ => members.push(self.token),
            }
            self.advance()?;
        }
        // Closing `]`.
        self.advance()?;

        if members.is_empty() {
            return Err(SyntaxError::EmptyClass { position }.into());
        }
        node.children = class_members(&members)?;
        Ok(node)
    }
}

/// Group raw class tokens into literals and `x-y` ranges. Only an unescaped
/// `-` with a member on each side forms a range.
fn class_members(tokens: &[Token]) -> Result<Vec<Ast>, CompileError> {
    let mut members = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let lo = tokens[i];
        if i + 2 < tokens.len() && tokens[i + 1].is_bare('-') {
            let hi = tokens[i + 2];
            if hi.value < lo.value {
                return Err(SyntaxError::InvalidRange {
                    position: lo.position,
                    start: lo.value,
                    end: hi.value,
                }
                .into());
            }
            members.push(
                Ast::new(NodeKind::Range, lo.position)
                    .with_child(Ast::leaf(NodeKind::Literal, lo.value, lo.position))
                    .with_child(Ast::leaf(NodeKind::Literal, hi.value, hi.position)),
            );
            i += 3;
        } else {
            members.push(Ast::leaf(NodeKind::Literal, lo.value, lo.position));
            i += 1;
        }
    }

    Ok(members)
}
