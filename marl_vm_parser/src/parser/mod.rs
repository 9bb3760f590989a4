//! Recursive descent parser for Marl
//!
//! Statements are parsed by recursive descent, expressions by precedence
//! climbing. The parser never gives up: malformed input is folded into the
//! tree as `Expr::Invalid` nodes, unclosed blocks and unterminated statements,
//! and parsing resumes at the next token that can start something.

mod collections;
mod expressions;
mod literals;
mod statements;

use crate::ast::{Expr, Stmt};
use crate::error::{Diagnostic, ErrorCode};
use crate::lexer::{Lexer, SpannedToken};
use crate::span::Span;
use crate::token::Token;

pub(crate) use literals::{parse_number, unescape};

/// Deepest statement and expression nesting the parser builds. Anything
/// deeper becomes a single `NestingTooDeep` node, which keeps every tree
/// walker well inside the native stack.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Marl parser
#[derive(Debug)]
pub struct Parser<'a> {
    pub(crate) lexer: Lexer<'a>,
    /// Current token (End once the input is exhausted)
    pub(crate) current: SpannedToken<'a>,
    /// End offset of the most recently consumed token
    pub(crate) last_end: usize,
    /// Recovery markers, in the order they were produced
    pub(crate) diagnostics: Vec<Diagnostic>,
    /// Set while parsing the first branch of `?:`, where `:` ends the branch
    pub(crate) stop_at_colon: bool,
    /// Nesting of the node being built, bounded by `MAX_NESTING_DEPTH`
    pub(crate) depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            last_end: 0,
            diagnostics: Vec::new(),
            stop_at_colon: false,
            depth: 0,
        }
    }

    /// Parse the whole source into a statement list
    pub fn parse(mut self) -> (Vec<Stmt>, Vec<Diagnostic>) {
        let statements = self.parse_statements_until(None);
        (statements, self.diagnostics)
    }

    // ==================== Token Management ====================

    /// Advance to the next token, returning the one just consumed
    pub(crate) fn advance(&mut self) -> SpannedToken<'a> {
        let next = self.lexer.next_token();
        let prev = std::mem::replace(&mut self.current, next);
        if prev.token != Token::End {
            self.last_end = prev.span.end;
        }
        prev
    }

    /// Check if current token matches
    pub(crate) fn check(&self, expected: &Token) -> bool {
        &self.current.token == expected
    }

    /// Check if current token is any of the given tokens
    pub(crate) fn check_any(&self, expected: &[Token]) -> bool {
        expected.contains(&self.current.token)
    }

    /// Consume the current token if it matches
    pub(crate) fn eat(&mut self, expected: &Token) -> Option<SpannedToken<'a>> {
        if self.check(expected) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Peek at the token after the current one
    pub(crate) fn peek_next(&mut self) -> Token {
        self.lexer.peek().token
    }

    pub(crate) fn current_span(&self) -> Span {
        self.current.span
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current.token == Token::End
    }

    /// Span from `start` to the end of the last consumed token
    pub(crate) fn span_from(&self, start: usize) -> Span {
        self.lexer
            .source_map()
            .span(start, self.last_end.max(start))
    }

    /// Record a recovery marker and return the node standing in for it
    pub(crate) fn invalid(&mut self, code: ErrorCode, span: Span) -> Expr {
        self.diagnostics.push(Diagnostic::new(code, span));
        Expr::Invalid { code, span }
    }

    /// Run `f` with `:` treated as the range operator again
    pub(crate) fn with_colon_allowed<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.stop_at_colon, false);
        let result = f(self);
        self.stop_at_colon = saved;
        result
    }

    // ==================== Nesting Limit ====================

    /// Count one more level of nesting. Returns false once the limit is
    /// passed; callers restore `depth` when the level is done.
    pub(crate) fn descend(&mut self) -> bool {
        self.depth += 1;
        self.depth <= MAX_NESTING_DEPTH
    }

    /// Replace the rest of an over-deep construct with a `NestingTooDeep`
    /// marker. Skips up to a `;` or an unmatched closing delimiter at this
    /// level (left in place), or the end of input.
    pub(crate) fn too_deep(&mut self) -> Expr {
        let start = self.current.span.start;
        let mut open = 0usize;
        while !self.is_at_end() {
            match self.current.token {
                Token::LParen | Token::LBrace | Token::LBracket => open += 1,
                Token::RParen | Token::RBrace | Token::RBracket => {
                    if open == 0 {
                        break;
                    }
                    open -= 1;
                }
                Token::Semicolon if open == 0 => break,
                _ => {}
            }
            self.advance();
        }
        let span = self.span_from(start);
        self.invalid(ErrorCode::NestingTooDeep, span)
    }

    // ==================== Statement Lists ====================

    /// Parse statements until `closing` (or the end of input)
    pub(crate) fn parse_statements_until(&mut self, closing: Option<Token>) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !self.is_at_end() && closing.map_or(true, |t| !self.check(&t)) {
            let before = self.current.span.start;
            statements.push(self.parse_statement());

            // A stray token nothing can start with: skip it to guarantee progress
            if self.current.span.start == before && !self.is_at_end() {
                if closing.is_some_and(|t| self.check(&t)) {
                    break;
                }
                self.advance();
            }
        }

        statements
    }
}

/// Parse Marl source code into statements plus the parser's recovery markers
pub fn parse(source: &str) -> (Vec<Stmt>, Vec<Diagnostic>) {
    Parser::new(source).parse()
}
