//! Lexer for Marl source code
//!
//! Wraps the logos-generated lexer with the sub-scanners logos cannot express
//! on its own: quoted strings with escapes and `/* ... */` comments. The
//! lexer never fails. Unrecognized input becomes `Token::Unknown`, and once
//! the input is exhausted every further request yields `Token::End`.

use std::fmt;

use logos::Logos;

use crate::span::{SourceMap, Span};
use crate::token::Token;

/// A token with its span
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpannedToken<'a> {
    pub token: Token,
    pub span: Span,
    pub text: &'a str,
}

impl<'a> SpannedToken<'a> {
    pub fn new(token: Token, span: Span, text: &'a str) -> Self {
        Self { token, span, text }
    }
}

/// Marl lexer
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    source_map: SourceMap,
    /// Peeked token (for lookahead)
    peeked: Option<SpannedToken<'a>>,
    /// Current position in source
    position: usize,
    /// Offset from original source (used after restarting lexer)
    offset: usize,
}

impl fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("len", &self.source.len())
            .field("peeked", &self.peeked)
            .finish()
    }
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            source_map: SourceMap::new(source),
            peeked: None,
            position: 0,
            offset: 0,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    fn make_token(&self, token: Token, start: usize, end: usize) -> SpannedToken<'a> {
        SpannedToken::new(token, self.source_map.span(start, end), &self.source[start..end])
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> SpannedToken<'a> {
        if let Some(token) = self.peeked {
            return token;
        }
        let token = self.scan();
        self.peeked = Some(token);
        token
    }

    /// Get the next token
    pub fn next_token(&mut self) -> SpannedToken<'a> {
        match self.peeked.take() {
            Some(token) => token,
            None => self.scan(),
        }
    }

    fn scan(&mut self) -> SpannedToken<'a> {
        loop {
            let Some(result) = self.inner.next() else {
                let end = self.source.len();
                self.position = end;
                return self.make_token(Token::End, end, end);
            };
            let span = self.inner.span();
            let start = self.offset + span.start;
            let end = self.offset + span.end;
            self.position = end;

            match result {
                Ok(Token::LineComment) => continue,
                Ok(Token::BlockCommentStart) => {
                    let close = self.scan_block_comment(end);
                    self.restart_from(close);
                }
                Ok(Token::DoubleQuote) => {
                    return match self.scan_string_to_close(end) {
                        Some(close) => {
                            self.restart_from(close);
                            self.make_token(Token::StringLiteral, start, close)
                        }
                        None => {
                            let len = self.source.len();
                            self.restart_from(len);
                            self.make_token(Token::UnterminatedString, start, len)
                        }
                    };
                }
                Ok(token) => return self.make_token(token, start, end),
                Err(()) => return self.make_token(Token::Unknown, start, end),
            }
        }
    }

    /// Find the end of a block comment (position after `*/`).
    /// An unterminated comment swallows the rest of the input.
    fn scan_block_comment(&self, start: usize) -> usize {
        let bytes = self.source.as_bytes();
        let mut pos = start;

        while let Some(offset) = memchr::memchr(b'*', &bytes[pos..]) {
            pos += offset;
            if bytes.get(pos + 1) == Some(&b'/') {
                return pos + 2;
            }
            pos += 1;
        }
        bytes.len()
    }

    /// Find the closing quote of a string literal (position after it).
    fn scan_string_to_close(&self, start: usize) -> Option<usize> {
        let bytes = self.source.as_bytes();
        let mut pos = start;

        while pos < bytes.len() {
            let offset = memchr::memchr2(b'\\', b'"', &bytes[pos..])?;
            pos += offset;
            if bytes[pos] == b'\\' {
                pos += 2;
                continue;
            }
            return Some(pos + 1);
        }
        None
    }

    /// Restart the lexer from a new position.
    /// Uses bump() to advance within the current logos lexer when possible.
    fn restart_from(&mut self, pos: usize) {
        self.peeked = None;
        self.position = pos;
        let logos_abs_pos = self.offset + self.inner.span().end;
        if pos > logos_abs_pos && pos <= self.source.len() {
            self.inner.bump(pos - logos_abs_pos);
        } else if pos < self.source.len() {
            self.inner = Token::lexer(&self.source[pos..]);
            self.offset = pos;
        } else {
            self.inner = Token::lexer("");
            self.offset = self.source.len();
        }
    }

    /// Get current position in source
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Tokenize source code; the result always ends with a single `Token::End`.
pub fn tokenize(source: &str) -> Vec<SpannedToken<'_>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        tokens.push(token);
        if token.token == Token::End {
            return tokens;
        }
    }
}

/// Check whether every group, scope and list opened in `source` is closed.
///
/// Line editors use this to decide whether to keep accumulating input.
/// Closing delimiters without an opener are ignored, so `)(` is incomplete
/// but `)` alone is complete.
pub fn is_completed(source: &str) -> bool {
    let (mut round, mut curly, mut square) = (0usize, 0usize, 0usize);

    for token in tokenize(source) {
        match token.token {
            Token::LParen => round += 1,
            Token::RParen => round = round.saturating_sub(1),
            Token::LBrace => curly += 1,
            Token::RBrace => curly = curly.saturating_sub(1),
            Token::LBracket => square += 1,
            Token::RBracket => square = square.saturating_sub(1),
            _ => {}
        }
    }

    round == 0 && curly == 0 && square == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("var f = (x) => x + 1;"),
            vec![
                Token::KwVar,
                Token::Identifier,
                Token::Eq,
                Token::LParen,
                Token::Identifier,
                Token::RParen,
                Token::FatArrow,
                Token::Identifier,
                Token::Plus,
                Token::DecimalLiteral,
                Token::Semicolon,
                Token::End,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("1 // one\n/* two\n */ 3"),
            vec![Token::DecimalLiteral, Token::DecimalLiteral, Token::End]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert_eq!(kinds("1 /* never closed ( [ {"), vec![Token::DecimalLiteral, Token::End]);
    }

    #[test]
    fn test_string_literal() {
        let tokens = tokenize(r#"x = "a \"quoted\" (word)";"#);

        assert_eq!(tokens[2].token, Token::StringLiteral);
        assert_eq!(tokens[2].text, r#""a \"quoted\" (word)""#);
        assert_eq!(tokens[3].token, Token::Semicolon);
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = tokenize(r#"x = "abc"#);

        assert_eq!(tokens[2].token, Token::UnterminatedString);
        assert_eq!(tokens[2].text, r#""abc"#);
        assert_eq!(tokens[3].token, Token::End);
    }

    #[test]
    fn test_unknown_symbol() {
        assert_eq!(
            kinds("a # b"),
            vec![Token::Identifier, Token::Unknown, Token::Identifier, Token::End]
        );
    }

    #[test]
    fn test_end_is_idempotent() {
        let mut lexer = Lexer::new("a");
        assert_eq!(lexer.next_token().token, Token::Identifier);
        assert_eq!(lexer.next_token().token, Token::End);
        assert_eq!(lexer.next_token().token, Token::End);
        assert_eq!(lexer.position(), 1);
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("foo + bar");

        assert_eq!((tokens[0].span.start, tokens[0].span.end), (0, 3));
        assert_eq!(tokens[0].text, "foo");
        assert_eq!((tokens[1].span.start, tokens[1].span.end), (4, 5));
        assert_eq!((tokens[2].span.start, tokens[2].span.end), (6, 9));
        assert_eq!((tokens[3].span.start, tokens[3].span.end), (9, 9));
    }

    #[test]
    fn test_multiline_spans() {
        let tokens = tokenize("foo\n  bar");

        assert_eq!(tokens[0].span.start_line, 1);
        assert_eq!(tokens[1].span.start_line, 2);
        assert_eq!(tokens[1].span.start_column, 3);
    }

    #[test]
    fn test_peek() {
        let mut lexer = Lexer::new("a b");

        assert_eq!(lexer.peek().text, "a");
        assert_eq!(lexer.peek().text, "a");
        assert_eq!(lexer.next_token().text, "a");
        assert_eq!(lexer.next_token().text, "b");
    }

    #[test]
    fn test_is_completed() {
        assert!(is_completed(""));
        assert!(is_completed("f(1, [2, 3])"));
        assert!(is_completed("while (true) { x = 1; }"));
        assert!(is_completed(")"));
        assert!(!is_completed("while (true) {"));
        assert!(!is_completed("[1, 2"));
        assert!(!is_completed(")("));
    }

    #[test]
    fn test_is_completed_ignores_delimiters_in_strings_and_comments() {
        assert!(is_completed(r#"x = "(("; // ["#));
        assert!(is_completed("/* { */ 1"));
    }
}
