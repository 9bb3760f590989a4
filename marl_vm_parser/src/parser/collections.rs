//! Collection literal parsers: matrices, objects and lists

use crate::ast::{Expr, Property};
use crate::error::ErrorCode;
use crate::token::Token;

use super::{parse_number, unescape, Parser};

impl<'a> Parser<'a> {
    /// Parse `[a, b; c, d]`. Rows are separated by `;`, columns by `,`.
    pub(crate) fn parse_matrix(&mut self) -> Expr {
        let open = self.advance();
        let rows = self.with_colon_allowed(|p| p.parse_matrix_rows());
        Expr::Matrix {
            rows,
            span: self.span_from(open.span.start),
        }
    }

    fn parse_matrix_rows(&mut self) -> Vec<Vec<Expr>> {
        let mut rows = Vec::new();
        if self.eat(&Token::RBracket).is_some() {
            return rows;
        }

        let mut row = Vec::new();
        loop {
            row.push(self.parse_expression());
            match self.current.token {
                Token::Comma => {
                    self.advance();
                }
                Token::Semicolon => {
                    self.advance();
                    rows.push(std::mem::take(&mut row));
                    // Trailing row separator: [1, 2;]
                    if self.eat(&Token::RBracket).is_some() {
                        return rows;
                    }
                }
                Token::RBracket => {
                    self.advance();
                    rows.push(row);
                    return rows;
                }
                _ => {
                    let span = self.current_span();
                    row.push(self.invalid(ErrorCode::ListNotClosed, span));
                    rows.push(row);
                    return rows;
                }
            }
        }
    }

    /// Parse `new { ... }` or `new [ ... ]`
    pub(crate) fn parse_new(&mut self) -> Expr {
        let keyword = self.advance();
        match self.current.token {
            Token::LBrace => self.parse_object(keyword.span.start),
            Token::LBracket => self.parse_list(keyword.span.start),
            _ => {
                let span = keyword.span.merge(&self.current_span());
                self.invalid(ErrorCode::ExpressionExpected, span)
            }
        }
    }

    /// Parse `new [a, b, c]`
    fn parse_list(&mut self, start: usize) -> Expr {
        self.advance();
        let (mut elements, closed) =
            self.with_colon_allowed(|p| p.parse_comma_list(Token::RBracket));
        if !closed {
            let span = self.current_span();
            elements.push(self.invalid(ErrorCode::ListNotClosed, span));
        }
        Expr::List {
            elements,
            span: self.span_from(start),
        }
    }

    /// Parse `new { key: value, "other key": value }`
    fn parse_object(&mut self, start: usize) -> Expr {
        self.advance();
        let properties = self.with_colon_allowed(|p| p.parse_properties());
        Expr::Object {
            properties,
            span: self.span_from(start),
        }
    }

    fn parse_properties(&mut self) -> Vec<Property> {
        let mut properties = Vec::new();

        loop {
            // Also accepts a trailing comma before the brace
            if self.eat(&Token::RBrace).is_some() {
                return properties;
            }
            if !self.is_at_end() {
                properties.push(self.parse_property());
                if self.eat(&Token::Comma).is_some() {
                    continue;
                }
                if self.eat(&Token::RBrace).is_some() {
                    return properties;
                }
            }

            let span = self.current_span();
            properties.push(Property {
                name: String::new(),
                name_span: span,
                value: self.invalid(ErrorCode::ScopeNotClosed, span),
                span,
            });
            return properties;
        }
    }

    fn parse_property(&mut self) -> Property {
        let key = self.current;
        let name = match key.token {
            Token::Identifier => key.text.to_string(),
            Token::StringLiteral => unescape(&key.text[1..key.text.len() - 1]),
            t if t.is_number() => parse_number(t, key.text).to_string(),
            t if t.is_keyword() => key.text.to_string(),
            _ => {
                let value = self.invalid(ErrorCode::IdentifierExpected, key.span);
                return Property {
                    name: String::new(),
                    name_span: key.span,
                    value,
                    span: key.span,
                };
            }
        };
        self.advance();

        let value = if self.eat(&Token::Colon).is_some() {
            self.parse_expression()
        } else {
            let span = self.current_span();
            self.invalid(ErrorCode::ColonExpected, span)
        };

        Property {
            name,
            name_span: key.span,
            span: key.span.merge(&value.span()),
            value,
        }
    }
}
