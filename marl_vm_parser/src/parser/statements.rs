//! Statement parsers

use crate::ast::{Expr, Stmt};
use crate::error::{Diagnostic, ErrorCode};
use crate::token::Token;

use super::Parser;

impl<'a> Parser<'a> {
    // ==================== Statement Dispatch ====================

    pub(crate) fn parse_statement(&mut self) -> Stmt {
        let saved = self.depth;
        let stmt = if self.descend() {
            self.parse_statement_inner()
        } else {
            let expr = self.too_deep();
            self.eat(&Token::Semicolon);
            let span = expr.span();
            Stmt::Simple {
                expr,
                terminated: true,
                span,
            }
        };
        self.depth = saved;
        stmt
    }

    fn parse_statement_inner(&mut self) -> Stmt {
        match self.current.token {
            Token::KwVar => self.parse_var_statement(),
            Token::KwReturn => self.parse_return_statement(),
            Token::KwBreak | Token::KwContinue => self.parse_loop_control(),
            Token::KwIf => self.parse_if_statement(),
            Token::KwWhile => self.parse_while_statement(),
            Token::LBrace => self.parse_block(),
            Token::Semicolon => {
                let token = self.advance();
                Stmt::Simple {
                    expr: Expr::Empty { span: token.span },
                    terminated: true,
                    span: token.span,
                }
            }
            _ => self.parse_simple_statement(),
        }
    }

    /// Consume an optional `;`. A statement also counts as terminated when
    /// the enclosing block closes or the input ends right after it.
    fn parse_terminator(&mut self) -> bool {
        self.eat(&Token::Semicolon).is_some() || self.check_any(&[Token::RBrace, Token::End])
    }

    /// Check if the current token cannot start a payload expression
    fn at_statement_end(&self) -> bool {
        self.check_any(&[Token::Semicolon, Token::RBrace, Token::End])
    }

    fn parse_simple_statement(&mut self) -> Stmt {
        let start = self.current_span().start;
        let expr = self.parse_expression();
        let terminated = self.parse_terminator();
        Stmt::Simple {
            expr,
            terminated,
            span: self.span_from(start),
        }
    }

    /// Parse `var name = value`
    fn parse_var_statement(&mut self) -> Stmt {
        let start = self.advance().span.start;
        let declaration = self.parse_expression();
        let terminated = self.parse_terminator();
        Stmt::Var {
            declaration,
            terminated,
            span: self.span_from(start),
        }
    }

    // ==================== Jump Statements ====================

    fn parse_return_statement(&mut self) -> Stmt {
        let keyword = self.advance();
        let value = if self.at_statement_end() {
            Expr::Empty {
                span: self.span_from(keyword.span.end),
            }
        } else {
            self.parse_expression()
        };
        let terminated = self.parse_terminator();
        Stmt::Return {
            value,
            terminated,
            span: self.span_from(keyword.span.start),
        }
    }

    /// Parse `break` or `continue`, with the optional payload the grammar
    /// tolerates so the validator can reject it.
    fn parse_loop_control(&mut self) -> Stmt {
        let keyword = self.advance();
        let payload = if self.at_statement_end() {
            Expr::Empty {
                span: self.span_from(keyword.span.end),
            }
        } else {
            self.parse_expression()
        };
        self.eat(&Token::Semicolon);
        let span = self.span_from(keyword.span.start);

        if keyword.token == Token::KwBreak {
            Stmt::Break { payload, span }
        } else {
            Stmt::Continue { payload, span }
        }
    }

    // ==================== Control Flow ====================

    fn parse_if_statement(&mut self) -> Stmt {
        let start = self.advance().span.start;
        let condition = self.parse_condition();
        let primary = Box::new(self.parse_body());
        let secondary = if self.eat(&Token::KwElse).is_some() {
            Some(Box::new(self.parse_body()))
        } else {
            None
        };
        Stmt::If {
            condition,
            primary,
            secondary,
            span: self.span_from(start),
        }
    }

    fn parse_while_statement(&mut self) -> Stmt {
        let start = self.advance().span.start;
        let condition = self.parse_condition();
        let body = Box::new(self.parse_body());
        Stmt::While {
            condition,
            body,
            span: self.span_from(start),
        }
    }

    /// Parse the parenthesized condition of `if`/`while`; `()` is an empty condition
    fn parse_condition(&mut self) -> Expr {
        let Some(open) = self.eat(&Token::LParen) else {
            let span = self.current_span();
            let condition = self.parse_expression();
            let span = span.merge(&condition.span());
            return self.invalid(ErrorCode::OpenGroupExpected, span);
        };

        if let Some(close) = self.eat(&Token::RParen) {
            return Expr::Empty {
                span: open.span.merge(&close.span),
            };
        }

        let condition = self.with_colon_allowed(|p| p.parse_expression());
        if self.eat(&Token::RParen).is_some() {
            condition
        } else {
            let span = self.span_from(open.span.start);
            self.invalid(ErrorCode::GroupNotClosed, span)
        }
    }

    /// Parse the body of `if`/`else`/`while`: any single statement
    fn parse_body(&mut self) -> Stmt {
        if self.check_any(&[Token::End, Token::RBrace, Token::KwElse]) {
            let span = self.current_span();
            return Stmt::Simple {
                expr: self.invalid(ErrorCode::StatementExpected, span),
                terminated: true,
                span,
            };
        }
        self.parse_statement()
    }

    /// Parse `{ statements }`
    pub(crate) fn parse_block(&mut self) -> Stmt {
        let start = self.advance().span.start;
        let statements =
            self.with_colon_allowed(|p| p.parse_statements_until(Some(Token::RBrace)));
        let closed = self.eat(&Token::RBrace).is_some();
        let span = self.span_from(start);

        if !closed {
            let at = self.lexer.source_map().span(span.end, span.end);
            self.diagnostics
                .push(Diagnostic::new(ErrorCode::ScopeNotClosed, at));
        }

        Stmt::Block {
            statements,
            closed,
            span,
        }
    }
}
