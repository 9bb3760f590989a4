//! Expression parsing (precedence climbing)
//!
//! Handles:
//! - Binary operators, assignment, conditional and range expressions
//! - Prefix operators and postfix call, member access, transpose, increments
//! - Primary expressions, including lambdas `x => body` / `(a, b) => body`

use crate::ast::{BinaryOp, Expr, Literal, Parameters, Stmt, UnaryOp};
use crate::error::ErrorCode;
use crate::token::{Associativity, Precedence, Token};

use super::{parse_number, unescape, Parser};

impl<'a> Parser<'a> {
    // ==================== Expression Parsing ====================

    /// Parse a full expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Expr {
        self.parse_expression_with_precedence(Precedence::Lowest)
    }

    /// Parse an expression with minimum precedence (precedence climbing core)
    pub(crate) fn parse_expression_with_precedence(&mut self, min_prec: Precedence) -> Expr {
        let saved = self.depth;
        let expr = if self.descend() {
            self.parse_operators(min_prec)
        } else {
            self.too_deep()
        };
        self.depth = saved;
        expr
    }

    fn parse_operators(&mut self, min_prec: Precedence) -> Expr {
        let mut left = self.parse_prefix();

        loop {
            let token = self.current.token;
            let Some((prec, assoc)) = token.binary_precedence() else {
                break;
            };
            if prec < min_prec {
                break;
            }
            // Each operator wraps `left` one level deeper
            self.depth += 1;

            match token {
                Token::Question => {
                    left = self.parse_conditional(left);
                    continue;
                }
                // Inside the first branch of `?:` the colon belongs to the conditional
                Token::Colon if self.stop_at_colon => break,
                Token::Colon => {
                    left = self.parse_range(left);
                    continue;
                }
                _ => {}
            }

            self.advance();
            let next_prec = match assoc {
                Associativity::Left => prec.tighter(),
                Associativity::Right => prec,
            };
            let right = self.parse_expression_with_precedence(next_prec);
            let span = left.span().merge(&right.span());

            left = match binary_op(token) {
                Some(op) => Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                },
                None => Expr::Assignment {
                    target: Box::new(left),
                    value: Box::new(right),
                    span,
                },
            };
        }

        left
    }

    /// Parse `condition ? then_value : else_value`
    fn parse_conditional(&mut self, condition: Expr) -> Expr {
        self.advance();
        let saved = std::mem::replace(&mut self.stop_at_colon, true);
        let then_value = self.parse_expression_with_precedence(Precedence::Conditional);
        self.stop_at_colon = saved;

        let else_value = if self.eat(&Token::Colon).is_some() {
            self.parse_expression_with_precedence(Precedence::Conditional)
        } else {
            let span = self.current_span();
            self.invalid(ErrorCode::ColonExpected, span)
        };

        let span = condition.span().merge(&else_value.span());
        Expr::Conditional {
            condition: Box::new(condition),
            then_value: Box::new(then_value),
            else_value: Box::new(else_value),
            span,
        }
    }

    /// Parse `from:to` or `from:step:to`
    fn parse_range(&mut self, from: Expr) -> Expr {
        self.advance();
        let second = self.parse_expression_with_precedence(Precedence::Range.tighter());

        let (step, to) = if !self.stop_at_colon && self.eat(&Token::Colon).is_some() {
            let to = self.parse_expression_with_precedence(Precedence::Range.tighter());
            (Some(Box::new(second)), to)
        } else {
            (None, second)
        };

        let span = from.span().merge(&to.span());
        Expr::Range {
            from: Box::new(from),
            step,
            to: Box::new(to),
            span,
        }
    }

    /// Parse a prefix expression (unary operator or primary with postfixes)
    pub(crate) fn parse_prefix(&mut self) -> Expr {
        let op = match self.current.token {
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Plus,
            Token::Tilde | Token::Bang => UnaryOp::Not,
            Token::PlusPlus => UnaryOp::PreIncrement,
            Token::MinusMinus => UnaryOp::PreDecrement,
            _ => {
                let primary = self.parse_primary();
                return self.parse_postfix(primary);
            }
        };

        let op_token = self.advance();
        // Power binds tighter than prefix operators: -2^2 == -(2^2)
        let operand = self.parse_expression_with_precedence(Precedence::Power);
        let span = op_token.span.merge(&operand.span());
        Expr::Unary {
            op,
            operand: Box::new(operand),
            span,
        }
    }

    // ==================== Postfix Operations ====================

    fn parse_postfix(&mut self, mut expr: Expr) -> Expr {
        loop {
            let wraps = matches!(
                self.current.token,
                Token::LParen | Token::Dot | Token::Quote | Token::PlusPlus | Token::MinusMinus
            );
            if wraps && !self.descend() {
                return self.too_deep();
            }
            expr = match self.current.token {
                Token::LParen => self.parse_call(expr),
                Token::Dot => self.parse_member(expr),
                Token::Quote => self.postfix_unary(expr, UnaryOp::Transpose),
                Token::PlusPlus => self.postfix_unary(expr, UnaryOp::PostIncrement),
                Token::MinusMinus => self.postfix_unary(expr, UnaryOp::PostDecrement),
                _ => return expr,
            };
        }
    }

    fn postfix_unary(&mut self, operand: Expr, op: UnaryOp) -> Expr {
        let op_token = self.advance();
        let span = operand.span().merge(&op_token.span);
        Expr::Unary {
            op,
            operand: Box::new(operand),
            span,
        }
    }

    /// Parse `callee(arguments)`; any expression can be called
    fn parse_call(&mut self, callee: Expr) -> Expr {
        self.advance();
        let (mut arguments, closed) =
            self.with_colon_allowed(|p| p.parse_comma_list(Token::RParen));
        if !closed {
            let span = self.current_span();
            arguments.push(self.invalid(ErrorCode::GroupNotClosed, span));
        }

        let span = self.span_from(callee.span().start);
        Expr::Call {
            callee: Box::new(callee),
            arguments,
            span,
        }
    }

    /// Parse `object.member`
    fn parse_member(&mut self, object: Expr) -> Expr {
        self.advance();
        if !self.check(&Token::Identifier) && !self.current.token.is_keyword() {
            let span = object.span().merge(&self.current_span());
            return self.invalid(ErrorCode::IdentifierExpected, span);
        }

        let name = self.advance();
        let span = object.span().merge(&name.span);
        Expr::Member {
            object: Box::new(object),
            member: name.text.to_string(),
            span,
        }
    }

    // ==================== Primary Expressions ====================

    pub(crate) fn parse_primary(&mut self) -> Expr {
        let token = self.current;

        match token.token {
            Token::DecimalLiteral
            | Token::FloatLiteral
            | Token::HexLiteral
            | Token::BinaryLiteral => {
                self.advance();
                Expr::Constant {
                    value: Literal::Number(parse_number(token.token, token.text)),
                    span: token.span,
                }
            }
            Token::StringLiteral => {
                self.advance();
                let body = &token.text[1..token.text.len() - 1];
                Expr::Constant {
                    value: Literal::Str(unescape(body)),
                    span: token.span,
                }
            }
            Token::True | Token::False => {
                self.advance();
                Expr::Constant {
                    value: Literal::Bool(token.token == Token::True),
                    span: token.span,
                }
            }
            Token::Identifier => {
                if self.peek_next() == Token::FatArrow {
                    return self.parse_single_parameter_lambda();
                }
                self.advance();
                Expr::Variable {
                    name: token.text.to_string(),
                    span: token.span,
                }
            }
            Token::LParen => self.parse_group_or_lambda(),
            Token::LBracket => self.parse_matrix(),
            Token::KwNew => self.parse_new(),
            Token::UnterminatedString => {
                self.advance();
                self.invalid(ErrorCode::StringNotTerminated, token.span)
            }
            Token::Unknown => {
                self.advance();
                self.invalid(ErrorCode::UnknownSymbol, token.span)
            }
            // Leave the token for the statement level to deal with
            _ => self.invalid(ErrorCode::ExpressionExpected, token.span),
        }
    }

    /// Parse `( expr )`, or the parameter list of `(a, b) => body`
    fn parse_group_or_lambda(&mut self) -> Expr {
        let open = self.advance();
        let (items, closed) = self.with_colon_allowed(|p| p.parse_comma_list(Token::RParen));

        if closed && self.check(&Token::FatArrow) {
            let parameters = Parameters {
                items,
                span: self.span_from(open.span.start),
            };
            return self.parse_lambda_body(parameters);
        }

        let span = self.span_from(open.span.start);
        if !closed {
            return self.invalid(ErrorCode::GroupNotClosed, span);
        }

        let mut items = items;
        match items.len() {
            0 => self.invalid(ErrorCode::ExpressionExpected, span),
            1 => items.remove(0),
            _ => {
                let at = self.current_span();
                self.invalid(ErrorCode::ArrowExpected, at)
            }
        }
    }

    /// Parse `name => body`
    fn parse_single_parameter_lambda(&mut self) -> Expr {
        let name = self.advance();
        let parameters = Parameters {
            items: vec![Expr::Variable {
                name: name.text.to_string(),
                span: name.span,
            }],
            span: name.span,
        };
        self.parse_lambda_body(parameters)
    }

    /// Parse `=> body` where body is a block or an expression
    fn parse_lambda_body(&mut self, parameters: Parameters) -> Expr {
        self.advance();

        let body = if self.check(&Token::LBrace) {
            self.parse_block()
        } else {
            let expr = self.parse_expression();
            let span = expr.span();
            Stmt::Simple {
                expr,
                terminated: true,
                span,
            }
        };

        let span = parameters.span.merge(&body.span());
        Expr::Function {
            parameters,
            body: Box::new(body),
            span,
        }
    }

    /// Parse comma-separated expressions up to `closing`.
    /// Returns the items and whether the closing token was found.
    pub(crate) fn parse_comma_list(&mut self, closing: Token) -> (Vec<Expr>, bool) {
        let mut items = Vec::new();
        if self.eat(&closing).is_some() {
            return (items, true);
        }

        loop {
            items.push(self.parse_expression());
            if self.eat(&Token::Comma).is_some() {
                continue;
            }
            return (items, self.eat(&closing).is_some());
        }
    }
}

fn binary_op(token: Token) -> Option<BinaryOp> {
    Some(match token {
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Backslash => BinaryOp::LeftDiv,
        Token::Percent => BinaryOp::Mod,
        Token::Caret => BinaryOp::Pow,
        Token::EqEq => BinaryOp::Eq,
        Token::TildeEq | Token::BangEq => BinaryOp::NotEq,
        Token::Lt => BinaryOp::Lt,
        Token::Gt => BinaryOp::Gt,
        Token::LtEq => BinaryOp::LtEq,
        Token::GtEq => BinaryOp::GtEq,
        Token::AndAnd => BinaryOp::And,
        Token::OrOr => BinaryOp::Or,
        Token::Pipe => BinaryOp::Pipe,
        _ => return None,
    })
}
