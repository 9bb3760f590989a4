//! Static validation of a parsed program
//!
//! One non-mutating pass over the tree. Diagnostics come out in traversal
//! order and include every recovery marker the parser left behind, so this
//! list is the one an embedder should gate execution on.

use crate::ast::{Expr, Stmt};
use crate::error::{Diagnostic, ErrorCode};
use crate::span::Span;

/// State carried while walking the tree
#[derive(Debug)]
struct ValidationContext {
    /// One entry per enclosing loop/function boundary: `true` inside a
    /// `while` body, `false` for the program and for each function body.
    loops: Vec<bool>,
    diagnostics: Vec<Diagnostic>,
}

impl ValidationContext {
    fn in_loop(&self) -> bool {
        self.loops.last().copied().unwrap_or(false)
    }

    fn report(&mut self, code: ErrorCode, span: Span) {
        self.diagnostics.push(Diagnostic::new(code, span));
    }

    /// Report a missing terminator right after `span`
    fn report_terminator(&mut self, span: Span) {
        self.report(ErrorCode::TerminatorExpected, point_after(span));
    }
}

/// Zero-width span at the end of `span`
fn point_after(span: Span) -> Span {
    Span {
        start: span.end,
        start_line: span.end_line,
        start_column: span.end_column,
        ..span
    }
}

/// Validate a statement list, returning diagnostics in traversal order
pub fn validate(statements: &[Stmt]) -> Vec<Diagnostic> {
    let mut ctx = ValidationContext {
        loops: vec![false],
        diagnostics: Vec::new(),
    };
    for stmt in statements {
        validate_stmt(stmt, &mut ctx);
    }
    ctx.diagnostics
}

fn validate_stmt(stmt: &Stmt, ctx: &mut ValidationContext) {
    match stmt {
        Stmt::Simple {
            expr,
            terminated,
            span,
        } => {
            validate_expr(expr, ctx);
            if !terminated {
                ctx.report_terminator(*span);
            }
        }
        Stmt::Var {
            declaration,
            terminated,
            span,
        } => {
            validate_declaration(declaration, ctx);
            if !terminated {
                ctx.report_terminator(*span);
            }
        }
        Stmt::Return {
            value,
            terminated,
            span,
        } => {
            validate_expr(value, ctx);
            if !terminated {
                ctx.report_terminator(*span);
            }
        }
        Stmt::Break { payload, span } | Stmt::Continue { payload, span } => {
            if !ctx.in_loop() {
                ctx.report(ErrorCode::LoopMissing, *span);
            }
            if !payload.is_empty() {
                ctx.report(ErrorCode::TerminatorExpected, payload.span());
            }
            validate_expr(payload, ctx);
        }
        Stmt::If {
            condition,
            primary,
            secondary,
            ..
        } => {
            validate_expr(condition, ctx);
            validate_stmt(primary, ctx);
            if let Some(secondary) = secondary {
                validate_stmt(secondary, ctx);
            }
        }
        Stmt::While {
            condition, body, ..
        } => {
            validate_expr(condition, ctx);
            ctx.loops.push(true);
            validate_stmt(body, ctx);
            ctx.loops.pop();
        }
        Stmt::Block {
            statements,
            closed,
            span,
        } => {
            for stmt in statements {
                validate_stmt(stmt, ctx);
            }
            if !closed {
                ctx.report(ErrorCode::ScopeNotClosed, point_after(*span));
            }
        }
    }
}

/// `var` accepts `name` or `name = value`
fn validate_declaration(declaration: &Expr, ctx: &mut ValidationContext) {
    match declaration {
        Expr::Variable { .. } | Expr::Invalid { .. } => validate_expr(declaration, ctx),
        Expr::Assignment { target, value, .. } => {
            match target.as_ref() {
                Expr::Variable { .. } => {}
                Expr::Invalid { .. } => validate_expr(target, ctx),
                other => ctx.report(ErrorCode::IdentifierExpected, other.span()),
            }
            validate_expr(value, ctx);
        }
        other => {
            ctx.report(ErrorCode::IdentifierExpected, other.span());
            validate_expr(other, ctx);
        }
    }
}

fn validate_expr(expr: &Expr, ctx: &mut ValidationContext) {
    match expr {
        Expr::Constant { .. } | Expr::Variable { .. } | Expr::Empty { .. } => {}
        Expr::Invalid { code, span } => ctx.report(*code, *span),
        Expr::Assignment { target, value, .. } => {
            if !target.is_assignable() && !matches!(target.as_ref(), Expr::Invalid { .. }) {
                ctx.report(ErrorCode::AssignableExpected, target.span());
            }
            validate_expr(target, ctx);
            validate_expr(value, ctx);
        }
        Expr::Binary { left, right, .. } => {
            validate_expr(left, ctx);
            validate_expr(right, ctx);
        }
        Expr::Unary { op, operand, .. } => {
            if op.is_increment() && !matches!(operand.as_ref(), Expr::Variable { .. }) {
                ctx.report(ErrorCode::AssignableExpected, operand.span());
            }
            validate_expr(operand, ctx);
        }
        Expr::Conditional {
            condition,
            then_value,
            else_value,
            ..
        } => {
            validate_expr(condition, ctx);
            validate_expr(then_value, ctx);
            validate_expr(else_value, ctx);
        }
        Expr::Range { from, step, to, .. } => {
            validate_expr(from, ctx);
            if let Some(step) = step {
                validate_expr(step, ctx);
            }
            validate_expr(to, ctx);
        }
        Expr::Function {
            parameters, body, ..
        } => {
            for item in &parameters.items {
                match item {
                    Expr::Variable { .. } => {}
                    Expr::Invalid { .. } => validate_expr(item, ctx),
                    other => ctx.report(ErrorCode::IdentifierExpected, other.span()),
                }
            }
            ctx.loops.push(false);
            validate_stmt(body, ctx);
            ctx.loops.pop();
        }
        Expr::Call {
            callee, arguments, ..
        } => {
            validate_expr(callee, ctx);
            for argument in arguments {
                validate_expr(argument, ctx);
            }
        }
        Expr::Member { object, .. } => validate_expr(object, ctx),
        Expr::Matrix { rows, .. } => {
            for element in rows.iter().flatten() {
                validate_expr(element, ctx);
            }
        }
        Expr::Object { properties, .. } => {
            for property in properties {
                validate_expr(&property.value, ctx);
            }
        }
        Expr::List { elements, .. } => {
            for element in elements {
                validate_expr(element, ctx);
            }
        }
    }
}
