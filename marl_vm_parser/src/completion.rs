//! Editor completion
//!
//! Walks a parsed program to find what can be typed at a cursor position.
//! Statement positions offer statement keywords (plus `break`/`continue`
//! inside a loop body). Expression positions offer expression keywords and
//! every visible symbol. Parameter lists and object keys offer nothing: the
//! walker records an empty placeholder there so no enclosing node falls back
//! to keywords, and the placeholder is dropped from the final answer.

use std::collections::BTreeSet;

use crate::ast::{Expr, Stmt};

pub const STATEMENT_KEYWORDS: [&str; 4] = ["if", "return", "var", "while"];
pub const LOOP_KEYWORDS: [&str; 2] = ["break", "continue"];
pub const EXPRESSION_KEYWORDS: [&str; 3] = ["false", "new", "true"];

#[derive(Debug)]
struct CompletionContext<'a> {
    position: usize,
    symbols: &'a [String],
    /// Innermost last; `true` while inside a loop body
    breakable: Vec<bool>,
    /// Visible names per function scope; index 0 holds the program level
    variables: Vec<Vec<String>>,
    found: Vec<String>,
}

impl CompletionContext<'_> {
    fn add_statement_keywords(&mut self) {
        self.found
            .extend(STATEMENT_KEYWORDS.iter().map(|k| k.to_string()));
        if self.breakable.last().copied().unwrap_or(false) {
            self.found.extend(LOOP_KEYWORDS.iter().map(|k| k.to_string()));
        }
    }

    fn add_expression_keywords(&mut self) {
        self.found
            .extend(EXPRESSION_KEYWORDS.iter().map(|k| k.to_string()));
        self.found.extend(self.variables.iter().flatten().cloned());
        self.found.extend(self.symbols.iter().cloned());
    }

    /// Placeholder that suppresses every fallback suggestion
    fn suppress(&mut self) {
        self.found.push(String::new());
    }

    fn declare_local(&mut self, name: &str) {
        if let Some(scope) = self.variables.last_mut() {
            if !scope.iter().any(|v| v == name) {
                scope.push(name.to_string());
            }
        }
    }

    /// Plain assignments create program-level names unless already visible locally
    fn declare_assigned(&mut self, name: &str) {
        let local = self
            .variables
            .last()
            .is_some_and(|scope| scope.iter().any(|v| v == name));
        let global = self.variables[0].iter().any(|v| v == name);
        if !local && !global {
            self.variables[0].push(name.to_string());
        }
    }
}

/// Suggestions for the cursor at byte offset `position`, sorted and deduplicated.
///
/// `symbols` are externally known names (globals, natives) offered wherever
/// an expression may be typed.
pub fn completions(statements: &[Stmt], position: usize, symbols: &[String]) -> Vec<String> {
    let mut ctx = CompletionContext {
        position,
        symbols,
        breakable: vec![false],
        variables: vec![Vec::new()],
        found: Vec::new(),
    };

    for stmt in statements {
        visit_stmt(stmt, &mut ctx);
    }
    // The program itself is a block spanning the whole text
    if ctx.found.is_empty() {
        ctx.add_statement_keywords();
        ctx.add_expression_keywords();
    }

    ctx.found
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn visit_stmt(stmt: &Stmt, ctx: &mut CompletionContext<'_>) {
    let within = stmt.span().touches(ctx.position);

    match stmt {
        Stmt::Simple { expr, span, .. } => {
            if span.start == ctx.position {
                ctx.add_statement_keywords();
            }
            visit_expr(expr, ctx);
        }
        Stmt::Var { declaration, .. } => {
            let name = match declaration {
                Expr::Variable { name, .. } => Some(name),
                Expr::Assignment { target, .. } => match target.as_ref() {
                    Expr::Variable { name, .. } => Some(name),
                    _ => None,
                },
                _ => None,
            };
            if let Some(name) = name {
                ctx.declare_local(name);
            }
            if within {
                match declaration {
                    Expr::Assignment { value, .. } => visit_expr(value, ctx),
                    // Naming a new variable: nothing to suggest
                    _ => ctx.suppress(),
                }
            }
        }
        Stmt::Return { value, .. } => visit_expr(value, ctx),
        Stmt::Break { payload, .. } | Stmt::Continue { payload, .. } => visit_expr(payload, ctx),
        Stmt::If {
            condition,
            primary,
            secondary,
            ..
        } => {
            visit_expr(condition, ctx);
            visit_stmt(primary, ctx);
            if let Some(secondary) = secondary {
                visit_stmt(secondary, ctx);
            }
        }
        Stmt::While {
            condition, body, ..
        } => {
            visit_expr(condition, ctx);
            ctx.breakable.push(true);
            visit_stmt(body, ctx);
            ctx.breakable.pop();
        }
        Stmt::Block { statements, .. } => {
            let before = ctx.found.len();
            for stmt in statements {
                visit_stmt(stmt, ctx);
            }
            if within && ctx.found.len() == before {
                ctx.add_statement_keywords();
                ctx.add_expression_keywords();
            }
        }
    }
}

fn visit_expr(expr: &Expr, ctx: &mut CompletionContext<'_>) {
    let within = expr.span().touches(ctx.position);

    match expr {
        Expr::Constant { .. } => {}
        Expr::Variable { .. } | Expr::Empty { .. } | Expr::Invalid { .. } => {
            if within {
                ctx.add_expression_keywords();
            }
        }
        Expr::Assignment { target, value, .. } => {
            if let Expr::Variable { name, .. } = target.as_ref() {
                ctx.declare_assigned(name);
            }
            if within {
                visit_children(ctx, |ctx| {
                    if !matches!(target.as_ref(), Expr::Variable { .. }) {
                        visit_expr(target, ctx);
                    }
                    visit_expr(value, ctx);
                });
            }
        }
        Expr::Function {
            parameters, body, ..
        } => {
            if !within {
                return;
            }
            ctx.breakable.push(false);
            ctx.variables.push(Vec::new());
            for name in parameters.names() {
                ctx.declare_local(name);
            }
            if parameters.span.touches(ctx.position) {
                ctx.suppress();
            } else {
                visit_stmt(body, ctx);
            }
            ctx.variables.pop();
            ctx.breakable.pop();
        }
        Expr::Object { properties, .. } => {
            if !within {
                return;
            }
            let before = ctx.found.len();
            for property in properties {
                if property.name_span.touches(ctx.position) {
                    ctx.suppress();
                } else {
                    visit_expr(&property.value, ctx);
                }
            }
            // Between properties the next thing typed is a key
            if ctx.found.len() == before {
                ctx.suppress();
            }
        }
        _ if !within => {}
        Expr::Binary { left, right, .. } => visit_children(ctx, |ctx| {
            visit_expr(left, ctx);
            visit_expr(right, ctx);
        }),
        Expr::Unary { operand, .. } => visit_children(ctx, |ctx| visit_expr(operand, ctx)),
        Expr::Member { object, .. } => visit_children(ctx, |ctx| visit_expr(object, ctx)),
        Expr::Conditional {
            condition,
            then_value,
            else_value,
            ..
        } => visit_children(ctx, |ctx| {
            visit_expr(condition, ctx);
            visit_expr(then_value, ctx);
            visit_expr(else_value, ctx);
        }),
        Expr::Range { from, step, to, .. } => visit_children(ctx, |ctx| {
            visit_expr(from, ctx);
            if let Some(step) = step {
                visit_expr(step, ctx);
            }
            visit_expr(to, ctx);
        }),
        Expr::Call {
            callee, arguments, ..
        } => visit_children(ctx, |ctx| {
            visit_expr(callee, ctx);
            for argument in arguments {
                visit_expr(argument, ctx);
            }
        }),
        Expr::Matrix { rows, .. } => visit_children(ctx, |ctx| {
            for element in rows.iter().flatten() {
                visit_expr(element, ctx);
            }
        }),
        Expr::List { elements, .. } => visit_children(ctx, |ctx| {
            for element in elements {
                visit_expr(element, ctx);
            }
        }),
    }
}

/// Visit the children of a composite expression the cursor is in; when no
/// child claims the cursor, the composite offers expression suggestions itself.
fn visit_children<'a>(
    ctx: &mut CompletionContext<'a>,
    visit: impl FnOnce(&mut CompletionContext<'a>),
) {
    let before = ctx.found.len();
    visit(ctx);
    if ctx.found.len() == before {
        ctx.add_expression_keywords();
    }
}
