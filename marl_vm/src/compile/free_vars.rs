//! Free variable analysis for function literals.
//!
//! These functions are pure and independent of the `Compiler`:
//! - `analyze_free_variables`: entry point for a function literal
//! - `analyze_stmt_free_vars`: analyzes a `Stmt`
//! - `analyze_expr_free_vars`: analyzes an `Expr`
//!
//! A name is free when the body reads or assigns it without a parameter or
//! `var` declaration binding it first. Nested functions contribute their own
//! free names minus what the enclosing body has bound.

use std::collections::{BTreeSet, HashSet};

use marl_vm_parser::{Expr, Parameters, Stmt};

/// Name of the implicit variadic binding
pub(crate) const ARGS_NAME: &str = "args";

/// Free names of a function literal, sorted
pub(crate) fn analyze_free_variables(parameters: &Parameters, body: &Stmt) -> Vec<String> {
    let mut local_vars: HashSet<String> = parameters.names().map(str::to_string).collect();
    local_vars.insert(ARGS_NAME.to_string());
    let mut free_vars = BTreeSet::new();

    analyze_stmt_free_vars(body, &mut local_vars, &mut free_vars);

    free_vars.into_iter().collect()
}

fn analyze_stmt_free_vars(
    stmt: &Stmt,
    local_vars: &mut HashSet<String>,
    free_vars: &mut BTreeSet<String>,
) {
    match stmt {
        Stmt::Simple { expr, .. } => analyze_expr_free_vars(expr, local_vars, free_vars),
        Stmt::Var { declaration, .. } => match declaration {
            Expr::Variable { name, .. } => {
                local_vars.insert(name.clone());
            }
            Expr::Assignment { target, value, .. } => {
                analyze_expr_free_vars(value, local_vars, free_vars);
                if let Expr::Variable { name, .. } = target.as_ref() {
                    local_vars.insert(name.clone());
                }
            }
            other => analyze_expr_free_vars(other, local_vars, free_vars),
        },
        Stmt::Return { value, .. } => analyze_expr_free_vars(value, local_vars, free_vars),
        // Payloads are never evaluated
        Stmt::Break { .. } | Stmt::Continue { .. } => {}
        Stmt::If {
            condition,
            primary,
            secondary,
            ..
        } => {
            analyze_expr_free_vars(condition, local_vars, free_vars);
            analyze_stmt_free_vars(primary, local_vars, free_vars);
            if let Some(secondary) = secondary {
                analyze_stmt_free_vars(secondary, local_vars, free_vars);
            }
        }
        Stmt::While {
            condition, body, ..
        } => {
            analyze_expr_free_vars(condition, local_vars, free_vars);
            analyze_stmt_free_vars(body, local_vars, free_vars);
        }
        Stmt::Block { statements, .. } => {
            for stmt in statements {
                analyze_stmt_free_vars(stmt, local_vars, free_vars);
            }
        }
    }
}

fn analyze_expr_free_vars(
    expr: &Expr,
    local_vars: &mut HashSet<String>,
    free_vars: &mut BTreeSet<String>,
) {
    match expr {
        Expr::Constant { .. } | Expr::Empty { .. } | Expr::Invalid { .. } => {}
        Expr::Variable { name, .. } => {
            if !local_vars.contains(name) {
                free_vars.insert(name.clone());
            }
        }
        Expr::Assignment { target, value, .. } => {
            analyze_expr_free_vars(value, local_vars, free_vars);
            analyze_expr_free_vars(target, local_vars, free_vars);
        }
        Expr::Binary { left, right, .. } => {
            analyze_expr_free_vars(left, local_vars, free_vars);
            analyze_expr_free_vars(right, local_vars, free_vars);
        }
        Expr::Unary { operand, .. } | Expr::Member {
            object: operand, ..
        } => analyze_expr_free_vars(operand, local_vars, free_vars),
        Expr::Conditional {
            condition,
            then_value,
            else_value,
            ..
        } => {
            analyze_expr_free_vars(condition, local_vars, free_vars);
            analyze_expr_free_vars(then_value, local_vars, free_vars);
            analyze_expr_free_vars(else_value, local_vars, free_vars);
        }
        Expr::Range { from, step, to, .. } => {
            analyze_expr_free_vars(from, local_vars, free_vars);
            if let Some(step) = step {
                analyze_expr_free_vars(step, local_vars, free_vars);
            }
            analyze_expr_free_vars(to, local_vars, free_vars);
        }
        Expr::Function {
            parameters, body, ..
        } => {
            for name in analyze_free_variables(parameters, body) {
                if !local_vars.contains(&name) {
                    free_vars.insert(name);
                }
            }
        }
        Expr::Call {
            callee, arguments, ..
        } => {
            analyze_expr_free_vars(callee, local_vars, free_vars);
            for argument in arguments {
                analyze_expr_free_vars(argument, local_vars, free_vars);
            }
        }
        Expr::Matrix { rows, .. } => {
            for element in rows.iter().flatten() {
                analyze_expr_free_vars(element, local_vars, free_vars);
            }
        }
        Expr::Object { properties, .. } => {
            for property in properties {
                analyze_expr_free_vars(&property.value, local_vars, free_vars);
            }
        }
        Expr::List { elements, .. } => {
            for element in elements {
                analyze_expr_free_vars(element, local_vars, free_vars);
            }
        }
    }
}

/// Whether a function body receives the implicit `args` binding: not when a
/// parameter is named `args`, nor when the body declares `var args` outside
/// any nested function.
pub(crate) fn binds_args(parameters: &Parameters, body: &Stmt) -> bool {
    !parameters.names().any(|name| name == ARGS_NAME) && !declares_var(body, ARGS_NAME)
}

fn declares_var(stmt: &Stmt, wanted: &str) -> bool {
    match stmt {
        Stmt::Var { declaration, .. } => {
            let target = match declaration {
                Expr::Assignment { target, .. } => target.as_ref(),
                other => other,
            };
            matches!(target, Expr::Variable { name, .. } if name == wanted)
        }
        Stmt::If {
            primary, secondary, ..
        } => {
            declares_var(primary, wanted)
                || secondary
                    .as_ref()
                    .is_some_and(|secondary| declares_var(secondary, wanted))
        }
        Stmt::While { body, .. } => declares_var(body, wanted),
        Stmt::Block { statements, .. } => statements.iter().any(|s| declares_var(s, wanted)),
        Stmt::Simple { .. } | Stmt::Return { .. } | Stmt::Break { .. } | Stmt::Continue { .. } => {
            false
        }
    }
}
