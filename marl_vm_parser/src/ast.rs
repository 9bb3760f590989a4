//! Abstract syntax tree for Marl programs
//!
//! Two node families, statements and expressions. Every node carries the
//! source range it was parsed from. Ranges feed validation and editor tooling
//! only; execution ignores them. Broken input is represented in the tree
//! (`Expr::Invalid`, unclosed blocks, unterminated statements) instead of
//! aborting the parse.

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::span::Span;

/// Statement node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// An expression evaluated for its value
    Simple {
        expr: Expr,
        terminated: bool,
        span: Span,
    },
    /// `var name = value` (or `var name`)
    Var {
        declaration: Expr,
        terminated: bool,
        span: Span,
    },
    /// `return [value]`; the payload is `Expr::Empty` when absent
    Return {
        value: Expr,
        terminated: bool,
        span: Span,
    },
    /// `break [payload]`; a payload is grammatical but never valid
    Break { payload: Expr, span: Span },
    /// `continue [payload]`
    Continue { payload: Expr, span: Span },
    If {
        condition: Expr,
        primary: Box<Stmt>,
        secondary: Option<Box<Stmt>>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    /// `{ ... }`; `closed` is false when the closing brace is missing
    Block {
        statements: Vec<Stmt>,
        closed: bool,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Simple { span, .. }
            | Stmt::Var { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Break { span, .. }
            | Stmt::Continue { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Block { span, .. } => *span,
        }
    }
}

/// Literal constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Number(f64),
    Bool(bool),
    Str(String),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    /// `a \ b`, i.e. `b / a`
    LeftDiv,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
    /// `x | f`, i.e. `f(x)`
    Pipe,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::LeftDiv => "\\",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "~=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Pipe => "|",
        }
    }
}

/// Unary operators (prefix and postfix)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    Transpose,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    /// Check if this operator writes back to its operand
    pub fn is_increment(self) -> bool {
        matches!(
            self,
            UnaryOp::PreIncrement
                | UnaryOp::PreDecrement
                | UnaryOp::PostIncrement
                | UnaryOp::PostDecrement
        )
    }
}

/// Parameter list of a function literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Each entry should be an `Expr::Variable`; anything else is reported
    /// by the validator.
    pub items: Vec<Expr>,
    pub span: Span,
}

impl Parameters {
    /// Names of the well-formed parameters, in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            Expr::Variable { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }
}

/// `key: value` entry of an object literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub name_span: Span,
    pub value: Expr,
    pub span: Span,
}

/// Expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Constant {
        value: Literal,
        span: Span,
    },
    Variable {
        name: String,
        span: Span,
    },
    /// Absent expression (`return;`, `if () ...`, a bare `;`)
    Empty {
        span: Span,
    },
    /// Parser recovery marker
    Invalid {
        code: ErrorCode,
        span: Span,
    },
    Assignment {
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Conditional {
        condition: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
        span: Span,
    },
    /// `from:to` or `from:step:to`
    Range {
        from: Box<Expr>,
        step: Option<Box<Expr>>,
        to: Box<Expr>,
        span: Span,
    },
    /// `(a, b) => body` or `a => body`
    Function {
        parameters: Parameters,
        body: Box<Stmt>,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        span: Span,
    },
    /// `object.member`
    Member {
        object: Box<Expr>,
        member: String,
        span: Span,
    },
    /// `[a, b; c, d]`
    Matrix {
        rows: Vec<Vec<Expr>>,
        span: Span,
    },
    /// `new { key: value }`
    Object {
        properties: Vec<Property>,
        span: Span,
    },
    /// `new [a, b, c]`
    List {
        elements: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Constant { span, .. }
            | Expr::Variable { span, .. }
            | Expr::Empty { span }
            | Expr::Invalid { span, .. }
            | Expr::Assignment { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::Range { span, .. }
            | Expr::Function { span, .. }
            | Expr::Call { span, .. }
            | Expr::Member { span, .. }
            | Expr::Matrix { span, .. }
            | Expr::Object { span, .. }
            | Expr::List { span, .. } => *span,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Expr::Empty { .. })
    }

    /// Check if this expression may appear on the left of `=`
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Expr::Variable { .. } | Expr::Call { .. } | Expr::Member { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_names_skip_malformed_items() {
        let params = Parameters {
            items: vec![
                Expr::Variable {
                    name: "x".into(),
                    span: Span::from_offsets(1, 2),
                },
                Expr::Constant {
                    value: Literal::Number(1.0),
                    span: Span::from_offsets(4, 5),
                },
                Expr::Variable {
                    name: "y".into(),
                    span: Span::from_offsets(7, 8),
                },
            ],
            span: Span::from_offsets(0, 9),
        };

        assert_eq!(params.names().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_assignable() {
        let span = Span::default();
        let var = Expr::Variable {
            name: "a".into(),
            span,
        };
        let constant = Expr::Constant {
            value: Literal::Bool(true),
            span,
        };

        assert!(var.is_assignable());
        assert!(!constant.is_assignable());
    }

    #[test]
    fn test_serialize_round_trip_preserves_shape() {
        let stmt = Stmt::Break {
            payload: Expr::Empty {
                span: Span::from_offsets(5, 5),
            },
            span: Span::from_offsets(0, 5),
        };

        let json = serde_json::to_string(&stmt).unwrap();
        assert!(json.contains("Break"));
        let back: Stmt = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stmt);
    }
}
