//! Operators and literal construction.
//!
//! Every function here is total: an unsupported operand combination yields
//! `Nothing`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::cmp::Ordering;

use marl_vm_parser::{BinaryOp, UnaryOp};

use super::call::MAX_LIST_INDEX;
use crate::value::{Matrix, Value};

/// Operand view used by arithmetic
enum Numeric {
    Scalar(f64),
    Matrix(Matrix),
}

fn numeric(value: &Value) -> Option<Numeric> {
    match value {
        Value::Matrix(m) => Some(Numeric::Matrix(m.borrow().clone())),
        other => other.as_number().map(Numeric::Scalar),
    }
}

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Str(a), b) => Value::Str(format!("{}{}", a, b)),
            (a, Value::Str(b)) => Value::Str(format!("{}{}", a, b)),
            _ => elementwise(left, right, |a, b| a + b),
        },
        BinaryOp::Sub => elementwise(left, right, |a, b| a - b),
        BinaryOp::Div => elementwise(left, right, |a, b| a / b),
        BinaryOp::LeftDiv => elementwise(right, left, |a, b| a / b),
        BinaryOp::Mod => elementwise(left, right, |a, b| a % b),
        BinaryOp::Mul => multiply(left, right),
        BinaryOp::Pow => power(left, right),
        BinaryOp::Eq => Value::Bool(left == right),
        BinaryOp::NotEq => Value::Bool(left != right),
        BinaryOp::Lt => compare(left, right, Ordering::is_lt),
        BinaryOp::Gt => compare(left, right, Ordering::is_gt),
        BinaryOp::LtEq => compare(left, right, Ordering::is_le),
        BinaryOp::GtEq => compare(left, right, Ordering::is_ge),
        // Short-circuit forms are lowered by the compiler; these cover direct calls
        BinaryOp::And => Value::Bool(left.is_truthy() && right.is_truthy()),
        BinaryOp::Or => Value::Bool(left.is_truthy() || right.is_truthy()),
        BinaryOp::Pipe => crate::vm::call::invoke(right, std::slice::from_ref(left)),
    }
}

fn elementwise(left: &Value, right: &Value, f: impl Fn(f64, f64) -> f64) -> Value {
    match (numeric(left), numeric(right)) {
        (Some(Numeric::Scalar(a)), Some(Numeric::Scalar(b))) => Value::Number(f(a, b)),
        (Some(Numeric::Matrix(a)), Some(Numeric::Scalar(b))) => Value::matrix(a.map(|x| f(x, b))),
        (Some(Numeric::Scalar(a)), Some(Numeric::Matrix(b))) => Value::matrix(b.map(|x| f(a, x))),
        (Some(Numeric::Matrix(a)), Some(Numeric::Matrix(b))) => {
            a.zip_map(&b, f).map(Value::matrix).unwrap_or_default()
        }
        _ => Value::Nothing,
    }
}

fn multiply(left: &Value, right: &Value) -> Value {
    match (numeric(left), numeric(right)) {
        (Some(Numeric::Matrix(a)), Some(Numeric::Matrix(b))) => {
            a.product(&b).map(Value::matrix).unwrap_or_default()
        }
        _ => elementwise(left, right, |a, b| a * b),
    }
}

fn power(left: &Value, right: &Value) -> Value {
    match (numeric(left), numeric(right)) {
        (Some(Numeric::Scalar(a)), Some(Numeric::Scalar(b))) => Value::Number(a.powf(b)),
        (Some(Numeric::Matrix(a)), Some(Numeric::Scalar(b))) => {
            Value::matrix(a.map(|x| x.powf(b)))
        }
        _ => Value::Nothing,
    }
}

fn compare(left: &Value, right: &Value, accept: fn(Ordering) -> bool) -> Value {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => return Value::Nothing,
        },
    };
    // NaN compares false either way
    Value::Bool(ordering.is_some_and(accept))
}

pub fn unary(op: UnaryOp, operand: &Value) -> Value {
    match op {
        UnaryOp::Not => Value::Bool(!operand.is_truthy()),
        UnaryOp::Neg => match numeric(operand) {
            Some(Numeric::Scalar(n)) => Value::Number(-n),
            Some(Numeric::Matrix(m)) => Value::matrix(m.map(|x| -x)),
            None => Value::Nothing,
        },
        UnaryOp::Plus => match numeric(operand) {
            Some(Numeric::Scalar(n)) => Value::Number(n),
            Some(Numeric::Matrix(m)) => Value::matrix(m),
            None => Value::Nothing,
        },
        UnaryOp::Transpose => match numeric(operand) {
            Some(Numeric::Scalar(n)) => Value::Number(n),
            Some(Numeric::Matrix(m)) => Value::matrix(m.transpose()),
            None => Value::Nothing,
        },
        UnaryOp::PreIncrement | UnaryOp::PostIncrement => {
            binary(BinaryOp::Add, operand, &Value::Number(1.0))
        }
        UnaryOp::PreDecrement | UnaryOp::PostDecrement => {
            binary(BinaryOp::Sub, operand, &Value::Number(1.0))
        }
    }
}

/// Matrix literal from its elements in row-major order. Only numbers and
/// booleans are accepted; a ragged literal is padded with zeros.
pub fn make_matrix(row_lengths: &[usize], elements: Vec<Value>) -> Value {
    let mut elements = elements.into_iter();
    let mut rows = Vec::with_capacity(row_lengths.len());
    for &len in row_lengths {
        let mut row = Vec::with_capacity(len);
        for element in elements.by_ref().take(len) {
            match element.as_number() {
                Some(n) => row.push(n),
                None => return Value::Nothing,
            }
        }
        rows.push(row);
    }
    Value::matrix(Matrix::from_rows(&rows))
}

/// Row vector `from, from + step, ...` up to and including `to`
pub fn make_range(from: &Value, step: &Value, to: &Value) -> Value {
    let (Some(from), Some(step), Some(to)) = (from.as_number(), step.as_number(), to.as_number())
    else {
        return Value::Nothing;
    };
    if !(from.is_finite() && step.is_finite() && to.is_finite()) || step == 0.0 {
        return Value::Nothing;
    }
    let span = (to - from) / step;
    if span < 0.0 {
        return Value::matrix(Matrix::empty());
    }
    // Tolerate rounding in fractional steps such as 0:0.1:1
    let count = (span + 1e-10).floor() + 1.0;
    if count > MAX_LIST_INDEX as f64 {
        return Value::Nothing;
    }
    let count = count as usize;
    let values = (0..count).map(|i| from + step * i as f64).collect();
    Value::matrix(Matrix::row_vector(values))
}
