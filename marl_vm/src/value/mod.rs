//! Runtime values.
//!
//! Scalars are stored inline. Matrices, objects and lists are shared mutable
//! references: assigning one to another variable aliases it, and `l(i) = v`
//! or `o.k = v` is visible through every alias.

mod function;
mod matrix;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

pub use function::{Function, FunctionKind, NativeFn};
pub use matrix::Matrix;

pub type MatrixRef = Rc<RefCell<Matrix>>;
pub type ObjectRef = Rc<RefCell<IndexMap<String, Value>>>;
pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// Integers up to this magnitude are exactly representable as `f64`
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value; the result of every failed call or lookup
    #[default]
    Nothing,
    Number(f64),
    Bool(bool),
    Str(String),
    Matrix(MatrixRef),
    Object(ObjectRef),
    List(ListRef),
    Function(Function),
}

/// Kind names as reported by `type(x)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Undefined,
    Number,
    Boolean,
    String,
    Matrix,
    Object,
    List,
    Function,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Undefined => "Undefined",
            ValueType::Number => "Number",
            ValueType::Boolean => "Boolean",
            ValueType::String => "String",
            ValueType::Matrix => "Matrix",
            ValueType::Object => "Object",
            ValueType::List => "List",
            ValueType::Function => "Function",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn matrix(matrix: Matrix) -> Self {
        Value::Matrix(Rc::new(RefCell::new(matrix)))
    }

    pub fn object(entries: IndexMap<String, Value>) -> Self {
        Value::Object(Rc::new(RefCell::new(entries)))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Nothing => ValueType::Undefined,
            Value::Number(_) => ValueType::Number,
            Value::Bool(_) => ValueType::Boolean,
            Value::Str(_) => ValueType::String,
            Value::Matrix(_) => ValueType::Matrix,
            Value::Object(_) => ValueType::Object,
            Value::List(_) => ValueType::List,
            Value::Function(_) => ValueType::Function,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Value::Nothing)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nothing => false,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
            Value::Matrix(m) => {
                let m = m.borrow();
                !m.is_empty() && m.to_row_major().iter().all(|x| *x != 0.0)
            }
            Value::Object(_) | Value::List(_) | Value::Function(_) => true,
        }
    }

    /// Numeric view used by arithmetic: numbers, and booleans as 1/0
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// A non-negative integral number usable as an index. Booleans do not qualify.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n <= usize::MAX as f64 => {
                Some(*n as usize)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Snapshot of a matrix value, or a 1×1 matrix for a scalar
    pub fn to_matrix(&self) -> Option<Matrix> {
        match self {
            Value::Matrix(m) => Some(m.borrow().clone()),
            other => other.as_number().map(|n| Matrix::row_vector(vec![n])),
        }
    }

    /// Render as a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Nothing | Value::Function(_) => Json::Null,
            // Integral values print without a fraction, as in `format_number`
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER => {
                Json::from(*n as i64)
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Bool(b) => Json::Bool(*b),
            Value::Str(s) => Json::String(s.clone()),
            Value::Matrix(m) => Json::Array(
                m.borrow()
                    .to_rows()
                    .into_iter()
                    .map(|row| {
                        Json::Array(
                            row.into_iter()
                                .map(|x| Value::Number(x).to_json())
                                .collect(),
                        )
                    })
                    .collect(),
            ),
            Value::Object(o) => Json::Object(
                o.borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::List(l) => Json::Array(l.borrow().iter().map(Value::to_json).collect()),
        }
    }

    /// Nested rendering: strings are quoted inside collections
    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

/// Integral values print without a fractional part
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nothing => f.write_str("undefined"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => f.write_str(s),
            Value::Matrix(m) => write!(f, "{}", m.borrow()),
            Value::Object(o) => {
                let o = o.borrow();
                if o.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, (key, value)) in o.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: ", key)?;
                    value.fmt_nested(f)?;
                }
                f.write_str(" }")
            }
            Value::List(l) => {
                f.write_str("list(")?;
                for (i, item) in l.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                f.write_str(")")
            }
            Value::Function(_) => f.write_str("[Function]"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nothing => f.write_str("Nothing"),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Matrix(m) => write!(f, "Matrix({})", m.borrow()),
            Value::Object(_) | Value::List(_) => write!(f, "{}({})", self.type_name(), self),
            Value::Function(func) => write!(f, "{:?}", func),
        }
    }
}

/// Structural equality, except functions which compare by identity
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nothing, Value::Nothing) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Matrix(a), Value::Matrix(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Matrix> for Value {
    fn from(m: Matrix) -> Self {
        Value::matrix(m)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}
