//! Conversion between host values and engine values.
//!
//! The registry is a static list of `(from, to, converter)` triples.
//! [`find_converter`] scans it for one exact pair. [`find_converter_to`]
//! builds one lookup table per target type the first time that target is
//! requested and keeps it in a process-wide cache; conversions to
//! [`HostType::Any`] never touch the cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;

use crate::value::{Function, Matrix, Value};

/// Host-side types known to the converter layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostType {
    /// Accepts anything unchanged
    Any,
    Null,
    Bool,
    I32,
    I64,
    F32,
    F64,
    Str,
    /// Flat `Vec<f64>`
    Vector,
    /// Row-major `Vec<Vec<f64>>`
    Matrix,
    Map,
    List,
    Function,
}

/// A value as seen by host code
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
    Map(IndexMap<String, HostValue>),
    List(Vec<HostValue>),
    Function(Function),
}

pub type Converter = fn(HostValue) -> HostValue;

impl HostValue {
    pub fn host_type(&self) -> HostType {
        match self {
            HostValue::Null => HostType::Null,
            HostValue::Bool(_) => HostType::Bool,
            HostValue::I32(_) => HostType::I32,
            HostValue::I64(_) => HostType::I64,
            HostValue::F32(_) => HostType::F32,
            HostValue::F64(_) => HostType::F64,
            HostValue::Str(_) => HostType::Str,
            HostValue::Vector(_) => HostType::Vector,
            HostValue::Matrix(_) => HostType::Matrix,
            HostValue::Map(_) => HostType::Map,
            HostValue::List(_) => HostType::List,
            HostValue::Function(_) => HostType::Function,
        }
    }

    /// Zero value of a type; `Null` for types without one
    pub fn default_for(ty: HostType) -> HostValue {
        match ty {
            HostType::Bool => HostValue::Bool(false),
            HostType::I32 => HostValue::I32(0),
            HostType::I64 => HostValue::I64(0),
            HostType::F32 => HostValue::F32(0.0),
            HostType::F64 => HostValue::F64(0.0),
            HostType::Str => HostValue::Str(String::new()),
            HostType::Vector => HostValue::Vector(Vec::new()),
            HostType::Matrix => HostValue::Matrix(Vec::new()),
            HostType::Map => HostValue::Map(IndexMap::new()),
            HostType::List => HostValue::List(Vec::new()),
            HostType::Any | HostType::Null | HostType::Function => HostValue::Null,
        }
    }

    /// Engine value for this host value. Host numbers become `Number`,
    /// vectors become row matrices.
    pub fn into_value(self) -> Value {
        let value = match self.host_type() {
            HostType::I32 | HostType::I64 | HostType::F32 => {
                find_converter(self.host_type(), HostType::F64)(self)
            }
            HostType::Vector => find_converter(HostType::Vector, HostType::Matrix)(self),
            _ => self,
        };
        match value {
            HostValue::Null => Value::Nothing,
            HostValue::Bool(b) => Value::Bool(b),
            HostValue::F64(n) => Value::Number(n),
            HostValue::Str(s) => Value::Str(s),
            HostValue::Matrix(rows) => Value::matrix(Matrix::from_rows(&rows)),
            HostValue::Map(map) => Value::object(
                map.into_iter()
                    .map(|(k, v)| (k, v.into_value()))
                    .collect(),
            ),
            HostValue::List(items) => {
                Value::list(items.into_iter().map(HostValue::into_value).collect())
            }
            HostValue::Function(f) => Value::Function(f),
            // Converted above
            HostValue::I32(_)
            | HostValue::I64(_)
            | HostValue::F32(_)
            | HostValue::Vector(_) => Value::Nothing,
        }
    }

    pub fn from_value(value: &Value) -> HostValue {
        match value {
            Value::Nothing => HostValue::Null,
            Value::Number(n) => HostValue::F64(*n),
            Value::Bool(b) => HostValue::Bool(*b),
            Value::Str(s) => HostValue::Str(s.clone()),
            Value::Matrix(m) => HostValue::Matrix(m.borrow().to_rows()),
            Value::Object(o) => HostValue::Map(
                o.borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), HostValue::from_value(v)))
                    .collect(),
            ),
            Value::List(l) => HostValue::List(l.borrow().iter().map(HostValue::from_value).collect()),
            Value::Function(f) => HostValue::Function(f.clone()),
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

fn identity(value: HostValue) -> HostValue {
    value
}

/// Fallback for pairs with no registered converter
fn null_default(_: HostValue) -> HostValue {
    HostValue::Null
}

// Each converter is only ever called with values of its `from` type; the
// trailing arm passes anything else through.

fn bool_to_f64(value: HostValue) -> HostValue {
    match value {
        HostValue::Bool(b) => HostValue::F64(if b { 1.0 } else { 0.0 }),
        other => other,
    }
}

fn i32_to_f64(value: HostValue) -> HostValue {
    match value {
        HostValue::I32(n) => HostValue::F64(f64::from(n)),
        other => other,
    }
}

fn i32_to_i64(value: HostValue) -> HostValue {
    match value {
        HostValue::I32(n) => HostValue::I64(i64::from(n)),
        other => other,
    }
}

fn i64_to_f64(value: HostValue) -> HostValue {
    match value {
        HostValue::I64(n) => HostValue::F64(n as f64),
        other => other,
    }
}

fn f32_to_f64(value: HostValue) -> HostValue {
    match value {
        HostValue::F32(n) => HostValue::F64(f64::from(n)),
        other => other,
    }
}

fn f64_to_f32(value: HostValue) -> HostValue {
    match value {
        HostValue::F64(n) => HostValue::F32(n as f32),
        other => other,
    }
}

fn f64_to_i32(value: HostValue) -> HostValue {
    match value {
        HostValue::F64(n) => HostValue::I32(n as i32),
        other => other,
    }
}

fn f64_to_i64(value: HostValue) -> HostValue {
    match value {
        HostValue::F64(n) => HostValue::I64(n as i64),
        other => other,
    }
}

fn f64_to_matrix(value: HostValue) -> HostValue {
    match value {
        HostValue::F64(n) => HostValue::Matrix(vec![vec![n]]),
        other => other,
    }
}

fn vector_to_matrix(value: HostValue) -> HostValue {
    match value {
        HostValue::Vector(v) if v.is_empty() => HostValue::Matrix(Vec::new()),
        HostValue::Vector(v) => HostValue::Matrix(vec![v]),
        other => other,
    }
}

fn matrix_to_vector(value: HostValue) -> HostValue {
    match value {
        HostValue::Matrix(rows) => HostValue::Vector(rows.into_iter().flatten().collect()),
        other => other,
    }
}

fn list_to_vector(value: HostValue) -> HostValue {
    match value {
        HostValue::List(items) => {
            let numbers: Option<Vec<f64>> = items
                .into_iter()
                .map(|item| match item {
                    HostValue::F64(n) => Some(n),
                    _ => None,
                })
                .collect();
            numbers.map(HostValue::Vector).unwrap_or(HostValue::Null)
        }
        other => other,
    }
}

fn vector_to_list(value: HostValue) -> HostValue {
    match value {
        HostValue::Vector(v) => HostValue::List(v.into_iter().map(HostValue::F64).collect()),
        other => other,
    }
}

fn to_str(value: HostValue) -> HostValue {
    match value {
        HostValue::Str(s) => HostValue::Str(s),
        other => HostValue::Str(other.into_value().to_string()),
    }
}

/// Registered `(from, to, converter)` triples
static CONVERTERS: &[(HostType, HostType, Converter)] = &[
    (HostType::Bool, HostType::F64, bool_to_f64),
    (HostType::I32, HostType::F64, i32_to_f64),
    (HostType::I32, HostType::I64, i32_to_i64),
    (HostType::I64, HostType::F64, i64_to_f64),
    (HostType::F32, HostType::F64, f32_to_f64),
    (HostType::F64, HostType::F32, f64_to_f32),
    (HostType::F64, HostType::I32, f64_to_i32),
    (HostType::F64, HostType::I64, f64_to_i64),
    (HostType::F64, HostType::Matrix, f64_to_matrix),
    (HostType::Vector, HostType::Matrix, vector_to_matrix),
    (HostType::Matrix, HostType::Vector, matrix_to_vector),
    (HostType::List, HostType::Vector, list_to_vector),
    (HostType::Vector, HostType::List, vector_to_list),
    (HostType::F64, HostType::Str, to_str),
    (HostType::Bool, HostType::Str, to_str),
];

/// Converter for one exact pair: identity when no conversion is needed,
/// the `Null` default when the pair is not registered
pub fn find_converter(from: HostType, to: HostType) -> Converter {
    if from == to || to == HostType::Any {
        return identity;
    }
    CONVERTERS
        .iter()
        .find(|(f, t, _)| *f == from && *t == to)
        .map(|(_, _, converter)| *converter)
        .unwrap_or(null_default)
}

type ConverterTable = Arc<HashMap<HostType, Converter>>;

/// Per-target lookup tables, built on first use
static CONVERTER_CACHE: Lazy<RwLock<HashMap<HostType, ConverterTable>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

fn converter_cache_read(
) -> std::sync::RwLockReadGuard<'static, HashMap<HostType, ConverterTable>> {
    CONVERTER_CACHE
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn converter_cache_write(
) -> std::sync::RwLockWriteGuard<'static, HashMap<HostType, ConverterTable>> {
    CONVERTER_CACHE
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn converter_table(to: HostType) -> ConverterTable {
    if let Some(table) = converter_cache_read().get(&to) {
        return table.clone();
    }
    let table: HashMap<HostType, Converter> = CONVERTERS
        .iter()
        .filter(|(_, t, _)| *t == to)
        .map(|(f, _, converter)| (*f, *converter))
        .collect();
    debug!("converter table for {} built with {} entries", to, table.len());
    // A concurrent builder may have won; both tables are equal
    converter_cache_write()
        .entry(to)
        .or_insert_with(|| Arc::new(table))
        .clone()
}

/// Whether the table for `to` has been built
pub fn is_cached(to: HostType) -> bool {
    converter_cache_read().contains_key(&to)
}

/// Converter to `to` from whatever type the value has. Values of a type
/// with no registered converter pass through unchanged.
pub fn find_converter_to(to: HostType) -> impl Fn(HostValue) -> HostValue {
    let table = (to != HostType::Any).then(|| converter_table(to));
    move |value: HostValue| {
        let from = value.host_type();
        match &table {
            Some(table) if from != to => match table.get(&from) {
                Some(converter) => converter(value),
                None => value,
            },
            _ => value,
        }
    }
}

pub fn convert(value: HostValue, to: HostType) -> HostValue {
    find_converter_to(to)(value)
}
