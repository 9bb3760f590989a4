//! Standard native functions and constants.
//!
//! Natives see their arguments as a slice and report misuse through
//! [`NativeError`]; the call boundary turns every error into `Nothing`.
//! Registered arities are minimums and take part in currying, so `map(f)`
//! returns a function waiting for the collection.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use indexmap::IndexMap;

use crate::error::NativeError;
use crate::scope::Globals;
use crate::value::{Function, Matrix, Value};
use crate::vm::call::invoke;

type NativeResult = Result<Value, NativeError>;

/// Register every standard native and constant into `globals`
pub fn register_all(globals: &Globals) {
    globals.set("pi", Value::Number(std::f64::consts::PI));
    globals.set("e", Value::Number(std::f64::consts::E));

    let elementwise: [(&str, fn(f64) -> f64); 17] = [
        ("abs", f64::abs),
        ("sign", sign),
        ("sqrt", f64::sqrt),
        ("exp", f64::exp),
        ("log", f64::ln),
        ("floor", f64::floor),
        ("ceil", f64::ceil),
        ("round", f64::round),
        ("sin", f64::sin),
        ("cos", f64::cos),
        ("tan", f64::tan),
        ("sinh", f64::sinh),
        ("cosh", f64::cosh),
        ("tanh", f64::tanh),
        ("arcsin", f64::asin),
        ("arccos", f64::acos),
        ("arctan", f64::atan),
    ];
    for (name, f) in elementwise {
        register(globals, name, 1, move |args| map_numeric(&args[0], f));
    }

    register(globals, "min", 1, |args| extremum(args, f64::min));
    register(globals, "max", 1, |args| extremum(args, f64::max));
    register(globals, "sum", 1, sum);
    register(globals, "length", 1, |args| Ok(Value::Number(length(&args[0]) as f64)));
    register(globals, "list", 0, |args| Ok(Value::list(args.to_vec())));
    register(globals, "type", 1, |args| Ok(Value::str(args[0].type_name())));
    register(globals, "is", 2, is);
    register(globals, "not", 1, |args| Ok(Value::Bool(!args[0].is_truthy())));
    register(globals, "isnan", 1, |args| predicate(&args[0], f64::is_nan));
    register(globals, "isint", 1, |args| {
        predicate(&args[0], |x| x.is_finite() && x.fract() == 0.0)
    });
    register(globals, "transpose", 1, transpose);
    register(globals, "stringify", 1, |args| Ok(Value::str(args[0].to_string())));
    register(globals, "json", 1, json);
    register(globals, "map", 2, map);
    register(globals, "reduce", 3, reduce);
    register(globals, "where", 2, filter);
    register(globals, "reverse", 1, reverse);
    register(globals, "concat", 0, concat);
}

fn register(
    globals: &Globals,
    name: &str,
    arity: usize,
    f: impl Fn(&[Value]) -> NativeResult + 'static,
) {
    globals.set(name, Value::Function(Function::native(name, arity, f)));
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x
    }
}

fn map_numeric(value: &Value, f: fn(f64) -> f64) -> NativeResult {
    match value {
        Value::Matrix(m) => Ok(Value::matrix(m.borrow().map(f))),
        other => other
            .as_number()
            .map(|n| Value::Number(f(n)))
            .ok_or_else(|| NativeError::argument_type(0, "Number or Matrix", other)),
    }
}

/// Scalars map to booleans, matrices to 1/0 entries
fn predicate(value: &Value, test: impl Fn(f64) -> bool) -> NativeResult {
    match value {
        Value::Matrix(m) => Ok(Value::matrix(
            m.borrow().map(|x| if test(x) { 1.0 } else { 0.0 }),
        )),
        other => other
            .as_number()
            .map(|n| Value::Bool(test(n)))
            .ok_or_else(|| NativeError::argument_type(0, "Number or Matrix", other)),
    }
}

/// Fold a vector to a number, or each row of a matrix into a column vector
fn reduce_rows(matrix: &Matrix, fold: impl Fn(&[f64]) -> f64) -> Value {
    if matrix.is_empty() {
        return Value::matrix(Matrix::empty());
    }
    if matrix.is_vector() {
        return Value::Number(fold(&matrix.to_row_major()));
    }
    let folded = matrix.to_rows().iter().map(|row| fold(row)).collect();
    Value::matrix(Matrix::column_vector(folded))
}

fn extremum(args: &[Value], pick: fn(f64, f64) -> f64) -> NativeResult {
    let fold = |values: &[f64]| values.iter().copied().reduce(pick).unwrap_or(f64::NAN);

    if let [single] = args {
        return match single {
            Value::Matrix(m) => Ok(reduce_rows(&m.borrow(), fold)),
            other => other
                .as_number()
                .map(Value::Number)
                .ok_or_else(|| NativeError::argument_type(0, "Number or Matrix", other)),
        };
    }
    let numbers = args
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            arg.as_number()
                .ok_or_else(|| NativeError::argument_type(i, "Number", arg))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Number(fold(&numbers)))
}

fn sum(args: &[Value]) -> NativeResult {
    match &args[0] {
        Value::Matrix(m) => Ok(reduce_rows(&m.borrow(), |values| values.iter().sum())),
        Value::List(items) => {
            let mut total = 0.0;
            for (i, item) in items.borrow().iter().enumerate() {
                total += item
                    .as_number()
                    .ok_or_else(|| NativeError::argument_type(i, "Number", item))?;
            }
            Ok(Value::Number(total))
        }
        other => other
            .as_number()
            .map(Value::Number)
            .ok_or_else(|| NativeError::argument_type(0, "Number, Matrix or List", other)),
    }
}

fn length(value: &Value) -> usize {
    match value {
        Value::Nothing => 0,
        Value::Str(s) => s.chars().count(),
        Value::Matrix(m) => m.borrow().len(),
        Value::List(l) => l.borrow().len(),
        Value::Object(o) => o.borrow().len(),
        Value::Number(_) | Value::Bool(_) | Value::Function(_) => 1,
    }
}

/// `is(typeName, value)`
fn is(args: &[Value]) -> NativeResult {
    let name = args[0]
        .as_str()
        .ok_or_else(|| NativeError::argument_type(0, "String", &args[0]))?;
    Ok(Value::Bool(args[1].type_name() == name))
}

fn transpose(args: &[Value]) -> NativeResult {
    match &args[0] {
        Value::Matrix(m) => Ok(Value::matrix(m.borrow().transpose())),
        other => other
            .as_number()
            .map(Value::Number)
            .ok_or_else(|| NativeError::argument_type(0, "Matrix", other)),
    }
}

fn json(args: &[Value]) -> NativeResult {
    serde_json::to_string(&args[0].to_json())
        .map(Value::Str)
        .map_err(|err| NativeError::InvalidArgument(err.to_string()))
}

fn expect_function(args: &[Value]) -> Result<&Value, NativeError> {
    match &args[0] {
        f @ Value::Function(_) => Ok(f),
        other => Err(NativeError::argument_type(0, "Function", other)),
    }
}

/// Numbers back into a matrix of the same shape; anything else into a list
fn collect_like_matrix(shape: (usize, usize), results: Vec<Value>) -> Value {
    let numbers: Option<Vec<f64>> = results.iter().map(Value::as_number).collect();
    match numbers.and_then(|n| Matrix::from_row_major(shape.0, shape.1, &n)) {
        Some(matrix) => Value::matrix(matrix),
        None => Value::list(results),
    }
}

/// `map(f, collection)`
fn map(args: &[Value]) -> NativeResult {
    let f = expect_function(args)?;
    match &args[1] {
        Value::Matrix(m) => {
            let m = m.borrow().clone();
            let results = m
                .to_row_major()
                .into_iter()
                .map(|x| invoke(f, &[Value::Number(x)]))
                .collect();
            Ok(collect_like_matrix((m.rows(), m.cols()), results))
        }
        Value::List(items) => {
            let items = items.borrow().clone();
            Ok(Value::list(items.iter().map(|item| invoke(f, std::slice::from_ref(item))).collect()))
        }
        Value::Object(object) => {
            let entries = object.borrow().clone();
            let mapped: IndexMap<String, Value> = entries
                .into_iter()
                .map(|(key, value)| {
                    let result = invoke(f, &[value, Value::str(key.as_str())]);
                    (key, result)
                })
                .collect();
            Ok(Value::object(mapped))
        }
        other => Err(NativeError::argument_type(1, "Matrix, List or Object", other)),
    }
}

/// Elements of a collection, snapshotted so callbacks may mutate it
fn elements(value: &Value, position: usize) -> Result<Vec<Value>, NativeError> {
    match value {
        Value::Matrix(m) => Ok(m
            .borrow()
            .to_row_major()
            .into_iter()
            .map(Value::Number)
            .collect()),
        Value::List(items) => Ok(items.borrow().clone()),
        Value::Object(object) => Ok(object.borrow().values().cloned().collect()),
        other => Err(NativeError::argument_type(position, "Matrix, List or Object", other)),
    }
}

/// `reduce(f, initial, collection)`
fn reduce(args: &[Value]) -> NativeResult {
    let f = expect_function(args)?;
    let items = elements(&args[2], 2)?;
    Ok(items
        .into_iter()
        .fold(args[1].clone(), |acc, item| invoke(f, &[acc, item])))
}

/// `where(f, collection)`: elements for which `f` is truthy
fn filter(args: &[Value]) -> NativeResult {
    let f = expect_function(args)?;
    match &args[1] {
        Value::Matrix(m) => {
            let values = m.borrow().to_row_major();
            let kept: Vec<f64> = values
                .into_iter()
                .filter(|x| invoke(f, &[Value::Number(*x)]).is_truthy())
                .collect();
            Ok(Value::matrix(Matrix::row_vector(kept)))
        }
        Value::Object(object) => {
            let entries = object.borrow().clone();
            let kept: IndexMap<String, Value> = entries
                .into_iter()
                .filter(|(key, value)| {
                    invoke(f, &[value.clone(), Value::str(key.as_str())]).is_truthy()
                })
                .collect();
            Ok(Value::object(kept))
        }
        other => {
            let kept = elements(other, 1)?
                .into_iter()
                .filter(|item| invoke(f, std::slice::from_ref(item)).is_truthy())
                .collect();
            Ok(Value::list(kept))
        }
    }
}

fn reverse(args: &[Value]) -> NativeResult {
    match &args[0] {
        Value::Str(s) => Ok(Value::str(s.chars().rev().collect::<String>())),
        Value::List(items) => Ok(Value::list(items.borrow().iter().rev().cloned().collect())),
        Value::Matrix(m) => {
            let m = m.borrow();
            let mut values = m.to_row_major();
            values.reverse();
            Matrix::from_row_major(m.rows(), m.cols(), &values)
                .map(Value::matrix)
                .ok_or_else(|| NativeError::InvalidArgument("malformed matrix".to_string()))
        }
        other => Err(NativeError::argument_type(0, "String, List or Matrix", other)),
    }
}

/// Strings join, lists append, matrices concatenate horizontally
fn concat(args: &[Value]) -> NativeResult {
    let Some(first) = args.first() else {
        return Ok(Value::list(Vec::new()));
    };
    match first {
        Value::Str(_) => Ok(Value::str(
            args.iter().map(ToString::to_string).collect::<String>(),
        )),
        Value::List(_) => {
            let mut items = Vec::new();
            for arg in args {
                match arg {
                    Value::List(more) => items.extend(more.borrow().iter().cloned()),
                    other => items.push(other.clone()),
                }
            }
            Ok(Value::list(items))
        }
        _ => {
            let mut result = Matrix::empty();
            for (i, arg) in args.iter().enumerate() {
                let next = arg
                    .to_matrix()
                    .ok_or_else(|| NativeError::argument_type(i, "Matrix", arg))?;
                result = result.hconcat(&next).ok_or_else(|| {
                    NativeError::InvalidArgument("row counts differ".to_string())
                })?;
            }
            Ok(Value::matrix(result))
        }
    }
}
