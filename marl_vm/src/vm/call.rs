//! Call dispatch, currying and indexed assignment.
//!
//! Calling anything never fails. Wrong arity, wrong argument types,
//! out-of-range indices and non-callable targets all produce `Nothing`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

use log::debug;

use crate::compile::FunctionTemplate;
use crate::scope::Scope;
use crate::value::{format_number, Function, FunctionKind, Value};

use super::Vm;

/// Largest index an indexed write may grow a list to, and the longest range
pub(crate) const MAX_LIST_INDEX: usize = 1 << 24;

/// Outcome of the currying check for a call
#[derive(Debug)]
pub enum CurryOutcome {
    /// No arguments for a function that needs some: the function itself
    Same,
    /// Still short of the arity: a partial application
    Partial(Function),
    /// Enough arguments to run the body
    Ready,
}

/// Decide how a call with `args` to a function needing `arity` arguments proceeds
pub fn curry(arity: usize, function: &Function, args: &[Value]) -> CurryOutcome {
    if args.len() >= arity {
        CurryOutcome::Ready
    } else if args.is_empty() {
        CurryOutcome::Same
    } else {
        CurryOutcome::Partial(Function::partial(function.clone(), args.to_vec()))
    }
}

/// Dispatch a call on any value
pub fn invoke(target: &Value, args: &[Value]) -> Value {
    match target {
        Value::Function(function) => call_function(function, args),
        Value::Str(s) => match args {
            [index] => index
                .as_index()
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::Str(c.to_string()))
                .unwrap_or_default(),
            _ => Value::Nothing,
        },
        Value::Object(object) => match args {
            [key] => object.borrow().get(&key_string(key)).cloned().unwrap_or_default(),
            _ => Value::Nothing,
        },
        Value::Matrix(matrix) => {
            let matrix = matrix.borrow();
            let value = match args {
                [index] => index.as_index().and_then(|i| matrix.get_linear(i)),
                [row, col] => match (row.as_index(), col.as_index()) {
                    (Some(r), Some(c)) => matrix.get(r, c),
                    _ => None,
                },
                _ => None,
            };
            value.map(Value::Number).unwrap_or_default()
        }
        Value::List(list) => match args {
            [index] => index
                .as_index()
                .and_then(|i| list.borrow().get(i).cloned())
                .unwrap_or_default(),
            _ => Value::Nothing,
        },
        Value::Nothing | Value::Number(_) | Value::Bool(_) => Value::Nothing,
    }
}

/// Object keys are the string form of the argument
fn key_string(key: &Value) -> String {
    match key {
        Value::Number(n) => format_number(*n),
        other => other.to_string(),
    }
}

pub fn call_function(function: &Function, args: &[Value]) -> Value {
    match curry(function.arity(), function, args) {
        CurryOutcome::Same => return Value::Function(function.clone()),
        CurryOutcome::Partial(partial) => return Value::Function(partial),
        CurryOutcome::Ready => {}
    }

    match function.kind() {
        FunctionKind::User { template, closure } => call_user(template, closure, args),
        FunctionKind::Native { name, callable, .. } => {
            match panic::catch_unwind(AssertUnwindSafe(|| (callable.as_ref())(args))) {
                Ok(Ok(value)) => value,
                Ok(Err(err)) => {
                    debug!("native `{}` failed: {}", name, err);
                    Value::Nothing
                }
                Err(_) => {
                    debug!("native `{}` panicked", name);
                    Value::Nothing
                }
            }
        }
        FunctionKind::Partial { target, bound } => {
            let combined: Vec<Value> = bound.iter().chain(args).cloned().collect();
            call_function(target, &combined)
        }
    }
}

thread_local! {
    static CALL_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Counts one active user-function call for as long as it lives
struct DepthGuard;

impl DepthGuard {
    fn enter(limit: usize) -> Option<Self> {
        CALL_DEPTH.with(|depth| {
            if depth.get() >= limit {
                None
            } else {
                depth.set(depth.get() + 1);
                Some(DepthGuard)
            }
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        CALL_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

fn call_user(template: &FunctionTemplate, closure: &Scope, args: &[Value]) -> Value {
    let limit = closure.globals().max_call_depth();
    let Some(_guard) = DepthGuard::enter(limit) else {
        debug!("call depth limit {} reached", limit);
        return Value::Nothing;
    };

    let scope = closure.function_scope();
    for (i, name) in template.parameters.iter().enumerate() {
        scope.declare(name.clone(), args.get(i).cloned().unwrap_or_default());
    }
    Vm::with_arguments(scope, args.to_vec()).execute(&template.body)
}

/// `target(args) = value`. Lists grow to fit, objects insert the key,
/// matrices accept in-range numeric writes. Anything else is ignored.
pub fn set_item(target: &Value, args: &[Value], value: Value) {
    match (target, args) {
        (Value::List(list), [index]) => {
            if let Some(i) = index.as_index().filter(|i| *i <= MAX_LIST_INDEX) {
                let mut list = list.borrow_mut();
                if i >= list.len() {
                    list.resize(i + 1, Value::Nothing);
                }
                list[i] = value;
            }
        }
        (Value::Object(object), [key]) => {
            object.borrow_mut().insert(key_string(key), value);
        }
        (Value::Matrix(matrix), _) => {
            let Some(n) = value.as_number() else {
                return;
            };
            let mut matrix = matrix.borrow_mut();
            match args {
                [index] => {
                    if let Some(i) = index.as_index() {
                        matrix.set_linear(i, n);
                    }
                }
                [row, col] => {
                    if let (Some(r), Some(c)) = (row.as_index(), col.as_index()) {
                        matrix.set(r, c, n);
                    }
                }
                _ => {}
            }
        }
        _ => {}
    }
}

/// `object.name`; `Nothing` for anything but an object holding the key
pub fn get_member(target: &Value, name: &str) -> Value {
    match target {
        Value::Object(object) => object.borrow().get(name).cloned().unwrap_or_default(),
        _ => Value::Nothing,
    }
}

pub fn set_member(target: &Value, name: &str, value: Value) {
    if let Value::Object(object) = target {
        object.borrow_mut().insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Matrix;
    use indexmap::IndexMap;

    fn sample_matrix() -> Value {
        Value::matrix(Matrix::from_rows(&[
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
        ]))
    }

    fn add3() -> Function {
        Function::native("add3", 3, |args| {
            Ok(Value::Number(
                args.iter().take(3).filter_map(Value::as_number).sum(),
            ))
        })
    }

    #[test]
    fn test_string_indexing() {
        let s = Value::str("test");
        assert_eq!(invoke(&s, &[Value::Number(2.0)]), Value::str("s"));
        assert_eq!(invoke(&s, &[Value::Number(4.0)]), Value::Nothing);
        assert_eq!(invoke(&s, &[Value::Number(-1.0)]), Value::Nothing);
        assert_eq!(invoke(&s, &[Value::str("1")]), Value::Nothing);
        assert_eq!(invoke(&s, &[]), Value::Nothing);
    }

    #[test]
    fn test_object_lookup() {
        let mut entries = IndexMap::new();
        entries.insert("age".to_string(), Value::Number(29.0));
        entries.insert("1".to_string(), Value::Number(29.0));
        let o = Value::object(entries);

        assert_eq!(invoke(&o, &[Value::str("age")]), Value::Number(29.0));
        assert_eq!(invoke(&o, &[Value::Number(1.0)]), Value::Number(29.0));
        assert_eq!(invoke(&o, &[Value::str("name")]), Value::Nothing);
        assert_eq!(invoke(&o, &[Value::str("age"), Value::Nothing]), Value::Nothing);
    }

    #[test]
    fn test_matrix_indexing() {
        let m = sample_matrix();
        assert_eq!(invoke(&m, &[Value::Number(4.0)]), Value::Number(5.0));
        assert_eq!(
            invoke(&m, &[Value::Number(1.0), Value::Number(1.0)]),
            Value::Number(5.0)
        );
        assert_eq!(invoke(&m, &[Value::Number(9.0)]), Value::Nothing);
        assert_eq!(
            invoke(&m, &[Value::Number(1.0), Value::Number(3.0)]),
            Value::Nothing
        );
        assert_eq!(
            invoke(&m, &[Value::Number(3.0), Value::Number(1.0)]),
            Value::Nothing
        );
        assert_eq!(invoke(&m, &[Value::str("0")]), Value::Nothing);
        assert_eq!(invoke(&m, &[Value::Bool(true)]), Value::Nothing);
    }

    #[test]
    fn test_non_callables_yield_nothing() {
        assert_eq!(invoke(&Value::Nothing, &[Value::Number(1.0)]), Value::Nothing);
        assert_eq!(invoke(&Value::Number(3.0), &[]), Value::Nothing);
        assert_eq!(invoke(&Value::Bool(true), &[]), Value::Nothing);
    }

    #[test]
    fn test_currying_native() {
        let f = add3();
        let same = call_function(&f, &[]);
        assert_eq!(same, Value::Function(f.clone()));

        let partial = call_function(&f, &[Value::Number(1.0)]);
        let partial_fn = partial.as_function().cloned().unwrap();
        assert_eq!(partial_fn.arity(), 2);
        assert_eq!(call_function(&partial_fn, &[]), partial);

        let result = invoke(&partial, &[Value::Number(2.0), Value::Number(3.0)]);
        assert_eq!(result, Value::Number(6.0));

        let step = invoke(&invoke(&partial, &[Value::Number(2.0)]), &[Value::Number(4.0)]);
        assert_eq!(step, Value::Number(7.0));
    }

    #[test]
    fn test_curry_outcomes() {
        let f = add3();
        assert!(matches!(curry(3, &f, &[]), CurryOutcome::Same));
        assert!(matches!(curry(0, &f, &[]), CurryOutcome::Ready));
        assert!(matches!(
            curry(3, &f, &[Value::Nothing]),
            CurryOutcome::Partial(_)
        ));
        assert!(matches!(
            curry(1, &f, &[Value::Nothing, Value::Nothing]),
            CurryOutcome::Ready
        ));
    }

    #[test]
    fn test_native_failures_become_nothing() {
        let failing = Function::native("fail", 0, |_| {
            Err(crate::error::NativeError::InvalidArgument("no".into()))
        });
        assert_eq!(call_function(&failing, &[]), Value::Nothing);

        let panicking = Function::native("boom", 0, |_| panic!("boom"));
        assert_eq!(call_function(&panicking, &[]), Value::Nothing);
    }

    #[test]
    fn test_set_item_grows_lists() {
        let list = Value::list(vec![Value::Bool(false)]);
        set_item(&list, &[Value::Number(1.0)], Value::str("foo"));
        set_item(&list, &[Value::Number(3.0)], Value::Number(1.0));

        match &list {
            Value::List(items) => {
                let items = items.borrow();
                assert_eq!(items.len(), 4);
                assert_eq!(items[1], Value::str("foo"));
                assert_eq!(items[2], Value::Nothing);
            }
            other => panic!("expected a list, got {:?}", other),
        }
    }

    #[test]
    fn test_set_item_on_matrix_and_object() {
        let m = sample_matrix();
        set_item(&m, &[Value::Number(0.0), Value::Number(2.0)], Value::Number(9.0));
        assert_eq!(invoke(&m, &[Value::Number(2.0)]), Value::Number(9.0));
        set_item(&m, &[Value::Number(0.0)], Value::str("x"));
        assert_eq!(invoke(&m, &[Value::Number(0.0)]), Value::Number(1.0));

        let o = Value::object(IndexMap::new());
        set_item(&o, &[Value::str("k")], Value::Number(1.0));
        assert_eq!(get_member(&o, "k"), Value::Number(1.0));
        set_member(&o, "k", Value::Number(2.0));
        assert_eq!(invoke(&o, &[Value::str("k")]), Value::Number(2.0));
    }
}
