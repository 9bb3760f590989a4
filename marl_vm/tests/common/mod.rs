//! Shared helpers for integration tests
// Not every test target uses every helper.
#![allow(dead_code)]

use marl_vm::{Engine, EngineConfig, Value};
use marl_vm_parser::ErrorCode;

/// Run `src` in a fresh engine with the standard library
pub fn eval(src: &str) -> Value {
    Engine::new()
        .interpret(src)
        .unwrap_or_else(|e| panic!("interpret failed for {:?}: {}", src, e))
}

/// Run `src` ignoring diagnostics
pub fn eval_unchecked(src: &str) -> Value {
    Engine::new().evaluate_unchecked(src)
}

pub fn eval_with(config: EngineConfig, src: &str) -> Value {
    Engine::with_config(config)
        .interpret(src)
        .unwrap_or_else(|e| panic!("interpret failed for {:?}: {}", src, e))
}

pub fn diagnostic_codes(src: &str) -> Vec<ErrorCode> {
    Engine::new()
        .diagnostics(src)
        .into_iter()
        .map(|d| d.code)
        .collect()
}

pub fn num(x: f64) -> Value {
    Value::Number(x)
}
