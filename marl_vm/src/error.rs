//! Error types for the runtime crate.
//!
//! Neither type ever escapes a running program: native failures are turned
//! into `Nothing` at the call boundary, and `EngineError` is only produced
//! before execution starts.

use marl_vm_parser::Diagnostic;
use thiserror::Error;

/// Failure reported by a native function
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    #[error("expected at least {expected} argument(s), got {got}")]
    ArgumentCount { expected: usize, got: usize },
    #[error("argument {position}: expected {expected}, got {got}")]
    ArgumentType {
        position: usize,
        expected: &'static str,
        got: &'static str,
    },
    #[error("{0}")]
    InvalidArgument(String),
}

impl NativeError {
    pub fn argument_type(position: usize, expected: &'static str, got: &crate::Value) -> Self {
        NativeError::ArgumentType {
            position,
            expected,
            got: got.type_name(),
        }
    }
}

/// Embedding-level failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The source has static diagnostics and the engine refuses to run it
    #[error("{} diagnostic(s), first: {}", .0.len(), first_diagnostic(.0))]
    Diagnostics(Vec<Diagnostic>),
    #[error("invalid configuration: {0}")]
    Config(String),
}

fn first_diagnostic(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl EngineError {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            EngineError::Diagnostics(list) => list,
            EngineError::Config(_) => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marl_vm_parser::{parse_statements, validate};

    #[test]
    fn test_native_error_messages() {
        let err = NativeError::ArgumentCount {
            expected: 2,
            got: 1,
        };
        assert_eq!(err.to_string(), "expected at least 2 argument(s), got 1");

        let err = NativeError::argument_type(1, "Number", &crate::Value::str("x"));
        assert_eq!(err.to_string(), "argument 1: expected Number, got String");
    }

    #[test]
    fn test_engine_error_lists_first_diagnostic() {
        let (statements, _) = parse_statements("break");
        let err = EngineError::Diagnostics(validate(&statements));
        let message = err.to_string();

        assert!(message.starts_with("1 diagnostic(s)"));
        assert!(message.contains("line 1"));
        assert_eq!(err.diagnostics().len(), 1);
    }
}
