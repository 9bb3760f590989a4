//! Embedding facade.
//!
//! An `Engine` owns a global table and a session scope that persists across
//! calls, so variables assigned by one `interpret` are visible to the next.

use std::rc::Rc;

use log::trace;
use marl_vm_parser::{completions, parse_statements, validate, Diagnostic};

use crate::builtins;
use crate::compile::compile;
use crate::config::EngineConfig;
use crate::convert::{self, HostType, HostValue};
use crate::error::{EngineError, NativeError};
use crate::instr::Program;
use crate::scope::{Globals, Scope};
use crate::value::{Function, Value};
use crate::vm::Vm;

#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    globals: Rc<Globals>,
    session: Scope,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let globals = Globals::new(config.max_call_depth);
        if config.include_stdlib {
            builtins::register_all(&globals);
        }
        let session = Scope::new(globals.clone());
        Self {
            config,
            globals,
            session,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Session scope holding the variables of previous runs
    pub fn scope(&self) -> &Scope {
        &self.session
    }

    /// Register a native callable under `name`. `arity` is the minimum
    /// argument count; fewer arguments curry.
    pub fn register_native(
        &self,
        name: &str,
        arity: usize,
        f: impl Fn(&[Value]) -> Result<Value, NativeError> + 'static,
    ) {
        self.globals
            .set(name, Value::Function(Function::native(name, arity, f)));
    }

    /// Register a host-typed callable. Each argument is converted to its
    /// parameter type; an argument that cannot be converted makes the call
    /// yield `Nothing`. The result is converted to `return_type`.
    pub fn register_host_fn(
        &self,
        name: &str,
        param_types: Vec<HostType>,
        return_type: HostType,
        f: impl Fn(Vec<HostValue>) -> HostValue + 'static,
    ) {
        let arity = param_types.len();
        let bridged = move |args: &[Value]| -> Result<Value, NativeError> {
            let mut host_args = Vec::with_capacity(param_types.len());
            for (position, (arg, ty)) in args.iter().zip(&param_types).enumerate() {
                let converted = convert::convert(HostValue::from_value(arg), *ty);
                if *ty != HostType::Any && converted.host_type() != *ty {
                    return Err(NativeError::argument_type(
                        position,
                        host_type_name(*ty),
                        arg,
                    ));
                }
                host_args.push(converted);
            }
            let result = convert::convert(f(host_args), return_type);
            Ok(result.into_value())
        };
        self.register_native(name, arity, bridged);
    }

    pub fn set_global(&self, name: &str, value: Value) {
        self.globals.set(name, value);
    }

    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.globals.get(name)
    }

    /// Global names in registration order
    pub fn globals(&self) -> Vec<String> {
        self.globals.names()
    }

    /// Parse, validate and compile. Diagnostics block compilation when
    /// `refuse_on_diagnostics` is set.
    pub fn compile(&self, source: &str) -> Result<Program, EngineError> {
        let (statements, _) = parse_statements(source);
        let diagnostics = validate(&statements);
        trace!(
            "parsed {} statement(s), {} diagnostic(s)",
            statements.len(),
            diagnostics.len()
        );
        if self.config.refuse_on_diagnostics && !diagnostics.is_empty() {
            return Err(EngineError::Diagnostics(diagnostics));
        }
        Ok(compile(&statements))
    }

    /// Run `source` in the session scope
    pub fn interpret(&self, source: &str) -> Result<Value, EngineError> {
        let program = self.compile(source)?;
        Ok(Vm::run(&program, &self.session))
    }

    /// Run `source` even when it has diagnostics
    pub fn evaluate_unchecked(&self, source: &str) -> Value {
        let (statements, _) = parse_statements(source);
        Vm::run(&compile(&statements), &self.session)
    }

    pub fn diagnostics(&self, source: &str) -> Vec<Diagnostic> {
        let (statements, _) = parse_statements(source);
        validate(&statements)
    }

    pub fn is_completed(&self, source: &str) -> bool {
        marl_vm_parser::is_completed(source)
    }

    /// Completion candidates at byte offset `position`
    pub fn complete(&self, source: &str, position: usize) -> Vec<String> {
        let (statements, _) = parse_statements(source);
        let symbols = self.session.names();
        completions(&statements, position, &symbols)
    }
}

fn host_type_name(ty: HostType) -> &'static str {
    match ty {
        HostType::Any => "Any",
        HostType::Null => "Null",
        HostType::Bool => "Bool",
        HostType::I32 => "I32",
        HostType::I64 => "I64",
        HostType::F32 => "F32",
        HostType::F64 => "F64",
        HostType::Str => "Str",
        HostType::Vector => "Vector",
        HostType::Matrix => "Matrix",
        HostType::Map => "Map",
        HostType::List => "List",
        HostType::Function => "Function",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_persists_between_runs() {
        let engine = Engine::new();
        engine.interpret("x = 20").unwrap();
        assert_eq!(engine.interpret("x + 1").unwrap(), Value::Number(21.0));
    }

    #[test]
    fn test_diagnostics_refuse_execution() {
        let engine = Engine::new();
        let err = engine.interpret("x = 1; break").unwrap_err();
        assert_eq!(err.diagnostics().len(), 1);
        // Nothing ran
        assert_eq!(engine.interpret("x").unwrap(), Value::Nothing);
    }

    #[test]
    fn test_evaluate_unchecked_runs_anyway() {
        let engine = Engine::new();
        assert_eq!(engine.evaluate_unchecked("x = 1; break; x + 1"), Value::Number(2.0));
    }

    #[test]
    fn test_best_effort_config() {
        let engine = Engine::with_config(EngineConfig {
            refuse_on_diagnostics: false,
            ..EngineConfig::default()
        });
        assert_eq!(engine.interpret("1 +").unwrap(), Value::Nothing);
    }

    #[test]
    fn test_without_stdlib() {
        let engine = Engine::with_config(EngineConfig {
            include_stdlib: false,
            ..EngineConfig::default()
        });
        assert!(engine.globals().is_empty());
        assert_eq!(engine.interpret("sin(0)").unwrap(), Value::Nothing);
    }

    #[test]
    fn test_register_native() {
        let engine = Engine::new();
        engine.register_native("twice", 1, |args| {
            Ok(Value::Number(args[0].as_number().unwrap_or(f64::NAN) * 2.0))
        });
        assert_eq!(engine.interpret("twice(21)").unwrap(), Value::Number(42.0));
        assert!(engine.globals().contains(&"twice".to_string()));
    }

    #[test]
    fn test_register_host_fn_converts_arguments() {
        let engine = Engine::new();
        engine.register_host_fn(
            "scale",
            vec![HostType::I64, HostType::F64],
            HostType::F64,
            |args| match (&args[0], &args[1]) {
                (HostValue::I64(a), HostValue::F64(b)) => HostValue::I64(*a * (*b as i64)),
                _ => HostValue::Null,
            },
        );
        assert_eq!(engine.interpret("scale(3, 4)").unwrap(), Value::Number(12.0));
        assert_eq!(engine.interpret("scale(\"3\", 4)").unwrap(), Value::Nothing);
        assert!(matches!(engine.interpret("scale(3)").unwrap(), Value::Function(_)));
    }

    #[test]
    fn test_complete_includes_session_and_globals() {
        let engine = Engine::new();
        engine.interpret("alpha = 1").unwrap();
        let source = "x = ";
        let suggestions = engine.complete(source, source.len());

        assert!(suggestions.contains(&"alpha".to_string()));
        assert!(suggestions.contains(&"sin".to_string()));
        assert!(suggestions.contains(&"x".to_string()));
    }
}
