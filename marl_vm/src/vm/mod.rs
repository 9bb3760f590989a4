//! Stack virtual machine.
//!
//! One `Vm` executes one instruction sequence: the top-level program or a
//! single function call. Each run has its own operand stack and result
//! register; calls into user functions start a nested `Vm` on the callee's
//! frame.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod call;
pub mod ops;
pub mod stack_ops;

use indexmap::IndexMap;
use log::trace;

use crate::compile::ARGS_NAME;
use crate::instr::{Instr, Program};
use crate::scope::Scope;
use crate::value::{Function, Value};

pub use stack_ops::StackOps;

/// Result of dispatching a single instruction
enum DispatchAction {
    /// Continue to next instruction
    Continue,
    /// Continue at the given index
    Jump(usize),
    /// Stop executing this sequence
    Exit,
}

#[derive(Debug)]
pub struct Vm {
    stack: Vec<Value>,
    scope: Scope,
    /// Arguments of the call being executed, exposed through `BindArgs`
    arguments: Vec<Value>,
    /// Value of the most recent statement, or the `return` payload
    result: Value,
}

impl Vm {
    pub fn new(scope: Scope) -> Self {
        Self::with_arguments(scope, Vec::new())
    }

    pub(crate) fn with_arguments(scope: Scope, arguments: Vec<Value>) -> Self {
        Self {
            stack: Vec::new(),
            scope,
            arguments,
            result: Value::Nothing,
        }
    }

    /// Run `program` against `scope`, returning the program's value
    pub fn run(program: &Program, scope: &Scope) -> Value {
        Vm::new(scope.clone()).execute(program)
    }

    pub fn execute(mut self, program: &Program) -> Value {
        let code = program.code();
        trace!("executing {} instruction(s)", code.len());

        let mut ip = 0;
        while let Some(instr) = code.get(ip) {
            ip += 1;
            match self.dispatch_instr(instr) {
                DispatchAction::Continue => {}
                DispatchAction::Jump(target) => ip = target,
                DispatchAction::Exit => break,
            }
        }
        self.result
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn dispatch_instr(&mut self, instr: &Instr) -> DispatchAction {
        match instr {
            Instr::PushNumber(n) => self.push(Value::Number(*n)),
            Instr::PushBool(b) => self.push(Value::Bool(*b)),
            Instr::PushStr(s) => self.push(Value::Str(s.to_string())),
            Instr::PushNothing => self.push(Value::Nothing),

            Instr::Load(name) => {
                let value = self.scope.get(name).unwrap_or_default();
                self.push(value);
            }
            Instr::Store(name) => {
                let value = self.stack.peek_value();
                self.scope.assign(name, value);
            }
            Instr::Declare(name) => {
                let value = self.stack.peek_value();
                self.scope.declare(name.clone(), value);
            }
            Instr::BindArgs => {
                if !self.scope.has_local(ARGS_NAME) {
                    let arguments = std::mem::take(&mut self.arguments);
                    self.scope.declare(ARGS_NAME, Value::list(arguments));
                }
            }

            Instr::Pop => {
                self.stack.pop_value();
            }
            Instr::Dup => {
                let value = self.stack.peek_value();
                self.push(value);
            }
            Instr::Keep => self.result = self.stack.pop_value(),

            Instr::Binary(op) => {
                let right = self.stack.pop_value();
                let left = self.stack.pop_value();
                self.push(ops::binary(*op, &left, &right));
            }
            Instr::Unary(op) => {
                let operand = self.stack.pop_value();
                self.push(ops::unary(*op, &operand));
            }
            Instr::ToBool => {
                let value = self.stack.pop_value();
                self.push(Value::Bool(value.is_truthy()));
            }

            Instr::Jump(target) => return DispatchAction::Jump(*target),
            Instr::JumpIfFalse(target) => {
                if !self.stack.pop_value().is_truthy() {
                    return DispatchAction::Jump(*target);
                }
            }
            Instr::JumpIfFalseOrPop(target) => {
                if !self.stack.peek_value().is_truthy() {
                    return DispatchAction::Jump(*target);
                }
                self.stack.pop_value();
            }
            Instr::JumpIfTrueOrPop(target) => {
                if self.stack.peek_value().is_truthy() {
                    return DispatchAction::Jump(*target);
                }
                self.stack.pop_value();
            }
            Instr::PushScope => self.scope = self.scope.block_scope(),
            Instr::PopScope => {
                if let Some(parent) = self.scope.parent() {
                    self.scope = parent;
                }
            }
            Instr::Return => {
                self.result = self.stack.pop_value();
                return DispatchAction::Exit;
            }

            Instr::MakeClosure(template) => {
                let function = Function::user(template.clone(), self.scope.clone());
                self.push(Value::Function(function));
            }
            Instr::MakeMatrix(row_lengths) => {
                let elements = self.stack.pop_many(row_lengths.iter().sum());
                self.push(ops::make_matrix(row_lengths, elements));
            }
            Instr::MakeRange { has_step } => {
                let to = self.stack.pop_value();
                let step = if *has_step {
                    self.stack.pop_value()
                } else {
                    Value::Number(1.0)
                };
                let from = self.stack.pop_value();
                self.push(ops::make_range(&from, &step, &to));
            }
            Instr::MakeObject(keys) => {
                let values = self.stack.pop_many(keys.len());
                let entries: IndexMap<String, Value> = keys.iter().cloned().zip(values).collect();
                self.push(Value::object(entries));
            }
            Instr::MakeList(count) => {
                let items = self.stack.pop_many(*count);
                self.push(Value::list(items));
            }

            Instr::Call(count) => {
                let args = self.stack.pop_many(*count);
                let callee = self.stack.pop_value();
                self.push(call::invoke(&callee, &args));
            }
            Instr::SetItem(count) => {
                let value = self.stack.pop_value();
                let args = self.stack.pop_many(*count);
                let target = self.stack.pop_value();
                call::set_item(&target, &args, value.clone());
                self.push(value);
            }
            Instr::GetMember(name) => {
                let object = self.stack.pop_value();
                self.push(call::get_member(&object, name));
            }
            Instr::SetMember(name) => {
                let value = self.stack.pop_value();
                let object = self.stack.pop_value();
                call::set_member(&object, name, value.clone());
                self.push(value);
            }
        }
        DispatchAction::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use crate::scope::Globals;
    use marl_vm_parser::parse_statements;

    fn run(source: &str) -> Value {
        let (statements, _) = parse_statements(source);
        let program = compile(&statements);
        Vm::run(&program, &Scope::new(Globals::new(200)))
    }

    #[test]
    fn test_result_is_last_statement_value() {
        assert_eq!(run("1; 2; 3"), Value::Number(3.0));
        assert_eq!(run("var x = 4"), Value::Number(4.0));
        assert_eq!(run(""), Value::Nothing);
    }

    #[test]
    fn test_top_level_return_stops_execution() {
        assert_eq!(run("x = 1; return x + 1; x = 10"), Value::Number(2.0));
    }

    #[test]
    fn test_while_with_break_and_continue() {
        let source = "i = 0; n = 0; while (true) { i++; if (i > 10) { break; } if (i % 2 == 0) { continue; } n = n + i; } n";
        assert_eq!(run(source), Value::Number(25.0));
    }

    #[test]
    fn test_short_circuit_yields_boolean() {
        assert_eq!(run("0 || 5"), Value::Bool(true));
        assert_eq!(run("1 && 0"), Value::Bool(false));
        assert_eq!(run("x = 1; false && (x = 2); x"), Value::Number(1.0));
        assert_eq!(run("x = 1; true || (x = 2); x"), Value::Number(1.0));
    }

    #[test]
    fn test_increments() {
        assert_eq!(run("x = 1; y = x++; x * 10 + y"), Value::Number(21.0));
        assert_eq!(run("x = 1; y = ++x; x * 10 + y"), Value::Number(22.0));
        assert_eq!(run("x = 5; x--; x"), Value::Number(4.0));
    }

    #[test]
    fn test_conditional_and_pipe() {
        assert_eq!(run("x = 3; x > 2 ? \"big\" : \"small\""), Value::str("big"));
        assert_eq!(run("f = x => x * 2; 4 | f"), Value::Number(8.0));
    }

    #[test]
    fn test_block_declarations_are_local() {
        assert_eq!(run("x = 1; { var x = 2; } x"), Value::Number(1.0));
        assert_eq!(run("if (true) { y = 2; } y"), Value::Number(2.0));
    }

    #[test]
    fn test_member_access_and_assignment() {
        assert_eq!(run("o = new { a: 1 }; o.a = o.a + 1; o.a"), Value::Number(2.0));
        assert_eq!(run("o = new { a: 1 }; o.b"), Value::Nothing);
        assert_eq!(run("x = 3; x.a"), Value::Nothing);
    }
}
