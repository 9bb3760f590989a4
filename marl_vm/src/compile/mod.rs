//! Compiler: statement trees to flat instruction sequences.
//!
//! Forward jumps are emitted with a `usize::MAX` placeholder and patched
//! once the target is known. Each `while` pushes a [`LoopContext`] collecting
//! the `break`/`continue` jumps of its body.

mod free_vars;

use std::rc::Rc;

use log::trace;
use marl_vm_parser::{BinaryOp, Expr, Literal, Parameters, Stmt, UnaryOp};

use crate::instr::{Instr, Program};

pub(crate) use free_vars::ARGS_NAME;

/// Compiled function literal. Each evaluation of the literal pairs it with
/// the current scope to make a closure.
#[derive(Debug)]
pub struct FunctionTemplate {
    pub parameters: Vec<String>,
    pub body: Program,
    /// Outer names the body refers to
    pub free_variables: Vec<String>,
    /// Whether the body starts with `BindArgs`
    pub binds_args: bool,
}

/// Loop context for tracking break/continue targets
#[derive(Debug)]
struct LoopContext {
    /// Instruction indices for loop exits (break)
    exit_patches: Vec<usize>,
    /// Instruction indices for loop continues
    continue_patches: Vec<usize>,
    /// Block scopes open when the loop started
    scope_depth: usize,
}

#[derive(Debug, Default)]
struct Compiler {
    code: Vec<Instr>,
    loop_stack: Vec<LoopContext>,
    scope_depth: usize,
}

/// Compile a program. Never fails; malformed nodes compile to `Nothing`.
pub fn compile(statements: &[Stmt]) -> Program {
    let mut compiler = Compiler::default();
    for stmt in statements {
        compiler.compile_stmt(stmt);
    }
    trace!("compiled {} statement(s) into {} instruction(s)", statements.len(), compiler.here());
    Program::new(compiler.code)
}

fn compile_function(parameters: &Parameters, body: &Stmt) -> FunctionTemplate {
    let binds_args = free_vars::binds_args(parameters, body);
    let mut compiler = Compiler::default();
    if binds_args {
        compiler.emit(Instr::BindArgs);
    }
    match body {
        // The call frame is the body's scope
        Stmt::Block { statements, .. } => {
            for stmt in statements {
                compiler.compile_stmt(stmt);
            }
        }
        other => compiler.compile_stmt(other),
    }

    FunctionTemplate {
        parameters: parameters.names().map(str::to_string).collect(),
        body: Program::new(compiler.code),
        free_variables: free_vars::analyze_free_variables(parameters, body),
        binds_args,
    }
}

impl Compiler {
    fn emit(&mut self, instr: Instr) {
        self.code.push(instr);
    }

    fn here(&self) -> usize {
        self.code.len()
    }

    /// Emit a jump with a placeholder target, returning its index
    fn emit_jump(&mut self, instr: fn(usize) -> Instr) -> usize {
        let at = self.here();
        self.emit(instr(usize::MAX));
        at
    }

    fn patch_jump(&mut self, at: usize, target: usize) {
        self.code[at] = match &self.code[at] {
            Instr::Jump(_) => Instr::Jump(target),
            Instr::JumpIfFalse(_) => Instr::JumpIfFalse(target),
            Instr::JumpIfFalseOrPop(_) => Instr::JumpIfFalseOrPop(target),
            Instr::JumpIfTrueOrPop(_) => Instr::JumpIfTrueOrPop(target),
            _ => return,
        };
    }

    fn patch_to_here(&mut self, at: usize) {
        let target = self.here();
        self.patch_jump(at, target);
    }

    // ==================== Statements ====================

    fn compile_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Simple { expr, .. } => {
                if !expr.is_empty() {
                    self.compile_expr(expr);
                    self.emit(Instr::Keep);
                }
            }
            Stmt::Var { declaration, .. } => {
                self.compile_declaration(declaration);
                self.emit(Instr::Keep);
            }
            Stmt::Return { value, .. } => {
                self.compile_expr(value);
                self.emit(Instr::Return);
            }
            Stmt::Break { .. } => self.compile_loop_jump(true),
            Stmt::Continue { .. } => self.compile_loop_jump(false),
            Stmt::If {
                condition,
                primary,
                secondary,
                ..
            } => {
                self.compile_expr(condition);
                let else_jump = self.emit_jump(Instr::JumpIfFalse);
                self.compile_stmt(primary);
                match secondary {
                    Some(secondary) => {
                        let end_jump = self.emit_jump(Instr::Jump);
                        self.patch_to_here(else_jump);
                        self.compile_stmt(secondary);
                        self.patch_to_here(end_jump);
                    }
                    None => self.patch_to_here(else_jump),
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                let loop_start = self.here();
                self.compile_expr(condition);
                let exit_jump = self.emit_jump(Instr::JumpIfFalse);

                self.loop_stack.push(LoopContext {
                    exit_patches: vec![exit_jump],
                    continue_patches: Vec::new(),
                    scope_depth: self.scope_depth,
                });
                self.compile_stmt(body);
                self.emit(Instr::Jump(loop_start));

                if let Some(ctx) = self.loop_stack.pop() {
                    let loop_end = self.here();
                    for at in ctx.exit_patches {
                        self.patch_jump(at, loop_end);
                    }
                    for at in ctx.continue_patches {
                        self.patch_jump(at, loop_start);
                    }
                }
            }
            Stmt::Block { statements, .. } => {
                self.emit(Instr::PushScope);
                self.scope_depth += 1;
                for stmt in statements {
                    self.compile_stmt(stmt);
                }
                self.scope_depth -= 1;
                self.emit(Instr::PopScope);
            }
        }
    }

    /// `break`/`continue`: leave the blocks opened inside the loop, then jump.
    /// Outside a loop these compile to nothing; the validator reports them.
    fn compile_loop_jump(&mut self, is_break: bool) {
        let Some(loop_depth) = self.loop_stack.last().map(|ctx| ctx.scope_depth) else {
            return;
        };
        for _ in loop_depth..self.scope_depth {
            self.emit(Instr::PopScope);
        }
        let at = self.emit_jump(Instr::Jump);
        if let Some(ctx) = self.loop_stack.last_mut() {
            if is_break {
                ctx.exit_patches.push(at);
            } else {
                ctx.continue_patches.push(at);
            }
        }
    }

    fn compile_declaration(&mut self, declaration: &Expr) {
        match declaration {
            Expr::Variable { name, .. } => {
                self.emit(Instr::PushNothing);
                self.emit(Instr::Declare(name.clone()));
            }
            Expr::Assignment { target, value, .. } => {
                self.compile_expr(value);
                if let Expr::Variable { name, .. } = target.as_ref() {
                    self.emit(Instr::Declare(name.clone()));
                }
            }
            other => self.compile_expr(other),
        }
    }

    // ==================== Expressions ====================

    fn compile_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Constant { value, .. } => self.emit(match value {
                Literal::Number(n) => Instr::PushNumber(*n),
                Literal::Bool(b) => Instr::PushBool(*b),
                Literal::Str(s) => Instr::PushStr(Rc::from(s.as_str())),
            }),
            Expr::Variable { name, .. } => self.emit(Instr::Load(name.clone())),
            Expr::Empty { .. } | Expr::Invalid { .. } => self.emit(Instr::PushNothing),
            Expr::Assignment { target, value, .. } => self.compile_assignment(target, value),
            Expr::Binary {
                op, left, right, ..
            } => self.compile_binary(*op, left, right),
            Expr::Unary { op, operand, .. } => self.compile_unary(*op, operand),
            Expr::Conditional {
                condition,
                then_value,
                else_value,
                ..
            } => {
                self.compile_expr(condition);
                let else_jump = self.emit_jump(Instr::JumpIfFalse);
                self.compile_expr(then_value);
                let end_jump = self.emit_jump(Instr::Jump);
                self.patch_to_here(else_jump);
                self.compile_expr(else_value);
                self.patch_to_here(end_jump);
            }
            Expr::Range { from, step, to, .. } => {
                self.compile_expr(from);
                if let Some(step) = step {
                    self.compile_expr(step);
                }
                self.compile_expr(to);
                self.emit(Instr::MakeRange {
                    has_step: step.is_some(),
                });
            }
            Expr::Function {
                parameters, body, ..
            } => {
                let template = compile_function(parameters, body);
                self.emit(Instr::MakeClosure(Rc::new(template)));
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                self.compile_expr(callee);
                for argument in arguments {
                    self.compile_expr(argument);
                }
                self.emit(Instr::Call(arguments.len()));
            }
            Expr::Member { object, member, .. } => {
                self.compile_expr(object);
                self.emit(Instr::GetMember(member.clone()));
            }
            Expr::Matrix { rows, .. } => {
                for element in rows.iter().flatten() {
                    self.compile_expr(element);
                }
                self.emit(Instr::MakeMatrix(rows.iter().map(Vec::len).collect()));
            }
            Expr::Object { properties, .. } => {
                for property in properties {
                    self.compile_expr(&property.value);
                }
                self.emit(Instr::MakeObject(
                    properties.iter().map(|p| p.name.clone()).collect(),
                ));
            }
            Expr::List { elements, .. } => {
                for element in elements {
                    self.compile_expr(element);
                }
                self.emit(Instr::MakeList(elements.len()));
            }
        }
    }

    fn compile_assignment(&mut self, target: &Expr, value: &Expr) {
        match target {
            Expr::Variable { name, .. } => {
                self.compile_expr(value);
                self.emit(Instr::Store(name.clone()));
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                self.compile_expr(callee);
                for argument in arguments {
                    self.compile_expr(argument);
                }
                self.compile_expr(value);
                self.emit(Instr::SetItem(arguments.len()));
            }
            Expr::Member { object, member, .. } => {
                self.compile_expr(object);
                self.compile_expr(value);
                self.emit(Instr::SetMember(member.clone()));
            }
            // Not assignable: evaluate for the value only
            _ => self.compile_expr(value),
        }
    }

    fn compile_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) {
        match op {
            BinaryOp::And | BinaryOp::Or => {
                self.compile_expr(left);
                self.emit(Instr::ToBool);
                let end_jump = if op == BinaryOp::And {
                    self.emit_jump(Instr::JumpIfFalseOrPop)
                } else {
                    self.emit_jump(Instr::JumpIfTrueOrPop)
                };
                self.compile_expr(right);
                self.emit(Instr::ToBool);
                self.patch_to_here(end_jump);
            }
            // `x | f` is `f(x)`
            BinaryOp::Pipe => {
                self.compile_expr(right);
                self.compile_expr(left);
                self.emit(Instr::Call(1));
            }
            _ => {
                self.compile_expr(left);
                self.compile_expr(right);
                self.emit(Instr::Binary(op));
            }
        }
    }

    fn compile_unary(&mut self, op: UnaryOp, operand: &Expr) {
        let step = match op {
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => BinaryOp::Add,
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => BinaryOp::Sub,
            _ => {
                self.compile_expr(operand);
                self.emit(Instr::Unary(op));
                return;
            }
        };
        let postfix = matches!(op, UnaryOp::PostIncrement | UnaryOp::PostDecrement);

        self.compile_expr(operand);
        if postfix {
            self.emit(Instr::Dup);
        }
        self.emit(Instr::PushNumber(1.0));
        self.emit(Instr::Binary(step));
        if let Expr::Variable { name, .. } = operand {
            self.emit(Instr::Store(name.clone()));
        }
        if postfix {
            self.emit(Instr::Pop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marl_vm_parser::parse_statements;

    fn compile_source(source: &str) -> Program {
        let (statements, _) = parse_statements(source);
        compile(&statements)
    }

    #[test]
    fn test_simple_statement_keeps_value() {
        let program = compile_source("1 + 2;");
        assert!(matches!(
            program.instructions(),
            [
                Instr::PushNumber(_),
                Instr::PushNumber(_),
                Instr::Binary(BinaryOp::Add),
                Instr::Keep
            ]
        ));
    }

    #[test]
    fn test_all_jumps_are_patched() {
        let program = compile_source(
            "while (i < 5) { if (i == 2) { break; } else { continue; } i++; } x = a && b || c;",
        );
        for instr in program.instructions() {
            if let Some(target) = instr.jump_target() {
                assert!(target <= program.len(), "unpatched {:?}", instr);
            }
        }
    }

    #[test]
    fn test_break_pops_block_scopes() {
        let program = compile_source("while (true) { { break; } }");
        let code = program.instructions();
        let pops_before_jump = code
            .windows(3)
            .any(|w| matches!(w, [Instr::PopScope, Instr::PopScope, Instr::Jump(_)]));
        assert!(pops_before_jump);
    }

    #[test]
    fn test_loop_control_outside_loop_emits_nothing() {
        assert!(compile_source("break;").is_empty());
    }

    #[test]
    fn test_function_template() {
        let program = compile_source("f = (x, y) => x + y + z");
        let template = program
            .instructions()
            .iter()
            .find_map(|instr| match instr {
                Instr::MakeClosure(template) => Some(template.clone()),
                _ => None,
            })
            .unwrap();

        assert_eq!(template.parameters, vec!["x", "y"]);
        assert_eq!(template.free_variables, vec!["z"]);
        assert!(template.binds_args);
        assert!(matches!(template.body.instructions()[0], Instr::BindArgs));
    }

    #[test]
    fn test_args_parameter_skips_binding() {
        let program = compile_source("(args) => args");
        let has_bind = program.instructions().iter().any(|instr| match instr {
            Instr::MakeClosure(template) => template
                .body
                .instructions()
                .iter()
                .any(|i| matches!(i, Instr::BindArgs)),
            _ => false,
        });
        assert!(!has_bind);
    }
}
