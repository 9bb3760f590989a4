//! Instruction set.
//!
//! A program is a flat sequence; control flow uses absolute instruction
//! indices. Stack effects are noted as `[before] -> [after]`, top rightmost.

use std::fmt;
use std::rc::Rc;

use marl_vm_parser::{BinaryOp, UnaryOp};

use crate::compile::FunctionTemplate;

#[derive(Debug, Clone)]
pub enum Instr {
    // constants
    PushNumber(f64),
    PushBool(bool),
    PushStr(Rc<str>),
    PushNothing,

    // variables
    /// `[] -> [value]`; unknown names push Nothing
    Load(String),
    /// `[v] -> [v]`; plain assignment
    Store(String),
    /// `[v] -> [v]`; `var` declaration in the innermost frame
    Declare(String),
    /// Bind `args` to the current call's arguments unless the frame already has it
    BindArgs,

    // stack
    Pop,
    Dup,
    /// `[v] -> []`; records `v` as the most recent statement value
    Keep,

    // operators
    Binary(BinaryOp),
    /// `Neg`, `Plus`, `Not` and `Transpose` only; increments are lowered to loads and stores
    Unary(UnaryOp),
    /// `[v] -> [Bool]`
    ToBool,

    // control flow
    Jump(usize),
    /// `[c] -> []`
    JumpIfFalse(usize),
    /// `[c] -> [c]` and jump when falsy, else `[c] -> []`
    JumpIfFalseOrPop(usize),
    /// `[c] -> [c]` and jump when truthy, else `[c] -> []`
    JumpIfTrueOrPop(usize),
    PushScope,
    PopScope,
    /// `[v] -> []`; stores `v` as the result and stops this sequence
    Return,

    // construction
    MakeClosure(Rc<FunctionTemplate>),
    /// Element count per row; `[e..] -> [matrix]`
    MakeMatrix(Vec<usize>),
    /// `[from, (step,) to] -> [matrix]`
    MakeRange { has_step: bool },
    /// `[v..] -> [object]` with one key per value
    MakeObject(Vec<String>),
    /// `[e..] -> [list]`
    MakeList(usize),

    // access
    /// `[callee, a..] -> [result]`
    Call(usize),
    /// `[target, a.., v] -> [v]`
    SetItem(usize),
    /// `[object] -> [value]`
    GetMember(String),
    /// `[object, v] -> [v]`
    SetMember(String),
}

impl Instr {
    /// Jump target, for instructions that have one
    pub fn jump_target(&self) -> Option<usize> {
        match self {
            Instr::Jump(t)
            | Instr::JumpIfFalse(t)
            | Instr::JumpIfFalseOrPop(t)
            | Instr::JumpIfTrueOrPop(t) => Some(*t),
            _ => None,
        }
    }
}

/// Compiled instruction sequence
#[derive(Clone)]
pub struct Program {
    code: Rc<[Instr]>,
}

impl Program {
    pub(crate) fn new(code: Vec<Instr>) -> Self {
        Self { code: code.into() }
    }

    pub fn instructions(&self) -> &[Instr] {
        &self.code
    }

    pub(crate) fn code(&self) -> Rc<[Instr]> {
        self.code.clone()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("len", &self.code.len())
            .finish()
    }
}

/// One instruction per line, prefixed with its index
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, instr) in self.code.iter().enumerate() {
            writeln!(f, "{:4} {:?}", index, instr)?;
        }
        Ok(())
    }
}
