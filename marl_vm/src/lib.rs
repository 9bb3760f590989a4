//! marl_vm
//!
//! Compiler, stack VM and runtime for the Marl expression language. Source
//! text is parsed and validated by `marl_vm_parser`; this crate lowers the
//! tree to a flat instruction sequence and executes it.
//!
//! # Example
//!
//! ```
//! use marl_vm::{Engine, Value};
//!
//! let engine = Engine::new();
//! let result = engine.interpret("f = (x, y, z) => x + y^2 + z^3; f()(1)(2)(3)").unwrap();
//!
//! assert_eq!(result, Value::Number(32.0));
//! ```

// Library code never writes to the console
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]

pub mod builtins;
pub mod compile;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod instr;
pub mod scope;
pub mod value;
pub mod vm;

// Re-exports
pub use compile::{compile, FunctionTemplate};
pub use config::EngineConfig;
pub use convert::{convert, find_converter, find_converter_to, HostType, HostValue};
pub use engine::Engine;
pub use error::{EngineError, NativeError};
pub use instr::{Instr, Program};
pub use scope::{Globals, Scope};
pub use value::{Function, FunctionKind, Matrix, Value, ValueType};
pub use vm::call::{curry, invoke, CurryOutcome};
pub use vm::Vm;

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
