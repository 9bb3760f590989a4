//! marl_vm_parser
//!
//! Front half of the Marl pipeline: tokenizer, recovering parser, validator,
//! completeness check and completion walker. Nothing here executes code; the
//! `marl_vm` crate compiles the trees produced here.
//!
//! # Example
//!
//! ```
//! use marl_vm_parser::{parse_statements, validate, ErrorCode};
//!
//! let (statements, _) = parse_statements("break true");
//! let codes: Vec<_> = validate(&statements).into_iter().map(|d| d.code).collect();
//!
//! assert_eq!(codes, vec![ErrorCode::LoopMissing, ErrorCode::TerminatorExpected]);
//! ```

pub mod ast;
pub mod completion;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;
pub mod validate;

// Re-exports
pub use ast::{BinaryOp, Expr, Literal, Parameters, Property, Stmt, UnaryOp};
pub use completion::completions;
pub use error::{Diagnostic, ErrorCode};
pub use lexer::{is_completed, Lexer, SpannedToken};
pub use parser::Parser;
pub use span::{SourceMap, Span};
pub use token::{Associativity, Precedence, Token};
pub use validate::validate;

/// Parse source text into statements.
///
/// Never fails. The returned diagnostics are the recovery markers the parser
/// inserted; run [`validate`] for the complete rule set.
pub fn parse_statements(source: &str) -> (Vec<Stmt>, Vec<Diagnostic>) {
    parser::parse(source)
}

/// Tokenize source text. The last token is always `Token::End`.
pub fn tokenize(source: &str) -> Vec<SpannedToken<'_>> {
    lexer::tokenize(source)
}

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
