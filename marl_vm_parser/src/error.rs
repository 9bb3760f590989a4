//! Diagnostic types shared by the parser and the validator

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::span::Span;

/// Closed set of static findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    UnknownSymbol,
    StringNotTerminated,
    ExpressionExpected,
    StatementExpected,
    IdentifierExpected,
    TerminatorExpected,
    LoopMissing,
    ScopeNotClosed,
    GroupNotClosed,
    ListNotClosed,
    OpenGroupExpected,
    AssignableExpected,
    ColonExpected,
    ArrowExpected,
    /// Nesting deeper than the parser accepts
    NestingTooDeep,
}

impl ErrorCode {
    /// Stable human-readable message
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::UnknownSymbol => "unknown symbol",
            ErrorCode::StringNotTerminated => "string literal is not terminated",
            ErrorCode::ExpressionExpected => "expected an expression",
            ErrorCode::StatementExpected => "expected a statement",
            ErrorCode::IdentifierExpected => "expected an identifier",
            ErrorCode::TerminatorExpected => "expected ';' to terminate the statement",
            ErrorCode::LoopMissing => "loop control used outside of a loop",
            ErrorCode::ScopeNotClosed => "expected '}' to close the scope",
            ErrorCode::GroupNotClosed => "expected ')' to close the group",
            ErrorCode::ListNotClosed => "expected ']' to close the list",
            ErrorCode::OpenGroupExpected => "expected '('",
            ErrorCode::AssignableExpected => "left side of the assignment is not assignable",
            ErrorCode::ColonExpected => "expected ':'",
            ErrorCode::ArrowExpected => "expected '=>'",
            ErrorCode::NestingTooDeep => "nesting is too deep",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A positional, non-fatal finding
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code} at line {}, column {}", .span.start_line, .span.start_column)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, span: Span) -> Self {
        Self { code, span }
    }

    /// Format the diagnostic with the offending source line and a marker.
    pub fn format_with_context(&self, source: &str) -> String {
        let span = &self.span;
        let line_idx = span.start_line.saturating_sub(1);
        let Some(line) = source.lines().nth(line_idx) else {
            return String::new();
        };

        let col = span.start_column.saturating_sub(1);
        let len = if span.start_line == span.end_line {
            span.end_column.saturating_sub(span.start_column).max(1)
        } else {
            1
        };
        let marker = "^".repeat(len.min(line.len().saturating_sub(col)).max(1));

        format!(
            "  {} | {}\n  {} | {}{}",
            span.start_line,
            line,
            " ".repeat(span.start_line.to_string().len()),
            " ".repeat(col),
            marker
        )
    }
}

/// Render every diagnostic with its source context
pub fn format_all(diagnostics: &[Diagnostic], source: &str) -> String {
    diagnostics
        .iter()
        .enumerate()
        .map(|(i, d)| format!("Error {}: {}\n{}", i + 1, d, d.format_with_context(source)))
        .collect::<Vec<_>>()
        .join("\n\n")
}
