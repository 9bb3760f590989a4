//! Diagnostic tests
//!
//! Error counts and ordering produced by parsing followed by validation.

use marl_vm_parser::{is_completed, parse_statements, validate, Diagnostic, ErrorCode};
use pretty_assertions::assert_eq;

fn diagnostics(source: &str) -> Vec<Diagnostic> {
    let (statements, _) = parse_statements(source);
    validate(&statements)
}

fn codes(source: &str) -> Vec<ErrorCode> {
    diagnostics(source).into_iter().map(|d| d.code).collect()
}

// ==================== Well-formed Programs ====================

#[test]
fn test_valid_programs_have_no_diagnostics() {
    let sources = [
        "if () {}",
        "if (true) {}",
        "if (true) n = 2 + 3",
        "if (a + b + c == d / 2) { n = k; }",
        "while (true);",
        "var x = 9; return x + pi",
        "while (i < 5) { n++; while (i < 4) { i++; } i++; }",
        "f = (x, y, z) => x + y^2 + z^3; f()(1)(2)(3)",
        "l = list(false); l(1) = \"foo\"; length(l)",
        "o = new { a: 1 }; o.a = 2; o(\"a\")",
    ];

    for source in sources {
        assert_eq!(codes(source), Vec::<ErrorCode>::new(), "source: {}", source);
    }
}

// ==================== Single Error Programs ====================

#[test]
fn test_incomplete_programs_have_exactly_one_error() {
    let sources = [
        "if (true) { n = 2 + 3",
        "if (true) { n = 2 + 3;",
        "while (true) {",
        "if () { } else",
    ];

    for source in sources {
        assert_eq!(codes(source).len(), 1, "source: {}", source);
    }
}

// ==================== Loop Control ====================

#[test]
fn test_loop_control_diagnostics() {
    assert_eq!(codes("break"), vec![ErrorCode::LoopMissing]);
    assert_eq!(
        codes("break true"),
        vec![ErrorCode::LoopMissing, ErrorCode::TerminatorExpected]
    );
    assert_eq!(codes("continue"), vec![ErrorCode::LoopMissing]);
    assert_eq!(
        codes("continue 2+3"),
        vec![ErrorCode::LoopMissing, ErrorCode::TerminatorExpected]
    );
}

#[test]
fn test_payload_inside_loop_is_still_rejected() {
    assert_eq!(
        codes("while (true) { break 1; }"),
        vec![ErrorCode::TerminatorExpected]
    );
}

// ==================== Structural Errors ====================

#[test]
fn test_structural_error_codes() {
    assert_eq!(codes("f(1, 2"), vec![ErrorCode::GroupNotClosed]);
    assert_eq!(codes("m = [1, 2"), vec![ErrorCode::ListNotClosed]);
    assert_eq!(codes("l = new [1, 2"), vec![ErrorCode::ListNotClosed]);
    assert_eq!(codes("o = new { a: 1"), vec![ErrorCode::ScopeNotClosed]);
    assert_eq!(codes("o = new { a }"), vec![ErrorCode::ColonExpected]);
    assert_eq!(codes("while true {}"), vec![ErrorCode::OpenGroupExpected]);
    assert_eq!(codes("x = (a, b)"), vec![ErrorCode::ArrowExpected]);
    assert_eq!(codes("c ? 1"), vec![ErrorCode::ColonExpected]);
    assert_eq!(codes("x = o."), vec![ErrorCode::IdentifierExpected]);
    assert_eq!(codes("x = 1 + ;"), vec![ErrorCode::ExpressionExpected]);
    assert_eq!(codes("x = @"), vec![ErrorCode::UnknownSymbol]);
    assert_eq!(codes("x = \"open"), vec![ErrorCode::StringNotTerminated]);
}

#[test]
fn test_validation_includes_parser_markers() {
    let source = "if (x { y = [1, 2 }";
    let (statements, parser_markers) = parse_statements(source);
    let all = validate(&statements);

    for marker in &parser_markers {
        assert!(all.contains(marker), "missing {:?}", marker);
    }
}

#[test]
fn test_diagnostic_positions() {
    let found = diagnostics("x = 1;\nbreak");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].span.start_line, 2);
    assert_eq!(found[0].span.start_column, 1);
    assert!(found[0].to_string().contains("line 2"));
}

// ==================== Completeness ====================

#[test]
fn test_is_completed() {
    assert!(is_completed("x = 1"));
    assert!(is_completed("f = (x) => { return [x, x]; }"));
    assert!(!is_completed("f = (x) => {"));
    assert!(!is_completed("m = [1, 2;"));
    assert!(!is_completed("g(1, (2"));
}
