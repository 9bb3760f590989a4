//! Parser tests
//!
//! Tree shapes for statements and expressions, including recovery nodes.

use marl_vm_parser::{parse_statements, validate, BinaryOp, ErrorCode, Expr, Literal, Stmt, UnaryOp};
use pretty_assertions::assert_eq;

fn parse_ok(source: &str) -> Vec<Stmt> {
    let (statements, diagnostics) = parse_statements(source);
    assert!(diagnostics.is_empty(), "Parse errors: {:?}", diagnostics);
    statements
}

fn parse_stmt(source: &str) -> Stmt {
    parse_ok(source)
        .into_iter()
        .next()
        .expect("no statement parsed")
}

fn parse_expr(source: &str) -> Expr {
    match parse_stmt(source) {
        Stmt::Simple { expr, .. } => expr,
        other => panic!("expected a simple statement, got {:?}", other),
    }
}

/// Render an expression as a fully parenthesized string
fn sexp(expr: &Expr) -> String {
    match expr {
        Expr::Constant { value, .. } => match value {
            Literal::Number(n) => n.to_string(),
            Literal::Bool(b) => b.to_string(),
            Literal::Str(s) => format!("{:?}", s),
        },
        Expr::Variable { name, .. } => name.clone(),
        Expr::Empty { .. } => "<empty>".to_string(),
        Expr::Invalid { code, .. } => format!("<{:?}>", code),
        Expr::Assignment { target, value, .. } => {
            format!("(= {} {})", sexp(target), sexp(value))
        }
        Expr::Binary {
            op, left, right, ..
        } => format!("({} {} {})", op.symbol(), sexp(left), sexp(right)),
        Expr::Unary { op, operand, .. } => format!("({:?} {})", op, sexp(operand)),
        Expr::Conditional {
            condition,
            then_value,
            else_value,
            ..
        } => format!(
            "(? {} {} {})",
            sexp(condition),
            sexp(then_value),
            sexp(else_value)
        ),
        Expr::Range { from, step, to, .. } => match step {
            Some(step) => format!("(: {} {} {})", sexp(from), sexp(step), sexp(to)),
            None => format!("(: {} {})", sexp(from), sexp(to)),
        },
        Expr::Function { parameters, .. } => {
            format!("(fn {})", parameters.names().collect::<Vec<_>>().join(" "))
        }
        Expr::Call {
            callee, arguments, ..
        } => {
            let mut parts = vec![sexp(callee)];
            parts.extend(arguments.iter().map(sexp));
            format!("(call {})", parts.join(" "))
        }
        Expr::Member { object, member, .. } => format!("(. {} {})", sexp(object), member),
        Expr::Matrix { rows, .. } => {
            let rows: Vec<String> = rows
                .iter()
                .map(|row| row.iter().map(sexp).collect::<Vec<_>>().join(" "))
                .collect();
            format!("[{}]", rows.join("; "))
        }
        Expr::Object { properties, .. } => {
            let props: Vec<String> = properties
                .iter()
                .map(|p| format!("{}: {}", p.name, sexp(&p.value)))
                .collect();
            format!("{{{}}}", props.join(", "))
        }
        Expr::List { elements, .. } => {
            format!("(list {})", elements.iter().map(sexp).collect::<Vec<_>>().join(" "))
        }
    }
}

// ==================== Statement Tests ====================

#[test]
fn test_two_simple_statements() {
    let statements = parse_ok("d = 5; a = b + c * d");
    assert_eq!(statements.len(), 2);
    assert!(statements
        .iter()
        .all(|s| matches!(s, Stmt::Simple { terminated: true, .. })));
}

#[test]
fn test_return_payloads() {
    match parse_stmt("return") {
        Stmt::Return { value, .. } => assert!(value.is_empty()),
        other => panic!("unexpected {:?}", other),
    }
    match parse_stmt("return 5") {
        Stmt::Return { value, .. } => assert!(matches!(
            value,
            Expr::Constant {
                value: Literal::Number(n),
                ..
            } if n == 5.0
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_if_with_block_and_simple_bodies() {
    match parse_stmt("if (true) {}") {
        Stmt::If {
            primary, secondary, ..
        } => {
            assert!(matches!(*primary, Stmt::Block { closed: true, .. }));
            assert!(secondary.is_none());
        }
        other => panic!("unexpected {:?}", other),
    }
    match parse_stmt("if (true) n = 2 + 3") {
        Stmt::If { primary, .. } => assert!(matches!(*primary, Stmt::Simple { .. })),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_if_with_empty_condition() {
    match parse_stmt("if () {}") {
        Stmt::If { condition, .. } => assert!(condition.is_empty()),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_if_else_chain() {
    match parse_stmt("if (a) x = 1; else if (b) x = 2; else x = 3;") {
        Stmt::If {
            secondary: Some(secondary),
            ..
        } => assert!(matches!(
            *secondary,
            Stmt::If {
                secondary: Some(_),
                ..
            }
        )),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_while_with_empty_body() {
    match parse_stmt("while (true);") {
        Stmt::While { body, .. } => match *body {
            Stmt::Simple { expr, .. } => assert!(expr.is_empty()),
            other => panic!("unexpected body {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_var_then_return() {
    let statements = parse_ok("var x = 9; return x + pi");
    assert!(matches!(statements[0], Stmt::Var { .. }));
    match &statements[1] {
        Stmt::Return { value, .. } => assert_eq!(sexp(value), "(+ x pi)"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_nested_loops() {
    let statements = parse_ok("while (i < 5) { n++; while (i < 4) { i++; } i++; }");
    match &statements[0] {
        Stmt::While { body, .. } => match body.as_ref() {
            Stmt::Block { statements, .. } => assert_eq!(statements.len(), 3),
            other => panic!("unexpected body {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_break_payload_is_grammatical() {
    let (statements, diagnostics) = parse_statements("break true");
    assert!(diagnostics.is_empty());
    match &statements[0] {
        Stmt::Break { payload, .. } => assert!(!payload.is_empty()),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_comments_between_statements() {
    let statements = parse_ok("a = 1; // first\n/* second */ b = 2;");
    assert_eq!(statements.len(), 2);
}

// ==================== Expression Tests ====================

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(sexp(&parse_expr("a + b * c")), "(+ a (* b c))");
    assert_eq!(sexp(&parse_expr("a - b - c")), "(- (- a b) c)");
    assert_eq!(sexp(&parse_expr("a \\ b % c")), "(% (\\ a b) c)");
}

#[test]
fn test_power_is_right_associative_and_binds_tighter_than_negation() {
    assert_eq!(sexp(&parse_expr("a ^ b ^ c")), "(^ a (^ b c))");
    assert_eq!(sexp(&parse_expr("-2 ^ 2")), "(Neg (^ 2 2))");
    assert_eq!(sexp(&parse_expr("2 ^ -1")), "(^ 2 (Neg 1))");
}

#[test]
fn test_logical_and_comparison() {
    assert_eq!(
        sexp(&parse_expr("a < b && c == d || e")),
        "(|| (&& (< a b) (== c d)) e)"
    );
    assert_eq!(sexp(&parse_expr("!a ~= b")), "(~= (Not a) b)");
}

#[test]
fn test_assignment_is_right_associative() {
    assert_eq!(sexp(&parse_expr("a = b = 1")), "(= a (= b 1))");
}

#[test]
fn test_conditional_and_range() {
    assert_eq!(sexp(&parse_expr("c ? 1 : 2")), "(? c 1 2)");
    assert_eq!(sexp(&parse_expr("c ? a < b : d")), "(? c (< a b) d)");
    assert_eq!(sexp(&parse_expr("1:5")), "(: 1 5)");
    assert_eq!(sexp(&parse_expr("1:2:n+1")), "(: 1 2 (+ n 1))");
    assert_eq!(sexp(&parse_expr("c ? (1:3) : 4")), "(? c (: 1 3) 4)");
}

#[test]
fn test_pipe() {
    assert_eq!(sexp(&parse_expr("x | f | g")), "(| (| x f) g)");
}

#[test]
fn test_curried_calls_nest() {
    assert_eq!(
        sexp(&parse_expr("f()(1)(2)(3)")),
        "(call (call (call (call f) 1) 2) 3)"
    );
}

#[test]
fn test_literals_are_callable() {
    assert_eq!(sexp(&parse_expr("\"test\"(2)")), "(call \"test\" 2)");
    assert_eq!(sexp(&parse_expr("[1,2,3;4,5,6](1,3)")), "(call [1 2 3; 4 5 6] 1 3)");
    assert_eq!(sexp(&parse_expr("new { a: 29 }(\"a\")")), "(call {a: 29} \"a\")");
}

#[test]
fn test_postfix_operators() {
    assert_eq!(sexp(&parse_expr("m'")), "(Transpose m)");
    assert_eq!(sexp(&parse_expr("n++")), "(PostIncrement n)");
    assert_eq!(sexp(&parse_expr("--n")), "(PreDecrement n)");
    assert_eq!(sexp(&parse_expr("o.a.b")), "(. (. o a) b)");
}

#[test]
fn test_lambdas() {
    assert_eq!(sexp(&parse_expr("(x, y) => x * y + y")), "(fn x y)");
    assert_eq!(sexp(&parse_expr("x => x")), "(fn x)");
    assert_eq!(sexp(&parse_expr("() => 1")), "(fn )");

    match parse_expr("f = (a) => { return a; }") {
        Expr::Assignment { value, .. } => match *value {
            Expr::Function { body, .. } => assert!(matches!(*body, Stmt::Block { .. })),
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_lambda_expression_body_extends_right() {
    match parse_expr("x => x + 1") {
        Expr::Function { body, .. } => match *body {
            Stmt::Simple { expr, .. } => assert_eq!(sexp(&expr), "(+ x 1)"),
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_collection_literals() {
    assert_eq!(sexp(&parse_expr("[]")), "[]");
    assert_eq!(sexp(&parse_expr("[1, 2; 3, 4]")), "[1 2; 3 4]");
    assert_eq!(sexp(&parse_expr("new [1, \"a\", true]")), "(list 1 \"a\" true)");
    assert_eq!(
        sexp(&parse_expr("new { a: 1, \"b c\": 2, 3: x }")),
        "{a: 1, b c: 2, 3: x}"
    );
    assert_eq!(sexp(&parse_expr("new {}")), "{}");
}

#[test]
fn test_number_forms() {
    assert_eq!(sexp(&parse_expr("0x10 + 0b11 + 1.5e1")), "(+ (+ 16 3) 15)");
}

#[test]
fn test_string_escapes() {
    match parse_expr(r#""a\tb""#) {
        Expr::Constant {
            value: Literal::Str(s),
            ..
        } => assert_eq!(s, "a\tb"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_unary_ops_enumerated() {
    match parse_expr("+x") {
        Expr::Unary { op, .. } => assert_eq!(op, UnaryOp::Plus),
        other => panic!("unexpected {:?}", other),
    }
    match parse_expr("a ~= b") {
        Expr::Binary { op, .. } => assert_eq!(op, BinaryOp::NotEq),
        other => panic!("unexpected {:?}", other),
    }
}

// ==================== Span Tests ====================

#[test]
fn test_spans_cover_nodes() {
    let statements = parse_ok("x = 1 + 22;");
    let span = statements[0].span();
    assert_eq!((span.start, span.end), (0, 11));

    match &statements[0] {
        Stmt::Simple { expr, .. } => {
            let span = expr.span();
            assert_eq!((span.start, span.end), (0, 10));
        }
        other => panic!("unexpected {:?}", other),
    }
}

// ==================== Recovery Tests ====================

#[test]
fn test_unclosed_call_keeps_arguments() {
    let (statements, diagnostics) = parse_statements("f(1, 2");
    assert_eq!(diagnostics.len(), 1);
    match &statements[0] {
        Stmt::Simple { expr, .. } => assert_eq!(sexp(expr), "(call f 1 2 <GroupNotClosed>)"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_unclosed_block() {
    let (statements, diagnostics) = parse_statements("{ a = 1;");
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(statements[0], Stmt::Block { closed: false, .. }));
}

#[test]
fn test_missing_else_body() {
    let (statements, diagnostics) = parse_statements("if () { } else");
    assert_eq!(diagnostics.len(), 1);
    match &statements[0] {
        Stmt::If {
            secondary: Some(secondary),
            ..
        } => match secondary.as_ref() {
            Stmt::Simple { expr, .. } => assert_eq!(sexp(expr), "<StatementExpected>"),
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_stray_tokens_do_not_stop_parsing() {
    let (statements, diagnostics) = parse_statements("a = 1; ) # b = 2;");
    assert!(!diagnostics.is_empty());
    let last = statements.last().expect("statements");
    match last {
        Stmt::Simple { expr, .. } => assert_eq!(sexp(expr), "(= b 2)"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_unterminated_string() {
    let (_, diagnostics) = parse_statements("s = \"abc");
    assert_eq!(diagnostics.len(), 1);
}

// ==================== Nesting Limit ====================

fn has_nesting_marker(source: &str) -> bool {
    let (statements, diagnostics) = parse_statements(source);
    let reported = validate(&statements);
    diagnostics.iter().any(|d| d.code == ErrorCode::NestingTooDeep)
        && reported.iter().any(|d| d.code == ErrorCode::NestingTooDeep)
}

#[test]
fn test_deeply_nested_groups_are_cut_off() {
    assert!(has_nesting_marker(&"(".repeat(100_000)));
    let balanced = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
    assert!(has_nesting_marker(&balanced));
}

#[test]
fn test_long_operator_and_postfix_chains_are_cut_off() {
    assert!(has_nesting_marker(&format!("{}1", "1 + ".repeat(100_000))));
    assert!(has_nesting_marker(&format!("{}1", "-".repeat(100_000))));
    assert!(has_nesting_marker(&format!("x{}", " = x".repeat(100_000))));
    assert!(has_nesting_marker(&format!("f{}", "(1)".repeat(100_000))));
    assert!(has_nesting_marker(&format!("x{}", "'".repeat(100_000))));
}

#[test]
fn test_deeply_nested_statements_are_cut_off() {
    assert!(has_nesting_marker(&"{".repeat(100_000)));
    assert!(has_nesting_marker(&format!("{}x = 1;", "if (true) ".repeat(100_000))));
    assert!(has_nesting_marker(&format!("{}1", "x => ".repeat(100_000))));
    assert!(has_nesting_marker(&"[".repeat(100_000)));
}

#[test]
fn test_statements_after_a_cut_off_still_parse() {
    let source = format!("{}; y = 2", "-".repeat(100_000));
    let (statements, _) = parse_statements(&source);
    match statements.last() {
        Some(Stmt::Simple { expr, .. }) => assert_eq!(sexp(expr), "(= y 2)"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_moderate_nesting_is_accepted() {
    let source = format!("{}1{}", "(".repeat(40), ")".repeat(40));
    assert_eq!(sexp(&parse_expr(&source)), "1");
    parse_ok(&format!("{}1", "-".repeat(40)));
    parse_ok(&format!("{}1", "1 + ".repeat(100)));
}
