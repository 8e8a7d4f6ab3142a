//! End-to-end pipeline tests: source text → tokens → AST → code object →
//! execution, asserting on captured output and VM state.

use rill_compiler::compile_source;
use rill_core::{BufferHost, RillError, RillResult, RuntimeErrorKind};
use rill_vm::Vm;

/// Run a program and return its captured stdout, asserting the operand
/// stack balances back to its starting height.
fn run_program(source: &str) -> String {
    try_run(source).unwrap()
}

fn try_run(source: &str) -> RillResult<String> {
    let host = BufferHost::new();
    let output = host.output_handle();
    let mut vm = Vm::with_host(Box::new(host));
    let code = compile_source(source, "test.rl")?;
    vm.load(code)?;
    assert_eq!(vm.stack_depth(), 0, "operand stack must balance");
    let text = output.borrow().clone();
    Ok(text)
}

#[test]
fn test_arithmetic_and_printing() {
    assert_eq!(run_program("print(1 + 2 * 3);"), "7\n");
}

#[test]
fn test_control_flow_and_while_loop() {
    let source = "\
var i = 0;
var s = 0;
while i < 10 { s = s + i; i = i + 1; }
print(s);
";
    assert_eq!(run_program(source), "45\n");
}

#[test]
fn test_function_definition_and_call() {
    let source = "\
func add(a, b) { return a + b; }
print(add(40, 2));
";
    assert_eq!(run_program(source), "42\n");
}

#[test]
fn test_integer_division_yields_rational() {
    assert_eq!(run_program("print(1 / 3);"), "1/3\n");
}

#[test]
fn test_list_membership_and_concat() {
    let source = "\
var xs = [1, 2, 3];
var ys = [4, 5];
print(xs + ys);
print(2 in xs);
";
    assert_eq!(run_program(source), "[1, 2, 3, 4, 5]\nTrue\n");
}

#[test]
fn test_string_escape_and_equality() {
    let source = "var s = \"he\\tllo\";\nprint(s == \"he\\tllo\");\n";
    assert_eq!(run_program(source), "True\n");
}

// =============================================================================
// Boundary Behavior
// =============================================================================

#[test]
fn test_empty_program_is_a_noop() {
    assert_eq!(run_program(""), "");
}

#[test]
fn test_unterminated_string_reports_opening_position() {
    let err = try_run("var s = \"abc").unwrap_err();
    match err {
        RillError::Lex { line, column, .. } => {
            assert_eq!(line, 1);
            assert_eq!(column, 9);
        }
        other => panic!("expected LexError, got {:?}", other),
    }
}

#[test]
fn test_dangling_else_is_a_parse_error() {
    let err = try_run("var x = 1;\nelse { 2; }").unwrap_err();
    match err {
        RillError::Parse { line, .. } => assert_eq!(line, 2),
        other => panic!("expected ParseError, got {:?}", other),
    }
}

#[test]
fn test_wrong_arity_names_the_function() {
    let err = try_run("func two(a, b) { return a; }\ntwo(1);").unwrap_err();
    match err {
        RillError::Runtime { kind, message, line } => {
            assert_eq!(kind, RuntimeErrorKind::Arity);
            assert!(message.contains("'two'"));
            assert_eq!(line, Some(2));
        }
        other => panic!("expected ArityError, got {:?}", other),
    }
}

#[test]
fn test_division_by_zero_is_arith_error() {
    let err = try_run("var x = 3; print(x / 0);").unwrap_err();
    assert!(matches!(
        err,
        RillError::Runtime {
            kind: RuntimeErrorKind::Arith,
            ..
        }
    ));
}

// =============================================================================
// Broader Programs
// =============================================================================

#[test]
fn test_fibonacci() {
    let source = "\
func fib(n) {
    if n < 2 { return n; }
    return fib(n - 1) + fib(n - 2);
}
print(fib(15));
";
    assert_eq!(run_program(source), "610\n");
}

#[test]
fn test_big_integer_arithmetic() {
    assert_eq!(
        run_program("print(2 ^ 100);"),
        "1267650600228229401496703205376\n"
    );
    assert_eq!(
        run_program("print(10 ^ 30 + 1);"),
        "1000000000000000000000000000001\n"
    );
}

#[test]
fn test_exact_rational_accumulation() {
    // 1/3 + 1/3 + 1/3 is exactly one.
    assert_eq!(run_program("print(1 / 3 + 1 / 3 + 1 / 3 == 1);"), "True\n");
}

#[test]
fn test_dict_literal_member_access_and_merge() {
    let source = "\
var point = dict { x = 1, y = 2 };
point.x = point.x + 10;
print(point.x);
print({ a = 1 } + { b = 2 });
print(\"y\" in point);
";
    assert_eq!(run_program(source), "11\n{a: 1, b: 2}\nTrue\n");
}

#[test]
fn test_lambdas_and_higher_order_functions() {
    let source = "\
func twice(f, x) { return f(f(x)); }
var inc = |n| n + 1;
print(twice(inc, 40));
";
    assert_eq!(run_program(source), "42\n");
}

#[test]
fn test_else_if_chain() {
    let source = "\
func classify(n) {
    if n < 0 { return \"neg\"; }
    else if n == 0 { return \"zero\"; }
    else { return \"pos\"; }
}
print(classify(0 - 5));
print(classify(0));
print(classify(5));
";
    assert_eq!(run_program(source), "\"neg\"\n\"zero\"\n\"pos\"\n");
}

#[test]
fn test_nested_loops_with_break() {
    let source = "\
var total = 0;
var i = 0;
while i < 3 {
    var j = 0;
    while true {
        if j >= 2 { break; }
        total = total + 1;
        j = j + 1;
    }
    i = i + 1;
}
print(total);
";
    assert_eq!(run_program(source), "6\n");
}

#[test]
fn test_import_and_module_functions() {
    let source = "\
import math;
print(math.gcd(12, 18));
print(math::pi > 3);
print(math.abs(0 - 7));
";
    assert_eq!(run_program(source), "6\nTrue\n7\n");
}

#[test]
fn test_isinstance_and_type() {
    let source = "\
print(isinstance(1, \"Int\"));
print(isinstance(1 / 2, \"Rational\"));
print(type([1, 2]));
";
    assert_eq!(run_program(source), "True\nTrue\n\"List\"\n");
}

#[test]
fn test_line_continuation() {
    let source = "var x = 1 + \\\n2;\nprint(x);";
    assert_eq!(run_program(source), "3\n");
}

#[test]
fn test_input_builtin_roundtrip() {
    let host = BufferHost::with_input(vec!["world".to_string()]);
    let output = host.output_handle();
    let mut vm = Vm::with_host(Box::new(host));
    let code = compile_source("var name = input(\"? \"); print(name + \"!\");", "test.rl").unwrap();
    vm.load(code).unwrap();
    assert_eq!(output.borrow().as_str(), "\"? \"\"world!\"\n");
}

#[test]
fn test_refcount_teardown() {
    // A value bound in a dropped frame keeps exactly its surviving owners.
    let element = rill_core::Value::str("tracked");
    {
        let list = rill_core::Value::list(vec![element.clone()]);
        assert_eq!(element.refcount(), 2);
        drop(list);
    }
    assert_eq!(element.refcount(), 1);
}

#[test]
fn test_repl_style_incremental_session() {
    let host = BufferHost::new();
    let output = host.output_handle();
    let mut vm = Vm::with_host(Box::new(host));

    for chunk in [
        "var total = 0;",
        "var i = 1;",
        "while i <= 4 { total = total + i; i = i + 1; }",
        "print(total);",
    ] {
        let code = compile_source(chunk, "<repl>").unwrap();
        vm.load_incremental(code).unwrap();
        assert_eq!(vm.stack_depth(), 0);
    }
    assert_eq!(output.borrow().as_str(), "10\n");
}

#[test]
fn test_module_frame_survives_failed_statement() {
    let mut vm = Vm::with_host(Box::new(BufferHost::new()));
    let code = compile_source("var x = 5;", "<repl>").unwrap();
    vm.load_incremental(code).unwrap();

    let bad = compile_source("undefined_name;", "<repl>").unwrap();
    assert!(vm.load_incremental(bad).is_err());
    vm.recover();

    let follow_up = compile_source("x + 1;", "<repl>").unwrap();
    vm.load_incremental(follow_up).unwrap();
    assert_eq!(vm.take_last_popped().unwrap().to_string(), "6");
}
