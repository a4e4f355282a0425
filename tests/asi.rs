use ecmascript::{JSErrorKind, evaluate_script};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[test]
fn newline_terminates_statements() {
    assert_eq!(eval("var a = 1\nvar b = 2\na + b"), "3");
}

#[test]
fn return_followed_by_newline_returns_undefined() {
    assert_eq!(eval("function f() {\n  return\n  42\n}\nf()"), "undefined");
    assert_eq!(eval("function g() {\n  return 42\n}\ng()"), "42");
}

#[test]
fn postfix_increment_does_not_cross_newline() {
    assert_eq!(eval("var a = 1, b = 1\na\n++b\n[a, b].join()"), "1,2");
}

#[test]
fn parenthesis_on_next_line_continues_expression() {
    let err = evaluate_script("var x = 1\n(function () {})()", None::<&std::path::Path>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }), "{err:?}");
}

#[test]
fn closing_brace_and_eof_insert_semicolons() {
    assert_eq!(eval("function f() { return 7 } f()"), "7");
    assert_eq!(eval("var x = 3; x"), "3");
}

#[test]
fn missing_semicolon_on_same_line_is_an_error() {
    let err = evaluate_script("var a = 1 var b = 2", None::<&std::path::Path>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::SyntaxError { .. }), "{err:?}");
}

#[test]
fn throw_requires_expression_on_same_line() {
    let err = evaluate_script("throw\nnew Error('x')", None::<&std::path::Path>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::SyntaxError { .. }), "{err:?}");
}

#[test]
fn break_and_continue_labels_stop_at_newline() {
    let script = "var n = 0\nouter: for (var i = 0; i < 3; i++) { n++\nbreak\nouter }\nn";
    assert_eq!(eval(script), "1");
}

#[test]
fn for_header_semicolons_are_never_inserted() {
    let err = evaluate_script("for (var i = 0\n i < 3\n i++) {}", None::<&std::path::Path>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::SyntaxError { .. }), "{err:?}");
}
