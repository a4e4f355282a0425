use ecmascript::{JSErrorKind, evaluate_script};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    match evaluate_script(script, None::<&str>) {
        Ok(v) => v,
        Err(e) => panic!("{script:?} failed: {}", e.user_message()),
    }
}

fn eval_err(script: &str) -> JSErrorKind {
    match evaluate_script(script, None::<&str>) {
        Ok(v) => panic!("{script:?} should fail, got {v}"),
        Err(e) => match e.kind() {
            JSErrorKind::SyntaxError { message } => JSErrorKind::SyntaxError { message: message.clone() },
            JSErrorKind::ReferenceError { message } => JSErrorKind::ReferenceError { message: message.clone() },
            JSErrorKind::TypeError { message } => JSErrorKind::TypeError { message: message.clone() },
            other => panic!("unexpected error kind {other:?}"),
        },
    }
}

#[test]
fn var_hoists_to_function_scope() {
    assert_eq!(eval("function f() { x = 5; if (false) { var x; } return x; } f() + ',' + typeof x"), "5,undefined");
    assert_eq!(eval("function f() { return typeof g; function g() {} } f()"), "function");
    assert_eq!(eval("var r = typeof later; var later = 1; r"), "undefined");
}

#[test]
fn temporal_dead_zone() {
    assert!(matches!(
        eval_err("{ x; let x = 1; }"),
        JSErrorKind::ReferenceError { message } if message == "Cannot access 'x' before initialization"
    ));
    assert!(matches!(eval_err("let y = y + 1;"), JSErrorKind::ReferenceError { .. }));
    assert!(matches!(eval_err("function f() { return z; } f(); const z = 1;"), JSErrorKind::ReferenceError { .. }));
    assert!(matches!(eval_err("{ typeof t; let t; }"), JSErrorKind::ReferenceError { .. }));
    assert_eq!(eval("function f() { return z; } const z = 1; f()"), "1");
}

#[test]
fn const_assignment_is_a_type_error() {
    assert!(matches!(eval_err("const c = 1; c = 2;"), JSErrorKind::TypeError { .. }));
    assert!(matches!(eval_err("function f() { const c = 1; c++; } f()"), JSErrorKind::TypeError { .. }));
    assert_eq!(eval("const o = { a: 1 }; o.a = 2; o.a"), "2");
}

#[test]
fn block_scoping_and_shadowing() {
    assert_eq!(eval("let a = 1; { let a = 2; { let a = 3; } } a"), "1");
    assert_eq!(eval("var out = []; let s = 'outer'; { let s = 'inner'; out.push(s); } out.push(s); out.join()"), "inner,outer");
    assert_eq!(eval("function f(x) { { let x = 2; } return x; } f(1)"), "1");
    assert_eq!(eval("var e = 'outer'; try { throw 'inner'; } catch (e) { e; } e"), "outer");
}

#[test]
fn closures_capture_bindings_not_values() {
    assert_eq!(eval("function counter() { var n = 0; return function () { return ++n; }; } var c = counter(); c(); c(); c()"), "3");
    assert_eq!(
        eval("var fs = []; for (let i = 0; i < 3; i++) fs.push(function () { return i; }); fs.map(function (f) { return f(); }).join()"),
        "0,1,2"
    );
    assert_eq!(
        eval("var fs = []; for (var i = 0; i < 3; i++) fs.push(function () { return i; }); fs.map(function (f) { return f(); }).join()"),
        "3,3,3"
    );
    assert_eq!(
        eval("var fs = []; for (let k in { a: 1, b: 2 }) fs.push(() => k); fs.map(f => f()).join()"),
        "a,b"
    );
    assert_eq!(eval("function outer() { var v = 1; function inner() { return v; } v = 2; return inner(); } outer()"), "2");
}

#[test]
fn deeply_nested_closures() {
    assert_eq!(eval("function a(x) { return function (y) { return function (z) { return x + y + z; }; }; } a(1)(2)(3)"), "6");
}

#[test]
fn named_function_expression_binds_itself() {
    assert_eq!(eval("var f = function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); }; f(5)"), "120");
    assert_eq!(eval("var g = function h() { h = 1; return typeof h; }; g()"), "function");
    assert_eq!(eval("var g = function h() {}; typeof h"), "undefined");
}

#[test]
fn sloppy_block_functions_are_visible_after_the_block() {
    assert_eq!(eval("{ function blockFn() { return 'b'; } } blockFn()"), "b");
    assert_eq!(eval("function f() { if (true) { function g() { return 1; } } return g(); } f()"), "1");
}

#[test]
fn arguments_object() {
    assert_eq!(eval("function f(a) { arguments[0] = 9; return a; } f(1)"), "9");
    assert_eq!(eval("function f(a) { 'use strict'; arguments[0] = 9; return a; } f(1)"), "1");
    assert_eq!(eval("function f() { return arguments.length; } f(1, 2, 3)"), "3");
    assert_eq!(eval("var f = () => typeof arguments; function g() { return (() => arguments[0])(); } g('outer')"), "outer");
}

#[test]
fn this_binding_rules() {
    assert_eq!(eval("function f() { return this === globalThis; } f()"), "true");
    assert_eq!(eval("function f() { 'use strict'; return this; } String(f())"), "undefined");
    assert_eq!(eval("var o = { v: 1, m: function () { return [1].map(() => this.v)[0]; } }; o.m()"), "1");
}

#[test]
fn undeclared_assignment_in_sloppy_and_strict_code() {
    assert_eq!(eval("function f() { leaked = 7; } f(); leaked"), "7");
    assert!(matches!(eval_err("'use strict'; function f() { leaked2 = 7; } f();"), JSErrorKind::ReferenceError { .. }));
    assert!(matches!(eval_err("missing + 1"), JSErrorKind::ReferenceError { message } if message == "missing is not defined"));
    assert_eq!(eval("typeof missing"), "undefined");
}

#[test]
fn with_statement_consults_the_object_first() {
    assert_eq!(eval("var o = { a: 1 }; var a = 'global'; with (o) { a; }"), "1");
    assert_eq!(eval("var o = { a: 1 }; var b = 2; var r; with (o) { r = a + b; } r"), "3");
    assert_eq!(eval("var o = { a: 1 }; with (o) { a = 5; } o.a"), "5");
    assert_eq!(eval("var o = {}; var z = 1; with (o) { z = 2; } [z, 'z' in o].join()"), "2,false");
    assert_eq!(eval("function f(o) { var local = 'l'; with (o) { return local + x; } } f({ x: 'x' })"), "lx");
}

#[test]
fn delete_inside_with_targets_the_object() {
    assert_eq!(eval("var o = { a: 1 }; var r; with (o) { r = delete a; } [r, 'a' in o].join()"), "true,false");
    assert_eq!(eval("var o = {}; g = 1; with (o) { delete g; } typeof g"), "undefined");
    assert_eq!(eval("var o = {}; var v = 1; var r; with (o) { r = delete v; } [r, v].join()"), "false,1");
}

#[test]
fn with_sees_properties_added_later() {
    assert_eq!(eval("var o = {}; var p = 'outer'; function read() { with (o) { return p; } } var first = read(); o.p = 'inner'; first + ',' + read()"), "outer,inner");
}

#[test]
fn indirect_eval_uses_global_scope() {
    assert_eq!(eval("var v = 'global'; function f() { var v = 'local'; return eval('v'); } f()"), "global");
    assert_eq!(eval("eval('var declared = 3; function viaEval() { return declared; }'); viaEval()"), "3");
    assert!(matches!(eval_err("eval('let a = ;')"), JSErrorKind::SyntaxError { .. }));
}

#[test]
fn lexical_declarations_in_switch_share_one_scope() {
    assert_eq!(eval("var r; switch (0) { case 0: let x = 'zero'; case 1: x = x + '!'; r = x; } r"), "zero!");
    assert!(matches!(eval_err("switch (1) { case 0: let x = 'zero'; case 1: x = 'one'; }"), JSErrorKind::ReferenceError { .. }));
}
