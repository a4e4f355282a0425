use ecmascript::{JSErrorKind, evaluate_script};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[test]
fn function_declarations_are_hoisted() {
    assert_eq!(eval("var r = square(4); function square(x) { return x * x; } r"), "16");
}

#[test]
fn closures_keep_their_environment() {
    let script = r#"
        function counter() {
            var n = 0;
            return { inc: function () { return ++n; }, get: function () { return n; } };
        }
        var a = counter(), b = counter();
        a.inc(); a.inc(); b.inc();
        [a.get(), b.get()].join()
    "#;
    assert_eq!(eval(script), "2,1");
}

#[test]
fn recursion() {
    assert_eq!(eval("function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); } fact(10)"), "3628800");
    assert_eq!(eval("var fib = function f(n) { return n < 2 ? n : f(n - 1) + f(n - 2); }; fib(15)"), "610");
}

#[test]
fn arguments_aliases_parameters_in_sloppy_mode() {
    assert_eq!(eval("function f(a) { arguments[0] = 5; return a; } f(1)"), "5");
    assert_eq!(eval("function f(a) { a = 9; return arguments[0]; } f(1)"), "9");
}

#[test]
fn arguments_is_a_copy_in_strict_mode() {
    assert_eq!(eval("function f(a) { 'use strict'; arguments[0] = 5; return a; } f(1)"), "1");
    assert_eq!(eval("'use strict'; function f(a) { a = 9; return arguments[0]; } f(1)"), "1");
}

#[test]
fn arguments_object_shape() {
    assert_eq!(eval("function f() { return arguments.length + ':' + Array.prototype.slice.call(arguments).join('|'); } f(1, 'b', 3)"), "3:1|b|3");
    assert_eq!(eval("function f() { return Object.prototype.toString.call(arguments); } f()"), "[object Arguments]");
}

#[test]
fn unmapped_arguments_without_actual_argument() {
    assert_eq!(eval("function f(a, b) { arguments[1] = 2; return typeof b; } f(1)"), "undefined");
}

#[test]
fn this_binding_sloppy_and_strict() {
    assert_eq!(eval("function f() { return this === globalThis; } f()"), "true");
    assert_eq!(eval("function f() { 'use strict'; return this; } f()"), "undefined");
    assert_eq!(eval("var o = { m: function () { return this.v; }, v: 3 }; o.m()"), "3");
}

#[test]
fn call_apply_bind() {
    assert_eq!(eval("function f(a, b) { return this.x + a + b; } f.call({ x: 1 }, 2, 3)"), "6");
    assert_eq!(eval("function f(a, b) { return this.x + a + b; } f.apply({ x: 1 }, [2, 3])"), "6");
    assert_eq!(eval("function f(a, b) { return this.x + a + b; } var g = f.bind({ x: 1 }, 2); [g(3), g.length].join()"), "6,1");
}

#[test]
fn bound_functions_construct_with_target() {
    assert_eq!(eval("function P(x) { this.x = x; } var B = P.bind(null, 4); var p = new B(); [p.x, p instanceof P].join()"), "4,true");
}

#[test]
fn function_length_and_name() {
    assert_eq!(eval("function foo(a, b, c) {} [foo.length, foo.name].join()"), "3,foo");
    assert_eq!(eval("function f(a, b = 1, c) {} f.length"), "1");
    assert_eq!(eval("var anon = function () {}; anon.name"), "anon");
}

#[test]
fn default_and_rest_parameters() {
    assert_eq!(eval("function f(a, b = a * 2) { return a + b; } [f(1), f(1, 1)].join()"), "3,2");
    assert_eq!(eval("function f(first, ...rest) { return first + ':' + rest.length; } f(1, 2, 3)"), "1:2");
}

#[test]
fn arrow_functions_capture_this_and_arguments() {
    let script = r#"
        var o = {
            v: 10,
            m: function () { var add = (x) => this.v + x + arguments[0]; return add(1); }
        };
        o.m(100)
    "#;
    assert_eq!(eval(script), "111");
    let err = evaluate_script("var A = () => 1; new A()", None::<&std::path::Path>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
}

#[test]
fn constructors_and_new() {
    assert_eq!(eval("function P(n) { this.n = n; } P.prototype.get = function () { return this.n; }; new P(5).get()"), "5");
    assert_eq!(eval("function P() { this.a = 1; return { b: 2 }; } var p = new P(); [p.a, p.b].join()"), ",2");
    assert_eq!(eval("function P() { this.a = 1; return 7; } new P().a"), "1");
}

#[test]
fn spread_arguments() {
    assert_eq!(eval("function sum(a, b, c) { return a + b + c; } sum(...[1, 2], 3)"), "6");
    assert_eq!(eval("Math.max(...[3, 9, 2])"), "9");
}

#[test]
fn calling_non_callable_is_type_error() {
    let err = evaluate_script("var x = 1; x()", None::<&std::path::Path>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
}

#[test]
fn deep_recursion_is_a_catchable_range_error() {
    assert_eq!(eval("function r() { return r(); } try { r(); } catch (e) { e instanceof RangeError }"), "true");
}

#[test]
fn function_constructor_compiles_in_global_scope() {
    assert_eq!(eval("var add = new Function('a', 'b', 'return a + b'); add(2, 3)"), "5");
    assert_eq!(eval("var x = 'global'; function f() { var x = 'local'; return Function('return x')(); } f()"), "global");
}
