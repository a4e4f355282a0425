use ecmascript::{JSErrorKind, evaluate_script};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    match evaluate_script(script, None::<&std::path::Path>) {
        Ok(v) => v,
        Err(e) => panic!("{script:?} failed: {}", e.user_message()),
    }
}

#[test]
fn array_patterns() {
    assert_eq!(eval("var [a, , b = 5, ...rest] = [1, 2, undefined, 4, 6]; [a, b, rest.join('-')].join()"), "1,5,4-6");
    assert_eq!(eval("let [x, y] = 'hi'; x + y"), "hi");
    assert_eq!(eval("var [p, q] = [1]; String(q)"), "undefined");
}

#[test]
fn object_patterns() {
    assert_eq!(eval("var { a, b: { c }, d = 'def' } = { a: 1, b: { c: 2 } }; [a, c, d].join()"), "1,2,def");
    assert_eq!(eval("var key = 'k'; var { [key]: v } = { k: 'computed' }; v"), "computed");
    assert_eq!(eval("var { x, ...others } = { x: 1, y: 2, z: 3 }; Object.keys(others).join()"), "y,z");
    assert_eq!(eval("var { length } = 'four'; length"), "4");
}

#[test]
fn defaults_only_apply_to_undefined() {
    assert_eq!(eval("var { a = 1, b = 2 } = { a: null, b: undefined }; String(a) + ',' + b"), "null,2");
    assert_eq!(eval("var calls = 0; function d() { calls++; return 0; } var [m = d(), n = d()] = [1]; calls"), "1");
}

#[test]
fn assignment_patterns() {
    assert_eq!(eval("var a = 1, b = 2; [a, b] = [b, a]; a + ',' + b"), "2,1");
    assert_eq!(eval("var o = {}; ({ x: o.first, y: o['second'] } = { x: 1, y: 2 }); o.first + o.second"), "3");
    assert_eq!(eval("var r = ([m, n] = [7, 8]); Array.isArray(r) && m + n"), "15");
}

#[test]
fn parameter_patterns() {
    assert_eq!(eval("function f({ a, b = 2 }, [c] = [3]) { return a + b + c; } f({ a: 1 })"), "6");
    assert_eq!(eval("var g = ({ name }) => 'hi ' + name; g({ name: 'x' })"), "hi x");
    assert_eq!(eval("function h(a, ...more) { return more.length; } h(1, 2, 3)"), "2");
}

#[test]
fn patterns_in_loops() {
    assert_eq!(eval("var out = []; for (var [k, v] of [['a', 1], ['b', 2]]) out.push(k + v); out.join()"), "a1,b2");
    assert_eq!(eval("var s = 0; for (const { n } of [{ n: 1 }, { n: 2 }]) s += n; s"), "3");
    assert_eq!(eval("var keys = []; for (var { length } in { abc: 1, de: 2 }) keys.push(length); keys.join()"), "3,2");
}

#[test]
fn destructuring_nullish_values_throws() {
    let err = evaluate_script("var { a } = null;", None::<&str>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
    let err = evaluate_script("var [a] = undefined;", None::<&str>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
    let err = evaluate_script("var [a] = {};", None::<&str>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
}
