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
fn member_access_short_circuits() {
    assert_eq!(eval("var o = { a: { b: 1 } }; o?.a?.b"), "1");
    assert_eq!(eval("var o = null; String(o?.a.b.c)"), "undefined");
    assert_eq!(eval("var o = { a: null }; String(o.a?.b)"), "undefined");
    assert_eq!(eval("var o = { list: [10, 20] }; o.list?.[1]"), "20");
}

#[test]
fn optional_calls() {
    assert_eq!(eval("var o = { f() { return this === o; } }; o.f?.()"), "true");
    assert_eq!(eval("var o = {}; String(o.missing?.())"), "undefined");
    assert_eq!(eval("var f = null; var n = 0; f?.(n++); n"), "0");
}

#[test]
fn optional_chains_still_throw_on_non_callables() {
    let err = evaluate_script("var o = { f: 1 }; o.f?.()", None::<&str>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
    let err = evaluate_script("var o = {}; o.a?.b.c; o.x.y", None::<&str>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
}

#[test]
fn nullish_coalescing() {
    assert_eq!(eval("[null ?? 'a', undefined ?? 'b', 0 ?? 'c', '' ?? 'd', false ?? 'e'].join()"), "a,b,0,,false");
    assert_eq!(eval("var n = 0; var r = 'set' ?? n++; n"), "0");
    assert_eq!(eval("(null || undefined) ?? 'parenthesized'"), "parenthesized");
}

#[test]
fn logical_assignment() {
    assert_eq!(eval("var a = null; a ??= 5; a"), "5");
    assert_eq!(eval("var b = 0; b ||= 7; b"), "7");
    assert_eq!(eval("var c = 1; c &&= 9; c"), "9");
    assert_eq!(eval("var calls = 0; var o = { get v() { calls++; return 1; }, set v(x) { calls += 10; } }; o.v ||= 2; calls"), "1");
    assert_eq!(eval("var o = { n: null }; o.n ??= 'filled'; o['n']"), "filled");
}

#[test]
fn compound_assignment_operators() {
    assert_eq!(
        eval("var x = 10; var out = []; x += 5; out.push(x); x -= 3; out.push(x); x *= 2; out.push(x); x /= 4; out.push(x); x %= 4; out.push(x); x **= 3; out.push(x); out.join()"),
        "15,12,24,6,2,8"
    );
    assert_eq!(eval("var y = 5; y <<= 2; y >>= 1; y >>>= 1; y |= 8; y &= 12; y ^= 1; y"), "13");
    assert_eq!(eval("var o = { k: 'a' }; o.k += 'b'; o['k'] += 'c'; o.k"), "abc");
}
