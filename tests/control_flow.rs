use ecmascript::evaluate_script;

// Initialize logger for this integration test binary so `RUST_LOG` is honored.
#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[test]
fn test_if_else_chain() {
    assert_eq!(eval("let x = 2; if (x > 3) { x = 10; } else if (x > 1) { x = 20; } else { x = 30; } x"), "20");
}

#[test]
fn test_var_survives_for_loop() {
    assert_eq!(eval("function f(){ for (var i=0;i<10;i++); return i; } f()"), "10");
}

#[test]
fn test_while_and_do_while() {
    assert_eq!(eval("var n = 0; while (n < 5) n++; n"), "5");
    assert_eq!(eval("var n = 10; do { n++; } while (n < 5); n"), "11");
}

#[test]
fn test_labeled_break_and_continue() {
    let script = r#"
        var out = [];
        outer: for (var i = 0; i < 3; i++) {
            for (var j = 0; j < 3; j++) {
                if (j === 1) continue outer;
                if (i === 2) break outer;
                out.push(i + ":" + j);
            }
        }
        out.join(" ")
    "#;
    assert_eq!(eval(script), "0:0 1:0");
}

#[test]
fn test_labeled_block_break() {
    assert_eq!(eval("var r = 'a'; done: { r += 'b'; break done; r += 'c'; } r"), "ab");
}

#[test]
fn test_switch_fallthrough_and_default() {
    let script = r#"
        function classify(v) {
            var s = "";
            switch (v) {
                case 1: s += "one";
                case 2: s += "two"; break;
                default: s += "other";
                case 3: s += "three";
            }
            return s;
        }
        [classify(1), classify(2), classify(3), classify(9)].join(",")
    "#;
    assert_eq!(eval(script), "onetwo,two,three,otherthree");
}

#[test]
fn test_switch_uses_strict_equality() {
    assert_eq!(eval("var r; switch ('1') { case 1: r = 'num'; break; case '1': r = 'str'; } r"), "str");
}

#[test]
fn test_for_in_visits_enumerable_keys_in_order() {
    let script = r#"
        var o = { b: 1, a: 2, 1: 'x', 0: 'y' };
        Object.defineProperty(o, 'hidden', { value: 1, enumerable: false });
        var keys = [];
        for (var k in o) keys.push(k);
        keys.join()
    "#;
    assert_eq!(eval(script), "0,1,b,a");
}

#[test]
fn test_for_in_includes_inherited_and_skips_deleted() {
    let script = r#"
        var proto = { inherited: 1 };
        var o = Object.create(proto);
        o.own = 1; o.gone = 2;
        var keys = [];
        for (var k in o) { if (k === 'own') delete o.gone; keys.push(k); }
        keys.join()
    "#;
    assert_eq!(eval(script), "own,inherited");
}

#[test]
fn test_for_of_over_arrays_and_strings() {
    assert_eq!(eval("var s = 0; for (var v of [1, 2, 3]) s += v; s"), "6");
    assert_eq!(eval("var out = []; for (const c of 'ab') out.push(c); out.join('-')"), "a-b");
}

#[test]
fn test_let_closures_capture_each_iteration() {
    let script = r#"
        var fns = [];
        for (let i = 0; i < 3; i++) fns.push(function () { return i; });
        fns.map(function (f) { return f(); }).join()
    "#;
    assert_eq!(eval(script), "0,1,2");
}

#[test]
fn test_var_closures_share_binding() {
    let script = r#"
        var fns = [];
        for (var i = 0; i < 3; i++) fns.push(function () { return i; });
        fns.map(function (f) { return f(); }).join()
    "#;
    assert_eq!(eval(script), "3,3,3");
}

#[test]
fn test_completion_value_of_loops() {
    assert_eq!(eval("for (var i = 0; i < 3; i++) { i * 2; }"), "4");
}

#[test]
fn test_continue_in_do_while_reevaluates_condition() {
    assert_eq!(eval("var i = 0, hits = 0; do { i++; if (i % 2) continue; hits++; } while (i < 6); hits"), "3");
}
