use ecmascript::{JSErrorKind, evaluate_script};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[test]
fn catch_receives_thrown_primitives() {
    assert_eq!(eval("try { throw 42; } catch (e) { e }"), "42");
    assert_eq!(eval("try { throw 'boom'; } catch (e) { e }"), "boom");
}

#[test]
fn catch_receives_runtime_errors() {
    assert_eq!(eval("try { null.x; } catch (e) { e instanceof TypeError }"), "true");
    assert_eq!(eval("try { missing; } catch (e) { e.name + ': ' + e.message }"), "ReferenceError: missing is not defined");
    assert_eq!(eval("try { new Array(-1); } catch (e) { e.constructor === RangeError }"), "true");
}

#[test]
fn finally_runs_once_on_return() {
    let script = r#"
        var log = [];
        function f() {
            try { return 'r'; } finally { log.push('f'); }
        }
        f() + log.join() + log.length
    "#;
    assert_eq!(eval(script), "rf1");
}

#[test]
fn finally_runs_once_on_throw() {
    let script = r#"
        var n = 0;
        try { try { throw new Error('x'); } finally { n++; } } catch (e) {}
        n
    "#;
    assert_eq!(eval(script), "1");
}

#[test]
fn finally_runs_on_break_and_continue() {
    let script = r#"
        var log = [];
        for (var i = 0; i < 3; i++) {
            try { if (i === 0) continue; if (i === 2) break; log.push('body' + i); }
            finally { log.push('fin' + i); }
        }
        log.join()
    "#;
    assert_eq!(eval(script), "fin0,body1,fin1,fin2");
}

#[test]
fn return_in_finally_overrides() {
    assert_eq!(eval("function f() { try { return 1; } finally { return 2; } } f()"), "2");
    assert_eq!(eval("function f() { try { throw 1; } finally { return 'swallowed'; } } f()"), "swallowed");
}

#[test]
fn nested_finally_blocks_unwind_in_order() {
    let script = r#"
        var log = [];
        function f() {
            try {
                try { return 'v'; } finally { log.push('inner'); }
            } finally { log.push('outer'); }
        }
        f() + ':' + log.join()
    "#;
    assert_eq!(eval(script), "v:inner,outer");
}

#[test]
fn rethrow_from_catch() {
    assert_eq!(eval("try { try { throw 1; } catch (e) { throw e + 1; } } catch (e) { e }"), "2");
}

#[test]
fn optional_catch_binding() {
    assert_eq!(eval("var ok = false; try { throw 1; } catch { ok = true; } ok"), "true");
}

#[test]
fn catch_parameter_is_block_scoped() {
    assert_eq!(eval("var e = 'outer'; try { throw 'inner'; } catch (e) { e; } e"), "outer");
}

#[test]
fn uncaught_error_objects_keep_kind_and_location() {
    let err = evaluate_script("var a = 1;\nthrow new TypeError('bad thing');", None::<&std::path::Path>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { message } if message == "bad thing"), "{err:?}");
    assert_eq!(err.js_line(), Some(2));
}

#[test]
fn uncaught_primitive_values() {
    let err = evaluate_script("throw 42", None::<&std::path::Path>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::Uncaught { value } if value == "42"), "{err:?}");
}

#[test]
fn uncaught_error_subclasses_keep_their_name() {
    let script = "class MyError extends Error { constructor(m) { super(m); this.name = 'MyError'; } } throw new MyError('m');";
    let err = evaluate_script(script, None::<&std::path::Path>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::Thrown { name, message } if name == "MyError" && message == "m"), "{err:?}");
    assert!(err.user_message().starts_with("MyError: m"), "{}", err.user_message());
}

#[test]
fn error_objects_carry_stack() {
    assert_eq!(eval("function f() { return new Error('x').stack; } typeof f()"), "string");
    assert_eq!(eval("try { undefinedFn(); } catch (e) { e.stack.indexOf('ReferenceError') === 0 }"), "true");
}
