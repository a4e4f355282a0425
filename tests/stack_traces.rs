use ecmascript::{Engine, evaluate_script};

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
fn error_stack_starts_with_the_summary() {
    assert_eq!(eval("new TypeError('bad').stack.split('\\n')[0]"), "TypeError: bad");
}

#[test]
fn stack_lists_frames_innermost_first() {
    let script = r#"
        function inner() { return new Error('x').stack; }
        function outer() { return inner(); }
        var lines = outer().split('\n');
        [lines[1].trim().indexOf('at inner'), lines[2].trim().indexOf('at outer')].join()
    "#;
    assert_eq!(eval(script), "0,0");
}

#[test]
fn errors_record_line_and_column() {
    assert_eq!(eval("var e;\ntry {\n  null.x;\n} catch (err) { e = err; }\ne.lineNumber"), "3");
}

#[test]
fn host_errors_carry_the_script_path() {
    let mut engine = Engine::new().unwrap();
    let err = engine.evaluate_with_path("function boom() {\n  throw new RangeError('deep');\n}\nboom();", "app/main.js").unwrap_err();
    assert_eq!(err.name(), "RangeError");
    assert_eq!(err.message(), "deep");
    assert_eq!(err.js_line(), Some(2));
    assert!(err.stack().first().is_some_and(|f| f.starts_with("at boom (app/main.js:2:")), "{:?}", err.stack());
    assert!(err.user_message().starts_with("RangeError: deep (at app/main.js:2:"), "{}", err.user_message());
}

#[test]
fn thrown_primitives_surface_as_uncaught_values() {
    let err = evaluate_script("throw 42", None::<&str>).unwrap_err();
    assert!(err.user_message().contains("42"), "{}", err.user_message());
}
