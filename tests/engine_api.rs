use ecmascript::{CompilePhase, Engine, EngineOptions, HostValue, JSErrorKind, evaluate_script, raise_type_error, read_script_file};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::Ordering;

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

#[test]
fn evaluate_returns_completion_values() {
    let mut engine = Engine::new().unwrap();
    assert_eq!(engine.evaluate("1 + 2").unwrap(), HostValue::Number(3.0));
    assert_eq!(engine.evaluate("'a' + 'b'").unwrap(), HostValue::String("ab".into()));
    assert_eq!(engine.evaluate("null").unwrap(), HostValue::Null);
    assert_eq!(engine.evaluate("var x;").unwrap(), HostValue::Undefined);
    assert_eq!(engine.evaluate("[1, 2]").unwrap(), HostValue::Object("[Array: 1,2]".into()));
    assert_eq!(engine.evaluate("(function named() {})").unwrap(), HostValue::Object("[Function: named]".into()));
    assert_eq!(engine.evaluate("({})").unwrap(), HostValue::Object("[object Object]".into()));
}

#[test]
fn state_persists_between_evaluations() {
    let mut engine = Engine::new().unwrap();
    engine.execute("var counter = 1; let lex = 10; const fixed = 'c'; function bump() { return ++counter; }").unwrap();
    assert_eq!(engine.evaluate("bump(); bump()").unwrap(), HostValue::Number(3.0));
    assert_eq!(engine.evaluate("lex + counter").unwrap(), HostValue::Number(13.0));
    let err = engine.execute("fixed = 'd'").unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
}

#[test]
fn redeclaring_lexical_bindings_across_scripts_fails() {
    let mut engine = Engine::new().unwrap();
    engine.execute("let once = 1;").unwrap();
    let err = engine.execute("let once = 2;").unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::SyntaxError { .. }), "{err:?}");
}

#[test]
fn global_values_cross_the_boundary() {
    let mut engine = Engine::new().unwrap();
    engine.set_global_value("answer", 42).unwrap();
    engine.set_global_value("greeting", "hi").unwrap();
    engine.set_global_value("flag", true).unwrap();
    engine.set_global_value("nothing", ()).unwrap();
    assert_eq!(engine.evaluate("[answer + 1, greeting, flag, typeof nothing].join()").unwrap(), HostValue::String("43,hi,true,undefined".into()));

    engine.execute("var fromScript = 'x'; let lexical = 5;").unwrap();
    assert_eq!(engine.get_global_value("fromScript").unwrap(), HostValue::String("x".into()));
    assert_eq!(engine.get_global_value("lexical").unwrap(), HostValue::Number(5.0));

    engine.set_global_value("lexical", 6).unwrap();
    assert_eq!(engine.evaluate("lexical").unwrap(), HostValue::Number(6.0));

    let err = engine.get_global_value("missing").unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::ReferenceError { .. }));
}

#[test]
fn setting_a_const_global_fails() {
    let mut engine = Engine::new().unwrap();
    engine.execute("const k = 1;").unwrap();
    assert!(engine.set_global_value("k", 2).is_err());
    assert_eq!(engine.get_global_value("k").unwrap(), HostValue::Number(1.0));
}

#[test]
fn host_functions_receive_marshalled_arguments() {
    let mut engine = Engine::new().unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    engine
        .set_global_function("record", move |args| {
            sink.borrow_mut().extend(args.iter().cloned());
            Ok(HostValue::from(args.len()))
        })
        .unwrap();
    let result = engine.evaluate("record(1, 'two', true, null, undefined, [3], { a: 1 })").unwrap();
    assert_eq!(result, HostValue::Number(7.0));
    let seen = seen.borrow();
    assert_eq!(seen[0], HostValue::Number(1.0));
    assert_eq!(seen[1], HostValue::String("two".into()));
    assert_eq!(seen[2], HostValue::Boolean(true));
    assert_eq!(seen[3], HostValue::Null);
    assert_eq!(seen[4], HostValue::Undefined);
    assert_eq!(seen[5], HostValue::Object("[Array: 3]".into()));
    assert_eq!(seen[6], HostValue::Object("[object Object]".into()));
}

#[test]
fn host_function_errors_are_catchable() {
    let mut engine = Engine::new().unwrap();
    engine.set_global_function("fail", |_| Err(raise_type_error!("host said no"))).unwrap();
    let caught = engine.evaluate("try { fail(); } catch (e) { (e instanceof TypeError) + ':' + e.message }").unwrap();
    assert_eq!(caught, HostValue::String("true:host said no".into()));
    let err = engine.execute("fail()").unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { message } if message == "host said no"));
}

#[test]
fn host_functions_look_like_functions() {
    let mut engine = Engine::new().unwrap();
    engine.set_global_function("noop", |_| Ok(HostValue::Undefined)).unwrap();
    assert_eq!(
        engine.evaluate("[typeof noop, noop.name, noop() === undefined, noop instanceof Function].join()").unwrap(),
        HostValue::String("function,noop,true,true".into())
    );
    let err = engine.execute("new noop()").unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
}

#[test]
fn call_global_function_from_the_host() {
    let mut engine = Engine::new().unwrap();
    engine.execute("function add(a, b) { return a + b; } var notFn = 1;").unwrap();
    let sum = engine.call_global_function("add", &[HostValue::from(2), HostValue::from(40)]).unwrap();
    assert_eq!(sum, HostValue::Number(42.0));
    let joined = engine.call_global_function("add", &["a".into(), "b".into()]).unwrap();
    assert_eq!(joined, HostValue::String("ab".into()));
    assert!(matches!(engine.call_global_function("notFn", &[]).unwrap_err().kind(), JSErrorKind::TypeError { .. }));
    assert!(matches!(engine.call_global_function("nope", &[]).unwrap_err().kind(), JSErrorKind::ReferenceError { .. }));
}

#[test]
fn compile_phase_hook_sees_every_stage() {
    let phases = Rc::new(RefCell::new(Vec::new()));
    let sink = phases.clone();
    let options = EngineOptions {
        on_compile_phase: Some(Rc::new(move |phase, path| {
            sink.borrow_mut().push((phase, path.map(|p| p.display().to_string())));
        })),
        ..EngineOptions::default()
    };
    let mut engine = Engine::with_options(options).unwrap();
    engine.evaluate_with_path("1", "main.js").unwrap();
    let phases = phases.borrow();
    let kinds: Vec<CompilePhase> = phases.iter().map(|(p, _)| *p).collect();
    assert_eq!(
        kinds,
        vec![CompilePhase::Parsing, CompilePhase::Resolving, CompilePhase::Optimizing, CompilePhase::CodeGeneration, CompilePhase::Execution]
    );
    assert!(phases.iter().all(|(_, p)| p.as_deref() == Some("main.js")));
}

#[test]
fn disabling_the_optimizer_skips_its_phase() {
    let phases = Rc::new(RefCell::new(Vec::new()));
    let sink = phases.clone();
    let mut engine = Engine::with_options(EngineOptions {
        optimize: false,
        on_compile_phase: Some(Rc::new(move |phase, _| sink.borrow_mut().push(phase))),
        ..EngineOptions::default()
    })
    .unwrap();
    assert_eq!(engine.evaluate("2 * 21").unwrap(), HostValue::Number(42.0));
    assert!(!phases.borrow().contains(&CompilePhase::Optimizing));
}

#[test]
fn strict_option_applies_to_every_script() {
    let mut engine = Engine::with_options(EngineOptions { strict: true, ..EngineOptions::default() }).unwrap();
    let err = engine.execute("undeclared = 1").unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::ReferenceError { .. }));
    let err = engine.execute("with ({}) {}").unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::SyntaxError { .. }));

    let mut sloppy = Engine::new().unwrap();
    sloppy.execute("undeclared = 1").unwrap();
    assert_eq!(sloppy.get_global_value("undeclared").unwrap(), HostValue::Number(1.0));
}

#[test]
fn max_call_depth_is_configurable() {
    let mut engine = Engine::with_options(EngineOptions { max_call_depth: 20, ..EngineOptions::default() }).unwrap();
    assert_eq!(engine.evaluate("function d(n) { return n ? d(n - 1) : 'ok'; } d(10)").unwrap(), HostValue::String("ok".into()));
    let err = engine.execute("d(50)").unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::RangeError { .. }), "{err:?}");
}

#[test]
fn cancellation_aborts_and_resets() {
    let mut engine = Engine::new().unwrap();
    let cancel = engine.cancellation_handle();
    let flag = cancel.clone();
    engine
        .set_global_function("requestStop", move |_| {
            flag.store(true, Ordering::Relaxed);
            Ok(HostValue::Undefined)
        })
        .unwrap();
    let err = engine.execute("var i = 0; while (true) { i++; if (i === 1000) requestStop(); }").unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::Cancelled), "{err:?}");
    assert!(!cancel.load(Ordering::Relaxed));
    assert_eq!(engine.evaluate("i >= 1000").unwrap(), HostValue::Boolean(true));
}

#[test]
fn cancellation_is_not_catchable_by_scripts() {
    let mut engine = Engine::new().unwrap();
    let flag = engine.cancellation_handle();
    engine
        .set_global_function("stop", move |_| {
            flag.store(true, Ordering::Relaxed);
            Ok(HostValue::Undefined)
        })
        .unwrap();
    let err = engine.execute("var caught = false; try { stop(); for (;;) {} } catch (e) { caught = true; }").unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::Cancelled));
    assert_eq!(engine.get_global_value("caught").unwrap(), HostValue::Boolean(false));
}

#[test]
fn errors_carry_path_and_location() {
    let mut engine = Engine::new().unwrap();
    let err = engine.evaluate_with_path("var a = 1;\nvar b = ;", "broken.js").unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::SyntaxError { .. }));
    assert_eq!(err.file(), Some("broken.js"));
    assert_eq!(err.js_line(), Some(2));
    assert!(err.user_message().contains("broken.js:2:"), "{}", err.user_message());

    let err = engine.evaluate_with_path("function f() {\n  nope();\n}\nf();", "run.js").unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::ReferenceError { .. }));
    assert_eq!(err.js_line(), Some(2));
    assert!(err.stack().iter().any(|frame| frame.contains("run.js")), "{:?}", err.stack());
}

#[test]
fn engines_are_isolated() {
    let mut a = Engine::new().unwrap();
    let mut b = Engine::new().unwrap();
    a.execute("var shared = 'a'; Array.prototype.extra = 1;").unwrap();
    assert!(b.get_global_value("shared").is_err());
    assert_eq!(b.evaluate("[].extra").unwrap(), HostValue::Undefined);
}

#[test]
fn garbage_is_collected_between_calls() {
    let mut engine = Engine::new().unwrap();
    for _ in 0..20 {
        engine.execute("var junk = []; for (var i = 0; i < 2000; i++) junk.push({ i: i, s: 'x' + i }); junk = null;").unwrap();
    }
    assert_eq!(engine.evaluate("typeof junk").unwrap(), HostValue::String("object".into()));
}

#[test]
fn evaluate_script_renders_display_strings() {
    assert_eq!(evaluate_script("'plain'", None::<&str>).unwrap(), "plain");
    assert_eq!(evaluate_script("[1, 'a', null]", None::<&str>).unwrap(), "1,a,");
    assert_eq!(evaluate_script("undefined", None::<&str>).unwrap(), "undefined");
    assert_eq!(evaluate_script("new Error('boom')", None::<&str>).unwrap(), "Error: boom");
}

#[test]
fn string_results_match_string_conversion() {
    let mut engine = Engine::new().unwrap();
    let mut render = |code: &str| engine.evaluate_to_string(code, None).unwrap();
    assert_eq!(render("[[1, 2], 3]"), "1,2,3");
    assert_eq!(render("[{}, [null, [4]]]"), "[object Object],,4");
    assert_eq!(render("var cyclic = [1]; cyclic.push(cyclic); cyclic"), "1,");
    assert_eq!(render("({ toString() { return 'custom'; } })"), "custom");
    let long = render("var big = []; for (var i = 0; i < 200; i++) big.push(i); big");
    assert_eq!(long.split(',').count(), 200);
    assert!(long.ends_with(",199"));

    let err = engine.evaluate_to_string("({ toString() { throw new TypeError('no text'); } })", None).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { message } if message == "no text"));
}

#[test]
fn host_summaries_render_whole_arrays() {
    let mut engine = Engine::new().unwrap();
    assert_eq!(engine.evaluate("[[1, 2], [3, [4]]]").unwrap(), HostValue::Object("[Array: 1,2,3,4]".into()));
    assert_eq!(engine.evaluate("var self = ['a']; self.push(self); self").unwrap(), HostValue::Object("[Array: a,]".into()));
    let HostValue::Object(summary) = engine.evaluate("var big = []; for (var i = 0; i < 150; i++) big.push(i); big").unwrap() else {
        panic!("expected an object summary");
    };
    assert!(summary.ends_with(",148,149]"));
}

#[test]
fn read_script_file_decodes_boms() {
    let dir = std::env::temp_dir();
    let utf8 = dir.join(format!("ecmascript-utf8-{}.js", std::process::id()));
    std::fs::write(&utf8, b"\xEF\xBB\xBF'\xC3\xA9t\xC3\xA9'").unwrap();
    assert_eq!(read_script_file(&utf8).unwrap(), "'été'");

    let utf16 = dir.join(format!("ecmascript-utf16-{}.js", std::process::id()));
    let mut bytes = vec![0xFF, 0xFE];
    for unit in "1 + 1".encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    std::fs::write(&utf16, bytes).unwrap();
    assert_eq!(read_script_file(&utf16).unwrap(), "1 + 1");

    let missing = read_script_file(dir.join("definitely-not-here.js")).unwrap_err();
    assert!(matches!(missing.kind(), JSErrorKind::Io(_)));

    let _ = std::fs::remove_file(utf8);
    let _ = std::fs::remove_file(utf16);
}
