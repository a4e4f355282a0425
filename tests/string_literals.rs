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
fn escape_sequences() {
    assert_eq!(eval(r#""a\tb".length"#), "3");
    assert_eq!(eval(r#""\x41B\u{43}""#), "ABC");
    assert_eq!(eval(r#""\u{1F600}".length"#), "2");
    assert_eq!(eval(r#"'it\'s'"#), "it's");
    assert_eq!(eval("'line\\\ncontinued'"), "linecontinued");
}

#[test]
fn template_literals_interpolate() {
    assert_eq!(eval("var n = 3; `n=${n}, twice=${n * 2}, ${'nested ' + `${n}`}`"), "n=3, twice=6, nested 3");
    assert_eq!(eval("`a\nb`.length"), "3");
    assert_eq!(eval("var o = { toString() { return 'obj'; } }; `${o}|${null}|${[1, 2]}`"), "obj|null|1,2");
    assert_eq!(eval("`${1}${2}`"), "12");
}

#[test]
fn tagged_templates_see_cooked_and_raw_strings() {
    let script = r#"
        function tag(strings, ...values) {
            return strings.length + ':' + strings.join('|') + ':' + strings.raw.join('|') + ':' + values.join();
        }
        tag`a\n${1}b${2}`
    "#;
    assert_eq!(eval(script), "3:a\n|b|:a\\n|b|:1,2");
}

#[test]
fn template_objects_are_frozen() {
    assert_eq!(eval("function t(s) { return Object.isFrozen(s) && Object.isFrozen(s.raw); } t`x`"), "true");
}

#[test]
fn invalid_escapes_are_allowed_only_in_tagged_templates() {
    assert_eq!(eval("function t(s) { return String(s[0]) + ',' + s.raw[0]; } t`\\unicode`"), "undefined,\\unicode");
    let err = evaluate_script("`\\unicode`", None::<&str>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::SyntaxError { .. }));
}
