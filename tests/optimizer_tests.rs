use ecmascript::{Engine, EngineOptions, HostValue};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn engine(optimize: bool) -> Engine {
    Engine::with_options(EngineOptions { optimize, ..EngineOptions::default() }).unwrap()
}

/// Instruction names of the top-level code, without operands or notes.
fn ops(listing: &str) -> Vec<String> {
    listing
        .lines()
        .skip(1)
        .take_while(|l| !l.trim_start().starts_with("=="))
        .filter_map(|l| l.split_whitespace().nth(1))
        .map(|op| op.split('(').next().unwrap_or(op).to_string())
        .collect()
}

fn same_result(script: &str) {
    let folded = engine(true).evaluate(script);
    let plain = engine(false).evaluate(script);
    match (folded, plain) {
        (Ok(a), Ok(b)) => match (&a, &b) {
            (HostValue::Number(x), HostValue::Number(y)) if x.is_nan() && y.is_nan() => {}
            _ => assert_eq!(a, b, "{script}"),
        },
        (Err(a), Err(b)) => assert_eq!(a.name(), b.name(), "{script}"),
        (a, b) => panic!("{script}: optimized {a:?} vs unoptimized {b:?}"),
    }
}

#[test]
fn folding_never_changes_results() {
    for script in [
        "1 + 2 * 3 - 4 / 2",
        "2 ** -1",
        "0.1 + 0.2",
        "'1' + 2 + 3",
        "1 + 2 + '3'",
        "'5' * '2'",
        "1 / 0",
        "-0 === 0",
        "1 / -0",
        "0 / 0",
        "'abc' < 'abd'",
        "null + 1",
        "undefined + 1",
        "true + true",
        "~5 | 3 ^ 1 & 7",
        "-1 >>> 28",
        "1 << 40",
        "typeof null",
        "typeof 'x' + typeof 1",
        "!'' && !0",
        "null ?? 'd'",
        "0 || '' || 'last'",
        "'' ? 1 : 2",
        "void 0",
        "'10' == 10",
        "NaN == NaN",
        "1e21 + ''",
        "(1, 2, 3)",
        "if (0) { 'dead'; } else { 'live'; }",
        "function f() { return 1; 'unreachable'; } f()",
        "function g() { return h(); function h() { return 'hoisted'; } } g()",
        "for (var i = 0; i < 3; i++) { if (i == 1) continue; 'after'; } i",
        "var x = 2; x * (3 + 4)",
    ] {
        same_result(script);
    }
}

#[test]
fn runtime_errors_survive_folding() {
    same_result("null.x");
    same_result("undefinedName + (1 + 1)");
    same_result("if (1) { throw new TypeError('kept'); }");
}

#[test]
fn literal_arithmetic_is_folded() {
    let listing = engine(true).disassemble("2 + 3 * 4").unwrap();
    let names = ops(&listing);
    assert!(!names.iter().any(|o| o == "Add" || o == "Mul"), "{listing}");
    assert!(listing.contains("Number(14.0)"), "{listing}");

    let listing = engine(false).disassemble("2 + 3 * 4").unwrap();
    let names = ops(&listing);
    assert!(names.iter().any(|o| o == "Add") && names.iter().any(|o| o == "Mul"), "{listing}");
}

#[test]
fn string_concatenation_is_folded() {
    let listing = engine(true).disassemble("'ab' + 'cd' + 1").unwrap();
    assert!(listing.contains("\"abcd1\""), "{listing}");
}

#[test]
fn dead_branches_disappear() {
    let listing = engine(true).disassemble("if (false) { 'never-emitted'; } else { 'kept'; }").unwrap();
    assert!(!listing.contains("never-emitted"), "{listing}");
    assert!(listing.contains("\"kept\""), "{listing}");
}

#[test]
fn expressions_with_variables_are_not_folded() {
    let listing = engine(true).disassemble("var a = 1; a + 2").unwrap();
    assert!(ops(&listing).iter().any(|o| o == "Add"), "{listing}");
}

#[test]
fn function_bodies_are_optimized_too() {
    let listing = engine(true).disassemble("function f() { return 6 * 7; }").unwrap();
    assert!(listing.contains("Number(42.0)"), "{listing}");
}
