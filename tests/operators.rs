use ecmascript::evaluate_script;

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[test]
fn precedence_and_associativity() {
    assert_eq!(eval("2 + 3 * 4"), "14");
    assert_eq!(eval("2 ** 3 ** 2"), "512");
    assert_eq!(eval("(2 + 3) * 4"), "20");
    assert_eq!(eval("10 - 4 - 3"), "3");
    assert_eq!(eval("1 + 2 + '3'"), "33");
    assert_eq!(eval("'1' + 2 + 3"), "123");
}

#[test]
fn exponent_edge_cases() {
    assert_eq!(eval("(-2) ** 2"), "4");
    assert_eq!(eval("2 ** -1"), "0.5");
    assert_eq!(eval("1 ** NaN"), "NaN");
}

#[test]
fn unary_minus_before_exponent_is_syntax_error() {
    let err = evaluate_script("-2 ** 2", None::<&std::path::Path>).unwrap_err();
    assert!(matches!(err.kind(), ecmascript::JSErrorKind::SyntaxError { .. }), "{err:?}");
}

#[test]
fn equality_laws() {
    assert_eq!(eval("[NaN === NaN, 0 === -0, Object.is(NaN, NaN), Object.is(0, -0), Object.is('a', 'a')].join()"), "false,true,true,false,true");
    assert_eq!(eval("[null == undefined, null == 0, '' == 0, '1' == 1, true == 1, [1] == 1].join()"), "true,false,true,true,true,true");
    assert_eq!(eval("var o = {}; [o == o, o === {}, {} == '[object Object]'].join()"), "true,false,true");
}

#[test]
fn relational_comparisons() {
    assert_eq!(eval("['a' < 'b', 'B' < 'a', '10' < '9', 10 < 9, '10' < 9, NaN < 1, NaN >= 1].join()"), "true,true,true,false,false,false,false");
    assert_eq!(eval("[undefined < 1, null < 1, null >= 0].join()"), "false,true,true");
}

#[test]
fn typeof_results() {
    let script = "[typeof 1, typeof 'a', typeof true, typeof undefined, typeof null, typeof {}, typeof [], typeof function(){}, typeof notDeclared].join()";
    assert_eq!(eval(script), "number,string,boolean,undefined,object,object,object,function,undefined");
}

#[test]
fn bitwise_and_shifts() {
    assert_eq!(eval("[5 & 3, 5 | 3, 5 ^ 3, ~5, 1 << 31, -1 >> 28, -1 >>> 28, 2**32 + 5 | 0].join()"), "1,7,6,-6,-2147483648,-1,15,5");
}

#[test]
fn arithmetic_special_values() {
    assert_eq!(eval("[1 / 0, -1 / 0, 0 / 0, 5 % 3, -5 % 3, 5.5 % 2, 1 / -0].join()"), "Infinity,-Infinity,NaN,2,-2,1.5,-Infinity");
}

#[test]
fn addition_uses_to_primitive() {
    assert_eq!(eval("var o = { valueOf: function () { return 41; } }; o + 1"), "42");
    assert_eq!(eval("var o = { toString: function () { return 'x'; } }; o + 1"), "x1");
    assert_eq!(eval("[1, 2] + [3]"), "1,23");
    assert_eq!(eval("typeof (new Date(0) + 1)"), "string");
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(eval("var n = 0; function bump() { n++; return true; } false && bump(); true || bump(); null ?? bump(); n"), "1");
    assert_eq!(eval("[0 || 'a', 0 && 'a', 0 ?? 'a', undefined ?? 'b'].join()"), "a,0,0,b");
}

#[test]
fn logical_assignment() {
    assert_eq!(eval("var a = null, b = 1, c = 0; a ??= 5; b ||= 7; c &&= 9; [a, b, c].join()"), "5,1,0");
}

#[test]
fn compound_assignment_and_update() {
    assert_eq!(eval("var x = 10; x += 5; x -= 3; x *= 2; x /= 4; x %= 4; x **= 3; x"), "8");
    assert_eq!(eval("var o = { n: 1 }; var a = o.n++; var b = ++o.n; [a, b, o.n].join()"), "1,3,3");
    assert_eq!(eval("var s = '5'; s++; typeof s + s"), "number6");
}

#[test]
fn in_and_instanceof() {
    assert_eq!(eval("['a' in { a: 1 }, 'toString' in {}, 0 in [1], 1 in [1]].join()"), "true,true,true,false");
    assert_eq!(eval("function F() {} var f = new F(); [f instanceof F, f instanceof Object, [] instanceof Array, {} instanceof F].join()"), "true,true,true,false");
}

#[test]
fn in_requires_object() {
    assert_eq!(eval("try { 'a' in 'abc'; } catch (e) { e instanceof TypeError }"), "true");
}

#[test]
fn conditional_and_comma() {
    assert_eq!(eval("var x = (1, 2, 3); x > 2 ? 'big' : 'small'"), "big");
}

#[test]
fn void_and_delete() {
    assert_eq!(eval("void 0"), "undefined");
    assert_eq!(eval("var o = { a: 1 }; [delete o.a, 'a' in o, delete o.missing].join()"), "true,false,true");
}

#[test]
fn optional_chaining() {
    assert_eq!(eval("var o = { a: { b: 1 } }; [o?.a?.b, o.x?.y, o.x?.y.z, o.f?.()].join()"), "1,,,");
    assert_eq!(eval("var o = null; o?.a.b.c === undefined"), "true");
}

#[test]
fn template_literals() {
    assert_eq!(eval("var n = 3; `n=${n}, twice=${n * 2}`"), "n=3, twice=6");
    assert_eq!(eval("function tag(s, a) { return s.raw[0] + '|' + a + '|' + s[1]; } tag`x\\n${1}y`"), "x\\n|1|y");
}
