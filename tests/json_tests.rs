use ecmascript::{JSErrorKind, evaluate_script};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[test]
fn round_trip_preserves_structure() {
    let script = r#"
        var text = '{"a":[1,2.5,{"b":null}],"c":"x\\ny","d":true,"e":{}}';
        JSON.stringify(JSON.parse(text)) === text
    "#;
    assert_eq!(eval(script), "true");
}

#[test]
fn round_trip_of_script_values() {
    let script = r#"
        var v = { n: -0.5, s: "quote\" and \\ backslash", list: [1, "two", [3]], nested: { deep: { deeper: false } } };
        var back = JSON.parse(JSON.stringify(v));
        [back.n, back.s, back.list[2][0], back.nested.deep.deeper].join('|')
    "#;
    assert_eq!(eval(script), "-0.5|quote\" and \\ backslash|3|false");
}

#[test]
fn stringify_skips_unserializable_values() {
    assert_eq!(eval("JSON.stringify({ a: undefined, f: function () {}, b: 1 })"), r#"{"b":1}"#);
    assert_eq!(eval("JSON.stringify([undefined, function () {}, NaN, Infinity])"), "[null,null,null,null]");
    assert_eq!(eval("JSON.stringify(undefined) === undefined"), "true");
}

#[test]
fn stringify_indentation() {
    assert_eq!(eval("JSON.stringify({ a: [1, 2] }, null, 2)"), "{\n  \"a\": [\n    1,\n    2\n  ]\n}");
    assert_eq!(eval("JSON.stringify({ a: 1 }, null, '--')"), "{\n--\"a\": 1\n}");
    assert_eq!(eval("JSON.stringify([], null, 2) + JSON.stringify({}, null, 2)"), "[]{}");
}

#[test]
fn stringify_replacers_and_to_json() {
    assert_eq!(eval("JSON.stringify({ a: 1, b: 2, c: 3 }, ['c', 'a'])"), r#"{"c":3,"a":1}"#);
    assert_eq!(eval("JSON.stringify({ a: 1, b: 'x' }, function (k, v) { return typeof v === 'number' ? v * 10 : v; })"), r#"{"a":10,"b":"x"}"#);
    assert_eq!(eval("JSON.stringify({ when: { toJSON: function (key) { return 'at:' + key; } } })"), r#"{"when":"at:when"}"#);
    assert_eq!(eval("JSON.stringify(new Date(0))"), r#""1970-01-01T00:00:00.000Z""#);
}

#[test]
fn stringify_rejects_cycles() {
    assert_eq!(eval("var o = {}; o.self = o; try { JSON.stringify(o); } catch (e) { e instanceof TypeError }"), "true");
}

#[test]
fn stringify_escapes_strings() {
    assert_eq!(eval(r#"JSON.stringify("\u0007\t\" ")"#), "\"\\u0007\\t\\\" \"");
    assert_eq!(eval(r#"JSON.stringify("\ud800")"#), r#""\ud800""#);
}

#[test]
fn parse_reviver() {
    assert_eq!(eval("JSON.parse('{\"a\":1,\"b\":[2,3]}', function (k, v) { return typeof v === 'number' ? v + 1 : v; }).b.join()"), "3,4");
    assert_eq!(eval("var o = JSON.parse('{\"drop\":1,\"keep\":2}', function (k, v) { return k === 'drop' ? undefined : v; }); Object.keys(o).join()"), "keep");
}

#[test]
fn parse_errors_are_syntax_errors() {
    assert_eq!(eval("try { JSON.parse('{bad}'); } catch (e) { e instanceof SyntaxError }"), "true");
    let err = evaluate_script("JSON.parse('[1,]')", None::<&std::path::Path>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::SyntaxError { .. }), "{err:?}");
}

#[test]
fn parse_primitives_and_order() {
    assert_eq!(eval("[JSON.parse('1e2'), JSON.parse('\"s\"'), JSON.parse('null'), JSON.parse(' true ')].join()"), "100,s,,true");
    assert_eq!(eval("Object.keys(JSON.parse('{\"z\":1,\"a\":2,\"m\":3}')).join()"), "z,a,m");
}
