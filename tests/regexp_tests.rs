use ecmascript::{JSErrorKind, evaluate_script};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[test]
fn literal_properties() {
    assert_eq!(eval("var r = /a+b/gi; [r.source, r.flags, r.global, r.ignoreCase, r.multiline, r.lastIndex].join()"), "a+b,gi,true,true,false,0");
    assert_eq!(eval("String(/x\\/y/m)"), "/x\\/y/m");
}

#[test]
fn test_and_exec() {
    assert_eq!(eval("/^\\d{3}-\\d{4}$/.test('555-1234')"), "true");
    assert_eq!(eval("var m = /(\\d+)-(\\d+)/.exec('tel 555-1234'); [m[0], m[1], m[2], m.index, m.input].join('|')"), "555-1234|555|1234|4|tel 555-1234");
    assert_eq!(eval("/z/.exec('abc')"), "null");
}

#[test]
fn global_exec_advances_last_index() {
    let script = r#"
        var re = /o/g, s = 'foo boo', hits = [];
        var m;
        while ((m = re.exec(s)) !== null) hits.push(m.index + '@' + re.lastIndex);
        hits.join() + '|' + re.lastIndex
    "#;
    assert_eq!(eval(script), "1@2,2@3,5@6,6@7|0");
}

#[test]
fn sticky_matches_only_at_last_index() {
    assert_eq!(eval("var r = /a/y; r.lastIndex = 1; [r.test('ba'), r.lastIndex, r.test('ba')].join()"), "true,2,false");
}

#[test]
fn case_insensitive_and_multiline() {
    assert_eq!(eval("/HELLO/i.test('say hello')"), "true");
    assert_eq!(eval("'a\\nb\\nc'.match(/^\\w$/gm).join()"), "a,b,c");
}

#[test]
fn named_groups() {
    assert_eq!(eval("var m = /(?<y>\\d{4})-(?<m>\\d{2})/.exec('2024-05'); m.groups.y + '/' + m.groups.m"), "2024/05");
    assert_eq!(eval("'2024-05'.replace(/(?<y>\\d+)-(?<m>\\d+)/, '$<m>.$<y>')"), "05.2024");
}

#[test]
fn unmatched_groups_are_undefined() {
    assert_eq!(eval("var m = /(a)|(b)/.exec('b'); [m[1] === undefined, m[2]].join()"), "true,b");
}

#[test]
fn constructor_forms() {
    assert_eq!(eval("var r = new RegExp('a.c', 'g'); [r.test('abc'), r.source, r.flags].join()"), "true,a.c,g");
    assert_eq!(eval("var r = /x/g; var c = new RegExp(r); [c !== r, c.flags].join()"), "true,g");
    assert_eq!(eval("var r = /x/; RegExp(r) === r"), "true");
    assert_eq!(eval("new RegExp('').source"), "(?:)");
}

#[test]
fn invalid_patterns_are_syntax_errors() {
    assert_eq!(eval("try { new RegExp('('); } catch (e) { e instanceof SyntaxError }"), "true");
    assert_eq!(eval("try { new RegExp('a', 'gg'); } catch (e) { e instanceof SyntaxError }"), "true");
    let err = evaluate_script("/a/qq", None::<&std::path::Path>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::SyntaxError { .. }), "{err:?}");
}

#[test]
fn regex_literal_versus_division() {
    assert_eq!(eval("var a = 10, g = 2; a / g / 1"), "5");
    assert_eq!(eval("var x = 4; x /2/ 1"), "2");
    assert_eq!(eval("[/=/.test('a=b'), (1) / 2].join()"), "true,0.5");
}

#[test]
fn unicode_flag() {
    assert_eq!(eval("/^.$/u.test('😀')"), "true");
    assert_eq!(eval("/^.$/.test('😀')"), "false");
}
