use ecmascript::evaluate_script;

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[test]
fn escapes_in_literals() {
    assert_eq!(eval(r#""a\tb".length"#), "3");
    assert_eq!(eval(r#""A\x42\u{43}""#), "ABC");
    assert_eq!(eval(r#"'it\'s'"#), "it's");
    assert_eq!(eval("'line1\\\nline2'"), "line1line2");
}

#[test]
fn utf16_code_units() {
    assert_eq!(eval("'😀'.length"), "2");
    assert_eq!(eval("'😀'.charCodeAt(0).toString(16) + ' ' + '😀'.codePointAt(0).toString(16)"), "d83d 1f600");
    assert_eq!(eval("String.fromCharCode(72, 105)"), "Hi");
}

#[test]
fn character_access() {
    assert_eq!(eval("var s = 'hello'; [s[1], s.charAt(4), s.charAt(9), s[9]].join('|')"), "e|o||");
}

#[test]
fn searching() {
    assert_eq!(eval("var s = 'abcabc'; [s.indexOf('c'), s.lastIndexOf('c'), s.indexOf('c', 3), s.indexOf('z'), s.includes('ca'), s.startsWith('ab'), s.endsWith('bc')].join()"), "2,5,5,-1,true,true,true");
}

#[test]
fn slicing() {
    assert_eq!(eval("var s = 'JavaScript'; [s.slice(4), s.slice(-6, -3), s.substring(4, 0), s.substr(1, 3)].join('|')"), "Script|Scr|Java|ava");
}

#[test]
fn case_and_trim() {
    assert_eq!(eval("'  MiXed  '.trim().toLowerCase() + '|' + 'straße'.toUpperCase()"), "mixed|STRASSE");
    assert_eq!(eval("'\\t x \\n'.trimStart().length + ',' + '\\t x \\n'.trimEnd().length"), "3,3");
}

#[test]
fn padding_and_repeat() {
    assert_eq!(eval("['5'.padStart(3, '0'), 'ab'.padEnd(5, 'xy'), 'ab'.repeat(3)].join()"), "005,abxyx,ababab");
    assert_eq!(eval("try { 'a'.repeat(-1); } catch (e) { e instanceof RangeError }"), "true");
}

#[test]
fn split_variants() {
    assert_eq!(eval("'a,b,,c'.split(',').length"), "4");
    assert_eq!(eval("'abc'.split('').join('|')"), "a|b|c");
    assert_eq!(eval("'a1b22c'.split(/\\d+/).join()"), "a,b,c");
    assert_eq!(eval("'a,b,c'.split(',', 2).join()"), "a,b");
    assert_eq!(eval("'abc'.split().length"), "1");
}

#[test]
fn replace_with_patterns_and_functions() {
    assert_eq!(eval("'aaa'.replace('a', 'b')"), "baa");
    assert_eq!(eval("'aaa'.replace(/a/g, 'b')"), "bbb");
    assert_eq!(eval("'John Smith'.replace(/(\\w+)\\s(\\w+)/, '$2, $1')"), "Smith, John");
    assert_eq!(eval("'x-y'.replace('-', '[$&$$]')"), "x[-$]y");
    assert_eq!(eval("'a1b2'.replace(/\\d/g, function (d) { return d * 2; })"), "a2b4");
}

#[test]
fn match_and_search() {
    assert_eq!(eval("'a1b22'.match(/\\d+/g).join()"), "1,22");
    assert_eq!(eval("var m = 'key=val'.match(/(\\w+)=(\\w+)/); [m[0], m[1], m[2], m.index].join()"), "key=val,key,val,0");
    assert_eq!(eval("'abc'.match(/z/)"), "null");
    assert_eq!(eval("'hello'.search(/l+/)"), "2");
}

#[test]
fn concatenation_and_comparison() {
    assert_eq!(eval("'a'.concat(1, null)"), "a1null");
    assert_eq!(eval("['b'.localeCompare('a'), 'a'.localeCompare('a'), 'a'.localeCompare('b')].join()"), "1,0,-1");
}

#[test]
fn normalize_forms() {
    assert_eq!(eval("'\\u0065\\u0301'.normalize('NFC').length"), "1");
    assert_eq!(eval("'\\u00e9'.normalize('NFD').length"), "2");
    assert_eq!(eval("try { 'a'.normalize('bogus'); } catch (e) { e instanceof RangeError }"), "true");
}

#[test]
fn string_conversion() {
    assert_eq!(eval("[String(null), String(undefined), String(123), String(true), String([1, [2, 3]]), String({})].join('|')"), "null|undefined|123|true|1,2,3|[object Object]");
}
