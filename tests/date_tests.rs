use ecmascript::evaluate_script;

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[test]
fn utc_construction_and_getters() {
    let script = r#"
        var d = new Date(Date.UTC(2020, 0, 15, 10, 30, 45, 123));
        [d.getUTCFullYear(), d.getUTCMonth(), d.getUTCDate(), d.getUTCDay(), d.getUTCHours(), d.getUTCMinutes(), d.getUTCSeconds(), d.getUTCMilliseconds()].join()
    "#;
    assert_eq!(eval(script), "2020,0,15,3,10,30,45,123");
}

#[test]
fn iso_formatting_and_parsing() {
    assert_eq!(eval("new Date(Date.UTC(2020, 0, 15, 10, 30)).toISOString()"), "2020-01-15T10:30:00.000Z");
    assert_eq!(eval("Date.parse('2020-01-15')"), "1579046400000");
    assert_eq!(eval("Date.parse('2020-01-15T10:30:00Z')"), "1579084200000");
    assert_eq!(eval("Date.parse('2020-01-15T10:30:00.000+02:00')"), "1579077000000");
    assert_eq!(eval("new Date('2020-06-01T00:00:00Z').getTime() === Date.UTC(2020, 5, 1)"), "true");
}

#[test]
fn date_only_strings_are_utc_and_date_times_are_local() {
    assert_eq!(eval("new Date('2021-03-04').getUTCHours()"), "0");
    assert_eq!(eval("var d = new Date('2021-03-04T05:06:07'); [d.getHours(), d.getMinutes(), d.getSeconds()].join()"), "5,6,7");
}

#[test]
fn local_field_constructor_round_trips() {
    let script = r#"
        var d = new Date(2019, 11, 31, 23, 59, 58);
        [d.getFullYear(), d.getMonth(), d.getDate(), d.getHours(), d.getMinutes(), d.getSeconds()].join()
    "#;
    assert_eq!(eval(script), "2019,11,31,23,59,58");
    assert_eq!(eval("new Date(99, 0).getFullYear()"), "1999");
}

#[test]
fn invalid_dates() {
    assert_eq!(eval("[new Date('garbage').getTime(), String(new Date(NaN)), isNaN(Date.parse('2020-13-01'))].join()"), "NaN,Invalid Date,true");
    assert_eq!(eval("try { new Date(NaN).toISOString(); } catch (e) { e instanceof RangeError }"), "true");
    assert_eq!(eval("new Date(8.64e15 + 1).getTime()"), "NaN");
    assert_eq!(eval("JSON.stringify(new Date(NaN))"), "null");
}

#[test]
fn setters_normalize_overflow() {
    assert_eq!(eval("var d = new Date(Date.UTC(2020, 0, 31)); d.setUTCMonth(1); d.toISOString()"), "2020-03-02T00:00:00.000Z");
    assert_eq!(eval("var d = new Date(Date.UTC(2020, 0, 1)); d.setUTCDate(0); d.toISOString()"), "2019-12-31T00:00:00.000Z");
    assert_eq!(eval("var d = new Date(0); var r = d.setUTCHours(25, 61); [r, d.toISOString()].join(' ')"), "93660000 1970-01-02T02:01:00.000Z");
    assert_eq!(eval("var d = new Date(0); d.setTime(1000); d.valueOf()"), "1000");
}

#[test]
fn utc_and_string_forms() {
    assert_eq!(eval("new Date(Date.UTC(2020, 0, 15)).toUTCString()"), "Wed, 15 Jan 2020 00:00:00 GMT");
    assert_eq!(eval("typeof Date()"), "string");
    assert_eq!(eval("var d = new Date(1e12); Date.parse(d.toString()) === 1e12"), "true");
}

#[test]
fn arithmetic_and_comparison() {
    assert_eq!(eval("new Date(5000) - new Date(2000)"), "3000");
    assert_eq!(eval("new Date(1) < new Date(2)"), "true");
    assert_eq!(eval("typeof Date.now() === 'number' && Date.now() > 1.5e12"), "true");
}

#[test]
fn copy_constructor() {
    assert_eq!(eval("var a = new Date(123456); var b = new Date(a); b.getTime() === a.getTime() && a !== b"), "true");
}
