use ecmascript::evaluate_script;

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[test]
fn numeric_strings_convert_exactly() {
    for (text, expected) in [
        ("1", "1"),
        ("16", "16"),
        ("32", "32"),
        ("1.5", "1.5"),
        ("3.141592654", "3.141592654"),
        ("1.2e-15", "1.2e-15"),
        ("0.0000000001234", "1.234e-10"),
    ] {
        assert_eq!(eval(&format!("String(Number('{text}'))")), expected, "Number('{text}')");
        assert_eq!(eval(&format!("Number('{text}') === {text}")), "true", "{text}");
    }
}

#[test]
fn string_to_number_edge_cases() {
    assert_eq!(eval("[Number(''), Number('  42  '), Number('0x1F'), Number('1e3'), Number('12px'), Number('-Infinity'), Number(null), Number(undefined)].join()"), "0,42,31,1000,NaN,-Infinity,0,NaN");
    assert_eq!(eval("[+'0b101', +'0o17', +'.5', +'5.', +true, +[], +[7], +{}].join()"), "5,15,0.5,5,1,0,7,NaN");
}

#[test]
fn number_to_string_shortest_round_trip() {
    assert_eq!(eval("[0.1 + 0.2, 1e21, 1e-7, 123456789012345680000, -0, 100, 2**53].join(' ')"), "0.30000000000000004 1e+21 1e-7 123456789012345680000 0 100 9007199254740992");
}

#[test]
fn radix_conversion() {
    assert_eq!(eval("[(255).toString(16), (255).toString(2), (-10).toString(36), (0.5).toString(2)].join()"), "ff,11111111,-a,0.1");
    assert_eq!(eval("try { (1).toString(1); } catch (e) { e instanceof RangeError }"), "true");
}

#[test]
fn fixed_exponential_precision() {
    assert_eq!(eval("[(1.005).toFixed(2), (1234.5678).toFixed(1), (0).toFixed(2), (1e21).toFixed(2)].join(' ')"), "1.00 1234.6 0.00 1e+21");
    assert_eq!(eval("[(123456).toExponential(2), (0.00015).toExponential(), (5).toExponential(0)].join(' ')"), "1.23e+5 1.5e-4 5e+0");
    assert_eq!(eval("[(123.456).toPrecision(4), (0.000123).toPrecision(2), (123456).toPrecision(2)].join(' ')"), "123.5 0.00012 1.2e+5");
}

#[test]
fn parse_int_and_parse_float() {
    assert_eq!(eval("[parseInt('42px'), parseInt('0x10'), parseInt('10', 2), parseInt('z', 36), parseInt(''), parseInt('  -7.9')].join()"), "42,16,2,35,NaN,-7");
    assert_eq!(eval("[parseFloat('3.14abc'), parseFloat('.5'), parseFloat('-Infinityx'), parseFloat('e5')].join()"), "3.14,0.5,-Infinity,NaN");
}

#[test]
fn number_statics() {
    assert_eq!(eval("[Number.isInteger(5.0), Number.isInteger(5.5), Number.isSafeInteger(2**53), Number.isNaN('NaN'), isNaN('NaN'), Number.isFinite('1'), isFinite('1')].join()"), "true,false,false,false,true,false,true");
    assert_eq!(eval("[Number.MAX_SAFE_INTEGER, Number.EPSILON > 0, Number.MIN_VALUE > 0].join()"), "9007199254740991,true,true");
}

#[test]
fn number_literals() {
    assert_eq!(eval("[0xff, 0o17, 0b11, 1_000_000, .5e1, 017].join()"), "255,15,3,1000000,5,15");
}

#[test]
fn math_functions() {
    assert_eq!(eval("[Math.round(2.5), Math.round(-2.5), Math.floor(-1.5), Math.ceil(1.2), Math.trunc(-4.7), Math.sign(-3)].join()"), "3,-2,-2,2,-4,-1");
    assert_eq!(eval("[Math.abs(-2), Math.sqrt(16), Math.pow(2, 10), Math.hypot(3, 4), Math.cbrt(27)].join()"), "2,4,1024,5,3");
    assert_eq!(eval("Object.is(Math.round(-0.2), -0)"), "true");
}

#[test]
fn large_radix_literals_and_strings_agree() {
    assert_eq!(eval("Number('0x200000000000011') === 0x200000000000011"), "true");
    assert_eq!(eval("Number('0x200000000000011') - Math.pow(2, 57)"), "32");
    assert_eq!(eval("parseInt('200000000000011', 16) === 0x200000000000011"), "true");
}
