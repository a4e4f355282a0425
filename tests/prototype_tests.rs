use ecmascript::{JSErrorKind, evaluate_script};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[test]
fn set_prototype_of_changes_lookup() {
    let script = r#"
        var proto = { greet: function () { return 'hi ' + this.name; } };
        var o = { name: 'o' };
        Object.setPrototypeOf(o, proto);
        [o.greet(), Object.getPrototypeOf(o) === proto, proto.isPrototypeOf(o)].join()
    "#;
    assert_eq!(eval(script), "hi o,true,true");
}

#[test]
fn prototype_chain_resolution_prefers_own_properties() {
    let script = r#"
        var a = { x: 'a', y: 'a' };
        var b = Object.create(a); b.y = 'b';
        var c = Object.create(b);
        [c.x, c.y, c.hasOwnProperty('y'), b.hasOwnProperty('y')].join()
    "#;
    assert_eq!(eval(script), "a,b,false,true");
}

#[test]
fn prototype_cycles_are_rejected() {
    assert_eq!(eval("var a = {}, b = Object.create(a); try { Object.setPrototypeOf(a, b); 'no' } catch (e) { e instanceof TypeError }"), "true");
}

#[test]
fn object_create_null_has_no_prototype() {
    assert_eq!(eval("var o = Object.create(null); [Object.getPrototypeOf(o), 'toString' in o].join()"), ",false");
}

#[test]
fn define_property_attributes() {
    let script = r#"
        'use strict';
        var o = {};
        Object.defineProperty(o, 'x', { value: 1 });
        var d = Object.getOwnPropertyDescriptor(o, 'x');
        var threw = false;
        try { o.x = 2; } catch (e) { threw = e instanceof TypeError; }
        [d.writable, d.enumerable, d.configurable, o.x, threw, Object.keys(o).length].join()
    "#;
    assert_eq!(eval(script), "false,false,false,1,true,0");
}

#[test]
fn non_writable_assignment_is_silent_in_sloppy_mode() {
    assert_eq!(eval("var o = {}; Object.defineProperty(o, 'x', { value: 1 }); o.x = 2; o.x"), "1");
}

#[test]
fn redefining_non_configurable_property_throws() {
    assert_eq!(eval("var o = {}; Object.defineProperty(o, 'x', { value: 1 }); try { Object.defineProperty(o, 'x', { value: 2 }); } catch (e) { e instanceof TypeError }"), "true");
}

#[test]
fn accessors_in_literals_and_define_property() {
    let script = r#"
        var o = { _v: 1, get v() { return this._v * 10; }, set v(x) { this._v = x; } };
        o.v = 5;
        var p = {};
        Object.defineProperty(p, 'now', { get: function () { return 'got'; }, enumerable: true });
        [o.v, p.now, Object.keys(p).join()].join()
    "#;
    assert_eq!(eval(script), "50,got,now");
}

#[test]
fn inherited_setter_is_invoked() {
    assert_eq!(eval("var log = []; var proto = { set x(v) { log.push(v); } }; var o = Object.create(proto); o.x = 3; [log.join(), o.hasOwnProperty('x')].join()"), "3,false");
}

#[test]
fn freeze_and_seal() {
    let script = r#"
        var f = Object.freeze({ a: 1 });
        f.a = 2; f.b = 3; delete f.a;
        var s = Object.seal({ a: 1 });
        s.a = 2; s.b = 3; delete s.a;
        [f.a, f.b, Object.isFrozen(f), s.a, s.b, Object.isSealed(s), Object.isExtensible(s)].join()
    "#;
    assert_eq!(eval(script), "1,,true,2,,true,false");
}

#[test]
fn keys_values_entries_assign() {
    assert_eq!(eval("var o = { b: 1, a: 2 }; Object.keys(o).join() + '|' + Object.values(o).join()"), "b,a|1,2");
    assert_eq!(eval("Object.entries({ x: 1, y: 2 }).map(function (e) { return e.join('='); }).join('&')"), "x=1&y=2");
    assert_eq!(eval("var t = Object.assign({ a: 1 }, { b: 2 }, null, { a: 3 }); [t.a, t.b].join()"), "3,2");
    assert_eq!(eval("Object.getOwnPropertyNames([1, 2]).join()"), "0,1,length");
}

#[test]
fn object_to_string_tags() {
    let script = "var t = Object.prototype.toString; [t.call([]), t.call(null), t.call(undefined), t.call(1), t.call(new Date(0)), t.call(/x/)].join()";
    assert_eq!(eval(script), "[object Array],[object Null],[object Undefined],[object Number],[object Date],[object RegExp]");
}

#[test]
fn computed_and_shorthand_properties() {
    assert_eq!(eval("var k = 'dyn', v = 4; var o = { [k + 1]: 1, v, m() { return this.v; } }; [o.dyn1, o.v, o.m()].join()"), "1,4,4");
}

#[test]
fn object_spread_and_destructuring() {
    assert_eq!(eval("var { a, b: { c = 5 } = {}, ...rest } = { a: 1, x: 2, y: 3 }; [a, c, Object.keys(rest).join('')].join()"), "1,5,xy");
    assert_eq!(eval("var [x, , y = 9, ...zs] = [1, 2, undefined, 4, 5]; [x, y, zs.join('')].join()"), "1,9,45");
}

#[test]
fn classes_with_inheritance() {
    let script = r#"
        class Animal {
            constructor(name) { this.name = name; }
            speak() { return this.name + ' makes a sound'; }
            get upper() { return this.name.toUpperCase(); }
            static create(n) { return new this(n); }
        }
        class Dog extends Animal {
            speak() { return super.speak() + ' (woof)'; }
        }
        var d = Dog.create('rex');
        [d.speak(), d.upper, d instanceof Animal, Object.getPrototypeOf(Dog) === Animal].join('|')
    "#;
    assert_eq!(eval(script), "rex makes a sound (woof)|REX|true|true");
}

#[test]
fn class_constructor_requires_new() {
    let err = evaluate_script("class A {} A()", None::<&std::path::Path>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
}

#[test]
fn derived_constructor_must_call_super_before_this() {
    assert_eq!(eval("class A {} class B extends A { constructor() { this.x = 1; super(); } } try { new B(); } catch (e) { e instanceof ReferenceError }"), "true");
}

#[test]
fn new_target_reports_the_constructor() {
    assert_eq!(eval("function F() { return new.target === F; } [new F() instanceof F, F()].join()"), "true,false");
}

#[test]
fn primitive_wrappers() {
    assert_eq!(eval("var s = new String('ab'); [typeof s, s.length, s[1], s == 'ab', s === 'ab'].join()"), "object,2,b,true,false");
    assert_eq!(eval("var b = new Boolean(false); b ? 'truthy' : 'falsy'"), "truthy");
    assert_eq!(eval("'abc'.length + (5).toString().length"), "4");
}

#[test]
fn with_statement_resolves_object_properties() {
    assert_eq!(eval("var o = { a: 1 }; var a = 'outer'; var r; with (o) { r = a; a = 2; } [r, o.a, a].join()"), "1,2,outer");
}

#[test]
fn delete_respects_configurability() {
    assert_eq!(eval("var arr = [1, 2]; [delete arr.length, arr.length].join()"), "false,2");
    let err = evaluate_script("'use strict'; var o = Object.freeze({ a: 1 }); delete o.a;", None::<&std::path::Path>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));
}
