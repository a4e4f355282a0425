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
fn constructor_and_methods() {
    let script = r#"
        class Point {
            constructor(x, y) { this.x = x; this.y = y; }
            norm2() { return this.x * this.x + this.y * this.y; }
            toString() { return '(' + this.x + ', ' + this.y + ')'; }
        }
        var p = new Point(3, 4);
        [p.norm2(), String(p), p instanceof Point, typeof Point].join(' ')
    "#;
    assert_eq!(eval(script), "25 (3, 4) true function");
}

#[test]
fn methods_are_non_enumerable_and_on_the_prototype() {
    let script = r#"
        class A { m() {} }
        var a = new A();
        [Object.keys(a).length, a.hasOwnProperty('m'), A.prototype.hasOwnProperty('m'),
         Object.getOwnPropertyDescriptor(A.prototype, 'm').enumerable, A.prototype.constructor === A].join()
    "#;
    assert_eq!(eval(script), "0,false,true,false,true");
}

#[test]
fn static_members_and_accessors() {
    let script = r#"
        class Temp {
            constructor(c) { this.c = c; }
            get f() { return this.c * 9 / 5 + 32; }
            set f(v) { this.c = (v - 32) * 5 / 9; }
            static freezing() { return new Temp(0); }
        }
        var t = Temp.freezing();
        var before = t.f;
        t.f = 212;
        [before, t.c, typeof Temp.prototype.freezing].join()
    "#;
    assert_eq!(eval(script), "32,100,undefined");
}

#[test]
fn computed_method_names() {
    assert_eq!(eval("var k = 'dyn'; class C { [k + 'amic']() { return 1; } } new C().dynamic()"), "1");
}

#[test]
fn inheritance_and_super() {
    let script = r#"
        class Animal {
            constructor(name) { this.name = name; }
            speak() { return this.name + ' makes a sound'; }
            static create(name) { return new this(name); }
        }
        class Dog extends Animal {
            constructor(name) { super(name); this.kind = 'dog'; }
            speak() { return super.speak() + ' (woof)'; }
        }
        var d = Dog.create('Rex');
        [d.speak(), d instanceof Dog, d instanceof Animal, Object.getPrototypeOf(Dog) === Animal, d.kind].join('|')
    "#;
    assert_eq!(eval(script), "Rex makes a sound (woof)|true|true|true|dog");
}

#[test]
fn implicit_derived_constructor_forwards_arguments() {
    assert_eq!(eval("class A { constructor(a, b) { this.s = a + b; } } class B extends A {} new B(1, 2).s"), "3");
}

#[test]
fn extending_builtins() {
    let script = r#"
        class ValidationError extends Error {
            constructor(message) { super(message); this.name = 'ValidationError'; }
        }
        var e = new ValidationError('bad');
        [e instanceof Error, e.message, String(e)].join('|')
    "#;
    assert_eq!(eval(script), "true|bad|ValidationError: bad");
}

#[test]
fn extends_null_and_expressions() {
    assert_eq!(eval("function base() { return class { who() { return 'base'; } }; } class C extends base() {} new C().who()"), "base");
    assert_eq!(eval("class N extends null {} Object.getPrototypeOf(N.prototype) === null"), "true");
}

#[test]
fn class_expressions_have_inner_names() {
    assert_eq!(eval("var K = class Inner { who() { return Inner.name; } }; new K().who() + ',' + typeof Inner"), "Inner,undefined");
    assert_eq!(eval("var Anon = class {}; Anon.name"), "Anon");
}

#[test]
fn class_errors() {
    let err = evaluate_script("class A {} A()", None::<&str>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { message } if message.contains("without 'new'")));

    let err = evaluate_script("class B extends Object { constructor() { this.x = 1; } } new B()", None::<&str>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::ReferenceError { message } if message.contains("super constructor")));

    let err = evaluate_script("class C extends 5 {}", None::<&str>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::TypeError { .. }));

    let err = evaluate_script("new C(); class C {}", None::<&str>).unwrap_err();
    assert!(matches!(err.kind(), JSErrorKind::ReferenceError { .. }));
}

#[test]
fn class_bodies_are_strict() {
    assert_eq!(eval("class S { m() { return this; } } String(S.prototype.m.call(undefined))"), "undefined");
}
