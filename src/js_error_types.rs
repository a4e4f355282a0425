//! `Error` and its native subclasses.

use crate::core::{
    EvalError, JSObjectDataPtr, MutationContext, NativeFn, Property, PropertyKey, Realm, Value, Vm, arg, create_error_object, has_property,
};
use crate::error::JSError;
use crate::raise_type_error;

type NativeResult<'gc> = Result<Value<'gc>, EvalError<'gc>>;

pub fn initialize_error_constructors<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let base = realm.native_constructor(mc, "Error", error_constructor, 1, realm.error_prototype);
    install_prototype_fields(mc, &realm.error_prototype, "Error");
    realm.define_method(mc, &realm.error_prototype, "toString", error_to_string, 0);

    let subclasses: [(&str, NativeFn, JSObjectDataPtr<'gc>); 6] = [
        ("TypeError", type_error_constructor, realm.type_error_prototype),
        ("RangeError", range_error_constructor, realm.range_error_prototype),
        ("ReferenceError", reference_error_constructor, realm.reference_error_prototype),
        ("SyntaxError", syntax_error_constructor, realm.syntax_error_prototype),
        ("EvalError", eval_error_constructor, realm.eval_error_prototype),
        ("URIError", uri_error_constructor, realm.uri_error_prototype),
    ];
    for (name, func, proto) in subclasses {
        let ctor = realm.native_constructor(mc, name, func, 1, proto);
        ctor.borrow_mut(mc).prototype = Some(base);
        install_prototype_fields(mc, &proto, name);
    }
    Ok(())
}

fn install_prototype_fields<'gc>(mc: &MutationContext<'gc>, proto: &JSObjectDataPtr<'gc>, name: &str) {
    let mut p = proto.borrow_mut(mc);
    p.insert("name", Property::hidden(Value::from(name)));
    p.insert("message", Property::hidden(Value::from("")));
}

/// Shared body of every error constructor; callable with or without `new`.
fn construct_error<'gc>(
    vm: &mut Vm<'gc>,
    name: &str,
    args: &[Value<'gc>],
    new_target: Option<JSObjectDataPtr<'gc>>,
) -> NativeResult<'gc> {
    let default_proto = vm.realm.error_prototype_for(name);
    let proto = vm.prototype_from_constructor(new_target, default_proto)?;
    let message = match arg(args, 0) {
        Value::Undefined => None,
        v => Some(vm.to_rust_string(&v)?),
    };
    let stack = vm.stack_trace();
    let location = vm.current_location();
    let obj = create_error_object(vm.mc, vm.realm, Some(proto), name, message.as_deref(), &stack, location);
    if let Value::Object(options) = arg(args, 1)
        && has_property(&options, &PropertyKey::from("cause"))
    {
        let cause = vm.get(&options, &PropertyKey::from("cause"))?;
        obj.borrow_mut(vm.mc).insert("cause", Property::hidden(cause));
    }
    Ok(Value::Object(obj))
}

fn error_constructor<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    construct_error(vm, "Error", args, nt)
}

fn type_error_constructor<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    construct_error(vm, "TypeError", args, nt)
}

fn range_error_constructor<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    construct_error(vm, "RangeError", args, nt)
}

fn reference_error_constructor<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    construct_error(vm, "ReferenceError", args, nt)
}

fn syntax_error_constructor<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    construct_error(vm, "SyntaxError", args, nt)
}

fn eval_error_constructor<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    construct_error(vm, "EvalError", args, nt)
}

fn uri_error_constructor<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    construct_error(vm, "URIError", args, nt)
}

fn error_to_string<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let Value::Object(obj) = this else {
        return Err(raise_type_error!("Error.prototype.toString called on non-object").into());
    };
    let name = match vm.get(&obj, &PropertyKey::from("name"))? {
        Value::Undefined => "Error".to_string(),
        v => vm.to_rust_string(&v)?,
    };
    let message = match vm.get(&obj, &PropertyKey::from("message"))? {
        Value::Undefined => String::new(),
        v => vm.to_rust_string(&v)?,
    };
    let text = match (name.is_empty(), message.is_empty()) {
        (_, true) => name,
        (true, false) => message,
        (false, false) => format!("{name}: {message}"),
    };
    Ok(Value::from(text))
}

#[cfg(test)]
mod tests {
    use crate::evaluate_script;

    #[test]
    fn subclass_prototype_chain() {
        let out = evaluate_script("var e = new TypeError('bad'); [e instanceof TypeError, e instanceof Error, e.name, e.message].join()", None::<&str>).unwrap();
        assert_eq!(out, "true,true,TypeError,bad");
    }

    #[test]
    fn to_string_formats_name_and_message() {
        assert_eq!(evaluate_script("String(new RangeError('x'))", None::<&str>).unwrap(), "RangeError: x");
        assert_eq!(evaluate_script("String(new Error())", None::<&str>).unwrap(), "Error");
    }

    #[test]
    fn callable_without_new() {
        assert_eq!(evaluate_script("Error('m').message", None::<&str>).unwrap(), "m");
    }
}
