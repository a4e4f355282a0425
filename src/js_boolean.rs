use crate::core::{EvalError, JSObjectDataPtr, MutationContext, ObjectKind, Realm, Value, Vm, arg, new_js_object_with_kind};
use crate::error::JSError;
use crate::raise_type_error;

pub fn initialize_boolean<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let proto = realm.boolean_prototype;
    realm.native_constructor(mc, "Boolean", boolean_constructor, 1, proto);
    realm.define_method(mc, &proto, "toString", boolean_to_string, 0);
    realm.define_method(mc, &proto, "valueOf", boolean_value_of, 0);
    Ok(())
}

fn boolean_constructor<'gc>(
    vm: &mut Vm<'gc>,
    _this: Value<'gc>,
    args: &[Value<'gc>],
    new_target: Option<JSObjectDataPtr<'gc>>,
) -> Result<Value<'gc>, EvalError<'gc>> {
    let b = arg(args, 0).to_boolean();
    match new_target {
        None => Ok(Value::Boolean(b)),
        Some(nt) => {
            let proto = vm.prototype_from_constructor(Some(nt), vm.realm.boolean_prototype)?;
            Ok(Value::Object(new_js_object_with_kind(vm.mc, Some(proto), ObjectKind::Boolean(b))))
        }
    }
}

fn this_boolean_value(this: &Value<'_>, method: &str) -> Result<bool, JSError> {
    match this {
        Value::Boolean(b) => Ok(*b),
        Value::Object(obj) => match obj.borrow().kind {
            ObjectKind::Boolean(b) => Ok(b),
            _ => Err(raise_type_error!(format!("Boolean.prototype.{method} requires that 'this' be a Boolean"))),
        },
        _ => Err(raise_type_error!(format!("Boolean.prototype.{method} requires that 'this' be a Boolean"))),
    }
}

fn boolean_to_string<'gc>(
    _vm: &mut Vm<'gc>,
    this: Value<'gc>,
    _args: &[Value<'gc>],
    _nt: Option<JSObjectDataPtr<'gc>>,
) -> Result<Value<'gc>, EvalError<'gc>> {
    let b = this_boolean_value(&this, "toString")?;
    Ok(Value::from(if b { "true" } else { "false" }))
}

fn boolean_value_of<'gc>(
    _vm: &mut Vm<'gc>,
    this: Value<'gc>,
    _args: &[Value<'gc>],
    _nt: Option<JSObjectDataPtr<'gc>>,
) -> Result<Value<'gc>, EvalError<'gc>> {
    Ok(Value::Boolean(this_boolean_value(&this, "valueOf")?))
}
