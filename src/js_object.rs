use crate::core::{
    EvalError, JSObjectDataPtr, MutationContext, ObjectKind, PropertyKey, Realm, Value, Vm, arg, from_property,
    get_own_property, new_js_object, own_property_keys, same_value, set_integrity_level, test_integrity_level, to_property_descriptor,
};
use crate::error::JSError;
use crate::raise_type_error;

type NativeResult<'gc> = Result<Value<'gc>, EvalError<'gc>>;

pub fn initialize_object_module<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let proto = realm.object_prototype;
    let ctor = realm.native_constructor(mc, "Object", object_constructor, 1, proto);
    realm.global.borrow_mut(mc).prototype = Some(proto);

    let statics: &[(&str, crate::core::NativeFn, u32)] = &[
        ("getPrototypeOf", object_get_prototype_of, 1),
        ("setPrototypeOf", object_set_prototype_of, 2),
        ("create", object_create, 2),
        ("defineProperty", object_define_property, 3),
        ("defineProperties", object_define_properties, 2),
        ("getOwnPropertyDescriptor", object_get_own_property_descriptor, 2),
        ("getOwnPropertyNames", object_get_own_property_names, 1),
        ("keys", object_keys, 1),
        ("values", object_values, 1),
        ("entries", object_entries, 1),
        ("assign", object_assign, 2),
        ("freeze", object_freeze, 1),
        ("isFrozen", object_is_frozen, 1),
        ("seal", object_seal, 1),
        ("isSealed", object_is_sealed, 1),
        ("preventExtensions", object_prevent_extensions, 1),
        ("isExtensible", object_is_extensible, 1),
        ("is", object_is, 2),
    ];
    for (name, func, length) in statics {
        realm.define_method(mc, &ctor, name, *func, *length);
    }

    realm.define_method(mc, &proto, "hasOwnProperty", object_has_own_property, 1);
    realm.define_method(mc, &proto, "isPrototypeOf", object_is_prototype_of, 1);
    realm.define_method(mc, &proto, "propertyIsEnumerable", object_property_is_enumerable, 1);
    realm.define_method(mc, &proto, "toString", object_to_string, 0);
    realm.define_method(mc, &proto, "toLocaleString", object_to_locale_string, 0);
    realm.define_method(mc, &proto, "valueOf", object_value_of, 0);
    Ok(())
}

fn require_object<'gc>(value: &Value<'gc>, method: &str) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
    match value {
        Value::Object(o) => Ok(*o),
        _ => Err(raise_type_error!(format!("Object.{method} called on non-object")).into()),
    }
}

fn object_constructor<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    // `new Object()` from a subclass constructor honours new.target.
    if let Some(nt) = nt
        && !matches!(nt.borrow().kind, ObjectKind::Native(_))
    {
        let proto = vm.prototype_from_constructor(Some(nt), vm.realm.object_prototype)?;
        return Ok(Value::Object(new_js_object(vm.mc, Some(proto))));
    }
    match arg(args, 0) {
        Value::Undefined | Value::Null => Ok(Value::Object(new_js_object(vm.mc, Some(vm.realm.object_prototype)))),
        v => Ok(Value::Object(vm.to_object(&v)?)),
    }
}

fn object_get_prototype_of<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&arg(args, 0))?;
    let proto = obj.borrow().prototype;
    Ok(proto.map(Value::Object).unwrap_or(Value::Null))
}

/// Links `obj` to `proto`, refusing cycles and non-extensible targets.
pub(crate) fn set_prototype_of<'gc>(mc: &MutationContext<'gc>, obj: &JSObjectDataPtr<'gc>, proto: Option<JSObjectDataPtr<'gc>>) -> bool {
    let current = obj.borrow().prototype;
    let unchanged = match (current, proto) {
        (Some(a), Some(b)) => gc_arena::Gc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    };
    if unchanged {
        return true;
    }
    if !obj.borrow().extensible {
        return false;
    }
    let mut p = proto;
    while let Some(o) = p {
        if gc_arena::Gc::ptr_eq(o, *obj) {
            return false;
        }
        p = o.borrow().prototype;
    }
    obj.borrow_mut(mc).prototype = proto;
    true
}

fn object_set_prototype_of<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let target = arg(args, 0);
    if target.is_null_or_undefined() {
        return Err(raise_type_error!("Object.setPrototypeOf called on null or undefined").into());
    }
    let proto = match arg(args, 1) {
        Value::Object(p) => Some(p),
        Value::Null => None,
        other => {
            return Err(raise_type_error!(format!(
                "Object prototype may only be an Object or null: {}",
                crate::core::value_to_display_string(&other)
            ))
            .into());
        }
    };
    if let Value::Object(obj) = &target
        && !set_prototype_of(vm.mc, obj, proto)
    {
        return Err(raise_type_error!("Cyclic __proto__ value or object is not extensible").into());
    }
    Ok(target)
}

fn object_create<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let proto = match arg(args, 0) {
        Value::Object(p) => Some(p),
        Value::Null => None,
        other => {
            return Err(raise_type_error!(format!(
                "Object prototype may only be an Object or null: {}",
                crate::core::value_to_display_string(&other)
            ))
            .into());
        }
    };
    let obj = new_js_object(vm.mc, proto);
    let props = arg(args, 1);
    if !props.is_undefined() {
        define_properties(vm, &obj, &props)?;
    }
    Ok(Value::Object(obj))
}

fn define_property_or_throw<'gc>(vm: &mut Vm<'gc>, obj: &JSObjectDataPtr<'gc>, key: PropertyKey, desc_value: &Value<'gc>) -> Result<(), EvalError<'gc>> {
    let desc = to_property_descriptor(vm, desc_value)?;
    let text = key.to_string();
    if !vm.define_own_property(obj, key, desc)? {
        return Err(raise_type_error!(format!("Cannot redefine property: {text}")).into());
    }
    log::debug!("defined property '{text}' via descriptor");
    Ok(())
}

fn define_properties<'gc>(vm: &mut Vm<'gc>, obj: &JSObjectDataPtr<'gc>, props: &Value<'gc>) -> Result<(), EvalError<'gc>> {
    let source = vm.to_object(props)?;
    let mut descriptors = Vec::new();
    for key in own_property_keys(&source) {
        if get_own_property(&source, &key).is_some_and(|p| p.enumerable()) {
            let desc = vm.get(&source, &key)?;
            descriptors.push((key, desc));
        }
    }
    for (key, desc) in descriptors {
        define_property_or_throw(vm, obj, key, &desc)?;
    }
    Ok(())
}

fn object_define_property<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = require_object(&arg(args, 0), "defineProperty")?;
    let key = vm.to_property_key(&arg(args, 1))?;
    define_property_or_throw(vm, &obj, key, &arg(args, 2))?;
    Ok(Value::Object(obj))
}

fn object_define_properties<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = require_object(&arg(args, 0), "defineProperties")?;
    define_properties(vm, &obj, &arg(args, 1))?;
    Ok(Value::Object(obj))
}

fn object_get_own_property_descriptor<'gc>(
    vm: &mut Vm<'gc>,
    _this: Value<'gc>,
    args: &[Value<'gc>],
    _nt: Option<JSObjectDataPtr<'gc>>,
) -> NativeResult<'gc> {
    let obj = vm.to_object(&arg(args, 0))?;
    let key = vm.to_property_key(&arg(args, 1))?;
    match get_own_property(&obj, &key) {
        Some(prop) => Ok(Value::Object(from_property(vm, &prop))),
        None => Ok(Value::Undefined),
    }
}

fn object_get_own_property_names<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&arg(args, 0))?;
    let names = own_property_keys(&obj).into_iter().map(|k| Value::String(k.to_utf16())).collect();
    Ok(Value::Object(vm.new_array(names)))
}

fn object_keys<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&arg(args, 0))?;
    let keys = own_property_keys(&obj)
        .into_iter()
        .filter(|k| get_own_property(&obj, k).is_some_and(|p| p.enumerable()))
        .map(|k| Value::String(k.to_utf16()))
        .collect();
    Ok(Value::Object(vm.new_array(keys)))
}

fn object_values<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&arg(args, 0))?;
    let values = vm.enumerable_own_entries(&obj)?.into_iter().map(|(_, v)| v).collect();
    Ok(Value::Object(vm.new_array(values)))
}

fn object_entries<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&arg(args, 0))?;
    let entries = vm
        .enumerable_own_entries(&obj)?
        .into_iter()
        .map(|(k, v)| Value::Object(vm.new_array(vec![Value::String(k.to_utf16()), v])))
        .collect();
    Ok(Value::Object(vm.new_array(entries)))
}

fn object_assign<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let target = vm.to_object(&arg(args, 0))?;
    let receiver = Value::Object(target);
    for source in args.iter().skip(1) {
        if source.is_null_or_undefined() {
            continue;
        }
        let src = vm.to_object(source)?;
        for (key, value) in vm.enumerable_own_entries(&src)? {
            let text = key.to_string();
            if !vm.set(&target, key, value, &receiver)? {
                return Err(raise_type_error!(format!("Cannot assign to read only property '{text}' of object")).into());
            }
        }
    }
    Ok(receiver)
}

fn object_freeze<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let v = arg(args, 0);
    if let Value::Object(obj) = &v {
        set_integrity_level(vm.mc, obj, true);
    }
    Ok(v)
}

fn object_seal<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let v = arg(args, 0);
    if let Value::Object(obj) = &v {
        set_integrity_level(vm.mc, obj, false);
    }
    Ok(v)
}

fn object_is_frozen<'gc>(_vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Boolean(match arg(args, 0) {
        Value::Object(obj) => test_integrity_level(&obj, true),
        _ => true,
    }))
}

fn object_is_sealed<'gc>(_vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Boolean(match arg(args, 0) {
        Value::Object(obj) => test_integrity_level(&obj, false),
        _ => true,
    }))
}

fn object_prevent_extensions<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let v = arg(args, 0);
    if let Value::Object(obj) = &v {
        obj.borrow_mut(vm.mc).extensible = false;
    }
    Ok(v)
}

fn object_is_extensible<'gc>(_vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Boolean(match arg(args, 0) {
        Value::Object(obj) => obj.borrow().extensible,
        _ => false,
    }))
}

fn object_is<'gc>(_vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Boolean(same_value(&arg(args, 0), &arg(args, 1))))
}

fn object_has_own_property<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let key = vm.to_property_key(&arg(args, 0))?;
    let obj = vm.to_object(&this)?;
    Ok(Value::Boolean(get_own_property(&obj, &key).is_some()))
}

fn object_is_prototype_of<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let Value::Object(v) = arg(args, 0) else {
        return Ok(Value::Boolean(false));
    };
    let obj = vm.to_object(&this)?;
    let mut p = v.borrow().prototype;
    while let Some(o) = p {
        if gc_arena::Gc::ptr_eq(o, obj) {
            return Ok(Value::Boolean(true));
        }
        p = o.borrow().prototype;
    }
    Ok(Value::Boolean(false))
}

fn object_property_is_enumerable<'gc>(
    vm: &mut Vm<'gc>,
    this: Value<'gc>,
    args: &[Value<'gc>],
    _nt: Option<JSObjectDataPtr<'gc>>,
) -> NativeResult<'gc> {
    let key = vm.to_property_key(&arg(args, 0))?;
    let obj = vm.to_object(&this)?;
    Ok(Value::Boolean(get_own_property(&obj, &key).is_some_and(|p| p.enumerable())))
}

fn object_to_string<'gc>(_vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let tag = match &this {
        Value::Undefined => "Undefined",
        Value::Null => "Null",
        Value::Boolean(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Object(o) => o.borrow().class_name(),
        Value::Uninitialized => "Undefined",
    };
    Ok(Value::from(format!("[object {tag}]")))
}

fn object_to_locale_string<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    vm.invoke(&this, "toString", &[])
}

fn object_value_of<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Object(vm.to_object(&this)?))
}
