use crate::core::realm::function_meta;
use crate::core::{
    EvalError, JSObjectDataPtr, MutationContext, ObjectKind, PropertyKey, Realm, Value, Vm, arg, get_own_property, new_js_object_with_kind,
};
use crate::error::JSError;
use crate::raise_type_error;

type NativeResult<'gc> = Result<Value<'gc>, EvalError<'gc>>;

pub fn initialize_function<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let proto = realm.function_prototype;
    realm.native_constructor(mc, "Function", function_constructor, 1, proto);
    realm.define_method(mc, &proto, "call", function_call, 1);
    realm.define_method(mc, &proto, "apply", function_apply, 2);
    realm.define_method(mc, &proto, "bind", function_bind, 1);
    realm.define_method(mc, &proto, "toString", function_to_string, 0);
    Ok(())
}

/// `new Function(p1, ..., body)`: compiles the parameters and body as a
/// function expression in the global scope.
fn function_constructor<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let (params, body) = match args.split_last() {
        Some((body, params)) => (params, vm.to_rust_string(body)?),
        None => (&[][..], String::new()),
    };
    let mut names = Vec::with_capacity(params.len());
    for p in params {
        names.push(vm.to_rust_string(p)?);
    }
    let source = format!("(function anonymous({}\n) {{\n{body}\n}})", names.join(","));
    log::trace!("Function constructor source: {source}");
    let code = vm.compile(&source, false)?;
    vm.run_script(code)
}

fn this_callable<'gc>(this: &Value<'gc>, method: &str) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
    match this {
        Value::Object(o) if o.borrow().is_callable() => Ok(*o),
        _ => Err(raise_type_error!(format!("Function.prototype.{method} called on non-function")).into()),
    }
}

fn function_call<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let f = this_callable(&this, "call")?;
    let rest = args.get(1..).unwrap_or(&[]);
    vm.call(&Value::Object(f), arg(args, 0), rest)
}

fn function_apply<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let f = this_callable(&this, "apply")?;
    let list = vm.array_like_values(&arg(args, 1))?;
    vm.call(&Value::Object(f), arg(args, 0), &list)
}

fn function_bind<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let target = this_callable(&this, "bind")?;
    let bound_args: Vec<_> = args.get(1..).map(<[_]>::to_vec).unwrap_or_default();
    let target_length = match get_own_property(&target, &PropertyKey::from("length")) {
        Some(_) => match vm.get(&target, &PropertyKey::from("length"))? {
            Value::Number(n) if n.is_finite() => n.trunc().max(0.0),
            Value::Number(n) if n == f64::INFINITY => n,
            _ => 0.0,
        },
        None => 0.0,
    };
    let length = (target_length - bound_args.len() as f64).max(0.0);
    let name = match vm.get(&target, &PropertyKey::from("name"))? {
        Value::String(s) => crate::unicode::utf16_to_utf8(&s),
        _ => String::new(),
    };
    let prototype = target.borrow().prototype;
    let bound = new_js_object_with_kind(
        vm.mc,
        prototype,
        ObjectKind::Bound {
            target,
            this: arg(args, 0),
            args: bound_args,
        },
    );
    {
        let mut b = bound.borrow_mut(vm.mc);
        b.insert("length", function_meta(Value::Number(length)));
        b.insert("name", function_meta(Value::from(format!("bound {name}"))));
    }
    Ok(Value::Object(bound))
}

fn function_to_string<'gc>(_vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let f = this_callable(&this, "toString")?;
    let text = match &f.borrow().kind {
        ObjectKind::Function(c) if !c.code.source.is_empty() => c.code.source.clone(),
        ObjectKind::Function(c) => format!("function {}() {{ [native code] }}", c.code.name),
        ObjectKind::Native(n) => format!("function {}() {{ [native code] }}", n.name),
        _ => "function () { [native code] }".to_string(),
    };
    Ok(Value::from(text))
}
