use crate::core::number::{number_to_radix_string, number_to_string, parse_float, parse_int, to_exponential, to_fixed, to_precision};
use crate::core::{EvalError, JSObjectDataPtr, MutationContext, ObjectKind, Property, Realm, Value, Vm, arg, new_js_object_with_kind};
use crate::error::JSError;
use crate::{raise_range_error, raise_type_error};

type NativeResult<'gc> = Result<Value<'gc>, EvalError<'gc>>;

const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;

pub fn initialize_number_module<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let proto = realm.number_prototype;
    let ctor = realm.native_constructor(mc, "Number", number_constructor, 1, proto);

    {
        let mut c = ctor.borrow_mut(mc);
        c.insert("MAX_VALUE", Property::constant(Value::Number(f64::MAX)));
        c.insert("MIN_VALUE", Property::constant(Value::Number(f64::from_bits(1))));
        c.insert("NaN", Property::constant(Value::Number(f64::NAN)));
        c.insert("POSITIVE_INFINITY", Property::constant(Value::Number(f64::INFINITY)));
        c.insert("NEGATIVE_INFINITY", Property::constant(Value::Number(f64::NEG_INFINITY)));
        c.insert("EPSILON", Property::constant(Value::Number(f64::EPSILON)));
        c.insert("MAX_SAFE_INTEGER", Property::constant(Value::Number(MAX_SAFE_INTEGER)));
        c.insert("MIN_SAFE_INTEGER", Property::constant(Value::Number(-MAX_SAFE_INTEGER)));
    }

    realm.define_method(mc, &ctor, "isNaN", number_is_nan, 1);
    realm.define_method(mc, &ctor, "isFinite", number_is_finite, 1);
    realm.define_method(mc, &ctor, "isInteger", number_is_integer, 1);
    realm.define_method(mc, &ctor, "isSafeInteger", number_is_safe_integer, 1);
    realm.define_method(mc, &ctor, "parseFloat", number_parse_float, 1);
    realm.define_method(mc, &ctor, "parseInt", number_parse_int, 2);

    realm.define_method(mc, &proto, "toString", number_to_string_method, 1);
    realm.define_method(mc, &proto, "toLocaleString", number_to_string_method, 0);
    realm.define_method(mc, &proto, "toFixed", number_to_fixed, 1);
    realm.define_method(mc, &proto, "toExponential", number_to_exponential, 1);
    realm.define_method(mc, &proto, "toPrecision", number_to_precision, 1);
    realm.define_method(mc, &proto, "valueOf", number_value_of, 0);
    Ok(())
}

fn number_constructor<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let n = if args.is_empty() { 0.0 } else { vm.to_number(&args[0])? };
    match nt {
        None => Ok(Value::Number(n)),
        Some(nt) => {
            let proto = vm.prototype_from_constructor(Some(nt), vm.realm.number_prototype)?;
            Ok(Value::Object(new_js_object_with_kind(vm.mc, Some(proto), ObjectKind::Number(n))))
        }
    }
}

fn is_integral(n: f64) -> bool {
    n.is_finite() && n.trunc() == n
}

fn number_is_nan<'gc>(_vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Boolean(matches!(arg(args, 0), Value::Number(n) if n.is_nan())))
}

fn number_is_finite<'gc>(_vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Boolean(matches!(arg(args, 0), Value::Number(n) if n.is_finite())))
}

fn number_is_integer<'gc>(_vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Boolean(matches!(arg(args, 0), Value::Number(n) if is_integral(n))))
}

fn number_is_safe_integer<'gc>(_vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Boolean(
        matches!(arg(args, 0), Value::Number(n) if is_integral(n) && n.abs() <= MAX_SAFE_INTEGER),
    ))
}

pub(crate) fn number_parse_float<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = vm.to_string(&arg(args, 0))?;
    Ok(Value::Number(parse_float(&s)))
}

pub(crate) fn number_parse_int<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = vm.to_string(&arg(args, 0))?;
    let radix = vm.to_int32(&arg(args, 1))?;
    Ok(Value::Number(parse_int(&s, radix)))
}

/// thisNumberValue: a number primitive or a Number wrapper.
fn this_number_value<'gc>(this: &Value<'gc>, method: &str) -> Result<f64, EvalError<'gc>> {
    match this {
        Value::Number(n) => Ok(*n),
        Value::Object(o) => match o.borrow().kind {
            ObjectKind::Number(n) => Ok(n),
            _ => Err(raise_type_error!(format!("Number.prototype.{method} requires that 'this' be a Number")).into()),
        },
        _ => Err(raise_type_error!(format!("Number.prototype.{method} requires that 'this' be a Number")).into()),
    }
}

fn number_to_string_method<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let x = this_number_value(&this, "toString")?;
    let radix = match arg(args, 0) {
        Value::Undefined => 10.0,
        v => vm.to_integer(&v)?,
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(raise_range_error!("toString() radix must be between 2 and 36").into());
    }
    Ok(Value::from(number_to_radix_string(x, radix as u32)))
}

/// Reads a digits argument and checks it against `range`.
fn digits_arg<'gc>(vm: &mut Vm<'gc>, value: &Value<'gc>, range: std::ops::RangeInclusive<f64>, method: &str) -> Result<f64, EvalError<'gc>> {
    let d = vm.to_integer(value)?;
    if !range.contains(&d) {
        return Err(raise_range_error!(format!("{method}() digits argument must be between {} and 100", range.start())).into());
    }
    Ok(d)
}

fn number_to_fixed<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let x = this_number_value(&this, "toFixed")?;
    let digits = digits_arg(vm, &arg(args, 0), 0.0..=100.0, "toFixed")?;
    if !x.is_finite() || x.abs() >= 1e21 {
        return Ok(Value::from(number_to_string(x)));
    }
    Ok(Value::from(to_fixed(x, digits as usize)))
}

fn number_to_exponential<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let x = this_number_value(&this, "toExponential")?;
    let fraction = arg(args, 0);
    let digits = vm.to_integer(&fraction)?;
    if !x.is_finite() {
        return Ok(Value::from(number_to_string(x)));
    }
    if !(0.0..=100.0).contains(&digits) {
        return Err(raise_range_error!("toExponential() argument must be between 0 and 100").into());
    }
    let digits = if fraction.is_undefined() { None } else { Some(digits as usize) };
    Ok(Value::from(to_exponential(x, digits)))
}

fn number_to_precision<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let x = this_number_value(&this, "toPrecision")?;
    let precision = arg(args, 0);
    if precision.is_undefined() || !x.is_finite() {
        return Ok(Value::from(number_to_string(x)));
    }
    let p = digits_arg(vm, &precision, 1.0..=100.0, "toPrecision")?;
    Ok(Value::from(to_precision(x, p as usize)))
}

fn number_value_of<'gc>(_vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Number(this_number_value(&this, "valueOf")?))
}

#[cfg(test)]
mod tests {
    use crate::evaluate_script;

    fn eval(src: &str) -> String {
        evaluate_script(src, None::<&str>).unwrap()
    }

    #[test]
    fn formatting_methods() {
        assert_eq!(eval("(1.005).toFixed(2)"), "1.00");
        assert_eq!(eval("(255).toString(16)"), "ff");
        assert_eq!(eval("(123.456).toExponential(2)"), "1.23e+2");
        assert_eq!(eval("(0.000123).toPrecision(2)"), "0.00012");
    }

    #[test]
    fn radix_out_of_range_is_range_error() {
        let err = evaluate_script("(1).toString(1)", None::<&str>).unwrap_err();
        assert_eq!(err.name(), "RangeError");
    }

    #[test]
    fn statics_do_not_coerce() {
        assert_eq!(eval("[Number.isNaN('x'), isNaN('x'), Number.isInteger(5.0), Number.isSafeInteger(2**53)].join()"), "false,true,true,false");
    }
}
