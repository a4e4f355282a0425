use crate::core::{EvalError, JSObjectDataPtr, MutationContext, NativeFn, Property, Realm, Value, Vm, arg, new_js_object};
use crate::core::optimizer::exponentiate;
use crate::error::JSError;
use std::cell::Cell;

type NativeResult<'gc> = Result<Value<'gc>, EvalError<'gc>>;

pub fn initialize_math<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let math = new_js_object(mc, Some(realm.object_prototype));
    {
        let mut m = math.borrow_mut(mc);
        let constants = [
            ("E", std::f64::consts::E),
            ("LN2", std::f64::consts::LN_2),
            ("LN10", std::f64::consts::LN_10),
            ("LOG2E", std::f64::consts::LOG2_E),
            ("LOG10E", std::f64::consts::LOG10_E),
            ("PI", std::f64::consts::PI),
            ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
            ("SQRT2", std::f64::consts::SQRT_2),
        ];
        for (name, value) in constants {
            m.insert(name, Property::constant(Value::Number(value)));
        }
    }

    let functions: &[(&str, NativeFn, u32)] = &[
        ("abs", math_abs, 1),
        ("acos", math_acos, 1),
        ("asin", math_asin, 1),
        ("atan", math_atan, 1),
        ("atan2", math_atan2, 2),
        ("ceil", math_ceil, 1),
        ("cos", math_cos, 1),
        ("exp", math_exp, 1),
        ("floor", math_floor, 1),
        ("log", math_log, 1),
        ("max", math_max, 2),
        ("min", math_min, 2),
        ("pow", math_pow, 2),
        ("random", math_random, 0),
        ("round", math_round, 1),
        ("sin", math_sin, 1),
        ("sqrt", math_sqrt, 1),
        ("tan", math_tan, 1),
        ("trunc", math_trunc, 1),
        ("sign", math_sign, 1),
        ("cbrt", math_cbrt, 1),
        ("hypot", math_hypot, 2),
        ("log2", math_log2, 1),
        ("log10", math_log10, 1),
        ("fround", math_fround, 1),
        ("imul", math_imul, 2),
        ("clz32", math_clz32, 1),
    ];
    for (name, func, length) in functions {
        realm.define_method(mc, &math, name, *func, *length);
    }
    realm.define_global(mc, "Math", Value::Object(math));
    Ok(())
}

macro_rules! unary_math {
    ($($name:ident => $op:expr;)*) => {
        $(
            fn $name<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
                let x = vm.to_number(&arg(args, 0))?;
                let op: fn(f64) -> f64 = $op;
                Ok(Value::Number(op(x)))
            }
        )*
    };
}

unary_math! {
    math_abs => f64::abs;
    math_acos => f64::acos;
    math_asin => f64::asin;
    math_atan => f64::atan;
    math_ceil => f64::ceil;
    math_cos => f64::cos;
    math_exp => f64::exp;
    math_floor => f64::floor;
    math_log => f64::ln;
    math_sin => f64::sin;
    math_sqrt => f64::sqrt;
    math_tan => f64::tan;
    math_trunc => f64::trunc;
    math_cbrt => f64::cbrt;
    math_log2 => f64::log2;
    math_log10 => f64::log10;
    math_fround => |x| x as f32 as f64;
    math_round => round_half_up;
    math_sign => |x| if x.is_nan() || x == 0.0 { x } else { x.signum() };
}

/// Rounds to the nearest integer, ties toward +Infinity, preserving -0.
fn round_half_up(x: f64) -> f64 {
    if !x.is_finite() || x == 0.0 || x.fract() == 0.0 {
        return x;
    }
    if (-0.5..0.0).contains(&x) {
        return -0.0;
    }
    let floor = x.floor();
    if x - floor >= 0.5 { floor + 1.0 } else { floor }
}

fn math_atan2<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let y = vm.to_number(&arg(args, 0))?;
    let x = vm.to_number(&arg(args, 1))?;
    Ok(Value::Number(y.atan2(x)))
}

fn math_pow<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let base = vm.to_number(&arg(args, 0))?;
    let exponent = vm.to_number(&arg(args, 1))?;
    Ok(Value::Number(exponentiate(base, exponent)))
}

fn math_max<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let mut result = f64::NEG_INFINITY;
    for a in args {
        let n = vm.to_number(a)?;
        if n.is_nan() || result.is_nan() {
            result = f64::NAN;
        } else if n > result || (n == 0.0 && result == 0.0 && result.is_sign_negative()) {
            result = n;
        }
    }
    Ok(Value::Number(result))
}

fn math_min<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let mut result = f64::INFINITY;
    for a in args {
        let n = vm.to_number(a)?;
        if n.is_nan() || result.is_nan() {
            result = f64::NAN;
        } else if n < result || (n == 0.0 && result == 0.0 && n.is_sign_negative()) {
            result = n;
        }
    }
    Ok(Value::Number(result))
}

fn math_hypot<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let mut values = Vec::with_capacity(args.len());
    for a in args {
        values.push(vm.to_number(a)?);
    }
    if values.iter().any(|v| v.is_infinite()) {
        return Ok(Value::Number(f64::INFINITY));
    }
    if values.iter().any(|v| v.is_nan()) {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(values.iter().fold(0.0_f64, |acc, v| acc.hypot(*v))))
}

fn math_imul<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let a = vm.to_int32(&arg(args, 0))?;
    let b = vm.to_int32(&arg(args, 1))?;
    Ok(Value::from(a.wrapping_mul(b)))
}

fn math_clz32<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let n = vm.to_uint32(&arg(args, 0))?;
    Ok(Value::from(n.leading_zeros()))
}

thread_local! {
    static RANDOM_STATE: Cell<u64> = Cell::new(random_seed());
}

fn random_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0);
    nanos | 1
}

/// xorshift64*; 53 random bits mapped into [0, 1).
fn math_random<'gc>(_vm: &mut Vm<'gc>, _this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let bits = RANDOM_STATE.with(|state| {
        let mut x = state.get();
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        state.set(x);
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    });
    Ok(Value::Number((bits >> 11) as f64 / (1u64 << 53) as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_ties_toward_positive_infinity() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert!(round_half_up(-0.4).is_sign_negative());
    }

    #[test]
    fn max_min_and_integer_ops() {
        let eval = |s| crate::evaluate_script(s, None::<&str>).unwrap();
        assert_eq!(eval("Math.max()"), "-Infinity");
        assert_eq!(eval("Math.min(3, NaN, 1)"), "NaN");
        assert_eq!(eval("Math.imul(0xffffffff, 5)"), "-5");
        assert_eq!(eval("Math.clz32(1)"), "31");
        assert_eq!(eval("var r = Math.random(); r >= 0 && r < 1"), "true");
    }
}
