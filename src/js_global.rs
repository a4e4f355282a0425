use crate::core::{EvalError, JSObjectDataPtr, MutationContext, Property, Realm, Value, Vm, arg, object_get_key_value};
use crate::error::JSError;
use crate::js_number::{number_parse_float, number_parse_int};
use crate::raise_error;
use crate::unicode::utf16_to_utf8;

type NativeResult<'gc> = Result<Value<'gc>, EvalError<'gc>>;

/// Characters `encodeURIComponent` leaves alone besides ASCII alphanumerics.
const URI_UNRESERVED_MARKS: &str = "-_.!~*'()";
/// Characters `encodeURI` additionally leaves alone and `decodeURI` keeps escaped.
const URI_RESERVED: &str = ";/?:@&=+$,#";

pub fn initialize_global_functions<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let global = realm.global;
    {
        let mut g = global.borrow_mut(mc);
        g.insert("globalThis", Property::hidden(Value::Object(global)));
        g.insert("NaN", Property::constant(Value::Number(f64::NAN)));
        g.insert("Infinity", Property::constant(Value::Number(f64::INFINITY)));
        g.insert("undefined", Property::constant(Value::Undefined));
    }

    // parseInt/parseFloat are the same function objects as Number.parseInt/parseFloat.
    let number_ctor = object_get_key_value(&global, "Number").and_then(|v| v.as_object());
    for name in ["parseInt", "parseFloat"] {
        match number_ctor.and_then(|n| object_get_key_value(&n, name)) {
            Some(f) => realm.define_global(mc, name, f),
            None => {
                let func = if name == "parseInt" { number_parse_int } else { number_parse_float };
                let f = realm.native_function(mc, name, func, if name == "parseInt" { 2 } else { 1 });
                realm.define_global(mc, name, Value::Object(f));
            }
        }
    }

    let functions: [(&str, crate::core::NativeFn, u32); 7] = [
        ("isNaN", global_is_nan, 1),
        ("isFinite", global_is_finite, 1),
        ("encodeURIComponent", global_encode_uri_component, 1),
        ("encodeURI", global_encode_uri, 1),
        ("decodeURIComponent", global_decode_uri_component, 1),
        ("decodeURI", global_decode_uri, 1),
        ("eval", global_eval, 1),
    ];
    for (name, func, length) in functions {
        let f = realm.native_function(mc, name, func, length);
        realm.define_global(mc, name, Value::Object(f));
    }
    Ok(())
}

fn global_is_nan<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Boolean(vm.to_number(&arg(args, 0))?.is_nan()))
}

fn global_is_finite<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Boolean(vm.to_number(&arg(args, 0))?.is_finite()))
}

/// Indirect eval: non-string arguments pass through, source runs in the global scope.
fn global_eval<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let Value::String(source) = arg(args, 0) else {
        return Ok(arg(args, 0));
    };
    let source = utf16_to_utf8(&source);
    log::debug!("eval: {} bytes", source.len());
    let code = vm.compile(&source, false)?;
    vm.run_script(code)
}

fn uri_error(message: &str) -> JSError {
    raise_error!("URIError", message)
}

/// Encode: percent-escapes UTF-8 bytes of every code point not in the unescaped set.
fn encode(input: &[u16], extra_unescaped: &str) -> Result<Vec<u16>, JSError> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        let u = input[i];
        if u < 0x80 {
            let c = u as u8 as char;
            if c.is_ascii_alphanumeric() || URI_UNRESERVED_MARKS.contains(c) || extra_unescaped.contains(c) {
                out.push(u);
                i += 1;
                continue;
            }
        }
        let cp = match u {
            0xDC00..=0xDFFF => return Err(uri_error("URI malformed")),
            0xD800..=0xDBFF => match input.get(i + 1) {
                Some(&lo) if (0xDC00..=0xDFFF).contains(&lo) => {
                    i += 1;
                    0x10000 + ((u as u32 - 0xD800) << 10) + (lo as u32 - 0xDC00)
                }
                _ => return Err(uri_error("URI malformed")),
            },
            _ => u as u32,
        };
        let ch = char::from_u32(cp).ok_or_else(|| uri_error("URI malformed"))?;
        let mut buf = [0u8; 4];
        for b in ch.encode_utf8(&mut buf).bytes() {
            out.extend(format!("%{b:02X}").encode_utf16());
        }
        i += 1;
    }
    Ok(out)
}

fn hex_byte(input: &[u16], at: usize) -> Option<u8> {
    if input.get(at) != Some(&(b'%' as u16)) {
        return None;
    }
    let hi = char::from_u32(*input.get(at + 1)? as u32)?.to_digit(16)?;
    let lo = char::from_u32(*input.get(at + 2)? as u32)?.to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

/// Decode: `%XX` sequences are UTF-8 decoded unless they spell a character in `reserved`.
fn decode(input: &[u16], reserved: &str) -> Result<Vec<u16>, JSError> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] != b'%' as u16 {
            out.push(input[i]);
            i += 1;
            continue;
        }
        let first = hex_byte(input, i).ok_or_else(|| uri_error("URI malformed"))?;
        if first < 0x80 {
            let c = first as char;
            if reserved.contains(c) {
                out.extend_from_slice(&input[i..i + 3]);
            } else {
                out.push(first as u16);
            }
            i += 3;
            continue;
        }
        let len = match first {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return Err(uri_error("URI malformed")),
        };
        let mut bytes = vec![first];
        for k in 1..len {
            let b = hex_byte(input, i + 3 * k).ok_or_else(|| uri_error("URI malformed"))?;
            bytes.push(b);
        }
        let s = std::str::from_utf8(&bytes).map_err(|_| uri_error("URI malformed"))?;
        out.extend(s.encode_utf16());
        i += 3 * len;
    }
    Ok(out)
}

fn global_encode_uri_component<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = vm.to_string(&arg(args, 0))?;
    Ok(Value::String(encode(&s, "")?))
}

fn global_encode_uri<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = vm.to_string(&arg(args, 0))?;
    Ok(Value::String(encode(&s, URI_RESERVED)?))
}

fn global_decode_uri_component<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = vm.to_string(&arg(args, 0))?;
    Ok(Value::String(decode(&s, "")?))
}

fn global_decode_uri<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = vm.to_string(&arg(args, 0))?;
    Ok(Value::String(decode(&s, URI_RESERVED)?))
}
