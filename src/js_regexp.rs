use crate::core::{
    EvalError, JSObjectDataPtr, MutationContext, ObjectKind, Property, PropertyKey, Realm, RegExpData, Value, Vm, arg,
    new_js_object_with_kind,
};
use crate::error::JSError;
use crate::unicode::{utf8_to_utf16, utf16_to_utf8};
use crate::{raise_syntax_error, raise_type_error};
use regress::Regex;
use std::ops::Range;

type NativeResult<'gc> = Result<Value<'gc>, EvalError<'gc>>;

pub fn initialize_regexp<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let proto = realm.regexp_prototype;
    realm.native_constructor(mc, "RegExp", regexp_constructor, 2, proto);
    realm.define_method(mc, &proto, "exec", regexp_exec_method, 1);
    realm.define_method(mc, &proto, "test", regexp_test, 1);
    realm.define_method(mc, &proto, "toString", regexp_to_string, 0);
    Ok(())
}

/// Validates `flags` and compiles `pattern` with `regress`.
pub(crate) fn compile_regex(pattern: &[u16], flags: &str) -> Result<Regex, JSError> {
    let mut seen = String::new();
    for c in flags.chars() {
        if !"gimsuy".contains(c) || seen.contains(c) {
            return Err(raise_syntax_error!(format!("Invalid regular expression flags '{flags}'")));
        }
        seen.push(c);
    }
    let regress_flags: String = flags.chars().filter(|c| "imsu".contains(*c)).collect();
    let units = std::char::decode_utf16(pattern.iter().copied()).map(|r| match r {
        Ok(c) => c as u32,
        Err(e) => e.unpaired_surrogate() as u32,
    });
    Regex::from_unicode(units, regress_flags.as_str())
        .map_err(|e| raise_syntax_error!(format!("Invalid regular expression: /{}/: {e}", utf16_to_utf8(pattern))))
}

/// RegExpCreate: a new RegExp object with `lastIndex` 0.
pub(crate) fn regexp_create<'gc>(
    vm: &mut Vm<'gc>,
    pattern: &[u16],
    flags: &str,
    new_target: Option<JSObjectDataPtr<'gc>>,
) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
    let regex = compile_regex(pattern, flags)?;
    let proto = vm.prototype_from_constructor(new_target, vm.realm.regexp_prototype)?;
    let source = if pattern.is_empty() { utf8_to_utf16("(?:)") } else { escape_source(pattern) };
    let obj = new_js_object_with_kind(
        vm.mc,
        Some(proto),
        ObjectKind::RegExp(Box::new(RegExpData {
            source: source.clone(),
            flags: flags.to_string(),
            regex,
        })),
    );
    {
        let mut o = obj.borrow_mut(vm.mc);
        o.insert("source", Property::constant(Value::String(source)));
        o.insert("flags", Property::constant(Value::from(flags)));
        o.insert("global", Property::constant(Value::Boolean(flags.contains('g'))));
        o.insert("ignoreCase", Property::constant(Value::Boolean(flags.contains('i'))));
        o.insert("multiline", Property::constant(Value::Boolean(flags.contains('m'))));
        o.insert("sticky", Property::constant(Value::Boolean(flags.contains('y'))));
        o.insert("unicode", Property::constant(Value::Boolean(flags.contains('u'))));
        o.insert(
            "lastIndex",
            Property::Data {
                value: Value::Number(0.0),
                writable: true,
                enumerable: false,
                configurable: false,
            },
        );
    }
    Ok(obj)
}

/// Escapes line terminators and unescaped `/` so `source` round-trips as a literal.
fn escape_source(pattern: &[u16]) -> Vec<u16> {
    let mut out = Vec::with_capacity(pattern.len());
    let mut escaped = false;
    let mut in_class = false;
    for &u in pattern {
        match u {
            0x0A if !escaped => out.extend(utf8_to_utf16("\\n")),
            0x0D if !escaped => out.extend(utf8_to_utf16("\\r")),
            0x2F if !escaped && !in_class => out.extend(utf8_to_utf16("\\/")),
            _ => out.push(u),
        }
        if !escaped {
            match u {
                0x5B => in_class = true,
                0x5D => in_class = false,
                _ => {}
            }
        }
        escaped = !escaped && u == 0x5C;
    }
    out
}

pub(crate) fn is_regexp(value: &Value<'_>) -> bool {
    matches!(value, Value::Object(o) if matches!(o.borrow().kind, ObjectKind::RegExp(_)))
}

/// One match: the overall range, capture groups in order, and named groups.
pub(crate) struct MatchData {
    pub range: Range<usize>,
    pub captures: Vec<Option<Range<usize>>>,
    pub named: Vec<(String, Option<Range<usize>>)>,
}

/// Searches from `start`; sticky regexps only match exactly at `start`.
pub(crate) fn find_at(obj: &JSObjectDataPtr<'_>, input: &[u16], start: usize) -> Option<MatchData> {
    let o = obj.borrow();
    let ObjectKind::RegExp(data) = &o.kind else {
        return None;
    };
    if start > input.len() {
        return None;
    }
    let m = data.regex.find_from_utf16(input, start).next()?;
    if data.flags.contains('y') && m.range.start != start {
        return None;
    }
    Some(MatchData {
        range: m.range.clone(),
        captures: m.captures.clone(),
        named: m.named_groups().map(|(name, r)| (name.to_string(), r)).collect(),
    })
}

fn regexp_flags(obj: &JSObjectDataPtr<'_>) -> String {
    match &obj.borrow().kind {
        ObjectKind::RegExp(data) => data.flags.clone(),
        _ => String::new(),
    }
}

/// Builds the exec result array with `index`, `input` and `groups`.
pub(crate) fn match_result<'gc>(vm: &mut Vm<'gc>, input: &[u16], m: &MatchData) -> JSObjectDataPtr<'gc> {
    let mut values = vec![Value::String(input[m.range.clone()].to_vec())];
    for cap in &m.captures {
        values.push(cap.clone().map(|r| Value::String(input[r].to_vec())).unwrap_or(Value::Undefined));
    }
    let arr = vm.new_array(values);
    let groups = if m.named.is_empty() {
        Value::Undefined
    } else {
        let g = crate::core::new_js_object(vm.mc, Some(vm.realm.object_prototype));
        for (name, r) in &m.named {
            let v = r.clone().map(|r| Value::String(input[r].to_vec())).unwrap_or(Value::Undefined);
            g.borrow_mut(vm.mc).insert(name.as_str(), Property::data(v));
        }
        Value::Object(g)
    };
    let mut a = arr.borrow_mut(vm.mc);
    a.insert("index", Property::data(Value::from(m.range.start)));
    a.insert("input", Property::data(Value::String(input.to_vec())));
    a.insert("groups", Property::data(groups));
    drop(a);
    arr
}

/// RegExpBuiltinExec, including the `lastIndex` protocol for global and sticky regexps.
pub(crate) fn regexp_exec<'gc>(vm: &mut Vm<'gc>, obj: &JSObjectDataPtr<'gc>, input: &[u16]) -> Result<Option<MatchData>, EvalError<'gc>> {
    let flags = regexp_flags(obj);
    let uses_last_index = flags.contains('g') || flags.contains('y');
    let this = Value::Object(*obj);
    let last_index_key = PropertyKey::from("lastIndex");
    let start = if uses_last_index {
        let v = vm.get(obj, &last_index_key)?;
        vm.to_integer(&v)?.max(0.0)
    } else {
        0.0
    };
    let found = if start > input.len() as f64 { None } else { find_at(obj, input, start as usize) };
    if uses_last_index {
        let next = found.as_ref().map(|m| m.range.end).unwrap_or(0);
        vm.put_value(&this, last_index_key, Value::from(next), true)?;
    }
    Ok(found)
}

fn this_regexp<'gc>(this: &Value<'gc>, method: &str) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
    match this {
        Value::Object(o) if matches!(o.borrow().kind, ObjectKind::RegExp(_)) => Ok(*o),
        _ => Err(raise_type_error!(format!("RegExp.prototype.{method} requires that 'this' be a RegExp object")).into()),
    }
}

fn regexp_constructor<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let pattern = arg(args, 0);
    let flags = arg(args, 1);
    if nt.is_none() && is_regexp(&pattern) && flags.is_undefined() {
        return Ok(pattern);
    }
    let (source, inherited_flags) = match &pattern {
        Value::Object(o) => match &o.borrow().kind {
            ObjectKind::RegExp(data) => (Some(data.source.clone()), Some(data.flags.clone())),
            _ => (None, None),
        },
        _ => (None, None),
    };
    let source = match source {
        Some(s) => s,
        None if pattern.is_undefined() => Vec::new(),
        None => vm.to_string(&pattern)?,
    };
    let flags = match flags {
        Value::Undefined => inherited_flags.unwrap_or_default(),
        f => vm.to_rust_string(&f)?,
    };
    Ok(Value::Object(regexp_create(vm, &source, &flags, nt)?))
}

fn regexp_exec_method<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = this_regexp(&this, "exec")?;
    let input = vm.to_string(&arg(args, 0))?;
    match regexp_exec(vm, &obj, &input)? {
        Some(m) => Ok(Value::Object(match_result(vm, &input, &m))),
        None => Ok(Value::Null),
    }
}

fn regexp_test<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = this_regexp(&this, "test")?;
    let input = vm.to_string(&arg(args, 0))?;
    Ok(Value::Boolean(regexp_exec(vm, &obj, &input)?.is_some()))
}

fn regexp_to_string<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let Value::Object(obj) = &this else {
        return Err(raise_type_error!("RegExp.prototype.toString requires that 'this' be an Object").into());
    };
    let source = vm.get(obj, &PropertyKey::from("source"))?;
    let flags = vm.get(obj, &PropertyKey::from("flags"))?;
    let mut out = utf8_to_utf16("/");
    out.extend(vm.to_string(&source)?);
    out.push(b'/' as u16);
    out.extend(vm.to_string(&flags)?);
    Ok(Value::String(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_and_duplicate_flags() {
        assert!(compile_regex(&utf8_to_utf16("a"), "gg").is_err());
        assert!(compile_regex(&utf8_to_utf16("a"), "x").is_err());
        assert!(compile_regex(&utf8_to_utf16("a+"), "gimy").is_ok());
    }

    #[test]
    fn source_escapes_slashes_outside_classes() {
        assert_eq!(utf16_to_utf8(&escape_source(&utf8_to_utf16("a/b[/]"))), "a\\/b[/]");
    }
}
