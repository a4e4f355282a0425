use crate::core::{
    EvalError, JSObjectDataPtr, MutationContext, NativeFn, ObjectKind, PropertyKey, Realm, Value, Vm, arg, new_js_object_with_kind,
};
use crate::error::JSError;
use crate::js_regexp::{MatchData, find_at, is_regexp, match_result, regexp_exec};
use crate::unicode::{
    code_point_at, utf8_to_utf16, utf16_find, utf16_find_from, utf16_rfind_from, utf16_to_lowercase, utf16_to_uppercase,
    utf16_trim, utf16_trim_end, utf16_trim_start,
};
use crate::{raise_range_error, raise_type_error};

type NativeResult<'gc> = Result<Value<'gc>, EvalError<'gc>>;

pub fn initialize_string<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let proto = realm.string_prototype;
    let ctor = realm.native_constructor(mc, "String", string_constructor, 1, proto);
    realm.define_method(mc, &ctor, "fromCharCode", string_from_char_code, 1);

    let methods: &[(&str, NativeFn, u32)] = &[
        ("charAt", string_char_at, 1),
        ("charCodeAt", string_char_code_at, 1),
        ("codePointAt", string_code_point_at, 1),
        ("indexOf", string_index_of, 1),
        ("lastIndexOf", string_last_index_of, 1),
        ("includes", string_includes, 1),
        ("startsWith", string_starts_with, 1),
        ("endsWith", string_ends_with, 1),
        ("slice", string_slice, 2),
        ("substring", string_substring, 2),
        ("substr", string_substr, 2),
        ("toUpperCase", string_to_upper_case, 0),
        ("toLowerCase", string_to_lower_case, 0),
        ("toLocaleUpperCase", string_to_upper_case, 0),
        ("toLocaleLowerCase", string_to_lower_case, 0),
        ("trim", string_trim, 0),
        ("trimStart", string_trim_start, 0),
        ("trimEnd", string_trim_end, 0),
        ("padStart", string_pad_start, 1),
        ("padEnd", string_pad_end, 1),
        ("repeat", string_repeat, 1),
        ("split", string_split, 2),
        ("concat", string_concat, 1),
        ("replace", string_replace, 2),
        ("match", string_match, 1),
        ("search", string_search, 1),
        ("localeCompare", string_locale_compare, 1),
        ("normalize", string_normalize, 0),
        ("toString", string_value_of, 0),
        ("valueOf", string_value_of, 0),
    ];
    for (name, func, length) in methods {
        realm.define_method(mc, &proto, name, *func, *length);
    }
    Ok(())
}

fn string_constructor<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = if args.is_empty() { Vec::new() } else { vm.to_string(&args[0])? };
    match nt {
        None => Ok(Value::String(s)),
        Some(nt) => {
            let proto = vm.prototype_from_constructor(Some(nt), vm.realm.string_prototype)?;
            Ok(Value::Object(new_js_object_with_kind(vm.mc, Some(proto), ObjectKind::String(s))))
        }
    }
}

fn string_from_char_code<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let mut out = Vec::with_capacity(args.len());
    for a in args {
        out.push(vm.to_uint32(a)? as u16);
    }
    Ok(Value::String(out))
}

/// `this` coerced to a string, rejecting `null`/`undefined`.
fn this_string<'gc>(vm: &mut Vm<'gc>, this: &Value<'gc>, method: &str) -> Result<Vec<u16>, EvalError<'gc>> {
    if this.is_null_or_undefined() {
        return Err(raise_type_error!(format!("String.prototype.{method} called on null or undefined")).into());
    }
    vm.to_string(this)
}

fn clamp_index<'gc>(vm: &mut Vm<'gc>, value: &Value<'gc>, len: usize, default: usize) -> Result<usize, EvalError<'gc>> {
    if value.is_undefined() {
        return Ok(default);
    }
    let n = vm.to_integer(value)?;
    Ok(n.clamp(0.0, len as f64) as usize)
}

/// Relative index as used by `slice`: negative values count from the end.
fn relative_index<'gc>(vm: &mut Vm<'gc>, value: &Value<'gc>, len: usize, default: usize) -> Result<usize, EvalError<'gc>> {
    if value.is_undefined() {
        return Ok(default);
    }
    let n = vm.to_integer(value)?;
    let len = len as f64;
    Ok(if n < 0.0 { (len + n).max(0.0) } else { n.min(len) } as usize)
}

fn string_char_at<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "charAt")?;
    let pos = vm.to_integer(&arg(args, 0))?;
    if pos < 0.0 || pos >= s.len() as f64 {
        return Ok(Value::String(Vec::new()));
    }
    Ok(Value::String(vec![s[pos as usize]]))
}

fn string_char_code_at<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "charCodeAt")?;
    let pos = vm.to_integer(&arg(args, 0))?;
    if pos < 0.0 || pos >= s.len() as f64 {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::from(s[pos as usize] as u32))
}

fn string_code_point_at<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "codePointAt")?;
    let pos = vm.to_integer(&arg(args, 0))?;
    if pos < 0.0 || pos >= s.len() as f64 {
        return Ok(Value::Undefined);
    }
    Ok(code_point_at(&s, pos as usize).map(Value::from).unwrap_or(Value::Undefined))
}

fn string_index_of<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "indexOf")?;
    let search = vm.to_string(&arg(args, 0))?;
    let from = clamp_index(vm, &arg(args, 1), s.len(), 0)?;
    Ok(match utf16_find_from(&s, &search, from) {
        Some(i) => Value::from(i),
        None => Value::Number(-1.0),
    })
}

fn string_last_index_of<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "lastIndexOf")?;
    let search = vm.to_string(&arg(args, 0))?;
    let pos = vm.to_number(&arg(args, 1))?;
    let from = if pos.is_nan() { s.len() } else { pos.clamp(0.0, s.len() as f64) as usize };
    Ok(match utf16_rfind_from(&s, &search, from) {
        Some(i) => Value::from(i),
        None => Value::Number(-1.0),
    })
}

fn reject_regexp<'gc>(value: &Value<'gc>, method: &str) -> Result<(), EvalError<'gc>> {
    if is_regexp(value) {
        return Err(raise_type_error!(format!(
            "First argument to String.prototype.{method} must not be a regular expression"
        ))
        .into());
    }
    Ok(())
}

fn string_includes<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "includes")?;
    reject_regexp(&arg(args, 0), "includes")?;
    let search = vm.to_string(&arg(args, 0))?;
    let from = clamp_index(vm, &arg(args, 1), s.len(), 0)?;
    Ok(Value::Boolean(utf16_find_from(&s, &search, from).is_some()))
}

fn string_starts_with<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "startsWith")?;
    reject_regexp(&arg(args, 0), "startsWith")?;
    let search = vm.to_string(&arg(args, 0))?;
    let from = clamp_index(vm, &arg(args, 1), s.len(), 0)?;
    Ok(Value::Boolean(s[from..].starts_with(&search)))
}

fn string_ends_with<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "endsWith")?;
    reject_regexp(&arg(args, 0), "endsWith")?;
    let search = vm.to_string(&arg(args, 0))?;
    let end = clamp_index(vm, &arg(args, 1), s.len(), s.len())?;
    Ok(Value::Boolean(s[..end].ends_with(&search)))
}

fn string_slice<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "slice")?;
    let start = relative_index(vm, &arg(args, 0), s.len(), 0)?;
    let end = relative_index(vm, &arg(args, 1), s.len(), s.len())?;
    Ok(Value::String(if start < end { s[start..end].to_vec() } else { Vec::new() }))
}

fn string_substring<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "substring")?;
    let a = clamp_index(vm, &arg(args, 0), s.len(), 0)?;
    let b = clamp_index(vm, &arg(args, 1), s.len(), s.len())?;
    Ok(Value::String(s[a.min(b)..a.max(b)].to_vec()))
}

fn string_substr<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "substr")?;
    let start = relative_index(vm, &arg(args, 0), s.len(), 0)?;
    let count = match arg(args, 1) {
        Value::Undefined => s.len() - start,
        v => vm.to_integer(&v)?.clamp(0.0, (s.len() - start) as f64) as usize,
    };
    Ok(Value::String(s[start..start + count].to_vec()))
}

fn string_to_upper_case<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "toUpperCase")?;
    Ok(Value::String(utf16_to_uppercase(&s)))
}

fn string_to_lower_case<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "toLowerCase")?;
    Ok(Value::String(utf16_to_lowercase(&s)))
}

fn string_trim<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "trim")?;
    Ok(Value::String(utf16_trim(&s).to_vec()))
}

fn string_trim_start<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "trimStart")?;
    Ok(Value::String(utf16_trim_start(&s).to_vec()))
}

fn string_trim_end<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "trimEnd")?;
    Ok(Value::String(utf16_trim_end(&s).to_vec()))
}

fn pad<'gc>(vm: &mut Vm<'gc>, this: &Value<'gc>, args: &[Value<'gc>], at_start: bool) -> NativeResult<'gc> {
    let s = this_string(vm, this, if at_start { "padStart" } else { "padEnd" })?;
    let target = vm.to_integer(&arg(args, 0))?;
    let filler = match arg(args, 1) {
        Value::Undefined => vec![b' ' as u16],
        v => vm.to_string(&v)?,
    };
    if target <= s.len() as f64 || filler.is_empty() {
        return Ok(Value::String(s));
    }
    let fill_len = target as usize - s.len();
    let padding: Vec<u16> = filler.iter().copied().cycle().take(fill_len).collect();
    let out = if at_start { [padding, s].concat() } else { [s, padding].concat() };
    Ok(Value::String(out))
}

fn string_pad_start<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    pad(vm, &this, args, true)
}

fn string_pad_end<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    pad(vm, &this, args, false)
}

fn string_repeat<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "repeat")?;
    let n = vm.to_integer(&arg(args, 0))?;
    if n < 0.0 || n.is_infinite() {
        return Err(raise_range_error!(format!("Invalid count value: {n}")).into());
    }
    if s.len() as f64 * n > (1u64 << 30) as f64 {
        return Err(raise_range_error!("Invalid string length").into());
    }
    Ok(Value::String(s.repeat(n as usize)))
}

fn string_concat<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let mut s = this_string(vm, &this, "concat")?;
    for a in args {
        s.extend(vm.to_string(a)?);
    }
    Ok(Value::String(s))
}

fn string_split<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "split")?;
    let separator = arg(args, 0);
    let limit = match arg(args, 1) {
        Value::Undefined => u32::MAX,
        v => vm.to_uint32(&v)?,
    } as usize;
    let mut parts: Vec<Value<'gc>> = Vec::new();
    if limit == 0 {
        return Ok(Value::Object(vm.new_array(parts)));
    }
    if let Value::Object(re) = &separator
        && is_regexp(&separator)
    {
        if s.is_empty() {
            if find_at(re, &s, 0).is_none_or(|m| !m.range.is_empty()) {
                parts.push(Value::String(s));
            }
            return Ok(Value::Object(vm.new_array(parts)));
        }
        let mut p = 0;
        let mut q = 0;
        while q < s.len() {
            let Some(m) = find_at(re, &s, q) else { break };
            if m.range.end == p || m.range.start >= s.len() || (m.range.is_empty() && m.range.start == p) {
                q = m.range.start.max(q) + 1;
                continue;
            }
            parts.push(Value::String(s[p..m.range.start].to_vec()));
            if parts.len() == limit {
                return Ok(Value::Object(vm.new_array(parts)));
            }
            for cap in &m.captures {
                parts.push(cap.clone().map(|r| Value::String(s[r].to_vec())).unwrap_or(Value::Undefined));
                if parts.len() == limit {
                    return Ok(Value::Object(vm.new_array(parts)));
                }
            }
            p = m.range.end;
            q = if m.range.is_empty() { p + 1 } else { p };
        }
        parts.push(Value::String(s[p.min(s.len())..].to_vec()));
        parts.truncate(limit);
        return Ok(Value::Object(vm.new_array(parts)));
    }
    if separator.is_undefined() {
        parts.push(Value::String(s));
        return Ok(Value::Object(vm.new_array(parts)));
    }
    let sep = vm.to_string(&separator)?;
    if sep.is_empty() {
        parts.extend(s.iter().take(limit).map(|u| Value::String(vec![*u])));
        return Ok(Value::Object(vm.new_array(parts)));
    }
    let mut start = 0;
    while let Some(i) = utf16_find_from(&s, &sep, start) {
        parts.push(Value::String(s[start..i].to_vec()));
        if parts.len() == limit {
            return Ok(Value::Object(vm.new_array(parts)));
        }
        start = i + sep.len();
    }
    parts.push(Value::String(s[start..].to_vec()));
    Ok(Value::Object(vm.new_array(parts)))
}

/// GetSubstitution: expands `$$`, `$&`, `` $` ``, `$'`, `$n`, `$nn` and `$<name>`.
fn expand_replacement(template: &[u16], subject: &[u16], m: &MatchData) -> Vec<u16> {
    let mut out = Vec::with_capacity(template.len());
    let group = |r: &Option<std::ops::Range<usize>>| r.clone().map(|r| subject[r].to_vec()).unwrap_or_default();
    let mut i = 0;
    while i < template.len() {
        let c = template[i];
        if c != b'$' as u16 || i + 1 >= template.len() {
            out.push(c);
            i += 1;
            continue;
        }
        let next = template[i + 1];
        match next {
            0x24 => {
                out.push(next);
                i += 2;
            }
            0x26 => {
                out.extend_from_slice(&subject[m.range.clone()]);
                i += 2;
            }
            0x60 => {
                out.extend_from_slice(&subject[..m.range.start]);
                i += 2;
            }
            0x27 => {
                out.extend_from_slice(&subject[m.range.end.min(subject.len())..]);
                i += 2;
            }
            d if (b'0' as u16..=b'9' as u16).contains(&d) => {
                let one = (d - b'0' as u16) as usize;
                let two = template
                    .get(i + 2)
                    .filter(|u| (b'0' as u16..=b'9' as u16).contains(u))
                    .map(|u| one * 10 + (*u - b'0' as u16) as usize);
                match two {
                    Some(n) if n >= 1 && n <= m.captures.len() => {
                        out.extend(group(&m.captures[n - 1]));
                        i += 3;
                    }
                    _ if one >= 1 && one <= m.captures.len() => {
                        out.extend(group(&m.captures[one - 1]));
                        i += 2;
                    }
                    _ => {
                        out.push(c);
                        i += 1;
                    }
                }
            }
            0x3C if !m.named.is_empty() => match template[i + 2..].iter().position(|u| *u == b'>' as u16) {
                Some(close) => {
                    let name = String::from_utf16_lossy(&template[i + 2..i + 2 + close]);
                    if let Some((_, r)) = m.named.iter().find(|(n, _)| *n == name) {
                        out.extend(group(r));
                    }
                    i += 3 + close;
                }
                None => {
                    out.push(c);
                    i += 1;
                }
            },
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn replacement_for<'gc>(vm: &mut Vm<'gc>, replacer: &Value<'gc>, subject: &[u16], m: &MatchData) -> Result<Vec<u16>, EvalError<'gc>> {
    if replacer.is_callable() {
        let mut call_args = vec![Value::String(subject[m.range.clone()].to_vec())];
        for cap in &m.captures {
            call_args.push(cap.clone().map(|r| Value::String(subject[r].to_vec())).unwrap_or(Value::Undefined));
        }
        call_args.push(Value::from(m.range.start));
        call_args.push(Value::String(subject.to_vec()));
        let r = vm.call(replacer, Value::Undefined, &call_args)?;
        return vm.to_string(&r);
    }
    let template = vm.to_string(replacer)?;
    Ok(expand_replacement(&template, subject, m))
}

fn string_replace<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "replace")?;
    let pattern = arg(args, 0);
    let replacer = arg(args, 1);
    let mut matches = Vec::new();
    if let Value::Object(re) = &pattern
        && is_regexp(&pattern)
    {
        let global = matches!(vm.get(re, &PropertyKey::from("global"))?, Value::Boolean(true));
        if global {
            vm.put_value(&pattern, PropertyKey::from("lastIndex"), Value::Number(0.0), true)?;
            let mut pos = 0;
            while pos <= s.len() {
                let Some(m) = find_at(re, &s, pos) else { break };
                pos = if m.range.is_empty() { m.range.end + 1 } else { m.range.end };
                matches.push(m);
            }
        } else if let Some(m) = regexp_exec(vm, re, &s)? {
            matches.push(m);
        }
    } else {
        let search = vm.to_string(&pattern)?;
        if let Some(i) = utf16_find(&s, &search) {
            matches.push(MatchData {
                range: i..i + search.len(),
                captures: Vec::new(),
                named: Vec::new(),
            });
        }
    }
    let mut out = Vec::with_capacity(s.len());
    let mut last = 0;
    for m in &matches {
        out.extend_from_slice(&s[last..m.range.start]);
        out.extend(replacement_for(vm, &replacer, &s, m)?);
        last = m.range.end;
    }
    out.extend_from_slice(&s[last..]);
    Ok(Value::String(out))
}

/// A RegExp for `match`/`search`: the argument itself, or one compiled from its string form.
fn coerce_regexp<'gc>(vm: &mut Vm<'gc>, value: &Value<'gc>) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
    match value {
        Value::Object(o) if is_regexp(value) => Ok(*o),
        Value::Undefined => crate::js_regexp::regexp_create(vm, &[], "", None),
        v => {
            let source = vm.to_string(v)?;
            crate::js_regexp::regexp_create(vm, &source, "", None)
        }
    }
}

fn string_match<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "match")?;
    let re = coerce_regexp(vm, &arg(args, 0))?;
    let global = matches!(vm.get(&re, &PropertyKey::from("global"))?, Value::Boolean(true));
    if !global {
        return match regexp_exec(vm, &re, &s)? {
            Some(m) => Ok(Value::Object(match_result(vm, &s, &m))),
            None => Ok(Value::Null),
        };
    }
    vm.put_value(&Value::Object(re), PropertyKey::from("lastIndex"), Value::Number(0.0), true)?;
    let mut found = Vec::new();
    let mut pos = 0;
    while pos <= s.len() {
        let Some(m) = find_at(&re, &s, pos) else { break };
        pos = if m.range.is_empty() { m.range.end + 1 } else { m.range.end };
        found.push(Value::String(s[m.range].to_vec()));
    }
    if found.is_empty() {
        return Ok(Value::Null);
    }
    Ok(Value::Object(vm.new_array(found)))
}

fn string_search<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "search")?;
    let re = coerce_regexp(vm, &arg(args, 0))?;
    Ok(match find_at(&re, &s, 0) {
        Some(m) => Value::from(m.range.start),
        None => Value::Number(-1.0),
    })
}

fn string_locale_compare<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let s = this_string(vm, &this, "localeCompare")?;
    let other = vm.to_string(&arg(args, 0))?;
    Ok(Value::Number(match s.cmp(&other) {
        std::cmp::Ordering::Less => -1.0,
        std::cmp::Ordering::Equal => 0.0,
        std::cmp::Ordering::Greater => 1.0,
    }))
}

fn string_normalize<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    use unicode_normalization::UnicodeNormalization;
    let s = this_string(vm, &this, "normalize")?;
    let form = match arg(args, 0) {
        Value::Undefined => "NFC".to_string(),
        v => vm.to_rust_string(&v)?,
    };
    let text = String::from_utf16_lossy(&s);
    let normalized: String = match form.as_str() {
        "NFC" => text.nfc().collect(),
        "NFD" => text.nfd().collect(),
        "NFKC" => text.nfkc().collect(),
        "NFKD" => text.nfkd().collect(),
        _ => return Err(raise_range_error!(format!("The normalization form should be one of NFC, NFD, NFKC, NFKD. Got {form}")).into()),
    };
    Ok(Value::String(utf8_to_utf16(&normalized)))
}

fn string_value_of<'gc>(_vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    match &this {
        Value::String(s) => Ok(Value::String(s.clone())),
        Value::Object(o) => match &o.borrow().kind {
            ObjectKind::String(s) => Ok(Value::String(s.clone())),
            _ => Err(raise_type_error!("String.prototype.valueOf requires that 'this' be a String").into()),
        },
        _ => Err(raise_type_error!("String.prototype.valueOf requires that 'this' be a String").into()),
    }
}

