use crate::core::number::number_to_string;
use crate::core::{
    EvalError, JSObjectDataPtr, MutationContext, ObjectKind, Property, PropertyKey, Realm, Value, Vm, arg, delete_property, get_own_property,
    new_js_object, own_property_keys,
};
use crate::error::JSError;
use crate::js_array::is_array_value;
use crate::unicode::utf8_to_utf16;
use crate::{raise_range_error, raise_syntax_error, raise_type_error};
use gc_arena::Gc;

/// Nested objects and arrays `JSON.stringify` descends into before giving up.
const MAX_STRINGIFY_DEPTH: usize = 256;

type NativeResult<'gc> = Result<Value<'gc>, EvalError<'gc>>;

pub fn initialize_json<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let json = new_js_object(mc, Some(realm.object_prototype));
    realm.define_method(mc, &json, "parse", json_parse, 2);
    realm.define_method(mc, &json, "stringify", json_stringify, 3);
    realm.define_global(mc, "JSON", Value::Object(json));
    Ok(())
}

fn json_parse<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let text = vm.to_rust_string(&arg(args, 0))?;
    let parsed: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| raise_syntax_error!(format!("JSON.parse: {e}")))?;
    let value = json_to_value(vm, &parsed);
    let reviver = arg(args, 1);
    if !reviver.is_callable() {
        return Ok(value);
    }
    let root = new_js_object(vm.mc, Some(vm.realm.object_prototype));
    root.borrow_mut(vm.mc).insert("", Property::data(value));
    internalize(vm, &root, PropertyKey::from(""), &reviver)
}

fn json_to_value<'gc>(vm: &mut Vm<'gc>, json: &serde_json::Value) -> Value<'gc> {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(utf8_to_utf16(s)),
        serde_json::Value::Array(items) => {
            let values = items.iter().map(|item| json_to_value(vm, item)).collect();
            Value::Object(vm.new_array(values))
        }
        serde_json::Value::Object(map) => {
            let obj = new_js_object(vm.mc, Some(vm.realm.object_prototype));
            for (key, item) in map {
                let v = json_to_value(vm, item);
                obj.borrow_mut(vm.mc).insert(key.as_str(), Property::data(v));
            }
            Value::Object(obj)
        }
    }
}

/// InternalizeJSONProperty: bottom-up walk calling the reviver on every key.
fn internalize<'gc>(vm: &mut Vm<'gc>, holder: &JSObjectDataPtr<'gc>, key: PropertyKey, reviver: &Value<'gc>) -> NativeResult<'gc> {
    let value = vm.get(holder, &key)?;
    if let Value::Object(obj) = &value {
        let keys = if is_array_value(&value) {
            (0..vm.length_of(obj)?).map(PropertyKey::from).collect()
        } else {
            own_property_keys(obj)
                .into_iter()
                .filter(|k| get_own_property(obj, k).is_some_and(|p| p.enumerable()))
                .collect::<Vec<_>>()
        };
        for k in keys {
            let revived = internalize(vm, obj, k.clone(), reviver)?;
            if revived.is_undefined() {
                delete_property(vm.mc, obj, &k);
            } else {
                vm.create_data_property(obj, k, revived)?;
            }
        }
    }
    let key_value = Value::String(key.to_utf16());
    vm.call(reviver, Value::Object(*holder), &[key_value, value])
}

struct Serializer<'gc> {
    replacer: Option<Value<'gc>>,
    property_list: Option<Vec<PropertyKey>>,
    gap: Vec<u16>,
    indent: Vec<u16>,
    stack: Vec<JSObjectDataPtr<'gc>>,
}

fn json_stringify<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let mut serializer = Serializer {
        replacer: None,
        property_list: None,
        gap: Vec::new(),
        indent: Vec::new(),
        stack: Vec::new(),
    };
    let replacer = arg(args, 1);
    if replacer.is_callable() {
        serializer.replacer = Some(replacer);
    } else if is_array_value(&replacer) {
        let mut list: Vec<PropertyKey> = Vec::new();
        for item in vm.array_like_values(&replacer)? {
            let key = match &item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(utf8_to_utf16(&number_to_string(*n))),
                Value::Object(o) if matches!(o.borrow().kind, ObjectKind::String(_) | ObjectKind::Number(_)) => Some(vm.to_string(&item)?),
                _ => None,
            };
            if let Some(key) = key.map(|k| PropertyKey::from_utf16(&k))
                && !list.contains(&key)
            {
                list.push(key);
            }
        }
        serializer.property_list = Some(list);
    }

    let space = match arg(args, 2) {
        Value::Object(o) => match o.borrow().kind {
            ObjectKind::Number(n) => Value::Number(n),
            ObjectKind::String(ref s) => Value::String(s.clone()),
            _ => Value::Object(o),
        },
        v => v,
    };
    serializer.gap = match space {
        Value::Number(n) => vec![b' ' as u16; n.clamp(0.0, 10.0) as usize],
        Value::String(s) => s[..s.len().min(10)].to_vec(),
        _ => Vec::new(),
    };

    let wrapper = new_js_object(vm.mc, Some(vm.realm.object_prototype));
    wrapper.borrow_mut(vm.mc).insert("", Property::data(arg(args, 0)));
    match serializer.property(vm, &wrapper, PropertyKey::from(""))? {
        Some(text) => Ok(Value::String(text)),
        None => Ok(Value::Undefined),
    }
}

impl<'gc> Serializer<'gc> {
    /// SerializeJSONProperty; `None` means the value is skipped.
    fn property(&mut self, vm: &mut Vm<'gc>, holder: &JSObjectDataPtr<'gc>, key: PropertyKey) -> Result<Option<Vec<u16>>, EvalError<'gc>> {
        let mut value = vm.get(holder, &key)?;
        if let Value::Object(_) = value {
            let to_json = vm.get_value(&value, &PropertyKey::from("toJSON"))?;
            if to_json.is_callable() {
                value = vm.call(&to_json, value, &[Value::String(key.to_utf16())])?;
            }
        }
        if let Some(replacer) = &self.replacer {
            let replacer = replacer.clone();
            value = vm.call(&replacer, Value::Object(*holder), &[Value::String(key.to_utf16()), value])?;
        }
        if let Value::Object(o) = &value {
            let unwrapped = match &o.borrow().kind {
                ObjectKind::Number(n) => Some(Value::Number(*n)),
                ObjectKind::Boolean(b) => Some(Value::Boolean(*b)),
                ObjectKind::String(s) => Some(Value::String(s.clone())),
                _ => None,
            };
            if let Some(v) = unwrapped {
                value = v;
            }
        }
        Ok(match value {
            Value::Null => Some(utf8_to_utf16("null")),
            Value::Boolean(b) => Some(utf8_to_utf16(if b { "true" } else { "false" })),
            Value::String(s) => Some(quote(&s)),
            Value::Number(n) if n.is_finite() => Some(utf8_to_utf16(&number_to_string(n))),
            Value::Number(_) => Some(utf8_to_utf16("null")),
            Value::Object(o) if !o.borrow().is_callable() => {
                if self.stack.iter().any(|s| Gc::ptr_eq(*s, o)) {
                    return Err(raise_type_error!("Converting circular structure to JSON").into());
                }
                if self.stack.len() >= MAX_STRINGIFY_DEPTH {
                    return Err(raise_range_error!("Maximum call stack size exceeded").into());
                }
                self.stack.push(o);
                let stepback = self.indent.clone();
                self.indent.extend_from_slice(&self.gap);
                let out = if o.borrow().is_array() { self.array(vm, &o) } else { self.object(vm, &o) };
                self.indent = stepback;
                self.stack.pop();
                Some(out?)
            }
            _ => None,
        })
    }

    fn object(&mut self, vm: &mut Vm<'gc>, obj: &JSObjectDataPtr<'gc>) -> Result<Vec<u16>, EvalError<'gc>> {
        let keys = match &self.property_list {
            Some(list) => list.clone(),
            None => own_property_keys(obj)
                .into_iter()
                .filter(|k| get_own_property(obj, k).is_some_and(|p| p.enumerable()))
                .collect(),
        };
        let mut members = Vec::new();
        for key in keys {
            if let Some(text) = self.property(vm, obj, key.clone())? {
                let mut member = quote(&key.to_utf16());
                member.push(b':' as u16);
                if !self.gap.is_empty() {
                    member.push(b' ' as u16);
                }
                member.extend(text);
                members.push(member);
            }
        }
        Ok(self.wrap(members, b'{', b'}'))
    }

    fn array(&mut self, vm: &mut Vm<'gc>, arr: &JSObjectDataPtr<'gc>) -> Result<Vec<u16>, EvalError<'gc>> {
        let len = vm.length_of(arr)?;
        let mut members = Vec::with_capacity(len as usize);
        for i in 0..len {
            let text = self.property(vm, arr, PropertyKey::from(i))?;
            members.push(text.unwrap_or_else(|| utf8_to_utf16("null")));
        }
        Ok(self.wrap(members, b'[', b']'))
    }

    fn wrap(&self, members: Vec<Vec<u16>>, open: u8, close: u8) -> Vec<u16> {
        let mut out = vec![open as u16];
        if !members.is_empty() {
            if self.gap.is_empty() {
                out.extend(members.join(&(b',' as u16)));
            } else {
                let mut separator = utf8_to_utf16(",\n");
                separator.extend_from_slice(&self.indent);
                out.push(b'\n' as u16);
                out.extend_from_slice(&self.indent);
                out.extend(members.join(separator.as_slice()));
                out.push(b'\n' as u16);
                let outer = self.indent.len() - self.gap.len();
                out.extend_from_slice(&self.indent[..outer]);
            }
        }
        out.push(close as u16);
        out
    }
}

/// QuoteJSONString, escaping lone surrogates as `\uXXXX`.
fn quote(s: &[u16]) -> Vec<u16> {
    let mut out = Vec::with_capacity(s.len() + 2);
    out.push(b'"' as u16);
    let mut i = 0;
    while i < s.len() {
        let u = s[i];
        let escape = |out: &mut Vec<u16>, text: &str| out.extend(utf8_to_utf16(text));
        match u {
            0x22 => escape(&mut out, "\\\""),
            0x5C => escape(&mut out, "\\\\"),
            0x08 => escape(&mut out, "\\b"),
            0x0C => escape(&mut out, "\\f"),
            0x0A => escape(&mut out, "\\n"),
            0x0D => escape(&mut out, "\\r"),
            0x09 => escape(&mut out, "\\t"),
            0xD800..=0xDBFF if s.get(i + 1).is_some_and(|n| (0xDC00..=0xDFFF).contains(n)) => {
                out.push(u);
                out.push(s[i + 1]);
                i += 1;
            }
            u if u < 0x20 || (0xD800..=0xDFFF).contains(&u) => escape(&mut out, &format!("\\u{u:04x}")),
            _ => out.push(u),
        }
        i += 1;
    }
    out.push(b'"' as u16);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate_script;
    use crate::unicode::utf16_to_utf8;

    fn eval(src: &str) -> String {
        evaluate_script(src, None::<&str>).unwrap()
    }

    #[test]
    fn quote_escapes_controls_and_lone_surrogates() {
        assert_eq!(utf16_to_utf8(&quote(&utf8_to_utf16("a\"\n\u{1}"))), "\"a\\\"\\n\\u0001\"");
        assert_eq!(utf16_to_utf8(&quote(&[0xD800])), "\"\\ud800\"");
    }

    #[test]
    fn stringify_with_indent_and_to_json() {
        assert_eq!(eval("JSON.stringify({a: [1, {b: 2}]}, null, 2)"), "{\n  \"a\": [\n    1,\n    {\n      \"b\": 2\n    }\n  ]\n}");
        assert_eq!(eval("JSON.stringify({toJSON() { return 'x'; }})"), "\"x\"");
        assert_eq!(eval("JSON.stringify([undefined, function(){}, NaN])"), "[null,null,null]");
    }

    #[test]
    fn stringify_replacers() {
        assert_eq!(eval("JSON.stringify({a: 1, b: 2, c: 3}, ['c', 'a'])"), "{\"c\":3,\"a\":1}");
        assert_eq!(eval("JSON.stringify({a: 1, b: 'x'}, function(k, v) { return typeof v === 'number' ? v * 2 : v; })"), "{\"a\":2,\"b\":\"x\"}");
    }

    #[test]
    fn cycles_are_type_errors() {
        let err = evaluate_script("var o = {}; o.self = o; JSON.stringify(o)", None::<&str>).unwrap_err();
        assert_eq!(err.name(), "TypeError");
    }

    #[test]
    fn deep_nesting_is_a_range_error() {
        let err = evaluate_script("var o = {}; for (var i = 0; i < 100000; i++) o = { a: o }; JSON.stringify(o)", None::<&str>).unwrap_err();
        assert_eq!(err.name(), "RangeError");
        assert_eq!(eval("var a = []; for (var i = 0; i < 100000; i++) a = [a]; try { JSON.stringify(a); } catch (e) { e.name }"), "RangeError");
        assert_eq!(eval("var o = 1; for (var i = 0; i < 50; i++) o = { a: o }; JSON.stringify(o).length"), "301");
    }

    #[test]
    fn parse_errors_are_syntax_errors() {
        let err = evaluate_script("JSON.parse('{bad')", None::<&str>).unwrap_err();
        assert_eq!(err.name(), "SyntaxError");
    }

    #[test]
    fn parse_with_reviver() {
        assert_eq!(eval("JSON.stringify(JSON.parse('{\"a\":1,\"b\":[2,3]}', function(k, v) { return typeof v === 'number' ? v + 1 : v; }))"), "{\"a\":2,\"b\":[3,4]}");
    }
}
