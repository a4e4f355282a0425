use crate::core::number::number_to_string;
use crate::core::{EvalError, JSObjectDataPtr, MutationContext, ObjectKind, Property, PropertyKey, Realm, Value, Vm, new_js_object};
use crate::error::JSError;
use crate::unicode::utf16_to_utf8;
use gc_arena::Gc;

type NativeResult<'gc> = Result<Value<'gc>, EvalError<'gc>>;

/// Create the console object with logging functions
pub fn initialize_console_object<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<JSObjectDataPtr<'gc>, JSError> {
    let console = new_js_object(mc, Some(realm.object_prototype));
    realm.define_method(mc, &console, "log", console_log, 0);
    realm.define_method(mc, &console, "info", console_info, 0);
    realm.define_method(mc, &console, "warn", console_warn, 0);
    realm.define_method(mc, &console, "error", console_error, 0);
    Ok(console)
}

fn console_log<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let line = format_args_line(vm, args)?;
    log::trace!("console.log: {line}");
    println!("{line}");
    Ok(Value::Undefined)
}

fn console_info<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let line = format_args_line(vm, args)?;
    log::info!("{line}");
    println!("{line}");
    Ok(Value::Undefined)
}

fn console_warn<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let line = format_args_line(vm, args)?;
    if log::log_enabled!(log::Level::Warn) {
        log::warn!("{line}");
    } else {
        eprintln!("{line}");
    }
    Ok(Value::Undefined)
}

fn console_error<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let line = format_args_line(vm, args)?;
    if log::log_enabled!(log::Level::Error) {
        log::error!("{line}");
    } else {
        eprintln!("{line}");
    }
    Ok(Value::Undefined)
}

/// Joins arguments with spaces, expanding `%s %d %i %f %o %O %c` in a leading format string.
fn format_args_line<'gc>(vm: &mut Vm<'gc>, args: &[Value<'gc>]) -> Result<String, EvalError<'gc>> {
    let mut output = String::new();
    let mut next = 0;
    if let Some(Value::String(s)) = args.first()
        && args.len() > 1
        && s.contains(&(b'%' as u16))
    {
        next = 1;
        let format = utf16_to_utf8(s);
        let mut chars = format.chars().peekable();
        while let Some(c) = chars.next() {
            let spec = match (c, chars.peek().copied()) {
                ('%', Some(spec @ ('s' | 'd' | 'i' | 'f' | 'o' | 'O' | 'c'))) => spec,
                ('%', Some('%')) => {
                    chars.next();
                    output.push('%');
                    continue;
                }
                _ => {
                    output.push(c);
                    continue;
                }
            };
            chars.next();
            let Some(value) = args.get(next) else {
                output.push('%');
                output.push(spec);
                continue;
            };
            next += 1;
            match spec {
                's' => output.push_str(&vm.to_rust_string(value)?),
                'd' | 'i' => {
                    let n = vm.to_number(value)?;
                    output.push_str(&number_to_string(n.trunc()));
                }
                'f' => output.push_str(&number_to_string(vm.to_number(value)?)),
                'o' | 'O' => output.push_str(&inspect(value, 0, &mut Vec::new())),
                _ => {}
            }
        }
    }
    for (i, value) in args[next.min(args.len())..].iter().enumerate() {
        if i > 0 || next > 0 {
            output.push(' ');
        }
        match value {
            Value::String(s) => output.push_str(&utf16_to_utf8(s)),
            v => output.push_str(&inspect(v, 0, &mut Vec::new())),
        }
    }
    Ok(output)
}

/// Node-style rendering that reads own data properties only, so it never runs script code.
fn inspect<'gc>(value: &Value<'gc>, depth: usize, seen: &mut Vec<JSObjectDataPtr<'gc>>) -> String {
    let Value::Object(obj) = value else {
        return match value {
            Value::String(s) if depth > 0 => format!("'{}'", utf16_to_utf8(s)),
            other => crate::core::value_to_display_string(other),
        };
    };
    if seen.iter().any(|s| Gc::ptr_eq(*s, *obj)) {
        return "[Circular]".to_string();
    }
    let o = obj.borrow();
    match &o.kind {
        ObjectKind::Function(_) | ObjectKind::Native(_) | ObjectKind::Host(_) | ObjectKind::Bound { .. } => {
            let name = o.own_data_value(&PropertyKey::from("name")).map(|v| crate::core::value_to_display_string(&v));
            return match name {
                Some(n) if !n.is_empty() => format!("[Function: {n}]"),
                _ => "[Function (anonymous)]".to_string(),
            };
        }
        ObjectKind::Date(_) | ObjectKind::RegExp(_) | ObjectKind::Error => return crate::core::value_to_display_string(value),
        _ => {}
    }
    if depth > 2 {
        return if o.is_array() { "[Array]".to_string() } else { "[Object]".to_string() };
    }
    seen.push(*obj);
    let mut parts = Vec::new();
    if let Some(len) = o.array_length() {
        for i in 0..len {
            let part = match o.properties.get(&PropertyKey::Index(i)) {
                Some(Property::Data { value, .. }) => inspect(value, depth + 1, seen),
                Some(Property::Accessor { .. }) => "[Getter/Setter]".to_string(),
                None => "<empty>".to_string(),
            };
            parts.push(part);
        }
    }
    for (key, prop) in &o.properties {
        if !prop.enumerable() || (o.is_array() && key.as_index().is_some()) {
            continue;
        }
        let rendered = match prop {
            Property::Data { value, .. } => inspect(value, depth + 1, seen),
            Property::Accessor { .. } => "[Getter/Setter]".to_string(),
        };
        parts.push(format!("{key}: {rendered}"));
    }
    seen.pop();
    let (open, close) = if o.is_array() { ("[", "]") } else { ("{", "}") };
    if parts.is_empty() {
        return format!("{open}{close}");
    }
    format!("{open} {} {close}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{VmOptions, new_js_arena};

    #[test]
    fn formats_nested_values() {
        let arena = new_js_arena().unwrap();
        arena.mutate(|mc, root| {
            let mut vm = Vm::new(mc, &root.realm, VmOptions::default());
            let inner = vm.new_array(vec![Value::from(1), Value::from("x")]);
            let obj = new_js_object(mc, Some(root.realm.object_prototype));
            obj.borrow_mut(mc).insert("a", Property::data(Value::Object(inner)));
            obj.borrow_mut(mc).insert("self", Property::data(Value::Object(obj)));
            let args = [Value::from("v=%d"), Value::from(4.7), Value::Object(obj)];
            let line = format_args_line(&mut vm, &args).unwrap();
            assert_eq!(line, "v=4 { a: [ 1, 'x' ], self: [Circular] }");
        });
    }
}
