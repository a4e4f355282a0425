use crate::core::{
    EvalError, JSObjectDataPtr, MutationContext, NativeFn, ObjectKind, PropertyKey, Realm, Value, Vm, arg, delete_property,
    has_property, new_js_object_with_kind, same_value_zero, strict_equals,
};
use crate::error::JSError;
use crate::unicode::utf8_to_utf16;
use crate::{raise_range_error, raise_type_error};
use std::cmp::Ordering;

type NativeResult<'gc> = Result<Value<'gc>, EvalError<'gc>>;

pub fn initialize_array<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let proto = realm.array_prototype;
    let ctor = realm.native_constructor(mc, "Array", array_constructor, 1, proto);
    realm.define_method(mc, &ctor, "isArray", array_is_array, 1);
    realm.define_method(mc, &ctor, "of", array_of, 0);
    realm.define_method(mc, &ctor, "from", array_from, 1);

    let methods: &[(&str, NativeFn, u32)] = &[
        ("push", array_push, 1),
        ("pop", array_pop, 0),
        ("shift", array_shift, 0),
        ("unshift", array_unshift, 1),
        ("slice", array_slice, 2),
        ("splice", array_splice, 2),
        ("concat", array_concat, 1),
        ("join", array_join, 1),
        ("reverse", array_reverse, 0),
        ("indexOf", array_index_of, 1),
        ("lastIndexOf", array_last_index_of, 1),
        ("includes", array_includes, 1),
        ("every", array_every, 1),
        ("some", array_some, 1),
        ("forEach", array_for_each, 1),
        ("map", array_map, 1),
        ("filter", array_filter, 1),
        ("reduce", array_reduce, 1),
        ("reduceRight", array_reduce_right, 1),
        ("sort", array_sort, 1),
        ("find", array_find, 1),
        ("findIndex", array_find_index, 1),
        ("fill", array_fill, 1),
        ("toString", array_to_string, 0),
    ];
    for (name, func, length) in methods {
        realm.define_method(mc, &proto, name, *func, *length);
    }
    Ok(())
}

// ------------------------------------------------------------ helpers

fn get_index<'gc>(vm: &mut Vm<'gc>, obj: &JSObjectDataPtr<'gc>, i: u32) -> NativeResult<'gc> {
    vm.get(obj, &PropertyKey::Index(i))
}

fn set_index<'gc>(vm: &mut Vm<'gc>, obj: &JSObjectDataPtr<'gc>, i: u32, value: Value<'gc>) -> Result<(), EvalError<'gc>> {
    vm.put_value(&Value::Object(*obj), PropertyKey::Index(i), value, true)
}

fn delete_index<'gc>(vm: &mut Vm<'gc>, obj: &JSObjectDataPtr<'gc>, i: u32) -> Result<(), EvalError<'gc>> {
    if !delete_property(vm.mc, obj, &PropertyKey::Index(i)) {
        return Err(raise_type_error!(format!("Cannot delete property '{i}' of [object Array]")).into());
    }
    Ok(())
}

fn set_length<'gc>(vm: &mut Vm<'gc>, obj: &JSObjectDataPtr<'gc>, len: f64) -> Result<(), EvalError<'gc>> {
    vm.put_value(&Value::Object(*obj), PropertyKey::from("length"), Value::Number(len), true)
}

fn has_index(obj: &JSObjectDataPtr<'_>, i: u32) -> bool {
    has_property(obj, &PropertyKey::Index(i))
}

/// Resolves a relative index argument (negative counts from the end) into `0..=len`.
fn relative_index<'gc>(vm: &mut Vm<'gc>, value: &Value<'gc>, len: u32, default: u32) -> Result<u32, EvalError<'gc>> {
    if value.is_undefined() {
        return Ok(default);
    }
    let n = vm.to_integer(value)?;
    let len = len as f64;
    let idx = if n < 0.0 { (len + n).max(0.0) } else { n.min(len) };
    Ok(idx as u32)
}

fn callback_arg<'gc>(args: &[Value<'gc>], method: &str) -> Result<Value<'gc>, EvalError<'gc>> {
    let f = arg(args, 0);
    if !f.is_callable() {
        return Err(raise_type_error!(format!(
            "{} is not a function (Array.prototype.{method})",
            crate::core::value_to_display_string(&f)
        ))
        .into());
    }
    Ok(f)
}

pub(crate) fn is_array_value(value: &Value<'_>) -> bool {
    matches!(value, Value::Object(o) if o.borrow().is_array())
}

// ------------------------------------------------------------ constructor and statics

fn array_constructor<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let proto = vm.prototype_from_constructor(nt, vm.realm.array_prototype)?;
    let arr = new_js_object_with_kind(
        vm.mc,
        Some(proto),
        ObjectKind::Array {
            length: 0,
            length_writable: true,
        },
    );
    match args {
        [Value::Number(n)] => {
            let len = *n as u32;
            if len as f64 != *n {
                return Err(raise_range_error!("Invalid array length").into());
            }
            crate::core::set_array_length(vm.mc, &arr, len)?;
        }
        _ => {
            for v in args {
                vm.array_push(&arr, v.clone())?;
            }
        }
    }
    Ok(Value::Object(arr))
}

fn array_is_array<'gc>(_vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Boolean(is_array_value(&arg(args, 0))))
}

fn array_of<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(Value::Object(vm.new_array(args.to_vec())))
}

/// `Array.from(items, mapFn?, thisArg?)` over iterables (arrays, strings,
/// `arguments`) and array-likes.
fn array_from<'gc>(vm: &mut Vm<'gc>, _this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let items = arg(args, 0);
    let map_fn = arg(args, 1);
    if !map_fn.is_undefined() && !map_fn.is_callable() {
        return Err(raise_type_error!("Array.from: when provided, the second argument must be a function").into());
    }
    let values = match &items {
        Value::Undefined | Value::Null => {
            return Err(raise_type_error!(format!("{} is not iterable", crate::core::value_to_display_string(&items))).into());
        }
        Value::String(_) => vm.iterate_values(&items)?,
        Value::Object(o) if matches!(o.borrow().kind, ObjectKind::Array { .. } | ObjectKind::Arguments { .. } | ObjectKind::String(_)) => {
            vm.iterate_values(&items)?
        }
        Value::Object(_) => vm.array_like_values(&items)?,
        _ => Vec::new(),
    };
    let values = if map_fn.is_undefined() {
        values
    } else {
        let this_arg = arg(args, 2);
        let mut mapped = Vec::with_capacity(values.len());
        for (i, v) in values.into_iter().enumerate() {
            mapped.push(vm.call(&map_fn, this_arg.clone(), &[v, Value::from(i)])?);
        }
        mapped
    };
    Ok(Value::Object(vm.new_array(values)))
}

// ------------------------------------------------------------ mutators

fn array_push<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&this)?;
    let len = vm.length_of(&obj)? as f64;
    if len + args.len() as f64 > u32::MAX as f64 {
        return Err(raise_type_error!("Pushing elements past the maximum array length").into());
    }
    for (i, v) in args.iter().enumerate() {
        set_index(vm, &obj, (len as usize + i) as u32, v.clone())?;
    }
    let new_len = len + args.len() as f64;
    set_length(vm, &obj, new_len)?;
    Ok(Value::Number(new_len))
}

fn array_pop<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&this)?;
    let len = vm.length_of(&obj)?;
    if len == 0 {
        set_length(vm, &obj, 0.0)?;
        return Ok(Value::Undefined);
    }
    let last = get_index(vm, &obj, len - 1)?;
    delete_index(vm, &obj, len - 1)?;
    set_length(vm, &obj, (len - 1) as f64)?;
    Ok(last)
}

fn array_shift<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&this)?;
    let len = vm.length_of(&obj)?;
    if len == 0 {
        set_length(vm, &obj, 0.0)?;
        return Ok(Value::Undefined);
    }
    let first = get_index(vm, &obj, 0)?;
    move_elements(vm, &obj, 1, 0, len - 1)?;
    delete_index(vm, &obj, len - 1)?;
    set_length(vm, &obj, (len - 1) as f64)?;
    Ok(first)
}

fn array_unshift<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&this)?;
    let len = vm.length_of(&obj)?;
    let count = args.len() as u32;
    if count > 0 {
        move_elements(vm, &obj, 0, count, len)?;
        for (i, v) in args.iter().enumerate() {
            set_index(vm, &obj, i as u32, v.clone())?;
        }
    }
    let new_len = len as f64 + count as f64;
    set_length(vm, &obj, new_len)?;
    Ok(Value::Number(new_len))
}

/// Moves `count` elements from `from` to `to`, preserving holes.
fn move_elements<'gc>(vm: &mut Vm<'gc>, obj: &JSObjectDataPtr<'gc>, from: u32, to: u32, count: u32) -> Result<(), EvalError<'gc>> {
    let step = |k: u32| if to > from { count - 1 - k } else { k };
    for k in 0..count {
        let k = step(k);
        let (src, dst) = (from + k, to + k);
        if has_index(obj, src) {
            let v = get_index(vm, obj, src)?;
            set_index(vm, obj, dst, v)?;
        } else {
            delete_index(vm, obj, dst)?;
        }
    }
    Ok(())
}

fn array_splice<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&this)?;
    let len = vm.length_of(&obj)?;
    let start = relative_index(vm, &arg(args, 0), len, 0)?;
    let delete_count = match args.len() {
        0 => 0,
        1 => len - start,
        _ => {
            let n = vm.to_integer(&args[1])?;
            n.clamp(0.0, (len - start) as f64) as u32
        }
    };
    let items = args.get(2..).unwrap_or(&[]);
    let mut removed = Vec::with_capacity(delete_count as usize);
    for k in 0..delete_count {
        removed.push(get_index(vm, &obj, start + k)?);
    }
    let item_count = items.len() as u32;
    let tail = len - start - delete_count;
    if item_count < delete_count {
        move_elements(vm, &obj, start + delete_count, start + item_count, tail)?;
        for k in (len - delete_count + item_count..len).rev() {
            delete_index(vm, &obj, k)?;
        }
    } else if item_count > delete_count {
        move_elements(vm, &obj, start + delete_count, start + item_count, tail)?;
    }
    for (k, v) in items.iter().enumerate() {
        set_index(vm, &obj, start + k as u32, v.clone())?;
    }
    set_length(vm, &obj, (len - delete_count + item_count) as f64)?;
    Ok(Value::Object(vm.new_array(removed)))
}

fn array_reverse<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&this)?;
    let len = vm.length_of(&obj)?;
    let mut lower = 0;
    while len > 0 && lower < len / 2 {
        let upper = len - 1 - lower;
        let (has_lower, has_upper) = (has_index(&obj, lower), has_index(&obj, upper));
        let lower_v = get_index(vm, &obj, lower)?;
        let upper_v = get_index(vm, &obj, upper)?;
        match (has_lower, has_upper) {
            (true, true) => {
                set_index(vm, &obj, lower, upper_v)?;
                set_index(vm, &obj, upper, lower_v)?;
            }
            (false, true) => {
                set_index(vm, &obj, lower, upper_v)?;
                delete_index(vm, &obj, upper)?;
            }
            (true, false) => {
                delete_index(vm, &obj, lower)?;
                set_index(vm, &obj, upper, lower_v)?;
            }
            (false, false) => {}
        }
        lower += 1;
    }
    Ok(Value::Object(obj))
}

fn array_fill<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&this)?;
    let len = vm.length_of(&obj)?;
    let start = relative_index(vm, &arg(args, 1), len, 0)?;
    let end = relative_index(vm, &arg(args, 2), len, len)?;
    let value = arg(args, 0);
    for i in start..end {
        set_index(vm, &obj, i, value.clone())?;
    }
    Ok(Value::Object(obj))
}

/// Stable merge sort whose comparator may call back into script code.
fn merge_sort<'gc>(
    vm: &mut Vm<'gc>,
    items: Vec<Value<'gc>>,
    cmp: &mut dyn FnMut(&mut Vm<'gc>, &Value<'gc>, &Value<'gc>) -> Result<Ordering, EvalError<'gc>>,
) -> Result<Vec<Value<'gc>>, EvalError<'gc>> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = merge_sort(vm, left, cmp)?;
    let right = merge_sort(vm, right, cmp)?;
    let mut out = Vec::with_capacity(left.len() + right.len());
    let mut l = left.into_iter().peekable();
    let mut r = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (l.peek(), r.peek()) {
        if cmp(vm, a, b)? == Ordering::Greater {
            out.extend(r.next());
        } else {
            out.extend(l.next());
        }
    }
    out.extend(l);
    out.extend(r);
    Ok(out)
}

fn array_sort<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let comparator = arg(args, 0);
    if !comparator.is_undefined() && !comparator.is_callable() {
        return Err(raise_type_error!("The comparison function must be either a function or undefined").into());
    }
    let obj = vm.to_object(&this)?;
    let len = vm.length_of(&obj)?;
    let mut values = Vec::new();
    let mut undefined_count = 0u32;
    for i in 0..len {
        if has_index(&obj, i) {
            match get_index(vm, &obj, i)? {
                Value::Undefined => undefined_count += 1,
                v => values.push(v),
            }
        }
    }
    let sorted = if comparator.is_undefined() {
        let mut keyed = Vec::with_capacity(values.len());
        for v in values {
            keyed.push((vm.to_string(&v)?, v));
        }
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        keyed.into_iter().map(|(_, v)| v).collect()
    } else {
        let mut cmp = |vm: &mut Vm<'gc>, a: &Value<'gc>, b: &Value<'gc>| -> Result<Ordering, EvalError<'gc>> {
            let r = vm.call(&comparator, Value::Undefined, &[a.clone(), b.clone()])?;
            let n = vm.to_number(&r)?;
            Ok(if n > 0.0 { Ordering::Greater } else { Ordering::Less })
        };
        merge_sort(vm, values, &mut cmp)?
    };
    let sorted_len = sorted.len() as u32;
    for (i, v) in sorted.into_iter().enumerate() {
        set_index(vm, &obj, i as u32, v)?;
    }
    for i in sorted_len..sorted_len + undefined_count {
        set_index(vm, &obj, i, Value::Undefined)?;
    }
    for i in sorted_len + undefined_count..len {
        delete_index(vm, &obj, i)?;
    }
    Ok(Value::Object(obj))
}

// ------------------------------------------------------------ accessors

fn array_slice<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&this)?;
    let len = vm.length_of(&obj)?;
    let start = relative_index(vm, &arg(args, 0), len, 0)?;
    let end = relative_index(vm, &arg(args, 1), len, len)?;
    let out = vm.new_array(Vec::new());
    let mut n = 0;
    for i in start..end.max(start) {
        if has_index(&obj, i) {
            let v = get_index(vm, &obj, i)?;
            vm.create_data_property(&out, PropertyKey::Index(n), v)?;
        }
        n += 1;
    }
    crate::core::set_array_length(vm.mc, &out, n)?;
    Ok(Value::Object(out))
}

fn array_concat<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let first = Value::Object(vm.to_object(&this)?);
    let out = vm.new_array(Vec::new());
    let mut n: u32 = 0;
    for item in std::iter::once(&first).chain(args) {
        match item {
            Value::Object(o) if o.borrow().is_array() => {
                let len = vm.length_of(o)?;
                for i in 0..len {
                    if has_index(o, i) {
                        let v = get_index(vm, o, i)?;
                        vm.create_data_property(&out, PropertyKey::Index(n), v)?;
                    }
                    n += 1;
                }
            }
            v => {
                vm.create_data_property(&out, PropertyKey::Index(n), v.clone())?;
                n += 1;
            }
        }
    }
    crate::core::set_array_length(vm.mc, &out, n)?;
    Ok(Value::Object(out))
}

thread_local! {
    /// Arrays currently being joined; a cyclic reference joins as the empty string.
    static JOINING: std::cell::RefCell<Vec<usize>> = const { std::cell::RefCell::new(Vec::new()) };
}

pub(crate) fn join_values<'gc>(vm: &mut Vm<'gc>, obj: &JSObjectDataPtr<'gc>, separator: &[u16]) -> Result<Vec<u16>, EvalError<'gc>> {
    let addr = gc_arena::Gc::as_ptr(*obj) as usize;
    if JOINING.with(|j| j.borrow().contains(&addr)) {
        return Ok(Vec::new());
    }
    JOINING.with(|j| j.borrow_mut().push(addr));
    let result = join_elements(vm, obj, separator);
    JOINING.with(|j| j.borrow_mut().pop());
    result
}

fn join_elements<'gc>(vm: &mut Vm<'gc>, obj: &JSObjectDataPtr<'gc>, separator: &[u16]) -> Result<Vec<u16>, EvalError<'gc>> {
    let len = vm.length_of(obj)?;
    let mut out = Vec::new();
    for i in 0..len {
        if i > 0 {
            out.extend_from_slice(separator);
        }
        let v = get_index(vm, obj, i)?;
        if !v.is_null_or_undefined() {
            out.extend(vm.to_string(&v)?);
        }
    }
    Ok(out)
}

fn array_join<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&this)?;
    let separator = match arg(args, 0) {
        Value::Undefined => utf8_to_utf16(","),
        v => vm.to_string(&v)?,
    };
    Ok(Value::String(join_values(vm, &obj, &separator)?))
}

fn array_to_string<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, _args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&this)?;
    let join = vm.get(&obj, &PropertyKey::from("join"))?;
    if join.is_callable() {
        return vm.call(&join, Value::Object(obj), &[]);
    }
    Ok(Value::from(format!("[object {}]", obj.borrow().class_name())))
}

fn array_index_of<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&this)?;
    let len = vm.length_of(&obj)?;
    let target = arg(args, 0);
    let start = relative_index(vm, &arg(args, 1), len, 0)?;
    for i in start..len {
        if has_index(&obj, i) && strict_equals(&get_index(vm, &obj, i)?, &target) {
            return Ok(Value::from(i));
        }
    }
    Ok(Value::Number(-1.0))
}

fn array_last_index_of<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&this)?;
    let len = vm.length_of(&obj)?;
    if len == 0 {
        return Ok(Value::Number(-1.0));
    }
    let target = arg(args, 0);
    let from = if args.len() > 1 {
        let n = vm.to_integer(&args[1])?;
        if n < 0.0 { len as f64 + n } else { n.min(len as f64 - 1.0) }
    } else {
        len as f64 - 1.0
    };
    let mut i = from;
    while i >= 0.0 {
        let idx = i as u32;
        if has_index(&obj, idx) && strict_equals(&get_index(vm, &obj, idx)?, &target) {
            return Ok(Value::from(idx));
        }
        i -= 1.0;
    }
    Ok(Value::Number(-1.0))
}

fn array_includes<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let obj = vm.to_object(&this)?;
    let len = vm.length_of(&obj)?;
    let target = arg(args, 0);
    let start = relative_index(vm, &arg(args, 1), len, 0)?;
    for i in start..len {
        if same_value_zero(&get_index(vm, &obj, i)?, &target) {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

// ------------------------------------------------------------ iteration

/// Visits each present element, stopping when `visit` returns `false`.
fn for_each_present<'gc>(
    vm: &mut Vm<'gc>,
    this: &Value<'gc>,
    args: &[Value<'gc>],
    method: &str,
    mut visit: impl FnMut(&mut Vm<'gc>, u32, Value<'gc>, Value<'gc>) -> Result<bool, EvalError<'gc>>,
) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
    let obj = vm.to_object(this)?;
    let len = vm.length_of(&obj)?;
    let f = callback_arg(args, method)?;
    let this_arg = arg(args, 1);
    for i in 0..len {
        if !has_index(&obj, i) {
            continue;
        }
        let v = get_index(vm, &obj, i)?;
        let r = vm.call(&f, this_arg.clone(), &[v.clone(), Value::from(i), Value::Object(obj)])?;
        if !visit(vm, i, v, r)? {
            break;
        }
    }
    Ok(obj)
}

fn array_for_each<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    for_each_present(vm, &this, args, "forEach", |_, _, _, _| Ok(true))?;
    Ok(Value::Undefined)
}

fn array_every<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let mut all = true;
    for_each_present(vm, &this, args, "every", |_, _, _, r| {
        all = r.to_boolean();
        Ok(all)
    })?;
    Ok(Value::Boolean(all))
}

fn array_some<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let mut any = false;
    for_each_present(vm, &this, args, "some", |_, _, _, r| {
        any = r.to_boolean();
        Ok(!any)
    })?;
    Ok(Value::Boolean(any))
}

fn array_map<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let out = vm.new_array(Vec::new());
    let obj = for_each_present(vm, &this, args, "map", |vm, i, _, r| {
        vm.create_data_property(&out, PropertyKey::Index(i), r)?;
        Ok(true)
    })?;
    let len = vm.length_of(&obj)?;
    crate::core::set_array_length(vm.mc, &out, len)?;
    Ok(Value::Object(out))
}

fn array_filter<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    let mut kept = Vec::new();
    for_each_present(vm, &this, args, "filter", |_, _, v, r| {
        if r.to_boolean() {
            kept.push(v);
        }
        Ok(true)
    })?;
    Ok(Value::Object(vm.new_array(kept)))
}

fn find_impl<'gc>(vm: &mut Vm<'gc>, this: &Value<'gc>, args: &[Value<'gc>], method: &str) -> Result<Option<(u32, Value<'gc>)>, EvalError<'gc>> {
    let obj = vm.to_object(this)?;
    let len = vm.length_of(&obj)?;
    let f = callback_arg(args, method)?;
    let this_arg = arg(args, 1);
    for i in 0..len {
        let v = get_index(vm, &obj, i)?;
        let r = vm.call(&f, this_arg.clone(), &[v.clone(), Value::from(i), Value::Object(obj)])?;
        if r.to_boolean() {
            return Ok(Some((i, v)));
        }
    }
    Ok(None)
}

fn array_find<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(find_impl(vm, &this, args, "find")?.map(|(_, v)| v).unwrap_or(Value::Undefined))
}

fn array_find_index<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    Ok(find_impl(vm, &this, args, "findIndex")?
        .map(|(i, _)| Value::from(i))
        .unwrap_or(Value::Number(-1.0)))
}

fn reduce_impl<'gc>(vm: &mut Vm<'gc>, this: &Value<'gc>, args: &[Value<'gc>], right: bool) -> NativeResult<'gc> {
    let method = if right { "reduceRight" } else { "reduce" };
    let obj = vm.to_object(this)?;
    let len = vm.length_of(&obj)?;
    let f = callback_arg(args, method)?;
    let order: Box<dyn Iterator<Item = u32>> = if right { Box::new((0..len).rev()) } else { Box::new(0..len) };
    let mut order = order.filter(|i| has_index(&obj, *i));
    let mut acc = if args.len() > 1 {
        args[1].clone()
    } else {
        match order.next() {
            Some(i) => get_index(vm, &obj, i)?,
            None => return Err(raise_type_error!("Reduce of empty array with no initial value").into()),
        }
    };
    for i in order {
        let v = get_index(vm, &obj, i)?;
        acc = vm.call(&f, Value::Undefined, &[acc, v, Value::from(i), Value::Object(obj)])?;
    }
    Ok(acc)
}

fn array_reduce<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    reduce_impl(vm, &this, args, false)
}

fn array_reduce_right<'gc>(vm: &mut Vm<'gc>, this: Value<'gc>, args: &[Value<'gc>], _nt: Option<JSObjectDataPtr<'gc>>) -> NativeResult<'gc> {
    reduce_impl(vm, &this, args, true)
}
