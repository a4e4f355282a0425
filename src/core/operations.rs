//! Abstract operations of the language: type conversions, property access
//! with accessors and receivers, equality and relational comparison.
//! Everything that may run script code (`valueOf`, getters, setters) is a
//! method on [`Vm`].

use crate::core::number::{number_to_utf16, string_to_number, to_int32, to_integer_or_infinity, to_uint32};
use crate::core::{
    EvalError, JSObjectDataPtr, ObjectKind, Property, PropertyDescriptor, PropertyKey, Value, Vm, define_own_property, get_own_property,
    has_property, new_js_object_with_kind, own_property_keys, strict_equals, value_to_display_string,
};
use crate::unicode::{code_point_at, utf16_to_utf8, utf8_to_utf16};
use crate::{raise_range_error, raise_type_error};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    Number,
    String,
}

/// Argument `i`, or `undefined` when absent.
pub fn arg<'gc>(args: &[Value<'gc>], i: usize) -> Value<'gc> {
    args.get(i).cloned().unwrap_or(Value::Undefined)
}

impl<'gc> Vm<'gc> {
    pub fn to_primitive(&mut self, value: &Value<'gc>, hint: PreferredType) -> Result<Value<'gc>, EvalError<'gc>> {
        let Value::Object(obj) = value else {
            return Ok(value.clone());
        };
        let hint = match hint {
            PreferredType::Default if matches!(obj.borrow().kind, ObjectKind::Date(_)) => PreferredType::String,
            PreferredType::Default => PreferredType::Number,
            other => other,
        };
        let order = if hint == PreferredType::String {
            ["toString", "valueOf"]
        } else {
            ["valueOf", "toString"]
        };
        for name in order {
            let method = self.get(obj, &PropertyKey::from(name))?;
            if method.is_callable() {
                let result = self.call(&method, value.clone(), &[])?;
                if !matches!(result, Value::Object(_)) {
                    return Ok(result);
                }
            }
        }
        Err(raise_type_error!("Cannot convert object to primitive value").into())
    }

    pub fn to_number(&mut self, value: &Value<'gc>) -> Result<f64, EvalError<'gc>> {
        Ok(match value {
            Value::Undefined | Value::Uninitialized => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => *b as u8 as f64,
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::Number)?;
                return self.to_number(&prim);
            }
        })
    }

    pub fn to_integer(&mut self, value: &Value<'gc>) -> Result<f64, EvalError<'gc>> {
        Ok(to_integer_or_infinity(self.to_number(value)?))
    }

    pub fn to_int32(&mut self, value: &Value<'gc>) -> Result<i32, EvalError<'gc>> {
        Ok(to_int32(self.to_number(value)?))
    }

    pub fn to_uint32(&mut self, value: &Value<'gc>) -> Result<u32, EvalError<'gc>> {
        Ok(to_uint32(self.to_number(value)?))
    }

    pub fn to_string(&mut self, value: &Value<'gc>) -> Result<Vec<u16>, EvalError<'gc>> {
        Ok(match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => number_to_utf16(*n),
            Value::Object(_) => {
                let prim = self.to_primitive(value, PreferredType::String)?;
                return self.to_string(&prim);
            }
            other => utf8_to_utf16(&value_to_display_string(other)),
        })
    }

    /// `ToString` decoded to a Rust string.
    pub fn to_rust_string(&mut self, value: &Value<'gc>) -> Result<String, EvalError<'gc>> {
        Ok(utf16_to_utf8(&self.to_string(value)?))
    }

    pub fn to_object(&mut self, value: &Value<'gc>) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
        let (proto, kind) = match value {
            Value::Object(o) => return Ok(*o),
            Value::Undefined | Value::Null | Value::Uninitialized => {
                return Err(raise_type_error!("Cannot convert undefined or null to object").into());
            }
            Value::Boolean(b) => (self.realm.boolean_prototype, ObjectKind::Boolean(*b)),
            Value::Number(n) => (self.realm.number_prototype, ObjectKind::Number(*n)),
            Value::String(s) => (self.realm.string_prototype, ObjectKind::String(s.clone())),
        };
        Ok(new_js_object_with_kind(self.mc, Some(proto), kind))
    }

    pub fn to_property_key(&mut self, value: &Value<'gc>) -> Result<PropertyKey, EvalError<'gc>> {
        match value {
            Value::Number(n) => Ok(PropertyKey::from_number(*n)),
            Value::String(s) => Ok(PropertyKey::from_utf16(s)),
            other => {
                let s = self.to_string(other)?;
                Ok(PropertyKey::from_utf16(&s))
            }
        }
    }

    /// `ToPropertyKey` kept as a value, for keys computed ahead of the access.
    pub(crate) fn property_key_value(&mut self, value: &Value<'gc>) -> Result<Value<'gc>, EvalError<'gc>> {
        match value {
            Value::Number(_) | Value::String(_) => Ok(value.clone()),
            other => Ok(Value::String(self.to_string(other)?)),
        }
    }

    /// LengthOfArrayLike, clamped to the array index range.
    pub fn length_of(&mut self, obj: &JSObjectDataPtr<'gc>) -> Result<u32, EvalError<'gc>> {
        if let Some(len) = obj.borrow().array_length() {
            return Ok(len);
        }
        let len = self.get(obj, &PropertyKey::from("length"))?;
        let n = self.to_integer(&len)?;
        Ok(n.clamp(0.0, u32::MAX as f64) as u32)
    }

    // ------------------------------------------------------------ property access

    pub fn get(&mut self, obj: &JSObjectDataPtr<'gc>, key: &PropertyKey) -> Result<Value<'gc>, EvalError<'gc>> {
        self.get_with_receiver(obj, key, &Value::Object(*obj))
    }

    /// `[[Get]]`: walks the prototype chain and runs getters against `receiver`.
    pub fn get_with_receiver(&mut self, obj: &JSObjectDataPtr<'gc>, key: &PropertyKey, receiver: &Value<'gc>) -> Result<Value<'gc>, EvalError<'gc>> {
        let mut current = Some(*obj);
        while let Some(o) = current {
            match get_own_property(&o, key) {
                Some(Property::Data { value, .. }) => return Ok(value),
                Some(Property::Accessor { get: Some(getter), .. }) => return self.call(&Value::Object(getter), receiver.clone(), &[]),
                Some(Property::Accessor { get: None, .. }) => return Ok(Value::Undefined),
                None => current = o.borrow().prototype,
            }
        }
        Ok(Value::Undefined)
    }

    /// Property read on any value; primitives use their wrapper prototypes.
    pub fn get_value(&mut self, base: &Value<'gc>, key: &PropertyKey) -> Result<Value<'gc>, EvalError<'gc>> {
        let proto = match base {
            Value::Object(o) => return self.get(o, key),
            Value::String(s) => {
                if key.is_str("length") {
                    return Ok(Value::from(s.len()));
                }
                if let PropertyKey::Index(i) = key
                    && let Some(c) = s.get(*i as usize)
                {
                    return Ok(Value::String(vec![*c]));
                }
                self.realm.string_prototype
            }
            Value::Number(_) => self.realm.number_prototype,
            Value::Boolean(_) => self.realm.boolean_prototype,
            Value::Undefined | Value::Null | Value::Uninitialized => {
                return Err(raise_type_error!(format!(
                    "Cannot read properties of {} (reading '{key}')",
                    value_to_display_string(base)
                ))
                .into());
            }
        };
        self.get_with_receiver(&proto, key, base)
    }

    /// `[[Set]]` (OrdinarySet). Returns `false` when the assignment is rejected.
    pub fn set(&mut self, obj: &JSObjectDataPtr<'gc>, key: PropertyKey, value: Value<'gc>, receiver: &Value<'gc>) -> Result<bool, EvalError<'gc>> {
        let mut current = Some(*obj);
        let mut found = None;
        while let Some(o) = current {
            if let Some(p) = get_own_property(&o, &key) {
                found = Some(p);
                break;
            }
            current = o.borrow().prototype;
        }
        match found {
            Some(Property::Accessor { set: Some(setter), .. }) => {
                self.call(&Value::Object(setter), receiver.clone(), &[value])?;
                Ok(true)
            }
            Some(Property::Accessor { set: None, .. }) | Some(Property::Data { writable: false, .. }) => Ok(false),
            _ => {
                let Value::Object(target) = receiver else {
                    return Ok(false);
                };
                let desc = match get_own_property(target, &key) {
                    Some(Property::Accessor { .. }) | Some(Property::Data { writable: false, .. }) => return Ok(false),
                    Some(Property::Data { .. }) => PropertyDescriptor {
                        value: Some(value),
                        ..PropertyDescriptor::default()
                    },
                    None => PropertyDescriptor::from_property(&Property::data(value)),
                };
                self.define_own_property(target, key, desc)
            }
        }
    }

    /// Assignment `base[key] = value`, throwing in strict code when rejected.
    pub fn put_value(&mut self, base: &Value<'gc>, key: PropertyKey, value: Value<'gc>, strict: bool) -> Result<(), EvalError<'gc>> {
        let ok = match base {
            Value::Object(o) => self.set(o, key.clone(), value, base)?,
            Value::Undefined | Value::Null | Value::Uninitialized => {
                return Err(raise_type_error!(format!(
                    "Cannot set properties of {} (setting '{key}')",
                    value_to_display_string(base)
                ))
                .into());
            }
            primitive => {
                let wrapper = self.to_object(primitive)?;
                self.set(&wrapper, key.clone(), value, base)?
            }
        };
        if !ok && strict {
            let message = match base {
                Value::Object(_) => format!("Cannot assign to read only property '{key}' of object"),
                other => format!("Cannot create property '{key}' on {} '{}'", other.type_of(), value_to_display_string(other)),
            };
            return Err(raise_type_error!(message).into());
        }
        Ok(())
    }

    /// CreateDataProperty; `false` when the object rejects the definition.
    pub fn create_data_property(&mut self, obj: &JSObjectDataPtr<'gc>, key: PropertyKey, value: Value<'gc>) -> Result<bool, EvalError<'gc>> {
        let desc = PropertyDescriptor::from_property(&Property::data(value));
        self.define_own_property(obj, key, desc)
    }

    /// `[[DefineOwnProperty]]`. A new array `length` goes through ToUint32 and
    /// ToNumber first, which may call its `valueOf`.
    pub fn define_own_property(
        &mut self,
        obj: &JSObjectDataPtr<'gc>,
        key: PropertyKey,
        mut desc: PropertyDescriptor<'gc>,
    ) -> Result<bool, EvalError<'gc>> {
        let array_length = key.is_str("length") && obj.borrow().is_array();
        if array_length && let Some(value @ Value::Object(_)) = &desc.value {
            let value = value.clone();
            let len = to_uint32(self.to_number(&value)?);
            if len as f64 != self.to_number(&value)? {
                return Err(raise_range_error!("Invalid array length").into());
            }
            desc.value = Some(Value::Number(len as f64));
        }
        Ok(define_own_property(self.mc, obj, key, &desc)?)
    }

    /// Calls `base[name](...args)`.
    pub fn invoke(&mut self, base: &Value<'gc>, name: &str, args: &[Value<'gc>]) -> Result<Value<'gc>, EvalError<'gc>> {
        let method = self.get_value(base, &PropertyKey::from(name))?;
        if !method.is_callable() {
            return Err(raise_type_error!(format!("{name} is not a function")).into());
        }
        self.call(&method, base.clone(), args)
    }

    /// The `prototype` of `new_target`, or `default` when it is not an object.
    pub fn prototype_from_constructor(
        &mut self,
        new_target: Option<JSObjectDataPtr<'gc>>,
        default: JSObjectDataPtr<'gc>,
    ) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
        let Some(ctor) = new_target else {
            return Ok(default);
        };
        match self.get(&ctor, &PropertyKey::from("prototype"))? {
            Value::Object(p) => Ok(p),
            _ => Ok(default),
        }
    }

    // ------------------------------------------------------------ operators

    /// Abstract equality (`==`).
    pub fn loose_equals(&mut self, a: &Value<'gc>, b: &Value<'gc>) -> Result<bool, EvalError<'gc>> {
        Ok(match (a, b) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
            (Value::Number(x), Value::String(s)) => *x == string_to_number(s),
            (Value::String(s), Value::Number(y)) => string_to_number(s) == *y,
            (Value::Boolean(x), _) => return self.loose_equals(&Value::Number(*x as u8 as f64), b),
            (_, Value::Boolean(y)) => return self.loose_equals(a, &Value::Number(*y as u8 as f64)),
            (Value::Object(_), Value::Number(_) | Value::String(_)) => {
                let pa = self.to_primitive(a, PreferredType::Default)?;
                return self.loose_equals(&pa, b);
            }
            (Value::Number(_) | Value::String(_), Value::Object(_)) => {
                let pb = self.to_primitive(b, PreferredType::Default)?;
                return self.loose_equals(a, &pb);
            }
            _ => strict_equals(a, b),
        })
    }

    /// Abstract relational comparison `a < b`; `None` when a NaN is involved.
    pub fn less_than(&mut self, a: &Value<'gc>, b: &Value<'gc>, left_first: bool) -> Result<Option<bool>, EvalError<'gc>> {
        let (pa, pb) = if left_first {
            let pa = self.to_primitive(a, PreferredType::Number)?;
            (pa, self.to_primitive(b, PreferredType::Number)?)
        } else {
            let pb = self.to_primitive(b, PreferredType::Number)?;
            (self.to_primitive(a, PreferredType::Number)?, pb)
        };
        if let (Value::String(x), Value::String(y)) = (&pa, &pb) {
            return Ok(Some(x < y));
        }
        let x = self.to_number(&pa)?;
        let y = self.to_number(&pb)?;
        if x.is_nan() || y.is_nan() {
            return Ok(None);
        }
        Ok(Some(x < y))
    }

    /// The `+` operator.
    pub fn add_values(&mut self, a: &Value<'gc>, b: &Value<'gc>) -> Result<Value<'gc>, EvalError<'gc>> {
        if let (Value::Number(x), Value::Number(y)) = (a, b) {
            return Ok(Value::Number(x + y));
        }
        let pa = self.to_primitive(a, PreferredType::Default)?;
        let pb = self.to_primitive(b, PreferredType::Default)?;
        if matches!(pa, Value::String(_)) || matches!(pb, Value::String(_)) {
            let mut s = self.to_string(&pa)?;
            s.extend(self.to_string(&pb)?);
            return Ok(Value::String(s));
        }
        Ok(Value::Number(self.to_number(&pa)? + self.to_number(&pb)?))
    }

    /// `value instanceof target`.
    pub fn instance_of(&mut self, value: &Value<'gc>, target: &Value<'gc>) -> Result<bool, EvalError<'gc>> {
        let Value::Object(ctor) = target else {
            return Err(raise_type_error!("Right-hand side of 'instanceof' is not an object").into());
        };
        if !ctor.borrow().is_callable() {
            return Err(raise_type_error!("Right-hand side of 'instanceof' is not callable").into());
        }
        let bound_target = match &ctor.borrow().kind {
            ObjectKind::Bound { target, .. } => Some(*target),
            _ => None,
        };
        if let Some(t) = bound_target {
            return self.instance_of(value, &Value::Object(t));
        }
        let Value::Object(obj) = value else {
            return Ok(false);
        };
        let proto = match self.get(ctor, &PropertyKey::from("prototype"))? {
            Value::Object(p) => p,
            other => {
                return Err(raise_type_error!(format!(
                    "Function has non-object prototype '{}' in instanceof check",
                    value_to_display_string(&other)
                ))
                .into());
            }
        };
        let mut current = obj.borrow().prototype;
        while let Some(p) = current {
            if gc_arena::Gc::ptr_eq(p, proto) {
                return Ok(true);
            }
            current = p.borrow().prototype;
        }
        Ok(false)
    }

    /// `key in obj`.
    pub fn has_property_value(&mut self, key: &Value<'gc>, obj: &Value<'gc>) -> Result<bool, EvalError<'gc>> {
        let Value::Object(o) = obj else {
            return Err(raise_type_error!(format!(
                "Cannot use 'in' operator to search for '{}' in {}",
                value_to_display_string(key),
                value_to_display_string(obj)
            ))
            .into());
        };
        let key = self.to_property_key(key)?;
        Ok(has_property(o, &key))
    }

    // ------------------------------------------------------------ arrays and iteration

    /// Allocates an array holding `values`.
    pub fn new_array(&self, values: Vec<Value<'gc>>) -> JSObjectDataPtr<'gc> {
        let arr = new_js_object_with_kind(
            self.mc,
            Some(self.realm.array_prototype),
            ObjectKind::Array {
                length: values.len() as u32,
                length_writable: true,
            },
        );
        {
            let mut a = arr.borrow_mut(self.mc);
            for (i, v) in values.into_iter().enumerate() {
                a.properties.insert(PropertyKey::Index(i as u32), Property::data(v));
            }
        }
        arr
    }

    /// Appends `value` at `length`.
    pub fn array_push(&mut self, arr: &JSObjectDataPtr<'gc>, value: Value<'gc>) -> Result<(), EvalError<'gc>> {
        let len = self.length_of(arr)?;
        if len == u32::MAX - 1 {
            return Err(raise_range_error!("Invalid array length").into());
        }
        self.create_data_property(arr, PropertyKey::Index(len), value)?;
        Ok(())
    }

    /// Element values of an array-like object (`apply`, `Array.from`).
    pub fn array_like_values(&mut self, value: &Value<'gc>) -> Result<Vec<Value<'gc>>, EvalError<'gc>> {
        match value {
            Value::Undefined | Value::Null => Ok(Vec::new()),
            Value::Object(obj) => {
                let len = self.length_of(obj)?;
                let mut out = Vec::with_capacity(len.min(1 << 16) as usize);
                for i in 0..len {
                    out.push(self.get(obj, &PropertyKey::Index(i))?);
                }
                Ok(out)
            }
            _ => Err(raise_type_error!("CreateListFromArrayLike called on non-object").into()),
        }
    }

    /// Values produced by iterating `value` (spread, `for-of`, destructuring).
    /// Arrays, `arguments` objects and strings are iterable.
    pub fn iterate_values(&mut self, value: &Value<'gc>) -> Result<Vec<Value<'gc>>, EvalError<'gc>> {
        let iter = self.create_list_iterator(value)?;
        let mut out = Vec::new();
        while let Some(v) = self.iterator_next(&iter)? {
            out.push(v);
        }
        Ok(out)
    }

    pub(crate) fn create_list_iterator(&mut self, value: &Value<'gc>) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
        let iterable = match value {
            Value::String(_) => true,
            Value::Object(o) => matches!(
                o.borrow().kind,
                ObjectKind::Array { .. } | ObjectKind::Arguments { .. } | ObjectKind::String(_)
            ),
            _ => false,
        };
        if !iterable {
            let what = match value {
                Value::Object(_) => "object".to_string(),
                other => value_to_display_string(other),
            };
            return Err(raise_type_error!(format!("{what} is not iterable")).into());
        }
        Ok(new_js_object_with_kind(
            self.mc,
            None,
            ObjectKind::ListIterator {
                target: value.clone(),
                index: 0,
                done: false,
            },
        ))
    }

    pub(crate) fn create_for_in_iterator(&mut self, value: &Value<'gc>) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
        let object = match value {
            Value::Undefined | Value::Null => None,
            other => Some(self.to_object(other)?),
        };
        let mut keys = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut current = object;
        while let Some(o) = current {
            for key in own_property_keys(&o) {
                if !seen.insert(key.clone()) {
                    continue;
                }
                if get_own_property(&o, &key).is_some_and(|p| p.enumerable()) {
                    keys.push(key);
                }
            }
            current = o.borrow().prototype;
        }
        Ok(new_js_object_with_kind(self.mc, None, ObjectKind::ForInIterator { object, keys, index: 0 }))
    }

    /// Advances a for-in or list iterator.
    pub(crate) fn iterator_next(&mut self, iter: &JSObjectDataPtr<'gc>) -> Result<Option<Value<'gc>>, EvalError<'gc>> {
        enum Step<'gc> {
            Key(Option<JSObjectDataPtr<'gc>>, PropertyKey),
            Element(JSObjectDataPtr<'gc>, u32),
            Text(Vec<u16>, u32),
            Done,
        }
        loop {
            let step = {
                let mut it = iter.borrow_mut(self.mc);
                match &mut it.kind {
                    ObjectKind::ForInIterator { object, keys, index } => match keys.get(*index) {
                        Some(k) => {
                            *index += 1;
                            Step::Key(*object, k.clone())
                        }
                        None => Step::Done,
                    },
                    ObjectKind::ListIterator { target, index, done } => {
                        if *done {
                            Step::Done
                        } else {
                            let i = *index;
                            match target {
                                Value::String(s) => Step::Text(s.clone(), i),
                                Value::Object(o) => match &o.borrow().kind {
                                    ObjectKind::String(s) => Step::Text(s.clone(), i),
                                    _ => Step::Element(*o, i),
                                },
                                _ => Step::Done,
                            }
                        }
                    }
                    _ => Step::Done,
                }
            };
            return match step {
                Step::Done => Ok(None),
                Step::Key(object, key) => {
                    // Keys deleted during the loop are skipped.
                    if let Some(o) = object
                        && !has_property(&o, &key)
                    {
                        continue;
                    }
                    Ok(Some(Value::String(key.to_utf16())))
                }
                Step::Element(obj, i) => {
                    let len = self.length_of(&obj)?;
                    if i >= len {
                        self.finish_list_iterator(iter, i);
                        return Ok(None);
                    }
                    let v = self.get(&obj, &PropertyKey::Index(i))?;
                    self.advance_list_iterator(iter, i + 1);
                    Ok(Some(v))
                }
                Step::Text(s, i) => {
                    if i as usize >= s.len() {
                        self.finish_list_iterator(iter, i);
                        return Ok(None);
                    }
                    let cp = code_point_at(&s, i as usize).unwrap_or(0);
                    let width = if cp > 0xFFFF { 2 } else { 1 };
                    self.advance_list_iterator(iter, i + width);
                    Ok(Some(Value::String(s[i as usize..(i + width) as usize].to_vec())))
                }
            };
        }
    }

    fn advance_list_iterator(&self, iter: &JSObjectDataPtr<'gc>, next: u32) {
        if let ObjectKind::ListIterator { index, .. } = &mut iter.borrow_mut(self.mc).kind {
            *index = next;
        }
    }

    fn finish_list_iterator(&self, iter: &JSObjectDataPtr<'gc>, at: u32) {
        if let ObjectKind::ListIterator { index, done, .. } = &mut iter.borrow_mut(self.mc).kind {
            *index = at;
            *done = true;
        }
    }

    /// Own enumerable `(key, value)` pairs, in property order.
    pub fn enumerable_own_entries(&mut self, obj: &JSObjectDataPtr<'gc>) -> Result<Vec<(PropertyKey, Value<'gc>)>, EvalError<'gc>> {
        let mut out = Vec::new();
        for key in own_property_keys(obj) {
            if get_own_property(obj, &key).is_some_and(|p| p.enumerable()) {
                let v = self.get(obj, &key)?;
                out.push((key, v));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{VmOptions, new_js_arena};

    fn with_vm(f: impl for<'gc> FnOnce(&mut Vm<'gc>)) {
        let arena = new_js_arena().unwrap();
        arena.mutate(|mc, root| {
            let mut vm = Vm::new(mc, &root.realm, VmOptions::default());
            f(&mut vm);
        });
    }

    #[test]
    fn loose_equality_coerces() {
        with_vm(|vm| {
            assert!(vm.loose_equals(&Value::from("1"), &Value::Number(1.0)).unwrap());
            assert!(vm.loose_equals(&Value::Null, &Value::Undefined).unwrap());
            assert!(!vm.loose_equals(&Value::Null, &Value::Number(0.0)).unwrap());
            assert!(vm.loose_equals(&Value::Boolean(true), &Value::from("1")).unwrap());
            assert!(!vm.loose_equals(&Value::Number(f64::NAN), &Value::Number(f64::NAN)).unwrap());
        });
    }

    #[test]
    fn relational_comparison_uses_code_units_for_strings() {
        with_vm(|vm| {
            assert_eq!(vm.less_than(&Value::from("a"), &Value::from("b"), true).unwrap(), Some(true));
            assert_eq!(vm.less_than(&Value::from("10"), &Value::from("9"), true).unwrap(), Some(true));
            assert_eq!(vm.less_than(&Value::from("10"), &Value::Number(9.0), true).unwrap(), Some(false));
            assert_eq!(vm.less_than(&Value::Number(f64::NAN), &Value::Number(1.0), true).unwrap(), None);
        });
    }

    #[test]
    fn number_conversions() {
        with_vm(|vm| {
            assert_eq!(vm.to_number(&Value::from("  42  ")).unwrap(), 42.0);
            assert!(vm.to_number(&Value::Undefined).unwrap().is_nan());
            assert_eq!(vm.to_number(&Value::Null).unwrap(), 0.0);
            assert_eq!(vm.to_rust_string(&Value::Number(1e21)).unwrap(), "1e+21");
            assert_eq!(vm.to_int32(&Value::Number(4294967297.0)).unwrap(), 1);
        });
    }

    #[test]
    fn string_values_expose_index_and_length() {
        with_vm(|vm| {
            let s = Value::from("abc");
            let v = vm.get_value(&s, &PropertyKey::Index(1)).unwrap();
            assert_eq!(vm.to_rust_string(&v).unwrap(), "b");
            let v = vm.get_value(&s, &"length".into()).unwrap();
            assert_eq!(vm.to_number(&v).unwrap(), 3.0);
            assert!(vm.get_value(&Value::Undefined, &"x".into()).is_err());
        });
    }
}
