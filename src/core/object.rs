use crate::core::{
    Collect, EnvPtr, EvalError, FunctionCode, GcTrace, JSObjectDataPtr, MutationContext, PropertyDescriptor, PropertyKey, Value,
    Vm, new_gc_cell_ptr, same_value,
};
use crate::error::JSError;
use crate::raise_range_error;
use indexmap::IndexMap;
use std::rc::Rc;

/// Calling convention shared by every built-in: `(vm, this, args, new_target)`.
/// `new_target` is `Some` when invoked through `[[Construct]]`.
pub type NativeFn =
    for<'gc> fn(&mut Vm<'gc>, Value<'gc>, &[Value<'gc>], Option<JSObjectDataPtr<'gc>>) -> Result<Value<'gc>, EvalError<'gc>>;

#[derive(Collect)]
#[collect(require_static)]
pub struct NativeFunction {
    pub name: String,
    pub func: NativeFn,
    pub constructor: bool,
}

/// A compiled function paired with the environment it closes over.
pub struct Closure<'gc> {
    pub code: Rc<FunctionCode>,
    pub env: Option<EnvPtr<'gc>>,
    /// Object whose prototype `super` refers to.
    pub home_object: Option<JSObjectDataPtr<'gc>>,
}

#[derive(Collect)]
#[collect(require_static)]
pub struct RegExpData {
    pub source: Vec<u16>,
    pub flags: String,
    pub regex: regress::Regex,
}

pub enum ObjectKind<'gc> {
    Ordinary,
    Array {
        length: u32,
        length_writable: bool,
    },
    Function(Closure<'gc>),
    Native(NativeFunction),
    /// Index into the engine's host function table.
    Host(usize),
    Bound {
        target: JSObjectDataPtr<'gc>,
        this: Value<'gc>,
        args: Vec<Value<'gc>>,
    },
    /// `mapped[i]` is the parameter's slot in `env` while index `i` still aliases it.
    Arguments {
        env: Option<EnvPtr<'gc>>,
        mapped: Vec<Option<u32>>,
    },
    Error,
    Boolean(bool),
    Number(f64),
    String(Vec<u16>),
    Date(f64),
    RegExp(Box<RegExpData>),
    ForInIterator {
        object: Option<JSObjectDataPtr<'gc>>,
        keys: Vec<PropertyKey>,
        index: usize,
    },
    /// Iteration over arrays, arguments objects and strings (by code point).
    ListIterator {
        target: Value<'gc>,
        index: u32,
        done: bool,
    },
}

unsafe impl<'gc> Collect<'gc> for ObjectKind<'gc> {
    fn trace<T: GcTrace<'gc>>(&self, cc: &mut T) {
        match self {
            ObjectKind::Function(c) => {
                if let Some(env) = &c.env {
                    env.trace(cc);
                }
                if let Some(home) = &c.home_object {
                    home.trace(cc);
                }
            }
            ObjectKind::Bound { target, this, args } => {
                target.trace(cc);
                this.trace(cc);
                args.trace(cc);
            }
            ObjectKind::Arguments { env, .. } => {
                if let Some(env) = env {
                    env.trace(cc);
                }
            }
            ObjectKind::ForInIterator { object, .. } => {
                if let Some(o) = object {
                    o.trace(cc);
                }
            }
            ObjectKind::ListIterator { target, .. } => target.trace(cc),
            _ => {}
        }
    }
}

#[derive(Clone, Collect)]
#[collect(no_drop)]
pub enum Property<'gc> {
    Data {
        value: Value<'gc>,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        get: Option<JSObjectDataPtr<'gc>>,
        set: Option<JSObjectDataPtr<'gc>>,
        enumerable: bool,
        configurable: bool,
    },
}

impl<'gc> Property<'gc> {
    /// Writable, enumerable, configurable data property.
    pub fn data(value: Value<'gc>) -> Self {
        Property::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Writable, configurable, non-enumerable data property (built-in methods).
    pub fn hidden(value: Value<'gc>) -> Self {
        Property::Data {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    /// Read-only, non-enumerable, non-configurable data property (built-in constants).
    pub fn constant(value: Value<'gc>) -> Self {
        Property::Data {
            value,
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }

    pub fn enumerable(&self) -> bool {
        match self {
            Property::Data { enumerable, .. } | Property::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub fn configurable(&self) -> bool {
        match self {
            Property::Data { configurable, .. } | Property::Accessor { configurable, .. } => *configurable,
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self, Property::Accessor { .. })
    }
}

pub struct JSObjectData<'gc> {
    pub properties: IndexMap<PropertyKey, Property<'gc>>,
    pub prototype: Option<JSObjectDataPtr<'gc>>,
    pub extensible: bool,
    pub kind: ObjectKind<'gc>,
}

unsafe impl<'gc> Collect<'gc> for JSObjectData<'gc> {
    fn trace<T: GcTrace<'gc>>(&self, cc: &mut T) {
        for v in self.properties.values() {
            v.trace(cc);
        }
        if let Some(p) = &self.prototype {
            p.trace(cc);
        }
        self.kind.trace(cc);
    }
}

impl<'gc> JSObjectData<'gc> {
    pub fn new(prototype: Option<JSObjectDataPtr<'gc>>, kind: ObjectKind<'gc>) -> Self {
        JSObjectData {
            properties: IndexMap::new(),
            prototype,
            extensible: true,
            kind,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self.kind,
            ObjectKind::Function(_) | ObjectKind::Native(_) | ObjectKind::Host(_) | ObjectKind::Bound { .. }
        )
    }

    pub fn is_constructor(&self) -> bool {
        match &self.kind {
            ObjectKind::Function(c) => c.code.is_constructor(),
            ObjectKind::Native(n) => n.constructor,
            ObjectKind::Bound { target, .. } => target.borrow().is_constructor(),
            _ => false,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, ObjectKind::Error)
    }

    /// `[[Class]]`-style tag used by `Object.prototype.toString`.
    pub fn class_name(&self) -> &'static str {
        match &self.kind {
            ObjectKind::Array { .. } => "Array",
            ObjectKind::Function(_) | ObjectKind::Native(_) | ObjectKind::Host(_) | ObjectKind::Bound { .. } => "Function",
            ObjectKind::Arguments { .. } => "Arguments",
            ObjectKind::Error => "Error",
            ObjectKind::Boolean(_) => "Boolean",
            ObjectKind::Number(_) => "Number",
            ObjectKind::String(_) => "String",
            ObjectKind::Date(_) => "Date",
            ObjectKind::RegExp(_) => "RegExp",
            _ => "Object",
        }
    }

    pub fn array_length(&self) -> Option<u32> {
        match self.kind {
            ObjectKind::Array { length, .. } => Some(length),
            _ => None,
        }
    }

    /// Own data value without running accessors or exotic lookups.
    pub fn own_data_value(&self, key: &PropertyKey) -> Option<Value<'gc>> {
        match self.properties.get(key) {
            Some(Property::Data { value, .. }) => Some(value.clone()),
            _ => None,
        }
    }

    /// Data value along the prototype chain, ignoring accessors.
    pub fn lookup_data_value(&self, key: &PropertyKey) -> Option<Value<'gc>> {
        if let Some(p) = self.properties.get(key) {
            return match p {
                Property::Data { value, .. } => Some(value.clone()),
                Property::Accessor { .. } => None,
            };
        }
        let mut proto = self.prototype;
        while let Some(p) = proto {
            let obj = p.borrow();
            if let Some(prop) = obj.properties.get(key) {
                return match prop {
                    Property::Data { value, .. } => Some(value.clone()),
                    Property::Accessor { .. } => None,
                };
            }
            proto = obj.prototype;
        }
        None
    }

    pub fn set_non_enumerable(&mut self, key: impl Into<PropertyKey>) {
        let key = key.into();
        log::trace!("set_non_enumerable: obj_ptr={:p} key={key}", self as *const _);
        if let Some(Property::Data { enumerable, .. } | Property::Accessor { enumerable, .. }) = self.properties.get_mut(&key) {
            *enumerable = false;
        }
    }

    pub fn insert(&mut self, key: impl Into<PropertyKey>, prop: Property<'gc>) {
        self.properties.insert(key.into(), prop);
    }
}

#[inline]
pub fn new_js_object<'gc>(mc: &MutationContext<'gc>, prototype: Option<JSObjectDataPtr<'gc>>) -> JSObjectDataPtr<'gc> {
    new_gc_cell_ptr(mc, JSObjectData::new(prototype, ObjectKind::Ordinary))
}

#[inline]
pub fn new_js_object_with_kind<'gc>(
    mc: &MutationContext<'gc>,
    prototype: Option<JSObjectDataPtr<'gc>>,
    kind: ObjectKind<'gc>,
) -> JSObjectDataPtr<'gc> {
    new_gc_cell_ptr(mc, JSObjectData::new(prototype, kind))
}

/// Creates (or overwrites) a plain writable/enumerable/configurable own data property.
pub fn object_set_key_value<'gc>(mc: &MutationContext<'gc>, obj: &JSObjectDataPtr<'gc>, key: impl Into<PropertyKey>, value: Value<'gc>) {
    let key = key.into();
    let is_array = obj.borrow().is_array();
    if is_array {
        let desc = PropertyDescriptor::from_property(&Property::data(value));
        if let Err(e) = define_own_property(mc, obj, key, &desc) {
            log::debug!("object_set_key_value on array failed: {e}");
        }
    } else {
        obj.borrow_mut(mc).properties.insert(key, Property::data(value));
    }
}

/// Own data value of `obj[key]`, without running accessors.
pub fn object_get_key_value<'gc>(obj: &JSObjectDataPtr<'gc>, key: impl Into<PropertyKey>) -> Option<Value<'gc>> {
    let key = key.into();
    get_own_property(obj, &key).and_then(|p| match p {
        Property::Data { value, .. } => Some(value),
        Property::Accessor { .. } => None,
    })
}

/// Defines a non-enumerable built-in data property.
pub fn define_hidden<'gc>(mc: &MutationContext<'gc>, obj: &JSObjectDataPtr<'gc>, key: impl Into<PropertyKey>, value: Value<'gc>) {
    obj.borrow_mut(mc).properties.insert(key.into(), Property::hidden(value));
}

fn env_slot_value<'gc>(env: &Option<EnvPtr<'gc>>, slot: u32) -> Option<Value<'gc>> {
    env.as_ref().and_then(|e| e.borrow().slots.get(slot as usize).cloned())
}

/// `[[GetOwnProperty]]`, including the synthesized properties of exotic objects.
pub fn get_own_property<'gc>(obj: &JSObjectDataPtr<'gc>, key: &PropertyKey) -> Option<Property<'gc>> {
    let o = obj.borrow();
    match &o.kind {
        ObjectKind::Array { length, length_writable } if key.is_str("length") => {
            return Some(Property::Data {
                value: Value::Number(*length as f64),
                writable: *length_writable,
                enumerable: false,
                configurable: false,
            });
        }
        ObjectKind::String(s) => {
            if key.is_str("length") {
                return Some(Property::Data {
                    value: Value::Number(s.len() as f64),
                    writable: false,
                    enumerable: false,
                    configurable: false,
                });
            }
            if let PropertyKey::Index(i) = key
                && (*i as usize) < s.len()
            {
                return Some(Property::Data {
                    value: Value::String(vec![s[*i as usize]]),
                    writable: false,
                    enumerable: true,
                    configurable: false,
                });
            }
        }
        ObjectKind::Arguments { env, mapped } => {
            if let PropertyKey::Index(i) = key
                && let Some(Some(slot)) = mapped.get(*i as usize)
                && let Some(Property::Data {
                    writable,
                    enumerable,
                    configurable,
                    ..
                }) = o.properties.get(key)
                && let Some(value) = env_slot_value(env, *slot)
            {
                return Some(Property::Data {
                    value,
                    writable: *writable,
                    enumerable: *enumerable,
                    configurable: *configurable,
                });
            }
        }
        _ => {}
    }
    o.properties.get(key).cloned()
}

/// ValidateAndApplyPropertyDescriptor: the property to store, or `None` when the change is rejected.
fn validate_and_apply<'gc>(current: Option<&Property<'gc>>, extensible: bool, desc: &PropertyDescriptor<'gc>) -> Option<Property<'gc>> {
    let Some(current) = current else {
        if !extensible {
            return None;
        }
        return Some(desc.to_property());
    };
    if !current.configurable() {
        if desc.configurable == Some(true) {
            return None;
        }
        if desc.enumerable.is_some_and(|e| e != current.enumerable()) {
            return None;
        }
        if !desc.is_generic() && desc.is_accessor() != current.is_accessor() {
            return None;
        }
        match current {
            Property::Accessor { get, set, .. } => {
                if let Some(g) = &desc.get
                    && !same_function(g, get)
                {
                    return None;
                }
                if let Some(s) = &desc.set
                    && !same_function(s, set)
                {
                    return None;
                }
            }
            Property::Data { value, writable, .. } => {
                if !*writable {
                    if desc.writable == Some(true) {
                        return None;
                    }
                    if let Some(v) = &desc.value
                        && !same_value(v, value)
                    {
                        return None;
                    }
                }
            }
        }
    }
    let enumerable = desc.enumerable.unwrap_or(current.enumerable());
    let configurable = desc.configurable.unwrap_or(current.configurable());
    Some(match current {
        Property::Data { value, writable, .. } => {
            if desc.is_accessor() {
                Property::Accessor {
                    get: desc.get.flatten(),
                    set: desc.set.flatten(),
                    enumerable,
                    configurable,
                }
            } else {
                Property::Data {
                    value: desc.value.clone().unwrap_or_else(|| value.clone()),
                    writable: desc.writable.unwrap_or(*writable),
                    enumerable,
                    configurable,
                }
            }
        }
        Property::Accessor { get, set, .. } => {
            if desc.is_data() {
                Property::Data {
                    value: desc.value.clone().unwrap_or(Value::Undefined),
                    writable: desc.writable.unwrap_or(false),
                    enumerable,
                    configurable,
                }
            } else {
                Property::Accessor {
                    get: desc.get.unwrap_or(*get),
                    set: desc.set.unwrap_or(*set),
                    enumerable,
                    configurable,
                }
            }
        }
    })
}

fn same_function<'gc>(a: &Option<JSObjectDataPtr<'gc>>, b: &Option<JSObjectDataPtr<'gc>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => gc_arena::Gc::ptr_eq(*x, *y),
        _ => false,
    }
}

fn ordinary_define_own_property<'gc>(
    mc: &MutationContext<'gc>,
    obj: &JSObjectDataPtr<'gc>,
    key: PropertyKey,
    desc: &PropertyDescriptor<'gc>,
) -> bool {
    let current = get_own_property(obj, &key);
    let extensible = obj.borrow().extensible;
    match validate_and_apply(current.as_ref(), extensible, desc) {
        Some(prop) => {
            obj.borrow_mut(mc).properties.insert(key, prop);
            true
        }
        None => false,
    }
}

/// `[[DefineOwnProperty]]`. Returns `Ok(false)` when the definition is rejected;
/// `Err` only for an invalid array length.
pub fn define_own_property<'gc>(
    mc: &MutationContext<'gc>,
    obj: &JSObjectDataPtr<'gc>,
    key: PropertyKey,
    desc: &PropertyDescriptor<'gc>,
) -> Result<bool, JSError> {
    enum Exotic {
        Array(u32, bool),
        Arguments(Option<u32>),
        String(usize),
        None,
    }
    let exotic = match &obj.borrow().kind {
        ObjectKind::Array { length, length_writable } => Exotic::Array(*length, *length_writable),
        ObjectKind::Arguments { mapped, .. } => Exotic::Arguments(key.as_index().and_then(|i| mapped.get(i as usize).copied().flatten())),
        ObjectKind::String(s) => Exotic::String(s.len()),
        _ => Exotic::None,
    };
    match exotic {
        Exotic::Array(length, length_writable) => {
            if key.is_str("length") {
                return array_set_length(mc, obj, length, length_writable, desc);
            }
            if let PropertyKey::Index(index) = key {
                if index >= length && !length_writable {
                    return Ok(false);
                }
                if !ordinary_define_own_property(mc, obj, key, desc) {
                    return Ok(false);
                }
                if index >= length
                    && let ObjectKind::Array { length, .. } = &mut obj.borrow_mut(mc).kind
                {
                    *length = index + 1;
                }
                return Ok(true);
            }
            Ok(ordinary_define_own_property(mc, obj, key, desc))
        }
        Exotic::Arguments(Some(slot)) => {
            let mut desc = desc.clone();
            // Freezing a mapped index captures the aliased value first.
            if desc.is_data() && desc.value.is_none() && desc.writable == Some(false) {
                desc.value = get_own_property(obj, &key).and_then(|p| match p {
                    Property::Data { value, .. } => Some(value),
                    Property::Accessor { .. } => None,
                });
            }
            if !ordinary_define_own_property(mc, obj, key.clone(), &desc) {
                return Ok(false);
            }
            let unmap = if desc.is_accessor() {
                true
            } else {
                if let Some(v) = &desc.value {
                    write_mapped_slot(mc, obj, slot, v.clone());
                }
                desc.writable == Some(false)
            };
            if unmap {
                unmap_argument(mc, obj, &key);
            }
            Ok(true)
        }
        Exotic::String(len) => {
            let synthesized = key.is_str("length") || key.as_index().is_some_and(|i| (i as usize) < len);
            if synthesized {
                let current = get_own_property(obj, &key);
                return Ok(validate_and_apply(current.as_ref(), false, desc).is_some());
            }
            Ok(ordinary_define_own_property(mc, obj, key, desc))
        }
        Exotic::Arguments(None) | Exotic::None => Ok(ordinary_define_own_property(mc, obj, key, desc)),
    }
}

fn write_mapped_slot<'gc>(mc: &MutationContext<'gc>, obj: &JSObjectDataPtr<'gc>, slot: u32, value: Value<'gc>) {
    let env = match &obj.borrow().kind {
        ObjectKind::Arguments { env, .. } => *env,
        _ => None,
    };
    if let Some(env) = env
        && let Some(s) = env.borrow_mut(mc).slots.get_mut(slot as usize)
    {
        *s = value;
    }
}

fn unmap_argument<'gc>(mc: &MutationContext<'gc>, obj: &JSObjectDataPtr<'gc>, key: &PropertyKey) {
    if let (ObjectKind::Arguments { mapped, .. }, Some(i)) = (&mut obj.borrow_mut(mc).kind, key.as_index())
        && let Some(m) = mapped.get_mut(i as usize)
    {
        *m = None;
    }
}

/// Writes to an aliased parameter through a mapped `arguments` index.
pub(crate) fn arguments_mapped_slot(obj: &JSObjectDataPtr<'_>, key: &PropertyKey) -> Option<u32> {
    match &obj.borrow().kind {
        ObjectKind::Arguments { mapped, .. } => key.as_index().and_then(|i| mapped.get(i as usize).copied().flatten()),
        _ => None,
    }
}

/// ArraySetLength.
fn array_set_length<'gc>(
    mc: &MutationContext<'gc>,
    obj: &JSObjectDataPtr<'gc>,
    old_len: u32,
    length_writable: bool,
    desc: &PropertyDescriptor<'gc>,
) -> Result<bool, JSError> {
    let current = Property::Data {
        value: Value::Number(old_len as f64),
        writable: length_writable,
        enumerable: false,
        configurable: false,
    };
    let new_len = match &desc.value {
        None => old_len,
        Some(v) => {
            let n = match v {
                Value::Number(n) => *n,
                Value::Boolean(b) => *b as u8 as f64,
                Value::String(s) => crate::core::number::string_to_number(s),
                Value::Null => 0.0,
                _ => f64::NAN,
            };
            let len = crate::core::number::to_uint32(n);
            if len as f64 != n {
                return Err(raise_range_error!("Invalid array length"));
            }
            len
        }
    };
    let mut checked = desc.clone();
    checked.value = desc.value.as_ref().map(|_| Value::Number(new_len as f64));
    if validate_and_apply(Some(&current), false, &checked).is_none() {
        return Ok(false);
    }
    if !length_writable && new_len != old_len {
        return Ok(false);
    }
    let mut final_len = new_len;
    let mut ok = true;
    if new_len < old_len {
        let mut doomed: Vec<u32> = obj
            .borrow()
            .properties
            .keys()
            .filter_map(|k| k.as_index())
            .filter(|i| *i >= new_len)
            .collect();
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        let mut o = obj.borrow_mut(mc);
        for i in doomed {
            let key = PropertyKey::Index(i);
            if o.properties.get(&key).is_some_and(|p| !p.configurable()) {
                final_len = i + 1;
                ok = false;
                break;
            }
            o.properties.shift_remove(&key);
        }
    }
    if let ObjectKind::Array { length, length_writable } = &mut obj.borrow_mut(mc).kind {
        *length = final_len;
        if desc.writable == Some(false) {
            *length_writable = false;
        }
    }
    Ok(ok)
}

/// `[[Delete]]`.
pub fn delete_property<'gc>(mc: &MutationContext<'gc>, obj: &JSObjectDataPtr<'gc>, key: &PropertyKey) -> bool {
    let synthesized = match &obj.borrow().kind {
        ObjectKind::Array { .. } => key.is_str("length"),
        ObjectKind::String(s) => key.is_str("length") || key.as_index().is_some_and(|i| (i as usize) < s.len()),
        _ => false,
    };
    if synthesized {
        return false;
    }
    let configurable = match obj.borrow().properties.get(key) {
        None => return true,
        Some(p) => p.configurable(),
    };
    if !configurable {
        return false;
    }
    obj.borrow_mut(mc).properties.shift_remove(key);
    unmap_argument(mc, obj, key);
    true
}

/// `[[OwnPropertyKeys]]`: integer indices ascending, then strings in insertion order.
pub fn own_property_keys(obj: &JSObjectDataPtr<'_>) -> Vec<PropertyKey> {
    let o = obj.borrow();
    let mut indices: Vec<u32> = o.properties.keys().filter_map(|k| k.as_index()).collect();
    let mut strings: Vec<PropertyKey> = Vec::new();
    match &o.kind {
        ObjectKind::String(s) => {
            indices.extend(0..s.len() as u32);
            strings.push(PropertyKey::from("length"));
        }
        ObjectKind::Array { .. } => strings.push(PropertyKey::from("length")),
        _ => {}
    }
    indices.sort_unstable();
    indices.dedup();
    let mut keys: Vec<PropertyKey> = indices.into_iter().map(PropertyKey::Index).collect();
    keys.extend(strings);
    keys.extend(o.properties.keys().filter(|k| matches!(k, PropertyKey::String(_))).cloned());
    keys
}

/// OrdinaryHasProperty along the prototype chain.
pub fn has_property<'gc>(obj: &JSObjectDataPtr<'gc>, key: &PropertyKey) -> bool {
    let mut cur = Some(*obj);
    while let Some(o) = cur {
        if get_own_property(&o, key).is_some() {
            return true;
        }
        cur = o.borrow().prototype;
    }
    false
}

/// Array length for an array object, or `None` for other kinds.
pub fn array_length<'gc>(obj: &JSObjectDataPtr<'gc>) -> Option<u32> {
    obj.borrow().array_length()
}

pub fn set_array_length<'gc>(mc: &MutationContext<'gc>, obj: &JSObjectDataPtr<'gc>, len: u32) -> Result<bool, JSError> {
    let desc = PropertyDescriptor {
        value: Some(Value::Number(len as f64)),
        ..PropertyDescriptor::default()
    };
    define_own_property(mc, obj, PropertyKey::from("length"), &desc)
}

/// SetIntegrityLevel: `seal` when `frozen` is false, `freeze` otherwise.
pub fn set_integrity_level<'gc>(mc: &MutationContext<'gc>, obj: &JSObjectDataPtr<'gc>, frozen: bool) {
    let mut o = obj.borrow_mut(mc);
    o.extensible = false;
    for prop in o.properties.values_mut() {
        match prop {
            Property::Data { writable, configurable, .. } => {
                *configurable = false;
                if frozen {
                    *writable = false;
                }
            }
            Property::Accessor { configurable, .. } => *configurable = false,
        }
    }
    if frozen && let ObjectKind::Array { length_writable, .. } = &mut o.kind {
        *length_writable = false;
    }
}

/// TestIntegrityLevel (`isSealed` / `isFrozen`).
pub fn test_integrity_level(obj: &JSObjectDataPtr<'_>, frozen: bool) -> bool {
    if obj.borrow().extensible {
        return false;
    }
    own_property_keys(obj).iter().all(|key| match get_own_property(obj, key) {
        Some(Property::Data { writable, configurable, .. }) => !configurable && !(frozen && writable),
        Some(Property::Accessor { configurable, .. }) => !configurable,
        None => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{JsRoot, new_js_arena};

    fn with_arena(f: impl for<'gc> FnOnce(&'gc MutationContext<'gc>, &'gc JsRoot<'gc>)) {
        let arena = new_js_arena().unwrap();
        arena.mutate(f);
    }

    #[test]
    fn array_length_tracks_indices() {
        with_arena(|mc, root| {
            let arr = new_js_object_with_kind(
                mc,
                Some(root.realm.array_prototype),
                ObjectKind::Array {
                    length: 0,
                    length_writable: true,
                },
            );
            object_set_key_value(mc, &arr, 4u32, Value::Number(1.0));
            assert_eq!(array_length(&arr), Some(5));
            assert_eq!(set_array_length(mc, &arr, 2).ok(), Some(true));
            assert!(get_own_property(&arr, &PropertyKey::Index(4)).is_none());
            assert!(set_array_length(mc, &arr, 0).is_ok());
            let bad = PropertyDescriptor {
                value: Some(Value::Number(1.5)),
                ..PropertyDescriptor::default()
            };
            assert!(define_own_property(mc, &arr, PropertyKey::from("length"), &bad).is_err());
        });
    }

    #[test]
    fn own_keys_order_indices_first() {
        with_arena(|mc, _root| {
            let obj = new_js_object(mc, None);
            object_set_key_value(mc, &obj, "b", Value::Null);
            object_set_key_value(mc, &obj, 2u32, Value::Null);
            object_set_key_value(mc, &obj, "a", Value::Null);
            object_set_key_value(mc, &obj, 0u32, Value::Null);
            let keys: Vec<String> = own_property_keys(&obj).iter().map(|k| k.to_string()).collect();
            assert_eq!(keys, vec!["0", "2", "b", "a"]);
        });
    }

    #[test]
    fn non_configurable_properties_resist_redefinition() {
        with_arena(|mc, _root| {
            let obj = new_js_object(mc, None);
            obj.borrow_mut(mc).insert("x", Property::constant(Value::Number(1.0)));
            let change = PropertyDescriptor {
                value: Some(Value::Number(2.0)),
                ..PropertyDescriptor::default()
            };
            assert_eq!(define_own_property(mc, &obj, "x".into(), &change).ok(), Some(false));
            let same = PropertyDescriptor {
                value: Some(Value::Number(1.0)),
                ..PropertyDescriptor::default()
            };
            assert_eq!(define_own_property(mc, &obj, "x".into(), &same).ok(), Some(true));
            assert!(!delete_property(mc, &obj, &"x".into()));
        });
    }
}
