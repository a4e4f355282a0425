use crate::core::{EvalError, JSObjectDataPtr, Property, PropertyKey, Value, Vm, has_property, new_js_object, object_set_key_value};
use crate::raise_type_error;

/// Partial property descriptor as accepted by `Object.defineProperty`.
/// `get`/`set` use `Some(None)` for an explicit `undefined`.
#[derive(Clone, Default)]
pub struct PropertyDescriptor<'gc> {
    pub value: Option<Value<'gc>>,
    pub writable: Option<bool>,
    pub get: Option<Option<JSObjectDataPtr<'gc>>>,
    pub set: Option<Option<JSObjectDataPtr<'gc>>>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl<'gc> PropertyDescriptor<'gc> {
    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    pub fn is_data(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    pub fn is_generic(&self) -> bool {
        !self.is_accessor() && !self.is_data()
    }

    pub fn from_property(prop: &Property<'gc>) -> Self {
        match prop {
            Property::Data {
                value,
                writable,
                enumerable,
                configurable,
            } => PropertyDescriptor {
                value: Some(value.clone()),
                writable: Some(*writable),
                enumerable: Some(*enumerable),
                configurable: Some(*configurable),
                ..Default::default()
            },
            Property::Accessor {
                get,
                set,
                enumerable,
                configurable,
            } => PropertyDescriptor {
                get: Some(*get),
                set: Some(*set),
                enumerable: Some(*enumerable),
                configurable: Some(*configurable),
                ..Default::default()
            },
        }
    }

    /// A complete property, missing fields defaulting to `false` / `undefined`.
    pub fn to_property(&self) -> Property<'gc> {
        if self.is_accessor() {
            Property::Accessor {
                get: self.get.flatten(),
                set: self.set.flatten(),
                enumerable: self.enumerable.unwrap_or(false),
                configurable: self.configurable.unwrap_or(false),
            }
        } else {
            Property::Data {
                value: self.value.clone().unwrap_or(Value::Undefined),
                writable: self.writable.unwrap_or(false),
                enumerable: self.enumerable.unwrap_or(false),
                configurable: self.configurable.unwrap_or(false),
            }
        }
    }
}

/// ToPropertyDescriptor.
pub fn to_property_descriptor<'gc>(vm: &mut Vm<'gc>, value: &Value<'gc>) -> Result<PropertyDescriptor<'gc>, EvalError<'gc>> {
    let Value::Object(obj) = value else {
        return Err(raise_type_error!("Property description must be an object").into());
    };
    let mut desc = PropertyDescriptor::default();
    let field = |name: &str| PropertyKey::from(name);
    if has_property(obj, &field("enumerable")) {
        desc.enumerable = Some(vm.get(obj, &field("enumerable"))?.to_boolean());
    }
    if has_property(obj, &field("configurable")) {
        desc.configurable = Some(vm.get(obj, &field("configurable"))?.to_boolean());
    }
    if has_property(obj, &field("value")) {
        desc.value = Some(vm.get(obj, &field("value"))?);
    }
    if has_property(obj, &field("writable")) {
        desc.writable = Some(vm.get(obj, &field("writable"))?.to_boolean());
    }
    for (name, label, slot) in [("get", "Getter", &mut desc.get), ("set", "Setter", &mut desc.set)] {
        if has_property(obj, &field(name)) {
            let f = vm.get(obj, &field(name))?;
            *slot = Some(match f {
                Value::Undefined => None,
                Value::Object(o) if o.borrow().is_callable() => Some(o),
                _ => return Err(raise_type_error!(format!("{label} must be a function")).into()),
            });
        }
    }
    if desc.is_accessor() && desc.is_data() {
        return Err(raise_type_error!("Invalid property descriptor. Cannot both specify accessors and a value or writable attribute").into());
    }
    Ok(desc)
}

/// FromPropertyDescriptor.
pub fn from_property<'gc>(vm: &mut Vm<'gc>, prop: &Property<'gc>) -> JSObjectDataPtr<'gc> {
    let mc = vm.mc;
    let obj = new_js_object(mc, Some(vm.realm.object_prototype));
    match prop {
        Property::Data {
            value,
            writable,
            enumerable,
            configurable,
        } => {
            object_set_key_value(mc, &obj, "value", value.clone());
            object_set_key_value(mc, &obj, "writable", Value::Boolean(*writable));
            object_set_key_value(mc, &obj, "enumerable", Value::Boolean(*enumerable));
            object_set_key_value(mc, &obj, "configurable", Value::Boolean(*configurable));
        }
        Property::Accessor {
            get,
            set,
            enumerable,
            configurable,
        } => {
            let as_value = |f: &Option<JSObjectDataPtr<'gc>>| f.map(Value::Object).unwrap_or(Value::Undefined);
            object_set_key_value(mc, &obj, "get", as_value(get));
            object_set_key_value(mc, &obj, "set", as_value(set));
            object_set_key_value(mc, &obj, "enumerable", Value::Boolean(*enumerable));
            object_set_key_value(mc, &obj, "configurable", Value::Boolean(*configurable));
        }
    }
    obj
}
