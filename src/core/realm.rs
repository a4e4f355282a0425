use crate::core::{
    Collect, GcPtr, JSObjectData, JSObjectDataPtr, MutationContext, NativeFn, NativeFunction, ObjectKind, Property, Value,
    new_gc_cell_ptr, new_js_object, new_js_object_with_kind,
};
use std::collections::HashMap;

/// A top-level `let`/`const`/`class` binding. These live outside the global
/// object, so `globalThis.x` does not see them.
#[derive(Collect)]
#[collect(no_drop)]
pub struct GlobalLexical<'gc> {
    pub value: Value<'gc>,
    pub is_const: bool,
}

pub type GlobalLexicals<'gc> = GcPtr<'gc, HashMap<String, GlobalLexical<'gc>>>;

/// The global object and every intrinsic the engine needs to reach directly.
/// One realm per engine; nothing is shared between engines.
#[derive(Collect)]
#[collect(no_drop)]
pub struct Realm<'gc> {
    pub global: JSObjectDataPtr<'gc>,
    pub lexicals: GlobalLexicals<'gc>,
    pub object_prototype: JSObjectDataPtr<'gc>,
    pub function_prototype: JSObjectDataPtr<'gc>,
    pub array_prototype: JSObjectDataPtr<'gc>,
    pub string_prototype: JSObjectDataPtr<'gc>,
    pub number_prototype: JSObjectDataPtr<'gc>,
    pub boolean_prototype: JSObjectDataPtr<'gc>,
    pub date_prototype: JSObjectDataPtr<'gc>,
    pub regexp_prototype: JSObjectDataPtr<'gc>,
    pub error_prototype: JSObjectDataPtr<'gc>,
    pub type_error_prototype: JSObjectDataPtr<'gc>,
    pub range_error_prototype: JSObjectDataPtr<'gc>,
    pub reference_error_prototype: JSObjectDataPtr<'gc>,
    pub syntax_error_prototype: JSObjectDataPtr<'gc>,
    pub eval_error_prototype: JSObjectDataPtr<'gc>,
    pub uri_error_prototype: JSObjectDataPtr<'gc>,
}

fn function_prototype_body<'gc>(
    _vm: &mut crate::core::Vm<'gc>,
    _this: Value<'gc>,
    _args: &[Value<'gc>],
    _new_target: Option<JSObjectDataPtr<'gc>>,
) -> Result<Value<'gc>, crate::core::EvalError<'gc>> {
    Ok(Value::Undefined)
}

impl<'gc> Realm<'gc> {
    /// Allocates the intrinsic objects. Their properties are installed by
    /// [`crate::core::initialize_global_constructors`].
    pub fn new(mc: &MutationContext<'gc>) -> Self {
        let object_prototype = new_js_object(mc, None);
        let with_kind = |kind: ObjectKind<'gc>| new_js_object_with_kind(mc, Some(object_prototype), kind);
        let function_prototype = with_kind(ObjectKind::Native(NativeFunction {
            name: String::new(),
            func: function_prototype_body,
            constructor: false,
        }));
        let array_prototype = with_kind(ObjectKind::Array {
            length: 0,
            length_writable: true,
        });
        let string_prototype = with_kind(ObjectKind::String(Vec::new()));
        let number_prototype = with_kind(ObjectKind::Number(0.0));
        let boolean_prototype = with_kind(ObjectKind::Boolean(false));
        let date_prototype = new_js_object(mc, Some(object_prototype));
        let regexp_prototype = new_js_object(mc, Some(object_prototype));
        let error_prototype = new_js_object(mc, Some(object_prototype));
        let sub_error = || new_js_object(mc, Some(error_prototype));
        Realm {
            global: new_js_object(mc, Some(object_prototype)),
            lexicals: new_gc_cell_ptr(mc, HashMap::new()),
            object_prototype,
            function_prototype,
            array_prototype,
            string_prototype,
            number_prototype,
            boolean_prototype,
            date_prototype,
            regexp_prototype,
            error_prototype,
            type_error_prototype: sub_error(),
            range_error_prototype: sub_error(),
            reference_error_prototype: sub_error(),
            syntax_error_prototype: sub_error(),
            eval_error_prototype: sub_error(),
            uri_error_prototype: sub_error(),
        }
    }

    /// Prototype for errors of the given constructor name.
    pub fn error_prototype_for(&self, name: &str) -> JSObjectDataPtr<'gc> {
        match name {
            "TypeError" => self.type_error_prototype,
            "RangeError" => self.range_error_prototype,
            "ReferenceError" => self.reference_error_prototype,
            "SyntaxError" => self.syntax_error_prototype,
            "EvalError" => self.eval_error_prototype,
            "URIError" => self.uri_error_prototype,
            _ => self.error_prototype,
        }
    }

    /// A built-in function object with `length` and `name` set.
    pub fn native_function(&self, mc: &MutationContext<'gc>, name: &str, func: NativeFn, length: u32) -> JSObjectDataPtr<'gc> {
        self.make_native(mc, name, func, length, false)
    }

    fn make_native(&self, mc: &MutationContext<'gc>, name: &str, func: NativeFn, length: u32, constructor: bool) -> JSObjectDataPtr<'gc> {
        let mut data = JSObjectData::new(
            Some(self.function_prototype),
            ObjectKind::Native(NativeFunction {
                name: name.to_string(),
                func,
                constructor,
            }),
        );
        data.insert("length", function_meta(Value::from(length)));
        data.insert("name", function_meta(Value::from(name)));
        new_gc_cell_ptr(mc, data)
    }

    /// A built-in constructor linked both ways with `prototype`, and bound as a global.
    pub fn native_constructor(
        &self,
        mc: &MutationContext<'gc>,
        name: &str,
        func: NativeFn,
        length: u32,
        prototype: JSObjectDataPtr<'gc>,
    ) -> JSObjectDataPtr<'gc> {
        let ctor = self.make_native(mc, name, func, length, true);
        ctor.borrow_mut(mc).insert(
            "prototype",
            Property::Data {
                value: Value::Object(prototype),
                writable: false,
                enumerable: false,
                configurable: false,
            },
        );
        prototype.borrow_mut(mc).insert("constructor", Property::hidden(Value::Object(ctor)));
        self.define_global(mc, name, Value::Object(ctor));
        ctor
    }

    /// Installs a non-enumerable method on `target`.
    pub fn define_method(&self, mc: &MutationContext<'gc>, target: &JSObjectDataPtr<'gc>, name: &str, func: NativeFn, length: u32) {
        let f = self.native_function(mc, name, func, length);
        target.borrow_mut(mc).insert(name, Property::hidden(Value::Object(f)));
    }

    /// Installs an accessor whose getter is a native function.
    pub fn define_getter(&self, mc: &MutationContext<'gc>, target: &JSObjectDataPtr<'gc>, name: &str, func: NativeFn) {
        let getter = self.native_function(mc, &format!("get {name}"), func, 0);
        target.borrow_mut(mc).insert(
            name,
            Property::Accessor {
                get: Some(getter),
                set: None,
                enumerable: false,
                configurable: true,
            },
        );
    }

    /// Binds a writable, non-enumerable global.
    pub fn define_global(&self, mc: &MutationContext<'gc>, name: &str, value: Value<'gc>) {
        self.global.borrow_mut(mc).insert(name, Property::hidden(value));
    }
}

/// Attributes of a function's `length` and `name` properties.
pub(crate) fn function_meta(value: Value<'_>) -> Property<'_> {
    Property::Data {
        value,
        writable: false,
        enumerable: false,
        configurable: true,
    }
}
