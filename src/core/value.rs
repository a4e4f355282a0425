use crate::core::number::number_to_string;
use crate::core::{Collect, Gc, GcPtr, GcTrace, JSObjectData, ObjectKind};
use crate::unicode::{utf8_to_utf16, utf16_to_utf8};

pub type JSObjectDataPtr<'gc> = GcPtr<'gc, JSObjectData<'gc>>;
pub type EnvPtr<'gc> = GcPtr<'gc, Environment<'gc>>;

/// Heap environment record for a materialized scope.
#[derive(Collect)]
#[collect(no_drop)]
pub struct Environment<'gc> {
    pub slots: Vec<Value<'gc>>,
    pub parent: Option<EnvPtr<'gc>>,
}

#[derive(Clone)]
pub enum Value<'gc> {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(Vec<u16>),
    Object(JSObjectDataPtr<'gc>),
    /// Temporal-dead-zone marker for lexical slots; never visible to scripts.
    Uninitialized,
}

unsafe impl<'gc> Collect<'gc> for Value<'gc> {
    fn trace<T: GcTrace<'gc>>(&self, cc: &mut T) {
        if let Value::Object(obj) = self {
            obj.trace(cc);
        }
    }
}

impl<'gc> Value<'gc> {
    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_object(&self) -> Option<JSObjectDataPtr<'gc>> {
        match self {
            Value::Object(o) => Some(*o),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        match self {
            Value::Object(o) => o.borrow().is_callable(),
            _ => false,
        }
    }

    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null | Value::Uninitialized => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
        }
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined | Value::Uninitialized => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(o) => {
                if o.borrow().is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }

    pub fn string(s: &str) -> Self {
        Value::String(utf8_to_utf16(s))
    }
}

/// Strict equality (`===`).
pub fn strict_equals<'a>(a: &Value<'a>, b: &Value<'a>) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Object(x), Value::Object(y)) => Gc::ptr_eq(*x, *y),
        _ => false,
    }
}

/// SameValue (`Object.is`): like `===` but NaN equals itself and +0 differs from -0.
pub fn same_value<'a>(a: &Value<'a>, b: &Value<'a>) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_nan() && y.is_nan() {
                true
            } else {
                x == y && x.is_sign_negative() == y.is_sign_negative()
            }
        }
        _ => strict_equals(a, b),
    }
}

/// SameValueZero (`includes`): NaN equals itself, +0 equals -0.
pub fn same_value_zero<'a>(a: &Value<'a>, b: &Value<'a>) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => strict_equals(a, b),
    }
}

impl From<f64> for Value<'_> {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value<'_> {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value<'_> {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value<'_> {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value<'_> {
    fn from(s: &str) -> Self {
        Value::String(utf8_to_utf16(s))
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Value::String(utf8_to_utf16(&s))
    }
}

impl From<Vec<u16>> for Value<'_> {
    fn from(s: Vec<u16>) -> Self {
        Value::String(s)
    }
}

impl<'gc> From<JSObjectDataPtr<'gc>> for Value<'gc> {
    fn from(o: JSObjectDataPtr<'gc>) -> Self {
        Value::Object(o)
    }
}

impl<'gc> std::fmt::Debug for Value<'gc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({:?})", utf16_to_utf8(s)),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Null => write!(f, "Null"),
            Value::Undefined => write!(f, "Undefined"),
            Value::Uninitialized => write!(f, "Uninitialized"),
            Value::Object(o) => write!(f, "Object({:p}, {})", Gc::as_ptr(*o), o.borrow().class_name()),
        }
    }
}

/// Nested arrays rendered before the rest is left out.
const MAX_DISPLAY_DEPTH: usize = 256;

/// Display form of a value that never re-enters script code, used for
/// diagnostics, uncaught-value messages and host summaries.
pub fn value_to_display_string(val: &Value<'_>) -> String {
    display(val, &mut Vec::new())
}

/// `joining` holds the arrays being rendered; a cycle renders empty the way `join` does.
fn display(val: &Value<'_>, joining: &mut Vec<*const ()>) -> String {
    match val {
        Value::Undefined | Value::Uninitialized => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Number(n) => number_to_string(*n),
        Value::String(s) => utf16_to_utf8(s),
        Value::Object(o) => {
            let obj = o.borrow();
            match &obj.kind {
                ObjectKind::Function(c) => format!("function {}() {{ [code] }}", c.code.name),
                ObjectKind::Native(n) => format!("function {}() {{ [native code] }}", n.name),
                ObjectKind::Host(_) | ObjectKind::Bound { .. } => "function () { [native code] }".to_string(),
                ObjectKind::Array { .. } => {
                    let ptr = Gc::as_ptr(*o) as *const ();
                    if joining.contains(&ptr) || joining.len() >= MAX_DISPLAY_DEPTH {
                        return String::new();
                    }
                    joining.push(ptr);
                    let len = obj.array_length().unwrap_or(0);
                    let mut parts = Vec::with_capacity(len as usize);
                    for i in 0..len {
                        match obj.own_data_value(&crate::core::PropertyKey::Index(i)) {
                            Some(v) if !v.is_null_or_undefined() => parts.push(display(&v, joining)),
                            _ => parts.push(String::new()),
                        }
                    }
                    joining.pop();
                    parts.join(",")
                }
                ObjectKind::Error => {
                    let name = obj.own_data_value(&"name".into()).map(|v| value_to_display_string(&v));
                    let message = obj.own_data_value(&"message".into()).map(|v| value_to_display_string(&v));
                    let name = name.unwrap_or_else(|| {
                        obj.prototype
                            .and_then(|p| p.borrow().lookup_data_value(&"name".into()))
                            .map(|v| value_to_display_string(&v))
                            .unwrap_or_else(|| "Error".to_string())
                    });
                    match message {
                        Some(m) if !m.is_empty() => format!("{name}: {m}"),
                        _ => name,
                    }
                }
                ObjectKind::String(s) => utf16_to_utf8(s),
                ObjectKind::Number(n) => number_to_string(*n),
                ObjectKind::Boolean(b) => b.to_string(),
                ObjectKind::RegExp(r) => format!("/{}/{}", utf16_to_utf8(&r.source), r.flags),
                ObjectKind::Date(t) => crate::js_date::date_display_string(*t),
                _ => "[object Object]".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_laws() {
        let nan = Value::Number(f64::NAN);
        let pz = Value::Number(0.0);
        let nz = Value::Number(-0.0);
        assert!(!strict_equals(&nan, &nan));
        assert!(same_value(&nan, &nan));
        assert!(same_value_zero(&nan, &nan));
        assert!(strict_equals(&pz, &nz));
        assert!(!same_value(&pz, &nz));
        assert!(same_value_zero(&pz, &nz));
        assert!(strict_equals(&Value::from("a"), &Value::from("a")));
        assert!(!strict_equals(&Value::Null, &Value::Undefined));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::from("").to_boolean());
        assert!(Value::from("0").to_boolean());
        assert!(!Value::Number(f64::NAN).to_boolean());
        assert!(!Value::Number(-0.0).to_boolean());
        assert!(!Value::Null.to_boolean());
    }
}
