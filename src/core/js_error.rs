use crate::core::{JSObjectDataPtr, MutationContext, ObjectKind, Property, Realm, Value, new_js_object_with_kind, value_to_display_string};
use crate::error::{JSError, JSErrorKind};
use crate::make_js_error;
use crate::unicode::utf8_to_utf16;

/// Error travelling through the VM: either a host-level [`JSError`] that has
/// not yet been turned into a script value, or a thrown script value with the
/// location of the `throw`.
#[derive(Debug)]
pub enum EvalError<'gc> {
    Js(JSError),
    Throw(Value<'gc>, Option<usize>, Option<usize>),
}

impl<'gc> From<JSError> for EvalError<'gc> {
    fn from(e: JSError) -> Self {
        EvalError::Js(e)
    }
}

impl<'gc> EvalError<'gc> {
    pub fn message(&self) -> String {
        match self {
            EvalError::Js(e) => e.message(),
            EvalError::Throw(v, ..) => value_to_display_string(v),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, EvalError::Js(e) if matches!(e.kind(), JSErrorKind::Cancelled))
    }

    /// Converts into the host-facing error, reading `name`, `message` and
    /// `stack` from thrown error objects.
    pub fn into_js_error(self) -> JSError {
        match self {
            EvalError::Js(e) => e,
            EvalError::Throw(value, line, column) => js_error_from_value(&value, line, column),
        }
    }
}

impl<'gc> From<EvalError<'gc>> for JSError {
    fn from(e: EvalError<'gc>) -> Self {
        e.into_js_error()
    }
}

fn data_string(obj: &JSObjectDataPtr<'_>, name: &str) -> Option<String> {
    obj.borrow().lookup_data_value(&name.into()).map(|v| value_to_display_string(&v))
}

/// Host view of an uncaught thrown value.
pub fn js_error_from_value(value: &Value<'_>, line: Option<usize>, column: Option<usize>) -> JSError {
    let mut err = match value {
        Value::Object(obj) if obj.borrow().is_error() => {
            let name = data_string(obj, "name").unwrap_or_else(|| "Error".to_string());
            let message = data_string(obj, "message").unwrap_or_default();
            let kind = match name.as_str() {
                "SyntaxError" => JSErrorKind::SyntaxError { message },
                "TypeError" => JSErrorKind::TypeError { message },
                "RangeError" => JSErrorKind::RangeError { message },
                "ReferenceError" => JSErrorKind::ReferenceError { message },
                _ => JSErrorKind::Thrown { name, message },
            };
            let mut err = make_js_error!(kind);
            if let Some(stack) = obj.borrow().own_data_value(&"stack".into()) {
                let text = value_to_display_string(&stack);
                err.inner.stack = text.lines().skip(1).map(|l| l.trim().to_string()).collect();
            }
            let position = |key: &str| match obj.borrow().own_data_value(&key.into()) {
                Some(Value::Number(n)) => Some(n as usize),
                _ => None,
            };
            if let (Some(l), Some(c)) = (position("lineNumber"), position("columnNumber")) {
                err.set_js_location(l, c);
            }
            err
        }
        other => make_js_error!(JSErrorKind::Uncaught {
            value: value_to_display_string(other)
        }),
    };
    if !err.has_location()
        && let (Some(l), Some(c)) = (line, column)
    {
        err.set_js_location(l, c);
    }
    err
}

/// Allocates an error object with the given constructor name and message.
/// `stack` lines are the formatted call frames, innermost first.
pub fn create_error_object<'gc>(
    mc: &MutationContext<'gc>,
    realm: &Realm<'gc>,
    prototype: Option<JSObjectDataPtr<'gc>>,
    name: &str,
    message: Option<&str>,
    stack: &[String],
    location: Option<(usize, usize)>,
) -> JSObjectDataPtr<'gc> {
    let proto = prototype.unwrap_or_else(|| realm.error_prototype_for(name));
    let obj = new_js_object_with_kind(mc, Some(proto), ObjectKind::Error);
    let mut header = name.to_string();
    {
        let mut o = obj.borrow_mut(mc);
        if let Some(m) = message {
            o.insert("message", Property::hidden(Value::String(utf8_to_utf16(m))));
            if !m.is_empty() {
                header = format!("{name}: {m}");
            }
        }
        let mut text = header;
        for frame in stack {
            text.push_str("\n    ");
            text.push_str(frame);
        }
        o.insert("stack", Property::hidden(Value::String(utf8_to_utf16(&text))));
        if let Some((line, column)) = location {
            o.insert("lineNumber", Property::hidden(Value::from(line)));
            o.insert("columnNumber", Property::hidden(Value::from(column)));
        }
    }
    obj
}

/// Script-visible constructor name for a host error.
pub(crate) fn error_name(err: &JSError) -> &str {
    match err.kind() {
        JSErrorKind::InternalError { .. } | JSErrorKind::Uncaught { .. } | JSErrorKind::Io(_) | JSErrorKind::Cancelled => "Error",
        _ => err.name(),
    }
}
