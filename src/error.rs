/// The category of a [`JSError`].
#[derive(thiserror::Error, Debug)]
pub enum JSErrorKind {
    #[error("SyntaxError: {message}")]
    SyntaxError { message: String },

    #[error("ReferenceError: {message}")]
    ReferenceError { message: String },

    #[error("TypeError: {message}")]
    TypeError { message: String },

    #[error("RangeError: {message}")]
    RangeError { message: String },

    /// An error object of any other constructor (`Error`, `URIError`, user subclasses, ...).
    #[error("{name}: {message}")]
    Thrown { name: String, message: String },

    /// A thrown value that is not an error object, e.g. `throw 42`.
    #[error("Uncaught {value}")]
    Uncaught { value: String },

    #[error("InternalError: {message}")]
    InternalError { message: String },

    #[error("Script execution was cancelled")]
    Cancelled,

    #[error("std::io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct JSErrorData {
    pub kind: JSErrorKind,
    pub file: Option<String>,
    pub js_line: Option<usize>,
    pub js_column: Option<usize>,
    pub stack: Vec<String>,
    /// Rust source location that raised the error, for diagnostics.
    pub raised_at: (&'static str, u32),
}

/// Error surfaced to the host: the error category plus the script location it was raised at.
#[derive(Debug)]
pub struct JSError {
    pub(crate) inner: Box<JSErrorData>,
}

impl JSError {
    pub fn new(kind: JSErrorKind, file: &'static str, line: u32) -> Self {
        JSError {
            inner: Box::new(JSErrorData {
                kind,
                file: None,
                js_line: None,
                js_column: None,
                stack: Vec::new(),
                raised_at: (file, line),
            }),
        }
    }

    pub fn kind(&self) -> &JSErrorKind {
        &self.inner.kind
    }

    /// The constructor name a script would see for this error.
    pub fn name(&self) -> &str {
        match &self.inner.kind {
            JSErrorKind::SyntaxError { .. } => "SyntaxError",
            JSErrorKind::ReferenceError { .. } => "ReferenceError",
            JSErrorKind::TypeError { .. } => "TypeError",
            JSErrorKind::RangeError { .. } => "RangeError",
            JSErrorKind::Thrown { name, .. } => name,
            JSErrorKind::Uncaught { .. } => "Uncaught",
            JSErrorKind::InternalError { .. } => "InternalError",
            JSErrorKind::Cancelled => "Cancelled",
            JSErrorKind::Io(_) => "IoError",
        }
    }

    pub fn message(&self) -> String {
        match &self.inner.kind {
            JSErrorKind::SyntaxError { message }
            | JSErrorKind::ReferenceError { message }
            | JSErrorKind::TypeError { message }
            | JSErrorKind::RangeError { message }
            | JSErrorKind::Thrown { message, .. }
            | JSErrorKind::InternalError { message } => message.clone(),
            JSErrorKind::Uncaught { value } => value.clone(),
            JSErrorKind::Cancelled => "execution cancelled".to_string(),
            JSErrorKind::Io(e) => e.to_string(),
        }
    }

    pub fn js_line(&self) -> Option<usize> {
        self.inner.js_line
    }

    pub fn js_column(&self) -> Option<usize> {
        self.inner.js_column
    }

    pub fn file(&self) -> Option<&str> {
        self.inner.file.as_deref()
    }

    pub fn stack(&self) -> &[String] {
        &self.inner.stack
    }

    pub fn set_js_location(&mut self, line: usize, column: usize) {
        self.inner.js_line = Some(line);
        self.inner.js_column = Some(column);
    }

    pub fn set_file(&mut self, file: impl Into<String>) {
        self.inner.file = Some(file.into());
    }

    pub(crate) fn has_location(&self) -> bool {
        self.inner.js_line.is_some()
    }

    /// One-line description in the form `Kind: message (at file:line:column)`.
    pub fn user_message(&self) -> String {
        let mut msg = self.inner.kind.to_string();
        match (self.inner.file.as_deref(), self.inner.js_line, self.inner.js_column) {
            (Some(f), Some(l), Some(c)) => msg.push_str(&format!(" (at {f}:{l}:{c})")),
            (None, Some(l), Some(c)) => msg.push_str(&format!(" (at line {l}:{c})")),
            (Some(f), _, _) => msg.push_str(&format!(" (in {f})")),
            _ => {}
        }
        msg
    }
}

impl std::fmt::Display for JSError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for JSError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.inner.kind {
            JSErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for JSError {
    fn from(err: std::io::Error) -> Self {
        JSError::new(JSErrorKind::Io(err), file!(), line!())
    }
}

impl From<JSError> for std::io::Error {
    fn from(err: JSError) -> std::io::Error {
        match err.inner.kind {
            JSErrorKind::Io(io_err) => io_err,
            _ => std::io::Error::other(err.user_message()),
        }
    }
}

// The macros below capture `file!()`/`line!()` at the invocation site, which a
// helper function could not do.

#[macro_export]
macro_rules! make_js_error {
    ($kind:expr) => {
        $crate::JSError::new($kind, file!(), line!())
    };
}

#[macro_export]
macro_rules! raise_syntax_error {
    ($msg:expr) => {
        $crate::make_js_error!($crate::JSErrorKind::SyntaxError { message: $msg.to_string() })
    };
}

#[macro_export]
macro_rules! raise_type_error {
    ($msg:expr) => {
        $crate::make_js_error!($crate::JSErrorKind::TypeError { message: $msg.to_string() })
    };
}

#[macro_export]
macro_rules! raise_range_error {
    ($msg:expr) => {
        $crate::make_js_error!($crate::JSErrorKind::RangeError { message: $msg.to_string() })
    };
}

#[macro_export]
macro_rules! raise_reference_error {
    ($msg:expr) => {
        $crate::make_js_error!($crate::JSErrorKind::ReferenceError { message: $msg.to_string() })
    };
}

/// Host-side failure that is not one of the script-visible categories.
#[macro_export]
macro_rules! raise_eval_error {
    ($msg:expr) => {
        $crate::make_js_error!($crate::JSErrorKind::InternalError { message: $msg.to_string() })
    };
}

#[macro_export]
macro_rules! raise_error {
    ($name:expr, $msg:expr) => {
        $crate::make_js_error!($crate::JSErrorKind::Thrown {
            name: $name.to_string(),
            message: $msg.to_string()
        })
    };
}
