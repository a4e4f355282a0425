pub(crate) mod core;
pub(crate) mod engine;
pub(crate) mod error;
pub(crate) mod js_array;
pub(crate) mod js_boolean;
pub(crate) mod js_console;
pub(crate) mod js_date;
pub(crate) mod js_error_types;
pub(crate) mod js_function;
pub(crate) mod js_global;
pub(crate) mod js_json;
pub(crate) mod js_math;
pub(crate) mod js_number;
pub(crate) mod js_object;
pub(crate) mod js_regexp;
pub(crate) mod js_string;
pub(crate) mod unicode;

pub use core::{
    BinaryOp, CodeKind, Expr, ExprKind, FunctionCode, Op, Program, Statement, StatementKind, Token, TokenData, compile_program,
    optimize_program, parse_program, resolve_program, tokenize,
};
pub use engine::{
    CompilePhase, CompilePhaseHook, Engine, EngineOptions, HostFn, HostValue, evaluate_script, is_complete_input, read_script_file,
};
pub use error::{JSError, JSErrorData, JSErrorKind};
