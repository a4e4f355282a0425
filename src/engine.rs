//! The host-facing engine: compiles source, runs it against a persistent realm
//! and marshals values across the boundary.

use crate::core::realm::function_meta;
use crate::core::{
    EvalError, FunctionCode, JSObjectDataPtr, JsArena, ObjectKind, PropertyKey, Token, Value, Vm, VmOptions, compile_program,
    new_js_arena, new_js_object_with_kind, object_get_key_value, optimize_program, parse_program, resolve_program, tokenize, value_to_display_string,
};
use crate::error::{JSError, JSErrorKind};
use crate::unicode::utf16_to_utf8;
use crate::{raise_eval_error, raise_reference_error, raise_type_error};
use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Pipeline stage reported to [`EngineOptions::on_compile_phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilePhase {
    Parsing,
    Resolving,
    Optimizing,
    CodeGeneration,
    Execution,
}

pub type CompilePhaseHook = Rc<dyn Fn(CompilePhase, Option<&Path>)>;

#[derive(Clone)]
pub struct EngineOptions {
    /// Treat every script as if it began with `"use strict"`.
    pub strict: bool,
    pub optimize: bool,
    /// Maximum nesting of script and built-in calls before a `RangeError`.
    pub max_call_depth: usize,
    pub source_path: Option<PathBuf>,
    pub on_compile_phase: Option<CompilePhaseHook>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            strict: false,
            optimize: true,
            max_call_depth: 400,
            source_path: None,
            on_compile_phase: None,
        }
    }
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("strict", &self.strict)
            .field("optimize", &self.optimize)
            .field("max_call_depth", &self.max_call_depth)
            .field("source_path", &self.source_path)
            .field("on_compile_phase", &self.on_compile_phase.is_some())
            .finish()
    }
}

/// A script value as seen by the host. Objects never cross the boundary;
/// they arrive as a display summary.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Object(String),
}

impl HostValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undefined => write!(f, "undefined"),
            HostValue::Null => write!(f, "null"),
            HostValue::Boolean(b) => write!(f, "{b}"),
            HostValue::Number(n) => write!(f, "{}", crate::core::number::number_to_string(*n)),
            HostValue::String(s) | HostValue::Object(s) => write!(f, "{s}"),
        }
    }
}

impl From<()> for HostValue {
    fn from(_: ()) -> Self {
        HostValue::Undefined
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Boolean(b)
    }
}

macro_rules! host_value_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for HostValue {
                fn from(n: $t) -> Self {
                    HostValue::Number(n as f64)
                }
            }
        )*
    };
}

host_value_from_number!(f64, f32, i32, u32, i64, u64, usize);

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}

/// Turns a script's completion value into what the host receives.
type Completion<R> = for<'gc> fn(&mut Vm<'gc>, &Value<'gc>) -> Result<R, EvalError<'gc>>;

/// A host closure callable from scripts.
pub type HostFn = Rc<dyn Fn(&[HostValue]) -> Result<HostValue, JSError>>;

/// Host closures registered with an engine; script function objects refer to them by index.
pub type HostTable = Rc<RefCell<Vec<HostFn>>>;

pub(crate) fn value_to_host(value: &Value<'_>) -> HostValue {
    match value {
        Value::Undefined | Value::Uninitialized => HostValue::Undefined,
        Value::Null => HostValue::Null,
        Value::Boolean(b) => HostValue::Boolean(*b),
        Value::Number(n) => HostValue::Number(*n),
        Value::String(s) => HostValue::String(utf16_to_utf8(s)),
        Value::Object(obj) => HostValue::Object(object_summary(obj, value)),
    }
}

fn object_summary<'gc>(obj: &JSObjectDataPtr<'gc>, value: &Value<'gc>) -> String {
    let o = obj.borrow();
    if o.is_callable() {
        let name = o
            .own_data_value(&PropertyKey::from("name"))
            .map(|v| value_to_display_string(&v))
            .filter(|n| !n.is_empty());
        return format!("[Function: {}]", name.as_deref().unwrap_or("anonymous"));
    }
    if o.is_array() {
        drop(o);
        return format!("[Array: {}]", value_to_display_string(value));
    }
    drop(o);
    value_to_display_string(value)
}

pub(crate) fn host_to_value<'gc>(_vm: &mut Vm<'gc>, value: &HostValue) -> Value<'gc> {
    match value {
        HostValue::Undefined => Value::Undefined,
        HostValue::Null => Value::Null,
        HostValue::Boolean(b) => Value::Boolean(*b),
        HostValue::Number(n) => Value::Number(*n),
        HostValue::String(s) | HostValue::Object(s) => Value::from(s.as_str()),
    }
}

/// Runs the compile pipeline: parse, resolve scopes, optionally fold constants, emit bytecode.
pub(crate) fn compile_script(
    source: &str,
    strict: bool,
    optimize: bool,
    on_phase: &mut dyn FnMut(CompilePhase),
) -> Result<Rc<FunctionCode>, JSError> {
    on_phase(CompilePhase::Parsing);
    let mut program = parse_program(source, strict)?;
    log::trace!("parsed {} top-level statements", program.body.len());

    on_phase(CompilePhase::Resolving);
    resolve_program(&mut program);

    if optimize {
        on_phase(CompilePhase::Optimizing);
        optimize_program(&mut program);
    }

    on_phase(CompilePhase::CodeGeneration);
    let code = compile_program(&program)?;
    log::debug!("compiled script: {} instructions", code.ops.len());
    Ok(code)
}

/// An isolated script environment: one realm, one global object, its own heap.
///
/// Globals, functions and lexical declarations persist from one call to the next.
pub struct Engine {
    arena: JsArena,
    options: EngineOptions,
    cancel: Arc<AtomicBool>,
    hosts: HostTable,
}

impl Engine {
    pub fn new() -> Result<Self, JSError> {
        Engine::with_options(EngineOptions::default())
    }

    /// Fails when the built-ins cannot be installed into the new realm.
    pub fn with_options(options: EngineOptions) -> Result<Self, JSError> {
        log::debug!("creating engine with {options:?}");
        Ok(Engine {
            arena: new_js_arena()?,
            options,
            cancel: Arc::new(AtomicBool::new(false)),
            hosts: HostTable::default(),
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// A flag that aborts the running script when set from any thread.
    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Runs `code` and returns its completion value.
    pub fn evaluate(&mut self, code: &str) -> Result<HostValue, JSError> {
        let path = self.options.source_path.clone();
        self.run(code, path.as_deref(), host_result)
    }

    /// Runs `code` for its side effects.
    pub fn execute(&mut self, code: &str) -> Result<(), JSError> {
        self.evaluate(code).map(|_| ())
    }

    /// Like [`Engine::evaluate`], with `path` reported in errors and stack traces.
    pub fn evaluate_with_path<P: AsRef<Path>>(&mut self, code: &str, path: P) -> Result<HostValue, JSError> {
        self.run(code, Some(path.as_ref()), host_result)
    }

    /// Runs `code` and renders the completion value the way `String(value)` would.
    pub fn evaluate_to_string(&mut self, code: &str, path: Option<&Path>) -> Result<String, JSError> {
        let path = path.map(Path::to_path_buf).or_else(|| self.options.source_path.clone());
        self.run(code, path.as_deref(), string_result)
    }

    /// Compiles `code` and returns a listing of the generated bytecode.
    pub fn disassemble(&self, code: &str) -> Result<String, JSError> {
        let compiled = compile_script(code, self.options.strict, self.options.optimize, &mut |_| {})?;
        Ok(compiled.disassemble())
    }

    /// Assigns a global binding: an existing `let`/`var` binding if there is one,
    /// otherwise a property of the global object.
    pub fn set_global_value(&mut self, name: &str, value: impl Into<HostValue>) -> Result<(), JSError> {
        let value = value.into();
        let options = self.vm_options(None);
        let result = self.arena.mutate(|mc, root| {
            let mut vm = Vm::new(mc, &root.realm, options);
            let value = host_to_value(&mut vm, &value);
            if let Some(binding) = root.realm.lexicals.borrow().get(name)
                && binding.is_const
            {
                return Err(raise_type_error!(format!("Assignment to constant variable '{name}'")));
            }
            vm.set_global(name, value, false).map_err(|e| e.into_js_error())
        });
        self.finish(result, None)
    }

    /// Reads a global binding; a `ReferenceError` when it does not exist.
    pub fn get_global_value(&mut self, name: &str) -> Result<HostValue, JSError> {
        let options = self.vm_options(None);
        let result = self.arena.mutate(|mc, root| {
            let mut vm = Vm::new(mc, &root.realm, options);
            vm.get_global(name, false).map(|v| value_to_host(&v)).map_err(|e| e.into_js_error())
        });
        self.finish(result, None)
    }

    /// Exposes a host closure to scripts as a global function.
    ///
    /// Arguments arrive marshalled as [`HostValue`]s; an `Err` result is thrown
    /// into the script as a catchable error.
    pub fn set_global_function<F>(&mut self, name: &str, func: F) -> Result<(), JSError>
    where
        F: Fn(&[HostValue]) -> Result<HostValue, JSError> + 'static,
    {
        let index = {
            let mut hosts = self.hosts.borrow_mut();
            hosts.push(Rc::new(func));
            hosts.len() - 1
        };
        log::debug!("registered host function '{name}' as #{index}");
        self.arena.mutate(|mc, root| {
            let realm = &root.realm;
            let func = new_js_object_with_kind(mc, Some(realm.function_prototype), ObjectKind::Host(index));
            {
                let mut f = func.borrow_mut(mc);
                f.insert("length", function_meta(Value::Number(0.0)));
                f.insert("name", function_meta(Value::from(name)));
            }
            realm.define_global(mc, name, Value::Object(func));
        });
        Ok(())
    }

    /// Calls a global function with host arguments.
    pub fn call_global_function(&mut self, name: &str, args: &[HostValue]) -> Result<HostValue, JSError> {
        let options = self.vm_options(None);
        let result = self.arena.mutate(|mc, root| {
            let mut vm = Vm::new(mc, &root.realm, options);
            let callee = match object_get_key_value(&root.realm.global, name) {
                Some(v) if v.is_callable() => v,
                Some(_) => return Err(raise_type_error!(format!("{name} is not a function"))),
                None => return Err(raise_reference_error!(format!("{name} is not defined"))),
            };
            let args: Vec<Value<'_>> = args.iter().map(|a| host_to_value(&mut vm, a)).collect();
            vm.call(&callee, Value::Undefined, &args).map(|v| value_to_host(&v)).map_err(|e| e.into_js_error())
        });
        self.finish(result, None)
    }

    fn vm_options(&self, path: Option<&Path>) -> VmOptions {
        VmOptions {
            max_call_depth: self.options.max_call_depth,
            strict: self.options.strict,
            optimize: self.options.optimize,
            source_path: path.map(|p| p.display().to_string()),
            cancel: self.cancel.clone(),
            hosts: self.hosts.clone(),
        }
    }

    fn run<R>(&mut self, code: &str, path: Option<&Path>, convert: Completion<R>) -> Result<R, JSError> {
        let hook = self.options.on_compile_phase.clone();
        let notify = |phase: CompilePhase| {
            log::debug!("compile phase: {phase:?}");
            if let Some(hook) = &hook {
                hook(phase, path);
            }
        };
        let compiled = compile_script(code, self.options.strict, self.options.optimize, &mut |p| notify(p));
        let compiled = match compiled {
            Ok(c) => c,
            Err(e) => return Err(with_file(e, path)),
        };
        notify(CompilePhase::Execution);

        let options = self.vm_options(path);
        let result = self.arena.mutate(|mc, root| {
            let mut vm = Vm::new(mc, &root.realm, options);
            vm.run_script(compiled).and_then(|v| convert(&mut vm, &v)).map_err(|e| e.into_js_error())
        });
        self.finish(result, path)
    }

    /// Collects garbage and clears a consumed cancellation request.
    fn finish<R>(&mut self, result: Result<R, JSError>, path: Option<&Path>) -> Result<R, JSError> {
        self.arena.finish_cycle();
        log::trace!("gc: full collection after host call");
        match result {
            Ok(v) => Ok(v),
            Err(e) => {
                if matches!(e.kind(), JSErrorKind::Cancelled) {
                    self.cancel.store(false, Ordering::Relaxed);
                }
                Err(with_file(e, path))
            }
        }
    }
}

fn host_result<'gc>(_vm: &mut Vm<'gc>, value: &Value<'gc>) -> Result<HostValue, EvalError<'gc>> {
    Ok(value_to_host(value))
}

/// `String(value)`, which may run script `toString`/`valueOf` methods.
fn string_result<'gc>(vm: &mut Vm<'gc>, value: &Value<'gc>) -> Result<String, EvalError<'gc>> {
    vm.to_rust_string(value)
}

fn with_file(mut e: JSError, path: Option<&Path>) -> JSError {
    if let Some(path) = path
        && e.file().is_none()
    {
        e.set_file(path.display().to_string());
    }
    e
}

/// One-shot evaluation in a fresh engine; returns the completion value as a display string.
pub fn evaluate_script<T: AsRef<str>, P: AsRef<Path>>(script: T, script_path: Option<P>) -> Result<String, JSError> {
    let mut engine = Engine::new()?;
    engine.evaluate_to_string(script.as_ref(), script_path.as_ref().map(|p| p.as_ref()))
}

/// Read a script file from disk and decode it into a UTF-8 Rust string.
/// Supports UTF-8 (with optional BOM) and UTF-16 (LE/BE) with BOM.
pub fn read_script_file<P: AsRef<Path>>(path: P) -> Result<String, JSError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    if bytes.len() >= 3 && bytes[0] == 0xEF && bytes[1] == 0xBB && bytes[2] == 0xBF {
        let s = std::str::from_utf8(&bytes[3..]).map_err(|e| raise_eval_error!(format!("Script file contains invalid UTF-8: {e}")))?;
        return Ok(s.to_string());
    }
    if bytes.len() >= 2 {
        let units = |le: bool| -> Vec<u16> {
            bytes[2..]
                .chunks_exact(2)
                .map(|c| if le { u16::from_le_bytes([c[0], c[1]]) } else { u16::from_be_bytes([c[0], c[1]]) })
                .collect()
        };
        let decoded = match (bytes[0], bytes[1]) {
            (0xFF, 0xFE) => Some(units(true)),
            (0xFE, 0xFF) => Some(units(false)),
            _ => None,
        };
        if let Some(units) = decoded {
            if (bytes.len() - 2) % 2 != 0 {
                return Err(raise_eval_error!("Invalid UTF-16 script file length"));
            }
            return String::from_utf16(&units).map_err(|e| raise_eval_error!(format!("Script file contains invalid UTF-16: {e}")));
        }
    }
    std::str::from_utf8(&bytes)
        .map(|s| s.to_string())
        .map_err(|e| raise_eval_error!(format!("Script file contains invalid UTF-8: {e}")))
}

/// Whether `src` forms a complete input for an interactive prompt: no open
/// brackets, template substitutions or block comments at the end.
pub fn is_complete_input(src: &str) -> bool {
    let tokens = match tokenize(src) {
        Ok(tokens) => tokens,
        Err(e) => {
            let message = e.message();
            return !(message.starts_with("Unterminated comment") || message.starts_with("Unterminated template literal"));
        }
    };
    let mut open: Vec<char> = Vec::new();
    for t in &tokens {
        match &t.token {
            Token::LParen => open.push('('),
            Token::LBracket => open.push('['),
            Token::LBrace => open.push('{'),
            Token::RParen | Token::RBracket | Token::RBrace => {
                open.pop();
            }
            Token::Template { tail, .. } => {
                let continues = open.last() == Some(&'`');
                if continues {
                    open.pop();
                }
                if !tail {
                    open.push('`');
                }
            }
            _ => {}
        }
    }
    open.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completeness_tracks_brackets_and_templates() {
        assert!(is_complete_input("let a = 1;"));
        assert!(!is_complete_input("function f() {"));
        assert!(!is_complete_input("foo(1, [2,"));
        assert!(!is_complete_input("`a${x"));
        assert!(is_complete_input("`a${x}b${y}c`"));
        assert!(!is_complete_input("/* open"));
    }

    #[test]
    fn host_values_display_like_scripts() {
        assert_eq!(HostValue::from(1.5).to_string(), "1.5");
        assert_eq!(HostValue::from(3_i64).to_string(), "3");
        assert_eq!(HostValue::from(()).to_string(), "undefined");
        assert_eq!(HostValue::from("x"), HostValue::String("x".into()));
    }
}
