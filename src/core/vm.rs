//! The bytecode interpreter.
//!
//! Script-to-script calls push a [`Frame`] and stay inside one run loop, so
//! deep recursion in scripts does not grow the Rust stack. Calls made by
//! built-ins (`Array.prototype.map` callbacks, getters, `valueOf`) re-enter
//! through [`Vm::call`], which runs a nested loop until the pushed frame returns.

use crate::core::bytecode::{NO_NAME, TOKEN_THROW};
use crate::core::js_error::{create_error_object, error_name};
use crate::core::number::{to_int32, to_uint32};
use crate::core::optimizer::exponentiate;
use crate::core::realm::{GlobalLexical, function_meta};
use crate::core::{
    Closure, CodeKind, EnvPtr, Environment, EvalError, FunctionCode, JSObjectDataPtr, MethodKind, MutationContext, NativeFn, ObjectKind,
    Op, Property, PropertyDescriptor, PropertyKey, Realm, Value, define_own_property, delete_property, get_own_property, has_property,
    new_gc_cell_ptr, new_js_object, new_js_object_with_kind, set_array_length, set_integrity_level, strict_equals, value_to_display_string,
};
use crate::engine::{HostTable, host_to_value, value_to_host};
use crate::error::{JSError, JSErrorKind};
use crate::unicode::utf8_to_utf16;
use crate::{make_js_error, raise_range_error, raise_reference_error, raise_syntax_error, raise_type_error};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Nested run loops allowed on the Rust stack (built-in -> script -> built-in ...).
const MAX_NESTED_RUNS: usize = 100;
const MAX_STACK_TRACE_FRAMES: usize = 10;

/// Per-engine settings the interpreter consults while running.
#[derive(Clone)]
pub struct VmOptions {
    pub max_call_depth: usize,
    pub strict: bool,
    pub optimize: bool,
    pub source_path: Option<String>,
    pub cancel: Arc<AtomicBool>,
    pub hosts: HostTable,
}

impl Default for VmOptions {
    fn default() -> Self {
        VmOptions {
            max_call_depth: 400,
            strict: false,
            optimize: true,
            source_path: None,
            cancel: Arc::new(AtomicBool::new(false)),
            hosts: HostTable::default(),
        }
    }
}

struct Handler<'gc> {
    target: usize,
    stack_len: usize,
    env: Option<EnvPtr<'gc>>,
}

struct Frame<'gc> {
    code: Rc<FunctionCode>,
    pc: usize,
    stack_base: usize,
    locals: Vec<Value<'gc>>,
    args: Vec<Value<'gc>>,
    this: Value<'gc>,
    new_target: Value<'gc>,
    callee: Option<JSObjectDataPtr<'gc>>,
    env: Option<EnvPtr<'gc>>,
    home_object: Option<JSObjectDataPtr<'gc>>,
    handlers: Vec<Handler<'gc>>,
    completion: Value<'gc>,
    construct: bool,
    /// Returning from this frame leaves the current run loop.
    entry: bool,
}

enum Callee<'gc> {
    Closure(Rc<FunctionCode>),
    Native(NativeFn, bool),
    Host(usize),
    Bound(JSObjectDataPtr<'gc>, Value<'gc>, Vec<Value<'gc>>),
    NotCallable,
}

fn classify<'gc>(obj: &JSObjectDataPtr<'gc>) -> Callee<'gc> {
    match &obj.borrow().kind {
        ObjectKind::Function(c) => Callee::Closure(c.code.clone()),
        ObjectKind::Native(n) => Callee::Native(n.func, n.constructor),
        ObjectKind::Host(i) => Callee::Host(*i),
        ObjectKind::Bound { target, this, args } => Callee::Bound(*target, this.clone(), args.clone()),
        _ => Callee::NotCallable,
    }
}

pub struct Vm<'gc> {
    pub mc: &'gc MutationContext<'gc>,
    pub realm: &'gc Realm<'gc>,
    pub options: VmOptions,
    stack: Vec<Value<'gc>>,
    frames: Vec<Frame<'gc>>,
    depth: usize,
    nested_runs: usize,
}

impl<'gc> Vm<'gc> {
    pub fn new(mc: &'gc MutationContext<'gc>, realm: &'gc Realm<'gc>, options: VmOptions) -> Self {
        Vm {
            mc,
            realm,
            options,
            stack: Vec::with_capacity(256),
            frames: Vec::new(),
            depth: 0,
            nested_runs: 0,
        }
    }

    // ------------------------------------------------------------ entry points

    /// Runs compiled script code with `this` bound to the global object and
    /// returns its completion value.
    pub fn run_script(&mut self, code: Rc<FunctionCode>) -> Result<Value<'gc>, EvalError<'gc>> {
        self.check_cancelled()?;
        self.enter_run()?;
        let locals = vec![Value::Undefined; code.local_count as usize];
        self.frames.push(Frame {
            code,
            pc: 0,
            stack_base: self.stack.len(),
            locals,
            args: Vec::new(),
            this: Value::Object(self.realm.global),
            new_target: Value::Undefined,
            callee: None,
            env: None,
            home_object: None,
            handlers: Vec::new(),
            completion: Value::Undefined,
            construct: false,
            entry: true,
        });
        self.depth += 1;
        let result = self.run();
        self.nested_runs -= 1;
        result
    }

    /// Compiles source text for `eval` and the `Function` constructor.
    pub fn compile(&self, source: &str, strict: bool) -> Result<Rc<FunctionCode>, JSError> {
        crate::engine::compile_script(source, strict || self.options.strict, self.options.optimize, &mut |_| {})
    }

    /// `[[Call]]`.
    pub fn call(&mut self, f: &Value<'gc>, this: Value<'gc>, args: &[Value<'gc>]) -> Result<Value<'gc>, EvalError<'gc>> {
        let Value::Object(obj) = f else {
            return Err(raise_type_error!(format!("{} is not a function", value_to_display_string(f))).into());
        };
        match classify(obj) {
            Callee::Closure(code) => {
                if code.is_class_constructor() {
                    return Err(raise_type_error!(format!("Class constructor {} cannot be invoked without 'new'", code.name)).into());
                }
                self.enter_run()?;
                let pushed = self.push_frame(*obj, this, args.to_vec(), None, true);
                let result = match pushed {
                    Ok(()) => self.run(),
                    Err(e) => Err(e),
                };
                self.nested_runs -= 1;
                result
            }
            Callee::Native(func, _) => self.call_native(func, this, args, None),
            Callee::Host(index) => self.call_host(index, args),
            Callee::Bound(target, bound_this, mut bound_args) => {
                bound_args.extend_from_slice(args);
                self.call(&Value::Object(target), bound_this, &bound_args)
            }
            Callee::NotCallable => Err(raise_type_error!("object is not a function").into()),
        }
    }

    /// `[[Construct]]`. `new_target` defaults to the constructor itself.
    pub fn construct(
        &mut self,
        ctor: &Value<'gc>,
        args: &[Value<'gc>],
        new_target: Option<JSObjectDataPtr<'gc>>,
    ) -> Result<Value<'gc>, EvalError<'gc>> {
        let obj = match ctor {
            Value::Object(o) if o.borrow().is_constructor() => *o,
            other => return Err(raise_type_error!(format!("{} is not a constructor", value_to_display_string(other))).into()),
        };
        let new_target = new_target.unwrap_or(obj);
        match classify(&obj) {
            Callee::Closure(code) => {
                let this = self.initial_this(&code, new_target)?;
                self.enter_run()?;
                let pushed = self.push_frame(obj, this, args.to_vec(), Some(new_target), true);
                let result = match pushed {
                    Ok(()) => self.run(),
                    Err(e) => Err(e),
                };
                self.nested_runs -= 1;
                result
            }
            Callee::Native(func, _) => self.call_native(func, Value::Undefined, args, Some(new_target)),
            Callee::Bound(target, _, mut bound_args) => {
                bound_args.extend_from_slice(args);
                let nt = if gc_arena::Gc::ptr_eq(new_target, obj) { target } else { new_target };
                self.construct(&Value::Object(target), &bound_args, Some(nt))
            }
            Callee::Host(_) | Callee::NotCallable => Err(raise_type_error!("object is not a constructor").into()),
        }
    }

    /// Turns a pending error into the script value a `catch` clause receives.
    pub fn error_value(&mut self, err: EvalError<'gc>) -> Value<'gc> {
        match err {
            EvalError::Throw(value, ..) => value,
            EvalError::Js(e) => {
                let location = e.js_line().zip(e.js_column());
                let stack = if e.stack().is_empty() { self.stack_trace() } else { e.stack().to_vec() };
                let message = e.message();
                Value::Object(create_error_object(
                    self.mc,
                    self.realm,
                    None,
                    error_name(&e),
                    Some(&message),
                    &stack,
                    location,
                ))
            }
        }
    }

    /// Call frames from innermost outwards, formatted for `Error.prototype.stack`.
    pub fn stack_trace(&self) -> Vec<String> {
        let file = self.options.source_path.as_deref().unwrap_or("<eval>");
        self.frames
            .iter()
            .rev()
            .take(MAX_STACK_TRACE_FRAMES)
            .map(|f| {
                let name = match (f.code.name.as_str(), f.code.kind) {
                    ("", CodeKind::Script) => "<script>",
                    ("", _) => "<anonymous>",
                    (n, _) => n,
                };
                match f.code.location(f.pc.saturating_sub(1)) {
                    Some((line, column)) => format!("at {name} ({file}:{line}:{column})"),
                    None => format!("at {name} ({file})"),
                }
            })
            .collect()
    }

    /// Source position of the instruction being executed.
    pub fn current_location(&self) -> Option<(usize, usize)> {
        self.frames.last().and_then(|f| f.code.location(f.pc.saturating_sub(1)))
    }

    /// Whether the innermost running code is strict.
    pub fn is_strict(&self) -> bool {
        self.frames.last().is_some_and(|f| f.code.strict)
    }

    pub fn check_cancelled(&self) -> Result<(), EvalError<'gc>> {
        if self.options.cancel.load(Ordering::Relaxed) {
            log::debug!("script cancelled by host");
            return Err(make_js_error!(JSErrorKind::Cancelled).into());
        }
        Ok(())
    }

    // ------------------------------------------------------------ calls

    fn enter_run(&mut self) -> Result<(), EvalError<'gc>> {
        if self.nested_runs >= MAX_NESTED_RUNS {
            return Err(raise_range_error!("Maximum call stack size exceeded").into());
        }
        self.nested_runs += 1;
        Ok(())
    }

    fn check_depth(&self) -> Result<(), EvalError<'gc>> {
        if self.depth >= self.options.max_call_depth {
            return Err(raise_range_error!("Maximum call stack size exceeded").into());
        }
        Ok(())
    }

    fn call_native(
        &mut self,
        func: NativeFn,
        this: Value<'gc>,
        args: &[Value<'gc>],
        new_target: Option<JSObjectDataPtr<'gc>>,
    ) -> Result<Value<'gc>, EvalError<'gc>> {
        self.check_depth()?;
        self.depth += 1;
        let result = func(self, this, args, new_target);
        self.depth -= 1;
        result
    }

    fn call_host(&mut self, index: usize, args: &[Value<'gc>]) -> Result<Value<'gc>, EvalError<'gc>> {
        let func = self.options.hosts.borrow().get(index).cloned();
        let Some(func) = func else {
            return Err(raise_type_error!("host function is no longer registered").into());
        };
        let host_args: Vec<_> = args.iter().map(value_to_host).collect();
        log::trace!("calling host function #{index} with {} arguments", host_args.len());
        let result = func(&host_args)?;
        Ok(host_to_value(self, &result))
    }

    /// `this` for a closure invoked through `[[Construct]]`.
    fn initial_this(&mut self, code: &FunctionCode, new_target: JSObjectDataPtr<'gc>) -> Result<Value<'gc>, EvalError<'gc>> {
        if matches!(code.kind, CodeKind::ClassConstructor { derived: true }) {
            return Ok(Value::Uninitialized);
        }
        let proto = self.prototype_from_constructor(Some(new_target), self.realm.object_prototype)?;
        Ok(Value::Object(new_js_object(self.mc, Some(proto))))
    }

    fn push_frame(
        &mut self,
        callee: JSObjectDataPtr<'gc>,
        this: Value<'gc>,
        args: Vec<Value<'gc>>,
        new_target: Option<JSObjectDataPtr<'gc>>,
        entry: bool,
    ) -> Result<(), EvalError<'gc>> {
        self.check_depth()?;
        self.check_cancelled()?;
        let (code, env, home_object) = match &callee.borrow().kind {
            ObjectKind::Function(c) => (c.code.clone(), c.env, c.home_object),
            _ => return Err(raise_type_error!("not a script function").into()),
        };
        let this = if code.is_arrow() || code.strict || new_target.is_some() {
            this
        } else {
            match this {
                Value::Undefined | Value::Null => Value::Object(self.realm.global),
                Value::Object(_) => this,
                primitive => Value::Object(self.to_object(&primitive)?),
            }
        };
        let locals = vec![Value::Undefined; code.local_count as usize];
        self.frames.push(Frame {
            code,
            pc: 0,
            stack_base: self.stack.len(),
            locals,
            args,
            this,
            new_target: new_target.map(Value::Object).unwrap_or(Value::Undefined),
            callee: Some(callee),
            env,
            home_object,
            handlers: Vec::new(),
            completion: Value::Undefined,
            construct: new_target.is_some(),
            entry,
        });
        self.depth += 1;
        Ok(())
    }

    fn callee_text(&self, code: &FunctionCode, name: u32, value: &Value<'gc>) -> String {
        if name != NO_NAME {
            return code.name_at(name).to_string();
        }
        match value {
            Value::Object(_) => "expression".to_string(),
            other => value_to_display_string(other),
        }
    }

    /// `Call` from bytecode: script callees get a frame in the current loop.
    fn call_op(&mut self, f: Value<'gc>, this: Value<'gc>, args: Vec<Value<'gc>>, code: &FunctionCode, name: u32) -> Result<(), EvalError<'gc>> {
        let obj = match &f {
            Value::Object(o) if o.borrow().is_callable() => *o,
            other => {
                return Err(raise_type_error!(format!("{} is not a function", self.callee_text(code, name, other))).into());
            }
        };
        match classify(&obj) {
            Callee::Closure(callee_code) => {
                if callee_code.is_class_constructor() {
                    return Err(raise_type_error!(format!(
                        "Class constructor {} cannot be invoked without 'new'",
                        callee_code.name
                    ))
                    .into());
                }
                self.push_frame(obj, this, args, None, false)
            }
            _ => {
                let result = self.call(&f, this, &args)?;
                self.stack.push(result);
                Ok(())
            }
        }
    }

    /// `New`/`SuperCall` from bytecode.
    fn construct_op(
        &mut self,
        ctor: Value<'gc>,
        args: Vec<Value<'gc>>,
        new_target: Option<JSObjectDataPtr<'gc>>,
        code: &FunctionCode,
        name: u32,
    ) -> Result<(), EvalError<'gc>> {
        let obj = match &ctor {
            Value::Object(o) if o.borrow().is_constructor() => *o,
            other => {
                return Err(raise_type_error!(format!("{} is not a constructor", self.callee_text(code, name, other))).into());
            }
        };
        let new_target = new_target.unwrap_or(obj);
        match classify(&obj) {
            Callee::Closure(callee_code) => {
                let this = self.initial_this(&callee_code, new_target)?;
                self.push_frame(obj, this, args, Some(new_target), false)
            }
            _ => {
                let result = self.construct(&ctor, &args, Some(new_target))?;
                self.stack.push(result);
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------ run loop

    fn run(&mut self) -> Result<Value<'gc>, EvalError<'gc>> {
        loop {
            match self.execute() {
                Ok(value) => return Ok(value),
                Err(err) => self.unwind(err)?,
            }
        }
    }

    /// Attaches the current source position (and call stack) to host errors.
    fn locate(&self, err: EvalError<'gc>) -> EvalError<'gc> {
        match err {
            EvalError::Js(mut e) => {
                if !e.has_location()
                    && let Some((line, column)) = self.current_location()
                {
                    e.set_js_location(line, column);
                }
                if e.file().is_none()
                    && let Some(path) = &self.options.source_path
                {
                    e.set_file(path.clone());
                }
                if e.inner.stack.is_empty() {
                    e.inner.stack = self.stack_trace();
                }
                EvalError::Js(e)
            }
            other => other,
        }
    }

    /// Transfers control to the innermost handler at or above the entry frame
    /// of this loop; otherwise pops down through the entry frame and returns the error.
    fn unwind(&mut self, err: EvalError<'gc>) -> Result<(), EvalError<'gc>> {
        let err = self.locate(err);
        let cancelled = err.is_cancelled();
        loop {
            let Some(frame) = self.frames.last_mut() else {
                return Err(err);
            };
            if !cancelled && let Some(handler) = frame.handlers.pop() {
                frame.env = handler.env;
                frame.pc = handler.target;
                self.stack.truncate(handler.stack_len);
                let value = self.error_value(err);
                self.stack.push(value);
                return Ok(());
            }
            let entry = frame.entry;
            let base = frame.stack_base;
            self.frames.pop();
            self.stack.truncate(base);
            self.depth = self.depth.saturating_sub(1);
            if entry {
                return Err(err);
            }
        }
    }

    fn pop(&mut self) -> Value<'gc> {
        self.stack.pop().unwrap_or(Value::Undefined)
    }

    fn peek(&self) -> Value<'gc> {
        self.stack.last().cloned().unwrap_or(Value::Undefined)
    }

    fn pop_args(&mut self, argc: u32) -> Vec<Value<'gc>> {
        let at = self.stack.len().saturating_sub(argc as usize);
        self.stack.split_off(at)
    }

    fn pop_object(&mut self) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
        match self.pop() {
            Value::Object(o) => Ok(o),
            other => Err(raise_type_error!(format!("{} is not an object", value_to_display_string(&other))).into()),
        }
    }

    fn peek_object(&self) -> Result<JSObjectDataPtr<'gc>, EvalError<'gc>> {
        match self.stack.last() {
            Some(Value::Object(o)) => Ok(*o),
            _ => Err(make_js_error!(JSErrorKind::InternalError {
                message: "expected an object on the stack".to_string()
            })
            .into()),
        }
    }

    fn numeric_operands(&mut self) -> Result<(f64, f64), EvalError<'gc>> {
        let b = self.pop();
        let a = self.pop();
        let x = self.to_number(&a)?;
        let y = self.to_number(&b)?;
        Ok((x, y))
    }

    fn env_at(&self, fi: usize, depth: u32) -> Result<EnvPtr<'gc>, EvalError<'gc>> {
        let mut env = self.frames[fi].env;
        for _ in 0..depth {
            env = env.and_then(|e| e.borrow().parent);
        }
        env.ok_or_else(|| {
            make_js_error!(JSErrorKind::InternalError {
                message: "missing environment record".to_string()
            })
            .into()
        })
    }

    fn heap_get(&self, fi: usize, depth: u32, slot: u32) -> Result<Value<'gc>, EvalError<'gc>> {
        let env = self.env_at(fi, depth)?;
        let value = env.borrow().slots.get(slot as usize).cloned().unwrap_or(Value::Undefined);
        Ok(value)
    }

    fn heap_set(&self, fi: usize, depth: u32, slot: u32, value: Value<'gc>) -> Result<(), EvalError<'gc>> {
        let env = self.env_at(fi, depth)?;
        if let Some(s) = env.borrow_mut(self.mc).slots.get_mut(slot as usize) {
            *s = value;
        }
        Ok(())
    }

    fn jump(&mut self, fi: usize, from: usize, target: u32) -> Result<(), EvalError<'gc>> {
        self.frames[fi].pc = target as usize;
        if (target as usize) <= from {
            self.check_cancelled()?;
        }
        Ok(())
    }

    fn new_env(&self, parent: Option<EnvPtr<'gc>>, size: u32) -> EnvPtr<'gc> {
        new_gc_cell_ptr(
            self.mc,
            Environment {
                slots: vec![Value::Undefined; size as usize],
                parent,
            },
        )
    }

    fn tdz_error(name: &str) -> EvalError<'gc> {
        if name == crate::core::scope::THIS_NAME {
            return raise_reference_error!("Must call super constructor in derived class before accessing 'this' or returning from derived constructor")
                .into();
        }
        raise_reference_error!(format!("Cannot access '{name}' before initialization")).into()
    }

    /// Executes instructions until the entry frame of this loop returns.
    fn execute(&mut self) -> Result<Value<'gc>, EvalError<'gc>> {
        loop {
            let fi = self.frames.len() - 1;
            let code = self.frames[fi].code.clone();
            let pc = self.frames[fi].pc;
            self.frames[fi].pc += 1;
            let op = code.ops.get(pc).copied().unwrap_or(Op::Return);
            match op {
                Op::Undefined => self.stack.push(Value::Undefined),
                Op::Null => self.stack.push(Value::Null),
                Op::True => self.stack.push(Value::Boolean(true)),
                Op::False => self.stack.push(Value::Boolean(false)),
                Op::Number(n) => self.stack.push(Value::Number(n)),
                Op::String(i) => self.stack.push(Value::String(code.strings.get(i as usize).cloned().unwrap_or_default())),
                Op::Uninitialized => self.stack.push(Value::Uninitialized),

                Op::Pop => {
                    self.stack.pop();
                }
                Op::Dup => {
                    let v = self.peek();
                    self.stack.push(v);
                }
                Op::DupN(n) => {
                    let at = self.stack.len().saturating_sub(n as usize);
                    let top: Vec<_> = self.stack[at..].to_vec();
                    self.stack.extend(top);
                }
                Op::Swap => {
                    let len = self.stack.len();
                    if len >= 2 {
                        self.stack.swap(len - 1, len - 2);
                    }
                }
                Op::Roll(n) => {
                    let at = self.stack.len().saturating_sub(n as usize + 1);
                    let v = self.stack.remove(at);
                    self.stack.push(v);
                }
                Op::Bury(n) => {
                    let v = self.pop();
                    let at = self.stack.len().saturating_sub(n as usize);
                    self.stack.insert(at, v);
                }

                // ---- bindings
                Op::GetLocal(slot) => {
                    let v = self.frames[fi].locals.get(slot as usize).cloned().unwrap_or(Value::Undefined);
                    self.stack.push(v);
                }
                Op::GetLocalChecked(slot, name) => {
                    let v = self.frames[fi].locals.get(slot as usize).cloned().unwrap_or(Value::Undefined);
                    if matches!(v, Value::Uninitialized) {
                        return Err(Self::tdz_error(code.name_at(name)));
                    }
                    self.stack.push(v);
                }
                Op::SetLocal(slot) => {
                    let v = self.peek();
                    if let Some(s) = self.frames[fi].locals.get_mut(slot as usize) {
                        *s = v;
                    }
                }
                Op::SetLocalChecked(slot, name) => {
                    let v = self.peek();
                    let frame = &mut self.frames[fi];
                    match frame.locals.get_mut(slot as usize) {
                        Some(Value::Uninitialized) => return Err(Self::tdz_error(code.name_at(name))),
                        Some(s) => *s = v,
                        None => {}
                    }
                }
                Op::GetHeap(depth, slot) => {
                    let v = self.heap_get(fi, depth, slot)?;
                    self.stack.push(v);
                }
                Op::GetHeapChecked(depth, slot, name) => {
                    let v = self.heap_get(fi, depth, slot)?;
                    if matches!(v, Value::Uninitialized) {
                        return Err(Self::tdz_error(code.name_at(name)));
                    }
                    self.stack.push(v);
                }
                Op::SetHeap(depth, slot) => {
                    let v = self.peek();
                    self.heap_set(fi, depth, slot, v)?;
                }
                Op::SetHeapChecked(depth, slot, name) => {
                    if matches!(self.heap_get(fi, depth, slot)?, Value::Uninitialized) {
                        return Err(Self::tdz_error(code.name_at(name)));
                    }
                    let v = self.peek();
                    self.heap_set(fi, depth, slot, v)?;
                }
                Op::GetGlobal(name) => {
                    let v = self.get_global(code.name_at(name), false)?;
                    self.stack.push(v);
                }
                Op::GetGlobalForTypeof(name) => {
                    let v = self.get_global(code.name_at(name), true)?;
                    self.stack.push(v);
                }
                Op::SetGlobal(name) => {
                    let v = self.peek();
                    self.set_global(code.name_at(name), v, code.strict)?;
                }
                Op::InitGlobalLexical(name) => {
                    let value = self.peek();
                    let name = code.name_at(name).to_string();
                    let mut lexicals = self.realm.lexicals.borrow_mut(self.mc);
                    let is_const = lexicals.get(&name).is_some_and(|l| l.is_const);
                    lexicals.insert(name, GlobalLexical { value, is_const });
                }
                Op::DeleteGlobal(name) => {
                    let name = code.name_at(name);
                    let result = if self.realm.lexicals.borrow().contains_key(name) {
                        false
                    } else {
                        delete_property(self.mc, &self.realm.global, &PropertyKey::from(name))
                    };
                    self.stack.push(Value::Boolean(result));
                }
                Op::DeclareGlobals => self.declare_globals(&code)?,
                Op::DefineGlobalFunction(name) => {
                    let f = self.pop();
                    let desc = PropertyDescriptor {
                        value: Some(f),
                        writable: Some(true),
                        enumerable: Some(true),
                        configurable: Some(false),
                        ..PropertyDescriptor::default()
                    };
                    let name = code.name_at(name);
                    if !define_own_property(self.mc, &self.realm.global, PropertyKey::from(name), &desc)? {
                        return Err(raise_type_error!(format!("Cannot redefine property: {name}")).into());
                    }
                }
                Op::ThrowConstAssign(_) => return Err(raise_type_error!("Assignment to constant variable.").into()),
                Op::LoadThis => {
                    let v = self.frames[fi].this.clone();
                    self.stack.push(v);
                }
                Op::LoadThisChecked => {
                    let v = self.frames[fi].this.clone();
                    if matches!(v, Value::Uninitialized) {
                        return Err(Self::tdz_error(crate::core::scope::THIS_NAME));
                    }
                    self.stack.push(v);
                }
                Op::LoadNewTarget => {
                    let v = self.frames[fi].new_target.clone();
                    self.stack.push(v);
                }
                Op::LoadCallee => {
                    let v = self.frames[fi].callee.map(Value::Object).unwrap_or(Value::Undefined);
                    self.stack.push(v);
                }
                Op::LoadGlobalThis => self.stack.push(Value::Object(self.realm.global)),
                Op::BindThis => {
                    let v = self.peek();
                    let frame = &mut self.frames[fi];
                    if !matches!(frame.this, Value::Uninitialized) {
                        return Err(raise_reference_error!("Super constructor may only be called once").into());
                    }
                    frame.this = v;
                }
                Op::BindHeapThis(depth, slot) => {
                    if !matches!(self.heap_get(fi, depth, slot)?, Value::Uninitialized) {
                        return Err(raise_reference_error!("Super constructor may only be called once").into());
                    }
                    let v = self.peek();
                    self.heap_set(fi, depth, slot, v)?;
                }
                Op::CreateArguments { mapped } => {
                    let args_obj = self.create_arguments(fi, mapped);
                    self.stack.push(Value::Object(args_obj));
                }
                Op::GetArg(i) => {
                    let v = self.frames[fi].args.get(i as usize).cloned().unwrap_or(Value::Undefined);
                    self.stack.push(v);
                }
                Op::GetRestArgs(from) => {
                    let rest = self.frames[fi].args.get(from as usize..).map(<[_]>::to_vec).unwrap_or_default();
                    let arr = self.new_array(rest);
                    self.stack.push(Value::Object(arr));
                }
                Op::PushEnv(size) => {
                    let env = self.new_env(self.frames[fi].env, size);
                    self.frames[fi].env = Some(env);
                }
                Op::PopEnv => {
                    let frame = &mut self.frames[fi];
                    frame.env = frame.env.and_then(|e| e.borrow().parent);
                }
                Op::CopyEnv => {
                    if let Some(env) = self.frames[fi].env {
                        let (slots, parent) = {
                            let e = env.borrow();
                            (e.slots.clone(), e.parent)
                        };
                        self.frames[fi].env = Some(new_gc_cell_ptr(self.mc, Environment { slots, parent }));
                    }
                }

                // ---- function and literal creation
                Op::Closure(index) => {
                    let Some(f) = code.functions.get(index as usize).cloned() else {
                        return Err(raise_syntax_error!("invalid function reference").into());
                    };
                    let home = if f.is_arrow() { self.frames[fi].home_object } else { None };
                    let env = self.frames[fi].env;
                    let closure = self.make_closure(f, env, home);
                    self.stack.push(Value::Object(closure));
                }
                Op::Class { has_super } => {
                    let (ctor, proto) = self.define_class(has_super)?;
                    self.stack.push(Value::Object(ctor));
                    self.stack.push(Value::Object(proto));
                }
                Op::RegExp(index) => {
                    let (pattern, flags) = code.regexes.get(index as usize).cloned().unwrap_or_default();
                    let re = crate::js_regexp::regexp_create(self, &utf8_to_utf16(&pattern), &flags, None)?;
                    self.stack.push(Value::Object(re));
                }
                Op::TemplateObject(index) => {
                    let Some(t) = code.templates.get(index as usize) else {
                        return Err(raise_syntax_error!("invalid template reference").into());
                    };
                    let cooked: Vec<_> = t.cooked.iter().map(|c| c.clone().map(Value::String).unwrap_or(Value::Undefined)).collect();
                    let raw: Vec<_> = t.raw.iter().map(|r| Value::from(r.as_str())).collect();
                    let cooked = self.new_array(cooked);
                    let raw = self.new_array(raw);
                    set_integrity_level(self.mc, &raw, true);
                    cooked.borrow_mut(self.mc).insert(
                        "raw",
                        Property::Data {
                            value: Value::Object(raw),
                            writable: false,
                            enumerable: false,
                            configurable: false,
                        },
                    );
                    set_integrity_level(self.mc, &cooked, true);
                    self.stack.push(Value::Object(cooked));
                }
                Op::NewObject => {
                    let obj = new_js_object(self.mc, Some(self.realm.object_prototype));
                    self.stack.push(Value::Object(obj));
                }
                Op::NewArray => {
                    let arr = self.new_array(Vec::new());
                    self.stack.push(Value::Object(arr));
                }
                Op::DefineField(name) => {
                    let v = self.pop();
                    let obj = self.peek_object()?;
                    self.create_data_property(&obj, PropertyKey::from(code.name_at(name)), v)?;
                }
                Op::DefineElem => {
                    let v = self.pop();
                    let key = self.pop();
                    let obj = self.peek_object()?;
                    let key = self.to_property_key(&key)?;
                    self.create_data_property(&obj, key, v)?;
                }
                Op::DefineMethod { kind, enumerable } => {
                    let func = self.pop_object()?;
                    let key = self.pop();
                    let obj = self.peek_object()?;
                    self.define_method(&obj, &key, func, kind, enumerable)?;
                }
                Op::CopyDataProperties => {
                    let source = self.pop();
                    let target = self.peek_object()?;
                    if let Value::Object(_) | Value::String(_) = &source {
                        let src = self.to_object(&source)?;
                        for (key, value) in self.enumerable_own_entries(&src)? {
                            self.create_data_property(&target, key, value)?;
                        }
                    }
                }
                Op::ObjectRest => {
                    let keys = self.pop();
                    let source = self.pop();
                    let excluded = match &keys {
                        Value::Object(k) => self.array_like_values(&Value::Object(*k))?,
                        _ => Vec::new(),
                    };
                    let mut excluded_keys = Vec::with_capacity(excluded.len());
                    for k in &excluded {
                        excluded_keys.push(self.to_property_key(k)?);
                    }
                    let rest = new_js_object(self.mc, Some(self.realm.object_prototype));
                    let src = self.to_object(&source)?;
                    for (key, value) in self.enumerable_own_entries(&src)? {
                        if !excluded_keys.contains(&key) {
                            self.create_data_property(&rest, key, value)?;
                        }
                    }
                    self.stack.push(Value::Object(rest));
                }
                Op::SetPrototype => {
                    let proto = self.pop();
                    let obj = self.peek_object()?;
                    match proto {
                        Value::Object(p) => obj.borrow_mut(self.mc).prototype = Some(p),
                        Value::Null => obj.borrow_mut(self.mc).prototype = None,
                        _ => {}
                    }
                }
                Op::ArrayPush => {
                    let v = self.pop();
                    let arr = self.peek_object()?;
                    self.array_push(&arr, v)?;
                }
                Op::ArrayHole => {
                    let arr = self.peek_object()?;
                    let len = self.length_of(&arr)?;
                    set_array_length(self.mc, &arr, len + 1)?;
                }
                Op::ArraySpread => {
                    let source = self.pop();
                    let arr = self.peek_object()?;
                    for v in self.iterate_values(&source)? {
                        self.array_push(&arr, v)?;
                    }
                }

                // ---- property access
                Op::GetProp(name) => {
                    let base = self.pop();
                    let v = self.get_value(&base, &PropertyKey::from(code.name_at(name)))?;
                    self.stack.push(v);
                }
                Op::GetElem => {
                    let key = self.pop();
                    let base = self.pop();
                    if base.is_null_or_undefined() {
                        let key_text = value_to_display_string(&key);
                        return Err(raise_type_error!(format!(
                            "Cannot read properties of {} (reading '{key_text}')",
                            value_to_display_string(&base)
                        ))
                        .into());
                    }
                    let key = self.to_property_key(&key)?;
                    let v = self.get_value(&base, &key)?;
                    self.stack.push(v);
                }
                Op::SetProp(name) => {
                    let v = self.pop();
                    let base = self.pop();
                    self.put_value(&base, PropertyKey::from(code.name_at(name)), v.clone(), code.strict)?;
                    self.stack.push(v);
                }
                Op::SetElem => {
                    let v = self.pop();
                    let key = self.pop();
                    let base = self.pop();
                    if base.is_null_or_undefined() {
                        let key_text = value_to_display_string(&key);
                        return Err(raise_type_error!(format!(
                            "Cannot set properties of {} (setting '{key_text}')",
                            value_to_display_string(&base)
                        ))
                        .into());
                    }
                    let key = self.to_property_key(&key)?;
                    self.put_value(&base, key, v.clone(), code.strict)?;
                    self.stack.push(v);
                }
                Op::DeleteProp(name) => {
                    let base = self.pop();
                    let result = self.delete_op(&base, PropertyKey::from(code.name_at(name)), code.strict)?;
                    self.stack.push(Value::Boolean(result));
                }
                Op::DeleteElem => {
                    let key = self.pop();
                    let base = self.pop();
                    let key = self.to_property_key(&key)?;
                    let result = self.delete_op(&base, key, code.strict)?;
                    self.stack.push(Value::Boolean(result));
                }
                Op::ToPropertyKey => {
                    let v = self.pop();
                    let key = self.property_key_value(&v)?;
                    self.stack.push(key);
                }
                Op::CheckObjectCoercible => {
                    if self.stack.last().is_none_or(|v| v.is_null_or_undefined()) {
                        let text = value_to_display_string(&self.peek());
                        return Err(raise_type_error!(format!("Cannot destructure '{text}' as it is {text}.")).into());
                    }
                }
                Op::SuperBase => {
                    let Some(home) = self.frames[fi].home_object else {
                        return Err(raise_syntax_error!("'super' keyword unexpected here").into());
                    };
                    let base = home.borrow().prototype.map(Value::Object).unwrap_or(Value::Null);
                    self.stack.push(base);
                }
                Op::GetSuperProp(name) => {
                    let base = self.pop();
                    let this = self.pop();
                    let v = self.super_get(&base, &PropertyKey::from(code.name_at(name)), &this)?;
                    self.stack.push(v);
                }
                Op::GetSuperElem => {
                    let key = self.pop();
                    let base = self.pop();
                    let this = self.pop();
                    let key = self.to_property_key(&key)?;
                    let v = self.super_get(&base, &key, &this)?;
                    self.stack.push(v);
                }
                Op::SetSuperProp(name) => {
                    let v = self.pop();
                    let base = self.pop();
                    let this = self.pop();
                    self.super_set(&base, PropertyKey::from(code.name_at(name)), v.clone(), &this, code.strict)?;
                    self.stack.push(v);
                }
                Op::SetSuperElem => {
                    let v = self.pop();
                    let key = self.pop();
                    let base = self.pop();
                    let this = self.pop();
                    let key = self.to_property_key(&key)?;
                    self.super_set(&base, key, v.clone(), &this, code.strict)?;
                    self.stack.push(v);
                }
                Op::GetPrototypeOf => {
                    let v = self.pop();
                    let proto = match v {
                        Value::Object(o) => o.borrow().prototype.map(Value::Object).unwrap_or(Value::Null),
                        _ => Value::Null,
                    };
                    self.stack.push(proto);
                }
                Op::WithHas(name, target) => {
                    let found = match self.stack.last() {
                        Some(Value::Object(o)) => has_property(o, &PropertyKey::from(code.name_at(name))),
                        _ => false,
                    };
                    if found {
                        self.jump(fi, pc, target)?;
                    } else {
                        self.stack.pop();
                    }
                }
                Op::SetPropIfObject(name, target) => {
                    let v = self.pop();
                    let base = self.pop();
                    let is_object = matches!(base, Value::Object(_));
                    if is_object {
                        self.put_value(&base, PropertyKey::from(code.name_at(name)), v.clone(), code.strict)?;
                    }
                    self.stack.push(v);
                    if is_object {
                        self.jump(fi, pc, target)?;
                    }
                }

                // ---- operators
                Op::Add => {
                    let b = self.pop();
                    let a = self.pop();
                    let r = self.add_values(&a, &b)?;
                    self.stack.push(r);
                }
                Op::Sub => {
                    let (x, y) = self.numeric_operands()?;
                    self.stack.push(Value::Number(x - y));
                }
                Op::Mul => {
                    let (x, y) = self.numeric_operands()?;
                    self.stack.push(Value::Number(x * y));
                }
                Op::Div => {
                    let (x, y) = self.numeric_operands()?;
                    self.stack.push(Value::Number(x / y));
                }
                Op::Mod => {
                    let (x, y) = self.numeric_operands()?;
                    self.stack.push(Value::Number(x % y));
                }
                Op::Exp => {
                    let (x, y) = self.numeric_operands()?;
                    self.stack.push(Value::Number(exponentiate(x, y)));
                }
                Op::BitAnd => {
                    let (x, y) = self.numeric_operands()?;
                    self.stack.push(Value::from(to_int32(x) & to_int32(y)));
                }
                Op::BitOr => {
                    let (x, y) = self.numeric_operands()?;
                    self.stack.push(Value::from(to_int32(x) | to_int32(y)));
                }
                Op::BitXor => {
                    let (x, y) = self.numeric_operands()?;
                    self.stack.push(Value::from(to_int32(x) ^ to_int32(y)));
                }
                Op::Shl => {
                    let (x, y) = self.numeric_operands()?;
                    self.stack.push(Value::from(to_int32(x).wrapping_shl(to_uint32(y) & 31)));
                }
                Op::Shr => {
                    let (x, y) = self.numeric_operands()?;
                    self.stack.push(Value::from(to_int32(x) >> (to_uint32(y) & 31)));
                }
                Op::UShr => {
                    let (x, y) = self.numeric_operands()?;
                    self.stack.push(Value::from(to_uint32(x) >> (to_uint32(y) & 31)));
                }
                Op::Eq | Op::NotEq => {
                    let b = self.pop();
                    let a = self.pop();
                    let eq = self.loose_equals(&a, &b)?;
                    self.stack.push(Value::Boolean(eq == (op == Op::Eq)));
                }
                Op::StrictEq | Op::StrictNotEq => {
                    let b = self.pop();
                    let a = self.pop();
                    self.stack.push(Value::Boolean(strict_equals(&a, &b) == (op == Op::StrictEq)));
                }
                Op::Lt | Op::Gt | Op::LtEq | Op::GtEq => {
                    let b = self.pop();
                    let a = self.pop();
                    let result = match op {
                        Op::Lt => self.less_than(&a, &b, true)? == Some(true),
                        Op::Gt => self.less_than(&b, &a, false)? == Some(true),
                        Op::LtEq => self.less_than(&b, &a, false)? == Some(false),
                        _ => self.less_than(&a, &b, true)? == Some(false),
                    };
                    self.stack.push(Value::Boolean(result));
                }
                Op::In => {
                    let obj = self.pop();
                    let key = self.pop();
                    let r = self.has_property_value(&key, &obj)?;
                    self.stack.push(Value::Boolean(r));
                }
                Op::InstanceOf => {
                    let target = self.pop();
                    let v = self.pop();
                    let r = self.instance_of(&v, &target)?;
                    self.stack.push(Value::Boolean(r));
                }
                Op::Neg => {
                    let v = self.pop();
                    let n = self.to_number(&v)?;
                    self.stack.push(Value::Number(-n));
                }
                Op::Plus | Op::ToNumeric => {
                    let v = self.pop();
                    let n = self.to_number(&v)?;
                    self.stack.push(Value::Number(n));
                }
                Op::Not => {
                    let v = self.pop();
                    self.stack.push(Value::Boolean(!v.to_boolean()));
                }
                Op::BitNot => {
                    let v = self.pop();
                    let n = self.to_int32(&v)?;
                    self.stack.push(Value::from(!n));
                }
                Op::TypeOf => {
                    let v = self.pop();
                    self.stack.push(Value::from(v.type_of()));
                }
                Op::Inc | Op::Dec => {
                    let v = self.pop();
                    let n = self.to_number(&v)?;
                    self.stack.push(Value::Number(if op == Op::Inc { n + 1.0 } else { n - 1.0 }));
                }
                Op::ToString => {
                    let v = self.pop();
                    let s = self.to_string(&v)?;
                    self.stack.push(Value::String(s));
                }
                Op::ToObject => {
                    let v = self.pop();
                    let o = self.to_object(&v)?;
                    self.stack.push(Value::Object(o));
                }

                // ---- control flow
                Op::Jump(t) => self.jump(fi, pc, t)?,
                Op::JumpIfFalse(t) => {
                    if !self.pop().to_boolean() {
                        self.jump(fi, pc, t)?;
                    }
                }
                Op::JumpIfTrue(t) => {
                    if self.pop().to_boolean() {
                        self.jump(fi, pc, t)?;
                    }
                }
                Op::JumpIfTrueKeep(t) | Op::JumpIfFalseKeep(t) | Op::JumpIfNotNullishKeep(t) | Op::JumpIfNotUndefinedKeep(t) => {
                    let v = self.peek();
                    let taken = match op {
                        Op::JumpIfTrueKeep(_) => v.to_boolean(),
                        Op::JumpIfFalseKeep(_) => !v.to_boolean(),
                        Op::JumpIfNotNullishKeep(_) => !v.is_null_or_undefined(),
                        _ => !v.is_undefined(),
                    };
                    if taken {
                        self.jump(fi, pc, t)?;
                    } else {
                        self.stack.pop();
                    }
                }
                Op::JumpIfNullishKeep(t) => {
                    if self.stack.last().is_some_and(|v| v.is_null_or_undefined()) {
                        self.jump(fi, pc, t)?;
                    }
                }
                Op::JumpIfUndefined(t) => {
                    if self.pop().is_undefined() {
                        self.jump(fi, pc, t)?;
                    }
                }
                Op::Call(argc, name) => {
                    let args = self.pop_args(argc);
                    let this = self.pop();
                    let f = self.pop();
                    self.call_op(f, this, args, &code, name)?;
                }
                Op::CallSpread(name) => {
                    let list = self.pop();
                    let args = self.array_like_values(&list)?;
                    let this = self.pop();
                    let f = self.pop();
                    self.call_op(f, this, args, &code, name)?;
                }
                Op::New(argc, name) => {
                    let args = self.pop_args(argc);
                    let ctor = self.pop();
                    self.construct_op(ctor, args, None, &code, name)?;
                }
                Op::NewSpread(name) => {
                    let list = self.pop();
                    let args = self.array_like_values(&list)?;
                    let ctor = self.pop();
                    self.construct_op(ctor, args, None, &code, name)?;
                }
                Op::SuperCall(argc) => {
                    let new_target = self.pop();
                    let args = self.pop_args(argc);
                    let parent = self.pop();
                    self.super_call(parent, args, new_target, &code)?;
                }
                Op::SuperCallSpread => {
                    let new_target = self.pop();
                    let list = self.pop();
                    let args = self.array_like_values(&list)?;
                    let parent = self.pop();
                    self.super_call(parent, args, new_target, &code)?;
                }
                Op::CheckDerivedReturn => {
                    let this = self.pop();
                    let result = self.pop();
                    match result {
                        Value::Object(_) => self.stack.push(result),
                        Value::Undefined => {
                            if matches!(this, Value::Uninitialized) {
                                return Err(Self::tdz_error(crate::core::scope::THIS_NAME));
                            }
                            self.stack.push(this);
                        }
                        _ => return Err(raise_type_error!("Derived constructors may only return object or undefined").into()),
                    }
                }
                Op::Return => {
                    let value = self.pop();
                    let Some(frame) = self.frames.pop() else {
                        return Ok(value);
                    };
                    self.stack.truncate(frame.stack_base);
                    self.depth = self.depth.saturating_sub(1);
                    let value = if frame.construct && !matches!(value, Value::Object(_)) {
                        frame.this
                    } else {
                        value
                    };
                    if frame.entry || self.frames.is_empty() {
                        return Ok(value);
                    }
                    self.stack.push(value);
                }
                Op::Throw => {
                    let v = self.pop();
                    let (line, column) = code.location(pc).unzip();
                    return Err(EvalError::Throw(v, line, column));
                }
                Op::EnterTry(target) => {
                    let stack_len = self.stack.len();
                    let frame = &mut self.frames[fi];
                    let env = frame.env;
                    frame.handlers.push(Handler {
                        target: target as usize,
                        stack_len,
                        env,
                    });
                }
                Op::ExitTry => {
                    self.frames[fi].handlers.pop();
                }
                Op::JumpIfToken(token, t) => {
                    if matches!(self.stack.last(), Some(Value::Number(n)) if *n == token as f64) {
                        self.jump(fi, pc, t)?;
                    }
                }
                Op::EndFinally => {
                    let token = self.pop();
                    let value = self.pop();
                    if matches!(token, Value::Number(n) if n == TOKEN_THROW as f64) {
                        return Err(EvalError::Throw(value, None, None));
                    }
                }
                Op::ForInStart => {
                    let v = self.pop();
                    let iter = self.create_for_in_iterator(&v)?;
                    self.stack.push(Value::Object(iter));
                }
                Op::GetIterator => {
                    let v = self.pop();
                    let iter = self.create_list_iterator(&v)?;
                    self.stack.push(Value::Object(iter));
                }
                Op::IterNext(t) => {
                    let iter = self.peek_object()?;
                    match self.iterator_next(&iter)? {
                        Some(v) => self.stack.push(v),
                        None => self.jump(fi, pc, t)?,
                    }
                }
                Op::IterStep => {
                    let iter = self.peek_object()?;
                    let v = self.iterator_next(&iter)?.unwrap_or(Value::Undefined);
                    self.stack.push(v);
                }
                Op::IterRest => {
                    let iter = self.peek_object()?;
                    let mut rest = Vec::new();
                    while let Some(v) = self.iterator_next(&iter)? {
                        rest.push(v);
                    }
                    let arr = self.new_array(rest);
                    self.stack.push(Value::Object(arr));
                }
                Op::SetCompletion => {
                    let v = self.pop();
                    self.frames[fi].completion = v;
                }
                Op::GetCompletion => {
                    let v = self.frames[fi].completion.clone();
                    self.stack.push(v);
                }
                Op::Debugger => log::debug!("debugger statement at {:?}", code.location(pc)),
            }
        }
    }

    // ------------------------------------------------------------ instruction helpers

    pub(crate) fn get_global(&mut self, name: &str, for_typeof: bool) -> Result<Value<'gc>, EvalError<'gc>> {
        let lexical = self.realm.lexicals.borrow().get(name).map(|l| l.value.clone());
        if let Some(v) = lexical {
            if matches!(v, Value::Uninitialized) {
                return Err(Self::tdz_error(name));
            }
            return Ok(v);
        }
        let key = PropertyKey::from(name);
        let global = self.realm.global;
        if has_property(&global, &key) {
            return self.get(&global, &key);
        }
        if for_typeof {
            return Ok(Value::Undefined);
        }
        Err(raise_reference_error!(format!("{name} is not defined")).into())
    }

    pub(crate) fn set_global(&mut self, name: &str, value: Value<'gc>, strict: bool) -> Result<(), EvalError<'gc>> {
        {
            let mut lexicals = self.realm.lexicals.borrow_mut(self.mc);
            if let Some(l) = lexicals.get_mut(name) {
                if matches!(l.value, Value::Uninitialized) {
                    return Err(Self::tdz_error(name));
                }
                if l.is_const {
                    return Err(raise_type_error!("Assignment to constant variable.").into());
                }
                l.value = value;
                return Ok(());
            }
        }
        let key = PropertyKey::from(name);
        let global = Value::Object(self.realm.global);
        if has_property(&self.realm.global, &key) {
            return self.put_value(&global, key, value, strict);
        }
        if strict {
            return Err(raise_reference_error!(format!("{name} is not defined")).into());
        }
        let global = self.realm.global;
        self.create_data_property(&global, key, value)?;
        Ok(())
    }

    fn declare_globals(&mut self, code: &FunctionCode) -> Result<(), EvalError<'gc>> {
        let globals = &code.globals;
        let already = |name: &str| raise_syntax_error!(format!("Identifier '{name}' has already been declared"));
        {
            let lexicals = self.realm.lexicals.borrow();
            for (name, _) in &globals.lexicals {
                if lexicals.contains_key(name) {
                    return Err(already(name).into());
                }
                if get_own_property(&self.realm.global, &PropertyKey::from(name.as_str())).is_some_and(|p| !p.configurable()) {
                    return Err(already(name).into());
                }
            }
            for name in globals.vars.iter().chain(&globals.functions) {
                if lexicals.contains_key(name) {
                    return Err(already(name).into());
                }
            }
        }
        let mut lexicals = self.realm.lexicals.borrow_mut(self.mc);
        for (name, is_const) in &globals.lexicals {
            lexicals.insert(
                name.clone(),
                GlobalLexical {
                    value: Value::Uninitialized,
                    is_const: *is_const,
                },
            );
        }
        drop(lexicals);
        for name in &globals.vars {
            let key = PropertyKey::from(name.as_str());
            if get_own_property(&self.realm.global, &key).is_none() {
                let desc = PropertyDescriptor {
                    value: Some(Value::Undefined),
                    writable: Some(true),
                    enumerable: Some(true),
                    configurable: Some(false),
                    ..PropertyDescriptor::default()
                };
                define_own_property(self.mc, &self.realm.global, key, &desc)?;
            }
        }
        Ok(())
    }

    fn create_arguments(&mut self, fi: usize, mapped: bool) -> JSObjectDataPtr<'gc> {
        let frame = &self.frames[fi];
        let args = frame.args.clone();
        let slots: Vec<Option<u32>> = if mapped {
            frame.code.mapped_params.iter().take(args.len()).copied().collect()
        } else {
            Vec::new()
        };
        let env = if mapped { frame.env } else { None };
        let callee = frame.callee;
        let obj = new_js_object_with_kind(self.mc, Some(self.realm.object_prototype), ObjectKind::Arguments { env, mapped: slots });
        {
            let mut o = obj.borrow_mut(self.mc);
            for (i, a) in args.iter().enumerate() {
                o.insert(PropertyKey::Index(i as u32), Property::data(a.clone()));
            }
            o.insert("length", Property::hidden(Value::from(args.len())));
            if mapped && let Some(c) = callee {
                o.insert("callee", Property::hidden(Value::Object(c)));
            }
        }
        obj
    }

    /// Allocates a function object for compiled code.
    pub(crate) fn make_closure(
        &mut self,
        code: Rc<FunctionCode>,
        env: Option<EnvPtr<'gc>>,
        home_object: Option<JSObjectDataPtr<'gc>>,
    ) -> JSObjectDataPtr<'gc> {
        let plain_constructor = code.kind == CodeKind::Normal;
        let name = code.name.clone();
        let length = code.param_count;
        let obj = new_js_object_with_kind(
            self.mc,
            Some(self.realm.function_prototype),
            ObjectKind::Function(Closure { code, env, home_object }),
        );
        {
            let mut o = obj.borrow_mut(self.mc);
            o.insert("length", function_meta(Value::from(length)));
            o.insert("name", function_meta(Value::from(name)));
        }
        if plain_constructor {
            let proto = new_js_object(self.mc, Some(self.realm.object_prototype));
            proto.borrow_mut(self.mc).insert("constructor", Property::hidden(Value::Object(obj)));
            obj.borrow_mut(self.mc).insert(
                "prototype",
                Property::Data {
                    value: Value::Object(proto),
                    writable: true,
                    enumerable: false,
                    configurable: false,
                },
            );
        }
        obj
    }

    /// `[super?, F]` -> `(F, F.prototype)` with both prototype chains linked.
    fn define_class(&mut self, has_super: bool) -> Result<(JSObjectDataPtr<'gc>, JSObjectDataPtr<'gc>), EvalError<'gc>> {
        let ctor = self.pop_object()?;
        let (proto_parent, ctor_parent) = if has_super {
            match self.pop() {
                Value::Null => (None, self.realm.function_prototype),
                Value::Object(parent) if parent.borrow().is_constructor() => {
                    match self.get(&parent, &PropertyKey::from("prototype"))? {
                        Value::Object(p) => (Some(p), parent),
                        Value::Null => (None, parent),
                        other => {
                            return Err(raise_type_error!(format!(
                                "Class extends value does not have valid prototype property {}",
                                value_to_display_string(&other)
                            ))
                            .into());
                        }
                    }
                }
                other => {
                    let text = match other {
                        Value::Object(_) => "[object Object]".to_string(),
                        v => value_to_display_string(&v),
                    };
                    return Err(raise_type_error!(format!("Class extends value {text} is not a constructor or null")).into());
                }
            }
        } else {
            (Some(self.realm.object_prototype), self.realm.function_prototype)
        };
        let proto = new_js_object(self.mc, proto_parent);
        proto.borrow_mut(self.mc).insert("constructor", Property::hidden(Value::Object(ctor)));
        let mut c = ctor.borrow_mut(self.mc);
        c.prototype = Some(ctor_parent);
        c.insert(
            "prototype",
            Property::Data {
                value: Value::Object(proto),
                writable: false,
                enumerable: false,
                configurable: false,
            },
        );
        if let ObjectKind::Function(closure) = &mut c.kind {
            closure.home_object = Some(proto);
        }
        Ok((ctor, proto))
    }

    fn define_method(
        &mut self,
        obj: &JSObjectDataPtr<'gc>,
        key: &Value<'gc>,
        func: JSObjectDataPtr<'gc>,
        kind: MethodKind,
        enumerable: bool,
    ) -> Result<(), EvalError<'gc>> {
        let key = self.to_property_key(key)?;
        let base = key.to_string();
        let name = match kind {
            MethodKind::Method => base,
            MethodKind::Getter => format!("get {base}"),
            MethodKind::Setter => format!("set {base}"),
        };
        {
            let mut f = func.borrow_mut(self.mc);
            if let ObjectKind::Function(closure) = &mut f.kind {
                closure.home_object = Some(*obj);
            }
            f.insert("name", function_meta(Value::from(name)));
        }
        let desc = match kind {
            MethodKind::Method => PropertyDescriptor {
                value: Some(Value::Object(func)),
                writable: Some(true),
                enumerable: Some(enumerable),
                configurable: Some(true),
                ..PropertyDescriptor::default()
            },
            MethodKind::Getter => PropertyDescriptor {
                get: Some(Some(func)),
                enumerable: Some(enumerable),
                configurable: Some(true),
                ..PropertyDescriptor::default()
            },
            MethodKind::Setter => PropertyDescriptor {
                set: Some(Some(func)),
                enumerable: Some(enumerable),
                configurable: Some(true),
                ..PropertyDescriptor::default()
            },
        };
        define_own_property(self.mc, obj, key, &desc)?;
        Ok(())
    }

    fn delete_op(&mut self, base: &Value<'gc>, key: PropertyKey, strict: bool) -> Result<bool, EvalError<'gc>> {
        let obj = self.to_object(base)?;
        let deleted = delete_property(self.mc, &obj, &key);
        if !deleted && strict {
            return Err(raise_type_error!(format!("Cannot delete property '{key}' of {}", value_to_display_string(base))).into());
        }
        Ok(deleted)
    }

    fn super_get(&mut self, base: &Value<'gc>, key: &PropertyKey, this: &Value<'gc>) -> Result<Value<'gc>, EvalError<'gc>> {
        match base {
            Value::Object(b) => self.get_with_receiver(b, key, this),
            _ => Err(raise_type_error!(format!("Cannot read properties of null (reading '{key}')")).into()),
        }
    }

    fn super_set(&mut self, base: &Value<'gc>, key: PropertyKey, value: Value<'gc>, this: &Value<'gc>, strict: bool) -> Result<(), EvalError<'gc>> {
        let Value::Object(b) = base else {
            return Err(raise_type_error!(format!("Cannot set properties of null (setting '{key}')")).into());
        };
        let text = key.to_string();
        if !self.set(b, key, value, this)? && strict {
            return Err(raise_type_error!(format!("Cannot assign to read only property '{text}' of object")).into());
        }
        Ok(())
    }

    fn super_call(&mut self, parent: Value<'gc>, args: Vec<Value<'gc>>, new_target: Value<'gc>, code: &FunctionCode) -> Result<(), EvalError<'gc>> {
        if !matches!(&parent, Value::Object(p) if p.borrow().is_constructor()) {
            return Err(raise_type_error!("Super constructor is not a constructor").into());
        }
        let Value::Object(nt) = new_target else {
            return Err(raise_syntax_error!("'super' keyword unexpected here").into());
        };
        self.construct_op(parent, args, Some(nt), code, NO_NAME)
    }
}
