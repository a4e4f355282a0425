//! Code generator: turns a resolved (and optionally optimized) AST into
//! [`FunctionCode`] for the VM.
//!
//! Every expression leaves exactly one value on the stack. Statements leave the
//! stack as they found it, except inside `for-in`/`for-of` bodies (the iterator
//! stays on the stack) and finally blocks (the pending completion stays on the
//! stack as `[value, token]`). Non-local exits walk the control stack and emit
//! whatever cleanup the crossed constructs need; a crossed finally block takes
//! over the exit and resumes it through its token dispatch.

use crate::core::bytecode::{FIRST_JUMP_TOKEN, GlobalDeclarations, LineEntry, NO_NAME, TemplateStrings, TOKEN_NORMAL, TOKEN_RETURN, TOKEN_THROW};
use crate::core::scope::{CALLEE_NAME, NEW_TARGET_NAME, THIS_NAME, direct_function_declarations};
use crate::core::{
    ArgumentsMode, AssignOp, BinaryOp, Binding, Block, ClassNode, CodeKind, Expr, ExprKind, ForBinding, ForInit, FunctionCode,
    FunctionKind, FunctionNode, Identifier, LogicalOp, MemberProperty, MethodKind, Mutability, Op,
    Pattern, PatternElem, Program, PropKey, PropertyDef, ScopeInfo, Statement, StatementKind, UnaryOp, VarDeclarator,
    VarKind,
};
use crate::error::JSError;
use crate::raise_syntax_error;
use crate::unicode::utf8_to_utf16;
use std::collections::HashMap;
use std::rc::Rc;

/// Compiles a resolved script into its top-level code object.
pub fn compile_program(program: &Program) -> Result<Rc<FunctionCode>, JSError> {
    let mut code = FunctionCode::new("", CodeKind::Script, program.strict);
    code.local_count = program.local_count;
    code.source = program.source.clone();
    code.globals = GlobalDeclarations {
        vars: program.var_names.clone(),
        functions: program.function_names.clone(),
        lexicals: program.lexical_names.clone(),
    };
    let mut c = FunctionCompiler::new(code, None);
    let globals = &c.code.globals;
    if !(globals.vars.is_empty() && globals.functions.is_empty() && globals.lexicals.is_empty()) {
        c.emit(Op::DeclareGlobals);
    }
    for f in direct_function_declarations(&program.body) {
        let Some(name) = &f.name else { continue };
        c.mark(f.line, f.column);
        let idx = c.function(f, None)?;
        c.emit(Op::Closure(idx));
        let n = c.name(&name.name);
        c.emit(Op::DefineGlobalFunction(n));
    }
    c.statements(&program.body)?;
    c.emit(Op::GetCompletion);
    c.emit(Op::Return);
    let code = c.finish();
    log::debug!("compiled script: {} instructions, {} functions", code.ops.len(), code.functions.len());
    Ok(Rc::new(code))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Label(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Exit {
    Break(usize),
    Continue(usize),
    Return,
}

enum Control {
    Loop {
        labels: Vec<String>,
        break_target: Label,
        continue_target: Label,
        /// The loop keeps an iterator on the stack.
        iterator: bool,
    },
    Breakable {
        labels: Vec<String>,
        break_target: Label,
        is_switch: bool,
    },
    /// A materialized scope: leaving it pops the environment.
    Env,
    /// Inside a `try` block with a catch handler only.
    Try,
    /// Inside a `try` or `catch` block guarded by the finally block `finally`.
    Finally(usize),
    /// Inside a finally body, with `[value, token]` on the stack.
    FinallyBody,
}

struct FinallyInfo {
    entry: Label,
    /// Exits routed through this finally block, with the token that selects them.
    exits: Vec<(u32, Exit)>,
}

/// How a destructuring target receives its value.
#[derive(Clone, Copy, PartialEq, Eq)]
enum BindMode {
    Assign,
    Var,
    Lexical,
}

/// An assignable reference, after its base values have been pushed.
enum Ref<'a> {
    Binding(&'a Identifier),
    Named(u32),
    Keyed,
    SuperNamed(u32),
    SuperKeyed,
}

struct FunctionCompiler {
    code: FunctionCode,
    controls: Vec<Control>,
    finallies: Vec<FinallyInfo>,
    labels: Vec<Option<u32>>,
    fixups: Vec<(usize, Label)>,
    string_map: HashMap<Vec<u16>, u32>,
    name_map: HashMap<String, u32>,
    /// Materialized scopes entered inside the function body.
    env_depth: u32,
    /// Binding of `this` for derived class constructors, read on return.
    derived_this: Option<Binding>,
    /// Landing pads of the optional chains being compiled: (label, extra stack values).
    chains: Vec<Vec<(Label, u8)>>,
    pending_labels: Vec<String>,
}

impl FunctionCompiler {
    fn new(code: FunctionCode, derived_this: Option<Binding>) -> Self {
        FunctionCompiler {
            code,
            controls: Vec::new(),
            finallies: Vec::new(),
            labels: Vec::new(),
            fixups: Vec::new(),
            string_map: HashMap::new(),
            name_map: HashMap::new(),
            env_depth: 0,
            derived_this,
            chains: Vec::new(),
            pending_labels: Vec::new(),
        }
    }

    fn finish(mut self) -> FunctionCode {
        for (pos, label) in std::mem::take(&mut self.fixups) {
            let target = self.labels[label.0].unwrap_or(self.code.ops.len() as u32);
            self.code.ops[pos].set_target(target);
        }
        self.code
    }

    // ---------------------------------------------------------------- emission helpers

    fn emit(&mut self, op: Op) {
        self.code.ops.push(op);
    }

    fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    fn bind(&mut self, label: Label) {
        self.labels[label.0] = Some(self.code.ops.len() as u32);
    }

    fn emit_jump(&mut self, op: Op, label: Label) {
        self.fixups.push((self.code.ops.len(), label));
        self.emit(op);
    }

    fn mark(&mut self, line: usize, column: usize) {
        let pc = self.code.ops.len() as u32;
        match self.code.lines.last_mut() {
            Some(last) if last.pc == pc => {
                last.line = line;
                last.column = column;
            }
            Some(last) if last.line == line && last.column == column => {}
            _ => self.code.lines.push(LineEntry { pc, line, column }),
        }
    }

    fn string(&mut self, s: &[u16]) -> u32 {
        if let Some(i) = self.string_map.get(s) {
            return *i;
        }
        let i = self.code.strings.len() as u32;
        self.code.strings.push(s.to_vec());
        self.string_map.insert(s.to_vec(), i);
        i
    }

    fn name(&mut self, s: &str) -> u32 {
        if let Some(i) = self.name_map.get(s) {
            return *i;
        }
        let i = self.code.names.len() as u32;
        self.code.names.push(s.to_string());
        self.name_map.insert(s.to_string(), i);
        i
    }

    fn alloc_temp(&mut self) -> u32 {
        self.code.local_count += 1;
        self.code.local_count - 1
    }

    fn pop_n(&mut self, n: u8) {
        for _ in 0..n {
            self.emit(Op::Pop);
        }
    }

    fn dup_n(&mut self, n: u8) {
        match n {
            0 => {}
            1 => self.emit(Op::Dup),
            n => self.emit(Op::DupN(n)),
        }
    }

    fn roll(&mut self, n: u8) {
        match n {
            0 => {}
            1 => self.emit(Op::Swap),
            n => self.emit(Op::Roll(n)),
        }
    }

    // ---------------------------------------------------------------- scopes

    fn enter_scope(&mut self, scope: &ScopeInfo) {
        if scope.materialized {
            self.emit(Op::PushEnv(scope.env_size));
            self.controls.push(Control::Env);
            self.env_depth += 1;
        }
        for lexical in &scope.lexicals {
            self.emit(Op::Uninitialized);
            self.init_binding(lexical, true);
            self.emit(Op::Pop);
        }
    }

    fn exit_scope(&mut self, scope: &ScopeInfo) {
        if scope.materialized {
            self.emit(Op::PopEnv);
            self.controls.pop();
            self.env_depth -= 1;
        }
    }

    /// Instantiates the function declarations of a block or function body.
    fn hoist_functions<'a>(&mut self, decls: impl Iterator<Item = &'a FunctionNode>) -> Result<(), JSError> {
        for f in decls {
            let Some(name) = &f.name else { continue };
            let idx = self.function(f, None)?;
            self.emit(Op::Closure(idx));
            self.init_binding(name, false);
            self.emit(Op::Pop);
        }
        Ok(())
    }

    // ---------------------------------------------------------------- bindings

    fn get_binding(&mut self, id: &Identifier, for_typeof: bool) {
        let name = self.name(&id.name);
        match id.binding {
            Binding::Local(slot) => self.emit(if id.tdz { Op::GetLocalChecked(slot, name) } else { Op::GetLocal(slot) }),
            Binding::Heap { depth, slot } => self.emit(if id.tdz {
                Op::GetHeapChecked(depth, slot, name)
            } else {
                Op::GetHeap(depth, slot)
            }),
            Binding::Frame => match id.name.as_str() {
                THIS_NAME => self.emit(if id.tdz { Op::LoadThisChecked } else { Op::LoadThis }),
                NEW_TARGET_NAME => self.emit(Op::LoadNewTarget),
                CALLEE_NAME => self.emit(Op::LoadCallee),
                _ => self.emit(Op::Undefined),
            },
            Binding::Global => match id.name.as_str() {
                THIS_NAME => self.emit(Op::LoadGlobalThis),
                NEW_TARGET_NAME => self.emit(Op::Undefined),
                _ => self.emit(if for_typeof { Op::GetGlobalForTypeof(name) } else { Op::GetGlobal(name) }),
            },
            Binding::Unresolved => self.emit(Op::Undefined),
        }
    }

    /// Assignment to a resolved binding; the value stays on the stack.
    fn set_binding(&mut self, id: &Identifier) {
        let name = self.name(&id.name);
        match id.mutability {
            Mutability::Const => {
                if id.tdz {
                    self.get_binding(id, false);
                    self.emit(Op::Pop);
                }
                self.emit(Op::ThrowConstAssign(name));
                return;
            }
            Mutability::FunctionName => {
                if self.code.strict {
                    self.emit(Op::ThrowConstAssign(name));
                }
                return;
            }
            Mutability::Mutable => {}
        }
        match id.binding {
            Binding::Local(slot) => self.emit(if id.tdz { Op::SetLocalChecked(slot, name) } else { Op::SetLocal(slot) }),
            Binding::Heap { depth, slot } => self.emit(if id.tdz {
                Op::SetHeapChecked(depth, slot, name)
            } else {
                Op::SetHeap(depth, slot)
            }),
            Binding::Global => self.emit(Op::SetGlobal(name)),
            Binding::Frame | Binding::Unresolved => {}
        }
    }

    /// Declaration-time initialization; no TDZ or const checks.
    fn init_binding(&mut self, id: &Identifier, lexical: bool) {
        match id.binding {
            Binding::Local(slot) => self.emit(Op::SetLocal(slot)),
            Binding::Heap { depth, slot } => self.emit(Op::SetHeap(depth, slot)),
            Binding::Global => {
                let name = self.name(&id.name);
                self.emit(if lexical { Op::InitGlobalLexical(name) } else { Op::SetGlobal(name) });
            }
            Binding::Frame | Binding::Unresolved => {}
        }
    }

    // ---------------------------------------------------------------- references

    fn prepare_identifier<'a>(&mut self, id: &'a Identifier) -> Ref<'a> {
        if !id.with_objects.is_empty() {
            let name = self.name(&id.name);
            let found = self.new_label();
            for w in &id.with_objects {
                let hidden = Identifier {
                    binding: *w,
                    ..Identifier::default()
                };
                self.get_binding(&hidden, false);
                self.emit_jump(Op::WithHas(name, 0), found);
            }
            self.emit(Op::Undefined);
            self.bind(found);
        }
        Ref::Binding(id)
    }

    fn prepare_member<'a>(&mut self, e: &'a Expr) -> Result<Ref<'a>, JSError> {
        match &e.kind {
            ExprKind::Identifier(id) => Ok(self.prepare_identifier(id)),
            ExprKind::Member { object, property, .. } => {
                self.expr(object)?;
                match property {
                    MemberProperty::Named(n) => Ok(Ref::Named(self.name(n))),
                    MemberProperty::Computed(k) => {
                        self.expr(k)?;
                        self.emit(Op::ToPropertyKey);
                        Ok(Ref::Keyed)
                    }
                }
            }
            ExprKind::SuperMember { property, this } => {
                self.get_binding(this, false);
                self.emit(Op::SuperBase);
                match property {
                    MemberProperty::Named(n) => Ok(Ref::SuperNamed(self.name(n))),
                    MemberProperty::Computed(k) => {
                        self.expr(k)?;
                        self.emit(Op::ToPropertyKey);
                        Ok(Ref::SuperKeyed)
                    }
                }
            }
            _ => Err(raise_syntax_error!("Invalid left-hand side in assignment")),
        }
    }

    fn prepare_ref<'a>(&mut self, target: &'a Pattern) -> Result<Ref<'a>, JSError> {
        match target {
            Pattern::Identifier(id) => Ok(self.prepare_identifier(id)),
            Pattern::Expr(e) => self.prepare_member(e),
            _ => Err(raise_syntax_error!("Invalid destructuring assignment target")),
        }
    }

    fn ref_base_size(r: &Ref<'_>) -> u8 {
        match r {
            Ref::Binding(id) if id.with_objects.is_empty() => 0,
            Ref::Binding(_) | Ref::Named(_) => 1,
            Ref::Keyed | Ref::SuperNamed(_) => 2,
            Ref::SuperKeyed => 3,
        }
    }

    fn ref_get(&mut self, r: &Ref<'_>) {
        match r {
            Ref::Binding(id) if id.with_objects.is_empty() => self.get_binding(id, false),
            Ref::Binding(id) => {
                let name = self.name(&id.name);
                let plain = self.new_label();
                let done = self.new_label();
                self.emit(Op::Dup);
                self.emit_jump(Op::JumpIfUndefined(0), plain);
                self.emit(Op::GetProp(name));
                self.emit_jump(Op::Jump(0), done);
                self.bind(plain);
                self.emit(Op::Pop);
                self.get_binding(id, false);
                self.bind(done);
            }
            Ref::Named(n) => self.emit(Op::GetProp(*n)),
            Ref::Keyed => self.emit(Op::GetElem),
            Ref::SuperNamed(n) => self.emit(Op::GetSuperProp(*n)),
            Ref::SuperKeyed => self.emit(Op::GetSuperElem),
        }
    }

    fn ref_set(&mut self, r: &Ref<'_>) {
        match r {
            Ref::Binding(id) if id.with_objects.is_empty() => self.set_binding(id),
            Ref::Binding(id) => {
                let name = self.name(&id.name);
                let done = self.new_label();
                self.emit_jump(Op::SetPropIfObject(name, 0), done);
                self.set_binding(id);
                self.bind(done);
            }
            Ref::Named(n) => self.emit(Op::SetProp(*n)),
            Ref::Keyed => self.emit(Op::SetElem),
            Ref::SuperNamed(n) => self.emit(Op::SetSuperProp(*n)),
            Ref::SuperKeyed => self.emit(Op::SetSuperElem),
        }
    }

    // ---------------------------------------------------------------- destructuring

    /// Consumes the value on top of the stack, binding it to `target`.
    fn bind_pattern(&mut self, target: &Pattern, mode: BindMode) -> Result<(), JSError> {
        match target {
            Pattern::Identifier(id) if mode == BindMode::Lexical => {
                self.init_binding(id, true);
                self.emit(Op::Pop);
            }
            Pattern::Identifier(_) | Pattern::Expr(_) => {
                let r = self.prepare_ref(target)?;
                let n = Self::ref_base_size(&r);
                self.roll(n);
                self.ref_set(&r);
                self.emit(Op::Pop);
            }
            Pattern::Array { elements, rest } => {
                self.emit(Op::GetIterator);
                for el in elements {
                    self.emit(Op::IterStep);
                    match el {
                        Some(el) => self.bind_element(el, mode)?,
                        None => self.emit(Op::Pop),
                    }
                }
                if let Some(r) = rest {
                    self.emit(Op::IterRest);
                    self.bind_pattern(r, mode)?;
                }
                self.emit(Op::Pop);
            }
            Pattern::Object { props, rest } => {
                self.emit(Op::CheckObjectCoercible);
                let keys = match rest {
                    Some(_) => {
                        let tmp = self.alloc_temp();
                        self.emit(Op::NewArray);
                        self.emit(Op::SetLocal(tmp));
                        self.emit(Op::Pop);
                        Some(tmp)
                    }
                    None => None,
                };
                for p in props {
                    self.emit(Op::Dup);
                    match &p.key {
                        PropKey::Named(n) => {
                            if let Some(tmp) = keys {
                                let s = self.string(&utf8_to_utf16(n));
                                self.emit(Op::GetLocal(tmp));
                                self.emit(Op::String(s));
                                self.emit(Op::ArrayPush);
                                self.emit(Op::Pop);
                            }
                            let name = self.name(n);
                            self.emit(Op::GetProp(name));
                        }
                        PropKey::Computed(k) => {
                            self.expr(k)?;
                            self.emit(Op::ToPropertyKey);
                            if let Some(tmp) = keys {
                                self.emit(Op::Dup);
                                self.emit(Op::GetLocal(tmp));
                                self.emit(Op::Swap);
                                self.emit(Op::ArrayPush);
                                self.emit(Op::Pop);
                            }
                            self.emit(Op::GetElem);
                        }
                    }
                    self.bind_default(&p.value, p.default.as_ref())?;
                    self.bind_pattern(&p.value, mode)?;
                }
                if let (Some(r), Some(tmp)) = (rest, keys) {
                    self.emit(Op::Dup);
                    self.emit(Op::GetLocal(tmp));
                    self.emit(Op::ObjectRest);
                    self.bind_pattern(r, mode)?;
                }
                self.emit(Op::Pop);
            }
        }
        Ok(())
    }

    fn bind_element(&mut self, el: &PatternElem, mode: BindMode) -> Result<(), JSError> {
        self.bind_default(&el.target, el.default.as_ref())?;
        self.bind_pattern(&el.target, mode)
    }

    /// Replaces an `undefined` value on top of the stack with the default.
    fn bind_default(&mut self, target: &Pattern, default: Option<&Expr>) -> Result<(), JSError> {
        if let Some(d) = default {
            let skip = self.new_label();
            self.emit_jump(Op::JumpIfNotUndefinedKeep(0), skip);
            match target {
                Pattern::Identifier(id) => self.expr_named(d, &id.name)?,
                _ => self.expr(d)?,
            }
            self.bind(skip);
        }
        Ok(())
    }

    // ---------------------------------------------------------------- functions and classes

    /// Compiles a nested function and returns its index in the function table.
    fn function(&mut self, f: &FunctionNode, name_hint: Option<&str>) -> Result<u32, JSError> {
        let code = compile_function(f, name_hint)?;
        self.code.functions.push(Rc::new(code));
        Ok(self.code.functions.len() as u32 - 1)
    }

    fn class(&mut self, c: &ClassNode, name_hint: Option<&str>) -> Result<(), JSError> {
        let name = c.name.as_ref().map(|n| n.name.as_str()).or(name_hint).unwrap_or("");
        self.enter_scope(&c.scope);
        if let Some(sc) = &c.super_class {
            self.expr(sc)?;
        }
        let ctor = match &c.constructor {
            Some(f) => {
                let mut code = compile_function(f, Some(name))?;
                code.name = name.to_string();
                code.source = c.source.clone();
                code
            }
            None => default_constructor(name, c.super_class.is_some(), &c.source),
        };
        self.code.functions.push(Rc::new(ctor));
        let idx = self.code.functions.len() as u32 - 1;
        self.emit(Op::Closure(idx));
        self.emit(Op::Class {
            has_super: c.super_class.is_some(),
        });
        for m in &c.members {
            if m.is_static {
                self.emit(Op::Swap);
            }
            self.property_key(&m.key)?;
            let idx = self.function(&m.func, None)?;
            self.emit(Op::Closure(idx));
            self.emit(Op::DefineMethod {
                kind: m.kind,
                enumerable: false,
            });
            if m.is_static {
                self.emit(Op::Swap);
            }
        }
        self.emit(Op::Pop);
        if let Some(inner) = &c.inner_name {
            self.init_binding(inner, true);
        }
        self.exit_scope(&c.scope);
        Ok(())
    }

    fn property_key(&mut self, key: &PropKey) -> Result<(), JSError> {
        match key {
            PropKey::Named(n) => {
                let s = self.string(&utf8_to_utf16(n));
                self.emit(Op::String(s));
            }
            PropKey::Computed(e) => {
                self.expr(e)?;
                self.emit(Op::ToPropertyKey);
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------- expressions

    /// Compiles `e`, naming it `name` when it is an anonymous function or class.
    fn expr_named(&mut self, e: &Expr, name: &str) -> Result<(), JSError> {
        match &e.kind {
            ExprKind::Function(f) if f.name.is_none() => {
                let idx = self.function(f, Some(name))?;
                self.emit(Op::Closure(idx));
                Ok(())
            }
            ExprKind::Class(c) if c.name.is_none() => self.class(c, Some(name)),
            _ => self.expr(e),
        }
    }

    fn expr(&mut self, e: &Expr) -> Result<(), JSError> {
        match &e.kind {
            ExprKind::Number(n) => self.emit(Op::Number(*n)),
            ExprKind::String(s) => {
                let i = self.string(s);
                self.emit(Op::String(i));
            }
            ExprKind::Boolean(b) => self.emit(if *b { Op::True } else { Op::False }),
            ExprKind::Null => self.emit(Op::Null),
            ExprKind::Regex { pattern, flags } => {
                if let Err(mut err) = crate::js_regexp::compile_regex(&utf8_to_utf16(pattern), flags) {
                    err.set_js_location(e.line, e.column);
                    return Err(err);
                }
                self.code.regexes.push((pattern.clone(), flags.clone()));
                self.emit(Op::RegExp(self.code.regexes.len() as u32 - 1));
            }
            ExprKind::Template { quasis, exprs } => {
                let first = self.string(quasis.first().map(Vec::as_slice).unwrap_or(&[]));
                self.emit(Op::String(first));
                for (i, x) in exprs.iter().enumerate() {
                    self.expr(x)?;
                    self.emit(Op::ToString);
                    self.emit(Op::Add);
                    if let Some(q) = quasis.get(i + 1)
                        && !q.is_empty()
                    {
                        let s = self.string(q);
                        self.emit(Op::String(s));
                        self.emit(Op::Add);
                    }
                }
            }
            ExprKind::TaggedTemplate { tag, cooked, raw, exprs } => {
                let name = self.callee(tag)?;
                self.code.templates.push(TemplateStrings {
                    cooked: cooked.clone(),
                    raw: raw.clone(),
                });
                self.emit(Op::TemplateObject(self.code.templates.len() as u32 - 1));
                for x in exprs {
                    self.expr(x)?;
                }
                self.mark(e.line, e.column);
                self.emit(Op::Call(exprs.len() as u32 + 1, name));
            }
            ExprKind::Identifier(id) | ExprKind::This(id) | ExprKind::NewTarget(id) => {
                let r = self.prepare_identifier(id);
                self.ref_get(&r);
            }
            ExprKind::Array(elements) => {
                self.emit(Op::NewArray);
                for el in elements {
                    match el {
                        None => self.emit(Op::ArrayHole),
                        Some(Expr {
                            kind: ExprKind::Spread(x), ..
                        }) => {
                            self.expr(x)?;
                            self.emit(Op::ArraySpread);
                        }
                        Some(x) => {
                            self.expr(x)?;
                            self.emit(Op::ArrayPush);
                        }
                    }
                }
            }
            ExprKind::Object(props) => self.object_literal(props)?,
            ExprKind::Function(f) => {
                let idx = self.function(f, None)?;
                self.emit(Op::Closure(idx));
            }
            ExprKind::Class(c) => self.class(c, None)?,
            ExprKind::Unary(op, x) => self.unary(*op, x)?,
            ExprKind::Update { increment, prefix, target } => {
                let r = self.prepare_ref(target)?;
                let n = Self::ref_base_size(&r);
                self.dup_n(n);
                self.ref_get(&r);
                let step = if *increment { Op::Inc } else { Op::Dec };
                if *prefix {
                    self.emit(step);
                    self.ref_set(&r);
                } else {
                    self.emit(Op::ToNumeric);
                    self.emit(Op::Dup);
                    self.emit(Op::Bury(n + 1));
                    self.emit(step);
                    self.ref_set(&r);
                    self.emit(Op::Pop);
                }
            }
            ExprKind::Binary(op, l, r) => {
                self.expr(l)?;
                self.expr(r)?;
                self.mark(e.line, e.column);
                self.emit(binary_op(*op));
            }
            ExprKind::Logical(op, l, r) => {
                let end = self.new_label();
                self.expr(l)?;
                self.emit_jump(logical_jump(*op), end);
                self.expr(r)?;
                self.bind(end);
            }
            ExprKind::Assign { op, target, value } => self.assignment(*op, target, value)?,
            ExprKind::Conditional(test, cons, alt) => {
                let otherwise = self.new_label();
                let end = self.new_label();
                self.expr(test)?;
                self.emit_jump(Op::JumpIfFalse(0), otherwise);
                self.expr(cons)?;
                self.emit_jump(Op::Jump(0), end);
                self.bind(otherwise);
                self.expr(alt)?;
                self.bind(end);
            }
            ExprKind::Call { callee, args, optional } => {
                let name = self.callee(callee)?;
                if *optional {
                    self.emit(Op::Swap);
                    self.optional_check(1)?;
                    self.emit(Op::Swap);
                }
                self.mark(e.line, e.column);
                self.arguments(args, |argc| Op::Call(argc, name), Op::CallSpread(name))?;
            }
            ExprKind::New { callee, args } => {
                let name = self.callee_name(callee);
                self.expr(callee)?;
                self.mark(e.line, e.column);
                self.arguments(args, |argc| Op::New(argc, name), Op::NewSpread(name))?;
            }
            ExprKind::Member { object, property, optional } => {
                self.expr(object)?;
                if *optional {
                    self.optional_check(0)?;
                }
                self.mark(e.line, e.column);
                match property {
                    MemberProperty::Named(n) => {
                        let n = self.name(n);
                        self.emit(Op::GetProp(n));
                    }
                    MemberProperty::Computed(k) => {
                        self.expr(k)?;
                        self.emit(Op::GetElem);
                    }
                }
            }
            ExprKind::OptionalChain(inner) => {
                self.chains.push(Vec::new());
                self.expr(inner)?;
                let pads = self.chains.pop().unwrap_or_default();
                if !pads.is_empty() {
                    let end = self.new_label();
                    let undefined = self.new_label();
                    self.emit_jump(Op::Jump(0), end);
                    for (label, extra) in pads {
                        self.bind(label);
                        self.pop_n(extra + 1);
                        self.emit_jump(Op::Jump(0), undefined);
                    }
                    self.bind(undefined);
                    self.emit(Op::Undefined);
                    self.bind(end);
                }
            }
            ExprKind::SuperMember { .. } => {
                let r = self.prepare_member(e)?;
                self.ref_get(&r);
            }
            ExprKind::SuperCall {
                args,
                this,
                callee,
                new_target,
            } => {
                self.get_binding(callee, false);
                self.emit(Op::GetPrototypeOf);
                let spread = args.iter().any(|a| matches!(a.kind, ExprKind::Spread(_)));
                if spread {
                    self.spread_arguments(args)?;
                } else {
                    for a in args {
                        self.expr(a)?;
                    }
                }
                self.get_binding(new_target, false);
                self.mark(e.line, e.column);
                self.emit(if spread { Op::SuperCallSpread } else { Op::SuperCall(args.len() as u32) });
                match this.binding {
                    Binding::Heap { depth, slot } => self.emit(Op::BindHeapThis(depth, slot)),
                    _ => self.emit(Op::BindThis),
                }
            }
            ExprKind::Sequence(xs) => {
                for (i, x) in xs.iter().enumerate() {
                    self.expr(x)?;
                    if i + 1 < xs.len() {
                        self.emit(Op::Pop);
                    }
                }
            }
            ExprKind::Spread(_) => return Err(raise_syntax_error!("Unexpected spread element")),
        }
        Ok(())
    }

    /// Emits a nullish check inside an optional chain. `extra` values sit below
    /// the checked value and are discarded on short-circuit.
    fn optional_check(&mut self, extra: u8) -> Result<(), JSError> {
        let label = self.new_label();
        self.emit_jump(Op::JumpIfNullishKeep(0), label);
        match self.chains.last_mut() {
            Some(pads) => {
                pads.push((label, extra));
                Ok(())
            }
            None => Err(raise_syntax_error!("Invalid optional chain")),
        }
    }

    fn callee_name(&mut self, callee: &Expr) -> u32 {
        let text = match &callee.kind {
            ExprKind::Identifier(id) => Some(id.name.clone()),
            ExprKind::Member {
                object,
                property: MemberProperty::Named(n),
                ..
            } => Some(match &object.kind {
                ExprKind::Identifier(o) => format!("{}.{n}", o.name),
                ExprKind::This(_) => format!("this.{n}"),
                _ => n.clone(),
            }),
            ExprKind::SuperMember {
                property: MemberProperty::Named(n),
                ..
            } => Some(format!("super.{n}")),
            _ => None,
        };
        match text {
            Some(t) => self.name(&t),
            None => NO_NAME,
        }
    }

    /// Pushes `[function, this]` for a call through `callee`.
    fn callee(&mut self, callee: &Expr) -> Result<u32, JSError> {
        let name = self.callee_name(callee);
        match &callee.kind {
            ExprKind::Member { object, property, optional } => {
                self.expr(object)?;
                if *optional {
                    self.optional_check(0)?;
                }
                self.emit(Op::Dup);
                self.mark(callee.line, callee.column);
                match property {
                    MemberProperty::Named(n) => {
                        let n = self.name(n);
                        self.emit(Op::GetProp(n));
                    }
                    MemberProperty::Computed(k) => {
                        self.expr(k)?;
                        self.emit(Op::GetElem);
                    }
                }
                self.emit(Op::Swap);
            }
            ExprKind::SuperMember { this, .. } => {
                self.get_binding(this, false);
                let r = self.prepare_member(callee)?;
                self.ref_get(&r);
                self.emit(Op::Swap);
            }
            ExprKind::Identifier(id) if !id.with_objects.is_empty() => {
                let r = self.prepare_identifier(id);
                let plain = self.new_label();
                let done = self.new_label();
                let n = self.name(&id.name);
                self.emit(Op::Dup);
                self.emit_jump(Op::JumpIfUndefined(0), plain);
                self.emit(Op::Dup);
                self.emit(Op::GetProp(n));
                self.emit(Op::Swap);
                self.emit_jump(Op::Jump(0), done);
                self.bind(plain);
                self.emit(Op::Pop);
                if let Ref::Binding(id) = r {
                    self.get_binding(id, false);
                }
                self.emit(Op::Undefined);
                self.bind(done);
            }
            _ => {
                self.expr(callee)?;
                self.emit(Op::Undefined);
            }
        }
        Ok(name)
    }

    fn arguments(&mut self, args: &[Expr], call: impl Fn(u32) -> Op, spread_call: Op) -> Result<(), JSError> {
        if args.iter().any(|a| matches!(a.kind, ExprKind::Spread(_))) {
            self.spread_arguments(args)?;
            self.emit(spread_call);
        } else {
            for a in args {
                self.expr(a)?;
            }
            self.emit(call(args.len() as u32));
        }
        Ok(())
    }

    fn spread_arguments(&mut self, args: &[Expr]) -> Result<(), JSError> {
        self.emit(Op::NewArray);
        for a in args {
            match &a.kind {
                ExprKind::Spread(x) => {
                    self.expr(x)?;
                    self.emit(Op::ArraySpread);
                }
                _ => {
                    self.expr(a)?;
                    self.emit(Op::ArrayPush);
                }
            }
        }
        Ok(())
    }

    fn object_literal(&mut self, props: &[PropertyDef]) -> Result<(), JSError> {
        self.emit(Op::NewObject);
        for p in props {
            match p {
                PropertyDef::Value(PropKey::Named(n), value) => {
                    self.expr_named(value, n)?;
                    let n = self.name(n);
                    self.emit(Op::DefineField(n));
                }
                PropertyDef::Value(key @ PropKey::Computed(_), value) => {
                    self.property_key(key)?;
                    self.expr(value)?;
                    self.emit(Op::DefineElem);
                }
                PropertyDef::Method(key, f) | PropertyDef::Getter(key, f) | PropertyDef::Setter(key, f) => {
                    let kind = match p {
                        PropertyDef::Getter(..) => MethodKind::Getter,
                        PropertyDef::Setter(..) => MethodKind::Setter,
                        _ => MethodKind::Method,
                    };
                    self.property_key(key)?;
                    let idx = self.function(f, None)?;
                    self.emit(Op::Closure(idx));
                    self.emit(Op::DefineMethod { kind, enumerable: true });
                }
                PropertyDef::Spread(x) => {
                    self.expr(x)?;
                    self.emit(Op::CopyDataProperties);
                }
                PropertyDef::Proto(x) => {
                    self.expr(x)?;
                    self.emit(Op::SetPrototype);
                }
            }
        }
        Ok(())
    }

    fn unary(&mut self, op: UnaryOp, x: &Expr) -> Result<(), JSError> {
        match op {
            UnaryOp::Delete => match &x.kind {
                ExprKind::Member { object, property, .. } => {
                    self.expr(object)?;
                    match property {
                        MemberProperty::Named(n) => {
                            let n = self.name(n);
                            self.emit(Op::DeleteProp(n));
                        }
                        MemberProperty::Computed(k) => {
                            self.expr(k)?;
                            self.emit(Op::DeleteElem);
                        }
                    }
                }
                ExprKind::Identifier(id) => {
                    let n = self.name(&id.name);
                    let done = self.new_label();
                    if !id.with_objects.is_empty() {
                        // the innermost `with` object holding the name, or undefined
                        let plain = self.new_label();
                        self.prepare_identifier(id);
                        self.emit(Op::Dup);
                        self.emit_jump(Op::JumpIfUndefined(0), plain);
                        self.emit(Op::DeleteProp(n));
                        self.emit_jump(Op::Jump(0), done);
                        self.bind(plain);
                        self.emit(Op::Pop);
                    }
                    match id.binding {
                        Binding::Global => self.emit(Op::DeleteGlobal(n)),
                        _ => self.emit(Op::False),
                    }
                    self.bind(done);
                }
                ExprKind::SuperMember { .. } => {
                    return Err(raise_syntax_error!("Unsupported reference to 'super'"));
                }
                _ => {
                    self.expr(x)?;
                    self.emit(Op::Pop);
                    self.emit(Op::True);
                }
            },
            UnaryOp::TypeOf => {
                match &x.kind {
                    ExprKind::Identifier(id) if id.binding == Binding::Global => {
                        let r = self.prepare_identifier(id);
                        if id.with_objects.is_empty() {
                            self.get_binding(id, true);
                        } else {
                            let n = self.name(&id.name);
                            let plain = self.new_label();
                            let done = self.new_label();
                            self.emit(Op::Dup);
                            self.emit_jump(Op::JumpIfUndefined(0), plain);
                            self.emit(Op::GetProp(n));
                            self.emit_jump(Op::Jump(0), done);
                            self.bind(plain);
                            self.emit(Op::Pop);
                            if let Ref::Binding(id) = r {
                                self.get_binding(id, true);
                            }
                            self.bind(done);
                        }
                    }
                    _ => self.expr(x)?,
                }
                self.emit(Op::TypeOf);
            }
            UnaryOp::Void => {
                self.expr(x)?;
                self.emit(Op::Pop);
                self.emit(Op::Undefined);
            }
            UnaryOp::Minus => {
                self.expr(x)?;
                self.emit(Op::Neg);
            }
            UnaryOp::Plus => {
                self.expr(x)?;
                self.emit(Op::Plus);
            }
            UnaryOp::Not => {
                self.expr(x)?;
                self.emit(Op::Not);
            }
            UnaryOp::BitNot => {
                self.expr(x)?;
                self.emit(Op::BitNot);
            }
        }
        Ok(())
    }

    fn assignment(&mut self, op: AssignOp, target: &Pattern, value: &Expr) -> Result<(), JSError> {
        if matches!(target, Pattern::Array { .. } | Pattern::Object { .. }) {
            self.expr(value)?;
            self.emit(Op::Dup);
            return self.bind_pattern(target, BindMode::Assign);
        }
        let r = self.prepare_ref(target)?;
        let n = Self::ref_base_size(&r);
        let name_hint = match target {
            Pattern::Identifier(id) => Some(id.name.as_str()),
            _ => None,
        };
        match op {
            AssignOp::Assign => {
                match name_hint {
                    Some(name) => self.expr_named(value, name)?,
                    None => self.expr(value)?,
                }
                self.ref_set(&r);
            }
            AssignOp::Binary(bop) => {
                self.dup_n(n);
                self.ref_get(&r);
                self.expr(value)?;
                self.emit(binary_op(bop));
                self.ref_set(&r);
            }
            AssignOp::Logical(lop) => {
                let short = self.new_label();
                let end = self.new_label();
                self.dup_n(n);
                self.ref_get(&r);
                self.emit_jump(logical_jump(lop), short);
                match name_hint {
                    Some(name) => self.expr_named(value, name)?,
                    None => self.expr(value)?,
                }
                self.ref_set(&r);
                self.emit_jump(Op::Jump(0), end);
                self.bind(short);
                for _ in 0..n {
                    self.emit(Op::Swap);
                    self.emit(Op::Pop);
                }
                self.bind(end);
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------- statements

    fn statements(&mut self, body: &[Statement]) -> Result<(), JSError> {
        for s in body {
            self.statement(s)?;
        }
        Ok(())
    }

    fn is_script(&self) -> bool {
        self.code.kind == CodeKind::Script
    }

    fn statement(&mut self, s: &Statement) -> Result<(), JSError> {
        self.mark(s.line, s.column);
        let labels = std::mem::take(&mut self.pending_labels);
        match &s.kind {
            StatementKind::Expr(e) => {
                self.expr(e)?;
                self.emit(if self.is_script() { Op::SetCompletion } else { Op::Pop });
            }
            StatementKind::VarDecl(kind, decls) => self.var_declaration(*kind, decls)?,
            StatementKind::FunctionDecl { func, var_copy } => {
                if let (Some(copy), Some(name)) = (var_copy, &func.name) {
                    self.get_binding(name, false);
                    let r = self.prepare_identifier(copy);
                    let n = Self::ref_base_size(&r);
                    self.roll(n);
                    self.ref_set(&r);
                    self.emit(Op::Pop);
                }
            }
            StatementKind::ClassDecl(c) => {
                self.class(c, None)?;
                if let Some(name) = &c.name {
                    self.init_binding(name, true);
                }
                self.emit(Op::Pop);
            }
            StatementKind::Return(value) => {
                match value {
                    Some(v) => self.expr(v)?,
                    None => self.emit(Op::Undefined),
                }
                self.exit(Exit::Return, self.controls.len());
            }
            StatementKind::If(test, cons, alt) => {
                let otherwise = self.new_label();
                self.expr(test)?;
                self.emit_jump(Op::JumpIfFalse(0), otherwise);
                self.statement(cons)?;
                match alt {
                    Some(alt) => {
                        let end = self.new_label();
                        self.emit_jump(Op::Jump(0), end);
                        self.bind(otherwise);
                        self.statement(alt)?;
                        self.bind(end);
                    }
                    None => self.bind(otherwise),
                }
            }
            StatementKind::Block(b) => self.block(b)?,
            StatementKind::For {
                init,
                test,
                update,
                body,
                scope,
            } => {
                self.enter_scope(scope);
                match init {
                    Some(ForInit::VarDecl(kind, decls)) => self.var_declaration(*kind, decls)?,
                    Some(ForInit::Expr(e)) => {
                        self.expr(e)?;
                        self.emit(Op::Pop);
                    }
                    None => {}
                }
                let top = self.new_label();
                let next = self.new_label();
                let exit = self.new_label();
                self.bind(top);
                if let Some(t) = test {
                    self.expr(t)?;
                    self.emit_jump(Op::JumpIfFalse(0), exit);
                }
                self.loop_body(labels, body, exit, next, false)?;
                self.bind(next);
                if scope.materialized {
                    self.emit(Op::CopyEnv);
                }
                if let Some(u) = update {
                    self.expr(u)?;
                    self.emit(Op::Pop);
                }
                self.emit_jump(Op::Jump(0), top);
                self.bind(exit);
                self.exit_scope(scope);
            }
            StatementKind::ForIn { left, right, body, scope } | StatementKind::ForOf { left, right, body, scope } => {
                let for_in = matches!(s.kind, StatementKind::ForIn { .. });
                self.expr(right)?;
                self.emit(if for_in { Op::ForInStart } else { Op::GetIterator });
                let next = self.new_label();
                let done = self.new_label();
                self.bind(next);
                self.emit_jump(Op::IterNext(0), done);
                self.controls.push(Control::Loop {
                    labels,
                    break_target: done,
                    continue_target: next,
                    iterator: true,
                });
                self.enter_scope(scope);
                let (pattern, mode) = match left {
                    ForBinding::Decl(VarKind::Var, p) => (p, BindMode::Var),
                    ForBinding::Decl(_, p) => (p, BindMode::Lexical),
                    ForBinding::Target(p) => (p, BindMode::Assign),
                };
                self.bind_pattern(pattern, mode)?;
                self.statement(body)?;
                self.exit_scope(scope);
                self.controls.pop();
                self.emit_jump(Op::Jump(0), next);
                self.bind(done);
                self.emit(Op::Pop);
            }
            StatementKind::While(test, body) => {
                let top = self.new_label();
                let exit = self.new_label();
                self.bind(top);
                self.expr(test)?;
                self.emit_jump(Op::JumpIfFalse(0), exit);
                self.loop_body(labels, body, exit, top, false)?;
                self.emit_jump(Op::Jump(0), top);
                self.bind(exit);
            }
            StatementKind::DoWhile(body, test) => {
                let top = self.new_label();
                let next = self.new_label();
                let exit = self.new_label();
                self.bind(top);
                self.loop_body(labels, body, exit, next, false)?;
                self.bind(next);
                self.expr(test)?;
                self.emit_jump(Op::JumpIfTrue(0), top);
                self.bind(exit);
            }
            StatementKind::Switch {
                discriminant,
                cases,
                scope,
            } => {
                let tmp = self.alloc_temp();
                self.expr(discriminant)?;
                self.emit(Op::SetLocal(tmp));
                self.emit(Op::Pop);
                self.enter_scope(scope);
                self.hoist_functions(cases.iter().flat_map(|c| direct_function_declarations(&c.body)))?;
                let end = self.new_label();
                self.controls.push(Control::Breakable {
                    labels,
                    break_target: end,
                    is_switch: true,
                });
                let targets: Vec<Label> = cases.iter().map(|_| self.new_label()).collect();
                for (case, target) in cases.iter().zip(&targets) {
                    if let Some(test) = &case.test {
                        self.emit(Op::GetLocal(tmp));
                        self.expr(test)?;
                        self.emit(Op::StrictEq);
                        self.emit_jump(Op::JumpIfTrue(0), *target);
                    }
                }
                match cases.iter().position(|c| c.test.is_none()) {
                    Some(d) => self.emit_jump(Op::Jump(0), targets[d]),
                    None => self.emit_jump(Op::Jump(0), end),
                }
                for (case, target) in cases.iter().zip(&targets) {
                    self.bind(*target);
                    self.statements(&case.body)?;
                }
                self.controls.pop();
                self.bind(end);
                self.exit_scope(scope);
            }
            StatementKind::Try {
                block,
                handler,
                finalizer,
            } => self.try_statement(block, handler.as_ref(), finalizer.as_ref())?,
            StatementKind::Throw(e) => {
                self.expr(e)?;
                self.mark(s.line, s.column);
                self.emit(Op::Throw);
            }
            StatementKind::Break(label) => {
                let target = self.find_target(label.as_deref(), false)?;
                self.exit(Exit::Break(target), self.controls.len());
            }
            StatementKind::Continue(label) => {
                let target = self.find_target(label.as_deref(), true)?;
                self.exit(Exit::Continue(target), self.controls.len());
            }
            StatementKind::Labeled(name, body) => {
                let mut labels = labels;
                labels.push(name.clone());
                let is_loop = matches!(
                    body.kind,
                    StatementKind::For { .. }
                        | StatementKind::ForIn { .. }
                        | StatementKind::ForOf { .. }
                        | StatementKind::While(..)
                        | StatementKind::DoWhile(..)
                        | StatementKind::Labeled(..)
                );
                if is_loop {
                    self.pending_labels = labels;
                    self.statement(body)?;
                } else {
                    let end = self.new_label();
                    self.controls.push(Control::Breakable {
                        labels,
                        break_target: end,
                        is_switch: false,
                    });
                    self.statement(body)?;
                    self.controls.pop();
                    self.bind(end);
                }
            }
            StatementKind::With {
                object,
                body,
                object_binding,
                scope,
            } => {
                self.expr(object)?;
                self.emit(Op::ToObject);
                self.enter_scope(scope);
                self.init_binding(object_binding, false);
                self.emit(Op::Pop);
                self.statement(body)?;
                self.exit_scope(scope);
            }
            StatementKind::Debugger => self.emit(Op::Debugger),
            StatementKind::Empty => {}
        }
        Ok(())
    }

    fn block(&mut self, b: &Block) -> Result<(), JSError> {
        self.enter_scope(&b.scope);
        self.hoist_functions(direct_function_declarations(&b.body))?;
        self.statements(&b.body)?;
        self.exit_scope(&b.scope);
        Ok(())
    }

    fn loop_body(&mut self, labels: Vec<String>, body: &Statement, exit: Label, next: Label, iterator: bool) -> Result<(), JSError> {
        self.controls.push(Control::Loop {
            labels,
            break_target: exit,
            continue_target: next,
            iterator,
        });
        self.statement(body)?;
        self.controls.pop();
        Ok(())
    }

    fn var_declaration(&mut self, kind: VarKind, decls: &[VarDeclarator]) -> Result<(), JSError> {
        for d in decls {
            match (kind, &d.target, &d.init) {
                (VarKind::Var, _, None) => {}
                (VarKind::Var, Pattern::Identifier(id), Some(init)) => {
                    let r = self.prepare_identifier(id);
                    self.expr_named(init, &id.name)?;
                    self.ref_set(&r);
                    self.emit(Op::Pop);
                }
                (VarKind::Var, target, Some(init)) => {
                    self.expr(init)?;
                    self.bind_pattern(target, BindMode::Var)?;
                }
                (_, target, init) => {
                    match (init, target) {
                        (Some(init), Pattern::Identifier(id)) => self.expr_named(init, &id.name)?,
                        (Some(init), _) => self.expr(init)?,
                        (None, _) => self.emit(Op::Undefined),
                    }
                    self.bind_pattern(target, BindMode::Lexical)?;
                }
            }
        }
        Ok(())
    }

    fn try_statement(&mut self, block: &Block, handler: Option<&crate::core::CatchClause>, finalizer: Option<&Block>) -> Result<(), JSError> {
        let finally = finalizer.map(|_| {
            let entry = self.new_label();
            let throw_entry = self.new_label();
            self.emit_jump(Op::EnterTry(0), throw_entry);
            self.finallies.push(FinallyInfo { entry, exits: Vec::new() });
            self.controls.push(Control::Finally(self.finallies.len() - 1));
            (self.finallies.len() - 1, entry, throw_entry)
        });
        match handler {
            Some(h) => {
                let catch = self.new_label();
                let after = self.new_label();
                self.emit_jump(Op::EnterTry(0), catch);
                self.controls.push(Control::Try);
                self.block(block)?;
                self.controls.pop();
                self.emit(Op::ExitTry);
                self.emit_jump(Op::Jump(0), after);
                self.bind(catch);
                self.enter_scope(&h.scope);
                match &h.param {
                    Some(p) => self.bind_pattern(p, BindMode::Lexical)?,
                    None => self.emit(Op::Pop),
                }
                self.block(&h.body)?;
                self.exit_scope(&h.scope);
                self.bind(after);
            }
            None => self.block(block)?,
        }
        if let (Some((index, entry, throw_entry)), Some(f)) = (finally, finalizer) {
            self.controls.pop();
            self.emit(Op::ExitTry);
            self.emit(Op::Undefined);
            self.emit(Op::Number(TOKEN_NORMAL as f64));
            self.emit_jump(Op::Jump(0), entry);
            self.bind(throw_entry);
            self.emit(Op::Number(TOKEN_THROW as f64));
            self.bind(entry);
            self.controls.push(Control::FinallyBody);
            self.block(f)?;
            self.controls.pop();
            let exits = std::mem::take(&mut self.finallies[index].exits);
            let targets: Vec<Label> = exits.iter().map(|_| self.new_label()).collect();
            for ((token, _), target) in exits.iter().zip(&targets) {
                self.emit_jump(Op::JumpIfToken(*token, 0), *target);
            }
            self.emit(Op::EndFinally);
            // The finally control sat at `self.controls.len()` while active.
            let level = self.controls.len();
            for ((_, exit), target) in exits.iter().zip(&targets) {
                self.bind(*target);
                match exit {
                    Exit::Return => {
                        self.emit(Op::Pop);
                    }
                    _ => {
                        self.emit(Op::Pop);
                        self.emit(Op::Pop);
                    }
                }
                self.exit(*exit, level);
            }
        }
        Ok(())
    }

    fn find_target(&self, label: Option<&str>, is_continue: bool) -> Result<usize, JSError> {
        for (i, c) in self.controls.iter().enumerate().rev() {
            match (c, label) {
                (Control::Loop { .. }, None) => return Ok(i),
                (Control::Breakable { is_switch: true, .. }, None) if !is_continue => return Ok(i),
                (Control::Loop { labels, .. }, Some(l)) if labels.iter().any(|x| x == l) => return Ok(i),
                (Control::Breakable { labels, .. }, Some(l)) if labels.iter().any(|x| x == l) => {
                    if is_continue {
                        return Err(raise_syntax_error!(format!("Illegal continue statement: '{l}' does not denote an iteration statement")));
                    }
                    return Ok(i);
                }
                _ => {}
            }
        }
        Err(raise_syntax_error!(match label {
            Some(l) => format!("Undefined label '{l}'"),
            None if is_continue => "Illegal continue statement: no surrounding iteration statement".to_string(),
            None => "Illegal break statement".to_string(),
        }))
    }

    /// Emits a non-local exit starting from control level `from`.
    fn exit(&mut self, exit: Exit, from: usize) {
        let stop = match exit {
            Exit::Break(i) | Exit::Continue(i) => i + 1,
            Exit::Return => 0,
        };
        let with_value = exit == Exit::Return;
        let crosses_finally = self.controls[stop..from].iter().any(|c| matches!(c, Control::Finally(_)));
        if with_value && !crosses_finally {
            self.emit_return();
            return;
        }
        let mut i = from;
        while i > stop {
            i -= 1;
            match self.controls[i] {
                Control::Env => self.emit(Op::PopEnv),
                Control::Try => self.emit(Op::ExitTry),
                Control::Loop { iterator: true, .. } => self.discard_below(with_value, 1),
                Control::FinallyBody => self.discard_below(with_value, 2),
                Control::Finally(index) => {
                    self.emit(Op::ExitTry);
                    let token = match exit {
                        Exit::Return => TOKEN_RETURN,
                        _ => {
                            let existing = self.finallies[index].exits.iter().find(|(_, e)| *e == exit).map(|(t, _)| *t);
                            match existing {
                                Some(t) => t,
                                None => FIRST_JUMP_TOKEN + self.finallies[index].exits.iter().filter(|(t, _)| *t >= FIRST_JUMP_TOKEN).count() as u32,
                            }
                        }
                    };
                    if !self.finallies[index].exits.iter().any(|(t, _)| *t == token) {
                        self.finallies[index].exits.push((token, exit));
                    }
                    if !with_value {
                        self.emit(Op::Undefined);
                    }
                    self.emit(Op::Number(token as f64));
                    let entry = self.finallies[index].entry;
                    self.emit_jump(Op::Jump(0), entry);
                    return;
                }
                _ => {}
            }
        }
        match exit {
            Exit::Break(t) => match &self.controls[t] {
                Control::Loop { break_target, .. } | Control::Breakable { break_target, .. } => {
                    let target = *break_target;
                    self.emit_jump(Op::Jump(0), target);
                }
                _ => {}
            },
            Exit::Continue(t) => {
                if let Control::Loop { continue_target, .. } = &self.controls[t] {
                    let target = *continue_target;
                    self.emit_jump(Op::Jump(0), target);
                }
            }
            Exit::Return => self.emit_return(),
        }
    }

    /// Drops `n` stack values, keeping the top one when `keep_top` is set.
    fn discard_below(&mut self, keep_top: bool, n: u8) {
        for _ in 0..n {
            if keep_top {
                self.emit(Op::Swap);
            }
            self.emit(Op::Pop);
        }
    }

    fn emit_return(&mut self) {
        if let Some(this) = self.derived_this {
            match this {
                Binding::Heap { slot, .. } => self.emit(Op::GetHeap(self.env_depth, slot)),
                _ => self.emit(Op::LoadThis),
            }
            self.emit(Op::CheckDerivedReturn);
        }
        self.emit(Op::Return);
    }
}

fn logical_jump(op: LogicalOp) -> Op {
    match op {
        LogicalOp::And => Op::JumpIfFalseKeep(0),
        LogicalOp::Or => Op::JumpIfTrueKeep(0),
        LogicalOp::Nullish => Op::JumpIfNotNullishKeep(0),
    }
}

fn binary_op(op: BinaryOp) -> Op {
    match op {
        BinaryOp::Add => Op::Add,
        BinaryOp::Sub => Op::Sub,
        BinaryOp::Mul => Op::Mul,
        BinaryOp::Div => Op::Div,
        BinaryOp::Mod => Op::Mod,
        BinaryOp::Exp => Op::Exp,
        BinaryOp::Eq => Op::Eq,
        BinaryOp::NotEq => Op::NotEq,
        BinaryOp::StrictEq => Op::StrictEq,
        BinaryOp::StrictNotEq => Op::StrictNotEq,
        BinaryOp::Lt => Op::Lt,
        BinaryOp::Gt => Op::Gt,
        BinaryOp::LtEq => Op::LtEq,
        BinaryOp::GtEq => Op::GtEq,
        BinaryOp::BitAnd => Op::BitAnd,
        BinaryOp::BitOr => Op::BitOr,
        BinaryOp::BitXor => Op::BitXor,
        BinaryOp::Shl => Op::Shl,
        BinaryOp::Shr => Op::Shr,
        BinaryOp::UShr => Op::UShr,
        BinaryOp::In => Op::In,
        BinaryOp::InstanceOf => Op::InstanceOf,
    }
}

/// Implicit constructor of a class without one.
fn default_constructor(name: &str, derived: bool, source: &str) -> FunctionCode {
    let mut code = FunctionCode::new(name, CodeKind::ClassConstructor { derived }, true);
    code.source = source.to_string();
    if derived {
        code.ops = vec![
            Op::LoadCallee,
            Op::GetPrototypeOf,
            Op::GetRestArgs(0),
            Op::LoadNewTarget,
            Op::SuperCallSpread,
            Op::BindThis,
            Op::Return,
        ];
    } else {
        code.ops = vec![Op::Undefined, Op::Return];
    }
    code
}

fn compile_function(f: &FunctionNode, name_hint: Option<&str>) -> Result<FunctionCode, JSError> {
    let kind = match f.kind {
        FunctionKind::Normal => CodeKind::Normal,
        FunctionKind::Arrow => CodeKind::Arrow,
        FunctionKind::Method | FunctionKind::Getter | FunctionKind::Setter => CodeKind::Method,
        FunctionKind::ClassConstructor { derived } => CodeKind::ClassConstructor { derived },
    };
    let name = f.name.as_ref().map(|n| n.name.as_str()).or(name_hint).unwrap_or("");
    let mut code = FunctionCode::new(name, kind, f.strict);
    code.param_count = f.expected_arg_count();
    code.local_count = f.local_count;
    code.source = f.source.clone();
    let derived_this = match f.kind {
        FunctionKind::ClassConstructor { derived: true } => Some(
            f.frame_captures
                .iter()
                .find(|c| c.name == THIS_NAME)
                .map(|c| c.binding)
                .unwrap_or(Binding::Frame),
        ),
        _ => None,
    };
    let mut c = FunctionCompiler::new(code, derived_this);
    c.mark(f.line, f.column);
    if f.scope.materialized {
        c.emit(Op::PushEnv(f.scope.env_size));
    }
    for capture in &f.frame_captures {
        match capture.name.as_str() {
            THIS_NAME => c.emit(Op::LoadThis),
            NEW_TARGET_NAME => c.emit(Op::LoadNewTarget),
            _ => c.emit(Op::LoadCallee),
        }
        c.init_binding(capture, false);
        c.emit(Op::Pop);
    }
    for lexical in &f.scope.lexicals {
        c.emit(Op::Uninitialized);
        c.init_binding(lexical, true);
        c.emit(Op::Pop);
    }
    if let Some((ident, mode)) = &f.arguments {
        let mapped = *mode == ArgumentsMode::Mapped;
        if mapped {
            let mut seen: Vec<&str> = Vec::new();
            let mut slots = vec![None; f.params.len()];
            for (i, p) in f.params.iter().enumerate().rev() {
                if let Pattern::Identifier(id) = &p.target {
                    if seen.contains(&id.name.as_str()) {
                        continue;
                    }
                    seen.push(&id.name);
                    if let Binding::Heap { depth: 0, slot } = id.binding {
                        slots[i] = Some(slot);
                    }
                }
            }
            c.code.mapped_params = slots;
        }
        c.emit(Op::CreateArguments { mapped });
        c.init_binding(ident, false);
        c.emit(Op::Pop);
    }
    if let Some(self_binding) = &f.self_binding {
        c.emit(Op::LoadCallee);
        c.init_binding(self_binding, false);
        c.emit(Op::Pop);
    }
    for (i, p) in f.params.iter().enumerate() {
        c.emit(Op::GetArg(i as u32));
        c.bind_element(p, BindMode::Lexical)?;
    }
    if let Some(rest) = &f.rest {
        c.emit(Op::GetRestArgs(f.params.len() as u32));
        c.bind_pattern(rest, BindMode::Lexical)?;
    }
    c.hoist_functions(direct_function_declarations(&f.body))?;
    c.statements(&f.body)?;
    c.emit(Op::Undefined);
    c.emit_return();
    Ok(c.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{parse_program, resolve_program};

    fn compile(src: &str) -> Rc<FunctionCode> {
        let mut p = parse_program(src, false).unwrap();
        resolve_program(&mut p);
        compile_program(&p).unwrap()
    }

    #[test]
    fn script_ends_with_completion_return() {
        let code = compile("1 + 2;");
        assert_eq!(&code.ops[code.ops.len() - 2..], &[Op::GetCompletion, Op::Return]);
        assert!(code.ops.contains(&Op::SetCompletion));
    }

    #[test]
    fn nested_functions_are_compiled_once() {
        let code = compile("function f() { return function g() {}; } f();");
        assert_eq!(code.functions.len(), 1);
        assert_eq!(code.functions[0].name, "f");
        assert_eq!(code.functions[0].functions[0].name, "g");
    }

    #[test]
    fn anonymous_functions_take_their_binding_name() {
        let code = compile("var h = function () {}; let k = () => 1;");
        let names: Vec<&str> = code.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["h", "k"]);
    }

    #[test]
    fn jumps_are_patched() {
        let code = compile("var x = 0; while (x < 3) { x++; if (x == 2) break; }");
        for op in &code.ops {
            if let Op::Jump(t) | Op::JumpIfFalse(t) = op {
                assert!((*t as usize) <= code.ops.len());
            }
        }
    }

    #[test]
    fn finally_routes_return_through_token() {
        let code = compile("function f() { try { return 1; } finally { g(); } }");
        let f = &code.functions[0];
        assert!(f.ops.contains(&Op::Number(TOKEN_RETURN as f64)));
        assert!(f.ops.iter().any(|op| matches!(op, Op::JumpIfToken(TOKEN_RETURN, _))));
        assert!(f.ops.contains(&Op::EndFinally));
    }

    #[test]
    fn mapped_arguments_record_parameter_slots() {
        let code = compile("function f(a, b) { arguments[0] = 5; return a; }");
        let f = &code.functions[0];
        assert_eq!(f.mapped_params.len(), 2);
        assert!(f.mapped_params.iter().all(Option::is_some));
        assert!(f.ops.contains(&Op::CreateArguments { mapped: true }));
    }

    #[test]
    fn invalid_regex_is_an_early_error() {
        let mut p = parse_program("var r = /(/;", false).unwrap();
        resolve_program(&mut p);
        let err = compile_program(&p).unwrap_err();
        assert_eq!(err.name(), "SyntaxError");
    }
}
