//! Instruction set and compiled function representation.
//!
//! The VM is a stack machine: every instruction pops its operands from the
//! value stack of the running frame and pushes its result. Jump targets are
//! absolute instruction indices. Names and string constants are referenced by
//! index into the tables of the owning [`FunctionCode`].

use crate::core::MethodKind;
use std::fmt::Write as _;
use std::rc::Rc;

/// Marker for "no callee name recorded" in call instructions.
pub const NO_NAME: u32 = u32::MAX;

/// Finally-block completion tokens. Tokens from `FIRST_JUMP_TOKEN` upwards
/// identify the `break`/`continue` jumps routed through one finally block.
pub const TOKEN_NORMAL: u32 = 0;
pub const TOKEN_THROW: u32 = 1;
pub const TOKEN_RETURN: u32 = 2;
pub const FIRST_JUMP_TOKEN: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Op {
    // ---- constants
    Undefined,
    Null,
    True,
    False,
    Number(f64),
    String(u32),
    Uninitialized,

    // ---- stack shuffling
    Pop,
    Dup,
    /// Duplicates the top `n` values, preserving order.
    DupN(u8),
    Swap,
    /// Moves the value `n` slots below the top up to the top.
    Roll(u8),
    /// Moves the top value down below the next `n` values.
    Bury(u8),

    // ---- bindings
    GetLocal(u32),
    GetLocalChecked(u32, u32),
    SetLocal(u32),
    SetLocalChecked(u32, u32),
    GetHeap(u32, u32),
    GetHeapChecked(u32, u32, u32),
    SetHeap(u32, u32),
    SetHeapChecked(u32, u32, u32),
    GetGlobal(u32),
    /// Like `GetGlobal` but yields `undefined` for an unresolvable name.
    GetGlobalForTypeof(u32),
    SetGlobal(u32),
    InitGlobalLexical(u32),
    DeleteGlobal(u32),
    DeclareGlobals,
    DefineGlobalFunction(u32),
    ThrowConstAssign(u32),
    LoadThis,
    LoadThisChecked,
    LoadNewTarget,
    LoadCallee,
    LoadGlobalThis,
    /// Initializes the frame's `this` after `super(...)`.
    BindThis,
    BindHeapThis(u32, u32),
    CreateArguments { mapped: bool },
    GetArg(u32),
    GetRestArgs(u32),
    PushEnv(u32),
    PopEnv,
    /// Replaces the innermost environment with a copy (per-iteration loop bindings).
    CopyEnv,

    // ---- function and literal creation
    Closure(u32),
    Class { has_super: bool },
    RegExp(u32),
    TemplateObject(u32),
    NewObject,
    NewArray,
    DefineField(u32),
    DefineElem,
    DefineMethod { kind: MethodKind, enumerable: bool },
    CopyDataProperties,
    ObjectRest,
    SetPrototype,
    ArrayPush,
    ArrayHole,
    ArraySpread,

    // ---- property access
    GetProp(u32),
    GetElem,
    SetProp(u32),
    SetElem,
    DeleteProp(u32),
    DeleteElem,
    ToPropertyKey,
    CheckObjectCoercible,
    SuperBase,
    GetSuperProp(u32),
    GetSuperElem,
    SetSuperProp(u32),
    SetSuperElem,
    GetPrototypeOf,
    /// `with` lookup: jumps keeping the object when it has the property, otherwise pops it.
    WithHas(u32, u32),
    /// `[base, value]`: stores into `base` and jumps when it is an object, otherwise drops `base`.
    SetPropIfObject(u32, u32),

    // ---- operators
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    In,
    InstanceOf,
    Neg,
    Plus,
    Not,
    BitNot,
    TypeOf,
    Inc,
    Dec,
    ToNumeric,
    ToString,
    ToObject,

    // ---- control flow
    Jump(u32),
    JumpIfFalse(u32),
    JumpIfTrue(u32),
    // The `Keep` forms jump with the tested value left on the stack and pop it otherwise.
    JumpIfTrueKeep(u32),
    JumpIfFalseKeep(u32),
    JumpIfNotNullishKeep(u32),
    JumpIfNotUndefinedKeep(u32),
    /// Optional-chain check: jumps on `null`/`undefined`, never pops.
    JumpIfNullishKeep(u32),
    JumpIfUndefined(u32),
    Call(u32, u32),
    CallSpread(u32),
    New(u32, u32),
    NewSpread(u32),
    SuperCall(u32),
    SuperCallSpread,
    CheckDerivedReturn,
    Return,
    Throw,
    EnterTry(u32),
    ExitTry,
    /// Jumps when the pending finally token on top of the stack equals the operand; never pops.
    JumpIfToken(u32, u32),
    /// Pops `[value, token]` and rethrows `value` for a throw token.
    EndFinally,
    ForInStart,
    GetIterator,
    IterNext(u32),
    IterStep,
    IterRest,
    SetCompletion,
    GetCompletion,
    Debugger,
}

impl Op {
    /// Rewrites the jump target of a jump-like instruction.
    pub fn set_target(&mut self, target: u32) {
        match self {
            Op::Jump(t)
            | Op::JumpIfFalse(t)
            | Op::JumpIfTrue(t)
            | Op::JumpIfTrueKeep(t)
            | Op::JumpIfFalseKeep(t)
            | Op::JumpIfNotNullishKeep(t)
            | Op::JumpIfNullishKeep(t)
            | Op::JumpIfNotUndefinedKeep(t)
            | Op::JumpIfUndefined(t)
            | Op::EnterTry(t)
            | Op::IterNext(t)
            | Op::WithHas(_, t)
            | Op::SetPropIfObject(_, t)
            | Op::JumpIfToken(_, t) => *t = target,
            other => log::warn!("set_target on non-jump instruction {other:?}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeKind {
    Script,
    Normal,
    Arrow,
    Method,
    ClassConstructor { derived: bool },
}

#[derive(Clone, Debug, Default)]
pub struct GlobalDeclarations {
    pub vars: Vec<String>,
    pub functions: Vec<String>,
    /// `let`/`const`/`class` names; `true` marks `const`.
    pub lexicals: Vec<(String, bool)>,
}

#[derive(Clone, Debug)]
pub struct TemplateStrings {
    pub cooked: Vec<Option<Vec<u16>>>,
    pub raw: Vec<String>,
}

#[derive(Clone, Copy, Debug)]
pub struct LineEntry {
    pub pc: u32,
    pub line: usize,
    pub column: usize,
}

/// Output of the code generator for one function body or script.
pub struct FunctionCode {
    pub name: String,
    pub kind: CodeKind,
    pub strict: bool,
    /// Value of the function's `length` property.
    pub param_count: u32,
    pub local_count: u32,
    pub ops: Vec<Op>,
    pub strings: Vec<Vec<u16>>,
    pub names: Vec<String>,
    pub functions: Vec<Rc<FunctionCode>>,
    pub regexes: Vec<(String, String)>,
    pub templates: Vec<TemplateStrings>,
    /// Heap slot aliased by each parameter index of a mapped `arguments` object.
    pub mapped_params: Vec<Option<u32>>,
    pub lines: Vec<LineEntry>,
    pub globals: GlobalDeclarations,
    pub source: String,
}

impl FunctionCode {
    pub fn new(name: impl Into<String>, kind: CodeKind, strict: bool) -> Self {
        FunctionCode {
            name: name.into(),
            kind,
            strict,
            param_count: 0,
            local_count: 0,
            ops: Vec::new(),
            strings: Vec::new(),
            names: Vec::new(),
            functions: Vec::new(),
            regexes: Vec::new(),
            templates: Vec::new(),
            mapped_params: Vec::new(),
            lines: Vec::new(),
            globals: GlobalDeclarations::default(),
            source: String::new(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, CodeKind::Normal | CodeKind::ClassConstructor { .. })
    }

    pub fn is_class_constructor(&self) -> bool {
        matches!(self.kind, CodeKind::ClassConstructor { .. })
    }

    pub fn is_arrow(&self) -> bool {
        self.kind == CodeKind::Arrow
    }

    pub fn name_at(&self, index: u32) -> &str {
        self.names.get(index as usize).map(String::as_str).unwrap_or("")
    }

    /// Source position of the instruction at `pc`.
    pub fn location(&self, pc: usize) -> Option<(usize, usize)> {
        let idx = self.lines.partition_point(|e| e.pc as usize <= pc);
        if idx == 0 {
            return None;
        }
        let e = self.lines[idx - 1];
        Some((e.line, e.column))
    }

    /// Human-readable listing of this function and every nested function.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        self.disassemble_into(&mut out, 0);
        out
    }

    fn disassemble_into(&self, out: &mut String, indent: usize) {
        let pad = " ".repeat(indent);
        let _ = writeln!(
            out,
            "{pad}== {} ({:?}{}, params {}, locals {}) ==",
            if self.name.is_empty() { "<anonymous>" } else { &self.name },
            self.kind,
            if self.strict { ", strict" } else { "" },
            self.param_count,
            self.local_count
        );
        for (pc, op) in self.ops.iter().enumerate() {
            let note = match op {
                Op::String(i) => self.strings.get(*i as usize).map(|s| format!("{:?}", String::from_utf16_lossy(s))),
                Op::GetGlobal(i)
                | Op::GetGlobalForTypeof(i)
                | Op::SetGlobal(i)
                | Op::InitGlobalLexical(i)
                | Op::DefineGlobalFunction(i)
                | Op::DeleteGlobal(i)
                | Op::GetProp(i)
                | Op::SetProp(i)
                | Op::DefineField(i)
                | Op::DeleteProp(i)
                | Op::GetSuperProp(i)
                | Op::SetSuperProp(i)
                | Op::WithHas(i, _)
                | Op::SetPropIfObject(i, _) => Some(self.name_at(*i).to_string()),
                Op::Closure(i) => self.functions.get(*i as usize).map(|f| format!("fn {}", f.name)),
                _ => None,
            };
            match note {
                Some(n) => {
                    let _ = writeln!(out, "{pad}{pc:>5}  {op:?}  ; {n}");
                }
                None => {
                    let _ = writeln!(out, "{pad}{pc:>5}  {op:?}");
                }
            }
        }
        for f in &self.functions {
            f.disassemble_into(out, indent + 2);
        }
    }
}

impl std::fmt::Debug for FunctionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionCode")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("ops", &self.ops.len())
            .finish()
    }
}
