//! Scope and binding resolution.
//!
//! Runs two passes over the same traversal. The first pass builds the scope
//! tree, declares every binding and records which bindings are referenced
//! from a nested function. Placement is then decided once per scope: bindings
//! captured by a closure get a slot in a heap environment, everything else a
//! slot in the frame's local array, and script-level declarations live on the
//! global object. The second pass writes the final `Binding` into each
//! identifier of the AST.

use crate::core::{
    ArgumentsMode, Binding, Block, ClassNode, Expr, ExprKind, ForBinding, ForInit, FunctionKind, FunctionNode, Identifier,
    MemberProperty, Mutability, Pattern, Program, PropKey, PropertyDef, ScopeInfo, Statement, StatementKind, VarKind,
};
use indexmap::IndexMap;
use std::collections::HashSet;

pub const THIS_NAME: &str = "this";
pub const NEW_TARGET_NAME: &str = "new.target";
pub const CALLEE_NAME: &str = "%callee";
pub const WITH_NAME: &str = "%with";
const ARGUMENTS_NAME: &str = "arguments";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScopeKind {
    Program,
    Function { arrow: bool },
    Block,
    With,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DeclKind {
    Var,
    Let,
    Const,
    Class,
    ClassInner,
    Function,
    Param,
    CatchParam,
    Arguments,
    SelfName,
    Frame,
    Hidden,
}

impl DeclKind {
    fn is_lexical(self) -> bool {
        matches!(self, DeclKind::Let | DeclKind::Const | DeclKind::Class | DeclKind::ClassInner)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Location {
    Unassigned,
    Local(u32),
    Heap(u32),
    Global,
    Frame,
}

#[derive(Debug)]
struct VarData {
    kind: DeclKind,
    referenced: bool,
    captured: bool,
    location: Location,
}

#[derive(Debug)]
struct ScopeData {
    kind: ScopeKind,
    parent: Option<usize>,
    /// Nearest enclosing function or program scope (itself for those).
    function: usize,
    strict: bool,
    derived_ctor: bool,
    simple_params: bool,
    vars: IndexMap<String, VarData>,
    /// Sloppy block-level functions that also got a function-level `var`.
    annex_b: HashSet<String>,
    materialized: bool,
    env_size: u32,
    local_count: u32,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Pass {
    Analyze,
    Assign,
}

struct Resolver {
    scopes: Vec<ScopeData>,
    pass: Pass,
    next_scope: usize,
    current: usize,
}

/// Annotates every identifier, function and block in `program` with its binding placement.
pub fn resolve_program(program: &mut Program) {
    let mut resolver = Resolver {
        scopes: Vec::new(),
        pass: Pass::Analyze,
        next_scope: 0,
        current: 0,
    };
    resolver.program(program);
    resolver.allocate();
    resolver.pass = Pass::Assign;
    resolver.next_scope = 0;
    resolver.program(program);
    log::debug!(
        "resolved {} scopes, {} materialized",
        resolver.scopes.len(),
        resolver.scopes.iter().filter(|s| s.materialized).count()
    );
}

// ---------------------------------------------------------------- declaration scans

/// `var` names declared anywhere in `body`, excluding nested functions.
fn collect_var_names(body: &[Statement], out: &mut Vec<String>) {
    for s in body {
        collect_var_names_stmt(s, out);
    }
}

fn collect_var_names_stmt(s: &Statement, out: &mut Vec<String>) {
    match &s.kind {
        StatementKind::VarDecl(VarKind::Var, decls) => {
            for d in decls {
                d.target.bound_names(out);
            }
        }
        StatementKind::If(_, cons, alt) => {
            collect_var_names_stmt(cons, out);
            if let Some(a) = alt {
                collect_var_names_stmt(a, out);
            }
        }
        StatementKind::Block(b) => collect_var_names(&b.body, out),
        StatementKind::For { init, body, .. } => {
            if let Some(ForInit::VarDecl(VarKind::Var, decls)) = init {
                for d in decls {
                    d.target.bound_names(out);
                }
            }
            collect_var_names_stmt(body, out);
        }
        StatementKind::ForIn { left, body, .. } | StatementKind::ForOf { left, body, .. } => {
            if let ForBinding::Decl(VarKind::Var, p) = left {
                p.bound_names(out);
            }
            collect_var_names_stmt(body, out);
        }
        StatementKind::While(_, body) | StatementKind::DoWhile(body, _) | StatementKind::Labeled(_, body) => {
            collect_var_names_stmt(body, out)
        }
        StatementKind::With { body, .. } => collect_var_names_stmt(body, out),
        StatementKind::Switch { cases, .. } => {
            for c in cases {
                collect_var_names(&c.body, out);
            }
        }
        StatementKind::Try {
            block,
            handler,
            finalizer,
        } => {
            collect_var_names(&block.body, out);
            if let Some(h) = handler {
                collect_var_names(&h.body.body, out);
            }
            if let Some(f) = finalizer {
                collect_var_names(&f.body, out);
            }
        }
        _ => {}
    }
}

/// Function declarations nested in blocks (sloppy-mode var hoisting candidates).
fn collect_block_functions(body: &[Statement], nested: bool, out: &mut Vec<String>) {
    for s in body {
        collect_block_functions_stmt(s, nested, out);
    }
}

fn collect_block_functions_stmt(s: &Statement, nested: bool, out: &mut Vec<String>) {
    match &s.kind {
        StatementKind::FunctionDecl { func, .. } if nested => {
            if let Some(n) = &func.name {
                out.push(n.name.clone());
            }
        }
        StatementKind::If(_, cons, alt) => {
            collect_block_functions_stmt(cons, true, out);
            if let Some(a) = alt {
                collect_block_functions_stmt(a, true, out);
            }
        }
        StatementKind::Block(b) => collect_block_functions(&b.body, true, out),
        StatementKind::For { body, .. }
        | StatementKind::ForIn { body, .. }
        | StatementKind::ForOf { body, .. }
        | StatementKind::While(_, body)
        | StatementKind::DoWhile(body, _)
        | StatementKind::With { body, .. } => collect_block_functions_stmt(body, true, out),
        StatementKind::Labeled(_, body) => collect_block_functions_stmt(body, nested, out),
        StatementKind::Switch { cases, .. } => {
            for c in cases {
                collect_block_functions(&c.body, true, out);
            }
        }
        StatementKind::Try {
            block,
            handler,
            finalizer,
        } => {
            collect_block_functions(&block.body, true, out);
            if let Some(h) = handler {
                collect_block_functions(&h.body.body, true, out);
            }
            if let Some(f) = finalizer {
                collect_block_functions(&f.body, true, out);
            }
        }
        _ => {}
    }
}

/// Function declarations that are direct children of a statement list.
pub(crate) fn direct_function_declarations(body: &[Statement]) -> impl Iterator<Item = &FunctionNode> {
    body.iter().filter_map(|s| {
        let mut s = s;
        while let StatementKind::Labeled(_, inner) = &s.kind {
            s = inner;
        }
        match &s.kind {
            StatementKind::FunctionDecl { func, .. } => Some(&**func),
            _ => None,
        }
    })
}

/// `let`/`const`/`class` declared directly in a statement list.
fn lexical_declarations(body: &[Statement]) -> Vec<(String, DeclKind)> {
    let mut out = Vec::new();
    for s in body {
        match &s.kind {
            StatementKind::VarDecl(kind @ (VarKind::Let | VarKind::Const), decls) => {
                let decl_kind = if *kind == VarKind::Let { DeclKind::Let } else { DeclKind::Const };
                for d in decls {
                    let mut names = Vec::new();
                    d.target.bound_names(&mut names);
                    out.extend(names.into_iter().map(|n| (n, decl_kind)));
                }
            }
            StatementKind::ClassDecl(c) => {
                if let Some(n) = &c.name {
                    out.push((n.name.clone(), DeclKind::Class));
                }
            }
            _ => {}
        }
    }
    out
}

impl Resolver {
    // ---------------------------------------------------------------- scope bookkeeping

    fn enter_scope(&mut self, kind: ScopeKind, strict: bool) -> usize {
        let id = self.next_scope;
        self.next_scope += 1;
        if self.pass == Pass::Analyze {
            let parent = if id == 0 { None } else { Some(self.current) };
            let function = match kind {
                ScopeKind::Program | ScopeKind::Function { .. } => id,
                _ => parent.map(|p| self.scopes[p].function).unwrap_or(id),
            };
            self.scopes.push(ScopeData {
                kind,
                parent,
                function,
                strict,
                derived_ctor: false,
                simple_params: true,
                vars: IndexMap::new(),
                annex_b: HashSet::new(),
                materialized: false,
                env_size: 0,
                local_count: 0,
            });
        }
        self.current = id;
        id
    }

    fn exit_scope(&mut self, id: usize) {
        if let Some(parent) = self.scopes[id].parent {
            self.current = parent;
        }
    }

    fn declare(&mut self, scope: usize, name: &str, kind: DeclKind) {
        if self.pass != Pass::Analyze {
            return;
        }
        let vars = &mut self.scopes[scope].vars;
        match vars.get_mut(name) {
            Some(existing) => {
                // A function declaration replaces a `var` or parameter of the same name;
                // a `var` never downgrades an existing binding.
                if kind == DeclKind::Function && matches!(existing.kind, DeclKind::Var | DeclKind::Param | DeclKind::Arguments) {
                    existing.kind = DeclKind::Function;
                }
            }
            None => {
                vars.insert(
                    name.to_string(),
                    VarData {
                        kind,
                        referenced: false,
                        captured: false,
                        location: Location::Unassigned,
                    },
                );
            }
        }
    }

    fn scope_info(&self, id: usize) -> ScopeInfo {
        let scope = &self.scopes[id];
        let mut lexicals = Vec::new();
        if scope.kind != ScopeKind::Program {
            for (name, var) in &scope.vars {
                if !var.kind.is_lexical() {
                    continue;
                }
                let binding = match var.location {
                    Location::Local(slot) => Binding::Local(slot),
                    Location::Heap(slot) => Binding::Heap { depth: 0, slot },
                    _ => continue,
                };
                let mut id = Identifier::new(name.clone(), 0, 0);
                id.binding = binding;
                lexicals.push(id);
            }
        }
        ScopeInfo {
            materialized: scope.materialized,
            env_size: scope.env_size,
            lexicals,
        }
    }

    /// Decides the placement of every binding once the analysis pass is complete.
    fn allocate(&mut self) {
        // A mapped arguments object aliases the parameters through the environment.
        for id in 0..self.scopes.len() {
            let scope = &self.scopes[id];
            let mapped = matches!(scope.kind, ScopeKind::Function { arrow: false })
                && !scope.strict
                && scope.simple_params
                && scope
                    .vars
                    .get(ARGUMENTS_NAME)
                    .is_some_and(|v| v.kind == DeclKind::Arguments && v.referenced);
            if mapped {
                for var in self.scopes[id].vars.values_mut() {
                    if var.kind == DeclKind::Param {
                        var.captured = true;
                    }
                }
            }
        }
        for id in 0..self.scopes.len() {
            let function = self.scopes[id].function;
            let is_program = self.scopes[id].kind == ScopeKind::Program;
            let names: Vec<String> = self.scopes[id].vars.keys().cloned().collect();
            for name in names {
                let (kind, referenced, captured) = {
                    let v = &self.scopes[id].vars[&name];
                    (v.kind, v.referenced, v.captured)
                };
                let location = if is_program {
                    Location::Global
                } else {
                    match kind {
                        DeclKind::Frame if !captured => Location::Frame,
                        DeclKind::Arguments | DeclKind::SelfName | DeclKind::Frame | DeclKind::Hidden if !referenced => {
                            Location::Unassigned
                        }
                        _ if captured => {
                            let scope = &mut self.scopes[id];
                            scope.materialized = true;
                            scope.env_size += 1;
                            Location::Heap(scope.env_size - 1)
                        }
                        _ => {
                            let f = &mut self.scopes[function];
                            f.local_count += 1;
                            Location::Local(f.local_count - 1)
                        }
                    }
                };
                if let Some(v) = self.scopes[id].vars.get_mut(&name) {
                    v.location = location;
                }
            }
        }
    }

    /// Resolves a reference starting at `start`.
    fn resolve_from(&mut self, start: usize, id: &mut Identifier) {
        let ref_function = self.scopes[start].function;
        let mut scope = Some(start);
        let mut depth = 0u32;
        let mut with_objects = Vec::new();
        let pseudo = matches!(id.name.as_str(), THIS_NAME | NEW_TARGET_NAME | CALLEE_NAME);
        while let Some(s) = scope {
            if self.scopes[s].kind == ScopeKind::With && !pseudo {
                let cross = self.scopes[s].function != ref_function;
                if let Some(var) = self.scopes[s].vars.get_mut(WITH_NAME) {
                    match self.pass {
                        Pass::Analyze => {
                            var.referenced = true;
                            var.captured |= cross;
                        }
                        Pass::Assign => with_objects.push(location_binding(var.location, depth)),
                    }
                }
                if id.name == WITH_NAME {
                    // The hidden binding itself.
                    id.binding = with_objects.pop().unwrap_or_default();
                    return;
                }
            }
            let cross = self.scopes[s].function != ref_function;
            let derived = self.scopes[s].derived_ctor;
            if let Some(var) = self.scopes[s].vars.get_mut(&id.name) {
                match self.pass {
                    Pass::Analyze => {
                        var.referenced = true;
                        var.captured |= cross;
                    }
                    Pass::Assign => {
                        id.binding = location_binding(var.location, depth);
                        id.tdz = var.kind.is_lexical() || (var.kind == DeclKind::Frame && id.name == THIS_NAME && derived);
                        id.mutability = match var.kind {
                            DeclKind::Const | DeclKind::ClassInner => Mutability::Const,
                            DeclKind::SelfName => Mutability::FunctionName,
                            _ => Mutability::Mutable,
                        };
                        id.with_objects = with_objects;
                    }
                }
                return;
            }
            if self.scopes[s].materialized {
                depth += 1;
            }
            scope = self.scopes[s].parent;
        }
        if self.pass == Pass::Assign {
            id.binding = Binding::Global;
            id.with_objects = with_objects;
            id.tdz = false;
            id.mutability = Mutability::Mutable;
        }
    }

    fn reference(&mut self, id: &mut Identifier) {
        self.resolve_from(self.current, id);
    }

    // ---------------------------------------------------------------- traversal

    fn program(&mut self, p: &mut Program) {
        let id = self.enter_scope(ScopeKind::Program, p.strict);
        let mut var_names = Vec::new();
        collect_var_names(&p.body, &mut var_names);
        let function_names: Vec<String> = direct_function_declarations(&p.body)
            .filter_map(|f| f.name.as_ref().map(|n| n.name.clone()))
            .collect();
        let lexicals = lexical_declarations(&p.body);
        if !p.strict {
            let mut block_fns = Vec::new();
            collect_block_functions(&p.body, false, &mut block_fns);
            for name in block_fns {
                if lexicals.iter().any(|(n, _)| *n == name) {
                    continue;
                }
                if !var_names.contains(&name) {
                    var_names.push(name.clone());
                }
                self.scopes[id].annex_b.insert(name);
            }
        }
        for n in &var_names {
            self.declare(id, n, DeclKind::Var);
        }
        for n in &function_names {
            self.declare(id, n, DeclKind::Function);
        }
        for (n, k) in &lexicals {
            self.declare(id, n, *k);
        }
        for s in &mut p.body {
            self.statement(s);
        }
        if self.pass == Pass::Assign {
            p.scope = self.scope_info(id);
            p.local_count = self.scopes[id].local_count;
            let mut seen = HashSet::new();
            p.var_names = var_names.into_iter().filter(|n| !function_names.contains(n) && seen.insert(n.clone())).collect();
            p.function_names = function_names;
            p.lexical_names = lexicals.into_iter().map(|(n, k)| (n, k == DeclKind::Const)).collect();
        }
        self.exit_scope(id);
    }

    fn hoist_block(&mut self, id: usize, body: &[Statement]) {
        if self.pass != Pass::Analyze {
            return;
        }
        for (name, kind) in lexical_declarations(body) {
            self.declare(id, &name, kind);
        }
        for f in direct_function_declarations(body) {
            if let Some(n) = &f.name {
                self.declare(id, &n.name, DeclKind::Let);
                // Block functions are initialized on entry; they behave as mutable bindings.
                if let Some(v) = self.scopes[id].vars.get_mut(&n.name) {
                    v.kind = DeclKind::Function;
                }
            }
        }
    }

    fn block(&mut self, b: &mut Block) {
        let strict = self.scopes[self.current].strict;
        let id = self.enter_scope(ScopeKind::Block, strict);
        self.hoist_block(id, &b.body);
        for s in &mut b.body {
            self.statement(s);
        }
        if self.pass == Pass::Assign {
            b.scope = self.scope_info(id);
        }
        self.exit_scope(id);
    }

    /// Finds the function-level scope that owns `scope`'s `var` bindings.
    fn var_scope(&self, scope: usize) -> usize {
        self.scopes[scope].function
    }

    fn statement(&mut self, s: &mut Statement) {
        match &mut s.kind {
            StatementKind::Expr(e) | StatementKind::Throw(e) => self.expr(e),
            StatementKind::VarDecl(_, decls) => {
                for d in decls {
                    self.pattern(&mut d.target);
                    if let Some(init) = &mut d.init {
                        self.expr(init);
                    }
                }
            }
            StatementKind::FunctionDecl { func, var_copy } => {
                if let Some(name) = &mut func.name {
                    self.reference(name);
                    let function_scope = self.var_scope(self.current);
                    let in_block = self.current != function_scope;
                    if in_block && self.scopes[function_scope].annex_b.contains(&name.name) {
                        let mut copy = Identifier::new(name.name.clone(), name.line, name.column);
                        // Skip the block's own binding so the copy lands on the function-level var.
                        if let Some(parent) = self.scopes[self.current].parent {
                            self.resolve_from(parent, &mut copy);
                        }
                        *var_copy = Some(copy);
                    }
                }
                self.function(func);
            }
            StatementKind::ClassDecl(c) => {
                if let Some(name) = &mut c.name {
                    self.reference(name);
                }
                self.class(c);
            }
            StatementKind::Return(e) => {
                if let Some(e) = e {
                    self.expr(e);
                }
            }
            StatementKind::If(test, cons, alt) => {
                self.expr(test);
                self.statement(cons);
                if let Some(a) = alt {
                    self.statement(a);
                }
            }
            StatementKind::Block(b) => self.block(b),
            StatementKind::For {
                init,
                test,
                update,
                body,
                scope,
            } => {
                let strict = self.scopes[self.current].strict;
                let id = self.enter_scope(ScopeKind::Block, strict);
                if self.pass == Pass::Analyze
                    && let Some(ForInit::VarDecl(kind @ (VarKind::Let | VarKind::Const), decls)) = init
                {
                    let decl_kind = if *kind == VarKind::Let { DeclKind::Let } else { DeclKind::Const };
                    for d in decls.iter() {
                        let mut names = Vec::new();
                        d.target.bound_names(&mut names);
                        for n in names {
                            self.declare(id, &n, decl_kind);
                        }
                    }
                }
                match init {
                    Some(ForInit::VarDecl(_, decls)) => {
                        for d in decls {
                            self.pattern(&mut d.target);
                            if let Some(e) = &mut d.init {
                                self.expr(e);
                            }
                        }
                    }
                    Some(ForInit::Expr(e)) => self.expr(e),
                    None => {}
                }
                if let Some(t) = test {
                    self.expr(t);
                }
                if let Some(u) = update {
                    self.expr(u);
                }
                self.statement(body);
                if self.pass == Pass::Assign {
                    *scope = self.scope_info(id);
                }
                self.exit_scope(id);
            }
            StatementKind::ForIn { left, right, body, scope } | StatementKind::ForOf { left, right, body, scope } => {
                self.expr(right);
                let strict = self.scopes[self.current].strict;
                let id = self.enter_scope(ScopeKind::Block, strict);
                match left {
                    ForBinding::Decl(kind, pattern) => {
                        if matches!(kind, VarKind::Let | VarKind::Const) {
                            let decl_kind = if *kind == VarKind::Let { DeclKind::Let } else { DeclKind::Const };
                            let mut names = Vec::new();
                            pattern.bound_names(&mut names);
                            for n in names {
                                self.declare(id, &n, decl_kind);
                            }
                        }
                        self.pattern(pattern);
                    }
                    ForBinding::Target(pattern) => self.pattern(pattern),
                }
                self.statement(body);
                if self.pass == Pass::Assign {
                    *scope = self.scope_info(id);
                }
                self.exit_scope(id);
            }
            StatementKind::While(test, body) | StatementKind::DoWhile(body, test) => {
                self.expr(test);
                self.statement(body);
            }
            StatementKind::Switch {
                discriminant,
                cases,
                scope,
            } => {
                self.expr(discriminant);
                let strict = self.scopes[self.current].strict;
                let id = self.enter_scope(ScopeKind::Block, strict);
                if self.pass == Pass::Analyze {
                    let all: Vec<Statement> = cases.iter().flat_map(|c| c.body.iter().cloned()).collect();
                    self.hoist_block(id, &all);
                }
                for c in cases {
                    if let Some(t) = &mut c.test {
                        self.expr(t);
                    }
                    for s in &mut c.body {
                        self.statement(s);
                    }
                }
                if self.pass == Pass::Assign {
                    *scope = self.scope_info(id);
                }
                self.exit_scope(id);
            }
            StatementKind::Try {
                block,
                handler,
                finalizer,
            } => {
                self.block(block);
                if let Some(h) = handler {
                    let strict = self.scopes[self.current].strict;
                    let id = self.enter_scope(ScopeKind::Block, strict);
                    if let Some(p) = &mut h.param {
                        let mut names = Vec::new();
                        p.bound_names(&mut names);
                        for n in names {
                            self.declare(id, &n, DeclKind::CatchParam);
                        }
                        self.pattern(p);
                    }
                    self.block(&mut h.body);
                    if self.pass == Pass::Assign {
                        h.scope = self.scope_info(id);
                    }
                    self.exit_scope(id);
                }
                if let Some(f) = finalizer {
                    self.block(f);
                }
            }
            StatementKind::Labeled(_, body) => self.statement(body),
            StatementKind::With {
                object,
                body,
                object_binding,
                scope,
            } => {
                self.expr(object);
                let strict = self.scopes[self.current].strict;
                let id = self.enter_scope(ScopeKind::With, strict);
                self.declare(id, WITH_NAME, DeclKind::Hidden);
                if self.pass == Pass::Analyze
                    && let Some(v) = self.scopes[id].vars.get_mut(WITH_NAME)
                {
                    v.referenced = true;
                }
                self.reference(object_binding);
                self.statement(body);
                if self.pass == Pass::Assign {
                    *scope = self.scope_info(id);
                }
                self.exit_scope(id);
            }
            StatementKind::Break(_) | StatementKind::Continue(_) | StatementKind::Debugger | StatementKind::Empty => {}
        }
    }

    fn function(&mut self, f: &mut FunctionNode) {
        let arrow = f.kind == FunctionKind::Arrow;
        let id = self.enter_scope(ScopeKind::Function { arrow }, f.strict);
        if self.pass == Pass::Analyze {
            self.hoist_function(id, f);
        }
        for p in &mut f.params {
            self.pattern(&mut p.target);
            if let Some(d) = &mut p.default {
                self.expr(d);
            }
        }
        if let Some(r) = &mut f.rest {
            self.pattern(r);
        }
        for s in &mut f.body {
            self.statement(s);
        }
        if self.pass == Pass::Assign {
            self.finish_function(id, f);
        }
        self.exit_scope(id);
    }

    fn hoist_function(&mut self, id: usize, f: &FunctionNode) {
        let arrow = f.kind == FunctionKind::Arrow;
        self.scopes[id].derived_ctor = f.kind == (FunctionKind::ClassConstructor { derived: true });
        self.scopes[id].simple_params = f.simple_params;
        let mut param_names = Vec::new();
        for p in &f.params {
            p.target.bound_names(&mut param_names);
        }
        if let Some(r) = &f.rest {
            r.bound_names(&mut param_names);
        }
        for n in &param_names {
            self.declare(id, n, DeclKind::Param);
        }
        let lexicals = lexical_declarations(&f.body);
        let function_names: Vec<String> = direct_function_declarations(&f.body)
            .filter_map(|func| func.name.as_ref().map(|n| n.name.clone()))
            .collect();
        if !arrow {
            let shadowed = param_names.iter().any(|n| n == ARGUMENTS_NAME)
                || function_names.iter().any(|n| n == ARGUMENTS_NAME)
                || lexicals.iter().any(|(n, _)| n == ARGUMENTS_NAME);
            if !shadowed {
                self.declare(id, ARGUMENTS_NAME, DeclKind::Arguments);
            }
            for name in [THIS_NAME, NEW_TARGET_NAME, CALLEE_NAME] {
                self.declare(id, name, DeclKind::Frame);
            }
        }
        let mut var_names = Vec::new();
        collect_var_names(&f.body, &mut var_names);
        for n in &var_names {
            self.declare(id, n, DeclKind::Var);
        }
        if !f.strict {
            let mut block_fns = Vec::new();
            collect_block_functions(&f.body, false, &mut block_fns);
            for name in block_fns {
                if !lexicals.iter().any(|(n, _)| *n == name) && !param_names.contains(&name) {
                    self.declare(id, &name, DeclKind::Var);
                    self.scopes[id].annex_b.insert(name);
                }
            }
        }
        for n in &function_names {
            self.declare(id, n, DeclKind::Function);
        }
        for (n, k) in lexicals {
            self.declare(id, &n, k);
        }
        if f.is_expression
            && !arrow
            && let Some(name) = &f.name
        {
            self.declare(id, &name.name, DeclKind::SelfName);
        }
    }

    fn finish_function(&mut self, id: usize, f: &mut FunctionNode) {
        f.scope = self.scope_info(id);
        f.local_count = self.scopes[id].local_count;
        let scope = &self.scopes[id];
        f.arguments = match scope.vars.get(ARGUMENTS_NAME) {
            Some(v) if v.kind == DeclKind::Arguments && v.location != Location::Unassigned => {
                let mut ident = Identifier::new(ARGUMENTS_NAME, f.line, f.column);
                ident.binding = location_binding(v.location, 0);
                let mode = if !f.strict && f.simple_params {
                    ArgumentsMode::Mapped
                } else {
                    ArgumentsMode::Unmapped
                };
                Some((ident, mode))
            }
            _ => None,
        };
        f.self_binding = match &f.name {
            Some(name) if f.is_expression => match scope.vars.get(&name.name) {
                Some(v) if v.kind == DeclKind::SelfName && v.location != Location::Unassigned => {
                    let mut ident = Identifier::new(name.name.clone(), name.line, name.column);
                    ident.binding = location_binding(v.location, 0);
                    ident.mutability = Mutability::FunctionName;
                    Some(ident)
                }
                _ => None,
            },
            _ => None,
        };
        f.frame_captures = [THIS_NAME, NEW_TARGET_NAME, CALLEE_NAME]
            .iter()
            .filter_map(|name| {
                let v = scope.vars.get(*name)?;
                match v.location {
                    Location::Heap(slot) => {
                        let mut ident = Identifier::new(*name, f.line, f.column);
                        ident.binding = Binding::Heap { depth: 0, slot };
                        Some(ident)
                    }
                    _ => None,
                }
            })
            .collect();
    }

    fn class(&mut self, c: &mut ClassNode) {
        let id = self.enter_scope(ScopeKind::Block, true);
        if let Some(inner) = &mut c.inner_name {
            self.declare(id, &inner.name, DeclKind::ClassInner);
            self.reference(inner);
        }
        if let Some(sc) = &mut c.super_class {
            self.expr(sc);
        }
        if let Some(ctor) = &mut c.constructor {
            self.function(ctor);
        }
        for m in &mut c.members {
            if let PropKey::Computed(e) = &mut m.key {
                self.expr(e);
            }
            self.function(&mut m.func);
        }
        if self.pass == Pass::Assign {
            c.scope = self.scope_info(id);
        }
        self.exit_scope(id);
    }

    fn pattern(&mut self, p: &mut Pattern) {
        match p {
            Pattern::Identifier(id) => self.reference(id),
            Pattern::Expr(e) => self.expr(e),
            Pattern::Array { elements, rest } => {
                for el in elements.iter_mut().flatten() {
                    self.pattern(&mut el.target);
                    if let Some(d) = &mut el.default {
                        self.expr(d);
                    }
                }
                if let Some(r) = rest {
                    self.pattern(r);
                }
            }
            Pattern::Object { props, rest } => {
                for prop in props {
                    if let PropKey::Computed(e) = &mut prop.key {
                        self.expr(e);
                    }
                    self.pattern(&mut prop.value);
                    if let Some(d) = &mut prop.default {
                        self.expr(d);
                    }
                }
                if let Some(r) = rest {
                    self.pattern(r);
                }
            }
        }
    }

    fn member_property(&mut self, p: &mut MemberProperty) {
        if let MemberProperty::Computed(e) = p {
            self.expr(e);
        }
    }

    fn expr(&mut self, e: &mut Expr) {
        match &mut e.kind {
            ExprKind::Number(_) | ExprKind::String(_) | ExprKind::Boolean(_) | ExprKind::Null | ExprKind::Regex { .. } => {}
            ExprKind::Template { exprs, .. } => {
                for x in exprs {
                    self.expr(x);
                }
            }
            ExprKind::TaggedTemplate { tag, exprs, .. } => {
                self.expr(tag);
                for x in exprs {
                    self.expr(x);
                }
            }
            ExprKind::Identifier(id) | ExprKind::This(id) | ExprKind::NewTarget(id) => self.reference(id),
            ExprKind::Array(elements) => {
                for x in elements.iter_mut().flatten() {
                    self.expr(x);
                }
            }
            ExprKind::Object(props) => {
                for p in props {
                    match p {
                        PropertyDef::Value(key, value) => {
                            if let PropKey::Computed(k) = key {
                                self.expr(k);
                            }
                            self.expr(value);
                        }
                        PropertyDef::Method(key, f) | PropertyDef::Getter(key, f) | PropertyDef::Setter(key, f) => {
                            if let PropKey::Computed(k) = key {
                                self.expr(k);
                            }
                            self.function(f);
                        }
                        PropertyDef::Spread(x) | PropertyDef::Proto(x) => self.expr(x),
                    }
                }
            }
            ExprKind::Function(f) => self.function(f),
            ExprKind::Class(c) => self.class(c),
            ExprKind::Unary(_, x) | ExprKind::Spread(x) | ExprKind::OptionalChain(x) => self.expr(x),
            ExprKind::Update { target, .. } => self.pattern(target),
            ExprKind::Binary(_, l, r) | ExprKind::Logical(_, l, r) => {
                self.expr(l);
                self.expr(r);
            }
            ExprKind::Assign { target, value, .. } => {
                self.pattern(target);
                self.expr(value);
            }
            ExprKind::Conditional(t, c, a) => {
                self.expr(t);
                self.expr(c);
                self.expr(a);
            }
            ExprKind::Call { callee, args, .. } | ExprKind::New { callee, args } => {
                self.expr(callee);
                for a in args {
                    self.expr(a);
                }
            }
            ExprKind::Member { object, property, .. } => {
                self.expr(object);
                self.member_property(property);
            }
            ExprKind::SuperMember { property, this } => {
                self.reference(this);
                self.member_property(property);
            }
            ExprKind::SuperCall {
                args,
                this,
                callee,
                new_target,
            } => {
                self.reference(callee);
                for a in args {
                    self.expr(a);
                }
                self.reference(new_target);
                self.reference(this);
            }
            ExprKind::Sequence(xs) => {
                for x in xs {
                    self.expr(x);
                }
            }
        }
    }
}

fn location_binding(location: Location, depth: u32) -> Binding {
    match location {
        Location::Local(slot) => Binding::Local(slot),
        Location::Heap(slot) => Binding::Heap { depth, slot },
        Location::Global => Binding::Global,
        Location::Frame => Binding::Frame,
        Location::Unassigned => Binding::Unresolved,
    }
}
