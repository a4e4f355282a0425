use crate::core::{ClassNode, Expr, FunctionNode, Identifier, Pattern};

/// Resolver output for a scope-bearing node.
#[derive(Clone, Debug, Default)]
pub struct ScopeInfo {
    /// The scope owns a heap environment at run time.
    pub materialized: bool,
    pub env_size: u32,
    /// `let`/`const`/`class` bindings, reset to the uninitialized state on entry.
    pub lexicals: Vec<Identifier>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

#[derive(Clone, Debug)]
pub struct VarDeclarator {
    pub target: Pattern,
    pub init: Option<Expr>,
}

#[derive(Clone, Debug)]
pub enum ForInit {
    VarDecl(VarKind, Vec<VarDeclarator>),
    Expr(Expr),
}

/// Left-hand side of `for-in` / `for-of`.
#[derive(Clone, Debug)]
pub enum ForBinding {
    Decl(VarKind, Pattern),
    Target(Pattern),
}

#[derive(Clone, Debug)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Expr>,
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug)]
pub struct Block {
    pub body: Vec<Statement>,
    pub scope: ScopeInfo,
}

#[derive(Clone, Debug)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Block,
    pub scope: ScopeInfo,
}

#[derive(Clone, Debug)]
pub struct Statement {
    pub kind: StatementKind,
    pub line: usize,
    pub column: usize,
}

impl Statement {
    pub fn new(kind: StatementKind, line: usize, column: usize) -> Self {
        Statement { kind, line, column }
    }
}

#[derive(Clone, Debug)]
pub enum StatementKind {
    Expr(Expr),
    VarDecl(VarKind, Vec<VarDeclarator>),
    FunctionDecl {
        func: Box<FunctionNode>,
        /// Sloppy-mode block function: also assigned to this function-level binding.
        var_copy: Option<Identifier>,
    },
    ClassDecl(Box<ClassNode>),
    Return(Option<Expr>),
    If(Expr, Box<Statement>, Option<Box<Statement>>),
    Block(Block),
    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Statement>,
        scope: ScopeInfo,
    },
    ForIn {
        left: ForBinding,
        right: Expr,
        body: Box<Statement>,
        scope: ScopeInfo,
    },
    ForOf {
        left: ForBinding,
        right: Expr,
        body: Box<Statement>,
        scope: ScopeInfo,
    },
    While(Expr, Box<Statement>),
    DoWhile(Box<Statement>, Expr),
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
        scope: ScopeInfo,
    },
    Try {
        block: Block,
        handler: Option<CatchClause>,
        finalizer: Option<Block>,
    },
    Throw(Expr),
    Break(Option<String>),
    Continue(Option<String>),
    Labeled(String, Box<Statement>),
    With {
        object: Expr,
        body: Box<Statement>,
        /// Hidden binding holding the object for the duration of the body.
        object_binding: Identifier,
        scope: ScopeInfo,
    },
    Debugger,
    Empty,
}

/// A parsed script.
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub body: Vec<Statement>,
    pub strict: bool,
    pub source: String,
    pub scope: ScopeInfo,
    pub local_count: u32,
    /// Top-level `var` names, created as global object properties.
    pub var_names: Vec<String>,
    /// Top-level function declarations, created as global object properties.
    pub function_names: Vec<String>,
    /// Top-level `let`/`const`/`class` names; `true` marks `const`.
    pub lexical_names: Vec<(String, bool)>,
}
