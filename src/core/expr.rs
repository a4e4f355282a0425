use crate::core::{ScopeInfo, Statement};

/// Where the resolver placed a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Binding {
    #[default]
    Unresolved,
    /// Slot in the frame's local array.
    Local(u32),
    /// Slot in a heap environment `depth` materialized scopes up from the reference.
    Heap { depth: u32, slot: u32 },
    /// Global lexical declaration or property of the global object.
    Global,
    /// Value held by the running call frame (`this`, `new.target`, the callee).
    Frame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mutability {
    #[default]
    Mutable,
    /// `const` binding: assignment throws TypeError.
    Const,
    /// Self-binding of a named function expression: assignment is ignored in sloppy code.
    FunctionName,
}

/// Identifier reference or binding name, annotated by the scope resolver.
#[derive(Debug, Clone, Default)]
pub struct Identifier {
    pub name: String,
    pub binding: Binding,
    /// Hidden bindings holding enclosing `with` objects, innermost first.
    pub with_objects: Vec<Binding>,
    /// Binding is lexical and may be read before initialization.
    pub tdz: bool,
    pub mutability: Mutability,
    pub line: usize,
    pub column: usize,
}

impl Identifier {
    pub fn new(name: impl Into<String>, line: usize, column: usize) -> Self {
        Identifier {
            name: name.into(),
            line,
            column,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    TypeOf,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    In,
    InstanceOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Binary(BinaryOp),
    Logical(LogicalOp),
}

#[derive(Debug, Clone)]
pub enum PropKey {
    Named(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone)]
pub enum MemberProperty {
    Named(String),
    Computed(Box<Expr>),
}

/// Binding or assignment target, possibly destructuring.
#[derive(Debug, Clone)]
pub enum Pattern {
    Identifier(Identifier),
    /// Member expression (assignment targets only).
    Expr(Box<Expr>),
    Array {
        elements: Vec<Option<PatternElem>>,
        rest: Option<Box<Pattern>>,
    },
    Object {
        props: Vec<ObjectPatternProp>,
        rest: Option<Box<Pattern>>,
    },
}

#[derive(Debug, Clone)]
pub struct PatternElem {
    pub target: Pattern,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct ObjectPatternProp {
    pub key: PropKey,
    pub value: Pattern,
    pub default: Option<Expr>,
}

impl Pattern {
    /// Identifiers bound by this pattern, in source order.
    pub fn bound_names(&self, out: &mut Vec<String>) {
        match self {
            Pattern::Identifier(id) => out.push(id.name.clone()),
            Pattern::Expr(_) => {}
            Pattern::Array { elements, rest } => {
                for e in elements.iter().flatten() {
                    e.target.bound_names(out);
                }
                if let Some(r) = rest {
                    r.bound_names(out);
                }
            }
            Pattern::Object { props, rest } => {
                for p in props {
                    p.value.bound_names(out);
                }
                if let Some(r) = rest {
                    r.bound_names(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Normal,
    Arrow,
    Method,
    Getter,
    Setter,
    ClassConstructor { derived: bool },
}

/// How a function exposes its `arguments` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentsMode {
    /// Indices alias the parameter bindings.
    Mapped,
    Unmapped,
}

#[derive(Debug, Clone)]
pub struct FunctionNode {
    /// Declaration name (bound in the enclosing scope) or expression self-name.
    pub name: Option<Identifier>,
    pub params: Vec<PatternElem>,
    pub rest: Option<Pattern>,
    pub body: Vec<Statement>,
    pub kind: FunctionKind,
    pub strict: bool,
    pub is_expression: bool,
    pub simple_params: bool,
    pub source: String,
    pub line: usize,
    pub column: usize,
    pub scope: ScopeInfo,
    /// Frame-local slot count, filled by the resolver.
    pub local_count: u32,
    pub arguments: Option<(Identifier, ArgumentsMode)>,
    /// Binding for the self-name of a named function expression.
    pub self_binding: Option<Identifier>,
    /// `this`, `new.target` and the callee when captured by nested arrow functions;
    /// copied from the frame into their heap slots on entry.
    pub frame_captures: Vec<Identifier>,
}

impl FunctionNode {
    pub fn expected_arg_count(&self) -> u32 {
        self.params.iter().take_while(|p| p.default.is_none()).count() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Getter,
    Setter,
}

#[derive(Debug, Clone)]
pub struct ClassMember {
    pub key: PropKey,
    pub is_static: bool,
    pub kind: MethodKind,
    pub func: Box<FunctionNode>,
}

#[derive(Debug, Clone)]
pub struct ClassNode {
    pub name: Option<Identifier>,
    /// Inner immutable binding of the class name, visible to its methods.
    pub inner_name: Option<Identifier>,
    pub super_class: Option<Box<Expr>>,
    pub constructor: Option<Box<FunctionNode>>,
    pub members: Vec<ClassMember>,
    pub scope: ScopeInfo,
    pub source: String,
}

#[derive(Debug, Clone)]
pub enum PropertyDef {
    Value(PropKey, Expr),
    Method(PropKey, Box<FunctionNode>),
    Getter(PropKey, Box<FunctionNode>),
    Setter(PropKey, Box<FunctionNode>),
    Spread(Expr),
    /// `__proto__: value` sets the prototype of the literal.
    Proto(Expr),
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Number(f64),
    String(Vec<u16>),
    Boolean(bool),
    Null,
    Regex {
        pattern: String,
        flags: String,
    },
    Template {
        quasis: Vec<Vec<u16>>,
        exprs: Vec<Expr>,
    },
    TaggedTemplate {
        tag: Box<Expr>,
        cooked: Vec<Option<Vec<u16>>>,
        raw: Vec<String>,
        exprs: Vec<Expr>,
    },
    Identifier(Identifier),
    /// `this`, resolved like a variable named `this`.
    This(Identifier),
    Array(Vec<Option<Expr>>),
    Object(Vec<PropertyDef>),
    Function(Box<FunctionNode>),
    Class(Box<ClassNode>),
    Unary(UnaryOp, Box<Expr>),
    Update {
        increment: bool,
        prefix: bool,
        target: Box<Pattern>,
    },
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Logical(LogicalOp, Box<Expr>, Box<Expr>),
    Assign {
        op: AssignOp,
        target: Box<Pattern>,
        value: Box<Expr>,
    },
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        optional: bool,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: MemberProperty,
        optional: bool,
    },
    /// Boundary of an optional chain: a short-circuit inside yields `undefined` here.
    OptionalChain(Box<Expr>),
    SuperMember {
        property: MemberProperty,
        this: Identifier,
    },
    SuperCall {
        args: Vec<Expr>,
        this: Identifier,
        callee: Identifier,
        new_target: Identifier,
    },
    NewTarget(Identifier),
    Sequence(Vec<Expr>),
    Spread(Box<Expr>),
}

impl Expr {
    pub fn new(kind: ExprKind, line: usize, column: usize) -> Self {
        Expr { kind, line, column }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Number(_) | ExprKind::String(_) | ExprKind::Boolean(_) | ExprKind::Null
        )
    }
}
