//! AST-level optimizations run after scope resolution.
//!
//! Only literal operands are folded, using the same conversion routines the
//! VM uses, so folded results are indistinguishable from evaluated ones.

use crate::core::number::{number_to_utf16, string_to_number, to_int32, to_uint32};
use crate::core::{
    BinaryOp, Block, ClassNode, Expr, ExprKind, ForInit, FunctionNode, LogicalOp, MemberProperty, Pattern, Program, PropKey,
    PropertyDef, Statement, StatementKind, UnaryOp,
};
use crate::unicode::utf8_to_utf16;

pub fn optimize_program(program: &mut Program) {
    let mut folds = 0usize;
    statements(&mut program.body, &mut folds);
    log::debug!("optimizer applied {folds} folds");
}

/// Literal value of a constant expression.
#[derive(Clone, Debug, PartialEq)]
enum Constant {
    Number(f64),
    String(Vec<u16>),
    Boolean(bool),
    Null,
}

impl Constant {
    fn of(e: &Expr) -> Option<Constant> {
        match &e.kind {
            ExprKind::Number(n) => Some(Constant::Number(*n)),
            ExprKind::String(s) => Some(Constant::String(s.clone())),
            ExprKind::Boolean(b) => Some(Constant::Boolean(*b)),
            ExprKind::Null => Some(Constant::Null),
            _ => None,
        }
    }

    fn into_kind(self) -> ExprKind {
        match self {
            Constant::Number(n) => ExprKind::Number(n),
            Constant::String(s) => ExprKind::String(s),
            Constant::Boolean(b) => ExprKind::Boolean(b),
            Constant::Null => ExprKind::Null,
        }
    }

    fn truthy(&self) -> bool {
        match self {
            Constant::Number(n) => *n != 0.0 && !n.is_nan(),
            Constant::String(s) => !s.is_empty(),
            Constant::Boolean(b) => *b,
            Constant::Null => false,
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            Constant::Number(n) => *n,
            Constant::String(s) => string_to_number(s),
            Constant::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Constant::Null => 0.0,
        }
    }

    fn to_utf16(&self) -> Vec<u16> {
        match self {
            Constant::Number(n) => number_to_utf16(*n),
            Constant::String(s) => s.clone(),
            Constant::Boolean(b) => utf8_to_utf16(if *b { "true" } else { "false" }),
            Constant::Null => utf8_to_utf16("null"),
        }
    }

    fn type_of(&self) -> &'static str {
        match self {
            Constant::Number(_) => "number",
            Constant::String(_) => "string",
            Constant::Boolean(_) => "boolean",
            Constant::Null => "object",
        }
    }

    fn strict_equals(&self, other: &Constant) -> bool {
        self == other
    }

    fn loose_equals(&self, other: &Constant) -> bool {
        match (self, other) {
            (Constant::Null, Constant::Null) => true,
            (Constant::Null, _) | (_, Constant::Null) => false,
            (Constant::String(_), Constant::String(_)) => self == other,
            _ if std::mem::discriminant(self) == std::mem::discriminant(other) => self.strict_equals(other),
            _ => self.to_number() == other.to_number(),
        }
    }
}

/// JavaScript `**`, which differs from `powf` for a base of ±1 and an infinite or NaN exponent.
pub(crate) fn exponentiate(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

fn fold_binary(op: BinaryOp, l: &Constant, r: &Constant) -> Option<Constant> {
    use BinaryOp::*;
    let num = |f: fn(f64, f64) -> f64| Some(Constant::Number(f(l.to_number(), r.to_number())));
    match op {
        Add => match (l, r) {
            (Constant::String(_), _) | (_, Constant::String(_)) => {
                let mut s = l.to_utf16();
                s.extend(r.to_utf16());
                Some(Constant::String(s))
            }
            _ => num(|a, b| a + b),
        },
        Sub => num(|a, b| a - b),
        Mul => num(|a, b| a * b),
        Div => num(|a, b| a / b),
        Mod => num(|a, b| a % b),
        Exp => num(exponentiate),
        BitAnd => Some(Constant::Number((to_int32(l.to_number()) & to_int32(r.to_number())) as f64)),
        BitOr => Some(Constant::Number((to_int32(l.to_number()) | to_int32(r.to_number())) as f64)),
        BitXor => Some(Constant::Number((to_int32(l.to_number()) ^ to_int32(r.to_number())) as f64)),
        Shl => Some(Constant::Number(
            to_int32(l.to_number()).wrapping_shl(to_uint32(r.to_number()) & 31) as f64,
        )),
        Shr => Some(Constant::Number((to_int32(l.to_number()) >> (to_uint32(r.to_number()) & 31)) as f64)),
        UShr => Some(Constant::Number((to_uint32(l.to_number()) >> (to_uint32(r.to_number()) & 31)) as f64)),
        StrictEq => Some(Constant::Boolean(l.strict_equals(r))),
        StrictNotEq => Some(Constant::Boolean(!l.strict_equals(r))),
        Eq => Some(Constant::Boolean(l.loose_equals(r))),
        NotEq => Some(Constant::Boolean(!l.loose_equals(r))),
        Lt => Some(Constant::Boolean(less_than(l, r).unwrap_or(false))),
        Gt => Some(Constant::Boolean(less_than(r, l).unwrap_or(false))),
        LtEq => Some(Constant::Boolean(less_than(r, l).is_some_and(|g| !g))),
        GtEq => Some(Constant::Boolean(less_than(l, r).is_some_and(|g| !g))),
        In | InstanceOf => None,
    }
}

/// Abstract relational comparison; `None` stands for `undefined` (a NaN operand).
fn less_than(a: &Constant, b: &Constant) -> Option<bool> {
    match (a, b) {
        (Constant::String(x), Constant::String(y)) => Some(x < y),
        _ => {
            let (x, y) = (a.to_number(), b.to_number());
            if x.is_nan() || y.is_nan() { None } else { Some(x < y) }
        }
    }
}

fn fold_unary(op: UnaryOp, v: &Constant) -> Option<Constant> {
    match op {
        UnaryOp::Minus => Some(Constant::Number(-v.to_number())),
        UnaryOp::Plus => Some(Constant::Number(v.to_number())),
        UnaryOp::Not => Some(Constant::Boolean(!v.truthy())),
        UnaryOp::BitNot => Some(Constant::Number(!to_int32(v.to_number()) as f64)),
        UnaryOp::TypeOf => Some(Constant::String(utf8_to_utf16(v.type_of()))),
        UnaryOp::Void | UnaryOp::Delete => None,
    }
}

fn statements(list: &mut Vec<Statement>, folds: &mut usize) {
    for s in list.iter_mut() {
        statement(s, folds);
    }
    // Everything after an abrupt completion is dead, except hoisted function declarations.
    if let Some(pos) = list.iter().position(|s| {
        matches!(
            s.kind,
            StatementKind::Return(_) | StatementKind::Throw(_) | StatementKind::Break(_) | StatementKind::Continue(_)
        )
    }) {
        let before = list.len();
        let tail = list.split_off(pos + 1);
        list.extend(tail.into_iter().filter(|s| is_function_declaration(s)));
        *folds += before - list.len();
    }
}

fn is_function_declaration(s: &Statement) -> bool {
    match &s.kind {
        StatementKind::FunctionDecl { .. } => true,
        StatementKind::Labeled(_, inner) => is_function_declaration(inner),
        _ => false,
    }
}

fn block(b: &mut Block, folds: &mut usize) {
    statements(&mut b.body, folds);
}

fn statement(s: &mut Statement, folds: &mut usize) {
    match &mut s.kind {
        StatementKind::Expr(e) | StatementKind::Throw(e) => expr(e, folds),
        StatementKind::VarDecl(_, decls) => {
            for d in decls {
                pattern(&mut d.target, folds);
                if let Some(init) = &mut d.init {
                    expr(init, folds);
                }
            }
        }
        StatementKind::FunctionDecl { func, .. } => function(func, folds),
        StatementKind::ClassDecl(c) => class(c, folds),
        StatementKind::Return(e) => {
            if let Some(e) = e {
                expr(e, folds);
            }
        }
        StatementKind::If(test, cons, alt) => {
            expr(test, folds);
            statement(cons, folds);
            if let Some(a) = alt {
                statement(a, folds);
            }
            if let Some(c) = Constant::of(test) {
                *folds += 1;
                let taken = if c.truthy() {
                    Some(std::mem::replace(&mut **cons, Statement::new(StatementKind::Empty, 0, 0)))
                } else {
                    alt.take().map(|a| *a)
                };
                *s = taken.unwrap_or_else(|| Statement::new(StatementKind::Empty, s.line, s.column));
            }
        }
        StatementKind::Block(b) => block(b, folds),
        StatementKind::For {
            init, test, update, body, ..
        } => {
            match init {
                Some(ForInit::VarDecl(_, decls)) => {
                    for d in decls {
                        pattern(&mut d.target, folds);
                        if let Some(e) = &mut d.init {
                            expr(e, folds);
                        }
                    }
                }
                Some(ForInit::Expr(e)) => expr(e, folds),
                None => {}
            }
            if let Some(t) = test {
                expr(t, folds);
            }
            if let Some(u) = update {
                expr(u, folds);
            }
            statement(body, folds);
        }
        StatementKind::ForIn { right, body, left, .. } | StatementKind::ForOf { right, body, left, .. } => {
            match left {
                crate::core::ForBinding::Decl(_, p) | crate::core::ForBinding::Target(p) => pattern(p, folds),
            }
            expr(right, folds);
            statement(body, folds);
        }
        StatementKind::While(test, body) => {
            expr(test, folds);
            statement(body, folds);
            if Constant::of(test).is_some_and(|c| !c.truthy()) {
                *folds += 1;
                *s = Statement::new(StatementKind::Empty, s.line, s.column);
            }
        }
        StatementKind::DoWhile(body, test) => {
            statement(body, folds);
            expr(test, folds);
        }
        StatementKind::Switch { discriminant, cases, .. } => {
            expr(discriminant, folds);
            for c in cases {
                if let Some(t) = &mut c.test {
                    expr(t, folds);
                }
                statements(&mut c.body, folds);
            }
        }
        StatementKind::Try {
            block: b,
            handler,
            finalizer,
        } => {
            block(b, folds);
            if let Some(h) = handler {
                if let Some(p) = &mut h.param {
                    pattern(p, folds);
                }
                block(&mut h.body, folds);
            }
            if let Some(f) = finalizer {
                block(f, folds);
            }
        }
        StatementKind::Labeled(_, body) => statement(body, folds),
        StatementKind::With { object, body, .. } => {
            expr(object, folds);
            statement(body, folds);
        }
        StatementKind::Break(_) | StatementKind::Continue(_) | StatementKind::Debugger | StatementKind::Empty => {}
    }
}

fn function(f: &mut FunctionNode, folds: &mut usize) {
    for p in &mut f.params {
        pattern(&mut p.target, folds);
        if let Some(d) = &mut p.default {
            expr(d, folds);
        }
    }
    if let Some(r) = &mut f.rest {
        pattern(r, folds);
    }
    statements(&mut f.body, folds);
}

fn class(c: &mut ClassNode, folds: &mut usize) {
    if let Some(sc) = &mut c.super_class {
        expr(sc, folds);
    }
    if let Some(ctor) = &mut c.constructor {
        function(ctor, folds);
    }
    for m in &mut c.members {
        if let PropKey::Computed(e) = &mut m.key {
            expr(e, folds);
        }
        function(&mut m.func, folds);
    }
}

fn pattern(p: &mut Pattern, folds: &mut usize) {
    match p {
        Pattern::Identifier(_) => {}
        Pattern::Expr(e) => expr(e, folds),
        Pattern::Array { elements, rest } => {
            for el in elements.iter_mut().flatten() {
                pattern(&mut el.target, folds);
                if let Some(d) = &mut el.default {
                    expr(d, folds);
                }
            }
            if let Some(r) = rest {
                pattern(r, folds);
            }
        }
        Pattern::Object { props, rest } => {
            for prop in props {
                if let PropKey::Computed(e) = &mut prop.key {
                    expr(e, folds);
                }
                pattern(&mut prop.value, folds);
                if let Some(d) = &mut prop.default {
                    expr(d, folds);
                }
            }
            if let Some(r) = rest {
                pattern(r, folds);
            }
        }
    }
}

fn expr(e: &mut Expr, folds: &mut usize) {
    let folded = match &mut e.kind {
        ExprKind::Unary(op, x) => {
            expr(x, folds);
            Constant::of(x).and_then(|c| fold_unary(*op, &c)).map(Constant::into_kind)
        }
        ExprKind::Binary(op, l, r) => {
            expr(l, folds);
            expr(r, folds);
            match (Constant::of(l), Constant::of(r)) {
                (Some(a), Some(b)) => fold_binary(*op, &a, &b).map(Constant::into_kind),
                _ => None,
            }
        }
        ExprKind::Logical(op, l, r) => {
            expr(l, folds);
            expr(r, folds);
            match Constant::of(l) {
                Some(c) => {
                    let keep_left = match op {
                        LogicalOp::And => !c.truthy(),
                        LogicalOp::Or => c.truthy(),
                        LogicalOp::Nullish => c != Constant::Null,
                    };
                    let chosen = if keep_left { &mut **l } else { &mut **r };
                    Some(std::mem::replace(&mut chosen.kind, ExprKind::Null))
                }
                None => None,
            }
        }
        ExprKind::Conditional(t, c, a) => {
            expr(t, folds);
            expr(c, folds);
            expr(a, folds);
            Constant::of(t).map(|test| {
                let chosen = if test.truthy() { &mut **c } else { &mut **a };
                std::mem::replace(&mut chosen.kind, ExprKind::Null)
            })
        }
        ExprKind::Template { quasis, exprs } => {
            for x in exprs.iter_mut() {
                expr(x, folds);
            }
            if exprs.iter().all(|x| Constant::of(x).is_some()) {
                let mut s = Vec::new();
                for (i, q) in quasis.iter().enumerate() {
                    s.extend_from_slice(q);
                    if let Some(c) = exprs.get(i).and_then(Constant::of) {
                        s.extend(c.to_utf16());
                    }
                }
                Some(ExprKind::String(s))
            } else {
                None
            }
        }
        ExprKind::TaggedTemplate { tag, exprs, .. } => {
            expr(tag, folds);
            for x in exprs {
                expr(x, folds);
            }
            None
        }
        ExprKind::Array(elements) => {
            for x in elements.iter_mut().flatten() {
                expr(x, folds);
            }
            None
        }
        ExprKind::Object(props) => {
            for p in props {
                match p {
                    PropertyDef::Value(key, value) => {
                        if let PropKey::Computed(k) = key {
                            expr(k, folds);
                        }
                        expr(value, folds);
                    }
                    PropertyDef::Method(key, f) | PropertyDef::Getter(key, f) | PropertyDef::Setter(key, f) => {
                        if let PropKey::Computed(k) = key {
                            expr(k, folds);
                        }
                        function(f, folds);
                    }
                    PropertyDef::Spread(x) | PropertyDef::Proto(x) => expr(x, folds),
                }
            }
            None
        }
        ExprKind::Function(f) => {
            function(f, folds);
            None
        }
        ExprKind::Class(c) => {
            class(c, folds);
            None
        }
        ExprKind::Spread(x) | ExprKind::OptionalChain(x) => {
            expr(x, folds);
            None
        }
        ExprKind::Update { target, .. } => {
            pattern(target, folds);
            None
        }
        ExprKind::Assign { target, value, .. } => {
            pattern(target, folds);
            expr(value, folds);
            None
        }
        ExprKind::Call { callee, args, .. } | ExprKind::New { callee, args } => {
            expr(callee, folds);
            for a in args {
                expr(a, folds);
            }
            None
        }
        ExprKind::Member { object, property, .. } => {
            expr(object, folds);
            if let MemberProperty::Computed(p) = property {
                expr(p, folds);
            }
            None
        }
        ExprKind::SuperMember { property, .. } => {
            if let MemberProperty::Computed(p) = property {
                expr(p, folds);
            }
            None
        }
        ExprKind::SuperCall { args, .. } => {
            for a in args {
                expr(a, folds);
            }
            None
        }
        ExprKind::Sequence(xs) => {
            for x in xs {
                expr(x, folds);
            }
            None
        }
        ExprKind::Number(_)
        | ExprKind::String(_)
        | ExprKind::Boolean(_)
        | ExprKind::Null
        | ExprKind::Regex { .. }
        | ExprKind::Identifier(_)
        | ExprKind::This(_)
        | ExprKind::NewTarget(_) => None,
    };
    if let Some(kind) = folded {
        *folds += 1;
        e.kind = kind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{parse_program, resolve_program};
    use crate::unicode::utf16_to_utf8;

    fn optimized(src: &str) -> Program {
        let mut p = parse_program(src, false).unwrap();
        resolve_program(&mut p);
        optimize_program(&mut p);
        p
    }

    fn first_expr(src: &str) -> ExprKind {
        let p = optimized(src);
        match &p.body[0].kind {
            StatementKind::Expr(e) => e.kind.clone(),
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn number(src: &str) -> f64 {
        match first_expr(src) {
            ExprKind::Number(n) => n,
            other => panic!("not folded to a number: {other:?}"),
        }
    }

    fn string(src: &str) -> String {
        match first_expr(src) {
            ExprKind::String(s) => utf16_to_utf8(&s),
            other => panic!("not folded to a string: {other:?}"),
        }
    }

    fn boolean(src: &str) -> bool {
        match first_expr(src) {
            ExprKind::Boolean(b) => b,
            other => panic!("not folded to a boolean: {other:?}"),
        }
    }

    #[test]
    fn folds_arithmetic() {
        assert_eq!(number("2 + 3 * 4"), 14.0);
        assert_eq!(number("2 ** 3 ** 2"), 512.0);
        assert_eq!(number("-7 % 3"), -1.0);
        assert_eq!(number("1 << 31"), -2147483648.0);
        assert_eq!(number("-1 >>> 0"), 4294967295.0);
        assert_eq!(number("'3' * '4'"), 12.0);
        assert_eq!(number("true + 1"), 2.0);
        assert_eq!(number("null + 1"), 1.0);
    }

    #[test]
    fn exponent_edge_cases() {
        assert!(exponentiate(1.0, f64::INFINITY).is_nan());
        assert!(exponentiate(-1.0, f64::NEG_INFINITY).is_nan());
        assert!(exponentiate(2.0, f64::NAN).is_nan());
        assert_eq!(exponentiate(f64::NAN, 0.0), 1.0);
    }

    #[test]
    fn folds_strings_with_runtime_conversions() {
        assert_eq!(string("'a' + 1.5"), "a1.5");
        assert_eq!(string("1e21 + ''"), "1e+21");
        assert_eq!(string("'x' + null + true"), "xnulltrue");
        assert_eq!(string("typeof 1"), "number");
        assert_eq!(string("typeof null"), "object");
        assert_eq!(string("`a${1 + 1}b`"), "a2b");
    }

    #[test]
    fn folds_comparisons() {
        assert!(boolean("1 == '1'"));
        assert!(!boolean("1 === '1'"));
        assert!(boolean("null == null"));
        assert!(!boolean("null == 0"));
        assert!(boolean("'a' < 'b'"));
        assert!(boolean("'10' < '9'"));
        assert!(!boolean("1 < '' * 'x'"));
        assert!(boolean("2 >= 2"));
        assert!(boolean("!0"));
    }

    #[test]
    fn folds_logical_and_conditional() {
        assert_eq!(number("0 || 5"), 5.0);
        assert_eq!(number("1 && 7"), 7.0);
        assert_eq!(number("null ?? 3"), 3.0);
        assert_eq!(number("true ? 1 : 2"), 1.0);
        assert!(matches!(first_expr("0 && x"), ExprKind::Number(n) if n == 0.0));
    }

    #[test]
    fn leaves_non_literals_alone() {
        assert!(matches!(first_expr("x + 1"), ExprKind::Binary(..)));
        assert!(matches!(first_expr("a || b"), ExprKind::Logical(..)));
    }

    #[test]
    fn removes_dead_branches() {
        let p = optimized("if (false) { x(); } else { y(); }");
        assert!(matches!(&p.body[0].kind, StatementKind::Block(b) if b.body.len() == 1));
        let p = optimized("if (0) x();");
        assert!(matches!(p.body[0].kind, StatementKind::Empty));
    }

    #[test]
    fn removes_unreachable_code_but_keeps_function_declarations() {
        let p = optimized("function f() { return g(); x = 1; function g() { return 1; } y(); }");
        let StatementKind::FunctionDecl { func, .. } = &p.body[0].kind else {
            panic!()
        };
        assert_eq!(func.body.len(), 2);
        assert!(matches!(func.body[1].kind, StatementKind::FunctionDecl { .. }));
    }
}
