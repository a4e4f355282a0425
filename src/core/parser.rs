use crate::core::number::number_to_string;
use crate::core::scope::{CALLEE_NAME, NEW_TARGET_NAME, THIS_NAME, WITH_NAME};
use crate::core::{
    AssignOp, BinaryOp, Block, CatchClause, ClassMember, ClassNode, Expr, ExprKind, ForBinding, ForInit, FunctionKind, FunctionNode,
    Identifier, Lexer, LogicalOp, MemberProperty, MethodKind, ObjectPatternProp, Pattern, PatternElem, Program, PropKey, PropertyDef,
    ScopeInfo, Statement, StatementKind, SwitchCase, Token, TokenData, UnaryOp, VarDeclarator, VarKind,
};
use crate::unicode::utf16_to_utf8;
use crate::{JSError, raise_range_error, raise_syntax_error};
use std::collections::HashSet;

/// Bound on nested statements, expressions and patterns; deeper input is a RangeError.
pub const MAX_NESTING_DEPTH: u32 = 400;

const STRICT_RESERVED: &[&str] = &[
    "implements",
    "interface",
    "let",
    "package",
    "private",
    "protected",
    "public",
    "static",
    "yield",
];

/// Names declared in one block-level scope, used for redeclaration errors.
#[derive(Default)]
struct DeclScope {
    lexical: HashSet<String>,
    vars: HashSet<String>,
    /// Function declarations in a block (sloppy code may repeat them).
    block_functions: HashSet<String>,
    params: HashSet<String>,
    catch_params: HashSet<String>,
    function_top: bool,
}

#[derive(Default)]
struct FunctionContext {
    strict: bool,
    is_function: bool,
    labels: Vec<(String, bool)>,
    /// Labels directly preceding the statement being parsed.
    pending_labels: Vec<usize>,
    loop_depth: u32,
    breakable_depth: u32,
    super_property: bool,
    super_call: bool,
    new_target: bool,
    scopes: Vec<DeclScope>,
}

type BinaryResult = (Expr, Option<LogicalOp>);

enum BinOp {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur: TokenData,
    prev_end: usize,
    functions: Vec<FunctionContext>,
    /// Positions of `{ a = 1 }` shorthand initializers not yet reinterpreted as patterns.
    cover_inits: Vec<(usize, usize)>,
    depth: u32,
}

/// Parses a script. `strict` forces strict mode from the first token.
pub fn parse_program(source: &str, strict: bool) -> Result<Program, JSError> {
    let mut parser = Parser::new(source)?;
    parser.parse_program(strict)
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self, JSError> {
        let mut lexer = Lexer::new(source);
        let cur = lexer.next_token()?;
        Ok(Parser {
            lexer,
            cur,
            prev_end: 0,
            functions: Vec::new(),
            cover_inits: Vec::new(),
            depth: 0,
        })
    }

    pub fn parse_program(&mut self, strict: bool) -> Result<Program, JSError> {
        self.functions.push(FunctionContext {
            strict,
            scopes: vec![DeclScope {
                function_top: true,
                ..Default::default()
            }],
            ..Default::default()
        });
        let body = self.parse_body(true)?;
        self.check_cover_inits()?;
        let ctx = self.functions.pop().unwrap_or_default();
        log::debug!("parsed program: {} top-level statements, strict={}", body.len(), ctx.strict);
        Ok(Program {
            body,
            strict: ctx.strict,
            source: self.lexer.source().to_string(),
            ..Default::default()
        })
    }

    // ---------------------------------------------------------------- helpers

    fn ctx(&self) -> &FunctionContext {
        // The context stack is non-empty for the whole parse.
        &self.functions[self.functions.len() - 1]
    }

    fn ctx_mut(&mut self) -> &mut FunctionContext {
        let n = self.functions.len() - 1;
        &mut self.functions[n]
    }

    fn strict(&self) -> bool {
        self.ctx().strict
    }

    fn advance(&mut self) -> Result<TokenData, JSError> {
        let next = self.lexer.next_token()?;
        self.prev_end = self.cur.end;
        Ok(std::mem::replace(&mut self.cur, next))
    }

    fn peek(&self) -> Result<TokenData, JSError> {
        let mut lexer = self.lexer.clone();
        lexer.next_token()
    }

    fn is(&self, t: &Token) -> bool {
        &self.cur.token == t
    }

    fn is_identifier(&self, name: &str) -> bool {
        matches!(&self.cur.token, Token::Identifier(s) if s == name && !self.cur.escaped)
    }

    fn eat(&mut self, t: &Token) -> Result<bool, JSError> {
        if self.is(t) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, t: Token) -> Result<TokenData, JSError> {
        if self.cur.token == t {
            self.advance()
        } else {
            Err(self.unexpected())
        }
    }

    /// Runs `f` one nesting level deeper.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, JSError>) -> Result<T, JSError> {
        if self.depth >= MAX_NESTING_DEPTH {
            let mut e = raise_range_error!("Maximum nesting depth exceeded");
            e.set_js_location(self.cur.line, self.cur.column);
            return Err(e);
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn error_at(&self, tok: &TokenData, msg: &str) -> JSError {
        let mut e = raise_syntax_error!(msg);
        e.set_js_location(tok.line, tok.column);
        e
    }

    fn error_here(&self, msg: &str) -> JSError {
        self.error_at(&self.cur, msg)
    }

    fn unexpected(&self) -> JSError {
        let msg = match &self.cur.token {
            Token::EOF => "Unexpected end of input".to_string(),
            Token::Identifier(name) => {
                if self.strict() && STRICT_RESERVED.contains(&name.as_str()) {
                    "Unexpected strict mode reserved word".to_string()
                } else {
                    "Unexpected identifier".to_string()
                }
            }
            Token::Number(_) => "Unexpected number".to_string(),
            Token::StringLit(_) => "Unexpected string".to_string(),
            Token::Template { .. } => "Unexpected template string".to_string(),
            _ => format!("Unexpected token '{}'", self.lexer.slice(self.cur.start, self.cur.end)),
        };
        self.error_here(&msg)
    }

    /// Automatic semicolon insertion.
    fn consume_semicolon(&mut self) -> Result<(), JSError> {
        if self.is(&Token::Semicolon) {
            self.advance()?;
            return Ok(());
        }
        if self.is(&Token::RBrace) || self.is(&Token::EOF) || self.cur.newline_before {
            return Ok(());
        }
        Err(self.unexpected())
    }

    fn check_cover_inits(&self) -> Result<(), JSError> {
        if let Some(&(line, column)) = self.cover_inits.first() {
            let mut e = raise_syntax_error!("Invalid shorthand property initializer");
            e.set_js_location(line, column);
            return Err(e);
        }
        Ok(())
    }

    fn check_identifier_reference(&self, name: &str, tok: &TokenData) -> Result<(), JSError> {
        if tok.escaped && is_keyword(name) {
            return Err(self.error_at(tok, "Keyword must not contain escaped characters"));
        }
        if self.strict() && STRICT_RESERVED.contains(&name) {
            return Err(self.error_at(tok, "Unexpected strict mode reserved word"));
        }
        Ok(())
    }

    fn check_binding_identifier(&self, name: &str, tok: &TokenData) -> Result<(), JSError> {
        self.check_identifier_reference(name, tok)?;
        if self.strict() && (name == "eval" || name == "arguments") {
            return Err(self.error_at(tok, "Unexpected eval or arguments in strict mode"));
        }
        Ok(())
    }

    fn identifier_name(&mut self) -> Result<String, JSError> {
        match self.cur.token.as_identifier_string() {
            Some(name) => {
                self.advance()?;
                Ok(name)
            }
            None => Err(self.unexpected()),
        }
    }

    fn binding_identifier(&mut self) -> Result<Identifier, JSError> {
        match &self.cur.token {
            Token::Identifier(name) => {
                let name = name.clone();
                self.check_binding_identifier(&name, &self.cur)?;
                let tok = self.advance()?;
                Ok(Identifier::new(name, tok.line, tok.column))
            }
            _ => Err(self.unexpected()),
        }
    }

    // ---------------------------------------------------------------- declarations bookkeeping

    fn push_scope(&mut self) {
        self.ctx_mut().scopes.push(DeclScope::default());
    }

    fn pop_scope(&mut self) {
        self.ctx_mut().scopes.pop();
    }

    fn redeclared(&self, name: &str, tok: &TokenData) -> JSError {
        self.error_at(tok, &format!("Identifier '{name}' has already been declared"))
    }

    fn declare_lexical(&mut self, name: &str, tok: &TokenData) -> Result<(), JSError> {
        if name == "let" {
            return Err(self.error_at(tok, "let is disallowed as a lexically bound name"));
        }
        let scope = self.ctx().scopes.last();
        if let Some(scope) = scope
            && (scope.lexical.contains(name)
                || scope.vars.contains(name)
                || scope.catch_params.contains(name)
                || (scope.function_top && scope.params.contains(name)))
        {
            return Err(self.redeclared(name, tok));
        }
        if let Some(scope) = self.ctx_mut().scopes.last_mut() {
            scope.lexical.insert(name.to_string());
        }
        Ok(())
    }

    fn declare_var(&mut self, name: &str, tok: &TokenData) -> Result<(), JSError> {
        for scope in self.ctx().scopes.iter().rev() {
            if scope.lexical.contains(name) {
                return Err(self.redeclared(name, tok));
            }
            if scope.function_top {
                break;
            }
        }
        for scope in self.ctx_mut().scopes.iter_mut().rev() {
            scope.vars.insert(name.to_string());
            if scope.function_top {
                break;
            }
        }
        Ok(())
    }

    fn declare_function(&mut self, name: &str, tok: &TokenData) -> Result<(), JSError> {
        let strict = self.strict();
        let at_top = self.ctx().scopes.last().is_some_and(|s| s.function_top);
        if at_top {
            return self.declare_var(name, tok);
        }
        let scope = self.ctx().scopes.last();
        if let Some(scope) = scope
            && !strict
            && scope.block_functions.contains(name)
        {
            return Ok(());
        }
        self.declare_lexical(name, tok)?;
        if let Some(scope) = self.ctx_mut().scopes.last_mut() {
            scope.block_functions.insert(name.to_string());
        }
        Ok(())
    }

    fn declare_pattern(&mut self, kind: VarKind, pattern: &Pattern, tok: &TokenData) -> Result<(), JSError> {
        let mut names = Vec::new();
        pattern.bound_names(&mut names);
        if kind != VarKind::Var {
            let mut seen = HashSet::new();
            for n in &names {
                if !seen.insert(n.clone()) {
                    return Err(self.redeclared(n, tok));
                }
            }
        }
        for n in &names {
            match kind {
                VarKind::Var => self.declare_var(n, tok)?,
                _ => self.declare_lexical(n, tok)?,
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------- statements

    /// Statement list with a directive prologue; stops at `}` or end of input.
    fn parse_body(&mut self, top_level: bool) -> Result<Vec<Statement>, JSError> {
        let mut body = Vec::new();
        let mut in_prologue = true;
        let mut octal_directive: Option<TokenData> = None;
        loop {
            if self.is(&Token::EOF) {
                if !top_level {
                    return Err(self.unexpected());
                }
                break;
            }
            if self.is(&Token::RBrace) && !top_level {
                break;
            }
            if in_prologue {
                if let Token::StringLit(_) = self.cur.token {
                    let tok = self.cur.clone();
                    let raw = self.lexer.slice(tok.start, tok.end);
                    let stmt = self.parse_statement_list_item()?;
                    let is_directive = matches!(&stmt.kind, StatementKind::Expr(e) if matches!(e.kind, ExprKind::String(_)))
                        && (self.prev_end == tok.end || self.lexer.slice(tok.end, self.prev_end).trim() == ";");
                    if is_directive {
                        if raw == "\"use strict\"" || raw == "'use strict'" {
                            self.ctx_mut().strict = true;
                            if let Some(t) = &octal_directive {
                                return Err(self.error_at(t, "Octal escape sequences are not allowed in strict mode."));
                            }
                        } else if tok.legacy_octal {
                            octal_directive = Some(tok);
                        }
                    } else {
                        in_prologue = false;
                    }
                    body.push(stmt);
                    continue;
                }
                in_prologue = false;
            }
            body.push(self.parse_statement_list_item()?);
        }
        Ok(body)
    }

    fn is_let_declaration(&self) -> Result<bool, JSError> {
        if !self.is_identifier("let") {
            return Ok(false);
        }
        let next = self.peek()?;
        Ok(match &next.token {
            Token::LBracket | Token::LBrace => true,
            Token::Identifier(_) => true,
            _ => false,
        })
    }

    fn parse_statement_list_item(&mut self) -> Result<Statement, JSError> {
        self.nested(Self::statement_list_item)
    }

    fn statement_list_item(&mut self) -> Result<Statement, JSError> {
        match &self.cur.token {
            Token::Function => self.parse_function_declaration(),
            Token::Class => self.parse_class_declaration(),
            Token::Const => self.parse_lexical_statement(VarKind::Const),
            Token::Identifier(_) if self.is_let_declaration()? => self.parse_lexical_statement(VarKind::Let),
            _ => self.parse_statement(),
        }
    }

    fn parse_lexical_statement(&mut self, kind: VarKind) -> Result<Statement, JSError> {
        let start = self.advance()?;
        let decls = self.parse_declarators(kind, false, &start)?;
        self.consume_semicolon()?;
        Ok(Statement::new(StatementKind::VarDecl(kind, decls), start.line, start.column))
    }

    fn parse_statement(&mut self) -> Result<Statement, JSError> {
        self.nested(Self::statement)
    }

    fn statement(&mut self) -> Result<Statement, JSError> {
        let labelled_statement = matches!(self.cur.token, Token::Identifier(_)) && self.peek()?.token == Token::Colon;
        let pending = if labelled_statement {
            Vec::new()
        } else {
            std::mem::take(&mut self.ctx_mut().pending_labels)
        };
        if matches!(self.cur.token, Token::For | Token::While | Token::Do) {
            for i in pending {
                self.ctx_mut().labels[i].1 = true;
            }
        }
        let tok = self.cur.clone();
        let (line, column) = (tok.line, tok.column);
        let kind = match &self.cur.token {
            Token::LBrace => StatementKind::Block(self.parse_block()?),
            Token::Var => {
                self.advance()?;
                let decls = self.parse_declarators(VarKind::Var, false, &tok)?;
                self.consume_semicolon()?;
                StatementKind::VarDecl(VarKind::Var, decls)
            }
            Token::Semicolon => {
                self.advance()?;
                StatementKind::Empty
            }
            Token::If => self.parse_if()?,
            Token::For => self.parse_for()?,
            Token::While => {
                self.advance()?;
                self.expect(Token::LParen)?;
                let test = self.parse_expression(false)?;
                self.expect(Token::RParen)?;
                let body = self.parse_loop_body()?;
                StatementKind::While(test, Box::new(body))
            }
            Token::Do => {
                self.advance()?;
                let body = self.parse_loop_body()?;
                self.expect(Token::While)?;
                self.expect(Token::LParen)?;
                let test = self.parse_expression(false)?;
                self.expect(Token::RParen)?;
                self.eat(&Token::Semicolon)?;
                StatementKind::DoWhile(Box::new(body), test)
            }
            Token::Continue => self.parse_continue()?,
            Token::Break => self.parse_break()?,
            Token::Return => {
                if !self.ctx().is_function {
                    return Err(self.error_here("Illegal return statement"));
                }
                self.advance()?;
                let arg = if self.is(&Token::Semicolon) || self.is(&Token::RBrace) || self.is(&Token::EOF) || self.cur.newline_before {
                    None
                } else {
                    Some(self.parse_expression(false)?)
                };
                self.consume_semicolon()?;
                StatementKind::Return(arg)
            }
            Token::With => {
                if self.strict() {
                    return Err(self.error_here("Strict mode code may not include a with statement"));
                }
                self.advance()?;
                self.expect(Token::LParen)?;
                let object = self.parse_expression(false)?;
                self.expect(Token::RParen)?;
                let body = self.parse_statement()?;
                StatementKind::With {
                    object,
                    body: Box::new(body),
                    object_binding: Identifier::new(WITH_NAME, line, column),
                    scope: ScopeInfo::default(),
                }
            }
            Token::Switch => self.parse_switch()?,
            Token::Throw => {
                self.advance()?;
                if self.cur.newline_before {
                    return Err(self.error_here("Illegal newline after throw"));
                }
                let arg = self.parse_expression(false)?;
                self.consume_semicolon()?;
                StatementKind::Throw(arg)
            }
            Token::Try => self.parse_try()?,
            Token::Debugger => {
                self.advance()?;
                self.consume_semicolon()?;
                StatementKind::Debugger
            }
            Token::Function => {
                if self.strict() {
                    return Err(self.error_here(
                        "In strict mode code, functions can only be declared at top level or inside a block.",
                    ));
                }
                self.push_scope();
                let decl = self.parse_function_declaration();
                self.pop_scope();
                StatementKind::Block(Block {
                    body: vec![decl?],
                    scope: ScopeInfo::default(),
                })
            }
            Token::Class | Token::Const => {
                return Err(self.error_here("Lexical declaration cannot appear in a single-statement context"));
            }
            Token::Identifier(name) if labelled_statement => {
                let name = name.clone();
                self.check_identifier_reference(&name, &tok)?;
                self.advance()?;
                self.advance()?;
                if self.ctx().labels.iter().any(|(l, _)| *l == name) {
                    return Err(self.error_at(&tok, &format!("Label '{name}' has already been declared")));
                }
                let idx = self.ctx().labels.len();
                self.ctx_mut().labels.push((name.clone(), false));
                self.ctx_mut().pending_labels.push(idx);
                let body = if self.is(&Token::Function) {
                    if self.strict() {
                        return Err(self.error_here(
                            "In strict mode code, functions can only be declared at top level or inside a block.",
                        ));
                    }
                    self.ctx_mut().pending_labels.clear();
                    self.parse_function_declaration()
                } else {
                    self.parse_statement()
                };
                self.ctx_mut().labels.pop();
                StatementKind::Labeled(name, Box::new(body?))
            }
            Token::Identifier(_) if self.is_let_declaration()? && self.peek()?.token == Token::LBracket => {
                return Err(self.error_here("Lexical declaration cannot appear in a single-statement context"));
            }
            _ => {
                let expr = self.parse_expression(false)?;
                self.consume_semicolon()?;
                StatementKind::Expr(expr)
            }
        };
        Ok(Statement::new(kind, line, column))
    }

    fn parse_block(&mut self) -> Result<Block, JSError> {
        self.parse_block_with(HashSet::new())
    }

    fn parse_block_with(&mut self, catch_params: HashSet<String>) -> Result<Block, JSError> {
        self.expect(Token::LBrace)?;
        self.ctx_mut().scopes.push(DeclScope {
            catch_params,
            ..Default::default()
        });
        let mut body = Vec::new();
        let result = loop {
            if self.is(&Token::RBrace) {
                break Ok(());
            }
            match self.parse_statement_list_item() {
                Ok(s) => body.push(s),
                Err(e) => break Err(e),
            }
        };
        self.pop_scope();
        result?;
        self.expect(Token::RBrace)?;
        Ok(Block {
            body,
            scope: ScopeInfo::default(),
        })
    }

    fn parse_if(&mut self) -> Result<StatementKind, JSError> {
        self.advance()?;
        self.expect(Token::LParen)?;
        let test = self.parse_expression(false)?;
        self.expect(Token::RParen)?;
        let cons = self.parse_statement()?;
        let alt = if self.eat(&Token::Else)? {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StatementKind::If(test, Box::new(cons), alt))
    }

    fn parse_loop_body(&mut self) -> Result<Statement, JSError> {
        self.ctx_mut().loop_depth += 1;
        self.ctx_mut().breakable_depth += 1;
        let body = self.parse_statement();
        self.ctx_mut().loop_depth -= 1;
        self.ctx_mut().breakable_depth -= 1;
        body
    }

    fn parse_break(&mut self) -> Result<StatementKind, JSError> {
        let tok = self.advance()?;
        let label = match &self.cur.token {
            Token::Identifier(name) if !self.cur.newline_before => {
                let name = name.clone();
                if !self.ctx().labels.iter().any(|(l, _)| *l == name) {
                    return Err(self.error_here(&format!("Undefined label '{name}'")));
                }
                self.advance()?;
                Some(name)
            }
            _ => {
                if self.ctx().breakable_depth == 0 {
                    return Err(self.error_at(&tok, "Illegal break statement"));
                }
                None
            }
        };
        self.consume_semicolon()?;
        Ok(StatementKind::Break(label))
    }

    fn parse_continue(&mut self) -> Result<StatementKind, JSError> {
        let tok = self.advance()?;
        let label = match &self.cur.token {
            Token::Identifier(name) if !self.cur.newline_before => {
                let name = name.clone();
                match self.ctx().labels.iter().find(|(l, _)| *l == name) {
                    None => return Err(self.error_here(&format!("Undefined label '{name}'"))),
                    Some((_, false)) => {
                        return Err(self.error_here(&format!(
                            "Illegal continue statement: '{name}' does not denote an iteration statement"
                        )));
                    }
                    Some(_) => {}
                }
                self.advance()?;
                Some(name)
            }
            _ => None,
        };
        if self.ctx().loop_depth == 0 {
            return Err(self.error_at(&tok, "Illegal continue statement: no surrounding iteration statement"));
        }
        self.consume_semicolon()?;
        Ok(StatementKind::Continue(label))
    }

    fn parse_switch(&mut self) -> Result<StatementKind, JSError> {
        self.advance()?;
        self.expect(Token::LParen)?;
        let discriminant = self.parse_expression(false)?;
        self.expect(Token::RParen)?;
        self.expect(Token::LBrace)?;
        self.push_scope();
        self.ctx_mut().breakable_depth += 1;
        let result = self.parse_switch_cases();
        self.ctx_mut().breakable_depth -= 1;
        self.pop_scope();
        let cases = result?;
        self.expect(Token::RBrace)?;
        Ok(StatementKind::Switch {
            discriminant,
            cases,
            scope: ScopeInfo::default(),
        })
    }

    fn parse_switch_cases(&mut self) -> Result<Vec<SwitchCase>, JSError> {
        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.is(&Token::RBrace) {
            let test = if self.eat(&Token::Case)? {
                Some(self.parse_expression(false)?)
            } else if self.is(&Token::Default) {
                if seen_default {
                    return Err(self.error_here("More than one default clause in switch statement"));
                }
                seen_default = true;
                self.advance()?;
                None
            } else {
                return Err(self.unexpected());
            };
            self.expect(Token::Colon)?;
            let mut body = Vec::new();
            while !matches!(self.cur.token, Token::Case | Token::Default | Token::RBrace) {
                body.push(self.parse_statement_list_item()?);
            }
            cases.push(SwitchCase { test, body });
        }
        Ok(cases)
    }

    fn parse_try(&mut self) -> Result<StatementKind, JSError> {
        self.advance()?;
        let block = self.parse_block()?;
        let mut handler = None;
        if self.eat(&Token::Catch)? {
            let (param, names) = if self.eat(&Token::LParen)? {
                let tok = self.cur.clone();
                let p = self.parse_binding_target()?;
                let mut names = Vec::new();
                p.bound_names(&mut names);
                let mut set = HashSet::new();
                for n in &names {
                    if !set.insert(n.clone()) {
                        return Err(self.redeclared(n, &tok));
                    }
                }
                self.expect(Token::RParen)?;
                (Some(p), set)
            } else {
                (None, HashSet::new())
            };
            let body = self.parse_block_with(names)?;
            handler = Some(CatchClause {
                param,
                body,
                scope: ScopeInfo::default(),
            });
        }
        let finalizer = if self.eat(&Token::Finally)? { Some(self.parse_block()?) } else { None };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_here("Missing catch or finally after try"));
        }
        Ok(StatementKind::Try {
            block,
            handler,
            finalizer,
        })
    }

    fn parse_for(&mut self) -> Result<StatementKind, JSError> {
        self.advance()?;
        self.expect(Token::LParen)?;
        self.push_scope();
        let result = self.parse_for_rest();
        self.pop_scope();
        result
    }

    fn parse_for_rest(&mut self) -> Result<StatementKind, JSError> {
        let head_tok = self.cur.clone();
        let mut init: Option<ForInit> = None;
        if self.is(&Token::Semicolon) {
            // no initializer
        } else if self.is(&Token::Var) || self.is(&Token::Const) || self.is_let_declaration()? {
            let kind = match self.cur.token {
                Token::Var => VarKind::Var,
                Token::Const => VarKind::Const,
                _ => VarKind::Let,
            };
            self.advance()?;
            let decls = self.parse_declarators(kind, true, &head_tok)?;
            init = Some(ForInit::VarDecl(kind, decls));
        } else {
            let mark = self.cover_inits.len();
            let expr = self.parse_expression(true)?;
            if self.is(&Token::In) || self.is_identifier("of") {
                let target = self.expr_to_pattern(expr, true)?;
                self.cover_inits.truncate(mark);
                return self.parse_for_in_of(ForBinding::Target(target));
            }
            init = Some(ForInit::Expr(expr));
        }
        if self.is(&Token::In) || self.is_identifier("of") {
            if let Some(ForInit::VarDecl(kind, mut decls)) = init
                && decls.len() == 1
                && decls[0].init.is_none()
            {
                let d = decls.remove(0);
                return self.parse_for_in_of(ForBinding::Decl(kind, d.target));
            }
            return Err(self.error_at(&head_tok, "Invalid left-hand side in for-loop: must have a single binding."));
        }
        if let Some(ForInit::VarDecl(kind, decls)) = &init {
            for d in decls {
                if d.init.is_none() && (*kind == VarKind::Const || !matches!(d.target, Pattern::Identifier(_))) {
                    return Err(self.error_at(&head_tok, "Missing initializer in destructuring declaration"));
                }
            }
        }
        self.expect(Token::Semicolon)?;
        let test = if self.is(&Token::Semicolon) { None } else { Some(self.parse_expression(false)?) };
        self.expect(Token::Semicolon)?;
        let update = if self.is(&Token::RParen) { None } else { Some(self.parse_expression(false)?) };
        self.expect(Token::RParen)?;
        let body = self.parse_loop_body()?;
        Ok(StatementKind::For {
            init,
            test,
            update,
            body: Box::new(body),
            scope: ScopeInfo::default(),
        })
    }

    fn parse_for_in_of(&mut self, left: ForBinding) -> Result<StatementKind, JSError> {
        let is_of = self.is_identifier("of");
        self.advance()?;
        let right = if is_of { self.parse_assignment(false)? } else { self.parse_expression(false)? };
        self.expect(Token::RParen)?;
        let body = Box::new(self.parse_loop_body()?);
        let scope = ScopeInfo::default();
        Ok(if is_of {
            StatementKind::ForOf { left, right, body, scope }
        } else {
            StatementKind::ForIn { left, right, body, scope }
        })
    }

    /// `a = 1, [b] = c` after `var`/`let`/`const`. In a for-head the `in`
    /// operator is excluded and missing initializers are checked by the caller.
    fn parse_declarators(&mut self, kind: VarKind, for_head: bool, start: &TokenData) -> Result<Vec<VarDeclarator>, JSError> {
        let mut decls = Vec::new();
        loop {
            let tok = self.cur.clone();
            let target = self.parse_binding_target()?;
            if kind != VarKind::Var {
                let mut names = Vec::new();
                target.bound_names(&mut names);
                if names.iter().any(|n| n == "let") {
                    return Err(self.error_at(&tok, "let is disallowed as a lexically bound name"));
                }
            }
            self.declare_pattern(kind, &target, &tok)?;
            let init = if self.eat(&Token::Assign)? {
                Some(self.parse_assignment(for_head)?)
            } else {
                if !for_head {
                    if kind == VarKind::Const {
                        return Err(self.error_at(&tok, "Missing initializer in const declaration"));
                    }
                    if !matches!(target, Pattern::Identifier(_)) {
                        return Err(self.error_at(&tok, "Missing initializer in destructuring declaration"));
                    }
                }
                None
            };
            decls.push(VarDeclarator { target, init });
            if !self.eat(&Token::Comma)? {
                break;
            }
        }
        if decls.is_empty() {
            return Err(self.error_at(start, "Unexpected token"));
        }
        Ok(decls)
    }

    /// Identifier, array pattern or object pattern in a binding position.
    fn parse_binding_target(&mut self) -> Result<Pattern, JSError> {
        self.nested(Self::binding_target)
    }

    fn binding_target(&mut self) -> Result<Pattern, JSError> {
        match &self.cur.token {
            Token::LBracket => self.parse_array_binding_pattern(),
            Token::LBrace => self.parse_object_binding_pattern(),
            _ => Ok(Pattern::Identifier(self.binding_identifier()?)),
        }
    }

    fn parse_binding_element(&mut self) -> Result<PatternElem, JSError> {
        let target = self.parse_binding_target()?;
        let default = if self.eat(&Token::Assign)? {
            Some(self.parse_assignment(false)?)
        } else {
            None
        };
        Ok(PatternElem { target, default })
    }

    fn parse_array_binding_pattern(&mut self) -> Result<Pattern, JSError> {
        self.expect(Token::LBracket)?;
        let mut elements = Vec::new();
        let mut rest = None;
        loop {
            if self.eat(&Token::RBracket)? {
                break;
            }
            if self.is(&Token::Comma) {
                self.advance()?;
                elements.push(None);
                continue;
            }
            if self.eat(&Token::Spread)? {
                rest = Some(Box::new(self.parse_binding_target()?));
                if !self.is(&Token::RBracket) {
                    return Err(self.error_here("Rest element must be last element"));
                }
                self.advance()?;
                break;
            }
            elements.push(Some(self.parse_binding_element()?));
            if !self.is(&Token::RBracket) {
                self.expect(Token::Comma)?;
            }
        }
        Ok(Pattern::Array { elements, rest })
    }

    fn parse_object_binding_pattern(&mut self) -> Result<Pattern, JSError> {
        self.expect(Token::LBrace)?;
        let mut props = Vec::new();
        let mut rest = None;
        while !self.is(&Token::RBrace) {
            if self.eat(&Token::Spread)? {
                rest = Some(Box::new(Pattern::Identifier(self.binding_identifier()?)));
                if !self.is(&Token::RBrace) {
                    return Err(self.error_here("Rest element must be last element"));
                }
                break;
            }
            let key_tok = self.cur.clone();
            let (key, shorthand) = self.parse_property_key()?;
            let (value, default) = if self.eat(&Token::Colon)? {
                let elem = self.parse_binding_element()?;
                (elem.target, elem.default)
            } else {
                let Some(name) = shorthand else {
                    return Err(self.unexpected());
                };
                self.check_binding_identifier(&name, &key_tok)?;
                let id = Identifier::new(name, key_tok.line, key_tok.column);
                let default = if self.eat(&Token::Assign)? {
                    Some(self.parse_assignment(false)?)
                } else {
                    None
                };
                (Pattern::Identifier(id), default)
            };
            props.push(ObjectPatternProp { key, value, default });
            if !self.is(&Token::RBrace) {
                self.expect(Token::Comma)?;
            }
        }
        self.expect(Token::RBrace)?;
        Ok(Pattern::Object { props, rest })
    }

    // ---------------------------------------------------------------- functions

    fn parse_function_declaration(&mut self) -> Result<Statement, JSError> {
        let start = self.expect(Token::Function)?;
        if self.is(&Token::Multiply) {
            return Err(self.error_here("Generator functions are not supported"));
        }
        let name_tok = self.cur.clone();
        let name = self.binding_identifier()?;
        self.declare_function(&name.name, &name_tok)?;
        let func = self.parse_function_rest(Some(name), FunctionKind::Normal, &start)?;
        Ok(Statement::new(
            StatementKind::FunctionDecl {
                func: Box::new(func),
                var_copy: None,
            },
            start.line,
            start.column,
        ))
    }

    fn parse_function_expression(&mut self) -> Result<Expr, JSError> {
        let start = self.expect(Token::Function)?;
        if self.is(&Token::Multiply) {
            return Err(self.error_here("Generator functions are not supported"));
        }
        let name = if matches!(self.cur.token, Token::Identifier(_)) {
            Some(self.binding_identifier()?)
        } else {
            None
        };
        let mut func = self.parse_function_rest(name, FunctionKind::Normal, &start)?;
        func.is_expression = true;
        Ok(Expr::new(ExprKind::Function(Box::new(func)), start.line, start.column))
    }

    fn new_function_context(&self, kind: FunctionKind) -> FunctionContext {
        let outer = self.ctx();
        let (super_property, super_call, new_target) = match kind {
            FunctionKind::Arrow => (outer.super_property, outer.super_call, outer.new_target),
            FunctionKind::Method | FunctionKind::Getter | FunctionKind::Setter => (true, false, true),
            FunctionKind::ClassConstructor { derived } => (true, derived, true),
            FunctionKind::Normal => (false, false, true),
        };
        FunctionContext {
            strict: outer.strict,
            is_function: true,
            super_property,
            super_call,
            new_target,
            ..Default::default()
        }
    }

    /// Parameters and body, starting at `(`.
    fn parse_function_rest(&mut self, name: Option<Identifier>, kind: FunctionKind, start: &TokenData) -> Result<FunctionNode, JSError> {
        self.expect(Token::LParen)?;
        let ctx = self.new_function_context(kind);
        self.functions.push(ctx);
        let result = self.parse_function_inner(name, kind, start);
        self.functions.pop();
        result
    }

    fn parse_function_inner(&mut self, name: Option<Identifier>, kind: FunctionKind, start: &TokenData) -> Result<FunctionNode, JSError> {
        let (params, rest) = self.parse_formal_parameters()?;
        match kind {
            FunctionKind::Getter if !params.is_empty() || rest.is_some() => {
                return Err(self.error_at(start, "Getter must not have any formal parameters."));
            }
            FunctionKind::Setter if params.len() != 1 || rest.is_some() => {
                return Err(self.error_at(start, "Setter must have exactly one formal parameter."));
            }
            _ => {}
        }
        self.finish_function(name, params, rest, kind, start)
    }

    /// Parses `a, b = 1, ...c)` up to and including the closing paren.
    fn parse_formal_parameters(&mut self) -> Result<(Vec<PatternElem>, Option<Pattern>), JSError> {
        let mut params = Vec::new();
        let mut rest = None;
        while !self.is(&Token::RParen) {
            if self.eat(&Token::Spread)? {
                rest = Some(self.parse_binding_target()?);
                if !self.is(&Token::RParen) {
                    return Err(self.error_here("Rest parameter must be last formal parameter"));
                }
                break;
            }
            params.push(self.parse_binding_element()?);
            if !self.is(&Token::RParen) {
                self.expect(Token::Comma)?;
            }
        }
        self.expect(Token::RParen)?;
        Ok((params, rest))
    }

    /// Body parsing and parameter validation, once the parameter list is known.
    fn finish_function(
        &mut self,
        name: Option<Identifier>,
        params: Vec<PatternElem>,
        rest: Option<Pattern>,
        kind: FunctionKind,
        start: &TokenData,
    ) -> Result<FunctionNode, JSError> {
        let simple_params = rest.is_none() && params.iter().all(|p| p.default.is_none() && matches!(p.target, Pattern::Identifier(_)));
        let mut names = Vec::new();
        for p in &params {
            p.target.bound_names(&mut names);
        }
        if let Some(r) = &rest {
            r.bound_names(&mut names);
        }
        self.ctx_mut().scopes.push(DeclScope {
            function_top: true,
            params: names.iter().cloned().collect(),
            ..Default::default()
        });
        let was_strict = self.strict();
        let (body, is_expression) = if kind == FunctionKind::Arrow && !self.is(&Token::LBrace) {
            let expr = self.parse_assignment(false)?;
            let (line, column) = (expr.line, expr.column);
            (vec![Statement::new(StatementKind::Return(Some(expr)), line, column)], true)
        } else {
            self.expect(Token::LBrace)?;
            let body = self.parse_body(false)?;
            self.expect(Token::RBrace)?;
            (body, false)
        };
        let strict = self.strict();
        if strict && !was_strict && !simple_params {
            return Err(self.error_at(start, "Illegal 'use strict' directive in function with non-simple parameter list"));
        }
        let unique_required = strict || !simple_params || matches!(kind, FunctionKind::Arrow | FunctionKind::Method | FunctionKind::ClassConstructor { .. });
        let mut seen = HashSet::new();
        for n in &names {
            if !seen.insert(n.as_str()) && unique_required {
                return Err(self.error_at(start, "Duplicate parameter name not allowed in this context"));
            }
            if strict && (n == "eval" || n == "arguments") {
                return Err(self.error_at(start, "Unexpected eval or arguments in strict mode"));
            }
            if strict && STRICT_RESERVED.contains(&n.as_str()) {
                return Err(self.error_at(start, "Unexpected strict mode reserved word"));
            }
        }
        if strict
            && let Some(n) = &name
            && (n.name == "eval" || n.name == "arguments")
        {
            return Err(self.error_at(start, "Unexpected eval or arguments in strict mode"));
        }
        self.pop_scope();
        let source = self.lexer.slice(start.start, self.prev_end);
        Ok(FunctionNode {
            name,
            params,
            rest,
            body,
            kind,
            strict,
            is_expression,
            simple_params,
            source,
            line: start.line,
            column: start.column,
            scope: ScopeInfo::default(),
            local_count: 0,
            arguments: None,
            self_binding: None,
            frame_captures: Vec::new(),
        })
    }

    fn parse_method(&mut self, kind: FunctionKind, start: &TokenData) -> Result<FunctionNode, JSError> {
        self.parse_function_rest(None, kind, start)
    }

    /// Tries to read `( params ) =>`; restores the parser state when the tokens are not arrow parameters.
    fn try_parse_arrow_params(&mut self) -> Result<Option<(Vec<PatternElem>, Option<Pattern>)>, JSError> {
        let saved_lexer = self.lexer.clone();
        let saved_cur = self.cur.clone();
        let saved_prev = self.prev_end;
        let saved_functions = self.functions.len();
        let saved_scopes = self.ctx().scopes.len();
        let saved_covers = self.cover_inits.len();
        let attempt = (|| -> Result<Option<(Vec<PatternElem>, Option<Pattern>)>, JSError> {
            self.advance()?;
            let params = self.parse_formal_parameters()?;
            if self.is(&Token::Arrow) && !self.cur.newline_before {
                Ok(Some(params))
            } else {
                Ok(None)
            }
        })();
        match attempt {
            Ok(Some(params)) => Ok(Some(params)),
            _ => {
                self.lexer = saved_lexer;
                self.cur = saved_cur;
                self.prev_end = saved_prev;
                self.functions.truncate(saved_functions);
                self.ctx_mut().scopes.truncate(saved_scopes);
                self.cover_inits.truncate(saved_covers);
                Ok(None)
            }
        }
    }

    fn parse_arrow_body(&mut self, params: Vec<PatternElem>, rest: Option<Pattern>, start: &TokenData) -> Result<Expr, JSError> {
        self.expect(Token::Arrow)?;
        let ctx = self.new_function_context(FunctionKind::Arrow);
        self.functions.push(ctx);
        let result = self.finish_function(None, params, rest, FunctionKind::Arrow, start);
        self.functions.pop();
        let func = result?;
        Ok(Expr::new(ExprKind::Function(Box::new(func)), start.line, start.column))
    }

    // ---------------------------------------------------------------- classes

    fn parse_class_declaration(&mut self) -> Result<Statement, JSError> {
        let start = self.cur.clone();
        let class = self.parse_class(true)?;
        if let Some(name) = &class.name {
            let name = name.name.clone();
            self.declare_lexical(&name, &start)?;
        }
        Ok(Statement::new(StatementKind::ClassDecl(Box::new(class)), start.line, start.column))
    }

    fn parse_class(&mut self, require_name: bool) -> Result<ClassNode, JSError> {
        let start = self.expect(Token::Class)?;
        let was_strict = self.strict();
        self.ctx_mut().strict = true;
        let result = self.parse_class_rest(require_name, &start);
        self.ctx_mut().strict = was_strict;
        result
    }

    fn parse_class_rest(&mut self, require_name: bool, start: &TokenData) -> Result<ClassNode, JSError> {
        let name = if matches!(self.cur.token, Token::Identifier(_)) {
            Some(self.binding_identifier()?)
        } else if require_name {
            return Err(self.unexpected());
        } else {
            None
        };
        let super_class = if self.eat(&Token::Extends)? { Some(Box::new(self.parse_lhs()?)) } else { None };
        self.expect(Token::LBrace)?;
        let mut constructor: Option<Box<FunctionNode>> = None;
        let mut members = Vec::new();
        while !self.is(&Token::RBrace) {
            if self.eat(&Token::Semicolon)? {
                continue;
            }
            let member_start = self.cur.clone();
            let mut is_static = false;
            if self.is_identifier("static") && !matches!(self.peek()?.token, Token::LParen | Token::Assign | Token::Semicolon) {
                self.advance()?;
                is_static = true;
            }
            let kind = self.accessor_prefix()?;
            let key_tok = self.cur.clone();
            let (key, _) = self.parse_property_key()?;
            let is_ctor_key = !is_static && matches!(&key, PropKey::Named(n) if n == "constructor") && !matches!(key_tok.token, Token::LBracket);
            if is_ctor_key {
                if kind != MethodKind::Method {
                    return Err(self.error_at(&key_tok, "Class constructor may not be an accessor"));
                }
                if constructor.is_some() {
                    return Err(self.error_at(&key_tok, "A class may only have one constructor"));
                }
                let derived = super_class.is_some();
                let mut func = self.parse_method(FunctionKind::ClassConstructor { derived }, &member_start)?;
                func.name = name.clone();
                constructor = Some(Box::new(func));
                continue;
            }
            if is_static && matches!(&key, PropKey::Named(n) if n == "prototype") {
                return Err(self.error_at(&key_tok, "Classes may not have a static property named 'prototype'"));
            }
            let fkind = match kind {
                MethodKind::Method => FunctionKind::Method,
                MethodKind::Getter => FunctionKind::Getter,
                MethodKind::Setter => FunctionKind::Setter,
            };
            let func = self.parse_method(fkind, &member_start)?;
            members.push(ClassMember {
                key,
                is_static,
                kind,
                func: Box::new(func),
            });
        }
        self.expect(Token::RBrace)?;
        let source = self.lexer.slice(start.start, self.prev_end);
        Ok(ClassNode {
            inner_name: name.clone(),
            name,
            super_class,
            constructor,
            members,
            scope: ScopeInfo::default(),
            source,
        })
    }

    /// Consumes a `get`/`set` prefix when it introduces an accessor.
    fn accessor_prefix(&mut self) -> Result<MethodKind, JSError> {
        let kind = if self.is_identifier("get") {
            MethodKind::Getter
        } else if self.is_identifier("set") {
            MethodKind::Setter
        } else {
            return Ok(MethodKind::Method);
        };
        let next = self.peek()?;
        if matches!(
            next.token,
            Token::Comma | Token::Colon | Token::LParen | Token::RBrace | Token::Assign | Token::Semicolon
        ) {
            return Ok(MethodKind::Method);
        }
        self.advance()?;
        Ok(kind)
    }

    /// Property name in a literal, pattern or class. The second value is set for
    /// plain identifiers, which may be used as shorthand.
    fn parse_property_key(&mut self) -> Result<(PropKey, Option<String>), JSError> {
        match self.cur.token.clone() {
            Token::StringLit(s) => {
                self.check_octal(&self.cur)?;
                self.advance()?;
                Ok((PropKey::Named(utf16_to_utf8(&s)), None))
            }
            Token::Number(n) => {
                self.check_octal(&self.cur)?;
                self.advance()?;
                Ok((PropKey::Named(number_to_string(n)), None))
            }
            Token::LBracket => {
                self.advance()?;
                let e = self.parse_assignment(false)?;
                self.expect(Token::RBracket)?;
                Ok((PropKey::Computed(Box::new(e)), None))
            }
            Token::Identifier(name) => {
                self.advance()?;
                Ok((PropKey::Named(name.clone()), Some(name)))
            }
            t => match t.as_identifier_string() {
                Some(name) => {
                    self.advance()?;
                    Ok((PropKey::Named(name), None))
                }
                None => Err(self.unexpected()),
            },
        }
    }

    fn check_octal(&self, tok: &TokenData) -> Result<(), JSError> {
        if self.strict() && tok.legacy_octal {
            let msg = match tok.token {
                Token::Number(_) => "Octal literals are not allowed in strict mode.",
                _ => "Octal escape sequences are not allowed in strict mode.",
            };
            return Err(self.error_at(tok, msg));
        }
        Ok(())
    }

    // ---------------------------------------------------------------- expressions

    pub fn parse_expression(&mut self, no_in: bool) -> Result<Expr, JSError> {
        let first = self.parse_assignment(no_in)?;
        if !self.is(&Token::Comma) {
            return Ok(first);
        }
        let (line, column) = (first.line, first.column);
        let mut exprs = vec![first];
        while self.eat(&Token::Comma)? {
            exprs.push(self.parse_assignment(no_in)?);
        }
        Ok(Expr::new(ExprKind::Sequence(exprs), line, column))
    }

    fn parse_assignment(&mut self, no_in: bool) -> Result<Expr, JSError> {
        self.nested(|p| p.assignment(no_in))
    }

    fn assignment(&mut self, no_in: bool) -> Result<Expr, JSError> {
        let start = self.cur.clone();
        if let Token::Identifier(name) = &self.cur.token {
            if name == "async" && !self.cur.escaped && self.peek()?.token == Token::Function {
                return Err(self.error_here("Async functions are not supported"));
            }
            let next = self.peek()?;
            if next.token == Token::Arrow && !next.newline_before {
                let id = self.binding_identifier()?;
                let param = PatternElem {
                    target: Pattern::Identifier(id),
                    default: None,
                };
                return self.parse_arrow_body(vec![param], None, &start);
            }
        }
        if self.is(&Token::LParen)
            && let Some((params, rest)) = self.try_parse_arrow_params()?
        {
            return self.parse_arrow_body(params, rest, &start);
        }
        let mark = self.cover_inits.len();
        let lhs = self.parse_conditional(no_in)?;
        if !self.cur.token.is_assignment_operator() {
            return Ok(lhs);
        }
        let op_tok = self.advance()?;
        let op = match op_tok.token {
            Token::Assign => AssignOp::Assign,
            Token::AddAssign => AssignOp::Binary(BinaryOp::Add),
            Token::SubAssign => AssignOp::Binary(BinaryOp::Sub),
            Token::MulAssign => AssignOp::Binary(BinaryOp::Mul),
            Token::DivAssign => AssignOp::Binary(BinaryOp::Div),
            Token::ModAssign => AssignOp::Binary(BinaryOp::Mod),
            Token::PowAssign => AssignOp::Binary(BinaryOp::Exp),
            Token::BitAndAssign => AssignOp::Binary(BinaryOp::BitAnd),
            Token::BitOrAssign => AssignOp::Binary(BinaryOp::BitOr),
            Token::BitXorAssign => AssignOp::Binary(BinaryOp::BitXor),
            Token::LeftShiftAssign => AssignOp::Binary(BinaryOp::Shl),
            Token::RightShiftAssign => AssignOp::Binary(BinaryOp::Shr),
            Token::UnsignedRightShiftAssign => AssignOp::Binary(BinaryOp::UShr),
            Token::LogicalAndAssign => AssignOp::Logical(LogicalOp::And),
            Token::LogicalOrAssign => AssignOp::Logical(LogicalOp::Or),
            _ => AssignOp::Logical(LogicalOp::Nullish),
        };
        let target = if op == AssignOp::Assign {
            let p = self.expr_to_pattern(lhs, true)?;
            self.cover_inits.truncate(mark);
            p
        } else {
            self.expr_to_simple_target(lhs, "Invalid left-hand side in assignment")?
        };
        let value = self.parse_assignment(no_in)?;
        Ok(Expr::new(
            ExprKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            start.line,
            start.column,
        ))
    }

    fn invalid_target(&self, line: usize, column: usize, msg: &str) -> JSError {
        let mut e = raise_syntax_error!(msg);
        e.set_js_location(line, column);
        e
    }

    fn check_assign_identifier(&self, id: &Identifier) -> Result<(), JSError> {
        if self.strict() && (id.name == "eval" || id.name == "arguments") {
            let mut e = raise_syntax_error!("Unexpected eval or arguments in strict mode");
            e.set_js_location(id.line, id.column);
            return Err(e);
        }
        Ok(())
    }

    /// Target of compound assignment or update: identifier or member access.
    fn expr_to_simple_target(&self, expr: Expr, msg: &str) -> Result<Pattern, JSError> {
        let Expr { kind, line, column } = expr;
        match kind {
            ExprKind::Identifier(id) => {
                self.check_assign_identifier(&id)?;
                Ok(Pattern::Identifier(id))
            }
            kind @ (ExprKind::Member { optional: false, .. } | ExprKind::SuperMember { .. }) => {
                Ok(Pattern::Expr(Box::new(Expr::new(kind, line, column))))
            }
            _ => Err(self.invalid_target(line, column, msg)),
        }
    }

    /// Reinterprets an expression as an assignment pattern.
    fn expr_to_pattern(&self, expr: Expr, destructure: bool) -> Result<Pattern, JSError> {
        if !destructure {
            return self.expr_to_simple_target(expr, "Invalid left-hand side in assignment");
        }
        let Expr { kind, line, column } = expr;
        match kind {
            ExprKind::Array(elements) => {
                let count = elements.len();
                let mut out = Vec::new();
                let mut rest = None;
                for (i, el) in elements.into_iter().enumerate() {
                    match el {
                        None => out.push(None),
                        Some(Expr {
                            kind: ExprKind::Spread(inner),
                            line,
                            column,
                        }) => {
                            if i + 1 != count {
                                return Err(self.invalid_target(line, column, "Rest element must be last element"));
                            }
                            rest = Some(Box::new(self.expr_to_pattern(*inner, true)?));
                        }
                        Some(e) => out.push(Some(self.expr_to_pattern_elem(e)?)),
                    }
                }
                Ok(Pattern::Array { elements: out, rest })
            }
            ExprKind::Object(props) => {
                let count = props.len();
                let mut out = Vec::new();
                let mut rest = None;
                for (i, p) in props.into_iter().enumerate() {
                    match p {
                        PropertyDef::Value(key, value) => {
                            let elem = self.expr_to_pattern_elem(value)?;
                            out.push(ObjectPatternProp {
                                key,
                                value: elem.target,
                                default: elem.default,
                            });
                        }
                        PropertyDef::Proto(value) => {
                            let elem = self.expr_to_pattern_elem(value)?;
                            out.push(ObjectPatternProp {
                                key: PropKey::Named("__proto__".to_string()),
                                value: elem.target,
                                default: elem.default,
                            });
                        }
                        PropertyDef::Spread(e) if i + 1 == count => {
                            rest = Some(Box::new(self.expr_to_pattern(e, false)?));
                        }
                        _ => return Err(self.invalid_target(line, column, "Invalid destructuring assignment target")),
                    }
                }
                Ok(Pattern::Object { props: out, rest })
            }
            kind => self.expr_to_simple_target(Expr::new(kind, line, column), "Invalid left-hand side in assignment"),
        }
    }

    fn expr_to_pattern_elem(&self, expr: Expr) -> Result<PatternElem, JSError> {
        match expr.kind {
            ExprKind::Assign {
                op: AssignOp::Assign,
                target,
                value,
            } => Ok(PatternElem {
                target: *target,
                default: Some(*value),
            }),
            _ => Ok(PatternElem {
                target: self.expr_to_pattern(expr, true)?,
                default: None,
            }),
        }
    }

    fn parse_conditional(&mut self, no_in: bool) -> Result<Expr, JSError> {
        let (test, _) = self.parse_binary(1, no_in)?;
        if !self.eat(&Token::QuestionMark)? {
            return Ok(test);
        }
        let cons = self.parse_assignment(false)?;
        self.expect(Token::Colon)?;
        let alt = self.parse_assignment(no_in)?;
        let (line, column) = (test.line, test.column);
        Ok(Expr::new(ExprKind::Conditional(Box::new(test), Box::new(cons), Box::new(alt)), line, column))
    }

    fn binary_operator(&self, no_in: bool) -> Option<(u8, BinOp)> {
        use BinOp::{Binary, Logical};
        Some(match self.cur.token {
            Token::NullishCoalescing => (1, Logical(LogicalOp::Nullish)),
            Token::LogicalOr => (1, Logical(LogicalOp::Or)),
            Token::LogicalAnd => (2, Logical(LogicalOp::And)),
            Token::BitOr => (3, Binary(BinaryOp::BitOr)),
            Token::BitXor => (4, Binary(BinaryOp::BitXor)),
            Token::BitAnd => (5, Binary(BinaryOp::BitAnd)),
            Token::Equal => (6, Binary(BinaryOp::Eq)),
            Token::NotEqual => (6, Binary(BinaryOp::NotEq)),
            Token::StrictEqual => (6, Binary(BinaryOp::StrictEq)),
            Token::StrictNotEqual => (6, Binary(BinaryOp::StrictNotEq)),
            Token::LessThan => (7, Binary(BinaryOp::Lt)),
            Token::GreaterThan => (7, Binary(BinaryOp::Gt)),
            Token::LessEqual => (7, Binary(BinaryOp::LtEq)),
            Token::GreaterEqual => (7, Binary(BinaryOp::GtEq)),
            Token::InstanceOf => (7, Binary(BinaryOp::InstanceOf)),
            Token::In if !no_in => (7, Binary(BinaryOp::In)),
            Token::LeftShift => (8, Binary(BinaryOp::Shl)),
            Token::RightShift => (8, Binary(BinaryOp::Shr)),
            Token::UnsignedRightShift => (8, Binary(BinaryOp::UShr)),
            Token::Plus => (9, Binary(BinaryOp::Add)),
            Token::Minus => (9, Binary(BinaryOp::Sub)),
            Token::Multiply => (10, Binary(BinaryOp::Mul)),
            Token::Divide => (10, Binary(BinaryOp::Div)),
            Token::Mod => (10, Binary(BinaryOp::Mod)),
            Token::Exponent => (11, Binary(BinaryOp::Exp)),
            _ => return None,
        })
    }

    /// Precedence climbing. The second value reports an unparenthesized
    /// logical operator at the root, used to reject `a ?? b || c`.
    fn parse_binary(&mut self, min_prec: u8, no_in: bool) -> Result<BinaryResult, JSError> {
        self.nested(|p| p.binary(min_prec, no_in))
    }

    fn binary(&mut self, min_prec: u8, no_in: bool) -> Result<BinaryResult, JSError> {
        let (mut left, mut left_unary) = self.parse_unary()?;
        let mut left_logical: Option<LogicalOp> = None;
        while let Some((prec, op)) = self.binary_operator(no_in) {
            if prec < min_prec {
                break;
            }
            let op_tok = self.advance()?;
            let (line, column) = (left.line, left.column);
            match op {
                BinOp::Binary(BinaryOp::Exp) => {
                    if left_unary {
                        return Err(self.error_at(
                            &op_tok,
                            "Unary operator used immediately before exponentiation expression. Parenthesis must be used to disambiguate operator precedence",
                        ));
                    }
                    let (right, _) = self.parse_binary(prec, no_in)?;
                    left = Expr::new(ExprKind::Binary(BinaryOp::Exp, Box::new(left), Box::new(right)), line, column);
                    left_logical = None;
                }
                BinOp::Binary(b) => {
                    let (right, _) = self.parse_binary(prec + 1, no_in)?;
                    left = Expr::new(ExprKind::Binary(b, Box::new(left), Box::new(right)), line, column);
                    left_logical = None;
                }
                BinOp::Logical(l) => {
                    let (right, right_logical) = self.parse_binary(prec + 1, no_in)?;
                    let mixes = |other: Option<LogicalOp>| {
                        matches!(
                            (l, other),
                            (LogicalOp::Nullish, Some(LogicalOp::And | LogicalOp::Or)) | (LogicalOp::And | LogicalOp::Or, Some(LogicalOp::Nullish))
                        )
                    };
                    if mixes(left_logical) || mixes(right_logical) {
                        return Err(self.error_at(&op_tok, "Unexpected token: cannot mix '??' with '&&' or '||' without parentheses"));
                    }
                    left = Expr::new(ExprKind::Logical(l, Box::new(left), Box::new(right)), line, column);
                    left_logical = Some(l);
                }
            }
            left_unary = false;
        }
        Ok((left, left_logical))
    }

    /// Unary expression; the flag is set when a unary operator was applied.
    fn parse_unary(&mut self) -> Result<(Expr, bool), JSError> {
        self.nested(Self::unary)
    }

    fn unary(&mut self) -> Result<(Expr, bool), JSError> {
        let tok = self.cur.clone();
        let op = match tok.token {
            Token::Delete => Some(UnaryOp::Delete),
            Token::Void => Some(UnaryOp::Void),
            Token::TypeOf => Some(UnaryOp::TypeOf),
            Token::Plus => Some(UnaryOp::Plus),
            Token::Minus => Some(UnaryOp::Minus),
            Token::BitNot => Some(UnaryOp::BitNot),
            Token::LogicalNot => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.advance()?;
            let (operand, _) = self.parse_unary()?;
            if op == UnaryOp::Delete && self.strict() && matches!(operand.kind, ExprKind::Identifier(_)) {
                return Err(self.error_at(&tok, "Delete of an unqualified identifier in strict mode."));
            }
            return Ok((Expr::new(ExprKind::Unary(op, Box::new(operand)), tok.line, tok.column), true));
        }
        if matches!(tok.token, Token::Increment | Token::Decrement) {
            self.advance()?;
            let (operand, _) = self.parse_unary()?;
            let target = self.expr_to_simple_target(operand, "Invalid left-hand side expression in prefix operation")?;
            return Ok((
                Expr::new(
                    ExprKind::Update {
                        increment: tok.token == Token::Increment,
                        prefix: true,
                        target: Box::new(target),
                    },
                    tok.line,
                    tok.column,
                ),
                true,
            ));
        }
        let expr = self.parse_lhs()?;
        if matches!(self.cur.token, Token::Increment | Token::Decrement) && !self.cur.newline_before {
            let op_tok = self.advance()?;
            let (line, column) = (expr.line, expr.column);
            let target = self.expr_to_simple_target(expr, "Invalid left-hand side expression in postfix operation")?;
            return Ok((
                Expr::new(
                    ExprKind::Update {
                        increment: op_tok.token == Token::Increment,
                        prefix: false,
                        target: Box::new(target),
                    },
                    line,
                    column,
                ),
                false,
            ));
        }
        Ok((expr, false))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, JSError> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        while !self.is(&Token::RParen) {
            if self.is(&Token::Spread) {
                let tok = self.advance()?;
                let e = self.parse_assignment(false)?;
                args.push(Expr::new(ExprKind::Spread(Box::new(e)), tok.line, tok.column));
            } else {
                args.push(self.parse_assignment(false)?);
            }
            if !self.is(&Token::RParen) {
                self.expect(Token::Comma)?;
            }
        }
        self.expect(Token::RParen)?;
        Ok(args)
    }

    fn parse_super(&mut self) -> Result<Expr, JSError> {
        let tok = self.expect(Token::Super)?;
        match self.cur.token {
            Token::LParen => {
                if !self.ctx().super_call {
                    return Err(self.error_at(&tok, "'super' keyword unexpected here"));
                }
                let args = self.parse_arguments()?;
                Ok(Expr::new(
                    ExprKind::SuperCall {
                        args,
                        this: Identifier::new(THIS_NAME, tok.line, tok.column),
                        callee: Identifier::new(CALLEE_NAME, tok.line, tok.column),
                        new_target: Identifier::new(NEW_TARGET_NAME, tok.line, tok.column),
                    },
                    tok.line,
                    tok.column,
                ))
            }
            Token::Dot | Token::LBracket => {
                if !self.ctx().super_property {
                    return Err(self.error_at(&tok, "'super' keyword unexpected here"));
                }
                let property = if self.eat(&Token::Dot)? {
                    MemberProperty::Named(self.identifier_name()?)
                } else {
                    self.advance()?;
                    let e = self.parse_expression(false)?;
                    self.expect(Token::RBracket)?;
                    MemberProperty::Computed(Box::new(e))
                };
                Ok(Expr::new(
                    ExprKind::SuperMember {
                        property,
                        this: Identifier::new(THIS_NAME, tok.line, tok.column),
                    },
                    tok.line,
                    tok.column,
                ))
            }
            _ => Err(self.error_at(&tok, "'super' keyword unexpected here")),
        }
    }

    fn parse_lhs(&mut self) -> Result<Expr, JSError> {
        let expr = match self.cur.token {
            Token::New => self.parse_new()?,
            Token::Super => self.parse_super()?,
            _ => self.parse_primary()?,
        };
        self.parse_call_tail(expr, true)
    }

    fn parse_new(&mut self) -> Result<Expr, JSError> {
        self.nested(Self::new_expression)
    }

    fn new_expression(&mut self) -> Result<Expr, JSError> {
        let tok = self.expect(Token::New)?;
        if self.eat(&Token::Dot)? {
            if !self.is_identifier("target") {
                return Err(self.unexpected());
            }
            self.advance()?;
            if !self.ctx().new_target {
                return Err(self.error_at(&tok, "new.target expression is not allowed here"));
            }
            return Ok(Expr::new(
                ExprKind::NewTarget(Identifier::new(NEW_TARGET_NAME, tok.line, tok.column)),
                tok.line,
                tok.column,
            ));
        }
        let callee = match self.cur.token {
            Token::New => self.parse_new()?,
            Token::Super => self.parse_super()?,
            _ => self.parse_primary()?,
        };
        let callee = self.parse_call_tail(callee, false)?;
        let args = if self.is(&Token::LParen) { self.parse_arguments()? } else { Vec::new() };
        Ok(Expr::new(
            ExprKind::New {
                callee: Box::new(callee),
                args,
            },
            tok.line,
            tok.column,
        ))
    }

    /// Member accesses, calls, tagged templates and optional chains after a primary expression.
    fn parse_call_tail(&mut self, mut expr: Expr, allow_call: bool) -> Result<Expr, JSError> {
        let mut in_chain = false;
        loop {
            let (line, column) = (expr.line, expr.column);
            match &self.cur.token {
                Token::Dot => {
                    self.advance()?;
                    let name = self.identifier_name()?;
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            property: MemberProperty::Named(name),
                            optional: false,
                        },
                        line,
                        column,
                    );
                }
                Token::LBracket => {
                    self.advance()?;
                    let prop = self.parse_expression(false)?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            property: MemberProperty::Computed(Box::new(prop)),
                            optional: false,
                        },
                        line,
                        column,
                    );
                }
                Token::LParen if allow_call => {
                    let args = self.parse_arguments()?;
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                            optional: false,
                        },
                        line,
                        column,
                    );
                }
                Token::Template { .. } => {
                    if in_chain {
                        return Err(self.error_here("Invalid tagged template on optional chain"));
                    }
                    let (cooked, raw, exprs) = self.parse_template_parts()?;
                    expr = Expr::new(
                        ExprKind::TaggedTemplate {
                            tag: Box::new(expr),
                            cooked,
                            raw,
                            exprs,
                        },
                        line,
                        column,
                    );
                }
                Token::OptionalChain if allow_call => {
                    self.advance()?;
                    in_chain = true;
                    expr = match self.cur.token {
                        Token::LParen => {
                            let args = self.parse_arguments()?;
                            Expr::new(
                                ExprKind::Call {
                                    callee: Box::new(expr),
                                    args,
                                    optional: true,
                                },
                                line,
                                column,
                            )
                        }
                        Token::LBracket => {
                            self.advance()?;
                            let prop = self.parse_expression(false)?;
                            self.expect(Token::RBracket)?;
                            Expr::new(
                                ExprKind::Member {
                                    object: Box::new(expr),
                                    property: MemberProperty::Computed(Box::new(prop)),
                                    optional: true,
                                },
                                line,
                                column,
                            )
                        }
                        _ => {
                            let name = self.identifier_name()?;
                            Expr::new(
                                ExprKind::Member {
                                    object: Box::new(expr),
                                    property: MemberProperty::Named(name),
                                    optional: true,
                                },
                                line,
                                column,
                            )
                        }
                    };
                }
                _ => break,
            }
        }
        if in_chain {
            let (line, column) = (expr.line, expr.column);
            expr = Expr::new(ExprKind::OptionalChain(Box::new(expr)), line, column);
        }
        Ok(expr)
    }

    fn parse_template_parts(&mut self) -> Result<(Vec<Option<Vec<u16>>>, Vec<String>, Vec<Expr>), JSError> {
        let mut cooked_parts = Vec::new();
        let mut raws = Vec::new();
        let mut exprs = Vec::new();
        loop {
            let Token::Template { cooked, raw, tail } = self.cur.token.clone() else {
                return Err(self.unexpected());
            };
            cooked_parts.push(cooked);
            raws.push(raw);
            self.advance()?;
            if tail {
                break;
            }
            exprs.push(self.parse_expression(false)?);
            if !self.is(&Token::RBrace) {
                return Err(self.unexpected());
            }
            self.cur = self.lexer.rescan_template_continuation(&self.cur)?;
        }
        Ok((cooked_parts, raws, exprs))
    }

    fn parse_primary(&mut self) -> Result<Expr, JSError> {
        if matches!(self.cur.token, Token::Divide | Token::DivAssign) {
            self.cur = self.lexer.rescan_regex(&self.cur)?;
        }
        let tok = self.cur.clone();
        let (line, column) = (tok.line, tok.column);
        let kind = match tok.token {
            Token::This => {
                self.advance()?;
                ExprKind::This(Identifier::new(THIS_NAME, line, column))
            }
            Token::Identifier(ref name) => {
                if name == "async" && !tok.escaped && self.peek()?.token == Token::Function {
                    return Err(self.error_here("Async functions are not supported"));
                }
                self.check_identifier_reference(name, &tok)?;
                self.advance()?;
                ExprKind::Identifier(Identifier::new(name.clone(), line, column))
            }
            Token::Number(n) => {
                self.check_octal(&tok)?;
                self.advance()?;
                ExprKind::Number(n)
            }
            Token::StringLit(ref s) => {
                self.check_octal(&tok)?;
                self.advance()?;
                ExprKind::String(s.clone())
            }
            Token::Template { .. } => {
                let (cooked, _, exprs) = self.parse_template_parts()?;
                let mut quasis = Vec::with_capacity(cooked.len());
                for c in cooked {
                    match c {
                        Some(c) => quasis.push(c),
                        None => return Err(self.error_at(&tok, "Invalid escape sequence in template")),
                    }
                }
                ExprKind::Template { quasis, exprs }
            }
            Token::Regex(ref pattern, ref flags) => {
                self.advance()?;
                ExprKind::Regex {
                    pattern: pattern.clone(),
                    flags: flags.clone(),
                }
            }
            Token::Null => {
                self.advance()?;
                ExprKind::Null
            }
            Token::True => {
                self.advance()?;
                ExprKind::Boolean(true)
            }
            Token::False => {
                self.advance()?;
                ExprKind::Boolean(false)
            }
            Token::LParen => {
                self.advance()?;
                let e = self.parse_expression(false)?;
                self.expect(Token::RParen)?;
                return Ok(e);
            }
            Token::LBracket => self.parse_array_literal()?,
            Token::LBrace => self.parse_object_literal()?,
            Token::Function => return self.parse_function_expression(),
            Token::Class => ExprKind::Class(Box::new(self.parse_class(false)?)),
            _ => return Err(self.unexpected()),
        };
        Ok(Expr::new(kind, line, column))
    }

    fn parse_array_literal(&mut self) -> Result<ExprKind, JSError> {
        self.expect(Token::LBracket)?;
        let mut elements = Vec::new();
        loop {
            if self.eat(&Token::RBracket)? {
                break;
            }
            if self.eat(&Token::Comma)? {
                elements.push(None);
                continue;
            }
            if self.is(&Token::Spread) {
                let tok = self.advance()?;
                let e = self.parse_assignment(false)?;
                elements.push(Some(Expr::new(ExprKind::Spread(Box::new(e)), tok.line, tok.column)));
            } else {
                elements.push(Some(self.parse_assignment(false)?));
            }
            if !self.is(&Token::RBracket) {
                self.expect(Token::Comma)?;
            }
        }
        Ok(ExprKind::Array(elements))
    }

    fn parse_object_literal(&mut self) -> Result<ExprKind, JSError> {
        self.expect(Token::LBrace)?;
        let mut props = Vec::new();
        let mut has_proto = false;
        while !self.is(&Token::RBrace) {
            if self.eat(&Token::Spread)? {
                props.push(PropertyDef::Spread(self.parse_assignment(false)?));
            } else {
                let start = self.cur.clone();
                let kind = self.accessor_prefix()?;
                let key_tok = self.cur.clone();
                let (key, shorthand) = self.parse_property_key()?;
                if kind != MethodKind::Method {
                    let fkind = if kind == MethodKind::Getter { FunctionKind::Getter } else { FunctionKind::Setter };
                    let func = Box::new(self.parse_method(fkind, &start)?);
                    props.push(if kind == MethodKind::Getter {
                        PropertyDef::Getter(key, func)
                    } else {
                        PropertyDef::Setter(key, func)
                    });
                } else if self.is(&Token::LParen) {
                    let func = self.parse_method(FunctionKind::Method, &start)?;
                    props.push(PropertyDef::Method(key, Box::new(func)));
                } else if self.eat(&Token::Colon)? {
                    let value = self.parse_assignment(false)?;
                    let is_proto = matches!(&key, PropKey::Named(n) if n == "__proto__") && !matches!(key_tok.token, Token::LBracket);
                    if is_proto {
                        if has_proto {
                            return Err(self.error_at(&key_tok, "Duplicate __proto__ fields are not allowed in object literals"));
                        }
                        has_proto = true;
                        props.push(PropertyDef::Proto(value));
                    } else {
                        props.push(PropertyDef::Value(key, value));
                    }
                } else {
                    let Some(name) = shorthand else {
                        return Err(self.unexpected());
                    };
                    self.check_identifier_reference(&name, &key_tok)?;
                    let id = Identifier::new(name.clone(), key_tok.line, key_tok.column);
                    let value = if self.is(&Token::Assign) {
                        self.cover_inits.push((self.cur.line, self.cur.column));
                        self.advance()?;
                        let default = self.parse_assignment(false)?;
                        Expr::new(
                            ExprKind::Assign {
                                op: AssignOp::Assign,
                                target: Box::new(Pattern::Identifier(id)),
                                value: Box::new(default),
                            },
                            key_tok.line,
                            key_tok.column,
                        )
                    } else {
                        Expr::new(ExprKind::Identifier(id), key_tok.line, key_tok.column)
                    };
                    props.push(PropertyDef::Value(PropKey::Named(name), value));
                }
            }
            if !self.is(&Token::RBrace) {
                self.expect(Token::Comma)?;
            }
        }
        self.expect(Token::RBrace)?;
        Ok(ExprKind::Object(props))
    }
}

fn is_keyword(name: &str) -> bool {
    matches!(
        name,
        "var"
            | "const"
            | "class"
            | "extends"
            | "super"
            | "this"
            | "new"
            | "instanceof"
            | "typeof"
            | "in"
            | "delete"
            | "void"
            | "function"
            | "return"
            | "if"
            | "else"
            | "for"
            | "while"
            | "do"
            | "switch"
            | "case"
            | "default"
            | "break"
            | "continue"
            | "try"
            | "catch"
            | "finally"
            | "throw"
            | "with"
            | "debugger"
            | "null"
            | "true"
            | "false"
            | "enum"
            | "export"
            | "import"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<Program, JSError> {
        parse_program(src, false)
    }

    fn first_expr(src: &str) -> Expr {
        let program = parse(src).unwrap();
        match program.body.into_iter().next().map(|s| s.kind) {
            Some(StatementKind::Expr(e)) => e,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let e = first_expr("2 + 3 * 4");
        match e.kind {
            ExprKind::Binary(BinaryOp::Add, l, r) => {
                assert!(matches!(l.kind, ExprKind::Number(n) if n == 2.0));
                assert!(matches!(r.kind, ExprKind::Binary(BinaryOp::Mul, _, _)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn exponent_is_right_associative() {
        let e = first_expr("2 ** 3 ** 2");
        match e.kind {
            ExprKind::Binary(BinaryOp::Exp, l, r) => {
                assert!(matches!(l.kind, ExprKind::Number(n) if n == 2.0));
                assert!(matches!(r.kind, ExprKind::Binary(BinaryOp::Exp, _, _)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unary_before_exponent_is_rejected() {
        assert!(parse("-2 ** 2").is_err());
        assert!(parse("(-2) ** 2").is_ok());
    }

    #[test]
    fn return_followed_by_newline_ends_statement() {
        let program = parse("function f() { return\n5 }").unwrap();
        let StatementKind::FunctionDecl { func, .. } = &program.body[0].kind else {
            panic!("expected function");
        };
        assert!(matches!(func.body[0].kind, StatementKind::Return(None)));
        assert!(matches!(func.body[1].kind, StatementKind::Expr(_)));
    }

    #[test]
    fn plus_on_next_line_continues_expression() {
        let program = parse("a = b\n+c").unwrap();
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn missing_semicolon_on_same_line_is_an_error() {
        assert!(parse("a = 1 b = 2").is_err());
    }

    #[test]
    fn postfix_increment_does_not_cross_newline() {
        let program = parse("a\n++b").unwrap();
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn regex_in_expression_position() {
        let e = first_expr("x = /ab+c/g");
        let ExprKind::Assign { value, .. } = e.kind else { panic!() };
        assert!(matches!(value.kind, ExprKind::Regex { ref pattern, ref flags } if pattern == "ab+c" && flags == "g"));
    }

    #[test]
    fn division_after_identifier() {
        let e = first_expr("a / b / c");
        assert!(matches!(e.kind, ExprKind::Binary(BinaryOp::Div, _, _)));
    }

    #[test]
    fn early_errors() {
        assert!(parse("return 1").is_err());
        assert!(parse("break;").is_err());
        assert!(parse("while (1) { continue foo; }").is_err());
        assert!(parse("foo: { continue foo; }").is_err());
        assert!(parse("1 = 2").is_err());
        assert!(parse("a + b = c").is_err());
        assert!(parse("let a; let a;").is_err());
        assert!(parse("let a; var a;").is_err());
        assert!(parse("var a; var a;").is_ok());
        assert!(parse("const a;").is_err());
        assert!(parse("'use strict'; with (o) {}").is_err());
        assert!(parse("'use strict'; delete x;").is_err());
        assert!(parse("'use strict'; var x = 017;").is_err());
        assert!(parse("'use strict'; var eval = 1;").is_err());
        assert!(parse("'use strict'; function f(a, a) {}").is_err());
        assert!(parse("function f(a, a) {}").is_ok());
        assert!(parse("'use strict'; var interface;").is_err());
        assert!(parse("a ?? b || c").is_err());
        assert!(parse("({a = 1})").is_err());
        assert!(parse("({a = 1} = {})").is_ok());
    }

    #[test]
    fn use_strict_directive_in_function() {
        assert!(parse("function f() { 'use strict'; with (a) {} }").is_err());
        assert!(parse("function f() { with (a) {} }").is_ok());
        assert!(parse("function f(a = 1) { 'use strict'; }").is_err());
    }

    #[test]
    fn arrow_functions() {
        let e = first_expr("(a, b) => a + b");
        let ExprKind::Function(f) = e.kind else { panic!() };
        assert_eq!(f.kind, FunctionKind::Arrow);
        assert_eq!(f.params.len(), 2);
        assert!(f.is_expression);
        let e = first_expr("x => { return x; }");
        assert!(matches!(e.kind, ExprKind::Function(_)));
        let e = first_expr("(a, b)");
        assert!(matches!(e.kind, ExprKind::Sequence(_)));
    }

    #[test]
    fn labels_and_loops() {
        assert!(parse("outer: for (;;) { inner: for (;;) { continue outer; } }").is_ok());
        assert!(parse("a: b: while (true) { continue a; }").is_ok());
    }

    #[test]
    fn classes_and_templates() {
        assert!(parse("class A extends B { constructor() { super(); } get x() { return 1; } static m() {} }").is_ok());
        assert!(parse("class A { constructor() { super(); } }").is_err());
        assert!(parse("`a${1 + `b${2}`}c`").is_ok());
        assert!(parse("tag`\\unicode`").is_ok());
        assert!(parse("`\\unicode`").is_err());
    }

    #[test]
    fn function_source_text_is_kept() {
        let program = parse("function add(a, b) { return a + b; }").unwrap();
        let StatementKind::FunctionDecl { func, .. } = &program.body[0].kind else {
            panic!();
        };
        assert_eq!(func.source, "function add(a, b) { return a + b; }");
    }
}
