use ecmascript::{BinaryOp, ExprKind, JSErrorKind, StatementKind, Token, evaluate_script, parse_program, resolve_program, tokenize};

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn tokens(source: &str) -> Vec<Token> {
    tokenize(source).unwrap().into_iter().map(|t| t.token).collect()
}

fn syntax_error(source: &str) -> String {
    match parse_program(source, false) {
        Ok(_) => panic!("expected a SyntaxError for {source:?}"),
        Err(err) => match err.kind() {
            JSErrorKind::SyntaxError { message } => message.clone(),
            other => panic!("expected a SyntaxError for {source:?}, got {other:?}"),
        },
    }
}

#[test]
fn tokenizes_punctuators_greedily() {
    assert_eq!(
        tokens("a >>>= b ?? c?.d ** 2 => ..."),
        vec![
            Token::Identifier("a".into()),
            Token::UnsignedRightShiftAssign,
            Token::Identifier("b".into()),
            Token::NullishCoalescing,
            Token::Identifier("c".into()),
            Token::OptionalChain,
            Token::Identifier("d".into()),
            Token::Exponent,
            Token::Number(2.0),
            Token::Arrow,
            Token::Spread,
            Token::EOF,
        ]
    );
}

#[test]
fn optional_chain_is_not_taken_before_a_digit() {
    assert_eq!(
        tokens("x?.5:1"),
        vec![Token::Identifier("x".into()), Token::QuestionMark, Token::Number(0.5), Token::Colon, Token::Number(1.0), Token::EOF]
    );
}

#[test]
fn keywords_and_contextual_words() {
    assert_eq!(
        tokens("var let of typeof"),
        vec![Token::Var, Token::Identifier("let".into()), Token::Identifier("of".into()), Token::TypeOf, Token::EOF]
    );
}

#[test]
fn unicode_identifiers() {
    assert_eq!(tokens("café $_x π"), vec![Token::Identifier("café".into()), Token::Identifier("$_x".into()), Token::Identifier("π".into()), Token::EOF]);
}

#[test]
fn token_positions_are_one_based() {
    let toks = tokenize("a\n  bb").unwrap();
    assert_eq!((toks[0].line, toks[0].column), (1, 1));
    assert_eq!((toks[1].line, toks[1].column), (2, 3));
    assert!(toks[1].newline_before);
}

#[test]
fn comments_are_skipped() {
    assert_eq!(tokens("1 // line\n/* block */ 2"), vec![Token::Number(1.0), Token::Number(2.0), Token::EOF]);
}

#[test]
fn lexical_errors() {
    assert!(tokenize("'unterminated").is_err());
    assert!(tokenize("/* open").is_err());
    assert!(tokenize("0x").is_err());
    assert!(tokenize("a # b").is_err());
}

#[test]
fn parses_statement_structure() {
    let mut program = parse_program("var a = 1; function f() {} if (a) a; else f();", false).unwrap();
    assert_eq!(program.body.len(), 3);
    assert!(matches!(program.body[0].kind, StatementKind::VarDecl(..)));
    assert!(matches!(program.body[1].kind, StatementKind::FunctionDecl { .. }));
    assert!(matches!(program.body[2].kind, StatementKind::If(_, _, Some(_))));
    resolve_program(&mut program);
    assert_eq!(program.var_names, vec!["a".to_string()]);
    assert_eq!(program.function_names, vec!["f".to_string()]);
}

#[test]
fn top_level_lexical_names_are_recorded() {
    let mut program = parse_program("let a; const b = 1; class C {}", false).unwrap();
    resolve_program(&mut program);
    assert_eq!(program.lexical_names, vec![("a".to_string(), false), ("b".to_string(), true), ("C".to_string(), false)]);
}

#[test]
fn operator_precedence_shapes_the_tree() {
    let program = parse_program("1 + 2 * 3", false).unwrap();
    let StatementKind::Expr(expr) = &program.body[0].kind else {
        panic!("expected an expression statement");
    };
    let ExprKind::Binary(BinaryOp::Add, left, right) = &expr.kind else {
        panic!("expected addition at the root, got {:?}", expr.kind);
    };
    assert!(matches!(left.kind, ExprKind::Number(n) if n == 1.0));
    assert!(matches!(right.kind, ExprKind::Binary(BinaryOp::Mul, _, _)));

    let program = parse_program("2 ** 3 ** 2", false).unwrap();
    let StatementKind::Expr(expr) = &program.body[0].kind else {
        panic!("expected an expression statement");
    };
    let ExprKind::Binary(BinaryOp::Exp, _, right) = &expr.kind else {
        panic!("expected exponentiation");
    };
    assert!(matches!(right.kind, ExprKind::Binary(BinaryOp::Exp, _, _)));
}

#[test]
fn regex_literal_after_operator() {
    let program = parse_program("x = /a\\/b/g", false).unwrap();
    let StatementKind::Expr(expr) = &program.body[0].kind else {
        panic!("expected an expression statement");
    };
    let ExprKind::Assign { value, .. } = &expr.kind else {
        panic!("expected assignment");
    };
    assert!(matches!(&value.kind, ExprKind::Regex { pattern, flags } if pattern == "a\\/b" && flags == "g"));
}

#[test]
fn directive_prologue_sets_strictness() {
    assert!(parse_program("'use strict'; var x;", false).unwrap().strict);
    assert!(!parse_program("var x; 'use strict';", false).unwrap().strict);
    assert!(parse_program("var x;", true).unwrap().strict);
}

#[test]
fn statement_positions() {
    let program = parse_program("\n\n  throw 1;", false).unwrap();
    assert_eq!((program.body[0].line, program.body[0].column), (3, 3));
}

#[test]
fn early_errors() {
    assert!(syntax_error("let a; let a;").contains("already been declared"));
    assert!(syntax_error("return 1").contains("Illegal return"));
    assert!(syntax_error("break;").contains("Illegal break"));
    assert!(syntax_error("while (1) { continue nope; }").contains("Undefined label"));
    assert!(syntax_error("try {}").contains("Missing catch or finally"));
    assert!(syntax_error("const c;").contains("Missing initializer"));
    assert!(syntax_error("if (1) const x = 1;").contains("single-statement context"));
    assert!(syntax_error("a ?? b || c").contains("cannot mix"));
    assert!(syntax_error("throw\n1").contains("Illegal newline after throw"));
    assert!(syntax_error("switch (1) { default: default: }").contains("More than one default"));
    assert!(syntax_error("1 = 2").contains("Invalid left-hand side"));
    assert!(syntax_error("a + b = c").contains("Invalid left-hand side"));
    assert!(syntax_error("++a.b()").contains("Invalid left-hand side"));
}

#[test]
fn strict_mode_early_errors() {
    assert!(syntax_error("'use strict'; with (o) {}").contains("with statement"));
    assert!(syntax_error("'use strict'; var eval = 1;").contains("eval or arguments"));
    assert!(syntax_error("'use strict'; delete x;").contains("Delete of an unqualified identifier"));
    assert!(syntax_error("function f(a, a) { 'use strict'; }").contains("Duplicate parameter"));
    assert!(syntax_error("'use strict'; var implements;").contains("reserved word"));
    assert!(parse_program("function f(a, a) {}", false).is_ok());
}

#[test]
fn unsupported_generators_and_async_are_rejected() {
    assert!(syntax_error("function* g() {}").contains("Generator"));
    assert!(syntax_error("async function f() {}").contains("Async"));
}

#[test]
fn syntax_errors_carry_positions() {
    let err = parse_program("var ok = 1;\nvar = 2;", false).unwrap_err();
    assert_eq!(err.js_line(), Some(2));
    assert_eq!(err.js_column(), Some(5));
}

/// Deep inputs recurse through every compile pass; give them room the way the CLI does.
fn on_large_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new().stack_size(64 * 1024 * 1024).spawn(f).unwrap().join().unwrap()
}

fn nesting_error(source: &str) -> String {
    match parse_program(source, false) {
        Ok(_) => panic!("expected a nesting error"),
        Err(err) => match err.kind() {
            JSErrorKind::RangeError { message } => message.clone(),
            other => panic!("expected a RangeError, got {other:?}"),
        },
    }
}

#[test]
fn excessive_nesting_is_a_range_error() {
    on_large_stack(|| {
        let n = 100_000;
        assert!(nesting_error(&format!("{}1{}", "(".repeat(n), ")".repeat(n))).contains("Maximum nesting depth"));
        assert!(nesting_error(&format!("{}1{}", "[".repeat(n), "]".repeat(n))).contains("Maximum nesting depth"));
        assert!(nesting_error(&format!("{}{}", "{".repeat(n), "}".repeat(n))).contains("Maximum nesting depth"));
        assert!(nesting_error(&format!("{}x", "!".repeat(n))).contains("Maximum nesting depth"));
        assert!(nesting_error(&format!("x{}", " ** x".repeat(n))).contains("Maximum nesting depth"));
        assert!(nesting_error(&format!("{}F", "new ".repeat(n))).contains("Maximum nesting depth"));
        assert!(nesting_error(&format!("var {}x{} = 1;", "[".repeat(n), "]".repeat(n))).contains("Maximum nesting depth"));
        assert!(nesting_error(&"function f() {".repeat(n)).contains("Maximum nesting depth"));
    });
}

#[test]
fn nesting_errors_carry_a_position_and_are_catchable() {
    on_large_stack(|| {
        let err = parse_program(&format!("\n  {}1", "(".repeat(10_000)), false).unwrap_err();
        assert_eq!(err.js_line(), Some(2));
        let script = "try { eval('('.repeat(5000) + '1' + ')'.repeat(5000)); } catch (e) { e.name }";
        assert_eq!(evaluate_script(script, None::<&str>).unwrap(), "RangeError");
    });
}

#[test]
fn ordinary_nesting_still_compiles_and_runs() {
    on_large_stack(|| {
        let parens = format!("{}7{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(evaluate_script(&parens, None::<&str>).unwrap(), "7");
        let arrays = format!("{}1{}.length", "[".repeat(40), "]".repeat(40));
        assert_eq!(evaluate_script(&arrays, None::<&str>).unwrap(), "1");
        let closures = format!("{}5{}", "(function () { return ".repeat(20), "; })()".repeat(20));
        assert_eq!(evaluate_script(&closures, None::<&str>).unwrap(), "5");
        let blocks = format!("var v = 0; {}v = 3;{} v", "{ ".repeat(60), " }".repeat(60));
        assert_eq!(evaluate_script(&blocks, None::<&str>).unwrap(), "3");
    });
}
