//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs including:
//! - Operator precedence and associativity
//! - Variable declarations
//! - Function, struct, enum and union declarations
//! - Control flow statements
//! - Type annotations
//! - Error recovery

use std::rc::Rc;

use super::{
    expr::parse_expr,
    lookups::{build_operator_table, Arity},
    parser::{parse, Parser},
};
use crate::{
    ast::{
        ast::{CompilationUnit, Expr, Modifier, Stmt},
        types::TypeName,
    },
    errors::errors::Diagnostics,
    lexer::{lexer::tokenize, stream::TokenStream, tokens::TokenKind},
};

fn parse_source(source: &str) -> (CompilationUnit, Diagnostics) {
    let (tokens, diagnostics) = tokenize(source, Rc::new("test.lang".to_string()));
    parse(tokens, diagnostics)
}

fn parse_clean(source: &str) -> CompilationUnit {
    let (unit, diagnostics) = parse_source(source);
    let messages: Vec<String> = diagnostics.iter().map(|d| d.message()).collect();
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", messages);
    unit
}

/// Renders an expression as nested prefix notation.
fn shape(expr: &Expr) -> String {
    match expr {
        Expr::Literal(literal) => literal.value.clone(),
        Expr::Identifier(identifier) => identifier.name.clone(),
        Expr::SelfRef(_) => String::from("self"),
        Expr::Binary(binary) => format!("({} {} {})", binary.operator, shape(&binary.left), shape(&binary.right)),
        Expr::Unary(unary) if unary.is_postfix => format!("(post{} {})", unary.operator, shape(&unary.operand)),
        Expr::Unary(unary) => format!("({} {})", unary.operator, shape(&unary.operand)),
        Expr::Call(call) => {
            let args: Vec<String> = call.arguments.iter().map(shape).collect();
            format!("{}({})", shape(&call.callee), args.join(", "))
        }
        Expr::Tuple(tuple) => {
            let elements: Vec<String> = tuple.elements.iter().map(shape).collect();
            format!("tuple[{}]", elements.join(", "))
        }
        Expr::Array(array) => {
            let elements: Vec<String> = array.elements.iter().map(shape).collect();
            format!("array[{}]", elements.join(", "))
        }
        Expr::Default(default) => match &default.ty {
            Some(ty) => format!("default({})", ty),
            None => String::from("default"),
        },
        Expr::Invalid(_) => String::from("<invalid>"),
    }
}

fn expr_shape(source: &str) -> String {
    let (tokens, diagnostics) = tokenize(source, Rc::new("test.lang".to_string()));
    let mut parser = Parser::with_default_lookups(TokenStream::new(tokens, diagnostics));
    let expr = parse_expr(&mut parser, 0);
    assert!(parser.stream().diagnostics().is_empty());
    shape(&expr)
}

#[test]
fn test_operator_table() {
    let table = build_operator_table();

    assert_eq!(table.binary(TokenKind::Plus), 11);
    assert_eq!(table.binary(TokenKind::Star), 12);
    assert_eq!(table.prefix(TokenKind::Dash), 13);
    assert_eq!(table.precedence(TokenKind::Question, Arity::Postfix), 14);
    assert_eq!(table.binary(TokenKind::Semicolon), 0);
    assert_eq!(table.prefix(TokenKind::Plus), 0);
    assert!(table.is_right_associative(TokenKind::Assignment));
    assert!(!table.is_right_associative(TokenKind::Dash));
}

#[test]
fn test_precedence() {
    assert_eq!(expr_shape("1 + 2 * 3"), "(+ 1 (* 2 3))");
    assert_eq!(expr_shape("1 * 2 + 3"), "(+ (* 1 2) 3)");
    assert_eq!(expr_shape("a < b && c || d"), "(|| (&& (< a b) c) d)");
    assert_eq!(expr_shape("(1 + 2) * 3"), "(* (+ 1 2) 3)");
}

#[test]
fn test_left_associativity() {
    assert_eq!(expr_shape("a - b - c"), "(- (- a b) c)");
    assert_eq!(expr_shape("a / b * c"), "(* (/ a b) c)");
}

#[test]
fn test_right_associative_assignment() {
    assert_eq!(expr_shape("a = b = c"), "(= a (= b c))");
    assert_eq!(expr_shape("a += b * 2"), "(+= a (* b 2))");
}

#[test]
fn test_prefix_operators() {
    assert_eq!(expr_shape("-a * b"), "(* (- a) b)");
    assert_eq!(expr_shape("!done"), "(! done)");
    assert_eq!(expr_shape("not done and ready"), "(&& (! done) ready)");
    assert_eq!(expr_shape("*p = 3"), "(= (* p) 3)");
    assert_eq!(expr_shape("&x"), "(& x)");
    assert_eq!(expr_shape("a * -b"), "(* a (- b))");
}

#[test]
fn test_postfix_after_member_call() {
    assert_eq!(expr_shape("Type::method()?"), "(post? (:: Type method()))");
    assert_eq!(expr_shape("value?"), "(post? value)");
}

#[test]
fn test_member_access_binds_tightest() {
    assert_eq!(expr_shape("a.b + c.d"), "(+ (. a b) (. c d))");
    assert_eq!(expr_shape("-p.x"), "(- (. p x))");
}

#[test]
fn test_primaries() {
    assert_eq!(expr_shape("f(1, x + 2)"), "f(1, (+ x 2))");
    assert_eq!(expr_shape("f()"), "f()");
    assert_eq!(expr_shape("(1, 2)"), "tuple[1, 2]");
    assert_eq!(expr_shape("()"), "tuple[]");
    assert_eq!(expr_shape("[1, 2, 3]"), "array[1, 2, 3]");
    assert_eq!(expr_shape("default(i32)"), "default(i32)");
    assert_eq!(expr_shape("self.x"), "(. self x)");
}

#[test]
fn test_parse_variable_declaration() {
    let unit = parse_clean("declare x: i32 = 1 + 2;");

    let Stmt::VarDecl(decl) = &unit.body[0] else { panic!("expected a variable declaration") };
    assert_eq!(decl.name, "x");
    assert!(!decl.is_constant);
    assert_eq!(decl.explicit_type.as_ref().unwrap().to_string(), "i32");
    assert_eq!(shape(decl.value.as_ref().unwrap()), "(+ 1 2)");
}

#[test]
fn test_parse_const_declaration() {
    let unit = parse_clean("const PI = 3.14; declare const E: f64 = 2.71;");

    let Stmt::VarDecl(pi) = &unit.body[0] else { panic!("expected a variable declaration") };
    assert!(pi.is_constant);
    let Stmt::VarDecl(e) = &unit.body[1] else { panic!("expected a variable declaration") };
    assert!(e.is_constant);
}

#[test]
fn test_constant_without_value() {
    let (_, diagnostics) = parse_source("const x: i32;");
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics.iter().next().unwrap().message().contains("expected rhs in constant definition"));
}

#[test]
fn test_parse_function_declaration() {
    let unit = parse_clean("public static func add(a: i32, out b: i32) -> i32 { return a + b; }");

    let Stmt::FnDecl(func) = &unit.body[0] else { panic!("expected a function") };
    assert_eq!(func.name, "add");
    assert_eq!(func.parameters.len(), 2);
    assert!(!func.parameters[0].is_out);
    assert!(func.parameters[1].is_out);
    assert_eq!(func.return_type.as_ref().unwrap().to_string(), "i32");
    assert_eq!(func.modifiers, vec![Modifier::Public, Modifier::Static]);
    assert!(func.is_static());
    assert_eq!(func.body.body.len(), 1);
}

#[test]
fn test_doc_comment_attaches_to_declaration() {
    let unit = parse_clean("/// Adds things\nfunc add() {}");

    let Stmt::FnDecl(func) = &unit.body[0] else { panic!("expected a function") };
    assert_eq!(func.modifiers, vec![Modifier::Doc(String::from("Adds things"))]);
}

#[test]
fn test_conflicting_visibility_is_a_warning() {
    let (unit, diagnostics) = parse_source("public private func f() {}");

    assert_eq!(unit.body.len(), 1);
    assert_eq!(diagnostics.len(), 1);
    assert!(!diagnostics.has_errors());
    assert_eq!(diagnostics.iter().next().unwrap().get_error_name(), "InvalidModifierCombination");
}

#[test]
fn test_parse_struct_declaration() {
    let source = "
        struct Point {
            x: i32;
            const origin: bool = false;
            static count: i32;
            func length() -> f64 { return 0.0; }
            operator + (a: Point, b: Point) -> Point { return a; }
        }
    ";
    let unit = parse_clean(source);

    let Stmt::StructDecl(point) = &unit.body[0] else { panic!("expected a struct") };
    assert_eq!(point.name, "Point");
    assert_eq!(point.fields.len(), 3);
    assert!(point.fields[1].is_constant);
    assert!(point.fields[2].is_static());
    assert_eq!(point.methods.len(), 1);
    assert_eq!(point.methods[0].name, "length");
    assert_eq!(point.operators.len(), 1);
    assert_eq!(point.operators[0].operator, "+");
    assert_eq!(point.operators[0].function.parameters.len(), 2);
}

#[test]
fn test_parse_enum_and_union() {
    let unit = parse_clean("enum Color { Red, Green = 4, Blue, } union Value { i: i32; f: f64; }");

    let Stmt::EnumDecl(color) = &unit.body[0] else { panic!("expected an enum") };
    assert_eq!(color.variants.len(), 3);
    assert!(color.variants[1].value.is_some());

    let Stmt::UnionDecl(value) = &unit.body[1] else { panic!("expected a union") };
    assert_eq!(value.members.len(), 2);
}

#[test]
fn test_parse_module_and_import() {
    let unit = parse_clean("module geometry.shapes; import system.io;");

    let Stmt::Module(module) = &unit.body[0] else { panic!("expected a module") };
    assert_eq!(module.path, "geometry.shapes");
    let Stmt::Import(import) = &unit.body[1] else { panic!("expected an import") };
    assert_eq!(import.path, "system.io");
}

#[test]
fn test_parse_control_flow() {
    let source = "
        if x > 0 { print(\"positive\"); } else if x < 0 print(\"negative\"); else { }
        while x < 10 { x = x + 1; }
        do { x -= 1; } while x > 0;
        throw 1;
    ";
    let unit = parse_clean(source);

    let Stmt::If(if_stmt) = &unit.body[0] else { panic!("expected an if") };
    assert!(matches!(if_stmt.else_body.as_deref(), Some(Stmt::If(_))));
    assert!(matches!(unit.body[1], Stmt::While(_)));
    assert!(matches!(unit.body[2], Stmt::DoWhile(_)));
    assert!(matches!(unit.body[3], Stmt::Throw(_)));
}

#[test]
fn test_parse_loop_control() {
    let unit = parse_clean("while true { break; continue; }");

    let Stmt::While(while_stmt) = &unit.body[0] else { panic!("expected a while") };
    let Stmt::Block(block) = while_stmt.body.as_ref() else { panic!("expected a block") };
    assert!(matches!(block.body[0], Stmt::Break(_)));
    assert!(matches!(block.body[1], Stmt::Continue(_)));
}

#[test]
fn test_parse_types() {
    let unit = parse_clean("declare a: i32*[] = default; declare b: (i32, string) = (1, \"s\"); type P = geometry.Point;");

    let Stmt::VarDecl(a) = &unit.body[0] else { panic!("expected a variable declaration") };
    let ty = a.explicit_type.as_ref().unwrap();
    assert_eq!(ty.to_string(), "i32*[]");
    assert!(matches!(ty, TypeName::Array { .. }));

    let Stmt::VarDecl(b) = &unit.body[1] else { panic!("expected a variable declaration") };
    assert_eq!(b.explicit_type.as_ref().unwrap().to_string(), "(i32, string)");

    let Stmt::TypeAlias(alias) = &unit.body[2] else { panic!("expected a type alias") };
    assert_eq!(alias.name, "P");
    assert_eq!(alias.target.to_string(), "geometry.Point");
}

#[test]
fn test_missing_semicolon_recovers() {
    let (unit, diagnostics) = parse_source("declare x = 1 declare y = 2;");

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.iter().next().unwrap().message(), "Expected ';' but got 'declare'");
    assert!(!unit.body.is_empty());
}

#[test]
fn test_nested_declaration_is_reported() {
    let (unit, diagnostics) = parse_source("func f() { func g() {} }");

    assert_eq!(unit.body.len(), 1);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.iter().next().unwrap().get_error_name(), "DeclarationNotAllowed");
}

#[test]
fn test_garbage_terminates() {
    let (unit, diagnostics) = parse_source(") ) } ] , ; + = func ( { struct");

    assert!(diagnostics.has_errors());
    assert!(!unit.body.is_empty());
}

#[test]
fn test_unclosed_block_terminates() {
    let (unit, diagnostics) = parse_source("func f() { declare x = 1;");

    assert_eq!(unit.body.len(), 1);
    assert!(diagnostics.has_errors());
}

#[test]
fn test_empty_source() {
    let (unit, diagnostics) = parse_source("");
    assert!(unit.body.is_empty());
    assert!(diagnostics.is_empty());
}

fn error_names(diagnostics: &Diagnostics) -> Vec<&str> {
    diagnostics.iter().map(|d| d.get_error_name()).collect()
}

#[test]
fn test_nesting_below_limit_is_accepted() {
    let source = format!("{}1{};", "(".repeat(100), ")".repeat(100));
    let unit = parse_clean(&source);

    assert_eq!(unit.body.len(), 1);
}

#[test]
fn test_deeply_nested_groups_are_reported() {
    let depth = 100_000;
    let source = format!("{}1{};\ndeclare y = 2;", "(".repeat(depth), ")".repeat(depth));
    let (unit, diagnostics) = parse_source(&source);

    assert_eq!(error_names(&diagnostics), vec!["NestedTooDeeply"]);
    assert_eq!(diagnostics.iter().next().unwrap().message(), "expression nested too deeply");
    assert_eq!(unit.body.len(), 2);
    assert!(matches!(unit.body[1], Stmt::VarDecl(_)));
}

#[test]
fn test_deeply_nested_prefix_operators_are_reported() {
    let source = format!("declare x = {}1;", "- ".repeat(100_000));
    let (unit, diagnostics) = parse_source(&source);

    assert_eq!(error_names(&diagnostics), vec!["NestedTooDeeply"]);
    assert_eq!(unit.body.len(), 1);
}

#[test]
fn test_long_operator_chains_are_reported() {
    let binary = format!("declare x = 1{};", " + 1".repeat(100_000));
    let (_, diagnostics) = parse_source(&binary);
    assert_eq!(error_names(&diagnostics), vec!["NestedTooDeeply"]);

    let postfix = format!("x{};", "?".repeat(100_000));
    let (_, diagnostics) = parse_source(&postfix);
    assert_eq!(error_names(&diagnostics), vec!["NestedTooDeeply"]);
}

#[test]
fn test_deeply_nested_blocks_are_reported() {
    let depth = 100_000;
    let source = format!("{}{}", "{".repeat(depth), "}".repeat(depth));
    let (unit, diagnostics) = parse_source(&source);

    assert_eq!(error_names(&diagnostics), vec!["NestedTooDeeply"]);
    assert_eq!(unit.body.len(), 1);
}

#[test]
fn test_deeply_nested_types_are_reported() {
    let source = format!("declare x: i32{};", " *".repeat(100_000));
    let (unit, diagnostics) = parse_source(&source);

    assert_eq!(error_names(&diagnostics), vec!["NestedTooDeeply"]);
    assert_eq!(unit.body.len(), 1);
}
