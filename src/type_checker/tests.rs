use std::rc::Rc;

use super::{
    deducer::{binary_result, DeduceContext, TypeDeducer, Unresolvable},
    overload::select_overload,
    suggest::{levenshtein_distance, suggest},
    types::{literal_type, Parameter, Primitive, Signature, Type, TypeDef, TypeKind, TypeRegistry},
};
use crate::{
    ast::{expressions::LiteralKind, types::TypeName},
    errors::errors::Diagnostics,
    lexer::{lexer::tokenize, stream::TokenStream, tokens::TokenKind},
    parser::{expr::parse_expr, parser::Parser},
    scope::scope::{FieldItem, FunctionItem, ScopeArena, ScopeId, ScopeItem, VariableItem},
    Span,
};

struct Fixture {
    scopes: ScopeArena,
    types: TypeRegistry,
    scope: ScopeId,
}

fn signature(name: &str, owner: Option<&str>, parameters: &[Type], return_type: Type, is_static: bool) -> Signature {
    Signature {
        name: name.to_string(),
        owner: owner.map(String::from),
        parameters: parameters
            .iter()
            .enumerate()
            .map(|(i, ty)| Parameter {
                name: format!("p{}", i),
                ty: ty.clone(),
                is_out: false,
            })
            .collect(),
        return_type,
        is_static,
    }
}

fn function(signatures: Vec<Signature>) -> ScopeItem {
    ScopeItem::Function(FunctionItem { overloads: signatures })
}

fn variable(scopes: &mut ScopeArena, scope: ScopeId, name: &str, ty: Type) {
    scopes.declare(
        scope,
        name,
        ScopeItem::Variable(VariableItem {
            ty,
            mutable: true,
            slot: 0,
        }),
    );
}

/// A module with `add(i32, i32)`, `log(object)`, a `Point` struct and a few locals.
fn fixture() -> Fixture {
    let mut scopes = ScopeArena::new();
    let mut types = TypeRegistry::new();
    let root = scopes.root();
    let point = Type::Named(String::from("Point"));

    scopes.declare(
        root,
        "add",
        function(vec![signature(
            "add",
            Some("main.FreeFunctions"),
            &[Type::i32(), Type::i32()],
            Type::i32(),
            true,
        )]),
    );

    scopes.declare(
        root,
        "log",
        function(vec![signature(
            "log",
            Some("main.FreeFunctions"),
            &[Type::object()],
            Type::void(),
            true,
        )]),
    );

    let point_scope = scopes.child_scope(root);
    types.register(TypeDef {
        name: String::from("Point"),
        kind: TypeKind::Struct,
        scope: point_scope,
        span: Span::synthetic(),
    });
    scopes.declare(
        point_scope,
        "x",
        ScopeItem::Field(FieldItem {
            ty: Type::i32(),
            mutable: true,
            is_static: false,
            owner: String::from("Point"),
        }),
    );
    scopes.declare(
        point_scope,
        "len",
        function(vec![signature("len", Some("Point"), &[], Type::i32(), false)]),
    );
    scopes.declare(
        point_scope,
        "origin",
        function(vec![signature("origin", Some("Point"), &[], point.clone(), true)]),
    );
    scopes.declare(
        point_scope,
        "operator+",
        function(vec![signature(
            "operator+",
            Some("Point"),
            &[point.clone(), point.clone()],
            point.clone(),
            true,
        )]),
    );

    let scope = scopes.child_scope(root);
    variable(&mut scopes, scope, "n", Type::i32());
    variable(&mut scopes, scope, "name", Type::string());
    variable(&mut scopes, scope, "flag", Type::bool());
    variable(&mut scopes, scope, "p", Type::Pointer(Box::new(Type::i32())));
    variable(&mut scopes, scope, "a", point);

    Fixture { scopes, types, scope }
}

fn deduce(fixture: &Fixture, source: &str) -> (Result<Type, Unresolvable>, Diagnostics) {
    let file = Rc::new(String::from("test.lang"));
    let (tokens, _) = tokenize(source, Rc::clone(&file));
    let mut parser = Parser::with_default_lookups(TokenStream::new(tokens, Diagnostics::new(Rc::clone(&file))));
    let expr = parse_expr(&mut parser, 0);
    assert!(parser.into_diagnostics().is_empty(), "{} did not parse cleanly", source);

    let context = DeduceContext {
        scopes: &fixture.scopes,
        types: &fixture.types,
        scope: fixture.scope,
        self_type: None,
        max_suggestion_distance: 3,
    };

    let mut diagnostics = Diagnostics::new(file);
    let ty = TypeDeducer::new(context, &mut diagnostics).deduce(&expr);
    (ty, diagnostics)
}

fn deduce_clean(source: &str) -> Type {
    let (ty, diagnostics) = deduce(&fixture(), source);
    let messages: Vec<String> = diagnostics.iter().map(|d| d.message()).collect();
    assert!(diagnostics.is_empty(), "unexpected diagnostics for {}: {:?}", source, messages);
    ty.unwrap()
}

fn deduce_error(source: &str) -> String {
    let (ty, diagnostics) = deduce(&fixture(), source);
    assert_eq!(ty, Ok(Type::Unknown), "{} should deduce to unknown", source);
    assert_eq!(diagnostics.len(), 1, "{} should report exactly once", source);
    let message = diagnostics.iter().next().unwrap().message();
    message
}

#[test]
fn test_literal_types() {
    assert_eq!(deduce_clean("1"), Type::i32());
    assert_eq!(deduce_clean("3000000000"), Type::Primitive(Primitive::I64));
    assert_eq!(deduce_clean("0xff"), Type::i32());
    assert_eq!(deduce_clean("1.5"), Type::Primitive(Primitive::F64));
    assert_eq!(deduce_clean("\"s\""), Type::string());
    assert_eq!(deduce_clean("'c'"), Type::Primitive(Primitive::Char));
    assert_eq!(deduce_clean("true"), Type::bool());
    assert_eq!(deduce_clean("none"), Type::object());
}

#[test]
fn test_literal_out_of_range() {
    assert_eq!(literal_type(LiteralKind::Integer, "18446744073709551616"), None);
    assert!(deduce_error("18446744073709551616").starts_with("error parsing number"));
}

#[test]
fn test_binary_requires_same_type() {
    assert_eq!(deduce_clean("n + 1"), Type::i32());
    assert_eq!(deduce_clean("n * 2 - 1"), Type::i32());
    assert_eq!(deduce_error("1 + \"s\""), "Type mismatch. Expected i32, got string");
}

#[test]
fn test_comparison_and_logic() {
    assert_eq!(deduce_clean("n < 2"), Type::bool());
    assert_eq!(deduce_clean("n == 2 && flag"), Type::bool());
    assert_eq!(deduce_clean("name != \"x\""), Type::bool());
    assert_eq!(deduce_error("flag && n"), "Type mismatch. Expected bool, got i32");
    assert_eq!(deduce_error("flag + flag"), "operator '+' cannot be applied to bool");
}

#[test]
fn test_string_concat() {
    assert_eq!(deduce_clean("name + \"!\""), Type::string());
}

#[test]
fn test_unknown_poisons_without_second_report() {
    assert_eq!(deduce_error("missing + \"s\""), "missing cannot be resolved");
}

#[test]
fn test_unresolved_name_suggestion() {
    assert_eq!(deduce_error("nme"), "nme cannot be resolved. Did you mean 'name'?");
}

#[test]
fn test_pointers() {
    assert_eq!(deduce_clean("&n"), Type::Pointer(Box::new(Type::i32())));
    assert_eq!(deduce_clean("*p"), Type::i32());
    assert_eq!(deduce_error("*n"), "Cannot dereference non pointer type i32");
}

#[test]
fn test_unary_operators() {
    assert_eq!(deduce_clean("-n"), Type::i32());
    assert_eq!(deduce_clean("!flag"), Type::bool());
    assert_eq!(deduce_clean("~n"), Type::i32());
    assert_eq!(deduce_error("!n"), "operator '!' cannot be applied to i32");
}

#[test]
fn test_calls() {
    assert_eq!(deduce_clean("add(1, 2)"), Type::i32());
    assert_eq!(deduce_error("add(1, \"s\")"), "Cannot find matching function 'add(i32, string)'");
    assert_eq!(deduce_error("add(1)"), "Cannot find matching function 'add(i32)'");
}

#[test]
fn test_unresolvable_callee() {
    let (ty, diagnostics) = deduce(&fixture(), "ad(1, 2)");

    assert_eq!(ty, Err(Unresolvable::Callee { name: String::from("ad") }));
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics.iter().next().unwrap().message(),
        "Cannot find function 'ad'. Did you mean 'add'?"
    );
}

#[test]
fn test_unresolvable_callee_inside_expression() {
    let (ty, _) = deduce(&fixture(), "1 + nothing()");
    assert!(ty.is_err());
}

#[test]
fn test_operator_overload() {
    assert_eq!(deduce_clean("a + a"), Type::Named(String::from("Point")));
    assert_eq!(deduce_error("a - a"), "operator '-' cannot be applied to Point");
}

#[test]
fn test_members() {
    assert_eq!(deduce_clean("a.x"), Type::i32());
    assert_eq!(deduce_clean("a.len()"), Type::i32());
    assert_eq!(deduce_clean("Point.origin()"), Type::Named(String::from("Point")));
    assert_eq!(deduce_clean("Point::origin().x"), Type::i32());
    assert_eq!(deduce_error("a.y"), "type Point has no member 'y'");
    assert_eq!(deduce_error("n.y"), "type i32 has no member 'y'");
}

#[test]
fn test_static_call_of_instance_method() {
    assert_eq!(
        deduce_error("Point::len()"),
        "A non static function 'len' cannot be called in a static function."
    );
}

#[test]
fn test_self_outside_method() {
    assert_eq!(deduce_error("self"), "'self' can only be used inside an instance method");
}

#[test]
fn test_assignment() {
    assert_eq!(deduce_clean("n = 4"), Type::i32());
    assert_eq!(deduce_clean("n += 4"), Type::i32());
    assert_eq!(deduce_clean("name += \"?\""), Type::string());
    assert_eq!(deduce_error("n = \"s\""), "Type mismatch. Expected i32, got string");
}

#[test]
fn test_collections() {
    assert_eq!(deduce_clean("[1, 2, 3]"), Type::Array(Box::new(Type::i32())));
    assert_eq!(deduce_clean("[]"), Type::Array(Box::new(Type::object())));
    assert_eq!(deduce_clean("(1, name)"), Type::Tuple(vec![Type::i32(), Type::string()]));
    assert_eq!(deduce_error("[1, \"s\"]"), "Type mismatch. Expected i32, got string");
}

#[test]
fn test_none_is_not_a_value() {
    assert!(Type::i32().is_assignable_to(&Type::object()));
    assert!(Type::void().is_assignable_to(&Type::void()));
    assert!(!Type::void().is_assignable_to(&Type::object()));

    assert_eq!(deduce_clean("log(n)"), Type::void());
    assert_eq!(deduce_error("log(log(n))"), "Cannot find matching function 'log(none)'");
    assert_eq!(deduce_error("(log(n), 1)"), "Type mismatch. Expected object, got none");
    assert_eq!(deduce_error("[1, log(n)]"), "Type mismatch. Expected object, got none");
}

#[test]
fn test_default() {
    assert_eq!(deduce_clean("default(i64)"), Type::Primitive(Primitive::I64));
    assert_eq!(deduce_clean("default"), Type::object());
    assert_eq!(deduce_error("default(Nope)"), "Type 'Nope' not found");
}

#[test]
fn test_resolve_type_with_alias() {
    let mut fixture = fixture();
    fixture.scopes.declare_alias(fixture.scope, "Id", Type::i32());

    let context = DeduceContext {
        scopes: &fixture.scopes,
        types: &fixture.types,
        scope: fixture.scope,
        self_type: None,
        max_suggestion_distance: 3,
    };
    let mut diagnostics = Diagnostics::default();

    let name = TypeName::Array {
        underlying: Box::new(TypeName::named("Id", Span::synthetic())),
        span: Span::synthetic(),
    };
    assert_eq!(
        context.resolve_type(&name, &mut diagnostics),
        Type::Array(Box::new(Type::i32()))
    );
    assert_eq!(
        context.resolve_type(&TypeName::named("Point", Span::synthetic()), &mut diagnostics),
        Type::Named(String::from("Point"))
    );
    assert!(diagnostics.is_empty());
}

#[test]
fn test_binary_result_table() {
    let i32 = Type::i32();
    let i64 = Type::Primitive(Primitive::I64);

    assert_eq!(binary_result(TokenKind::Plus, &i32, &i64), None);
    assert_eq!(binary_result(TokenKind::ShiftLeft, &i64, &i32), Some(i64.clone()));
    assert_eq!(binary_result(TokenKind::Percent, &i64, &i64), Some(i64));
    assert_eq!(binary_result(TokenKind::Pipe, &Type::bool(), &Type::bool()), Some(Type::bool()));
}

#[test]
fn test_overload_prefers_specific_parameters() {
    let candidates = vec![
        Signature::builtin("print", &[Type::object()]),
        Signature::builtin("print", &[Type::string()]),
    ];

    let chosen = select_overload(&candidates, "print", &[Type::string()]).unwrap();
    assert_eq!(chosen.parameter_types(), vec![Type::string()]);

    let chosen = select_overload(&candidates, "print", &[Type::i32()]).unwrap();
    assert_eq!(chosen.parameter_types(), vec![Type::object()]);

    assert!(select_overload(&candidates, "print", &[]).is_none());
    assert!(select_overload(&candidates, "println", &[Type::string()]).is_none());
    assert!(select_overload(&candidates, "print", &[Type::void()]).is_none());
}

#[test]
fn test_overload_has_no_numeric_widening() {
    let candidates = vec![Signature::builtin("wide", &[Type::Primitive(Primitive::I64)])];
    assert!(select_overload(&candidates, "wide", &[Type::i32()]).is_none());
}

#[test]
fn test_levenshtein() {
    assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    assert_eq!(levenshtein_distance("", "abc"), 3);
    assert_eq!(levenshtein_distance("same", "same"), 0);
    assert_eq!(levenshtein_distance("größe", "grösse"), 2);
}

#[test]
fn test_suggest() {
    let candidates = vec![String::from("counter"), String::from("count"), String::from("total")];

    assert_eq!(suggest("coutn", &candidates, 3), Some(String::from("count")));
    assert_eq!(suggest("count", &candidates, 3), Some(String::from("counter")));
    assert_eq!(suggest("zzzzzzz", &candidates, 3), None);
}
