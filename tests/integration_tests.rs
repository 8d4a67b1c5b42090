//! Integration tests for end-to-end compilation.
//!
//! These tests run complete documents through `compile_unit`: tokenization,
//! parsing, declaration collection, type deduction and lowering to IR.

use ircore::{
    compile_unit, compile_unit_with,
    compiler::{
        backend::{BackendRegistry, CompilationContext},
        compiler::{Compilation, FunctionIr, FunctionState, TOPLEVEL_NAME},
        ir::{Callee, InstructionKind},
    },
    config::CompilerOptions,
    display_diagnostic,
    errors::errors::Severity,
    scope::scope::ScopeItem,
    type_checker::types::Type,
    SourceDocument,
};

fn compile(source: &str) -> Compilation {
    compile_unit(&SourceDocument::new("test.lang", source))
}

fn messages(compilation: &Compilation) -> Vec<String> {
    compilation.diagnostics.iter().map(|d| d.message()).collect()
}

fn toplevel(compilation: &Compilation) -> &FunctionIr {
    compilation.function(TOPLEVEL_NAME).expect("top-level statements were lowered")
}

fn store_types(function: &FunctionIr) -> Vec<Type> {
    function
        .graph
        .instructions()
        .filter(|i| i.kind.is_store())
        .map(|i| i.ty.clone())
        .collect()
}

#[test]
fn test_declare_and_assign() {
    let compilation = compile("declare x: i32 = 1 + 2;\nx = 3;\n");
    assert!(compilation.diagnostics.is_empty(), "{:?}", messages(&compilation));

    let toplevel = toplevel(&compilation);
    let scope = compilation.scopes.get(toplevel.scope).unwrap();
    match scope.get("x") {
        Some(ScopeItem::Variable(variable)) => {
            assert_eq!(variable.ty, Type::i32());
            assert!(variable.mutable);
        }
        other => panic!("expected a variable, got {:?}", other),
    }

    assert_eq!(store_types(toplevel), vec![Type::i32(), Type::i32()]);
}

#[test]
fn test_assign_to_immutable() {
    let compilation = compile("const x: i32 = 1 + 2;\nx = 3;\n");

    assert_eq!(messages(&compilation), vec!["'x' is not mutable"]);
    assert_eq!(store_types(toplevel(&compilation)), vec![Type::i32()]);
}

#[test]
fn test_type_mismatch_reports_once_and_continues() {
    let compilation = compile("declare a = 1 + \"s\";\ndeclare b = 2;\nprintln(\"done\");\n");

    assert_eq!(compilation.diagnostics.len(), 1);
    assert_eq!(
        compilation.diagnostics.iter().next().unwrap().severity(),
        Severity::Error
    );

    let toplevel = toplevel(&compilation);
    assert_eq!(toplevel.state, FunctionState::Normal);
    assert_eq!(store_types(toplevel), vec![Type::i32()]);
    assert!(toplevel.graph.instructions().any(|i| matches!(
        &i.kind,
        InstructionKind::Call { callee: Callee::Builtin(name), .. } if name == "println"
    )));
}

#[test]
fn test_unresolved_name_suggests() {
    let compilation = compile("declare value = 1;\nprintln(valeu);\n");

    assert_eq!(
        messages(&compilation),
        vec!["valeu cannot be resolved. Did you mean 'value'?"]
    );
}

#[test]
fn test_no_matching_overload() {
    let compilation = compile("func f(a: i32) {}\nf(\"s\");\n");

    assert_eq!(
        messages(&compilation),
        vec!["Cannot find matching function 'f(string)'"]
    );
}

#[test]
fn test_unknown_type() {
    let compilation = compile("declare x: Foo = 1;\n");

    assert_eq!(messages(&compilation), vec!["Type 'Foo' not found"]);
}

#[test]
fn test_type_alias() {
    let compilation = compile("type Num = i32;\ndeclare n: Num = 4;\n");
    assert!(compilation.diagnostics.is_empty(), "{:?}", messages(&compilation));

    assert_eq!(toplevel(&compilation).locals[0].ty, Type::i32());
}

#[test]
fn test_self_outside_instance_method() {
    let source = "struct P {
    x: i32;
    static func f() -> i32 { return x; }
}
";
    let compilation = compile(source);

    assert_eq!(
        messages(&compilation),
        vec!["'self' can only be used inside an instance method"]
    );
    assert_eq!(compilation.function("f").unwrap().state, FunctionState::Abandoned);
}

#[test]
fn test_program() {
    let source = "module shapes;

/// A point on the grid.
public struct Point {
    x: i32;
    y: i32;

    func length() -> i32 {
        return x * x + y * y;
    }

    static func origin() -> Point {
        return default;
    }

    operator + (a: Point, b: Point) -> Point {
        return a;
    }
}

enum Direction { North, East = 2, South, West }

func fib(n: i32) -> i32 {
    if n < 2 {
        return n;
    }

    declare a = 0;
    declare b = 1;
    declare i = 1;
    while i < n {
        declare next = a + b;
        a = b;
        b = next;
        i += 1;
    }
    return b;
}

func describe(p: Point) -> string {
    declare total = p.length();
    if total == 0 {
        return \"origin\";
    } else {
        return \"somewhere\";
    }
}

declare p = Point.origin() + Point.origin();
declare d = Direction.East;
println(describe(p));
println(\"fib: \" + \"done\");
";
    let compilation = compile(source);
    assert!(compilation.diagnostics.is_empty(), "{:?}", messages(&compilation));

    assert_eq!(compilation.module_name, "shapes");
    assert_eq!(compilation.types.len(), 2);

    for name in ["length", "origin", "operator+", "fib", "describe"] {
        let function = compilation.function(name).unwrap();
        assert_eq!(function.state, FunctionState::Returned, "{}", name);
    }

    assert_eq!(compilation.function("fib").unwrap().owner, "shapes.FreeFunctions");
    assert_eq!(compilation.function("length").unwrap().owner, "Point");
    assert_eq!(toplevel(&compilation).state, FunctionState::Normal);

    let mut registry = BackendRegistry::with_defaults();
    let text = compilation
        .emit_with(&mut registry, "ir", &mut CompilationContext::new())
        .unwrap();
    let text = String::from_utf8(text).unwrap();
    assert!(text.starts_with("; module shapes"));
    assert!(text.contains("func Point::operator+(Point, Point) -> Point"));
}

#[test]
fn test_module_name_option() {
    let options = CompilerOptions::default().with_module_name("app");
    let compilation = compile_unit_with(&SourceDocument::new("test.lang", "func f() {}\n"), &options);

    assert_eq!(compilation.function("f").unwrap().owner, "app.FreeFunctions");
}

#[test]
fn test_missing_document() {
    let compilation = compile_unit(&SourceDocument::missing("gone.lang"));

    assert_eq!(compilation.diagnostics.len(), 1);
    assert!(compilation.has_errors());
    assert!(compilation.functions.is_empty());
}

#[test]
fn test_rendered_diagnostic() {
    let source = "declare x: i32 = \"s\";\n";
    let compilation = compile(source);
    let diagnostic = compilation.diagnostics.iter().next().unwrap();

    let rendered = display_diagnostic(diagnostic, source);
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[0], "error: Type mismatch. Expected i32, got string");
    assert_eq!(lines[1], "-> test.lang:1:18");
    assert!(lines[3].starts_with("1 | declare x: i32 = \"s\";"));
    assert!(lines[4].contains('^'));
}

#[test]
fn test_deep_nesting_is_reported_once() {
    let depth = 100_000;
    let source = format!(
        "declare x: i32 = {}1{};\ndeclare y: i32 = 2;\n",
        "(".repeat(depth),
        ")".repeat(depth)
    );
    let compilation = compile(&source);

    assert_eq!(messages(&compilation), vec!["expression nested too deeply"]);
    assert_eq!(toplevel(&compilation).state, FunctionState::Normal);
    assert_eq!(store_types(toplevel(&compilation)), vec![Type::i32()]);
}

#[test]
fn test_none_values_are_errors() {
    for source in [
        "println(print(\"x\"));\n",
        "func f() {}\nfunc g(a: object) {}\ng(f());\n",
        "declare t = (print(\"a\"), 1);\n",
        "throw print(\"a\");\n",
    ] {
        let compilation = compile(source);
        assert!(compilation.has_errors(), "{:?} compiled without errors", source);
        assert_ne!(toplevel(&compilation).state, FunctionState::Abandoned, "{:?}", source);
    }
}
