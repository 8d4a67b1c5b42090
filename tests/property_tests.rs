//! Property-based tests for the front end and lowering.
//!
//! These tests use proptest to check invariants that must hold for any input:
//! the lexer always terminates with `EOF`, the parser always returns, and
//! lowering never leaves a block open.

use std::rc::Rc;

use ircore::{
    compile_unit,
    compiler::{
        compiler::TOPLEVEL_NAME,
        ir::{Constant, InstructionKind},
    },
    lexer::{lexer::tokenize, tokens::TokenKind},
    parser::parser::parse,
    scope::scope::{ScopeArena, ScopeItem, VariableItem},
    type_checker::types::Type,
    SourceDocument,
};
use proptest::prelude::*;

fn file() -> Rc<String> {
    Rc::new(String::from("prop.lang"))
}

fn lexeme() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9_]{0,6}",
        "[1-9][0-9]{0,5}",
        prop::sample::select(vec![
            "+", "-", "*", "/", "==", "!=", "<=", ">=", "<", ">", "&&", "||", "=", "+=", "(", ")", "{", "}",
            "[", "]", ";", ",", ".", "::", "->",
        ])
        .prop_map(String::from),
    ]
}

// =============================================================================
// Lexer Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// Any input tokenizes, ends in exactly one `EOF`, and spans stay in bounds
    /// and in order.
    #[test]
    fn tokenize_is_total(source in "\\PC{0,120}") {
        let (tokens, _) = tokenize(&source, file());

        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::EOF));
        prop_assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::EOF).count(), 1);

        let mut last_start = 0;
        for token in &tokens {
            prop_assert!(token.span.start.offset <= token.span.end.offset, "{:?}", token);
            prop_assert!(token.span.end.offset <= source.len(), "{:?}", token);
            prop_assert!(token.span.start.offset >= last_start, "{:?}", token);
            last_start = token.span.start.offset;
        }
    }

    /// Well-formed lexemes separated by whitespace come back one token each,
    /// with their source text intact.
    #[test]
    fn tokenize_reproduces_text(lexemes in prop::collection::vec(lexeme(), 0..24)) {
        let source = lexemes.join(" ");
        let (tokens, diagnostics) = tokenize(&source, file());

        prop_assert!(diagnostics.is_empty());

        let texts: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::EOF)
            .map(|t| t.text.as_str())
            .collect();
        prop_assert_eq!(texts, lexemes.iter().map(String::as_str).collect::<Vec<&str>>());
    }
}

// =============================================================================
// Parser Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// The parser returns on arbitrary token soup.
    #[test]
    fn parse_terminates(lexemes in prop::collection::vec(lexeme(), 0..40)) {
        let source = lexemes.join(" ");
        let (tokens, diagnostics) = tokenize(&source, file());
        let (unit, _) = parse(tokens, diagnostics);

        prop_assert!(unit.span.start.offset <= unit.span.end.offset);
    }

    /// Compiling arbitrary input never panics and seals every block.
    #[test]
    fn compile_seals_all_blocks(source in "[a-z0-9(){};=+*/<>!&|.,: \n\"-]{0,80}") {
        let compilation = compile_unit(&SourceDocument::new("prop.lang", source));

        for function in &compilation.functions {
            for block in function.graph.blocks() {
                prop_assert!(block.terminator.is_some(), "{} left {} open", function.name, block.id);
            }
        }
    }
}

// =============================================================================
// Scope and Folding Properties
// =============================================================================

proptest! {
    /// An inner declaration shadows an outer one without touching it.
    #[test]
    fn inner_scope_shadows(name in "[a-z][a-z0-9]{0,8}", depth in 1usize..6) {
        let mut scopes = ScopeArena::new();
        let root = scopes.root();
        let outer = ScopeItem::Variable(VariableItem { ty: Type::i32(), mutable: true, slot: 0 });
        prop_assert!(scopes.declare(root, &name, outer.clone()));

        let mut scope = root;
        for _ in 0..depth {
            scope = scopes.child_scope(scope);
        }

        let inner = ScopeItem::Variable(VariableItem { ty: Type::string(), mutable: false, slot: 1 });
        prop_assert!(scopes.declare(scope, &name, inner.clone()));

        prop_assert_eq!(scopes.lookup_item(scope, &name), Some(&inner));
        prop_assert_eq!(scopes.lookup_item(root, &name), Some(&outer));
        prop_assert!(!scopes.declare(scope, &name, outer));
    }

    /// Literal arithmetic folds to a single constant.
    #[test]
    fn addition_folds(a in 0i64..100_000, b in 0i64..100_000) {
        let source = format!("declare x: i32 = {} + {};\n", a, b);
        let compilation = compile_unit(&SourceDocument::new("prop.lang", source));
        prop_assert!(compilation.diagnostics.is_empty());

        let toplevel = compilation.function(TOPLEVEL_NAME).unwrap();
        let constants: Vec<&Constant> = toplevel
            .graph
            .instructions()
            .filter_map(|i| match &i.kind {
                InstructionKind::Constant(constant) => Some(constant),
                _ => None,
            })
            .collect();
        let expected = Constant::Int(a + b);
        prop_assert_eq!(constants, vec![&expected]);
    }
}
