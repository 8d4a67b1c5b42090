//! Unit tests for diagnostics.
//!
//! This module contains tests for the message catalog, severities and the
//! ordered diagnostics list.

use crate::errors::errors::{Diagnostics, ErrorImpl, ErrorTip, Severity};
use crate::{Position, Span};
use std::rc::Rc;

fn diagnostics() -> Diagnostics {
    Diagnostics::new(Rc::new("test.lang".to_string()))
}

fn span_at(offset: usize) -> Span {
    Span::new(Position::new(offset, 1, offset + 1), Position::new(offset + 1, 1, offset + 2))
}

#[test]
fn test_error_creation() {
    let mut list = diagnostics();
    list.error(ErrorImpl::UnrecognisedToken { token: "@".to_string() }, span_at(10));

    let diagnostic = list.iter().next().unwrap();
    assert_eq!(diagnostic.get_error_name(), "UnrecognisedToken");
    assert_eq!(diagnostic.severity(), Severity::Error);
    assert_eq!(diagnostic.get_span().start.offset, 10);
    assert_eq!(diagnostic.document(), "test.lang");
}

#[test]
fn test_unexpected_token_message() {
    let mut list = diagnostics();
    list.error(
        ErrorImpl::UnexpectedToken {
            expected: ")".to_string(),
            found: ";".to_string(),
        },
        span_at(0),
    );

    let diagnostic = list.iter().next().unwrap();
    assert_eq!(diagnostic.message(), "Expected ')' but got ';'");
}

#[test]
fn test_type_mismatch_message() {
    let error = ErrorImpl::TypeMatchError {
        expected: "i32".to_string(),
        received: "string".to_string(),
    };

    assert_eq!(error.to_string(), "Type mismatch. Expected i32, got string");
}

#[test]
fn test_cannot_resolve_with_suggestion() {
    let error = ErrorImpl::CannotResolve {
        name: "conut".to_string(),
        suggestion: Some("count".to_string()),
    };

    assert_eq!(error.to_string(), "conut cannot be resolved. Did you mean 'count'?");

    let error = ErrorImpl::CannotResolve {
        name: "zzz".to_string(),
        suggestion: None,
    };

    assert_eq!(error.to_string(), "zzz cannot be resolved");
}

#[test]
fn test_function_not_found_message() {
    let error = ErrorImpl::FunctionNotFound {
        name: "pritn".to_string(),
        suggestion: Some("print".to_string()),
    };

    assert_eq!(error.to_string(), "Cannot find function 'pritn'. Did you mean 'print'?");
}

#[test]
fn test_unterminated_literal_message() {
    let error = ErrorImpl::UnterminatedLiteral { kind: "String".to_string() };
    assert_eq!(error.to_string(), "Unterminated String-Literal");
}

#[test]
fn test_non_static_call_message() {
    let error = ErrorImpl::NonStaticCall { name: "area".to_string() };
    assert_eq!(
        error.to_string(),
        "A non static function 'area' cannot be called in a static function."
    );
}

#[test]
fn test_semicolon_tip() {
    let mut list = diagnostics();
    list.error(
        ErrorImpl::UnexpectedToken {
            expected: ";".to_string(),
            found: "}".to_string(),
        },
        span_at(3),
    );

    let diagnostic = list.iter().next().unwrap();
    match diagnostic.get_tip() {
        ErrorTip::Suggestion(msg) => assert!(msg.contains("semicolon")),
        ErrorTip::None => panic!("Expected a suggestion tip"),
    }
}

#[test]
fn test_no_tip_for_plain_errors() {
    let mut list = diagnostics();
    list.error(ErrorImpl::UnclosedComment, span_at(0));

    let diagnostic = list.iter().next().unwrap();
    assert!(matches!(diagnostic.get_tip(), ErrorTip::None));
}

#[test]
fn test_has_errors_ignores_warnings() {
    let mut list = diagnostics();
    list.warning(ErrorImpl::UnreachableCode, span_at(0));

    assert!(!list.has_errors());
    assert_eq!(list.warnings().count(), 1);

    list.error(ErrorImpl::EmptyFile, Span::synthetic());
    assert!(list.has_errors());
    assert_eq!(list.errors().count(), 1);
}

#[test]
fn test_discovery_order_is_kept() {
    let mut list = diagnostics();
    list.warning(ErrorImpl::UnreachableCode, span_at(0));
    list.error(ErrorImpl::UnclosedComment, span_at(5));
    list.warning(
        ErrorImpl::InvalidModifierCombination {
            modifiers: "public private".to_string(),
        },
        span_at(9),
    );

    let names: Vec<&str> = list.iter().map(|d| d.get_error_name()).collect();
    assert_eq!(names, vec!["UnreachableCode", "UnclosedComment", "InvalidModifierCombination"]);

    let sorted: Vec<&str> = list.sorted_by_severity().iter().map(|d| d.get_error_name()).collect();
    assert_eq!(sorted, vec!["UnclosedComment", "UnreachableCode", "InvalidModifierCombination"]);
}

#[test]
fn test_append_moves_messages() {
    let mut first = diagnostics();
    let mut second = diagnostics();
    first.error(ErrorImpl::UnclosedComment, span_at(0));
    second.error(ErrorImpl::SelfOutsideMethod, span_at(1));

    first.append(&mut second);
    assert_eq!(first.len(), 2);
    assert!(second.is_empty());
}
