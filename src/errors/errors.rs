use std::{fmt::Display, rc::Rc};

use thiserror::Error;

use crate::Span;

/// How seriously a diagnostic affects the build.
///
/// The core never decides exit codes; callers map `Error` to a failed build and
/// `Warning` to advisory output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single compile-time problem attached to a source range.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    internal_error: ErrorImpl,
    span: Span,
    document: Rc<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, error_impl: ErrorImpl, span: Span, document: Rc<String>) -> Self {
        Diagnostic {
            severity,
            internal_error: error_impl,
            span,
            document,
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_span(&self) -> &Span {
        &self.span
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn message(&self) -> String {
        self.internal_error.to_string()
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnterminatedLiteral { .. } => "UnterminatedLiteral",
            ErrorImpl::UnclosedComment => "UnclosedComment",
            ErrorImpl::InvalidCharLiteral { .. } => "InvalidCharLiteral",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::EmptyFile => "EmptyFile",
            ErrorImpl::NestedTooDeeply => "NestedTooDeeply",
            ErrorImpl::InvalidModifierCombination { .. } => "InvalidModifierCombination",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::CannotResolve { .. } => "CannotResolve",
            ErrorImpl::TypeNotFound { .. } => "TypeNotFound",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::OperatorNotApplicable { .. } => "OperatorNotApplicable",
            ErrorImpl::CannotDereference { .. } => "CannotDereference",
            ErrorImpl::NotMutable { .. } => "NotMutable",
            ErrorImpl::InvalidAssignmentTarget => "InvalidAssignmentTarget",
            ErrorImpl::FunctionNotFound { .. } => "FunctionNotFound",
            ErrorImpl::NoMatchingOverload { .. } => "NoMatchingOverload",
            ErrorImpl::FunctionAlreadyDeclared { .. } => "FunctionAlreadyDeclared",
            ErrorImpl::TypeAlreadyDeclared { .. } => "TypeAlreadyDeclared",
            ErrorImpl::NonStaticCall { .. } => "NonStaticCall",
            ErrorImpl::MemberNotFound { .. } => "MemberNotFound",
            ErrorImpl::SelfOutsideMethod => "SelfOutsideMethod",
            ErrorImpl::LoopControlOutsideLoop { .. } => "LoopControlOutsideLoop",
            ErrorImpl::DeclarationNotAllowed { .. } => "DeclarationNotAllowed",
            ErrorImpl::UnreachableCode => "UnreachableCode",
            ErrorImpl::LoweringFailed { .. } => "LoweringFailed",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::CannotResolve {
                suggestion: Some(suggestion),
                ..
            }
            | ErrorImpl::FunctionNotFound {
                suggestion: Some(suggestion),
                ..
            } => ErrorTip::Suggestion(format!("did you mean `{}`?", suggestion)),
            ErrorImpl::UnexpectedToken { expected, .. } if expected == ";" => {
                ErrorTip::Suggestion(String::from("did you miss a semicolon?"))
            }
            ErrorImpl::NumberParseError { .. } => {
                ErrorTip::Suggestion(String::from("is it above the integer limit?"))
            }
            ErrorImpl::NotMutable { name } => ErrorTip::Suggestion(format!(
                "`{}` was declared `const`; declare it without `const` to allow assignment",
                name
            )),
            _ => ErrorTip::None,
        }
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised character {token:?}")]
    UnrecognisedToken { token: String },
    #[error("Unterminated {kind}-Literal")]
    UnterminatedLiteral { kind: String },
    #[error("Multiline comment is not closed")]
    UnclosedComment,
    #[error("char literal {literal} must hold exactly one character")]
    InvalidCharLiteral { literal: String },
    #[error("Expected '{expected}' but got '{found}'")]
    UnexpectedToken { expected: String, found: String },
    #[error("unexpected token '{token}': {message}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("the source document is empty")]
    EmptyFile,
    #[error("expression nested too deeply")]
    NestedTooDeeply,
    #[error("invalid modifier combination: {modifiers}")]
    InvalidModifierCombination { modifiers: String },
    #[error("variable {variable:?} already declared")]
    VariableAlreadyDeclared { variable: String },
    #[error("{}", suggest(&format!("{} cannot be resolved", name), suggestion))]
    CannotResolve {
        name: String,
        suggestion: Option<String>,
    },
    #[error("Type '{name}' not found")]
    TypeNotFound { name: String },
    #[error("Type mismatch. Expected {expected}, got {received}")]
    TypeMatchError { expected: String, received: String },
    #[error("operator '{operator}' cannot be applied to {operand}")]
    OperatorNotApplicable { operator: String, operand: String },
    #[error("Cannot dereference non pointer type {received}")]
    CannotDereference { received: String },
    #[error("'{name}' is not mutable")]
    NotMutable { name: String },
    #[error("the left-hand side of an assignment must be a variable, field or dereference")]
    InvalidAssignmentTarget,
    #[error("{}", suggest(&format!("Cannot find function '{}'", name), suggestion))]
    FunctionNotFound {
        name: String,
        suggestion: Option<String>,
    },
    #[error("Cannot find matching function '{name}({arguments})'")]
    NoMatchingOverload { name: String, arguments: String },
    #[error("function {function:?} already declared with the same parameters")]
    FunctionAlreadyDeclared { function: String },
    #[error("type {name:?} already declared")]
    TypeAlreadyDeclared { name: String },
    #[error("A non static function '{name}' cannot be called in a static function.")]
    NonStaticCall { name: String },
    #[error("type {owner} has no member '{member}'")]
    MemberNotFound { owner: String, member: String },
    #[error("'self' can only be used inside an instance method")]
    SelfOutsideMethod,
    #[error("'{keyword}' can only be used inside a loop")]
    LoopControlOutsideLoop { keyword: String },
    #[error("{kind} declarations are not allowed inside a function body")]
    DeclarationNotAllowed { kind: String },
    #[error("unreachable code")]
    UnreachableCode,
    #[error("could not lower '{function}': {reason}")]
    LoweringFailed { function: String, reason: String },
}

fn suggest(message: &str, suggestion: &Option<String>) -> String {
    match suggestion {
        Some(suggestion) => format!("{}. Did you mean '{}'?", message, suggestion),
        None => message.to_string(),
    }
}

/// Ordered, append-only list of diagnostics for one compilation unit.
///
/// Messages stay in discovery order; consumers that care about severity use
/// [`Diagnostics::sorted_by_severity`].
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    document: Rc<String>,
    messages: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(document: Rc<String>) -> Self {
        Diagnostics {
            document,
            messages: vec![],
        }
    }

    pub fn document(&self) -> Rc<String> {
        Rc::clone(&self.document)
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.messages.push(diagnostic);
    }

    pub fn error(&mut self, error_impl: ErrorImpl, span: Span) {
        let diagnostic = Diagnostic::new(Severity::Error, error_impl, span, Rc::clone(&self.document));
        self.push(diagnostic);
    }

    pub fn warning(&mut self, error_impl: ErrorImpl, span: Span) {
        let diagnostic = Diagnostic::new(Severity::Warning, error_impl, span, Rc::clone(&self.document));
        self.push(diagnostic);
    }

    /// Moves every message of `other` to the end of this list.
    pub fn append(&mut self, other: &mut Diagnostics) {
        self.messages.append(&mut other.messages);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(Diagnostic::is_error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Errors first, discovery order preserved within each severity.
    pub fn sorted_by_severity(&self) -> Vec<&Diagnostic> {
        let mut sorted: Vec<&Diagnostic> = self.messages.iter().collect();
        sorted.sort_by_key(|d| d.severity);
        sorted
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
