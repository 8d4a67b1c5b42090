use std::fmt::Display;

use crate::Span;

/// A type as written in source. Resolution to a semantic type happens during
/// lowering.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeName {
    /// `i32`, `Point`, `geometry.Point`
    Named { name: String, span: Span },
    Pointer { underlying: Box<TypeName>, span: Span },
    Array { underlying: Box<TypeName>, span: Span },
    Tuple { elements: Vec<TypeName>, span: Span },
    Invalid { span: Span },
}

impl TypeName {
    pub fn named(name: &str, span: Span) -> Self {
        TypeName::Named {
            name: name.to_string(),
            span,
        }
    }

    pub fn get_span(&self) -> &Span {
        match self {
            TypeName::Named { span, .. }
            | TypeName::Pointer { span, .. }
            | TypeName::Array { span, .. }
            | TypeName::Tuple { span, .. }
            | TypeName::Invalid { span } => span,
        }
    }
}

impl Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeName::Named { name, .. } => write!(f, "{}", name),
            TypeName::Pointer { underlying, .. } => write!(f, "{}*", underlying),
            TypeName::Array { underlying, .. } => write!(f, "{}[]", underlying),
            TypeName::Tuple { elements, .. } => {
                let inner = elements.iter().map(|e| e.to_string()).collect::<Vec<String>>();
                write!(f, "({})", inner.join(", "))
            }
            TypeName::Invalid { .. } => write!(f, "<invalid>"),
        }
    }
}
