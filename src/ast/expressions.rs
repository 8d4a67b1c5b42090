use crate::{lexer::tokens::TokenKind, Span};

use super::{ast::Expr, types::TypeName};

// LITERALS

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Integer,
    Hex,
    Binary,
    Float,
    String,
    Char,
    Bool,
    None,
}

/// Literal Expression
///
/// `value` holds the cooked token value: digits without separators or radix
/// prefix, decoded string contents, `true`/`false`.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    pub kind: LiteralKind,
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierExpr {
    pub name: String,
    pub span: Span,
}

// OPERATORS

/// Binary Expression
/// Covers arithmetic, comparison, logic, assignment and member access (`.`/`::`).
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Box<Expr>,
    pub operator: String,
    pub operator_kind: TokenKind,
    pub right: Box<Expr>,
    pub span: Span,
}

impl BinaryExpr {
    pub fn is_assignment(&self) -> bool {
        matches!(
            self.operator_kind,
            TokenKind::Assignment
                | TokenKind::PlusEquals
                | TokenKind::MinusEquals
                | TokenKind::StarEquals
                | TokenKind::SlashEquals
        )
    }

    pub fn is_member_access(&self) -> bool {
        matches!(self.operator_kind, TokenKind::Dot | TokenKind::ColonColon)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operator: String,
    pub operator_kind: TokenKind,
    pub operand: Box<Expr>,
    pub is_postfix: bool,
    pub span: Span,
}

// COMPOUND

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub arguments: Vec<Expr>,
    pub span: Span,
}

impl CallExpr {
    /// The called name when the callee is a plain identifier.
    pub fn callee_name(&self) -> Option<&str> {
        match self.callee.as_ref() {
            Expr::Identifier(identifier) => Some(&identifier.name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleExpr {
    pub elements: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpr {
    pub elements: Vec<Expr>,
    pub span: Span,
}

/// `default(T)`, or bare `default` when the type comes from context.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultExpr {
    pub ty: Option<TypeName>,
    pub span: Span,
}
