//! Constant folding of literal-only expressions.
//!
//! A subtree folds only when every leaf is a literal and every operation is
//! defined for the operand values. Anything else is left to regular
//! lowering, which keeps division by zero and overflow visible at runtime.

use std::cmp::Ordering;

use crate::{
    ast::{
        ast::Expr,
        expressions::{LiteralExpr, LiteralKind},
    },
    lexer::tokens::TokenKind,
    type_checker::types::{literal_type, Primitive, Type},
};

use super::ir::Constant;

#[derive(Debug, Clone, PartialEq)]
pub struct Folded {
    pub value: Constant,
    pub ty: Type,
}

impl Folded {
    fn new(value: Constant, ty: Type) -> Self {
        Folded { value, ty }
    }
}

/// Folds `expr` if it is an operator tree over literals. Bare literals are
/// not folded.
pub fn fold_constant(expr: &Expr) -> Option<Folded> {
    match expr {
        Expr::Binary(_) | Expr::Unary(_) => evaluate(expr),
        _ => None,
    }
}

/// Constant for a single literal.
pub fn literal_constant(literal: &LiteralExpr) -> Option<Folded> {
    let ty = literal_type(literal.kind, &literal.value)?;

    let value = match literal.kind {
        LiteralKind::Integer | LiteralKind::Hex | LiteralKind::Binary => {
            let radix = match literal.kind {
                LiteralKind::Hex => 16,
                LiteralKind::Binary => 2,
                _ => 10,
            };
            let raw = u64::from_str_radix(&literal.value, radix).ok()?;
            match i64::try_from(raw) {
                Ok(value) => Constant::Int(value),
                Err(_) => Constant::UInt(raw),
            }
        }
        LiteralKind::Float => Constant::Float(literal.value.parse().ok()?),
        LiteralKind::String => Constant::String(literal.value.clone()),
        LiteralKind::Char => Constant::Char(literal.value.chars().next().unwrap_or('\0')),
        LiteralKind::Bool => Constant::Bool(literal.value == "true"),
        LiteralKind::None => Constant::None,
    };

    Some(Folded::new(value, ty))
}

fn evaluate(expr: &Expr) -> Option<Folded> {
    match expr {
        Expr::Literal(literal) => literal_constant(literal),
        Expr::Binary(binary) if !binary.is_assignment() && !binary.is_member_access() => {
            let left = evaluate(&binary.left)?;
            let right = evaluate(&binary.right)?;
            fold_binary(binary.operator_kind, left, right)
        }
        Expr::Unary(unary) if !unary.is_postfix => {
            let operand = evaluate(&unary.operand)?;
            fold_unary(unary.operator_kind, operand)
        }
        _ => None,
    }
}

/// Keeps an integer result only if it fits the operand type.
fn fit(value: i64, ty: &Type) -> Option<Folded> {
    let fits = match ty {
        Type::Primitive(Primitive::I32) => i32::try_from(value).is_ok(),
        Type::Primitive(Primitive::I64) => true,
        _ => false,
    };
    fits.then(|| Folded::new(Constant::Int(value), ty.clone()))
}

fn fold_binary(operator: TokenKind, left: Folded, right: Folded) -> Option<Folded> {
    if left.ty != right.ty {
        return None;
    }

    let ty = left.ty;
    match (left.value, right.value) {
        (Constant::Int(l), Constant::Int(r)) => {
            let value = match operator {
                TokenKind::Plus => l.checked_add(r)?,
                TokenKind::Dash => l.checked_sub(r)?,
                TokenKind::Star => l.checked_mul(r)?,
                TokenKind::Slash => l.checked_div(r)?,
                TokenKind::Percent => l.checked_rem(r)?,
                TokenKind::Ampersand => l & r,
                TokenKind::Pipe => l | r,
                TokenKind::Caret => l ^ r,
                TokenKind::ShiftLeft => l.checked_shl(u32::try_from(r).ok()?)?,
                TokenKind::ShiftRight => l.checked_shr(u32::try_from(r).ok()?)?,
                _ => return compare(operator, l.cmp(&r)),
            };
            fit(value, &ty)
        }
        (Constant::Float(l), Constant::Float(r)) => {
            let value = match operator {
                TokenKind::Plus => l + r,
                TokenKind::Dash => l - r,
                TokenKind::Star => l * r,
                TokenKind::Slash if r != 0.0 => l / r,
                TokenKind::Slash => return None,
                _ => return compare(operator, l.partial_cmp(&r)?),
            };
            value.is_finite().then(|| Folded::new(Constant::Float(value), ty))
        }
        (Constant::Bool(l), Constant::Bool(r)) => {
            let value = match operator {
                TokenKind::And | TokenKind::Ampersand => l && r,
                TokenKind::Or | TokenKind::Pipe => l || r,
                TokenKind::Caret | TokenKind::NotEquals => l != r,
                TokenKind::Equals => l == r,
                _ => return None,
            };
            Some(Folded::new(Constant::Bool(value), Type::bool()))
        }
        _ => None,
    }
}

fn compare(operator: TokenKind, ordering: Ordering) -> Option<Folded> {
    let value = match operator {
        TokenKind::Equals => ordering == Ordering::Equal,
        TokenKind::NotEquals => ordering != Ordering::Equal,
        TokenKind::Less => ordering == Ordering::Less,
        TokenKind::LessEquals => ordering != Ordering::Greater,
        TokenKind::Greater => ordering == Ordering::Greater,
        TokenKind::GreaterEquals => ordering != Ordering::Less,
        _ => return None,
    };

    Some(Folded::new(Constant::Bool(value), Type::bool()))
}

fn fold_unary(operator: TokenKind, operand: Folded) -> Option<Folded> {
    match (operator, operand.value) {
        (TokenKind::Dash, Constant::Int(value)) => fit(value.checked_neg()?, &operand.ty),
        (TokenKind::Tilde, Constant::Int(value)) => fit(!value, &operand.ty),
        (TokenKind::Dash, Constant::Float(value)) => Some(Folded::new(Constant::Float(-value), operand.ty)),
        (TokenKind::Not, Constant::Bool(value)) => Some(Folded::new(Constant::Bool(!value), operand.ty)),
        _ => None,
    }
}
