//! Static type deduction for expressions.
//!
//! The deducer walks an expression once and reports every semantic problem it
//! finds. A failed sub-expression deduces to [`Type::Unknown`], which poisons
//! everything above it without further diagnostics. The only hard failure is
//! an unresolvable callee, which is returned as [`Unresolvable`] so lowering
//! can abandon the statement list.
//!
//! The operator typing rules are free functions so lowering can recompute
//! instruction types without reporting anything twice.

use thiserror::Error;

use crate::{
    ast::{
        ast::Expr,
        expressions::{ArrayExpr, BinaryExpr, CallExpr, IdentifierExpr, LiteralExpr, UnaryExpr},
        types::TypeName,
    },
    errors::errors::{Diagnostics, ErrorImpl},
    lexer::tokens::TokenKind,
    scope::scope::{FunctionItem, ScopeArena, ScopeId, ScopeItem},
    Span,
};

use super::{
    overload::{resolve_overload, select_overload},
    suggest::suggest,
    types::{literal_type, Primitive, Signature, Type, TypeRegistry, PRIMITIVE_TYPES},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Unresolvable {
    #[error("cannot resolve callee '{name}'")]
    Callee { name: String },
}

/// Everything a deduction needs to know about where the expression sits.
#[derive(Debug, Clone, Copy)]
pub struct DeduceContext<'a> {
    pub scopes: &'a ScopeArena,
    pub types: &'a TypeRegistry,
    pub scope: ScopeId,
    /// Type of `self`, set only inside instance methods.
    pub self_type: Option<&'a str>,
    pub max_suggestion_distance: usize,
}

impl<'a> DeduceContext<'a> {
    pub fn with_scope(&self, scope: ScopeId) -> Self {
        DeduceContext { scope, ..*self }
    }

    /// If `expr` names a user type rather than a value, returns that type.
    pub fn static_owner(&self, expr: &Expr) -> Option<String> {
        let Expr::Identifier(identifier) = expr else {
            return None;
        };

        if self
            .scopes
            .lookup_item(self.scope, &identifier.name)
            .is_some_and(|item| item.value_type().is_some())
        {
            return None;
        }

        if self.types.contains(&identifier.name) {
            return Some(identifier.name.clone());
        }

        self.scopes
            .lookup_alias(self.scope, &identifier.name)
            .and_then(|alias| alias.named())
            .map(String::from)
    }

    /// Member `name` declared directly on the user type `owner`.
    pub fn member(&self, owner: &str, name: &str) -> Option<&'a ScopeItem> {
        let def = self.types.get(owner)?;
        self.scopes.get(def.scope)?.get(name)
    }

    /// User operator overload, looked up on the type of the first operand.
    pub fn operator_overload(&self, operator: &str, operands: &[Type]) -> Option<&'a Signature> {
        let owner = operands.first()?.named()?;
        let name = format!("operator{}", operator);
        match self.member(owner, &name)? {
            ScopeItem::Function(set) => select_overload(&set.overloads, &name, operands),
            _ => None,
        }
    }

    /// Resolves a written type name, reporting unknown names.
    pub fn resolve_type(&self, name: &TypeName, diagnostics: &mut Diagnostics) -> Type {
        match name {
            TypeName::Named { name, span } => {
                if let Some(primitive) = PRIMITIVE_TYPES.get(name.as_str()) {
                    Type::Primitive(*primitive)
                } else if let Some(alias) = self.scopes.lookup_alias(self.scope, name) {
                    alias.clone()
                } else if self.types.contains(name) {
                    Type::Named(name.clone())
                } else {
                    diagnostics.error(ErrorImpl::TypeNotFound { name: name.clone() }, *span);
                    Type::Unknown
                }
            }
            TypeName::Pointer { underlying, .. } => Type::Pointer(Box::new(self.resolve_type(underlying, diagnostics))),
            TypeName::Array { underlying, .. } => Type::Array(Box::new(self.resolve_type(underlying, diagnostics))),
            TypeName::Tuple { elements, .. } => {
                Type::Tuple(elements.iter().map(|e| self.resolve_type(e, diagnostics)).collect())
            }
            TypeName::Invalid { .. } => Type::Unknown,
        }
    }
}

/// Maps `+=` to `+` and so on.
pub fn compound_operator(kind: TokenKind) -> Option<TokenKind> {
    match kind {
        TokenKind::PlusEquals => Some(TokenKind::Plus),
        TokenKind::MinusEquals => Some(TokenKind::Dash),
        TokenKind::StarEquals => Some(TokenKind::Star),
        TokenKind::SlashEquals => Some(TokenKind::Slash),
        _ => None,
    }
}

pub fn is_string_concat(operator: TokenKind, left: &Type, right: &Type) -> bool {
    operator == TokenKind::Plus && left.is_string() && right.is_string()
}

/// Result type of a builtin binary operator, or `None` when it does not
/// apply to these operands. Both sides must have the same type.
pub fn binary_result(operator: TokenKind, left: &Type, right: &Type) -> Option<Type> {
    if is_string_concat(operator, left, right) {
        return Some(Type::string());
    }

    match operator {
        TokenKind::ShiftLeft | TokenKind::ShiftRight => {
            (left.is_integer() && right.is_integer()).then(|| left.clone())
        }
        _ if left != right => None,
        TokenKind::Plus | TokenKind::Dash | TokenKind::Star | TokenKind::Slash | TokenKind::Percent => {
            left.is_numeric().then(|| left.clone())
        }
        TokenKind::Equals | TokenKind::NotEquals => Some(Type::bool()),
        TokenKind::Less | TokenKind::LessEquals | TokenKind::Greater | TokenKind::GreaterEquals => {
            let ordered = left.is_numeric() || *left == Type::Primitive(Primitive::Char);
            ordered.then(Type::bool)
        }
        TokenKind::And | TokenKind::Or => left.is_bool().then(Type::bool),
        TokenKind::Ampersand | TokenKind::Pipe | TokenKind::Caret => {
            (left.is_integer() || left.is_bool()).then(|| left.clone())
        }
        _ => None,
    }
}

/// Result type of a builtin unary operator.
pub fn unary_result(operator: TokenKind, operand: &Type) -> Option<Type> {
    match operator {
        TokenKind::Dash => operand.is_numeric().then(|| operand.clone()),
        TokenKind::Not => operand.is_bool().then(Type::bool),
        TokenKind::Tilde => operand.is_integer().then(|| operand.clone()),
        TokenKind::Ampersand => Some(Type::Pointer(Box::new(operand.clone()))),
        TokenKind::Star => operand.pointee().cloned(),
        TokenKind::Question => Some(operand.clone()),
        _ => None,
    }
}

/// `default` without a type takes the type of whatever it is assigned to.
pub fn is_bare_default(expr: &Expr) -> bool {
    matches!(expr, Expr::Default(d) if d.ty.is_none())
}

pub struct TypeDeducer<'a, 'd> {
    context: DeduceContext<'a>,
    diagnostics: &'d mut Diagnostics,
}

impl<'a, 'd> TypeDeducer<'a, 'd> {
    pub fn new(context: DeduceContext<'a>, diagnostics: &'d mut Diagnostics) -> Self {
        TypeDeducer { context, diagnostics }
    }

    /// Deduces the static type of `expr`.
    ///
    /// # Returns
    ///
    /// The deduced type, [`Type::Unknown`] after a reported problem, or
    /// [`Unresolvable`] when a called function does not exist.
    pub fn deduce(&mut self, expr: &Expr) -> Result<Type, Unresolvable> {
        let ty = match expr {
            Expr::Literal(literal) => self.deduce_literal(literal),
            Expr::Identifier(identifier) => self.deduce_identifier(identifier),
            Expr::SelfRef(span) => self.deduce_self(*span),
            Expr::Binary(binary) if binary.is_assignment() => self.deduce_assignment(binary)?,
            Expr::Binary(binary) if binary.is_member_access() => self.deduce_member(binary)?,
            Expr::Binary(binary) => self.deduce_binary(binary)?,
            Expr::Unary(unary) => self.deduce_unary(unary)?,
            Expr::Call(call) => self.deduce_call(call)?,
            Expr::Tuple(tuple) => match self.deduce_elements(&tuple.elements)? {
                Some(elements) => Type::Tuple(elements),
                None => Type::Unknown,
            },
            Expr::Array(array) => self.deduce_array(array)?,
            Expr::Default(default) => match &default.ty {
                Some(ty) => self.context.resolve_type(ty, self.diagnostics),
                None => Type::object(),
            },
            Expr::Invalid(_) => Type::Unknown,
        };

        Ok(ty)
    }

    fn deduce_literal(&mut self, literal: &LiteralExpr) -> Type {
        match literal_type(literal.kind, &literal.value) {
            Some(ty) => ty,
            None => {
                self.diagnostics.error(
                    ErrorImpl::NumberParseError {
                        token: literal.value.clone(),
                    },
                    literal.span,
                );
                Type::Unknown
            }
        }
    }

    fn deduce_identifier(&mut self, identifier: &IdentifierExpr) -> Type {
        let scopes = self.context.scopes;

        match scopes.lookup_item(self.context.scope, &identifier.name) {
            Some(ScopeItem::Field(field)) if !field.is_static && self.context.self_type.is_none() => {
                self.diagnostics.error(ErrorImpl::SelfOutsideMethod, identifier.span);
                Type::Unknown
            }
            Some(item) if item.value_type().is_some() => item.value_type().cloned().unwrap_or(Type::Unknown),
            _ => {
                let candidates = scopes.names_where(self.context.scope, |item| item.value_type().is_some());
                let suggestion = suggest(&identifier.name, &candidates, self.context.max_suggestion_distance);
                self.diagnostics.error(
                    ErrorImpl::CannotResolve {
                        name: identifier.name.clone(),
                        suggestion,
                    },
                    identifier.span,
                );
                Type::Unknown
            }
        }
    }

    fn deduce_self(&mut self, span: Span) -> Type {
        match self.context.self_type {
            Some(owner) => Type::Named(owner.to_string()),
            None => {
                self.diagnostics.error(ErrorImpl::SelfOutsideMethod, span);
                Type::Unknown
            }
        }
    }

    fn report_binary(&mut self, operator: &str, left: &Type, right: &Type, span: Span) {
        if left != right {
            self.diagnostics.error(
                ErrorImpl::TypeMatchError {
                    expected: left.to_string(),
                    received: right.to_string(),
                },
                span,
            );
        } else {
            self.diagnostics.error(
                ErrorImpl::OperatorNotApplicable {
                    operator: operator.to_string(),
                    operand: left.to_string(),
                },
                span,
            );
        }
    }

    fn deduce_binary(&mut self, binary: &BinaryExpr) -> Result<Type, Unresolvable> {
        let left = self.deduce(&binary.left)?;
        let right = self.deduce(&binary.right)?;

        if left.is_unknown() || right.is_unknown() {
            return Ok(Type::Unknown);
        }

        let operands = [left, right];
        if let Some(overload) = self.context.operator_overload(&binary.operator, &operands) {
            return Ok(overload.return_type.clone());
        }

        let [left, right] = operands;
        match binary_result(binary.operator_kind, &left, &right) {
            Some(ty) => Ok(ty),
            None => {
                self.report_binary(&binary.operator, &left, &right, binary.span);
                Ok(Type::Unknown)
            }
        }
    }

    fn deduce_assignment(&mut self, binary: &BinaryExpr) -> Result<Type, Unresolvable> {
        let target = self.deduce(&binary.left)?;
        let value = self.deduce(&binary.right)?;

        if target.is_unknown() || value.is_unknown() {
            return Ok(Type::Unknown);
        }

        if let Some(operator) = compound_operator(binary.operator_kind) {
            let spelling = operator.spelling();
            let operands = [target.clone(), value.clone()];
            let result = match self.context.operator_overload(&spelling, &operands) {
                Some(overload) => Some(overload.return_type.clone()),
                None => binary_result(operator, &target, &value),
            };

            return match result {
                Some(result) if result.is_assignable_to(&target) => Ok(target),
                Some(result) => {
                    self.diagnostics.error(
                        ErrorImpl::TypeMatchError {
                            expected: target.to_string(),
                            received: result.to_string(),
                        },
                        binary.span,
                    );
                    Ok(Type::Unknown)
                }
                None => {
                    self.report_binary(&spelling, &target, &value, binary.span);
                    Ok(Type::Unknown)
                }
            };
        }

        if !is_bare_default(&binary.right) && !value.is_assignable_to(&target) {
            self.diagnostics.error(
                ErrorImpl::TypeMatchError {
                    expected: target.to_string(),
                    received: value.to_string(),
                },
                binary.span,
            );
            return Ok(Type::Unknown);
        }

        Ok(target)
    }

    fn deduce_unary(&mut self, unary: &UnaryExpr) -> Result<Type, Unresolvable> {
        let operand = self.deduce(&unary.operand)?;
        if operand.is_unknown() {
            return Ok(Type::Unknown);
        }

        if !unary.is_postfix {
            let operands = [operand.clone()];
            if let Some(overload) = self.context.operator_overload(&unary.operator, &operands) {
                return Ok(overload.return_type.clone());
            }
        }

        match unary_result(unary.operator_kind, &operand) {
            Some(ty) => Ok(ty),
            None if unary.operator_kind == TokenKind::Star => {
                self.diagnostics.error(
                    ErrorImpl::CannotDereference {
                        received: operand.to_string(),
                    },
                    unary.span,
                );
                Ok(Type::Unknown)
            }
            None => {
                self.diagnostics.error(
                    ErrorImpl::OperatorNotApplicable {
                        operator: unary.operator.clone(),
                        operand: operand.to_string(),
                    },
                    unary.span,
                );
                Ok(Type::Unknown)
            }
        }
    }

    /// Deduces tuple or array elements. Elements of type `none` are reported.
    ///
    /// # Returns
    ///
    /// `None` when an element is unknown or `none`.
    fn deduce_elements(&mut self, elements: &[Expr]) -> Result<Option<Vec<Type>>, Unresolvable> {
        let mut types = Vec::with_capacity(elements.len());
        let mut valid = true;

        for element in elements {
            let ty = self.deduce(element)?;
            if ty.is_void() {
                self.diagnostics.error(
                    ErrorImpl::TypeMatchError {
                        expected: Type::object().to_string(),
                        received: ty.to_string(),
                    },
                    *element.get_span(),
                );
                valid = false;
            }
            valid &= !ty.is_unknown();
            types.push(ty);
        }

        Ok(valid.then_some(types))
    }

    fn deduce_array(&mut self, array: &ArrayExpr) -> Result<Type, Unresolvable> {
        let Some(elements) = self.deduce_elements(&array.elements)? else {
            return Ok(Type::Unknown);
        };

        let Some(first) = elements.first() else {
            return Ok(Type::Array(Box::new(Type::object())));
        };

        if let Some(other) = elements.iter().find(|e| *e != first) {
            self.diagnostics.error(
                ErrorImpl::TypeMatchError {
                    expected: first.to_string(),
                    received: other.to_string(),
                },
                array.span,
            );
            return Ok(Type::Unknown);
        }

        Ok(Type::Array(Box::new(first.clone())))
    }

    fn deduce_arguments(&mut self, call: &CallExpr) -> Result<Option<Vec<Type>>, Unresolvable> {
        let arguments = call
            .arguments
            .iter()
            .map(|a| self.deduce(a))
            .collect::<Result<Vec<Type>, Unresolvable>>()?;

        if arguments.iter().any(Type::is_unknown) {
            return Ok(None);
        }

        Ok(Some(arguments))
    }

    fn unresolved_callee(&mut self, name: &str, candidates: &[String], span: Span) -> Unresolvable {
        let suggestion = suggest(name, candidates, self.context.max_suggestion_distance);
        self.diagnostics.error(
            ErrorImpl::FunctionNotFound {
                name: name.to_string(),
                suggestion,
            },
            span,
        );

        Unresolvable::Callee { name: name.to_string() }
    }

    /// Checks a chosen overload against the calling context.
    fn call_result(&mut self, signature: &Signature, span: Span) -> Type {
        let is_method = signature.owner.as_deref().is_some_and(|owner| self.context.types.contains(owner));
        if is_method && !signature.is_static && self.context.self_type.is_none() {
            self.diagnostics.error(
                ErrorImpl::NonStaticCall {
                    name: signature.name.clone(),
                },
                span,
            );
            return Type::Unknown;
        }

        signature.return_type.clone()
    }

    fn deduce_call(&mut self, call: &CallExpr) -> Result<Type, Unresolvable> {
        let scopes = self.context.scopes;

        let Some(name) = call.callee_name() else {
            return Err(self.unresolved_callee("<expression>", &[], *call.callee.get_span()));
        };

        let Some(set) = scopes.lookup::<FunctionItem>(self.context.scope, name) else {
            let candidates = scopes.names_where(self.context.scope, |item| matches!(item, ScopeItem::Function(_)));
            return Err(self.unresolved_callee(name, &candidates, call.span));
        };

        let Some(arguments) = self.deduce_arguments(call)? else {
            return Ok(Type::Unknown);
        };

        match resolve_overload(&set.overloads, name, &arguments, self.diagnostics, call.span) {
            Some(signature) => Ok(self.call_result(signature, call.span)),
            None => Ok(Type::Unknown),
        }
    }

    fn deduce_member(&mut self, binary: &BinaryExpr) -> Result<Type, Unresolvable> {
        if let Some(owner) = self.context.static_owner(&binary.left) {
            return self.deduce_type_member(&owner, &binary.right, true);
        }

        if binary.operator_kind == TokenKind::ColonColon {
            let name = match binary.left.as_ref() {
                Expr::Identifier(identifier) => identifier.name.clone(),
                _ => String::from("<expression>"),
            };
            self.diagnostics
                .error(ErrorImpl::TypeNotFound { name }, *binary.left.get_span());
            return Ok(Type::Unknown);
        }

        let left = self.deduce(&binary.left)?;
        if left.is_unknown() {
            return Ok(Type::Unknown);
        }

        match left.named() {
            Some(owner) => self.deduce_type_member(owner, &binary.right, false),
            None => {
                self.diagnostics.error(
                    ErrorImpl::MemberNotFound {
                        owner: left.to_string(),
                        member: member_name(&binary.right),
                    },
                    binary.span,
                );
                Ok(Type::Unknown)
            }
        }
    }

    fn deduce_type_member(&mut self, owner: &str, member: &Expr, is_static: bool) -> Result<Type, Unresolvable> {
        match member {
            Expr::Identifier(identifier) => match self.context.member(owner, &identifier.name) {
                Some(ScopeItem::Field(field)) if field.is_static || !is_static => Ok(field.ty.clone()),
                _ => {
                    self.diagnostics.error(
                        ErrorImpl::MemberNotFound {
                            owner: owner.to_string(),
                            member: identifier.name.clone(),
                        },
                        identifier.span,
                    );
                    Ok(Type::Unknown)
                }
            },
            Expr::Call(call) => {
                let name = call.callee_name().unwrap_or_default();
                let Some(ScopeItem::Function(set)) = self.context.member(owner, name) else {
                    let candidates = self.type_methods(owner);
                    return Err(self.unresolved_callee(&format!("{}.{}", owner, name), &candidates, call.span));
                };

                let Some(arguments) = self.deduce_arguments(call)? else {
                    return Ok(Type::Unknown);
                };

                let Some(signature) = resolve_overload(&set.overloads, name, &arguments, self.diagnostics, call.span)
                else {
                    return Ok(Type::Unknown);
                };

                if is_static && !signature.is_static {
                    self.diagnostics.error(
                        ErrorImpl::NonStaticCall {
                            name: signature.name.clone(),
                        },
                        call.span,
                    );
                    return Ok(Type::Unknown);
                }

                Ok(signature.return_type.clone())
            }
            other => {
                self.diagnostics.error(
                    ErrorImpl::MemberNotFound {
                        owner: owner.to_string(),
                        member: member_name(other),
                    },
                    *other.get_span(),
                );
                Ok(Type::Unknown)
            }
        }
    }

    fn type_methods(&self, owner: &str) -> Vec<String> {
        let Some(scope) = self.context.types.get(owner).and_then(|def| self.context.scopes.get(def.scope)) else {
            return vec![];
        };

        let mut names = scope
            .items()
            .filter(|(_, item)| matches!(item, ScopeItem::Function(_)))
            .map(|(name, _)| format!("{}.{}", owner, name))
            .collect::<Vec<String>>();
        names.sort();
        names
    }
}

fn member_name(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(identifier) => identifier.name.clone(),
        Expr::Call(call) => call.callee_name().unwrap_or("<expression>").to_string(),
        _ => String::from("<expression>"),
    }
}
