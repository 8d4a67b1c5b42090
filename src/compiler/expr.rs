//! Expression implementors.
//!
//! Implementors are tried in registration order and the first one whose
//! `accepts` matches lowers the expression. `call` comes last because it
//! matches the widest set of expressions.
//!
//! Lowering runs only on expressions the deducer has already accepted, so the
//! types here are recomputed silently. A lookup that fails anyway abandons the
//! statement list.

use crate::{
    ast::{
        ast::Expr,
        expressions::{BinaryExpr, CallExpr, UnaryExpr},
    },
    errors::errors::{Diagnostics, ErrorImpl},
    lexer::tokens::TokenKind,
    scope::scope::{FunctionItem, ScopeId, ScopeItem},
    type_checker::{
        deducer::{binary_result, compound_operator, is_string_concat, unary_result},
        overload::select_overload,
        types::{Signature, Type},
    },
};

use super::{
    compiler::{Compiler, FunctionBuilder, LowerError, Value},
    fold::literal_constant,
    ir::{BlockId, Callee, InstructionKind, Place, ValueTag},
};

/// Intrinsic called for `string + string`.
pub const STRING_CONCAT: &str = "string.Concat";

pub fn register_expr_implementors(compiler: &mut Compiler) {
    compiler.expr_implementor("tuple", |_, e, _| matches!(e, Expr::Tuple(_)), lower_tuple);
    compiler.expr_implementor("array", |_, e, _| matches!(e, Expr::Array(_)), lower_array);
    compiler.expr_implementor("default", |_, e, _| matches!(e, Expr::Default(_)), lower_default);
    compiler.expr_implementor(
        "address-of",
        |_, e, _| is_prefix(e, TokenKind::Ampersand),
        lower_address_of,
    );
    compiler.expr_implementor(
        "unary",
        |_, e, _| matches!(e, Expr::Unary(_)) && !is_prefix(e, TokenKind::Star),
        lower_unary,
    );
    compiler.expr_implementor(
        "assignment",
        |_, e, _| matches!(e, Expr::Binary(b) if b.is_assignment()),
        lower_assignment,
    );
    compiler.expr_implementor(
        "binary",
        |_, e, _| matches!(e, Expr::Binary(b) if !b.is_assignment() && !b.is_member_access()),
        lower_binary,
    );
    compiler.expr_implementor("identifier", |_, e, _| matches!(e, Expr::Identifier(_)), lower_load);
    compiler.expr_implementor("self", |_, e, _| matches!(e, Expr::SelfRef(_)), lower_self);
    compiler.expr_implementor("pointer", |_, e, _| is_prefix(e, TokenKind::Star), lower_load);
    compiler.expr_implementor("constant", |_, e, _| matches!(e, Expr::Literal(_)), lower_constant);
    compiler.expr_implementor("static-call", is_static_access, lower_member);
    compiler.expr_implementor(
        "member",
        |_, e, _| matches!(e, Expr::Binary(b) if b.is_member_access()),
        lower_member,
    );
    compiler.expr_implementor("call", |_, e, _| matches!(e, Expr::Call(_)), lower_call);
}

fn is_prefix(expr: &Expr, operator: TokenKind) -> bool {
    matches!(expr, Expr::Unary(u) if !u.is_postfix && u.operator_kind == operator)
}

fn is_static_access(compiler: &Compiler, expr: &Expr, scope: ScopeId) -> bool {
    match expr {
        Expr::Binary(binary) if binary.is_member_access() => {
            compiler.context(scope).static_owner(&binary.left).is_some()
        }
        _ => false,
    }
}

/// A resolved storage location.
#[derive(Debug, Clone)]
pub struct PlaceInfo {
    pub place: Place,
    pub ty: Type,
    pub mutable: bool,
    pub name: String,
}

fn lower_all(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    expressions: &[Expr],
    block: BlockId,
    scope: ScopeId,
) -> Result<(Vec<ValueTag>, Vec<Type>), LowerError> {
    let mut tags = vec![];
    let mut types = vec![];

    for expr in expressions {
        let value = compiler.lower_expression(function, expr, block, scope)?;
        tags.push(value.tag()?);
        types.push(value.ty);
    }

    Ok((tags, types))
}

fn load_self(function: &mut FunctionBuilder, block: BlockId) -> Result<ValueTag, LowerError> {
    let owner = function.self_type.clone().ok_or(LowerError::Abandoned)?;
    function.emit(block, Type::Named(owner), InstructionKind::LoadSelf)?.tag()
}

/// Resolves `expr` to something that can be stored to.
///
/// # Returns
///
/// `None` when `expr` does not denote a storage location.
pub fn lower_place(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    expr: &Expr,
    block: BlockId,
    scope: ScopeId,
) -> Result<Option<PlaceInfo>, LowerError> {
    match expr {
        Expr::Identifier(identifier) => {
            let name = identifier.name.clone();
            let info = match compiler.scopes.lookup_item(scope, &name).cloned() {
                Some(ScopeItem::Variable(variable)) => PlaceInfo {
                    place: Place::Local(variable.slot),
                    ty: variable.ty,
                    mutable: variable.mutable,
                    name,
                },
                Some(ScopeItem::Parameter(parameter)) => PlaceInfo {
                    place: Place::Argument(parameter.index),
                    ty: parameter.ty,
                    mutable: parameter.is_out,
                    name,
                },
                Some(ScopeItem::Field(field)) => {
                    let object = if field.is_static {
                        None
                    } else {
                        Some(load_self(function, block)?)
                    };
                    PlaceInfo {
                        place: Place::Field {
                            object,
                            owner: field.owner,
                            name: name.clone(),
                        },
                        ty: field.ty,
                        mutable: field.mutable,
                        name,
                    }
                }
                _ => return Ok(None),
            };
            Ok(Some(info))
        }
        Expr::Unary(unary) if !unary.is_postfix && unary.operator_kind == TokenKind::Star => {
            let pointer = compiler.lower_expression(function, &unary.operand, block, scope)?;
            let ty = pointer.ty.pointee().cloned().ok_or(LowerError::Abandoned)?;
            Ok(Some(PlaceInfo {
                place: Place::Indirect(pointer.tag()?),
                ty,
                mutable: true,
                name: String::from("<pointer>"),
            }))
        }
        Expr::Binary(binary) if binary.is_member_access() => {
            let Expr::Identifier(member) = binary.right.as_ref() else {
                return Ok(None);
            };

            let (owner, object) = member_owner(compiler, function, binary, block, scope)?;
            let field = match compiler.context(scope).member(&owner, &member.name) {
                Some(ScopeItem::Field(field)) => field.clone(),
                _ => return Ok(None),
            };

            Ok(Some(PlaceInfo {
                place: Place::Field {
                    object: if field.is_static { None } else { object },
                    owner,
                    name: member.name.clone(),
                },
                ty: field.ty,
                mutable: field.mutable,
                name: member.name.clone(),
            }))
        }
        _ => Ok(None),
    }
}

fn lower_tuple(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    expr: &Expr,
    block: BlockId,
    scope: ScopeId,
) -> Result<Value, LowerError> {
    let Expr::Tuple(tuple) = expr else {
        return Err(LowerError::Abandoned);
    };

    let (tags, types) = lower_all(compiler, function, &tuple.elements, block, scope)?;
    function.emit(block, Type::Tuple(types), InstructionKind::NewTuple(tags))
}

fn lower_array(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    expr: &Expr,
    block: BlockId,
    scope: ScopeId,
) -> Result<Value, LowerError> {
    let Expr::Array(array) = expr else {
        return Err(LowerError::Abandoned);
    };

    let (tags, types) = lower_all(compiler, function, &array.elements, block, scope)?;
    let element = types.into_iter().next().unwrap_or_else(Type::object);
    function.emit(block, Type::Array(Box::new(element)), InstructionKind::NewArray(tags))
}

fn lower_default(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    expr: &Expr,
    block: BlockId,
    scope: ScopeId,
) -> Result<Value, LowerError> {
    let Expr::Default(default) = expr else {
        return Err(LowerError::Abandoned);
    };

    // Already reported during deduction.
    let ty = match &default.ty {
        Some(name) => compiler.context(scope).resolve_type(name, &mut Diagnostics::default()),
        None => Type::object(),
    };
    function.emit(block, ty, InstructionKind::Default)
}

fn lower_address_of(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    expr: &Expr,
    block: BlockId,
    scope: ScopeId,
) -> Result<Value, LowerError> {
    let Expr::Unary(unary) = expr else {
        return Err(LowerError::Abandoned);
    };

    let place = match lower_place(compiler, function, &unary.operand, block, scope)? {
        Some(info) => (info.place, info.ty),
        None => {
            let value = compiler.lower_expression(function, &unary.operand, block, scope)?;
            let slot = function.add_local("<temp>", value.ty.clone(), true);
            function.emit(
                block,
                value.ty.clone(),
                InstructionKind::Store {
                    place: Place::Local(slot),
                    value: value.tag()?,
                },
            )?;
            (Place::Local(slot), value.ty)
        }
    };

    let (place, ty) = place;
    function.emit(block, Type::Pointer(Box::new(ty)), InstructionKind::AddressOf(place))
}

/// Loads from an identifier, a dereferenced pointer or a field.
fn lower_load(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    expr: &Expr,
    block: BlockId,
    scope: ScopeId,
) -> Result<Value, LowerError> {
    let info = lower_place(compiler, function, expr, block, scope)?.ok_or(LowerError::Abandoned)?;
    function.emit(block, info.ty, InstructionKind::Load(info.place))
}

fn call_signature(
    function: &mut FunctionBuilder,
    block: BlockId,
    signature: Signature,
    receiver: Option<ValueTag>,
    arguments: Vec<ValueTag>,
) -> Result<Value, LowerError> {
    let callee = match &signature.owner {
        None => Callee::Builtin(signature.name.clone()),
        Some(owner) => Callee::Function {
            owner: owner.clone(),
            name: signature.name.clone(),
        },
    };

    function.emit(
        block,
        signature.return_type,
        InstructionKind::Call {
            callee,
            receiver,
            arguments,
        },
    )
}

fn lower_unary(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    expr: &Expr,
    block: BlockId,
    scope: ScopeId,
) -> Result<Value, LowerError> {
    let Expr::Unary(unary) = expr else {
        return Err(LowerError::Abandoned);
    };

    let operand = compiler.lower_expression(function, &unary.operand, block, scope)?;

    if !unary.is_postfix {
        let operands = [operand.ty.clone()];
        if let Some(overload) = compiler.context(scope).operator_overload(&unary.operator, &operands).cloned() {
            return call_signature(function, block, overload, None, vec![operand.tag()?]);
        }
    }

    lower_builtin_unary(function, unary, operand, block)
}

fn lower_builtin_unary(
    function: &mut FunctionBuilder,
    unary: &UnaryExpr,
    operand: Value,
    block: BlockId,
) -> Result<Value, LowerError> {
    if unary.operator_kind == TokenKind::Question {
        return Ok(operand);
    }

    let ty = unary_result(unary.operator_kind, &operand.ty).ok_or(LowerError::Abandoned)?;
    function.emit(
        block,
        ty,
        InstructionKind::Unary {
            operator: unary.operator.clone(),
            operand: operand.tag()?,
        },
    )
}

/// Lowers a binary operator on two lowered operands: a user overload, then
/// string concatenation, then the builtin instruction.
#[allow(clippy::too_many_arguments)]
fn lower_operator(
    compiler: &Compiler,
    function: &mut FunctionBuilder,
    operator: TokenKind,
    spelling: &str,
    left: Value,
    right: Value,
    block: BlockId,
    scope: ScopeId,
) -> Result<Value, LowerError> {
    let operands = [left.ty.clone(), right.ty.clone()];
    if let Some(overload) = compiler.context(scope).operator_overload(spelling, &operands).cloned() {
        return call_signature(function, block, overload, None, vec![left.tag()?, right.tag()?]);
    }

    if is_string_concat(operator, &left.ty, &right.ty) {
        return function.emit(
            block,
            Type::string(),
            InstructionKind::Call {
                callee: Callee::Intrinsic(STRING_CONCAT.to_string()),
                receiver: None,
                arguments: vec![left.tag()?, right.tag()?],
            },
        );
    }

    let ty = binary_result(operator, &left.ty, &right.ty).ok_or(LowerError::Abandoned)?;
    function.emit(
        block,
        ty,
        InstructionKind::Binary {
            operator: spelling.to_string(),
            left: left.tag()?,
            right: right.tag()?,
        },
    )
}

fn lower_binary(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    expr: &Expr,
    block: BlockId,
    scope: ScopeId,
) -> Result<Value, LowerError> {
    let Expr::Binary(binary) = expr else {
        return Err(LowerError::Abandoned);
    };

    let left = compiler.lower_expression(function, &binary.left, block, scope)?;
    let right = compiler.lower_expression(function, &binary.right, block, scope)?;
    lower_operator(compiler, function, binary.operator_kind, &binary.operator, left, right, block, scope)
}

fn lower_assignment(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    expr: &Expr,
    block: BlockId,
    scope: ScopeId,
) -> Result<Value, LowerError> {
    let Expr::Binary(binary) = expr else {
        return Err(LowerError::Abandoned);
    };

    let Some(target) = lower_place(compiler, function, &binary.left, block, scope)? else {
        compiler
            .diagnostics
            .error(ErrorImpl::InvalidAssignmentTarget, *binary.left.get_span());
        return Ok(Value::none());
    };

    if !target.mutable {
        compiler
            .diagnostics
            .error(ErrorImpl::NotMutable { name: target.name }, binary.span);
        return Ok(Value::none());
    }

    let value = match compound_operator(binary.operator_kind) {
        Some(operator) => {
            let current = function.emit(block, target.ty.clone(), InstructionKind::Load(target.place.clone()))?;
            let right = compiler.lower_expression(function, &binary.right, block, scope)?;
            lower_operator(compiler, function, operator, &operator.spelling(), current, right, block, scope)?
        }
        None => compiler.lower_value_for(function, &binary.right, &target.ty, block, scope)?,
    };

    function.emit(
        block,
        value.ty.clone(),
        InstructionKind::Store {
            place: target.place,
            value: value.tag()?,
        },
    )?;

    Ok(value)
}

fn lower_self(
    _compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    _expr: &Expr,
    block: BlockId,
    _scope: ScopeId,
) -> Result<Value, LowerError> {
    let owner = function.self_type.clone().ok_or(LowerError::Abandoned)?;
    function.emit(block, Type::Named(owner), InstructionKind::LoadSelf)
}

fn lower_constant(
    _compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    expr: &Expr,
    block: BlockId,
    _scope: ScopeId,
) -> Result<Value, LowerError> {
    let Expr::Literal(literal) = expr else {
        return Err(LowerError::Abandoned);
    };

    let constant = literal_constant(literal).ok_or(LowerError::Abandoned)?;
    function.emit(block, constant.ty, InstructionKind::Constant(constant.value))
}

/// Owner type of a member access, plus the lowered object for instance access.
fn member_owner(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    binary: &BinaryExpr,
    block: BlockId,
    scope: ScopeId,
) -> Result<(String, Option<ValueTag>), LowerError> {
    if let Some(owner) = compiler.context(scope).static_owner(&binary.left) {
        return Ok((owner, None));
    }

    let object = compiler.lower_expression(function, &binary.left, block, scope)?;
    let owner = object.ty.named().map(String::from).ok_or(LowerError::Abandoned)?;
    Ok((owner, Some(object.tag()?)))
}

fn lower_member(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    expr: &Expr,
    block: BlockId,
    scope: ScopeId,
) -> Result<Value, LowerError> {
    let Expr::Binary(binary) = expr else {
        return Err(LowerError::Abandoned);
    };

    match binary.right.as_ref() {
        Expr::Call(call) => {
            let (owner, object) = member_owner(compiler, function, binary, block, scope)?;
            let (arguments, types) = lower_all(compiler, function, &call.arguments, block, scope)?;
            let name = call.callee_name().ok_or(LowerError::Abandoned)?;

            let signature = match compiler.context(scope).member(&owner, name) {
                Some(ScopeItem::Function(set)) => select_overload(&set.overloads, name, &types).cloned(),
                _ => None,
            }
            .ok_or(LowerError::Abandoned)?;

            let receiver = if signature.is_static { None } else { object };
            call_signature(function, block, signature, receiver, arguments)
        }
        _ => lower_load(compiler, function, expr, block, scope),
    }
}

fn lower_call(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    expr: &Expr,
    block: BlockId,
    scope: ScopeId,
) -> Result<Value, LowerError> {
    let Expr::Call(call) = expr else {
        return Err(LowerError::Abandoned);
    };

    let (arguments, types) = lower_all(compiler, function, &call.arguments, block, scope)?;
    let signature = resolve_callee(compiler, call, &types, scope)?;

    let is_method = signature.owner.as_deref().is_some_and(|owner| compiler.types.contains(owner));
    let receiver = match is_method && !signature.is_static {
        true => Some(load_self(function, block)?),
        false => None,
    };

    call_signature(function, block, signature, receiver, arguments)
}

fn resolve_callee(compiler: &Compiler, call: &CallExpr, types: &[Type], scope: ScopeId) -> Result<Signature, LowerError> {
    let name = call.callee_name().ok_or(LowerError::Abandoned)?;
    compiler
        .scopes
        .lookup::<FunctionItem>(scope, name)
        .and_then(|set| select_overload(&set.overloads, name, types))
        .cloned()
        .ok_or(LowerError::Abandoned)
}
