//! Statement implementors.
//!
//! Each implementor receives the block lowering is currently in and returns
//! the block lowering continues in.

use crate::{
    ast::ast::{Expr, Stmt},
    errors::errors::ErrorImpl,
    scope::scope::{ScopeId, ScopeItem, VariableItem},
    type_checker::{deducer::is_bare_default, types::Type},
};

use super::{
    compiler::{Compiler, FunctionBuilder, LoopTargets, LowerError, Lowered, StmtKind},
    ir::{BlockId, InstructionKind, Place, Terminator, ValueTag},
};

pub fn register_stmt_implementors(compiler: &mut Compiler) {
    compiler.stmt_implementor(StmtKind::Expression, lower_expression_stmt);
    compiler.stmt_implementor(StmtKind::VarDecl, lower_var_decl);
    compiler.stmt_implementor(StmtKind::If, lower_if);
    compiler.stmt_implementor(StmtKind::While, lower_while);
    compiler.stmt_implementor(StmtKind::DoWhile, lower_do_while);
    compiler.stmt_implementor(StmtKind::Return, lower_return);
    compiler.stmt_implementor(StmtKind::Throw, lower_throw);
    compiler.stmt_implementor(StmtKind::Break, lower_loop_control);
    compiler.stmt_implementor(StmtKind::Continue, lower_loop_control);
    compiler.stmt_implementor(StmtKind::TypeAlias, lower_type_alias);
}

fn lower_expression_stmt(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    stmt: &Stmt,
    block: BlockId,
    scope: ScopeId,
) -> Lowered {
    let Stmt::Expression(expression_stmt) = stmt else {
        return Ok(block);
    };

    if compiler.check(function, &expression_stmt.expression, scope)?.is_some() {
        compiler.lower_expression(function, &expression_stmt.expression, block, scope)?;
    }

    Ok(block)
}

fn type_mismatch(compiler: &mut Compiler, expected: &Type, received: &Type, expr: &Expr) {
    compiler.diagnostics.error(
        ErrorImpl::TypeMatchError {
            expected: expected.to_string(),
            received: received.to_string(),
        },
        *expr.get_span(),
    );
}

fn lower_var_decl(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    stmt: &Stmt,
    block: BlockId,
    scope: ScopeId,
) -> Lowered {
    let Stmt::VarDecl(decl) = stmt else {
        return Ok(block);
    };

    if compiler.scopes.get(scope).and_then(|s| s.get(&decl.name)).is_some() {
        compiler.diagnostics.error(
            ErrorImpl::VariableAlreadyDeclared {
                variable: decl.name.clone(),
            },
            decl.span,
        );
        return Ok(block);
    }

    let declared = decl.explicit_type.as_ref().map(|ty| compiler.resolve_type(ty, scope));
    let deduced = match &decl.value {
        Some(value) => Some(compiler.deduce(value, scope, function.self_type.as_deref())?),
        None => None,
    };

    // Only a fully typed initializer is lowered.
    let (ty, initializer) = match (declared, deduced, &decl.value) {
        (Some(declared), Some(deduced), Some(value)) => {
            if declared.is_unknown() || deduced.is_unknown() {
                (declared, None)
            } else if deduced.is_void() {
                type_mismatch(compiler, &declared, &deduced, value);
                (declared, None)
            } else if !is_bare_default(value) && !deduced.is_assignable_to(&declared) {
                type_mismatch(compiler, &declared, &deduced, value);
                (declared, None)
            } else {
                (declared, Some(value))
            }
        }
        (None, Some(deduced), Some(value)) => {
            if deduced.is_void() {
                type_mismatch(compiler, &Type::object(), &deduced, value);
                (Type::Unknown, None)
            } else {
                let lowered = (!deduced.is_unknown()).then_some(value);
                (deduced, lowered)
            }
        }
        (Some(declared), _, _) => (declared, None),
        _ => (Type::object(), None),
    };

    let mutable = !decl.is_constant;
    let value = match initializer {
        Some(value) => Some(compiler.lower_value_for(function, value, &ty, block, scope)?),
        None if decl.value.is_none() && !ty.is_unknown() => {
            Some(function.emit(block, ty.clone(), InstructionKind::Default)?)
        }
        None => None,
    };

    let slot = function.add_local(&decl.name, ty.clone(), mutable);
    compiler
        .scopes
        .declare(scope, &decl.name, ScopeItem::Variable(VariableItem { ty, mutable, slot }));

    if let Some(value) = value {
        function.emit(
            block,
            value.ty.clone(),
            InstructionKind::Store {
                place: Place::Local(slot),
                value: value.tag()?,
            },
        )?;
    }

    Ok(block)
}

/// Checks a loop or branch condition before any block is created for its
/// statement.
///
/// # Returns
///
/// `false` when the condition has a reported problem. The statement is then
/// skipped and lowering continues with its siblings.
fn check_condition(
    compiler: &mut Compiler,
    function: &FunctionBuilder,
    condition: &Expr,
    scope: ScopeId,
) -> Result<bool, LowerError> {
    let Some(ty) = compiler.check(function, condition, scope)? else {
        return Ok(false);
    };

    if !ty.is_bool() {
        type_mismatch(compiler, &Type::bool(), &ty, condition);
        return Ok(false);
    }

    Ok(true)
}

fn lower_condition(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    condition: &Expr,
    block: BlockId,
    scope: ScopeId,
) -> Result<ValueTag, LowerError> {
    compiler.lower_expression(function, condition, block, scope)?.tag()
}

/// Closes `exit` with a jump to `target` unless it already ended.
fn fall_through(function: &mut FunctionBuilder, exit: BlockId, target: BlockId) -> Result<(), LowerError> {
    if !function.graph.is_sealed(exit) {
        function.graph.seal(exit, Terminator::Jump(target))?;
    }
    Ok(())
}

fn lower_if(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    stmt: &Stmt,
    block: BlockId,
    scope: ScopeId,
) -> Lowered {
    let Stmt::If(if_stmt) = stmt else {
        return Ok(block);
    };

    if !check_condition(compiler, function, &if_stmt.condition, scope)? {
        return Ok(block);
    }
    let condition = lower_condition(compiler, function, &if_stmt.condition, block, scope)?;

    let then_block = function.graph.new_block();
    let else_block = if_stmt.else_body.as_ref().map(|_| function.graph.new_block());
    let merge = function.graph.new_block();

    function.graph.seal(
        block,
        Terminator::Branch {
            condition,
            then_block,
            else_block: else_block.unwrap_or(merge),
        },
    )?;

    let then_exit = compiler.lower_body(function, &if_stmt.then_body, then_block, scope)?;
    fall_through(function, then_exit, merge)?;

    if let (Some(else_body), Some(else_block)) = (&if_stmt.else_body, else_block) {
        let else_exit = compiler.lower_body(function, else_body, else_block, scope)?;
        fall_through(function, else_exit, merge)?;
    }

    Ok(merge)
}

fn lower_while(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    stmt: &Stmt,
    block: BlockId,
    scope: ScopeId,
) -> Lowered {
    let Stmt::While(while_stmt) = stmt else {
        return Ok(block);
    };

    if !check_condition(compiler, function, &while_stmt.condition, scope)? {
        return Ok(block);
    }

    let header = function.graph.new_block();
    function.graph.seal(block, Terminator::Jump(header))?;

    let condition = lower_condition(compiler, function, &while_stmt.condition, header, scope)?;

    let body = function.graph.new_block();
    let exit = function.graph.new_block();
    function.graph.seal(
        header,
        Terminator::Branch {
            condition,
            then_block: body,
            else_block: exit,
        },
    )?;

    function.loops.push(LoopTargets {
        continue_block: header,
        break_block: exit,
    });
    let lowered = compiler.lower_body(function, &while_stmt.body, body, scope);
    function.loops.pop();

    fall_through(function, lowered?, header)?;
    Ok(exit)
}

fn lower_do_while(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    stmt: &Stmt,
    block: BlockId,
    scope: ScopeId,
) -> Lowered {
    let Stmt::DoWhile(do_while) = stmt else {
        return Ok(block);
    };

    if !check_condition(compiler, function, &do_while.condition, scope)? {
        return Ok(block);
    }

    let body = function.graph.new_block();
    let latch = function.graph.new_block();
    let exit = function.graph.new_block();
    function.graph.seal(block, Terminator::Jump(body))?;

    function.loops.push(LoopTargets {
        continue_block: latch,
        break_block: exit,
    });
    let lowered = compiler.lower_body(function, &do_while.body, body, scope);
    function.loops.pop();

    fall_through(function, lowered?, latch)?;

    let condition = lower_condition(compiler, function, &do_while.condition, latch, scope)?;
    function.graph.seal(
        latch,
        Terminator::Branch {
            condition,
            then_block: body,
            else_block: exit,
        },
    )?;

    Ok(exit)
}

fn lower_return(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    stmt: &Stmt,
    block: BlockId,
    scope: ScopeId,
) -> Lowered {
    let Stmt::Return(return_stmt) = stmt else {
        return Ok(block);
    };

    let expected = function.return_type.clone();
    let value = match &return_stmt.value {
        None => {
            if !expected.is_void() && !expected.is_unknown() {
                compiler.diagnostics.error(
                    ErrorImpl::TypeMatchError {
                        expected: expected.to_string(),
                        received: Type::void().to_string(),
                    },
                    return_stmt.span,
                );
            }
            None
        }
        Some(value) => {
            let Some(ty) = compiler.check(function, value, scope)? else {
                return Err(LowerError::Abandoned);
            };

            let matches = if expected.is_void() {
                ty.is_void()
            } else {
                is_bare_default(value) || (!ty.is_void() && ty.is_assignable_to(&expected))
            };

            if !matches && !expected.is_unknown() {
                type_mismatch(compiler, &expected, &ty, value);
                return Err(LowerError::Abandoned);
            }

            compiler.lower_value_for(function, value, &expected, block, scope)?.tag
        }
    };

    function.graph.seal(block, Terminator::Return(value))?;
    Ok(block)
}

fn lower_throw(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    stmt: &Stmt,
    block: BlockId,
    scope: ScopeId,
) -> Lowered {
    let Stmt::Throw(throw) = stmt else {
        return Ok(block);
    };

    let Some(ty) = compiler.check(function, &throw.value, scope)? else {
        return Err(LowerError::Abandoned);
    };

    if ty.is_void() {
        type_mismatch(compiler, &Type::object(), &ty, &throw.value);
        return Ok(block);
    }

    let value = compiler.lower_expression(function, &throw.value, block, scope)?.tag()?;
    function.graph.seal(block, Terminator::Throw(value))?;
    Ok(block)
}

fn lower_loop_control(
    compiler: &mut Compiler,
    function: &mut FunctionBuilder,
    stmt: &Stmt,
    block: BlockId,
    _scope: ScopeId,
) -> Lowered {
    let (keyword, span) = match stmt {
        Stmt::Break(span) => ("break", *span),
        Stmt::Continue(span) => ("continue", *span),
        _ => return Ok(block),
    };

    let Some(targets) = function.loops.last().copied() else {
        compiler.diagnostics.error(
            ErrorImpl::LoopControlOutsideLoop {
                keyword: keyword.to_string(),
            },
            span,
        );
        return Ok(block);
    };

    let terminator = match stmt {
        Stmt::Break(_) => Terminator::Break(targets.break_block),
        _ => Terminator::Jump(targets.continue_block),
    };
    function.graph.seal(block, terminator)?;
    Ok(block)
}

fn lower_type_alias(
    compiler: &mut Compiler,
    _function: &mut FunctionBuilder,
    stmt: &Stmt,
    block: BlockId,
    scope: ScopeId,
) -> Lowered {
    let Stmt::TypeAlias(alias) = stmt else {
        return Ok(block);
    };

    let target = compiler.resolve_type(&alias.target, scope);
    if !compiler.scopes.declare_alias(scope, &alias.name, target) {
        compiler.diagnostics.error(
            ErrorImpl::TypeAlreadyDeclared {
                name: alias.name.clone(),
            },
            alias.span,
        );
    }

    Ok(block)
}
