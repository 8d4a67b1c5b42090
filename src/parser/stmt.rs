use crate::{
    ast::{
        ast::{Modifier, Stmt},
        statements::{
            BlockStmt, DoWhileStmt, ExpressionStmt, IfStmt, ReturnStmt, ThrowStmt, TypeAliasStmt, VarDeclStmt,
            WhileStmt,
        },
    },
    errors::errors::ErrorImpl,
    lexer::tokens::TokenKind,
    Span,
};

use super::{expr::parse_expr, parser::Parser, types::parse_type};

/// Statement dispatch: a registered parse point for the leading token, or an
/// expression statement.
pub fn parse_stmt(parser: &mut Parser) -> Stmt {
    if let Err(span) = parser.descend() {
        parser.consume_if(TokenKind::Semicolon);
        return Stmt::Invalid(span);
    }

    let stmt = dispatch_stmt(parser);
    parser.ascend(1);
    stmt
}

fn dispatch_stmt(parser: &mut Parser) -> Stmt {
    let kind = parser.current_token_kind();

    if let Some(handler) = parser.get_stmt_lookup().get(&kind).copied() {
        tracing::trace!(kind = %kind, "statement parse point");
        return handler(parser);
    }

    if let Some(handler) = parser.get_decl_lookup().get(&kind).copied() {
        let decl = handler(parser, vec![]);
        parser.error(
            ErrorImpl::DeclarationNotAllowed {
                kind: kind.spelling(),
            },
            *decl.get_span(),
        );
        return Stmt::Invalid(*decl.get_span());
    }

    let expression = parse_expr(parser, 0);
    parser.expect(TokenKind::Semicolon);

    Stmt::Expression(ExpressionStmt {
        span: Span::new(expression.get_span().start, parser.last_end()),
        expression,
    })
}

/// Collects leading doc comments and modifier keywords. Conflicting
/// visibilities are reported as a warning.
pub fn parse_modifiers(parser: &mut Parser) -> Vec<Modifier> {
    let start = parser.get_position();
    let mut modifiers = vec![];

    loop {
        let modifier = match parser.current_token_kind() {
            TokenKind::DocComment => Modifier::Doc(parser.current_token().value.clone()),
            TokenKind::Public => Modifier::Public,
            TokenKind::Private => Modifier::Private,
            TokenKind::Internal => Modifier::Internal,
            TokenKind::Static => Modifier::Static,
            _ => break,
        };
        parser.advance();
        modifiers.push(modifier);
    }

    let visibilities = modifiers
        .iter()
        .filter(|m| m.is_visibility())
        .map(|m| m.keyword())
        .collect::<Vec<&str>>();

    if visibilities.len() > 1 {
        let span = Span::new(start, parser.last_end());
        let combination = visibilities.join(" ");
        parser.warning(ErrorImpl::InvalidModifierCombination { modifiers: combination }, span);
    }

    modifiers
}

/// `declare [const] name[: T] [= value];` and `const name[: T] = value;`
pub fn parse_var_decl_stmt(parser: &mut Parser) -> Stmt {
    let start_token = parser.advance();
    let mut is_constant = start_token.kind == TokenKind::Const;
    if start_token.kind == TokenKind::Declare && parser.consume_if(TokenKind::Const).is_some() {
        is_constant = true;
    }
    parser.consume_if(TokenKind::Mut);

    let (name, name_span) = parser.expect_identifier("during variable declaration");

    let explicit_type = if parser.consume_if(TokenKind::Colon).is_some() {
        Some(parse_type(parser))
    } else {
        None
    };

    let value = if parser.consume_if(TokenKind::Assignment).is_some() {
        Some(parse_expr(parser, 0))
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon);

    if value.is_none() {
        let message = if is_constant {
            Some("expected rhs in constant definition")
        } else if explicit_type.is_none() {
            Some("expected rhs or explicit type")
        } else {
            None
        };

        if let Some(message) = message {
            parser.error(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: name.clone(),
                    message: String::from(message),
                },
                name_span,
            );
        }
    }

    Stmt::VarDecl(VarDeclStmt {
        span: Span::new(start_token.span.start, parser.last_end()),
        is_constant,
        name,
        explicit_type,
        value,
    })
}

/// Parses `{ ... }` into a block.
pub fn parse_block(parser: &mut Parser) -> BlockStmt {
    let start = parser.expect(TokenKind::OpenCurly).span.start;

    let mut body = Vec::new();
    while !parser.is_match(TokenKind::CloseCurly) && parser.has_tokens() {
        let before = parser.stream().position();
        body.push(parse_stmt(parser));

        if parser.stream().position() == before {
            parser.advance();
        }
    }

    parser.expect(TokenKind::CloseCurly);

    BlockStmt {
        body,
        span: Span::new(start, parser.last_end()),
    }
}

pub fn parse_block_stmt(parser: &mut Parser) -> Stmt {
    Stmt::Block(parse_block(parser))
}

/// A braced block or a single statement, used as the body of control flow.
fn parse_one_or_block(parser: &mut Parser) -> Stmt {
    if parser.is_match(TokenKind::OpenCurly) {
        parse_block_stmt(parser)
    } else {
        parse_stmt(parser)
    }
}

pub fn parse_if_stmt(parser: &mut Parser) -> Stmt {
    let start = parser.advance().span.start;

    let condition = parse_expr(parser, 0);
    let then_body = parse_one_or_block(parser);

    let else_body = if parser.consume_if(TokenKind::Else).is_some() {
        Some(Box::new(parse_one_or_block(parser)))
    } else {
        None
    };

    Stmt::If(IfStmt {
        condition,
        then_body: Box::new(then_body),
        else_body,
        span: Span::new(start, parser.last_end()),
    })
}

pub fn parse_while_stmt(parser: &mut Parser) -> Stmt {
    let start = parser.advance().span.start;

    let condition = parse_expr(parser, 0);
    let body = parse_one_or_block(parser);

    Stmt::While(WhileStmt {
        condition,
        body: Box::new(body),
        span: Span::new(start, parser.last_end()),
    })
}

/// `do { ... } while condition;`
pub fn parse_do_while_stmt(parser: &mut Parser) -> Stmt {
    let start = parser.advance().span.start;

    let body = parse_one_or_block(parser);
    parser.expect(TokenKind::While);
    let condition = parse_expr(parser, 0);
    parser.expect(TokenKind::Semicolon);

    Stmt::DoWhile(DoWhileStmt {
        body: Box::new(body),
        condition,
        span: Span::new(start, parser.last_end()),
    })
}

pub fn parse_return_stmt(parser: &mut Parser) -> Stmt {
    let start = parser.advance().span.start;

    let value = if !parser.is_match(TokenKind::Semicolon) {
        Some(parse_expr(parser, 0))
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon);

    Stmt::Return(ReturnStmt {
        value,
        span: Span::new(start, parser.last_end()),
    })
}

pub fn parse_throw_stmt(parser: &mut Parser) -> Stmt {
    let start = parser.advance().span.start;

    let value = parse_expr(parser, 0);
    parser.expect(TokenKind::Semicolon);

    Stmt::Throw(ThrowStmt {
        value,
        span: Span::new(start, parser.last_end()),
    })
}

pub fn parse_break_stmt(parser: &mut Parser) -> Stmt {
    let start = parser.advance().span.start;
    parser.expect(TokenKind::Semicolon);
    Stmt::Break(Span::new(start, parser.last_end()))
}

pub fn parse_continue_stmt(parser: &mut Parser) -> Stmt {
    let start = parser.advance().span.start;
    parser.expect(TokenKind::Semicolon);
    Stmt::Continue(Span::new(start, parser.last_end()))
}

/// `type Alias = T;`
pub fn parse_type_alias_stmt(parser: &mut Parser) -> Stmt {
    let start = parser.advance().span.start;

    let (name, _) = parser.expect_identifier("in type alias");
    parser.expect(TokenKind::Assignment);
    let target = parse_type(parser);
    parser.expect(TokenKind::Semicolon);

    Stmt::TypeAlias(TypeAliasStmt {
        name,
        target,
        span: Span::new(start, parser.last_end()),
    })
}
