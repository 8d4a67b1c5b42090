use crate::{
    ast::{
        ast::Expr,
        expressions::{
            ArrayExpr, BinaryExpr, CallExpr, DefaultExpr, IdentifierExpr, LiteralExpr, LiteralKind, TupleExpr,
            UnaryExpr,
        },
    },
    errors::errors::ErrorImpl,
    lexer::tokens::TokenKind,
    Span,
};

use super::{parser::Parser, types::parse_type};

/// Precedence climbing.
///
/// Operators of equal precedence associate to the left because the right
/// operand is parsed with the operator's own precedence and the loop only
/// continues on a strictly higher one. Right associative operators also
/// continue on an equal precedence.
///
/// Every operand and every operator applied to the left operand counts as a
/// nesting level of the parser.
pub fn parse_expr(parser: &mut Parser, min_precedence: u8) -> Expr {
    parser.nested(|parser| parse_operand_chain(parser, min_precedence), Expr::Invalid)
}

fn parse_operand_chain(parser: &mut Parser, min_precedence: u8) -> Expr {
    let mut levels = 0;
    let expr = climb(parser, min_precedence, &mut levels);
    parser.ascend(levels);
    expr
}

fn climb(parser: &mut Parser, min_precedence: u8, levels: &mut usize) -> Expr {
    let operators = parser.operators();

    let prefix = operators.prefix(parser.current_token_kind());
    let mut left = if prefix != 0 && prefix >= min_precedence {
        let operator = parser.advance();
        let operand = parse_expr(parser, prefix + 1);

        Expr::Unary(UnaryExpr {
            span: operator.span.to(operand.get_span()),
            operator: operator.kind.spelling(),
            operator_kind: operator.kind,
            operand: Box::new(operand),
            is_postfix: false,
        })
    } else {
        parse_primary_expr(parser)
    };

    left = parse_postfix_expr(parser, left, min_precedence, levels);

    loop {
        let kind = parser.current_token_kind();
        let precedence = operators.binary(kind);

        let continues = precedence > min_precedence
            || (operators.is_right_associative(kind) && precedence >= min_precedence);
        if precedence == 0 || !continues {
            break;
        }

        if parser.descend().is_err() {
            break;
        }
        *levels += 1;

        let operator = parser.advance();
        let right = parse_expr(parser, precedence);

        left = Expr::Binary(BinaryExpr {
            span: left.get_span().to(right.get_span()),
            left: Box::new(left),
            operator: operator.kind.spelling(),
            operator_kind: operator.kind,
            right: Box::new(right),
        });

        left = parse_postfix_expr(parser, left, min_precedence, levels);
    }

    left
}

fn parse_postfix_expr(parser: &mut Parser, mut left: Expr, min_precedence: u8, levels: &mut usize) -> Expr {
    loop {
        let postfix = parser.operators().postfix(parser.current_token_kind());
        if postfix == 0 || postfix < min_precedence {
            return left;
        }

        if parser.descend().is_err() {
            return left;
        }
        *levels += 1;

        let operator = parser.advance();
        left = Expr::Unary(UnaryExpr {
            span: left.get_span().to(&operator.span),
            operator: operator.kind.spelling(),
            operator_kind: operator.kind,
            operand: Box::new(left),
            is_postfix: true,
        });
    }
}

/// Dispatches to the registered primary parser, or reports the token and
/// skips it.
pub fn parse_primary_expr(parser: &mut Parser) -> Expr {
    let kind = parser.current_token_kind();

    if let Some(handler) = parser.get_primary_lookup().get(&kind).copied() {
        return handler(parser);
    }

    let token = parser.advance();
    parser.error(
        ErrorImpl::UnexpectedTokenDetailed {
            token: token.to_string(),
            message: String::from("expected an expression"),
        },
        token.span,
    );

    Expr::Invalid(token.span)
}

pub fn parse_literal_expr(parser: &mut Parser) -> Expr {
    let token = parser.advance();

    let kind = match token.kind {
        TokenKind::Integer => LiteralKind::Integer,
        TokenKind::HexNumber => LiteralKind::Hex,
        TokenKind::BinNumber => LiteralKind::Binary,
        TokenKind::Float => LiteralKind::Float,
        TokenKind::String => LiteralKind::String,
        TokenKind::Char => LiteralKind::Char,
        TokenKind::True | TokenKind::False => LiteralKind::Bool,
        _ => LiteralKind::None,
    };

    if matches!(kind, LiteralKind::Hex | LiteralKind::Binary) && token.value.is_empty() {
        parser.error(ErrorImpl::NumberParseError { token: token.text.clone() }, token.span);
        return Expr::Invalid(token.span);
    }

    Expr::Literal(LiteralExpr {
        kind,
        value: token.value,
        span: token.span,
    })
}

/// `name` or `name(args)`
pub fn parse_identifier_expr(parser: &mut Parser) -> Expr {
    let token = parser.advance();
    let identifier = Expr::Identifier(IdentifierExpr {
        name: token.text,
        span: token.span,
    });

    if parser.is_match(TokenKind::OpenParen) {
        return parse_call_expr(parser, identifier);
    }

    identifier
}

pub fn parse_self_expr(parser: &mut Parser) -> Expr {
    let token = parser.advance();
    Expr::SelfRef(token.span)
}

/// Comma separated expressions up to `close`. The opening token is already consumed.
fn parse_expr_list(parser: &mut Parser, close: TokenKind) -> Vec<Expr> {
    let mut elements = vec![];

    while !parser.is_match(close) && parser.has_tokens() {
        elements.push(parse_expr(parser, 0));

        if parser.consume_if(TokenKind::Comma).is_none() {
            break;
        }
    }

    parser.expect(close);
    elements
}

pub fn parse_call_expr(parser: &mut Parser, callee: Expr) -> Expr {
    parser.expect(TokenKind::OpenParen);
    let arguments = parse_expr_list(parser, TokenKind::CloseParen);

    Expr::Call(CallExpr {
        span: Span::new(callee.get_span().start, parser.last_end()),
        callee: Box::new(callee),
        arguments,
    })
}

/// `(e)` groups, `()` and `(a, b, ...)` build tuples.
pub fn parse_grouping_expr(parser: &mut Parser) -> Expr {
    let start = parser.advance().span.start;

    if parser.consume_if(TokenKind::CloseParen).is_some() {
        return Expr::Tuple(TupleExpr {
            elements: vec![],
            span: Span::new(start, parser.last_end()),
        });
    }

    let first = parse_expr(parser, 0);
    if parser.consume_if(TokenKind::CloseParen).is_some() {
        return first;
    }

    if parser.consume_if(TokenKind::Comma).is_none() {
        parser.expect(TokenKind::CloseParen);
        return first;
    }

    let mut elements = vec![first];
    elements.extend(parse_expr_list(parser, TokenKind::CloseParen));

    Expr::Tuple(TupleExpr {
        elements,
        span: Span::new(start, parser.last_end()),
    })
}

pub fn parse_array_expr(parser: &mut Parser) -> Expr {
    let start = parser.advance().span.start;
    let elements = parse_expr_list(parser, TokenKind::CloseBracket);

    Expr::Array(ArrayExpr {
        elements,
        span: Span::new(start, parser.last_end()),
    })
}

/// `default` or `default(T)`
pub fn parse_default_expr(parser: &mut Parser) -> Expr {
    let start = parser.advance().span.start;

    let ty = if parser.consume_if(TokenKind::OpenParen).is_some() {
        let ty = parse_type(parser);
        parser.expect(TokenKind::CloseParen);
        Some(ty)
    } else {
        None
    };

    Expr::Default(DefaultExpr {
        ty,
        span: Span::new(start, parser.last_end()),
    })
}
