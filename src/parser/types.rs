//! Type parsing implementation.
//!
//! This module handles parsing of type annotations. It supports:
//!
//! - Simple and qualified names (`i32`, `geometry.Point`)
//! - Pointer suffixes (`T*`)
//! - Array suffixes (`T[]`)
//! - Tuples (`(T, U)`)
//!
//! Like expressions, type forms are looked up by their leading token (NUD)
//! and postfix suffixes are applied while a registered suffix token follows.

use std::collections::HashMap;

use crate::{ast::types::TypeName, errors::errors::ErrorImpl, lexer::tokens::TokenKind, Span};

use super::parser::Parser;

/// Type alias for type null denotation handler functions.
pub type TypeNUDHandler = fn(&mut Parser) -> TypeName;

/// Type alias for type postfix handler functions.
pub type TypeLEDHandler = fn(&mut Parser, TypeName) -> TypeName;

/// Type alias for type NUD lookup table.
pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;

/// Type alias for type LED lookup table.
pub type TypeLEDLookup = HashMap<TokenKind, TypeLEDHandler>;

/// Initializes the type parsing lookup tables.
///
/// # Arguments
///
/// * `parser` - Mutable reference to the parser to initialize
pub fn create_token_type_lookups(parser: &mut Parser) {
    parser.type_nud(TokenKind::Identifier, parse_symbol_type);
    parser.type_nud(TokenKind::None, parse_none_type);
    parser.type_nud(TokenKind::OpenParen, parse_tuple_type);
    parser.type_led(TokenKind::Star, parse_pointer_type);
    parser.type_led(TokenKind::OpenBracket, parse_array_type);
}

pub fn parse_symbol_type(parser: &mut Parser) -> TypeName {
    let token = parser.advance();
    let mut name = token.text;
    let mut span = token.span;

    while parser.is_match(TokenKind::Dot) && parser.peek(1).kind == TokenKind::Identifier {
        parser.advance();
        let segment = parser.advance();
        name.push('.');
        name.push_str(&segment.text);
        span = span.to(&segment.span);
    }

    TypeName::Named { name, span }
}

pub fn parse_none_type(parser: &mut Parser) -> TypeName {
    let token = parser.advance();
    TypeName::named("none", token.span)
}

pub fn parse_tuple_type(parser: &mut Parser) -> TypeName {
    let start = parser.advance().span.start;
    let mut elements = vec![];

    while !parser.is_match(TokenKind::CloseParen) && parser.has_tokens() {
        elements.push(parse_type(parser));

        if parser.consume_if(TokenKind::Comma).is_none() {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen);

    TypeName::Tuple {
        elements,
        span: Span::new(start, parser.last_end()),
    }
}

pub fn parse_pointer_type(parser: &mut Parser, left: TypeName) -> TypeName {
    let star = parser.advance();

    TypeName::Pointer {
        span: left.get_span().to(&star.span),
        underlying: Box::new(left),
    }
}

pub fn parse_array_type(parser: &mut Parser, left: TypeName) -> TypeName {
    parser.expect(TokenKind::OpenBracket);
    let close = parser.expect(TokenKind::CloseBracket);

    TypeName::Array {
        span: left.get_span().to(&close.span),
        underlying: Box::new(left),
    }
}

pub fn parse_type(parser: &mut Parser) -> TypeName {
    parser.nested(parse_type_suffixes, |span| TypeName::Invalid { span })
}

fn parse_type_suffixes(parser: &mut Parser) -> TypeName {
    let token_kind = parser.current_token_kind();

    let Some(nud) = parser.get_type_nud_lookup().get(&token_kind).copied() else {
        let token = parser.advance();
        parser.error(
            ErrorImpl::UnexpectedTokenDetailed {
                token: token.to_string(),
                message: String::from("expected a type"),
            },
            token.span,
        );
        return TypeName::Invalid { span: token.span };
    };

    let mut left = nud(parser);

    let mut levels = 0;
    while let Some(led) = parser.get_type_led_lookup().get(&parser.current_token_kind()).copied() {
        if parser.descend().is_err() {
            break;
        }
        levels += 1;
        left = led(parser, left);
    }
    parser.ascend(levels);

    left
}
