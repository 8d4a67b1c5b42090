use crate::{
    ast::{
        ast::{Modifier, Stmt},
        statements::{
            EnumDeclStmt, EnumVariant, FieldDecl, FnDeclStmt, ImportStmt, ModuleStmt, OperatorDecl, ParameterDecl,
            StructDeclStmt, UnionDeclStmt,
        },
    },
    errors::errors::ErrorImpl,
    lexer::tokens::TokenKind,
    Position, Span,
};

use super::{
    expr::parse_expr,
    parser::Parser,
    stmt::{parse_block, parse_modifiers},
    types::parse_type,
};

fn parse_parameters(parser: &mut Parser) -> Vec<ParameterDecl> {
    parser.expect(TokenKind::OpenParen);

    let mut parameters = Vec::new();
    while !parser.is_match(TokenKind::CloseParen) && parser.has_tokens() {
        let start = parser.get_position();
        let is_out = parser.consume_if(TokenKind::Out).is_some();
        let (name, _) = parser.expect_identifier("in parameter list");
        parser.expect(TokenKind::Colon);
        let ty = parse_type(parser);

        parameters.push(ParameterDecl {
            name,
            ty,
            is_out,
            span: Span::new(start, parser.last_end()),
        });

        if parser.consume_if(TokenKind::Comma).is_none() {
            break;
        }
    }

    parser.expect(TokenKind::CloseParen);
    parameters
}

/// Parameters, optional `-> T` and the body, shared by functions, methods and
/// operator overloads.
fn parse_fn_rest(parser: &mut Parser, start: Position, name: String, modifiers: Vec<Modifier>) -> FnDeclStmt {
    let parameters = parse_parameters(parser);

    let return_type = if parser.consume_if(TokenKind::Arrow).is_some() {
        Some(parse_type(parser))
    } else {
        None
    };

    let body = parse_block(parser);

    FnDeclStmt {
        name,
        parameters,
        return_type,
        body,
        modifiers,
        span: Span::new(start, parser.last_end()),
    }
}

/// `func name([out] p: T, ...) [-> T] { ... }`
pub fn parse_fn_decl(parser: &mut Parser, modifiers: Vec<Modifier>) -> Stmt {
    let start = parser.advance().span.start;
    let (name, _) = parser.expect_identifier("after 'func'");

    Stmt::FnDecl(parse_fn_rest(parser, start, name, modifiers))
}

/// `[const] name: T [= value];`
fn parse_field(parser: &mut Parser, modifiers: Vec<Modifier>) -> FieldDecl {
    let start = parser.get_position();
    let is_constant = parser.consume_if(TokenKind::Const).is_some();
    let (name, _) = parser.expect_identifier("in field declaration");
    parser.expect(TokenKind::Colon);
    let ty = parse_type(parser);

    let value = if parser.consume_if(TokenKind::Assignment).is_some() {
        Some(parse_expr(parser, 0))
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon);

    FieldDecl {
        name,
        ty,
        is_constant,
        value,
        modifiers,
        span: Span::new(start, parser.last_end()),
    }
}

/// `operator + (a: T, b: T) -> T { ... }`
fn parse_operator(parser: &mut Parser, modifiers: Vec<Modifier>) -> OperatorDecl {
    let start = parser.advance().span.start;
    let symbol = parser.advance();

    let operators = parser.operators();
    let known = operators.binary(symbol.kind) != 0
        || operators.prefix(symbol.kind) != 0
        || operators.postfix(symbol.kind) != 0;
    if !known {
        parser.error(
            ErrorImpl::UnexpectedTokenDetailed {
                token: symbol.to_string(),
                message: String::from("expected an overloadable operator"),
            },
            symbol.span,
        );
    }

    let function = parse_fn_rest(parser, start, format!("operator{}", symbol.text), modifiers);

    OperatorDecl {
        operator: symbol.text,
        function,
    }
}

/// `struct Name { fields; methods; operators }`
pub fn parse_struct_decl(parser: &mut Parser, modifiers: Vec<Modifier>) -> Stmt {
    let start = parser.advance().span.start;
    let (name, _) = parser.expect_identifier("after 'struct'");

    parser.expect(TokenKind::OpenCurly);

    let mut fields = Vec::new();
    let mut methods = Vec::new();
    let mut operators = Vec::new();

    while !parser.is_match(TokenKind::CloseCurly) && parser.has_tokens() {
        let before = parser.stream().position();
        let member_modifiers = parse_modifiers(parser);

        match parser.current_token_kind() {
            TokenKind::Func => {
                let member_start = parser.advance().span.start;
                let (method_name, _) = parser.expect_identifier("after 'func'");
                methods.push(parse_fn_rest(parser, member_start, method_name, member_modifiers));
            }
            TokenKind::Operator => operators.push(parse_operator(parser, member_modifiers)),
            _ => fields.push(parse_field(parser, member_modifiers)),
        }

        if parser.stream().position() == before {
            parser.advance();
        }
    }

    parser.expect(TokenKind::CloseCurly);

    Stmt::StructDecl(StructDeclStmt {
        name,
        fields,
        methods,
        operators,
        modifiers,
        span: Span::new(start, parser.last_end()),
    })
}

/// `enum Name { A, B = 4, C }`
pub fn parse_enum_decl(parser: &mut Parser, modifiers: Vec<Modifier>) -> Stmt {
    let start = parser.advance().span.start;
    let (name, _) = parser.expect_identifier("after 'enum'");

    parser.expect(TokenKind::OpenCurly);

    let mut variants = Vec::new();
    while !parser.is_match(TokenKind::CloseCurly) && parser.has_tokens() {
        let variant_start = parser.get_position();
        let (variant, _) = parser.expect_identifier("in enum body");

        let value = if parser.consume_if(TokenKind::Assignment).is_some() {
            Some(parse_expr(parser, 0))
        } else {
            None
        };

        variants.push(EnumVariant {
            name: variant,
            value,
            span: Span::new(variant_start, parser.last_end()),
        });

        if parser.consume_if(TokenKind::Comma).is_none() {
            break;
        }
    }

    parser.expect(TokenKind::CloseCurly);

    Stmt::EnumDecl(EnumDeclStmt {
        name,
        variants,
        modifiers,
        span: Span::new(start, parser.last_end()),
    })
}

/// `union Name { a: T; b: U; }`
pub fn parse_union_decl(parser: &mut Parser, modifiers: Vec<Modifier>) -> Stmt {
    let start = parser.advance().span.start;
    let (name, _) = parser.expect_identifier("after 'union'");

    parser.expect(TokenKind::OpenCurly);

    let mut members = Vec::new();
    while !parser.is_match(TokenKind::CloseCurly) && parser.has_tokens() {
        let before = parser.stream().position();
        let member_modifiers = parse_modifiers(parser);
        members.push(parse_field(parser, member_modifiers));

        if parser.stream().position() == before {
            parser.advance();
        }
    }

    parser.expect(TokenKind::CloseCurly);

    Stmt::UnionDecl(UnionDeclStmt {
        name,
        members,
        modifiers,
        span: Span::new(start, parser.last_end()),
    })
}

/// Dotted path such as `a.b.c`.
fn parse_path(parser: &mut Parser, context: &str) -> String {
    let (mut path, _) = parser.expect_identifier(context);

    while parser.consume_if(TokenKind::Dot).is_some() {
        let (segment, _) = parser.expect_identifier(context);
        path.push('.');
        path.push_str(&segment);
    }

    path
}

/// `module a.b;`
pub fn parse_module_decl(parser: &mut Parser, _modifiers: Vec<Modifier>) -> Stmt {
    let start = parser.advance().span.start;
    let path = parse_path(parser, "in module name");
    parser.expect(TokenKind::Semicolon);

    Stmt::Module(ModuleStmt {
        path,
        span: Span::new(start, parser.last_end()),
    })
}

/// `import a.b;`
pub fn parse_import_decl(parser: &mut Parser, _modifiers: Vec<Modifier>) -> Stmt {
    let start = parser.advance().span.start;
    let path = parse_path(parser, "in import");
    parser.expect(TokenKind::Semicolon);

    Stmt::Import(ImportStmt {
        path,
        span: Span::new(start, parser.last_end()),
    })
}
