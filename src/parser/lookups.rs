use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::{
    ast::ast::{Expr, Modifier, Stmt},
    lexer::tokens::TokenKind,
};

use super::{decl::*, expr::*, parser::Parser, stmt::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Binary,
    Prefix,
    Postfix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorEntry {
    pub kind: TokenKind,
    pub precedence: u8,
    pub arity: Arity,
    pub associativity: Associativity,
}

const fn op(kind: TokenKind, precedence: u8, arity: Arity) -> OperatorEntry {
    OperatorEntry {
        kind,
        precedence,
        arity,
        associativity: Associativity::Left,
    }
}

const fn right(kind: TokenKind, precedence: u8) -> OperatorEntry {
    OperatorEntry {
        kind,
        precedence,
        arity: Arity::Binary,
        associativity: Associativity::Right,
    }
}

const OPERATORS: &[OperatorEntry] = &[
    // Assignment
    right(TokenKind::Assignment, 1),
    right(TokenKind::PlusEquals, 1),
    right(TokenKind::MinusEquals, 1),
    right(TokenKind::StarEquals, 1),
    right(TokenKind::SlashEquals, 1),
    // Logical and bitwise
    op(TokenKind::Or, 2, Arity::Binary),
    op(TokenKind::And, 3, Arity::Binary),
    op(TokenKind::Pipe, 4, Arity::Binary),
    op(TokenKind::Caret, 5, Arity::Binary),
    op(TokenKind::Ampersand, 6, Arity::Binary),
    // Relational
    op(TokenKind::Equals, 7, Arity::Binary),
    op(TokenKind::NotEquals, 7, Arity::Binary),
    op(TokenKind::Less, 8, Arity::Binary),
    op(TokenKind::LessEquals, 8, Arity::Binary),
    op(TokenKind::Greater, 8, Arity::Binary),
    op(TokenKind::GreaterEquals, 8, Arity::Binary),
    op(TokenKind::ShiftLeft, 10, Arity::Binary),
    op(TokenKind::ShiftRight, 10, Arity::Binary),
    // Additive and multiplicative
    op(TokenKind::Plus, 11, Arity::Binary),
    op(TokenKind::Dash, 11, Arity::Binary),
    op(TokenKind::Star, 12, Arity::Binary),
    op(TokenKind::Slash, 12, Arity::Binary),
    op(TokenKind::Percent, 12, Arity::Binary),
    // Unary
    op(TokenKind::Dash, 13, Arity::Prefix),
    op(TokenKind::Not, 13, Arity::Prefix),
    op(TokenKind::Tilde, 13, Arity::Prefix),
    op(TokenKind::Ampersand, 13, Arity::Prefix),
    op(TokenKind::Star, 13, Arity::Prefix),
    op(TokenKind::Question, 14, Arity::Postfix),
    // Member
    op(TokenKind::Dot, 15, Arity::Binary),
    op(TokenKind::ColonColon, 15, Arity::Binary),
];

lazy_static! {
    pub static ref OPERATOR_TABLE: OperatorTable = build_operator_table();
}

/// Precedence and associativity per token kind and arity. A precedence of 0
/// means "not an operator of this arity".
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    entries: HashMap<(TokenKind, Arity), OperatorEntry>,
}

impl OperatorTable {
    pub fn from_entries(entries: &[OperatorEntry]) -> Self {
        OperatorTable {
            entries: entries.iter().map(|entry| ((entry.kind, entry.arity), *entry)).collect(),
        }
    }

    pub fn precedence(&self, kind: TokenKind, arity: Arity) -> u8 {
        self.entries.get(&(kind, arity)).map(|entry| entry.precedence).unwrap_or(0)
    }

    pub fn binary(&self, kind: TokenKind) -> u8 {
        self.precedence(kind, Arity::Binary)
    }

    pub fn prefix(&self, kind: TokenKind) -> u8 {
        self.precedence(kind, Arity::Prefix)
    }

    pub fn postfix(&self, kind: TokenKind) -> u8 {
        self.precedence(kind, Arity::Postfix)
    }

    pub fn is_right_associative(&self, kind: TokenKind) -> bool {
        self.entries
            .get(&(kind, Arity::Binary))
            .is_some_and(|entry| entry.associativity == Associativity::Right)
    }
}

pub fn build_operator_table() -> OperatorTable {
    OperatorTable::from_entries(OPERATORS)
}

pub type StmtHandler = fn(&mut Parser) -> Stmt;
pub type DeclHandler = fn(&mut Parser, Vec<Modifier>) -> Stmt;
pub type PrimaryHandler = fn(&mut Parser) -> Expr;

pub fn create_token_lookups(parser: &mut Parser) {
    // Literals and symbols
    parser.primary(TokenKind::Integer, parse_literal_expr);
    parser.primary(TokenKind::HexNumber, parse_literal_expr);
    parser.primary(TokenKind::BinNumber, parse_literal_expr);
    parser.primary(TokenKind::Float, parse_literal_expr);
    parser.primary(TokenKind::String, parse_literal_expr);
    parser.primary(TokenKind::Char, parse_literal_expr);
    parser.primary(TokenKind::True, parse_literal_expr);
    parser.primary(TokenKind::False, parse_literal_expr);
    parser.primary(TokenKind::None, parse_literal_expr);
    parser.primary(TokenKind::Identifier, parse_identifier_expr);
    parser.primary(TokenKind::SelfKw, parse_self_expr);
    parser.primary(TokenKind::OpenParen, parse_grouping_expr);
    parser.primary(TokenKind::OpenBracket, parse_array_expr);
    parser.primary(TokenKind::Default, parse_default_expr);

    // Statements
    parser.stmt(TokenKind::Declare, parse_var_decl_stmt);
    parser.stmt(TokenKind::Const, parse_var_decl_stmt);
    parser.stmt(TokenKind::If, parse_if_stmt);
    parser.stmt(TokenKind::While, parse_while_stmt);
    parser.stmt(TokenKind::Do, parse_do_while_stmt);
    parser.stmt(TokenKind::OpenCurly, parse_block_stmt);
    parser.stmt(TokenKind::Return, parse_return_stmt);
    parser.stmt(TokenKind::Throw, parse_throw_stmt);
    parser.stmt(TokenKind::Break, parse_break_stmt);
    parser.stmt(TokenKind::Continue, parse_continue_stmt);
    parser.stmt(TokenKind::Type, parse_type_alias_stmt);

    // Declarations
    parser.decl(TokenKind::Func, parse_fn_decl);
    parser.decl(TokenKind::Struct, parse_struct_decl);
    parser.decl(TokenKind::Enum, parse_enum_decl);
    parser.decl(TokenKind::Union, parse_union_decl);
    parser.decl(TokenKind::Module, parse_module_decl);
    parser.decl(TokenKind::Import, parse_import_decl);
}

// Lookup tables inside parser struct, so it's easier
pub type StmtLookup = HashMap<TokenKind, StmtHandler>;
pub type DeclLookup = HashMap<TokenKind, DeclHandler>;
pub type PrimaryLookup = HashMap<TokenKind, PrimaryHandler>;
