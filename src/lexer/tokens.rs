use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = build_keyword_table();
    pub static ref SYMBOL_TABLE: Vec<(&'static str, TokenKind)> = build_symbol_table();
}

/// Keywords and operators spelled as words.
pub fn build_keyword_table() -> HashMap<&'static str, TokenKind> {
    let mut map = HashMap::new();
    map.insert("declare", TokenKind::Declare);
    map.insert("const", TokenKind::Const);
    map.insert("mut", TokenKind::Mut);
    map.insert("func", TokenKind::Func);
    map.insert("return", TokenKind::Return);
    map.insert("if", TokenKind::If);
    map.insert("else", TokenKind::Else);
    map.insert("while", TokenKind::While);
    map.insert("do", TokenKind::Do);
    map.insert("break", TokenKind::Break);
    map.insert("continue", TokenKind::Continue);
    map.insert("throw", TokenKind::Throw);
    map.insert("true", TokenKind::True);
    map.insert("false", TokenKind::False);
    map.insert("none", TokenKind::None);
    map.insert("struct", TokenKind::Struct);
    map.insert("enum", TokenKind::Enum);
    map.insert("union", TokenKind::Union);
    map.insert("module", TokenKind::Module);
    map.insert("import", TokenKind::Import);
    map.insert("type", TokenKind::Type);
    map.insert("default", TokenKind::Default);
    map.insert("operator", TokenKind::Operator);
    map.insert("self", TokenKind::SelfKw);
    map.insert("out", TokenKind::Out);
    map.insert("public", TokenKind::Public);
    map.insert("private", TokenKind::Private);
    map.insert("internal", TokenKind::Internal);
    map.insert("static", TokenKind::Static);

    map.insert("and", TokenKind::And);
    map.insert("or", TokenKind::Or);
    map.insert("not", TokenKind::Not);
    map
}

/// Symbol lexemes ordered by descending length, so the first entry that matches
/// at a position is the longest one.
pub fn build_symbol_table() -> Vec<(&'static str, TokenKind)> {
    let mut symbols = vec![
        ("(", TokenKind::OpenParen),
        (")", TokenKind::CloseParen),
        ("{", TokenKind::OpenCurly),
        ("}", TokenKind::CloseCurly),
        ("[", TokenKind::OpenBracket),
        ("]", TokenKind::CloseBracket),
        (",", TokenKind::Comma),
        (";", TokenKind::Semicolon),
        (":", TokenKind::Colon),
        ("::", TokenKind::ColonColon),
        (".", TokenKind::Dot),
        ("->", TokenKind::Arrow),
        ("=>", TokenKind::FatArrow),
        ("?", TokenKind::Question),
        ("=", TokenKind::Assignment),
        ("==", TokenKind::Equals),
        ("!=", TokenKind::NotEquals),
        ("!", TokenKind::Not),
        ("<", TokenKind::Less),
        ("<=", TokenKind::LessEquals),
        (">", TokenKind::Greater),
        (">=", TokenKind::GreaterEquals),
        ("<<", TokenKind::ShiftLeft),
        (">>", TokenKind::ShiftRight),
        ("&&", TokenKind::And),
        ("||", TokenKind::Or),
        ("&", TokenKind::Ampersand),
        ("|", TokenKind::Pipe),
        ("^", TokenKind::Caret),
        ("~", TokenKind::Tilde),
        ("+", TokenKind::Plus),
        ("-", TokenKind::Dash),
        ("*", TokenKind::Star),
        ("/", TokenKind::Slash),
        ("%", TokenKind::Percent),
        ("+=", TokenKind::PlusEquals),
        ("-=", TokenKind::MinusEquals),
        ("*=", TokenKind::StarEquals),
        ("/=", TokenKind::SlashEquals),
    ];

    // Stable sort keeps the declaration order among lexemes of equal length.
    symbols.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    symbols
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Invalid,

    Integer,
    HexNumber,
    BinNumber,
    Float,
    String,
    Char,
    DocComment,
    Identifier,

    OpenBracket,
    CloseBracket,
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,

    Assignment, // =
    Equals,     // ==
    Not,        // ! and `not`
    NotEquals,  // !=

    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    ShiftLeft,
    ShiftRight,

    Or,  // || and `or`
    And, // && and `and`
    Ampersand,
    Pipe,
    Caret,
    Tilde,

    Dot,
    Semicolon,
    Colon,
    ColonColon,
    Question,
    Comma,
    Arrow,
    FatArrow,

    PlusEquals,
    MinusEquals,
    SlashEquals,
    StarEquals,

    Plus,
    Dash,
    Slash,
    Star,
    Percent,

    // Reserved
    Declare,
    Const,
    Mut,
    Func,
    Return,
    If,
    Else,
    While,
    Do,
    Break,
    Continue,
    Throw,
    True,
    False,
    None,
    Struct,
    Enum,
    Union,
    Module,
    Import,
    Type,
    Default,
    Operator,
    SelfKw,
    Out,
    Public,
    Private,
    Internal,
    Static,
}

impl TokenKind {
    /// How the kind is written in source, used in "expected" messages.
    pub fn spelling(&self) -> String {
        if let Some((lexeme, _)) = SYMBOL_TABLE.iter().find(|(_, kind)| kind == self) {
            return lexeme.to_string();
        }

        if let Some((word, _)) = RESERVED_LOOKUP.iter().find(|(_, kind)| *kind == self) {
            return word.to_string();
        }

        match self {
            TokenKind::Identifier => String::from("identifier"),
            TokenKind::EOF => String::from("EOF"),
            _ => format!("{:?}", self),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Integer
                | TokenKind::HexNumber
                | TokenKind::BinNumber
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::Char
                | TokenKind::True
                | TokenKind::False
                | TokenKind::None
        )
    }

    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            TokenKind::Public | TokenKind::Private | TokenKind::Internal | TokenKind::Static
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A lexeme with its source range.
///
/// `text` is the raw source slice. `value` is the cooked form: escapes decoded
/// for strings and chars, digit separators and radix prefixes stripped for
/// numbers, joined lines for doc comments.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.kind == TokenKind::EOF {
            write!(f, "EOF")
        } else {
            write!(f, "{}", self.text)
        }
    }
}

impl Token {
    pub fn is_one_of_many(&self, tokens: &[TokenKind]) -> bool {
        tokens.contains(&self.kind)
    }
}
