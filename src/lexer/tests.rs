//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Keywords, word operators and identifiers
//! - Numeric literals (decimal, float, hex, binary, separators)
//! - String and char literals with escape sequences
//! - Longest-match symbol lookup
//! - Comments and doc comments
//! - Recovery from malformed input
//! - The token stream wrapper

use std::rc::Rc;

use super::{
    lexer::{tokenize, unescape},
    stream::TokenStream,
    tokens::{build_symbol_table, Token, TokenKind},
};

fn lex(source: &str) -> Vec<Token> {
    let (tokens, diagnostics) = tokenize(source, Rc::new("test.lang".to_string()));
    assert!(diagnostics.is_empty(), "unexpected diagnostics for {:?}", source);
    tokens
}

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).iter().map(|t| t.kind).collect()
}

fn stream(source: &str) -> TokenStream {
    let (tokens, diagnostics) = tokenize(source, Rc::new("test.lang".to_string()));
    TokenStream::new(tokens, diagnostics)
}

#[test]
fn test_tokenize_keywords() {
    let tokens = lex("declare const func if else while do return break continue throw struct enum union");

    assert_eq!(tokens[0].kind, TokenKind::Declare);
    assert_eq!(tokens[1].kind, TokenKind::Const);
    assert_eq!(tokens[2].kind, TokenKind::Func);
    assert_eq!(tokens[3].kind, TokenKind::If);
    assert_eq!(tokens[4].kind, TokenKind::Else);
    assert_eq!(tokens[5].kind, TokenKind::While);
    assert_eq!(tokens[6].kind, TokenKind::Do);
    assert_eq!(tokens[7].kind, TokenKind::Return);
    assert_eq!(tokens[8].kind, TokenKind::Break);
    assert_eq!(tokens[9].kind, TokenKind::Continue);
    assert_eq!(tokens[10].kind, TokenKind::Throw);
    assert_eq!(tokens[11].kind, TokenKind::Struct);
    assert_eq!(tokens[12].kind, TokenKind::Enum);
    assert_eq!(tokens[13].kind, TokenKind::Union);
    assert_eq!(tokens[14].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_word_operators() {
    assert_eq!(
        kinds("a and b or not c"),
        vec![
            TokenKind::Identifier,
            TokenKind::And,
            TokenKind::Identifier,
            TokenKind::Or,
            TokenKind::Not,
            TokenKind::Identifier,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_tokenize_identifiers() {
    let tokens = lex("foo baz_123 _underscore CamelCase größe");

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].text, "foo");
    assert_eq!(tokens[1].text, "baz_123");
    assert_eq!(tokens[2].text, "_underscore");
    assert_eq!(tokens[3].text, "CamelCase");
    assert_eq!(tokens[4].kind, TokenKind::Identifier);
    assert_eq!(tokens[4].text, "größe");
    assert_eq!(tokens[5].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_numbers() {
    let tokens = lex("42 3.14 1_000_000 0xFF_FF 0b1010_0101");

    assert_eq!(tokens[0].kind, TokenKind::Integer);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].kind, TokenKind::Float);
    assert_eq!(tokens[1].value, "3.14");
    assert_eq!(tokens[2].kind, TokenKind::Integer);
    assert_eq!(tokens[2].text, "1_000_000");
    assert_eq!(tokens[2].value, "1000000");
    assert_eq!(tokens[3].kind, TokenKind::HexNumber);
    assert_eq!(tokens[3].value, "FFFF");
    assert_eq!(tokens[4].kind, TokenKind::BinNumber);
    assert_eq!(tokens[4].value, "10100101");
    assert_eq!(tokens[5].kind, TokenKind::EOF);
}

#[test]
fn test_dot_without_digit_is_left_for_member_access() {
    assert_eq!(
        kinds("1.foo"),
        vec![TokenKind::Integer, TokenKind::Dot, TokenKind::Identifier, TokenKind::EOF]
    );
}

#[test]
fn test_tokenize_strings() {
    let tokens = lex(r#""hello" "multiple words" """#);

    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "hello");
    assert_eq!(tokens[0].text, "\"hello\"");
    assert_eq!(tokens[1].value, "multiple words");
    assert_eq!(tokens[2].value, "");
    assert_eq!(tokens[3].kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_string_escapes() {
    let tokens = lex(r#""hello\nworld" "tab\there" "backslash\\" "hex\x41" "quote\"test""#);

    assert_eq!(tokens[0].value, "hello\nworld");
    assert_eq!(tokens[1].value, "tab\there");
    assert_eq!(tokens[2].value, "backslash\\");
    assert_eq!(tokens[3].value, "hexA");
    assert_eq!(tokens[4].value, "quote\"test");
    assert_eq!(tokens[5].kind, TokenKind::EOF);
}

#[test]
fn test_unknown_escape_keeps_backslash() {
    assert_eq!(unescape(r"a\qb"), "a\\qb");
    assert_eq!(unescape(r"end\"), "end\\");
}

#[test]
fn test_tokenize_chars() {
    let tokens = lex(r"'a' '\n' '\''");

    assert_eq!(tokens[0].kind, TokenKind::Char);
    assert_eq!(tokens[0].value, "a");
    assert_eq!(tokens[1].value, "\n");
    assert_eq!(tokens[2].value, "'");
}

#[test]
fn test_unterminated_string_reports_and_continues() {
    let (tokens, diagnostics) = tokenize("\"abc\nx", Rc::new("test.lang".to_string()));

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.iter().next().unwrap().message(), "Unterminated String-Literal");
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "abc");
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert_eq!(tokens[2].kind, TokenKind::EOF);
}

#[test]
fn test_unterminated_char() {
    let (tokens, diagnostics) = tokenize("'a", Rc::new("test.lang".to_string()));

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.iter().next().unwrap().message(), "Unterminated Char-Literal");
    assert_eq!(tokens[0].kind, TokenKind::Char);
    assert_eq!(tokens.last().unwrap().kind, TokenKind::EOF);
}

#[test]
fn test_char_literal_holds_one_character() {
    let (tokens, diagnostics) = tokenize("'' 'ab' 'c'", Rc::new("test.lang".to_string()));

    let messages: Vec<String> = diagnostics.iter().map(|d| d.message()).collect();
    assert_eq!(
        messages,
        vec![
            "char literal '' must hold exactly one character",
            "char literal 'ab' must hold exactly one character",
        ]
    );
    assert_eq!(tokens[0].kind, TokenKind::Char);
    assert_eq!(tokens[1].kind, TokenKind::Char);
    assert_eq!(tokens[2].value, "c");
    assert_eq!(diagnostics.iter().next().unwrap().get_span().start.offset, 0);
}

#[test]
fn test_tokenize_operators() {
    assert_eq!(
        kinds("+ - * / % == != < > <= >= = && || << >> += -= *= /="),
        vec![
            TokenKind::Plus,
            TokenKind::Dash,
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Percent,
            TokenKind::Equals,
            TokenKind::NotEquals,
            TokenKind::Less,
            TokenKind::Greater,
            TokenKind::LessEquals,
            TokenKind::GreaterEquals,
            TokenKind::Assignment,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::ShiftLeft,
            TokenKind::ShiftRight,
            TokenKind::PlusEquals,
            TokenKind::MinusEquals,
            TokenKind::StarEquals,
            TokenKind::SlashEquals,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_longest_match() {
    assert_eq!(
        kinds("a => b"),
        vec![TokenKind::Identifier, TokenKind::FatArrow, TokenKind::Identifier, TokenKind::EOF]
    );
    assert_eq!(kinds("a==b")[1], TokenKind::Equals);
    assert_eq!(kinds("T::m")[1], TokenKind::ColonColon);
}

#[test]
fn test_symbol_table_is_ordered_by_length() {
    let table = build_symbol_table();
    for pair in table.windows(2) {
        assert!(pair[0].0.len() >= pair[1].0.len());
    }
}

#[test]
fn test_tokenize_punctuation() {
    assert_eq!(
        kinds("( ) { } [ ] . , ; : -> ? ~ & | ^"),
        vec![
            TokenKind::OpenParen,
            TokenKind::CloseParen,
            TokenKind::OpenCurly,
            TokenKind::CloseCurly,
            TokenKind::OpenBracket,
            TokenKind::CloseBracket,
            TokenKind::Dot,
            TokenKind::Comma,
            TokenKind::Semicolon,
            TokenKind::Colon,
            TokenKind::Arrow,
            TokenKind::Question,
            TokenKind::Tilde,
            TokenKind::Ampersand,
            TokenKind::Pipe,
            TokenKind::Caret,
            TokenKind::EOF
        ]
    );
}

#[test]
fn test_tokenize_comments() {
    let tokens = lex("declare x = 5; // trailing\n/* block\n comment */ declare y = 10;");

    assert_eq!(tokens[0].kind, TokenKind::Declare);
    assert_eq!(tokens[1].text, "x");
    assert_eq!(tokens[3].value, "5");
    assert_eq!(tokens[5].kind, TokenKind::Declare);
    assert_eq!(tokens[6].text, "y");
    assert_eq!(tokens[6].span.start.line, 3);
    assert_eq!(tokens[10].kind, TokenKind::EOF);
}

#[test]
fn test_unclosed_block_comment() {
    let (tokens, diagnostics) = tokenize("x /* never closed", Rc::new("test.lang".to_string()));

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.iter().next().unwrap().get_error_name(), "UnclosedComment");
    assert_eq!(tokens.len(), 2);
}

#[test]
fn test_doc_comments_fold() {
    let tokens = lex("/// first line\n  /// second line\nfunc f() {}");

    assert_eq!(tokens[0].kind, TokenKind::DocComment);
    assert_eq!(tokens[0].value, "first line\nsecond line");
    assert_eq!(tokens[1].kind, TokenKind::Func);
}

#[test]
fn test_positions() {
    let tokens = lex("declare x\n  = 42;");

    assert_eq!(tokens[0].span.start.line, 1);
    assert_eq!(tokens[0].span.start.column, 1);
    assert_eq!(tokens[1].span.start.column, 9);
    assert_eq!(tokens[2].span.start.line, 2);
    assert_eq!(tokens[2].span.start.column, 3);
    assert_eq!(tokens[3].span.start.offset, 14);
    assert_eq!(tokens[3].span.end.offset, 16);
}

#[test]
fn test_tokenize_unrecognized_token() {
    let (tokens, diagnostics) = tokenize("declare x = @ 1;", Rc::new("test.lang".to_string()));

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.iter().next().unwrap().get_error_name(), "UnrecognisedToken");
    assert_eq!(tokens[3].kind, TokenKind::Invalid);
    assert_eq!(tokens[3].text, "@");
    assert_eq!(tokens[4].kind, TokenKind::Integer);
    assert_eq!(tokens.last().unwrap().kind, TokenKind::EOF);
}

#[test]
fn test_tokenize_empty_input() {
    let tokens = lex("");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::EOF);
}

#[test]
fn test_stream_peek_clamps() {
    let mut stream = stream("a b");

    assert_eq!(stream.peek(-5).text, "a");
    assert_eq!(stream.peek(1).text, "b");
    assert_eq!(stream.peek(100).kind, TokenKind::EOF);

    stream.next();
    stream.next();
    stream.next();
    stream.next();
    assert!(stream.at_end());
    assert_eq!(stream.prev().text, "b");
}

#[test]
fn test_stream_next_returns_previous_token() {
    let mut stream = stream("a b");

    let token = stream.next();
    assert_eq!(token.text, "a");
    assert_eq!(stream.current().text, "b");
}

#[test]
fn test_stream_expect_recovers() {
    let mut stream = stream("( a");

    let open = stream.expect(TokenKind::OpenParen);
    assert_eq!(open.kind, TokenKind::OpenParen);

    let before = stream.position();
    let placeholder = stream.expect(TokenKind::CloseParen);

    assert_eq!(placeholder.kind, TokenKind::Invalid);
    assert_eq!(stream.position(), before + 1);
    assert_eq!(stream.diagnostics().len(), 1);
    assert_eq!(stream.diagnostics().iter().next().unwrap().message(), "Expected ')' but got 'a'");
}

#[test]
fn test_stream_without_eof_gets_one() {
    let stream = TokenStream::new(vec![], Default::default());
    assert!(stream.at_end());
}

#[test]
fn test_consume_if() {
    let mut stream = stream("; x");

    assert!(stream.consume_if(TokenKind::Comma).is_none());
    assert!(stream.consume_if(TokenKind::Semicolon).is_some());
    assert!(stream.is_match(TokenKind::Identifier));
}
