use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Diagnostics, ErrorImpl},
    Position, Span, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP, SYMBOL_TABLE};

pub type RegexHandler = fn(&mut Lexer<'_>, &Regex);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

lazy_static! {
    /// Scanners in recognition order. Symbols are matched afterwards from the
    /// symbol table.
    static ref PATTERNS: Vec<RegexPattern> = build_patterns();
}

fn build_patterns() -> Vec<RegexPattern> {
    let sources: [(&str, RegexHandler); 10] = [
        (r"^///[^\n]*(?:\r?\n[ \t]*///[^\n]*)*", doc_comment_handler),
        (r"^\s+", skip_handler),
        (r"^//[^\n]*", skip_handler),
        (r"^/\*", block_comment_handler),
        (r"^'", char_handler),
        (r#"^""#, string_handler),
        (r"^0[xX][0-9a-fA-F_]*", hex_handler),
        (r"^0[bB][01_]*", binary_handler),
        (r"^[0-9][0-9_]*(?:\.[0-9][0-9_]*)?", number_handler),
        (r"^[\p{L}_][\p{L}\p{N}_]*", symbol_handler),
    ];

    sources
        .into_iter()
        .filter_map(|(source, handler)| Regex::new(source).ok().map(|regex| RegexPattern { regex, handler }))
        .collect()
}

pub struct Lexer<'a> {
    tokens: Vec<Token>,
    source: &'a str,
    symbols: &'a [(&'static str, TokenKind)],
    pos: usize,
    line: usize,
    column: usize,
    diagnostics: Diagnostics,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file: Rc<String>) -> Lexer<'a> {
        Lexer::with_symbols(source, file, &SYMBOL_TABLE)
    }

    /// Creates a lexer over an explicit symbol table, which must be ordered by
    /// descending lexeme length.
    pub fn with_symbols(source: &'a str, file: Rc<String>, symbols: &'a [(&'static str, TokenKind)]) -> Lexer<'a> {
        Lexer {
            tokens: vec![],
            source,
            symbols,
            pos: 0,
            line: 1,
            column: 1,
            diagnostics: Diagnostics::new(file),
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.pos, self.line, self.column)
    }

    /// Moves forward by `n` bytes, keeping line and column in step.
    pub fn advance_n(&mut self, n: usize) {
        let end = (self.pos + n).min(self.source.len());
        for ch in self.source[self.pos..end].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos = end;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Pushes a token covering the next `len` bytes and moves past them.
    fn push_span(&mut self, kind: TokenKind, len: usize, value: String) {
        let start = self.position();
        let text = self.source[self.pos..self.pos + len].to_string();
        self.advance_n(len);
        let span = Span::new(start, self.position());
        self.push(MK_TOKEN!(kind, text, value, span));
    }

    pub fn at(&self) -> Option<char> {
        self.remainder().chars().next()
    }

    pub fn remainder(&self) -> &'a str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn error(&mut self, error: ErrorImpl, start: Position) {
        let span = Span::new(start, self.position());
        self.diagnostics.error(error, span);
    }

    /// Longest-match lookup in the symbol table.
    fn lex_symbol(&mut self) -> bool {
        let remaining = self.remainder();
        let found = self
            .symbols
            .iter()
            .find(|(lexeme, _)| remaining.starts_with(lexeme))
            .map(|(lexeme, kind)| (lexeme.len(), *kind));

        match found {
            Some((len, kind)) => {
                let value = remaining[..len].to_string();
                self.push_span(kind, len, value);
                true
            }
            None => false,
        }
    }

    fn lex_invalid(&mut self) {
        let Some(ch) = self.at() else { return };
        let start = self.position();
        self.push_span(TokenKind::Invalid, ch.len_utf8(), ch.to_string());
        self.error(ErrorImpl::UnrecognisedToken { token: ch.to_string() }, start);
    }
}

fn matched_len(lexer: &Lexer, regex: &Regex) -> usize {
    regex.find(lexer.remainder()).map(|m| m.end()).unwrap_or(0)
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = matched_len(lexer, regex);
    lexer.advance_n(len);
}

fn doc_comment_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = matched_len(lexer, regex);
    let raw = &lexer.remainder()[..len];
    let value = raw
        .lines()
        .map(|line| line.trim().trim_start_matches("///").trim())
        .collect::<Vec<&str>>()
        .join("\n");

    lexer.push_span(TokenKind::DocComment, len, value);
}

fn block_comment_handler(lexer: &mut Lexer, _regex: &Regex) {
    let start = lexer.position();
    match lexer.remainder()[2..].find("*/") {
        Some(end) => lexer.advance_n(end + 4),
        None => {
            let rest = lexer.remainder().len();
            lexer.advance_n(rest);
            lexer.error(ErrorImpl::UnclosedComment, start);
        }
    }
}

/// Scans a quoted literal starting at the opening `quote`. Returns the raw
/// length consumed and whether the closing quote was found. Stops at a line
/// break so an unterminated literal only swallows its own line.
fn scan_quoted(remaining: &str, quote: char) -> (usize, bool) {
    let mut chars = remaining.char_indices().skip(1);

    while let Some((index, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '\n' => return (index, false),
            c if c == quote => return (index + c.len_utf8(), true),
            _ => {}
        }
    }

    (remaining.len(), false)
}

fn char_handler(lexer: &mut Lexer, _regex: &Regex) {
    let start = lexer.position();
    let (len, closed) = scan_quoted(lexer.remainder(), '\'');
    let inner_end = if closed { len - 1 } else { len };
    let value = unescape(&lexer.remainder()[1..inner_end]);
    let literal = lexer.remainder()[..len].to_string();
    let single = value.chars().count() == 1;

    lexer.push_span(TokenKind::Char, len, value);
    if !closed {
        lexer.error(ErrorImpl::UnterminatedLiteral { kind: String::from("Char") }, start);
    } else if !single {
        lexer.error(ErrorImpl::InvalidCharLiteral { literal }, start);
    }
}

fn string_handler(lexer: &mut Lexer, _regex: &Regex) {
    let start = lexer.position();
    let (len, closed) = scan_quoted(lexer.remainder(), '"');
    let inner_end = if closed { len - 1 } else { len };
    let value = unescape(&lexer.remainder()[1..inner_end]);

    lexer.push_span(TokenKind::String, len, value);
    if !closed {
        lexer.error(ErrorImpl::UnterminatedLiteral { kind: String::from("String") }, start);
    }
}

/// Decodes `\n \t \r \\ \" \' \0 \xHH`. Unknown escapes keep the backslash.
pub fn unescape(raw: &str) -> String {
    let mut result = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        match chars.peek().copied() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some('0') => result.push('\0'),
            Some('x') => {
                chars.next();
                let mut hex = String::new();
                while hex.len() < 2 {
                    match chars.peek() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            hex.push(*c);
                            chars.next();
                        }
                        _ => break,
                    }
                }

                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) => result.push(byte as char),
                    Err(_) => {
                        result.push_str("\\x");
                        result.push_str(&hex);
                    }
                }
                continue;
            }
            Some(_) => {
                // Keep the backslash
                result.push(ch);
                continue;
            }
            None => {
                result.push(ch);
                continue;
            }
        }
        chars.next();
    }

    result
}

fn hex_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = matched_len(lexer, regex);
    let digits = lexer.remainder()[2..len].replace('_', "");
    lexer.push_span(TokenKind::HexNumber, len, digits);
}

fn binary_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = matched_len(lexer, regex);
    let digits = lexer.remainder()[2..len].replace('_', "");
    lexer.push_span(TokenKind::BinNumber, len, digits);
}

fn number_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = matched_len(lexer, regex);
    let matched = &lexer.remainder()[..len];
    let kind = if matched.contains('.') { TokenKind::Float } else { TokenKind::Integer };
    let value = matched.replace('_', "");
    lexer.push_span(kind, len, value);
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = matched_len(lexer, regex);
    let word = &lexer.remainder()[..len];

    let kind = RESERVED_LOOKUP.get(word).copied().unwrap_or(TokenKind::Identifier);
    let value = word.to_string();
    lexer.push_span(kind, len, value);
}

/// Converts `source` into tokens. Never fails: problems become diagnostics and
/// `Invalid` tokens, and the result always ends with `EOF`.
#[tracing::instrument(skip_all, fields(file = %file, bytes = source.len()))]
pub fn tokenize(source: &str, file: Rc<String>) -> (Vec<Token>, Diagnostics) {
    let mut lex = Lexer::new(source, file);

    while !lex.at_eof() {
        let before = lex.pos;
        let pattern = PATTERNS.iter().find(|pattern| pattern.regex.is_match(lex.remainder()));

        match pattern {
            Some(pattern) => (pattern.handler)(&mut lex, &pattern.regex),
            None => {
                if !lex.lex_symbol() {
                    lex.lex_invalid();
                }
            }
        }

        if lex.pos == before {
            lex.lex_invalid();
        }
    }

    let end = lex.position();
    lex.push(MK_TOKEN!(TokenKind::EOF, String::new(), Span::new(end, end)));

    tracing::debug!(tokens = lex.tokens.len(), diagnostics = lex.diagnostics.len(), "tokenized");
    (lex.tokens, lex.diagnostics)
}
