//! Parser implementation for building the Abstract Syntax Tree.
//!
//! This module contains the main Parser struct and the program loop.
//! Expressions are parsed by precedence climbing over an `OperatorTable`;
//! statements and declarations are dispatched on their leading token.
//!
//! It maintains lookup tables for:
//! - Statement handlers
//! - Declaration handlers (which receive the collected modifiers)
//! - Primary expression handlers
//! - Type parsing handlers
//!
//! Parsing never fails. Problems are recorded as diagnostics on the token
//! stream and the affected node is replaced with an `Invalid` placeholder.

use std::collections::HashMap;

use crate::{
    ast::ast::{CompilationUnit, Modifier, Stmt},
    errors::errors::{Diagnostics, ErrorImpl},
    lexer::{
        stream::TokenStream,
        tokens::{Token, TokenKind},
    },
    Position, Span,
};

use super::{
    lookups::{
        create_token_lookups, DeclHandler, DeclLookup, OperatorTable, PrimaryHandler, PrimaryLookup, StmtHandler,
        StmtLookup, OPERATOR_TABLE,
    },
    stmt::{parse_modifiers, parse_stmt},
    types::{create_token_type_lookups, TypeLEDHandler, TypeLEDLookup, TypeNUDHandler, TypeNUDLookup},
};

/// Deepest nesting of expressions, statements and types the parser builds.
/// Deeper constructs are reported and skipped.
pub const MAX_NESTING_DEPTH: usize = 128;

/// The main parser structure that maintains parsing state.
///
/// This struct holds the token stream and the lookup tables for parsing
/// statements, declarations, primary expressions and types.
pub struct Parser {
    /// Token stream, which also collects the parse diagnostics
    stream: TokenStream,
    /// Lookup table for statement parsing handlers
    stmt_lookup: StmtLookup,
    /// Lookup table for declaration parsing handlers
    decl_lookup: DeclLookup,
    /// Lookup table for primary expression handlers
    primary_lookup: PrimaryLookup,
    /// Lookup table for type null denotation handlers
    type_nud_lookup: TypeNUDLookup,
    /// Lookup table for type postfix handlers
    type_led_lookup: TypeLEDLookup,
    /// Operator precedences
    operators: &'static OperatorTable,
    /// Current nesting depth, see [`MAX_NESTING_DEPTH`]
    depth: usize,
}

impl Parser {
    /// Creates a new Parser instance with empty lookup tables.
    ///
    /// # Arguments
    ///
    /// * `stream` - The token stream to parse
    /// * `operators` - Operator precedence table
    pub fn new(stream: TokenStream, operators: &'static OperatorTable) -> Self {
        Parser {
            stream,
            stmt_lookup: HashMap::new(),
            decl_lookup: HashMap::new(),
            primary_lookup: HashMap::new(),
            type_nud_lookup: HashMap::new(),
            type_led_lookup: HashMap::new(),
            operators,
            depth: 0,
        }
    }

    /// Creates a parser with every built-in parse point registered.
    pub fn with_default_lookups(stream: TokenStream) -> Self {
        let mut parser = Parser::new(stream, &OPERATOR_TABLE);
        create_token_lookups(&mut parser);
        create_token_type_lookups(&mut parser);
        parser
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        self.stream.current()
    }

    /// Returns the kind of the current token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.stream.current_kind()
    }

    pub fn peek(&self, offset: isize) -> &Token {
        self.stream.peek(offset)
    }

    /// Advances to the next token and returns the previous token.
    pub fn advance(&mut self) -> Token {
        self.stream.next()
    }

    /// Expects a token of the specified kind.
    ///
    /// # Returns
    ///
    /// The consumed token, or an `Invalid` token after reporting the mismatch
    /// and skipping one token.
    pub fn expect(&mut self, expected_kind: TokenKind) -> Token {
        self.stream.expect(expected_kind)
    }

    /// Expects an identifier and returns its text. Recovery yields an empty name.
    pub fn expect_identifier(&mut self, context: &str) -> (String, Span) {
        if self.current_token_kind() == TokenKind::Identifier {
            let token = self.advance();
            return (token.text, token.span);
        }

        let token = self.advance();
        self.error(
            ErrorImpl::UnexpectedTokenDetailed {
                token: token.to_string(),
                message: format!("expected identifier {}", context),
            },
            token.span,
        );
        (String::new(), token.span)
    }

    pub fn consume_if(&mut self, kind: TokenKind) -> Option<Token> {
        self.stream.consume_if(kind)
    }

    pub fn is_match(&self, kind: TokenKind) -> bool {
        self.stream.is_match(kind)
    }

    /// Checks if there are more tokens to parse.
    pub fn has_tokens(&self) -> bool {
        !self.stream.at_end()
    }

    pub fn error(&mut self, error: ErrorImpl, span: Span) {
        self.stream.error(error, span);
    }

    pub fn warning(&mut self, error: ErrorImpl, span: Span) {
        self.stream.warning(error, span);
    }

    /// Enters one nesting level.
    ///
    /// # Returns
    ///
    /// The span of the skipped construct when [`MAX_NESTING_DEPTH`] is
    /// reached. The rest of the construct is reported and skipped, and the
    /// level is not entered.
    pub fn descend(&mut self) -> Result<(), Span> {
        if self.depth >= MAX_NESTING_DEPTH {
            let span = self.skip_nested();
            self.error(ErrorImpl::NestedTooDeeply, span);
            return Err(span);
        }

        self.depth += 1;
        Ok(())
    }

    /// Leaves `levels` nesting levels entered with [`Parser::descend`].
    pub fn ascend(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }

    /// Runs `parse` one nesting level deeper, or builds a placeholder with
    /// `invalid` when the construct is nested too deeply.
    pub fn nested<T>(&mut self, parse: impl FnOnce(&mut Parser) -> T, invalid: impl FnOnce(Span) -> T) -> T {
        if let Err(span) = self.descend() {
            return invalid(span);
        }

        let result = parse(self);
        self.ascend(1);
        result
    }

    /// Skips to the `;` or closing bracket that ends the current construct.
    /// Brackets opened inside the construct are skipped with it.
    fn skip_nested(&mut self) -> Span {
        let start = self.get_position();
        let before = self.stream.position();
        let mut open = 0usize;

        while self.has_tokens() {
            match self.current_token_kind() {
                TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::OpenCurly => open += 1,
                TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseCurly => {
                    if open == 0 {
                        break;
                    }
                    open -= 1;
                }
                TokenKind::Semicolon if open == 0 => break,
                _ => {}
            }
            self.advance();
        }

        let end = if self.stream.position() > before { self.last_end() } else { start };
        Span::new(start, end)
    }

    pub fn stream(&self) -> &TokenStream {
        &self.stream
    }

    pub fn operators(&self) -> &'static OperatorTable {
        self.operators
    }

    /// Returns a reference to the statement lookup table.
    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    /// Returns a reference to the declaration lookup table.
    pub fn get_decl_lookup(&self) -> &DeclLookup {
        &self.decl_lookup
    }

    /// Returns a reference to the primary expression lookup table.
    pub fn get_primary_lookup(&self) -> &PrimaryLookup {
        &self.primary_lookup
    }

    /// Returns a reference to the type NUD lookup table.
    pub fn get_type_nud_lookup(&self) -> &TypeNUDLookup {
        &self.type_nud_lookup
    }

    /// Returns a reference to the type LED lookup table.
    pub fn get_type_led_lookup(&self) -> &TypeLEDLookup {
        &self.type_led_lookup
    }

    /// Registers a statement handler for a token.
    ///
    /// # Arguments
    ///
    /// * `kind` - The token kind to register
    /// * `stmt_fn` - The handler function for this statement type
    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    /// Registers a declaration handler for a keyword.
    pub fn decl(&mut self, kind: TokenKind, decl_fn: DeclHandler) {
        self.decl_lookup.insert(kind, decl_fn);
    }

    /// Registers a primary expression handler for a token.
    pub fn primary(&mut self, kind: TokenKind, primary_fn: PrimaryHandler) {
        self.primary_lookup.insert(kind, primary_fn);
    }

    /// Registers a type postfix handler (`*`, `[]`).
    pub fn type_led(&mut self, kind: TokenKind, led_fn: TypeLEDHandler) {
        self.type_led_lookup.insert(kind, led_fn);
    }

    /// Registers a type null denotation handler.
    pub fn type_nud(&mut self, kind: TokenKind, nud_fn: TypeNUDHandler) {
        self.type_nud_lookup.insert(kind, nud_fn);
    }

    /// Returns the position of the current token.
    pub fn get_position(&self) -> Position {
        self.current_token().span.start
    }

    /// End of the most recently consumed token.
    pub fn last_end(&self) -> Position {
        self.stream.prev().span.end
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.stream.into_diagnostics()
    }
}

/// Parses one top-level item: a declaration (with its modifiers) or a statement.
pub fn parse_top_level(parser: &mut Parser) -> Stmt {
    let start = parser.get_position();
    let modifiers = parse_modifiers(parser);

    if let Some(handler) = parser.get_decl_lookup().get(&parser.current_token_kind()).copied() {
        tracing::trace!(kind = %parser.current_token_kind(), "declaration parse point");
        return handler(parser, modifiers);
    }

    if let Some(first) = modifiers.iter().find(|m| !matches!(m, Modifier::Doc(_))) {
        let span = Span::new(start, parser.get_position());
        parser.error(
            ErrorImpl::UnexpectedTokenDetailed {
                token: first.keyword().to_string(),
                message: String::from("modifiers must be followed by a declaration"),
            },
            span,
        );
    }

    parse_stmt(parser)
}

/// Parses a stream of tokens into a compilation unit.
///
/// This is the main entry point for parsing. It initializes all lookup
/// tables and parses items until EOF. The returned unit is always present;
/// malformed input produces diagnostics and `Invalid` nodes.
///
/// # Arguments
///
/// * `tokens` - Vector of tokens to parse
/// * `diagnostics` - Diagnostics collected so far (usually from the lexer)
#[tracing::instrument(skip_all, fields(tokens = tokens.len()))]
pub fn parse(tokens: Vec<Token>, diagnostics: Diagnostics) -> (CompilationUnit, Diagnostics) {
    let mut parser = Parser::with_default_lookups(TokenStream::new(tokens, diagnostics));
    let start = parser.get_position();

    let mut body = vec![];

    while parser.has_tokens() {
        let before = parser.stream().position();
        let stmt = parse_top_level(&mut parser);
        body.push(stmt);

        // Every parse point consumes at least one token, this only guards
        // against a handler that does not.
        if parser.stream().position() == before {
            parser.advance();
        }
    }

    let unit = CompilationUnit {
        body,
        span: Span::new(start, parser.get_position()),
    };

    tracing::debug!(items = unit.body.len(), "parsed compilation unit");
    (unit, parser.into_diagnostics())
}
