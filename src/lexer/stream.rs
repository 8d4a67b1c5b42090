use crate::{
    errors::errors::{Diagnostics, ErrorImpl},
    Span, MK_TOKEN,
};

use super::tokens::{Token, TokenKind};

/// A finished token sequence with bounded look-ahead.
///
/// The sequence always ends with `EOF`; reading past the end keeps returning
/// that last token.
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Diagnostics,
}

impl TokenStream {
    pub fn new(mut tokens: Vec<Token>, diagnostics: Diagnostics) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::EOF) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or_default();
            tokens.push(MK_TOKEN!(TokenKind::EOF, String::new(), Span::new(end, end)));
        }

        TokenStream {
            tokens,
            pos: 0,
            diagnostics,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn current(&self) -> &Token {
        self.peek(0)
    }

    pub fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Token at `offset` from the current one, clamped to the sequence bounds.
    pub fn peek(&self, offset: isize) -> &Token {
        let last = self.tokens.len() - 1;
        let index = (self.pos as isize + offset).clamp(0, last as isize) as usize;
        &self.tokens[index]
    }

    pub fn prev(&self) -> &Token {
        self.peek(-1)
    }

    /// Advances and returns the token that was current before the call.
    pub fn next(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub fn at_end(&self) -> bool {
        self.current_kind() == TokenKind::EOF
    }

    pub fn is_match(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    pub fn is_match_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current_kind())
    }

    /// Consumes the current token only when it has the given kind.
    pub fn consume_if(&mut self, kind: TokenKind) -> Option<Token> {
        if self.is_match(kind) {
            Some(self.next())
        } else {
            None
        }
    }

    /// Consumes a token of the given kind.
    ///
    /// On a mismatch this reports "Expected 'X' but got 'Y'", still skips one
    /// token and returns an `Invalid` token spanning the skipped one.
    pub fn expect(&mut self, kind: TokenKind) -> Token {
        if self.is_match(kind) {
            return self.next();
        }

        let found = self.next();
        self.diagnostics.error(
            ErrorImpl::UnexpectedToken {
                expected: kind.spelling(),
                found: found.to_string(),
            },
            found.span,
        );

        MK_TOKEN!(TokenKind::Invalid, found.text, found.span)
    }

    /// Reports a problem without consuming anything.
    pub fn error(&mut self, error: ErrorImpl, span: Span) {
        self.diagnostics.error(error, span);
    }

    pub fn warning(&mut self, error: ErrorImpl, span: Span) {
        self.diagnostics.warning(error, span);
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}
