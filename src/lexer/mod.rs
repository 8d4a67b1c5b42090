//! Lexical analysis module for the compiler.
//!
//! This module contains the lexer (tokenizer) that converts source code
//! into a stream of tokens for parsing. It handles:
//!
//! - Tokenization of source code using anchored regex patterns
//! - Recognition of keywords, word operators, identifiers, literals and symbols
//! - Longest-match symbol lookup
//! - Line/column tracking for diagnostics
//! - Recovery from malformed input via `Invalid` tokens
//!
//! `TokenStream` wraps the finished sequence for the parser.

pub mod lexer;
pub mod stream;
pub mod tokens;

#[cfg(test)]
mod tests;
