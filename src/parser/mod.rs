//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into an Abstract Syntax Tree. It uses precedence climbing for
//! expressions and handles:
//!
//! - Statement parsing (variable declarations, control flow, blocks)
//! - Declaration parsing (functions, structs, enums, unions, modules, imports)
//! - Expression parsing (binary, prefix and postfix operators, calls, literals)
//! - Type parsing for type annotations
//! - Error recovery and reporting
//!
//! Every statement and declaration form is registered in a lookup table keyed
//! by its leading token, so the program and block loops never change when a
//! form is added.

pub mod decl;
pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;
