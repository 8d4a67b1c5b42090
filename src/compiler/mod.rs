//! Lowering from AST to IR.
//!
//! This module turns a parsed compilation unit into one IR graph per
//! function. It handles:
//!
//! - Collection of types, fields, methods, operator overloads and free functions
//! - Statement and expression lowering through registered implementors
//! - Constant folding of literal-only expressions
//! - Handing the finished IR to a pluggable backend

pub mod backend;
pub mod compiler;
pub mod expr;
pub mod fold;
pub mod ir;
pub mod stmt;
