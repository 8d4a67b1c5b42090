//! Type checking and semantic analysis module.
//!
//! This module resolves written types and deduces the static type of
//! expressions against the scope arena. It provides:
//!
//! - Semantic `Type`s with the primitive and literal tables
//! - The user type registry
//! - `TypeDeducer`, which reports mismatches and unresolved names
//! - Overload resolution for calls and operator overloads
//! - "Did you mean" suggestions
//!
//! Deduction never stops at the first problem. A failed sub-expression
//! becomes `Type::Unknown` and the caller decides what to skip.

pub mod deducer;
pub mod overload;
pub mod suggest;
pub mod types;

#[cfg(test)]
mod tests;
