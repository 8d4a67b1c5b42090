//! Diagnostics shared by every stage of the compiler.
//!
//! Nothing in the pipeline raises errors across stage boundaries. Each stage
//! appends to a [`errors::Diagnostics`] list instead:
//!
//! - Lexical problems (unrecognised characters, unterminated literals)
//! - Syntactic problems (unexpected tokens at a match point)
//! - Semantic problems (unresolved names, type mismatches, immutability)
//!
//! Severity and source range travel with every message.

pub mod errors;

#[cfg(test)]
mod tests;
