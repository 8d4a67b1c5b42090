//! Lexical scopes and name resolution.
//!
//! Scopes form a tree stored in an arena:
//!
//! - the root scope holds builtins and free functions
//! - each user type gets a scope for its fields and methods
//! - each function body and nested block gets a child scope
//!
//! Function names accumulate into one overload set per scope; any other
//! name may be declared once per scope and shadows outer declarations.

pub mod scope;
