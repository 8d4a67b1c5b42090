/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: `Expr` and `Stmt` sum types, modifiers and the compilation unit
/// - expressions: Payloads of expression variants
/// - statements: Payloads of statement and declaration variants
/// - types: Type names as written in source
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
