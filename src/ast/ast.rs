use crate::Span;

use super::{
    expressions::{ArrayExpr, BinaryExpr, CallExpr, DefaultExpr, IdentifierExpr, LiteralExpr, TupleExpr, UnaryExpr},
    statements::{
        BlockStmt, DoWhileStmt, EnumDeclStmt, ExpressionStmt, FnDeclStmt, IfStmt, ImportStmt, ModuleStmt, ReturnStmt,
        StructDeclStmt, ThrowStmt, TypeAliasStmt, UnionDeclStmt, VarDeclStmt, WhileStmt,
    },
};

/// Modifiers and attributes attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    Public,
    Private,
    Internal,
    Static,
    Doc(String),
}

impl Modifier {
    pub fn is_visibility(&self) -> bool {
        matches!(self, Modifier::Public | Modifier::Private | Modifier::Internal)
    }

    pub fn keyword(&self) -> &str {
        match self {
            Modifier::Public => "public",
            Modifier::Private => "private",
            Modifier::Internal => "internal",
            Modifier::Static => "static",
            Modifier::Doc(_) => "///",
        }
    }
}

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralExpr),
    Identifier(IdentifierExpr),
    SelfRef(Span),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Call(CallExpr),
    Tuple(TupleExpr),
    Array(ArrayExpr),
    Default(DefaultExpr),
    /// Placeholder left behind by error recovery.
    Invalid(Span),
}

impl Expr {
    pub fn get_span(&self) -> &Span {
        match self {
            Expr::Literal(e) => &e.span,
            Expr::Identifier(e) => &e.span,
            Expr::SelfRef(span) => span,
            Expr::Binary(e) => &e.span,
            Expr::Unary(e) => &e.span,
            Expr::Call(e) => &e.span,
            Expr::Tuple(e) => &e.span,
            Expr::Array(e) => &e.span,
            Expr::Default(e) => &e.span,
            Expr::Invalid(span) => span,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Expr::Invalid(_))
    }
}

/// Statement node. Declarations are statements too so one dispatch loop can
/// drive both.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(ExpressionStmt),
    VarDecl(VarDeclStmt),
    Block(BlockStmt),
    If(IfStmt),
    While(WhileStmt),
    DoWhile(DoWhileStmt),
    Return(ReturnStmt),
    Throw(ThrowStmt),
    Break(Span),
    Continue(Span),
    TypeAlias(TypeAliasStmt),
    FnDecl(FnDeclStmt),
    StructDecl(StructDeclStmt),
    EnumDecl(EnumDeclStmt),
    UnionDecl(UnionDeclStmt),
    Module(ModuleStmt),
    Import(ImportStmt),
    Invalid(Span),
}

impl Stmt {
    pub fn get_span(&self) -> &Span {
        match self {
            Stmt::Expression(s) => &s.span,
            Stmt::VarDecl(s) => &s.span,
            Stmt::Block(s) => &s.span,
            Stmt::If(s) => &s.span,
            Stmt::While(s) => &s.span,
            Stmt::DoWhile(s) => &s.span,
            Stmt::Return(s) => &s.span,
            Stmt::Throw(s) => &s.span,
            Stmt::Break(span) | Stmt::Continue(span) | Stmt::Invalid(span) => span,
            Stmt::TypeAlias(s) => &s.span,
            Stmt::FnDecl(s) => &s.span,
            Stmt::StructDecl(s) => &s.span,
            Stmt::EnumDecl(s) => &s.span,
            Stmt::UnionDecl(s) => &s.span,
            Stmt::Module(s) => &s.span,
            Stmt::Import(s) => &s.span,
        }
    }

    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            Stmt::FnDecl(_)
                | Stmt::StructDecl(_)
                | Stmt::EnumDecl(_)
                | Stmt::UnionDecl(_)
                | Stmt::Module(_)
                | Stmt::Import(_)
        )
    }
}

/// Root of a parsed document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompilationUnit {
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl CompilationUnit {
    pub fn functions(&self) -> impl Iterator<Item = &FnDeclStmt> {
        self.body.iter().filter_map(|stmt| match stmt {
            Stmt::FnDecl(f) => Some(f),
            _ => None,
        })
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDeclStmt> {
        self.body.iter().filter_map(|stmt| match stmt {
            Stmt::StructDecl(s) => Some(s),
            _ => None,
        })
    }

    /// Statements outside any declaration, in source order.
    pub fn top_level_statements(&self) -> impl Iterator<Item = &Stmt> {
        self.body.iter().filter(|stmt| !stmt.is_declaration())
    }
}
