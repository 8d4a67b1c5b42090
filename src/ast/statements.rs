use std::slice::Iter;

use crate::Span;

use super::{
    ast::{Expr, Modifier, Stmt},
    types::TypeName,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl BlockStmt {
    pub fn iter(&self) -> Iter<'_, Stmt> {
        self.body.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStmt {
    pub expression: Expr,
    pub span: Span,
}

/// `declare [const] name[: T] [= value];` or `const name[: T] = value;`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclStmt {
    pub is_constant: bool,
    pub name: String,
    pub explicit_type: Option<TypeName>,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_body: Box<Stmt>,
    pub else_body: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoWhileStmt {
    pub body: Box<Stmt>,
    pub condition: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStmt {
    pub value: Expr,
    pub span: Span,
}

/// `type Alias = T;`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasStmt {
    pub name: String,
    pub target: TypeName,
    pub span: Span,
}

// DECLARATIONS

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl {
    pub name: String,
    pub ty: TypeName,
    pub is_out: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnDeclStmt {
    pub name: String,
    pub parameters: Vec<ParameterDecl>,
    pub return_type: Option<TypeName>,
    pub body: BlockStmt,
    pub modifiers: Vec<Modifier>,
    pub span: Span,
}

impl FnDeclStmt {
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeName,
    pub is_constant: bool,
    pub value: Option<Expr>,
    pub modifiers: Vec<Modifier>,
    pub span: Span,
}

impl FieldDecl {
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(&Modifier::Static)
    }
}

/// `operator + (a: T, b: T) -> T { ... }` inside a struct.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorDecl {
    pub operator: String,
    pub function: FnDeclStmt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDeclStmt {
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<FnDeclStmt>,
    pub operators: Vec<OperatorDecl>,
    pub modifiers: Vec<Modifier>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    pub name: String,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDeclStmt {
    pub name: String,
    pub variants: Vec<EnumVariant>,
    pub modifiers: Vec<Modifier>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionDeclStmt {
    pub name: String,
    pub members: Vec<FieldDecl>,
    pub modifiers: Vec<Modifier>,
    pub span: Span,
}

/// `module a.b;`
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleStmt {
    pub path: String,
    pub span: Span,
}

/// `import a.b;`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportStmt {
    pub path: String,
    pub span: Span,
}
