//! Main compiler module.
//!
//! This module contains the core `Compiler` structure and drives the
//! lowering pipeline from AST to IR:
//!
//! - A collection pass registers user types, their fields, methods and
//!   operator overloads, and the free functions of the module
//! - Each function body is then lowered into its own [`IrGraph`]
//! - Statements at the top level of the file form an implicit `<toplevel>` body
//!
//! Statements and expressions are lowered by implementors registered in
//! lookup tables, the same way the parser registers its parse points.

use std::{borrow::Cow, collections::HashMap, rc::Rc};

use thiserror::Error;

use crate::{
    ast::{
        ast::{CompilationUnit, Expr, Stmt},
        statements::{FieldDecl, FnDeclStmt},
        types::TypeName,
    },
    config::CompilerOptions,
    errors::errors::{Diagnostics, ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
    scope::scope::{FieldItem, FunctionItem, ParameterItem, ScopeArena, ScopeId, ScopeItem},
    type_checker::{
        deducer::{is_bare_default, DeduceContext, TypeDeducer, Unresolvable},
        types::{Parameter, Signature, Type, TypeDef, TypeKind, TypeRegistry},
    },
    SourceDocument, Span,
};

use super::{
    backend::{Assembly, Backend, BackendError, BackendRegistry, CompilationContext},
    expr::register_expr_implementors,
    fold::fold_constant,
    ir::{BlockId, InstructionKind, IrError, IrGraph, Terminator, ValueTag},
    stmt::register_stmt_implementors,
};

/// Name of the implicit function holding top-level statements.
pub const TOPLEVEL_NAME: &str = "<toplevel>";

#[derive(Debug, Clone, PartialEq)]
pub struct Local {
    pub name: String,
    pub ty: Type,
    pub mutable: bool,
}

/// How lowering of a function body ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionState {
    Normal,
    Returned,
    Thrown,
    Abandoned,
}

/// The lowered form of one function, method, operator or `<toplevel>`.
#[derive(Debug, Clone)]
pub struct FunctionIr {
    pub name: String,
    pub owner: String,
    pub signature: Signature,
    pub graph: IrGraph,
    pub locals: Vec<Local>,
    /// Scope holding the parameters and the body's top-level declarations.
    pub scope: ScopeId,
    pub state: FunctionState,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LowerError {
    #[error(transparent)]
    Unresolvable(#[from] Unresolvable),
    /// A reported error made the rest of the statement list meaningless.
    #[error("lowering abandoned after a reported error")]
    Abandoned,
    #[error("an expression of type none was used as a value")]
    MissingValue,
    #[error("no lowering for {what}")]
    Unsupported { what: String },
    #[error(transparent)]
    Ir(#[from] IrError),
}

/// `Ok` carries the block lowering continues in. Any error abandons the
/// remainder of the enclosing statement lists.
pub type Lowered = Result<BlockId, LowerError>;

/// A lowered expression. `tag` is `None` for `none`-typed results.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub tag: Option<ValueTag>,
    pub ty: Type,
}

impl Value {
    pub fn none() -> Self {
        Value {
            tag: None,
            ty: Type::void(),
        }
    }

    pub fn tag(&self) -> Result<ValueTag, LowerError> {
        self.tag.ok_or(LowerError::MissingValue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTargets {
    pub continue_block: BlockId,
    pub break_block: BlockId,
}

/// Per-function lowering state.
#[derive(Debug, Clone)]
pub struct FunctionBuilder {
    pub graph: IrGraph,
    pub locals: Vec<Local>,
    pub loops: Vec<LoopTargets>,
    /// Set inside instance methods.
    pub self_type: Option<String>,
    pub return_type: Type,
}

impl FunctionBuilder {
    pub fn new(self_type: Option<String>, return_type: Type) -> Self {
        FunctionBuilder {
            graph: IrGraph::new(),
            locals: vec![],
            loops: vec![],
            self_type,
            return_type,
        }
    }

    /// Reserves a local slot.
    pub fn add_local(&mut self, name: &str, ty: Type, mutable: bool) -> usize {
        self.locals.push(Local {
            name: name.to_string(),
            ty,
            mutable,
        });
        self.locals.len() - 1
    }

    pub fn emit(&mut self, block: BlockId, ty: Type, kind: InstructionKind) -> Result<Value, LowerError> {
        let tag = self.graph.append(block, ty.clone(), kind)?;
        Ok(Value { tag, ty })
    }

    /// State of the body judged by the reachable blocks: any open block falls
    /// off the end.
    fn exit_state(&self) -> FunctionState {
        let terminators = self
            .graph
            .reachable_blocks()
            .into_iter()
            .map(|id| self.graph.block(id).and_then(|b| b.terminator.as_ref()))
            .collect::<Vec<Option<&Terminator>>>();

        if terminators.iter().any(Option::is_none) {
            FunctionState::Normal
        } else if terminators.iter().any(|t| matches!(t, Some(Terminator::Return(_)))) {
            FunctionState::Returned
        } else if terminators.iter().any(|t| matches!(t, Some(Terminator::Throw(_)))) {
            FunctionState::Thrown
        } else {
            FunctionState::Normal
        }
    }
}

/// Statement kinds that have an implementor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StmtKind {
    Expression,
    VarDecl,
    If,
    While,
    DoWhile,
    Return,
    Throw,
    Break,
    Continue,
    TypeAlias,
}

impl StmtKind {
    pub fn of(stmt: &Stmt) -> Option<Self> {
        match stmt {
            Stmt::Expression(_) => Some(StmtKind::Expression),
            Stmt::VarDecl(_) => Some(StmtKind::VarDecl),
            Stmt::If(_) => Some(StmtKind::If),
            Stmt::While(_) => Some(StmtKind::While),
            Stmt::DoWhile(_) => Some(StmtKind::DoWhile),
            Stmt::Return(_) => Some(StmtKind::Return),
            Stmt::Throw(_) => Some(StmtKind::Throw),
            Stmt::Break(_) => Some(StmtKind::Break),
            Stmt::Continue(_) => Some(StmtKind::Continue),
            Stmt::TypeAlias(_) => Some(StmtKind::TypeAlias),
            _ => None,
        }
    }
}

/// Type alias for statement implementor functions.
pub type StmtImplementor = fn(&mut Compiler, &mut FunctionBuilder, &Stmt, BlockId, ScopeId) -> Lowered;

/// Type alias for expression lowering functions.
pub type ExprLowering = fn(&mut Compiler, &mut FunctionBuilder, &Expr, BlockId, ScopeId) -> Result<Value, LowerError>;

/// One entry of the ordered expression implementor list. The first entry
/// whose `accepts` returns true lowers the expression.
#[derive(Clone, Copy)]
pub struct ExprImplementor {
    pub name: &'static str,
    pub accepts: fn(&Compiler, &Expr, ScopeId) -> bool,
    pub lower: ExprLowering,
}

/// A function whose signature is declared and whose body still has to be
/// lowered.
struct PendingFunction<'u> {
    signature: Signature,
    owner: String,
    body: Cow<'u, [Stmt]>,
    span: Span,
    parameter_spans: Vec<Span>,
    parent_scope: ScopeId,
    self_type: Option<String>,
}

pub struct Compiler {
    pub options: CompilerOptions,
    pub diagnostics: Diagnostics,
    pub scopes: ScopeArena,
    pub types: TypeRegistry,
    pub module_name: String,
    pub imports: Vec<String>,
    stmt_implementors: HashMap<StmtKind, StmtImplementor>,
    expr_implementors: Vec<ExprImplementor>,
}

impl Compiler {
    /// Creates a compiler with the default implementors registered.
    ///
    /// # Arguments
    ///
    /// * `options` - Compiler configuration
    /// * `diagnostics` - Diagnostics collected by the lexer and parser
    pub fn new(options: &CompilerOptions, diagnostics: Diagnostics) -> Self {
        let mut compiler = Compiler {
            options: options.clone(),
            diagnostics,
            scopes: ScopeArena::new(),
            types: TypeRegistry::new(),
            module_name: options.module_name.clone(),
            imports: vec![],
            stmt_implementors: HashMap::new(),
            expr_implementors: vec![],
        };

        register_stmt_implementors(&mut compiler);
        register_expr_implementors(&mut compiler);
        compiler
    }

    pub fn stmt_implementor(&mut self, kind: StmtKind, implementor: StmtImplementor) {
        self.stmt_implementors.insert(kind, implementor);
    }

    pub fn expr_implementor(
        &mut self,
        name: &'static str,
        accepts: fn(&Compiler, &Expr, ScopeId) -> bool,
        lower: ExprLowering,
    ) {
        self.expr_implementors.push(ExprImplementor { name, accepts, lower });
    }

    pub fn expr_implementor_names(&self) -> Vec<&'static str> {
        self.expr_implementors.iter().map(|i| i.name).collect()
    }

    /// Name of the container owning functions declared outside any type.
    pub fn free_functions_name(&self) -> String {
        format!("{}.FreeFunctions", self.module_name)
    }

    /// Read-only view used for lookups that report nothing.
    pub fn context(&self, scope: ScopeId) -> DeduceContext<'_> {
        DeduceContext {
            scopes: &self.scopes,
            types: &self.types,
            scope,
            self_type: None,
            max_suggestion_distance: self.options.max_suggestion_distance,
        }
    }

    /// Deduces the type of `expr`, reporting problems.
    pub fn deduce(&mut self, expr: &Expr, scope: ScopeId, self_type: Option<&str>) -> Result<Type, Unresolvable> {
        let context = DeduceContext {
            scopes: &self.scopes,
            types: &self.types,
            scope,
            self_type,
            max_suggestion_distance: self.options.max_suggestion_distance,
        };
        TypeDeducer::new(context, &mut self.diagnostics).deduce(expr)
    }

    /// Deduces the type of a statement's root expression.
    ///
    /// # Returns
    ///
    /// `None` when the expression has a reported problem and must be skipped.
    pub fn check(
        &mut self,
        function: &FunctionBuilder,
        expr: &Expr,
        scope: ScopeId,
    ) -> Result<Option<Type>, LowerError> {
        let ty = self.deduce(expr, scope, function.self_type.as_deref())?;
        Ok((!ty.is_unknown()).then_some(ty))
    }

    pub fn resolve_type(&mut self, name: &TypeName, scope: ScopeId) -> Type {
        let context = DeduceContext {
            scopes: &self.scopes,
            types: &self.types,
            scope,
            self_type: None,
            max_suggestion_distance: self.options.max_suggestion_distance,
        };
        context.resolve_type(name, &mut self.diagnostics)
    }

    /// Lowers a statement list starting in `entry`.
    ///
    /// Nested blocks get their own basic block and child scope. Statements
    /// after a terminator go into a fresh unreachable block.
    ///
    /// # Returns
    ///
    /// The block lowering continues in after the list.
    pub fn lower_block(&mut self, function: &mut FunctionBuilder, body: &[Stmt], entry: BlockId, scope: ScopeId) -> Lowered {
        let mut current = entry;
        let mut warned = false;

        for stmt in body {
            if function.graph.is_sealed(current) {
                if self.options.warn_unreachable && !warned {
                    self.diagnostics.warning(ErrorImpl::UnreachableCode, *stmt.get_span());
                    warned = true;
                }
                current = function.graph.new_unreachable_block();
            }

            current = match stmt {
                Stmt::Block(block) => {
                    let inner = function.graph.new_block();
                    function.graph.seal(current, Terminator::Jump(inner))?;
                    let child = self.scopes.child_scope(scope);
                    self.lower_block(function, &block.body, inner, child)?
                }
                _ => self.lower_stmt(function, stmt, current, scope)?,
            };
        }

        Ok(current)
    }

    pub fn lower_stmt(&mut self, function: &mut FunctionBuilder, stmt: &Stmt, block: BlockId, scope: ScopeId) -> Lowered {
        let Some(implementor) = StmtKind::of(stmt).and_then(|kind| self.stmt_implementors.get(&kind).copied()) else {
            tracing::trace!(?stmt, "no statement implementor, skipped");
            return Ok(block);
        };

        implementor(self, function, stmt, block, scope)
    }

    /// Lowers a body that may be a single statement or a braced block into a
    /// child scope.
    pub fn lower_body(&mut self, function: &mut FunctionBuilder, body: &Stmt, entry: BlockId, scope: ScopeId) -> Lowered {
        let child = self.scopes.child_scope(scope);
        match body {
            Stmt::Block(block) => self.lower_block(function, &block.body, entry, child),
            other => self.lower_block(function, std::slice::from_ref(other), entry, child),
        }
    }

    /// Lowers an expression whose type has already been checked.
    pub fn lower_expression(
        &mut self,
        function: &mut FunctionBuilder,
        expr: &Expr,
        block: BlockId,
        scope: ScopeId,
    ) -> Result<Value, LowerError> {
        if let Some(folded) = fold_constant(expr) {
            return function.emit(block, folded.ty, InstructionKind::Constant(folded.value));
        }

        let implementor = self
            .expr_implementors
            .iter()
            .find(|implementor| (implementor.accepts)(self, expr, scope))
            .copied();

        match implementor {
            Some(implementor) => {
                tracing::trace!(implementor = implementor.name, "lowering expression");
                (implementor.lower)(self, function, expr, block, scope)
            }
            None => Err(LowerError::Unsupported {
                what: format!("expression at line {}", expr.get_span().start.line),
            }),
        }
    }

    /// Lowers `value` for storing into a slot of type `target`. A bare
    /// `default` takes the target type.
    pub fn lower_value_for(
        &mut self,
        function: &mut FunctionBuilder,
        value: &Expr,
        target: &Type,
        block: BlockId,
        scope: ScopeId,
    ) -> Result<Value, LowerError> {
        if is_bare_default(value) {
            return function.emit(block, target.clone(), InstructionKind::Default);
        }
        self.lower_expression(function, value, block, scope)
    }

    fn declare_builtins(&mut self) {
        let root = self.scopes.root();
        let builtins = [
            ("print", vec![Type::object()]),
            ("print", vec![Type::string()]),
            ("println", vec![]),
            ("println", vec![Type::object()]),
            ("println", vec![Type::string()]),
        ];

        for (name, parameters) in builtins {
            let item = ScopeItem::Function(FunctionItem {
                overloads: vec![Signature::builtin(name, &parameters)],
            });
            self.scopes.declare(root, name, item);
        }
    }

    /// Declares one overload, rejecting a second one with the same
    /// parameter types.
    fn declare_function(&mut self, scope: ScopeId, signature: Signature, span: Span) -> bool {
        let duplicate = match self.scopes.get(scope).and_then(|s| s.get(&signature.name)) {
            Some(ScopeItem::Function(set)) => set.overloads.iter().any(|o| o.same_parameters(&signature)),
            Some(_) => true,
            None => false,
        };

        if duplicate {
            self.diagnostics.error(
                ErrorImpl::FunctionAlreadyDeclared {
                    function: signature.name.clone(),
                },
                span,
            );
            return false;
        }

        let name = signature.name.clone();
        self.scopes.declare(
            scope,
            &name,
            ScopeItem::Function(FunctionItem {
                overloads: vec![signature],
            }),
        )
    }

    fn signature_of(&mut self, decl: &FnDeclStmt, owner: &str, is_static: bool) -> Signature {
        let root = self.scopes.root();
        let parameters = decl
            .parameters
            .iter()
            .map(|parameter| Parameter {
                name: parameter.name.clone(),
                ty: self.resolve_type(&parameter.ty, root),
                is_out: parameter.is_out,
            })
            .collect();

        let return_type = match &decl.return_type {
            Some(ty) => self.resolve_type(ty, root),
            None => Type::void(),
        };

        Signature {
            name: decl.name.clone(),
            owner: Some(owner.to_string()),
            parameters,
            return_type,
            is_static,
        }
    }

    fn pending<'u>(&self, decl: &'u FnDeclStmt, signature: Signature, parent_scope: ScopeId) -> PendingFunction<'u> {
        let self_type = (!signature.is_static).then(|| signature.owner.clone()).flatten();
        PendingFunction {
            owner: signature.owner.clone().unwrap_or_else(|| self.free_functions_name()),
            signature,
            body: Cow::Borrowed(&decl.body.body),
            span: decl.span,
            parameter_spans: decl.parameters.iter().map(|p| p.span).collect(),
            parent_scope,
            self_type,
        }
    }

    fn declare_field(&mut self, owner: &str, scope: ScopeId, field: &FieldDecl, is_static: bool) {
        let root = self.scopes.root();
        let ty = self.resolve_type(&field.ty, root);

        if let Some(value) = &field.value {
            if let Ok(value_type) = self.deduce(value, root, None) {
                let known = !value_type.is_unknown() && !ty.is_unknown();
                if known && !is_bare_default(value) && !value_type.is_assignable_to(&ty) {
                    self.diagnostics.error(
                        ErrorImpl::TypeMatchError {
                            expected: ty.to_string(),
                            received: value_type.to_string(),
                        },
                        *value.get_span(),
                    );
                }
            }
        }

        let item = ScopeItem::Field(FieldItem {
            ty,
            mutable: !field.is_constant,
            is_static,
            owner: owner.to_string(),
        });

        if !self.scopes.declare(scope, &field.name, item) {
            self.diagnostics.error(
                ErrorImpl::VariableAlreadyDeclared {
                    variable: field.name.clone(),
                },
                field.span,
            );
        }
    }

    /// Registers user types and aliases, then their members and the free
    /// functions. Returns the bodies to lower.
    fn collect<'u>(&mut self, unit: &'u CompilationUnit) -> Vec<PendingFunction<'u>> {
        let root = self.scopes.root();

        for stmt in &unit.body {
            let (name, kind, span) = match stmt {
                Stmt::StructDecl(s) => (&s.name, TypeKind::Struct, s.span),
                Stmt::EnumDecl(e) => (&e.name, TypeKind::Enum, e.span),
                Stmt::UnionDecl(u) => (&u.name, TypeKind::Union, u.span),
                _ => continue,
            };

            let scope = self.scopes.child_scope(root);
            let registered = self.types.register(TypeDef {
                name: name.clone(),
                kind,
                scope,
                span,
            });
            if !registered {
                self.diagnostics
                    .error(ErrorImpl::TypeAlreadyDeclared { name: name.clone() }, span);
            }
        }

        for stmt in &unit.body {
            if let Stmt::TypeAlias(alias) = stmt {
                let target = self.resolve_type(&alias.target, root);
                if !self.scopes.declare_alias(root, &alias.name, target) {
                    self.diagnostics.error(
                        ErrorImpl::TypeAlreadyDeclared {
                            name: alias.name.clone(),
                        },
                        alias.span,
                    );
                }
            }
        }

        let mut pending = vec![];
        let free_functions = self.free_functions_name();

        for stmt in &unit.body {
            match stmt {
                Stmt::StructDecl(decl) => {
                    let Some(scope) = self.owned_scope(&decl.name, decl.span) else {
                        continue;
                    };

                    for field in &decl.fields {
                        self.declare_field(&decl.name, scope, field, field.is_static());
                    }

                    for method in &decl.methods {
                        let signature = self.signature_of(method, &decl.name, method.is_static());
                        if self.declare_function(scope, signature.clone(), method.span) {
                            pending.push(self.pending(method, signature, scope));
                        }
                    }

                    for operator in &decl.operators {
                        let signature = self.signature_of(&operator.function, &decl.name, true);
                        if self.declare_function(scope, signature.clone(), operator.function.span) {
                            pending.push(self.pending(&operator.function, signature, scope));
                        }
                    }
                }
                Stmt::EnumDecl(decl) => {
                    let Some(scope) = self.owned_scope(&decl.name, decl.span) else {
                        continue;
                    };

                    for variant in &decl.variants {
                        if let Some(value) = &variant.value {
                            if let Ok(ty) = self.deduce(value, root, None) {
                                if !ty.is_unknown() && !ty.is_integer() {
                                    self.diagnostics.error(
                                        ErrorImpl::TypeMatchError {
                                            expected: String::from("an integer"),
                                            received: ty.to_string(),
                                        },
                                        *value.get_span(),
                                    );
                                }
                            }
                        }

                        let item = ScopeItem::Field(FieldItem {
                            ty: Type::Named(decl.name.clone()),
                            mutable: false,
                            is_static: true,
                            owner: decl.name.clone(),
                        });
                        if !self.scopes.declare(scope, &variant.name, item) {
                            self.diagnostics.error(
                                ErrorImpl::VariableAlreadyDeclared {
                                    variable: variant.name.clone(),
                                },
                                variant.span,
                            );
                        }
                    }
                }
                Stmt::UnionDecl(decl) => {
                    let Some(scope) = self.owned_scope(&decl.name, decl.span) else {
                        continue;
                    };

                    for member in &decl.members {
                        self.declare_field(&decl.name, scope, member, member.is_static());
                    }
                }
                Stmt::FnDecl(decl) => {
                    let signature = self.signature_of(decl, &free_functions, true);
                    if self.declare_function(root, signature.clone(), decl.span) {
                        pending.push(self.pending(decl, signature, root));
                    }
                }
                Stmt::Module(module) => tracing::debug!(module = %module.path, "module declared"),
                Stmt::Import(import) => {
                    tracing::debug!(import = %import.path, "import recorded");
                    self.imports.push(import.path.clone());
                }
                _ => {}
            }
        }

        let toplevel = unit
            .top_level_statements()
            .filter(|stmt| !matches!(stmt, Stmt::TypeAlias(_)))
            .cloned()
            .collect::<Vec<Stmt>>();

        if let (Some(first), Some(last)) = (toplevel.first(), toplevel.last()) {
            let span = first.get_span().to(last.get_span());
            pending.push(PendingFunction {
                signature: Signature {
                    name: TOPLEVEL_NAME.to_string(),
                    owner: Some(free_functions.clone()),
                    parameters: vec![],
                    return_type: Type::void(),
                    is_static: true,
                },
                owner: free_functions,
                body: Cow::Owned(toplevel),
                span,
                parameter_spans: vec![],
                parent_scope: root,
                self_type: None,
            });
        }

        pending
    }

    /// Scope of a type registered by this declaration. A duplicate
    /// declaration of the same name has none.
    fn owned_scope(&self, name: &str, span: Span) -> Option<ScopeId> {
        self.types.get(name).filter(|def| def.span == span).map(|def| def.scope)
    }

    #[tracing::instrument(skip_all, fields(function = %pending.signature.name, owner = %pending.owner))]
    fn lower_function(&mut self, pending: PendingFunction<'_>) -> FunctionIr {
        let scope = self.scopes.child_scope(pending.parent_scope);

        for (index, parameter) in pending.signature.parameters.iter().enumerate() {
            let item = ScopeItem::Parameter(ParameterItem {
                ty: parameter.ty.clone(),
                is_out: parameter.is_out,
                index,
            });

            if !self.scopes.declare(scope, &parameter.name, item) {
                let span = pending.parameter_spans.get(index).copied().unwrap_or_else(Span::synthetic);
                self.diagnostics.error(
                    ErrorImpl::VariableAlreadyDeclared {
                        variable: parameter.name.clone(),
                    },
                    span,
                );
            }
        }

        let mut function = FunctionBuilder::new(pending.self_type.clone(), pending.signature.return_type.clone());
        let entry = function.graph.entry();

        let reported = self.diagnostics.errors().count();
        let state = match self.lower_block(&mut function, &pending.body, entry, scope) {
            Ok(_) => function.exit_state(),
            Err(error) => {
                tracing::warn!(%error, "function body abandoned");
                // An abandoned body always leaves an error behind.
                if self.diagnostics.errors().count() == reported {
                    self.diagnostics.error(
                        ErrorImpl::LoweringFailed {
                            function: pending.signature.name.clone(),
                            reason: error.to_string(),
                        },
                        pending.span,
                    );
                }
                FunctionState::Abandoned
            }
        };

        function.graph.seal_open_blocks();

        tracing::debug!(
            blocks = function.graph.blocks().len(),
            instructions = function.graph.instruction_count(),
            ?state,
            "lowered function"
        );

        FunctionIr {
            name: pending.signature.name.clone(),
            owner: pending.owner,
            signature: pending.signature,
            graph: function.graph,
            locals: function.locals,
            scope,
            state,
        }
    }

    /// Runs the collection pass and lowers every function of the unit.
    #[tracing::instrument(skip_all, fields(declarations = unit.body.len()))]
    pub fn compile(&mut self, unit: &CompilationUnit) -> Vec<FunctionIr> {
        if let Some(Stmt::Module(module)) = unit.body.iter().find(|s| matches!(s, Stmt::Module(_))) {
            self.module_name = module.path.clone();
        }

        self.declare_builtins();
        let pending = self.collect(unit);

        tracing::debug!(types = self.types.len(), functions = pending.len(), "collected declarations");

        pending.into_iter().map(|p| self.lower_function(p)).collect()
    }

    pub fn finish(self, unit: CompilationUnit, functions: Vec<FunctionIr>) -> Compilation {
        Compilation {
            unit,
            functions,
            scopes: self.scopes,
            types: self.types,
            diagnostics: self.diagnostics,
            module_name: self.module_name,
            imports: self.imports,
        }
    }
}

/// Everything produced for one source document.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub unit: CompilationUnit,
    pub functions: Vec<FunctionIr>,
    pub scopes: ScopeArena,
    pub types: TypeRegistry,
    pub diagnostics: Diagnostics,
    pub module_name: String,
    pub imports: Vec<String>,
}

impl Compilation {
    pub fn function(&self, name: &str) -> Option<&FunctionIr> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    pub fn assembly(&self) -> Assembly<'_> {
        Assembly {
            name: &self.module_name,
            functions: &self.functions,
            types: &self.types,
        }
    }

    /// Hands the IR to `backend`. A compilation with errors is never emitted.
    pub fn emit(&self, backend: &mut dyn Backend, context: &mut CompilationContext) -> Result<Vec<u8>, BackendError> {
        let errors = self.diagnostics.errors().count();
        if errors > 0 {
            return Err(BackendError::HasErrors { count: errors });
        }

        backend.before_compile(context)?;
        let artifact = backend.compile(&self.assembly(), context)?;
        backend.after_compile(context)?;

        tracing::debug!(backend = backend.name(), bytes = artifact.len(), "emitted");
        Ok(artifact)
    }

    /// Like [`Compilation::emit`], with the backend looked up by name.
    pub fn emit_with(
        &self,
        registry: &mut BackendRegistry,
        target: &str,
        context: &mut CompilationContext,
    ) -> Result<Vec<u8>, BackendError> {
        let backend = registry.get_mut(target).ok_or_else(|| BackendError::UnknownTarget {
            name: target.to_string(),
        })?;
        self.emit(backend, context)
    }
}

/// Compiles one document: lexing, parsing, collection and lowering.
///
/// A missing or empty document yields a single `EmptyFile` error and nothing
/// else.
#[tracing::instrument(skip_all, fields(file = %document.filename))]
pub fn compile(document: &SourceDocument, options: &CompilerOptions) -> Compilation {
    let name = document.name();
    let mut diagnostics = Diagnostics::new(Rc::clone(&name));

    let text = match document.text.as_deref() {
        Some(text) if !text.is_empty() => text,
        _ => {
            diagnostics.error(ErrorImpl::EmptyFile, Span::synthetic());
            return Compiler::new(options, diagnostics).finish(CompilationUnit::default(), vec![]);
        }
    };

    let (tokens, diagnostics) = tokenize(text, Rc::clone(&name));
    let (unit, diagnostics) = parse(tokens, diagnostics);

    let mut compiler = Compiler::new(options, diagnostics);
    let functions = compiler.compile(&unit);

    tracing::debug!(
        functions = functions.len(),
        diagnostics = compiler.diagnostics.len(),
        "compiled unit"
    );

    compiler.finish(unit, functions)
}
