//! Backend handoff.
//!
//! The lowered IR is handed to a [`Backend`] selected by name from a
//! [`BackendRegistry`]. Backends do the target specific emission; this crate
//! only ships [`IrTextBackend`], which renders the IR as text.
//!
//! Reference assemblies and embedded resources are injected by the driver
//! through a [`CompilationContext`] before compilation.

use std::fmt::Display;

use thiserror::Error;

use crate::type_checker::types::TypeRegistry;

use super::compiler::FunctionIr;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("no backend named '{name}' is registered")]
    UnknownTarget { name: String },
    #[error("reference '{path}' could not be resolved")]
    UnresolvedReference { path: String },
    #[error("compilation has {count} error(s) and cannot be emitted")]
    HasErrors { count: usize },
    #[error("backend '{backend}' failed: {message}")]
    Failed { backend: String, message: String },
}

/// Looks up reference assemblies requested by the driver.
pub trait ReferenceResolver {
    /// Returns the resolved location of `path`, if it exists.
    fn resolve_reference(&self, path: &str) -> Option<String>;
}

/// Receives embedded resources.
pub trait ResourceSink {
    fn create_embedded_resource(&mut self, name: &str, bytes: &[u8]) -> Result<(), BackendError>;
}

#[derive(Default)]
pub struct CompilationContext {
    references: Vec<String>,
    resources: Vec<(String, Vec<u8>)>,
    resolver: Option<Box<dyn ReferenceResolver>>,
    sink: Option<Box<dyn ResourceSink>>,
}

impl CompilationContext {
    pub fn new() -> Self {
        CompilationContext::default()
    }

    pub fn with_resolver(mut self, resolver: Box<dyn ReferenceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn ResourceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn add_reference(&mut self, path: impl Into<String>) {
        self.references.push(path.into());
    }

    pub fn add_resource(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.resources.push((name.into(), bytes));
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Resources not yet handed to the sink.
    pub fn pending_resources(&self) -> usize {
        self.resources.len()
    }

    /// Resolves every requested reference. Without a resolver the paths are
    /// taken as they are.
    pub fn resolve_references(&self) -> Result<Vec<String>, BackendError> {
        let Some(resolver) = &self.resolver else {
            return Ok(self.references.clone());
        };

        self.references
            .iter()
            .map(|path| {
                resolver
                    .resolve_reference(path)
                    .ok_or_else(|| BackendError::UnresolvedReference { path: path.clone() })
            })
            .collect()
    }

    /// Hands pending resources to the sink.
    ///
    /// # Returns
    ///
    /// The number of resources written. Without a sink nothing is written and
    /// the resources stay pending.
    pub fn flush_resources(&mut self) -> Result<usize, BackendError> {
        let Some(sink) = self.sink.as_mut() else {
            return Ok(0);
        };

        let resources = std::mem::take(&mut self.resources);
        for (name, bytes) in &resources {
            sink.create_embedded_resource(name, bytes)?;
        }
        Ok(resources.len())
    }
}

/// Borrowed view of everything a backend consumes.
#[derive(Debug, Clone, Copy)]
pub struct Assembly<'a> {
    pub name: &'a str,
    pub functions: &'a [FunctionIr],
    pub types: &'a TypeRegistry,
}

impl Display for Assembly<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "; module {}", self.name)?;

        for def in self.types.iter() {
            writeln!(f, "; {:?} {}", def.kind, def.name)?;
        }

        for function in self.functions {
            writeln!(f)?;
            writeln!(f, "func {}::{} ; {:?}", function.owner, function.signature, function.state)?;
            for (slot, local) in function.locals.iter().enumerate() {
                writeln!(f, "    local{}: {} {}", slot, local.ty, local.name)?;
            }
            write!(f, "{}", function.graph)?;
        }
        Ok(())
    }
}

pub trait Backend {
    /// Identifier the backend is selected by.
    fn name(&self) -> &str;

    fn before_compile(&mut self, _context: &mut CompilationContext) -> Result<(), BackendError> {
        Ok(())
    }

    fn compile(&mut self, assembly: &Assembly<'_>, context: &mut CompilationContext) -> Result<Vec<u8>, BackendError>;

    fn after_compile(&mut self, _context: &mut CompilationContext) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Renders the IR as text.
#[derive(Debug, Default)]
pub struct IrTextBackend {
    references: Vec<String>,
}

impl Backend for IrTextBackend {
    fn name(&self) -> &str {
        "ir"
    }

    fn before_compile(&mut self, context: &mut CompilationContext) -> Result<(), BackendError> {
        self.references = context.resolve_references()?;
        Ok(())
    }

    fn compile(&mut self, assembly: &Assembly<'_>, _context: &mut CompilationContext) -> Result<Vec<u8>, BackendError> {
        let mut text = String::new();
        for reference in &self.references {
            text.push_str(&format!("; reference {}\n", reference));
        }
        text.push_str(&assembly.to_string());
        Ok(text.into_bytes())
    }

    fn after_compile(&mut self, context: &mut CompilationContext) -> Result<(), BackendError> {
        let written = context.flush_resources()?;
        tracing::debug!(written, "embedded resources flushed");
        Ok(())
    }
}

/// Backends keyed by [`Backend::name`].
#[derive(Default)]
pub struct BackendRegistry {
    backends: Vec<Box<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        BackendRegistry::default()
    }

    /// Registry with the backends this crate ships.
    pub fn with_defaults() -> Self {
        let mut registry = BackendRegistry::new();
        registry.register(Box::new(IrTextBackend::default()));
        registry
    }

    /// Registers `backend`, replacing one with the same name.
    pub fn register(&mut self, backend: Box<dyn Backend>) {
        self.backends.retain(|b| b.name() != backend.name());
        self.backends.push(backend);
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut dyn Backend> {
        self.backends
            .iter_mut()
            .find(|b| b.name() == name)
            .map(|b| b.as_mut() as &mut dyn Backend)
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }
}
