//! Compiler configuration.
//!
//! `CompilerOptions` is handed to [`crate::compile_unit_with`] by the driver. The
//! defaults are what [`crate::compile_unit`] uses.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Qualifies the synthetic free-functions container. A `module` declaration
    /// in the source overrides it.
    pub module_name: String,
    /// Identifier of the backend selected from a `BackendRegistry`.
    pub target: String,
    /// Largest edit distance still offered as a "did you mean" suggestion.
    pub max_suggestion_distance: usize,
    pub warn_unreachable: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            module_name: String::from("main"),
            target: String::from("ir"),
            max_suggestion_distance: 3,
            warn_unreachable: true,
        }
    }
}

impl CompilerOptions {
    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }
}
