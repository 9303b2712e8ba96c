#![warn(clippy::pedantic)]
//! Type Checker Crate
//!
//! Semantic analysis for the Wabbit language: name resolution over a scope
//! chain, duplicate detection, and type annotation of every expression with
//! one of `{int, float, bool, void}` (no implicit conversions).
//!
//! ## Entry Point
//!
//! Use [`TypeCheckerBuilder`] to type-check a parsed module:
//!
//! ```ignore
//! let module = wabbit_ast::parser::parse_module(source)?;
//! let typed_context = TypeCheckerBuilder::build_typed_context(module)?.typed_context();
//! ```
//!
//! ## Architecture
//!
//! Checking runs in two passes (see [`type_checker`]): module-scope
//! declarations are hoisted first so definitions may refer to each other in
//! any order, then every function body and the implicit entry are typed.
//! Diagnostics accumulate across top-level items; the first error within an
//! item aborts that item only.
//!
//! ## Modules
//!
//! - [`errors`] - Diagnostics with source locations and user-visible kinds
//! - [`type_info`] - The closed `TypeInfo` set
//! - [`typed_context`] - Node-id keyed annotations and module layout tables

use std::marker::PhantomData;

use wabbit_ast::nodes::Module;

use crate::errors::CheckFailure;
use crate::type_checker::TypeChecker;
use crate::typed_context::TypedContext;

pub mod errors;
pub mod symbol_table;
pub mod type_checker;
pub mod type_info;
pub mod typed_context;

/// Marker state indicating builder has not yet been initialized with a module.
pub struct TypeCheckerInitState;

/// Marker state indicating type checking is complete and context is ready.
pub struct TypeCheckerCompleteState;

/// Type alias for a completed type checker builder ready to yield its context.
pub type CompletedTypeCheckerBuilder = TypeCheckerBuilder<TypeCheckerCompleteState>;

/// Builder for running type checking on a parsed module.
///
/// Uses the typestate pattern to ensure type checking completes before
/// accessing the typed context.
pub struct TypeCheckerBuilder<S> {
    typed_context: TypedContext,
    _state: PhantomData<S>,
}

impl Default for TypeCheckerBuilder<TypeCheckerInitState> {
    fn default() -> Self {
        TypeCheckerBuilder::new()
    }
}

impl TypeCheckerBuilder<TypeCheckerInitState> {
    #[must_use]
    pub fn new() -> Self {
        TypeCheckerBuilder {
            typed_context: TypedContext::default(),
            _state: PhantomData,
        }
    }

    /// Run type checking on the provided module and return a completed builder.
    ///
    /// # Errors
    ///
    /// Returns every accumulated diagnostic if the module is ill-formed.
    #[must_use = "returns builder with typed context, extract with .typed_context()"]
    pub fn build_typed_context(
        module: Module,
    ) -> Result<TypeCheckerBuilder<TypeCheckerCompleteState>, CheckFailure> {
        let mut ctx = TypedContext::new(module);
        let checker = TypeChecker::default();
        checker.run(&mut ctx)?;
        Ok(TypeCheckerBuilder {
            typed_context: ctx,
            _state: PhantomData,
        })
    }
}

impl TypeCheckerBuilder<TypeCheckerCompleteState> {
    /// Consume the builder and return the typed context.
    #[must_use = "consumes builder and returns the typed context"]
    pub fn typed_context(self) -> TypedContext {
        self.typed_context
    }
}
