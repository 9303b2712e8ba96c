#![warn(clippy::pedantic)]
//! Core Orchestration Crate for the Wabbit Compiler
//!
//! This crate provides the main entry points for the compiler pipeline:
//!
//! ```text
//! .wb source → tokens → AST → typed AST → stack IR → { interp | .wasm | .ll }
//! ```
//!
//! Each phase is exposed as a standalone function; data flows strictly
//! forward and every phase owns its output.
//!
//! ## Quick Start
//!
//! ```rust
//! fn run(source: &str) -> anyhow::Result<String> {
//!     let ir = wabbit::compile_ir(source)
//!         .map_err(|diags| anyhow::anyhow!("{} diagnostic(s)", diags.len()))?;
//!     let mut out = Vec::new();
//!     wabbit::interpret(&ir, &mut out)?;
//!     Ok(String::from_utf8(out)?)
//! }
//!
//! assert_eq!(run("print 2 + 3 * -4;").unwrap(), "-10\n");
//! ```
//!
//! ## Architecture
//!
//! This crate is a thin layer over the phase crates:
//!
//! - [`wabbit_ast`] - lexer, recursive-descent parser, AST nodes
//! - [`wabbit_type_checker`] - scope chain, two-pass checking, annotations
//! - [`wabbit_ir`] - stack IR, lowering, interpreter
//! - [`wabbit_wasm_codegen`] - WebAssembly 1.0 binary emission
//! - [`wabbit_llvm_codegen`] - textual LLVM IR emission
//!
//! ## Error Handling
//!
//! Frontend failures surface as [`diagnostics::Diagnostic`] values in
//! emission order; the CLI renders them `path:line:col: <Kind>: <message>`.
//! Back-end entry points return `anyhow::Result`: on a type-checked module
//! they cannot fail, and malformed IR is a compiler bug that panics rather
//! than producing a malformed artifact.

use std::io::Write;

use wabbit_ast::nodes::Module;
use wabbit_ast::parser;
use wabbit_ir::module::IrModule;
use wabbit_type_checker::TypeCheckerBuilder;
use wabbit_type_checker::typed_context::TypedContext;

pub mod diagnostics;

use crate::diagnostics::{Diagnostic, Diagnostics, from_check_failure};

/// Parse source text into an AST module.
///
/// # Errors
///
/// Returns the first lexical or syntactic diagnostic; the parser does not
/// recover.
pub fn parse(source: &str) -> Result<Module, Diagnostics> {
    parser::parse_module(source).map_err(|error| vec![Diagnostic::from(&error)])
}

/// Type-check a parsed module.
///
/// # Errors
///
/// Returns every accumulated semantic diagnostic, in emission order.
pub fn type_check(module: Module) -> Result<TypedContext, Diagnostics> {
    TypeCheckerBuilder::build_typed_context(module)
        .map(TypeCheckerBuilder::typed_context)
        .map_err(|failure| from_check_failure(&failure))
}

/// Lower a type-checked module to stack IR.
#[must_use]
pub fn lower(ctx: &TypedContext) -> IrModule {
    wabbit_ir::generator::generate(ctx)
}

/// Convenience: source text all the way to IR.
///
/// # Errors
///
/// Returns the diagnostics of the first failing phase.
pub fn compile_ir(source: &str) -> Result<IrModule, Diagnostics> {
    let module = parse(source)?;
    let ctx = type_check(module)?;
    Ok(lower(&ctx))
}

/// Execute the IR under the interpreter, writing `print` lines to `out`,
/// and return the entry function's result.
///
/// # Errors
///
/// Returns an error on a runtime trap (division by zero, out-of-bounds
/// memory, call to an unbound import, …).
pub fn interpret<W: Write>(module: &IrModule, out: W) -> anyhow::Result<i32> {
    Ok(wabbit_ir::interp::interpret(module, out)?)
}

/// Emit a binary WebAssembly module.
///
/// # Errors
///
/// Cannot fail on generator-produced IR; see [`wabbit_wasm_codegen::codegen`].
pub fn compile_wasm(module: &IrModule) -> anyhow::Result<Vec<u8>> {
    wabbit_wasm_codegen::codegen(module)
}

/// Emit textual LLVM IR.
///
/// # Errors
///
/// Cannot fail on generator-produced IR; see [`wabbit_llvm_codegen::codegen`].
pub fn compile_llvm(module: &IrModule) -> anyhow::Result<String> {
    wabbit_llvm_codegen::codegen(module)
}
