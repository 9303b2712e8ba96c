#![warn(clippy::pedantic)]
//! LLVM Code Generation Crate
//!
//! Emits textual LLVM IR for consumption by `clang`, which links it against a
//! small C runtime providing `_printi(i32)` and `_printf(double)`. No LLVM
//! library is linked; the artifact *is* the text.

mod compiler;

use wabbit_ir::module::IrModule;

use crate::compiler::Emitter;

/// Emit textual LLVM IR for the module.
///
/// # Errors
///
/// Emission of a type-checked module cannot fail; the `Result` carries the
/// orchestration boundary. Malformed IR (unbalanced control) panics instead
/// of producing bad text.
pub fn codegen(module: &IrModule) -> anyhow::Result<String> {
    Ok(Emitter::new(module).emit())
}
