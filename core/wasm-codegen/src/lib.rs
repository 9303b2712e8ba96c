#![warn(clippy::pedantic)]
//! WebAssembly Code Generation Crate
//!
//! Translates the stack IR directly into a WebAssembly 1.0 binary module.
//! No toolchain is involved: sections are assembled byte by byte with LEB128
//! encodings, and the result runs on any engine that supplies the
//! `env._printi`/`env._printf` imports and calls the exported `main`.

mod compiler;
mod encoder;

use wabbit_ir::module::IrModule;

use crate::compiler::Compiler;

/// Emit a binary WebAssembly module for the IR.
///
/// # Errors
///
/// Emission of a type-checked module cannot fail; the `Result` carries the
/// orchestration boundary. Malformed IR (unbalanced control) panics instead
/// of producing bad bytes.
pub fn codegen(module: &IrModule) -> anyhow::Result<Vec<u8>> {
    Ok(Compiler::new(module).compile())
}
