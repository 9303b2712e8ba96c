//! Command line argument parsing for the Wabbit compiler.
//!
//! This module defines the CLI interface using `clap`. The `Cli` struct
//! captures all flags and arguments passed to the `wabc` binary.

use clap::{Parser, ValueEnum};

/// Which back-end consumes the IR.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub(crate) enum Mode {
    /// Execute immediately under the IR interpreter (default).
    Interp,
    /// Emit a WebAssembly binary module (`<stem>.wasm`).
    Wasm,
    /// Emit textual LLVM IR for `clang` (`<stem>.ll`).
    Llvm,
}

/// Command line interface definition for the Wabbit compiler.
///
/// The compiler is a pure function from one `.wb` source file (plus the mode
/// flag) to an artifact: interpreter output on stdout, or a `.wasm`/`.ll`
/// file next to the current working directory.
///
/// ## Exit codes
///
/// * 0 – success.
/// * 1 – one or more compile-time diagnostics (reported on stderr, one per
///   line, as `path:line:col: <Kind>: <message>`).
/// * 2 – I/O failure, runtime trap under the interpreter, or internal error.
///
/// ## Examples
///
/// Run a program directly:
/// ```bash
/// wabc examples/fib.wb
/// ```
///
/// Compile to WebAssembly:
/// ```bash
/// wabc examples/fib.wb --mode wasm -o fib.wasm
/// ```
#[derive(Parser)]
#[command(
    name = "wabc",
    author,
    version,
    about = "Wabbit compiler CLI (wabc)",
    long_about = "The 'wabc' command compiles a single .wb source file. The default mode runs \
the program under the IR interpreter; 'wasm' and 'llvm' emit a WebAssembly binary or textual \
LLVM IR instead."
)]
pub(crate) struct Cli {
    /// Path to the source file to compile.
    pub(crate) path: std::path::PathBuf,

    /// Back-end selection: `interp` (run now), `wasm`, or `llvm`.
    #[clap(long = "mode", value_enum, default_value = "interp")]
    pub(crate) mode: Mode,

    /// Artifact output path (wasm/llvm modes only).
    ///
    /// Defaults to the source stem with the mode's extension in the current
    /// working directory.
    #[clap(short = 'o', long = "output")]
    pub(crate) output: Option<std::path::PathBuf>,
}
