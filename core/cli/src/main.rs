#![warn(clippy::pedantic)]

//! # Wabbit Compiler CLI
//!
//! Command line driver for the Wabbit pipeline.
//!
//! 1. Parse and type-check the single `.wb` input file.
//! 2. Lower to stack IR.
//! 3. Dispatch on `--mode`: run under the interpreter (default), or emit a
//!    WebAssembly binary / textual LLVM IR artifact.
//!
//! Diagnostics go to stderr as `path:line:col: <Kind>: <message>`, one per
//! line, with exit code 1. I/O failures, interpreter traps, and internal
//! errors exit with code 2. Program `print` output goes to stdout.

mod parser;

use clap::Parser;
use parser::{Cli, Mode};
use std::{fs, io, path::PathBuf, process};

fn main() {
    let args = Cli::parse();
    let path_display = args.path.display().to_string();

    let source = match fs::read_to_string(&args.path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("error: failed to read {path_display}: {error}");
            process::exit(2);
        }
    };

    let ir = match wabbit::compile_ir(&source) {
        Ok(ir) => ir,
        Err(diagnostics) => {
            for diagnostic in &diagnostics {
                eprintln!("{}", diagnostic.render(&path_display));
            }
            process::exit(1);
        }
    };

    match args.mode {
        Mode::Interp => {
            let stdout = io::stdout();
            if let Err(error) = wabbit::interpret(&ir, stdout.lock()) {
                eprintln!("runtime error: {error}");
                process::exit(2);
            }
        }
        Mode::Wasm => {
            let wasm = match wabbit::compile_wasm(&ir) {
                Ok(wasm) => wasm,
                Err(error) => {
                    eprintln!("error: wasm emission failed: {error}");
                    process::exit(2);
                }
            };
            let output = artifact_path(&args.output, &args.path, "wasm");
            if let Err(error) = fs::write(&output, &wasm) {
                eprintln!("error: failed to write {}: {error}", output.display());
                process::exit(2);
            }
            println!("wasm written to {}", output.display());
        }
        Mode::Llvm => {
            let llvm = match wabbit::compile_llvm(&ir) {
                Ok(llvm) => llvm,
                Err(error) => {
                    eprintln!("error: llvm emission failed: {error}");
                    process::exit(2);
                }
            };
            let output = artifact_path(&args.output, &args.path, "ll");
            if let Err(error) = fs::write(&output, &llvm) {
                eprintln!("error: failed to write {}: {error}", output.display());
                process::exit(2);
            }
            println!("llvm written to {}", output.display());
        }
    }
    process::exit(0);
}

/// `-o` wins; otherwise `<stem>.<ext>` in the current working directory.
fn artifact_path(output: &Option<PathBuf>, source: &std::path::Path, extension: &str) -> PathBuf {
    if let Some(path) = output {
        return path.clone();
    }
    let stem = source
        .file_stem()
        .unwrap_or_else(|| std::ffi::OsStr::new("module"))
        .to_string_lossy()
        .into_owned();
    PathBuf::from(format!("{stem}.{extension}"))
}
