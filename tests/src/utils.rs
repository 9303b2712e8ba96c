//! Shared helpers for the test suite.

use wabbit::diagnostics::Diagnostics;
use wabbit_ir::module::IrModule;

/// Path to a `.wb` fixture under `tests/test_data/wb/`.
pub(crate) fn test_data_path(name: &str) -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join("wb")
        .join(name)
}

pub(crate) fn read_fixture(name: &str) -> String {
    let path = test_data_path(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|error| panic!("failed to read {}: {error}", path.display()))
}

/// Compile source to IR, panicking on diagnostics.
pub(crate) fn compile_ir(source: &str) -> IrModule {
    wabbit::compile_ir(source).unwrap_or_else(|diagnostics| {
        panic!("compilation failed: {diagnostics:?}");
    })
}

/// Compile and run under the interpreter, returning the print output.
pub(crate) fn run_interp(source: &str) -> String {
    let ir = compile_ir(source);
    let mut out = Vec::new();
    wabbit::interpret(&ir, &mut out).expect("interpretation should succeed");
    String::from_utf8(out).expect("print output is UTF-8")
}

/// Type-check source expected to be ill-formed; returns its diagnostics.
pub(crate) fn expect_diagnostics(source: &str) -> Diagnostics {
    match wabbit::parse(source) {
        Err(diagnostics) => diagnostics,
        Ok(module) => wabbit::type_check(module)
            .err()
            .expect("source should produce diagnostics"),
    }
}
