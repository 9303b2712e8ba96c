//! WebAssembly back-end tests.
//!
//! Structure tests decode the section framing directly; semantics tests
//! instantiate the module under `wasmtime` with host `_printi`/`_printf`
//! closures that capture output, then compare against the interpreter.

use wasmtime::{Caller, Engine, Linker, Module, Store};

use crate::utils::{compile_ir, read_fixture, run_interp};

fn compile_wasm(source: &str) -> Vec<u8> {
    let ir = compile_ir(source);
    wabbit_wasm_codegen::codegen(&ir).expect("wasm emission should succeed")
}

/// Split a binary module into its (section id, payload) framing.
fn section_ids(wasm: &[u8]) -> Vec<u8> {
    assert_eq!(&wasm[..4], b"\0asm", "magic");
    assert_eq!(&wasm[4..8], &[1, 0, 0, 0], "version");
    let mut ids = Vec::new();
    let mut offset = 8;
    while offset < wasm.len() {
        let id = wasm[offset];
        offset += 1;
        // Section sizes are unsigned LEB128.
        let mut size = 0usize;
        let mut shift = 0;
        loop {
            let byte = wasm[offset];
            offset += 1;
            size |= usize::from(byte & 0x7F) << shift;
            shift += 7;
            if byte & 0x80 == 0 {
                break;
            }
        }
        ids.push(id);
        offset += size;
    }
    ids
}

/// Execute under wasmtime, returning the captured print lines and the value
/// of `main`.
fn run_wasm(wasm: &[u8]) -> anyhow::Result<(Vec<String>, i32)> {
    let engine = Engine::default();
    let module = Module::new(&engine, wasm)?;
    let mut store = Store::new(&engine, Vec::<String>::new());
    let mut linker = Linker::new(&engine);
    linker.func_wrap(
        "env",
        "_printi",
        |mut caller: Caller<'_, Vec<String>>, value: i32| {
            caller.data_mut().push(value.to_string());
        },
    )?;
    linker.func_wrap(
        "env",
        "_printf",
        |mut caller: Caller<'_, Vec<String>>, value: f64| {
            caller.data_mut().push(value.to_string());
        },
    )?;
    let instance = linker.instantiate(&mut store, &module)?;
    let main = instance.get_typed_func::<(), i32>(&mut store, "main")?;
    let result = main.call(&mut store, ())?;
    Ok((store.into_data(), result))
}

/// Interpreter and wasm artifact must print the same lines.
fn assert_agreement(source: &str) {
    let interp_lines: Vec<String> = run_interp(source).lines().map(str::to_string).collect();
    let (wasm_lines, _) = run_wasm(&compile_wasm(source)).expect("wasm should execute");
    assert_eq!(interp_lines, wasm_lines, "for {source:?}");
}

#[test]
fn module_framing_without_memory() {
    let wasm = compile_wasm("print 1;");
    assert_eq!(section_ids(&wasm), vec![1, 2, 3, 6, 7, 10]);
}

#[test]
fn module_framing_with_memory() {
    let wasm = compile_wasm(&read_fixture("memory.wb"));
    assert_eq!(section_ids(&wasm), vec![1, 2, 3, 5, 6, 7, 10]);
}

#[test]
fn emission_is_deterministic() {
    let source = read_fixture("fib.wb");
    assert_eq!(compile_wasm(&source), compile_wasm(&source));
}

#[test]
fn host_imports_come_first() {
    let wasm = compile_wasm("print 1;");
    let env = b"env";
    let printi = b"_printi";
    let printf = b"_printf";
    let position = |needle: &[u8]| {
        wasm.windows(needle.len())
            .position(|window| window == needle)
            .unwrap_or_else(|| panic!("missing {needle:?}"))
    };
    assert!(position(env) < position(printi));
    assert!(position(printi) < position(printf));
}

#[test]
fn validates_and_runs_arithmetic() {
    let (lines, result) = run_wasm(&compile_wasm("print 2 + 3 * -4;")).expect("should run");
    assert_eq!(lines, vec!["-10"]);
    assert_eq!(result, 0);
}

#[test]
fn user_main_result_is_returned() {
    let (_, result) = run_wasm(&compile_wasm("func main() int { return 7; }")).expect("should run");
    assert_eq!(result, 7);
}

#[test]
fn exports_its_memory_when_used() {
    let wasm = compile_wasm(&read_fixture("memory.wb"));
    let engine = Engine::default();
    let module = Module::new(&engine, &wasm).expect("should validate");
    let exports: Vec<String> = module
        .exports()
        .map(|export| export.name().to_string())
        .collect();
    assert!(exports.contains(&"main".to_string()));
    assert!(exports.contains(&"memory".to_string()));
}

#[test]
fn user_imports_resolve_at_their_declared_indices() {
    let source = "import func add1(x int) int; print add1(41);";
    let wasm = compile_wasm(source);
    let engine = Engine::default();
    let module = Module::new(&engine, &wasm).expect("should validate");
    let mut store = Store::new(&engine, Vec::<String>::new());
    let mut linker = Linker::new(&engine);
    linker
        .func_wrap(
            "env",
            "_printi",
            |mut caller: Caller<'_, Vec<String>>, value: i32| {
                caller.data_mut().push(value.to_string());
            },
        )
        .expect("bind _printi");
    linker
        .func_wrap(
            "env",
            "_printf",
            |mut caller: Caller<'_, Vec<String>>, value: f64| {
                caller.data_mut().push(value.to_string());
            },
        )
        .expect("bind _printf");
    linker
        .func_wrap("env", "add1", |value: i32| value + 1)
        .expect("bind add1");
    let instance = linker.instantiate(&mut store, &module).expect("instantiate");
    let main = instance
        .get_typed_func::<(), i32>(&mut store, "main")
        .expect("main export");
    main.call(&mut store, ()).expect("call main");
    assert_eq!(store.into_data(), vec!["42"]);
}

#[test]
fn agrees_with_the_interpreter_on_the_scenarios() {
    assert_agreement("print 2 + 3 * -4;");
    assert_agreement("print 2.0 - 3.0 / -4.0;");
    assert_agreement(&read_fixture("tau.wb"));
    assert_agreement(&read_fixture("example.wb"));
    assert_agreement(&read_fixture("fib.wb"));
    assert_agreement(&read_fixture("memory.wb"));
}

#[test]
fn agrees_on_control_flow_and_logic() {
    assert_agreement("var i int = 0; while i < 5 { print i; i = i + 1; }");
    assert_agreement("print true && false; print true || false; print !true;");
    assert_agreement("if 1 < 2 { print 10; } else { print 20; }");
    assert_agreement("print 7 / 2; print -7 / 2;");
    assert_agreement("print ^1000;");
}
