//! LLVM back-end tests: emitted-text assertions over declarations, control
//! flow block structure, and constants.

use crate::utils::{compile_ir, read_fixture};

fn compile_llvm(source: &str) -> String {
    let ir = compile_ir(source);
    wabbit_llvm_codegen::codegen(&ir).expect("llvm emission should succeed")
}

#[test]
fn runtime_declarations_are_present() {
    let text = compile_llvm("print 1;");
    assert!(text.contains("declare void @_printi(i32)"));
    assert!(text.contains("declare void @_printf(double)"));
}

#[test]
fn entry_is_an_i32_function() {
    let text = compile_llvm("print 1;");
    assert!(text.contains("define i32 @main()"));
    assert!(text.contains("call void @_printi(i32 1)"));
    assert!(text.contains("ret i32 0"));
}

#[test]
fn parameters_become_stack_slots() {
    let text = compile_llvm("func square(x int) int { return x * x; } print square(4);");
    assert!(text.contains("define i32 @square(i32 %x)"));
    assert!(text.contains("%x.addr = alloca i32"));
    assert!(text.contains("store i32 %x, ptr %x.addr"));
    assert!(text.contains("mul i32"));
}

#[test]
fn locals_are_zero_initialized() {
    let text = compile_llvm("func f() int { var n int; return n; } print f();");
    assert!(text.contains("%n.addr = alloca i32"));
    assert!(text.contains("store i32 0, ptr %n.addr"));
}

#[test]
fn globals_have_zero_initializers() {
    let text = compile_llvm(&read_fixture("tau.wb"));
    assert!(text.contains("@pi = global double 0.000000e+00"));
    assert!(text.contains("@tau = global double 0.000000e+00"));
    assert!(text.contains("store double"));
}

#[test]
fn float_constants_are_exact_hex() {
    let text = compile_llvm("print 2.5;");
    assert!(text.contains("0x4004000000000000"), "{text}");
}

#[test]
fn if_creates_then_else_endif_blocks() {
    let text = compile_llvm("if 1 < 2 { print 1; } else { print 2; }");
    assert!(text.contains("br i1"));
    assert!(text.contains("then0:"));
    assert!(text.contains("else0:"));
    assert!(text.contains("endif0:"));
}

#[test]
fn while_creates_loop_blocks() {
    let text = compile_llvm("var i int = 0; while i < 3 { i = i + 1; }");
    assert!(text.contains("loop_hdr0:"));
    assert!(text.contains("loop_body0:"));
    assert!(text.contains("loop_end0:"));
    assert!(text.contains("br label %loop_hdr0"));
}

#[test]
fn comparisons_zext_to_i32() {
    let text = compile_llvm("print 1 < 2;");
    assert!(text.contains("icmp slt i32 1, 2"));
    assert!(text.contains("zext i1"));
}

#[test]
fn calls_pass_typed_arguments() {
    let text = compile_llvm(
        "func sub(a int, b int) int { return a - b; } print sub(10, 4);",
    );
    assert!(text.contains("call i32 @sub(i32 10, i32 4)"));
}

#[test]
fn returns_park_trailing_code_in_dead_blocks() {
    let text =
        compile_llvm("func pick(n int) int { if n > 0 { return 1; } else { return 2; } } print pick(0);");
    assert!(text.contains("dead"));
    // Every label line is eventually followed by a terminator.
    assert!(text.contains("ret i32 0"));
}

#[test]
fn memory_model_is_materialized_when_used() {
    let text = compile_llvm(&read_fixture("memory.wb"));
    assert!(text.contains("@wb.memory = internal global [1073741824 x i8] zeroinitializer"));
    assert!(text.contains("@wb.memsize = internal global i32 65536"));
    assert!(text.contains("declare void @llvm.trap()"));
    assert!(text.contains("getelementptr inbounds [1073741824 x i8], ptr @wb.memory"));
    assert!(text.contains("load i32, ptr"));
    assert!(text.contains("align 1"));
}

#[test]
fn memory_accesses_are_bounds_checked() {
    // Loads and stores compare `addr + 4` against the current size and trap
    // out of line instead of reaching the array out of bounds.
    let text = compile_llvm("print `500;");
    assert!(text.contains("icmp ule i64"));
    assert!(text.contains("mem_trap0:"));
    assert!(text.contains("call void @llvm.trap()"));
    assert!(text.contains("unreachable"));
    assert!(text.contains("mem_ok0:"));
}

#[test]
fn memory_grow_is_capped_at_the_array_capacity() {
    let text = compile_llvm("print ^1000;");
    // Page rounding happens in i64 and an oversized grow keeps the old size.
    assert!(text.contains("udiv i64"));
    assert!(text.contains(", 1073741824"));
    assert!(text.contains("select i1"));
}

#[test]
fn memory_model_is_omitted_when_unused() {
    let text = compile_llvm("print 1;");
    assert!(!text.contains("@wb.memory"));
    assert!(!text.contains("@llvm.trap"));
}

#[test]
fn imports_become_declares() {
    let text = compile_llvm("import func host_clock() int; print host_clock();");
    assert!(text.contains("declare i32 @host_clock()"));
    assert!(text.contains("call i32 @host_clock()"));
}

#[test]
fn emission_is_deterministic() {
    let source = read_fixture("fib.wb");
    assert_eq!(compile_llvm(&source), compile_llvm(&source));
}
