//! Interpreter tests: the end-to-end scenarios plus runtime trap behavior.

use wabbit_ir::errors::InterpError;

use crate::utils::{compile_ir, read_fixture, run_interp};

#[test]
fn arithmetic_with_unary_minus() {
    assert_eq!(run_interp("print 2 + 3 * -4;"), "-10\n");
}

#[test]
fn float_arithmetic() {
    assert_eq!(run_interp("print 2.0 - 3.0 / -4.0;"), "2.75\n");
}

#[test]
fn constants_and_global_assignment() {
    assert_eq!(run_interp(&read_fixture("tau.wb")), "6.28318\n");
}

#[test]
fn user_functions() {
    assert_eq!(run_interp(&read_fixture("example.wb")), "16\n100\n");
}

#[test]
fn recursive_fibonacci() {
    assert_eq!(run_interp(&read_fixture("fib.wb")), "89\n");
}

#[test]
fn raw_memory_roundtrip() {
    assert_eq!(run_interp(&read_fixture("memory.wb")), "11234\n");
}

#[test]
fn while_loop_counts() {
    assert_eq!(
        run_interp("var i int = 0; while i < 5 { print i; i = i + 1; }"),
        "0\n1\n2\n3\n4\n"
    );
}

#[test]
fn booleans_print_as_integers() {
    assert_eq!(run_interp("print 1 < 2; print 2 < 1; print true;"), "1\n0\n1\n");
}

#[test]
fn logical_operators_are_strict_but_correct() {
    assert_eq!(
        run_interp("print true && false; print true || false; print !true;"),
        "0\n1\n0\n"
    );
}

#[test]
fn integer_division_truncates() {
    assert_eq!(run_interp("print 7 / 2; print -7 / 2;"), "3\n-3\n");
}

#[test]
fn nested_control_flow() {
    let source = "\
var n int = 0;
while n < 6 {
    if n / 2 * 2 == n {
        print n;
    } else {
        print -n;
    }
    n = n + 1;
}";
    assert_eq!(run_interp(source), "0\n-1\n2\n-3\n4\n-5\n");
}

#[test]
fn user_main_runs_after_global_initializers() {
    assert_eq!(
        run_interp("const greeting int = 42; func main() int { print greeting; return 0; }"),
        "42\n"
    );
}

#[test]
fn entry_returns_its_value() {
    let module = compile_ir("func main() int { return 7; }");
    let mut sink = Vec::new();
    let result = wabbit::interpret(&module, &mut sink).expect("should run");
    assert_eq!(result, 7);
}

#[test]
fn uninitialized_variables_read_as_zero() {
    assert_eq!(
        run_interp("var a int; var b float; print a; print b;"),
        "0\n0\n"
    );
}

#[test]
fn memory_grow_reports_the_new_size_in_bytes() {
    // One page exists; growing by 1000 bytes adds one whole page.
    assert_eq!(run_interp("print ^1000;"), "131072\n");
}

#[test]
fn division_by_zero_traps() {
    let module = compile_ir("print 1 / 0;");
    let mut sink = Vec::new();
    let error = wabbit::interpret(&module, &mut sink).expect_err("should trap");
    assert!(error.to_string().contains("division by zero"));
}

#[test]
fn out_of_bounds_memory_access_traps() {
    let module = compile_ir("print `70000;");
    let mut sink = Vec::new();
    let error = wabbit::interpret(&module, &mut sink).expect_err("should trap");
    assert!(error.to_string().contains("out-of-bounds"));
}

#[test]
fn imported_functions_cannot_run_under_the_interpreter() {
    let module = compile_ir("import func host_clock() int; print host_clock();");
    let mut sink = Vec::new();
    let error = wabbit::interpret(&module, &mut sink).expect_err("should trap");
    let trap = error
        .downcast_ref::<InterpError>()
        .expect("trap should be an InterpError");
    assert!(matches!(trap, InterpError::UnboundImport { .. }));
}

#[test]
fn deep_recursion_is_bounded() {
    let source = "\
func down(n int) int {
    if n == 0 {
        return 0;
    } else {
        return down(n - 1);
    }
    return 0;
}
print down(100000);";
    let module = compile_ir(source);
    let mut sink = Vec::new();
    let error = wabbit::interpret(&module, &mut sink).expect_err("should trap");
    assert!(error.to_string().contains("call depth"));
}
