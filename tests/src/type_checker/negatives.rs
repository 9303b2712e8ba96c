//! Negative checker tests: every rejection carries exactly the diagnostics
//! the contract promises, with the right user-visible kind.

use crate::utils::expect_diagnostics;

/// Assert that `source` produces exactly one diagnostic of `kind`.
fn assert_single(source: &str, kind: &str) {
    let diagnostics = expect_diagnostics(source);
    assert_eq!(
        diagnostics.len(),
        1,
        "expected one diagnostic for {source:?}, got {diagnostics:?}"
    );
    assert_eq!(diagnostics[0].kind, kind, "for {source:?}: {diagnostics:?}");
}

#[test]
fn mixed_numeric_operands_are_a_type_error() {
    assert_single("print 2 + 3.0;", "TypeError");
}

#[test]
fn const_reassignment_is_a_name_error() {
    assert_single("const k int = 1; k = 2;", "NameError");
}

#[test]
fn missing_return_is_a_return_error() {
    assert_single("func f() int { }", "ReturnError");
}

#[test]
fn return_only_in_one_branch_is_a_return_error() {
    assert_single("func f(n int) int { if n > 0 { return 1; } }", "ReturnError");
}

#[test]
fn both_branches_returning_satisfies_the_checker() {
    let source = "func f(n int) int { if n > 0 { return 1; } else { return 2; } } print f(1);";
    assert!(wabbit::compile_ir(source).is_ok());
}

#[test]
fn undeclared_name_is_a_name_error() {
    assert_single("print missing;", "NameError");
}

#[test]
fn arity_mismatch_is_a_type_error() {
    assert_single(
        "func square(x int) int { return x * x; } print square(1, 2);",
        "TypeError",
    );
}

#[test]
fn argument_type_mismatch_is_a_type_error() {
    assert_single(
        "func square(x int) int { return x * x; } print square(2.0);",
        "TypeError",
    );
}

#[test]
fn condition_must_be_bool() {
    assert_single("if 1 { print 1; }", "TypeError");
    assert_single("while 1 { print 1; }", "TypeError");
}

#[test]
fn assignment_type_mismatch() {
    assert_single("var x int; x = 2.5;", "TypeError");
}

#[test]
fn var_initializer_type_mismatch() {
    assert_single("var x int = 2.5;", "TypeError");
}

#[test]
fn return_type_mismatch() {
    assert_single("func f() int { return 2.5; }", "ReturnError");
}

#[test]
fn void_value_cannot_be_printed() {
    assert_single("func shout() { print 1; } print shout();", "TypeError");
}

#[test]
fn duplicate_globals_are_rejected() {
    assert_single("var x int; var x float;", "NameError");
}

#[test]
fn duplicate_locals_share_one_function_namespace() {
    assert_single(
        "func f(x int) int { if x > 0 { var t int = 1; } var t int = 2; return t; }",
        "NameError",
    );
}

#[test]
fn body_locals_cannot_shadow_globals() {
    assert_single(
        "var x int; func f() int { var x int = 1; return x; }",
        "NameError",
    );
}

#[test]
fn parameters_cannot_be_shadowed() {
    assert_single("func f(x int) int { var x int = 1; return x; }", "NameError");
}

#[test]
fn block_locals_do_not_escape_their_block() {
    assert_single("if 1 < 2 { var t int = 1; } print t;", "NameError");
}

#[test]
fn user_main_conflicts_with_top_level_statements() {
    assert_single("func main() int { return 0; } print 1;", "NameError");
}

#[test]
fn main_signature_is_fixed() {
    assert_single("func main(x int) int { return x; }", "TypeError");
    assert_single("func main() float { return 0.0; }", "TypeError");
}

#[test]
fn memory_operands_must_be_int() {
    assert_single("print `1.5;", "TypeError");
    assert_single("print ^2.5;", "TypeError");
    assert_single("`100 = 2.5;", "TypeError");
}

#[test]
fn functions_are_not_values() {
    assert_single("func f() int { return 1; } print f;", "TypeError");
    assert_single("func f() int { return 1; } f = 2;", "NameError");
}

#[test]
fn calling_a_variable_is_a_type_error() {
    assert_single("var f int; print f();", "TypeError");
}

#[test]
fn logical_operators_require_bool() {
    assert_single("print 1 && 2;", "TypeError");
    assert_single("print !3;", "TypeError");
}

#[test]
fn errors_accumulate_across_top_level_items() {
    let diagnostics = expect_diagnostics("print a; print b;");
    assert_eq!(diagnostics.len(), 2);
}

#[test]
fn first_error_in_a_function_aborts_that_function_only() {
    // One bad function, one bad statement: two diagnostics, not three.
    let diagnostics = expect_diagnostics("func f() int { print a; print b; } print c;");
    assert_eq!(diagnostics.len(), 2);
}
