//! Positive type-checker tests: annotations, inference, scoping, and the
//! idempotence property (re-checking the same AST yields the same
//! annotations and no new diagnostics).

use wabbit_ast::nodes::{Expression, Statement};
use wabbit_ast::parser::parse_module;
use wabbit_type_checker::TypeCheckerBuilder;
use wabbit_type_checker::type_info::TypeInfo;
use wabbit_type_checker::typed_context::TypedContext;

fn type_check(source: &str) -> TypedContext {
    let module = parse_module(source).expect("source should parse");
    TypeCheckerBuilder::build_typed_context(module)
        .expect("source should type-check")
        .typed_context()
}

/// Annotation of the first `print` statement's expression.
fn printed_type(ctx: &TypedContext) -> TypeInfo {
    let expression = ctx
        .module
        .top_level_statements()
        .iter()
        .find_map(|stmt| match stmt {
            Statement::Print(print) => Some(print.value.clone()),
            _ => None,
        })
        .expect("module should contain a print statement");
    ctx.get_node_typeinfo(expression.id())
        .expect("print operand should be annotated")
}

#[test]
fn integer_arithmetic_is_int() {
    let ctx = type_check("print 2 + 3 * 4;");
    assert_eq!(printed_type(&ctx), TypeInfo::Int);
}

#[test]
fn float_arithmetic_is_float() {
    let ctx = type_check("print 2.0 - 3.0 / -4.0;");
    assert_eq!(printed_type(&ctx), TypeInfo::Float);
}

#[test]
fn comparisons_are_bool() {
    let ctx = type_check("print 1 < 2;");
    assert_eq!(printed_type(&ctx), TypeInfo::Bool);
    let ctx = type_check("print 1.5 == 2.5;");
    assert_eq!(printed_type(&ctx), TypeInfo::Bool);
}

#[test]
fn unannotated_const_infers_from_initializer() {
    let ctx = type_check("const x = 2.5; print x;");
    assert_eq!(printed_type(&ctx), TypeInfo::Float);
    assert_eq!(ctx.globals[0].ty, TypeInfo::Float);
    assert!(ctx.globals[0].constant);

    let ctx = type_check("const flag = 1 < 2; print flag;");
    assert_eq!(printed_type(&ctx), TypeInfo::Bool);
}

#[test]
fn call_annotation_uses_declared_return_type() {
    let ctx = type_check("func half(x float) float { return x / 2.0; } print half(3.0);");
    assert_eq!(printed_type(&ctx), TypeInfo::Float);
}

#[test]
fn functions_may_call_forward() {
    type_check(
        "func even(n int) int { return odd(n - 1); } \
         func odd(n int) int { return n; } \
         print even(4);",
    );
}

#[test]
fn parameters_may_shadow_globals() {
    // A parameter is local for the whole function, so resolution stays
    // consistent across the checker and every back-end.
    type_check("var x int; func f(x int) int { return x; } print f(1);");
}

#[test]
fn module_layout_is_recorded() {
    let ctx = type_check(
        "const pi float = 3.14159; var count int; \
         func bump(by int) int { var next int = count + by; return next; } \
         print bump(2);",
    );
    assert_eq!(ctx.globals.len(), 2);
    assert_eq!(ctx.globals[0].name, "pi");
    assert_eq!(ctx.globals[1].name, "count");
    assert_eq!(
        ctx.function_locals["bump"],
        vec![("next".to_string(), TypeInfo::Int)]
    );
    let bump = &ctx.signatures["bump"];
    assert_eq!(bump.params, vec![TypeInfo::Int]);
    assert_eq!(bump.ret, TypeInfo::Int);
    assert!(!ctx.has_user_main);
    assert_eq!(ctx.signatures["main"].ret, TypeInfo::Int);
}

#[test]
fn top_level_block_locals_belong_to_the_entry() {
    let ctx = type_check("if 1 < 2 { var t int = 1; print t; }");
    assert_eq!(
        ctx.function_locals["main"],
        vec![("t".to_string(), TypeInfo::Int)]
    );
}

#[test]
fn name_resolutions_record_their_storage_class() {
    use wabbit_type_checker::symbol_table::StorageClass;

    let ctx = type_check("var g int; func f(x int) int { return x + g; } print f(1);");
    let func = &ctx.module.functions()[0];
    let Statement::Return(ret) = &func.body[0] else {
        panic!("expected a return statement");
    };
    let Expression::Infix(add) = &ret.value else {
        panic!("expected an infix expression");
    };
    let Expression::Name(x) = &add.left else {
        panic!("expected a name on the left");
    };
    let Expression::Name(g) = &add.right else {
        panic!("expected a name on the right");
    };
    assert_eq!(ctx.get_node_storage(x.id), Some(StorageClass::Local));
    assert_eq!(ctx.get_node_storage(g.id), Some(StorageClass::Global));
}

#[test]
fn user_main_is_the_entry() {
    let ctx = type_check("const greeting int = 7; func main() int { print greeting; return 0; }");
    assert!(ctx.has_user_main);
}

#[test]
fn import_signatures_are_registered() {
    let ctx = type_check("import func host_clock() int; print host_clock();");
    assert!(ctx.signatures["host_clock"].imported);
    assert_eq!(printed_type(&ctx), TypeInfo::Int);
}

#[test]
fn rechecking_the_same_ast_is_idempotent() {
    let module = parse_module(
        "const pi float = 3.14159; \
         func area(r float) float { return pi * r * r; } \
         print area(2.0);",
    )
    .expect("source should parse");

    let first = TypeCheckerBuilder::build_typed_context(module.clone())
        .expect("first check should succeed")
        .typed_context();
    let second = TypeCheckerBuilder::build_typed_context(module)
        .expect("second check should succeed")
        .typed_context();

    assert_eq!(first.annotation_count(), second.annotation_count());
    for item in &first.module.items {
        if let wabbit_ast::nodes::Item::Statement(Statement::Print(print)) = item {
            fn assert_same(first: &TypedContext, second: &TypedContext, expr: &Expression) {
                assert_eq!(
                    first.get_node_typeinfo(expr.id()),
                    second.get_node_typeinfo(expr.id())
                );
            }
            assert_same(&first, &second, &print.value);
        }
    }
}
