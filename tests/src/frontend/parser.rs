//! Parser tests: precedence, associativity, statement forms, and error
//! behavior (first error aborts, no recovery).

use wabbit_ast::nodes::{
    AssignTarget, Expression, Item, Module, OperatorKind, Statement, TypeSpec, UnaryOperatorKind,
};
use wabbit_ast::parser::parse_module;

fn parse(source: &str) -> Module {
    parse_module(source).expect("source should parse")
}

/// The expression of the first `print` statement in the module.
fn print_expression(module: &Module) -> Expression {
    module
        .top_level_statements()
        .iter()
        .find_map(|stmt| match stmt {
            Statement::Print(print) => Some(print.value.clone()),
            _ => None,
        })
        .expect("module should contain a print statement")
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let module = parse("print 2 + 3 * -4;");
    let Expression::Infix(add) = print_expression(&module) else {
        panic!("expected infix at the root");
    };
    assert_eq!(add.operator, OperatorKind::Add);
    assert!(matches!(&add.left, Expression::Integer(n) if n.value == 2));
    let Expression::Infix(mul) = &add.right else {
        panic!("expected multiplication on the right");
    };
    assert_eq!(mul.operator, OperatorKind::Mul);
    let Expression::Prefix(neg) = &mul.right else {
        panic!("expected unary minus");
    };
    assert_eq!(neg.operator, UnaryOperatorKind::Neg);
    assert!(matches!(&neg.operand, Expression::Integer(n) if n.value == 4));
}

#[test]
fn subtraction_is_left_associative() {
    let module = parse("print 1 - 2 - 3;");
    let Expression::Infix(outer) = print_expression(&module) else {
        panic!("expected infix at the root");
    };
    assert_eq!(outer.operator, OperatorKind::Sub);
    assert!(matches!(&outer.right, Expression::Integer(n) if n.value == 3));
    let Expression::Infix(inner) = &outer.left else {
        panic!("expected nested subtraction");
    };
    assert_eq!(inner.operator, OperatorKind::Sub);
}

#[test]
fn comparison_binds_looser_than_arithmetic() {
    let module = parse("print 1 + 2 < 3 * 4;");
    let Expression::Infix(cmp) = print_expression(&module) else {
        panic!("expected infix at the root");
    };
    assert_eq!(cmp.operator, OperatorKind::Lt);
    assert!(matches!(&cmp.left, Expression::Infix(a) if a.operator == OperatorKind::Add));
    assert!(matches!(&cmp.right, Expression::Infix(m) if m.operator == OperatorKind::Mul));
}

#[test]
fn and_binds_tighter_than_or() {
    let module = parse("print a && b || c;");
    let Expression::Infix(or) = print_expression(&module) else {
        panic!("expected infix at the root");
    };
    assert_eq!(or.operator, OperatorKind::Or);
    assert!(matches!(&or.left, Expression::Infix(a) if a.operator == OperatorKind::And));
}

#[test]
fn parentheses_override_precedence() {
    let module = parse("print (1 + 2) * 3;");
    let Expression::Infix(mul) = print_expression(&module) else {
        panic!("expected infix at the root");
    };
    assert_eq!(mul.operator, OperatorKind::Mul);
    assert!(matches!(&mul.left, Expression::Infix(a) if a.operator == OperatorKind::Add));
}

#[test]
fn memory_load_binds_tighter_than_addition() {
    // `addr + 10000 reads the cell first, then adds.
    let module = parse("print `addr + 10000;");
    let Expression::Infix(add) = print_expression(&module) else {
        panic!("expected infix at the root");
    };
    assert_eq!(add.operator, OperatorKind::Add);
    assert!(matches!(&add.left, Expression::MemLoad(_)));
}

#[test]
fn memory_grow_is_a_primary() {
    let module = parse("print ^1000 + 1;");
    let Expression::Infix(add) = print_expression(&module) else {
        panic!("expected infix at the root");
    };
    assert!(matches!(&add.left, Expression::MemGrow(_)));
}

#[test]
fn call_arguments_parse_left_to_right() {
    let module = parse("print f(1, 2 + 3, g());");
    let Expression::Call(call) = print_expression(&module) else {
        panic!("expected a call");
    };
    assert_eq!(call.function, "f");
    assert_eq!(call.arguments.len(), 3);
    assert!(matches!(&call.arguments[2], Expression::Call(g) if g.function == "g"));
}

#[test]
fn declaration_statements() {
    let module = parse("var x int; var y float = 1.5; const k = 7; const c float = 2.5;");
    let statements = module.top_level_statements();
    let Statement::Var(x) = &statements[0] else {
        panic!("expected var");
    };
    assert_eq!(x.ty, TypeSpec::Int);
    assert!(x.value.is_none());
    let Statement::Var(y) = &statements[1] else {
        panic!("expected var");
    };
    assert!(y.value.is_some());
    let Statement::Const(k) = &statements[2] else {
        panic!("expected const");
    };
    assert!(k.ty.is_none());
    let Statement::Const(c) = &statements[3] else {
        panic!("expected const");
    };
    assert_eq!(c.ty, Some(TypeSpec::Float));
}

#[test]
fn assignment_targets() {
    let module = parse("x = 1; `500 = 1234;");
    let statements = module.top_level_statements();
    let Statement::Assign(name) = &statements[0] else {
        panic!("expected assignment");
    };
    assert!(matches!(&name.target, AssignTarget::Name(n) if n.name == "x"));
    let Statement::Assign(mem) = &statements[1] else {
        panic!("expected assignment");
    };
    assert!(matches!(&mem.target, AssignTarget::Mem(_)));
}

#[test]
fn if_with_and_without_else() {
    let module = parse("if a < b { print a; } if a < b { print a; } else { print b; }");
    let statements = module.top_level_statements();
    let Statement::If(bare) = &statements[0] else {
        panic!("expected if");
    };
    assert!(bare.else_body.is_empty());
    let Statement::If(full) = &statements[1] else {
        panic!("expected if");
    };
    assert_eq!(full.else_body.len(), 1);
}

#[test]
fn function_declaration_shape() {
    let module = parse("func add(x int, y float) float { return y; }");
    let functions = module.functions();
    assert_eq!(functions.len(), 1);
    let func = &functions[0];
    assert_eq!(func.name, "add");
    assert_eq!(func.params.len(), 2);
    assert_eq!(func.params[0].ty, TypeSpec::Int);
    assert_eq!(func.params[1].ty, TypeSpec::Float);
    assert_eq!(func.ret, Some(TypeSpec::Float));
    assert_eq!(func.body.len(), 1);
}

#[test]
fn void_function_omits_return_type() {
    let module = parse("func hello() { print 1; }");
    assert_eq!(module.functions()[0].ret, None);
}

#[test]
fn import_declaration_shape() {
    let module = parse("import func host_clock() int;");
    let imports = module.imports();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].name, "host_clock");
    assert!(imports[0].params.is_empty());
    assert_eq!(imports[0].ret, Some(TypeSpec::Int));
}

#[test]
fn items_preserve_source_order() {
    let module = parse("print 1; func f() int { return 0; } print 2;");
    assert!(matches!(module.items[0], Item::Statement(_)));
    assert!(matches!(module.items[1], Item::Function(_)));
    assert!(matches!(module.items[2], Item::Statement(_)));
}

#[test]
fn first_error_aborts_with_position() {
    let error = parse_module("print 1 +;").expect_err("should fail");
    let location = error.location();
    assert_eq!((location.line, location.column), (1, 10));
}

#[test]
fn missing_semicolon_is_an_error() {
    assert!(parse_module("print 1").is_err());
    assert!(parse_module("var x int = 1").is_err());
}

#[test]
fn nested_function_declarations_are_rejected() {
    assert!(parse_module("if a { func f() int { return 1; } }").is_err());
}

#[test]
fn assignment_requires_an_assignable_target() {
    assert!(parse_module("1 + 2 = 3;").is_err());
}
