//! Lowering: typed AST to stack-machine IR.
//!
//! Evaluation order is strict left-to-right everywhere; the generated
//! sequences preserve it and no later phase may reorder. Lowering cannot fail
//! on a checked module; missing annotations are compiler bugs and panic.
//!
//! Shapes:
//! - `-x` lowers to `CONST 0; x; SUB` in the operand's type.
//! - `!x` lowers to `x; CONSTI 1; XORI` (operands are 0/1).
//! - `if` always emits the full `IF … ELSE … ENDIF` triple, with an empty
//!   else arm when the source has none.
//! - `while` emits `LOOP; cond; CBREAK; body; ENDLOOP` (`CBREAK` exits on a
//!   false condition).
//! - Every function body ends in an explicit `RET`; non-void functions whose
//!   last instruction is not already a return get a default zero result.
//! - Global initializers and top-level statements become the entry function's
//!   leading code, in source order.

use wabbit_ast::nodes::{
    AssignTarget, Expression, FunctionDeclaration, Item, OperatorKind, Statement,
    UnaryOperatorKind,
};
use wabbit_type_checker::type_checker::ENTRY_NAME;
use wabbit_type_checker::type_info::TypeInfo;
use wabbit_type_checker::typed_context::TypedContext;

use crate::instr::Instr;
use crate::module::{IrFunction, IrGlobal, IrImport, IrModule, IrType};

/// Lower a type-checked module to IR.
#[must_use]
pub fn generate(ctx: &TypedContext) -> IrModule {
    IrGenerator { ctx }.generate()
}

fn ir_type(ty: TypeInfo) -> IrType {
    match ty {
        TypeInfo::Int | TypeInfo::Bool => IrType::I,
        TypeInfo::Float => IrType::F,
        TypeInfo::Void => unreachable!("void has no value representation"),
    }
}

fn ir_ret(ty: TypeInfo) -> Option<IrType> {
    match ty {
        TypeInfo::Void => None,
        other => Some(ir_type(other)),
    }
}

struct IrGenerator<'ctx> {
    ctx: &'ctx TypedContext,
}

impl IrGenerator<'_> {
    fn generate(&self) -> IrModule {
        let imports = self
            .ctx
            .module
            .imports()
            .iter()
            .map(|import| {
                let sig = self
                    .ctx
                    .signatures
                    .get(&import.name)
                    .expect("import signature must be registered");
                IrImport {
                    name: import.name.clone(),
                    params: sig.params.iter().map(|ty| ir_type(*ty)).collect(),
                    ret: ir_ret(sig.ret),
                }
            })
            .collect();

        let globals = self
            .ctx
            .globals
            .iter()
            .map(|global| IrGlobal {
                name: global.name.clone(),
                ty: ir_type(global.ty),
            })
            .collect();

        // The entry's leading code: global initializers and top-level
        // statements, interleaved exactly as written.
        let mut prelude = Vec::new();
        let mut functions = Vec::new();
        for item in &self.ctx.module.items {
            match item {
                Item::Function(func) => functions.push(self.lower_function(func)),
                Item::Import(_) => {}
                Item::Statement(stmt) => self.lower_statement(stmt, &mut prelude),
            }
        }

        if self.ctx.has_user_main {
            let main = functions
                .iter_mut()
                .find(|f| f.name == ENTRY_NAME)
                .expect("user entry must have been lowered");
            prelude.append(&mut main.code);
            main.code = prelude;
        } else {
            prelude.push(Instr::ConstI(0));
            prelude.push(Instr::Ret);
            functions.push(IrFunction {
                name: ENTRY_NAME.to_string(),
                params: Vec::new(),
                ret: Some(IrType::I),
                locals: self.locals_of(ENTRY_NAME),
                code: prelude,
            });
        }

        IrModule {
            imports,
            globals,
            functions,
            entry: ENTRY_NAME.to_string(),
        }
    }

    fn locals_of(&self, function: &str) -> Vec<(String, IrType)> {
        self.ctx
            .function_locals
            .get(function)
            .map(|locals| {
                locals
                    .iter()
                    .map(|(name, ty)| (name.clone(), ir_type(*ty)))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lower_function(&self, func: &FunctionDeclaration) -> IrFunction {
        let sig = self
            .ctx
            .signatures
            .get(&func.name)
            .expect("function signature must be registered");
        let ret = ir_ret(sig.ret);
        let mut code = Vec::new();
        for statement in &func.body {
            self.lower_statement(statement, &mut code);
        }
        if !matches!(code.last(), Some(Instr::Ret)) {
            match ret {
                Some(IrType::I) => code.push(Instr::ConstI(0)),
                Some(IrType::F) => code.push(Instr::ConstF(0.0)),
                None => {}
            }
            code.push(Instr::Ret);
        }
        IrFunction {
            name: func.name.clone(),
            params: func
                .params
                .iter()
                .zip(sig.params.iter())
                .map(|(param, ty)| (param.name.clone(), ir_type(*ty)))
                .collect(),
            ret,
            locals: self.locals_of(&func.name),
            code,
        }
    }

    fn lower_statement(&self, statement: &Statement, code: &mut Vec<Instr>) {
        match statement {
            Statement::Print(print) => {
                self.lower_expression(&print.value, code);
                match self.type_of(&print.value) {
                    TypeInfo::Float => code.push(Instr::PrintF),
                    _ => code.push(Instr::PrintI),
                }
            }
            Statement::Expr(stmt) => {
                self.lower_expression(&stmt.expression, code);
                if self.type_of(&stmt.expression) != TypeInfo::Void {
                    code.push(Instr::Drop);
                }
            }
            Statement::Assign(assign) => match &assign.target {
                AssignTarget::Name(name) => {
                    self.lower_expression(&assign.value, code);
                    code.push(Instr::Store(name.name.clone()));
                }
                AssignTarget::Mem(cell) => {
                    self.lower_expression(&cell.address, code);
                    self.lower_expression(&assign.value, code);
                    code.push(Instr::PokeI);
                }
            },
            Statement::Var(decl) => {
                if let Some(value) = &decl.value {
                    self.lower_expression(value, code);
                    code.push(Instr::Store(decl.name.clone()));
                }
            }
            Statement::Const(decl) => {
                self.lower_expression(&decl.value, code);
                code.push(Instr::Store(decl.name.clone()));
            }
            Statement::If(branch) => {
                self.lower_expression(&branch.condition, code);
                code.push(Instr::If);
                for statement in &branch.then_body {
                    self.lower_statement(statement, code);
                }
                code.push(Instr::Else);
                for statement in &branch.else_body {
                    self.lower_statement(statement, code);
                }
                code.push(Instr::EndIf);
            }
            Statement::While(repeat) => {
                code.push(Instr::Loop);
                self.lower_expression(&repeat.condition, code);
                code.push(Instr::CBreak);
                for statement in &repeat.body {
                    self.lower_statement(statement, code);
                }
                code.push(Instr::EndLoop);
            }
            Statement::Return(ret) => {
                self.lower_expression(&ret.value, code);
                code.push(Instr::Ret);
            }
        }
    }

    fn lower_expression(&self, expression: &Expression, code: &mut Vec<Instr>) {
        match expression {
            Expression::Integer(literal) => {
                #[allow(clippy::cast_possible_truncation)]
                code.push(Instr::ConstI(literal.value as i32));
            }
            Expression::Float(literal) => code.push(Instr::ConstF(literal.value)),
            Expression::Bool(literal) => code.push(Instr::ConstI(i32::from(literal.value))),
            Expression::Name(name) => code.push(Instr::Load(name.name.clone())),
            Expression::Infix(infix) => {
                self.lower_expression(&infix.left, code);
                self.lower_expression(&infix.right, code);
                code.push(binary_opcode(infix.operator, self.type_of(&infix.left)));
            }
            Expression::Prefix(prefix) => match prefix.operator {
                UnaryOperatorKind::Pos => self.lower_expression(&prefix.operand, code),
                UnaryOperatorKind::Neg => match self.type_of(&prefix.operand) {
                    TypeInfo::Float => {
                        code.push(Instr::ConstF(0.0));
                        self.lower_expression(&prefix.operand, code);
                        code.push(Instr::SubF);
                    }
                    _ => {
                        code.push(Instr::ConstI(0));
                        self.lower_expression(&prefix.operand, code);
                        code.push(Instr::SubI);
                    }
                },
                UnaryOperatorKind::Not => {
                    self.lower_expression(&prefix.operand, code);
                    code.push(Instr::ConstI(1));
                    code.push(Instr::XorI);
                }
            },
            Expression::Call(call) => {
                for argument in &call.arguments {
                    self.lower_expression(argument, code);
                }
                code.push(Instr::Call(call.function.clone()));
            }
            Expression::MemLoad(cell) => {
                self.lower_expression(&cell.address, code);
                code.push(Instr::PeekI);
            }
            Expression::MemGrow(grow) => {
                self.lower_expression(&grow.size, code);
                code.push(Instr::GrowM);
            }
        }
    }

    fn type_of(&self, expression: &Expression) -> TypeInfo {
        self.ctx
            .get_node_typeinfo(expression.id())
            .expect("expression must be annotated by the checker")
    }
}

/// Pick the typed opcode for a binary operator given its operand type.
fn binary_opcode(operator: OperatorKind, operand: TypeInfo) -> Instr {
    let float = operand == TypeInfo::Float;
    match operator {
        OperatorKind::Add => {
            if float {
                Instr::AddF
            } else {
                Instr::AddI
            }
        }
        OperatorKind::Sub => {
            if float {
                Instr::SubF
            } else {
                Instr::SubI
            }
        }
        OperatorKind::Mul => {
            if float {
                Instr::MulF
            } else {
                Instr::MulI
            }
        }
        OperatorKind::Div => {
            if float {
                Instr::DivF
            } else {
                Instr::DivI
            }
        }
        OperatorKind::Lt => {
            if float {
                Instr::LtF
            } else {
                Instr::LtI
            }
        }
        OperatorKind::Le => {
            if float {
                Instr::LeF
            } else {
                Instr::LeI
            }
        }
        OperatorKind::Gt => {
            if float {
                Instr::GtF
            } else {
                Instr::GtI
            }
        }
        OperatorKind::Ge => {
            if float {
                Instr::GeF
            } else {
                Instr::GeI
            }
        }
        OperatorKind::Eq => {
            if float {
                Instr::EqF
            } else {
                Instr::EqI
            }
        }
        OperatorKind::Ne => {
            if float {
                Instr::NeF
            } else {
                Instr::NeI
            }
        }
        OperatorKind::And => Instr::AndI,
        OperatorKind::Or => Instr::OrI,
    }
}
