//! The semantic checker.
//!
//! Checking runs in two passes over the module items:
//!
//! 1. **Hoisting**: functions and imports, then module-scope `const`/`var`
//!    declarations, are registered in the module scope before any body is
//!    visited, so definitions may refer to each other in any order.
//! 2. **Typing**: every function body (and the implicit entry built from the
//!    top-level statements) is walked with a fresh local scope; each
//!    expression is annotated with its computed type in the [`TypedContext`].
//!
//! The first error inside an item aborts that item; checking then continues
//! with the next top-level item so one run can report several errors.

use rustc_hash::FxHashSet;

use wabbit_ast::nodes::{
    AssignTarget, ConstDeclaration, Expression, FunctionDeclaration, ImportDeclaration, Item,
    Location, OperatorKind, Statement, TypeSpec, UnaryOperatorKind, VarDeclaration,
};

use crate::errors::{CheckError, CheckFailure, MemoryOperation};
use crate::symbol_table::{FuncInfo, StorageClass, Symbol, SymbolTable, ValueKind, ValueSymbol};
use crate::type_info::TypeInfo;
use crate::typed_context::{FuncSig, GlobalInfo, TypedContext};

/// Name of the module entry point, implicit or user-declared.
pub const ENTRY_NAME: &str = "main";

/// Per-function checking state. Locals share one flat namespace per function
/// (nested blocks bound visibility but may not redeclare a name).
struct FunctionContext {
    name: String,
    ret: TypeInfo,
    declared: FxHashSet<String>,
    local_index: u32,
    /// 0 only for statements directly in the module item stream.
    depth: usize,
}

#[derive(Default)]
pub(crate) struct TypeChecker {
    table: SymbolTable,
    errors: Vec<CheckError>,
    /// Statement ids already diagnosed (or registered) during hoisting;
    /// the typing pass skips them to avoid duplicate diagnostics.
    poisoned: FxHashSet<u32>,
    has_user_main: bool,
}

impl TypeChecker {
    pub(crate) fn run(mut self, ctx: &mut TypedContext) -> Result<(), CheckFailure> {
        let items = ctx.module.items.clone();

        // Hoisting: callables first so initializers may call forward.
        for item in &items {
            match item {
                Item::Function(func) => self.register_function(func, ctx),
                Item::Import(import) => self.register_import(import, ctx),
                Item::Statement(_) => {}
            }
        }
        let mut first_plain: Option<Location> = None;
        for item in &items {
            match item {
                Item::Statement(Statement::Var(decl)) => self.register_global_var(decl, ctx),
                Item::Statement(Statement::Const(decl)) => self.register_global_const(decl, ctx),
                Item::Statement(stmt) => {
                    if first_plain.is_none() {
                        first_plain = Some(stmt.location());
                    }
                }
                _ => {}
            }
        }
        if self.has_user_main {
            if let Some(location) = first_plain {
                self.errors.push(CheckError::Duplicate {
                    name: ENTRY_NAME.to_string(),
                    location,
                });
            }
        } else {
            ctx.signatures.insert(
                ENTRY_NAME.to_string(),
                FuncSig {
                    name: ENTRY_NAME.to_string(),
                    params: Vec::new(),
                    ret: TypeInfo::Int,
                    imported: false,
                },
            );
        }
        ctx.function_locals.entry(ENTRY_NAME.to_string()).or_default();
        ctx.has_user_main = self.has_user_main;

        // Typing: function bodies, then the entry's statement stream shares
        // one context across all top-level items.
        let mut entry = FunctionContext {
            name: ENTRY_NAME.to_string(),
            ret: TypeInfo::Int,
            declared: FxHashSet::default(),
            local_index: 0,
            depth: 0,
        };
        for item in &items {
            let result = match item {
                Item::Function(func) => self.check_function(func, ctx),
                Item::Import(_) => Ok(()),
                Item::Statement(stmt) => self.check_statement(stmt, &mut entry, ctx),
            };
            if let Err(error) = result {
                self.errors.push(error);
            }
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(CheckFailure {
                errors: self.errors,
            })
        }
    }

    fn register_function(&mut self, func: &FunctionDeclaration, ctx: &mut TypedContext) {
        let info = FuncInfo {
            name: func.name.clone(),
            param_types: func
                .params
                .iter()
                .map(|p| TypeInfo::from_spec(p.ty))
                .collect(),
            ret: TypeInfo::from_return_spec(func.ret),
            imported: false,
        };
        if self
            .table
            .define_global(&func.name, Symbol::Function(info.clone()))
            .is_err()
        {
            self.errors.push(CheckError::Duplicate {
                name: func.name.clone(),
                location: func.location,
            });
            self.poisoned.insert(func.id);
            return;
        }
        if func.name == ENTRY_NAME {
            self.has_user_main = true;
        }
        ctx.signatures.insert(
            func.name.clone(),
            FuncSig {
                name: func.name.clone(),
                params: info.param_types,
                ret: info.ret,
                imported: false,
            },
        );
    }

    fn register_import(&mut self, import: &ImportDeclaration, ctx: &mut TypedContext) {
        let info = FuncInfo {
            name: import.name.clone(),
            param_types: import
                .params
                .iter()
                .map(|p| TypeInfo::from_spec(p.ty))
                .collect(),
            ret: TypeInfo::from_return_spec(import.ret),
            imported: true,
        };
        if self
            .table
            .define_global(&import.name, Symbol::Function(info.clone()))
            .is_err()
        {
            self.errors.push(CheckError::Duplicate {
                name: import.name.clone(),
                location: import.location,
            });
            self.poisoned.insert(import.id);
            return;
        }
        ctx.signatures.insert(
            import.name.clone(),
            FuncSig {
                name: import.name.clone(),
                params: info.param_types,
                ret: info.ret,
                imported: true,
            },
        );
    }

    fn register_global_var(&mut self, decl: &VarDeclaration, ctx: &mut TypedContext) {
        let ty = TypeInfo::from_spec(decl.ty);
        let index = u32::try_from(ctx.globals.len()).expect("global count fits in u32");
        let symbol = Symbol::Value(ValueSymbol {
            name: decl.name.clone(),
            kind: ValueKind::Var,
            ty,
            storage: StorageClass::Global,
            index,
        });
        if self.table.define_global(&decl.name, symbol).is_err() {
            self.errors.push(CheckError::Duplicate {
                name: decl.name.clone(),
                location: decl.location,
            });
            self.poisoned.insert(decl.id);
            return;
        }
        ctx.globals.push(GlobalInfo {
            name: decl.name.clone(),
            ty,
            constant: false,
        });
    }

    fn register_global_const(&mut self, decl: &ConstDeclaration, ctx: &mut TypedContext) {
        let ty = match decl.ty {
            Some(spec) => TypeInfo::from_spec(spec),
            // Unannotated: infer from the initializer. Callables are already
            // registered, so forward calls type fine; forward references to
            // later globals do not.
            None => match self.check_expression(&decl.value, ctx) {
                Ok(ty) => ty,
                Err(error) => {
                    self.errors.push(error);
                    self.poisoned.insert(decl.id);
                    TypeInfo::Int
                }
            },
        };
        let index = u32::try_from(ctx.globals.len()).expect("global count fits in u32");
        let symbol = Symbol::Value(ValueSymbol {
            name: decl.name.clone(),
            kind: ValueKind::Const,
            ty,
            storage: StorageClass::Global,
            index,
        });
        if self.table.define_global(&decl.name, symbol).is_err() {
            self.errors.push(CheckError::Duplicate {
                name: decl.name.clone(),
                location: decl.location,
            });
            self.poisoned.insert(decl.id);
            return;
        }
        ctx.globals.push(GlobalInfo {
            name: decl.name.clone(),
            ty,
            constant: true,
        });
    }

    fn check_function(
        &mut self,
        func: &FunctionDeclaration,
        ctx: &mut TypedContext,
    ) -> Result<(), CheckError> {
        if self.poisoned.contains(&func.id) {
            return Ok(());
        }
        if func.name == ENTRY_NAME
            && (!func.params.is_empty() || func.ret != Some(TypeSpec::Int))
        {
            return Err(CheckError::MainSignature {
                location: func.location,
            });
        }
        let ret = TypeInfo::from_return_spec(func.ret);
        let mut fctx = FunctionContext {
            name: func.name.clone(),
            ret,
            declared: FxHashSet::default(),
            local_index: u32::try_from(func.params.len()).expect("param count fits in u32"),
            depth: 1,
        };
        ctx.function_locals.entry(func.name.clone()).or_default();

        self.table.push_scope();
        let mut result = Ok(());
        for (index, param) in func.params.iter().enumerate() {
            if !fctx.declared.insert(param.name.clone()) {
                result = Err(CheckError::Duplicate {
                    name: param.name.clone(),
                    location: param.location,
                });
                break;
            }
            let symbol = Symbol::Value(ValueSymbol {
                name: param.name.clone(),
                kind: ValueKind::Param,
                ty: TypeInfo::from_spec(param.ty),
                storage: StorageClass::Local,
                index: u32::try_from(index).expect("param index fits in u32"),
            });
            let _ = self.table.define(&param.name, symbol);
        }
        if result.is_ok() {
            result = self.check_statements(&func.body, &mut fctx, ctx);
        }
        self.table.pop_scope();
        result?;

        if ret != TypeInfo::Void && !guarantees_return(&func.body) {
            return Err(CheckError::MissingReturn {
                function: func.name.clone(),
                expected: ret,
                location: func.location,
            });
        }
        Ok(())
    }

    fn check_statements(
        &mut self,
        statements: &[Statement],
        fctx: &mut FunctionContext,
        ctx: &mut TypedContext,
    ) -> Result<(), CheckError> {
        for statement in statements {
            self.check_statement(statement, fctx, ctx)?;
        }
        Ok(())
    }

    fn check_block(
        &mut self,
        statements: &[Statement],
        fctx: &mut FunctionContext,
        ctx: &mut TypedContext,
    ) -> Result<(), CheckError> {
        self.table.push_scope();
        fctx.depth += 1;
        let result = self.check_statements(statements, fctx, ctx);
        fctx.depth -= 1;
        self.table.pop_scope();
        result
    }

    #[allow(clippy::too_many_lines)]
    fn check_statement(
        &mut self,
        statement: &Statement,
        fctx: &mut FunctionContext,
        ctx: &mut TypedContext,
    ) -> Result<(), CheckError> {
        match statement {
            Statement::Print(print) => {
                let ty = self.check_expression(&print.value, ctx)?;
                if ty == TypeInfo::Void {
                    return Err(CheckError::PrintVoid {
                        location: print.value.location(),
                    });
                }
                Ok(())
            }
            Statement::Expr(expr) => {
                self.check_expression(&expr.expression, ctx)?;
                Ok(())
            }
            Statement::Assign(assign) => match &assign.target {
                AssignTarget::Name(name) => {
                    let Some(symbol) = self.table.lookup(&name.name) else {
                        return Err(CheckError::UnknownName {
                            name: name.name.clone(),
                            location: name.location,
                        });
                    };
                    let Some(value_symbol) = symbol.as_value() else {
                        return Err(CheckError::NotAssignable {
                            name: name.name.clone(),
                            location: name.location,
                        });
                    };
                    if value_symbol.kind == ValueKind::Const {
                        return Err(CheckError::ConstAssignment {
                            name: name.name.clone(),
                            location: name.location,
                        });
                    }
                    ctx.set_node_storage(name.id, value_symbol.storage);
                    let found = self.check_expression(&assign.value, ctx)?;
                    if found != value_symbol.ty {
                        return Err(CheckError::AssignMismatch {
                            name: name.name.clone(),
                            expected: value_symbol.ty,
                            found,
                            location: assign.location,
                        });
                    }
                    Ok(())
                }
                AssignTarget::Mem(cell) => {
                    let address = self.check_expression(&cell.address, ctx)?;
                    if address != TypeInfo::Int {
                        return Err(CheckError::MemoryOperand {
                            operation: MemoryOperation::Load,
                            found: address,
                            location: cell.location,
                        });
                    }
                    let value = self.check_expression(&assign.value, ctx)?;
                    if value != TypeInfo::Int {
                        return Err(CheckError::MemoryOperand {
                            operation: MemoryOperation::Store,
                            found: value,
                            location: assign.location,
                        });
                    }
                    Ok(())
                }
            },
            Statement::Var(decl) => {
                if self.poisoned.contains(&decl.id) {
                    return Ok(());
                }
                if fctx.depth == 0 {
                    // Hoisted global: the symbol exists, type the initializer.
                    ctx.set_node_storage(decl.id, StorageClass::Global);
                    let expected = TypeInfo::from_spec(decl.ty);
                    if let Some(value) = &decl.value {
                        let found = self.check_expression(value, ctx)?;
                        if found != expected {
                            return Err(CheckError::AssignMismatch {
                                name: decl.name.clone(),
                                expected,
                                found,
                                location: decl.location,
                            });
                        }
                    }
                    return Ok(());
                }
                let expected = TypeInfo::from_spec(decl.ty);
                if let Some(value) = &decl.value {
                    let found = self.check_expression(value, ctx)?;
                    if found != expected {
                        return Err(CheckError::AssignMismatch {
                            name: decl.name.clone(),
                            expected,
                            found,
                            location: decl.location,
                        });
                    }
                }
                ctx.set_node_storage(decl.id, StorageClass::Local);
                self.declare_local(
                    &decl.name,
                    expected,
                    ValueKind::Var,
                    decl.location,
                    fctx,
                    ctx,
                )
            }
            Statement::Const(decl) => {
                if self.poisoned.contains(&decl.id) {
                    return Ok(());
                }
                if fctx.depth == 0 {
                    ctx.set_node_storage(decl.id, StorageClass::Global);
                    let expected = self
                        .table
                        .lookup(&decl.name)
                        .and_then(|s| s.as_value().map(|v| v.ty))
                        .expect("hoisted global const must be registered");
                    let found = self.check_expression(&decl.value, ctx)?;
                    if found != expected {
                        return Err(CheckError::AssignMismatch {
                            name: decl.name.clone(),
                            expected,
                            found,
                            location: decl.location,
                        });
                    }
                    return Ok(());
                }
                let found = self.check_expression(&decl.value, ctx)?;
                let ty = match decl.ty {
                    Some(spec) => {
                        let expected = TypeInfo::from_spec(spec);
                        if found != expected {
                            return Err(CheckError::AssignMismatch {
                                name: decl.name.clone(),
                                expected,
                                found,
                                location: decl.location,
                            });
                        }
                        expected
                    }
                    None => found,
                };
                ctx.set_node_storage(decl.id, StorageClass::Local);
                self.declare_local(
                    &decl.name,
                    ty,
                    ValueKind::Const,
                    decl.location,
                    fctx,
                    ctx,
                )
            }
            Statement::If(branch) => {
                let cond = self.check_expression(&branch.condition, ctx)?;
                if cond != TypeInfo::Bool {
                    return Err(CheckError::ConditionNotBool {
                        found: cond,
                        location: branch.condition.location(),
                    });
                }
                self.check_block(&branch.then_body, fctx, ctx)?;
                self.check_block(&branch.else_body, fctx, ctx)
            }
            Statement::While(repeat) => {
                let cond = self.check_expression(&repeat.condition, ctx)?;
                if cond != TypeInfo::Bool {
                    return Err(CheckError::ConditionNotBool {
                        found: cond,
                        location: repeat.condition.location(),
                    });
                }
                self.check_block(&repeat.body, fctx, ctx)
            }
            Statement::Return(ret) => {
                let found = self.check_expression(&ret.value, ctx)?;
                if found != fctx.ret {
                    return Err(CheckError::ReturnTypeMismatch {
                        expected: fctx.ret,
                        found,
                        location: ret.location,
                    });
                }
                Ok(())
            }
        }
    }

    fn declare_local(
        &mut self,
        name: &str,
        ty: TypeInfo,
        kind: ValueKind,
        location: Location,
        fctx: &mut FunctionContext,
        ctx: &mut TypedContext,
    ) -> Result<(), CheckError> {
        if !fctx.declared.insert(name.to_string()) {
            return Err(CheckError::Duplicate {
                name: name.to_string(),
                location,
            });
        }
        // The IR gives every function one flat local namespace, so a body
        // local reusing a module-scope value name would change which slot
        // the back-ends resolve.
        if let Some(Symbol::Value(existing)) = self.table.lookup(name) {
            if existing.storage == StorageClass::Global {
                return Err(CheckError::ShadowsGlobal {
                    name: name.to_string(),
                    location,
                });
            }
        }
        let symbol = Symbol::Value(ValueSymbol {
            name: name.to_string(),
            kind,
            ty,
            storage: StorageClass::Local,
            index: fctx.local_index,
        });
        fctx.local_index += 1;
        let _ = self.table.define(name, symbol);
        ctx.function_locals
            .get_mut(&fctx.name)
            .expect("function locals registered before body check")
            .push((name.to_string(), ty));
        Ok(())
    }

    fn check_expression(
        &mut self,
        expression: &Expression,
        ctx: &mut TypedContext,
    ) -> Result<TypeInfo, CheckError> {
        let ty = match expression {
            Expression::Integer(_) => TypeInfo::Int,
            Expression::Float(_) => TypeInfo::Float,
            Expression::Bool(_) => TypeInfo::Bool,
            Expression::Name(name) => {
                let Some(symbol) = self.table.lookup(&name.name) else {
                    return Err(CheckError::UnknownName {
                        name: name.name.clone(),
                        location: name.location,
                    });
                };
                match symbol {
                    Symbol::Function(_) => {
                        return Err(CheckError::FunctionAsValue {
                            name: name.name.clone(),
                            location: name.location,
                        });
                    }
                    Symbol::Value(value) => {
                        ctx.set_node_storage(name.id, value.storage);
                        value.ty
                    }
                }
            }
            Expression::Infix(infix) => {
                let left = self.check_expression(&infix.left, ctx)?;
                let right = self.check_expression(&infix.right, ctx)?;
                self.infix_type(infix.operator, left, right, infix.location)?
            }
            Expression::Prefix(prefix) => {
                let operand = self.check_expression(&prefix.operand, ctx)?;
                match prefix.operator {
                    UnaryOperatorKind::Neg | UnaryOperatorKind::Pos => {
                        if !operand.is_numeric() {
                            return Err(CheckError::UnsupportedUnary {
                                operator: prefix.operator,
                                operand,
                                location: prefix.location,
                            });
                        }
                        operand
                    }
                    UnaryOperatorKind::Not => {
                        if operand != TypeInfo::Bool {
                            return Err(CheckError::UnsupportedUnary {
                                operator: prefix.operator,
                                operand,
                                location: prefix.location,
                            });
                        }
                        TypeInfo::Bool
                    }
                }
            }
            Expression::Call(call) => {
                let Some(symbol) = self.table.lookup(&call.function) else {
                    return Err(CheckError::UnknownName {
                        name: call.function.clone(),
                        location: call.location,
                    });
                };
                let Some(info) = symbol.as_function().cloned() else {
                    return Err(CheckError::NotCallable {
                        name: call.function.clone(),
                        location: call.location,
                    });
                };
                if call.arguments.len() != info.param_types.len() {
                    return Err(CheckError::ArgumentCount {
                        function: call.function.clone(),
                        expected: info.param_types.len(),
                        found: call.arguments.len(),
                        location: call.location,
                    });
                }
                for (index, (argument, expected)) in call
                    .arguments
                    .iter()
                    .zip(info.param_types.iter())
                    .enumerate()
                {
                    let found = self.check_expression(argument, ctx)?;
                    if found != *expected {
                        return Err(CheckError::ArgumentType {
                            function: call.function.clone(),
                            index: index + 1,
                            expected: *expected,
                            found,
                            location: argument.location(),
                        });
                    }
                }
                info.ret
            }
            Expression::MemLoad(cell) => {
                let address = self.check_expression(&cell.address, ctx)?;
                if address != TypeInfo::Int {
                    return Err(CheckError::MemoryOperand {
                        operation: MemoryOperation::Load,
                        found: address,
                        location: cell.location,
                    });
                }
                TypeInfo::Int
            }
            Expression::MemGrow(grow) => {
                let size = self.check_expression(&grow.size, ctx)?;
                if size != TypeInfo::Int {
                    return Err(CheckError::MemoryOperand {
                        operation: MemoryOperation::Grow,
                        found: size,
                        location: grow.location,
                    });
                }
                TypeInfo::Int
            }
        };
        ctx.set_node_typeinfo(expression.id(), ty);
        Ok(ty)
    }

    fn infix_type(
        &self,
        operator: OperatorKind,
        left: TypeInfo,
        right: TypeInfo,
        location: Location,
    ) -> Result<TypeInfo, CheckError> {
        match operator {
            OperatorKind::Add | OperatorKind::Sub | OperatorKind::Mul | OperatorKind::Div => {
                if left != right {
                    return Err(CheckError::OperandMismatch {
                        operator,
                        left,
                        right,
                        location,
                    });
                }
                if !left.is_numeric() {
                    return Err(CheckError::UnsupportedOperand {
                        operator,
                        operand: left,
                        location,
                    });
                }
                Ok(left)
            }
            OperatorKind::Lt | OperatorKind::Le | OperatorKind::Gt | OperatorKind::Ge => {
                if left != right {
                    return Err(CheckError::OperandMismatch {
                        operator,
                        left,
                        right,
                        location,
                    });
                }
                if !left.is_numeric() {
                    return Err(CheckError::UnsupportedOperand {
                        operator,
                        operand: left,
                        location,
                    });
                }
                Ok(TypeInfo::Bool)
            }
            OperatorKind::Eq | OperatorKind::Ne => {
                if left != right {
                    return Err(CheckError::OperandMismatch {
                        operator,
                        left,
                        right,
                        location,
                    });
                }
                if left == TypeInfo::Void {
                    return Err(CheckError::UnsupportedOperand {
                        operator,
                        operand: left,
                        location,
                    });
                }
                Ok(TypeInfo::Bool)
            }
            OperatorKind::And | OperatorKind::Or => {
                if left != right {
                    return Err(CheckError::OperandMismatch {
                        operator,
                        left,
                        right,
                        location,
                    });
                }
                if left != TypeInfo::Bool {
                    return Err(CheckError::UnsupportedOperand {
                        operator,
                        operand: left,
                        location,
                    });
                }
                Ok(TypeInfo::Bool)
            }
        }
    }
}

/// Conservative definite-return analysis: a body guarantees a return if any
/// of its statements does; `if` guarantees only when both arms do. Loops are
/// never assumed to return.
#[must_use]
fn guarantees_return(statements: &[Statement]) -> bool {
    statements.iter().any(|statement| match statement {
        Statement::Return(_) => true,
        Statement::If(branch) => {
            guarantees_return(&branch.then_body) && guarantees_return(&branch.else_body)
        }
        _ => false,
    })
}
