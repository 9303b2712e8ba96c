//! The IR interpreter.
//!
//! An abstract machine over the IR: each function invocation gets its own
//! value stack and frame (a name → value map seeded with parameters and
//! zero-initialized locals); the module owns the global store and one linear
//! memory, initially a single 64 KiB page. Structured-control jump targets
//! are precomputed for every function at load time, so dispatch is a plain
//! loop with an instruction pointer.
//!
//! Integer semantics match the WebAssembly back-end: 32-bit wrapping
//! arithmetic, trapping division, unsigned memory addresses, page-granular
//! memory growth.

use std::io::Write;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::errors::InterpError;
use crate::instr::Instr;
use crate::module::{IrFunction, IrModule, IrType};

/// WebAssembly page size; memory grows in whole pages.
pub const PAGE_SIZE: usize = 65536;

/// Growth cap; a failed grow leaves memory unchanged (as `memory.grow` does).
const MEMORY_LIMIT: usize = 1 << 30;

const MAX_CALL_DEPTH: usize = 1024;

/// A tagged runtime value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f64),
}

impl Value {
    #[must_use]
    pub fn zero(ty: IrType) -> Self {
        match ty {
            IrType::I => Value::Int(0),
            IrType::F => Value::Float(0.0),
        }
    }

    fn as_int(self) -> i32 {
        match self {
            Value::Int(value) => value,
            Value::Float(_) => unreachable!("IR stack type error: expected I, found F"),
        }
    }

    fn as_float(self) -> f64 {
        match self {
            Value::Float(value) => value,
            Value::Int(_) => unreachable!("IR stack type error: expected F, found I"),
        }
    }
}

type ControlTable = FxHashMap<usize, usize>;

/// Precompute the partner offsets of one function's structured control:
/// `IF → ELSE` (or `ENDIF` when no else arm exists), `ELSE → ENDIF`,
/// `CBREAK → ENDLOOP`, `ENDLOOP → LOOP`. Unbalanced control is a compiler
/// bug and panics.
fn control_table(code: &[Instr]) -> ControlTable {
    enum Frame {
        If(usize),
        Else(usize),
        Loop(usize, Vec<usize>),
    }
    let mut table = ControlTable::default();
    let mut frames: Vec<Frame> = Vec::new();
    for (index, instr) in code.iter().enumerate() {
        match instr {
            Instr::If => frames.push(Frame::If(index)),
            Instr::Else => match frames.pop() {
                Some(Frame::If(if_index)) => {
                    table.insert(if_index, index);
                    frames.push(Frame::Else(index));
                }
                _ => panic!("ELSE without open IF"),
            },
            Instr::EndIf => match frames.pop() {
                Some(Frame::If(if_index)) => {
                    table.insert(if_index, index);
                }
                Some(Frame::Else(else_index)) => {
                    table.insert(else_index, index);
                }
                _ => panic!("ENDIF without open IF"),
            },
            Instr::Loop => frames.push(Frame::Loop(index, Vec::new())),
            Instr::CBreak => {
                let frame = frames
                    .iter_mut()
                    .rev()
                    .find_map(|frame| match frame {
                        Frame::Loop(_, cbreaks) => Some(cbreaks),
                        _ => None,
                    })
                    .expect("CBREAK outside of LOOP");
                frame.push(index);
            }
            Instr::EndLoop => match frames.pop() {
                Some(Frame::Loop(loop_index, cbreaks)) => {
                    table.insert(index, loop_index);
                    for cbreak in cbreaks {
                        table.insert(cbreak, index);
                    }
                }
                _ => panic!("ENDLOOP without open LOOP"),
            },
            _ => {}
        }
    }
    assert!(frames.is_empty(), "unclosed structured control");
    table
}

pub struct Interpreter<'m, W: Write> {
    module: &'m IrModule,
    globals: FxHashMap<String, Value>,
    memory: Vec<u8>,
    control: FxHashMap<String, Rc<ControlTable>>,
    out: W,
    depth: usize,
}

/// Execute a module's entry function, writing `print` output to `out`.
///
/// # Errors
///
/// Returns an [`InterpError`] on any runtime trap.
pub fn interpret<W: Write>(module: &IrModule, out: W) -> Result<i32, InterpError> {
    Interpreter::new(module, out).run()
}

impl<'m, W: Write> Interpreter<'m, W> {
    #[must_use]
    pub fn new(module: &'m IrModule, out: W) -> Self {
        let globals = module
            .globals
            .iter()
            .map(|global| (global.name.clone(), Value::zero(global.ty)))
            .collect();
        let control = module
            .functions
            .iter()
            .map(|func| (func.name.clone(), Rc::new(control_table(&func.code))))
            .collect();
        Self {
            module,
            globals,
            memory: vec![0; PAGE_SIZE],
            control,
            out,
            depth: 0,
        }
    }

    /// Run the entry function and return its integer result.
    pub fn run(&mut self) -> Result<i32, InterpError> {
        let entry = self.module.entry.clone();
        let result = self.call_function(&entry, &[])?;
        Ok(match result {
            Some(Value::Int(value)) => value,
            _ => 0,
        })
    }

    #[allow(clippy::too_many_lines)]
    fn call_function(&mut self, name: &str, args: &[Value]) -> Result<Option<Value>, InterpError> {
        let module = self.module;
        let Some(func) = module.function(name) else {
            if module.import(name).is_some() {
                return Err(InterpError::UnboundImport {
                    name: name.to_string(),
                });
            }
            return Err(InterpError::UndefinedFunction {
                name: name.to_string(),
            });
        };
        if self.depth >= MAX_CALL_DEPTH {
            return Err(InterpError::CallDepthExceeded);
        }
        self.depth += 1;
        let result = self.execute(func, args);
        self.depth -= 1;
        result
    }

    fn execute(
        &mut self,
        func: &'m IrFunction,
        args: &[Value],
    ) -> Result<Option<Value>, InterpError> {
        assert_eq!(args.len(), func.params.len(), "arity checked before call");
        let mut locals: FxHashMap<String, Value> = func
            .params
            .iter()
            .zip(args.iter())
            .map(|((name, _), value)| (name.clone(), *value))
            .collect();
        for (name, ty) in &func.locals {
            locals.entry(name.clone()).or_insert_with(|| Value::zero(*ty));
        }
        let table = Rc::clone(
            self.control
                .get(&func.name)
                .expect("control table precomputed for every function"),
        );

        let mut stack: Vec<Value> = Vec::new();
        let mut pc = 0usize;
        while pc < func.code.len() {
            match &func.code[pc] {
                Instr::ConstI(value) => stack.push(Value::Int(*value)),
                Instr::ConstF(value) => stack.push(Value::Float(*value)),

                Instr::AddI => int_binary(&mut stack, i32::wrapping_add),
                Instr::SubI => int_binary(&mut stack, i32::wrapping_sub),
                Instr::MulI => int_binary(&mut stack, i32::wrapping_mul),
                Instr::DivI => {
                    let right = pop(&mut stack).as_int();
                    let left = pop(&mut stack).as_int();
                    if right == 0 {
                        return Err(InterpError::DivideByZero);
                    }
                    let Some(quotient) = left.checked_div(right) else {
                        return Err(InterpError::DivisionOverflow);
                    };
                    stack.push(Value::Int(quotient));
                }
                Instr::AddF => float_binary(&mut stack, |a, b| a + b),
                Instr::SubF => float_binary(&mut stack, |a, b| a - b),
                Instr::MulF => float_binary(&mut stack, |a, b| a * b),
                Instr::DivF => float_binary(&mut stack, |a, b| a / b),

                Instr::LtI => int_compare(&mut stack, |a, b| a < b),
                Instr::LeI => int_compare(&mut stack, |a, b| a <= b),
                Instr::GtI => int_compare(&mut stack, |a, b| a > b),
                Instr::GeI => int_compare(&mut stack, |a, b| a >= b),
                Instr::EqI => int_compare(&mut stack, |a, b| a == b),
                Instr::NeI => int_compare(&mut stack, |a, b| a != b),
                Instr::LtF => float_compare(&mut stack, |a, b| a < b),
                Instr::LeF => float_compare(&mut stack, |a, b| a <= b),
                Instr::GtF => float_compare(&mut stack, |a, b| a > b),
                Instr::GeF => float_compare(&mut stack, |a, b| a >= b),
                Instr::EqF => float_compare(&mut stack, |a, b| a == b),
                Instr::NeF => float_compare(&mut stack, |a, b| a != b),

                Instr::AndI => int_binary(&mut stack, |a, b| a & b),
                Instr::OrI => int_binary(&mut stack, |a, b| a | b),
                Instr::XorI => int_binary(&mut stack, |a, b| a ^ b),

                Instr::Load(name) => {
                    let value = locals
                        .get(name)
                        .or_else(|| self.globals.get(name))
                        .copied()
                        .unwrap_or_else(|| panic!("unresolved name `{name}`"));
                    stack.push(value);
                }
                Instr::Store(name) => {
                    let value = pop(&mut stack);
                    if let Some(slot) = locals.get_mut(name) {
                        *slot = value;
                    } else if let Some(slot) = self.globals.get_mut(name) {
                        *slot = value;
                    } else {
                        panic!("unresolved name `{name}`");
                    }
                }

                Instr::PeekI => {
                    let address = as_u32(pop(&mut stack).as_int());
                    let value = self.mem_read(address)?;
                    stack.push(Value::Int(value));
                }
                Instr::PokeI => {
                    let value = pop(&mut stack).as_int();
                    let address = as_u32(pop(&mut stack).as_int());
                    self.mem_write(address, value)?;
                }
                Instr::GrowM => {
                    let request = as_u32(pop(&mut stack).as_int());
                    let pages = request.wrapping_add(65535) / 65536;
                    let grown = self.memory.len() + pages as usize * PAGE_SIZE;
                    if grown <= MEMORY_LIMIT {
                        self.memory.resize(grown, 0);
                    }
                    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                    stack.push(Value::Int(self.memory.len() as i32));
                }

                Instr::If => {
                    let condition = pop(&mut stack).as_int();
                    if condition == 0 {
                        pc = table[&pc] + 1;
                        continue;
                    }
                }
                Instr::Else => {
                    pc = table[&pc] + 1;
                    continue;
                }
                Instr::EndIf | Instr::Loop => {}
                Instr::CBreak => {
                    let condition = pop(&mut stack).as_int();
                    if condition == 0 {
                        pc = table[&pc] + 1;
                        continue;
                    }
                }
                Instr::EndLoop => {
                    pc = table[&pc] + 1;
                    continue;
                }

                Instr::Call(callee) => {
                    let module = self.module;
                    let arity = module
                        .function(callee)
                        .map(|f| f.params.len())
                        .or_else(|| module.import(callee).map(|i| i.params.len()))
                        .unwrap_or_else(|| panic!("call to unknown name `{callee}`"));
                    let mut call_args = Vec::with_capacity(arity);
                    for _ in 0..arity {
                        call_args.push(pop(&mut stack));
                    }
                    call_args.reverse();
                    if let Some(value) = self.call_function(callee, &call_args)? {
                        stack.push(value);
                    }
                }
                Instr::Ret => {
                    if func.ret.is_some() {
                        return Ok(Some(pop(&mut stack)));
                    }
                    return Ok(None);
                }

                Instr::PrintI => {
                    let value = pop(&mut stack).as_int();
                    writeln!(self.out, "{value}")?;
                }
                Instr::PrintF => {
                    let value = pop(&mut stack).as_float();
                    writeln!(self.out, "{value}")?;
                }
                Instr::Drop => {
                    pop(&mut stack);
                }
            }
            pc += 1;
        }

        // Generated bodies end in RET; falling off the end yields the
        // function's default result.
        Ok(func.ret.map(Value::zero))
    }

    fn mem_read(&self, address: u32) -> Result<i32, InterpError> {
        let index = address as usize;
        let Some(bytes) = self.memory.get(index..index + 4) else {
            return Err(InterpError::MemoryOutOfBounds { address });
        };
        Ok(i32::from_le_bytes(
            bytes.try_into().expect("slice has length 4"),
        ))
    }

    fn mem_write(&mut self, address: u32, value: i32) -> Result<(), InterpError> {
        let index = address as usize;
        let Some(bytes) = self.memory.get_mut(index..index + 4) else {
            return Err(InterpError::MemoryOutOfBounds { address });
        };
        bytes.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}

#[allow(clippy::cast_sign_loss)]
fn as_u32(value: i32) -> u32 {
    value as u32
}

fn pop(stack: &mut Vec<Value>) -> Value {
    stack.pop().expect("IR stack underflow")
}

fn int_binary(stack: &mut Vec<Value>, op: impl Fn(i32, i32) -> i32) {
    let right = pop(stack).as_int();
    let left = pop(stack).as_int();
    stack.push(Value::Int(op(left, right)));
}

fn float_binary(stack: &mut Vec<Value>, op: impl Fn(f64, f64) -> f64) {
    let right = pop(stack).as_float();
    let left = pop(stack).as_float();
    stack.push(Value::Float(op(left, right)));
}

fn int_compare(stack: &mut Vec<Value>, op: impl Fn(i32, i32) -> bool) {
    let right = pop(stack).as_int();
    let left = pop(stack).as_int();
    stack.push(Value::Int(i32::from(op(left, right))));
}

#[allow(clippy::float_cmp)]
fn float_compare(stack: &mut Vec<Value>, op: impl Fn(f64, f64) -> bool) {
    let right = pop(stack).as_float();
    let left = pop(stack).as_float();
    stack.push(Value::Int(i32::from(op(left, right))));
}
