//! IR to textual LLVM IR.
//!
//! Each IR function becomes an LLVM function with `i32`/`double` parameters.
//! The entry block allocates one stack slot per parameter and local
//! (`%name.addr`), stores the incoming arguments, and zero-initializes the
//! locals so every execution path observes the same defaults as the other
//! back-ends. The emitter walks the instruction list with a compile-time
//! simulated stack whose entries are SSA value names (or literals); `CALL`
//! pops its arguments in reverse.
//!
//! Control emission uses fresh basic blocks: `IF` creates `then`/`else`/
//! `endif`, `LOOP` creates `loop_hdr`/`loop_body`/`loop_end`. A `RET` is
//! followed by a fresh unreachable block so the remaining instructions of the
//! surrounding construct still land in a well-formed position; any block left
//! unterminated at the end of a function receives a default return.
//!
//! When the module touches raw memory, it carries a byte-array global (whose
//! capacity equals the interpreter's growth cap) plus a size global. Memory
//! starts at one page; `GROWM` rounds up to whole pages in 64-bit arithmetic
//! and leaves the size unchanged when the cap would be exceeded, exactly as
//! the interpreter does. Every load and store is bounds-checked against the
//! current size and branches to an `llvm.trap` block on violation, so an
//! out-of-bounds access aborts instead of corrupting memory.

use std::fmt::Write;

use wabbit_ir::instr::Instr;
use wabbit_ir::module::{IrFunction, IrModule, IrType};

/// Capacity of the in-module linear memory array. Matches the interpreter's
/// growth cap (1 GiB), so a grow that succeeds there succeeds here; the
/// zero-initialized array lands in `.bss` and is paged in on demand.
const MEMORY_CAPACITY: usize = 1 << 30;
const PAGE_SIZE: i32 = 65536;

fn lltype(ty: IrType) -> &'static str {
    match ty {
        IrType::I => "i32",
        IrType::F => "double",
    }
}

fn llret(ty: Option<IrType>) -> &'static str {
    ty.map_or("void", lltype)
}

/// Exact `f64` constant in LLVM's 16-digit hexadecimal bit form.
fn float_literal(value: f64) -> String {
    format!("0x{:016X}", value.to_bits())
}

pub(crate) struct Emitter<'m> {
    module: &'m IrModule,
    out: String,
    uses_memory: bool,
}

impl<'m> Emitter<'m> {
    pub(crate) fn new(module: &'m IrModule) -> Self {
        Self {
            module,
            out: String::new(),
            uses_memory: module.uses_memory(),
        }
    }

    pub(crate) fn emit(mut self) -> String {
        self.line("; ModuleID = 'wabbit'");
        self.line("");
        self.line("declare void @_printi(i32)");
        self.line("declare void @_printf(double)");
        for import in &self.module.imports {
            let params = import
                .params
                .iter()
                .map(|ty| lltype(*ty))
                .collect::<Vec<_>>()
                .join(", ");
            let text = format!("declare {} @{}({})", llret(import.ret), import.name, params);
            self.line(&text);
        }
        if self.uses_memory {
            self.line("declare void @llvm.trap()");
        }
        self.line("");
        for global in &self.module.globals {
            let text = match global.ty {
                IrType::I => format!("@{} = global i32 0", global.name),
                IrType::F => format!("@{} = global double 0.000000e+00", global.name),
            };
            self.line(&text);
        }
        if self.uses_memory {
            let text =
                format!("@wb.memory = internal global [{MEMORY_CAPACITY} x i8] zeroinitializer");
            self.line(&text);
            let text = format!("@wb.memsize = internal global i32 {PAGE_SIZE}");
            self.line(&text);
        }
        for func in &self.module.functions {
            self.line("");
            FunctionEmitter::new(self.module, func, self.uses_memory).emit(&mut self.out);
        }
        self.out
    }

    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }
}

/// One simulated-stack entry: an SSA name or literal plus its type.
type StackValue = (String, IrType);

enum Frame {
    If(u32),
    Loop(u32),
}

struct FunctionEmitter<'m> {
    module: &'m IrModule,
    func: &'m IrFunction,
    uses_memory: bool,
    stack: Vec<StackValue>,
    frames: Vec<Frame>,
    next_tmp: u32,
    next_label: u32,
    /// Whether the current basic block still needs a terminator.
    block_open: bool,
    body: String,
}

impl<'m> FunctionEmitter<'m> {
    fn new(module: &'m IrModule, func: &'m IrFunction, uses_memory: bool) -> Self {
        Self {
            module,
            func,
            uses_memory,
            stack: Vec::new(),
            frames: Vec::new(),
            next_tmp: 0,
            next_label: 0,
            block_open: true,
            body: String::new(),
        }
    }

    fn emit(mut self, out: &mut String) {
        let params = self
            .func
            .params
            .iter()
            .map(|(name, ty)| format!("{} %{name}", lltype(*ty)))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            out,
            "define {} @{}({}) {{",
            llret(self.func.ret),
            self.func.name,
            params
        );
        let _ = writeln!(out, "entry:");

        // Stack slots: parameters stored from arguments, locals zeroed.
        for (name, ty) in &self.func.params {
            let ty = lltype(*ty);
            let _ = writeln!(self.body, "  %{name}.addr = alloca {ty}");
            let _ = writeln!(self.body, "  store {ty} %{name}, ptr %{name}.addr");
        }
        for (name, ty) in &self.func.locals {
            let zero = match ty {
                IrType::I => "0".to_string(),
                IrType::F => "0.000000e+00".to_string(),
            };
            let ty = lltype(*ty);
            let _ = writeln!(self.body, "  %{name}.addr = alloca {ty}");
            let _ = writeln!(self.body, "  store {ty} {zero}, ptr %{name}.addr");
        }

        let code = &self.func.code;
        for instr in code {
            self.emit_instr(instr);
        }
        assert!(self.frames.is_empty(), "unclosed structured control");
        if self.block_open {
            self.default_return();
        }

        out.push_str(&self.body);
        let _ = writeln!(out, "}}");
    }

    fn tmp(&mut self) -> String {
        let name = format!("%tmp{}", self.next_tmp);
        self.next_tmp += 1;
        name
    }

    fn label(&mut self) -> u32 {
        let id = self.next_label;
        self.next_label += 1;
        id
    }

    fn inst(&mut self, text: &str) {
        let _ = writeln!(self.body, "  {text}");
    }

    /// Write a terminator and mark the block closed.
    fn terminate(&mut self, text: &str) {
        assert!(self.block_open, "terminator in closed block");
        let _ = writeln!(self.body, "  {text}");
        self.block_open = false;
    }

    fn begin_block(&mut self, label: &str) {
        assert!(!self.block_open, "block started before previous terminated");
        let _ = writeln!(self.body, "{label}:");
        self.block_open = true;
    }

    fn push(&mut self, value: String, ty: IrType) {
        self.stack.push((value, ty));
    }

    fn pop(&mut self) -> StackValue {
        self.stack.pop().expect("IR stack underflow")
    }

    fn default_return(&mut self) {
        match self.func.ret {
            Some(IrType::I) => self.terminate("ret i32 0"),
            Some(IrType::F) => self.terminate("ret double 0.000000e+00"),
            None => self.terminate("ret void"),
        }
    }

    /// Reduce a popped condition to an `i1`.
    fn truth(&mut self, value: &str) -> String {
        let flag = self.tmp();
        self.inst(&format!("{flag} = icmp ne i32 {value}, 0"));
        flag
    }

    fn int_binary(&mut self, op: &str) {
        let (right, _) = self.pop();
        let (left, _) = self.pop();
        let result = self.tmp();
        self.inst(&format!("{result} = {op} i32 {left}, {right}"));
        self.push(result, IrType::I);
    }

    fn float_binary(&mut self, op: &str) {
        let (right, _) = self.pop();
        let (left, _) = self.pop();
        let result = self.tmp();
        self.inst(&format!("{result} = {op} double {left}, {right}"));
        self.push(result, IrType::F);
    }

    /// Comparison producing an IR `I` (zext of the `i1`).
    fn compare(&mut self, op: &str, ty: &str) {
        let (right, _) = self.pop();
        let (left, _) = self.pop();
        let flag = self.tmp();
        self.inst(&format!("{flag} = {op} {ty} {left}, {right}"));
        let result = self.tmp();
        self.inst(&format!("{result} = zext i1 {flag} to i32"));
        self.push(result, IrType::I);
    }

    /// Bounds-check a byte address against the current memory size, then GEP
    /// into the memory array. The address is widened to `i64` (addresses are
    /// unsigned, and `addr + 4` must not wrap); an out-of-bounds access
    /// branches to a trapping block, as the interpreter and a WebAssembly
    /// engine would trap.
    fn checked_memory_slot(&mut self, address: &str) -> String {
        assert!(self.uses_memory, "memory op without memory globals");
        let id = self.label();
        let wide = self.tmp();
        self.inst(&format!("{wide} = zext i32 {address} to i64"));
        let end = self.tmp();
        self.inst(&format!("{end} = add i64 {wide}, 4"));
        let size = self.tmp();
        self.inst(&format!("{size} = load i32, ptr @wb.memsize"));
        let size_wide = self.tmp();
        self.inst(&format!("{size_wide} = zext i32 {size} to i64"));
        let in_bounds = self.tmp();
        self.inst(&format!("{in_bounds} = icmp ule i64 {end}, {size_wide}"));
        self.terminate(&format!(
            "br i1 {in_bounds}, label %mem_ok{id}, label %mem_trap{id}"
        ));
        self.begin_block(&format!("mem_trap{id}"));
        self.inst("call void @llvm.trap()");
        self.terminate("unreachable");
        self.begin_block(&format!("mem_ok{id}"));
        let slot = self.tmp();
        self.inst(&format!(
            "{slot} = getelementptr inbounds [{MEMORY_CAPACITY} x i8], ptr @wb.memory, i64 0, i64 {wide}"
        ));
        slot
    }

    #[allow(clippy::too_many_lines)]
    fn emit_instr(&mut self, instr: &Instr) {
        match instr {
            Instr::ConstI(value) => self.push(value.to_string(), IrType::I),
            Instr::ConstF(value) => self.push(float_literal(*value), IrType::F),

            Instr::AddI => self.int_binary("add"),
            Instr::SubI => self.int_binary("sub"),
            Instr::MulI => self.int_binary("mul"),
            Instr::DivI => self.int_binary("sdiv"),
            Instr::AddF => self.float_binary("fadd"),
            Instr::SubF => self.float_binary("fsub"),
            Instr::MulF => self.float_binary("fmul"),
            Instr::DivF => self.float_binary("fdiv"),

            Instr::LtI => self.compare("icmp slt", "i32"),
            Instr::LeI => self.compare("icmp sle", "i32"),
            Instr::GtI => self.compare("icmp sgt", "i32"),
            Instr::GeI => self.compare("icmp sge", "i32"),
            Instr::EqI => self.compare("icmp eq", "i32"),
            Instr::NeI => self.compare("icmp ne", "i32"),
            Instr::LtF => self.compare("fcmp olt", "double"),
            Instr::LeF => self.compare("fcmp ole", "double"),
            Instr::GtF => self.compare("fcmp ogt", "double"),
            Instr::GeF => self.compare("fcmp oge", "double"),
            Instr::EqF => self.compare("fcmp oeq", "double"),
            Instr::NeF => self.compare("fcmp une", "double"),

            Instr::AndI => self.int_binary("and"),
            Instr::OrI => self.int_binary("or"),
            Instr::XorI => self.int_binary("xor"),

            Instr::Load(name) => {
                let (slot, ty) = self.resolve(name);
                let result = self.tmp();
                self.inst(&format!("{result} = load {}, ptr {slot}", lltype(ty)));
                self.push(result, ty);
            }
            Instr::Store(name) => {
                let (slot, ty) = self.resolve(name);
                let (value, _) = self.pop();
                self.inst(&format!("store {} {value}, ptr {slot}", lltype(ty)));
            }

            Instr::PeekI => {
                let (address, _) = self.pop();
                let slot = self.checked_memory_slot(&address);
                let result = self.tmp();
                self.inst(&format!("{result} = load i32, ptr {slot}, align 1"));
                self.push(result, IrType::I);
            }
            Instr::PokeI => {
                let (value, _) = self.pop();
                let (address, _) = self.pop();
                let slot = self.checked_memory_slot(&address);
                self.inst(&format!("store i32 {value}, ptr {slot}, align 1"));
            }
            Instr::GrowM => {
                // Page-round the unsigned request in i64 (no 32-bit wrap),
                // cap the total at the array capacity, and leave the size
                // unchanged on an oversized grow, like a failed memory.grow.
                let (request, _) = self.pop();
                let wide = self.tmp();
                self.inst(&format!("{wide} = zext i32 {request} to i64"));
                let padded = self.tmp();
                self.inst(&format!("{padded} = add i64 {wide}, {}", PAGE_SIZE - 1));
                let pages = self.tmp();
                self.inst(&format!("{pages} = udiv i64 {padded}, {PAGE_SIZE}"));
                let bytes = self.tmp();
                self.inst(&format!("{bytes} = mul i64 {pages}, {PAGE_SIZE}"));
                let old = self.tmp();
                self.inst(&format!("{old} = load i32, ptr @wb.memsize"));
                let old_wide = self.tmp();
                self.inst(&format!("{old_wide} = zext i32 {old} to i64"));
                let grown = self.tmp();
                self.inst(&format!("{grown} = add i64 {old_wide}, {bytes}"));
                let fits = self.tmp();
                self.inst(&format!("{fits} = icmp ule i64 {grown}, {MEMORY_CAPACITY}"));
                let clamped = self.tmp();
                self.inst(&format!(
                    "{clamped} = select i1 {fits}, i64 {grown}, i64 {old_wide}"
                ));
                let new = self.tmp();
                self.inst(&format!("{new} = trunc i64 {clamped} to i32"));
                self.inst(&format!("store i32 {new}, ptr @wb.memsize"));
                self.push(new, IrType::I);
            }

            Instr::If => {
                let id = self.label();
                let (condition, _) = self.pop();
                let flag = self.truth(&condition);
                self.terminate(&format!(
                    "br i1 {flag}, label %then{id}, label %else{id}"
                ));
                self.begin_block(&format!("then{id}"));
                self.frames.push(Frame::If(id));
            }
            Instr::Else => {
                let Some(Frame::If(id)) = self.frames.last() else {
                    panic!("ELSE without open IF");
                };
                let id = *id;
                self.terminate(&format!("br label %endif{id}"));
                self.begin_block(&format!("else{id}"));
            }
            Instr::EndIf => {
                let Some(Frame::If(id)) = self.frames.pop() else {
                    panic!("ENDIF without open IF");
                };
                self.terminate(&format!("br label %endif{id}"));
                self.begin_block(&format!("endif{id}"));
            }
            Instr::Loop => {
                let id = self.label();
                self.terminate(&format!("br label %loop_hdr{id}"));
                self.begin_block(&format!("loop_hdr{id}"));
                self.frames.push(Frame::Loop(id));
            }
            Instr::CBreak => {
                let id = self
                    .frames
                    .iter()
                    .rev()
                    .find_map(|frame| match frame {
                        Frame::Loop(id) => Some(*id),
                        Frame::If(_) => None,
                    })
                    .expect("CBREAK outside of LOOP");
                let (condition, _) = self.pop();
                let flag = self.truth(&condition);
                self.terminate(&format!(
                    "br i1 {flag}, label %loop_body{id}, label %loop_end{id}"
                ));
                self.begin_block(&format!("loop_body{id}"));
            }
            Instr::EndLoop => {
                let Some(Frame::Loop(id)) = self.frames.pop() else {
                    panic!("ENDLOOP without open LOOP");
                };
                self.terminate(&format!("br label %loop_hdr{id}"));
                self.begin_block(&format!("loop_end{id}"));
            }

            Instr::Call(name) => {
                let (params, ret) = self.callee_signature(name);
                let mut arguments = Vec::with_capacity(params.len());
                for _ in 0..params.len() {
                    let (value, _) = self.pop();
                    arguments.push(value);
                }
                arguments.reverse();
                let arguments = params
                    .iter()
                    .zip(arguments.iter())
                    .map(|(ty, value)| format!("{} {value}", lltype(*ty)))
                    .collect::<Vec<_>>()
                    .join(", ");
                match ret {
                    Some(ty) => {
                        let result = self.tmp();
                        self.inst(&format!(
                            "{result} = call {} @{name}({arguments})",
                            lltype(ty)
                        ));
                        self.push(result, ty);
                    }
                    None => self.inst(&format!("call void @{name}({arguments})")),
                }
            }
            Instr::Ret => {
                match self.func.ret {
                    Some(ty) => {
                        let (value, _) = self.pop();
                        self.terminate(&format!("ret {} {value}", lltype(ty)));
                    }
                    None => self.terminate("ret void"),
                }
                // Park any trailing instructions of the surrounding
                // construct in an unreachable block.
                let id = self.label();
                self.begin_block(&format!("dead{id}"));
            }

            Instr::PrintI => {
                let (value, _) = self.pop();
                self.inst(&format!("call void @_printi(i32 {value})"));
            }
            Instr::PrintF => {
                let (value, _) = self.pop();
                self.inst(&format!("call void @_printf(double {value})"));
            }
            Instr::Drop => {
                self.pop();
            }
        }
    }

    /// Resolve a name to its slot: `%name.addr` for locals, `@name` for
    /// globals.
    fn resolve(&self, name: &str) -> (String, IrType) {
        if let Some(ty) = self.func.local_type(name) {
            (format!("%{name}.addr"), ty)
        } else {
            let global = self
                .module
                .global(name)
                .unwrap_or_else(|| panic!("unresolved name `{name}`"));
            (format!("@{name}"), global.ty)
        }
    }

    fn callee_signature(&self, name: &str) -> (Vec<IrType>, Option<IrType>) {
        if let Some(func) = self.module.function(name) {
            (func.params.iter().map(|(_, ty)| *ty).collect(), func.ret)
        } else if let Some(import) = self.module.import(name) {
            (import.params.clone(), import.ret)
        } else {
            panic!("call to unknown name `{name}`");
        }
    }
}
