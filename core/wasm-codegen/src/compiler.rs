//! IR to WebAssembly 1.0 binary modules.
//!
//! Section layout: 1 Types, 2 Imports, 3 Functions, [5 Memory], 6 Globals,
//! 7 Exports, 10 Code. The host print routines `env._printi (i32)→()` and
//! `env._printf (f64)→()` are always the first two imports, so they occupy
//! function indices 0 and 1; `import func` declarations follow, then defined
//! functions. The entry is exported as `"main"`, and the linear memory as
//! `"memory"` whenever a memory opcode was generated.
//!
//! Structured control maps one-to-one, except the loop shape: `LOOP … ENDLOOP`
//! becomes `block (loop … br 0) end end`, and `CBREAK` (exit iff the popped
//! condition is false) becomes `i32.eqz; br_if <block>`. The emitter keeps a
//! stack of open constructs and asserts balance; producing malformed bytes is
//! never an option.

use rustc_hash::FxHashMap;

use wabbit_ir::instr::Instr;
use wabbit_ir::module::{IrFunction, IrModule, IrType};

use crate::encoder::Encoder;

// Value types
const VT_I32: u8 = 0x7F;
const VT_F64: u8 = 0x7C;

// Type and export descriptors
const FUNC_TYPE: u8 = 0x60;
const DESC_FUNC: u8 = 0x00;
const DESC_MEM: u8 = 0x02;

// Control opcodes
const OP_BLOCK: u8 = 0x02;
const OP_LOOP: u8 = 0x03;
const OP_IF: u8 = 0x04;
const OP_ELSE: u8 = 0x05;
const OP_END: u8 = 0x0B;
const OP_BR: u8 = 0x0C;
const OP_BR_IF: u8 = 0x0D;
const OP_RETURN: u8 = 0x0F;
const OP_CALL: u8 = 0x10;
const OP_DROP: u8 = 0x1A;
const BLOCKTYPE_EMPTY: u8 = 0x40;

// Variable access
const OP_LOCAL_GET: u8 = 0x20;
const OP_LOCAL_SET: u8 = 0x21;
const OP_GLOBAL_GET: u8 = 0x23;
const OP_GLOBAL_SET: u8 = 0x24;

// Memory access
const OP_I32_LOAD: u8 = 0x28;
const OP_I32_STORE: u8 = 0x36;
const OP_MEMORY_SIZE: u8 = 0x3F;
const OP_MEMORY_GROW: u8 = 0x40;

// Constants
const OP_I32_CONST: u8 = 0x41;
const OP_F64_CONST: u8 = 0x44;

// i32 comparison and arithmetic
const OP_I32_EQZ: u8 = 0x45;
const OP_I32_EQ: u8 = 0x46;
const OP_I32_NE: u8 = 0x47;
const OP_I32_LT_S: u8 = 0x48;
const OP_I32_GT_S: u8 = 0x4A;
const OP_I32_LE_S: u8 = 0x4C;
const OP_I32_GE_S: u8 = 0x4E;
const OP_I32_ADD: u8 = 0x6A;
const OP_I32_SUB: u8 = 0x6B;
const OP_I32_MUL: u8 = 0x6C;
const OP_I32_DIV_S: u8 = 0x6D;
const OP_I32_DIV_U: u8 = 0x6E;
const OP_I32_AND: u8 = 0x71;
const OP_I32_OR: u8 = 0x72;
const OP_I32_XOR: u8 = 0x73;

// f64 comparison and arithmetic
const OP_F64_EQ: u8 = 0x61;
const OP_F64_NE: u8 = 0x62;
const OP_F64_LT: u8 = 0x63;
const OP_F64_GT: u8 = 0x64;
const OP_F64_LE: u8 = 0x65;
const OP_F64_GE: u8 = 0x66;
const OP_F64_ADD: u8 = 0xA0;
const OP_F64_SUB: u8 = 0xA1;
const OP_F64_MUL: u8 = 0xA2;
const OP_F64_DIV: u8 = 0xA3;

const PAGE_SIZE: i32 = 65536;

fn valtype(ty: IrType) -> u8 {
    match ty {
        IrType::I => VT_I32,
        IrType::F => VT_F64,
    }
}

/// A deduplicated function signature for the type section.
type Signature = (Vec<IrType>, Option<IrType>);

#[derive(Default)]
struct TypeTable {
    signatures: Vec<Signature>,
}

impl TypeTable {
    fn index_of(&mut self, params: Vec<IrType>, ret: Option<IrType>) -> u32 {
        let signature = (params, ret);
        let position = self
            .signatures
            .iter()
            .position(|existing| *existing == signature)
            .unwrap_or_else(|| {
                self.signatures.push(signature);
                self.signatures.len() - 1
            });
        u32::try_from(position).expect("type index fits in u32")
    }
}

pub(crate) struct Compiler<'m> {
    module: &'m IrModule,
    types: TypeTable,
    /// Name → index in the function index space (imports first).
    func_indices: FxHashMap<String, u32>,
    /// Name → index in the global index space (declaration order).
    global_indices: FxHashMap<String, u32>,
    /// Type index per import, then per defined function.
    import_types: Vec<u32>,
    function_types: Vec<u32>,
    uses_memory: bool,
}

impl<'m> Compiler<'m> {
    pub(crate) fn new(module: &'m IrModule) -> Self {
        let mut compiler = Self {
            module,
            types: TypeTable::default(),
            func_indices: FxHashMap::default(),
            global_indices: FxHashMap::default(),
            import_types: Vec::new(),
            function_types: Vec::new(),
            uses_memory: module.uses_memory(),
        };
        compiler.assign_indices();
        compiler
    }

    fn assign_indices(&mut self) {
        let module = self.module;
        // Host print imports first, at indices 0 and 1.
        let mut next = 0u32;
        for (name, params, ret) in [
            ("_printi", vec![IrType::I], None),
            ("_printf", vec![IrType::F], None),
        ] {
            let type_index = self.types.index_of(params, ret);
            self.import_types.push(type_index);
            self.func_indices.insert(name.to_string(), next);
            next += 1;
        }
        for import in &module.imports {
            let type_index = self.types.index_of(import.params.clone(), import.ret);
            self.import_types.push(type_index);
            self.func_indices.insert(import.name.clone(), next);
            next += 1;
        }
        for func in &module.functions {
            let params = func.params.iter().map(|(_, ty)| *ty).collect();
            let type_index = self.types.index_of(params, func.ret);
            self.function_types.push(type_index);
            self.func_indices.insert(func.name.clone(), next);
            next += 1;
        }
        for (index, global) in module.globals.iter().enumerate() {
            self.global_indices.insert(
                global.name.clone(),
                u32::try_from(index).expect("global index fits in u32"),
            );
        }
    }

    pub(crate) fn compile(&self) -> Vec<u8> {
        let mut out = Encoder::new();
        out.raw(b"\0asm");
        out.raw(&[0x01, 0x00, 0x00, 0x00]);

        out.section(1, &self.type_section());
        out.section(2, &self.import_section());
        out.section(3, &self.function_section());
        if self.uses_memory {
            out.section(5, &self.memory_section());
        }
        out.section(6, &self.global_section());
        out.section(7, &self.export_section());
        out.section(10, &self.code_section());

        out.into_bytes()
    }

    fn type_section(&self) -> Encoder {
        let mut section = Encoder::new();
        section.u32(u32::try_from(self.types.signatures.len()).expect("type count fits in u32"));
        for (params, ret) in &self.types.signatures {
            section.byte(FUNC_TYPE);
            section.u32(u32::try_from(params.len()).expect("param count fits in u32"));
            for param in params {
                section.byte(valtype(*param));
            }
            match ret {
                Some(ty) => {
                    section.u32(1);
                    section.byte(valtype(*ty));
                }
                None => section.u32(0),
            }
        }
        section
    }

    fn import_section(&self) -> Encoder {
        let mut section = Encoder::new();
        let names = ["_printi", "_printf"]
            .into_iter()
            .map(str::to_string)
            .chain(self.module.imports.iter().map(|i| i.name.clone()));
        section.u32(u32::try_from(self.import_types.len()).expect("import count fits in u32"));
        for (name, type_index) in names.zip(self.import_types.iter()) {
            section.name("env");
            section.name(&name);
            section.byte(DESC_FUNC);
            section.u32(*type_index);
        }
        section
    }

    fn function_section(&self) -> Encoder {
        let mut section = Encoder::new();
        section.u32(u32::try_from(self.function_types.len()).expect("function count fits in u32"));
        for type_index in &self.function_types {
            section.u32(*type_index);
        }
        section
    }

    fn memory_section(&self) -> Encoder {
        let mut section = Encoder::new();
        section.u32(1);
        // Limits: minimum one page, no maximum.
        section.byte(0x00);
        section.u32(1);
        section
    }

    fn global_section(&self) -> Encoder {
        let mut section = Encoder::new();
        section.u32(u32::try_from(self.module.globals.len()).expect("global count fits in u32"));
        for global in &self.module.globals {
            section.byte(valtype(global.ty));
            section.byte(0x01); // mutable
            match global.ty {
                IrType::I => {
                    section.byte(OP_I32_CONST);
                    section.i32(0);
                }
                IrType::F => {
                    section.byte(OP_F64_CONST);
                    section.f64(0.0);
                }
            }
            section.byte(OP_END);
        }
        section
    }

    fn export_section(&self) -> Encoder {
        let mut section = Encoder::new();
        let count = if self.uses_memory { 2 } else { 1 };
        section.u32(count);
        section.name("main");
        section.byte(DESC_FUNC);
        section.u32(self.func_indices[&self.module.entry]);
        if self.uses_memory {
            section.name("memory");
            section.byte(DESC_MEM);
            section.u32(0);
        }
        section
    }

    fn code_section(&self) -> Encoder {
        let mut section = Encoder::new();
        section.u32(u32::try_from(self.module.functions.len()).expect("function count fits in u32"));
        for func in &self.module.functions {
            let body = self.function_body(func);
            let bytes = body.into_bytes();
            section.u32(u32::try_from(bytes.len()).expect("body size fits in u32"));
            section.raw(&bytes);
        }
        section
    }

    fn function_body(&self, func: &IrFunction) -> Encoder {
        let mut body = Encoder::new();

        // Declared locals, run-length grouped by type.
        let mut groups: Vec<(u32, IrType)> = Vec::new();
        for (_, ty) in &func.locals {
            match groups.last_mut() {
                Some((count, last)) if last == ty => *count += 1,
                _ => groups.push((1, *ty)),
            }
        }
        body.u32(u32::try_from(groups.len()).expect("local group count fits in u32"));
        for (count, ty) in groups {
            body.u32(count);
            body.byte(valtype(ty));
        }

        self.emit_code(func, &mut body);
        body.byte(OP_END);
        body
    }

    #[allow(clippy::too_many_lines)]
    fn emit_code(&self, func: &IrFunction, body: &mut Encoder) {
        #[derive(Debug, PartialEq, Eq)]
        enum Frame {
            If,
            Loop,
        }
        let mut frames: Vec<Frame> = Vec::new();

        for instr in &func.code {
            match instr {
                Instr::ConstI(value) => {
                    body.byte(OP_I32_CONST);
                    body.i32(*value);
                }
                Instr::ConstF(value) => {
                    body.byte(OP_F64_CONST);
                    body.f64(*value);
                }

                Instr::AddI => body.byte(OP_I32_ADD),
                Instr::SubI => body.byte(OP_I32_SUB),
                Instr::MulI => body.byte(OP_I32_MUL),
                Instr::DivI => body.byte(OP_I32_DIV_S),
                Instr::AddF => body.byte(OP_F64_ADD),
                Instr::SubF => body.byte(OP_F64_SUB),
                Instr::MulF => body.byte(OP_F64_MUL),
                Instr::DivF => body.byte(OP_F64_DIV),

                Instr::LtI => body.byte(OP_I32_LT_S),
                Instr::LeI => body.byte(OP_I32_LE_S),
                Instr::GtI => body.byte(OP_I32_GT_S),
                Instr::GeI => body.byte(OP_I32_GE_S),
                Instr::EqI => body.byte(OP_I32_EQ),
                Instr::NeI => body.byte(OP_I32_NE),
                Instr::LtF => body.byte(OP_F64_LT),
                Instr::LeF => body.byte(OP_F64_LE),
                Instr::GtF => body.byte(OP_F64_GT),
                Instr::GeF => body.byte(OP_F64_GE),
                Instr::EqF => body.byte(OP_F64_EQ),
                Instr::NeF => body.byte(OP_F64_NE),

                Instr::AndI => body.byte(OP_I32_AND),
                Instr::OrI => body.byte(OP_I32_OR),
                Instr::XorI => body.byte(OP_I32_XOR),

                Instr::Load(name) => {
                    if let Some(index) = func.local_index(name) {
                        body.byte(OP_LOCAL_GET);
                        body.u32(index);
                    } else {
                        body.byte(OP_GLOBAL_GET);
                        body.u32(self.global_indices[name]);
                    }
                }
                Instr::Store(name) => {
                    if let Some(index) = func.local_index(name) {
                        body.byte(OP_LOCAL_SET);
                        body.u32(index);
                    } else {
                        body.byte(OP_GLOBAL_SET);
                        body.u32(self.global_indices[name]);
                    }
                }

                Instr::PeekI => {
                    body.byte(OP_I32_LOAD);
                    body.u32(0); // align (log2): byte-addressable cells
                    body.u32(0); // offset
                }
                Instr::PokeI => {
                    body.byte(OP_I32_STORE);
                    body.u32(0);
                    body.u32(0);
                }
                Instr::GrowM => {
                    // Round the byte count up to whole pages, grow, and
                    // leave the new memory size in bytes.
                    body.byte(OP_I32_CONST);
                    body.i32(PAGE_SIZE - 1);
                    body.byte(OP_I32_ADD);
                    body.byte(OP_I32_CONST);
                    body.i32(PAGE_SIZE);
                    body.byte(OP_I32_DIV_U);
                    body.byte(OP_MEMORY_GROW);
                    body.byte(0x00);
                    body.byte(OP_DROP);
                    body.byte(OP_MEMORY_SIZE);
                    body.byte(0x00);
                    body.byte(OP_I32_CONST);
                    body.i32(PAGE_SIZE);
                    body.byte(OP_I32_MUL);
                }

                Instr::If => {
                    body.byte(OP_IF);
                    body.byte(BLOCKTYPE_EMPTY);
                    frames.push(Frame::If);
                }
                Instr::Else => {
                    assert_eq!(frames.last(), Some(&Frame::If), "ELSE without open IF");
                    body.byte(OP_ELSE);
                }
                Instr::EndIf => {
                    assert_eq!(frames.pop(), Some(Frame::If), "ENDIF without open IF");
                    body.byte(OP_END);
                }
                Instr::Loop => {
                    body.byte(OP_BLOCK);
                    body.byte(BLOCKTYPE_EMPTY);
                    body.byte(OP_LOOP);
                    body.byte(BLOCKTYPE_EMPTY);
                    frames.push(Frame::Loop);
                }
                Instr::CBreak => {
                    // Exit the enclosing block when the condition is false.
                    let mut label = 0u32;
                    let mut found = false;
                    for frame in frames.iter().rev() {
                        match frame {
                            Frame::If => label += 1,
                            Frame::Loop => {
                                found = true;
                                break;
                            }
                        }
                    }
                    assert!(found, "CBREAK outside of LOOP");
                    body.byte(OP_I32_EQZ);
                    body.byte(OP_BR_IF);
                    body.u32(label + 1);
                }
                Instr::EndLoop => {
                    assert_eq!(frames.pop(), Some(Frame::Loop), "ENDLOOP without open LOOP");
                    body.byte(OP_BR);
                    body.u32(0);
                    body.byte(OP_END); // loop
                    body.byte(OP_END); // block
                }

                Instr::Call(name) => {
                    body.byte(OP_CALL);
                    body.u32(self.func_indices[name]);
                }
                Instr::Ret => body.byte(OP_RETURN),

                Instr::PrintI => {
                    body.byte(OP_CALL);
                    body.u32(0);
                }
                Instr::PrintF => {
                    body.byte(OP_CALL);
                    body.u32(1);
                }
                Instr::Drop => body.byte(OP_DROP),
            }
        }
        assert!(frames.is_empty(), "unclosed structured control");
    }
}
