//! The stack-machine instruction set.
//!
//! Opcodes carry a type suffix: `I` operates on 32-bit two's-complement
//! integers (which also represent booleans as 0/1), `F` on 64-bit floats.
//! Relational opcodes consume two values of their suffix type and produce an
//! `I`. Structured control (`If`/`Loop`) is strictly nested; the back-ends
//! assert balance rather than emit malformed output.

use core::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    // Constants
    ConstI(i32),
    ConstF(f64),

    // Arithmetic
    AddI,
    SubI,
    MulI,
    DivI,
    AddF,
    SubF,
    MulF,
    DivF,

    // Relational (produce I)
    LtI,
    LeI,
    GtI,
    GeI,
    EqI,
    NeI,
    LtF,
    LeF,
    GtF,
    GeF,
    EqF,
    NeF,

    // Logical on I (strict; operands are 0/1)
    AndI,
    OrI,
    XorI,

    // Variables; the back-ends resolve the name to a local or global slot
    // by the owning function's params/locals tables.
    Load(String),
    Store(String),

    // Raw linear memory (4-byte little-endian I cells)
    PeekI,
    PokeI,
    GrowM,

    // Structured control. `CBreak` exits the innermost loop iff the popped
    // condition is zero.
    If,
    Else,
    EndIf,
    Loop,
    CBreak,
    EndLoop,

    // Functions
    Call(String),
    Ret,

    // I/O and stack housekeeping
    PrintI,
    PrintF,
    Drop,
}

impl Display for Instr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Instr::ConstI(value) => write!(f, "CONSTI {value}"),
            Instr::ConstF(value) => write!(f, "CONSTF {value}"),
            Instr::AddI => write!(f, "ADDI"),
            Instr::SubI => write!(f, "SUBI"),
            Instr::MulI => write!(f, "MULI"),
            Instr::DivI => write!(f, "DIVI"),
            Instr::AddF => write!(f, "ADDF"),
            Instr::SubF => write!(f, "SUBF"),
            Instr::MulF => write!(f, "MULF"),
            Instr::DivF => write!(f, "DIVF"),
            Instr::LtI => write!(f, "LTI"),
            Instr::LeI => write!(f, "LEI"),
            Instr::GtI => write!(f, "GTI"),
            Instr::GeI => write!(f, "GEI"),
            Instr::EqI => write!(f, "EQI"),
            Instr::NeI => write!(f, "NEI"),
            Instr::LtF => write!(f, "LTF"),
            Instr::LeF => write!(f, "LEF"),
            Instr::GtF => write!(f, "GTF"),
            Instr::GeF => write!(f, "GEF"),
            Instr::EqF => write!(f, "EQF"),
            Instr::NeF => write!(f, "NEF"),
            Instr::AndI => write!(f, "ANDI"),
            Instr::OrI => write!(f, "ORI"),
            Instr::XorI => write!(f, "XORI"),
            Instr::Load(name) => write!(f, "LOAD {name}"),
            Instr::Store(name) => write!(f, "STORE {name}"),
            Instr::PeekI => write!(f, "PEEKI"),
            Instr::PokeI => write!(f, "POKEI"),
            Instr::GrowM => write!(f, "GROWM"),
            Instr::If => write!(f, "IF"),
            Instr::Else => write!(f, "ELSE"),
            Instr::EndIf => write!(f, "ENDIF"),
            Instr::Loop => write!(f, "LOOP"),
            Instr::CBreak => write!(f, "CBREAK"),
            Instr::EndLoop => write!(f, "ENDLOOP"),
            Instr::Call(name) => write!(f, "CALL {name}"),
            Instr::Ret => write!(f, "RET"),
            Instr::PrintI => write!(f, "PRINTI"),
            Instr::PrintF => write!(f, "PRINTF"),
            Instr::Drop => write!(f, "DROP"),
        }
    }
}
