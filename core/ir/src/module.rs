//! The IR module model.
//!
//! Storage declarations are structured data rather than opcodes: each
//! function carries its parameter and local tables, the module carries its
//! globals. Globals are always zero-initialized; initializer expressions are
//! ordinary code in the entry function, preserving source order.

use core::fmt;
use std::fmt::{Display, Formatter};

use crate::instr::Instr;

/// The two IR value types. Booleans travel as `I`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrType {
    I,
    F,
}

impl Display for IrType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            IrType::I => write!(f, "I"),
            IrType::F => write!(f, "F"),
        }
    }
}

/// A host function signature the module expects its embedder to provide.
#[derive(Debug, Clone, PartialEq)]
pub struct IrImport {
    pub name: String,
    pub params: Vec<IrType>,
    pub ret: Option<IrType>,
}

/// A module-scope slot, zero-initialized at instantiation.
#[derive(Debug, Clone, PartialEq)]
pub struct IrGlobal {
    pub name: String,
    pub ty: IrType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrFunction {
    pub name: String,
    pub params: Vec<(String, IrType)>,
    /// `None` encodes a `void` function.
    pub ret: Option<IrType>,
    /// Declared locals in declaration order; parameters are not repeated.
    pub locals: Vec<(String, IrType)>,
    pub code: Vec<Instr>,
}

impl IrFunction {
    /// Resolve a name in this function's local index space: parameters first
    /// (0..n), then declared locals.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn local_index(&self, name: &str) -> Option<u32> {
        self.params
            .iter()
            .chain(self.locals.iter())
            .position(|(local, _)| local == name)
            .map(|index| u32::try_from(index).expect("local index fits in u32"))
    }

    /// Type of a parameter or local, if the name is function-local.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn local_type(&self, name: &str) -> Option<IrType> {
        self.params
            .iter()
            .chain(self.locals.iter())
            .find(|(local, _)| local == name)
            .map(|(_, ty)| *ty)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IrModule {
    pub imports: Vec<IrImport>,
    pub globals: Vec<IrGlobal>,
    pub functions: Vec<IrFunction>,
    /// Name of the exported entry function; always present in generated
    /// modules (synthesized when the source declares no `main`).
    pub entry: String,
}

impl IrModule {
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn import(&self, name: &str) -> Option<&IrImport> {
        self.imports.iter().find(|i| i.name == name)
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn global(&self, name: &str) -> Option<&IrGlobal> {
        self.globals.iter().find(|g| g.name == name)
    }

    /// Whether any function touches the linear memory; decides the presence
    /// of the memory section/globals in the back-ends.
    #[must_use]
    pub fn uses_memory(&self) -> bool {
        self.functions.iter().any(|f| {
            f.code
                .iter()
                .any(|i| matches!(i, Instr::PeekI | Instr::PokeI | Instr::GrowM))
        })
    }
}
