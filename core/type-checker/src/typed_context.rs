//! Type information storage for AST nodes.
//!
//! The checker never mutates the AST; every annotation is keyed on the node
//! id assigned at parse time. Downstream phases (IR generation) consume the
//! context read-only.

use rustc_hash::FxHashMap;

use wabbit_ast::nodes::Module;

use crate::symbol_table::StorageClass;
use crate::type_info::TypeInfo;

/// A callable signature visible at module scope.
#[derive(Debug, Clone)]
pub struct FuncSig {
    pub name: String,
    pub params: Vec<TypeInfo>,
    pub ret: TypeInfo,
    pub imported: bool,
}

/// One module-scope variable or constant, in declaration order.
#[derive(Debug, Clone)]
pub struct GlobalInfo {
    pub name: String,
    pub ty: TypeInfo,
    pub constant: bool,
}

/// The type-checked module: the AST plus every annotation later phases need.
#[derive(Debug, Default)]
pub struct TypedContext {
    pub module: Module,
    /// Expression node id → computed type.
    types: FxHashMap<u32, TypeInfo>,
    /// Name/declaration node id → resolved storage class.
    storages: FxHashMap<u32, StorageClass>,
    /// Function and import signatures by name (the entry `main` included).
    pub signatures: FxHashMap<String, FuncSig>,
    /// Module-scope variables and constants, in declaration order.
    pub globals: Vec<GlobalInfo>,
    /// Function name → its declared locals (parameters excluded), in
    /// declaration order. Locals of top-level nested blocks are filed under
    /// the implicit entry.
    pub function_locals: FxHashMap<String, Vec<(String, TypeInfo)>>,
    /// Whether the module declares its own `func main`.
    pub has_user_main: bool,
}

impl TypedContext {
    #[must_use]
    pub fn new(module: Module) -> Self {
        Self {
            module,
            ..Self::default()
        }
    }

    pub(crate) fn set_node_typeinfo(&mut self, id: u32, ty: TypeInfo) {
        self.types.insert(id, ty);
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub fn get_node_typeinfo(&self, id: u32) -> Option<TypeInfo> {
        self.types.get(&id).copied()
    }

    pub(crate) fn set_node_storage(&mut self, id: u32, storage: StorageClass) {
        self.storages.insert(id, storage);
    }

    /// Storage class of a resolved name or declaration node.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn get_node_storage(&self, id: u32) -> Option<StorageClass> {
        self.storages.get(&id).copied()
    }

    /// Number of recorded type annotations (used by idempotence tests).
    #[must_use]
    pub fn annotation_count(&self) -> usize {
        self.types.len()
    }
}
