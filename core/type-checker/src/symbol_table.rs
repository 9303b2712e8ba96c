//! Symbol Table
//!
//! Scopes form a chain from the innermost block out to the module scope.
//! Each scope owns its symbols; lookup walks parent links outward. The module
//! scope holds globals, imports, and functions; every function body gets a
//! fresh scope seeded with its parameters, and each nested `{…}` pushes
//! another. Popping never removes the module scope.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::type_info::TypeInfo;

pub(crate) type ScopeRef = Rc<RefCell<Scope>>;

/// Storage class of a value symbol, reflected in the IR opcode space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Global,
    Local,
}

/// How a value symbol was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Const,
    Var,
    Param,
}

/// A named slot: a const, a var, or a parameter.
#[derive(Debug, Clone)]
pub struct ValueSymbol {
    pub name: String,
    pub kind: ValueKind,
    pub ty: TypeInfo,
    pub storage: StorageClass,
    /// Index within the owning namespace (module globals, or function
    /// params-then-locals).
    pub index: u32,
}

/// A callable signature: a user function or an imported host function.
#[derive(Debug, Clone)]
pub struct FuncInfo {
    pub name: String,
    pub param_types: Vec<TypeInfo>,
    pub ret: TypeInfo,
    pub imported: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum Symbol {
    Value(ValueSymbol),
    Function(FuncInfo),
}

impl Symbol {
    #[must_use = "this is a pure lookup with no side effects"]
    pub(crate) fn as_value(&self) -> Option<&ValueSymbol> {
        if let Symbol::Value(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub(crate) fn as_function(&self) -> Option<&FuncInfo> {
        if let Symbol::Function(info) = self {
            Some(info)
        } else {
            None
        }
    }
}

/// A scope in the chain; `parent` is `None` only for the module scope.
#[derive(Debug)]
pub(crate) struct Scope {
    pub(crate) parent: Option<ScopeRef>,
    pub(crate) symbols: FxHashMap<String, Symbol>,
}

impl Scope {
    #[must_use = "scope constructor returns a new scope that should be used"]
    pub(crate) fn new(parent: Option<ScopeRef>) -> ScopeRef {
        Rc::new(RefCell::new(Self {
            parent,
            symbols: FxHashMap::default(),
        }))
    }
}

/// Marker result for a rejected duplicate definition; the checker attaches
/// the location and raises the diagnostic.
pub(crate) struct AlreadyDefined;

/// The active scope chain during checking.
pub(crate) struct SymbolTable {
    root: ScopeRef,
    current: ScopeRef,
    depth: usize,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub(crate) fn new() -> Self {
        let root = Scope::new(None);
        Self {
            current: Rc::clone(&root),
            root,
            depth: 0,
        }
    }

    pub(crate) fn push_scope(&mut self) {
        let child = Scope::new(Some(Rc::clone(&self.current)));
        self.current = child;
        self.depth += 1;
    }

    pub(crate) fn pop_scope(&mut self) {
        assert!(self.depth > 0, "attempted to pop the module scope");
        let parent = self
            .current
            .borrow()
            .parent
            .clone()
            .expect("non-root scope must have a parent");
        self.current = parent;
        self.depth -= 1;
    }

    /// Define a symbol in the innermost scope; rejects same-scope duplicates.
    pub(crate) fn define(&self, name: &str, symbol: Symbol) -> Result<(), AlreadyDefined> {
        let mut scope = self.current.borrow_mut();
        if scope.symbols.contains_key(name) {
            return Err(AlreadyDefined);
        }
        scope.symbols.insert(name.to_string(), symbol);
        Ok(())
    }

    /// Define a symbol directly in the module scope.
    pub(crate) fn define_global(&self, name: &str, symbol: Symbol) -> Result<(), AlreadyDefined> {
        let mut scope = self.root.borrow_mut();
        if scope.symbols.contains_key(name) {
            return Err(AlreadyDefined);
        }
        scope.symbols.insert(name.to_string(), symbol);
        Ok(())
    }

    /// Look a name up from the innermost scope outward.
    #[must_use = "this is a pure lookup with no side effects"]
    pub(crate) fn lookup(&self, name: &str) -> Option<Symbol> {
        let mut scope = Some(Rc::clone(&self.current));
        while let Some(current) = scope {
            let borrowed = current.borrow();
            if let Some(symbol) = borrowed.symbols.get(name) {
                return Some(symbol.clone());
            }
            scope = borrowed.parent.clone();
        }
        None
    }
}
