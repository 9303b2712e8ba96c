//! Type representation.
//!
//! Wabbit has exactly four semantic types and no implicit conversions.
//! Only `int` and `float` have surface syntax; `Bool` arises from
//! comparisons, logical operators, and `true`/`false`; `Void` is the result
//! of calling a function declared without a return type.

use core::fmt;
use std::fmt::{Display, Formatter};

use wabbit_ast::nodes::TypeSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeInfo {
    Int,
    Float,
    Bool,
    Void,
}

impl TypeInfo {
    /// The canonical source-code spelling.
    #[must_use = "returns the string representation without modifying self"]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TypeInfo::Int => "int",
            TypeInfo::Float => "float",
            TypeInfo::Bool => "bool",
            TypeInfo::Void => "void",
        }
    }

    #[must_use = "this is a pure check with no side effects"]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeInfo::Int | TypeInfo::Float)
    }

    #[must_use]
    pub fn from_spec(spec: TypeSpec) -> Self {
        match spec {
            TypeSpec::Int => TypeInfo::Int,
            TypeSpec::Float => TypeInfo::Float,
        }
    }

    /// Declared return positions omit the type name for `void`.
    #[must_use]
    pub fn from_return_spec(spec: Option<TypeSpec>) -> Self {
        spec.map_or(TypeInfo::Void, Self::from_spec)
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
