//! Semantic diagnostics.
//!
//! Each variant records the source location of the offending node and maps
//! onto one of the user-visible diagnostic kinds (`NameError`, `TypeError`,
//! `ReturnError`). Messages omit the position; the driver renders
//! `path:line:col: <Kind>: <message>` from [`CheckError::location`] and
//! [`CheckError::kind`].

use core::fmt;
use std::fmt::{Display, Formatter};

use thiserror::Error;

use wabbit_ast::nodes::{Location, OperatorKind, UnaryOperatorKind};

use crate::type_info::TypeInfo;

/// Represents a semantic error with source location.
#[derive(Debug, Clone, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum CheckError {
    #[error("use of undeclared name `{name}`")]
    UnknownName { name: String, location: Location },

    #[error("duplicate definition of `{name}`")]
    Duplicate { name: String, location: Location },

    #[error("cannot assign to const `{name}`")]
    ConstAssignment { name: String, location: Location },

    #[error("`{name}` is not an assignable variable")]
    NotAssignable { name: String, location: Location },

    /// Locals occupy one flat namespace per function in the IR, so a body
    /// local may not reuse the name of a module-scope variable or constant.
    #[error("local `{name}` shadows the module-scope definition of `{name}`")]
    ShadowsGlobal { name: String, location: Location },

    #[error("type mismatch in binary operation `{operator}`: `{left}` vs `{right}`")]
    OperandMismatch {
        operator: OperatorKind,
        left: TypeInfo,
        right: TypeInfo,
        location: Location,
    },

    #[error("operator `{operator}` is not defined on `{operand}`")]
    UnsupportedOperand {
        operator: OperatorKind,
        operand: TypeInfo,
        location: Location,
    },

    #[error("unary operator `{operator}` is not defined on `{operand}`")]
    UnsupportedUnary {
        operator: UnaryOperatorKind,
        operand: TypeInfo,
        location: Location,
    },

    #[error("condition must be `bool`, found `{found}`")]
    ConditionNotBool { found: TypeInfo, location: Location },

    #[error("cannot assign `{found}` to `{name}` of type `{expected}`")]
    AssignMismatch {
        name: String,
        expected: TypeInfo,
        found: TypeInfo,
        location: Location,
    },

    #[error("memory {operation} requires `int`, found `{found}`")]
    MemoryOperand {
        operation: MemoryOperation,
        found: TypeInfo,
        location: Location,
    },

    #[error("function `{function}` expects {expected} arguments, but {found} were provided")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
        location: Location,
    },

    #[error("argument {index} of `{function}` must be `{expected}`, found `{found}`")]
    ArgumentType {
        function: String,
        index: usize,
        expected: TypeInfo,
        found: TypeInfo,
        location: Location,
    },

    #[error("cannot call `{name}`: not a function")]
    NotCallable { name: String, location: Location },

    #[error("function `{name}` used as a value")]
    FunctionAsValue { name: String, location: Location },

    #[error("cannot print a `void` value")]
    PrintVoid { location: Location },

    #[error("`main` must be declared with no parameters and return type `int`")]
    MainSignature { location: Location },

    #[error("return type mismatch: expected `{expected}`, found `{found}`")]
    ReturnTypeMismatch {
        expected: TypeInfo,
        found: TypeInfo,
        location: Location,
    },

    #[error("function `{function}` may reach the end of its body without returning `{expected}`")]
    MissingReturn {
        function: String,
        expected: TypeInfo,
        location: Location,
    },
}

/// Which raw-memory form an operand error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOperation {
    Load,
    Store,
    Grow,
}

impl Display for MemoryOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MemoryOperation::Load => write!(f, "address"),
            MemoryOperation::Store => write!(f, "store"),
            MemoryOperation::Grow => write!(f, "grow size"),
        }
    }
}

impl CheckError {
    /// The user-visible diagnostic kind for this error.
    #[must_use = "this is a pure lookup with no side effects"]
    pub fn kind(&self) -> &'static str {
        match self {
            CheckError::UnknownName { .. }
            | CheckError::Duplicate { .. }
            | CheckError::ConstAssignment { .. }
            | CheckError::NotAssignable { .. }
            | CheckError::ShadowsGlobal { .. } => "NameError",
            CheckError::OperandMismatch { .. }
            | CheckError::UnsupportedOperand { .. }
            | CheckError::UnsupportedUnary { .. }
            | CheckError::ConditionNotBool { .. }
            | CheckError::AssignMismatch { .. }
            | CheckError::MemoryOperand { .. }
            | CheckError::ArgumentCount { .. }
            | CheckError::ArgumentType { .. }
            | CheckError::NotCallable { .. }
            | CheckError::FunctionAsValue { .. }
            | CheckError::PrintVoid { .. }
            | CheckError::MainSignature { .. } => "TypeError",
            CheckError::ReturnTypeMismatch { .. } | CheckError::MissingReturn { .. } => {
                "ReturnError"
            }
        }
    }

    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            CheckError::UnknownName { location, .. }
            | CheckError::Duplicate { location, .. }
            | CheckError::ConstAssignment { location, .. }
            | CheckError::NotAssignable { location, .. }
            | CheckError::ShadowsGlobal { location, .. }
            | CheckError::OperandMismatch { location, .. }
            | CheckError::UnsupportedOperand { location, .. }
            | CheckError::UnsupportedUnary { location, .. }
            | CheckError::ConditionNotBool { location, .. }
            | CheckError::AssignMismatch { location, .. }
            | CheckError::MemoryOperand { location, .. }
            | CheckError::ArgumentCount { location, .. }
            | CheckError::ArgumentType { location, .. }
            | CheckError::NotCallable { location, .. }
            | CheckError::FunctionAsValue { location, .. }
            | CheckError::PrintVoid { location }
            | CheckError::MainSignature { location }
            | CheckError::ReturnTypeMismatch { location, .. }
            | CheckError::MissingReturn { location, .. } => *location,
        }
    }
}

/// The accumulated diagnostics of one failed check run.
#[derive(Debug, Clone)]
#[must_use = "errors must not be silently ignored"]
pub struct CheckFailure {
    pub errors: Vec<CheckError>,
}

impl std::error::Error for CheckFailure {}

impl Display for CheckFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {}: {}", error.location(), error.kind(), error)?;
        }
        Ok(())
    }
}
