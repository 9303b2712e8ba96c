//! User-visible diagnostics.
//!
//! Every phase failure is funneled into [`Diagnostic`] so the driver renders
//! one canonical form: `path:line:col: <Kind>: <message>`.

use core::fmt;
use std::fmt::{Display, Formatter};

use wabbit_ast::errors::SyntaxError;
use wabbit_ast::nodes::Location;
use wabbit_type_checker::errors::{CheckError, CheckFailure};

/// One rendered compiler diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// `LexError`, `ParseError`, `NameError`, `TypeError`, or `ReturnError`.
    pub kind: &'static str,
    pub location: Location,
    pub message: String,
}

impl Diagnostic {
    /// The canonical stderr line for a diagnostic in `path`.
    #[must_use]
    pub fn render(&self, path: &str) -> String {
        format!(
            "{path}:{}:{}: {}: {}",
            self.location.line, self.location.column, self.kind, self.message
        )
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.kind, self.message)
    }
}

impl From<&SyntaxError> for Diagnostic {
    fn from(error: &SyntaxError) -> Self {
        let kind = match error {
            SyntaxError::Lex(_) => "LexError",
            SyntaxError::Parse(_) => "ParseError",
        };
        Diagnostic {
            kind,
            location: error.location(),
            message: error.to_string(),
        }
    }
}

impl From<&CheckError> for Diagnostic {
    fn from(error: &CheckError) -> Self {
        Diagnostic {
            kind: error.kind(),
            location: error.location(),
            message: error.to_string(),
        }
    }
}

/// All diagnostics of one failed phase, in emission order.
pub type Diagnostics = Vec<Diagnostic>;

#[must_use]
pub(crate) fn from_check_failure(failure: &CheckFailure) -> Diagnostics {
    failure.errors.iter().map(Diagnostic::from).collect()
}
