//! Error types for the lexer and parser.
//!
//! Messages deliberately omit the source position; every error exposes its
//! [`Location`] so the driver can render the canonical
//! `path:line:col: <Kind>: <message>` form exactly once.

use thiserror::Error;

use crate::nodes::Location;

/// Errors raised while scanning source text into tokens.
#[derive(Debug, Clone, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum LexError {
    /// A byte that starts no token.
    #[error("unexpected character `{ch}`")]
    InvalidChar { ch: char, location: Location },

    /// A `/*` comment with no closing `*/` before end of input.
    #[error("unterminated block comment")]
    UnterminatedComment { location: Location },

    /// A digit run that does not form a valid literal (e.g. `1.2.3`).
    #[error("malformed number `{lexeme}`")]
    BadNumber { lexeme: String, location: Location },
}

impl LexError {
    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            LexError::InvalidChar { location, .. }
            | LexError::UnterminatedComment { location }
            | LexError::BadNumber { location, .. } => *location,
        }
    }
}

/// The parser aborts on the first unexpected token; there is no recovery.
#[derive(Debug, Clone, Error)]
#[error("expected {expected}, found {found}")]
#[must_use = "errors must not be silently ignored"]
pub struct ParseError {
    pub expected: String,
    pub found: String,
    pub location: Location,
}

impl ParseError {
    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }
}

/// Either frontend failure, as produced by [`crate::parser::parse_module`].
#[derive(Debug, Clone, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SyntaxError {
    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            SyntaxError::Lex(e) => e.location(),
            SyntaxError::Parse(e) => e.location(),
        }
    }
}
