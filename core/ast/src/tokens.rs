use core::fmt;
use std::fmt::{Display, Formatter};

use crate::nodes::Location;

/// Token tags produced by the lexer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    IntLiteral,
    FloatLiteral,
    Identifier,

    // Keywords
    Const,
    Var,
    If,
    Else,
    While,
    Func,
    Return,
    Print,
    Import,
    Int,
    Float,
    True,
    False,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    Assign,
    Not,
    AndAnd,
    OrOr,

    // Raw-memory operators
    Caret,
    Backtick,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,

    Eof,
}

impl TokenKind {
    /// Keywords are recognized after the identifier match.
    #[must_use]
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "const" => TokenKind::Const,
            "var" => TokenKind::Var,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "func" => TokenKind::Func,
            "return" => TokenKind::Return,
            "print" => TokenKind::Print,
            "import" => TokenKind::Import,
            "int" => TokenKind::Int,
            "float" => TokenKind::Float,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => return None,
        };
        Some(kind)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let text = match self {
            TokenKind::IntLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Const => "`const`",
            TokenKind::Var => "`var`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::While => "`while`",
            TokenKind::Func => "`func`",
            TokenKind::Return => "`return`",
            TokenKind::Print => "`print`",
            TokenKind::Import => "`import`",
            TokenKind::Int => "`int`",
            TokenKind::Float => "`float`",
            TokenKind::True => "`true`",
            TokenKind::False => "`false`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Lt => "`<`",
            TokenKind::Le => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::Ge => "`>=`",
            TokenKind::EqEq => "`==`",
            TokenKind::NotEq => "`!=`",
            TokenKind::Assign => "`=`",
            TokenKind::Not => "`!`",
            TokenKind::AndAnd => "`&&`",
            TokenKind::OrOr => "`||`",
            TokenKind::Caret => "`^`",
            TokenKind::Backtick => "`` ` ``",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Eof => "end of input",
        };
        write!(f, "{text}")
    }
}

/// A single lexed token: tag, source text, and position of its first byte.
#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub location: Location,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            location,
        }
    }
}
