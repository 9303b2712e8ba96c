//! Lexical analysis: source text to a forward token stream.
//!
//! The lexer is a plain cursor over the decoded source. Whitespace and both
//! comment styles (`// …` and non-nesting `/* … */`) are discarded. Keywords
//! are recognized after the identifier match, and a leading minus is never
//! part of a numeric literal (unary `-` belongs to the parser).

use crate::errors::LexError;
use crate::nodes::Location;
use crate::tokens::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Skip whitespace and comments; errors only on an unterminated `/*`.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_next() == Some('*') => {
                    let start = self.location();
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            None => {
                                return Err(LexError::UnterminatedComment { location: start });
                            }
                            Some('*') if self.peek_next() == Some('/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Scan one `[0-9.]` run. Zero dots is an `INT_LIT`, one dot a
    /// `FLOAT_LIT`, anything else (`1.2.3`, out-of-range) is `BadNumber`.
    fn scan_number(&mut self, start: Location) -> Result<Token, LexError> {
        let mut lexeme = String::new();
        let mut dots = 0usize;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                lexeme.push(ch);
                self.bump();
            } else if ch == '.' {
                dots += 1;
                lexeme.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        match dots {
            0 => {
                if lexeme.parse::<i64>().is_err() {
                    return Err(LexError::BadNumber {
                        lexeme,
                        location: start,
                    });
                }
                Ok(Token::new(TokenKind::IntLiteral, lexeme, start))
            }
            1 => {
                if lexeme.parse::<f64>().is_err() {
                    return Err(LexError::BadNumber {
                        lexeme,
                        location: start,
                    });
                }
                Ok(Token::new(TokenKind::FloatLiteral, lexeme, start))
            }
            _ => Err(LexError::BadNumber {
                lexeme,
                location: start,
            }),
        }
    }

    fn scan_identifier(&mut self, start: Location) -> Token {
        let mut lexeme = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                lexeme.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        let kind = TokenKind::keyword(&lexeme).unwrap_or(TokenKind::Identifier);
        Token::new(kind, lexeme, start)
    }

    /// Produce the next token, or `Eof` forever once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;
        let start = self.location();
        let Some(ch) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, "", start));
        };

        if ch.is_ascii_digit() {
            return self.scan_number(start);
        }
        if ch == '.' && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            return self.scan_number(start);
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            return Ok(self.scan_identifier(start));
        }

        self.bump();
        let two = |kind, text: &str| Ok(Token::new(kind, text, start));
        match ch {
            '+' => two(TokenKind::Plus, "+"),
            '-' => two(TokenKind::Minus, "-"),
            '*' => two(TokenKind::Star, "*"),
            '/' => two(TokenKind::Slash, "/"),
            '^' => two(TokenKind::Caret, "^"),
            '`' => two(TokenKind::Backtick, "`"),
            '(' => two(TokenKind::LParen, "("),
            ')' => two(TokenKind::RParen, ")"),
            '{' => two(TokenKind::LBrace, "{"),
            '}' => two(TokenKind::RBrace, "}"),
            ',' => two(TokenKind::Comma, ","),
            ';' => two(TokenKind::Semicolon, ";"),
            '<' => {
                if self.peek() == Some('=') {
                    self.bump();
                    two(TokenKind::Le, "<=")
                } else {
                    two(TokenKind::Lt, "<")
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.bump();
                    two(TokenKind::Ge, ">=")
                } else {
                    two(TokenKind::Gt, ">")
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.bump();
                    two(TokenKind::EqEq, "==")
                } else {
                    two(TokenKind::Assign, "=")
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.bump();
                    two(TokenKind::NotEq, "!=")
                } else {
                    two(TokenKind::Not, "!")
                }
            }
            '&' => {
                if self.peek() == Some('&') {
                    self.bump();
                    two(TokenKind::AndAnd, "&&")
                } else {
                    Err(LexError::InvalidChar {
                        ch: '&',
                        location: start,
                    })
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.bump();
                    two(TokenKind::OrOr, "||")
                } else {
                    Err(LexError::InvalidChar {
                        ch: '|',
                        location: start,
                    })
                }
            }
            other => Err(LexError::InvalidChar {
                ch: other,
                location: start,
            }),
        }
    }
}

/// Lex an entire source string; the final token is always `Eof`.
///
/// # Errors
///
/// Returns the first [`LexError`] encountered; lexing does not recover.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
