//! Syntax analysis: token stream to AST.
//!
//! Statements are parsed by single-pass recursive descent with one token of
//! lookahead; expressions use precedence climbing over the fixed operator
//! table (low to high): `||`, `&&`, `== !=`, `< <= > >=`, `+ -`, `* /`,
//! unary `+ - !` `` ` ``, then primaries (literals, names, calls,
//! parentheses, `^expr`). The first error aborts the parse; there is no
//! recovery.

use std::rc::Rc;

use crate::errors::{ParseError, SyntaxError};
use crate::lexer::tokenize;
use crate::nodes::{
    AssignStatement, AssignTarget, BoolLiteral, CallExpression, ConstDeclaration, Expression,
    ExpressionStatement, FloatLiteral, FunctionDeclaration, IfStatement, ImportDeclaration,
    InfixExpression, IntegerLiteral, Item, MemGrowExpression, MemLoadExpression, Module,
    NameExpression, OperatorKind, Parameter, PrefixExpression, PrintStatement, ReturnStatement,
    Statement, TypeSpec, UnaryOperatorKind, VarDeclaration, WhileStatement,
};
use crate::parser_context::ParserContext;
use crate::tokens::{Token, TokenKind};

/// Binding strength for infix operators; all levels are left-associative.
fn infix_precedence(kind: TokenKind) -> Option<(u8, OperatorKind)> {
    let entry = match kind {
        TokenKind::OrOr => (1, OperatorKind::Or),
        TokenKind::AndAnd => (2, OperatorKind::And),
        TokenKind::EqEq => (3, OperatorKind::Eq),
        TokenKind::NotEq => (3, OperatorKind::Ne),
        TokenKind::Lt => (4, OperatorKind::Lt),
        TokenKind::Le => (4, OperatorKind::Le),
        TokenKind::Gt => (4, OperatorKind::Gt),
        TokenKind::Ge => (4, OperatorKind::Ge),
        TokenKind::Plus => (5, OperatorKind::Add),
        TokenKind::Minus => (5, OperatorKind::Sub),
        TokenKind::Star => (6, OperatorKind::Mul),
        TokenKind::Slash => (6, OperatorKind::Div),
        _ => return None,
    };
    Some(entry)
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    ctx: ParserContext,
}

/// Parse one source file into a [`Module`].
///
/// # Errors
///
/// Returns the first lexical or syntactic error encountered.
pub fn parse_module(source: &str) -> Result<Module, SyntaxError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(tokens);
    Ok(parser.module()?)
}

impl Parser {
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(
            tokens.last().is_some_and(|t| t.kind == TokenKind::Eof),
            "token stream must be Eof-terminated"
        );
        Self {
            tokens,
            pos: 0,
            ctx: ParserContext::new(),
        }
    }

    fn node_id(&mut self) -> u32 {
        self.ctx.next_node_id()
    }

    fn peek(&self) -> &Token {
        // The stream is Eof-terminated and the cursor never passes Eof.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn found_description(&self) -> String {
        let token = self.peek();
        match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("`{}`", token.lexeme),
        }
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        ParseError {
            expected: expected.into(),
            found: self.found_description(),
            location: self.peek().location,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.to_string()))
        }
    }

    fn module(&mut self) -> Result<Module, ParseError> {
        let mut items = Vec::new();
        while self.peek_kind() != TokenKind::Eof {
            items.push(self.item()?);
        }
        Ok(Module { items })
    }

    fn item(&mut self) -> Result<Item, ParseError> {
        match self.peek_kind() {
            TokenKind::Func => Ok(Item::Function(self.function_declaration()?)),
            TokenKind::Import => Ok(Item::Import(self.import_declaration()?)),
            _ => Ok(Item::Statement(self.statement()?)),
        }
    }

    fn function_declaration(&mut self) -> Result<Rc<FunctionDeclaration>, ParseError> {
        let keyword = self.expect(TokenKind::Func)?;
        let name = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::LParen)?;
        let params = self.parameters()?;
        self.expect(TokenKind::RParen)?;
        let ret = self.optional_type_spec();
        let body = self.block()?;
        Ok(Rc::new(FunctionDeclaration {
            id: self.node_id(),
            location: keyword.location,
            name: name.lexeme,
            params,
            ret,
            body,
        }))
    }

    fn import_declaration(&mut self) -> Result<Rc<ImportDeclaration>, ParseError> {
        let keyword = self.expect(TokenKind::Import)?;
        self.expect(TokenKind::Func)?;
        let name = self.expect(TokenKind::Identifier)?;
        self.expect(TokenKind::LParen)?;
        let params = self.parameters()?;
        self.expect(TokenKind::RParen)?;
        let ret = self.optional_type_spec();
        self.expect(TokenKind::Semicolon)?;
        Ok(Rc::new(ImportDeclaration {
            id: self.node_id(),
            location: keyword.location,
            name: name.lexeme,
            params,
            ret,
        }))
    }

    fn parameters(&mut self) -> Result<Vec<Rc<Parameter>>, ParseError> {
        let mut params = Vec::new();
        if self.peek_kind() == TokenKind::RParen {
            return Ok(params);
        }
        loop {
            let name = self.expect(TokenKind::Identifier)?;
            let ty = self.type_spec()?;
            params.push(Rc::new(Parameter {
                id: self.node_id(),
                location: name.location,
                name: name.lexeme,
                ty,
            }));
            if self.peek_kind() == TokenKind::Comma {
                self.advance();
            } else {
                return Ok(params);
            }
        }
    }

    fn type_spec(&mut self) -> Result<TypeSpec, ParseError> {
        match self.peek_kind() {
            TokenKind::Int => {
                self.advance();
                Ok(TypeSpec::Int)
            }
            TokenKind::Float => {
                self.advance();
                Ok(TypeSpec::Float)
            }
            _ => Err(self.unexpected("a type name")),
        }
    }

    fn optional_type_spec(&mut self) -> Option<TypeSpec> {
        match self.peek_kind() {
            TokenKind::Int | TokenKind::Float => self.type_spec().ok(),
            _ => None,
        }
    }

    fn block(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while self.peek_kind() != TokenKind::RBrace {
            if self.peek_kind() == TokenKind::Eof {
                return Err(self.unexpected(TokenKind::RBrace.to_string()));
            }
            statements.push(self.statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(statements)
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek_kind() {
            TokenKind::Print => self.print_statement(),
            TokenKind::Var => self.var_declaration(),
            TokenKind::Const => self.const_declaration(),
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::Return => self.return_statement(),
            TokenKind::Func | TokenKind::Import => {
                Err(self.unexpected("a statement (function declarations are top-level only)"))
            }
            _ => self.expression_or_assignment(),
        }
    }

    fn print_statement(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::Print)?;
        let value = self.expression(0)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Statement::Print(Rc::new(PrintStatement {
            id: self.node_id(),
            location: keyword.location,
            value,
        })))
    }

    fn var_declaration(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::Var)?;
        let name = self.expect(TokenKind::Identifier)?;
        let ty = self.type_spec()?;
        let value = if self.peek_kind() == TokenKind::Assign {
            self.advance();
            Some(self.expression(0)?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Statement::Var(Rc::new(VarDeclaration {
            id: self.node_id(),
            location: keyword.location,
            name: name.lexeme,
            ty,
            value,
        })))
    }

    fn const_declaration(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::Const)?;
        let name = self.expect(TokenKind::Identifier)?;
        let ty = self.optional_type_spec();
        self.expect(TokenKind::Assign)?;
        let value = self.expression(0)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Statement::Const(Rc::new(ConstDeclaration {
            id: self.node_id(),
            location: keyword.location,
            name: name.lexeme,
            ty,
            value,
        })))
    }

    fn if_statement(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::If)?;
        let condition = self.expression(0)?;
        let then_body = self.block()?;
        let else_body = if self.peek_kind() == TokenKind::Else {
            self.advance();
            self.block()?
        } else {
            Vec::new()
        };
        Ok(Statement::If(Rc::new(IfStatement {
            id: self.node_id(),
            location: keyword.location,
            condition,
            then_body,
            else_body,
        })))
    }

    fn while_statement(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::While)?;
        let condition = self.expression(0)?;
        let body = self.block()?;
        Ok(Statement::While(Rc::new(WhileStatement {
            id: self.node_id(),
            location: keyword.location,
            condition,
            body,
        })))
    }

    fn return_statement(&mut self) -> Result<Statement, ParseError> {
        let keyword = self.expect(TokenKind::Return)?;
        let value = self.expression(0)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Statement::Return(Rc::new(ReturnStatement {
            id: self.node_id(),
            location: keyword.location,
            value,
        })))
    }

    /// Disambiguate `target = expr;` from a bare expression statement after
    /// parsing one expression: only a name or a memory cell may be assigned.
    fn expression_or_assignment(&mut self) -> Result<Statement, ParseError> {
        let expression = self.expression(0)?;
        if self.peek_kind() == TokenKind::Assign {
            let target = match expression {
                Expression::Name(name) => AssignTarget::Name(name),
                Expression::MemLoad(cell) => AssignTarget::Mem(cell),
                _ => return Err(self.unexpected("`;`")),
            };
            self.advance();
            let value = self.expression(0)?;
            self.expect(TokenKind::Semicolon)?;
            let location = target.location();
            return Ok(Statement::Assign(Rc::new(AssignStatement {
                id: self.node_id(),
                location,
                target,
                value,
            })));
        }
        self.expect(TokenKind::Semicolon)?;
        let location = expression.location();
        Ok(Statement::Expr(Rc::new(ExpressionStatement {
            id: self.node_id(),
            location,
            expression,
        })))
    }

    fn expression(&mut self, min_precedence: u8) -> Result<Expression, ParseError> {
        let mut left = self.unary()?;
        while let Some((precedence, operator)) = infix_precedence(self.peek_kind()) {
            if precedence < min_precedence {
                break;
            }
            let op_token = self.advance();
            let right = self.expression(precedence + 1)?;
            left = Expression::Infix(Rc::new(InfixExpression {
                id: self.node_id(),
                location: op_token.location,
                operator,
                left,
                right,
            }));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expression, ParseError> {
        let operator = match self.peek_kind() {
            TokenKind::Minus => Some(UnaryOperatorKind::Neg),
            TokenKind::Plus => Some(UnaryOperatorKind::Pos),
            TokenKind::Not => Some(UnaryOperatorKind::Not),
            _ => None,
        };
        if let Some(operator) = operator {
            let op_token = self.advance();
            let operand = self.unary()?;
            return Ok(Expression::Prefix(Rc::new(PrefixExpression {
                id: self.node_id(),
                location: op_token.location,
                operator,
                operand,
            })));
        }
        if self.peek_kind() == TokenKind::Backtick {
            let op_token = self.advance();
            let address = self.unary()?;
            return Ok(Expression::MemLoad(Rc::new(MemLoadExpression {
                id: self.node_id(),
                location: op_token.location,
                address,
            })));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expression, ParseError> {
        match self.peek_kind() {
            TokenKind::IntLiteral => {
                let token = self.advance();
                let value = token.lexeme.parse::<i64>().map_err(|_| ParseError {
                    expected: "an integer literal in range".to_string(),
                    found: format!("`{}`", token.lexeme),
                    location: token.location,
                })?;
                Ok(Expression::Integer(Rc::new(IntegerLiteral {
                    id: self.node_id(),
                    location: token.location,
                    value,
                })))
            }
            TokenKind::FloatLiteral => {
                let token = self.advance();
                let value = token.lexeme.parse::<f64>().map_err(|_| ParseError {
                    expected: "a float literal".to_string(),
                    found: format!("`{}`", token.lexeme),
                    location: token.location,
                })?;
                Ok(Expression::Float(Rc::new(FloatLiteral {
                    id: self.node_id(),
                    location: token.location,
                    value,
                })))
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance();
                Ok(Expression::Bool(Rc::new(BoolLiteral {
                    id: self.node_id(),
                    location: token.location,
                    value: token.kind == TokenKind::True,
                })))
            }
            TokenKind::Identifier => {
                let token = self.advance();
                if self.peek_kind() == TokenKind::LParen {
                    self.advance();
                    let arguments = self.call_arguments()?;
                    self.expect(TokenKind::RParen)?;
                    return Ok(Expression::Call(Rc::new(CallExpression {
                        id: self.node_id(),
                        location: token.location,
                        function: token.lexeme,
                        arguments,
                    })));
                }
                Ok(Expression::Name(Rc::new(NameExpression {
                    id: self.node_id(),
                    location: token.location,
                    name: token.lexeme,
                })))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression(0)?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Caret => {
                let op_token = self.advance();
                let size = self.unary()?;
                Ok(Expression::MemGrow(Rc::new(MemGrowExpression {
                    id: self.node_id(),
                    location: op_token.location,
                    size,
                })))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn call_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut arguments = Vec::new();
        if self.peek_kind() == TokenKind::RParen {
            return Ok(arguments);
        }
        loop {
            arguments.push(self.expression(0)?);
            if self.peek_kind() == TokenKind::Comma {
                self.advance();
            } else {
                return Ok(arguments);
            }
        }
    }
}
