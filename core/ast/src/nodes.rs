use core::fmt;
use std::{
    fmt::{Display, Formatter},
    rc::Rc,
};

/// A position in the source text, 1-based for both line and column.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[macro_export]
macro_rules! ast_node {
    (
        $(#[$outer:meta])*
        $struct_vis:vis struct $name:ident {
            $(
                $(#[$field_attr:meta])*
                $field_vis:vis $field_name:ident : $field_ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Clone, PartialEq, Debug)]
        $struct_vis struct $name {
            pub id: u32,
            pub location: $crate::nodes::Location,
            $(
                $(#[$field_attr])*
                $field_vis $field_name : $field_ty,
            )*
        }
    };
}

macro_rules! ast_nodes {
    (
        $(
            $(#[$outer:meta])*
            $struct_vis:vis struct $name:ident { $($fields:tt)* }
        )+
    ) => {
        $(
            ast_node! {
                $(#[$outer])*
                $struct_vis struct $name { $($fields)* }
            }
        )+
    };
}

/// The type names that can appear in declarations and signatures.
///
/// `bool` values exist in the language (comparisons, `true`/`false`, logical
/// operators) but have no surface type name; only `int` and `float` can be
/// written in a `var`, parameter, or return position.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TypeSpec {
    Int,
    Float,
}

impl Display for TypeSpec {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TypeSpec::Int => write!(f, "int"),
            TypeSpec::Float => write!(f, "float"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperatorKind {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl Display for OperatorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let sym = match self {
            OperatorKind::Add => "+",
            OperatorKind::Sub => "-",
            OperatorKind::Mul => "*",
            OperatorKind::Div => "/",
            OperatorKind::Lt => "<",
            OperatorKind::Le => "<=",
            OperatorKind::Gt => ">",
            OperatorKind::Ge => ">=",
            OperatorKind::Eq => "==",
            OperatorKind::Ne => "!=",
            OperatorKind::And => "&&",
            OperatorKind::Or => "||",
        };
        write!(f, "{sym}")
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnaryOperatorKind {
    Neg,
    Pos,
    Not,
}

impl Display for UnaryOperatorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let sym = match self {
            UnaryOperatorKind::Neg => "-",
            UnaryOperatorKind::Pos => "+",
            UnaryOperatorKind::Not => "!",
        };
        write!(f, "{sym}")
    }
}

/// Expressions form a closed set; every variant carries a node id and a
/// location through its payload struct.
#[derive(Clone, PartialEq, Debug)]
pub enum Expression {
    Integer(Rc<IntegerLiteral>),
    Float(Rc<FloatLiteral>),
    Bool(Rc<BoolLiteral>),
    Name(Rc<NameExpression>),
    Infix(Rc<InfixExpression>),
    Prefix(Rc<PrefixExpression>),
    Call(Rc<CallExpression>),
    MemLoad(Rc<MemLoadExpression>),
    MemGrow(Rc<MemGrowExpression>),
}

impl Expression {
    #[must_use]
    pub fn id(&self) -> u32 {
        match self {
            Expression::Integer(n) => n.id,
            Expression::Float(n) => n.id,
            Expression::Bool(n) => n.id,
            Expression::Name(n) => n.id,
            Expression::Infix(n) => n.id,
            Expression::Prefix(n) => n.id,
            Expression::Call(n) => n.id,
            Expression::MemLoad(n) => n.id,
            Expression::MemGrow(n) => n.id,
        }
    }

    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            Expression::Integer(n) => n.location,
            Expression::Float(n) => n.location,
            Expression::Bool(n) => n.location,
            Expression::Name(n) => n.location,
            Expression::Infix(n) => n.location,
            Expression::Prefix(n) => n.location,
            Expression::Call(n) => n.location,
            Expression::MemLoad(n) => n.location,
            Expression::MemGrow(n) => n.location,
        }
    }
}

/// The left-hand side of an assignment: a plain name or a memory cell.
#[derive(Clone, PartialEq, Debug)]
pub enum AssignTarget {
    Name(Rc<NameExpression>),
    Mem(Rc<MemLoadExpression>),
}

impl AssignTarget {
    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            AssignTarget::Name(n) => n.location,
            AssignTarget::Mem(n) => n.location,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Statement {
    Print(Rc<PrintStatement>),
    Assign(Rc<AssignStatement>),
    Const(Rc<ConstDeclaration>),
    Var(Rc<VarDeclaration>),
    If(Rc<IfStatement>),
    While(Rc<WhileStatement>),
    Return(Rc<ReturnStatement>),
    Expr(Rc<ExpressionStatement>),
}

impl Statement {
    #[must_use]
    pub fn id(&self) -> u32 {
        match self {
            Statement::Print(n) => n.id,
            Statement::Assign(n) => n.id,
            Statement::Const(n) => n.id,
            Statement::Var(n) => n.id,
            Statement::If(n) => n.id,
            Statement::While(n) => n.id,
            Statement::Return(n) => n.id,
            Statement::Expr(n) => n.id,
        }
    }

    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            Statement::Print(n) => n.location,
            Statement::Assign(n) => n.location,
            Statement::Const(n) => n.location,
            Statement::Var(n) => n.location,
            Statement::If(n) => n.location,
            Statement::While(n) => n.location,
            Statement::Return(n) => n.location,
            Statement::Expr(n) => n.location,
        }
    }
}

/// A top-level item: a function, an imported function signature, or a plain
/// statement (gathered into the implicit entry point).
#[derive(Clone, PartialEq, Debug)]
pub enum Item {
    Function(Rc<FunctionDeclaration>),
    Import(Rc<ImportDeclaration>),
    Statement(Statement),
}

/// One parsed source file: the ordered list of top-level items.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Module {
    pub items: Vec<Item>,
}

impl Module {
    /// All function declarations, in source order.
    #[must_use]
    pub fn functions(&self) -> Vec<Rc<FunctionDeclaration>> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Function(f) => Some(Rc::clone(f)),
                _ => None,
            })
            .collect()
    }

    /// All imported function signatures, in source order.
    #[must_use]
    pub fn imports(&self) -> Vec<Rc<ImportDeclaration>> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Import(i) => Some(Rc::clone(i)),
                _ => None,
            })
            .collect()
    }

    /// All top-level statements, in source order.
    #[must_use]
    pub fn top_level_statements(&self) -> Vec<Statement> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Statement(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }
}

ast_nodes! {

    pub struct IntegerLiteral {
        pub value: i64,
    }

    pub struct FloatLiteral {
        pub value: f64,
    }

    pub struct BoolLiteral {
        pub value: bool,
    }

    pub struct NameExpression {
        pub name: String,
    }

    pub struct InfixExpression {
        pub operator: OperatorKind,
        pub left: Expression,
        pub right: Expression,
    }

    pub struct PrefixExpression {
        pub operator: UnaryOperatorKind,
        pub operand: Expression,
    }

    pub struct CallExpression {
        pub function: String,
        pub arguments: Vec<Expression>,
    }

    /// A raw-memory read: `` `addr ``. Doubles as the memory form of an
    /// assignment target (`` `addr = value; ``).
    pub struct MemLoadExpression {
        pub address: Expression,
    }

    /// A raw-memory grow request: `^size`, evaluating to the new memory size.
    pub struct MemGrowExpression {
        pub size: Expression,
    }

    pub struct PrintStatement {
        pub value: Expression,
    }

    pub struct AssignStatement {
        pub target: AssignTarget,
        pub value: Expression,
    }

    /// `const name [type] = value;`. The annotation may be omitted, in which
    /// case the checker infers it from the initializer.
    pub struct ConstDeclaration {
        pub name: String,
        pub ty: Option<TypeSpec>,
        pub value: Expression,
    }

    /// `var name type [= value];`
    pub struct VarDeclaration {
        pub name: String,
        pub ty: TypeSpec,
        pub value: Option<Expression>,
    }

    pub struct IfStatement {
        pub condition: Expression,
        pub then_body: Vec<Statement>,
        pub else_body: Vec<Statement>,
    }

    pub struct WhileStatement {
        pub condition: Expression,
        pub body: Vec<Statement>,
    }

    pub struct ReturnStatement {
        pub value: Expression,
    }

    pub struct ExpressionStatement {
        pub expression: Expression,
    }

    pub struct Parameter {
        pub name: String,
        pub ty: TypeSpec,
    }

    pub struct FunctionDeclaration {
        pub name: String,
        pub params: Vec<Rc<Parameter>>,
        pub ret: Option<TypeSpec>,
        pub body: Vec<Statement>,
    }

    /// `import func name(params) [ret];`: a host-provided function with no
    /// body; the back-ends bind it to the embedder.
    pub struct ImportDeclaration {
        pub name: String,
        pub params: Vec<Rc<Parameter>>,
        pub ret: Option<TypeSpec>,
    }

}
