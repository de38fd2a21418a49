//! Statement and expression tree produced by the parser.

use ecow::EcoString;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Literal(Literal),
    Grouping(Box<Expr>),
    Variable(EcoString),
    Assign {
        name: EcoString,
        value: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `object.name`
    Get {
        object: Box<Expr>,
        name: EcoString,
    },
    /// `object.name = value`
    Set {
        object: Box<Expr>,
        name: EcoString,
        value: Box<Expr>,
    },
    /// `n Class(args)`; the parentheses are optional.
    New {
        class: EcoString,
        args: Vec<Expr>,
    },
    List(Vec<Expr>),
    Map(Vec<(Expr, Expr)>),
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// `object[index] = value`
    IndexSet {
        object: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(EcoString),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    /// `@`, reserved; the compiler rejects it.
    At,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Numeric type annotation. Recorded, never checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeCode(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub type_code: TypeCode,
    pub name: EcoString,
    pub initializer: Option<Expr>,
    pub visibility: Option<Visibility>,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: EcoString,
    pub params: Vec<VarDecl>,
    pub body: Vec<Stmt>,
    pub return_type: TypeCode,
    pub visibility: Option<Visibility>,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: EcoString,
    pub superclass: Option<EcoString>,
    pub methods: Vec<Function>,
    pub fields: Vec<VarDecl>,
    pub interfaces: Vec<EcoString>,
    pub is_interface: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),
    Var(VarDecl),
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Loop {
        condition: Expr,
        body: Box<Stmt>,
    },
    Try {
        body: Vec<Stmt>,
        error_type: TypeCode,
        binding: EcoString,
        handler: Vec<Stmt>,
    },
    Return(Option<Expr>),
    Function(Function),
    Class(Class),
}
