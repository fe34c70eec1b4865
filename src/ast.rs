use crate::token::Literal;

/// Root of a parsed connection description.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// A statement, at top level or inside a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `BEGIN ... END`
    Block(Block),
    /// `NAME ident;`
    Name(Name),
    /// `ident := expr;`, optionally tagged `MAGIC` or `KEYPROTECTED`.
    Assign(Assignment),
    /// `RETURN [expr];`
    Return(Return),
}

/// Statements delimited by `BEGIN` and `END`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
}

/// Connection name binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub ident: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: String,
    pub value: Expr,
    pub tag: Option<Tag>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    pub value: Option<Expr>,
}

/// Generation-time annotation on a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Magic,
    KeyProtected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Identifier(String),
    /// Field access `base.field`.
    Member { base: Box<Self>, field: String },
    /// Call `callee(args...)`.
    Call { callee: String, args: Vec<Self> },
    Unary { op: UnaryOp, operand: Box<Self> },
    Binary {
        op: BinaryOp,
        lhs: Box<Self>,
        rhs: Box<Self>,
    },
}

impl Statement {
    /// Short human-readable node kind, used in diagnostics.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Block(_) => "BEGIN block",
            Self::Name(_) => "NAME declaration",
            Self::Assign(Assignment { tag: None, .. }) => "assignment",
            Self::Assign(Assignment {
                tag: Some(Tag::Magic),
                ..
            }) => "MAGIC declaration",
            Self::Assign(Assignment {
                tag: Some(Tag::KeyProtected),
                ..
            }) => "KEYPROTECTED declaration",
            Self::Return(_) => "RETURN statement",
        }
    }
}

impl Tag {
    /// Marker written in front of tagged declarations.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Magic => "@magic",
            Self::KeyProtected => "@keyprotected",
        }
    }
}

impl UnaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Not => "!",
            Self::Fill => "~",
        }
    }
}

impl BinaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }

    /// Binding power; higher binds tighter.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div => 2,
        }
    }
}
