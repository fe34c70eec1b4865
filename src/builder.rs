use std::ops::{Add, Div, Mul, Neg, Not, Sub};

use crate::ast::{
    Assignment, BinaryOp, Block, Expr, Name, Program, Return, Statement, Tag, UnaryOp,
};
use crate::token::Literal;

impl Program {
    /// Create a new empty program.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    /// Append a statement.
    #[must_use]
    pub fn statement(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    /// Add a `NAME` declaration.
    #[must_use]
    pub fn name(self, ident: &str) -> Self {
        self.statement(Statement::Name(Name {
            ident: ident.to_string(),
        }))
    }

    /// Add a plain assignment.
    #[must_use]
    pub fn assign(self, target: &str, value: Expr) -> Self {
        self.statement(assignment(target, value, None))
    }

    /// Add a `MAGIC` declaration.
    #[must_use]
    pub fn magic(self, target: &str, value: Expr) -> Self {
        self.statement(assignment(target, value, Some(Tag::Magic)))
    }

    /// Add a `KEYPROTECTED` declaration.
    #[must_use]
    pub fn key_protected(self, target: &str, value: Expr) -> Self {
        self.statement(assignment(target, value, Some(Tag::KeyProtected)))
    }

    /// Add a `BEGIN ... END` block.
    #[must_use]
    pub fn block(self, block: Block) -> Self {
        self.statement(Statement::Block(block))
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Block {
    /// Create a new empty block.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    #[must_use]
    pub fn statement(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    /// Add a `NAME` declaration; names the message in a protocol.
    #[must_use]
    pub fn name(self, ident: &str) -> Self {
        self.statement(Statement::Name(Name {
            ident: ident.to_string(),
        }))
    }

    #[must_use]
    pub fn assign(self, target: &str, value: Expr) -> Self {
        self.statement(assignment(target, value, None))
    }

    #[must_use]
    pub fn magic(self, target: &str, value: Expr) -> Self {
        self.statement(assignment(target, value, Some(Tag::Magic)))
    }

    #[must_use]
    pub fn key_protected(self, target: &str, value: Expr) -> Self {
        self.statement(assignment(target, value, Some(Tag::KeyProtected)))
    }

    /// Add a nested block.
    #[must_use]
    pub fn block(self, block: Self) -> Self {
        self.statement(Statement::Block(block))
    }

    /// Add `RETURN value;`.
    #[must_use]
    pub fn ret(self, value: Expr) -> Self {
        self.statement(Statement::Return(Return { value: Some(value) }))
    }

    /// Add a bare `RETURN;`.
    #[must_use]
    pub fn ret_empty(self) -> Self {
        self.statement(Statement::Return(Return { value: None }))
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}

fn assignment(target: &str, value: Expr, tag: Option<Tag>) -> Statement {
    Statement::Assign(Assignment {
        target: target.to_string(),
        value,
        tag,
    })
}

impl Expr {
    #[must_use]
    pub const fn int(value: i64) -> Self {
        Self::Literal(Literal::Integer(value))
    }

    #[must_use]
    pub const fn real(value: f64) -> Self {
        Self::Literal(Literal::Real(value))
    }

    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Literal(Literal::Boolean(value))
    }

    #[must_use]
    pub fn ident(name: &str) -> Self {
        Self::Identifier(name.to_string())
    }

    #[must_use]
    pub fn call(callee: &str, args: Vec<Self>) -> Self {
        Self::Call {
            callee: callee.to_string(),
            args,
        }
    }

    /// Field access on this expression.
    #[must_use]
    pub fn member(self, field: &str) -> Self {
        Self::Member {
            base: Box::new(self),
            field: field.to_string(),
        }
    }

    /// Bitwise fill `~self`.
    #[must_use]
    pub fn fill(self) -> Self {
        self.unary(UnaryOp::Fill)
    }

    #[must_use]
    pub fn unary(self, op: UnaryOp) -> Self {
        Self::Unary {
            op,
            operand: Box::new(self),
        }
    }

    #[must_use]
    pub fn binary(self, op: BinaryOp, rhs: Self) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }
}

impl Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.binary(BinaryOp::Add, rhs)
    }
}

impl Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.binary(BinaryOp::Sub, rhs)
    }
}

impl Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.binary(BinaryOp::Mul, rhs)
    }
}

impl Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        self.binary(BinaryOp::Div, rhs)
    }
}

impl Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self {
        self.unary(UnaryOp::Minus)
    }
}

impl Not for Expr {
    type Output = Self;

    fn not(self) -> Self {
        self.unary(UnaryOp::Not)
    }
}
