//! Message protocol described by a connection program.
//!
//! The top level names the decoder (`NAME`) and fixes its magic number
//! (`MAGIC`). Every top-level `BEGIN ... END` block declares one
//! message:
//!
//! ```text
//! NAME: WindowServer;
//! MAGIC decoder := 320;
//! BEGIN
//!     NAME CreateWindow;
//!     KEYPROTECTED key := message_key_t;
//!     width := uint32_t;
//!     RETURN CreateWindowReply;
//! END
//! ```
//!
//! Inside a message, `NAME` names it, plain assignments declare fields
//! with a type name, `KEYPROTECTED` marks the field carrying the
//! connection key, and `RETURN` names the reply message. Messages are
//! numbered from 1 in source order.

use std::collections::HashMap;
use std::fmt;

use crate::ast::{Assignment, BinaryOp, Block, Expr, Program, Return, Statement, Tag, UnaryOp};
use crate::generator::NodePath;
use crate::token::Literal;

/// Accessors every generated message already has.
const RESERVED_FIELDS: [&str; 5] = ["decoder_magic", "id", "key", "reply_id", "encode"];

/// A decoder and the messages it understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub name: String,
    pub magic: i32,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub name: String,
    pub id: u32,
    /// Fields in declaration order, the key field included.
    pub fields: Vec<Field>,
    /// Index into `fields` of the `KEYPROTECTED` field.
    pub key: Option<usize>,
    /// Id of the reply message.
    pub reply: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// Type name, with `.` separators turned into `::`.
    pub ty: String,
}

impl Message {
    /// The `KEYPROTECTED` field, if any.
    #[must_use]
    pub fn key_field(&self) -> Option<&Field> {
        self.key.and_then(|index| self.fields.get(index))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    MissingName,
    MissingMagic,
    DuplicateName,
    DuplicateMagic,
    /// `MAGIC` value is not an integer constant that fits in 32 bits.
    InvalidMagic,
    /// Statement that has no meaning at this level.
    Misplaced { node: &'static str },
    UnnamedMessage,
    DuplicateMessage { message: String },
    DuplicateField { field: String },
    ReservedField { field: String },
    InvalidFieldType { field: String },
    DuplicateKey,
    DuplicateReply,
    UnknownReply { reply: String },
}

impl fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => write!(f, "missing NAME declaration"),
            Self::MissingMagic => write!(f, "missing MAGIC declaration"),
            Self::DuplicateName => write!(f, "duplicate NAME declaration"),
            Self::DuplicateMagic => write!(f, "duplicate MAGIC declaration"),
            Self::InvalidMagic => write!(f, "MAGIC value is not a 32-bit integer constant"),
            Self::Misplaced { node } => write!(f, "{node} is not allowed here"),
            Self::UnnamedMessage => write!(f, "message has no NAME"),
            Self::DuplicateMessage { message } => write!(f, "duplicate message `{message}`"),
            Self::DuplicateField { field } => write!(f, "duplicate field `{field}`"),
            Self::ReservedField { field } => write!(f, "field name `{field}` is reserved"),
            Self::InvalidFieldType { field } => {
                write!(f, "field `{field}` must have a type name")
            }
            Self::DuplicateKey => write!(f, "message has more than one KEYPROTECTED field"),
            Self::DuplicateReply => write!(f, "message has more than one RETURN"),
            Self::UnknownReply { reply } => write!(f, "reply names unknown message `{reply}`"),
        }
    }
}

/// Error produced while reading the protocol out of a program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {location}")]
pub struct ProtocolError {
    pub kind: ProtocolErrorKind,
    pub location: NodePath,
}

/// Extract the connection protocol from a program.
///
/// # Errors
///
/// Returns `ProtocolError` when the program does not describe a
/// well-formed decoder (see [`ProtocolErrorKind`]).
pub fn lower(program: &Program) -> Result<Connection, ProtocolError> {
    let mut name = None;
    let mut magic = None;
    let mut messages = Vec::new();
    // reply name and where it was written, per message
    let mut replies = Vec::new();

    for (i, statement) in program.statements.iter().enumerate() {
        let location = NodePath(vec![i + 1]);
        match statement {
            Statement::Name(decl) => {
                if name.replace(decl.ident.clone()).is_some() {
                    return Err(error(ProtocolErrorKind::DuplicateName, location));
                }
            }
            Statement::Assign(Assignment {
                value,
                tag: Some(Tag::Magic),
                ..
            }) => {
                let value = const_int(value)
                    .and_then(|value| i32::try_from(value).ok())
                    .ok_or_else(|| error(ProtocolErrorKind::InvalidMagic, location.clone()))?;
                if magic.replace(value).is_some() {
                    return Err(error(ProtocolErrorKind::DuplicateMagic, location));
                }
            }
            Statement::Block(block) => {
                let id = u32::try_from(messages.len() + 1).unwrap_or(u32::MAX);
                let (message, reply) = lower_message(block, id, &location)?;
                if messages.iter().any(|m: &Message| m.name == message.name) {
                    return Err(error(
                        ProtocolErrorKind::DuplicateMessage {
                            message: message.name,
                        },
                        location,
                    ));
                }
                messages.push(message);
                replies.push(reply);
            }
            Statement::Assign(_) | Statement::Return(_) => {
                return Err(misplaced(statement, location));
            }
        }
    }

    let ids: HashMap<&str, u32> = messages.iter().map(|m| (m.name.as_str(), m.id)).collect();
    let mut resolved = Vec::with_capacity(replies.len());
    for reply in &replies {
        resolved.push(match reply {
            Some((reply, location)) => Some(*ids.get(reply.as_str()).ok_or_else(|| {
                error(
                    ProtocolErrorKind::UnknownReply {
                        reply: reply.clone(),
                    },
                    location.clone(),
                )
            })?),
            None => None,
        });
    }
    for (message, reply) in messages.iter_mut().zip(resolved) {
        message.reply = reply;
    }

    let root = NodePath(Vec::new());
    Ok(Connection {
        name: name.ok_or_else(|| error(ProtocolErrorKind::MissingName, root.clone()))?,
        magic: magic.ok_or_else(|| error(ProtocolErrorKind::MissingMagic, root))?,
        messages,
    })
}

type Reply = Option<(String, NodePath)>;

fn lower_message(
    block: &Block,
    id: u32,
    location: &NodePath,
) -> Result<(Message, Reply), ProtocolError> {
    let mut name = None;
    let mut fields: Vec<Field> = Vec::new();
    let mut key = None;
    let mut reply = None;

    for (i, statement) in block.statements.iter().enumerate() {
        let mut path = location.0.clone();
        path.push(i + 1);
        let location = NodePath(path);

        match statement {
            Statement::Name(decl) => {
                if name.replace(decl.ident.clone()).is_some() {
                    return Err(error(ProtocolErrorKind::DuplicateName, location));
                }
            }
            Statement::Assign(Assignment { target, value, tag }) => {
                if *tag == Some(Tag::Magic) {
                    return Err(misplaced(statement, location));
                }
                // a key field named `key` is read through key() itself
                let is_key = *tag == Some(Tag::KeyProtected);
                if RESERVED_FIELDS.contains(&target.as_str()) && !(is_key && target == "key") {
                    let field = target.clone();
                    return Err(error(ProtocolErrorKind::ReservedField { field }, location));
                }
                if fields.iter().any(|f| f.name == *target) {
                    let field = target.clone();
                    return Err(error(ProtocolErrorKind::DuplicateField { field }, location));
                }
                let Some(ty) = type_name(value) else {
                    let field = target.clone();
                    return Err(error(ProtocolErrorKind::InvalidFieldType { field }, location));
                };
                if is_key && key.replace(fields.len()).is_some() {
                    return Err(error(ProtocolErrorKind::DuplicateKey, location));
                }
                fields.push(Field {
                    name: target.clone(),
                    ty,
                });
            }
            Statement::Return(Return { value }) => {
                let target = match value {
                    Some(Expr::Identifier(reply)) => Some(reply.clone()),
                    None => None,
                    Some(_) => return Err(misplaced(statement, location)),
                };
                if reply.is_some() {
                    return Err(error(ProtocolErrorKind::DuplicateReply, location));
                }
                reply = target.map(|target| (target, location));
            }
            Statement::Block(_) => return Err(misplaced(statement, location)),
        }
    }

    let name = name.ok_or_else(|| error(ProtocolErrorKind::UnnamedMessage, location.clone()))?;
    let message = Message {
        name,
        id,
        fields,
        key,
        reply: None,
    };
    Ok((message, reply))
}

/// `a.b.c` spelled as a C++ qualified name.
fn type_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.clone()),
        Expr::Member { base, field } => Some(format!("{}::{field}", type_name(base)?)),
        _ => None,
    }
}

/// Fold an integer constant expression; `None` on overflow, division by
/// zero, or anything that is not an integer literal tree.
fn const_int(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::Literal(Literal::Integer(value)) => Some(*value),
        Expr::Unary {
            op: UnaryOp::Plus,
            operand,
        } => const_int(operand),
        Expr::Unary {
            op: UnaryOp::Minus,
            operand,
        } => const_int(operand)?.checked_neg(),
        Expr::Binary { op, lhs, rhs } => {
            let (lhs, rhs) = (const_int(lhs)?, const_int(rhs)?);
            match op {
                BinaryOp::Add => lhs.checked_add(rhs),
                BinaryOp::Sub => lhs.checked_sub(rhs),
                BinaryOp::Mul => lhs.checked_mul(rhs),
                BinaryOp::Div => lhs.checked_div(rhs),
            }
        }
        _ => None,
    }
}

const fn error(kind: ProtocolErrorKind, location: NodePath) -> ProtocolError {
    ProtocolError { kind, location }
}

fn misplaced(statement: &Statement, location: NodePath) -> ProtocolError {
    error(
        ProtocolErrorKind::Misplaced {
            node: statement.describe(),
        },
        location,
    )
}
