use std::fmt;

/// Source location for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

/// Numeric literal categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Integer,
    Real,
    Boolean,
}

/// Arithmetic operators as emitted by the lexer.
///
/// `+` and `-` always lex as binary; the parser turns them into
/// [`UnaryOperation`]s in prefix position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperation {
    Plus,
    Minus,
    Mul,
    Div,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperation {
    /// Bitwise fill `~`.
    Fill,
    Plus,
    Minus,
    /// Logical not `!`.
    Not,
}

/// Punctuation of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    /// `(`
    LeftBracket,
    /// `)`
    RightBracket,
    /// `;`
    Semicolon,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `:=`
    Assign,
}

/// Reserved words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reserved {
    Begin,
    End,
    Return,
    Name,
    Magic,
    KeyProtected,
}

/// Tokens that carry no source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Special {
    Eof,
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier that is neither reserved nor a boolean literal.
    Word,
    Number(NumberKind),
    BinaryOperation(BinaryOperation),
    UnaryOperation(UnaryOperation),
    Lang(Lang),
    Reserved(Reserved),
    Special(Special),
}

/// Parsed value of a numeric token, also used as the AST literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Integer(i64),
    Real(f64),
    Boolean(bool),
}

/// A single token with its kind, text, and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Set for `TokenKind::Number` tokens only.
    pub value: Option<Literal>,
    pub span: Span,
}

/// Lexeme to reserved word mapping. Lookups are case-sensitive.
const RESERVED_WORDS: [(&str, Reserved); 6] = [
    ("BEGIN", Reserved::Begin),
    ("END", Reserved::End),
    ("RETURN", Reserved::Return),
    ("NAME", Reserved::Name),
    ("MAGIC", Reserved::Magic),
    ("KEYPROTECTED", Reserved::KeyProtected),
];

/// Words that lex as `Number(Boolean)`.
const BOOLEAN_WORDS: [(&str, bool); 4] = [
    ("true", true),
    ("false", false),
    ("TRUE", true),
    ("FALSE", false),
];

impl Reserved {
    /// Resolve an identifier-shaped lexeme against the reserved table.
    #[must_use]
    pub fn from_lexeme(text: &str) -> Option<Self> {
        RESERVED_WORDS
            .iter()
            .find(|(lexeme, _)| *lexeme == text)
            .map(|&(_, reserved)| reserved)
    }

    /// Canonical source spelling.
    #[must_use]
    pub const fn lexeme(self) -> &'static str {
        match self {
            Self::Begin => "BEGIN",
            Self::End => "END",
            Self::Return => "RETURN",
            Self::Name => "NAME",
            Self::Magic => "MAGIC",
            Self::KeyProtected => "KEYPROTECTED",
        }
    }
}

impl Literal {
    /// Resolve a boolean literal word.
    #[must_use]
    pub fn boolean_from_lexeme(text: &str) -> Option<Self> {
        BOOLEAN_WORDS
            .iter()
            .find(|(lexeme, _)| *lexeme == text)
            .map(|&(_, value)| Self::Boolean(value))
    }

    #[must_use]
    pub const fn kind(self) -> NumberKind {
        match self {
            Self::Integer(_) => NumberKind::Integer,
            Self::Real(_) => NumberKind::Real,
            Self::Boolean(_) => NumberKind::Boolean,
        }
    }
}

impl Token {
    /// Category equality, ignoring lexeme, value, and span.
    #[must_use]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Special(Special::Eof))
    }
}

impl fmt::Display for BinaryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Mul => "*",
            Self::Div => "/",
        };
        f.write_str(symbol)
    }
}

impl fmt::Display for UnaryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Fill => "~",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Not => "!",
        };
        f.write_str(symbol)
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::LeftBracket => "(",
            Self::RightBracket => ")",
            Self::Semicolon => ";",
            Self::Dot => ".",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::Assign => ":=",
        };
        f.write_str(symbol)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word => write!(f, "identifier"),
            Self::Number(NumberKind::Integer) => write!(f, "integer literal"),
            Self::Number(NumberKind::Real) => write!(f, "real literal"),
            Self::Number(NumberKind::Boolean) => write!(f, "boolean literal"),
            Self::BinaryOperation(op) => write!(f, "'{op}'"),
            Self::UnaryOperation(op) => write!(f, "'{op}'"),
            Self::Lang(lang) => write!(f, "'{lang}'"),
            Self::Reserved(reserved) => write!(f, "'{}'", reserved.lexeme()),
            Self::Special(Special::Eof) => write!(f, "end of input"),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Real(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{value}.0")
            }
            Self::Real(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
        }
    }
}
