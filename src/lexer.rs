use std::fmt;

use crate::source::Source;
use crate::token::{
    BinaryOperation, Lang, Literal, NumberKind, Reserved, Span, Special, Token, TokenKind,
    UnaryOperation,
};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Character that cannot start any token.
    UnexpectedCharacter(char),
    /// Integer literal that does not fit in 64 bits.
    InvalidNumber(String),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character: {ch}")
            }
            Self::InvalidNumber(text) => {
                write!(f, "invalid number literal: {text}")
            }
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// Tokenize an ordered sequence of source lines.
///
/// Lines are numbered from 1 in iteration order. The returned tokens
/// always end with exactly one `Special::Eof`.
///
/// # Errors
///
/// Returns `LexError` at the first character that starts no token.
pub fn tokenize<I, S>(lines: I) -> Result<Vec<Token>, LexError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut lexer = Lexer::new();
    for (index, line) in lines.into_iter().enumerate() {
        lexer.lex_line(index + 1, line.as_ref())?;
    }
    Ok(lexer.finish())
}

/// Tokenize a [`Source`], keeping its original line numbers.
///
/// # Errors
///
/// Returns `LexError` at the first character that starts no token.
pub fn tokenize_source(source: &Source) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new();
    for line in source.lines() {
        lexer.lex_line(line.number, &line.text)?;
    }
    Ok(lexer.finish())
}

struct Lexer {
    tokens: Vec<Token>,
    end: Span,
}

impl Lexer {
    const fn new() -> Self {
        Self {
            tokens: Vec::new(),
            end: Span { line: 1, column: 1 },
        }
    }

    fn lex_line(&mut self, line: usize, text: &str) -> Result<(), LexError> {
        LineLexer {
            text,
            input: text.as_bytes(),
            pos: 0,
            line,
            tokens: &mut self.tokens,
        }
        .run()?;

        self.end = Span {
            line,
            column: text.chars().count() + 1,
        };
        Ok(())
    }

    fn finish(mut self) -> Vec<Token> {
        self.tokens.push(Token {
            kind: TokenKind::Special(Special::Eof),
            text: String::new(),
            value: None,
            span: self.end,
        });
        self.tokens
    }
}

/// Scans one line. Every byte consumed before an error is ASCII, so
/// byte offsets double as column numbers.
struct LineLexer<'a, 't> {
    text: &'a str,
    input: &'a [u8],
    pos: usize,
    line: usize,
    tokens: &'t mut Vec<Token>,
}

impl LineLexer<'_, '_> {
    fn run(mut self) -> Result<(), LexError> {
        while let Some(ch) = self.peek() {
            match ch {
                b' ' | b'\t' | b'\r' | b'\x0c' => self.pos += 1,
                b'(' => self.single(TokenKind::Lang(Lang::LeftBracket)),
                b')' => self.single(TokenKind::Lang(Lang::RightBracket)),
                b';' => self.single(TokenKind::Lang(Lang::Semicolon)),
                b'.' => self.single(TokenKind::Lang(Lang::Dot)),
                b',' => self.single(TokenKind::Lang(Lang::Comma)),
                b':' if self.peek_at(1) == Some(b'=') => {
                    self.push(TokenKind::Lang(Lang::Assign), self.pos, self.pos + 2, None);
                }
                b':' => self.single(TokenKind::Lang(Lang::Colon)),
                b'+' => self.single(TokenKind::BinaryOperation(BinaryOperation::Plus)),
                b'-' => self.single(TokenKind::BinaryOperation(BinaryOperation::Minus)),
                b'*' => self.single(TokenKind::BinaryOperation(BinaryOperation::Mul)),
                b'/' => self.single(TokenKind::BinaryOperation(BinaryOperation::Div)),
                b'!' => self.single(TokenKind::UnaryOperation(UnaryOperation::Not)),
                b'~' => self.single(TokenKind::UnaryOperation(UnaryOperation::Fill)),
                b'0'..=b'9' => self.read_number()?,
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.read_word(),
                _ => {
                    let ch = self.text[self.pos..]
                        .chars()
                        .next()
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    return Err(LexError {
                        kind: LexErrorKind::UnexpectedCharacter(ch),
                        span: self.span_at(self.pos),
                    });
                }
            }
        }
        Ok(())
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    const fn span_at(&self, pos: usize) -> Span {
        Span {
            line: self.line,
            column: pos + 1,
        }
    }

    fn single(&mut self, kind: TokenKind) {
        self.push(kind, self.pos, self.pos + 1, None);
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize, value: Option<Literal>) {
        self.tokens.push(Token {
            kind,
            text: self.text[start..end].to_string(),
            value,
            span: self.span_at(start),
        });
        self.pos = end;
    }

    fn skip_digits(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn read_number(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.skip_digits();

        // `1.` is an integer followed by a dot; `1.5` is a real.
        let is_real =
            self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit());
        if is_real {
            self.pos += 1;
            self.skip_digits();
        }

        let text = &self.text[start..self.pos];
        let span = self.span_at(start);
        let invalid = || LexError {
            kind: LexErrorKind::InvalidNumber(text.to_string()),
            span,
        };
        let value = if is_real {
            Literal::Real(text.parse().map_err(|_| invalid())?)
        } else {
            Literal::Integer(text.parse().map_err(|_| invalid())?)
        };

        let end = self.pos;
        self.push(TokenKind::Number(value.kind()), start, end, Some(value));
        Ok(())
    }

    fn read_word(&mut self) {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }

        let end = self.pos;
        let text = &self.text[start..end];
        if let Some(reserved) = Reserved::from_lexeme(text) {
            self.push(TokenKind::Reserved(reserved), start, end, None);
        } else if let Some(value) = Literal::boolean_from_lexeme(text) {
            self.push(
                TokenKind::Number(NumberKind::Boolean),
                start,
                end,
                Some(value),
            );
        } else {
            self.push(TokenKind::Word, start, end, None);
        }
    }
}
