//! Compiler for the connection description language.
//!
//! Source lines are lexed into tokens, parsed into a typed AST, and
//! emitted by a generator into the connection output format. A
//! canonical source formatter and a programmatic builder sit on the
//! same AST. Programs that describe a message protocol can also be
//! emitted as a C++ decoder header ([`Target::Decoder`]).
//!
//! # Quick start
//!
//! ## Compile source text
//!
//! ```
//! use connection_compiler::{GeneratorOptions, compile_str};
//!
//! let source = "NAME WindowServer;\nBEGIN\n\tx := 1 + 2;\nEND\n";
//! let options = GeneratorOptions::default().with_header(false);
//! let output = compile_str(source, &options).unwrap();
//! assert_eq!(output, "connection WindowServer\nbegin\n\tlet x = (1 + 2)\nend\n");
//! ```
//!
//! ## Build a program and format it back to source
//!
//! ```
//! use connection_compiler::{Block, Expr, Program, format};
//!
//! let program = Program::new()
//!     .name("WindowServer")
//!     .magic("signature", Expr::int(320))
//!     .block(Block::new().assign("x", Expr::int(1) + Expr::int(2)));
//!
//! assert!(format(&program).contains("MAGIC signature := 320;"));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod builder;
pub mod decoder;
pub mod formatter;
pub mod generator;
pub mod lexer;
pub mod parser;
pub mod protocol;
pub mod source;
pub mod token;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

pub use ast::{
    Assignment, BinaryOp, Block, Expr, Name, Program, Return, Statement, Tag, UnaryOp,
};
pub use formatter::format;
pub use generator::{
    GenerateError, GeneratorOptions, NodePath, Target, generate, generate_to, generate_with,
    render,
};
pub use lexer::{LexError, LexErrorKind, tokenize, tokenize_source};
pub use parser::{Expected, MAX_NESTING, ParseError, ParseErrorKind, parse};
pub use protocol::{Connection, Field, Message, ProtocolError, ProtocolErrorKind, lower};
pub use source::{Source, SourceLine};
pub use token::{Literal, Span, Token, TokenKind};

/// Pipeline stage an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Lex,
    Parse,
    Generate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Input => "input",
            Self::Lex => "lexer",
            Self::Parse => "parser",
            Self::Generate => "generator",
        };
        f.write_str(name)
    }
}

/// Unified error type covering every pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A parser error.
    #[error("{0}")]
    Parse(#[from] ParseError),
    /// A generator error.
    #[error("{0}")]
    Generate(#[from] GenerateError),
}

impl Error {
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Read { .. } => Stage::Input,
            Self::Lex(_) => Stage::Lex,
            Self::Parse(_) => Stage::Parse,
            Self::Generate(_) => Stage::Generate,
        }
    }

    /// Error category name as reported to users.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Read { .. } => "ReadError",
            Self::Lex(_) => "LexError",
            Self::Parse(ParseError {
                kind: ParseErrorKind::UnexpectedEof { .. },
                ..
            }) => "UnexpectedEOF",
            Self::Parse(_) => "ParseError",
            Self::Generate(GenerateError::UnsupportedNode { .. }) => "UnsupportedNode",
            Self::Generate(GenerateError::Protocol(_)) => "ProtocolError",
            Self::Generate(_) => "GenerationError",
        }
    }
}

/// Lex and parse source text in one step.
pub fn parse_str(input: &str) -> Result<Program, Error> {
    parse_source(&Source::from_text(input))
}

fn parse_source(source: &Source) -> Result<Program, Error> {
    let tokens = tokenize_source(source)?;
    tracing::debug!(tokens = tokens.len(), "tokenized source");
    let program = parse(&tokens)?;
    tracing::debug!(statements = program.statements.len(), "parsed program");
    Ok(program)
}

/// Compile source text into generated output held in memory.
pub fn compile_str(input: &str, options: &GeneratorOptions) -> Result<String, Error> {
    let program = parse_str(input)?;
    Ok(render(&program, options)?)
}

/// Compile `input` into `output` with default generator options.
pub fn compile(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<(), Error> {
    compile_with(input, output, &GeneratorOptions::default())
}

/// Compile `input` into `output`.
///
/// Each stage runs to completion before the next starts. On any
/// failure no output file is created; an existing file at `output` is
/// left as it was.
pub fn compile_with(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &GeneratorOptions,
) -> Result<(), Error> {
    let input = input.as_ref();
    let source = Source::read(input).map_err(|source| Error::Read {
        path: input.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %input.display(), lines = source.len(), "read source");

    let program = parse_source(&source)?;
    generate_with(output, &program, options)?;
    Ok(())
}
