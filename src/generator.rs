//! Code generator that serializes a `Program` into the connection
//! description output format.
//!
//! One record per line. Top-level statements produce one record each,
//! blocks wrap their children between `begin` and `end` with one extra
//! level of indentation. Output is rendered fully in memory before any
//! destination is touched, so a failed generation never leaves a
//! truncated artifact behind.
//!
//! [`Target::Decoder`] instead reads the message protocol out of the
//! program and emits a C++ decoder header (see [`crate::decoder`]).

use std::fmt::{self, Write as _};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::ast::{Assignment, Expr, Program, Return, Statement};
use crate::decoder;
use crate::protocol::{self, ProtocolError};
use crate::token::Literal;

/// Header line written at the top of generated files.
pub const HEADER: &str = "// Generated by connc. Do not edit.";

/// Output flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Target {
    /// One record per statement.
    #[default]
    Records,
    /// C++ message classes and decoder base class.
    Decoder,
}

/// Generator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Indentation unit for one nesting level.
    pub indent: String,
    /// Emit the [`HEADER`] line.
    pub header: bool,
    pub target: Target,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            indent: "\t".to_string(),
            header: true,
            target: Target::Records,
        }
    }
}

impl GeneratorOptions {
    /// Indent with `width` spaces; zero means tabs.
    #[must_use]
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent = if width == 0 {
            "\t".to_string()
        } else {
            " ".repeat(width)
        };
        self
    }

    #[must_use]
    pub const fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    #[must_use]
    pub const fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }
}

/// 1-based position of a statement in the tree, outermost first. Empty
/// for the program as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath(pub Vec<usize>);

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("top level");
        }
        f.write_str("statement ")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char('.')?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

/// Error produced during generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The output file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The output sink rejected the write.
    #[error("failed to write output: {0}")]
    Sink(#[source] io::Error),
    /// The node has no representation in the output format.
    #[error("unsupported node: {node} at {location}")]
    UnsupportedNode {
        node: &'static str,
        location: NodePath,
    },
    /// The program does not describe a valid message protocol.
    #[error("{0}")]
    Protocol(#[from] ProtocolError),
}

/// Render a program into the output format.
///
/// # Errors
///
/// For [`Target::Records`], returns `GenerateError::UnsupportedNode`
/// for a `NAME` declaration inside a block, a `RETURN` outside of one,
/// or a non-finite real. For [`Target::Decoder`], returns
/// `GenerateError::Protocol` when the program is not a valid protocol.
pub fn render(program: &Program, options: &GeneratorOptions) -> Result<String, GenerateError> {
    match options.target {
        Target::Records => render_records(program, options),
        Target::Decoder => {
            let connection = protocol::lower(program)?;
            tracing::debug!(
                decoder = %connection.name,
                messages = connection.messages.len(),
                "lowered message protocol"
            );
            Ok(decoder::render(&connection, options))
        }
    }
}

fn render_records(program: &Program, options: &GeneratorOptions) -> Result<String, GenerateError> {
    let mut emitter = Emitter {
        out: String::new(),
        indent: &options.indent,
        path: Vec::new(),
    };
    if options.header {
        emitter.out.push_str(HEADER);
        emitter.out.push('\n');
    }
    emitter.statements(&program.statements, 0)?;
    Ok(emitter.out)
}

/// Generate `program` into the file at `path` with default options.
///
/// # Errors
///
/// See [`generate_with`].
pub fn generate(path: impl AsRef<Path>, program: &Program) -> Result<(), GenerateError> {
    generate_with(path, program, &GeneratorOptions::default())
}

/// Generate `program` into the file at `path`.
///
/// The file is written to a temporary sibling and renamed into place
/// once complete; on failure the temporary is removed and `path` is
/// left untouched.
///
/// # Errors
///
/// Returns `GenerateError::UnsupportedNode` before any I/O happens, or
/// `GenerateError::File` if writing or renaming fails.
pub fn generate_with(
    path: impl AsRef<Path>,
    program: &Program,
    options: &GeneratorOptions,
) -> Result<(), GenerateError> {
    let path = path.as_ref();
    let contents = render(program, options)?;
    commit(path, &contents).map_err(|source| GenerateError::File {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        path = %path.display(),
        bytes = contents.len(),
        "wrote generated output"
    );
    Ok(())
}

/// Generate `program` into an arbitrary sink and flush it.
///
/// # Errors
///
/// Returns `GenerateError::UnsupportedNode` before anything is written,
/// or `GenerateError::Sink` if the sink fails.
pub fn generate_to<W: Write>(
    writer: &mut W,
    program: &Program,
    options: &GeneratorOptions,
) -> Result<(), GenerateError> {
    let contents = render(program, options)?;
    writer
        .write_all(contents.as_bytes())
        .and_then(|()| writer.flush())
        .map_err(GenerateError::Sink)
}

fn commit(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

struct Emitter<'a> {
    out: String,
    indent: &'a str,
    path: Vec<usize>,
}

impl Emitter<'_> {
    fn statements(&mut self, statements: &[Statement], depth: usize) -> Result<(), GenerateError> {
        for (i, statement) in statements.iter().enumerate() {
            self.path.push(i + 1);
            self.statement(statement, depth)?;
            self.path.pop();
        }
        Ok(())
    }

    fn statement(&mut self, statement: &Statement, depth: usize) -> Result<(), GenerateError> {
        match statement {
            Statement::Block(block) => {
                self.line(depth, "begin");
                self.statements(&block.statements, depth + 1)?;
                self.line(depth, "end");
            }
            Statement::Name(name) => {
                if depth > 0 {
                    return Err(self.unsupported(statement));
                }
                self.line(depth, &format!("connection {}", name.ident));
            }
            Statement::Assign(Assignment { target, value, tag }) => {
                let mut record = String::new();
                if let Some(tag) = tag {
                    record.push_str(tag.marker());
                    record.push(' ');
                }
                let _ = write!(record, "let {target} = ");
                write_expr(&mut record, value).map_err(|node| self.unsupported_node(node))?;
                self.line(depth, &record);
            }
            Statement::Return(Return { value }) => {
                if depth == 0 {
                    return Err(self.unsupported(statement));
                }
                let mut record = String::from("return");
                if let Some(value) = value {
                    record.push(' ');
                    write_expr(&mut record, value).map_err(|node| self.unsupported_node(node))?;
                }
                self.line(depth, &record);
            }
        }
        Ok(())
    }

    fn line(&mut self, depth: usize, record: &str) {
        for _ in 0..depth {
            self.out.push_str(self.indent);
        }
        self.out.push_str(record);
        self.out.push('\n');
    }

    fn unsupported(&self, statement: &Statement) -> GenerateError {
        self.unsupported_node(statement.describe())
    }

    fn unsupported_node(&self, node: &'static str) -> GenerateError {
        GenerateError::UnsupportedNode {
            node,
            location: NodePath(self.path.clone()),
        }
    }
}

/// Binary expressions are always parenthesised, so the output never
/// depends on precedence rules. Fails with the node description for
/// values the output format cannot spell.
fn write_expr(out: &mut String, expr: &Expr) -> Result<(), &'static str> {
    match expr {
        Expr::Literal(Literal::Real(value)) if !value.is_finite() => {
            return Err("non-finite real literal");
        }
        Expr::Literal(literal) => {
            let _ = write!(out, "{literal}");
        }
        Expr::Identifier(ident) => out.push_str(ident),
        Expr::Member { base, field } => {
            write_operand(out, base, matches!(**base, Expr::Unary { .. }))?;
            out.push('.');
            out.push_str(field);
        }
        Expr::Call { callee, args } => {
            out.push_str(callee);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg)?;
            }
            out.push(')');
        }
        Expr::Unary { op, operand } => {
            out.push_str(op.symbol());
            write_operand(out, operand, false)?;
        }
        Expr::Binary { op, lhs, rhs } => {
            out.push('(');
            write_expr(out, lhs)?;
            let _ = write!(out, " {} ", op.symbol());
            write_expr(out, rhs)?;
            out.push(')');
        }
    }
    Ok(())
}

/// Negative literals only come from built trees; they are bracketed
/// wherever a prefix would otherwise merge with their sign.
fn write_operand(out: &mut String, expr: &Expr, bracket: bool) -> Result<(), &'static str> {
    if bracket || is_negative_literal(expr) {
        out.push('(');
        write_expr(out, expr)?;
        out.push(')');
        Ok(())
    } else {
        write_expr(out, expr)
    }
}

const fn is_negative_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(Literal::Integer(value)) => *value < 0,
        Expr::Literal(Literal::Real(value)) => value.is_sign_negative(),
        _ => false,
    }
}
