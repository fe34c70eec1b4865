//! Source line buffer handed to the lexer.
//!
//! Lines are newline-stripped and right-trimmed. Blank lines are dropped
//! here rather than in the lexer, but every kept line remembers its
//! original 1-based number so diagnostics point at the real file line.

use std::fs;
use std::io;
use std::path::Path;

/// One non-blank line of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
}

/// Ordered, non-blank source lines of one compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Source {
    lines: Vec<SourceLine>,
}

impl Source {
    /// Split `text` into lines, dropping blank ones.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
        let lines = text
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let line = line.trim_end();
                (!line.is_empty()).then(|| SourceLine {
                    number: index + 1,
                    text: line.to_string(),
                })
            })
            .collect();
        Self { lines }
    }

    /// Read and split a source file.
    pub fn read(path: impl AsRef<Path>) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    #[must_use]
    pub fn lines(&self) -> &[SourceLine] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
