//! Error types for value access, parsing, and configuration loading.
//!
//! Three layers of reporting:
//!
//! - [`Error`]: misuse of the write-side value API (inserting a member on a
//!   number, indexing past the end of an array).
//! - [`ParseFailure`]: the reader's result on a bad document. Parsing is
//!   recovering, so a failure still carries the partial tree alongside every
//!   recorded [`ParseError`].
//! - [`ConfigFailure`]: the configuration loader's best-effort result, with
//!   the merged tree built from whatever imports and templates did resolve.

use crate::value::{Kind, Value};
use std::fmt;
use thiserror::Error;

/// Errors from the write-side `Value` API.
///
/// Read accessors never fail (they degrade to defaults or a null sentinel);
/// these errors are reserved for write accessors used against a value of the
/// wrong kind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A member or element write was attempted on a value that is neither
    /// null (promotable) nor the required container kind.
    #[error("cannot treat {found} value as {expected}")]
    InvalidAccess { expected: Kind, found: Kind },

    /// An array element write named an index past the end. Arrays are
    /// fixed-length once created, so writes never grow them.
    #[error("index {index} out of range for array of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A dotted path could not be followed on the write side.
    #[error("invalid path {path:?}: {msg}")]
    InvalidPath { path: String, msg: String },

    /// File read/write failure, with the offending path.
    #[error("io error on {path:?}: {msg}")]
    Io { path: String, msg: String },

    /// A document failed to parse.
    #[error("{0}")]
    Parse(#[from] ParseFailure),
}

impl Error {
    pub(crate) fn invalid_access(expected: Kind, found: Kind) -> Self {
        Error::InvalidAccess { expected, found }
    }

    pub(crate) fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Error::Io {
            path: path.display().to_string(),
            msg: err.to_string(),
        }
    }
}

/// A single diagnostic recorded by the reader.
///
/// `line` and `column` are 1-based. `span` is the byte range of the offending
/// token in the source text. `extra` optionally points at a second location
/// (e.g. where trailing garbage begins).
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub span: std::ops::Range<usize>,
    pub extra: Option<(usize, usize)>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line {}, Column {}: {}",
            self.line, self.column, self.message
        )?;
        if let Some((line, column)) = self.extra {
            write!(f, " (see Line {}, Column {})", line, column)?;
        }
        Ok(())
    }
}

/// An unsuccessful parse: every recorded diagnostic plus the partial tree.
///
/// The reader recovers at the next `,` or the enclosing `}`/`]` after each
/// error, so the tree usually contains everything that parsed cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    pub value: Value,
    pub errors: Vec<ParseError>,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "* {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseFailure {}

impl ParseFailure {
    /// Line number of the first recorded error, if any.
    #[must_use]
    pub fn first_error_line(&self) -> Option<usize> {
        self.errors.first().map(|e| e.line)
    }
}

/// An unsuccessful configuration load.
///
/// Import and template resolution is best-effort: whatever did resolve is
/// merged into `value`, and each failure contributes a line to `errors`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFailure {
    pub value: Value,
    pub errors: Vec<String>,
}

impl fmt::Display for ConfigFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigFailure {}

pub type Result<T> = std::result::Result<T, Error>;
