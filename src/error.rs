use std::path::PathBuf;

use thiserror::Error;

use crate::file::FileError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the rewrite pipeline can surface
///
/// None of these are retried: all operations are local and deterministic,
/// so a retry would reproduce the same failure.
#[derive(Debug, Error)]
pub enum Error {
    /// A line, column or offset does not denote a position in the text
    #[error("position out of range: {detail}")]
    OutOfRange { detail: String },

    /// The terminating character of a value expression was not found
    #[error("could not find terminating {terminator:?} for value in {file} (scanned lines {first_line}..={last_line})")]
    BoundaryNotFound {
        file: PathBuf,
        terminator: char,
        first_line: usize,
        last_line: usize,
    },

    /// A change was requested on a node with no backing file
    #[error("node '{path}' has no backing file")]
    NodeUnaddressable { path: String },

    /// Two changes to the same file overlap
    #[error("conflicting changes in {file}: {first_start}..={first_end} overlaps {second_start}..={second_end}")]
    ConflictingChanges {
        file: PathBuf,
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },

    /// The file changed after a change was computed against it
    #[error("{file} changed since the change was generated (expected {expected}, found {actual})")]
    StaleChange {
        file: PathBuf,
        expected: String,
        actual: String,
    },

    /// No node with this dotted path exists in the tree
    #[error("no node at path '{path}'")]
    UnknownNode { path: String },

    /// A value-level operation was requested on a non-variable node
    #[error("node '{path}' is not a variable")]
    NotAVariable { path: String },

    /// The syntax-tree provider could not parse the input
    #[error("failed to parse {source_name}: {reason}")]
    Parse { source_name: String, reason: String },

    /// The parser could not be initialized for a language
    #[error("failed to initialize language: {0}")]
    Language(String),

    #[error(transparent)]
    File(#[from] FileError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn out_of_range(detail: impl Into<String>) -> Self {
        Error::OutOfRange {
            detail: detail.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
