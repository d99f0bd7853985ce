// Position resolution
pub mod position;

// Whole-file IO with checksums
pub mod file;

// Language table and detection
pub mod language;

// Project directory discovery
pub mod discovery;

// Syntax-tree provider contract and the Python provider
pub mod syntax;
pub mod python;

// Entity tree and value boundaries
pub mod tree;
pub mod boundary;

// Literal values
pub mod literal;

// Changes and their generation
pub mod change;
pub mod generator;
pub mod change_set;
pub mod diff;

// JSON output module
pub mod json;

pub mod error;

// Re-exports
pub use position::{LineSpan, Position, line_col_to_offset, offset_to_line_col};
pub use file::{FileContent, FileError, checksum, read_file, write_file};
pub use language::{Language, detect_language};
pub use syntax::{Anchor, SyntaxKind, SyntaxNode, SyntaxProvider};
pub use python::PythonProvider;
pub use tree::{Bounds, EntityKind, EntityNode, EntityTree, NodeId, Offsets};
pub use literal::Literal;
pub use change::{Change, apply_changes, sort_changes_descending};
pub use generator::ChangeGenerator;
pub use change_set::{ChangeSet, CommitReport, FileCommit};
pub use diff::unified_diff;
pub use error::{Error, Result};
