//! Contract with the syntax-tree provider.
//!
//! A provider parses a file into an owned [`SyntaxNode`] snapshot carrying
//! only line-granular positions: 1-based `from_line`/`to_line` and 0-based
//! start and end columns. The entity tree never sees the provider's native tree, so a
//! snapshot can be held after the provider's parse state is gone.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::file::read_file;
use crate::language::Language;
use crate::literal::Literal;

/// Kind of a statement as classified by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxKind {
    Module,
    Class,
    Function,
    Assign,
    Import,
    Expression,
    /// A statement that produces no entity (loops, conditionals, ...)
    Other,
}

/// Start of a statement, used to bound scans that must not cross into it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// 1-based line
    pub line: usize,
    /// 0-based byte column
    pub column: usize,
}

/// Owned snapshot of one provider node
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    /// First line of the node (1-based)
    pub from_line: usize,
    /// Last line with content (1-based); may be wrong for bracketed values
    pub to_line: usize,
    /// Start column of the node (0-based, bytes)
    pub col_offset: usize,
    /// Column just past the node's last character on `to_line` (0-based, bytes)
    pub end_column: usize,
    /// Normalized text of the node
    pub rendered: String,
    /// Declared name for classes and functions, the bare name for identifiers
    pub name: Option<String>,
    /// Line following a class or function header, where its body starts
    /// (1-based)
    pub body_line: Option<usize>,
    /// Statements of the node's body, in source order
    pub children: Vec<SyntaxNode>,
    /// Assignment targets, outermost first
    pub targets: Vec<SyntaxNode>,
    /// Assigned value
    pub value: Option<Box<SyntaxNode>>,
    /// Names bound by an import, in source order
    pub import_names: Vec<String>,
}

impl SyntaxNode {
    /// Bare node with no name, children or assignment parts
    pub fn new(kind: SyntaxKind, from_line: usize, to_line: usize, col_offset: usize) -> Self {
        Self {
            kind,
            from_line,
            to_line,
            col_offset,
            end_column: 0,
            rendered: String::new(),
            name: None,
            body_line: None,
            children: Vec::new(),
            targets: Vec::new(),
            value: None,
            import_names: Vec::new(),
        }
    }

    /// The provider's textual reconstruction of this node
    pub fn render(&self) -> &str {
        &self.rendered
    }

    pub fn children(&self) -> &[SyntaxNode] {
        &self.children
    }

    /// The child following `children()[index]`, if any
    pub fn next_sibling(&self, index: usize) -> Option<&SyntaxNode> {
        self.children.get(index + 1)
    }

    pub fn anchor(&self) -> Anchor {
        Anchor {
            line: self.from_line,
            column: self.col_offset,
        }
    }
}

/// Parser for one language, producing [`SyntaxNode`] snapshots
pub trait SyntaxProvider {
    /// Language this provider parses
    fn language(&self) -> Language;

    /// Parse source text; `source_name` is used in errors and logs only
    fn parse_source(&self, source: &str, source_name: &str) -> Result<SyntaxNode>;

    /// Interpret `text` as a single literal expression
    ///
    /// Returns `None` when the text is not a constant literal.
    fn parse_literal(&self, text: &str) -> Option<Literal>;

    /// Read and parse the file at `path`
    fn parse(&self, path: &Path) -> Result<SyntaxNode> {
        let file = read_file(path)?;
        self.parse_source(&file.content, &path.display().to_string())
    }
}
