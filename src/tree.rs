//! Entity tree over a project directory.
//!
//! Nodes live in an arena addressed by [`NodeId`]. A node stores a
//! back-reference to its parent and never owns its children: `children()`
//! recomputes them from the filesystem or the syntax provider on every call,
//! reusing the id of any node whose dotted path already exists. Absolute
//! offsets are always derived from the file's current content.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::boundary::{BoundaryScan, resolve_value_end};
use crate::discovery::discover;
use crate::error::{Error, Result};
use crate::file::{FileContent, read_file};
use crate::generator::ChangeGenerator;
use crate::language::Language;
use crate::literal::Literal;
use crate::position::{LineSpan, Position, line_col_to_offset, offset_to_line_col};
use crate::python::PythonProvider;
use crate::syntax::{Anchor, SyntaxKind, SyntaxNode, SyntaxProvider};

/// Stable handle to a node in an [`EntityTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

/// Closed set of entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Package,
    Module,
    Class,
    Function,
    Variable,
    Import,
    Expression,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::Package => "package",
            EntityKind::Module => "module",
            EntityKind::Class => "class",
            EntityKind::Function => "function",
            EntityKind::Variable => "variable",
            EntityKind::Import => "import",
            EntityKind::Expression => "expression",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a node's bytes come from
#[derive(Debug, Clone)]
enum Backing {
    /// Project root or package directory
    Directory(PathBuf),
    /// A whole translation unit
    File(PathBuf),
    /// A construct inside its nearest file-bearing ancestor
    Statement {
        syntax: SyntaxNode,
        /// Start of the statement that follows this one
        next: Option<Anchor>,
    },
}

/// One addressable entity
#[derive(Debug, Clone)]
pub struct EntityNode {
    pub kind: EntityKind,
    /// Local name; may contain characters invalid in a dotted path for
    /// variables assigned to subscripts or attributes
    pub name: String,
    /// Dotted path from the project root (empty for the root)
    pub path: String,
    pub parent: Option<NodeId>,
    backing: Backing,
}

impl EntityNode {
    /// Provider snapshot for in-file constructs
    pub fn syntax(&self) -> Option<&SyntaxNode> {
        match &self.backing {
            Backing::Statement { syntax, .. } => Some(syntax),
            _ => None,
        }
    }
}

/// Whole-span and body-span of a node in line/column form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub whole: LineSpan,
    pub body: LineSpan,
}

/// Absolute byte offsets of a node's spans; ends are exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Offsets {
    pub start: usize,
    pub end: usize,
    pub body_start: usize,
    pub body_end: usize,
}

/// A node's spans resolved against the file content they were computed from
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    pub file: FileContent,
    pub bounds: Bounds,
    pub offsets: Offsets,
}

/// Hierarchy of projects, packages, modules and in-file constructs
pub struct EntityTree<P: SyntaxProvider = PythonProvider> {
    language: Language,
    provider: P,
    nodes: Vec<EntityNode>,
    by_path: HashMap<String, NodeId>,
}

impl EntityTree<PythonProvider> {
    /// Open a Python project rooted at `dir`
    pub fn open<D: AsRef<Path>>(dir: D) -> Result<Self> {
        Self::with_provider(dir, PythonProvider::new())
    }
}

impl<P: SyntaxProvider> EntityTree<P> {
    /// Open a project rooted at `dir`, parsing files with `provider`
    pub fn with_provider<D: AsRef<Path>>(dir: D, provider: P) -> Result<Self> {
        let dir = dir.as_ref();
        let root_dir = dir.canonicalize().map_err(|e| Error::io(dir, e))?;
        let name = root_dir
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let root = EntityNode {
            kind: EntityKind::Project,
            name,
            path: String::new(),
            parent: None,
            backing: Backing::Directory(root_dir),
        };

        let mut by_path = HashMap::new();
        by_path.insert(String::new(), NodeId(0));

        Ok(Self {
            language: provider.language(),
            provider,
            nodes: vec![root],
            by_path,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The node behind `id`
    ///
    /// Ids are only handed out by this tree; one from another tree may panic.
    pub fn node(&self, id: NodeId) -> &EntityNode {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Filesystem location of the nearest file- or directory-bearing ancestor
    pub fn fs_path(&self, id: NodeId) -> &Path {
        let mut current = id;
        loop {
            let node = self.node(current);
            match (&node.backing, node.parent) {
                (Backing::Directory(path) | Backing::File(path), _) => return path,
                (Backing::Statement { .. }, Some(parent)) => current = parent,
                // Statements are always created under a module
                (Backing::Statement { .. }, None) => return Path::new(""),
            }
        }
    }

    /// The file holding this node's text
    ///
    /// Fails with `NodeUnaddressable` for the project root and packages.
    pub fn source_file(&self, id: NodeId) -> Result<&Path> {
        let mut current = id;
        loop {
            let node = self.node(current);
            match (&node.backing, node.parent) {
                (Backing::File(path), _) => return Ok(path),
                (Backing::Statement { .. }, Some(parent)) => current = parent,
                _ => {
                    return Err(Error::NodeUnaddressable {
                        path: self.node(id).path.clone(),
                    });
                }
            }
        }
    }

    /// Direct children of `id`, keyed by local name
    pub fn children(&mut self, id: NodeId) -> Result<BTreeMap<String, NodeId>> {
        let node = self.node(id).clone();

        match (node.kind, &node.backing) {
            (EntityKind::Project | EntityKind::Package, Backing::Directory(dir)) => {
                self.directory_children(id, dir)
            }
            (EntityKind::Module, Backing::File(file)) => {
                let module = self.provider.parse(file)?;
                Ok(self.statement_children(id, module.children(), None))
            }
            (EntityKind::Class, Backing::Statement { syntax, next }) => {
                Ok(self.statement_children(id, syntax.children(), *next))
            }
            _ => Ok(BTreeMap::new()),
        }
    }

    fn directory_children(&mut self, id: NodeId, dir: &Path) -> Result<BTreeMap<String, NodeId>> {
        let mut children = BTreeMap::new();

        for entry in discover(dir, self.language)? {
            let name = entry.name();
            let (kind, backing) = if entry.is_package {
                (EntityKind::Package, Backing::Directory(entry.path))
            } else {
                (EntityKind::Module, Backing::File(entry.path))
            };
            let child = self.upsert(id, kind, &name, backing);
            children.insert(name, child);
        }
        Ok(children)
    }

    /// Classify statements into entities
    ///
    /// `fallback` anchors the last statement when nothing follows it in this
    /// body: it is the statement following the enclosing construct.
    fn statement_children(
        &mut self,
        id: NodeId,
        statements: &[SyntaxNode],
        fallback: Option<Anchor>,
    ) -> BTreeMap<String, NodeId> {
        let mut children: BTreeMap<String, NodeId> = BTreeMap::new();

        for (index, statement) in statements.iter().enumerate() {
            let next = statements
                .get(index + 1)
                .map(SyntaxNode::anchor)
                .or(fallback);

            let (kind, name) = match statement.kind {
                SyntaxKind::Class | SyntaxKind::Function => {
                    let Some(name) = statement.name.clone() else {
                        continue;
                    };
                    let kind = if statement.kind == SyntaxKind::Class {
                        EntityKind::Class
                    } else {
                        EntityKind::Function
                    };
                    (kind, name)
                }
                SyntaxKind::Assign => {
                    let (Some(target), Some(_)) = (statement.targets.first(), &statement.value)
                    else {
                        continue;
                    };
                    let name = target
                        .name
                        .clone()
                        .unwrap_or_else(|| target.render().to_string());
                    (EntityKind::Variable, name)
                }
                SyntaxKind::Import => {
                    let base = statement
                        .import_names
                        .first()
                        .cloned()
                        .unwrap_or_else(|| statement.render().to_string());
                    (EntityKind::Import, unique_name(&base, &children))
                }
                SyntaxKind::Expression => {
                    let base = statement.name.as_deref().unwrap_or("expression");
                    (EntityKind::Expression, unique_name(base, &children))
                }
                SyntaxKind::Module | SyntaxKind::Other => continue,
            };

            let backing = Backing::Statement {
                syntax: statement.clone(),
                next,
            };
            let child = self.upsert(id, kind, &name, backing);
            children.insert(name, child);
        }

        tracing::debug!(
            parent = %self.node(id).path,
            count = children.len(),
            "enumerated statement children"
        );
        children
    }

    fn upsert(&mut self, parent: NodeId, kind: EntityKind, name: &str, backing: Backing) -> NodeId {
        let parent_path = &self.node(parent).path;
        let path = if parent_path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", parent_path, name)
        };

        if let Some(&id) = self.by_path.get(&path) {
            let node = &mut self.nodes[id.0];
            node.kind = kind;
            node.backing = backing;
            return id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(EntityNode {
            kind,
            name: name.to_string(),
            path: path.clone(),
            parent: Some(parent),
            backing,
        });
        self.by_path.insert(path, id);
        id
    }

    /// Look a node up by dotted path, enumerating children along the way
    ///
    /// Names containing dots can only be reached through `children()`.
    pub fn find(&mut self, path: &str) -> Result<NodeId> {
        let mut current = self.root();
        if path.is_empty() {
            return Ok(current);
        }

        for segment in path.split('.') {
            let children = self.children(current)?;
            current = *children.get(segment).ok_or_else(|| Error::UnknownNode {
                path: path.to_string(),
            })?;
        }
        Ok(current)
    }

    /// Every node below `id`, depth first, in name order
    pub fn descendants(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut found = Vec::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            let children = self.children(current)?;
            for &child in children.values().rev() {
                stack.push(child);
            }
            if current != id {
                found.push(current);
            }
        }
        Ok(found)
    }

    /// Whole-span and body-span of `id` in line/column form
    pub fn bounds(&self, id: NodeId) -> Result<Bounds> {
        let file = read_file(self.source_file(id)?)?;
        self.bounds_in(id, &file)
    }

    pub fn whole_span(&self, id: NodeId) -> Result<LineSpan> {
        Ok(self.bounds(id)?.whole)
    }

    pub fn body_span(&self, id: NodeId) -> Result<LineSpan> {
        Ok(self.bounds(id)?.body)
    }

    /// Absolute offsets of both spans, from the file's current content
    pub fn offsets(&self, id: NodeId) -> Result<Offsets> {
        Ok(self.resolve(id)?.offsets)
    }

    pub(crate) fn resolve(&self, id: NodeId) -> Result<Resolved> {
        let file = read_file(self.source_file(id)?)?;
        let bounds = self.bounds_in(id, &file)?;
        let text = &file.content;

        let offset = |p: Position| line_col_to_offset(text, p.line, p.column);
        let offsets = Offsets {
            start: offset(bounds.whole.start)?,
            end: offset(bounds.whole.end)?,
            body_start: offset(bounds.body.start)?,
            body_end: offset(bounds.body.end)?,
        };

        Ok(Resolved {
            file,
            bounds,
            offsets,
        })
    }

    fn bounds_in(&self, id: NodeId, file: &FileContent) -> Result<Bounds> {
        let node = self.node(id);
        let text = &file.content;

        let syntax = match &node.backing {
            Backing::File(_) => {
                let whole = LineSpan {
                    start: Position::new(0, 0),
                    end: offset_to_line_col(text, text.len())?,
                };
                return Ok(Bounds { whole, body: whole });
            }
            Backing::Directory(_) => {
                return Err(Error::NodeUnaddressable {
                    path: node.path.clone(),
                });
            }
            Backing::Statement { syntax, next } => {
                if node.kind == EntityKind::Variable {
                    return self.variable_bounds(file, syntax, *next);
                }
                syntax
            }
        };

        let start = Position::new(syntax.from_line.saturating_sub(1), syntax.col_offset);
        let end = Position::new(syntax.to_line, 0);
        let whole = LineSpan { start, end };

        let body = match node.kind {
            // Body starts at column 0 of the line after the header, which may
            // span several lines
            EntityKind::Class | EntityKind::Function => {
                let line = syntax
                    .body_line
                    .map_or(start.line + 1, |l| l.saturating_sub(1).max(start.line + 1));
                LineSpan {
                    start: Position::new(line.min(end.line), 0),
                    end,
                }
            }
            _ => whole,
        };

        Ok(Bounds { whole, body })
    }

    fn variable_bounds(
        &self,
        file: &FileContent,
        syntax: &SyntaxNode,
        next: Option<Anchor>,
    ) -> Result<Bounds> {
        let (Some(target), Some(value)) = (syntax.targets.first(), syntax.value.as_deref()) else {
            return Err(Error::Parse {
                source_name: file.path.display().to_string(),
                reason: "assignment without target or value".to_string(),
            });
        };

        let terminator = value.render().chars().last().ok_or_else(|| Error::Parse {
            source_name: file.path.display().to_string(),
            reason: "assigned value renders to empty text".to_string(),
        })?;

        let end_offset = resolve_value_end(&BoundaryScan {
            text: &file.content,
            file: &file.path,
            reported_end_line: value.to_line,
            next_statement: next,
            terminator,
            comment_prefix: self.language.line_comment(),
            value_end: Some(Anchor {
                line: value.to_line,
                column: value.end_column,
            }),
        })?;
        let end = offset_to_line_col(&file.content, end_offset)?;

        Ok(Bounds {
            whole: LineSpan {
                start: Position::new(target.from_line.saturating_sub(1), target.col_offset),
                end,
            },
            body: LineSpan {
                start: Position::new(value.from_line.saturating_sub(1), value.col_offset),
                end,
            },
        })
    }

    /// Full current text of the file holding `id`
    pub fn file_source(&self, id: NodeId) -> Result<String> {
        Ok(read_file(self.source_file(id)?)?.content)
    }

    /// Text of the whole-span
    pub fn get_source(&self, id: NodeId) -> Result<String> {
        let resolved = self.resolve(id)?;
        slice(&resolved.file.content, resolved.offsets.start, resolved.offsets.end)
    }

    /// Text of the body-span: a block body, an assigned value, or the whole
    /// file for a module
    pub fn get_body_source(&self, id: NodeId) -> Result<String> {
        let resolved = self.resolve(id)?;
        slice(
            &resolved.file.content,
            resolved.offsets.body_start,
            resolved.offsets.body_end,
        )
    }

    /// Leading whitespace of the node's first line
    pub fn outer_indentation(&self, id: NodeId) -> Result<String> {
        let resolved = self.resolve(id)?;
        let text = &resolved.file.content;
        let line_start = line_col_to_offset(text, resolved.bounds.whole.start.line, 0)?;
        Ok(leading_whitespace(&text[line_start..]).to_string())
    }

    /// Leading whitespace of the first non-blank line of the body
    pub fn inner_indentation(&self, id: NodeId) -> Result<String> {
        let body = self.get_body_source(id)?;
        Ok(body
            .lines()
            .find(|line| !line.trim().is_empty())
            .map(leading_whitespace)
            .unwrap_or("")
            .to_string())
    }

    /// Interpret a variable's current value as a literal
    ///
    /// A value that is not a constant literal is `Ok(None)`.
    pub fn eval_body(&self, id: NodeId) -> Result<Option<Literal>> {
        let node = self.node(id);
        if node.kind != EntityKind::Variable {
            return Err(Error::NotAVariable {
                path: node.path.clone(),
            });
        }
        let body = self.get_body_source(id)?;
        Ok(self.provider.parse_literal(&body))
    }

    /// Change factory for `id`
    pub fn change(&self, id: NodeId) -> ChangeGenerator<'_, P> {
        ChangeGenerator::new(self, id)
    }
}

/// `base`, or `base_N` for the first N not already taken
fn unique_name(base: &str, taken: &BTreeMap<String, NodeId>) -> String {
    let mut name = base.to_string();
    let mut index = 0;
    while taken.contains_key(&name) {
        name = format!("{}_{}", base, index);
        index += 1;
    }
    name
}

fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

pub(crate) fn slice(text: &str, start: usize, end: usize) -> Result<String> {
    text.get(start..end).map(str::to_string).ok_or_else(|| {
        Error::out_of_range(format!(
            "span {}..{} is not a valid range of text with length {}",
            start,
            end,
            text.len()
        ))
    })
}
