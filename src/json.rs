//! JSON report types emitted by the CLI.

use std::path::Path;

use serde::Serialize;
use uuid::Uuid;

use crate::change_set::CommitReport;
use crate::error::{Error, Result};
use crate::position::LineSpan;
use crate::syntax::SyntaxProvider;
use crate::tree::{EntityKind, EntityTree, NodeId};

/// Fresh identifier for one CLI invocation
pub fn generate_execution_id() -> String {
    Uuid::new_v4().to_string()
}

/// One node as listed by `tree`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeJson {
    pub path: String,
    pub name: String,
    pub kind: EntityKind,
    /// Backing file relative to the project root; absent for directories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whole: Option<LineSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<LineSpan>,
}

impl NodeJson {
    /// Snapshot `id`, resolving its spans against the current file content
    pub fn describe<P: SyntaxProvider>(tree: &EntityTree<P>, id: NodeId) -> Result<Self> {
        let node = tree.node(id);
        let (file, bounds) = match tree.source_file(id) {
            Ok(file) => {
                let root = tree.fs_path(tree.root());
                let relative = file.strip_prefix(root).unwrap_or(file);
                (Some(display(relative)), Some(tree.bounds(id)?))
            }
            Err(Error::NodeUnaddressable { .. }) => (None, None),
            Err(e) => return Err(e),
        };

        Ok(Self {
            path: node.path.clone(),
            name: node.name.clone(),
            kind: node.kind,
            file,
            whole: bounds.map(|b| b.whole),
            body: bounds.map(|b| b.body),
        })
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Response for any CLI command
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub execution_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Unified diff of the proposed change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<CommitReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    fn empty(execution_id: String, success: bool) -> Self {
        Self {
            execution_id,
            success,
            nodes: None,
            source: None,
            diff: None,
            commit: None,
            error: None,
        }
    }

    pub fn nodes(execution_id: String, nodes: Vec<NodeJson>) -> Self {
        Self {
            nodes: Some(nodes),
            ..Self::empty(execution_id, true)
        }
    }

    pub fn source(execution_id: String, source: String) -> Self {
        Self {
            source: Some(source),
            ..Self::empty(execution_id, true)
        }
    }

    /// A previewed change, committed when `commit` is present
    pub fn change(execution_id: String, diff: String, commit: Option<CommitReport>) -> Self {
        Self {
            diff: Some(diff),
            commit,
            ..Self::empty(execution_id, true)
        }
    }

    pub fn failure(execution_id: String, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::empty(execution_id, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_failure_serialization_omits_empty_fields() {
        let response = Response::failure("run-1".to_string(), "no node at path 'x'".to_string());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "execution_id": "run-1",
                "success": false,
                "error": "no node at path 'x'",
            })
        );
    }

    #[test]
    fn test_describe_nodes() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/__init__.py"), "").unwrap();
        fs::write(dir.path().join("pkg/mod.py"), "X = 1\n").unwrap();

        let mut tree = EntityTree::open(dir.path()).unwrap();
        let package = tree.find("pkg").unwrap();
        let variable = tree.find("pkg.mod.X").unwrap();

        let package = NodeJson::describe(&tree, package).unwrap();
        assert_eq!(package.kind, EntityKind::Package);
        assert_eq!(package.file, None);

        let variable = NodeJson::describe(&tree, variable).unwrap();
        assert_eq!(variable.file.as_deref(), Some("pkg/mod.py"));
        let json = serde_json::to_value(&variable).unwrap();
        assert_eq!(json["kind"], "variable");
        assert_eq!(json["body"]["start"]["column"], 4);
    }

    #[test]
    fn test_execution_ids_are_unique() {
        assert_ne!(generate_execution_id(), generate_execution_id());
    }
}
