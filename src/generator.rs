//! Builds [`Change`]s from a node's resolved spans.

use crate::change::Change;
use crate::error::{Error, Result};
use crate::literal::Literal;
use crate::position::{line_end_offset, offset_to_line_col};
use crate::syntax::SyntaxProvider;
use crate::tree::{EntityKind, EntityTree, NodeId, Resolved, slice};

/// Change factory for one node
///
/// Every change extends through the end of the node's last line, so text
/// following the node on that line is replaced too. Generated changes carry
/// the checksum of the file content they were computed from.
pub struct ChangeGenerator<'t, P: SyntaxProvider> {
    tree: &'t EntityTree<P>,
    id: NodeId,
}

/// Byte region an overwrite would replace
struct Region {
    resolved: Resolved,
    start: usize,
    end: usize,
}

impl<'t, P: SyntaxProvider> ChangeGenerator<'t, P> {
    pub(crate) fn new(tree: &'t EntityTree<P>, id: NodeId) -> Self {
        Self { tree, id }
    }

    fn region(&self, body: bool) -> Result<Region> {
        let resolved = self.tree.resolve(self.id)?;
        let text = &resolved.file.content;
        let offsets = resolved.offsets;

        let last_line = if offsets.end > offsets.start {
            offset_to_line_col(text, offsets.end - 1)?.line
        } else {
            resolved.bounds.whole.start.line
        };

        let kind = self.tree.node(self.id).kind;
        if body
            && matches!(kind, EntityKind::Class | EntityKind::Function)
            && offsets.body_start >= offsets.end
        {
            // `class A: pass` has no body lines of its own
            return Err(Error::out_of_range(format!(
                "body of '{}' shares its declaration line",
                self.tree.node(self.id).path
            )));
        }

        let start = if body { offsets.body_start } else { offsets.start };
        let end = line_end_offset(text, last_line)?.max(start);

        Ok(Region {
            resolved,
            start,
            end,
        })
    }

    fn change(&self, region: Region, new_text: String) -> Change {
        let Region {
            resolved,
            start,
            end,
        } = region;
        tracing::debug!(
            node = %self.tree.node(self.id).path,
            start,
            end,
            "generated change"
        );
        Change::new(resolved.file.path, start, end, new_text).with_checksum(resolved.file.checksum)
    }

    /// Replace the whole node with `new_text`
    pub fn overwrite(&self, new_text: impl Into<String>) -> Result<Change> {
        let region = self.region(false)?;
        Ok(self.change(region, new_text.into()))
    }

    /// Replace the node's body with `new_text`
    ///
    /// For a module this is the same as [`overwrite`](Self::overwrite). A
    /// class or function written on one line has no separate body and fails
    /// with [`Error::OutOfRange`].
    pub fn overwrite_body(&self, new_text: impl Into<String>) -> Result<Change> {
        let region = self.region(true)?;
        Ok(self.change(region, new_text.into()))
    }

    /// Insert `text` at `index`, relative to the start of the node
    ///
    /// The resulting change rewrites the whole node, so two injections into
    /// the same node conflict inside one change set.
    pub fn inject_at_index(&self, index: usize, text: &str) -> Result<Change> {
        self.inject(false, index, text)
    }

    /// Insert `text` at `index`, relative to the start of the node's body
    pub fn inject_at_body_index(&self, index: usize, text: &str) -> Result<Change> {
        self.inject(true, index, text)
    }

    fn inject(&self, body: bool, index: usize, text: &str) -> Result<Change> {
        let region = self.region(body)?;
        let current = slice(&region.resolved.file.content, region.start, region.end)?;

        if !current.is_char_boundary(index) {
            return Err(Error::out_of_range(format!(
                "injection index {} outside node text of length {}",
                index,
                current.len()
            )));
        }

        let mut spliced = String::with_capacity(current.len() + text.len());
        spliced.push_str(&current[..index]);
        spliced.push_str(text);
        spliced.push_str(&current[index..]);
        Ok(self.change(region, spliced))
    }

    /// Replace a variable's value with the rendering of `value`
    pub fn value(&self, value: &Literal) -> Result<Change> {
        let node = self.tree.node(self.id);
        if node.kind != EntityKind::Variable {
            return Err(Error::NotAVariable {
                path: node.path.clone(),
            });
        }
        self.overwrite_body(value.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SOURCE: &str = "import os\n\nclass Employee(object):\n\n    def pay(self):\n        return 1\n\nRATE = [\n    1,\n]  # per hour\nTAIL = 2";

    fn setup() -> (tempfile::TempDir, EntityTree) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("staff.py"), SOURCE).unwrap();
        let tree = EntityTree::open(dir.path()).unwrap();
        (dir, tree)
    }

    #[test]
    fn test_overwrite_extends_to_end_of_last_line() {
        let (_dir, mut tree) = setup();
        let rate = tree.find("staff.RATE").unwrap();

        let change = tree.change(rate).overwrite("RATE = 2").unwrap();
        let start = SOURCE.find("RATE").unwrap();
        let end = SOURCE.find("\nTAIL").unwrap();

        assert_eq!(change.start(), start);
        assert_eq!(change.end(), end);
        assert_eq!(
            change.apply_to(SOURCE).unwrap(),
            SOURCE.replace("RATE = [\n    1,\n]  # per hour", "RATE = 2")
        );
    }

    #[test]
    fn test_overwrite_class_keeps_following_lines() {
        let (_dir, mut tree) = setup();
        let class = tree.find("staff.Employee").unwrap();

        let change = tree.change(class).overwrite("class Boss:\n    pass").unwrap();
        let updated = change.apply_to(SOURCE).unwrap();

        assert!(updated.starts_with("import os\n\nclass Boss:\n    pass\n\nRATE = ["));
    }

    #[test]
    fn test_overwrite_body_of_variable() {
        let (_dir, mut tree) = setup();
        let tail = tree.find("staff.TAIL").unwrap();

        let change = tree.change(tail).overwrite_body("3").unwrap();
        assert_eq!(change.replacement(), "3");
        assert!(change.apply_to(SOURCE).unwrap().ends_with("TAIL = 3"));
    }

    #[test]
    fn test_module_overwrite_body_matches_overwrite() {
        let (_dir, mut tree) = setup();
        let module = tree.find("staff").unwrap();

        let whole = tree.change(module).overwrite("X = 1").unwrap();
        let body = tree.change(module).overwrite_body("X = 1").unwrap();

        assert_eq!(whole, body);
        assert_eq!(whole.apply_to(SOURCE).unwrap(), "X = 1");
    }

    #[test]
    fn test_inject_at_body_index() {
        let (_dir, mut tree) = setup();
        let class = tree.find("staff.Employee").unwrap();

        let change = tree
            .change(class)
            .inject_at_body_index(1, "    '''Staff member.'''\n")
            .unwrap();
        let updated = change.apply_to(SOURCE).unwrap();

        assert!(updated.contains("class Employee(object):\n\n    '''Staff member.'''\n    def pay(self):"));
    }

    #[test]
    fn test_inject_at_index_splices_text() {
        let (_dir, mut tree) = setup();
        let method = tree.find("staff.Employee.pay").unwrap();

        let change = tree.change(method).inject_at_index(0, "@property\n    ").unwrap();

        assert_eq!(change.start(), SOURCE.find("def pay").unwrap());
        assert_eq!(change.replacement(), "@property\n    def pay(self):\n        return 1");
        assert!(change.apply_to(SOURCE).unwrap().contains(
            "class Employee(object):\n\n    @property\n    def pay(self):\n        return 1\n\nRATE"
        ));
    }

    #[test]
    fn test_one_line_class_has_no_body_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("flat.py"), "class A: pass\nY = 2\n").unwrap();
        let mut tree = EntityTree::open(dir.path()).unwrap();
        let class = tree.find("flat.A").unwrap();

        assert!(matches!(
            tree.change(class).overwrite_body("    x = 1"),
            Err(Error::OutOfRange { .. })
        ));
        assert!(matches!(
            tree.change(class).inject_at_body_index(0, "x"),
            Err(Error::OutOfRange { .. })
        ));

        let whole = tree.change(class).overwrite("class A:\n    x = 1").unwrap();
        assert_eq!(whole.apply_to("class A: pass\nY = 2\n").unwrap(), "class A:\n    x = 1\nY = 2\n");
    }

    #[test]
    fn test_inject_at_index_out_of_range() {
        let (_dir, mut tree) = setup();
        let tail = tree.find("staff.TAIL").unwrap();

        let result = tree.change(tail).inject_at_index(100, "x");
        assert!(matches!(result, Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn test_value_requires_variable() {
        let (_dir, mut tree) = setup();
        let import = tree.find("staff.os").unwrap();

        assert!(matches!(
            tree.change(import).value(&Literal::Int(1)),
            Err(Error::NotAVariable { .. })
        ));
    }

    #[test]
    fn test_unaddressable_nodes() {
        let (_dir, tree) = setup();
        let root = tree.root();

        assert!(matches!(
            tree.change(root).overwrite("x"),
            Err(Error::NodeUnaddressable { .. })
        ));
        assert!(matches!(
            tree.change(root).inject_at_body_index(0, "x"),
            Err(Error::NodeUnaddressable { .. })
        ));
    }
}
