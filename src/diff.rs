//! Unified diff rendering.

use std::path::Path;

/// Render a unified diff of `original` against `modified`
///
/// Both headers name `path`; hunks carry three lines of context. Identical
/// inputs produce an empty string.
pub fn unified_diff(path: &Path, original: &str, modified: &str) -> String {
    let patch = diffy::create_patch(original, modified);
    if patch.hunks().is_empty() {
        return String::new();
    }

    // diffy names the sides "original" and "modified"; keep only the hunks
    let rendered = patch.to_string();
    let hunks = rendered.splitn(3, '\n').nth(2).unwrap_or("");

    let name = path.display();
    format!("--- {}\n+++ {}\n{}", name, name, hunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_at_top() {
        let original = "ONE_LINER = 'foobar'\n\nMULTILINE_SETTING = {\n    'some_key': 42,\n}\n";
        let modified = format!("foobar\n{}", original);

        let diff = unified_diff(Path::new("settings.py"), original, &modified);

        assert_eq!(
            diff,
            "--- settings.py\n+++ settings.py\n@@ -1,3 +1,4 @@\n+foobar\n ONE_LINER = 'foobar'\n \n MULTILINE_SETTING = {\n"
        );
    }

    #[test]
    fn test_identical_inputs() {
        assert_eq!(unified_diff(Path::new("a.py"), "X = 1\n", "X = 1\n"), "");
    }

    #[test]
    fn test_replacement_lines() {
        let diff = unified_diff(Path::new("a.py"), "X = 1\nY = 2\n", "X = 1\nY = 3\n");

        assert!(diff.starts_with("--- a.py\n+++ a.py\n@@ "));
        assert!(diff.contains("-Y = 2\n"));
        assert!(diff.contains("+Y = 3\n"));
    }
}
