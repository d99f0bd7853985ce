use serde::{Deserialize, Serialize};
use std::path::Path;

/// Languages whose source layout and comment syntax the rewrite engine knows
///
/// The language decides which files discovery treats as translation units,
/// which directories count as packages, and how the body-boundary resolver
/// strips trailing line comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// Python (.py, .pyi)
    Python,
    /// Unknown or unsupported language
    Unknown,
}

impl Language {
    /// File extensions of translation units (without the dot)
    pub fn extensions(&self) -> &[&str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::Unknown => &[],
        }
    }

    /// Get the language name as a string
    pub fn name(&self) -> &str {
        match self {
            Language::Python => "Python",
            Language::Unknown => "Unknown",
        }
    }

    /// Prefix that starts a comment running to the end of the line
    pub fn line_comment(&self) -> Option<&'static str> {
        match self {
            Language::Python => Some("#"),
            Language::Unknown => None,
        }
    }

    /// File whose presence marks a directory as a package
    pub fn package_marker(&self) -> Option<&'static str> {
        match self {
            Language::Python => Some("__init__.py"),
            Language::Unknown => None,
        }
    }

    /// Whether `path` names a translation unit of this language
    pub fn is_source_file<P: AsRef<Path>>(&self, path: P) -> bool {
        self.is_supported() && detect_language(path) == *self
    }

    /// Check if this language is supported for editing
    pub fn is_supported(&self) -> bool {
        !matches!(self, Language::Unknown)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the programming language from a file path
///
/// # Examples
/// ```
/// use semantic_rewrite::{Language, detect_language};
/// assert_eq!(detect_language("settings.py"), Language::Python);
/// assert_eq!(detect_language("stubs/typing.pyi"), Language::Python);
/// assert_eq!(detect_language("unknown.xyz"), Language::Unknown);
/// ```
pub fn detect_language<P: AsRef<Path>>(path: P) -> Language {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    match extension {
        "py" | "pyi" => Language::Python,
        _ => Language::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_python() {
        assert_eq!(detect_language("main.py"), Language::Python);
        assert_eq!(detect_language("type.pyi"), Language::Python);
        assert_eq!(detect_language("/path/to/lib/__init__.py"), Language::Python);
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_language("unknown.xyz"), Language::Unknown);
        assert_eq!(detect_language("README"), Language::Unknown);
        assert_eq!(detect_language("lib.rs"), Language::Unknown);
        assert_eq!(detect_language(""), Language::Unknown);
    }

    #[test]
    fn test_line_comment() {
        assert_eq!(Language::Python.line_comment(), Some("#"));
        assert_eq!(Language::Unknown.line_comment(), None);
    }

    #[test]
    fn test_is_source_file() {
        assert!(Language::Python.is_source_file("employee.py"));
        assert!(!Language::Python.is_source_file("employee.pyc"));
        assert!(!Language::Python.is_source_file("notes.rs"));
        assert!(!Language::Unknown.is_source_file("README"));
    }

    #[test]
    fn test_package_marker() {
        assert_eq!(Language::Python.package_marker(), Some("__init__.py"));
        assert_eq!(Language::Unknown.package_marker(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Language::Python.to_string(), "Python");
        assert_eq!(Language::Unknown.to_string(), "Unknown");
    }
}
