//! Filesystem discovery of packages and translation units.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::language::Language;

/// One entry found in a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredEntry {
    /// Full path of the file or directory
    pub path: PathBuf,
    /// Directory containing the language's package marker
    pub is_package: bool,
}

impl DiscoveredEntry {
    /// Local name: the directory name for packages, the file stem otherwise
    pub fn name(&self) -> String {
        let component = if self.is_package {
            self.path.file_name()
        } else {
            self.path.file_stem()
        };
        component
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// List the packages and translation units directly inside `dir`
///
/// Directories are packages only when they contain the language's package
/// marker; other directories are ignored. Entries are returned sorted by
/// path so enumeration order is stable.
pub fn discover(dir: &Path, language: Language) -> Result<Vec<DiscoveredEntry>> {
    let read_dir = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let mut entries = Vec::new();

    for entry in read_dir {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();

        if path.is_dir() {
            let is_package = language
                .package_marker()
                .is_some_and(|marker| path.join(marker).is_file());
            if is_package {
                entries.push(DiscoveredEntry {
                    path,
                    is_package: true,
                });
            }
        } else if language.is_source_file(&path) {
            entries.push(DiscoveredEntry {
                path,
                is_package: false,
            });
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(dir = %dir.display(), count = entries.len(), "discovered entries");
    Ok(entries)
}
