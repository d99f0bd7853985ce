use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::diff::unified_diff;
use crate::error::{Error, Result};
use crate::file::read_file;

/// A single textual substitution in one file
///
/// The replacement covers `start..end`: text at `end` itself is kept, so
/// `Change::new(path, 0, 0, text)` is a pure insertion. For conflict
/// detection the range is treated as inclusive of `end`.
///
/// Changes hold no handle into the entity tree that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    file_path: PathBuf,
    start: usize,
    end: usize,
    replacement: String,
    /// Checksum of the file content the offsets were computed against
    expected_checksum: Option<String>,
}

impl Change {
    pub fn new<P: Into<PathBuf>>(
        file_path: P,
        start: usize,
        end: usize,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            start,
            end,
            replacement: replacement.into(),
            expected_checksum: None,
        }
    }

    /// Pin this change to the file content with `checksum`
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.expected_checksum = Some(checksum.into());
        self
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn expected_checksum(&self) -> Option<&str> {
        self.expected_checksum.as_deref()
    }

    /// Whether the inclusive ranges of two changes to the same file overlap
    pub fn overlaps(&self, other: &Change) -> bool {
        self.file_path == other.file_path && self.start <= other.end && other.start <= self.end
    }

    /// Byte shift this change introduces
    pub fn byte_shift(&self) -> i64 {
        self.replacement.len() as i64 - self.end.saturating_sub(self.start) as i64
    }

    /// Apply this change alone to `content`
    pub fn apply_to(&self, content: &str) -> Result<String> {
        let (prefix, suffix) = match (content.get(..self.start), content.get(self.end..)) {
            (Some(prefix), Some(suffix)) if self.start <= self.end => (prefix, suffix),
            _ => {
                return Err(Error::out_of_range(format!(
                    "change {}..{} does not fit {} (length {})",
                    self.start,
                    self.end,
                    self.file_path.display(),
                    content.len()
                )));
            }
        };

        let mut out = String::with_capacity(prefix.len() + self.replacement.len() + suffix.len());
        out.push_str(prefix);
        out.push_str(&self.replacement);
        out.push_str(suffix);
        Ok(out)
    }

    /// Unified diff of the file on disk against the file with only this
    /// change applied; nothing is written
    pub fn preview(&self) -> Result<String> {
        let file = read_file(&self.file_path)?;
        let updated = self.apply_to(&file.content)?;
        Ok(unified_diff(&self.file_path, &file.content, &updated))
    }
}

/// Sort changes by start offset in descending order for sequential application
///
/// Applying from the end of the file backwards keeps every lower offset
/// valid after higher edits are folded in.
pub fn sort_changes_descending<'a>(changes: &[&'a Change]) -> Vec<&'a Change> {
    let mut sorted = changes.to_vec();
    sorted.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));
    sorted
}

/// Apply non-overlapping changes to `content` in descending offset order
pub fn apply_changes(content: &str, changes: &[&Change]) -> Result<String> {
    let mut current = content.to_string();
    for change in sort_changes_descending(changes) {
        current = change.apply_to(&current)?;
    }
    Ok(current)
}
