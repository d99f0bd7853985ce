//! Batches of changes validated, previewed and committed together.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use crate::change::{Change, apply_changes};
use crate::diff::unified_diff;
use crate::error::{Error, Result};
use crate::file::{FileContent, checksum, read_file, write_file};

/// Changes across one or more files, committed once
#[derive(Debug, Clone)]
pub struct ChangeSet {
    id: Uuid,
    changes: Vec<Change>,
}

/// One file written by a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCommit {
    pub path: PathBuf,
    /// Checksum of the content written
    pub checksum: String,
    /// Length of the new content minus the length of the old
    pub byte_shift: i64,
    /// Number of changes applied to this file
    pub changes: usize,
}

/// Outcome of a successful commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    pub id: Uuid,
    pub files: Vec<FileCommit>,
}

impl CommitReport {
    pub fn total_byte_shift(&self) -> i64 {
        self.files.iter().map(|f| f.byte_shift).sum()
    }
}

impl Default for ChangeSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeSet {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            changes: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn add(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    /// Changes grouped by file, in insertion order within each file
    ///
    /// Paths are canonicalized so different spellings of one file share a
    /// group; a path that cannot be resolved is used as written.
    pub fn by_file(&self) -> BTreeMap<PathBuf, Vec<&Change>> {
        let mut grouped: BTreeMap<PathBuf, Vec<&Change>> = BTreeMap::new();
        for change in &self.changes {
            grouped
                .entry(canonical(change.file_path()))
                .or_default()
                .push(change);
        }
        grouped
    }

    /// Fail on the first pair of changes to one file whose inclusive ranges
    /// overlap
    pub fn validate(&self) -> Result<()> {
        for (path, mut changes) in self.by_file() {
            changes.sort_by_key(|c| (c.start(), c.end()));

            // Widest range seen so far; any later start inside it conflicts
            let mut widest: Option<&Change> = None;
            for change in changes {
                if let Some(previous) = widest {
                    if change.start() <= previous.end() {
                        return Err(Error::ConflictingChanges {
                            file: path.clone(),
                            first_start: previous.start(),
                            first_end: previous.end(),
                            second_start: change.start(),
                            second_end: change.end(),
                        });
                    }
                }
                if widest.is_none_or(|w| change.end() > w.end()) {
                    widest = Some(change);
                }
            }
        }
        Ok(())
    }

    /// Unified diff of every affected file, in path order; nothing is written
    pub fn preview(&self) -> Result<String> {
        self.validate()?;

        let mut out = String::new();
        for (path, changes) in self.by_file() {
            let file = read_file(&path)?;
            let updated = apply_changes(&file.content, &changes)?;
            // Headers name the file as the first change spelled it
            let shown = changes.first().map_or(path.as_path(), |c| c.file_path());
            out.push_str(&unified_diff(shown, &file.content, &updated));
        }
        Ok(out)
    }

    /// Validate, then apply and write each file's changes
    ///
    /// Every file is read, checked against the checksums its changes were
    /// generated from, and rewritten in memory before the first write. A
    /// write failure part way through leaves earlier files written.
    pub fn commit(self) -> Result<CommitReport> {
        self.validate()?;

        let mut staged = Vec::new();
        for (path, changes) in self.by_file() {
            let file = read_file(&path)?;
            ensure_fresh(&file, &changes)?;
            let updated = apply_changes(&file.content, &changes)?;
            tracing::debug!(
                change_set = %self.id,
                file = %path.display(),
                changes = changes.len(),
                "applied changes in memory"
            );
            staged.push((file, updated, changes.len()));
        }

        let mut files = Vec::with_capacity(staged.len());
        for (file, updated, count) in staged {
            write_file(&file.path, &updated)?;
            files.push(FileCommit {
                checksum: checksum(&updated),
                byte_shift: updated.len() as i64 - file.len as i64,
                changes: count,
                path: file.path,
            });
        }

        tracing::info!(
            change_set = %self.id,
            files = files.len(),
            changes = self.changes.len(),
            "committed change set"
        );

        Ok(CommitReport { id: self.id, files })
    }
}

impl Extend<Change> for ChangeSet {
    fn extend<I: IntoIterator<Item = Change>>(&mut self, iter: I) {
        self.changes.extend(iter);
    }
}

impl FromIterator<Change> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        let mut set = ChangeSet::new();
        set.extend(iter);
        set
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn ensure_fresh(file: &FileContent, changes: &[&Change]) -> Result<()> {
    for change in changes {
        if let Some(expected) = change.expected_checksum() {
            if expected != file.checksum {
                return Err(Error::StaleChange {
                    file: file.path.clone(),
                    expected: expected.to_string(),
                    actual: file.checksum.clone(),
                });
            }
        }
    }
    Ok(())
}
