//! Locates the true end of an assigned value.
//!
//! Line-granular parsers can report the last line *with content* of a
//! bracketed multi-line value instead of the line holding its closing
//! character, and may count a trailing comment as part of the value. The
//! resolver rescans the source between the reported end line and the next
//! statement, right to left, for the value's terminating character.

use std::path::Path;

use crate::error::{Error, Result};
use crate::position::line_col_to_offset;
use crate::syntax::Anchor;

/// Inputs for one boundary scan
#[derive(Debug, Clone, Copy)]
pub struct BoundaryScan<'a> {
    /// Full text of the file
    pub text: &'a str,
    /// File the text came from, for error reporting
    pub file: &'a Path,
    /// Provider-reported last line of the value (1-based)
    pub reported_end_line: usize,
    /// Start of the next statement; `None` scans through end of file
    pub next_statement: Option<Anchor>,
    /// Last character of the value's rendered text
    pub terminator: char,
    /// Line-comment prefix to strip before scanning
    pub comment_prefix: Option<&'a str>,
    /// Provider-reported end of the value; on its line, text before this
    /// column belongs to the value and is never taken for a comment
    pub value_end: Option<Anchor>,
}

/// Find the offset just past the value's terminating character
///
/// Candidate lines run from the reported end line through the line of the
/// next statement, the latter cut at the statement's column. Lines are
/// scanned last to first, each right to left after stripping its trailing
/// comment; the first terminator found wins. On the value's own end line,
/// comment detection starts at the value's end column.
///
/// # Returns
/// * `Ok(offset)` - Byte offset one past the terminator
/// * `Err(Error::BoundaryNotFound)` - No candidate line holds the terminator
pub fn resolve_value_end(scan: &BoundaryScan<'_>) -> Result<usize> {
    let lines: Vec<&str> = scan.text.split_inclusive('\n').collect();
    let first = scan.reported_end_line.saturating_sub(1);

    let (last, cut) = match scan.next_statement {
        Some(anchor) => (anchor.line.saturating_sub(1), Some(anchor.column)),
        None => (lines.len().saturating_sub(1), None),
    };
    let last = last.min(lines.len().saturating_sub(1));

    let not_found = || Error::BoundaryNotFound {
        file: scan.file.to_path_buf(),
        terminator: scan.terminator,
        first_line: first,
        last_line: last,
    };

    if lines.is_empty() || first > last {
        return Err(not_found());
    }

    for index in (first..=last).rev() {
        let mut line = lines[index];
        if index == last {
            if let Some(column) = cut {
                line = line.get(..column.min(line.len())).unwrap_or(line);
            }
        }

        let code = match scan.comment_prefix {
            Some(prefix) => {
                let keep = match scan.value_end {
                    Some(end) if end.line == index + 1 => end.column.min(line.len()),
                    _ => 0,
                };
                match line.get(keep..) {
                    Some(rest) => &line[..keep + strip_line_comment(rest, prefix).len()],
                    None => strip_line_comment(line, prefix),
                }
            }
            None => line,
        };

        if let Some(column) = code.rfind(scan.terminator) {
            let end = line_col_to_offset(scan.text, index, column + scan.terminator.len_utf8())?;
            tracing::debug!(
                file = %scan.file.display(),
                line = index,
                column,
                reported = scan.reported_end_line,
                "resolved value end"
            );
            return Ok(end);
        }
    }

    Err(not_found())
}

/// Remove a trailing line comment, ignoring the prefix inside quotes
pub fn strip_line_comment<'a>(line: &'a str, prefix: &str) -> &'a str {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (index, c) in line.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == open {
                quote = None;
            }
            continue;
        }

        if c == '\'' || c == '"' {
            quote = Some(c);
        } else if line[index..].starts_with(prefix) {
            return &line[..index];
        }
    }
    line
}
