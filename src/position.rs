use serde::Serialize;

use crate::error::{Error, Result};

/// Position in a text file (line and column numbers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in bytes)
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Line/column bounds of a construct; `end` is exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineSpan {
    pub start: Position,
    pub end: Position,
}

/// Convert a line and column to a byte offset
///
/// Lines are split with their terminators kept, so offsets are exact for
/// files with or without a trailing newline. The line one past the last,
/// at column 0, denotes the end of the text.
///
/// # Arguments
/// * `content` - The file content as a string
/// * `line` - 0-indexed line
/// * `column` - 0-indexed byte column within that line
///
/// # Returns
/// * `Ok(offset)` - The absolute byte offset
/// * `Err(Error::OutOfRange)` - Line past the end, or column past the line
pub fn line_col_to_offset(content: &str, line: usize, column: usize) -> Result<usize> {
    let mut offset = 0;
    let mut count = 0;

    for (index, line_str) in content.split_inclusive('\n').enumerate() {
        if index == line {
            if column > line_str.len() {
                return Err(Error::out_of_range(format!(
                    "column {} past end of line {} (length {})",
                    column,
                    line,
                    line_str.len()
                )));
            }
            return Ok(offset + column);
        }
        offset += line_str.len();
        count += 1;
    }

    if line == count && column == 0 {
        return Ok(content.len());
    }

    Err(Error::out_of_range(format!(
        "line {} column {} past end of text ({} lines)",
        line, column, count
    )))
}

/// Convert a byte offset to line and column position
///
/// # Arguments
/// * `content` - The file content as a string
/// * `byte_offset` - The byte offset to convert, at most `content.len()`
///
/// # Returns
/// * `Position` with 0-indexed line and column
pub fn offset_to_line_col(content: &str, byte_offset: usize) -> Result<Position> {
    if byte_offset > content.len() {
        return Err(Error::out_of_range(format!(
            "offset {} past end of text (length {})",
            byte_offset,
            content.len()
        )));
    }

    let mut line_start = 0;
    let mut line = 0;

    for line_str in content.split_inclusive('\n') {
        if byte_offset < line_start + line_str.len() {
            return Ok(Position::new(line, byte_offset - line_start));
        }
        line_start += line_str.len();
        line += 1;
    }

    // Offset is exactly the end of the text
    if content.is_empty() || content.ends_with('\n') {
        Ok(Position::new(line, 0))
    } else {
        let last = content.split_inclusive('\n').last().unwrap_or("");
        Ok(Position::new(line - 1, last.len()))
    }
}

/// Byte offset of the line terminator on `line` (or the end of a bare last line)
///
/// For `\r\n` endings this is the offset of the `\r`.
pub fn line_end_offset(content: &str, line: usize) -> Result<usize> {
    let start = line_col_to_offset(content, line, 0)?;
    let rest = &content[start..];
    let line_str = rest.split_inclusive('\n').next().unwrap_or("");
    let body = line_str
        .strip_suffix('\n')
        .map(|s| s.strip_suffix('\r').unwrap_or(s))
        .unwrap_or(line_str);
    Ok(start + body.len())
}
