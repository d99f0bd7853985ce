use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Content of a file read into memory
#[derive(Debug, Clone)]
pub struct FileContent {
    /// Path the content was read from
    pub path: PathBuf,
    /// File content as valid UTF-8 string
    pub content: String,
    /// Byte length of the content
    pub len: usize,
    /// BLAKE3 hash of the content (hex-encoded)
    pub checksum: String,
}

/// Error types for file operations
#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("I/O error on {path}: {message}")]
    IoError { path: String, message: String },
    #[error("Invalid UTF-8 in file: {0}")]
    InvalidUtf8(String),
}

impl FileError {
    fn io(path: &Path, err: io::Error) -> Self {
        FileError::IoError {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Hex-encoded BLAKE3 checksum of `content`
pub fn checksum(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// Read a file from disk with UTF-8 validation
///
/// Every call is a blocking full-file read; nothing is cached, so callers
/// always see the file's current content.
///
/// # Arguments
/// * `path` - Path to the file to read
///
/// # Returns
/// * `Ok(FileContent)` - File content with metadata
/// * `Err(FileError)` - File not found, I/O error, or invalid UTF-8
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<FileContent, FileError> {
    let path_ref = path.as_ref();

    if !path_ref.exists() {
        return Err(FileError::NotFound(path_ref.display().to_string()));
    }

    let bytes = fs::read(path_ref).map_err(|e| FileError::io(path_ref, e))?;

    let content = String::from_utf8(bytes)
        .map_err(|_| FileError::InvalidUtf8(path_ref.display().to_string()))?;

    let len = content.len();
    let checksum = checksum(&content);

    Ok(FileContent {
        path: path_ref.to_path_buf(),
        content,
        len,
        checksum,
    })
}

/// Write `content` over the file at `path` in a single call
pub fn write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<(), FileError> {
    let path_ref = path.as_ref();
    fs::write(path_ref, content.as_bytes()).map_err(|e| FileError::io(path_ref, e))
}
