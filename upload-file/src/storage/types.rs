//! Core types for file storage

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors that can occur during file storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// File not found in storage
    #[error("File not found: {0}")]
    NotFound(String),

    /// I/O error during storage operation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file path or identifier
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Generic storage error
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Visibility of a stored file
///
/// Local disks translate this into file permissions; remote disks pass it
/// along to the backend as an ACL hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Readable by anyone who can reach the disk
    Public,
    /// Readable only by the application
    #[default]
    Private,
}

impl Visibility {
    /// Returns the lowercase name used in configuration files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options passed to a storage backend alongside a write
///
/// # Examples
///
/// ```rust
/// use upload_file::storage::{Visibility, WriteOptions};
///
/// let options = WriteOptions::new()
///     .visibility(Visibility::Public)
///     .option("CacheControl", "max-age=3600");
///
/// assert_eq!(options.visibility, Some(Visibility::Public));
/// assert_eq!(options.extra.get("CacheControl").map(String::as_str), Some("max-age=3600"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    /// Visibility to apply to the written file (`None` keeps the backend default)
    pub visibility: Option<Visibility>,

    /// Backend specific key/value options
    pub extra: BTreeMap<String, String>,
}

impl WriteOptions {
    /// Creates empty write options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the visibility
    #[must_use]
    pub const fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Adds a backend specific option
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// A file received by the application but not yet stored
///
/// This is the framework-native upload object (for example the result of a
/// multipart extractor) and can be used directly as an upload source.
///
/// # Examples
///
/// ```rust
/// use upload_file::storage::UploadedFile;
///
/// let file = UploadedFile::new("document.pdf", "application/pdf", vec![0x25, 0x50, 0x44, 0x46]);
/// assert_eq!(file.size(), 4);
/// assert_eq!(file.extension(), Some("pdf"));
/// ```
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original filename from the upload
    pub filename: String,

    /// MIME content type reported by the client
    pub content_type: String,

    /// File data as bytes
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Creates a new uploaded file
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Returns the size of the file in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Extracts the file extension from the filename
    ///
    /// Returns `None` if the filename has no extension
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }

    /// Returns the filename without its extension
    #[must_use]
    pub fn stem(&self) -> &str {
        self.filename
            .rsplit_once('.')
            .map_or(self.filename.as_str(), |(stem, _)| stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploaded_file_size() {
        let file = UploadedFile::new("test.txt", "text/plain", vec![1, 2, 3, 4, 5]);
        assert_eq!(file.size(), 5);
    }

    #[test]
    fn test_extension() {
        let file = UploadedFile::new("document.pdf", "application/pdf", vec![]);
        assert_eq!(file.extension(), Some("pdf"));
        assert_eq!(file.stem(), "document");

        let no_ext = UploadedFile::new("README", "text/plain", vec![]);
        assert_eq!(no_ext.extension(), None);
        assert_eq!(no_ext.stem(), "README");

        let multiple_dots = UploadedFile::new("archive.tar.gz", "application/gzip", vec![]);
        assert_eq!(multiple_dots.extension(), Some("gz"));
        assert_eq!(multiple_dots.stem(), "archive.tar");

        let trailing_dot = UploadedFile::new("notes.", "text/plain", vec![]);
        assert_eq!(trailing_dot.extension(), None);
    }

    #[test]
    fn test_visibility_serde() {
        let json = serde_json::to_string(&Visibility::Public).unwrap();
        assert_eq!(json, r#""public""#);
        let parsed: Visibility = serde_json::from_str(r#""private""#).unwrap();
        assert_eq!(parsed, Visibility::Private);
        assert_eq!(Visibility::default(), Visibility::Private);
    }
}
