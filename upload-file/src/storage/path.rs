//! Disk-relative paths and name sanitization

use std::fmt;

/// Characters that may never appear in a stored filename
const FORBIDDEN: &[char] = &['/', '\\', '#', '?', '%', ':', '*', '"', '<', '>', '|', '\0'];

/// Sanitizes a single filename
///
/// Path separators and characters that break URLs or filesystems are replaced
/// with `-`, traversal sequences (`..`) are collapsed and surrounding dots and
/// whitespace are trimmed. The result never contains a path separator.
///
/// # Examples
///
/// ```rust
/// use upload_file::storage::sanitize_filename;
///
/// assert_eq!(sanitize_filename("report"), "report");
/// assert_eq!(sanitize_filename("../../etc/passwd"), "etc-passwd");
/// assert_eq!(sanitize_filename("what?#now"), "what--now");
/// ```
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) || c.is_control() { '-' } else { c })
        .collect();

    let mut cleaned = replaced;
    while cleaned.contains("..") {
        cleaned = cleaned.replace("..", ".");
    }

    cleaned
        .trim_matches(|c: char| c == '.' || c == '-' || c.is_whitespace())
        .to_string()
}

/// Sanitizes a directory relative to a disk root
///
/// Both `/` and `\` act as separators. Empty, `.` and `..` segments are
/// dropped and each remaining segment is sanitized like a filename, so the
/// result can never escape the disk root.
///
/// # Examples
///
/// ```rust
/// use upload_file::storage::sanitize_directory;
///
/// assert_eq!(sanitize_directory("/foo/bar/"), "foo/bar");
/// assert_eq!(sanitize_directory("foo/../../bar"), "foo/bar");
/// assert_eq!(sanitize_directory("a\\b"), "a/b");
/// assert_eq!(sanitize_directory(""), "");
/// ```
#[must_use]
pub fn sanitize_directory(directory: &str) -> String {
    directory
        .split(['/', '\\'])
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .map(sanitize_filename)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// A disk-relative destination split into directory, filename and extension
///
/// # Examples
///
/// ```rust
/// use upload_file::storage::StoragePath;
///
/// let path = StoragePath::new("foo", "bar", "png");
/// assert_eq!(path.path(), "foo/bar.png");
///
/// let root = StoragePath::new("", "bar", "");
/// assert_eq!(root.path(), "bar");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePath {
    /// Directory relative to the disk root (no leading or trailing slash)
    pub directory: String,
    /// Filename without extension
    pub filename: String,
    /// Extension without leading dot (may be empty)
    pub extension: String,
}

impl StoragePath {
    /// Creates a new storage path
    #[must_use]
    pub fn new(
        directory: impl Into<String>,
        filename: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            filename: filename.into(),
            extension: extension.into(),
        }
    }

    /// Returns `filename.extension`, or just the filename when there is no extension
    #[must_use]
    pub fn basename(&self) -> String {
        if self.extension.is_empty() {
            self.filename.clone()
        } else {
            format!("{}.{}", self.filename, self.extension)
        }
    }

    /// Returns the full disk-relative path
    #[must_use]
    pub fn path(&self) -> String {
        let basename = self.basename();
        if self.directory.is_empty() {
            basename
        } else {
            format!("{}/{basename}", self.directory)
        }
    }

    /// Returns a copy with a different filename
    #[must_use]
    pub fn with_filename(&self, filename: impl Into<String>) -> Self {
        Self {
            directory: self.directory.clone(),
            filename: filename.into(),
            extension: self.extension.clone(),
        }
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_filename_keeps_safe_names() {
        assert_eq!(sanitize_filename("bar"), "bar");
        assert_eq!(sanitize_filename("my file_v2"), "my file_v2");
        assert_eq!(sanitize_filename("photo.final"), "photo.final");
    }

    #[test]
    fn test_sanitize_filename_strips_traversal() {
        assert_eq!(sanitize_filename(".."), "");
        assert_eq!(sanitize_filename("..\\..\\boot"), "boot");
        assert_eq!(sanitize_filename("a/../b"), "a-.-b");
    }

    #[test]
    fn test_sanitize_directory() {
        assert_eq!(sanitize_directory("foo"), "foo");
        assert_eq!(sanitize_directory("./foo//bar/."), "foo/bar");
        assert_eq!(sanitize_directory("../../"), "");
        assert_eq!(sanitize_directory("foo/#tag"), "foo/tag");
    }

    #[test]
    fn test_storage_path() {
        let path = StoragePath::new("foo/bar", "baz", "txt");
        assert_eq!(path.path(), "foo/bar/baz.txt");
        assert_eq!(path.basename(), "baz.txt");
        assert_eq!(path.with_filename("baz-1").path(), "foo/bar/baz-1.txt");
        assert_eq!(path.to_string(), "foo/bar/baz.txt");
    }

    proptest! {
        #[test]
        fn sanitized_filenames_never_contain_separators(name in ".*") {
            let clean = sanitize_filename(&name);
            prop_assert!(!clean.contains('/'));
            prop_assert!(!clean.contains('\\'));
            prop_assert!(!clean.contains(".."));
        }

        #[test]
        fn sanitized_directories_never_escape(dir in "[a-z./\\\\]{0,24}") {
            let clean = sanitize_directory(&dir);
            prop_assert!(!clean.starts_with('/'));
            prop_assert!(clean.split('/').all(|segment| segment != ".." && segment != "."));
        }
    }
}
