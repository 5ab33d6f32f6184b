//! Error types and error handling
//!
//! Every failure of an upload is terminal for the current call. None of them
//! indicate corrupted internal state; callers may retry with different input.

use crate::source::SourceError;
use crate::storage::StorageError;
use crate::url::UrlError;
use thiserror::Error;

/// Upload error type
#[derive(Debug, Error)]
pub enum UploadError {
    /// Bad or missing configuration (unknown disk, no source, invalid pattern)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The disk exists but is not in the `allowed_disks` list
    #[error("The disk `{disk}` is not in the allowed disks for uploads")]
    DiskNotAllowed {
        /// Disk name
        disk: String,
    },

    /// The source does not exist or is unreachable
    #[error("Source `{location}` does not exist or is not readable")]
    SourceInvalid {
        /// Human readable location of the source (path, URL, kind)
        location: String,
    },

    /// The source adapter failed while reading
    #[error(transparent)]
    Source(#[from] SourceError),

    /// File is larger than the configured maximum
    #[error("File is too big ({size} bytes). Maximum upload size is {max} bytes")]
    FileTooLarge {
        /// Reported size of the source
        size: u64,
        /// Configured maximum
        max: u64,
    },

    /// MIME type is not in the allow-list
    #[error("File with mime type `{mime_type}` is not allowed. Allowed: {allowed:?}")]
    MimeRestricted {
        /// Offending MIME type
        mime_type: String,
        /// Configured allow-list
        allowed: Vec<String>,
    },

    /// Extension is not in the allow-list
    #[error("File with extension `{extension}` is not allowed. Allowed: {allowed:?}")]
    ExtensionRestricted {
        /// Offending extension
        extension: String,
        /// Configured allow-list
        allowed: Vec<String>,
    },

    /// Neither the MIME type nor the extension match a registered aggregate type
    #[error("File with mime type `{mime_type}` and extension `{extension}` is not recognized")]
    UnrecognizedType {
        /// MIME type of the source
        mime_type: String,
        /// Extension of the source
        extension: String,
    },

    /// MIME type and extension do not agree on an aggregate type
    #[error("File with mime type `{mime_type}` and extension `{extension}` do not match the same aggregate type")]
    StrictTypeMismatch {
        /// MIME type of the source
        mime_type: String,
        /// Extension of the source
        extension: String,
    },

    /// The inferred aggregate type is not in the allow-list
    #[error("File of aggregate type `{aggregate_type}` is not allowed. Allowed: {allowed:?}")]
    AggregateTypeRestricted {
        /// Inferred aggregate type
        aggregate_type: String,
        /// Configured allow-list
        allowed: Vec<String>,
    },

    /// A file already exists at the destination and the policy forbids duplicates
    #[error("A file already exists at `{path}`")]
    FileExists {
        /// Conflicting storage path
        path: String,
    },

    /// No free name was found for an incremented duplicate
    #[error("Could not find a free filename for `{path}` after {attempts} attempts")]
    DuplicateResolutionFailed {
        /// Original candidate path
        path: String,
        /// Number of candidates tried
        attempts: usize,
    },

    /// The storage backend rejected the write
    #[error("Failed to write `{path}`: {source}")]
    WriteFailed {
        /// Destination path
        path: String,
        /// Backend error
        #[source]
        source: StorageError,
    },

    /// Any other storage backend failure (existence checks, deletes)
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// URL generation failed
    #[error(transparent)]
    UrlGenerationFailed(#[from] UrlError),
}

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

impl UploadError {
    /// Creates a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns true if this error was raised before anything was written
    ///
    /// # Examples
    ///
    /// ```rust
    /// use upload_file::error::UploadError;
    ///
    /// let err = UploadError::FileTooLarge { size: 10, max: 5 };
    /// assert!(err.is_validation());
    /// ```
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::SourceInvalid { .. }
                | Self::FileTooLarge { .. }
                | Self::MimeRestricted { .. }
                | Self::ExtensionRestricted { .. }
                | Self::UnrecognizedType { .. }
                | Self::StrictTypeMismatch { .. }
                | Self::AggregateTypeRestricted { .. }
        )
    }
}
