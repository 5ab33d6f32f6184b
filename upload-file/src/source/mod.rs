//! Upload sources
//!
//! A source is anything an upload can read from: a local path, a remote URL,
//! an in-memory buffer, an async reader or an [`UploadedFile`]. Each kind is
//! wrapped in an adapter implementing [`SourceAdapter`], and the
//! [`SourceAdapterFactory`] picks the adapter for a given input.
//!
//! # Examples
//!
//! ```rust,no_run
//! use upload_file::source::{SourceAdapterFactory, SourceInput, SourceKind};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let factory = SourceAdapterFactory::new();
//! let source = factory.create(SourceInput::from("/tmp/photo.png"))?;
//! assert_eq!(source.adapter().kind(), SourceKind::LocalPath);
//!
//! let mime = source.adapter().mime_type().await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`UploadedFile`]: crate::storage::UploadedFile

mod factory;
mod local;
pub mod mime;
mod raw;
mod remote;
mod stream;

pub use factory::{default_patterns, SourceAdapterFactory, SourceInput, SourcePattern};
pub use local::LocalPathSource;
pub use raw::{RawContentSource, UploadedFileSource};
pub use remote::RemoteUrlSource;
pub use stream::StreamSource;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Errors raised by source adapters
#[derive(Debug, Error)]
pub enum SourceError {
    /// No adapter accepts the input
    #[error("No source adapter recognizes `{0}`")]
    Unrecognized(String),

    /// Reading a local file failed
    #[error("Failed to read `{location}`: {source}")]
    Io {
        /// Path or description of the source
        location: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Fetching a remote URL failed
    #[error("Failed to fetch `{url}`: {source}")]
    Http {
        /// Requested URL
        url: String,
        /// Underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// A one-shot stream was already consumed by a failed read
    #[error("Stream source was already consumed")]
    Consumed,

    /// A configured source pattern is not a valid regular expression
    #[error("Invalid source pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Regex compilation error
        #[source]
        source: regex::Error,
    },
}

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// The kind of adapter wrapping a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// File on the local filesystem
    LocalPath,
    /// HTTP(S) URL
    RemoteUrl,
    /// In-memory bytes
    RawContent,
    /// Async reader
    Stream,
    /// File already received by the application
    UploadedFile,
}

impl SourceKind {
    /// Returns the snake case name used in configuration files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LocalPath => "local_path",
            Self::RemoteUrl => "remote_url",
            Self::RawContent => "raw_content",
            Self::Stream => "stream",
            Self::UploadedFile => "uploaded_file",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body handed to a storage backend
pub enum SourceBody {
    /// Whole file in memory
    Bytes(Bytes),
    /// Readable stream
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl fmt::Debug for SourceBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Reader(_) => f.debug_tuple("Reader").finish_non_exhaustive(),
        }
    }
}

/// Uniform view over an upload source
///
/// Adapters may cache what they learn (a remote response, a buffered
/// stream), so repeated calls are cheap.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Adapter kind
    fn kind(&self) -> SourceKind;

    /// Human readable location, used in errors and logs
    fn location(&self) -> String;

    /// Filesystem path of the source, when it has one
    fn path(&self) -> Option<&Path> {
        None
    }

    /// Natural filename without extension, when the source has one
    fn filename(&self) -> Option<String>;

    /// Whether the source exists and can be read
    async fn is_valid(&self) -> bool;

    /// Size in bytes
    async fn size(&self) -> SourceResult<u64>;

    /// Lower-case MIME type
    async fn mime_type(&self) -> SourceResult<String>;

    /// Lower-case extension without leading dot (may be empty)
    async fn extension(&self) -> SourceResult<String>;

    /// Full contents
    async fn contents(&self) -> SourceResult<Bytes>;

    /// Body to hand to the storage backend
    async fn open(&self) -> SourceResult<SourceBody> {
        Ok(SourceBody::Bytes(self.contents().await?))
    }

    /// Hex encoded SHA-256 of the contents
    ///
    /// Sources with a filesystem path are hashed while streaming from disk.
    async fn content_hash(&self) -> SourceResult<String> {
        let mut hasher = Sha256::new();
        if let Some(path) = self.path() {
            let io_error = |source| SourceError::Io {
                location: path.display().to_string(),
                source,
            };
            let mut file = tokio::fs::File::open(path).await.map_err(io_error)?;
            let mut chunk = vec![0_u8; 64 * 1024];
            loop {
                let read = file.read(&mut chunk).await.map_err(io_error)?;
                if read == 0 {
                    break;
                }
                hasher.update(&chunk[..read]);
            }
        } else {
            hasher.update(self.contents().await?);
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

/// An upload source: one of the built-in adapters
#[derive(Debug)]
pub enum Source {
    /// Local filesystem path
    LocalPath(LocalPathSource),
    /// HTTP(S) URL
    RemoteUrl(RemoteUrlSource),
    /// In-memory bytes
    RawContent(RawContentSource),
    /// Async reader
    Stream(StreamSource),
    /// File already received by the application
    UploadedFile(UploadedFileSource),
}

impl Source {
    /// The adapter behind this source
    #[must_use]
    pub fn adapter(&self) -> &dyn SourceAdapter {
        match self {
            Self::LocalPath(s) => s,
            Self::RemoteUrl(s) => s,
            Self::RawContent(s) => s,
            Self::Stream(s) => s,
            Self::UploadedFile(s) => s,
        }
    }

    /// Caps how much of a stream or remote body gets buffered
    ///
    /// Sources that are not read into memory ignore the limit, as does a
    /// limit of `0`.
    #[must_use]
    pub fn with_read_limit(self, limit: u64) -> Self {
        if limit == 0 {
            return self;
        }
        match self {
            Self::RemoteUrl(s) => Self::RemoteUrl(s.with_read_limit(limit)),
            Self::Stream(s) => Self::Stream(s.with_read_limit(limit)),
            other => other,
        }
    }
}

impl From<LocalPathSource> for Source {
    fn from(source: LocalPathSource) -> Self {
        Self::LocalPath(source)
    }
}

impl From<RemoteUrlSource> for Source {
    fn from(source: RemoteUrlSource) -> Self {
        Self::RemoteUrl(source)
    }
}

impl From<RawContentSource> for Source {
    fn from(source: RawContentSource) -> Self {
        Self::RawContent(source)
    }
}

impl From<StreamSource> for Source {
    fn from(source: StreamSource) -> Self {
        Self::Stream(source)
    }
}

impl From<UploadedFileSource> for Source {
    fn from(source: UploadedFileSource) -> Self {
        Self::UploadedFile(source)
    }
}
