//! upload-file: fluent file uploads with type inference and duplicate handling
//!
//! A [`FileUploader`](uploader::FileUploader) takes a file from any source
//! (local path, URL, in-memory content, async reader or an uploaded file),
//! validates it, works out its aggregate type (`image`, `pdf`, `video`, ...),
//! picks a collision-free name and writes it to a named disk.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use upload_file::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     upload_file::observability::init()?;
//!
//!     let uploader = FileUploader::from_config(UploadConfig::load()?)?;
//!
//!     let file = uploader
//!         .from_source("https://example.com/logo.png")
//!         .to_destination("public", "logos")
//!         .set_allowed_aggregate_types(["image", "image_vector"])
//!         .set_maximum_size(2 * 1024 * 1024)
//!         .on_duplicate_increment()
//!         .upload()
//!         .await?;
//!
//!     println!("{} -> {:?}", file.path, file.url);
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! [`UploadConfig::load`](config::UploadConfig::load) layers built-in
//! defaults, `upload_file.toml` and `UPLOAD_FILE_*` environment variables
//! (nested keys separated by `__`).

pub mod aggregate;
pub mod config;
pub mod duplicate;
pub mod error;
pub mod observability;
pub mod source;
pub mod storage;
pub mod uploader;
pub mod url;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! # Examples
    //!
    //! ```rust
    //! use upload_file::prelude::*;
    //! ```

    // Uploads
    pub use crate::uploader::{FileUploader, PendingUpload, ResolvedFile, UploadRequest};

    // Configuration
    pub use crate::config::{DiskConfig, UploadConfig};

    // Type inference
    pub use crate::aggregate::{AggregateTypeDefinition, TypePolicy, TypeRegistry, TYPE_OTHER};

    // Duplicates
    pub use crate::duplicate::DuplicatePolicy;

    // Sources
    pub use crate::source::{
        Source, SourceAdapter, SourceAdapterFactory, SourceInput, SourceKind, SourcePattern,
    };

    // Storage
    pub use crate::storage::{
        FileStorage, LocalFileStorage, StorageManager, UploadedFile, Visibility, WriteOptions,
    };

    // URLs
    pub use crate::url::{UrlGenerator, UrlGeneratorFactory};

    // Error types
    pub use crate::error::{UploadError, UploadResult};
}
