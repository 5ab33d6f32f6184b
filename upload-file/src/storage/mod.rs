//! File storage abstraction and implementations
//!
//! The [`FileStorage`] trait is the only thing the uploader knows about a
//! backend: existence checks, writes (buffered or streamed), deletes and
//! reads, all addressed by disk-relative paths. Backends are mounted under a
//! name in a [`StorageManager`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use upload_file::storage::{FileStorage, LocalFileStorage, WriteOptions, Visibility};
//! use bytes::Bytes;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let storage = LocalFileStorage::new("/var/uploads")?;
//!
//! let options = WriteOptions::new().visibility(Visibility::Public);
//! storage.write("avatars/me.png", Bytes::from_static(b"..."), &options).await?;
//!
//! let data = storage.read("avatars/me.png").await?;
//! storage.delete("avatars/me.png").await?;
//! # Ok(())
//! # }
//! ```

mod local;
mod manager;
mod path;
mod traits;
mod types;

pub use local::LocalFileStorage;
pub use manager::{Disk, StorageManager, LOCAL_DRIVER};
pub use path::{sanitize_directory, sanitize_filename, StoragePath};
pub use traits::FileStorage;
#[cfg(test)]
pub use traits::MockFileStorage;
pub use types::{StorageError, StorageResult, UploadedFile, Visibility, WriteOptions};
