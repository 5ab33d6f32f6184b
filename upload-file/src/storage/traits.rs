//! File storage trait definitions

use super::types::{StorageResult, WriteOptions};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncRead;

/// Abstraction for a storage backend ("disk")
///
/// Paths are relative to the disk root and always use `/` as separator.
/// Implementations decide how a path maps to a file, object key or blob.
///
/// The uploader never holds a lock between [`exists`](FileStorage::exists)
/// and [`write`](FileStorage::write); callers needing exclusive paths must
/// serialize uploads themselves.
///
/// # Examples
///
/// ```rust,no_run
/// use upload_file::storage::{FileStorage, LocalFileStorage, WriteOptions};
/// use bytes::Bytes;
///
/// # async fn example() -> anyhow::Result<()> {
/// let storage = LocalFileStorage::new("/var/uploads")?;
///
/// storage.write("avatars/me.png", Bytes::from_static(b"..."), &WriteOptions::new()).await?;
/// assert!(storage.exists("avatars/me.png").await?);
///
/// storage.delete("avatars/me.png").await?;
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Checks if a file exists at `path`
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Writes a buffer to `path`, replacing any existing file
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the backend rejects the write
    async fn write(&self, path: &str, data: Bytes, options: &WriteOptions) -> StorageResult<u64>;

    /// Streams a reader to `path`, replacing any existing file
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid, reading fails, or the backend
    /// rejects the write
    async fn write_stream(
        &self,
        path: &str,
        reader: Box<dyn AsyncRead + Send + Unpin>,
        options: &WriteOptions,
    ) -> StorageResult<u64>;

    /// Deletes the file at `path`
    ///
    /// This operation is idempotent - deleting a non-existent file is not an error.
    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Reads the whole file at `path`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if nothing is stored at `path`
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>>;
}
