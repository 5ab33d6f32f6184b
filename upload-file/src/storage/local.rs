//! Local filesystem storage implementation

use super::traits::FileStorage;
use super::types::{StorageError, StorageResult, Visibility, WriteOptions};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// Local filesystem storage backend
///
/// Maps disk-relative paths directly under a root directory:
///
/// ```text
/// /var/uploads/            <- root
/// ├── avatars/
/// │   ├── me.png           <- "avatars/me.png"
/// │   └── me-1.png
/// └── reports/
///     └── q3.pdf
/// ```
///
/// # Examples
///
/// ```rust,no_run
/// use upload_file::storage::{FileStorage, LocalFileStorage, WriteOptions};
/// use bytes::Bytes;
///
/// # async fn example() -> anyhow::Result<()> {
/// let storage = LocalFileStorage::new("/var/uploads")?;
/// let written = storage
///     .write("reports/q3.pdf", Bytes::from_static(b"%PDF-1.4"), &WriteOptions::new())
///     .await?;
/// assert_eq!(written, 8);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    /// Base directory for file storage
    root: PathBuf,
}

impl LocalFileStorage {
    /// Creates a new local file storage instance
    ///
    /// The root directory is created lazily on the first write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` if the root exists but is not a directory
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        // Synchronous check is fine during initialization
        if root.exists() && !root.is_dir() {
            return Err(StorageError::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        Ok(Self { root })
    }

    /// Returns the root directory of this disk
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a disk-relative path to a filesystem path
    ///
    /// Rejects absolute paths and `..` components.
    fn resolve(&self, path: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(path);
        if path.is_empty() {
            return Err(StorageError::InvalidPath("empty path".to_string()));
        }
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StorageError::InvalidPath(path.to_string()));
                }
            }
        }
        Ok(self.root.join(relative))
    }

    /// Creates the parent directory of `path` and opens it for writing
    ///
    /// New files are created with the requested mode, and an existing file
    /// gets its permissions changed before any data is written.
    async fn create(path: &Path, visibility: Option<Visibility>) -> StorageResult<fs::File> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        if let Some(visibility) = visibility {
            set_create_mode(&mut options, visibility);
        }
        let file = options.open(path).await?;

        if let Some(visibility) = visibility {
            apply_visibility(path, visibility).await?;
        }
        Ok(file)
    }
}

#[cfg(unix)]
const fn unix_mode(visibility: Visibility) -> u32 {
    match visibility {
        Visibility::Public => 0o644,
        Visibility::Private => 0o600,
    }
}

#[cfg(unix)]
fn set_create_mode(options: &mut fs::OpenOptions, visibility: Visibility) {
    options.mode(unix_mode(visibility));
}

#[cfg(not(unix))]
const fn set_create_mode(_options: &mut fs::OpenOptions, _visibility: Visibility) {}

#[cfg(unix)]
async fn apply_visibility(path: &Path, visibility: Visibility) -> StorageResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(unix_mode(visibility))).await?;
    Ok(())
}

#[cfg(not(unix))]
#[allow(clippy::unused_async)]
async fn apply_visibility(_path: &Path, _visibility: Visibility) -> StorageResult<()> {
    Ok(())
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let full = self.resolve(path)?;
        Ok(fs::try_exists(&full).await?)
    }

    async fn write(&self, path: &str, data: Bytes, options: &WriteOptions) -> StorageResult<u64> {
        let full = self.resolve(path)?;
        let mut file = Self::create(&full, options.visibility).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        tracing::debug!(path = %path, file = %full.display(), size = data.len(), "file written");
        Ok(data.len() as u64)
    }

    async fn write_stream(
        &self,
        path: &str,
        mut reader: Box<dyn AsyncRead + Send + Unpin>,
        options: &WriteOptions,
    ) -> StorageResult<u64> {
        let full = self.resolve(path)?;
        let mut file = Self::create(&full, options.visibility).await?;
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;

        tracing::debug!(path = %path, file = %full.display(), size = written, "file streamed");
        Ok(written)
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => {
                tracing::debug!(path = %path, "file deleted");
                Ok(())
            }
            // Idempotent - don't error if the file doesn't exist
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let full = self.resolve(path)?;
        match fs::read(&full).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
