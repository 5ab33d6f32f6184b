//! Local filesystem source

use super::mime::{detect, extension_of, guess_extension, stem_of, SNIFF_LEN};
use super::{SourceAdapter, SourceBody, SourceError, SourceKind, SourceResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// A file on the local filesystem
///
/// The file is streamed to storage rather than loaded into memory.
#[derive(Debug, Clone)]
pub struct LocalPathSource {
    path: PathBuf,
}

impl LocalPathSource {
    /// Wraps a filesystem path
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> SourceError {
        SourceError::Io {
            location: self.location(),
            source,
        }
    }

    /// Reads at most [`SNIFF_LEN`] leading bytes
    async fn head(&self) -> SourceResult<Vec<u8>> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        let mut head = Vec::with_capacity(SNIFF_LEN);
        file.take(SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(head)
    }
}

#[async_trait]
impl SourceAdapter for LocalPathSource {
    fn kind(&self) -> SourceKind {
        SourceKind::LocalPath
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn filename(&self) -> Option<String> {
        self.path.to_str().and_then(stem_of)
    }

    async fn is_valid(&self) -> bool {
        tokio::fs::metadata(&self.path)
            .await
            .is_ok_and(|meta| meta.is_file())
    }

    async fn size(&self) -> SourceResult<u64> {
        let meta = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(meta.len())
    }

    async fn mime_type(&self) -> SourceResult<String> {
        let head = self.head().await?;
        Ok(detect(&head, self.path.to_str()))
    }

    async fn extension(&self) -> SourceResult<String> {
        if let Some(ext) = self.path.to_str().and_then(extension_of) {
            return Ok(ext);
        }
        Ok(guess_extension(&self.mime_type().await?))
    }

    async fn contents(&self) -> SourceResult<Bytes> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(Bytes::from(data))
    }

    async fn open(&self) -> SourceResult<SourceBody> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(SourceBody::Reader(Box::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_metadata() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Report.PDF");
        std::fs::write(&path, b"%PDF-1.4\nrest of document").unwrap();

        let source = LocalPathSource::new(&path);
        assert!(source.is_valid().await);
        assert_eq!(source.size().await.unwrap(), 25);
        assert_eq!(source.mime_type().await.unwrap(), "application/pdf");
        assert_eq!(source.extension().await.unwrap(), "pdf");
        assert_eq!(source.filename().as_deref(), Some("Report"));
        assert_eq!(source.path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_extension_guessed_from_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("no_extension");
        std::fs::write(&path, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]).unwrap();

        let source = LocalPathSource::new(&path);
        assert_eq!(source.extension().await.unwrap(), "png");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let source = LocalPathSource::new(temp.path().join("missing.txt"));

        assert!(!source.is_valid().await);
        assert!(matches!(source.size().await.unwrap_err(), SourceError::Io { .. }));
    }

    #[tokio::test]
    async fn test_directory_is_not_valid() {
        let temp = TempDir::new().unwrap();
        assert!(!LocalPathSource::new(temp.path()).is_valid().await);
    }

    #[tokio::test]
    async fn test_open_streams_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.txt");
        std::fs::write(&path, b"streamed").unwrap();

        let SourceBody::Reader(mut reader) = LocalPathSource::new(&path).open().await.unwrap() else {
            panic!("expected a reader");
        };
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"streamed");
    }
}
