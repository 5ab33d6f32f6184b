//! Async reader source

use super::mime::{detect, extension_of, guess_extension, stem_of};
use super::{SourceAdapter, SourceError, SourceKind, SourceResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{Mutex, OnceCell};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// An async reader, read to the end on first use
///
/// MIME detection and hashing both need the whole content, so the reader is
/// drained into memory once and dropped right after. With a read limit set,
/// reading stops one byte past the limit, so an oversized stream reports
/// `limit + 1` bytes.
pub struct StreamSource {
    reader: Mutex<Option<BoxedReader>>,
    buffer: OnceCell<Bytes>,
    name: Option<String>,
    limit: Option<u64>,
}

impl StreamSource {
    /// Wraps a reader
    #[must_use]
    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            reader: Mutex::new(Some(Box::new(reader))),
            buffer: OnceCell::new(),
            name: None,
            limit: None,
        }
    }

    /// Caps how many bytes are read from the stream
    #[must_use]
    pub const fn with_read_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Attaches a natural filename (with extension) to the stream
    #[must_use]
    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    async fn buffered(&self) -> SourceResult<&Bytes> {
        self.buffer
            .get_or_try_init(|| async {
                let reader = self.reader.lock().await.take().ok_or(SourceError::Consumed)?;
                let mut reader = reader.take(self.limit.map_or(u64::MAX, |limit| limit.saturating_add(1)));
                let mut data = Vec::new();
                reader
                    .read_to_end(&mut data)
                    .await
                    .map_err(|source| SourceError::Io {
                        location: self.location(),
                        source,
                    })?;
                tracing::debug!(size = data.len(), "stream source buffered");
                Ok::<_, SourceError>(Bytes::from(data))
            })
            .await
    }
}

impl fmt::Debug for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSource")
            .field("name", &self.name)
            .field("buffered", &self.buffer.get().map(Bytes::len))
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SourceAdapter for StreamSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Stream
    }

    fn location(&self) -> String {
        self.name
            .as_ref()
            .map_or_else(|| "stream".to_string(), |name| format!("stream ({name})"))
    }

    fn filename(&self) -> Option<String> {
        self.name.as_deref().and_then(stem_of)
    }

    async fn is_valid(&self) -> bool {
        match self.buffered().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "stream source unreadable");
                false
            }
        }
    }

    async fn size(&self) -> SourceResult<u64> {
        Ok(self.buffered().await?.len() as u64)
    }

    async fn mime_type(&self) -> SourceResult<String> {
        Ok(detect(self.buffered().await?, self.name.as_deref()))
    }

    async fn extension(&self) -> SourceResult<String> {
        if let Some(ext) = self.name.as_deref().and_then(extension_of) {
            return Ok(ext);
        }
        Ok(guess_extension(&self.mime_type().await?))
    }

    async fn contents(&self) -> SourceResult<Bytes> {
        Ok(self.buffered().await?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_stream_is_buffered_once() {
        let source = StreamSource::new(Cursor::new(b"%PDF-1.5 body".to_vec()));

        assert!(source.is_valid().await);
        assert_eq!(source.size().await.unwrap(), 13);
        assert_eq!(source.mime_type().await.unwrap(), "application/pdf");
        assert_eq!(source.extension().await.unwrap(), "pdf");
        assert_eq!(&source.contents().await.unwrap()[..], b"%PDF-1.5 body");
        assert!(source.filename().is_none());
    }

    #[tokio::test]
    async fn test_stream_with_filename() {
        let source = StreamSource::new(Cursor::new(b"col\n1\n".to_vec())).with_filename("export.CSV");

        assert_eq!(source.filename().as_deref(), Some("export"));
        assert_eq!(source.extension().await.unwrap(), "csv");
        assert_eq!(source.mime_type().await.unwrap(), "text/csv");
        assert_eq!(source.location(), "stream (export.CSV)");
    }

    #[tokio::test]
    async fn test_read_limit_stops_early() {
        let source = StreamSource::new(Cursor::new(vec![7_u8; 4096])).with_read_limit(100);

        assert_eq!(source.size().await.unwrap(), 101);
        assert_eq!(source.contents().await.unwrap().len(), 101);
    }

    #[tokio::test]
    async fn test_failed_read_consumes_stream() {
        struct Broken;

        impl AsyncRead for Broken {
            fn poll_read(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                _buf: &mut tokio::io::ReadBuf<'_>,
            ) -> std::task::Poll<std::io::Result<()>> {
                std::task::Poll::Ready(Err(std::io::Error::other("boom")))
            }
        }

        let source = StreamSource::new(Broken);
        assert!(!source.is_valid().await);
        assert!(matches!(source.size().await.unwrap_err(), SourceError::Consumed));
    }
}
