//! Remote URL source

use super::mime::{declared_mime, detect, extension_of, guess_extension, stem_of};
use super::{SourceAdapter, SourceBody, SourceError, SourceKind, SourceResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::TryStreamExt;
use reqwest::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Response, StatusCode, Url};
use tokio::sync::{Mutex, OnceCell};
use tokio_util::io::StreamReader;

/// Response headers, read once per source
#[derive(Debug)]
struct RemoteHead {
    status: StatusCode,
    content_type: Option<String>,
    content_length: Option<u64>,
}

/// A file served over HTTP(S)
///
/// The URL is requested once, on first use. Status, size and MIME type come
/// from the response headers; the body is only read when the contents are
/// needed or the file is written. Only a `2xx` response makes the source
/// valid.
///
/// A body without `Content-Length` is buffered to measure it. With a read
/// limit set, buffering stops one byte past the limit, so an oversized body
/// reports `limit + 1` bytes.
#[derive(Debug)]
pub struct RemoteUrlSource {
    url: String,
    client: reqwest::Client,
    limit: Option<u64>,
    head: OnceCell<RemoteHead>,
    response: Mutex<Option<Response>>,
    body: OnceCell<Bytes>,
}

impl RemoteUrlSource {
    /// Creates a source fetching `url` with a default client
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    /// Creates a source fetching `url` with the given client
    #[must_use]
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
            limit: None,
            head: OnceCell::new(),
            response: Mutex::new(None),
            body: OnceCell::new(),
        }
    }

    /// Caps how many body bytes are buffered
    #[must_use]
    pub const fn with_read_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The requested URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Last path segment of the URL
    fn url_basename(&self) -> Option<String> {
        let parsed = Url::parse(&self.url).ok()?;
        parsed
            .path_segments()?
            .next_back()
            .filter(|segment| !segment.is_empty())
            .map(ToString::to_string)
    }

    fn http_error(&self, source: reqwest::Error) -> SourceError {
        SourceError::Http {
            url: self.url.clone(),
            source,
        }
    }

    async fn head(&self) -> SourceResult<&RemoteHead> {
        self.head.get_or_try_init(|| self.send()).await
    }

    /// Sends the request and keeps the response for reading the body later
    async fn send(&self) -> SourceResult<RemoteHead> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.http_error(e))?;

        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(ToString::to_string)
        };
        let head = RemoteHead {
            status: response.status(),
            content_type: header(CONTENT_TYPE),
            content_length: header(CONTENT_LENGTH).and_then(|len| len.trim().parse().ok()),
        };

        tracing::debug!(
            url = %self.url,
            status = head.status.as_u16(),
            content_length = ?head.content_length,
            "remote source requested"
        );

        *self.response.lock().await = Some(response);
        Ok(head)
    }

    async fn body(&self) -> SourceResult<&Bytes> {
        self.body
            .get_or_try_init(|| async {
                self.head().await?;
                let mut response = self.response.lock().await.take().ok_or(SourceError::Consumed)?;

                let mut data = Vec::new();
                while let Some(chunk) = response.chunk().await.map_err(|e| self.http_error(e))? {
                    data.extend_from_slice(&chunk);
                    if let Some(limit) = self.limit {
                        let cap = usize::try_from(limit.saturating_add(1)).unwrap_or(usize::MAX);
                        if data.len() >= cap {
                            data.truncate(cap);
                            tracing::debug!(url = %self.url, limit, "remote body exceeds read limit");
                            break;
                        }
                    }
                }

                tracing::debug!(url = %self.url, size = data.len(), "remote body buffered");
                Ok::<_, SourceError>(Bytes::from(data))
            })
            .await
    }
}

#[async_trait]
impl SourceAdapter for RemoteUrlSource {
    fn kind(&self) -> SourceKind {
        SourceKind::RemoteUrl
    }

    fn location(&self) -> String {
        self.url.clone()
    }

    fn filename(&self) -> Option<String> {
        self.url_basename().as_deref().and_then(stem_of)
    }

    async fn is_valid(&self) -> bool {
        match self.head().await {
            Ok(head) => head.status.is_success(),
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "remote source unreachable");
                false
            }
        }
    }

    async fn size(&self) -> SourceResult<u64> {
        if let Some(len) = self.head().await?.content_length {
            return Ok(len);
        }
        Ok(self.body().await?.len() as u64)
    }

    async fn mime_type(&self) -> SourceResult<String> {
        let declared = self.head().await?.content_type.as_deref().and_then(declared_mime);
        if let Some(mime) = declared {
            return Ok(mime);
        }
        Ok(detect(self.body().await?, self.url_basename().as_deref()))
    }

    async fn extension(&self) -> SourceResult<String> {
        if let Some(ext) = self.url_basename().as_deref().and_then(extension_of) {
            return Ok(ext);
        }
        Ok(guess_extension(&self.mime_type().await?))
    }

    async fn contents(&self) -> SourceResult<Bytes> {
        Ok(self.body().await?.clone())
    }

    /// Streams the body unless it was already buffered
    async fn open(&self) -> SourceResult<SourceBody> {
        if let Some(body) = self.body.get() {
            return Ok(SourceBody::Bytes(body.clone()));
        }
        self.head().await?;
        let response = self.response.lock().await.take().ok_or(SourceError::Consumed)?;
        let stream = response.bytes_stream().map_err(std::io::Error::other);
        Ok(SourceBody::Reader(Box::new(StreamReader::new(Box::pin(stream)))))
    }
}
