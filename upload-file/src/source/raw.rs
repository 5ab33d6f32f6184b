//! In-memory sources

use super::mime::{declared_mime, detect, guess_extension, sniff};
use super::{SourceAdapter, SourceKind, SourceResult};
use crate::storage::UploadedFile;
use async_trait::async_trait;
use bytes::Bytes;

/// Raw bytes with no name of their own
///
/// The MIME type is detected from the content, and the extension guessed
/// from the MIME type.
#[derive(Debug, Clone)]
pub struct RawContentSource {
    data: Bytes,
}

impl RawContentSource {
    /// Wraps a buffer
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl SourceAdapter for RawContentSource {
    fn kind(&self) -> SourceKind {
        SourceKind::RawContent
    }

    fn location(&self) -> String {
        format!("raw content ({} bytes)", self.data.len())
    }

    fn filename(&self) -> Option<String> {
        None
    }

    async fn is_valid(&self) -> bool {
        true
    }

    async fn size(&self) -> SourceResult<u64> {
        Ok(self.data.len() as u64)
    }

    async fn mime_type(&self) -> SourceResult<String> {
        Ok(detect(&self.data, None))
    }

    async fn extension(&self) -> SourceResult<String> {
        Ok(guess_extension(&detect(&self.data, None)))
    }

    async fn contents(&self) -> SourceResult<Bytes> {
        Ok(self.data.clone())
    }
}

/// A file already received by the application
///
/// The declared content type is only used when the content itself has no
/// recognizable signature.
#[derive(Debug, Clone)]
pub struct UploadedFileSource {
    name: UploadedFile,
    data: Bytes,
}

impl UploadedFileSource {
    /// Wraps an uploaded file, taking over its buffer
    #[must_use]
    pub fn new(mut file: UploadedFile) -> Self {
        let data = Bytes::from(std::mem::take(&mut file.data));
        Self { name: file, data }
    }

    /// Original filename as received
    #[must_use]
    pub fn original_filename(&self) -> &str {
        &self.name.filename
    }

    fn detected_mime(&self) -> String {
        sniff(&self.data).map_or_else(
            || {
                declared_mime(&self.name.content_type)
                    .unwrap_or_else(|| detect(&self.data, Some(&self.name.filename)))
            },
            ToString::to_string,
        )
    }
}

#[async_trait]
impl SourceAdapter for UploadedFileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::UploadedFile
    }

    fn location(&self) -> String {
        self.name.filename.clone()
    }

    fn filename(&self) -> Option<String> {
        Some(self.name.stem().to_string()).filter(|stem| !stem.is_empty())
    }

    async fn is_valid(&self) -> bool {
        true
    }

    async fn size(&self) -> SourceResult<u64> {
        Ok(self.data.len() as u64)
    }

    async fn mime_type(&self) -> SourceResult<String> {
        Ok(self.detected_mime())
    }

    async fn extension(&self) -> SourceResult<String> {
        Ok(self
            .name
            .extension()
            .map_or_else(|| guess_extension(&self.detected_mime()), str::to_lowercase))
    }

    async fn contents(&self) -> SourceResult<Bytes> {
        Ok(self.data.clone())
    }
}
