//! Picking an adapter for an input

use super::{
    LocalPathSource, RawContentSource, RemoteUrlSource, Source, SourceError, SourceKind,
    SourceResult, StreamSource, UploadedFileSource,
};
use crate::storage::UploadedFile;
use bytes::Bytes;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncRead;

/// Maps strings matching `pattern` to an adapter kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePattern {
    /// Regular expression tested against string inputs
    pub pattern: String,
    /// Adapter used on a match
    pub adapter: SourceKind,
}

impl SourcePattern {
    /// Creates a pattern mapping
    #[must_use]
    pub fn new(pattern: impl Into<String>, adapter: SourceKind) -> Self {
        Self {
            pattern: pattern.into(),
            adapter,
        }
    }
}

/// Built-in string patterns: URLs, Unix paths and Windows paths
#[must_use]
pub fn default_patterns() -> Vec<SourcePattern> {
    vec![
        SourcePattern::new("^https?://", SourceKind::RemoteUrl),
        SourcePattern::new("^/", SourceKind::LocalPath),
        SourcePattern::new(r"^[a-zA-Z]:\\", SourceKind::LocalPath),
    ]
}

/// Anything an upload can be created from
pub enum SourceInput {
    /// A string matched against the configured patterns (URL or path)
    Text(String),
    /// An explicit filesystem path, relative or absolute
    Path(PathBuf),
    /// In-memory bytes
    Raw(Bytes),
    /// An async reader
    Reader(Box<dyn AsyncRead + Send + Unpin>),
    /// A file already received by the application
    Uploaded(UploadedFile),
    /// A ready-made source
    Adapter(Source),
}

impl SourceInput {
    /// Wraps an async reader
    #[must_use]
    pub fn reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::Reader(Box::new(reader))
    }
}

impl fmt::Debug for SourceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Raw(bytes) => f.debug_tuple("Raw").field(&bytes.len()).finish(),
            Self::Reader(_) => f.debug_tuple("Reader").finish_non_exhaustive(),
            Self::Uploaded(file) => f.debug_tuple("Uploaded").field(&file.filename).finish(),
            Self::Adapter(source) => f.debug_tuple("Adapter").field(source).finish(),
        }
    }
}

impl From<&str> for SourceInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for SourceInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<PathBuf> for SourceInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for SourceInput {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Bytes> for SourceInput {
    fn from(bytes: Bytes) -> Self {
        Self::Raw(bytes)
    }
}

impl From<Vec<u8>> for SourceInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Raw(Bytes::from(bytes))
    }
}

impl From<UploadedFile> for SourceInput {
    fn from(file: UploadedFile) -> Self {
        Self::Uploaded(file)
    }
}

impl From<Source> for SourceInput {
    fn from(source: Source) -> Self {
        Self::Adapter(source)
    }
}

impl From<StreamSource> for SourceInput {
    fn from(source: StreamSource) -> Self {
        Self::Adapter(Source::Stream(source))
    }
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    regex: Regex,
    adapter: SourceKind,
}

impl CompiledPattern {
    fn compile(pattern: &SourcePattern) -> SourceResult<Self> {
        let regex = Regex::new(&pattern.pattern).map_err(|source| SourceError::InvalidPattern {
            pattern: pattern.pattern.clone(),
            source,
        })?;
        Ok(Self {
            regex,
            adapter: pattern.adapter,
        })
    }
}

/// Creates adapters from inputs
///
/// Typed inputs map directly to their adapter. Strings are tested against
/// the patterns in order and the first match decides.
///
/// # Examples
///
/// ```rust
/// use upload_file::source::{SourceAdapterFactory, SourceKind};
///
/// let factory = SourceAdapterFactory::new();
/// assert_eq!(factory.kind_for("https://example.com/a.png"), Some(SourceKind::RemoteUrl));
/// assert_eq!(factory.kind_for("/tmp/a.png"), Some(SourceKind::LocalPath));
/// assert_eq!(factory.kind_for("C:\\files\\a.png"), Some(SourceKind::LocalPath));
/// assert_eq!(factory.kind_for("a.png"), None);
/// ```
#[derive(Debug, Clone)]
pub struct SourceAdapterFactory {
    patterns: Vec<CompiledPattern>,
    client: reqwest::Client,
}

impl Default for SourceAdapterFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceAdapterFactory {
    /// Factory using [`default_patterns`]
    #[must_use]
    pub fn new() -> Self {
        // Built-in patterns always compile
        let patterns = default_patterns()
            .into_iter()
            .filter_map(|p| CompiledPattern::compile(&p).ok())
            .collect();
        Self {
            patterns,
            client: reqwest::Client::new(),
        }
    }

    /// Factory using the given patterns, in order
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidPattern`] if a pattern does not compile
    pub fn from_patterns(patterns: impl IntoIterator<Item = SourcePattern>) -> SourceResult<Self> {
        let patterns = patterns
            .into_iter()
            .map(|p| CompiledPattern::compile(&p))
            .collect::<SourceResult<Vec<_>>>()?;
        Ok(Self {
            patterns,
            client: reqwest::Client::new(),
        })
    }

    /// Uses `client` for remote URL sources
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Routes strings matching `pattern` to `adapter`
    ///
    /// An existing mapping for the same pattern is replaced in place; new
    /// mappings are tried after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidPattern`] if the pattern does not compile
    pub fn set_adapter_for_pattern(
        &mut self,
        pattern: impl Into<String>,
        adapter: SourceKind,
    ) -> SourceResult<&mut Self> {
        let compiled = CompiledPattern::compile(&SourcePattern::new(pattern, adapter))?;
        if let Some(existing) = self
            .patterns
            .iter_mut()
            .find(|p| p.regex.as_str() == compiled.regex.as_str())
        {
            *existing = compiled;
        } else {
            self.patterns.push(compiled);
        }
        Ok(self)
    }

    /// Adapter kind for a string input, if any pattern matches
    #[must_use]
    pub fn kind_for(&self, input: &str) -> Option<SourceKind> {
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(input))
            .map(|p| p.adapter)
    }

    /// Wraps an input in its adapter
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unrecognized`] for strings matching no pattern,
    /// or matching a pattern mapped to an adapter that cannot take a string
    pub fn create(&self, input: impl Into<SourceInput>) -> SourceResult<Source> {
        let source = match input.into() {
            SourceInput::Text(text) => match self.kind_for(&text) {
                Some(SourceKind::RemoteUrl) => {
                    RemoteUrlSource::with_client(text, self.client.clone()).into()
                }
                Some(SourceKind::LocalPath) => LocalPathSource::new(text).into(),
                Some(SourceKind::RawContent) => RawContentSource::new(text).into(),
                Some(SourceKind::Stream | SourceKind::UploadedFile) | None => {
                    return Err(SourceError::Unrecognized(text));
                }
            },
            SourceInput::Path(path) => LocalPathSource::new(path).into(),
            SourceInput::Raw(bytes) => RawContentSource::new(bytes).into(),
            SourceInput::Reader(reader) => StreamSource::new(reader).into(),
            SourceInput::Uploaded(file) => UploadedFileSource::new(file).into(),
            SourceInput::Adapter(source) => source,
        };

        tracing::debug!(
            kind = %source.adapter().kind(),
            location = %source.adapter().location(),
            "source adapter selected"
        );
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_string_patterns() {
        let factory = SourceAdapterFactory::new();

        let url = factory.create("http://example.com/a.png").unwrap();
        assert_eq!(url.adapter().kind(), SourceKind::RemoteUrl);

        let path = factory.create("/var/data/a.png").unwrap();
        assert_eq!(path.adapter().kind(), SourceKind::LocalPath);

        let windows = factory.create("D:\\data\\a.png").unwrap();
        assert_eq!(windows.adapter().kind(), SourceKind::LocalPath);
    }

    #[test]
    fn test_unrecognized_string() {
        let factory = SourceAdapterFactory::new();
        let err = factory.create("relative/a.png").unwrap_err();
        assert!(matches!(err, SourceError::Unrecognized(ref s) if s == "relative/a.png"));
    }

    #[test]
    fn test_typed_inputs() {
        let factory = SourceAdapterFactory::new();

        let cases: Vec<(SourceInput, SourceKind)> = vec![
            (PathBuf::from("relative/a.png").into(), SourceKind::LocalPath),
            (b"bytes".to_vec().into(), SourceKind::RawContent),
            (SourceInput::reader(Cursor::new(vec![1, 2, 3])), SourceKind::Stream),
            (
                UploadedFile::new("a.txt", "text/plain", b"hi".to_vec()).into(),
                SourceKind::UploadedFile,
            ),
            (
                StreamSource::new(Cursor::new(vec![0])).with_filename("x.bin").into(),
                SourceKind::Stream,
            ),
        ];

        for (input, kind) in cases {
            assert_eq!(factory.create(input).unwrap().adapter().kind(), kind);
        }
    }

    #[test]
    fn test_custom_patterns() {
        let mut factory = SourceAdapterFactory::from_patterns(Vec::new()).unwrap();
        assert_eq!(factory.kind_for("/tmp/a"), None);

        factory
            .set_adapter_for_pattern("^data:", SourceKind::RawContent)
            .unwrap()
            .set_adapter_for_pattern("^/", SourceKind::LocalPath)
            .unwrap();
        assert_eq!(factory.kind_for("data:hello"), Some(SourceKind::RawContent));
        assert_eq!(factory.kind_for("/tmp/a"), Some(SourceKind::LocalPath));

        factory.set_adapter_for_pattern("^/", SourceKind::RemoteUrl).unwrap();
        assert_eq!(factory.kind_for("/tmp/a"), Some(SourceKind::RemoteUrl));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = SourceAdapterFactory::from_patterns([SourcePattern::new("(", SourceKind::LocalPath)]);
        assert!(matches!(result.unwrap_err(), SourceError::InvalidPattern { .. }));
    }

    #[test]
    fn test_patterns_deserialize() {
        let patterns: Vec<SourcePattern> =
            serde_json::from_str(r#"[{"pattern": "^s3://", "adapter": "remote_url"}]"#).unwrap();
        assert_eq!(patterns[0].adapter, SourceKind::RemoteUrl);
    }
}
