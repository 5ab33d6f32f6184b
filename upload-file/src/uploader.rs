//! Upload orchestration
//!
//! A [`FileUploader`] holds what is shared between uploads (configuration,
//! mounted disks, adapter and URL factories). Each upload starts as a
//! [`PendingUpload`], configured fluently, and runs when
//! [`upload`](PendingUpload::upload) is awaited:
//!
//! ```text
//! source -> disk check -> validation -> aggregate type -> filename
//!        -> duplicate resolution -> URLs -> write -> ResolvedFile
//! ```
//!
//! Every check runs before the first byte is written.

use crate::aggregate::{
    normalize_extension, normalize_mime, AggregateTypeDefinition, TypePolicy, TypeRegistry,
    TypeResolver,
};
use crate::config::UploadConfig;
use crate::duplicate::{DuplicatePolicy, DuplicateResolver};
use crate::error::{UploadError, UploadResult};
use crate::source::{
    RawContentSource, SourceAdapter, SourceAdapterFactory, SourceBody, SourceError, SourceInput,
};
use crate::storage::{
    sanitize_directory, sanitize_filename, Disk, StorageManager, StoragePath, Visibility,
    WriteOptions,
};
use crate::url::{UrlError, UrlGenerator, UrlGeneratorFactory, UrlTarget};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Description of a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFile {
    /// Disk the file was written to
    pub disk: String,
    /// Directory relative to the disk root
    pub directory: String,
    /// Filename without extension
    pub filename: String,
    /// Lower-case extension without leading dot (may be empty)
    pub extension: String,
    /// Disk-relative path
    pub path: String,
    /// Lower-case MIME type
    pub mime_type: String,
    /// Inferred aggregate type
    pub aggregate_type: String,
    /// Bytes written
    pub size: u64,
    /// Visibility the file was written with
    pub visibility: Visibility,
    /// Absolute location (filesystem path, object URI, ...)
    pub absolute_path: String,
    /// Public URL, when both the disk and the file are public
    pub url: Option<String>,
}

impl ResolvedFile {
    /// `filename.extension`
    #[must_use]
    pub fn basename(&self) -> String {
        StoragePath::new("", self.filename.clone(), self.extension.clone()).basename()
    }
}

/// Settings of a single upload
///
/// Starts from the uploader's configuration and is modified by the
/// [`PendingUpload`] setters. It is not shared with other uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Target disk
    pub disk: String,
    /// Target directory (sanitized)
    pub directory: String,
    /// Explicit filename (sanitized)
    pub filename: Option<String>,
    /// Name the file after its content hash
    pub hash_filename: bool,
    /// Visibility override (`None` = disk default)
    pub visibility: Option<Visibility>,
    /// Extra options passed to the storage backend
    pub options: BTreeMap<String, String>,
    /// Collision handling
    pub on_duplicate: DuplicatePolicy,
    /// Aggregate type inference rules
    pub type_policy: TypePolicy,
    /// Allowed MIME types (empty = any)
    pub allowed_mime_types: Vec<String>,
    /// Allowed extensions (empty = any)
    pub allowed_extensions: Vec<String>,
    /// Maximum size in bytes (0 = unlimited)
    pub max_size: u64,
    /// Aggregate types known to this upload
    pub registry: TypeRegistry,
}

impl UploadRequest {
    /// Request carrying the configured defaults
    #[must_use]
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            disk: config.default_disk.clone(),
            directory: String::new(),
            filename: None,
            hash_filename: false,
            visibility: None,
            options: BTreeMap::new(),
            on_duplicate: config.on_duplicate,
            type_policy: config.type_policy(),
            allowed_mime_types: normalize_list(&config.allowed_mime_types, normalize_mime),
            allowed_extensions: normalize_list(&config.allowed_extensions, normalize_extension),
            max_size: config.max_size,
            registry: config.type_registry(),
        }
    }
}

fn normalize_list<I, S>(values: I, normalize: fn(&str) -> String) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values.into_iter().map(|v| normalize(v.as_ref())).collect()
}

/// Entry point for uploads
///
/// # Examples
///
/// ```rust,no_run
/// use upload_file::prelude::*;
///
/// # async fn example() -> anyhow::Result<()> {
/// let uploader = FileUploader::from_config(UploadConfig::load()?)?;
///
/// let file = uploader
///     .from_source("/tmp/photo.png")
///     .to_destination("public", "avatars")
///     .use_filename("me")
///     .on_duplicate_increment()
///     .upload()
///     .await?;
///
/// println!("{} ({})", file.path, file.aggregate_type);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileUploader {
    config: Arc<UploadConfig>,
    storage: Arc<StorageManager>,
    sources: SourceAdapterFactory,
    urls: UrlGeneratorFactory,
}

impl FileUploader {
    /// Creates an uploader over already mounted disks
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Configuration`] if a source pattern is invalid
    pub fn new(config: UploadConfig, storage: StorageManager) -> UploadResult<Self> {
        let sources = SourceAdapterFactory::from_patterns(config.source_patterns.iter().cloned())
            .map_err(|e| UploadError::configuration(e.to_string()))?;
        Ok(Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
            sources,
            urls: UrlGeneratorFactory::new(),
        })
    }

    /// Creates an uploader mounting every local disk of the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a local disk cannot be mounted or a source
    /// pattern is invalid
    pub fn from_config(config: UploadConfig) -> UploadResult<Self> {
        let storage = StorageManager::from_config(&config)?;
        Self::new(config, storage)
    }

    /// Replaces the source adapter factory
    #[must_use]
    pub fn with_source_factory(mut self, sources: SourceAdapterFactory) -> Self {
        self.sources = sources;
        self
    }

    /// Registers a URL generator for a storage driver
    #[must_use]
    pub fn with_url_generator(
        mut self,
        driver: impl Into<String>,
        generator: Arc<dyn UrlGenerator>,
    ) -> Self {
        self.urls.set_generator_for_driver(driver, generator);
        self
    }

    /// Shared configuration
    #[must_use]
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Mounted disks
    #[must_use]
    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    /// Starts an upload with no source yet
    #[must_use]
    pub fn pending(&self) -> PendingUpload<'_> {
        PendingUpload {
            uploader: self,
            source: None,
            request: UploadRequest::from_config(&self.config),
        }
    }

    /// Starts an upload from any supported input
    #[must_use]
    pub fn from_source(&self, input: impl Into<SourceInput>) -> PendingUpload<'_> {
        self.pending().from_source(input)
    }

    /// Starts an upload of in-memory text or bytes
    #[must_use]
    pub fn from_string(&self, contents: impl Into<String>) -> PendingUpload<'_> {
        self.pending().from_string(contents)
    }

    /// Public URL of a stored file
    ///
    /// # Errors
    ///
    /// Returns [`UrlError::NotPubliclyAccessible`] if the file or its disk is
    /// private, or another URL error if the disk cannot produce URLs
    pub fn url_for(&self, file: &ResolvedFile) -> UploadResult<String> {
        let disk = self.mounted_disk(&file.disk)?;
        let generator = self.urls.generator_for(disk.name(), disk.config())?;
        let target = UrlTarget {
            disk: disk.name(),
            config: disk.config(),
            path: &file.path,
            visibility: file.visibility,
        };
        if !generator.is_publicly_accessible(&target) {
            return Err(UrlError::NotPubliclyAccessible {
                disk: file.disk.clone(),
                path: file.path.clone(),
            }
            .into());
        }
        Ok(generator.url(&target)?)
    }

    /// Expiring URL of a stored file
    ///
    /// # Errors
    ///
    /// Returns [`UrlError::TemporaryUrlsNotSupported`] unless the disk's
    /// generator supports expiring URLs
    pub fn temporary_url_for(
        &self,
        file: &ResolvedFile,
        expires_at: DateTime<Utc>,
    ) -> UploadResult<String> {
        let disk = self.mounted_disk(&file.disk)?;
        let generator = self.urls.generator_for(disk.name(), disk.config())?;
        let target = UrlTarget {
            disk: disk.name(),
            config: disk.config(),
            path: &file.path,
            visibility: file.visibility,
        };
        Ok(generator.temporary_url(&target, expires_at)?)
    }

    fn mounted_disk(&self, name: &str) -> UploadResult<&Disk> {
        self.storage
            .disk(name)
            .ok_or_else(|| UploadError::configuration(format!("disk `{name}` is not configured")))
    }

    /// Checks that a disk exists and uploads may target it
    fn verify_disk(&self, name: &str) -> UploadResult<&Disk> {
        let disk = self.mounted_disk(name)?;
        let allowed = &self.config.allowed_disks;
        if !allowed.is_empty() && !allowed.iter().any(|d| d == name) {
            return Err(UploadError::DiskNotAllowed {
                disk: name.to_string(),
            });
        }
        Ok(disk)
    }
}

/// An upload being configured
///
/// Setters consume and return the builder. Nothing touches the source or
/// the disk until [`upload`](Self::upload) is awaited.
pub struct PendingUpload<'a> {
    uploader: &'a FileUploader,
    source: Option<SourceInput>,
    request: UploadRequest,
}

impl std::fmt::Debug for PendingUpload<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingUpload")
            .field("source", &self.source)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl PendingUpload<'_> {
    /// Sets the source
    #[must_use]
    pub fn from_source(mut self, input: impl Into<SourceInput>) -> Self {
        self.source = Some(input.into());
        self
    }

    /// Sets in-memory contents as the source
    #[must_use]
    pub fn from_string(mut self, contents: impl Into<String>) -> Self {
        self.source = Some(SourceInput::Adapter(
            RawContentSource::new(contents.into()).into(),
        ));
        self
    }

    /// Sets the disk and directory
    #[must_use]
    pub fn to_destination(self, disk: impl Into<String>, directory: &str) -> Self {
        self.to_disk(disk).to_directory(directory)
    }

    /// Sets the disk; it is verified when the upload runs
    #[must_use]
    pub fn to_disk(mut self, disk: impl Into<String>) -> Self {
        self.request.disk = disk.into();
        self
    }

    /// Sets the directory; traversal segments are removed
    #[must_use]
    pub fn to_directory(mut self, directory: &str) -> Self {
        self.request.directory = sanitize_directory(directory);
        self
    }

    /// Uses an explicit filename (without extension)
    #[must_use]
    pub fn use_filename(mut self, filename: &str) -> Self {
        let clean = sanitize_filename(filename);
        self.request.filename = (!clean.is_empty()).then_some(clean);
        self.request.hash_filename = false;
        self
    }

    /// Names the file after the SHA-256 of its contents
    #[must_use]
    pub fn use_hash_for_filename(mut self) -> Self {
        self.request.filename = None;
        self.request.hash_filename = true;
        self
    }

    /// Keeps the source's own filename (the default)
    #[must_use]
    pub fn use_original_filename(mut self) -> Self {
        self.request.filename = None;
        self.request.hash_filename = false;
        self
    }

    /// Sets the collision policy
    #[must_use]
    pub const fn on_duplicate(mut self, policy: DuplicatePolicy) -> Self {
        self.request.on_duplicate = policy;
        self
    }

    /// Fails when the destination exists
    #[must_use]
    pub const fn on_duplicate_error(self) -> Self {
        self.on_duplicate(DuplicatePolicy::Error)
    }

    /// Appends a counter to the filename when the destination exists
    #[must_use]
    pub const fn on_duplicate_increment(self) -> Self {
        self.on_duplicate(DuplicatePolicy::Increment)
    }

    /// Deletes the existing file first
    #[must_use]
    pub const fn on_duplicate_replace(self) -> Self {
        self.on_duplicate(DuplicatePolicy::Replace)
    }

    /// Overwrites the existing file in place
    #[must_use]
    pub const fn on_duplicate_update(self) -> Self {
        self.on_duplicate(DuplicatePolicy::Update)
    }

    /// Requires MIME type and extension to agree on the aggregate type
    #[must_use]
    pub const fn set_strict_type_checking(mut self, strict: bool) -> Self {
        self.request.type_policy.strict_type_checking = strict;
        self
    }

    /// Accepts files matching no aggregate type
    #[must_use]
    pub const fn set_allow_unrecognized_types(mut self, allow: bool) -> Self {
        self.request.type_policy.allow_unrecognized_types = allow;
        self
    }

    /// Adds or wholesale replaces an aggregate type for this upload
    #[must_use]
    pub fn set_type_definition<M, E>(
        mut self,
        name: &str,
        mime_types: impl IntoIterator<Item = M>,
        extensions: impl IntoIterator<Item = E>,
    ) -> Self
    where
        M: AsRef<str>,
        E: AsRef<str>,
    {
        self.request
            .registry
            .set(AggregateTypeDefinition::new(name, mime_types, extensions));
        self
    }

    /// Restricts the accepted MIME types (empty = any)
    #[must_use]
    pub fn set_allowed_mime_types<S: AsRef<str>>(mut self, mime_types: impl IntoIterator<Item = S>) -> Self {
        self.request.allowed_mime_types = normalize_list(mime_types, normalize_mime);
        self
    }

    /// Restricts the accepted extensions (empty = any)
    #[must_use]
    pub fn set_allowed_extensions<S: AsRef<str>>(mut self, extensions: impl IntoIterator<Item = S>) -> Self {
        self.request.allowed_extensions = normalize_list(extensions, normalize_extension);
        self
    }

    /// Restricts the accepted aggregate types (empty = any)
    #[must_use]
    pub fn set_allowed_aggregate_types<S: AsRef<str>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.request.type_policy.allowed_aggregate_types =
            types.into_iter().map(|t| t.as_ref().to_string()).collect();
        self
    }

    /// Sets the maximum size in bytes (0 = unlimited)
    #[must_use]
    pub const fn set_maximum_size(mut self, bytes: u64) -> Self {
        self.request.max_size = bytes;
        self
    }

    /// Overrides the disk's default visibility
    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.request.visibility = Some(visibility);
        self
    }

    /// Adds options passed through to the storage backend
    #[must_use]
    pub fn with_options<K, V>(mut self, options: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.request
            .options
            .extend(options.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Current settings
    #[must_use]
    pub const fn request(&self) -> &UploadRequest {
        &self.request
    }

    /// Aggregate types recognizing a MIME type, in registry order
    #[must_use]
    pub fn possible_aggregate_types_for_mime_type(&self, mime_type: &str) -> Vec<String> {
        to_owned(self.request.registry.types_for_mime_type(mime_type))
    }

    /// Aggregate types recognizing an extension, in registry order
    #[must_use]
    pub fn possible_aggregate_types_for_extension(&self, extension: &str) -> Vec<String> {
        to_owned(self.request.registry.types_for_extension(extension))
    }

    /// Aggregate type this upload would assign to a MIME type and extension
    ///
    /// # Errors
    ///
    /// Returns the same type errors [`upload`](Self::upload) would
    pub fn infer_aggregate_type(&self, mime_type: &str, extension: &str) -> UploadResult<String> {
        TypeResolver::new(&self.request.registry, &self.request.type_policy).resolve(mime_type, extension)
    }

    /// Validates and stores the file
    ///
    /// The source is dropped when this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`UploadError::Configuration`] without a source, for an unknown disk
    ///   or an input no adapter accepts
    /// - [`UploadError::DiskNotAllowed`] for a disk outside `allowed_disks`
    /// - validation errors ([`UploadError::is_validation`])
    /// - [`UploadError::FileExists`] / [`UploadError::DuplicateResolutionFailed`]
    ///   from duplicate handling
    /// - [`UploadError::WriteFailed`] when the backend rejects the write
    pub async fn upload(self) -> UploadResult<ResolvedFile> {
        let Self {
            uploader,
            source,
            request,
        } = self;

        let input = source.ok_or_else(|| UploadError::configuration("no source provided"))?;
        let disk = uploader.verify_disk(&request.disk)?;
        let generator = uploader.urls.generator_for(disk.name(), disk.config())?;
        let source = uploader
            .sources
            .create(input)
            .map_err(unusable_source)?
            .with_read_limit(request.max_size);
        let adapter = source.adapter();

        let (size, mime_type, extension) = verify_file(adapter, &request).await?;
        let aggregate_type = TypeResolver::new(&request.registry, &request.type_policy)
            .resolve(&mime_type, &extension)?;
        tracing::debug!(
            source = %adapter.location(),
            size,
            mime_type = %mime_type,
            extension = %extension,
            aggregate_type = %aggregate_type,
            "upload validated"
        );

        let filename = choose_filename(adapter, &request).await?;
        let candidate = StoragePath::new(request.directory.clone(), filename, extension.clone());
        let destination = DuplicateResolver::new(disk.storage())
            .resolve(&candidate, request.on_duplicate)
            .await?;
        let path = destination.path();

        let visibility = request.visibility.unwrap_or(disk.config().visibility);
        let target = UrlTarget {
            disk: disk.name(),
            config: disk.config(),
            path: &path,
            visibility,
        };
        let absolute_path = generator.absolute_path(&target)?;
        let url = if generator.is_publicly_accessible(&target) {
            Some(generator.url(&target)?)
        } else {
            None
        };

        let options = WriteOptions {
            visibility: Some(visibility),
            extra: request.options.clone(),
        };
        let written = match adapter.open().await? {
            SourceBody::Bytes(data) => disk.storage().write(&path, data, &options).await,
            SourceBody::Reader(reader) => disk.storage().write_stream(&path, reader, &options).await,
        }
        .map_err(|source| UploadError::WriteFailed {
            path: path.clone(),
            source,
        })?;
        drop(source);

        if written != size {
            tracing::debug!(reported = size, written, "source size changed while uploading");
        }
        tracing::info!(
            disk = %disk.name(),
            path = %path,
            size = written,
            aggregate_type = %aggregate_type,
            "file uploaded"
        );

        Ok(ResolvedFile {
            disk: disk.name().to_string(),
            directory: destination.directory,
            filename: destination.filename,
            extension,
            path,
            mime_type,
            aggregate_type,
            size: written,
            visibility,
            absolute_path,
            url,
        })
    }
}

fn to_owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(ToString::to_string).collect()
}

/// Input errors that mean the upload was set up wrong rather than the source failing
fn unusable_source(error: SourceError) -> UploadError {
    match error {
        SourceError::Unrecognized(_) | SourceError::InvalidPattern { .. } => {
            UploadError::configuration(error.to_string())
        }
        other => other.into(),
    }
}

/// Source validity, size, MIME type and extension checks, in that order
async fn verify_file(
    adapter: &dyn SourceAdapter,
    request: &UploadRequest,
) -> UploadResult<(u64, String, String)> {
    if !adapter.is_valid().await {
        return Err(UploadError::SourceInvalid {
            location: adapter.location(),
        });
    }

    let size = adapter.size().await?;
    if request.max_size > 0 && size > request.max_size {
        return Err(UploadError::FileTooLarge {
            size,
            max: request.max_size,
        });
    }

    let mime_type = normalize_mime(&adapter.mime_type().await?);
    let allowed = &request.allowed_mime_types;
    if !allowed.is_empty() && !allowed.contains(&mime_type) {
        return Err(UploadError::MimeRestricted {
            mime_type,
            allowed: allowed.clone(),
        });
    }

    let extension = normalize_extension(&adapter.extension().await?);
    let allowed = &request.allowed_extensions;
    if !allowed.is_empty() && !allowed.contains(&extension) {
        return Err(UploadError::ExtensionRestricted {
            extension,
            allowed: allowed.clone(),
        });
    }

    Ok((size, mime_type, extension))
}

/// Explicit name, then content hash, then the source's own name
///
/// Sources without a usable name fall back to the content hash.
async fn choose_filename(adapter: &dyn SourceAdapter, request: &UploadRequest) -> UploadResult<String> {
    if let Some(filename) = &request.filename {
        return Ok(filename.clone());
    }
    if !request.hash_filename {
        if let Some(natural) = adapter
            .filename()
            .map(|name| sanitize_filename(&name))
            .filter(|name| !name.is_empty())
        {
            return Ok(natural);
        }
    }
    Ok(adapter.content_hash().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiskConfig;
    use crate::storage::{FileStorage, LocalFileStorage, MockFileStorage};
    use tempfile::TempDir;

    fn uploader(temp: &TempDir) -> FileUploader {
        let config = UploadConfig {
            default_disk: "tmp".to_string(),
            allowed_disks: vec!["tmp".to_string()],
            disks: BTreeMap::from([("tmp".to_string(), DiskConfig::local(temp.path()))]),
            ..UploadConfig::default()
        };
        FileUploader::from_config(config).unwrap()
    }

    #[test]
    fn test_request_defaults_from_config() {
        let config = UploadConfig {
            allowed_mime_types: vec!["IMAGE/PNG".to_string()],
            allowed_extensions: vec![".PNG".to_string()],
            max_size: 42,
            ..UploadConfig::default()
        };
        let request = UploadRequest::from_config(&config);
        assert_eq!(request.disk, "public");
        assert_eq!(request.allowed_mime_types, vec!["image/png"]);
        assert_eq!(request.allowed_extensions, vec!["png"]);
        assert_eq!(request.max_size, 42);
        assert_eq!(request.on_duplicate, DuplicatePolicy::Increment);
    }

    #[test]
    fn test_setters_build_request() {
        let temp = TempDir::new().unwrap();
        let uploader = uploader(&temp);

        let pending = uploader
            .pending()
            .to_destination("tmp", "../a/./b/")
            .use_filename("../../etc/passwd")
            .on_duplicate_replace()
            .set_strict_type_checking(true)
            .set_allow_unrecognized_types(true)
            .set_allowed_mime_types(["Image/PNG"])
            .set_allowed_extensions(["PNG"])
            .set_allowed_aggregate_types(["image"])
            .set_maximum_size(1024)
            .with_visibility(Visibility::Public)
            .with_options([("CacheControl", "no-cache")]);

        let request = pending.request();
        assert_eq!(request.disk, "tmp");
        assert_eq!(request.directory, "a/b");
        assert_eq!(request.filename.as_deref(), Some("etc-passwd"));
        assert_eq!(request.on_duplicate, DuplicatePolicy::Replace);
        assert!(request.type_policy.strict_type_checking);
        assert!(request.type_policy.allow_unrecognized_types);
        assert_eq!(request.allowed_mime_types, vec!["image/png"]);
        assert_eq!(request.allowed_extensions, vec!["png"]);
        assert_eq!(request.type_policy.allowed_aggregate_types, vec!["image"]);
        assert_eq!(request.max_size, 1024);
        assert_eq!(request.visibility, Some(Visibility::Public));
        assert_eq!(request.options.get("CacheControl").map(String::as_str), Some("no-cache"));
    }

    #[test]
    fn test_filename_modes_are_exclusive() {
        let temp = TempDir::new().unwrap();
        let uploader = uploader(&temp);

        let hashed = uploader.pending().use_filename("name").use_hash_for_filename();
        assert!(hashed.request().hash_filename);
        assert!(hashed.request().filename.is_none());

        let named = uploader.pending().use_hash_for_filename().use_filename("name");
        assert!(!named.request().hash_filename);
        assert_eq!(named.request().filename.as_deref(), Some("name"));

        let original = named.use_original_filename();
        assert!(original.request().filename.is_none());
        assert!(!original.request().hash_filename);

        let empty = uploader.pending().use_filename("..");
        assert!(empty.request().filename.is_none());
    }

    #[test]
    fn test_type_definition_is_per_upload() {
        let temp = TempDir::new().unwrap();
        let uploader = uploader(&temp);

        let pending = uploader
            .pending()
            .set_type_definition("image", ["image/x-custom"], ["cst"]);
        assert_eq!(pending.possible_aggregate_types_for_extension("cst"), vec!["image"]);
        assert!(pending.possible_aggregate_types_for_mime_type("image/png").is_empty());
        assert_eq!(pending.infer_aggregate_type("image/x-custom", "cst").unwrap(), "image");

        let fresh = uploader.pending();
        assert_eq!(fresh.possible_aggregate_types_for_mime_type("image/png"), vec!["image"]);
    }

    #[tokio::test]
    async fn test_write_failure_is_wrapped() {
        let mut storage = MockFileStorage::new();
        storage.expect_exists().returning(|_| Ok(false));
        storage
            .expect_write()
            .returning(|_, _, _| Err(crate::storage::StorageError::Other("disk full".to_string())));

        let mut disks = StorageManager::new();
        disks.mount("mock", DiskConfig::local("/unused"), Arc::new(storage));
        let config = UploadConfig {
            default_disk: "mock".to_string(),
            allowed_disks: Vec::new(),
            ..UploadConfig::default()
        };
        let uploader = FileUploader::new(config, disks).unwrap();

        let err = uploader
            .from_string("some text")
            .use_filename("notes")
            .upload()
            .await
            .unwrap_err();
        match err {
            UploadError::WriteFailed { path, .. } => assert_eq!(path, "notes.txt"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_overwrites_in_place() {
        let temp = TempDir::new().unwrap();
        let uploader = uploader(&temp);
        let storage = LocalFileStorage::new(temp.path()).unwrap();

        uploader
            .from_string("first")
            .use_filename("notes")
            .upload()
            .await
            .unwrap();
        let second = uploader
            .from_string("second")
            .use_filename("notes")
            .on_duplicate_update()
            .upload()
            .await
            .unwrap();

        assert_eq!(second.path, "notes.txt");
        assert_eq!(storage.read("notes.txt").await.unwrap(), b"second");
    }
}
