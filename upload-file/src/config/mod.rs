//! Configuration management for upload-file
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `UPLOAD_FILE_` prefix, nested
//!    keys separated by `__`, e.g. `UPLOAD_FILE_DISKS__PUBLIC__URL`)
//! 2. A TOML file (`./upload_file.toml` unless a path is given)
//! 3. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! # upload_file.toml
//! default_disk = "uploads"
//! allowed_disks = ["tmp", "uploads"]
//! max_size = 5242880
//! on_duplicate = "increment"
//! strict_type_checking = true
//!
//! [disks.tmp]
//! driver = "local"
//! root = "./storage/tmp"
//!
//! [disks.uploads]
//! driver = "local"
//! root = "./public/uploads"
//! url = "http://localhost/uploads"
//! visibility = "public"
//!
//! [[aggregate_types]]
//! name = "image"
//! mime_types = ["image/png", "image/jpeg"]
//! extensions = ["png", "jpg", "jpeg"]
//! ```
//!
//! Note that `aggregate_types` and `source_patterns` are ordered lists: a
//! file that defines them replaces the defaults entirely.
//!
//! # Usage
//!
//! ```rust,no_run
//! use upload_file::config::UploadConfig;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = UploadConfig::load_from("./config/upload_file.toml")?;
//! let max = config.max_size;
//! # Ok(())
//! # }
//! ```

use crate::aggregate::{default_definitions, AggregateTypeDefinition, TypePolicy, TypeRegistry};
use crate::duplicate::DuplicatePolicy;
use crate::error::{UploadError, UploadResult};
use crate::source::{default_patterns, SourcePattern};
use crate::storage::Visibility;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default configuration file looked up by [`UploadConfig::load`]
pub const DEFAULT_CONFIG_FILE: &str = "upload_file.toml";

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "UPLOAD_FILE_";

/// Default maximum upload size (10MB)
pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;

/// A named storage location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    /// Storage driver (`local`, `s3`, or any driver with a mounted backend)
    pub driver: String,

    /// Root directory (local) or key prefix (object stores)
    pub root: Option<PathBuf>,

    /// Public base URL of the disk
    pub url: Option<String>,

    /// Default visibility of files written to this disk
    pub visibility: Visibility,

    /// Bucket name for object stores
    pub bucket: Option<String>,

    /// Region for object stores
    pub region: Option<String>,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            driver: "local".to_string(),
            root: None,
            url: None,
            visibility: Visibility::Private,
            bucket: None,
            region: None,
        }
    }
}

impl DiskConfig {
    /// Private local disk rooted at `root`
    #[must_use]
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Public local disk rooted at `root` and served from `url`
    #[must_use]
    pub fn public(root: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            root: Some(root.into()),
            url: Some(url.into()),
            visibility: Visibility::Public,
            ..Self::default()
        }
    }
}

/// Complete upload configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Disk used when an upload does not name one
    pub default_disk: String,

    /// Disks uploads may target (empty = every mounted disk)
    pub allowed_disks: Vec<String>,

    /// Disk definitions by name
    pub disks: BTreeMap<String, DiskConfig>,

    /// Maximum upload size in bytes (0 = unlimited)
    pub max_size: u64,

    /// What to do when the destination already exists
    pub on_duplicate: DuplicatePolicy,

    /// Require MIME type and extension to agree on an aggregate type
    pub strict_type_checking: bool,

    /// Accept files matching no aggregate type (they become `other`)
    pub allow_unrecognized_types: bool,

    /// MIME types uploads are restricted to (empty = no restriction)
    pub allowed_mime_types: Vec<String>,

    /// Extensions uploads are restricted to (empty = no restriction)
    pub allowed_extensions: Vec<String>,

    /// Aggregate types uploads are restricted to (empty = no restriction)
    pub allowed_aggregate_types: Vec<String>,

    /// Ordered aggregate type definitions; earlier entries win ties
    pub aggregate_types: Vec<AggregateTypeDefinition>,

    /// Ordered string patterns used to pick a source adapter
    pub source_patterns: Vec<SourcePattern>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        let mut disks = BTreeMap::new();
        disks.insert("local".to_string(), DiskConfig::local("./storage/app"));
        disks.insert(
            "public".to_string(),
            DiskConfig::public("./storage/app/public", "/storage"),
        );

        Self {
            default_disk: "public".to_string(),
            allowed_disks: vec!["public".to_string()],
            disks,
            max_size: DEFAULT_MAX_SIZE,
            on_duplicate: DuplicatePolicy::Increment,
            strict_type_checking: false,
            allow_unrecognized_types: false,
            allowed_mime_types: Vec::new(),
            allowed_extensions: Vec::new(),
            allowed_aggregate_types: Vec::new(),
            aggregate_types: default_definitions(),
            source_patterns: default_patterns(),
        }
    }
}

impl UploadConfig {
    /// Load configuration from `./upload_file.toml` and the environment
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Configuration`] if a source fails to parse
    pub fn load() -> UploadResult<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific TOML file and the environment
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Configuration`] if the file or an environment
    /// variable does not match the configuration schema
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use upload_file::config::UploadConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = UploadConfig::load_from("./config/production.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_from(path: impl AsRef<Path>) -> UploadResult<Self> {
        Self::figment(path)
            .extract()
            .map_err(|e| UploadError::configuration(e.to_string()))
    }

    /// The figment used by [`load_from`](Self::load_from)
    ///
    /// Exposed so applications can layer additional providers.
    #[must_use]
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Adds (or replaces) a disk definition
    #[must_use]
    pub fn with_disk(mut self, name: impl Into<String>, disk: DiskConfig) -> Self {
        self.disks.insert(name.into(), disk);
        self
    }

    /// Looks up a disk definition
    #[must_use]
    pub fn disk(&self, name: &str) -> Option<&DiskConfig> {
        self.disks.get(name)
    }

    /// Builds the aggregate type registry described by this configuration
    #[must_use]
    pub fn type_registry(&self) -> TypeRegistry {
        TypeRegistry::new(self.aggregate_types.iter().cloned())
    }

    /// Type inference policy described by this configuration
    #[must_use]
    pub fn type_policy(&self) -> TypePolicy {
        TypePolicy {
            strict_type_checking: self.strict_type_checking,
            allow_unrecognized_types: self.allow_unrecognized_types,
            allowed_aggregate_types: self.allowed_aggregate_types.clone(),
        }
    }
}
