//! URL generation for stored files
//!
//! Each storage driver has a [`UrlGenerator`] turning a disk-relative path
//! into an absolute location and a public URL. Generators are looked up by
//! driver name through a [`UrlGeneratorFactory`].

mod factory;
mod local;
mod s3;

pub use factory::UrlGeneratorFactory;
pub use local::LocalUrlGenerator;
pub use s3::S3UrlGenerator;

use crate::config::DiskConfig;
use crate::storage::Visibility;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while generating URLs
#[derive(Debug, Error)]
pub enum UrlError {
    /// No generator is registered for the disk's driver
    #[error("Could not find a URL generator for disk `{disk}` of type `{driver}`")]
    GeneratorNotFound {
        /// Disk name
        disk: String,
        /// Driver of the disk
        driver: String,
    },

    /// The generator cannot produce expiring URLs
    #[error("Temporary URLs are not supported for files on disk `{disk}`")]
    TemporaryUrlsNotSupported {
        /// Disk name
        disk: String,
    },

    /// The file or its disk is private
    #[error("File `{path}` on disk `{disk}` is not publicly accessible")]
    NotPubliclyAccessible {
        /// Disk name
        disk: String,
        /// Disk-relative path
        path: String,
    },

    /// A setting the generator needs is missing from the disk configuration
    #[error("Disk `{disk}` has no `{key}` configured")]
    MissingDiskConfig {
        /// Disk name
        disk: String,
        /// Missing configuration key
        key: &'static str,
    },
}

/// Result type for URL generation
pub type UrlResult<T> = Result<T, UrlError>;

/// A stored file, as seen by a URL generator
#[derive(Debug, Clone, Copy)]
pub struct UrlTarget<'a> {
    /// Disk name
    pub disk: &'a str,
    /// Disk configuration
    pub config: &'a DiskConfig,
    /// Disk-relative path
    pub path: &'a str,
    /// Visibility the file was written with
    pub visibility: Visibility,
}

impl UrlTarget<'_> {
    pub(crate) fn missing(&self, key: &'static str) -> UrlError {
        UrlError::MissingDiskConfig {
            disk: self.disk.to_string(),
            key,
        }
    }
}

/// Builds locations and URLs for files on one kind of disk
pub trait UrlGenerator: Send + Sync {
    /// Absolute location of the file (filesystem path, object URI, ...)
    ///
    /// # Errors
    ///
    /// Returns an error if the disk configuration lacks what the driver needs
    fn absolute_path(&self, target: &UrlTarget<'_>) -> UrlResult<String>;

    /// Public URL of the file
    ///
    /// Does not check visibility; see
    /// [`is_publicly_accessible`](Self::is_publicly_accessible).
    ///
    /// # Errors
    ///
    /// Returns an error if the disk configuration lacks what the driver needs
    fn url(&self, target: &UrlTarget<'_>) -> UrlResult<String>;

    /// Whether the URL can be served to anyone
    ///
    /// Both the disk and the file must be public.
    fn is_publicly_accessible(&self, target: &UrlTarget<'_>) -> bool {
        target.config.visibility == Visibility::Public && target.visibility == Visibility::Public
    }

    /// URL that stops working at `expires_at`
    ///
    /// # Errors
    ///
    /// Returns [`UrlError::TemporaryUrlsNotSupported`] unless the generator
    /// overrides this method
    fn temporary_url(&self, target: &UrlTarget<'_>, expires_at: DateTime<Utc>) -> UrlResult<String> {
        tracing::debug!(disk = %target.disk, expires_at = %expires_at, "temporary url requested");
        Err(UrlError::TemporaryUrlsNotSupported {
            disk: target.disk.to_string(),
        })
    }
}

/// Joins a base URL and a relative path with exactly one `/`
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://localhost/uploads/", "/a/b.png"), "http://localhost/uploads/a/b.png");
        assert_eq!(join_url("/storage", "b.png"), "/storage/b.png");
    }

    fn target(config: &DiskConfig, visibility: Visibility) -> UrlTarget<'_> {
        UrlTarget {
            disk: "d",
            config,
            path: "a.png",
            visibility,
        }
    }

    #[test]
    fn test_public_requires_disk_and_file() {
        let public_disk = DiskConfig {
            visibility: Visibility::Public,
            ..DiskConfig::default()
        };
        let private_disk = DiskConfig::default();
        let generator = LocalUrlGenerator;

        assert!(generator.is_publicly_accessible(&target(&public_disk, Visibility::Public)));
        assert!(!generator.is_publicly_accessible(&target(&public_disk, Visibility::Private)));
        assert!(!generator.is_publicly_accessible(&target(&private_disk, Visibility::Public)));
    }

    #[test]
    fn test_temporary_urls_unsupported_by_default() {
        let config = DiskConfig::default();
        let target = UrlTarget {
            disk: "local",
            config: &config,
            path: "a.png",
            visibility: Visibility::Public,
        };
        let err = LocalUrlGenerator
            .temporary_url(&target, Utc::now() + chrono::Duration::minutes(5))
            .unwrap_err();
        assert!(matches!(err, UrlError::TemporaryUrlsNotSupported { ref disk } if disk == "local"));
    }
}
