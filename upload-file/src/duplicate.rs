//! Destination collision handling

use crate::error::{UploadError, UploadResult};
use crate::storage::{FileStorage, StoragePath};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on incremented candidates tried before giving up
pub const MAX_INCREMENT_ATTEMPTS: usize = 10_000;

/// What to do when a file already exists at the destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail with [`UploadError::FileExists`]
    Error,
    /// Append `-1`, `-2`, ... to the filename until it is free
    #[default]
    Increment,
    /// Delete the existing file, then write to the same path
    Replace,
    /// Overwrite the existing file in place
    Update,
}

impl DuplicatePolicy {
    /// Returns the lowercase name used in configuration files
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Increment => "increment",
            Self::Replace => "replace",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown duplicate policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown duplicate policy `{0}` (expected error, increment, replace or update)")]
pub struct ParseDuplicatePolicyError(String);

impl FromStr for DuplicatePolicy {
    type Err = ParseDuplicatePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "increment" => Ok(Self::Increment),
            "replace" => Ok(Self::Replace),
            "update" => Ok(Self::Update),
            _ => Err(ParseDuplicatePolicyError(s.to_string())),
        }
    }
}

/// Picks the final destination for an upload
///
/// Existence checks and the subsequent write are not atomic. Two uploads
/// racing for the same name may both observe it as free.
///
/// # Examples
///
/// ```rust,no_run
/// use upload_file::duplicate::{DuplicatePolicy, DuplicateResolver};
/// use upload_file::storage::{LocalFileStorage, StoragePath};
///
/// # async fn example() -> anyhow::Result<()> {
/// let storage = LocalFileStorage::new("/var/uploads")?;
/// let resolver = DuplicateResolver::new(&storage);
///
/// let path = resolver
///     .resolve(&StoragePath::new("foo", "bar", "png"), DuplicatePolicy::Increment)
///     .await?;
/// println!("writing to {path}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy)]
pub struct DuplicateResolver<'a> {
    storage: &'a dyn FileStorage,
    max_attempts: usize,
}

impl fmt::Debug for DuplicateResolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DuplicateResolver")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl<'a> DuplicateResolver<'a> {
    /// Creates a resolver checking existence against `storage`
    #[must_use]
    pub fn new(storage: &'a dyn FileStorage) -> Self {
        Self {
            storage,
            max_attempts: MAX_INCREMENT_ATTEMPTS,
        }
    }

    /// Overrides the increment cap
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Returns a destination that is safe to write under `policy`
    ///
    /// A free candidate is returned unchanged whatever the policy.
    ///
    /// # Errors
    ///
    /// - [`UploadError::FileExists`] under [`DuplicatePolicy::Error`]
    /// - [`UploadError::DuplicateResolutionFailed`] when no incremented name is free
    /// - [`UploadError::Storage`] when an existence check or delete fails
    pub async fn resolve(
        &self,
        candidate: &StoragePath,
        policy: DuplicatePolicy,
    ) -> UploadResult<StoragePath> {
        let path = candidate.path();
        if !self.storage.exists(&path).await? {
            return Ok(candidate.clone());
        }

        tracing::debug!(path = %path, policy = %policy, "destination already exists");

        match policy {
            DuplicatePolicy::Error => Err(UploadError::FileExists { path }),
            DuplicatePolicy::Replace => {
                self.storage.delete(&path).await?;
                tracing::debug!(path = %path, "existing file deleted");
                Ok(candidate.clone())
            }
            DuplicatePolicy::Update => Ok(candidate.clone()),
            DuplicatePolicy::Increment => self.increment(candidate).await,
        }
    }

    async fn increment(&self, candidate: &StoragePath) -> UploadResult<StoragePath> {
        for counter in 1..=self.max_attempts {
            let next = candidate.with_filename(format!("{}-{counter}", candidate.filename));
            if !self.storage.exists(&next.path()).await? {
                tracing::debug!(from = %candidate, to = %next, "filename incremented");
                return Ok(next);
            }
        }

        Err(UploadError::DuplicateResolutionFailed {
            path: candidate.path(),
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MockFileStorage, StorageError};
    use mockall::predicate::eq;
    use std::collections::HashSet;

    fn storage_with(existing: &[&str]) -> MockFileStorage {
        let existing: HashSet<String> = existing.iter().map(ToString::to_string).collect();
        let mut storage = MockFileStorage::new();
        storage
            .expect_exists()
            .returning(move |path| Ok(existing.contains(path)));
        storage
    }

    fn candidate() -> StoragePath {
        StoragePath::new("foo", "bar", "png")
    }

    #[tokio::test]
    async fn test_free_path_is_kept() {
        let mut storage = storage_with(&[]);
        storage.expect_delete().never();

        for policy in [
            DuplicatePolicy::Error,
            DuplicatePolicy::Increment,
            DuplicatePolicy::Replace,
            DuplicatePolicy::Update,
        ] {
            let resolved = DuplicateResolver::new(&storage)
                .resolve(&candidate(), policy)
                .await
                .unwrap();
            assert_eq!(resolved.path(), "foo/bar.png");
        }
    }

    #[tokio::test]
    async fn test_increment_skips_taken_names() {
        let storage = storage_with(&["foo/bar.png", "foo/bar-1.png"]);

        let resolved = DuplicateResolver::new(&storage)
            .resolve(&candidate(), DuplicatePolicy::Increment)
            .await
            .unwrap();
        assert_eq!(resolved.path(), "foo/bar-2.png");
        assert_eq!(resolved.filename, "bar-2");
    }

    #[tokio::test]
    async fn test_increment_without_extension_or_directory() {
        let storage = storage_with(&["readme"]);

        let resolved = DuplicateResolver::new(&storage)
            .resolve(&StoragePath::new("", "readme", ""), DuplicatePolicy::Increment)
            .await
            .unwrap();
        assert_eq!(resolved.path(), "readme-1");
    }

    #[tokio::test]
    async fn test_increment_gives_up() {
        let mut storage = MockFileStorage::new();
        storage.expect_exists().returning(|_| Ok(true));

        let err = DuplicateResolver::new(&storage)
            .with_max_attempts(3)
            .resolve(&candidate(), DuplicatePolicy::Increment)
            .await
            .unwrap_err();
        match err {
            UploadError::DuplicateResolutionFailed { path, attempts } => {
                assert_eq!(path, "foo/bar.png");
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_policy() {
        let mut storage = storage_with(&["foo/bar.png"]);
        storage.expect_delete().never();

        let err = DuplicateResolver::new(&storage)
            .resolve(&candidate(), DuplicatePolicy::Error)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::FileExists { ref path } if path == "foo/bar.png"));
    }

    #[tokio::test]
    async fn test_replace_deletes_prior_file() {
        let mut storage = storage_with(&["foo/bar.png"]);
        storage
            .expect_delete()
            .with(eq("foo/bar.png"))
            .times(1)
            .returning(|_| Ok(()));

        let resolved = DuplicateResolver::new(&storage)
            .resolve(&candidate(), DuplicatePolicy::Replace)
            .await
            .unwrap();
        assert_eq!(resolved.path(), "foo/bar.png");
    }

    #[tokio::test]
    async fn test_update_keeps_prior_file() {
        let mut storage = storage_with(&["foo/bar.png"]);
        storage.expect_delete().never();

        let resolved = DuplicateResolver::new(&storage)
            .resolve(&candidate(), DuplicatePolicy::Update)
            .await
            .unwrap();
        assert_eq!(resolved.path(), "foo/bar.png");
    }

    #[tokio::test]
    async fn test_existence_check_failure_propagates() {
        let mut storage = MockFileStorage::new();
        storage
            .expect_exists()
            .returning(|_| Err(StorageError::Other("backend down".to_string())));

        let err = DuplicateResolver::new(&storage)
            .resolve(&candidate(), DuplicatePolicy::Increment)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Storage(StorageError::Other(_))));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("error".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Error);
        assert_eq!("Increment".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Increment);
        assert_eq!(" replace ".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Replace);
        assert_eq!("update".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Update);
        assert!("overwrite".parse::<DuplicatePolicy>().is_err());
        assert_eq!(DuplicatePolicy::Replace.to_string(), "replace");
    }
}
