//! Named disks
//!
//! A [`StorageManager`] maps disk names to a [`DiskConfig`] and the backend
//! serving it. Local disks are mounted straight from configuration; any other
//! driver must be mounted explicitly with [`StorageManager::mount`].

use super::local::LocalFileStorage;
use super::traits::FileStorage;
use super::types::{StorageError, StorageResult};
use crate::config::{DiskConfig, UploadConfig};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Driver name of the built-in local filesystem backend
pub const LOCAL_DRIVER: &str = "local";

/// A mounted disk: its configuration and backend
#[derive(Clone)]
pub struct Disk {
    name: String,
    config: DiskConfig,
    storage: Arc<dyn FileStorage>,
}

impl Disk {
    /// Disk name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Disk configuration
    #[must_use]
    pub const fn config(&self) -> &DiskConfig {
        &self.config
    }

    /// Storage backend
    #[must_use]
    pub fn storage(&self) -> &dyn FileStorage {
        self.storage.as_ref()
    }
}

impl fmt::Debug for Disk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disk")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Registry of mounted disks
///
/// # Examples
///
/// ```rust,no_run
/// use upload_file::config::{DiskConfig, UploadConfig};
/// use upload_file::storage::{LocalFileStorage, StorageManager};
/// use std::sync::Arc;
///
/// # fn example() -> anyhow::Result<()> {
/// let mut disks = StorageManager::from_config(&UploadConfig::default())?;
/// disks.mount(
///     "scratch",
///     DiskConfig::local("/tmp/scratch"),
///     Arc::new(LocalFileStorage::new("/tmp/scratch")?),
/// );
/// assert!(disks.disk("scratch").is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StorageManager {
    disks: BTreeMap<String, Disk>,
}

impl StorageManager {
    /// Creates a manager with no disks
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts every `local` disk described in the configuration
    ///
    /// Disks using other drivers are skipped and must be mounted by the
    /// application with a backend of its choosing.
    ///
    /// # Errors
    ///
    /// Returns an error if a local disk has no `root` or its root is not a directory
    pub fn from_config(config: &UploadConfig) -> StorageResult<Self> {
        let mut manager = Self::new();
        for (name, disk) in &config.disks {
            if disk.driver != LOCAL_DRIVER {
                tracing::debug!(disk = %name, driver = %disk.driver, "disk needs an explicit mount");
                continue;
            }
            let root = disk.root.clone().ok_or_else(|| {
                StorageError::Other(format!("local disk `{name}` has no root configured"))
            })?;
            let storage = LocalFileStorage::new(root)?;
            manager.mount(name.clone(), disk.clone(), Arc::new(storage));
        }
        Ok(manager)
    }

    /// Mounts (or replaces) a disk
    pub fn mount(
        &mut self,
        name: impl Into<String>,
        config: DiskConfig,
        storage: Arc<dyn FileStorage>,
    ) -> &mut Self {
        let name = name.into();
        tracing::debug!(disk = %name, driver = %config.driver, "disk mounted");
        self.disks.insert(
            name.clone(),
            Disk {
                name,
                config,
                storage,
            },
        );
        self
    }

    /// Looks up a mounted disk by name
    #[must_use]
    pub fn disk(&self, name: &str) -> Option<&Disk> {
        self.disks.get(name)
    }

    /// Names of all mounted disks, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.disks.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::MockFileStorage;
    use tempfile::TempDir;

    #[test]
    fn test_from_config_mounts_local_disks() {
        let temp = TempDir::new().unwrap();
        let mut config = UploadConfig::default();
        config.disks.clear();
        config
            .disks
            .insert("tmp".to_string(), DiskConfig::local(temp.path()));
        config.disks.insert(
            "s3".to_string(),
            DiskConfig {
                driver: "s3".to_string(),
                bucket: Some("media".to_string()),
                ..DiskConfig::default()
            },
        );

        let manager = StorageManager::from_config(&config).unwrap();
        assert!(manager.disk("tmp").is_some());
        assert!(manager.disk("s3").is_none());
        assert_eq!(manager.names().collect::<Vec<_>>(), vec!["tmp"]);
    }

    #[test]
    fn test_local_disk_requires_root() {
        let mut config = UploadConfig::default();
        config.disks.clear();
        config.disks.insert("broken".to_string(), DiskConfig::default());

        let result = StorageManager::from_config(&config);
        assert!(matches!(result.unwrap_err(), StorageError::Other(_)));
    }

    #[test]
    fn test_mount_custom_backend() {
        let mut manager = StorageManager::new();
        let config = DiskConfig {
            driver: "memory".to_string(),
            ..DiskConfig::default()
        };
        manager.mount("mem", config, Arc::new(MockFileStorage::new()));

        let disk = manager.disk("mem").unwrap();
        assert_eq!(disk.name(), "mem");
        assert_eq!(disk.config().driver, "memory");
    }
}
