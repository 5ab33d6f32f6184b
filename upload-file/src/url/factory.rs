//! Generator lookup by storage driver

use super::{LocalUrlGenerator, S3UrlGenerator, UrlError, UrlGenerator, UrlResult};
use crate::config::DiskConfig;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// URL generators keyed by storage driver
///
/// `local` and `s3` are registered out of the box.
///
/// # Examples
///
/// ```rust
/// use upload_file::config::DiskConfig;
/// use upload_file::url::UrlGeneratorFactory;
///
/// let factory = UrlGeneratorFactory::new();
/// let disk = DiskConfig::local("/srv/uploads");
/// assert!(factory.generator_for("uploads", &disk).is_ok());
/// ```
#[derive(Clone)]
pub struct UrlGeneratorFactory {
    generators: BTreeMap<String, Arc<dyn UrlGenerator>>,
}

impl Default for UrlGeneratorFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UrlGeneratorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlGeneratorFactory")
            .field("drivers", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl UrlGeneratorFactory {
    /// Factory with the built-in generators
    #[must_use]
    pub fn new() -> Self {
        let mut factory = Self {
            generators: BTreeMap::new(),
        };
        factory
            .set_generator_for_driver("local", Arc::new(LocalUrlGenerator))
            .set_generator_for_driver("s3", Arc::new(S3UrlGenerator));
        factory
    }

    /// Registers (or replaces) the generator for a driver
    pub fn set_generator_for_driver(
        &mut self,
        driver: impl Into<String>,
        generator: Arc<dyn UrlGenerator>,
    ) -> &mut Self {
        self.generators.insert(driver.into(), generator);
        self
    }

    /// Generator for a disk, chosen by its driver
    ///
    /// # Errors
    ///
    /// Returns [`UrlError::GeneratorNotFound`] if the driver has no generator
    pub fn generator_for(&self, disk: &str, config: &DiskConfig) -> UrlResult<&dyn UrlGenerator> {
        self.generators
            .get(&config.driver)
            .map(AsRef::as_ref)
            .ok_or_else(|| UrlError::GeneratorNotFound {
                disk: disk.to_string(),
                driver: config.driver.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Visibility;
    use crate::url::UrlTarget;

    struct FixedUrl;

    impl UrlGenerator for FixedUrl {
        fn absolute_path(&self, target: &UrlTarget<'_>) -> UrlResult<String> {
            Ok(format!("mem://{}", target.path))
        }

        fn url(&self, target: &UrlTarget<'_>) -> UrlResult<String> {
            Ok(format!("https://files.test/{}", target.path))
        }
    }

    #[test]
    fn test_unknown_driver() {
        let factory = UrlGeneratorFactory::new();
        let config = DiskConfig {
            driver: "ftp".to_string(),
            ..DiskConfig::default()
        };
        let err = factory.generator_for("remote", &config).err().unwrap();
        assert!(matches!(
            err,
            UrlError::GeneratorNotFound { ref disk, ref driver } if disk == "remote" && driver == "ftp"
        ));
    }

    #[test]
    fn test_custom_generator() {
        let mut factory = UrlGeneratorFactory::new();
        factory.set_generator_for_driver("memory", Arc::new(FixedUrl));

        let config = DiskConfig {
            driver: "memory".to_string(),
            ..DiskConfig::default()
        };
        let target = UrlTarget {
            disk: "mem",
            config: &config,
            path: "a.txt",
            visibility: Visibility::Public,
        };
        let generator = factory.generator_for("mem", &config).unwrap();
        assert_eq!(generator.url(&target).unwrap(), "https://files.test/a.txt");
        assert_eq!(generator.absolute_path(&target).unwrap(), "mem://a.txt");
    }
}
