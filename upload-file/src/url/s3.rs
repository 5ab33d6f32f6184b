//! URLs for S3 disks

use super::{join_url, UrlGenerator, UrlResult, UrlTarget};

/// URLs for `s3` disks
///
/// The disk `root`, when set, is used as a key prefix. URLs use the disk's
/// `url` when configured (CDN, custom domain) and the virtual-hosted bucket
/// endpoint otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct S3UrlGenerator;

impl S3UrlGenerator {
    fn key(target: &UrlTarget<'_>) -> String {
        let path = target.path.trim_start_matches('/');
        match target.config.root.as_deref().and_then(|root| root.to_str()) {
            Some(prefix) if !prefix.trim_matches('/').is_empty() => {
                format!("{}/{path}", prefix.trim_matches('/'))
            }
            _ => path.to_string(),
        }
    }

    fn bucket<'a>(target: &UrlTarget<'a>) -> UrlResult<&'a str> {
        target
            .config
            .bucket
            .as_deref()
            .ok_or_else(|| target.missing("bucket"))
    }
}

impl UrlGenerator for S3UrlGenerator {
    fn absolute_path(&self, target: &UrlTarget<'_>) -> UrlResult<String> {
        Ok(format!("s3://{}/{}", Self::bucket(target)?, Self::key(target)))
    }

    fn url(&self, target: &UrlTarget<'_>) -> UrlResult<String> {
        let key = Self::key(target);
        if let Some(base) = target.config.url.as_deref() {
            return Ok(join_url(base, &key));
        }

        let bucket = Self::bucket(target)?;
        Ok(match target.config.region.as_deref() {
            Some(region) => format!("https://{bucket}.s3.{region}.amazonaws.com/{key}"),
            None => format!("https://{bucket}.s3.amazonaws.com/{key}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiskConfig;
    use crate::storage::Visibility;
    use crate::url::UrlError;
    use std::path::PathBuf;

    fn s3_disk() -> DiskConfig {
        DiskConfig {
            driver: "s3".to_string(),
            bucket: Some("media".to_string()),
            region: Some("eu-west-1".to_string()),
            visibility: Visibility::Public,
            ..DiskConfig::default()
        }
    }

    fn target(config: &DiskConfig) -> UrlTarget<'_> {
        UrlTarget {
            disk: "s3",
            config,
            path: "foo/bar.png",
            visibility: Visibility::Public,
        }
    }

    #[test]
    fn test_bucket_endpoint() {
        let config = s3_disk();
        assert_eq!(
            S3UrlGenerator.url(&target(&config)).unwrap(),
            "https://media.s3.eu-west-1.amazonaws.com/foo/bar.png"
        );
        assert_eq!(
            S3UrlGenerator.absolute_path(&target(&config)).unwrap(),
            "s3://media/foo/bar.png"
        );
    }

    #[test]
    fn test_root_prefix_and_custom_url() {
        let config = DiskConfig {
            root: Some(PathBuf::from("/tenant-a/")),
            url: Some("https://cdn.example.com".to_string()),
            ..s3_disk()
        };
        assert_eq!(
            S3UrlGenerator.url(&target(&config)).unwrap(),
            "https://cdn.example.com/tenant-a/foo/bar.png"
        );
        assert_eq!(
            S3UrlGenerator.absolute_path(&target(&config)).unwrap(),
            "s3://media/tenant-a/foo/bar.png"
        );
    }

    #[test]
    fn test_missing_bucket() {
        let config = DiskConfig {
            bucket: None,
            ..s3_disk()
        };
        let err = S3UrlGenerator.url(&target(&config)).unwrap_err();
        assert!(matches!(err, UrlError::MissingDiskConfig { key: "bucket", .. }));
    }
}
