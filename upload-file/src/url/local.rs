//! URLs for local disks

use super::{join_url, UrlGenerator, UrlResult, UrlTarget};

/// URLs for `local` disks
///
/// The absolute path is the disk root joined with the file path; the URL is
/// the disk's `url` prefix joined with the file path.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalUrlGenerator;

impl UrlGenerator for LocalUrlGenerator {
    fn absolute_path(&self, target: &UrlTarget<'_>) -> UrlResult<String> {
        let root = target.config.root.as_ref().ok_or_else(|| target.missing("root"))?;
        Ok(root.join(target.path).display().to_string())
    }

    fn url(&self, target: &UrlTarget<'_>) -> UrlResult<String> {
        let base = target.config.url.as_deref().ok_or_else(|| target.missing("url"))?;
        Ok(join_url(base, target.path))
    }
}
