//! The managed upload root and URL → file mapping.
//!
//! Only images under the configured upload root are ever resized. An upload
//! root pairs a directory on disk with the URL it is served from:
//!
//! ```text
//! base_dir = /srv/site/uploads        base_url = https://example.com/uploads
//!
//! https://example.com/uploads/2024/05/dawn.jpg
//!                            └──────┬───────┘
//!                             relative path → /srv/site/uploads/2024/05/dawn.jpg
//! ```
//!
//! The base URL's scheme is aligned with the requested URL first (see
//! [`scheme::reconcile`](crate::scheme::reconcile)), so `http`, `https` and
//! protocol-relative references to the same upload all resolve.

use crate::config::UploadsConfig;
use crate::naming;
use crate::resize::ResizeError;
use crate::scheme;
use std::path::{Component, Path, PathBuf};

/// Directory on disk plus the URL it is published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRoot {
    base_dir: PathBuf,
    /// Stored without a trailing slash.
    base_url: String,
}

impl UploadRoot {
    pub fn new(base_dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_dir: base_dir.into(),
            base_url,
        }
    }

    pub fn from_config(config: &UploadsConfig) -> Self {
        Self::new(config.base_dir.clone(), config.base_url.clone())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Map a requested URL onto a file under the upload root.
    ///
    /// Fails with [`ResizeError::NotLocalImage`] when the URL is not under
    /// the (scheme-reconciled) base URL, names the root itself, or has a
    /// path that could resolve outside it (`..`, `.`, empty segments,
    /// backslashes, drive prefixes). Query strings and fragments are
    /// ignored. No filesystem access.
    pub fn locate(&self, url: &str) -> Result<LocalImage, ResizeError> {
        let not_local = || ResizeError::NotLocalImage {
            url: url.to_string(),
        };

        let base_url = scheme::reconcile(url, &self.base_url);
        let rest = url.strip_prefix(base_url.as_str()).ok_or_else(not_local)?;
        let rest = rest.split(['?', '#']).next().unwrap_or("");
        // Require a separator so `/uploads-old/x.jpg` doesn't match `/uploads`
        let relative = rest.strip_prefix('/').ok_or_else(not_local)?;

        if !stays_under_root(relative) {
            return Err(not_local());
        }

        Ok(LocalImage {
            base_dir: self.base_dir.clone(),
            base_url,
            relative: relative.to_string(),
        })
    }
}

/// Lexical check that `relative` can only name a file below the root.
///
/// Every `/`-separated segment must be a plain, non-empty name, and the
/// whole path must parse as nothing but [`Component::Normal`] parts, since
/// joining an absolute or prefixed path onto `base_dir` would replace it.
/// The path is never canonicalized.
fn stays_under_root(relative: &str) -> bool {
    let plain_segments = relative.split('/').all(|segment| {
        !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\')
    });
    plain_segments
        && Path::new(relative)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

/// A file under the upload root, addressable both on disk and by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImage {
    base_dir: PathBuf,
    /// Base URL with the requester's scheme.
    base_url: String,
    relative: String,
}

impl LocalImage {
    /// Path relative to the upload root, `/`-separated.
    pub fn relative(&self) -> &str {
        &self.relative
    }

    pub fn path(&self) -> PathBuf {
        self.base_dir.join(&self.relative)
    }

    pub fn url(&self) -> String {
        format!("{}/{}", self.base_url, self.relative)
    }

    pub fn extension(&self) -> Option<&str> {
        naming::extension(&self.relative)
    }

    /// The `{width}x{height}` variant of this image, in the same directory.
    pub fn sized(&self, width: u32, height: u32) -> LocalImage {
        LocalImage {
            base_dir: self.base_dir.clone(),
            base_url: self.base_url.clone(),
            relative: naming::sized_variant(&self.relative, width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> UploadRoot {
        UploadRoot::new("/srv/uploads", "http://example.com/wp-content/uploads/")
    }

    #[test]
    fn new_trims_trailing_slash() {
        assert_eq!(root().base_url(), "http://example.com/wp-content/uploads");
    }

    #[test]
    fn locate_maps_url_to_path() {
        let image = root()
            .locate("http://example.com/wp-content/uploads/2024/05/dawn.jpg")
            .unwrap();
        assert_eq!(image.relative(), "2024/05/dawn.jpg");
        assert_eq!(image.path(), PathBuf::from("/srv/uploads/2024/05/dawn.jpg"));
        assert_eq!(image.extension(), Some("jpg"));
    }

    #[test]
    fn locate_accepts_https_request() {
        let image = root()
            .locate("https://example.com/wp-content/uploads/dawn.jpg")
            .unwrap();
        assert_eq!(
            image.url(),
            "https://example.com/wp-content/uploads/dawn.jpg"
        );
    }

    #[test]
    fn locate_accepts_protocol_relative_request() {
        let image = root()
            .locate("//example.com/wp-content/uploads/dawn.jpg")
            .unwrap();
        assert_eq!(image.url(), "//example.com/wp-content/uploads/dawn.jpg");
    }

    #[test]
    fn locate_rejects_foreign_host() {
        let result = root().locate("http://cdn.other.com/wp-content/uploads/dawn.jpg");
        assert!(matches!(result, Err(ResizeError::NotLocalImage { .. })));
    }

    #[test]
    fn locate_rejects_sibling_directory_with_shared_prefix() {
        let result = root().locate("http://example.com/wp-content/uploads-old/dawn.jpg");
        assert!(matches!(result, Err(ResizeError::NotLocalImage { .. })));
    }

    #[test]
    fn locate_rejects_parent_traversal() {
        let result = root().locate("http://example.com/wp-content/uploads/../../etc/passwd");
        assert!(matches!(result, Err(ResizeError::NotLocalImage { .. })));
    }

    #[test]
    fn locate_rejects_absolute_segment() {
        let image = root().locate("http://example.com/wp-content/uploads//tmp/evil.jpg");
        assert!(matches!(image, Err(ResizeError::NotLocalImage { .. })));
    }

    #[test]
    fn locate_rejects_empty_and_dot_segments() {
        for url in [
            "http://example.com/wp-content/uploads/2024//dawn.jpg",
            "http://example.com/wp-content/uploads/./dawn.jpg",
            "http://example.com/wp-content/uploads/2024/./dawn.jpg",
        ] {
            assert!(
                matches!(root().locate(url), Err(ResizeError::NotLocalImage { .. })),
                "{url}"
            );
        }
    }

    #[test]
    fn locate_rejects_backslashes() {
        for url in [
            "http://example.com/wp-content/uploads/\\tmp\\evil.jpg",
            "http://example.com/wp-content/uploads/2024/..\\..\\evil.jpg",
            "http://example.com/wp-content/uploads/C:\\evil.jpg",
        ] {
            assert!(
                matches!(root().locate(url), Err(ResizeError::NotLocalImage { .. })),
                "{url}"
            );
        }
    }

    #[test]
    fn located_paths_stay_under_base_dir() {
        let image = root()
            .locate("http://example.com/wp-content/uploads/2024/05/dawn.jpg")
            .unwrap();
        assert!(image.path().starts_with("/srv/uploads"));
        assert!(image.sized(10, 10).path().starts_with("/srv/uploads"));
    }

    #[test]
    fn locate_rejects_root_and_directories() {
        assert!(root().locate("http://example.com/wp-content/uploads/").is_err());
        assert!(root().locate("http://example.com/wp-content/uploads").is_err());
        assert!(root().locate("http://example.com/wp-content/uploads/2024/").is_err());
    }

    #[test]
    fn locate_drops_query_and_fragment() {
        let image = root()
            .locate("http://example.com/wp-content/uploads/dawn.jpg?ver=3#top")
            .unwrap();
        assert_eq!(image.relative(), "dawn.jpg");
    }

    #[test]
    fn sized_variant_shares_directory_and_scheme() {
        let image = root()
            .locate("https://example.com/wp-content/uploads/2024/dawn.jpg")
            .unwrap();
        let variant = image.sized(400, 300);
        assert_eq!(variant.relative(), "2024/dawn-400x300.jpg");
        assert_eq!(
            variant.path(),
            PathBuf::from("/srv/uploads/2024/dawn-400x300.jpg")
        );
        assert_eq!(
            variant.url(),
            "https://example.com/wp-content/uploads/2024/dawn-400x300.jpg"
        );
    }
}
