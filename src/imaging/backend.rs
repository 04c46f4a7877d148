//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the resizer needs
//! from an image library: `identify` (header probe) and `resize` (crop +
//! scale + encode to a file).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and built on the
//! `image` crate. Tests use the recording mock in [`tests`].

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// No codec compiled in for the format.
    #[error("Unsupported format: {0}")]
    Unsupported(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can serve concurrent requests.
pub trait ImageBackend: Sync {
    /// Read image dimensions from the file header.
    ///
    /// Fails on missing, empty, truncated or non-image files, which is what
    /// makes it usable as a validity probe for cache artifacts.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Crop (optional), scale to the exact target size, and encode to
    /// `params.output` in the format implied by its extension.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
