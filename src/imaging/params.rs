//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the resize orchestrator (which decides what artifact to
//! produce) and the [`backend`](super::backend) (which does the actual pixel
//! work). This separation allows swapping backends (e.g. for testing with a
//! mock) without changing decision logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`CropRect`]: Region of the source, in source pixels, to keep before scaling.
//! - [`ResizeParams`]: Everything a resize needs: source, output, crop region, target dimensions, quality.

use serde::Serialize;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// A rectangle within the source image, in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Parameters for a single resize: optionally crop the source, then scale
/// the result to exactly `width` x `height`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Region of the source to keep. `None` scales the whole source.
    pub crop: Option<CropRect>,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
