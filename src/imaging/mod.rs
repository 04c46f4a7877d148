//! Image processing: dimension math plus a pluggable pixel backend.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Crop** | `DynamicImage::crop_imm` |
//! | **Scale** | `DynamicImage::resize_exact` (Lanczos3) |
//! | **Encode** | `JpegEncoder` with quality, format by extension otherwise |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    ResolvedDimensions, TargetSize, Unresolvable, compute_geometry, ensure_crop_satisfiable,
    ensure_within_limit, needs_resize, resolve_dimensions,
};
pub use params::{CropRect, Quality, ResizeParams};
pub use rust_backend::{RustBackend, supported_extensions};
