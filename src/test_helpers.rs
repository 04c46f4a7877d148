//! Shared test utilities.
//!
//! Synthetic image fixtures encoded with the `image` crate, so tests that
//! exercise the real backend never depend on checked-in binaries.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = tmp.path().join("uploads/dawn.jpg");
//! create_test_jpeg(&path, 800, 600);
//! ```

use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::Path;

fn create_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
}

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    create_parent(path);
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Create a small valid PNG file with the given dimensions and an alpha channel.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    create_parent(path);
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 200])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}
