//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only, no decode) |
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` at configured quality |
//! | Encode PNG, GIF, TIFF, WebP | `image::DynamicImage::write_to` (lossless) |
//!
//! Output format always matches the source extension, so a `.png` upload
//! produces `.png` cache artifacts.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::ResizeParams;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions we expect to round-trip (decode and re-encode).
const CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED: LazyLock<Vec<(&'static str, ImageFormat)>> = LazyLock::new(|| {
    CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled() && fmt.writing_enabled())
        .copied()
        .collect()
});

/// Returns the file extensions this backend can both decode and encode.
pub fn supported_extensions() -> Vec<&'static str> {
    SUPPORTED.iter().map(|(ext, _)| *ext).collect()
}

fn format_for(path: &Path) -> Result<ImageFormat, BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    SUPPORTED
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, fmt)| *fmt)
        .ok_or(BackendError::Unsupported(ext))
}

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk, sniffing the format from its contents.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode to `path` in the format implied by its extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let format = format_for(path)?;
    let file = std::fs::File::create(path)?;
    let mut writer = BufWriter::new(file);

    let result = match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, quality as u8);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        ImageFormat::WebP => DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut writer, format),
        other => img.write_to(&mut writer, other),
    };
    result.map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to encode {}: {}", path.display(), e))
    })?;
    writer.flush()?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::open(path)?
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
            })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        // Fail before decoding if we can't write the output format anyway
        format_for(&params.output)?;

        let img = load_image(&params.source)?;
        let cropped = match params.crop {
            Some(rect) => img.crop_imm(rect.x, rect.y, rect.width, rect.height),
            None => img,
        };
        let resized = cropped.resize_exact(params.width, params.height, FilterType::Lanczos3);
        save_image(&resized, &params.output, params.quality.value())
    }
}
