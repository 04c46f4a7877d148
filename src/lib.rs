//! # Aqua Resize
//!
//! On-demand resizing for images in an upload directory. Ask for an uploaded
//! image at some size and get back the URL of an image that satisfies the
//! request: the original when it already fits, a previously produced copy
//! when one exists, or a freshly resized copy otherwise.
//!
//! ```no_run
//! use aqua_resize::config::ResizerConfig;
//! use aqua_resize::resize::{ResizeRequest, Resizer};
//!
//! let resizer = Resizer::from_config(&ResizerConfig::default());
//! let request = ResizeRequest::new("http://localhost/uploads/2024/dawn.jpg")
//!     .width(400)
//!     .height(400)
//!     .crop(true);
//! if let Some(output) = resizer.process_or_none(&request) {
//!     println!("{}", output.url()); // http://localhost/uploads/2024/dawn-400x400.jpg
//! }
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resize`] | Orchestration: request/result types, error kinds, the `Resizer` |
//! | [`imaging`] | Dimension math plus the pixel backend (`image` crate) |
//! | [`naming`] | Canonical `{name}-{w}x{h}.{ext}` artifact names |
//! | [`scheme`] | Aligns the upload root's URL scheme with the request's |
//! | [`upload`] | Upload root and URL → file mapping |
//! | [`cache`] | Cache-hit probing, atomic writes, per-artifact in-flight guard |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The File Is the Cache
//!
//! There is no cache index or database. A resized copy is written next to its
//! source under a name derived only from the source path and the destination
//! size, so "is it cached?" is "does a valid image exist at that name?". The
//! upload directory stays the single source of truth and can be served by any
//! static file server.
//!
//! ## Decisions Are Pure, Pixels Are Pluggable
//!
//! Everything that decides *what* to produce (destination size, crop box,
//! whether to resize at all, the artifact name) is a pure function in
//! [`imaging::calculations`] and [`naming`]. Pixel work sits behind the
//! [`imaging::ImageBackend`] trait, so orchestration is tested against a
//! recording mock and never needs to encode an image.
//!
//! ## Pure-Rust Imaging
//!
//! The production backend uses the `image` crate (Lanczos3 resampling) for
//! decoding, scaling and encoding. No ImageMagick, no GD, no system libraries.
//!
//! ## Typed Errors, Optional Collapse
//!
//! [`resize::ResizeError`] distinguishes every failure kind. Callers that only
//! care whether they got a URL use [`resize::Resizer::process_or_none`] or
//! [`resize::Resizer::process_ok`]; the error is still logged.

pub mod cache;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod resize;
pub mod scheme;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
