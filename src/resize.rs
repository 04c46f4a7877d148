//! Resize orchestration: request in, URL of a suitably sized image out.
//!
//! ## Flow
//!
//! ```text
//! request ─► validate ─► locate under upload root ─► probe source
//!                                                        │
//!        ┌───────────────────────────────────────────────┘
//!        ▼
//!  compute geometry ─► fits already? ──yes──► original
//!                           │ no
//!                           ▼
//!           crop satisfiable and within
//!           max_dimension?  ──no──► DimensionsUnresolvable
//!                           │ yes
//!                           ▼
//!                   cached artifact? ──yes──► cached
//!                           │ no
//!                           ▼
//!                   backend resize → atomic persist ─► resized
//! ```
//!
//! The original wins whenever the fit check says so, including when no
//! geometry could be computed at all (e.g. a crop box larger than the
//! source on both axes). Only a crop that *could* partly be honored but
//! would come out smaller than requested is an error.
//!
//! Upscaling is a per-request flag passed straight to the dimension
//! math, so concurrent requests with different flags never interact.
//! The only state shared between calls is the [`InFlight`] guard, which
//! keeps two identical cache misses from encoding the same artifact twice.

use crate::cache::{self, CacheError, InFlight};
use crate::config::{OutputConfig, ResizerConfig};
use crate::imaging::{
    BackendError, ImageBackend, Quality, ResizeParams, RustBackend, TargetSize, Unresolvable,
    compute_geometry, ensure_crop_satisfiable, ensure_within_limit, needs_resize,
};
use crate::upload::{LocalImage, UploadRoot};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ResizeError {
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),
    #[error("{url} is not under the upload root")]
    NotLocalImage { url: String },
    #[error("image not found at {}: {reason}", path.display())]
    ImageNotFound { path: PathBuf, reason: String },
    #[error("cannot resize {url}: {source}")]
    DimensionsUnresolvable {
        url: String,
        #[source]
        source: Unresolvable,
    },
    #[error("image backend cannot process {}: {source}", path.display())]
    EditorUnavailable {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("failed to save {}: {source}", path.display())]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A request to resize one uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeRequest {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Hard crop to exactly the requested box instead of fitting inside it.
    pub crop: bool,
    /// Allow a hard crop to produce an image larger than the source.
    /// Ignored without `crop`: fitting never enlarges.
    pub upscale: bool,
    /// Return just the URL rather than `{url, width, height}`.
    pub single: bool,
}

impl ResizeRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: None,
            height: None,
            crop: false,
            upscale: false,
            single: true,
        }
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn crop(mut self, crop: bool) -> Self {
        self.crop = crop;
        self
    }

    pub fn upscale(mut self, upscale: bool) -> Self {
        self.upscale = upscale;
        self
    }

    /// Ask for `{url, width, height}` instead of the bare URL.
    pub fn tuple(mut self) -> Self {
        self.single = false;
        self
    }

    /// Check required fields and normalize zero sizes to "unspecified".
    fn target(&self) -> Result<TargetSize, ResizeError> {
        if self.url.trim().is_empty() {
            return Err(ResizeError::MissingParameter("url"));
        }
        let width = self.width.filter(|&w| w > 0);
        let height = self.height.filter(|&h| h > 0);
        if width.is_none() && height.is_none() {
            return Err(ResizeError::MissingParameter("width or height"));
        }
        Ok(TargetSize::new(width, height))
    }
}

/// A probed source image. Read-only for the life of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub path: PathBuf,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub extension: Option<String>,
}

impl SourceImage {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// How a result was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The source already satisfies the request.
    Original,
    /// A previously produced artifact was reused.
    Cached,
    /// A new artifact was encoded.
    Resized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResizeResult {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub outcome: Outcome,
}

/// A result in the shape the request asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeOutput {
    Single(String),
    Tuple(ResizeResult),
}

impl ResizeOutput {
    pub fn url(&self) -> &str {
        match self {
            ResizeOutput::Single(url) => url,
            ResizeOutput::Tuple(result) => &result.url,
        }
    }
}

/// Resizes uploads under one upload root with one backend.
pub struct Resizer<B: ImageBackend = RustBackend> {
    uploads: UploadRoot,
    backend: B,
    quality: Quality,
    max_dimension: u32,
    in_flight: InFlight,
}

impl Resizer<RustBackend> {
    pub fn from_config(config: &ResizerConfig) -> Self {
        Self::new(
            UploadRoot::from_config(&config.uploads),
            RustBackend::new(),
            Quality::new(config.output.quality),
        )
        .with_max_dimension(config.output.max_dimension)
    }
}

impl<B: ImageBackend> Resizer<B> {
    pub fn new(uploads: UploadRoot, backend: B, quality: Quality) -> Self {
        Self {
            uploads,
            backend,
            quality,
            max_dimension: OutputConfig::default().max_dimension,
            in_flight: InFlight::new(),
        }
    }

    /// Refuse to produce copies wider or taller than `max` pixels.
    pub fn with_max_dimension(mut self, max: u32) -> Self {
        self.max_dimension = max;
        self
    }

    pub fn uploads(&self) -> &UploadRoot {
        &self.uploads
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run a request and shape the result as it asked.
    ///
    /// Failures are logged at `warn` with the requested URL before being
    /// returned.
    pub fn process(&self, request: &ResizeRequest) -> Result<ResizeOutput, ResizeError> {
        match self.resize(request) {
            Ok(result) if request.single => Ok(ResizeOutput::Single(result.url)),
            Ok(result) => Ok(ResizeOutput::Tuple(result)),
            Err(e) => {
                warn!(url = %request.url, error = %e, "could not process image");
                Err(e)
            }
        }
    }

    /// [`process`](Self::process) with every failure collapsed to `None`.
    pub fn process_or_none(&self, request: &ResizeRequest) -> Option<ResizeOutput> {
        self.process(request).ok()
    }

    /// [`process`](Self::process) reduced to success or failure.
    pub fn process_ok(&self, request: &ResizeRequest) -> bool {
        self.process(request).is_ok()
    }

    /// Where the `{width}x{height}` artifact of `url` lives, on disk and by URL.
    ///
    /// Pure naming: nothing is probed or written.
    pub fn cache_location(
        &self,
        url: &str,
        width: u32,
        height: u32,
    ) -> Result<LocalImage, ResizeError> {
        Ok(self.uploads.locate(url)?.sized(width, height))
    }

    /// Run a request, always returning the full result.
    pub fn resize(&self, request: &ResizeRequest) -> Result<ResizeResult, ResizeError> {
        let target = request.target()?;
        let image = self.uploads.locate(&request.url)?;
        let source = self.probe(&image, &request.url)?;

        let geometry = compute_geometry(source.size(), target, request.crop, request.upscale);
        let dims = match geometry {
            Some(dims) if needs_resize(true, source.size(), target) => dims,
            _ => {
                debug!(url = %source.url, "source already fits, returning original");
                return Ok(ResizeResult {
                    url: source.url,
                    width: source.width,
                    height: source.height,
                    outcome: Outcome::Original,
                });
            }
        };

        ensure_crop_satisfiable(&dims, target, request.crop, request.upscale)
            .and_then(|()| ensure_within_limit(&dims, self.max_dimension))
            .map_err(|e| ResizeError::DimensionsUnresolvable {
                url: request.url.clone(),
                source: e,
            })?;

        let artifact = image.sized(dims.width, dims.height);
        let dest = artifact.path();

        if let Some(result) = self.lookup(&artifact, &dest) {
            return Ok(result);
        }

        let _guard = self.in_flight.acquire(&dest);
        // Another request may have produced it while we waited.
        if let Some(result) = self.lookup(&artifact, &dest) {
            return Ok(result);
        }

        let params = |output: &Path| ResizeParams {
            source: source.path.clone(),
            output: output.to_path_buf(),
            crop: dims.crop,
            width: dims.width,
            height: dims.height,
            quality: self.quality,
        };
        cache::write_atomically(&dest, |temp| self.backend.resize(&params(temp)))
            .map_err(|e| save_error(&dest, e))?;

        info!(
            source = %source.path.display(),
            artifact = %dest.display(),
            width = dims.width,
            height = dims.height,
            "resized image"
        );
        Ok(ResizeResult {
            url: artifact.url(),
            width: dims.width,
            height: dims.height,
            outcome: Outcome::Resized,
        })
    }

    /// Confirm the source is a readable image and record its dimensions.
    fn probe(&self, image: &LocalImage, url: &str) -> Result<SourceImage, ResizeError> {
        let path = image.path();
        if !path.is_file() {
            return Err(ResizeError::ImageNotFound {
                path,
                reason: "no such file".into(),
            });
        }
        let dims = self
            .backend
            .identify(&path)
            .map_err(|e| ResizeError::ImageNotFound {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        Ok(SourceImage {
            path,
            url: url.to_string(),
            width: dims.width,
            height: dims.height,
            extension: image.extension().map(str::to_string),
        })
    }

    fn lookup(&self, artifact: &LocalImage, dest: &Path) -> Option<ResizeResult> {
        let Some(found) = cache::find_cached(&self.backend, dest) else {
            debug!(path = %dest.display(), "cache miss");
            return None;
        };
        debug!(path = %dest.display(), "cache hit");
        Some(ResizeResult {
            url: artifact.url(),
            width: found.width,
            height: found.height,
            outcome: Outcome::Cached,
        })
    }
}

/// Split persistence failures into "backend couldn't do it" and "disk said no".
fn save_error(dest: &Path, error: CacheError) -> ResizeError {
    let path = dest.to_path_buf();
    match error {
        CacheError::Io(source) | CacheError::Backend(BackendError::Io(source)) => {
            ResizeError::SaveFailed { path, source }
        }
        CacheError::Backend(source) => ResizeError::EditorUnavailable { path, source },
    }
}
