//! Pure calculation functions for resize geometry.
//!
//! All functions here are pure and testable without any I/O or images. Their
//! output depends only on the source dimensions and the request, which is what
//! makes cache naming deterministic: the same request against the same source
//! always lands on the same `{w}x{h}` artifact.
//!
//! ## Resolution pipeline
//!
//! ```text
//! compute_geometry ──► needs_resize ──► ensure_crop_satisfiable
//!   (dest size,          (skip when the     (crop smaller than the
//!    crop rect)           original fits)     request is an error)
//! ```
//!
//! [`resolve_dimensions`] composes the first and last steps for callers that
//! don't need the fit decision in between.

use super::params::CropRect;
use thiserror::Error;

/// Requested target size. A missing axis is derived from the source aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl TargetSize {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self { width, height }
    }

    /// Zero means "unconstrained", same as absent.
    fn raw(self) -> (u32, u32) {
        (self.width.unwrap_or(0), self.height.unwrap_or(0))
    }
}

/// Final destination size plus the source region that maps onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDimensions {
    pub width: u32,
    pub height: u32,
    /// Present for hard crops; soft crops scale the whole source.
    pub crop: Option<CropRect>,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolvable {
    #[error("no resize geometry (degenerate input or destination equals source)")]
    NoGeometry,
    #[error("source too small to crop to the requested size without upscaling (best fit {width}x{height})")]
    CropExceedsSource { width: u32, height: u32 },
    #[error("destination {width}x{height} exceeds the {max}px limit")]
    ExceedsLimit { width: u32, height: u32, max: u32 },
}

/// Compute destination dimensions and crop geometry.
///
/// With `upscale && crop` the destination may exceed the source resolution
/// (see [`upscale_geometry`]); otherwise the baseline algorithm never
/// enlarges. Returns `None` when no meaningful resize exists.
pub fn compute_geometry(
    source: (u32, u32),
    target: TargetSize,
    crop: bool,
    upscale: bool,
) -> Option<ResolvedDimensions> {
    if upscale && crop {
        upscale_geometry(source, target)
    } else {
        baseline_geometry(source, target, crop)
    }
}

/// Fail when a hard crop without upscaling came out smaller than requested.
///
/// The source can't cover the requested box at native resolution, and
/// silently returning a smaller crop would hand the caller the wrong size.
pub fn ensure_crop_satisfiable(
    dims: &ResolvedDimensions,
    target: TargetSize,
    crop: bool,
    upscale: bool,
) -> Result<(), Unresolvable> {
    let short_w = target.width.is_some_and(|w| dims.width < w);
    let short_h = target.height.is_some_and(|h| dims.height < h);
    if crop && !upscale && (short_w || short_h) {
        return Err(Unresolvable::CropExceedsSource {
            width: dims.width,
            height: dims.height,
        });
    }
    Ok(())
}

/// Fail when either destination axis is larger than `max` pixels.
///
/// Upscaling takes the requested size as given, so this is the only bound
/// on how much memory the backend allocates for one request.
pub fn ensure_within_limit(dims: &ResolvedDimensions, max: u32) -> Result<(), Unresolvable> {
    if dims.width > max || dims.height > max {
        return Err(Unresolvable::ExceedsLimit {
            width: dims.width,
            height: dims.height,
            max,
        });
    }
    Ok(())
}

/// [`compute_geometry`] followed by [`ensure_crop_satisfiable`].
pub fn resolve_dimensions(
    source: (u32, u32),
    target: TargetSize,
    crop: bool,
    upscale: bool,
) -> Result<ResolvedDimensions, Unresolvable> {
    let dims = compute_geometry(source, target, crop, upscale).ok_or(Unresolvable::NoGeometry)?;
    ensure_crop_satisfiable(&dims, target, crop, upscale)?;
    Ok(dims)
}

/// Decide whether a resize artifact should be produced at all.
///
/// Skips when resolution failed, or when the three fit conditions combine
/// under the chained exclusive-or below:
///
/// - A: height unspecified and source width equals requested width
/// - B: width unspecified and source height equals requested height
/// - C: source width and height both equal the request
///
/// `skip = !resolved || ((A ^ B) ^ C)`. When more than one condition holds
/// the XOR chain flips back to "resize"; this matches deployed behavior and
/// is kept as-is until the intended semantics are confirmed.
pub fn needs_resize(resolved: bool, source: (u32, u32), target: TargetSize) -> bool {
    let (orig_w, orig_h) = source;
    let width_only = target.height.is_none() && target.width == Some(orig_w);
    let height_only = target.width.is_none() && target.height == Some(orig_h);
    let exact = target.width == Some(orig_w) && target.height == Some(orig_h);

    let skip = !resolved || ((width_only ^ height_only) ^ exact);
    !skip
}

/// Baseline geometry: never produces a destination larger than the source.
///
/// - `crop`: each axis is `min(requested, source)`, a missing axis follows
///   the source aspect ratio, and the crop is centered.
/// - otherwise: the source is constrained to fit the requested box.
///
/// A destination within one pixel of the source on both axes is not worth
/// producing and yields `None`.
fn baseline_geometry(
    source: (u32, u32),
    target: TargetSize,
    crop: bool,
) -> Option<ResolvedDimensions> {
    let (orig_w, orig_h) = source;
    let (dest_w, dest_h) = target.raw();
    if orig_w == 0 || orig_h == 0 || (dest_w == 0 && dest_h == 0) {
        return None;
    }

    let (new_w, new_h, rect) = if crop {
        let aspect = orig_w as f64 / orig_h as f64;
        let mut new_w = dest_w.min(orig_w);
        let mut new_h = dest_h.min(orig_h);
        if new_w == 0 {
            new_w = (new_h as f64 * aspect).round() as u32;
        }
        if new_h == 0 {
            new_h = (new_w as f64 / aspect).round() as u32;
        }
        if new_w == 0 || new_h == 0 {
            return None;
        }
        (new_w, new_h, Some(centered_crop(source, (new_w, new_h))))
    } else {
        let (w, h) = constrain_dimensions(source, (dest_w, dest_h));
        (w, h, None)
    };

    if within_one_pixel(new_w, orig_w) && within_one_pixel(new_h, orig_h) {
        return None;
    }

    Some(ResolvedDimensions {
        width: new_w,
        height: new_h,
        crop: rect,
    })
}

/// Upscale-permitting hard crop.
///
/// Trades sharpness for exact requested dimensions: the centered region of
/// the source that covers the requested box is cropped at native resolution,
/// then scaled (possibly up) to the requested size.
fn upscale_geometry(source: (u32, u32), target: TargetSize) -> Option<ResolvedDimensions> {
    let (orig_w, orig_h) = source;
    if orig_w == 0 || orig_h == 0 {
        return None;
    }
    let aspect = orig_w as f64 / orig_h as f64;
    let (mut new_w, mut new_h) = target.raw();

    if new_w == 0 {
        new_w = (new_h as f64 * aspect).round() as u32;
    }
    if new_h == 0 {
        new_h = (new_w as f64 / aspect).round() as u32;
    }
    if new_w == 0 || new_h == 0 {
        return None;
    }

    Some(ResolvedDimensions {
        width: new_w,
        height: new_h,
        crop: Some(centered_crop(source, (new_w, new_h))),
    })
}

/// Centered region of `source` that scales onto `dest` with a uniform factor.
fn centered_crop(source: (u32, u32), dest: (u32, u32)) -> CropRect {
    let (orig_w, orig_h) = (source.0 as f64, source.1 as f64);
    let (new_w, new_h) = (dest.0 as f64, dest.1 as f64);

    let size_ratio = f64::max(new_w / orig_w, new_h / orig_h);
    // The clamps only absorb float rounding; size_ratio >= new/orig per axis.
    let crop_w = (new_w / size_ratio).round().min(orig_w);
    let crop_h = (new_h / size_ratio).round().min(orig_h);

    CropRect {
        x: ((orig_w - crop_w) / 2.0).floor() as u32,
        y: ((orig_h - crop_h) / 2.0).floor() as u32,
        width: crop_w as u32,
        height: crop_h as u32,
    }
}

/// Scale `current` down to fit within `max`, preserving aspect ratio.
///
/// A zero bound leaves that axis unconstrained. Never enlarges. Results are
/// at least 1px, and a dimension that lands one pixel short of its bound
/// after rounding is snapped to the bound.
pub fn constrain_dimensions(current: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (cur_w, cur_h) = current;
    let (max_w, max_h) = max;
    if max_w == 0 && max_h == 0 {
        return current;
    }

    let mut width_ratio = 1.0;
    let mut height_ratio = 1.0;
    let mut did_width = false;
    let mut did_height = false;

    if max_w > 0 && cur_w > max_w {
        width_ratio = max_w as f64 / cur_w as f64;
        did_width = true;
    }
    if max_h > 0 && cur_h > max_h {
        height_ratio = max_h as f64 / cur_h as f64;
        did_height = true;
    }

    let smaller = f64::min(width_ratio, height_ratio);
    let larger = f64::max(width_ratio, height_ratio);

    // An unconstrained (zero) bound always fails the comparison, which
    // selects the ratio of the constrained axis.
    let overflows = (cur_w as f64 * larger).round() as u32 > max_w
        || (cur_h as f64 * larger).round() as u32 > max_h;
    let ratio = if overflows { smaller } else { larger };

    let mut w = ((cur_w as f64 * ratio).round() as u32).max(1);
    let mut h = ((cur_h as f64 * ratio).round() as u32).max(1);

    if did_width && w + 1 == max_w {
        w = max_w;
    }
    if did_height && h + 1 == max_h {
        h = max_h;
    }

    (w, h)
}

fn within_one_pixel(a: u32, b: u32) -> bool {
    a.abs_diff(b) <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(w: Option<u32>, h: Option<u32>) -> TargetSize {
        TargetSize::new(w, h)
    }

    // =========================================================================
    // Soft crop (fit) tests
    // =========================================================================

    #[test]
    fn fit_into_square_box() {
        let dims = compute_geometry((800, 600), size(Some(400), Some(400)), false, false).unwrap();
        assert_eq!((dims.width, dims.height), (400, 300));
        assert_eq!(dims.crop, None);
    }

    #[test]
    fn fit_width_only_derives_height() {
        let dims = compute_geometry((800, 600), size(Some(400), None), false, false).unwrap();
        assert_eq!((dims.width, dims.height), (400, 300));
    }

    #[test]
    fn fit_height_only_derives_width() {
        let dims = compute_geometry((800, 600), size(None, Some(300)), false, false).unwrap();
        assert_eq!((dims.width, dims.height), (400, 300));
    }

    #[test]
    fn fit_never_enlarges() {
        // Box larger than the source resolves to the source itself → no geometry
        assert_eq!(
            compute_geometry((800, 600), size(Some(1000), Some(1000)), false, false),
            None
        );
    }

    #[test]
    fn fit_portrait_into_landscape_box() {
        let dims = compute_geometry((600, 900), size(Some(400), Some(300)), false, false).unwrap();
        assert_eq!((dims.width, dims.height), (200, 300));
    }

    #[test]
    fn fit_preserves_aspect_and_stays_in_box() {
        let sources = [(800, 600), (600, 800), (1920, 1080), (333, 777), (1000, 1), (7, 5000)];
        let boxes = [(100, 100), (640, 480), (50, 900), (1, 1), (999, 3)];
        for &(ow, oh) in &sources {
            for &(bw, bh) in &boxes {
                let Some(dims) = compute_geometry((ow, oh), size(Some(bw), Some(bh)), false, false)
                else {
                    continue;
                };
                assert!(dims.width <= bw.max(1), "{ow}x{oh} in {bw}x{bh}: {dims:?}");
                assert!(dims.height <= bh.max(1), "{ow}x{oh} in {bw}x{bh}: {dims:?}");
                // Aspect within ±1px: derive each side from the other
                let expected_h = dims.width as f64 * oh as f64 / ow as f64;
                let expected_w = dims.height as f64 * ow as f64 / oh as f64;
                assert!(
                    (dims.height as f64 - expected_h).abs() <= 1.0
                        || (dims.width as f64 - expected_w).abs() <= 1.0,
                    "{ow}x{oh} in {bw}x{bh}: {dims:?}"
                );
            }
        }
    }

    #[test]
    fn constrain_width_only_scales_height() {
        // 1024 * (767/1536) = 511.33 → 511
        let (w, h) = constrain_dimensions((1536, 1024), (767, 0));
        assert_eq!(w, 767);
        assert_eq!(h, 511);
    }

    #[test]
    fn constrain_unbounded_returns_current() {
        assert_eq!(constrain_dimensions((640, 480), (0, 0)), (640, 480));
    }

    #[test]
    fn constrain_minimum_one_pixel() {
        assert_eq!(constrain_dimensions((1000, 1), (10, 0)), (10, 1));
    }

    // =========================================================================
    // Hard crop (baseline) tests
    // =========================================================================

    #[test]
    fn crop_landscape_to_square_is_centered() {
        let dims = compute_geometry((800, 600), size(Some(400), Some(400)), true, false).unwrap();
        assert_eq!((dims.width, dims.height), (400, 400));
        assert_eq!(
            dims.crop,
            Some(CropRect {
                x: 100,
                y: 0,
                width: 600,
                height: 600
            })
        );
    }

    #[test]
    fn crop_width_only_keeps_whole_source() {
        let dims = compute_geometry((800, 600), size(Some(400), None), true, false).unwrap();
        assert_eq!((dims.width, dims.height), (400, 300));
        assert_eq!(
            dims.crop,
            Some(CropRect {
                x: 0,
                y: 0,
                width: 800,
                height: 600
            })
        );
    }

    #[test]
    fn crop_caps_each_axis_at_source() {
        // Without upscale the destination can't exceed 100x50
        let dims = compute_geometry((100, 50), size(Some(80), Some(80)), true, false).unwrap();
        assert_eq!((dims.width, dims.height), (80, 50));
    }

    #[test]
    fn crop_smaller_source_is_unresolvable() {
        assert_eq!(
            resolve_dimensions((100, 50), size(Some(80), Some(80)), true, false),
            Err(Unresolvable::CropExceedsSource {
                width: 80,
                height: 50
            })
        );
    }

    #[test]
    fn crop_source_smaller_on_both_axes_has_no_geometry() {
        assert_eq!(
            resolve_dimensions((100, 50), size(Some(200), Some(200)), true, false),
            Err(Unresolvable::NoGeometry)
        );
    }

    #[test]
    fn crop_satisfiable_without_crop_flag() {
        let dims = ResolvedDimensions {
            width: 80,
            height: 50,
            crop: None,
        };
        assert!(ensure_crop_satisfiable(&dims, size(Some(80), Some(80)), false, false).is_ok());
        assert!(ensure_crop_satisfiable(&dims, size(Some(80), Some(80)), true, true).is_ok());
    }

    // =========================================================================
    // Upscale override tests
    // =========================================================================

    #[test]
    fn upscale_crop_worked_example() {
        let dims = compute_geometry((100, 50), size(Some(80), Some(80)), true, true).unwrap();
        assert_eq!((dims.width, dims.height), (80, 80));
        assert_eq!(
            dims.crop,
            Some(CropRect {
                x: 25,
                y: 0,
                width: 50,
                height: 50
            })
        );
    }

    #[test]
    fn upscale_height_only_derives_width() {
        let dims = compute_geometry((100, 50), size(None, Some(100)), true, true).unwrap();
        assert_eq!((dims.width, dims.height), (200, 100));
        assert_eq!(
            dims.crop,
            Some(CropRect {
                x: 0,
                y: 0,
                width: 100,
                height: 50
            })
        );
    }

    #[test]
    fn upscale_width_only_derives_height() {
        let dims = compute_geometry((100, 50), size(Some(300), None), true, true).unwrap();
        assert_eq!((dims.width, dims.height), (300, 150));
    }

    #[test]
    fn upscale_without_crop_uses_baseline() {
        assert_eq!(
            compute_geometry((100, 50), size(Some(200), Some(200)), false, true),
            None
        );
    }

    #[test]
    fn upscale_identical_size_still_resolves() {
        let dims = compute_geometry((800, 600), size(Some(800), Some(600)), true, true).unwrap();
        assert_eq!((dims.width, dims.height), (800, 600));
    }

    #[test]
    fn upscale_is_a_pure_function_of_inputs() {
        let a = resolve_dimensions((640, 480), size(Some(1000), Some(500)), true, true);
        let b = resolve_dimensions((640, 480), size(Some(1000), Some(500)), true, true);
        assert_eq!(a, b);
    }

    #[test]
    fn zero_sized_source_has_no_geometry() {
        assert_eq!(
            compute_geometry((0, 100), size(Some(10), Some(10)), true, true),
            None
        );
        assert_eq!(
            compute_geometry((100, 0), size(Some(10), None), false, false),
            None
        );
    }

    #[test]
    fn missing_target_has_no_geometry() {
        assert_eq!(compute_geometry((100, 100), size(None, None), false, false), None);
        assert_eq!(compute_geometry((100, 100), size(None, None), true, true), None);
    }

    #[test]
    fn upscale_to_huge_size_is_over_limit() {
        let dims = compute_geometry((1, 1), size(Some(u32::MAX), Some(u32::MAX)), true, true)
            .unwrap();
        assert_eq!(
            ensure_within_limit(&dims, 8192),
            Err(Unresolvable::ExceedsLimit {
                width: u32::MAX,
                height: u32::MAX,
                max: 8192
            })
        );
    }

    #[test]
    fn limit_is_inclusive_and_checks_each_axis() {
        let at_limit = ResolvedDimensions {
            width: 8192,
            height: 10,
            crop: None,
        };
        assert!(ensure_within_limit(&at_limit, 8192).is_ok());

        let tall = ResolvedDimensions {
            width: 10,
            height: 8193,
            crop: None,
        };
        assert!(matches!(
            ensure_within_limit(&tall, 8192),
            Err(Unresolvable::ExceedsLimit { .. })
        ));
    }

    // =========================================================================
    // needs_resize tests
    // =========================================================================

    #[test]
    fn skip_when_unresolved() {
        assert!(!needs_resize(false, (800, 600), size(Some(400), Some(300))));
    }

    #[test]
    fn skip_when_exact_match() {
        assert!(!needs_resize(true, (800, 600), size(Some(800), Some(600))));
    }

    #[test]
    fn skip_when_width_only_matches() {
        assert!(!needs_resize(true, (800, 600), size(Some(800), None)));
    }

    #[test]
    fn skip_when_height_only_matches() {
        assert!(!needs_resize(true, (800, 600), size(None, Some(600))));
    }

    #[test]
    fn resize_when_size_differs() {
        assert!(needs_resize(true, (800, 600), size(Some(400), None)));
        assert!(needs_resize(true, (800, 600), size(Some(800), Some(400))));
    }

    #[test]
    fn resize_when_only_one_axis_matches_with_both_given() {
        // Width matches but height was also given → neither A nor C holds
        assert!(needs_resize(true, (800, 600), size(Some(800), Some(300))));
    }
}
