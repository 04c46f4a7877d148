//! Canonical naming for resize artifacts.
//!
//! Every resized copy lives next to its source, named after it with the
//! destination size inserted before the extension:
//!
//! - `2024/05/dawn.jpg` at 400x300 → `2024/05/dawn-400x300.jpg`
//! - `archive.v2/scan.tiff` at 80x80 → `archive.v2/scan-80x80.tiff`
//! - `README` at 10x10 → `README-10x10`
//!
//! Naming is a pure string transform on `/`-separated relative paths, with
//! no filesystem access, so the path used to look for a cached copy and the
//! path a fresh copy is written to are always the same for the same inputs.

/// Split a relative path into (directory prefix including trailing `/`, file name).
fn split_file_name(relative: &str) -> (&str, &str) {
    match relative.rfind('/') {
        Some(slash) => relative.split_at(slash + 1),
        None => ("", relative),
    }
}

/// Extension of the final path segment, without the dot.
///
/// Dotfiles (`.hidden`) have no extension.
pub fn extension(relative: &str) -> Option<&str> {
    let (_, file) = split_file_name(relative);
    match file.rfind('.') {
        Some(dot) if dot > 0 => Some(&file[dot + 1..]),
        _ => None,
    }
}

/// Relative path of the `{width}x{height}` variant of `relative`.
///
/// Only the last extension of the file name is moved; dots in directory
/// names and earlier in the file name are left alone.
pub fn sized_variant(relative: &str, width: u32, height: u32) -> String {
    let (dir, file) = split_file_name(relative);
    match extension(relative) {
        Some(ext) => {
            let stem = &file[..file.len() - ext.len() - 1];
            format!("{dir}{stem}-{width}x{height}.{ext}")
        }
        None => format!("{relative}-{width}x{height}"),
    }
}
