//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Resize (single)
//!
//! The bare URL, so the command composes with shell substitution:
//!
//! ```text
//! http://localhost/uploads/2024/dawn-400x300.jpg
//! ```
//!
//! ## Resize (tuple)
//!
//! ```text
//! http://localhost/uploads/2024/dawn-400x300.jpg
//!     Size: 400x300
//!     Status: resized
//! ```
//!
//! With `--json` the tuple is printed as one JSON object instead.
//!
//! ## Cache path
//!
//! ```text
//! Path: uploads/2024/dawn-400x300.jpg
//! URL:  http://localhost/uploads/2024/dawn-400x300.jpg
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::resize::{Outcome, ResizeOutput, ResizeResult};
use crate::upload::LocalImage;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Original => "original",
        Outcome::Cached => "cached",
        Outcome::Resized => "resized",
    }
}

// ============================================================================
// Resize output
// ============================================================================

/// Format a resize result in the shape the request asked for.
pub fn format_resize_output(output: &ResizeOutput) -> Vec<String> {
    match output {
        ResizeOutput::Single(url) => vec![url.clone()],
        ResizeOutput::Tuple(result) => vec![
            result.url.clone(),
            format!("{}Size: {}x{}", indent(1), result.width, result.height),
            format!("{}Status: {}", indent(1), outcome_label(result.outcome)),
        ],
    }
}

/// Format a tuple result as a single-line JSON object.
pub fn format_resize_json(result: &ResizeResult) -> Result<String, serde_json::Error> {
    serde_json::to_string(result)
}

/// Print resize output to stdout.
pub fn print_resize_output(output: &ResizeOutput) {
    for line in format_resize_output(output) {
        println!("{}", line);
    }
}

// ============================================================================
// Cache path output
// ============================================================================

/// Format the on-disk path and public URL of a cache artifact.
pub fn format_cache_location(location: &LocalImage) -> Vec<String> {
    vec![
        format!("Path: {}", location.path().display()),
        format!("URL:  {}", location.url()),
    ]
}

/// Print a cache location to stdout.
pub fn print_cache_location(location: &LocalImage) {
    for line in format_cache_location(location) {
        println!("{}", line);
    }
}
