//! Resizer configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by whatever keys the user's file sets.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [uploads]
//! base_dir = "uploads"                       # Directory holding uploaded images
//! base_url = "http://localhost/uploads"      # URL that directory is served from
//!
//! [output]
//! quality = 90                               # JPEG encoding quality (1-100)
//! max_dimension = 8192                       # Largest width or height produced
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [uploads]
//! base_url = "https://example.com/wp-content/uploads"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up inside the config directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Resizer configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizerConfig {
    /// The managed upload root.
    pub uploads: UploadsConfig,
    /// Encoding settings for generated artifacts.
    pub output: OutputConfig,
}

impl ResizerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uploads.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "uploads.base_dir must not be empty".into(),
            ));
        }
        let url = &self.uploads.base_url;
        if !["http://", "https://", "//"]
            .iter()
            .any(|prefix| url.starts_with(prefix))
        {
            return Err(ConfigError::Validation(format!(
                "uploads.base_url must start with http://, https:// or //, got {url:?}"
            )));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.output.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "output.max_dimension must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Where uploads live on disk and the URL they are served from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    /// Directory holding uploaded images. Relative paths resolve against the
    /// working directory.
    pub base_dir: PathBuf,
    /// Public URL of `base_dir`.
    pub base_url: String,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("uploads"),
            base_url: "http://localhost/uploads".to_string(),
        }
    }
}

/// Encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// JPEG encoding quality (1 = worst, 100 = best). Lossless formats ignore it.
    pub quality: u32,
    /// Largest width or height, in pixels, a resized copy may have.
    pub max_dimension: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: 90,
            max_dimension: 8192,
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ResizerConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ResizerConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ResizerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<ResizerConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Aqua Resize Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Upload root
# ---------------------------------------------------------------------------
[uploads]
# Directory holding uploaded images. Resized copies are written next to
# their originals, named <name>-<width>x<height>.<ext>.
base_dir = "uploads"

# Public URL the upload directory is served from. Only images under this
# URL are resized. http://, https:// and protocol-relative (//host/...)
# requests all match regardless of the scheme written here.
base_url = "http://localhost/uploads"

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# JPEG encoding quality (1 = worst, 100 = best). PNG, GIF, TIFF and WebP
# artifacts are lossless and ignore this.
quality = 90

# Largest width or height, in pixels, of a resized copy. Requests that would
# produce anything bigger (typically --crop --upscale to a huge box) fail
# instead of exhausting memory.
max_dimension = 8192
"##
}
