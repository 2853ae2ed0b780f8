//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by whatever keys the user's file sets.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [cropper]
//! default_aspect = "16:9"    # free | 1:1 | 4:3 | 16:9 | 3:4 | 9:16
//!
//! [output]
//! prefer_webp = true         # false = always upload the baseline JPEG
//! manifest = "manifest.json" # Upload manifest written next to the images
//! ```
//!
//! The 10 MB upload cap and the JPEG quality (0.95) are fixed and cannot be
//! configured.
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want:
//!
//! ```toml
//! [output]
//! prefer_webp = false
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::AspectRatio;
use crate::registry::RegistryOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    /// Cropper defaults.
    pub cropper: CropperConfig,
    /// Encoding and output settings.
    pub output: OutputConfig,
}

impl CropConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let manifest = self.output.manifest.trim();
        if manifest.is_empty() {
            return Err(ConfigError::Validation(
                "output.manifest must not be empty".into(),
            ));
        }
        if manifest.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "output.manifest must be a file name, not a path".into(),
            ));
        }
        Ok(())
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            default_aspect: self.cropper.default_aspect,
            prefer_webp: self.output.prefer_webp,
        }
    }
}

/// Cropper defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropperConfig {
    /// Aspect preset selected when a crop opens.
    pub default_aspect: AspectRatio,
}

/// Encoding and output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Try WebP before falling back to JPEG.
    pub prefer_webp: bool,
    /// File name of the upload manifest.
    pub manifest: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefer_webp: true,
            manifest: "manifest.json".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(CropConfig::default())
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
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
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
) -> Result<CropConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CropConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the defaults.
pub fn load_config(dir: &Path) -> Result<CropConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(dir)?;
    if overlay.is_some() {
        tracing::debug!(dir = %dir.display(), "Loaded {CONFIG_FILE_NAME}");
    }
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# portal-crop Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
#
# Fixed, not configurable: uploads above 10 MB are rejected, and the
# baseline JPEG is always encoded at quality 0.95.

# ---------------------------------------------------------------------------
# Cropper
# ---------------------------------------------------------------------------
[cropper]
# Aspect preset selected when a crop opens.
# One of: "free", "1:1", "4:3", "16:9", "3:4", "9:16".
default_aspect = "16:9"

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Re-encode every crop as WebP. When the WebP encode fails the JPEG is
# used instead; set to false to always keep the JPEG.
prefer_webp = true

# File name of the upload manifest written next to the images.
manifest = "manifest.json"
"##
}
