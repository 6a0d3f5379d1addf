//! Engine configuration.
//!
//! Handles loading, validating, and merging `squish.toml`. Stock defaults are
//! serialized to a TOML table and the user file is merged on top, so a config
//! file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! `squish.toml` in the directory passed as `--config-dir` (default: the
//! current directory). A missing file means stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [search]
//! seed_quality = 0.7        # First quality tried by the target-size search
//! min_quality = 0.01        # Lower end of the searched quality range
//! max_quality = 1.0         # Upper end of the searched quality range
//! tolerance = 0.05          # Accept results within ±5% of the target
//! max_iterations = 10       # Hard cap on encoder calls per search
//! min_range = 0.01          # Stop once the quality range is this narrow
//!
//! [defaults]
//! quality = 80              # Quality mode default (1-100)
//! dimensions_quality = 90   # Quality used when resizing (1-100)
//! conversion_quality = 90   # Quality used when converting formats (1-100)
//!
//! [limits]
//! max_pixels = 100000000    # Largest surface decoded or encoded
//! max_dimension = 10000     # Largest accepted max width / max height
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::SearchPolicy;
use crate::imaging::rust_backend::DEFAULT_MAX_PIXELS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "squish.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Engine settings loaded from `squish.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Target-size search tunables.
    pub search: SearchPolicy,
    /// Default qualities per mode.
    pub defaults: DefaultsConfig,
    /// Resource limits.
    pub limits: LimitsConfig,
}

impl Settings {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.search;
        let ordered = 0.0 < s.min_quality && s.min_quality < s.max_quality && s.max_quality <= 1.0;
        if !ordered {
            return Err(ConfigError::Validation(
                "search quality range must satisfy 0 < min_quality < max_quality <= 1".into(),
            ));
        }
        if !(s.min_quality..=s.max_quality).contains(&s.seed_quality) {
            return Err(ConfigError::Validation(
                "search.seed_quality must lie within min_quality..=max_quality".into(),
            ));
        }
        if s.tolerance.is_nan() || s.tolerance <= 0.0 || s.tolerance >= 1.0 {
            return Err(ConfigError::Validation(
                "search.tolerance must be between 0 and 1 (exclusive)".into(),
            ));
        }
        if s.max_iterations == 0 {
            return Err(ConfigError::Validation("search.max_iterations must be at least 1".into()));
        }
        if s.min_range.is_nan() || s.min_range < 0.0 {
            return Err(ConfigError::Validation("search.min_range must not be negative".into()));
        }
        for (name, value) in [
            ("defaults.quality", self.defaults.quality),
            ("defaults.dimensions_quality", self.defaults.dimensions_quality),
            ("defaults.conversion_quality", self.defaults.conversion_quality),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Validation(format!("{name} must be 1-100")));
            }
        }
        if self.limits.max_pixels == 0 || self.limits.max_dimension == 0 {
            return Err(ConfigError::Validation("limits values must be non-zero".into()));
        }
        Ok(())
    }
}

/// Default qualities (percent) for modes where the caller does not pick one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Quality mode default when no quality is given.
    pub quality: u32,
    /// Fixed quality for dimensions mode.
    pub dimensions_quality: u32,
    /// Quality for format conversion when none is given.
    pub conversion_quality: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            quality: 80,
            dimensions_quality: 90,
            conversion_quality: 90,
        }
    }
}

/// Resource limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Largest surface, in pixels, the backend will decode or render.
    pub max_pixels: u64,
    /// Upper bound for max width / max height in dimensions mode.
    pub max_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
            max_dimension: 10_000,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Settings::default()).expect("default config must serialize")
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

/// Load `squish.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no config file exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
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
) -> Result<Settings, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Settings = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load settings from `squish.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<Settings, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `squish.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Squish Configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Target-size search
# ---------------------------------------------------------------------------
# Binary search over the encoder quality (0.0-1.0) until the output lands
# within `tolerance` of the requested size.
[search]
# First quality tried.
seed_quality = 0.7

# Quality range searched.
min_quality = 0.01
max_quality = 1.0

# Accept an output within this fraction of the target (0.05 = ±5%).
tolerance = 0.05

# Hard cap on encoder calls. The closest attempt is returned when reached.
max_iterations = 10

# Stop early once the remaining quality range is narrower than this.
min_range = 0.01

# ---------------------------------------------------------------------------
# Default qualities (1-100)
# ---------------------------------------------------------------------------
[defaults]
# Used by `squish quality` when --quality is omitted.
quality = 80

# Used by `squish resize`.
dimensions_quality = 90

# Used by `squish convert` when --quality is omitted.
conversion_quality = 90

# ---------------------------------------------------------------------------
# Limits
# ---------------------------------------------------------------------------
[limits]
# Largest image surface, in pixels, that will be decoded or encoded.
max_pixels = 100000000

# Largest accepted --max-width / --max-height.
max_dimension = 10000
"##
}
