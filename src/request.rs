//! Request and result types for a single compression.
//!
//! A [`CompressionRequest`] names the output format and exactly one [`Mode`].
//! Each mode carries only its own parameters, so "exactly one mode active" is
//! a property of the type rather than a runtime check. Parameter *ranges* are
//! checked by [`CompressionRequest::validate`] before any work starts.
//!
//! | Mode | Dimensions | Quality |
//! |---|---|---|
//! | `Quality` | unchanged | caller's |
//! | `Dimensions` | fit/clamp to bounds | configured default |
//! | `TargetSize` | unchanged | searched |
//! | `FormatConversion` | unchanged | caller's or configured default |

use crate::imaging::{Dimensions, OutputFormat};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("quality must be between 1 and 100, got {0}")]
    QualityOutOfRange(u32),
    #[error("{name} must be between 1 and {max}, got {value}")]
    DimensionOutOfRange {
        name: &'static str,
        value: u32,
        max: u32,
    },
    #[error("target size must be a positive number, got {0}")]
    TargetSize(String),
    #[error("unknown size unit: {0} (expected KB or MB)")]
    SizeUnit(String),
    #[error("image is already {0}; pick a different output format")]
    SameFormat(OutputFormat),
}

/// Unit for a user-entered target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Kb,
    Mb,
}

impl SizeUnit {
    pub fn bytes_per_unit(self) -> u64 {
        match self {
            SizeUnit::Kb => 1024,
            SizeUnit::Mb => 1024 * 1024,
        }
    }
}

impl FromStr for SizeUnit {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "KB" | "K" => Ok(SizeUnit::Kb),
            "MB" | "M" => Ok(SizeUnit::Mb),
            _ => Err(ParameterError::SizeUnit(s.to_string())),
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeUnit::Kb => f.write_str("KB"),
            SizeUnit::Mb => f.write_str("MB"),
        }
    }
}

/// A target size as entered by a user, e.g. `200 KB` or `1.5 MB`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSize {
    pub value: f64,
    pub unit: SizeUnit,
}

impl TargetSize {
    pub fn new(value: f64, unit: SizeUnit) -> Self {
        Self { value, unit }
    }

    /// Convert to bytes (`KB × 1024`, `MB × 1024²`), rounding to the nearest byte.
    ///
    /// Rejects zero, negative and non-finite values, and anything that rounds
    /// to zero bytes.
    pub fn to_bytes(&self) -> Result<usize, ParameterError> {
        if !self.value.is_finite() || self.value <= 0.0 {
            return Err(ParameterError::TargetSize(format!("{} {}", self.value, self.unit)));
        }
        let bytes = (self.value * self.unit.bytes_per_unit() as f64).round();
        if bytes < 1.0 || bytes > usize::MAX as f64 {
            return Err(ParameterError::TargetSize(format!("{} {}", self.value, self.unit)));
        }
        Ok(bytes as usize)
    }
}

/// Which compression policy to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    /// Re-encode at the given quality percentage (1–100), original size.
    Quality { quality: u32 },
    /// Shrink to fit the bounds, encode at the configured default quality.
    Dimensions {
        max_width: u32,
        max_height: u32,
        preserve_aspect_ratio: bool,
    },
    /// Search the quality that brings the output near `target_bytes`.
    TargetSize { target_bytes: usize },
    /// Re-encode into a different format than the source.
    FormatConversion { quality: Option<u32> },
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Quality { .. } => "quality",
            Mode::Dimensions { .. } => "dimensions",
            Mode::TargetSize { .. } => "target size",
            Mode::FormatConversion { .. } => "format conversion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionRequest {
    pub mode: Mode,
    pub format: OutputFormat,
}

impl CompressionRequest {
    pub fn quality(format: OutputFormat, quality: u32) -> Self {
        Self {
            mode: Mode::Quality { quality },
            format,
        }
    }

    pub fn dimensions(
        format: OutputFormat,
        max_width: u32,
        max_height: u32,
        preserve_aspect_ratio: bool,
    ) -> Self {
        Self {
            mode: Mode::Dimensions {
                max_width,
                max_height,
                preserve_aspect_ratio,
            },
            format,
        }
    }

    pub fn target_size(format: OutputFormat, target_bytes: usize) -> Self {
        Self {
            mode: Mode::TargetSize { target_bytes },
            format,
        }
    }

    pub fn convert(format: OutputFormat, quality: Option<u32>) -> Self {
        Self {
            mode: Mode::FormatConversion { quality },
            format,
        }
    }

    /// Check parameter ranges. `max_dimension` bounds the width/height limits.
    pub fn validate(&self, max_dimension: u32) -> Result<(), ParameterError> {
        match self.mode {
            Mode::Quality { quality }
            | Mode::FormatConversion {
                quality: Some(quality),
            } => validate_quality(quality),
            Mode::FormatConversion { quality: None } => Ok(()),
            Mode::Dimensions {
                max_width,
                max_height,
                ..
            } => {
                validate_dimension("max width", max_width, max_dimension)?;
                validate_dimension("max height", max_height, max_dimension)
            }
            Mode::TargetSize { target_bytes: 0 } => {
                Err(ParameterError::TargetSize("0 bytes".into()))
            }
            Mode::TargetSize { .. } => Ok(()),
        }
    }
}

fn validate_quality(quality: u32) -> Result<(), ParameterError> {
    if (1..=100).contains(&quality) {
        Ok(())
    } else {
        Err(ParameterError::QualityOutOfRange(quality))
    }
}

fn validate_dimension(name: &'static str, value: u32, max: u32) -> Result<(), ParameterError> {
    if (1..=max).contains(&value) {
        Ok(())
    } else {
        Err(ParameterError::DimensionOutOfRange { name, value, max })
    }
}

/// How well a result satisfies its request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fit {
    /// The request was met as asked.
    Exact,
    /// Target-size search ran out of iterations or quality range before
    /// landing within tolerance; the closest attempt is returned.
    BestEffort,
}

/// Encoded output of one successful compression.
///
/// Immutable once built; `byte_size()` is always the length of the bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionResult {
    encoded_bytes: Vec<u8>,
    dimensions: Dimensions,
    format: OutputFormat,
    quality: Option<u32>,
    source_byte_size: usize,
    fit: Fit,
    iterations: u32,
}

impl CompressionResult {
    /// `quality` is dropped for lossless formats, where it has no meaning.
    pub fn new(
        encoded_bytes: Vec<u8>,
        dimensions: Dimensions,
        format: OutputFormat,
        quality: u32,
        source_byte_size: usize,
        fit: Fit,
        iterations: u32,
    ) -> Self {
        Self {
            encoded_bytes,
            dimensions,
            format,
            quality: format.is_lossy().then_some(quality),
            source_byte_size,
            fit,
            iterations,
        }
    }

    pub fn encoded_bytes(&self) -> &[u8] {
        &self.encoded_bytes
    }

    pub fn byte_size(&self) -> usize {
        self.encoded_bytes.len()
    }

    pub fn width(&self) -> u32 {
        self.dimensions.width
    }

    pub fn height(&self) -> u32 {
        self.dimensions.height
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Quality percentage used, `None` for lossless formats.
    pub fn quality_percent(&self) -> Option<u32> {
        self.quality
    }

    pub fn source_byte_size(&self) -> usize {
        self.source_byte_size
    }

    pub fn fit(&self) -> Fit {
        self.fit
    }

    pub fn is_best_effort(&self) -> bool {
        self.fit == Fit::BestEffort
    }

    /// Encoder calls spent producing this result.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Size reduction relative to the source, in percent. Negative when the
    /// output is larger.
    pub fn savings_percent(&self) -> f64 {
        if self.source_byte_size == 0 {
            return 0.0;
        }
        (1.0 - self.byte_size() as f64 / self.source_byte_size as f64) * 100.0
    }
}
