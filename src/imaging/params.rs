//! Parameter types for image operations.
//!
//! These structs describe *what* to encode, not *how*. They are the interface
//! between the orchestration layer ([`session`](crate::session) and
//! [`search`](super::search)), which decides sizes and qualities, and the
//! [`backend`](super::backend), which does the pixel work. Keeping them plain
//! data lets tests swap in a mock backend and assert on recorded parameters.
//!
//! ## Types
//!
//! - [`Quality`]: user-facing lossy quality (1–100, default 90). Clamped on construction.
//! - [`EncodeParams`]: one encoder invocation: output size, format, quality fraction.

use super::backend::Dimensions;
use super::format::OutputFormat;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    /// Convert a normalized encoder quality (0.0–1.0) back to a percentage.
    pub fn from_fraction(fraction: f64) -> Self {
        Self::new((fraction * 100.0).round().max(0.0) as u32)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality normalized to the encoder's 0.0–1.0 range.
    pub fn fraction(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Parameters for a single encode.
///
/// `quality` is the normalized fraction in `[0, 1]`. Lossless formats accept
/// and ignore it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeParams {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: f32,
}

impl EncodeParams {
    pub fn new(dims: Dimensions, format: OutputFormat, quality: f32) -> Self {
        Self {
            width: dims.width,
            height: dims.height,
            format,
            quality,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }
}
