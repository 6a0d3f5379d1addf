//! Target-size search: find the encoder quality whose output lands near a
//! requested byte size.
//!
//! Binary search over the quality fraction. Each step encodes once at the
//! nearest whole percent, measures the output, and halves the remaining range
//! toward the target. Steps depend on the previous measurement, so they run
//! strictly in sequence. The reported [`Quality`] is the percent the returned
//! bytes were encoded at, so re-encoding at it reproduces them.
//!
//! ```text
//! current = seed                        (0.7)
//! loop, at most max_iterations times:   (10)
//!     size = len(encode(percent(current)))
//!     stop if |size - target| < tolerance * target     (5%)
//!     stop if max_q - min_q < min_range                (0.01)
//!     size > target  →  max_q = current
//!     otherwise      →  min_q = current
//!     current = (min_q + max_q) / 2
//! ```
//!
//! The search assumes encoded size is non-decreasing in quality for a fixed
//! format and size, which holds for JPEG and WebP. It does not verify this.
//! When the loop runs out of iterations or range, the last encoded result is
//! returned with `converged = false`; callers surface that as a best-effort
//! result, never as an error.

use super::backend::{BackendError, Dimensions, ImageAsset, ImageBackend};
use super::format::OutputFormat;
use super::params::{EncodeParams, Quality};
use serde::{Deserialize, Serialize};

/// Tunables for the target-size search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchPolicy {
    /// First quality tried.
    pub seed_quality: f64,
    /// Lower end of the quality range.
    pub min_quality: f64,
    /// Upper end of the quality range.
    pub max_quality: f64,
    /// Accepted relative distance from the target (0.05 = ±5%).
    pub tolerance: f64,
    /// Hard cap on encoder calls.
    pub max_iterations: u32,
    /// Stop once the remaining quality range is narrower than this.
    pub min_range: f64,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            seed_quality: 0.7,
            min_quality: 0.01,
            max_quality: 1.0,
            tolerance: 0.05,
            max_iterations: 10,
            min_range: 0.01,
        }
    }
}

impl SearchPolicy {
    /// Whether `size` is within tolerance of `target`.
    pub fn is_within_tolerance(&self, size: usize, target: usize) -> bool {
        (size as f64 - target as f64).abs() < self.tolerance * target as f64
    }
}

/// Result of a target-size search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub bytes: Vec<u8>,
    /// Quality that produced `bytes`.
    pub quality: Quality,
    /// Encoder calls made.
    pub iterations: u32,
    /// `bytes` is within tolerance of the target.
    pub converged: bool,
}

/// Search for the quality whose encoded size is closest to `target_bytes`.
///
/// Lossless formats ignore quality, so a single encode decides the outcome.
pub fn find_quality_for_target_size(
    backend: &impl ImageBackend,
    asset: &ImageAsset,
    dims: Dimensions,
    format: OutputFormat,
    target_bytes: usize,
    policy: &SearchPolicy,
) -> Result<SearchOutcome, BackendError> {
    if !format.is_lossy() {
        let quality = Quality::from_fraction(policy.max_quality);
        let bytes = backend.encode(asset, &EncodeParams::new(dims, format, quality.fraction()))?;
        let converged = policy.is_within_tolerance(bytes.len(), target_bytes);
        log::debug!(
            "{format} is lossless, single encode: {} bytes (target {target_bytes})",
            bytes.len()
        );
        return Ok(SearchOutcome {
            bytes,
            quality,
            iterations: 1,
            converged,
        });
    }

    let mut min_q = policy.min_quality;
    let mut max_q = policy.max_quality;
    let mut current = policy.seed_quality;
    let mut iterations = 0;

    loop {
        // Encode at the whole percent that gets reported
        let quality = Quality::from_fraction(current);
        let bytes = backend.encode(asset, &EncodeParams::new(dims, format, quality.fraction()))?;
        iterations += 1;
        let size = bytes.len();
        let converged = policy.is_within_tolerance(size, target_bytes);

        log::debug!(
            "search step {iterations}: quality {}% → {size} bytes \
             (target {target_bytes}, range {min_q:.4}..{max_q:.4})",
            quality.value()
        );

        if converged || (max_q - min_q) < policy.min_range || iterations >= policy.max_iterations {
            return Ok(SearchOutcome {
                bytes,
                quality,
                iterations,
                converged,
            });
        }

        if size > target_bytes {
            max_q = current;
        } else {
            min_q = current;
        }
        current = (min_q + max_q) / 2.0;
    }
}
