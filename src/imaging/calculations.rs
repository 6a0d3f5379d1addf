//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;

/// How the output size is derived from the source size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionConstraint {
    /// Keep the source dimensions.
    Original,
    /// Fit within `max_width` x `max_height`.
    ///
    /// With `preserve_aspect_ratio`, both edges scale by the same ratio
    /// (which may be above 1, i.e. upscale). Without it, each edge is clamped
    /// independently and the image may be distorted.
    Bounded {
        max_width: u32,
        max_height: u32,
        preserve_aspect_ratio: bool,
    },
}

/// Returned when a bounded constraint has a zero edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroBound;

/// Compute target dimensions for an image.
///
/// # Arguments
/// * `original` - Source image dimensions
/// * `constraint` - Sizing rule to apply
///
/// # Returns
/// * Target dimensions, or [`ZeroBound`] if either bound is zero
///
/// # Examples
/// ```
/// # use squish::imaging::{Dimensions, DimensionConstraint, plan_dimensions};
/// // 4000x3000 into a 1200x1200 box: ratio = min(0.3, 0.4) = 0.3
/// let planned = plan_dimensions(
///     Dimensions::new(4000, 3000),
///     DimensionConstraint::Bounded {
///         max_width: 1200,
///         max_height: 1200,
///         preserve_aspect_ratio: true,
///     },
/// );
/// assert_eq!(planned, Ok(Dimensions::new(1200, 900)));
/// ```
pub fn plan_dimensions(
    original: Dimensions,
    constraint: DimensionConstraint,
) -> Result<Dimensions, ZeroBound> {
    match constraint {
        DimensionConstraint::Original => Ok(original),
        DimensionConstraint::Bounded {
            max_width,
            max_height,
            ..
        } if max_width == 0 || max_height == 0 => Err(ZeroBound),
        DimensionConstraint::Bounded {
            max_width,
            max_height,
            preserve_aspect_ratio: true,
        } => Ok(calculate_fit_dimensions(original, max_width, max_height)),
        DimensionConstraint::Bounded {
            max_width,
            max_height,
            preserve_aspect_ratio: false,
        } => Ok(Dimensions::new(
            original.width.min(max_width),
            original.height.min(max_height),
        )),
    }
}

/// Scale both edges by `min(max_w / w, max_h / h)`, flooring each.
///
/// Done in integer arithmetic: the binding edge lands exactly on its bound and
/// the other edge is `floor(edge * ratio)` with no float rounding drift.
/// Floored edges are raised to 1 so an extreme aspect ratio never produces an
/// empty image; both bounds are at least 1, so the result still fits.
fn calculate_fit_dimensions(original: Dimensions, max_width: u32, max_height: u32) -> Dimensions {
    let (w, h) = (original.width as u64, original.height as u64);
    let (max_w, max_h) = (max_width as u64, max_height as u64);
    if w == 0 || h == 0 {
        return original;
    }

    // max_w / w <= max_h / h, cross-multiplied
    let (width, height) = if max_w * h <= max_h * w {
        (max_w, h * max_w / w)
    } else {
        (w * max_h / h, max_h)
    };

    Dimensions::new(
        (width as u32).clamp(1, max_width),
        (height as u32).clamp(1, max_height),
    )
}
