//! Image processing: decode, resize, encode, and the target-size search.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` with format sniffing and a pixel limit |
//! | **Resize** | `resize_exact` with Lanczos3 |
//! | **JPEG** | `image::codecs::jpeg::JpegEncoder` at the requested quality |
//! | **WebP (lossy)** | `webp::Encoder::encode_simple` |
//! | **PNG / GIF / BMP** | `image` lossless writers |
//!
//! The module is split into:
//! - **Calculations**: pure dimension planning (unit testable)
//! - **Format / Parameters**: the closed output-format set and encode settings
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Search**: the quality binary search over any backend

pub mod backend;
mod calculations;
mod format;
mod params;
pub mod rust_backend;
pub mod search;

pub use backend::{BackendError, Dimensions, ImageAsset, ImageBackend};
pub use calculations::{DimensionConstraint, ZeroBound, plan_dimensions};
pub use format::{OutputFormat, UnsupportedFormat};
pub use params::{EncodeParams, Quality};
pub use rust_backend::RustBackend;
pub use search::{SearchOutcome, SearchPolicy, find_quality_for_target_size};
