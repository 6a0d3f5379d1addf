//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the engine needs:
//! decode raw bytes into an [`ImageAsset`], and encode an asset at a given
//! size, format and quality.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate plus libwebp for lossy WebP. Tests use the `MockBackend` below,
//! which records operations and models encoded size as a function of quality.

use super::format::OutputFormat;
use super::params::EncodeParams;
use image::{DynamicImage, ImageFormat};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Input bytes are not a supported raster format, or are truncated/corrupt.
    #[error("Decode failed: {0}")]
    Decode(String),
    /// A pixel surface could not be acquired (size limits, allocation failure).
    #[error("Encoder unavailable: {0}")]
    Unavailable(String),
    #[error("Encode failed: {0}")]
    EncodeFailed(String),
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A decoded source image.
///
/// Owns the pixel surface exclusively. Width and height are read from the
/// pixels, so they always agree with what the encoder will see.
pub struct ImageAsset {
    pixels: DynamicImage,
    source_format: ImageFormat,
    source_byte_size: usize,
}

impl ImageAsset {
    pub fn new(pixels: DynamicImage, source_format: ImageFormat, source_byte_size: usize) -> Self {
        Self {
            pixels,
            source_format,
            source_byte_size,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    pub fn source_format(&self) -> ImageFormat {
        self.source_format
    }

    /// The source format as an output format, if the encoder can produce it.
    pub fn output_format(&self) -> Option<OutputFormat> {
        OutputFormat::from_image_format(self.source_format)
    }

    pub fn source_byte_size(&self) -> usize {
        self.source_byte_size
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }
}

// Pixel data is omitted.
impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("source_format", &self.source_format)
            .field("source_byte_size", &self.source_byte_size)
            .finish()
    }
}

/// Trait for image processing backends.
///
/// Implementations must be deterministic: encoding the same asset with the
/// same [`EncodeParams`] yields the same bytes. The target-size search relies
/// on this to converge.
pub trait ImageBackend {
    /// Decode raw bytes. `mime_hint` is consulted only when the format cannot
    /// be sniffed from the bytes themselves.
    fn decode(&self, bytes: &[u8], mime_hint: Option<&str>) -> Result<ImageAsset, BackendError>;

    /// Resample `asset` to the requested size and serialize it.
    fn encode(&self, asset: &ImageAsset, params: &EncodeParams) -> Result<Vec<u8>, BackendError>;
}
