//! Production backend on the `image` crate ecosystem.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff format | `image::guess_format`, MIME hint as fallback |
//! | Decode (JPEG, PNG, WebP, GIF, BMP) | `image::ImageReader` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder`, quality 1–100 |
//! | Encode → WebP (lossy) | `webp` crate (libwebp), quality 0–100 |
//! | Encode → PNG, GIF, BMP | `DynamicImage::write_to` |
//!
//! JPEG and BMP are written as RGB (alpha is dropped). PNG and GIF keep alpha
//! when the source has it. GIF output is a single frame.

use super::backend::{BackendError, Dimensions, ImageAsset, ImageBackend};
use super::format::OutputFormat;
use super::params::EncodeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError, ImageFormat, ImageReader};
use std::borrow::Cow;
use std::io::Cursor;

/// Default cap on decoded and encoded surfaces: 100 megapixels.
pub const DEFAULT_MAX_PIXELS: u64 = 100_000_000;

/// Backend using the `image` crate plus libwebp.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    max_pixels: u64,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::with_max_pixels(DEFAULT_MAX_PIXELS)
    }

    /// Refuse to decode or render surfaces larger than `max_pixels`.
    pub fn with_max_pixels(max_pixels: u64) -> Self {
        Self { max_pixels }
    }

    fn check_surface(&self, dims: Dimensions) -> Result<(), BackendError> {
        if dims.width == 0 || dims.height == 0 {
            return Err(BackendError::Unavailable(format!(
                "cannot allocate an empty {dims} surface"
            )));
        }
        if dims.pixel_count() > self.max_pixels {
            return Err(BackendError::Unavailable(format!(
                "{dims} exceeds the {} pixel limit",
                self.max_pixels
            )));
        }
        Ok(())
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(e: ImageError) -> BackendError {
    match e {
        ImageError::Limits(limits) => BackendError::Unavailable(limits.to_string()),
        other => BackendError::Decode(other.to_string()),
    }
}

fn encode_error(format: OutputFormat, e: ImageError) -> BackendError {
    match e {
        ImageError::Limits(limits) => BackendError::Unavailable(limits.to_string()),
        other => BackendError::EncodeFailed(format!("{format} encode failed: {other}")),
    }
}

/// Work out the source format: sniff the bytes, fall back to the caller's MIME hint.
fn detect_format(bytes: &[u8], mime_hint: Option<&str>) -> Result<ImageFormat, BackendError> {
    let format = match image::guess_format(bytes) {
        Ok(format) => format,
        Err(sniff_error) => mime_hint
            .and_then(ImageFormat::from_mime_type)
            .ok_or_else(|| {
                BackendError::Decode(format!("unrecognized image data: {sniff_error}"))
            })?,
    };
    if !format.reading_enabled() {
        return Err(BackendError::Decode(format!("no decoder for {format:?} input")));
    }
    Ok(format)
}

/// JPEG quality on the encoder's 1–100 scale.
fn jpeg_quality(fraction: f32) -> u8 {
    (fraction * 100.0).round().clamp(1.0, 100.0) as u8
}

fn encode_jpeg(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, BackendError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality))
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| encode_error(OutputFormat::Jpeg, e))?;
    Ok(buf)
}

/// Lossy WebP through libwebp; the `image` crate only writes lossless WebP.
fn encode_webp(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, BackendError> {
    let quality = (quality * 100.0).round().clamp(0.0, 100.0);
    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(&rgba, rgba.width(), rgba.height()).encode_simple(false, quality)
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(&rgb, rgb.width(), rgb.height()).encode_simple(false, quality)
    };
    let memory = encoded
        .map_err(|e| BackendError::EncodeFailed(format!("WebP encode failed: {e:?}")))?;
    Ok(memory.to_vec())
}

/// Write a lossless format, normalizing to 8-bit RGB(A) first.
fn encode_lossless(
    img: &DynamicImage,
    format: OutputFormat,
    keep_alpha: bool,
) -> Result<Vec<u8>, BackendError> {
    let normalized = if keep_alpha && img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };
    let mut buf = Vec::new();
    normalized
        .write_to(&mut Cursor::new(&mut buf), format.image_format())
        .map_err(|e| encode_error(format, e))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8], mime_hint: Option<&str>) -> Result<ImageAsset, BackendError> {
        if bytes.is_empty() {
            return Err(BackendError::Decode("empty input".into()));
        }
        let format = detect_format(bytes, mime_hint)?;

        // Reject oversized images from the header before allocating pixels
        let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
            .into_dimensions()
            .map_err(decode_error)?;
        self.check_surface(Dimensions::new(width, height))?;

        let pixels = ImageReader::with_format(Cursor::new(bytes), format)
            .decode()
            .map_err(decode_error)?;
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(BackendError::Decode("image has no pixels".into()));
        }

        log::debug!(
            "decoded {format:?} {}x{} from {} bytes",
            pixels.width(),
            pixels.height(),
            bytes.len()
        );
        Ok(ImageAsset::new(pixels, format, bytes.len()))
    }

    fn encode(&self, asset: &ImageAsset, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        let dims = params.dimensions();
        self.check_surface(dims)?;

        let surface = if dims == asset.dimensions() {
            Cow::Borrowed(asset.pixels())
        } else {
            Cow::Owned(
                asset
                    .pixels()
                    .resize_exact(dims.width, dims.height, FilterType::Lanczos3),
            )
        };

        match params.format {
            OutputFormat::Jpeg => encode_jpeg(&surface, params.quality),
            OutputFormat::WebP => encode_webp(&surface, params.quality),
            OutputFormat::Png => encode_lossless(&surface, OutputFormat::Png, true),
            OutputFormat::Gif => encode_lossless(&surface, OutputFormat::Gif, true),
            OutputFormat::Bmp => encode_lossless(&surface, OutputFormat::Bmp, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{encoded_fixture, textured_image};
    use image::{Rgba, RgbaImage};

    fn params(width: u32, height: u32, format: OutputFormat, quality: f32) -> EncodeParams {
        EncodeParams::new(Dimensions::new(width, height), format, quality)
    }

    /// Encode at the asset's own size.
    fn encode(asset: &ImageAsset, format: OutputFormat, quality: f32) -> Vec<u8> {
        let dims = asset.dimensions();
        RustBackend::new()
            .encode(asset, &EncodeParams::new(dims, format, quality))
            .unwrap()
    }

    fn decoded(bytes: &[u8]) -> ImageAsset {
        RustBackend::new().decode(bytes, None).unwrap()
    }

    // =========================================================================
    // Decode
    // =========================================================================

    #[test]
    fn decode_synthetic_jpeg() {
        let bytes = encoded_fixture(ImageFormat::Jpeg, 200, 150);
        let asset = decoded(&bytes);
        assert_eq!(asset.dimensions(), Dimensions::new(200, 150));
        assert_eq!(asset.source_format(), ImageFormat::Jpeg);
        assert_eq!(asset.source_byte_size(), bytes.len());
    }

    #[test]
    fn decode_sniffs_format_over_mime_hint() {
        let bytes = encoded_fixture(ImageFormat::Png, 40, 30);
        let asset = RustBackend::new()
            .decode(&bytes, Some("image/jpeg"))
            .unwrap();
        assert_eq!(asset.source_format(), ImageFormat::Png);
    }

    #[test]
    fn decode_garbage_is_decode_failure() {
        let result = RustBackend::new().decode(b"definitely not an image", None);
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn decode_garbage_with_hint_is_still_decode_failure() {
        let result = RustBackend::new().decode(b"definitely not an image", Some("image/png"));
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn decode_empty_is_decode_failure() {
        let result = RustBackend::new().decode(&[], None);
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn decode_truncated_jpeg_is_decode_failure() {
        let bytes = encoded_fixture(ImageFormat::Jpeg, 64, 64);
        let result = RustBackend::new().decode(&bytes[..20], None);
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn decode_over_pixel_limit_is_unavailable() {
        let bytes = encoded_fixture(ImageFormat::Png, 20, 20);
        let result = RustBackend::with_max_pixels(399).decode(&bytes, None);
        assert!(matches!(result, Err(BackendError::Unavailable(_))));
    }

    // =========================================================================
    // Encode
    // =========================================================================

    #[test]
    fn each_format_writes_its_own_container() {
        let asset = decoded(&encoded_fixture(ImageFormat::Png, 48, 32));
        let backend = RustBackend::new();

        for format in OutputFormat::ALL {
            let bytes = backend
                .encode(&asset, &params(48, 32, format, 0.8))
                .unwrap();
            assert_eq!(
                image::guess_format(&bytes).unwrap(),
                format.image_format(),
                "{format} output sniffed as something else"
            );
        }
    }

    #[test]
    fn encode_resizes_to_requested_dimensions() {
        let asset = decoded(&encoded_fixture(ImageFormat::Jpeg, 400, 300));
        let bytes = RustBackend::new()
            .encode(&asset, &params(120, 90, OutputFormat::Jpeg, 0.8))
            .unwrap();

        let resized = image::load_from_memory(&bytes).unwrap();
        assert_eq!((resized.width(), resized.height()), (120, 90));
    }

    #[test]
    fn lossless_output_ignores_quality() {
        let asset = decoded(&encoded_fixture(ImageFormat::Jpeg, 64, 48));

        for format in [OutputFormat::Png, OutputFormat::Bmp] {
            let low = encode(&asset, format, 0.1);
            let high = encode(&asset, format, 0.9);
            assert_eq!(low, high, "{format} output changed with quality");
        }
    }

    #[test]
    fn lossy_encoding_is_deterministic() {
        let asset = decoded(&encoded_fixture(ImageFormat::Png, 96, 64));

        for format in [OutputFormat::Jpeg, OutputFormat::WebP] {
            let first = encode(&asset, format, 0.55);
            let second = encode(&asset, format, 0.55);
            assert_eq!(first, second, "{format} output is not reproducible");
        }
    }

    #[test]
    fn lossy_quality_is_taken_in_whole_percents() {
        let asset = decoded(&encoded_fixture(ImageFormat::Png, 96, 64));

        for format in [OutputFormat::Jpeg, OutputFormat::WebP] {
            let exact = encode(&asset, format, 0.7);
            let nearby = encode(&asset, format, 0.7031);
            assert_eq!(exact, nearby, "{format} output differs within a percent");
        }
    }

    #[test]
    fn lossy_size_grows_with_quality() {
        let asset = decoded(&encoded_fixture(ImageFormat::Png, 256, 192));

        for format in [OutputFormat::Jpeg, OutputFormat::WebP] {
            let low = encode(&asset, format, 0.2);
            let high = encode(&asset, format, 0.9);
            assert!(
                low.len() < high.len(),
                "{format}: q=0.2 gave {} bytes, q=0.9 gave {}",
                low.len(),
                high.len()
            );
        }
    }

    #[test]
    fn jpeg_flattens_alpha_sources() {
        let rgba = RgbaImage::from_pixel(16, 16, Rgba([200, 10, 10, 128]));
        let asset = ImageAsset::new(DynamicImage::ImageRgba8(rgba), ImageFormat::Png, 100);
        let bytes = RustBackend::new()
            .encode(&asset, &params(16, 16, OutputFormat::Jpeg, 0.9))
            .unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn encode_over_pixel_limit_is_unavailable() {
        let asset = ImageAsset::new(textured_image(10, 10), ImageFormat::Png, 100);
        let result = RustBackend::with_max_pixels(1000)
            .encode(&asset, &params(100, 100, OutputFormat::Png, 1.0));
        assert!(matches!(result, Err(BackendError::Unavailable(_))));
    }

    #[test]
    fn encode_zero_size_is_unavailable() {
        let asset = ImageAsset::new(textured_image(10, 10), ImageFormat::Png, 100);
        let result = RustBackend::new().encode(&asset, &params(0, 10, OutputFormat::Jpeg, 0.5));
        assert!(matches!(result, Err(BackendError::Unavailable(_))));
    }

    #[test]
    fn jpeg_quality_mapping() {
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(0.01), 1);
        assert_eq!(jpeg_quality(0.7), 70);
        assert_eq!(jpeg_quality(0.555), 56);
        assert_eq!(jpeg_quality(1.0), 100);
    }
}
