//! Shared test utilities for the squish test suite.
//!
//! Provides synthetic source images with enough texture that lossy encoders
//! produce quality-dependent sizes, and encoded fixtures built from them.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let jpeg = encoded_fixture(ImageFormat::Jpeg, 640, 480);
//! let mut session = CompressionSession::new(RustBackend::new(), Settings::default());
//! session.load(&jpeg, None).unwrap();
//! ```

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Gradient plus deterministic high-frequency noise.
///
/// A flat or smooth image compresses to nearly the same size at any quality;
/// the noise term keeps lossy sizes responsive to the quality setting.
pub fn textured_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let noise = (x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663))
            .wrapping_mul(2_654_435_761)
            >> 26;
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x + y) % 256) as u8;
        Rgb([
            r.wrapping_add(noise as u8),
            g.wrapping_sub(noise as u8),
            b ^ (noise as u8),
        ])
    });
    DynamicImage::ImageRgb8(img)
}

/// Encode a textured image into `format` with the `image` crate's defaults.
pub fn encoded_fixture(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    textured_image(width, height)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textured_image_has_requested_size() {
        let img = textured_image(33, 17);
        assert_eq!((img.width(), img.height()), (33, 17));
    }

    #[test]
    fn encoded_fixture_is_sniffable() {
        for format in [ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::Bmp] {
            let bytes = encoded_fixture(format, 8, 8);
            assert_eq!(image::guess_format(&bytes).unwrap(), format);
        }
    }
}
