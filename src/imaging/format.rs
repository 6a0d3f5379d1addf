//! Output formats the encoder can produce.
//!
//! The set is closed: anything outside [`OutputFormat`] is rejected at the
//! boundary with [`UnsupportedFormat`] instead of falling back to a default.
//!
//! | Format | Lossy | Extension | MIME |
//! |---|---|---|---|
//! | JPEG | yes | `jpg` | `image/jpeg` |
//! | WebP | yes | `webp` | `image/webp` |
//! | PNG | no | `png` | `image/png` |
//! | GIF | no | `gif` | `image/gif` |
//! | BMP | no | `bmp` | `image/bmp` |

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported output format: {0}")]
pub struct UnsupportedFormat(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::WebP,
        OutputFormat::Gif,
        OutputFormat::Bmp,
    ];

    /// Whether the quality parameter affects the encoded bytes.
    pub fn is_lossy(self) -> bool {
        match self {
            OutputFormat::Jpeg | OutputFormat::WebP => true,
            OutputFormat::Png | OutputFormat::Gif | OutputFormat::Bmp => false,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Gif => "gif",
            OutputFormat::Bmp => "bmp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Gif => "image/gif",
            OutputFormat::Bmp => "image/bmp",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::WebP => ImageFormat::WebP,
            OutputFormat::Gif => ImageFormat::Gif,
            OutputFormat::Bmp => ImageFormat::Bmp,
        }
    }

    /// Map a decoded source format onto the output set, if it has a counterpart.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
            ImageFormat::Png => Some(OutputFormat::Png),
            ImageFormat::WebP => Some(OutputFormat::WebP),
            ImageFormat::Gif => Some(OutputFormat::Gif),
            ImageFormat::Bmp => Some(OutputFormat::Bmp),
            _ => None,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = UnsupportedFormat;

    /// Accepts format names and file extensions, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match name.as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            "gif" => Ok(OutputFormat::Gif),
            "bmp" => Ok(OutputFormat::Bmp),
            _ => Err(UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::WebP => "WebP",
            OutputFormat::Gif => "GIF",
            OutputFormat::Bmp => "BMP",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names_and_extensions() {
        assert_eq!("jpg".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert_eq!("JPEG".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert_eq!(".webp".parse::<OutputFormat>(), Ok(OutputFormat::WebP));
        assert_eq!(" png ".parse::<OutputFormat>(), Ok(OutputFormat::Png));
    }

    #[test]
    fn parse_unknown_is_rejected_not_coerced() {
        let err = "tiff".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err, UnsupportedFormat("tiff".to_string()));
        assert!("".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn lossy_split() {
        let lossy: Vec<_> = OutputFormat::ALL
            .into_iter()
            .filter(|f| f.is_lossy())
            .collect();
        assert_eq!(lossy, vec![OutputFormat::Jpeg, OutputFormat::WebP]);
    }

    #[test]
    fn extension_roundtrips_through_parse() {
        for format in OutputFormat::ALL {
            assert_eq!(format.extension().parse::<OutputFormat>(), Ok(format));
        }
    }

    #[test]
    fn mime_types_match_the_decoder() {
        for format in OutputFormat::ALL {
            assert_eq!(format.mime_type(), format.image_format().to_mime_type());
        }
    }

    #[test]
    fn image_format_mapping() {
        for format in OutputFormat::ALL {
            assert_eq!(
                OutputFormat::from_image_format(format.image_format()),
                Some(format)
            );
        }
        assert_eq!(OutputFormat::from_image_format(ImageFormat::Tiff), None);
    }
}
