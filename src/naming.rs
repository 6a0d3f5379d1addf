//! Output filename derivation.
//!
//! Compressed files keep their stem behind a `compressed_` prefix, converted
//! files keep the bare stem. Either way the extension comes from the output
//! format, never from the input name:
//!
//! - `holiday.png` compressed to JPEG → `compressed_holiday.jpg`
//! - `holiday.png` converted to WebP → `holiday.webp`
//! - `archive.tar.png` compressed to PNG → `compressed_archive.tar.png`

use crate::imaging::OutputFormat;
use crate::request::Mode;
use std::path::{Path, PathBuf};

const COMPRESSED_PREFIX: &str = "compressed_";
const FALLBACK_STEM: &str = "image";

/// What the output file represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Compressed,
    Converted,
}

impl From<&Mode> for OutputKind {
    fn from(mode: &Mode) -> Self {
        match mode {
            Mode::FormatConversion { .. } => OutputKind::Converted,
            _ => OutputKind::Compressed,
        }
    }
}

/// Stem of `input` with only the last extension removed.
///
/// Hidden files without an extension (`.profile`) keep their full name.
/// Empty or non-UTF-8 names fall back to `image`.
pub fn base_name(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_STEM)
        .to_string()
}

/// Filename for an output of `kind` in `format` derived from `input`.
pub fn output_file_name(input: &Path, format: OutputFormat, kind: OutputKind) -> String {
    let base = base_name(input);
    match kind {
        OutputKind::Compressed => format!("{COMPRESSED_PREFIX}{base}.{}", format.extension()),
        OutputKind::Converted => format!("{base}.{}", format.extension()),
    }
}

/// Full output path: `out_dir` if given, else the input's own directory.
pub fn output_path(
    input: &Path,
    out_dir: Option<&Path>,
    format: OutputFormat,
    kind: OutputKind,
) -> PathBuf {
    let dir = out_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new(""));
    dir.join(output_file_name(input, format, kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(file: &str, format: OutputFormat, kind: OutputKind) -> String {
        output_file_name(Path::new(file), format, kind)
    }

    #[test]
    fn compressed_name_gets_prefix() {
        assert_eq!(
            name("holiday.png", OutputFormat::Jpeg, OutputKind::Compressed),
            "compressed_holiday.jpg"
        );
    }

    #[test]
    fn converted_name_keeps_stem() {
        assert_eq!(
            name("holiday.png", OutputFormat::WebP, OutputKind::Converted),
            "holiday.webp"
        );
    }

    #[test]
    fn only_last_extension_is_replaced() {
        assert_eq!(
            name("archive.tar.png", OutputFormat::Png, OutputKind::Compressed),
            "compressed_archive.tar.png"
        );
    }

    #[test]
    fn extension_follows_format_not_input() {
        assert_eq!(
            name("photo.JPEG", OutputFormat::Jpeg, OutputKind::Compressed),
            "compressed_photo.jpg"
        );
    }

    #[test]
    fn name_without_extension() {
        assert_eq!(
            name("scan", OutputFormat::Bmp, OutputKind::Converted),
            "scan.bmp"
        );
    }

    #[test]
    fn hidden_file_keeps_name() {
        assert_eq!(base_name(Path::new(".profile")), ".profile");
    }

    #[test]
    fn empty_path_falls_back() {
        assert_eq!(base_name(Path::new("")), "image");
    }

    #[test]
    fn path_defaults_to_input_directory() {
        let path = output_path(
            Path::new("/photos/2024/beach.png"),
            None,
            OutputFormat::WebP,
            OutputKind::Compressed,
        );
        assert_eq!(path, PathBuf::from("/photos/2024/compressed_beach.webp"));
    }

    #[test]
    fn path_uses_explicit_directory() {
        let path = output_path(
            Path::new("/photos/beach.png"),
            Some(Path::new("/tmp/out")),
            OutputFormat::Gif,
            OutputKind::Converted,
        );
        assert_eq!(path, PathBuf::from("/tmp/out/beach.gif"));
    }

    #[test]
    fn bare_file_name_stays_relative() {
        let path = output_path(
            Path::new("beach.png"),
            None,
            OutputFormat::Png,
            OutputKind::Compressed,
        );
        assert_eq!(path, PathBuf::from("compressed_beach.png"));
    }

    #[test]
    fn kind_from_mode() {
        assert_eq!(
            OutputKind::from(&Mode::FormatConversion { quality: None }),
            OutputKind::Converted
        );
        assert_eq!(
            OutputKind::from(&Mode::Quality { quality: 80 }),
            OutputKind::Compressed
        );
        assert_eq!(
            OutputKind::from(&Mode::TargetSize { target_bytes: 10 }),
            OutputKind::Compressed
        );
    }
}
