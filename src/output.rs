//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Compress / convert
//!
//! ```text
//! holiday.png
//!     Source: PNG 4000x3000, 2.4 MB
//!     Output: JPEG 1200x900, quality 90
//!     Size: 312.5 KB (87.0% smaller)
//!     Written: compressed_holiday.jpg
//! ```
//!
//! A target-size search that ends outside tolerance adds a line:
//!
//! ```text
//!     Best effort: target not reached after 10 encodes
//! ```
//!
//! ## Inspect
//!
//! ```text
//! holiday.png
//!     Format: PNG
//!     Dimensions: 4000x3000
//!     Size: 2.4 MB
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. With `--json` the same data
//! goes out as a single [`Report`] or [`AssetReport`] object instead.

use crate::imaging::{ImageAsset, OutputFormat};
use crate::request::{CompressionResult, Fit};
use serde::Serialize;
use std::path::Path;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Human-readable byte count with binary units.
pub fn format_bytes(bytes: usize) -> String {
    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < MIB {
        format!("{:.1} KB", b / KIB)
    } else {
        format!("{:.1} MB", b / MIB)
    }
}

fn format_savings(percent: f64) -> String {
    if percent >= 0.0 {
        format!("{percent:.1}% smaller")
    } else {
        format!("{:.1}% larger", -percent)
    }
}

fn source_format_name(asset: &ImageAsset) -> String {
    match asset.output_format() {
        Some(format) => format.to_string(),
        None => format!("{:?}", asset.source_format()).to_uppercase(),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn format_asset(input: &Path, asset: &ImageAsset) -> Vec<String> {
    vec![
        display_name(input),
        format!("    Format: {}", source_format_name(asset)),
        format!("    Dimensions: {}", asset.dimensions()),
        format!("    Size: {}", format_bytes(asset.source_byte_size())),
    ]
}

pub fn print_asset(input: &Path, asset: &ImageAsset) {
    for line in format_asset(input, asset) {
        println!("{line}");
    }
}

/// Lines describing one compression. `written` is the output path, if saved.
pub fn format_result(
    input: &Path,
    asset: &ImageAsset,
    result: &CompressionResult,
    written: Option<&Path>,
) -> Vec<String> {
    let mut lines = vec![
        display_name(input),
        format!(
            "    Source: {} {}, {}",
            source_format_name(asset),
            asset.dimensions(),
            format_bytes(asset.source_byte_size())
        ),
    ];

    lines.push(match result.quality_percent() {
        Some(q) => format!(
            "    Output: {} {}, quality {q}",
            result.format(),
            result.dimensions()
        ),
        None => format!(
            "    Output: {} {}, lossless",
            result.format(),
            result.dimensions()
        ),
    });
    lines.push(format!(
        "    Size: {} ({})",
        format_bytes(result.byte_size()),
        format_savings(result.savings_percent())
    ));
    if result.is_best_effort() {
        lines.push(format!(
            "    Best effort: target not reached after {} encodes",
            result.iterations()
        ));
    }
    if let Some(path) = written {
        lines.push(format!("    Written: {}", path.display()));
    }
    lines
}

pub fn print_result(
    input: &Path,
    asset: &ImageAsset,
    result: &CompressionResult,
    written: Option<&Path>,
) {
    for line in format_result(input, asset, result, written) {
        println!("{line}");
    }
}

/// Machine-readable summary of one compression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub input: String,
    pub output: Option<String>,
    pub source_format: String,
    pub source_bytes: usize,
    pub source_width: u32,
    pub source_height: u32,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub quality: Option<u32>,
    pub bytes: usize,
    pub savings_percent: f64,
    pub fit: Fit,
    pub iterations: u32,
}

impl Report {
    pub fn new(
        input: &Path,
        asset: &ImageAsset,
        result: &CompressionResult,
        written: Option<&Path>,
    ) -> Self {
        Self {
            input: input.display().to_string(),
            output: written.map(|p| p.display().to_string()),
            source_format: source_format_name(asset),
            source_bytes: asset.source_byte_size(),
            source_width: asset.width(),
            source_height: asset.height(),
            format: result.format(),
            width: result.width(),
            height: result.height(),
            quality: result.quality_percent(),
            bytes: result.byte_size(),
            savings_percent: result.savings_percent(),
            fit: result.fit(),
            iterations: result.iterations(),
        }
    }
}

/// Machine-readable description of a source image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetReport {
    pub input: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

impl AssetReport {
    pub fn new(input: &Path, asset: &ImageAsset) -> Self {
        Self {
            input: input.display().to_string(),
            format: source_format_name(asset),
            width: asset.width(),
            height: asset.height(),
            bytes: asset.source_byte_size(),
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
