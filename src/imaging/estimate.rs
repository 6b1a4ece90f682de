//! Output-size prediction for live feedback.
//!
//! The estimate is a heuristic, not a compression model: raw pixel bytes,
//! a flat 20% reduction when optimisation is on, and a 1 KiB floor. It is
//! advisory only and never used to accept or reject a save.

use super::params::ColorMode;

/// Smallest estimate ever reported, so tiny images do not show ~0 bytes.
pub const MIN_ESTIMATE_BYTES: u64 = 1024;

/// Flat reduction applied when PNG optimisation is enabled.
pub const OPTIMIZE_FACTOR: f64 = 0.8;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Bytes per pixel used by the estimate.
///
/// Grayscale+alpha counts as 4, like RGBA; grayscale and palette count as 1.
pub fn bytes_per_pixel(mode: ColorMode) -> u64 {
    match mode {
        ColorMode::Rgba | ColorMode::GrayscaleAlpha => 4,
        ColorMode::Rgb => 3,
        ColorMode::Grayscale | ColorMode::Palette => 1,
    }
}

/// Estimate the PNG size in bytes for an image of the given shape.
///
/// # Examples
/// ```
/// # use tiff2png::imaging::{ColorMode, estimate};
/// assert_eq!(estimate(100, 100, ColorMode::Rgb, false), 30_000);
/// assert_eq!(estimate(100, 100, ColorMode::Rgb, true), 24_000);
/// assert_eq!(estimate(4, 4, ColorMode::Rgba, false), 1024);
/// ```
pub fn estimate(width: u32, height: u32, mode: ColorMode, optimize: bool) -> u64 {
    let raw = width as u64 * height as u64 * bytes_per_pixel(mode);
    let estimated = if optimize {
        (raw as f64 * OPTIMIZE_FACTOR).round() as u64
    } else {
        raw
    };
    estimated.max(MIN_ESTIMATE_BYTES)
}

/// Estimated size relative to the input file size (`estimate / input`).
///
/// `None` when the input size is unknown or zero.
pub fn compression_ratio(estimated: u64, input_bytes: u64) -> Option<f64> {
    (input_bytes > 0).then(|| estimated as f64 / input_bytes as f64)
}

/// Format a byte count with binary prefixes: `1536` → `"1.5 KB"`.
///
/// The unit is chosen by `floor(log_1024(bytes))`, the mantissa is rounded
/// to two decimals and trailing zeros are dropped (keeping one decimal).
/// Zero is special-cased as `"0 B"`.
pub fn format_human_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut unit = 0;
    let mut divisor = 1u64;
    while unit < SIZE_UNITS.len() - 1 {
        match divisor.checked_mul(1024) {
            Some(next) if bytes >= next => {
                divisor = next;
                unit += 1;
            }
            _ => break,
        }
    }

    let mantissa = format!("{:.2}", bytes as f64 / divisor as f64);
    let trimmed = mantissa.trim_end_matches('0');
    let trimmed = if trimmed.ends_with('.') {
        &mantissa[..trimmed.len() + 1]
    } else {
        trimmed
    };
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}
