//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Sources in scans/
//! 001 page-a.tif
//! 002 page-b.TIFF
//! 2 files
//! ```
//!
//! ## Batch
//!
//! ```text
//! Converting 3 files → scans/PNG_Output
//! [1/3] page-a.tif → Batch_01_01.png
//! [2/3] page-b.tif FAILED
//!     Failed to decode scans/page-b.tif: ...
//! [3/3] page-c.tif → Batch_01_03.png
//! Converted 2 of 3 files, 1 failed
//! ```
//!
//! ## Estimate
//!
//! ```text
//! scan.tif
//!     Input: 3000 x 2000 RGB, 17.17 MB
//!     Output: 1280 x 720 HD (fill)
//!     Estimated PNG size: 2.11 MB (ratio 0.12)
//!     Estimate is a heuristic, not a guarantee
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, BatchSummary};
use crate::imaging::{
    ColorMode, ConversionSettings, Dimensions, StandardResolution, compression_ratio,
    format_human_size,
};
use crate::scan::{BatchItem, ItemOutcome};
use std::path::{Path, PathBuf};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn dims(d: Dimensions) -> String {
    format!("{} x {}", d.width, d.height)
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Scan
// ============================================================================

pub fn format_scan_output(items: &[BatchItem], dir: &Path) -> Vec<String> {
    let mut lines = vec![format!("Sources in {}", dir.display())];
    for (i, item) in items.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), item.file_name()));
    }
    lines.push(match items.len() {
        1 => "1 file".to_string(),
        n => format!("{} files", n),
    });
    lines
}

pub fn print_scan_output(items: &[BatchItem], dir: &Path) {
    print_lines(format_scan_output(items, dir));
}

// ============================================================================
// Batch
// ============================================================================

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total, output_dir } => {
            vec![format!(
                "Converting {} files \u{2192} {}",
                total,
                output_dir.display()
            )]
        }
        BatchEvent::ItemFinished {
            completed,
            total,
            source,
            outcome,
            output,
        } => {
            let progress = format!("[{}/{}] {}", completed, total, file_name(source));
            match (outcome, output) {
                (ItemOutcome::Success, Some(out)) => {
                    vec![format!("{} \u{2192} {}", progress, file_name(out))]
                }
                (ItemOutcome::Failed(reason), _) => {
                    vec![format!("{} FAILED", progress), format!("{}{}", indent(1), reason)]
                }
                (other, _) => vec![format!("{} {}", progress, other)],
            }
        }
        BatchEvent::Cancelled { completed, total } => {
            vec![format!(
                "Cancelled after {} of {} files",
                completed, total
            )]
        }
        BatchEvent::Finished(summary) => format_batch_summary(summary),
    }
}

pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    let mut line = format!(
        "Converted {} of {} files",
        summary.succeeded,
        summary.total()
    );
    if summary.failed > 0 {
        line.push_str(&format!(", {} failed", summary.failed));
    }
    if summary.skipped > 0 {
        line.push_str(&format!(", {} skipped", summary.skipped));
    }
    vec![line]
}

// ============================================================================
// Single file
// ============================================================================

pub fn format_convert_output(source: &Path, dest: &Path, output: Dimensions) -> Vec<String> {
    vec![
        format!("{} \u{2192} {}", file_name(source), dest.display()),
        format!("{}Output: {}", indent(1), dims(output)),
    ]
}

pub fn print_convert_output(source: &Path, dest: &Path, output: Dimensions) {
    print_lines(format_convert_output(source, dest, output));
}

/// One-line description of the output geometry for the given settings.
pub fn describe_output(output: Dimensions, settings: &ConversionSettings) -> String {
    if settings.fill_mode {
        match settings.target_resolution.and_then(StandardResolution::matching) {
            Some(preset) => format!("{} {} (fill)", dims(output), preset.label()),
            None => format!("{} (fill)", dims(output)),
        }
    } else if settings.scale_factor != 1.0 {
        format!(
            "{} (scaled {:.0}%)",
            dims(output),
            settings.scale_factor * 100.0
        )
    } else {
        dims(output)
    }
}

// ============================================================================
// Estimate
// ============================================================================

/// Everything shown by the `estimate` command.
#[derive(Debug, Clone)]
pub struct EstimateSummary {
    pub source: PathBuf,
    pub input_bytes: u64,
    pub original: Dimensions,
    pub source_mode: ColorMode,
    pub output: Dimensions,
    pub output_mode: ColorMode,
    pub estimated_bytes: u64,
}

pub fn format_estimate(summary: &EstimateSummary, settings: &ConversionSettings) -> Vec<String> {
    let ratio = compression_ratio(summary.estimated_bytes, summary.input_bytes)
        .map(|r| format!(" (ratio {:.2})", r))
        .unwrap_or_default();
    vec![
        file_name(&summary.source),
        format!(
            "{}Input: {} {}, {}",
            indent(1),
            dims(summary.original),
            summary.source_mode,
            format_human_size(summary.input_bytes)
        ),
        format!(
            "{}Output: {} {}",
            indent(1),
            describe_output(summary.output, settings),
            summary.output_mode
        ),
        format!(
            "{}Estimated PNG size: {}{}",
            indent(1),
            format_human_size(summary.estimated_bytes),
            ratio
        ),
        format!("{}Estimate is a heuristic, not a guarantee", indent(1)),
    ]
}

pub fn print_estimate(summary: &EstimateSummary, settings: &ConversionSettings) {
    print_lines(format_estimate(summary, settings));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    // =========================================================================
    // Scan
    // =========================================================================

    #[test]
    fn scan_lists_files_with_index() {
        let items = vec![BatchItem::new("/in/a.tif"), BatchItem::new("/in/b.TIFF")];
        let lines = format_scan_output(&items, Path::new("/in"));
        assert_eq!(
            lines,
            vec!["Sources in /in", "001 a.tif", "002 b.TIFF", "2 files"]
        );
    }

    #[test]
    fn scan_singular_count() {
        let lines = format_scan_output(&[BatchItem::new("x.tif")], Path::new("."));
        assert_eq!(lines.last().unwrap(), "1 file");
    }

    // =========================================================================
    // Batch events
    // =========================================================================

    #[test]
    fn batch_started() {
        let lines = format_batch_event(&BatchEvent::Started {
            total: 3,
            output_dir: PathBuf::from("out"),
        });
        assert_eq!(lines, vec!["Converting 3 files \u{2192} out"]);
    }

    #[test]
    fn batch_item_success() {
        let lines = format_batch_event(&BatchEvent::ItemFinished {
            completed: 1,
            total: 3,
            source: PathBuf::from("/in/a.tif"),
            outcome: ItemOutcome::Success,
            output: Some(PathBuf::from("/out/Batch_01_01.png")),
        });
        assert_eq!(lines, vec!["[1/3] a.tif \u{2192} Batch_01_01.png"]);
    }

    #[test]
    fn batch_item_failure_shows_reason_indented() {
        let lines = format_batch_event(&BatchEvent::ItemFinished {
            completed: 2,
            total: 3,
            source: PathBuf::from("/in/b.tif"),
            outcome: ItemOutcome::Failed("corrupt".into()),
            output: None,
        });
        assert_eq!(lines, vec!["[2/3] b.tif FAILED", "    corrupt"]);
    }

    #[test]
    fn batch_cancelled() {
        let lines = format_batch_event(&BatchEvent::Cancelled {
            completed: 1,
            total: 4,
        });
        assert_eq!(lines, vec!["Cancelled after 1 of 4 files"]);
    }

    #[test]
    fn summary_all_succeeded() {
        let lines = format_batch_summary(&BatchSummary {
            succeeded: 3,
            failed: 0,
            skipped: 0,
        });
        assert_eq!(lines, vec!["Converted 3 of 3 files"]);
    }

    #[test]
    fn summary_with_failures_and_skips() {
        let lines = format_batch_event(&BatchEvent::Finished(BatchSummary {
            succeeded: 2,
            failed: 1,
            skipped: 2,
        }));
        assert_eq!(lines, vec!["Converted 2 of 5 files, 1 failed, 2 skipped"]);
    }

    // =========================================================================
    // Single file / estimate
    // =========================================================================

    #[test]
    fn convert_output_lines() {
        let lines = format_convert_output(
            Path::new("/in/scan.tif"),
            Path::new("/in/PNG_Output/scan.png"),
            d(640, 480),
        );
        assert_eq!(
            lines,
            vec!["scan.tif \u{2192} /in/PNG_Output/scan.png", "    Output: 640 x 480"]
        );
    }

    #[test]
    fn describe_output_modes() {
        let fit = ConversionSettings::default();
        assert_eq!(describe_output(d(10, 20), &fit), "10 x 20");

        let scaled = ConversionSettings {
            scale_factor: 0.5,
            ..Default::default()
        };
        assert_eq!(describe_output(d(10, 20), &scaled), "10 x 20 (scaled 50%)");

        let fill = ConversionSettings {
            target_resolution: Some((1280, 720)),
            fill_mode: true,
            ..Default::default()
        };
        assert_eq!(describe_output(d(1280, 720), &fill), "1280 x 720 HD (fill)");

        let custom = ConversionSettings {
            target_resolution: Some((500, 500)),
            fill_mode: true,
            ..Default::default()
        };
        assert_eq!(describe_output(d(500, 500), &custom), "500 x 500 (fill)");
    }

    #[test]
    fn estimate_labels_heuristic_and_ratio() {
        let summary = EstimateSummary {
            source: PathBuf::from("/in/scan.tif"),
            input_bytes: 2048,
            original: d(100, 100),
            source_mode: ColorMode::Rgb,
            output: d(100, 100),
            output_mode: ColorMode::Rgb,
            estimated_bytes: 1024,
        };
        let lines = format_estimate(&summary, &ConversionSettings::default());
        assert_eq!(lines[0], "scan.tif");
        assert_eq!(lines[1], "    Input: 100 x 100 RGB, 2.0 KB");
        assert_eq!(lines[3], "    Estimated PNG size: 1.0 KB (ratio 0.50)");
        assert!(lines[4].contains("heuristic"));
    }

    #[test]
    fn estimate_omits_ratio_for_empty_input() {
        let summary = EstimateSummary {
            source: PathBuf::from("x.tif"),
            input_bytes: 0,
            original: d(1, 1),
            source_mode: ColorMode::Grayscale,
            output: d(1, 1),
            output_mode: ColorMode::Palette,
            estimated_bytes: 1024,
        };
        let lines = format_estimate(&summary, &ConversionSettings::default());
        assert_eq!(lines[2], "    Output: 1 x 1 palette");
        assert_eq!(lines[3], "    Estimated PNG size: 1.0 KB");
    }
}
