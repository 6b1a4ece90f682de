//! Output file naming.
//!
//! Batch outputs follow `<root>_<NN>.png`, where `NN` is the 1-based
//! position of the item in the run, zero-padded to two digits:
//! - root `Batch_01`, first item → `Batch_01_01.png`
//! - root `Scans`, item 12 → `Scans_12.png`
//! - item 100 and beyond simply widen → `Scans_100.png`
//!
//! Single-file conversions reuse the source stem: `scan.tif` → `scan.png`.

use std::path::{Path, PathBuf};

/// Root name used when none is configured.
pub const DEFAULT_ROOT_NAME: &str = "Batch_01";

/// Subfolder created for converted output.
pub const OUTPUT_FOLDER_NAME: &str = "PNG_Output";

/// File name for the item at zero-based `index`.
pub fn batch_output_name(root: &str, index: usize) -> String {
    format!("{}_{:02}.png", root, index + 1)
}

/// Default PNG path for a single input.
///
/// Beside the input, or inside a `PNG_Output` folder next to it.
pub fn single_output_path(input: &Path, into_subfolder: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    let dir = if into_subfolder {
        parent.join(OUTPUT_FOLDER_NAME)
    } else {
        parent.to_path_buf()
    };
    dir.join(format!("{}.png", stem))
}

/// Default path for a rendered preview: `scan.tif` → `scan_preview.png`.
pub fn preview_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_preview.png", stem))
}

/// Default output directory for a batch over `input_dir`.
pub fn default_batch_output_dir(input_dir: &Path) -> PathBuf {
    input_dir.join(OUTPUT_FOLDER_NAME)
}
