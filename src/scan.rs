//! Source discovery for batch runs.
//!
//! Lists the TIFF files directly inside a folder (no recursion) and turns
//! them into [`BatchItem`]s. Matching is on the file extension only,
//! case-insensitively, so `SCAN.TIF` and `scan.tiff` are both picked up.
//! Results are sorted by path so output numbering is reproducible.

use crate::imaging::SOURCE_EXTENSIONS;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Result of converting one batch item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Pending,
    Success,
    Failed(String),
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemOutcome::Pending => f.write_str("pending"),
            ItemOutcome::Success => f.write_str("ok"),
            ItemOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// One source file in a batch.
///
/// Selection may be toggled until a run starts. The outcome leaves
/// `Pending` exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub source: PathBuf,
    pub selected: bool,
    outcome: ItemOutcome,
}

impl BatchItem {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            selected: true,
            outcome: ItemOutcome::Pending,
        }
    }

    pub fn outcome(&self) -> &ItemOutcome {
        &self.outcome
    }

    /// Set the outcome if it is still pending. Returns whether it changed.
    pub fn record(&mut self, outcome: ItemOutcome) -> bool {
        if self.outcome != ItemOutcome::Pending || outcome == ItemOutcome::Pending {
            return false;
        }
        self.outcome = outcome;
        true
    }

    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }
}

pub fn is_source_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    SOURCE_EXTENSIONS.contains(&ext.as_str())
}

/// Source files directly inside `dir`, sorted by path.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }
    let mut sources: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| is_source_file(p))
        .collect();
    sources.sort();
    Ok(sources)
}

/// Scan `dir` into batch items, all selected.
pub fn scan(dir: &Path) -> Result<Vec<BatchItem>, ScanError> {
    Ok(discover_sources(dir)?
        .into_iter()
        .map(BatchItem::new)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn finds_tiff_extensions_case_insensitively() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.tif", "a.TIFF", "c.Tif", "notes.txt", "photo.png", "tif"] {
            touch(tmp.path(), name);
        }

        let names: Vec<String> = scan(tmp.path())
            .unwrap()
            .iter()
            .map(BatchItem::file_name)
            .collect();
        assert_eq!(names, vec!["a.TIFF", "b.tif", "c.Tif"]);
    }

    #[test]
    fn does_not_recurse() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "top.tif");
        let nested = tmp.path().join("nested.tif");
        fs::create_dir(&nested).unwrap();
        touch(&nested, "deep.tif");

        let found = discover_sources(tmp.path()).unwrap();
        assert_eq!(found, vec![tmp.path().join("top.tif")]);
    }

    #[test]
    fn empty_folder_yields_no_items() {
        let tmp = TempDir::new().unwrap();
        assert!(scan(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_folder_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            scan(&tmp.path().join("absent")),
            Err(ScanError::NotADirectory(_))
        ));
    }

    #[test]
    fn scanned_items_start_selected_and_pending() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.tif");
        let items = scan(tmp.path()).unwrap();
        assert!(items[0].selected);
        assert_eq!(items[0].outcome(), &ItemOutcome::Pending);
    }

    #[test]
    fn outcome_transitions_once() {
        let mut item = BatchItem::new("a.tif");
        assert!(item.record(ItemOutcome::Failed("corrupt".into())));
        assert!(!item.record(ItemOutcome::Success));
        assert_eq!(item.outcome(), &ItemOutcome::Failed("corrupt".into()));
    }

    #[test]
    fn recording_pending_is_ignored() {
        let mut item = BatchItem::new("a.tif");
        assert!(!item.record(ItemOutcome::Pending));
        assert!(item.record(ItemOutcome::Success));
    }
}
