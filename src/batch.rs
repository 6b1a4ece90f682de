//! Batch conversion of a folder of TIFFs.
//!
//! Items run strictly one after another: decode, transform and save finish
//! for one file before the next starts, so at most one decoded image is
//! resident and output numbering is reproducible.
//!
//! ## Failure policy
//!
//! Per-item failures (corrupt source, unwritable output, ...) are recorded on
//! the item and the run continues. Only two conditions abort a run before any
//! item is attempted: nothing selected, and an output directory that cannot
//! be created.
//!
//! ## Progress
//!
//! Progress is reported through an optional [`BatchEvent`] channel. Sends are
//! fire-and-forget: a dropped receiver never stalls or fails the run.
//!
//! ## Cancellation
//!
//! A [`CancelToken`] is checked before each item, never in the middle of one,
//! so a cancel request cannot leave a half-written PNG behind.

use crate::imaging::{ConversionSettings, ImageCodec, RustCodec, convert_file};
use crate::naming::{DEFAULT_ROOT_NAME, batch_output_name};
use crate::scan::{self, BatchItem, ItemOutcome, ScanError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No source files to convert")]
    NoSourceFiles,
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),
}

/// Where and how a batch writes its output.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub output_dir: PathBuf,
    /// Prefix for `<root>_<NN>.png`.
    pub root_name: String,
    pub settings: ConversionSettings,
}

impl BatchConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            root_name: DEFAULT_ROOT_NAME.to_string(),
            settings: ConversionSettings::default(),
        }
    }
}

/// Shared flag for stopping a run between items.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress events emitted during a run.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        total: usize,
        output_dir: PathBuf,
    },
    /// One item done. `completed` counts up from 1 to `total`.
    ItemFinished {
        completed: usize,
        total: usize,
        source: PathBuf,
        outcome: ItemOutcome,
        output: Option<PathBuf>,
    },
    Cancelled {
        completed: usize,
        total: usize,
    },
    Finished(BatchSummary),
}

/// Final counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Items never attempted because the run was cancelled.
    pub skipped: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    /// Fully successful only when every item converted.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }
}

/// Items as they ended up after the run, plus the counts.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Selected items in run order. Skipped items stay `Pending`.
    pub items: Vec<BatchItem>,
    pub summary: BatchSummary,
}

fn emit(events: &Option<Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

/// Convert the selected `items` with the production codec.
pub fn run_batch(
    items: &[BatchItem],
    config: &BatchConfig,
    events: Option<Sender<BatchEvent>>,
    cancel: &CancelToken,
) -> Result<BatchReport, BatchError> {
    run_batch_with_codec(&RustCodec::new(), items, config, events, cancel)
}

/// Convert the selected `items` with a custom codec (for testing).
///
/// The selection is snapshotted on entry with every outcome reset to
/// pending; output numbers follow the order of the selected items, counting
/// failed ones.
pub fn run_batch_with_codec(
    codec: &impl ImageCodec,
    items: &[BatchItem],
    config: &BatchConfig,
    events: Option<Sender<BatchEvent>>,
    cancel: &CancelToken,
) -> Result<BatchReport, BatchError> {
    let selected: Vec<BatchItem> = items
        .iter()
        .filter(|i| i.selected)
        .map(|i| BatchItem::new(i.source.clone()))
        .collect();
    if selected.is_empty() {
        return Err(BatchError::NoSourceFiles);
    }

    std::fs::create_dir_all(&config.output_dir).map_err(|source| BatchError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;

    let total = selected.len();
    info!(total, output_dir = %config.output_dir.display(), "batch started");
    emit(
        &events,
        BatchEvent::Started {
            total,
            output_dir: config.output_dir.clone(),
        },
    );

    let mut summary = BatchSummary::default();
    let mut finished = Vec::with_capacity(total);
    let mut queue = selected.into_iter().enumerate();

    while let Some((index, mut item)) = queue.next() {
        if cancel.is_cancelled() {
            info!(completed = index, total, "batch cancelled");
            emit(
                &events,
                BatchEvent::Cancelled {
                    completed: index,
                    total,
                },
            );
            summary.skipped = total - index;
            finished.push(item);
            finished.extend(queue.by_ref().map(|(_, rest)| rest));
            break;
        }

        let dest = config
            .output_dir
            .join(batch_output_name(&config.root_name, index));
        let (outcome, output) = match convert_file(codec, &item.source, &dest, &config.settings) {
            Ok(dims) => {
                debug!(source = %item.source.display(), dest = %dest.display(), ?dims, "converted");
                summary.succeeded += 1;
                (ItemOutcome::Success, Some(dest))
            }
            Err(e) => {
                warn!(source = %item.source.display(), error = %e, "conversion failed");
                summary.failed += 1;
                (ItemOutcome::Failed(e.to_string()), None)
            }
        };

        item.record(outcome.clone());
        emit(
            &events,
            BatchEvent::ItemFinished {
                completed: index + 1,
                total,
                source: item.source.clone(),
                outcome,
                output,
            },
        );
        finished.push(item);
    }

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        "batch finished"
    );
    emit(&events, BatchEvent::Finished(summary));

    Ok(BatchReport {
        items: finished,
        summary,
    })
}

/// Scan `input_dir` and convert every source file found.
pub fn run_folder(
    input_dir: &Path,
    config: &BatchConfig,
    events: Option<Sender<BatchEvent>>,
    cancel: &CancelToken,
) -> Result<BatchReport, BatchError> {
    let items = scan::scan(input_dir)?;
    run_batch(&items, config, events, cancel)
}
