//! # tiff2png
//!
//! Converts TIFF images to compact PNG files, one at a time or a whole
//! folder at once. Every image goes through the same fixed pipeline, driven
//! by a single immutable [`imaging::ConversionSettings`] value.
//!
//! # Architecture: One Pipeline, Several Callers
//!
//! ```text
//! decode ─→ resize ─→ fill crop ─→ colour conversion ─→ PNG encode ─→ optimise
//!           (scale)   (target or    (RGB, RGBA, grey,    (filter,     (oxipng)
//!                      hand-placed)  palette + dither)    level 9)
//! ```
//!
//! The CLI's `convert`, `batch`, `estimate` and `preview` commands are thin
//! callers of that pipeline. None of them hold any image state of their own:
//!
//! - **convert** runs [`imaging::convert_file`] once.
//! - **batch** hands a snapshot of selected [`scan::BatchItem`]s to
//!   [`batch::run_batch`], which streams [`batch::BatchEvent`]s back over a
//!   channel while it works.
//! - **estimate** and **preview** decode once and call
//!   [`imaging::derive`], which recomputes both previews, the output
//!   geometry and the size estimate from the current settings.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Geometry, size estimation, the transform pipeline, PNG encoding and preview rendering |
//! | [`interaction`] | Crop-box editing: handle hit-testing, drag/resize/nudge with clamping |
//! | [`scan`] | Source discovery and per-item batch state |
//! | [`batch`] | Sequential batch runner with progress events and cancellation |
//! | [`naming`] | Output file naming (`<root>_NN.png`, `PNG_Output/`) |
//! | [`config`] | `tiff2png.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Settings Are a Value
//!
//! Nothing observes the settings. A change produces a new
//! [`imaging::ConversionSettings`] and the caller explicitly re-runs
//! [`imaging::derive`]. This keeps every derived view a plain function of
//! `(image, settings)`, which is what makes it testable without a UI.
//!
//! ## Codec Behind a Trait
//!
//! All pixel work goes through [`imaging::ImageCodec`]. The production
//! [`imaging::RustCodec`] is pure Rust (`image`, `png`, `oxipng`,
//! `color_quant`) so the binary has no system dependencies. Tests swap in a
//! recording mock to assert which stages ran without encoding anything.
//!
//! ## Estimates Are Advisory
//!
//! [`imaging::estimate`] is a bytes-per-pixel heuristic. It is shown next to
//! the real geometry but never used to make decisions.
//!
//! ## Batch Failures Are Per-Item
//!
//! One unreadable TIFF marks that item failed and the batch moves on.
//! Output numbering follows the position in the selection, so a failure
//! leaves a gap (`_01`, `_03`) rather than shifting later files.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod interaction;
pub mod naming;
pub mod output;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
