//! Image processing: pure Rust, no external tools.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode TIFF** | `image::ImageReader` |
//! | **Resize** | `resize_exact` with Lanczos3 |
//! | **Palette** | `color_quant::NeuQuant` + `imageops::dither` |
//! | **Encode PNG** | `png` encoder, then an `oxipng` pass |
//! | **Preview** | `imageops::resize` + overlay drawing |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry (unit testable)
//! - **Estimate**: Heuristic output-size prediction
//! - **Parameters**: Data structures describing a conversion
//! - **Backend**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Operations**: The transform pipeline combining calculations + codec
//! - **Preview**: Scaled preview with the crop overlay

pub mod backend;
mod calculations;
mod estimate;
pub mod operations;
mod params;
pub mod preview;
pub mod rust_backend;

pub use backend::{CodecError, Dimensions, ImageCodec, ImageHandle};
pub use calculations::{
    CropBox, GeometryError, compute_crop_box, map_crop_box_to_original, map_crop_box_to_preview,
    preview_scale, scale_crop_box, scaled_dimensions, validate_scale_factor,
};
pub use estimate::{compression_ratio, estimate, format_human_size};
pub use operations::{
    ConvertError, Derived, TransformStage, convert_file, crop_box_for, derive, open,
    output_dimensions, save, transform,
};
pub use params::{
    ColorMode, ConversionSettings, DitherMethod, FilterMethod, OutputColorMode, PngOptions,
    SettingsProblem, StandardResolution,
};
pub use preview::{PREVIEW_BOX, Preview, render_preview};
pub use rust_backend::{RustCodec, SOURCE_EXTENSIONS};
