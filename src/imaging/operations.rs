//! The conversion pipeline.
//!
//! These functions combine the pure geometry in
//! [`calculations`](super::calculations) with codec execution. Stages always
//! run in the same order:
//!
//! 1. **Resize** to `scaled_dimensions` when the scale factor is not 1.0
//! 2. **Crop** (fill mode only) to the hand-placed crop box when one is set,
//!    scaled into resized coordinates, otherwise to the centred target window
//!    measured on the already-resized image
//! 3. **Colour conversion** when an explicit output mode is requested
//!
//! Reordering changes the output, so [`transform`] is the only place the
//! stages are sequenced. Saving is a separate step; nothing here writes a
//! file implicitly except [`save`] and [`convert_file`].

use super::backend::{CodecError, Dimensions, ImageCodec, ImageHandle};
use super::calculations::{
    CropBox, GeometryError, compute_crop_box, map_crop_box_to_original, scale_crop_box,
    scaled_dimensions,
};
use super::estimate::estimate;
use super::params::{ColorMode, ConversionSettings, PngOptions, SettingsProblem};
use super::preview::{Preview, render_preview};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Pipeline stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStage {
    Resize,
    Crop,
    ColorConversion,
}

impl fmt::Display for TransformStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransformStage::Resize => "resize",
            TransformStage::Crop => "crop",
            TransformStage::ColorConversion => "colour conversion",
        })
    }
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    #[error("{stage} stage failed: {source}")]
    Transform {
        stage: TransformStage,
        #[source]
        source: CodecError,
    },
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Invalid scale factor {0}: must be finite and in (0, 1]")]
    InvalidScaleFactor(f64),
    #[error("Failed to save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

impl From<GeometryError> for ConvertError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::InvalidScaleFactor(s) => ConvertError::InvalidScaleFactor(s),
            GeometryError::EmptyCropBox { .. } => ConvertError::InvalidSettings(err.to_string()),
        }
    }
}

impl From<SettingsProblem> for ConvertError {
    fn from(problem: SettingsProblem) -> Self {
        match problem {
            SettingsProblem::ScaleFactor(err) => err.into(),
            SettingsProblem::Invalid(msg) => ConvertError::InvalidSettings(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

fn stage_error(stage: TransformStage) -> impl FnOnce(CodecError) -> ConvertError {
    move |source| ConvertError::Transform { stage, source }
}

/// Crop box for fill mode, in scaled-image coordinates.
///
/// A hand-placed box wins over the centred target window.
fn fill_crop(settings: &ConversionSettings, scaled: (u32, u32)) -> Result<Option<CropBox>> {
    if !settings.fill_mode {
        return Ok(None);
    }
    if let Some(manual) = settings.crop_box {
        if scaled.0 == 0 || scaled.1 == 0 {
            return Err(GeometryError::EmptyCropBox {
                width: scaled.0,
                height: scaled.1,
            }
            .into());
        }
        let crop = scale_crop_box(manual, settings.scale_factor);
        return Ok(Some(crop.clamped_to(scaled.0, scaled.1)));
    }
    match settings.fill_target() {
        Some((tw, th)) => Ok(Some(compute_crop_box(scaled.0, scaled.1, tw, th)?)),
        None => Ok(None),
    }
}

/// Run the resize → crop → colour-conversion stages.
///
/// Returns a new handle; `image` is never modified. Any stage failure aborts
/// the call and no partial result is returned.
pub fn transform(
    codec: &impl ImageCodec,
    image: &ImageHandle,
    settings: &ConversionSettings,
) -> Result<ImageHandle> {
    settings.validate()?;

    let mut current: Option<ImageHandle> = None;

    if settings.scale_factor != 1.0 {
        let (w, h) = scaled_dimensions(image.width(), image.height(), settings.scale_factor);
        debug!(from = ?image.dimensions(), width = w, height = h, "resize");
        let resized = codec
            .resample(image, w, h)
            .map_err(stage_error(TransformStage::Resize))?;
        current = Some(resized);
    }

    let working = current.as_ref().unwrap_or(image);
    if let Some(crop) = fill_crop(settings, (working.width(), working.height()))? {
        debug!(crop = ?crop.as_tuple(), "crop");
        let cropped = codec
            .crop(working, crop)
            .map_err(stage_error(TransformStage::Crop))?;
        current = Some(cropped);
    }

    let working = current.as_ref().unwrap_or(image);
    if let Some(mode) = settings.color_mode.target() {
        debug!(from = %working.color_mode(), to = %mode, dither = ?settings.dither_method, "convert");
        let converted = codec
            .convert_color_mode(working, mode, settings.dither_method)
            .map_err(stage_error(TransformStage::ColorConversion))?;
        current = Some(converted);
    }

    Ok(current.unwrap_or_else(|| image.clone()))
}

/// Encode `image` as PNG and write it to `dest`.
///
/// Failures carry the destination path. There is no retry.
pub fn save(
    codec: &impl ImageCodec,
    image: &ImageHandle,
    dest: &Path,
    options: &PngOptions,
) -> Result<()> {
    let save_error = |source| ConvertError::Save {
        path: dest.to_path_buf(),
        source,
    };
    let bytes = codec.encode(image, options).map_err(save_error)?;
    std::fs::write(dest, &bytes).map_err(|e| save_error(e.into()))?;
    debug!(path = %dest.display(), bytes = bytes.len(), "saved");
    Ok(())
}

/// Read and decode a source file.
pub fn open(codec: &impl ImageCodec, source: &Path) -> Result<ImageHandle> {
    let decode_error = |cause| ConvertError::Decode {
        path: source.to_path_buf(),
        source: cause,
    };
    let bytes = std::fs::read(source).map_err(|e| decode_error(e.into()))?;
    codec.decode(&bytes).map_err(decode_error)
}

/// Decode `source`, transform it, and save the PNG to `dest`.
///
/// Returns the dimensions of the written image.
pub fn convert_file(
    codec: &impl ImageCodec,
    source: &Path,
    dest: &Path,
    settings: &ConversionSettings,
) -> Result<Dimensions> {
    settings.validate()?;

    let image = open(codec, source)?;
    let output = transform(codec, &image, settings)?;
    save(codec, &output, dest, &settings.png_options())?;
    Ok(output.dimensions())
}

/// Fill-mode crop box in original-image coordinates, for the preview overlay.
///
/// `None` in fit mode.
pub fn crop_box_for(settings: &ConversionSettings, original: Dimensions) -> Result<Option<CropBox>> {
    settings.validate()?;
    if let (true, Some(manual)) = (settings.fill_mode, settings.crop_box) {
        return Ok(Some(manual.clamped_to(original.width, original.height)));
    }
    let scaled = scaled_dimensions(original.width, original.height, settings.scale_factor);
    let Some(crop) = fill_crop(settings, scaled)? else {
        return Ok(None);
    };
    let mapped = map_crop_box_to_original(crop, settings.scale_factor)?;
    Ok(Some(mapped.clamped_to(original.width, original.height)))
}

/// Dimensions [`transform`] will produce for an input of `original` size,
/// without touching pixels.
pub fn output_dimensions(original: Dimensions, settings: &ConversionSettings) -> Result<Dimensions> {
    settings.validate()?;
    let (width, height) = scaled_dimensions(original.width, original.height, settings.scale_factor);
    Ok(match fill_crop(settings, (width, height))? {
        Some(crop) => Dimensions {
            width: crop.width(),
            height: crop.height(),
        },
        None => Dimensions { width, height },
    })
}

/// Everything the live view shows for one settings value.
#[derive(Debug, Clone)]
pub struct Derived {
    /// Source preview with the crop overlay when fill mode is active.
    pub input_preview: Preview,
    /// Preview of the transformed image.
    pub output_preview: Preview,
    /// Heuristic PNG size; advisory only.
    pub estimated_bytes: u64,
    pub output_dimensions: Dimensions,
    pub output_mode: ColorMode,
}

/// Recompute the live view after a settings change.
///
/// Pure with respect to its inputs: callers invoke it explicitly whenever the
/// settings value changes instead of wiring observers onto the settings.
pub fn derive(
    codec: &impl ImageCodec,
    image: &ImageHandle,
    settings: &ConversionSettings,
    preview_bounds: (u32, u32),
) -> Result<Derived> {
    let crop = crop_box_for(settings, image.dimensions())?;
    let output = transform(codec, image, settings)?;
    let dims = output.dimensions();
    let mode = output.color_mode();

    Ok(Derived {
        input_preview: render_preview(image, crop, preview_bounds),
        output_preview: render_preview(&output, None, preview_bounds),
        estimated_bytes: estimate(dims.width, dims.height, mode, settings.optimize),
        output_dimensions: dims,
        output_mode: mode,
    })
}
