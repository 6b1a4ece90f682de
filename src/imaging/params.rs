//! Parameter types for conversions.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which runs the transform stages in order) and the
//! [`backend`](super::backend) (which does the pixel work).
//!
//! ## Types
//!
//! - [`ColorMode`]: pixel representation of an image handle.
//! - [`OutputColorMode`]: requested output mode; `auto` keeps the source mode.
//! - [`DitherMethod`]: dithering for palette conversion.
//! - [`FilterMethod`]: PNG scanline filter; `auto` lets the encoder choose.
//! - [`StandardResolution`]: preset target resolutions.
//! - [`ConversionSettings`]: the full immutable settings bundle.
//! - [`PngOptions`]: the encode-time subset of the settings.

use super::calculations::{CropBox, GeometryError, validate_scale_factor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel representation of a decoded or transformed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    Grayscale,
    GrayscaleAlpha,
    Rgb,
    Rgba,
    Palette,
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorMode::Grayscale => "grayscale",
            ColorMode::GrayscaleAlpha => "grayscale+alpha",
            ColorMode::Rgb => "RGB",
            ColorMode::Rgba => "RGBA",
            ColorMode::Palette => "palette",
        };
        f.write_str(name)
    }
}

/// Requested output colour mode.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum OutputColorMode {
    /// Keep the source representation.
    #[default]
    Auto,
    Rgb,
    Rgba,
    Grayscale,
    GrayscaleAlpha,
    /// Adaptive palette of at most 256 entries.
    Palette,
}

impl OutputColorMode {
    /// The explicit target mode, or `None` for `auto`.
    pub fn target(self) -> Option<ColorMode> {
        match self {
            OutputColorMode::Auto => None,
            OutputColorMode::Rgb => Some(ColorMode::Rgb),
            OutputColorMode::Rgba => Some(ColorMode::Rgba),
            OutputColorMode::Grayscale => Some(ColorMode::Grayscale),
            OutputColorMode::GrayscaleAlpha => Some(ColorMode::GrayscaleAlpha),
            OutputColorMode::Palette => Some(ColorMode::Palette),
        }
    }
}

/// Dithering applied when reducing to a palette.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum DitherMethod {
    /// Library default, which is Floyd–Steinberg.
    #[default]
    Auto,
    None,
    FloydSteinberg,
}

impl DitherMethod {
    /// Whether error diffusion should run.
    pub fn diffuses(self) -> bool {
        !matches!(self, DitherMethod::None)
    }
}

/// PNG scanline filter.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMethod {
    /// No explicit directive: the encoder picks a filter per scanline.
    #[default]
    Auto,
    None,
    Sub,
    Up,
    Average,
    Paeth,
}

/// Preset output resolutions offered alongside manual width/height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum StandardResolution {
    #[serde(rename = "4k")]
    #[value(name = "4k")]
    Uhd4k,
    #[serde(rename = "2k")]
    #[value(name = "2k")]
    Qhd2k,
    #[serde(rename = "full-hd")]
    #[value(name = "full-hd")]
    FullHd,
    #[serde(rename = "hd")]
    #[value(name = "hd")]
    Hd,
    #[serde(rename = "svga")]
    #[value(name = "svga")]
    Svga,
    #[serde(rename = "vga")]
    #[value(name = "vga")]
    Vga,
}

impl StandardResolution {
    pub const ALL: [StandardResolution; 6] = [
        StandardResolution::Uhd4k,
        StandardResolution::Qhd2k,
        StandardResolution::FullHd,
        StandardResolution::Hd,
        StandardResolution::Svga,
        StandardResolution::Vga,
    ];

    pub fn dimensions(self) -> (u32, u32) {
        match self {
            StandardResolution::Uhd4k => (3840, 2160),
            StandardResolution::Qhd2k => (2560, 1440),
            StandardResolution::FullHd => (1920, 1080),
            StandardResolution::Hd => (1280, 720),
            StandardResolution::Svga => (800, 600),
            StandardResolution::Vga => (640, 480),
        }
    }

    /// The preset with exactly these dimensions, if any.
    pub fn matching(dims: (u32, u32)) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.dimensions() == dims)
    }

    pub fn label(self) -> &'static str {
        match self {
            StandardResolution::Uhd4k => "4K",
            StandardResolution::Qhd2k => "2K",
            StandardResolution::FullHd => "Full HD",
            StandardResolution::Hd => "HD",
            StandardResolution::Svga => "SVGA",
            StandardResolution::Vga => "VGA",
        }
    }
}

/// Why a settings bundle was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsProblem {
    ScaleFactor(GeometryError),
    Invalid(String),
}

/// Immutable settings bundle passed into every pipeline call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSettings {
    /// Uniform multiplier applied before any cropping, in `(0, 1]`.
    pub scale_factor: f64,
    /// `(width, height)` used by fill mode.
    pub target_resolution: Option<(u32, u32)>,
    /// Crop to exactly `target_resolution` instead of scale-to-fit.
    pub fill_mode: bool,
    /// Hand-placed crop in original-image pixels. In fill mode it replaces
    /// the centred target window.
    pub crop_box: Option<CropBox>,
    pub color_mode: OutputColorMode,
    pub dither_method: DitherMethod,
    pub optimize: bool,
    pub interlace: bool,
    pub filter_method: FilterMethod,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            target_resolution: None,
            fill_mode: false,
            crop_box: None,
            color_mode: OutputColorMode::Auto,
            dither_method: DitherMethod::Auto,
            optimize: true,
            interlace: false,
            filter_method: FilterMethod::Auto,
        }
    }
}

impl ConversionSettings {
    /// Check the bundle before any pixel work.
    ///
    /// Fill mode needs a target resolution with both sides positive, or a
    /// hand-placed crop box.
    pub fn validate(&self) -> Result<(), SettingsProblem> {
        validate_scale_factor(self.scale_factor).map_err(SettingsProblem::ScaleFactor)?;
        if let Some((w, h)) = self.target_resolution {
            if w == 0 || h == 0 {
                return Err(SettingsProblem::Invalid(format!(
                    "target resolution must be positive, got {w}x{h}"
                )));
            }
        }
        if let Some(crop) = self.crop_box {
            if crop.left >= crop.right || crop.top >= crop.bottom {
                return Err(SettingsProblem::Invalid(format!(
                    "crop box {:?} is empty",
                    crop.as_tuple()
                )));
            }
        }
        if self.fill_mode && self.target_resolution.is_none() && self.crop_box.is_none() {
            return Err(SettingsProblem::Invalid(
                "fill mode requires a target resolution".into(),
            ));
        }
        Ok(())
    }

    /// Target resolution when fill mode is active, `None` in fit mode.
    pub fn fill_target(&self) -> Option<(u32, u32)> {
        if self.fill_mode {
            self.target_resolution
        } else {
            None
        }
    }

    pub fn png_options(&self) -> PngOptions {
        PngOptions {
            optimize: self.optimize,
            interlace: self.interlace,
            filter_method: self.filter_method,
        }
    }
}

/// Encode-time options. Compression level is always maximal and not exposed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PngOptions {
    /// Run the chunk/palette optimisation pass.
    pub optimize: bool,
    /// Adam7 progressive layout.
    pub interlace: bool,
    pub filter_method: FilterMethod,
}
