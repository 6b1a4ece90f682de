//! Converter configuration.
//!
//! Handles loading, validating, and merging `tiff2png.toml`. Values are
//! layered: stock defaults are overridden by the config file, which is in
//! turn overridden by command-line flags.
//!
//! ## Config File Location
//!
//! `tiff2png.toml` is read from the working directory when present, or from
//! the path given with `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [conversion]
//! scale = 1.0               # Uniform scale factor, in (0, 1]
//! # width = 1920            # Manual target width (needs height too)
//! # height = 1080           # Manual target height
//! # resolution = "full-hd"  # Preset: 4k, 2k, full-hd, hd, svga, vga
//! fill = false              # Crop to the exact target instead of scaling to fit
//! color_mode = "auto"       # auto, rgb, rgba, grayscale, grayscale-alpha, palette
//! dither = "auto"           # auto, none, floyd-steinberg (palette only)
//! filter = "auto"           # auto, none, sub, up, average, paeth
//! optimize = true           # Run the PNG optimisation pass
//! interlace = false         # Adam7 progressive output
//!
//! [batch]
//! root_name = "Batch_01"    # Output names: <root_name>_01.png, ...
//! output_subfolder = true   # Single-file output goes to PNG_Output/
//!
//! [preview]
//! max_width = 400
//! max_height = 400
//! ```
//!
//! ## Target Resolution
//!
//! A preset implies fill mode. A manual width and height, both positive,
//! take precedence over a preset.
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want:
//!
//! ```toml
//! [conversion]
//! color_mode = "palette"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    ConversionSettings, DitherMethod, FilterMethod, OutputColorMode, StandardResolution,
    validate_scale_factor,
};
use crate::naming::DEFAULT_ROOT_NAME;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "tiff2png.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Converter configuration loaded from `tiff2png.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// How each image is transformed and encoded.
    pub conversion: ConversionConfig,
    /// Batch naming and output placement.
    pub batch: BatchOptions,
    /// Preview rendering bounds.
    pub preview: PreviewConfig,
}

impl ConverterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.conversion.validate()?;

        let root = self.batch.root_name.trim();
        if root.is_empty() {
            return Err(ConfigError::Validation(
                "batch.root_name must not be empty".into(),
            ));
        }
        if root.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "batch.root_name must not contain path separators".into(),
            ));
        }
        if self.preview.max_width == 0 || self.preview.max_height == 0 {
            return Err(ConfigError::Validation(
                "preview.max_width and preview.max_height must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    pub scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<StandardResolution>,
    pub fill: bool,
    pub color_mode: OutputColorMode,
    pub dither: DitherMethod,
    pub filter: FilterMethod,
    pub optimize: bool,
    pub interlace: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            width: None,
            height: None,
            resolution: None,
            fill: false,
            color_mode: OutputColorMode::Auto,
            dither: DitherMethod::Auto,
            filter: FilterMethod::Auto,
            optimize: true,
            interlace: false,
        }
    }
}

impl ConversionConfig {
    /// Manual width/height when both are set and positive.
    fn manual_target(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }

    /// Resolved target resolution and fill mode.
    ///
    /// Manual dimensions win over a preset; a preset alone turns fill on.
    pub fn target(&self) -> (Option<(u32, u32)>, bool) {
        if let Some(manual) = self.manual_target() {
            return (Some(manual), self.fill);
        }
        match self.resolution {
            Some(preset) => (Some(preset.dimensions()), true),
            None => (None, self.fill),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_scale_factor(self.scale)
            .map_err(|e| ConfigError::Validation(format!("conversion.scale: {e}")))?;
        match (self.width, self.height) {
            (None, None) => {}
            (Some(w), Some(h)) if w > 0 && h > 0 => {}
            _ => {
                return Err(ConfigError::Validation(
                    "conversion.width and conversion.height must both be set and non-zero".into(),
                ));
            }
        }
        if self.fill && self.target().0.is_none() {
            return Err(ConfigError::Validation(
                "conversion.fill requires width/height or a resolution preset".into(),
            ));
        }
        Ok(())
    }

    /// The immutable settings bundle handed to the pipeline.
    pub fn to_settings(&self) -> ConversionSettings {
        let (target_resolution, fill_mode) = self.target();
        ConversionSettings {
            scale_factor: self.scale,
            target_resolution,
            fill_mode,
            crop_box: None,
            color_mode: self.color_mode,
            dither_method: self.dither,
            optimize: self.optimize,
            interlace: self.interlace,
            filter_method: self.filter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchOptions {
    /// Prefix for `<root_name>_<NN>.png`.
    pub root_name: String,
    /// Put single-file output in a `PNG_Output` folder next to the input.
    pub output_subfolder: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            output_subfolder: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        let (max_width, max_height) = crate::imaging::PREVIEW_BOX;
        Self {
            max_width,
            max_height,
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ConverterConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and
/// validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ConverterConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ConverterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `tiff2png.toml` from `dir`, falling back to defaults when absent.
pub fn load_config(dir: &Path) -> Result<ConverterConfig, ConfigError> {
    resolve_config(load_raw_config(&dir.join(CONFIG_FILE_NAME))?)
}

/// Load an explicitly named config file, which must exist.
pub fn load_config_file(path: &Path) -> Result<ConverterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    resolve_config(Some(toml::from_str(&content)?))
}

/// Returns a fully-commented stock `tiff2png.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# tiff2png Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Conversion
# ---------------------------------------------------------------------------
[conversion]
# Uniform scale factor applied before any cropping, in (0, 1].
scale = 1.0

# Target resolution. Set both width and height, or pick a preset.
# Manual width/height take precedence over a preset.
# width = 1920
# height = 1080

# Presets: "4k" (3840x2160), "2k" (2560x1440), "full-hd" (1920x1080),
# "hd" (1280x720), "svga" (800x600), "vga" (640x480).
# Choosing a preset turns fill mode on.
# resolution = "full-hd"

# Fill mode: crop the scaled image to exactly the target resolution,
# centred. Off means scale-to-fit only.
fill = false

# Output colour mode: "auto" (keep source), "rgb", "rgba", "grayscale",
# "grayscale-alpha", "palette" (at most 256 colours).
color_mode = "auto"

# Dithering for palette output: "auto", "none", "floyd-steinberg".
dither = "auto"

# PNG scanline filter: "auto" lets the encoder choose per scanline.
# Others: "none", "sub", "up", "average", "paeth".
filter = "auto"

# Run the PNG optimisation pass. Compression is always maximal.
optimize = true

# Adam7 progressive (interlaced) output.
interlace = false

# ---------------------------------------------------------------------------
# Batch output
# ---------------------------------------------------------------------------
[batch]
# Batch outputs are named <root_name>_01.png, <root_name>_02.png, ...
root_name = "Batch_01"

# Single-file conversions write into a PNG_Output folder next to the input.
output_subfolder = true

# ---------------------------------------------------------------------------
# Preview
# ---------------------------------------------------------------------------
[preview]
# Previews fit inside this box and are never upscaled.
max_width = 400
max_height = 400
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_passthrough() {
        let config = ConverterConfig::default();
        assert_eq!(config.conversion.scale, 1.0);
        assert!(config.conversion.optimize);
        assert_eq!(config.conversion.to_settings(), ConversionSettings::default());
    }

    #[test]
    fn default_config_has_batch_defaults() {
        let config = ConverterConfig::default();
        assert_eq!(config.batch.root_name, "Batch_01");
        assert!(config.batch.output_subfolder);
        assert_eq!(config.preview.max_width, 400);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[conversion]
color_mode = "palette"
dither = "none"
"#;
        let config: ConverterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.conversion.color_mode, OutputColorMode::Palette);
        assert_eq!(config.conversion.dither, DitherMethod::None);
        // Unspecified values keep defaults
        assert_eq!(config.conversion.scale, 1.0);
        assert_eq!(config.batch.root_name, "Batch_01");
    }

    // =========================================================================
    // Target resolution
    // =========================================================================

    #[test]
    fn preset_implies_fill() {
        let conv = ConversionConfig {
            resolution: Some(StandardResolution::Hd),
            ..Default::default()
        };
        let settings = conv.to_settings();
        assert_eq!(settings.target_resolution, Some((1280, 720)));
        assert!(settings.fill_mode);
    }

    #[test]
    fn manual_dimensions_win_over_preset() {
        let conv = ConversionConfig {
            width: Some(500),
            height: Some(300),
            resolution: Some(StandardResolution::Uhd4k),
            fill: true,
            ..Default::default()
        };
        assert_eq!(conv.to_settings().target_resolution, Some((500, 300)));
    }

    #[test]
    fn manual_dimensions_without_fill_stay_fit_mode() {
        let conv = ConversionConfig {
            width: Some(500),
            height: Some(300),
            ..Default::default()
        };
        let settings = conv.to_settings();
        assert!(!settings.fill_mode);
        assert_eq!(settings.fill_target(), None);
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(ConverterConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_scale_out_of_range() {
        for scale in [0.0, -1.0, 1.01, f64::NAN] {
            let mut config = ConverterConfig::default();
            config.conversion.scale = scale;
            assert!(
                matches!(config.validate(), Err(ConfigError::Validation(_))),
                "scale {scale}"
            );
        }
    }

    #[test]
    fn validate_width_without_height() {
        let mut config = ConverterConfig::default();
        config.conversion.width = Some(100);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_zero_dimension() {
        let mut config = ConverterConfig::default();
        config.conversion.width = Some(0);
        config.conversion.height = Some(100);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_fill_without_target() {
        let mut config = ConverterConfig::default();
        config.conversion.fill = true;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("conversion.fill"));
    }

    #[test]
    fn validate_root_name() {
        let mut config = ConverterConfig::default();
        config.batch.root_name = "  ".into();
        assert!(config.validate().is_err());
        config.batch.root_name = "a/b".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_preview_bounds() {
        let mut config = ConverterConfig::default();
        config.preview.max_height = 0;
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, ConverterConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"
[conversion]
scale = 0.5
resolution = "vga"

[batch]
root_name = "Scans"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.conversion.scale, 0.5);
        assert_eq!(config.batch.root_name, "Scans");
        let settings = config.conversion.to_settings();
        assert_eq!(settings.fill_target(), Some((640, 480)));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "[conversion]\nscale = 2.0\n",
        )
        .unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_config_file_must_exist() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            load_config_file(&tmp.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<ConverterConfig, _> = toml::from_str("[conversion]\nquality = 90\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<ConverterConfig, _> = toml::from_str("[thumbnails]\nsize = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_preset_rejected() {
        let result: Result<ConverterConfig, _> =
            toml::from_str("[conversion]\nresolution = \"8k\"\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // merge_toml
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"scale = 1.0"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"scale = 0.5"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("scale").unwrap().as_float(), Some(0.5));
    }

    #[test]
    fn merge_toml_table_merge_preserves_base_keys() {
        let base: toml::Value = toml::from_str(
            r#"
[conversion]
scale = 1.0
optimize = true
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[conversion]
optimize = false
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let conv = merged.get("conversion").unwrap();
        assert_eq!(conv.get("optimize").unwrap().as_bool(), Some(false));
        assert_eq!(conv.get("scale").unwrap().as_float(), Some(1.0));
    }

    #[test]
    fn merge_toml_adds_new_keys() {
        let base: toml::Value = toml::from_str("[conversion]\nscale = 1.0\n").unwrap();
        let overlay: toml::Value =
            toml::from_str("[conversion]\nresolution = \"hd\"\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(
            merged["conversion"]["resolution"].as_str(),
            Some("hd")
        );
    }

    // =========================================================================
    // stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: ConverterConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, ConverterConfig::default());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        assert!(content.contains("[conversion]"));
        assert!(content.contains("[batch]"));
        assert!(content.contains("[preview]"));
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        assert!(val.is_table());
        assert!(val.get("conversion").is_some());
        assert!(val.get("batch").is_some());
        assert!(val.get("preview").is_some());
        // Unset optional keys are omitted rather than serialized
        assert!(val["conversion"].get("width").is_none());
    }
}
