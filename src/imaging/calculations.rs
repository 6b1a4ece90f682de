//! Pure geometry for scale, fill-mode crop and preview mapping.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! Two coordinate spaces exist: original-image pixels and preview pixels.
//! A [`CropBox`] is always expressed in exactly one of them; the `map_*`
//! functions are the only way to move a box between spaces.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Invalid scale factor {0}: must be finite and in (0, 1]")]
    InvalidScaleFactor(f64),
    #[error("Crop box would be empty ({width}x{height})")]
    EmptyCropBox { width: u32, height: u32 },
}

/// Rectangle `(left, top, right, bottom)` selecting the retained region.
///
/// Edges are half-open: `right` and `bottom` are exclusive, matching the
/// crop semantics of the imaging library. Unsigned fields make negative
/// coordinates unrepresentable; [`CropBox::new`] enforces `left < right`
/// and `top < bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropBox {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Result<Self, GeometryError> {
        if left >= right || top >= bottom {
            return Err(GeometryError::EmptyCropBox {
                width: right.saturating_sub(left),
                height: bottom.saturating_sub(top),
            });
        }
        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Whether the box lies entirely inside a `width x height` space.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right <= width && self.bottom <= height
    }

    /// Pull the box inside `width x height`, shrinking it if necessary.
    ///
    /// Always yields at least a 1x1 box for a non-empty space.
    pub fn clamped_to(&self, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let left = self.left.min(width - 1);
        let top = self.top.min(height - 1);
        Self {
            left,
            top,
            right: self.right.clamp(left + 1, width),
            bottom: self.bottom.clamp(top + 1, height),
        }
    }

    pub fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (self.left, self.top, self.right, self.bottom)
    }
}

/// Reject scale factors outside `(0, 1]`.
pub fn validate_scale_factor(scale_factor: f64) -> Result<f64, GeometryError> {
    if scale_factor.is_finite() && scale_factor > 0.0 && scale_factor <= 1.0 {
        Ok(scale_factor)
    } else {
        Err(GeometryError::InvalidScaleFactor(scale_factor))
    }
}

/// Scale both dimensions by `scale_factor`, truncating toward zero.
///
/// Truncation (not rounding) is deliberate: the size estimator and the real
/// resize must agree on the exact output size.
///
/// # Examples
/// ```
/// # use tiff2png::imaging::scaled_dimensions;
/// assert_eq!(scaled_dimensions(1000, 750, 0.5), (500, 375));
/// assert_eq!(scaled_dimensions(999, 333, 0.5), (499, 166));
/// ```
pub fn scaled_dimensions(width: u32, height: u32, scale_factor: f64) -> (u32, u32) {
    (
        (width as f64 * scale_factor) as u32,
        (height as f64 * scale_factor) as u32,
    )
}

/// Center a `target_w x target_h` window inside a `scaled_w x scaled_h` image.
///
/// When the target is larger than the image on an axis, the offset on that
/// axis is clamped to zero and the window shrinks to the image extent, so the
/// result always lies inside `[0, scaled_w] x [0, scaled_h]`.
pub fn compute_crop_box(
    scaled_w: u32,
    scaled_h: u32,
    target_w: u32,
    target_h: u32,
) -> Result<CropBox, GeometryError> {
    let width = target_w.min(scaled_w);
    let height = target_h.min(scaled_h);
    if width == 0 || height == 0 {
        return Err(GeometryError::EmptyCropBox { width, height });
    }

    let left = (scaled_w - width) / 2;
    let top = (scaled_h - height) / 2;
    CropBox::new(left, top, left + width, top + height)
}

/// Map a box from scaled-image space back to original-image pixels.
///
/// Fails with [`GeometryError::InvalidScaleFactor`] for a zero, negative,
/// non-finite or greater-than-one factor instead of guessing a substitute.
pub fn map_crop_box_to_original(
    crop: CropBox,
    scale_factor: f64,
) -> Result<CropBox, GeometryError> {
    let scale = validate_scale_factor(scale_factor)?;
    let inv = 1.0 / scale;
    let map = |v: u32| (v as f64 * inv) as u32;
    CropBox::new(
        map(crop.left),
        map(crop.top),
        map(crop.right),
        map(crop.bottom),
    )
}

/// Map a box from original-image pixels into preview pixels.
///
/// Coordinates are truncated; a box that collapses under a small preview
/// scale keeps a minimum extent of one preview pixel.
pub fn map_crop_box_to_preview(crop: CropBox, preview_scale: f64) -> CropBox {
    scale_crop_box(crop, preview_scale)
}

/// Multiply every edge by `factor`, truncating, keeping at least 1x1.
///
/// Also used to carry a manual crop from original pixels into the resized
/// image before the crop stage.
pub fn scale_crop_box(crop: CropBox, factor: f64) -> CropBox {
    let map = |v: u32| (v as f64 * factor) as u32;
    let left = map(crop.left);
    let top = map(crop.top);
    CropBox {
        left,
        top,
        right: map(crop.right).max(left + 1),
        bottom: map(crop.bottom).max(top + 1),
    }
}

/// Fit-inside scale for an image shown in a `max_w x max_h` preview box.
///
/// Never upscales: an image already smaller than the box is shown at 1:1.
pub fn preview_scale(img_w: u32, img_h: u32, max_w: u32, max_h: u32) -> f64 {
    if img_w == 0 || img_h == 0 {
        return 1.0;
    }
    let fit = (max_w as f64 / img_w as f64).min(max_h as f64 / img_h as f64);
    fit.min(1.0)
}
