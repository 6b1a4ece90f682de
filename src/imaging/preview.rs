//! Bounded preview rendering with the crop overlay.
//!
//! The overlay is drawn on a copy in preview space: a dimmed mask outside
//! the crop rectangle, a red border on the rectangle and a square handle on
//! each corner.

use super::backend::ImageHandle;
use super::calculations::{CropBox, map_crop_box_to_preview, preview_scale};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Default bounding box for previews.
pub const PREVIEW_BOX: (u32, u32) = (400, 400);

/// Side length of a corner handle, in preview pixels.
pub const HANDLE_SIZE: u32 = 8;

const BORDER_WIDTH: u32 = 2;
const BORDER_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const HANDLE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const MASK_ALPHA: u32 = 128;

/// A rendered preview and how it relates to the source image.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub image: RgbaImage,
    /// Preview pixels per source pixel, at most 1.0.
    pub scale: f64,
    /// The overlaid crop box in preview coordinates.
    pub crop: Option<CropBox>,
}

/// Render `image` to fit inside `bounds`, overlaying `crop` when given.
///
/// `crop` is in original-image coordinates. The caller's image is not
/// touched.
pub fn render_preview(image: &ImageHandle, crop: Option<CropBox>, bounds: (u32, u32)) -> Preview {
    let scale = preview_scale(image.width(), image.height(), bounds.0, bounds.1);
    let rgba = image.to_rgba8();
    let mut canvas = if scale < 1.0 {
        let w = ((image.width() as f64 * scale) as u32).max(1);
        let h = ((image.height() as f64 * scale) as u32).max(1);
        imageops::resize(&rgba, w, h, FilterType::Lanczos3)
    } else {
        rgba
    };

    let crop = crop.map(|c| {
        map_crop_box_to_preview(c, scale).clamped_to(canvas.width(), canvas.height())
    });
    if let Some(c) = crop {
        draw_overlay(&mut canvas, c);
    }

    Preview {
        image: canvas,
        scale,
        crop,
    }
}

fn draw_overlay(canvas: &mut RgbaImage, crop: CropBox) {
    let inside = |x: u32, y: u32| x >= crop.left && x < crop.right && y >= crop.top && y < crop.bottom;

    for (x, y, px) in canvas.enumerate_pixels_mut() {
        if !inside(x, y) {
            dim(px);
        } else if x < crop.left + BORDER_WIDTH
            || x + BORDER_WIDTH >= crop.right
            || y < crop.top + BORDER_WIDTH
            || y + BORDER_WIDTH >= crop.bottom
        {
            *px = BORDER_COLOR;
        }
    }

    for (cx, cy) in [
        (crop.left, crop.top),
        (crop.right, crop.top),
        (crop.left, crop.bottom),
        (crop.right, crop.bottom),
    ] {
        draw_handle(canvas, cx, cy);
    }
}

/// Composite black at `MASK_ALPHA` over the pixel.
fn dim(px: &mut Rgba<u8>) {
    for c in px.0.iter_mut().take(3) {
        *c = (*c as u32 * (255 - MASK_ALPHA) / 255) as u8;
    }
}

/// White square with a red outline, centred on `(cx, cy)` and clipped.
fn draw_handle(canvas: &mut RgbaImage, cx: u32, cy: u32) {
    let half = HANDLE_SIZE / 2;
    let x0 = cx.saturating_sub(half);
    let y0 = cy.saturating_sub(half);
    let x1 = (cx + half).min(canvas.width());
    let y1 = (cy + half).min(canvas.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let edge = x == x0 || y == y0 || x + 1 == x1 || y + 1 == y1;
            canvas.put_pixel(x, y, if edge { BORDER_COLOR } else { HANDLE_COLOR });
        }
    }
}
