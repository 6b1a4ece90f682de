//! Crop-box editing on the preview.
//!
//! Pointer positions arrive in preview pixels and may lie outside the
//! preview. The committed [`CropBox`] is kept in original-image pixels and
//! is always inside the image with both sides at least [`MIN_CROP_SIZE`]
//! (or the full image side when the image is smaller). The transient drag
//! state lives separately in [`InteractionState`] and never leaks into the
//! conversion settings.
//!
//! Commit rules:
//! - move and resize drags commit the overlay on every motion event
//! - releasing a drag commits the output (the transformed preview and the
//!   size estimate are recomputed)
//! - a keyboard nudge commits the output immediately

use crate::imaging::preview::HANDLE_SIZE;
use crate::imaging::{CropBox, Dimensions};

/// Smallest crop side reachable by resizing, in image pixels.
pub const MIN_CROP_SIZE: u32 = 10;

/// Arrow-key step, in preview pixels.
pub const NUDGE_STEP: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// What a pointer drag is doing, in image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Pointer offset from the box's top-left corner at press time.
    Move { offset_x: i64, offset_y: i64 },
    Resize(Handle),
}

/// Ephemeral pointer state owned by the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionState {
    pub drag: Option<DragMode>,
}

/// Result of an editing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Nothing changed.
    None,
    /// Redraw the overlay only.
    Overlay(CropBox),
    /// Re-run the output preview and estimate.
    Output(CropBox),
}

/// Crop box plus the interaction state editing it.
#[derive(Debug, Clone)]
pub struct CropEditor {
    crop: CropBox,
    image: Dimensions,
    preview_scale: f64,
    state: InteractionState,
}

impl CropEditor {
    /// `crop` is pulled inside the image. `preview_scale` is preview pixels
    /// per image pixel and must be positive.
    pub fn new(crop: CropBox, image: Dimensions, preview_scale: f64) -> Self {
        let preview_scale = if preview_scale.is_finite() && preview_scale > 0.0 {
            preview_scale
        } else {
            1.0
        };
        Self {
            crop: crop.clamped_to(image.width, image.height),
            image,
            preview_scale,
            state: InteractionState::default(),
        }
    }

    pub fn crop(&self) -> CropBox {
        self.crop
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    fn to_image(&self, preview: i32) -> i64 {
        (preview as f64 / self.preview_scale).floor() as i64
    }

    fn to_preview(&self, image: u32) -> i64 {
        (image as f64 * self.preview_scale) as i64
    }

    /// Corner handle under a preview-space point.
    pub fn handle_at(&self, x: i32, y: i32) -> Option<Handle> {
        let half = (HANDLE_SIZE / 2) as i64;
        let (x, y) = (x as i64, y as i64);
        let left = self.to_preview(self.crop.left);
        let top = self.to_preview(self.crop.top);
        let right = self.to_preview(self.crop.right);
        let bottom = self.to_preview(self.crop.bottom);
        let near = |cx: i64, cy: i64| (x - cx).abs() <= half && (y - cy).abs() <= half;

        [
            (Handle::TopLeft, left, top),
            (Handle::TopRight, right, top),
            (Handle::BottomLeft, left, bottom),
            (Handle::BottomRight, right, bottom),
        ]
        .into_iter()
        .find(|&(_, cx, cy)| near(cx, cy))
        .map(|(handle, _, _)| handle)
    }

    /// Start a drag. Handles take priority over moving the box.
    pub fn press(&mut self, x: i32, y: i32) -> Option<DragMode> {
        let drag = if let Some(handle) = self.handle_at(x, y) {
            Some(DragMode::Resize(handle))
        } else {
            let (ix, iy) = (self.to_image(x), self.to_image(y));
            let inside = ix >= self.crop.left as i64
                && ix < self.crop.right as i64
                && iy >= self.crop.top as i64
                && iy < self.crop.bottom as i64;
            inside.then(|| DragMode::Move {
                offset_x: ix - self.crop.left as i64,
                offset_y: iy - self.crop.top as i64,
            })
        };
        self.state.drag = drag;
        drag
    }

    /// Pointer motion while pressed.
    pub fn drag(&mut self, x: i32, y: i32) -> Commit {
        let Some(mode) = self.state.drag else {
            return Commit::None;
        };
        let (ix, iy) = (self.to_image(x), self.to_image(y));
        let next = match mode {
            DragMode::Move { offset_x, offset_y } => self.moved_to(ix - offset_x, iy - offset_y),
            DragMode::Resize(handle) => self.resized(handle, ix, iy),
        };
        self.crop = next;
        Commit::Overlay(next)
    }

    /// End the drag.
    pub fn release(&mut self) -> Commit {
        match self.state.drag.take() {
            Some(_) => Commit::Output(self.crop),
            None => Commit::None,
        }
    }

    /// Shift the box by one nudge step, converted to image pixels.
    pub fn nudge(&mut self, direction: Direction) -> Commit {
        let step = ((NUDGE_STEP as f64 / self.preview_scale) as i64).max(1);
        let (dx, dy) = match direction {
            Direction::Left => (-step, 0),
            Direction::Right => (step, 0),
            Direction::Up => (0, -step),
            Direction::Down => (0, step),
        };
        let next = self.moved_to(self.crop.left as i64 + dx, self.crop.top as i64 + dy);
        if next == self.crop {
            return Commit::None;
        }
        self.crop = next;
        Commit::Output(next)
    }

    /// Same-size box with its top-left at `(left, top)`, kept inside the image.
    fn moved_to(&self, left: i64, top: i64) -> CropBox {
        let (w, h) = (self.crop.width(), self.crop.height());
        let left = left.clamp(0, self.image.width.saturating_sub(w) as i64) as u32;
        let top = top.clamp(0, self.image.height.saturating_sub(h) as i64) as u32;
        CropBox {
            left,
            top,
            right: left + w,
            bottom: top + h,
        }
    }

    /// Move the dragged corner to `(x, y)`; the opposite corner stays put.
    fn resized(&self, handle: Handle, x: i64, y: i64) -> CropBox {
        let CropBox {
            mut left,
            mut top,
            mut right,
            mut bottom,
        } = self.crop;
        let min_w = MIN_CROP_SIZE.min(self.image.width).max(1) as i64;
        let min_h = MIN_CROP_SIZE.min(self.image.height).max(1) as i64;
        let (img_w, img_h) = (self.image.width as i64, self.image.height as i64);

        match handle {
            Handle::TopLeft | Handle::BottomLeft => {
                left = x.clamp(0, (right as i64 - min_w).max(0)) as u32;
            }
            Handle::TopRight | Handle::BottomRight => {
                right = x.clamp((left as i64 + min_w).min(img_w), img_w) as u32;
            }
        }
        match handle {
            Handle::TopLeft | Handle::TopRight => {
                top = y.clamp(0, (bottom as i64 - min_h).max(0)) as u32;
            }
            Handle::BottomLeft | Handle::BottomRight => {
                bottom = y.clamp((top as i64 + min_h).min(img_h), img_h) as u32;
            }
        }
        CropBox {
            left,
            top,
            right,
            bottom,
        }
    }
}
