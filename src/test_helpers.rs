//! Shared test utilities: synthetic TIFF sources and output inspection.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let src = tmp.path().join("scan.tif");
//! write_tiff(&src, 200, 150);
//! write_corrupt_tiff(&tmp.path().join("broken.tif"));
//! ```

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;

/// Deterministic RGB gradient, different on every pixel of small images.
pub fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
    })
}

/// Write an RGB TIFF with a gradient.
pub fn write_tiff(path: &Path, width: u32, height: u32) {
    gradient_rgb(width, height)
        .save_with_format(path, image::ImageFormat::Tiff)
        .unwrap();
}

/// Write an RGBA TIFF whose alpha ramps left to right.
pub fn write_rgba_tiff(path: &Path, width: u32, height: u32) {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 90, (x * 255 / width.max(1)) as u8])
    })
    .save_with_format(path, image::ImageFormat::Tiff)
    .unwrap();
}

/// Write a file with a TIFF extension and a truncated, undecodable body.
pub fn write_corrupt_tiff(path: &Path) {
    std::fs::write(path, b"II*\0garbage that is not a tiff directory").unwrap();
}

/// Dimensions of a PNG on disk.
pub fn png_dimensions(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

/// Names of all files in a directory, sorted.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
