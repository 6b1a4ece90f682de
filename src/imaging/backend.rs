//! Image codec trait and the image handle it operates on.
//!
//! The [`ImageCodec`] trait defines the five capabilities the conversion
//! pipeline needs from an imaging library: decode, encode, resample, colour
//! conversion and crop. The pipeline never touches pixels itself.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec): pure Rust, built on the
//! `image` crate.

use super::calculations::CropBox;
use super::params::{ColorMode, DitherMethod, PngOptions};
use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Crop box {crop:?} outside {width}x{height} image")]
    InvalidCrop {
        crop: CropBox,
        width: u32,
        height: u32,
    },
    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// An 8-bit indexed image: one palette index per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedImage {
    pub indices: GrayImage,
    /// At most 256 RGBA entries.
    pub palette: Vec<[u8; 4]>,
}

impl IndexedImage {
    /// Expand indices through the palette.
    pub fn to_rgba8(&self) -> RgbaImage {
        RgbaImage::from_fn(self.indices.width(), self.indices.height(), |x, y| {
            let idx = self.indices.get_pixel(x, y).0[0] as usize;
            Rgba(self.palette.get(idx).copied().unwrap_or([0, 0, 0, 255]))
        })
    }
}

/// Decoded raster owned by the caller.
///
/// Direct-colour images wrap a [`DynamicImage`]; palette images keep their
/// indices and palette separately since `DynamicImage` has no indexed form.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageHandle {
    Direct(DynamicImage),
    Indexed(IndexedImage),
}

impl ImageHandle {
    pub fn width(&self) -> u32 {
        match self {
            ImageHandle::Direct(img) => img.width(),
            ImageHandle::Indexed(img) => img.indices.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            ImageHandle::Direct(img) => img.height(),
            ImageHandle::Indexed(img) => img.indices.height(),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn color_mode(&self) -> ColorMode {
        use image::ColorType;
        match self {
            ImageHandle::Indexed(_) => ColorMode::Palette,
            ImageHandle::Direct(img) => match img.color() {
                ColorType::L8 | ColorType::L16 => ColorMode::Grayscale,
                ColorType::La8 | ColorType::La16 => ColorMode::GrayscaleAlpha,
                ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => ColorMode::Rgb,
                _ => ColorMode::Rgba,
            },
        }
    }

    /// Flatten to 8-bit RGBA for display.
    pub fn to_rgba8(&self) -> RgbaImage {
        match self {
            ImageHandle::Direct(img) => img.to_rgba8(),
            ImageHandle::Indexed(img) => img.to_rgba8(),
        }
    }

    /// Direct-colour view, expanding a palette image when needed.
    pub fn to_dynamic(&self) -> DynamicImage {
        match self {
            ImageHandle::Direct(img) => img.clone(),
            ImageHandle::Indexed(img) => DynamicImage::ImageRgba8(img.to_rgba8()),
        }
    }
}

impl From<DynamicImage> for ImageHandle {
    fn from(img: DynamicImage) -> Self {
        ImageHandle::Direct(img)
    }
}

/// Imaging-library capabilities the conversion pipeline relies on.
///
/// Every call returns a new handle; inputs are never mutated.
pub trait ImageCodec {
    /// Decode an encoded raster (TIFF for this tool).
    fn decode(&self, bytes: &[u8]) -> Result<ImageHandle, CodecError>;

    /// Encode as PNG with maximum compression.
    fn encode(&self, image: &ImageHandle, options: &PngOptions) -> Result<Vec<u8>, CodecError>;

    /// High-quality (Lanczos) resample to exactly `width x height`.
    fn resample(&self, image: &ImageHandle, width: u32, height: u32)
    -> Result<ImageHandle, CodecError>;

    /// Convert pixel representation. `dither` only matters for palette output.
    fn convert_color_mode(
        &self,
        image: &ImageHandle,
        mode: ColorMode,
        dither: DitherMethod,
    ) -> Result<ImageHandle, CodecError>;

    /// Keep only the region inside `crop`.
    fn crop(&self, image: &ImageHandle, crop: CropBox) -> Result<ImageHandle, CodecError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Blank handle of the given shape, for tests that only care about geometry.
    pub fn blank_handle(width: u32, height: u32, mode: ColorMode) -> ImageHandle {
        match mode {
            ColorMode::Grayscale => DynamicImage::new_luma8(width, height).into(),
            ColorMode::GrayscaleAlpha => DynamicImage::new_luma_a8(width, height).into(),
            ColorMode::Rgb => DynamicImage::new_rgb8(width, height).into(),
            ColorMode::Rgba => DynamicImage::new_rgba8(width, height).into(),
            ColorMode::Palette => ImageHandle::Indexed(IndexedImage {
                indices: GrayImage::new(width, height),
                palette: vec![[0, 0, 0, 255]],
            }),
        }
    }

    /// Mock codec that records operations and returns blank handles.
    #[derive(Default)]
    pub struct MockCodec {
        pub operations: Mutex<Vec<RecordedOp>>,
        /// Decode result dimensions; `None` makes decode fail.
        pub decode_as: Option<(u32, u32, ColorMode)>,
        /// Make encode fail.
        pub fail_encode: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Encode(PngOptions),
        Resample { width: u32, height: u32 },
        Convert { mode: ColorMode, dither: DitherMethod },
        Crop(CropBox),
    }

    impl MockCodec {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn decoding(width: u32, height: u32, mode: ColorMode) -> Self {
            Self {
                decode_as: Some((width, height, mode)),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    impl ImageCodec for MockCodec {
        fn decode(&self, bytes: &[u8]) -> Result<ImageHandle, CodecError> {
            self.record(RecordedOp::Decode(bytes.len()));
            let (w, h, mode) = self
                .decode_as
                .ok_or_else(|| CodecError::Decode("mock decode failure".into()))?;
            Ok(blank_handle(w, h, mode))
        }

        fn encode(&self, _image: &ImageHandle, options: &PngOptions) -> Result<Vec<u8>, CodecError> {
            self.record(RecordedOp::Encode(*options));
            if self.fail_encode {
                return Err(CodecError::Encode("mock encode failure".into()));
            }
            Ok(b"\x89PNG mock".to_vec())
        }

        fn resample(
            &self,
            image: &ImageHandle,
            width: u32,
            height: u32,
        ) -> Result<ImageHandle, CodecError> {
            self.record(RecordedOp::Resample { width, height });
            if width == 0 || height == 0 {
                return Err(CodecError::InvalidDimensions { width, height });
            }
            Ok(blank_handle(width, height, image.color_mode()))
        }

        fn convert_color_mode(
            &self,
            image: &ImageHandle,
            mode: ColorMode,
            dither: DitherMethod,
        ) -> Result<ImageHandle, CodecError> {
            self.record(RecordedOp::Convert { mode, dither });
            Ok(blank_handle(image.width(), image.height(), mode))
        }

        fn crop(&self, image: &ImageHandle, crop: CropBox) -> Result<ImageHandle, CodecError> {
            self.record(RecordedOp::Crop(crop));
            if !crop.fits_within(image.width(), image.height()) {
                return Err(CodecError::InvalidCrop {
                    crop,
                    width: image.width(),
                    height: image.height(),
                });
            }
            Ok(blank_handle(crop.width(), crop.height(), image.color_mode()))
        }
    }

    #[test]
    fn handle_reports_color_modes() {
        for mode in [
            ColorMode::Grayscale,
            ColorMode::GrayscaleAlpha,
            ColorMode::Rgb,
            ColorMode::Rgba,
            ColorMode::Palette,
        ] {
            assert_eq!(blank_handle(4, 3, mode).color_mode(), mode);
        }
    }

    #[test]
    fn sixteen_bit_handles_map_to_base_modes() {
        let h: ImageHandle = DynamicImage::new_rgb16(2, 2).into();
        assert_eq!(h.color_mode(), ColorMode::Rgb);
        let h: ImageHandle = DynamicImage::new_luma16(2, 2).into();
        assert_eq!(h.color_mode(), ColorMode::Grayscale);
    }

    #[test]
    fn indexed_expands_through_palette() {
        let mut indices = GrayImage::new(2, 1);
        indices.put_pixel(1, 0, image::Luma([1]));
        let img = IndexedImage {
            indices,
            palette: vec![[10, 20, 30, 255], [200, 100, 50, 128]],
        };
        let rgba = img.to_rgba8();
        assert_eq!(rgba.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert_eq!(rgba.get_pixel(1, 0).0, [200, 100, 50, 128]);
    }

    #[test]
    fn mock_records_resample() {
        let codec = MockCodec::new();
        let out = codec
            .resample(&blank_handle(100, 50, ColorMode::Rgb), 50, 25)
            .unwrap();
        assert_eq!(out.dimensions(), Dimensions { width: 50, height: 25 });
        assert_eq!(
            codec.get_operations(),
            vec![RecordedOp::Resample {
                width: 50,
                height: 25
            }]
        );
    }

    #[test]
    fn mock_rejects_out_of_bounds_crop() {
        let codec = MockCodec::new();
        let crop = CropBox::new(0, 0, 20, 20).unwrap();
        let result = codec.crop(&blank_handle(10, 10, ColorMode::Rgb), crop);
        assert!(matches!(result, Err(CodecError::InvalidCrop { .. })));
    }
}
