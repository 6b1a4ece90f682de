//! Pure Rust codec: no system libraries.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (TIFF, also PNG) | `image::ImageReader` with format sniffing |
//! | Resample | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Crop | `DynamicImage::crop_imm` / `imageops::crop_imm` |
//! | Direct colour conversion | `DynamicImage::to_{rgb8,rgba8,luma8,luma_a8}` |
//! | Palette (≤ 256 colours) | `color_quant::NeuQuant` + `imageops::dither` + `imageops::index_colors` |
//! | Encode → PNG | `png` crate, best compression, explicit or adaptive filter |
//! | Optimise / interlace | `oxipng::optimize_from_memory` |

use super::backend::{CodecError, ImageCodec, ImageHandle, IndexedImage};
use super::calculations::CropBox;
use super::params::{ColorMode, DitherMethod, FilterMethod, PngOptions};
use color_quant::NeuQuant;
use image::imageops::{self, ColorMap, FilterType};
use image::{DynamicImage, ImageReader, Rgba, RgbaImage};
use std::io::Cursor;

/// File extensions accepted as conversion sources.
pub const SOURCE_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// Maximum palette entries for palette output.
pub const MAX_PALETTE_COLORS: usize = 256;

/// NeuQuant sampling factor: 1 = every pixel (slow, best), 30 = fastest.
const NEUQUANT_SAMPLE_FACTOR: i32 = 10;

/// Pure Rust codec using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Adaptive palette learned from the image's own colour distribution.
struct AdaptivePalette {
    quant: NeuQuant,
}

impl AdaptivePalette {
    fn learn(pixels: &RgbaImage) -> Self {
        Self {
            quant: NeuQuant::new(NEUQUANT_SAMPLE_FACTOR, MAX_PALETTE_COLORS, pixels.as_raw()),
        }
    }

    fn entries(&self) -> Vec<[u8; 4]> {
        self.quant
            .color_map_rgba()
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect()
    }
}

impl ColorMap for AdaptivePalette {
    type Color = Rgba<u8>;

    fn index_of(&self, color: &Rgba<u8>) -> usize {
        self.quant.index_of(&color.0)
    }

    fn lookup(&self, index: usize) -> Option<Rgba<u8>> {
        self.quant.lookup(index).map(Rgba)
    }

    fn has_lookup(&self) -> bool {
        true
    }

    fn map_color(&self, color: &mut Rgba<u8>) {
        self.quant.map_pixel(&mut color.0);
    }
}

/// Reduce to at most 256 colours, diffusing the error when requested.
///
/// Single-column images are mapped without diffusion: `imageops::dither`
/// writes to the right-hand neighbour unconditionally.
fn quantize(img: &DynamicImage, dither: DitherMethod) -> IndexedImage {
    let mut pixels = img.to_rgba8();
    let palette = AdaptivePalette::learn(&pixels);
    if dither.diffuses() && pixels.width() >= 2 {
        imageops::dither(&mut pixels, &palette);
    }
    IndexedImage {
        indices: imageops::index_colors(&pixels, &palette),
        palette: palette.entries(),
    }
}

/// Raw PNG scanline bytes for a direct-colour image.
///
/// 16-bit images keep their depth (big-endian, as PNG requires); float
/// images are narrowed to 8 bits.
fn direct_png_layout(img: &DynamicImage) -> (png::ColorType, png::BitDepth, Vec<u8>) {
    use png::{BitDepth, ColorType};

    fn be16(samples: &[u16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_be_bytes()).collect()
    }

    match img {
        DynamicImage::ImageLuma8(b) => (ColorType::Grayscale, BitDepth::Eight, b.as_raw().clone()),
        DynamicImage::ImageLumaA8(b) => {
            (ColorType::GrayscaleAlpha, BitDepth::Eight, b.as_raw().clone())
        }
        DynamicImage::ImageRgb8(b) => (ColorType::Rgb, BitDepth::Eight, b.as_raw().clone()),
        DynamicImage::ImageRgba8(b) => (ColorType::Rgba, BitDepth::Eight, b.as_raw().clone()),
        DynamicImage::ImageLuma16(b) => (ColorType::Grayscale, BitDepth::Sixteen, be16(b.as_raw())),
        DynamicImage::ImageLumaA16(b) => {
            (ColorType::GrayscaleAlpha, BitDepth::Sixteen, be16(b.as_raw()))
        }
        DynamicImage::ImageRgb16(b) => (ColorType::Rgb, BitDepth::Sixteen, be16(b.as_raw())),
        DynamicImage::ImageRgba16(b) => (ColorType::Rgba, BitDepth::Sixteen, be16(b.as_raw())),
        DynamicImage::ImageRgb32F(_) => (ColorType::Rgb, BitDepth::Eight, img.to_rgb8().into_raw()),
        _ => (ColorType::Rgba, BitDepth::Eight, img.to_rgba8().into_raw()),
    }
}

fn png_filter(method: FilterMethod) -> Option<png::FilterType> {
    match method {
        FilterMethod::Auto => None,
        FilterMethod::None => Some(png::FilterType::NoFilter),
        FilterMethod::Sub => Some(png::FilterType::Sub),
        FilterMethod::Up => Some(png::FilterType::Up),
        FilterMethod::Average => Some(png::FilterType::Avg),
        FilterMethod::Paeth => Some(png::FilterType::Paeth),
    }
}

fn filter_strategy(method: FilterMethod) -> Option<oxipng::FilterStrategy> {
    use oxipng::{FilterStrategy, RowFilter};
    match method {
        FilterMethod::Auto => None,
        FilterMethod::None => Some(FilterStrategy::Basic(RowFilter::None)),
        FilterMethod::Sub => Some(FilterStrategy::Basic(RowFilter::Sub)),
        FilterMethod::Up => Some(FilterStrategy::Basic(RowFilter::Up)),
        FilterMethod::Average => Some(FilterStrategy::Basic(RowFilter::Average)),
        FilterMethod::Paeth => Some(FilterStrategy::Basic(RowFilter::Paeth)),
    }
}

/// First pass: plain PNG at the best compression level.
fn write_png(image: &ImageHandle, filter: FilterMethod) -> Result<Vec<u8>, CodecError> {
    let encode_err = |e: png::EncodingError| CodecError::Encode(e.to_string());

    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, image.width(), image.height());
        encoder.set_compression(png::Compression::Best);
        match png_filter(filter) {
            Some(f) => {
                encoder.set_filter(f);
                encoder.set_adaptive_filter(png::AdaptiveFilterType::NonAdaptive);
            }
            None => encoder.set_adaptive_filter(png::AdaptiveFilterType::Adaptive),
        }

        let data = match image {
            ImageHandle::Direct(img) => {
                let (color, depth, data) = direct_png_layout(img);
                encoder.set_color(color);
                encoder.set_depth(depth);
                data
            }
            ImageHandle::Indexed(img) => {
                encoder.set_color(png::ColorType::Indexed);
                encoder.set_depth(png::BitDepth::Eight);
                encoder.set_palette(
                    img.palette
                        .iter()
                        .flat_map(|c| [c[0], c[1], c[2]])
                        .collect::<Vec<u8>>(),
                );
                if img.palette.iter().any(|c| c[3] != u8::MAX) {
                    encoder.set_trns(img.palette.iter().map(|c| c[3]).collect::<Vec<u8>>());
                }
                img.indices.as_raw().clone()
            }
        };

        let mut writer = encoder.write_header().map_err(encode_err)?;
        writer.write_image_data(&data).map_err(encode_err)?;
        writer.finish().map_err(encode_err)?;
    }
    Ok(buf)
}

/// Second pass: chunk/palette optimisation and/or Adam7 re-layout.
///
/// Without `optimize`, all reductions stay off so only the interlacing
/// changes. Deflate runs at libdeflate's maximum level either way.
///
/// oxipng keeps its input when the result is not smaller and declines
/// Adam7 when it grows the file, so `force` is set whenever interlacing is
/// requested.
fn post_process(data: Vec<u8>, options: &PngOptions) -> Result<Vec<u8>, CodecError> {
    if !options.optimize && !options.interlace {
        return Ok(data);
    }

    let mut opts = oxipng::Options::from_preset(if options.optimize { 2 } else { 0 });
    opts.interlace = Some(options.interlace);
    opts.force = options.interlace;
    opts.deflater = oxipng::Deflater::Libdeflater { compression: 12 };
    if let Some(strategy) = filter_strategy(options.filter_method) {
        opts.filters = oxipng::indexset! { strategy };
    }
    if options.optimize {
        opts.strip = oxipng::StripChunks::Safe;
    } else {
        opts.bit_depth_reduction = false;
        opts.color_type_reduction = false;
        opts.palette_reduction = false;
        opts.grayscale_reduction = false;
        opts.strip = oxipng::StripChunks::None;
    }

    oxipng::optimize_from_memory(&data, &opts)
        .map_err(|e| CodecError::Encode(format!("PNG optimisation failed: {e}")))
}

impl ImageCodec for RustCodec {
    fn decode(&self, bytes: &[u8]) -> Result<ImageHandle, CodecError> {
        let img = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        Ok(ImageHandle::Direct(img))
    }

    fn encode(&self, image: &ImageHandle, options: &PngOptions) -> Result<Vec<u8>, CodecError> {
        let data = write_png(image, options.filter_method)?;
        post_process(data, options)
    }

    fn resample(
        &self,
        image: &ImageHandle,
        width: u32,
        height: u32,
    ) -> Result<ImageHandle, CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::InvalidDimensions { width, height });
        }
        let resized = match image {
            ImageHandle::Direct(img) => img.resize_exact(width, height, FilterType::Lanczos3),
            ImageHandle::Indexed(img) => DynamicImage::ImageRgba8(imageops::resize(
                &img.to_rgba8(),
                width,
                height,
                FilterType::Lanczos3,
            )),
        };
        Ok(ImageHandle::Direct(resized))
    }

    fn convert_color_mode(
        &self,
        image: &ImageHandle,
        mode: ColorMode,
        dither: DitherMethod,
    ) -> Result<ImageHandle, CodecError> {
        if image.color_mode() == ColorMode::Palette && mode == ColorMode::Palette {
            return Ok(image.clone());
        }
        let img = image.to_dynamic();
        let converted = match mode {
            ColorMode::Grayscale => DynamicImage::ImageLuma8(img.to_luma8()),
            ColorMode::GrayscaleAlpha => DynamicImage::ImageLumaA8(img.to_luma_alpha8()),
            ColorMode::Rgb => DynamicImage::ImageRgb8(img.to_rgb8()),
            ColorMode::Rgba => DynamicImage::ImageRgba8(img.to_rgba8()),
            ColorMode::Palette => return Ok(ImageHandle::Indexed(quantize(&img, dither))),
        };
        Ok(ImageHandle::Direct(converted))
    }

    fn crop(&self, image: &ImageHandle, crop: CropBox) -> Result<ImageHandle, CodecError> {
        if !crop.fits_within(image.width(), image.height()) {
            return Err(CodecError::InvalidCrop {
                crop,
                width: image.width(),
                height: image.height(),
            });
        }
        let (x, y, w, h) = (crop.left, crop.top, crop.width(), crop.height());
        Ok(match image {
            ImageHandle::Direct(img) => ImageHandle::Direct(img.crop_imm(x, y, w, h)),
            ImageHandle::Indexed(img) => ImageHandle::Indexed(IndexedImage {
                indices: imageops::crop_imm(&img.indices, x, y, w, h).to_image(),
                palette: img.palette.clone(),
            }),
        })
    }
}
