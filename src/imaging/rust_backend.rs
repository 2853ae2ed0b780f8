//! Pure Rust image processing backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Quarter-turn rotation | exact pixel remapping (no resampling) |
//! | Arbitrary rotation | inverse-mapped bilinear sampling, premultiplied alpha |
//! | Crop extraction | only the crop box is sampled; transparent outside the canvas |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality 95) |
//! | Encode → WebP | `webp::Encoder` (lossy, quality 80) |
//!
//! Rendering mirrors a 2D canvas: the source is drawn rotated about the centre
//! of a canvas sized by [`rotated_canvas_size`], then the rounded crop box is
//! copied out of it. The canvas is never materialised; each output pixel is
//! mapped straight back to the source. Colour is kept premultiplied by alpha,
//! so translucent pixels darken and uncovered pixels come out black once the
//! JPEG encoder drops the alpha channel, as a canvas flattens onto black.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{
    PixelRect, degrees_to_radians, quarter_turn, round_crop_box, rotated_canvas_size,
};
use super::params::{CropGeometry, Quality};
use crate::asset::{
    ImageAsset, JPEG_EXTENSION, MIME_JPEG, MIME_WEBP, WEBP_EXTENSION, file_name_with_extension,
};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgba, RgbaImage};

/// Largest edge we are willing to allocate for a crop output.
pub const MAX_OUTPUT_EDGE: u32 = 16_384;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an in-memory image of any compiled-in format.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Render `geometry` against an already decoded image, before any encoding.
///
/// The output is exactly `round(crop_box.width) × round(crop_box.height)`.
/// Colour is premultiplied by alpha, which is what a canvas holds once it is
/// flattened onto black: dropping the alpha channel gives the JPEG pixels.
pub fn render_pixels(
    img: &DynamicImage,
    geometry: &CropGeometry,
) -> Result<RgbaImage, BackendError> {
    geometry
        .crop_box
        .validate()
        .map_err(BackendError::InvalidGeometry)?;
    let rect = round_crop_box(&geometry.crop_box);
    if rect.width > MAX_OUTPUT_EDGE || rect.height > MAX_OUTPUT_EDGE {
        return Err(BackendError::InvalidGeometry(format!(
            "crop of {}x{} exceeds the {MAX_OUTPUT_EDGE}px limit",
            rect.width, rect.height
        )));
    }

    let source = img.to_rgba8();
    let canvas = RotatedCanvas::new(&source, geometry.rotation_degrees);
    tracing::debug!(
        "Rotated {}x{} by {}° onto {}x{} canvas, extracting {}x{} at ({}, {})",
        source.width(),
        source.height(),
        geometry.rotation_degrees,
        canvas.width,
        canvas.height,
        rect.width,
        rect.height,
        rect.x,
        rect.y
    );
    Ok(canvas.extract(rect))
}

/// How canvas pixels map back onto the source.
#[derive(Debug, Clone, Copy)]
enum Mapping {
    /// Whole quarter turn; pixels are copied, never resampled.
    QuarterTurn(u32),
    /// Inverse rotation about the centres, sampled bilinearly.
    Rotated {
        sin: f64,
        cos: f64,
        canvas_centre: (f64, f64),
        source_centre: (f64, f64),
    },
}

/// `source` drawn rotated about its centre on a canvas just large enough to
/// hold it. Only the pixels asked for are ever computed.
struct RotatedCanvas<'a> {
    source: &'a RgbaImage,
    width: u32,
    height: u32,
    mapping: Mapping,
}

impl<'a> RotatedCanvas<'a> {
    fn new(source: &'a RgbaImage, degrees: f64) -> Self {
        let (src_w, src_h) = source.dimensions();
        if let Some(turn) = quarter_turn(degrees) {
            let (width, height) = if turn % 180 == 0 {
                (src_w, src_h)
            } else {
                (src_h, src_w)
            };
            return Self {
                source,
                width,
                height,
                mapping: Mapping::QuarterTurn(turn),
            };
        }

        let (width, height) = rotated_canvas_size(src_w, src_h, degrees);
        let (sin, cos) = degrees_to_radians(degrees).sin_cos();
        Self {
            source,
            width,
            height,
            mapping: Mapping::Rotated {
                sin,
                cos,
                canvas_centre: (width as f64 / 2.0, height as f64 / 2.0),
                source_centre: (src_w as f64 / 2.0, src_h as f64 / 2.0),
            },
        }
    }

    /// Copy `rect` out of the canvas into a new image of exactly `rect`'s
    /// size. Anything outside the canvas is transparent.
    fn extract(&self, rect: PixelRect) -> RgbaImage {
        RgbaImage::from_fn(rect.width, rect.height, |x, y| {
            self.pixel(rect.x + x as i64, rect.y + y as i64)
        })
    }

    fn pixel(&self, x: i64, y: i64) -> Rgba<u8> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return TRANSPARENT;
        }
        match self.mapping {
            Mapping::QuarterTurn(turn) => {
                let (src_w, src_h) = (self.source.width() as i64, self.source.height() as i64);
                // Clockwise: canvas (x, y) comes from the source pixel below.
                let (sx, sy) = match turn {
                    90 => (y, src_h - 1 - x),
                    180 => (src_w - 1 - x, src_h - 1 - y),
                    270 => (src_w - 1 - y, x),
                    _ => (x, y),
                };
                premultiplied_at(self.source, sx, sy).unwrap_or(TRANSPARENT)
            }
            Mapping::Rotated {
                sin,
                cos,
                canvas_centre,
                source_centre,
            } => {
                // Map the canvas pixel centre back into source space.
                let dx = x as f64 + 0.5 - canvas_centre.0;
                let dy = y as f64 + 0.5 - canvas_centre.1;
                let u = cos * dx + sin * dy + source_centre.0;
                let v = -sin * dx + cos * dy + source_centre.1;
                sample_bilinear(self.source, u - 0.5, v - 0.5)
            }
        }
    }
}

/// Bilinear sample in premultiplied space, so colour hidden under
/// transparent pixels never bleeds into the result.
fn sample_bilinear(img: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let neighbours = [
        (0, 0, (1.0 - fx) * (1.0 - fy)),
        (1, 0, fx * (1.0 - fy)),
        (0, 1, (1.0 - fx) * fy),
        (1, 1, fx * fy),
    ];

    let mut acc = [0.0f64; 4];
    for (ox, oy, weight) in neighbours {
        if weight <= 0.0 {
            continue;
        }
        if let Some(pixel) = premultiplied_at(img, x0 as i64 + ox, y0 as i64 + oy) {
            for (channel, value) in acc.iter_mut().zip(pixel.0) {
                *channel += value as f64 * weight;
            }
        }
    }
    Rgba(acc.map(|v| v.round().clamp(0.0, 255.0) as u8))
}

/// Source pixel with its colour scaled by alpha, or `None` off the image.
fn premultiplied_at(img: &RgbaImage, x: i64, y: i64) -> Option<Rgba<u8>> {
    let inside = x >= 0 && y >= 0 && x < img.width() as i64 && y < img.height() as i64;
    inside.then(|| premultiply(*img.get_pixel(x as u32, y as u32)))
}

fn premultiply(Rgba([r, g, b, a]): Rgba<u8>) -> Rgba<u8> {
    let scale = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
    Rgba([scale(r), scale(g), scale(b), a])
}

/// Encode premultiplied pixels as JPEG. Dropping alpha here is the same as
/// compositing onto black.
fn encode_jpeg(img: RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let rgb = DynamicImage::ImageRgba8(img).into_rgb8();
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value());
    DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(buf)
}

/// Lossy WebP through libwebp.
fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let encoder = webp::Encoder::from_rgb(&rgb, width, height);
    let memory = encoder
        .encode_simple(false, quality.value() as f32)
        .map_err(|e| BackendError::Encode(format!("WebP encode failed: {e:?}")))?;
    Ok(memory.to_vec())
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let reader = image::ImageReader::new(std::io::Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("Failed to read dimensions: {e}")))?;
        Ok(Dimensions { width, height })
    }

    fn render_crop(
        &self,
        source: &ImageAsset,
        geometry: &CropGeometry,
    ) -> Result<ImageAsset, BackendError> {
        let img = decode(source.bytes())?;
        let pixels = render_pixels(&img, geometry)?;
        let bytes = encode_jpeg(pixels, Quality::BASELINE)?;
        Ok(ImageAsset::new(
            bytes,
            MIME_JPEG,
            file_name_with_extension(source.stem(), JPEG_EXTENSION),
        ))
    }

    fn encode_modern(&self, asset: &ImageAsset, stem: &str) -> Result<ImageAsset, BackendError> {
        let img = decode(asset.bytes())?;
        let bytes = encode_webp(&img, Quality::MODERN)?;
        Ok(ImageAsset::new(
            bytes,
            MIME_WEBP,
            file_name_with_extension(stem, WEBP_EXTENSION),
        ))
    }
}
