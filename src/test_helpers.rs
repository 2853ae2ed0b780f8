//! Shared test utilities for the portal-crop test suite.
//!
//! Builds small images in memory so tests never depend on fixture files:
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let png = solid_png(64, 32, RED.0);          // ImageAsset, "solid.png"
//! let jpeg = solid_jpeg(64, 32, [0, 0, 255]);  // ImageAsset, "solid.jpg"
//! let img = quadrant_image(40, 20);             // DynamicImage, four colours
//! ```

use crate::asset::{ImageAsset, MIME_JPEG};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

// =========================================================================
// Decoded images
// =========================================================================

/// `width`×`height` image split into quadrants:
/// red (top-left), green (top-right), blue (bottom-left), white (bottom-right).
pub fn quadrant_image(width: u32, height: u32) -> DynamicImage {
    let (half_w, half_h) = (width / 2, height / 2);
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        match (x < half_w, y < half_h) {
            (true, true) => RED,
            (false, true) => GREEN,
            (true, false) => BLUE,
            (false, false) => WHITE,
        }
    }))
}

// =========================================================================
// Encoded assets
// =========================================================================

/// Lossless PNG of a single colour, named `solid.png`.
pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> ImageAsset {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(rgba)));
    png_asset(&img, "solid.png")
}

/// PNG encoding of `img` under `file_name`.
pub fn png_asset(img: &DynamicImage, file_name: &str) -> ImageAsset {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    ImageAsset::new(buf.into_inner(), "image/png", file_name)
}

/// JPEG (quality 95) of a single colour, named `solid.jpg`.
pub fn solid_jpeg(width: u32, height: u32, rgb: [u8; 3]) -> ImageAsset {
    let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(width, height, image::Rgb(rgb)));
    let mut buf = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, 95))
        .unwrap();
    ImageAsset::new(buf, MIME_JPEG, "solid.jpg")
}

/// Bytes of exactly `len` that are not an image, named `file_name`.
pub fn blob_of_size(len: usize, file_name: &str) -> ImageAsset {
    ImageAsset::new(vec![0u8; len], MIME_JPEG, file_name)
}
