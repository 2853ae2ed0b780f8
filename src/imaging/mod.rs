//! Image processing: rotate, crop and re-encode in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Rotate + crop** | Exact remap for quarter turns, premultiplied bilinear otherwise |
//! | **Encode → JPEG** | `JpegEncoder` at fixed quality 95 |
//! | **Encode → WebP** | `webp::Encoder`, lossy at quality 80 |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for rotation and rounding math (unit testable)
//! - **Parameters**: Crop geometry, aspect presets, quality
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use params::{
    AspectRatio, CropBox, CropGeometry, GeometryUpdate, MAX_ROTATION, MAX_ZOOM, MIN_ROTATION,
    MIN_ZOOM, Quality, clamp_rotation, clamp_zoom,
};
pub use rust_backend::RustBackend;
