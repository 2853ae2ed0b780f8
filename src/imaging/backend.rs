//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the crop pipeline
//! needs: identify, render_crop, and encode_modern.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests swap in a mock that records calls and can be told to fail.

use super::params::CropGeometry;
use crate::asset::ImageAsset;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Invalid crop geometry: {0}")]
    InvalidGeometry(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Decode just enough of `bytes` to report pixel dimensions.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Rotate `source` about its centre onto an expanded canvas, cut out
    /// `geometry.crop_box`, and encode the result as baseline JPEG (quality 95)
    /// named `{stem}.jpg`.
    fn render_crop(
        &self,
        source: &ImageAsset,
        geometry: &CropGeometry,
    ) -> Result<ImageAsset, BackendError>;

    /// Re-encode `asset` as WebP named `{stem}.webp`.
    fn encode_modern(&self, asset: &ImageAsset, stem: &str) -> Result<ImageAsset, BackendError>;
}
