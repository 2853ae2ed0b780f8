//! Best-effort WebP with a guaranteed JPEG fallback.
//!
//! Every committed crop exists as a baseline JPEG first. [`finalize`] then
//! tries to re-encode it as WebP. Whatever goes wrong there (no encoder, a
//! failed encode, an empty result, a result no smaller than the JPEG) is
//! logged and the JPEG is used instead, so callers always get a usable asset
//! and never see an error.

use crate::asset::{JPEG_EXTENSION, ImageAsset, file_name_with_extension};
use crate::imaging::{BackendError, ImageBackend};

/// Why the WebP attempt was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    Disabled,
    EncodeFailed(BackendError),
    EmptyOutput,
    /// The WebP would not save any bytes over the JPEG.
    NotSmaller { modern: u64, baseline: u64 },
}

/// Attempt the modern encode, reporting why it was not usable.
pub fn try_modern(
    backend: &impl ImageBackend,
    base: &ImageAsset,
    stem: &str,
) -> Result<ImageAsset, FallbackReason> {
    match backend.encode_modern(base, stem) {
        Ok(asset) if asset.is_empty() => Err(FallbackReason::EmptyOutput),
        Ok(asset) if asset.size() >= base.size() => Err(FallbackReason::NotSmaller {
            modern: asset.size(),
            baseline: base.size(),
        }),
        Ok(asset) => Ok(asset),
        Err(e) => Err(FallbackReason::EncodeFailed(e)),
    }
}

/// Produce the asset that gets uploaded: WebP when possible, else `{stem}.jpg`.
pub fn finalize(
    backend: &impl ImageBackend,
    base: ImageAsset,
    stem: &str,
    prefer_modern: bool,
) -> ImageAsset {
    let attempt = if prefer_modern {
        try_modern(backend, &base, stem)
    } else {
        Err(FallbackReason::Disabled)
    };

    match attempt {
        Ok(modern) => modern,
        Err(reason) => {
            match reason {
                FallbackReason::Disabled => {}
                FallbackReason::NotSmaller { modern, baseline } => tracing::debug!(
                    file = base.file_name(),
                    modern,
                    baseline,
                    "WebP is not smaller, keeping JPEG"
                ),
                _ => tracing::warn!(
                    file = base.file_name(),
                    ?reason,
                    "WebP conversion failed, using JPEG"
                ),
            }
            base.with_file_name(file_name_with_extension(stem, JPEG_EXTENSION))
        }
    }
}
