//! In-memory image files: the unit every stage passes around.
//!
//! An [`ImageAsset`] is what a file picker hands over and what the publish
//! step uploads: bytes, a MIME tag and a file name. Each asset owns its bytes
//! outright; re-encoding produces a new asset rather than mutating one.
//!
//! ## File Names
//!
//! The stem of the uploaded file survives every re-encode. Only the extension
//! changes:
//! - `Harbour-Dawn.png` → crop → `Harbour-Dawn.jpg` → WebP → `Harbour-Dawn.webp`
//! - `report.final.jpeg` → `report.final.webp`
//! - `snapshot` (no extension) → `snapshot.webp`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_WEBP: &str = "image/webp";
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

pub const JPEG_EXTENSION: &str = "jpg";
pub const WEBP_EXTENSION: &str = "webp";

/// Hard cap on uploaded files, checked before any crop session opens.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Stem used when a file name has nothing left after stripping its extension.
const FALLBACK_STEM: &str = "image";

#[derive(Error, Debug, PartialEq, Eq)]
#[error("image is {size} bytes; uploads must be at most {limit} bytes (10 MB)")]
pub struct SizeLimitExceeded {
    pub size: u64,
    pub limit: u64,
}

/// Binary image data with its name and encoding.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAsset {
    bytes: Vec<u8>,
    mime_type: String,
    file_name: String,
}

impl ImageAsset {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    /// Wrap raw bytes, sniffing the MIME type from the content.
    pub fn from_bytes(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        let mime_type = sniff_mime(&bytes);
        Self::new(bytes, mime_type, file_name)
    }

    /// Read a file from disk the way a file picker would hand it over.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{FALLBACK_STEM}.{JPEG_EXTENSION}"));
        Ok(Self::from_bytes(bytes, file_name))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        file_stem(&self.file_name)
    }

    /// Same bytes under a new name.
    pub fn with_file_name(self, file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..self
        }
    }

    /// Write the asset into `dir` under its file name; returns the path.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

// Bytes are elided; a 10 MB hex dump helps nobody.
impl std::fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAsset")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Strip one trailing extension from a file name.
///
/// Only the last `.ext` is removed, and only when `ext` contains no `/` or `.`.
/// Returns `"image"` when nothing would be left.
pub fn file_stem(name: &str) -> &str {
    let stem = match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() && !name[dot + 1..].contains('/') => &name[..dot],
        _ => name,
    };
    if stem.is_empty() { FALLBACK_STEM } else { stem }
}

/// `"{stem}.{extension}"`.
pub fn file_name_with_extension(stem: &str, extension: &str) -> String {
    format!("{stem}.{extension}")
}

/// Reject files above [`MAX_UPLOAD_BYTES`]. Exactly 10 MiB is accepted.
pub fn check_upload_size(asset: &ImageAsset) -> Result<(), SizeLimitExceeded> {
    let size = asset.size();
    if size > MAX_UPLOAD_BYTES {
        return Err(SizeLimitExceeded {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or(MIME_OCTET_STREAM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_strips_last_extension() {
        assert_eq!(file_stem("Harbour-Dawn.png"), "Harbour-Dawn");
        assert_eq!(file_stem("report.final.jpeg"), "report.final");
    }

    #[test]
    fn stem_without_extension_is_unchanged() {
        assert_eq!(file_stem("snapshot"), "snapshot");
    }

    #[test]
    fn stem_ignores_trailing_dot() {
        assert_eq!(file_stem("odd."), "odd.");
    }

    #[test]
    fn stem_falls_back_when_empty() {
        assert_eq!(file_stem(".png"), "image");
        assert_eq!(file_stem(""), "image");
    }

    #[test]
    fn stem_does_not_cross_path_separators() {
        assert_eq!(file_stem("dir.v2/photo"), "dir.v2/photo");
    }

    #[test]
    fn rename_keeps_bytes_and_mime() {
        let asset = ImageAsset::new(vec![1, 2, 3], MIME_JPEG, "a.png");
        let renamed = asset.with_file_name("a.jpg");
        assert_eq!(renamed.file_name(), "a.jpg");
        assert_eq!(renamed.bytes(), &[1, 2, 3]);
        assert_eq!(renamed.mime_type(), MIME_JPEG);
    }

    #[test]
    fn sniffs_png_and_unknown() {
        let png = crate::test_helpers::solid_png(4, 4, [10, 20, 30, 255]);
        assert_eq!(png.mime_type(), "image/png");
        let junk = ImageAsset::from_bytes(b"definitely not an image".to_vec(), "x.bin");
        assert_eq!(junk.mime_type(), MIME_OCTET_STREAM);
    }

    #[test]
    fn size_gate_boundary() {
        let at_limit = ImageAsset::new(vec![0; MAX_UPLOAD_BYTES as usize], MIME_JPEG, "a.jpg");
        assert!(check_upload_size(&at_limit).is_ok());

        let over = ImageAsset::new(vec![0; MAX_UPLOAD_BYTES as usize + 1], MIME_JPEG, "b.jpg");
        assert_eq!(
            check_upload_size(&over),
            Err(SizeLimitExceeded {
                size: MAX_UPLOAD_BYTES + 1,
                limit: MAX_UPLOAD_BYTES
            })
        );
    }

    #[test]
    fn write_to_uses_file_name() {
        let tmp = tempfile::TempDir::new().unwrap();
        let asset = ImageAsset::new(vec![7; 16], MIME_WEBP, "cover.webp");
        let path = asset.write_to(&tmp.path().join("out")).unwrap();
        assert_eq!(path.file_name().unwrap(), "cover.webp");
        assert_eq!(std::fs::read(path).unwrap(), vec![7; 16]);
    }

    #[test]
    fn from_file_takes_name_from_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("Portrait.png");
        let png = crate::test_helpers::solid_png(2, 2, [0, 0, 0, 255]);
        std::fs::write(&path, png.bytes()).unwrap();
        let asset = ImageAsset::from_file(&path).unwrap();
        assert_eq!(asset.file_name(), "Portrait.png");
        assert_eq!(asset.stem(), "Portrait");
    }
}
