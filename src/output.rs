//! CLI output formatting for every command.
//!
//! # Slot-First Display
//!
//! Output leads with the slot an image belongs to (`featured image`,
//! `portal 7`), not with file names. Files are shown as indented context
//! lines so a run reads as an inventory of what the article will publish.
//!
//! # Output Format
//!
//! ## Identify
//!
//! ```text
//! Harbour-Dawn.png
//!     Type: image/png
//!     Size: 2.4 MB
//!     Dimensions: 4000x3000
//!     Rotated 30°: 4964x4598
//! ```
//!
//! ## Crop / Batch
//!
//! ```text
//! 001 portal 7 → Harbour-Dawn.webp
//! 002 featured image (no crop, skipped)
//! 003 portal 12 failed: image is 12582912 bytes; uploads must be at most 10485760 bytes (10 MB)
//!
//! Upload manifest → out/manifest.json
//!     featured  featured/Harbour-Dawn.webp (image/webp, 312.5 KB)
//!     7         portal-7/Harbour-Dawn.webp (image/webp, 204.1 KB)
//!
//! Stored 2 images, 1 skipped, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::asset::ImageAsset;
use crate::imaging::Dimensions;
use crate::jobs::{JobError, JobOutcome};
use crate::publish::UploadManifest;
use crate::session::CropTarget;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable byte count, one decimal place above 1 KB.
fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Identify
// ============================================================================

/// Format what `identify` learned about a file.
///
/// `rotated` is the canvas the cropper would show after rotating by the given
/// angle; it is only printed for a non-zero rotation.
pub fn format_identify_output(
    asset: &ImageAsset,
    dimensions: Dimensions,
    rotated: Option<(f64, (u32, u32))>,
) -> Vec<String> {
    let mut lines = vec![
        asset.file_name().to_string(),
        format!("    Type: {}", asset.mime_type()),
        format!("    Size: {}", format_size(asset.size())),
        format!(
            "    Dimensions: {}x{}",
            dimensions.width, dimensions.height
        ),
    ];
    if let Some((degrees, (w, h))) = rotated.filter(|(d, _)| *d != 0.0) {
        lines.push(format!("    Rotated {}\u{b0}: {}x{}", degrees, w, h));
    }
    lines
}

pub fn print_identify_output(
    asset: &ImageAsset,
    dimensions: Dimensions,
    rotated: Option<(f64, (u32, u32))>,
) {
    for line in format_identify_output(asset, dimensions, rotated) {
        println!("{}", line);
    }
}

// ============================================================================
// Crop jobs
// ============================================================================

/// Format one job result line.
pub fn format_job_result(
    index: usize,
    target: CropTarget,
    result: &Result<JobOutcome, JobError>,
) -> String {
    match result {
        Ok(JobOutcome::Stored { file_name, .. }) => {
            format!("{} {} \u{2192} {}", format_index(index), target, file_name)
        }
        Ok(JobOutcome::Skipped { .. }) => {
            format!("{} {} (no crop, skipped)", format_index(index), target)
        }
        Err(e) => format!("{} {} failed: {}", format_index(index), target, e),
    }
}

/// Format every job result followed by a one-line tally.
pub fn format_job_results(results: &[(CropTarget, Result<JobOutcome, JobError>)]) -> Vec<String> {
    let mut lines: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, (target, result))| format_job_result(i + 1, *target, result))
        .collect();

    let stored = results
        .iter()
        .filter(|(_, r)| matches!(r, Ok(JobOutcome::Stored { .. })))
        .count();
    let skipped = results
        .iter()
        .filter(|(_, r)| matches!(r, Ok(JobOutcome::Skipped { .. })))
        .count();
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();

    lines.push(String::new());
    lines.push(format!(
        "Stored {} {}, {} skipped, {} failed",
        stored,
        if stored == 1 { "image" } else { "images" },
        skipped,
        failed
    ));
    lines
}

pub fn print_job_results(results: &[(CropTarget, Result<JobOutcome, JobError>)]) {
    for line in format_job_results(results) {
        println!("{}", line);
    }
}

// ============================================================================
// Upload manifest
// ============================================================================

/// Format the written manifest, one entry per image in upload order.
pub fn format_manifest_output(manifest: &UploadManifest, manifest_path: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Upload manifest \u{2192} {}",
        manifest_path.display()
    )];
    if manifest.images.is_empty() {
        lines.push("    (no images ready)".to_string());
        return lines;
    }
    let key_width = manifest
        .images
        .iter()
        .map(|e| e.key.len())
        .max()
        .unwrap_or(0);
    for entry in &manifest.images {
        lines.push(format!(
            "    {:<width$}  {} ({}, {})",
            entry.key,
            entry.path,
            entry.mime_type,
            format_size(entry.size),
            width = key_width
        ));
    }
    lines
}

pub fn print_manifest_output(manifest: &UploadManifest, manifest_path: &Path) {
    for line in format_manifest_output(manifest, manifest_path) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{MIME_JPEG, SizeLimitExceeded};
    use crate::publish::ManifestEntry;
    use crate::registry::RegistryError;
    use crate::session::PortalId;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(10 * 1024 * 1024), "10.0 MB");
    }

    #[test]
    fn identify_without_rotation() {
        let asset = ImageAsset::new(vec![0; 2048], MIME_JPEG, "dawn.jpg");
        let lines = format_identify_output(
            &asset,
            Dimensions {
                width: 640,
                height: 480,
            },
            Some((0.0, (640, 480))),
        );
        assert_eq!(
            lines,
            vec![
                "dawn.jpg",
                "    Type: image/jpeg",
                "    Size: 2.0 KB",
                "    Dimensions: 640x480",
            ]
        );
    }

    #[test]
    fn identify_with_rotation() {
        let asset = ImageAsset::new(vec![0; 10], MIME_JPEG, "dawn.jpg");
        let lines = format_identify_output(
            &asset,
            Dimensions {
                width: 640,
                height: 480,
            },
            Some((90.0, (480, 640))),
        );
        assert_eq!(lines[4], "    Rotated 90\u{b0}: 480x640");
    }

    #[test]
    fn job_results_with_tally() {
        let results = vec![
            (
                CropTarget::Portal(PortalId(7)),
                Ok(JobOutcome::Stored {
                    target: CropTarget::Portal(PortalId(7)),
                    file_name: "Harbour-Dawn.webp".into(),
                }),
            ),
            (
                CropTarget::Featured,
                Ok(JobOutcome::Skipped {
                    target: CropTarget::Featured,
                }),
            ),
            (
                CropTarget::Portal(PortalId(12)),
                Err(JobError::Registry(RegistryError::SizeLimitExceeded(
                    SizeLimitExceeded {
                        size: 11,
                        limit: 10,
                    },
                ))),
            ),
        ];
        let lines = format_job_results(&results);
        assert_eq!(lines[0], "001 portal 7 \u{2192} Harbour-Dawn.webp");
        assert_eq!(lines[1], "002 featured image (no crop, skipped)");
        assert!(lines[2].starts_with("003 portal 12 failed: "));
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "Stored 1 image, 1 skipped, 1 failed");
    }

    #[test]
    fn manifest_columns_align() {
        let manifest = UploadManifest {
            images: vec![
                ManifestEntry {
                    key: "featured".into(),
                    path: "featured/a.webp".into(),
                    file_name: "a.webp".into(),
                    mime_type: "image/webp".into(),
                    size: 2048,
                },
                ManifestEntry {
                    key: "7".into(),
                    path: "portal-7/a.jpg".into(),
                    file_name: "a.jpg".into(),
                    mime_type: "image/jpeg".into(),
                    size: 100,
                },
            ],
        };
        let lines = format_manifest_output(&manifest, Path::new("out/manifest.json"));
        assert_eq!(lines[0], "Upload manifest \u{2192} out/manifest.json");
        assert_eq!(lines[1], "    featured  featured/a.webp (image/webp, 2.0 KB)");
        assert_eq!(lines[2], "    7         portal-7/a.jpg (image/jpeg, 100 B)");
    }

    #[test]
    fn empty_manifest_says_so() {
        let lines = format_manifest_output(&UploadManifest::default(), Path::new("m.json"));
        assert_eq!(lines[1], "    (no images ready)");
    }
}
