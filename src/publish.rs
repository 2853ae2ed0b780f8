//! Publish hand-off: write every ready image to disk with a JSON manifest.
//!
//! The uploader is a separate collaborator. What it receives is a directory
//! per upload key plus a manifest describing each file:
//!
//! ```text
//! out/
//! ├── manifest.json
//! ├── featured/Harbour-Dawn.webp
//! ├── portal-7/Harbour-Dawn.webp
//! └── portal-12/Harbour-Dawn.jpg     # WebP fell back to JPEG
//! ```

use crate::registry::{PortalImageRegistry, ReadyImage};
use crate::session::CropTarget;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything the uploader needs, in upload order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadManifest {
    pub images: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// `"featured"` or the portal id.
    pub key: String,
    /// Path relative to the output directory.
    pub path: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
}

/// Directory a target's files go in, relative to the output root.
pub fn target_dir(target: CropTarget) -> String {
    match target {
        CropTarget::Featured => "featured".to_string(),
        CropTarget::Portal(id) => format!("portal-{id}"),
    }
}

fn entry_for(ready: &ReadyImage<'_>) -> ManifestEntry {
    let dir = target_dir(ready.target);
    ManifestEntry {
        key: ready.target.key(),
        path: format!("{dir}/{}", ready.asset.file_name()),
        file_name: ready.asset.file_name().to_string(),
        mime_type: ready.asset.mime_type().to_string(),
        size: ready.asset.size(),
    }
}

/// Describe the registry's ready images without writing anything.
pub fn build_manifest(registry: &PortalImageRegistry) -> UploadManifest {
    UploadManifest {
        images: registry.ready_assets().iter().map(entry_for).collect(),
    }
}

/// Write all ready images under `out_dir` and the manifest as `manifest_name`.
///
/// Returns the manifest and the path it was written to.
pub fn write_ready_assets(
    registry: &PortalImageRegistry,
    out_dir: &Path,
    manifest_name: &str,
) -> Result<(UploadManifest, PathBuf), PublishError> {
    fs::create_dir_all(out_dir)?;
    let mut manifest = UploadManifest::default();
    for ready in registry.ready_assets() {
        ready
            .asset
            .write_to(&out_dir.join(target_dir(ready.target)))?;
        manifest.images.push(entry_for(&ready));
    }

    let manifest_path = out_dir.join(manifest_name);
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;
    tracing::info!(
        images = manifest.images.len(),
        path = %manifest_path.display(),
        "Wrote upload manifest"
    );
    Ok((manifest, manifest_path))
}
