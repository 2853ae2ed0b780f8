//! Crop jobs: scripted uploads for the command line.
//!
//! A job is one upload as the article form would perform it: pick a file for
//! the featured slot or a portal, adjust the cropper, press apply. A job file
//! lists several of them; they run one at a time through a single registry,
//! so the one-active-crop rule holds just as it does interactively.
//!
//! ```json
//! {
//!   "jobs": [
//!     { "input": "cover.png", "crop": { "x": 0, "y": 0, "width": 1600, "height": 900 } },
//!     { "input": "cover.png", "portal": 7, "aspect": "1:1", "rotation": 90,
//!       "crop": { "x": 100, "y": 0, "width": 900, "height": 900 } }
//!   ]
//! }
//! ```
//!
//! Relative `input` paths resolve against the job file's directory.

use crate::asset::ImageAsset;
use crate::imaging::{AspectRatio, CropBox, GeometryUpdate, ImageBackend};
use crate::registry::{PortalImageRegistry, RegistryError};
use crate::session::{CropTarget, PortalId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid job file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// One upload plus the cropper adjustments to make before applying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CropJob {
    pub input: PathBuf,
    /// Portal to crop for; absent means the featured image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal: Option<PortalId>,
    /// Absent means the user closed the cropper without dragging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect: Option<AspectRatio>,
}

impl CropJob {
    pub fn target(&self) -> CropTarget {
        match self.portal {
            Some(id) => CropTarget::Portal(id),
            None => CropTarget::Featured,
        }
    }

    fn geometry_update(&self) -> GeometryUpdate {
        GeometryUpdate {
            crop_box: self.crop,
            zoom: self.zoom,
            rotation_degrees: self.rotation,
            aspect: self.aspect,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobFile {
    pub jobs: Vec<CropJob>,
}

/// Read a job file, resolving relative inputs against its directory.
pub fn load_job_file(path: &Path) -> Result<JobFile, JobError> {
    let content = fs::read_to_string(path).map_err(|source| JobError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut file: JobFile = serde_json::from_str(&content).map_err(|source| JobError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or(Path::new(""));
    for job in &mut file.jobs {
        if job.input.is_relative() {
            job.input = base.join(&job.input);
        }
    }
    Ok(file)
}

/// What happened to one job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// The crop was applied and stored under the target.
    Stored { target: CropTarget, file_name: String },
    /// The cropper closed without a crop box; nothing stored.
    Skipped { target: CropTarget },
}

/// Run one job: upload, adjust, apply.
pub fn run_job(
    registry: &mut PortalImageRegistry,
    backend: &impl ImageBackend,
    job: &CropJob,
) -> Result<JobOutcome, JobError> {
    let file = ImageAsset::from_file(&job.input).map_err(|source| JobError::Read {
        path: job.input.clone(),
        source,
    })?;
    let target = job.target();

    match target {
        CropTarget::Featured => registry.set_featured_image(file)?,
        CropTarget::Portal(id) => registry.set_portal_image(id, file)?,
    };
    registry.update_geometry(job.geometry_update())?;

    let outcome = match registry.apply_crop(backend)? {
        Some(target) => {
            let stored = match target {
                CropTarget::Featured => registry.featured_image(),
                CropTarget::Portal(id) => registry.portal_image(id),
            };
            JobOutcome::Stored {
                target,
                file_name: stored.map(|a| a.file_name().to_string()).unwrap_or_default(),
            }
        }
        None => JobOutcome::Skipped { target },
    };
    Ok(outcome)
}

/// Run every job in order. A failing job does not stop the ones after it.
pub fn run_jobs(
    registry: &mut PortalImageRegistry,
    backend: &impl ImageBackend,
    jobs: &[CropJob],
) -> Vec<(CropTarget, Result<JobOutcome, JobError>)> {
    jobs.iter()
        .map(|job| (job.target(), run_job(registry, backend, job)))
        .collect()
}
