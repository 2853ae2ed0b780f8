//! Crop session state: one in-progress crop for one target.
//!
//! A session is created when an upload is accepted, holds the uncommitted
//! source plus its preview URL while the user adjusts the crop, and ends in
//! exactly one of two ways:
//!
//! ```text
//!            begin(file)            update_geometry / report_crop_box
//!   new ───────────────▶ editing ◀──────────────────────────────────┐
//!                          │  └────────────────────────────────────┘
//!              commit()    │    cancel()
//!          ┌───────────────┴───────────────┐
//!          ▼                               ▼
//!   Ok(Some(RenderedCrop))          preview released,
//!   Ok(None) if never dragged       nothing rendered
//!   Err(BackendError)
//!   (preview released in every case)
//! ```
//!
//! `commit` and `cancel` take the session by value, so a finished session
//! cannot be touched again and its preview cannot be released twice.

use crate::asset::ImageAsset;
use crate::imaging::{
    AspectRatio, BackendError, CropBox, CropGeometry, GeometryUpdate, ImageBackend, MIN_ZOOM,
    clamp_rotation, clamp_zoom,
};
use crate::preview::{PreviewHandle, PreviewStore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a destination publishing portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortalId(pub u64);

impl fmt::Display for PortalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Slot a crop result lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CropTarget {
    Featured,
    Portal(PortalId),
}

impl CropTarget {
    /// Upload key: `"featured"` or the portal id.
    pub fn key(&self) -> String {
        match self {
            CropTarget::Featured => "featured".to_string(),
            CropTarget::Portal(id) => id.to_string(),
        }
    }
}

impl fmt::Display for CropTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CropTarget::Featured => f.write_str("featured image"),
            CropTarget::Portal(id) => write!(f, "portal {id}"),
        }
    }
}

/// Baseline render of a committed crop, before the WebP attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedCrop {
    pub target: CropTarget,
    /// Stem of the uploaded file, carried to every later encode.
    pub stem: String,
    pub asset: ImageAsset,
}

/// Mutable state of one crop in progress.
#[derive(Debug)]
pub struct CropSession {
    target: CropTarget,
    source: Option<ImageAsset>,
    preview: Option<PreviewHandle>,
    crop_box: Option<CropBox>,
    zoom: f64,
    rotation_degrees: f64,
    aspect: AspectRatio,
}

impl CropSession {
    pub fn new(target: CropTarget, aspect: AspectRatio) -> Self {
        Self {
            target,
            source: None,
            preview: None,
            crop_box: None,
            zoom: MIN_ZOOM,
            rotation_degrees: 0.0,
            aspect,
        }
    }

    /// Load `file` into the cropper and return its preview URL.
    ///
    /// Any preview this session already holds is released first. Crop box,
    /// zoom and rotation reset; the aspect preset is kept.
    pub fn begin(&mut self, previews: &mut PreviewStore, file: ImageAsset) -> &str {
        previews.release_opt(self.preview.take());
        let handle = previews.open(&file);
        self.source = Some(file);
        self.crop_box = None;
        self.zoom = MIN_ZOOM;
        self.rotation_degrees = 0.0;
        self.preview.insert(handle).url()
    }

    /// Merge a partial update. Out-of-range zoom and rotation are clamped;
    /// non-finite values are ignored.
    pub fn update_geometry(&mut self, update: GeometryUpdate) {
        if let Some(crop_box) = update.crop_box {
            self.crop_box = Some(crop_box);
        }
        if let Some(zoom) = update.zoom.and_then(clamp_zoom) {
            self.zoom = zoom;
        }
        if let Some(rotation) = update.rotation_degrees.and_then(clamp_rotation) {
            self.rotation_degrees = rotation;
        }
        if let Some(aspect) = update.aspect {
            self.aspect = aspect;
        }
    }

    /// Record the latest crop box reported while the user drags.
    pub fn report_crop_box(&mut self, crop_box: CropBox) {
        self.crop_box = Some(crop_box);
    }

    pub fn target(&self) -> CropTarget {
        self.target
    }

    pub fn source(&self) -> Option<&ImageAsset> {
        self.source.as_ref()
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview.as_ref().map(PreviewHandle::url)
    }

    pub fn crop_box(&self) -> Option<CropBox> {
        self.crop_box
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn rotation_degrees(&self) -> f64 {
        self.rotation_degrees
    }

    pub fn aspect(&self) -> AspectRatio {
        self.aspect
    }

    /// Geometry as it would be rendered now, once a crop box has been reported.
    pub fn geometry(&self) -> Option<CropGeometry> {
        self.crop_box.map(|crop_box| CropGeometry {
            crop_box,
            zoom: self.zoom,
            rotation_degrees: self.rotation_degrees,
            aspect: self.aspect,
        })
    }

    /// Render the crop and end the session.
    ///
    /// Returns `Ok(None)` when no file was loaded or no crop box was ever
    /// reported. The preview is released whatever the outcome.
    pub fn commit(
        mut self,
        backend: &impl ImageBackend,
        previews: &mut PreviewStore,
    ) -> Result<Option<RenderedCrop>, BackendError> {
        let outcome = match (self.source.as_ref(), self.geometry()) {
            (Some(source), Some(geometry)) => {
                backend
                    .render_crop(source, &geometry)
                    .map(|asset| {
                        Some(RenderedCrop {
                            target: self.target,
                            stem: source.stem().to_string(),
                            asset,
                        })
                    })
            }
            _ => Ok(None),
        };
        previews.release_opt(self.preview.take());
        outcome
    }

    /// End the session without rendering anything.
    pub fn cancel(mut self, previews: &mut PreviewStore) {
        previews.release_opt(self.preview.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::blob_of_size;

    fn begun(previews: &mut PreviewStore, name: &str) -> CropSession {
        let mut session = CropSession::new(CropTarget::Featured, AspectRatio::SixteenNine);
        let _ = session.begin(previews, blob_of_size(32, name));
        session
    }

    #[test]
    fn begin_opens_one_preview() {
        let mut previews = PreviewStore::new();
        let session = begun(&mut previews, "a.png");
        assert_eq!(previews.live_count(), 1);
        let url = session.preview_url().unwrap();
        assert_eq!(previews.resolve(url).map(<[u8]>::len), Some(32));
        session.cancel(&mut previews);
    }

    #[test]
    fn begin_again_releases_previous_preview() {
        let mut previews = PreviewStore::new();
        let mut session = begun(&mut previews, "a.png");
        let first = session.preview_url().unwrap().to_string();
        session.report_crop_box(CropBox::new(0.0, 0.0, 5.0, 5.0));
        session.update_geometry(GeometryUpdate::rotation(30.0));

        let second = session.begin(&mut previews, blob_of_size(8, "b.png")).to_string();
        assert_ne!(first, second);
        assert_eq!(previews.resolve(&first), None);
        assert_eq!(previews.live_count(), 1);
        // Geometry resets for the new file.
        assert_eq!(session.crop_box(), None);
        assert_eq!(session.rotation_degrees(), 0.0);
        session.cancel(&mut previews);
    }

    #[test]
    fn update_geometry_merges_and_clamps() {
        let mut previews = PreviewStore::new();
        let mut session = begun(&mut previews, "a.png");

        session.update_geometry(GeometryUpdate {
            zoom: Some(5.0),
            rotation_degrees: Some(-200.0),
            ..GeometryUpdate::default()
        });
        assert_eq!(session.zoom(), 3.0);
        assert_eq!(session.rotation_degrees(), -180.0);
        assert_eq!(session.aspect(), AspectRatio::SixteenNine);

        session.update_geometry(GeometryUpdate::aspect(AspectRatio::Free));
        session.update_geometry(GeometryUpdate::zoom(f64::NAN));
        assert_eq!(session.aspect(), AspectRatio::Free);
        assert_eq!(session.zoom(), 3.0);
        session.cancel(&mut previews);
    }

    #[test]
    fn latest_crop_box_wins() {
        let mut previews = PreviewStore::new();
        let mut session = begun(&mut previews, "a.png");
        session.report_crop_box(CropBox::new(0.0, 0.0, 10.0, 10.0));
        session.report_crop_box(CropBox::new(1.0, 2.0, 30.0, 40.0));
        assert_eq!(session.crop_box(), Some(CropBox::new(1.0, 2.0, 30.0, 40.0)));

        let backend = MockBackend::new();
        let rendered = session.commit(&backend, &mut previews).unwrap().unwrap();
        assert_eq!(rendered.asset.bytes(), b"jpeg 30x40");
    }

    #[test]
    fn commit_renders_and_releases() {
        let mut previews = PreviewStore::new();
        let mut session = begun(&mut previews, "Harbour-Dawn.png");
        session.report_crop_box(CropBox::new(0.0, 0.0, 16.0, 9.0));
        session.update_geometry(GeometryUpdate::rotation(12.0));

        let backend = MockBackend::new();
        let rendered = session.commit(&backend, &mut previews).unwrap().unwrap();
        assert_eq!(rendered.target, CropTarget::Featured);
        assert_eq!(rendered.stem, "Harbour-Dawn");
        assert_eq!(rendered.asset.file_name(), "Harbour-Dawn.jpg");
        assert_eq!(previews.live_count(), 0);
        assert!(matches!(
            backend.get_operations()[0],
            RecordedOp::RenderCrop { rotation, .. } if rotation == 12.0
        ));
    }

    #[test]
    fn commit_without_crop_box_is_a_no_op() {
        let mut previews = PreviewStore::new();
        let session = begun(&mut previews, "a.png");
        let backend = MockBackend::new();
        assert_eq!(session.commit(&backend, &mut previews), Ok(None));
        assert!(backend.get_operations().is_empty());
        assert_eq!(previews.live_count(), 0);
    }

    #[test]
    fn commit_before_begin_is_a_no_op() {
        let mut previews = PreviewStore::new();
        let session = CropSession::new(CropTarget::Portal(PortalId(3)), AspectRatio::Free);
        assert_eq!(session.commit(&MockBackend::new(), &mut previews), Ok(None));
    }

    #[test]
    fn failed_commit_still_releases_preview() {
        let mut previews = PreviewStore::new();
        let mut session = begun(&mut previews, "a.png");
        session.report_crop_box(CropBox::new(0.0, 0.0, 10.0, 10.0));

        let backend = MockBackend::failing_decode();
        let err = session.commit(&backend, &mut previews).unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
        assert_eq!(previews.live_count(), 0);
    }

    #[test]
    fn cancel_releases_preview() {
        let mut previews = PreviewStore::new();
        let session = begun(&mut previews, "a.png");
        session.cancel(&mut previews);
        assert_eq!(previews.live_count(), 0);
    }

    #[test]
    fn target_keys() {
        assert_eq!(CropTarget::Featured.key(), "featured");
        assert_eq!(CropTarget::Portal(PortalId(42)).key(), "42");
        assert_eq!(CropTarget::Portal(PortalId(42)).to_string(), "portal 42");
    }
}
