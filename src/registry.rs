//! Portal image registry: the featured image, per-portal images, and the one
//! crop that may be open at a time.
//!
//! ## Slots
//!
//! An article has one optional featured image and any number of portal
//! images keyed by [`PortalId`]. Every stored image carries the preview URL
//! that displays it; the URL is released whenever the image is replaced or
//! removed.
//!
//! ## Uploads Always Go Through the Cropper
//!
//! [`set_featured_image`](PortalImageRegistry::set_featured_image) and
//! [`set_portal_image`](PortalImageRegistry::set_portal_image) only open a
//! crop session. Nothing is stored until
//! [`apply_crop`](PortalImageRegistry::apply_crop) renders the crop, runs the
//! WebP fallback policy, and files the result under the session's target.
//!
//! ## One Active Crop
//!
//! `active` is an `Option<CropSession>`: there is never more than one. Opening
//! a crop while another is open cancels the earlier one (its preview is
//! released and its target is left untouched).

use crate::asset::{ImageAsset, SizeLimitExceeded, check_upload_size};
use crate::fallback::finalize;
use crate::imaging::{AspectRatio, BackendError, GeometryUpdate, ImageBackend};
use crate::preview::{PreviewHandle, PreviewStore};
use crate::session::{CropSession, CropTarget, PortalId};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    SizeLimitExceeded(#[from] SizeLimitExceeded),
    #[error("Crop failed: {0}")]
    Backend(#[from] BackendError),
    #[error("No crop is in progress")]
    NoActiveSession,
}

/// Registry behaviour that comes from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistryOptions {
    /// Aspect preset a new crop session starts with.
    pub default_aspect: AspectRatio,
    /// Attempt WebP before falling back to JPEG.
    pub prefer_webp: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            default_aspect: AspectRatio::SixteenNine,
            prefer_webp: true,
        }
    }
}

/// A committed image and the preview that displays it.
#[derive(Debug)]
struct StoredImage {
    asset: ImageAsset,
    preview: PreviewHandle,
}

/// An image ready for upload, keyed by where it goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadyImage<'a> {
    pub target: CropTarget,
    pub asset: &'a ImageAsset,
}

/// Portal image ready for upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadyPortalImage<'a> {
    pub portal_id: PortalId,
    pub asset: &'a ImageAsset,
}

/// Featured slot, portal slots, and the active crop session.
#[derive(Debug, Default)]
pub struct PortalImageRegistry {
    options: RegistryOptions,
    previews: PreviewStore,
    featured: Option<StoredImage>,
    /// Insertion order; lookups are by id.
    portals: Vec<(PortalId, StoredImage)>,
    active: Option<CropSession>,
}

impl PortalImageRegistry {
    pub fn new(options: RegistryOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    // ------------------------------------------------------------------
    // Uploads
    // ------------------------------------------------------------------

    /// Accept an upload for the featured slot and open the cropper on it.
    ///
    /// Returns the preview URL the cropper should display.
    pub fn set_featured_image(&mut self, file: ImageAsset) -> Result<&str, RegistryError> {
        self.open_crop(CropTarget::Featured, file)
    }

    /// Accept an upload for `portal_id` and open the cropper on it.
    pub fn set_portal_image(
        &mut self,
        portal_id: PortalId,
        file: ImageAsset,
    ) -> Result<&str, RegistryError> {
        self.open_crop(CropTarget::Portal(portal_id), file)
    }

    fn open_crop(&mut self, target: CropTarget, file: ImageAsset) -> Result<&str, RegistryError> {
        if let Err(e) = check_upload_size(&file) {
            tracing::warn!(slot = %target, size = e.size, "Rejected upload over the size limit");
            return Err(e.into());
        }
        if let Some(previous) = self.active.take() {
            tracing::debug!(
                superseded = %previous.target(),
                slot = %target,
                "Cancelling open crop for a new upload"
            );
            previous.cancel(&mut self.previews);
        }

        tracing::debug!(slot = %target, file = file.file_name(), size = file.size(), "Opening crop");
        let session = self
            .active
            .insert(CropSession::new(target, self.options.default_aspect));
        Ok(session.begin(&mut self.previews, file))
    }

    // ------------------------------------------------------------------
    // Active crop
    // ------------------------------------------------------------------

    pub fn active_target(&self) -> Option<CropTarget> {
        self.active.as_ref().map(CropSession::target)
    }

    pub fn active_session(&self) -> Option<&CropSession> {
        self.active.as_ref()
    }

    pub fn active_session_mut(&mut self) -> Option<&mut CropSession> {
        self.active.as_mut()
    }

    /// Forward a geometry change to the active crop.
    pub fn update_geometry(&mut self, update: GeometryUpdate) -> Result<(), RegistryError> {
        let session = self
            .active
            .as_mut()
            .ok_or(RegistryError::NoActiveSession)?;
        session.update_geometry(update);
        Ok(())
    }

    /// Render the active crop, run the WebP fallback, and store the result.
    ///
    /// Returns the target that was filled, or `None` when the crop closed
    /// without a crop box. On failure the session is gone, its preview
    /// released, and no slot changed.
    pub fn apply_crop(
        &mut self,
        backend: &impl ImageBackend,
    ) -> Result<Option<CropTarget>, RegistryError> {
        let session = self.active.take().ok_or(RegistryError::NoActiveSession)?;
        let target = session.target();

        let rendered = match session.commit(backend, &mut self.previews) {
            Ok(Some(rendered)) => rendered,
            Ok(None) => {
                tracing::debug!(slot = %target, "Crop closed without a crop box");
                return Ok(None);
            }
            Err(e) => {
                tracing::error!(slot = %target, error = %e, "Crop failed");
                return Err(e.into());
            }
        };

        let asset = finalize(
            backend,
            rendered.asset,
            &rendered.stem,
            self.options.prefer_webp,
        );
        tracing::info!(
            slot = %target,
            file = asset.file_name(),
            size = asset.size(),
            "Stored cropped image"
        );
        self.store(target, asset);
        Ok(Some(target))
    }

    /// Close the active crop without touching any slot. Returns whether one
    /// was open.
    pub fn cancel_crop(&mut self) -> bool {
        match self.active.take() {
            Some(session) => {
                session.cancel(&mut self.previews);
                true
            }
            None => false,
        }
    }

    fn store(&mut self, target: CropTarget, asset: ImageAsset) {
        let preview = self.previews.open(&asset);
        let entry = StoredImage { asset, preview };
        let replaced = match target {
            CropTarget::Featured => self.featured.replace(entry),
            CropTarget::Portal(id) => match self.portals.iter().position(|(k, _)| *k == id) {
                Some(pos) => Some(std::mem::replace(&mut self.portals[pos].1, entry)),
                None => {
                    self.portals.push((id, entry));
                    None
                }
            },
        };
        if let Some(old) = replaced {
            self.previews.release(old.preview);
        }
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Drop the image stored for `portal_id`. Removing an absent id is a no-op.
    pub fn remove_portal_image(&mut self, portal_id: PortalId) {
        if let Some(pos) = self.portals.iter().position(|(k, _)| *k == portal_id) {
            let (_, old) = self.portals.remove(pos);
            self.previews.release(old.preview);
        }
    }

    /// Clear the featured slot. No-op when empty.
    pub fn remove_featured_image(&mut self) {
        if let Some(old) = self.featured.take() {
            self.previews.release(old.preview);
        }
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn featured_image(&self) -> Option<&ImageAsset> {
        self.featured.as_ref().map(|s| &s.asset)
    }

    pub fn portal_image(&self, portal_id: PortalId) -> Option<&ImageAsset> {
        self.portal_entry(portal_id).map(|s| &s.asset)
    }

    fn portal_entry(&self, portal_id: PortalId) -> Option<&StoredImage> {
        self.portals
            .iter()
            .find(|(k, _)| *k == portal_id)
            .map(|(_, s)| s)
    }

    /// Preview URL of the image stored at `target`.
    pub fn preview_url(&self, target: CropTarget) -> Option<&str> {
        let stored = match target {
            CropTarget::Featured => self.featured.as_ref(),
            CropTarget::Portal(id) => self.portal_entry(id),
        };
        stored.map(|s| s.preview.url())
    }

    /// Bytes behind a live preview URL.
    pub fn resolve_preview(&self, url: &str) -> Option<&[u8]> {
        self.previews.resolve(url)
    }

    /// Portal images to upload, in insertion order.
    pub fn list_ready_portal_images(&self) -> Vec<ReadyPortalImage<'_>> {
        self.portals
            .iter()
            .map(|(portal_id, s)| ReadyPortalImage {
                portal_id: *portal_id,
                asset: &s.asset,
            })
            .collect()
    }

    /// Everything to upload: the featured image first, then portal images.
    pub fn ready_assets(&self) -> Vec<ReadyImage<'_>> {
        let featured = self.featured.as_ref().map(|s| ReadyImage {
            target: CropTarget::Featured,
            asset: &s.asset,
        });
        featured
            .into_iter()
            .chain(self.portals.iter().map(|(id, s)| ReadyImage {
                target: CropTarget::Portal(*id),
                asset: &s.asset,
            }))
            .collect()
    }

    /// Preview URLs currently open: one per stored image plus the active crop.
    pub fn live_previews(&self) -> usize {
        self.previews.live_count()
    }
}
