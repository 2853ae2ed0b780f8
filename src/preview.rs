//! Preview handles: locally resolvable URLs for images that are on screen.
//!
//! A [`PreviewStore`] plays the part of the browser's object-URL table. Opening
//! a preview copies the asset's bytes under a fresh `blob:` URL; releasing it
//! frees them. Handles are deliberately not `Clone` and [`PreviewStore::release`]
//! takes the handle by value, so each handle can be released at most once.
//! Dropping a handle without releasing it leaks the entry, exactly like
//! forgetting `URL.revokeObjectURL`, and shows up in [`PreviewStore::live_count`].

use crate::asset::ImageAsset;
use std::collections::HashMap;

const URL_PREFIX: &str = "blob:portal-crop/";

/// Exclusive claim on one live preview URL.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a preview handle must be released through its PreviewStore"]
pub struct PreviewHandle {
    id: u64,
    url: String,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Table of live preview URLs.
#[derive(Debug, Default)]
pub struct PreviewStore {
    next_id: u64,
    live: HashMap<u64, Vec<u8>>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new URL for `asset`.
    pub fn open(&mut self, asset: &ImageAsset) -> PreviewHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.live.insert(id, asset.bytes().to_vec());
        tracing::debug!(id, file = asset.file_name(), "Opened preview");
        PreviewHandle {
            id,
            url: format!("{URL_PREFIX}{id}"),
        }
    }

    /// Free the bytes behind `handle`.
    pub fn release(&mut self, handle: PreviewHandle) {
        if self.live.remove(&handle.id).is_none() {
            tracing::warn!(url = %handle.url(), "Released a preview this store never issued");
        } else {
            tracing::debug!(id = handle.id, "Released preview");
        }
    }

    /// Release `handle` if there is one.
    pub fn release_opt(&mut self, handle: Option<PreviewHandle>) {
        if let Some(handle) = handle {
            self.release(handle);
        }
    }

    /// Bytes behind a live URL, or `None` once it has been released.
    pub fn resolve(&self, url: &str) -> Option<&[u8]> {
        let id = url.strip_prefix(URL_PREFIX)?.parse::<u64>().ok()?;
        self.live.get(&id).map(Vec::as_slice)
    }

    /// Number of URLs opened and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
