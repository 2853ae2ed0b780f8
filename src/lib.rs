//! # Portal Crop
//!
//! Crop, rotate and re-encode article images for a news CMS that publishes
//! each article to several portals. An article carries one featured image
//! and one image per portal; every upload goes through a crop step before
//! it is kept.
//!
//! # Architecture: Upload → Crop → Finalize
//!
//! ```text
//! 1. Upload    file      →  size gate, preview URL, crop session
//! 2. Crop      session   →  rotate onto expanded canvas, cut, JPEG q=0.95
//! 3. Finalize  JPEG      →  WebP when it encodes, else the JPEG
//! ```
//!
//! The result lands in the registry under the session's target (the
//! featured slot or a portal id) and is later written out with a manifest
//! for the uploader.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Rotation math, crop geometry, and the `image`-crate backend |
//! | [`asset`] | Binary image values, file names, the 10 MB upload gate |
//! | [`preview`] | Revocable preview URLs for sources and stored images |
//! | [`session`] | One open crop: begin, update geometry, commit, cancel |
//! | [`fallback`] | WebP-first finalisation with a guaranteed JPEG fallback |
//! | [`registry`] | Featured and portal slots plus the single active session |
//! | [`publish`] | Writes ready images and the JSON upload manifest |
//! | [`jobs`] | Scripted uploads read from a JSON job file |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Active Crop
//!
//! The registry holds `Option<CropSession>`. Opening a crop while another is
//! open cancels the earlier one; nothing from it is stored and its preview
//! URL is released.
//!
//! ## Preview Handles Are Owned
//!
//! [`preview::PreviewHandle`] is neither `Clone` nor `Copy`, and releasing it
//! consumes it. Every handle has exactly one owner (a session or a stored
//! image), so a URL cannot be released twice or outlive the image it shows.
//!
//! ## Fixed Encoding Parameters
//!
//! The upload cap (10 MiB) and JPEG quality (0.95) are constants, not config.
//! Only the default aspect preset and whether to try WebP are configurable.

pub mod asset;
pub mod config;
pub mod fallback;
pub mod imaging;
pub mod jobs;
pub mod output;
pub mod preview;
pub mod publish;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
