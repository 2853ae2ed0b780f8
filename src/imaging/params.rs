//! Parameter types for crop operations.
//!
//! These structs describe *what* to render, not *how*. They are the interface
//! between the [`session`](crate::session) state machine (which collects the
//! geometry as the user drags, zooms and rotates) and the
//! [`backend`](super::backend) (which does the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100), fixed per output format.
//! - [`CropBox`]: The rectangle to extract, in pixels of the *rotated* image.
//! - [`AspectRatio`]: The fixed set of cropper presets (Free, 1:1, 4:3, 16:9, 3:4, 9:16).
//! - [`CropGeometry`]: Everything the cropper knows: box, zoom, rotation, aspect.
//! - [`GeometryUpdate`]: A partial [`CropGeometry`] merged in as the UI reports changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 3.0;
pub const MIN_ROTATION: f64 = -180.0;
pub const MAX_ROTATION: f64 = 180.0;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    /// Fixed quality of the baseline JPEG encode (0.95).
    pub const BASELINE: Quality = Quality(95);

    /// Quality of the lossy WebP re-encode.
    pub const MODERN: Quality = Quality(80);

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::BASELINE
    }
}

/// Crop rectangle in source-pixel space of the rotated canvas.
///
/// Values arrive as floats straight from the cropper; they are rounded only
/// when the backend draws (see [`round_crop_box`](super::calculations::round_crop_box)).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Reject boxes that cannot produce an image.
    ///
    /// A zero-sized box is a caller error, never a silent no-op.
    pub fn validate(&self) -> Result<(), String> {
        let all_finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(format!("crop box has non-finite values: {self:?}"));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(format!(
                "crop box must have positive size, got {}x{}",
                self.width, self.height
            ));
        }
        Ok(())
    }
}

/// Aspect ratio presets offered by the cropper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AspectRatio {
    Free,
    Square,
    FourThree,
    #[default]
    SixteenNine,
    ThreeFour,
    NineSixteen,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 6] = [
        AspectRatio::Free,
        AspectRatio::Square,
        AspectRatio::FourThree,
        AspectRatio::SixteenNine,
        AspectRatio::ThreeFour,
        AspectRatio::NineSixteen,
    ];

    /// Width / height, or `None` for free-form.
    pub fn value(self) -> Option<f64> {
        match self {
            AspectRatio::Free => None,
            AspectRatio::Square => Some(1.0),
            AspectRatio::FourThree => Some(4.0 / 3.0),
            AspectRatio::SixteenNine => Some(16.0 / 9.0),
            AspectRatio::ThreeFour => Some(3.0 / 4.0),
            AspectRatio::NineSixteen => Some(9.0 / 16.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Free => "free",
            AspectRatio::Square => "1:1",
            AspectRatio::FourThree => "4:3",
            AspectRatio::SixteenNine => "16:9",
            AspectRatio::ThreeFour => "3:4",
            AspectRatio::NineSixteen => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AspectRatio::ALL
            .into_iter()
            .find(|a| a.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let labels: Vec<&str> = AspectRatio::ALL.iter().map(|a| a.label()).collect();
                format!("unknown aspect ratio '{wanted}' (expected one of {labels:?})")
            })
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.label().to_string()
    }
}

/// Full crop state handed to the backend on apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropGeometry {
    pub crop_box: CropBox,
    /// Cropper magnification. Already folded into `crop_box` by the UI; not
    /// applied to the output.
    pub zoom: f64,
    /// Signed degrees in [-180, 180]. Applied before extraction.
    pub rotation_degrees: f64,
    pub aspect: AspectRatio,
}

impl CropGeometry {
    /// Geometry with no rotation, no zoom, free aspect.
    pub fn unrotated(crop_box: CropBox) -> Self {
        Self {
            crop_box,
            zoom: MIN_ZOOM,
            rotation_degrees: 0.0,
            aspect: AspectRatio::Free,
        }
    }
}

/// Partial geometry; `None` fields leave the current value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeometryUpdate {
    pub crop_box: Option<CropBox>,
    pub zoom: Option<f64>,
    pub rotation_degrees: Option<f64>,
    pub aspect: Option<AspectRatio>,
}

impl GeometryUpdate {
    pub fn crop_box(crop_box: CropBox) -> Self {
        Self {
            crop_box: Some(crop_box),
            ..Self::default()
        }
    }

    pub fn rotation(degrees: f64) -> Self {
        Self {
            rotation_degrees: Some(degrees),
            ..Self::default()
        }
    }

    pub fn zoom(zoom: f64) -> Self {
        Self {
            zoom: Some(zoom),
            ..Self::default()
        }
    }

    pub fn aspect(aspect: AspectRatio) -> Self {
        Self {
            aspect: Some(aspect),
            ..Self::default()
        }
    }
}

/// Clamp zoom into the cropper's slider range. Non-finite input yields `None`.
pub fn clamp_zoom(zoom: f64) -> Option<f64> {
    zoom.is_finite().then(|| zoom.clamp(MIN_ZOOM, MAX_ZOOM))
}

/// Clamp rotation into [-180, 180]. Non-finite input yields `None`.
pub fn clamp_rotation(degrees: f64) -> Option<f64> {
    degrees
        .is_finite()
        .then(|| degrees.clamp(MIN_ROTATION, MAX_ROTATION))
}
