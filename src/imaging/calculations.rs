//! Pure calculation functions for crop geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::CropBox;

/// Convert degrees to radians.
pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// Bounding box of a `width`×`height` image rotated by `degrees`.
///
/// `w' = |cos θ|·w + |sin θ|·h`, `h' = |sin θ|·w + |cos θ|·h`. This is the
/// canvas needed to hold the whole rotated image without clipping.
///
/// # Examples
/// ```
/// # use portal_crop::imaging::calculations::rotated_bounds;
/// let (w, h) = rotated_bounds(400, 300, 90.0);
/// assert!((w - 300.0).abs() < 1e-9);
/// assert!((h - 400.0).abs() < 1e-9);
/// ```
pub fn rotated_bounds(width: u32, height: u32, degrees: f64) -> (f64, f64) {
    let theta = degrees_to_radians(degrees);
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let (w, h) = (width as f64, height as f64);
    (cos * w + sin * h, sin * w + cos * h)
}

/// Integer canvas size for a rotated image, never smaller than 1×1.
pub fn rotated_canvas_size(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let (w, h) = rotated_bounds(width, height, degrees);
    (round_dimension(w), round_dimension(h))
}

/// A crop box snapped to whole pixels.
///
/// The origin may be negative or past the canvas; whatever falls outside the
/// canvas renders transparent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Round every coordinate to the nearest integer, clamping the size to 1px.
///
/// Halves round towards positive infinity, so `-0.5` becomes `0` and `2.5`
/// becomes `3`, matching how the cropper reports pixel positions.
pub fn round_crop_box(crop: &CropBox) -> PixelRect {
    PixelRect {
        x: round_half_up(crop.x) as i64,
        y: round_half_up(crop.y) as i64,
        width: round_dimension(crop.width),
        height: round_dimension(crop.height),
    }
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn round_dimension(value: f64) -> u32 {
    round_half_up(value).clamp(1.0, u32::MAX as f64) as u32
}

/// If `degrees` is a whole quarter turn, return it normalized into `0..360`.
///
/// Quarter turns are remapped pixel for pixel instead of resampled.
pub fn quarter_turn(degrees: f64) -> Option<u32> {
    let normalized = degrees.rem_euclid(360.0);
    [0u32, 90, 180, 270, 360]
        .into_iter()
        .find(|q| (normalized - *q as f64).abs() < 1e-9)
        .map(|q| q % 360)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: (u32, u32), expected: (f64, f64)) {
        let dw = (actual.0 as f64 - expected.0).abs();
        let dh = (actual.1 as f64 - expected.1).abs();
        assert!(
            dw <= 1.0 && dh <= 1.0,
            "{actual:?} not within 1px of {expected:?}"
        );
    }

    // =========================================================================
    // rotated bounding box
    // =========================================================================

    #[test]
    fn zero_rotation_keeps_size() {
        assert_eq!(rotated_canvas_size(640, 480, 0.0), (640, 480));
    }

    #[test]
    fn quarter_turn_swaps_dimensions() {
        assert_eq!(rotated_canvas_size(640, 480, 90.0), (480, 640));
        assert_eq!(rotated_canvas_size(640, 480, -90.0), (480, 640));
    }

    #[test]
    fn half_turn_keeps_size() {
        assert_eq!(rotated_canvas_size(640, 480, 180.0), (640, 480));
        assert_eq!(rotated_canvas_size(640, 480, -180.0), (640, 480));
    }

    #[test]
    fn forty_five_degrees_matches_closed_form() {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let expected = (s * 640.0 + s * 480.0, s * 640.0 + s * 480.0);
        assert_close(rotated_canvas_size(640, 480, 45.0), expected);
        // ~792 on both sides
        assert_eq!(rotated_canvas_size(640, 480, 45.0), (792, 792));
    }

    #[test]
    fn arbitrary_angles_stay_within_one_pixel() {
        for deg in [-170.0, -33.3, 12.5, 60.0, 135.0] {
            let (w, h) = rotated_bounds(1000, 250, deg);
            assert_close(rotated_canvas_size(1000, 250, deg), (w, h));
        }
    }

    #[test]
    fn canvas_is_never_empty() {
        assert_eq!(rotated_canvas_size(0, 0, 30.0), (1, 1));
    }

    // =========================================================================
    // crop box rounding
    // =========================================================================

    #[test]
    fn crop_box_rounds_to_nearest() {
        let rect = round_crop_box(&CropBox::new(10.4, 10.6, 99.5, 50.49));
        assert_eq!(
            rect,
            PixelRect {
                x: 10,
                y: 11,
                width: 100,
                height: 50
            }
        );
    }

    #[test]
    fn crop_box_never_rounds_to_zero() {
        let rect = round_crop_box(&CropBox::new(0.0, 0.0, 0.2, 0.3));
        assert_eq!((rect.width, rect.height), (1, 1));
    }

    #[test]
    fn crop_box_keeps_negative_origin() {
        let rect = round_crop_box(&CropBox::new(-3.7, -0.2, 5.0, 5.0));
        assert_eq!((rect.x, rect.y), (-4, 0));
    }

    #[test]
    fn crop_box_halves_round_up() {
        let rect = round_crop_box(&CropBox::new(-0.5, -2.5, 2.5, 3.5));
        assert_eq!(
            rect,
            PixelRect {
                x: 0,
                y: -2,
                width: 3,
                height: 4
            }
        );
    }

    // =========================================================================
    // quarter turns
    // =========================================================================

    #[test]
    fn quarter_turns_are_detected() {
        assert_eq!(quarter_turn(0.0), Some(0));
        assert_eq!(quarter_turn(90.0), Some(90));
        assert_eq!(quarter_turn(-90.0), Some(270));
        assert_eq!(quarter_turn(180.0), Some(180));
        assert_eq!(quarter_turn(-180.0), Some(180));
        assert_eq!(quarter_turn(45.0), None);
        assert_eq!(quarter_turn(-0.5), None);
    }
}
