//! Landmark geometry: the head anchor point and the eye openness ratio.
//!
//! Landmarks arrive as fractions of the frame size. Both helpers scale them
//! to pixels first so the ratio is independent of the camera aspect.

use crate::constants::EYE_RATIO_EPSILON;
use crate::utils::safe_cast::f64_to_i32;
use log::warn;

/// A facial landmark in normalized frame coordinates (`0.0..=1.0`)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn to_pixels(self, width: i32, height: i32) -> (f64, f64) {
        (
            f64::from(self.x) * f64::from(width),
            f64::from(self.y) * f64::from(height),
        )
    }
}

/// Integer pixel position in camera space
pub type CameraPoint = (i32, i32);

/// Average the selected landmarks into one pixel position.
///
/// Returns `None` when `indices` is empty or any index is out of range.
#[must_use]
pub fn averaged_anchor(landmarks: &[Landmark], indices: &[usize], width: i32, height: i32) -> Option<CameraPoint> {
    if indices.is_empty() {
        return None;
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for &idx in indices {
        let (x, y) = landmarks.get(idx)?.to_pixels(width, height);
        sum_x += x;
        sum_y += y;
    }

    let n = indices.len() as f64;
    Some((f64_to_i32(sum_x / n).ok()?, f64_to_i32(sum_y / n).ok()?))
}

/// Horizontal-to-vertical ratio of a six point eye contour.
///
/// Point order is `[outer, upper1, upper2, inner, lower1, lower2]`. A closed
/// eye has almost no vertical extent, so the ratio grows as the lids meet.
/// Returns `None` if any index is missing from `landmarks`.
#[must_use]
pub fn try_eye_openness_ratio(landmarks: &[Landmark], eye: &[usize; 6], width: i32, height: i32) -> Option<f64> {
    let mut p = [(0.0, 0.0); 6];
    for (slot, &idx) in p.iter_mut().zip(eye) {
        *slot = landmarks.get(idx)?.to_pixels(width, height);
    }

    let horizontal = (p[0].0 - p[3].0).abs();
    let vertical_1 = (p[1].1 - p[5].1).abs();
    let vertical_2 = (p[2].1 - p[4].1).abs();
    let avg_vertical = (vertical_1 + vertical_2) / 2.0;

    Some(horizontal / (avg_vertical + EYE_RATIO_EPSILON))
}

/// Like [`try_eye_openness_ratio`] but reports `0.0` (eye open) on bad input.
#[must_use]
pub fn eye_openness_ratio(landmarks: &[Landmark], eye: &[usize; 6], width: i32, height: i32) -> f64 {
    try_eye_openness_ratio(landmarks, eye, width, height).unwrap_or_else(|| {
        warn!(
            "Blink ratio unavailable: {} landmarks, eye indices {:?}",
            landmarks.len(),
            eye
        );
        0.0
    })
}
