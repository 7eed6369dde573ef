//! Per-frame processing, independent of camera and window.
//!
//! [`FramePipeline`] turns one frame's landmarks into the anchor point, a
//! blink event and an optional cursor target; the caller performs the side
//! effects. Key presses go through [`FramePipeline::handle_key`].

use crate::{
    blink::{BlinkDetector, BlinkEvent, BlinkSettings},
    calibration::{Calibration, ScreenSize, Sensitivity},
    config::Config,
    filters::CursorFilter,
    geometry::{averaged_anchor, try_eye_openness_ratio, CameraPoint, Landmark},
    utils::safe_cast::f64_to_i32,
    Result,
};
use log::debug;
use std::time::Instant;

/// Landmark indices used by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandmarkIndices {
    pub anchor: Vec<usize>,
    pub left_eye: [usize; 6],
    pub right_eye: [usize; 6],
}

impl Default for LandmarkIndices {
    fn default() -> Self {
        Self {
            anchor: crate::constants::NOSE_ANCHOR_INDICES.to_vec(),
            left_eye: crate::constants::LEFT_EYE_INDICES,
            right_eye: crate::constants::RIGHT_EYE_INDICES,
        }
    }
}

/// What one frame produced
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameOutcome {
    /// Averaged nose anchor in camera pixels
    pub anchor: Option<CameraPoint>,
    /// Mean openness ratio of both eyes
    pub blink_ratio: Option<f64>,
    pub blink: BlinkEvent,
    /// Smoothed screen position, truncated to whole pixels
    pub cursor: Option<(i32, i32)>,
}

/// Keyboard input understood by the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    StartCalibration,
    /// Digit `1..=5`
    Capture(u8),
}

impl KeyAction {
    /// Map an OpenCV key code; `None` for unbound keys and "no key" (-1)
    #[must_use]
    pub fn from_key(key: i32) -> Option<Self> {
        if key < 0 {
            return None;
        }
        match (key & 0xFF) as u8 {
            b'q' | 27 => Some(Self::Quit),
            b'c' => Some(Self::StartCalibration),
            digit @ b'1'..=b'5' => Some(Self::Capture(digit)),
            _ => None,
        }
    }
}

/// Result of a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResponse {
    /// Nothing to do
    Ignored,
    /// Text to speak
    Speak(String),
    Quit,
}

/// Anchor, blink, calibration and smoothing state of the frame loop
pub struct FramePipeline {
    calibration: Calibration,
    blink: BlinkDetector,
    filter: Box<dyn CursorFilter>,
    indices: LandmarkIndices,
}

impl FramePipeline {
    #[must_use]
    pub fn new(
        calibration: Calibration,
        blink: BlinkDetector,
        filter: Box<dyn CursorFilter>,
        indices: LandmarkIndices,
    ) -> Self {
        Self {
            calibration,
            blink,
            filter,
            indices,
        }
    }

    /// Build from configuration for the given screen
    ///
    /// # Errors
    ///
    /// Returns an error if the configured filter cannot be created
    pub fn from_config(config: &Config, screen: ScreenSize) -> Result<Self> {
        Ok(Self::new(
            Calibration::new(screen, config.sensitivity()),
            BlinkDetector::new(config.blink_settings()),
            config.create_filter()?,
            LandmarkIndices {
                anchor: config.landmarks.anchor.clone(),
                left_eye: config.landmarks.left_eye,
                right_eye: config.landmarks.right_eye,
            },
        ))
    }

    /// Process one frame's landmarks (`None` when no face was found)
    pub fn process(&mut self, landmarks: Option<&[Landmark]>, width: i32, height: i32, now: Instant) -> FrameOutcome {
        let Some(landmarks) = landmarks else {
            return FrameOutcome::default();
        };

        let anchor = averaged_anchor(landmarks, &self.indices.anchor, width, height);

        let left = try_eye_openness_ratio(landmarks, &self.indices.left_eye, width, height);
        let right = try_eye_openness_ratio(landmarks, &self.indices.right_eye, width, height);
        let blink_ratio = left.zip(right).map(|(l, r)| (l + r) / 2.0);
        let blink = self.blink.update(blink_ratio, now);

        let cursor = anchor
            .and_then(|(x, y)| self.calibration.map_to_screen(x, y))
            .and_then(|(sx, sy)| {
                let (fx, fy) = self.filter.apply(f64::from(sx), f64::from(sy));
                Some((f64_to_i32(fx).ok()?, f64_to_i32(fy).ok()?))
            });

        FrameOutcome {
            anchor,
            blink_ratio,
            blink,
            cursor,
        }
    }

    /// React to a key press given the current frame's landmarks
    pub fn handle_key(&mut self, action: KeyAction, landmarks: Option<&[Landmark]>, width: i32, height: i32) -> KeyResponse {
        match action {
            KeyAction::Quit => KeyResponse::Quit,
            KeyAction::StartCalibration => {
                self.filter.reset();
                KeyResponse::Speak(self.calibration.start())
            }
            KeyAction::Capture(digit) => {
                if self.calibration.expected_key() != Some(digit) {
                    debug!("Ignoring key {} at stage {}", digit as char, self.calibration.stage().index());
                    return KeyResponse::Ignored;
                }
                let point = landmarks.and_then(|lm| averaged_anchor(lm, &self.indices.anchor, width, height));
                let Some(point) = point else {
                    log::warn!("Cannot calibrate: no face detected");
                    return KeyResponse::Speak("I can't see your face.".to_string());
                };
                self.calibration
                    .capture(point)
                    .map_or(KeyResponse::Ignored, KeyResponse::Speak)
            }
        }
    }

    #[must_use]
    pub const fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Update the mapping target, e.g. after querying the real screen
    pub fn set_screen_size(&mut self, screen: ScreenSize) {
        self.calibration.set_screen_size(screen);
    }

    #[must_use]
    pub const fn blink_detector(&self) -> &BlinkDetector {
        &self.blink
    }

    #[must_use]
    pub fn filter_name(&self) -> &str {
        self.filter.name()
    }
}

impl Default for FramePipeline {
    fn default() -> Self {
        Self::new(
            Calibration::new(ScreenSize::new(1920, 1080), Sensitivity::default()),
            BlinkDetector::new(BlinkSettings::default()),
            Box::new(crate::filters::NoFilter),
            LandmarkIndices::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(KeyAction::from_key(i32::from(b'q')), Some(KeyAction::Quit));
        assert_eq!(KeyAction::from_key(27), Some(KeyAction::Quit));
        assert_eq!(KeyAction::from_key(i32::from(b'c')), Some(KeyAction::StartCalibration));
        assert_eq!(KeyAction::from_key(i32::from(b'3')), Some(KeyAction::Capture(b'3')));
        assert_eq!(KeyAction::from_key(i32::from(b'6')), None);
        assert_eq!(KeyAction::from_key(-1), None);
        // High bits from some backends are masked off
        assert_eq!(KeyAction::from_key(0x10_0000 | i32::from(b'c')), Some(KeyAction::StartCalibration));
    }

    #[test]
    fn test_no_face_is_empty_outcome() {
        let mut pipeline = FramePipeline::default();
        let outcome = pipeline.process(None, 640, 480, Instant::now());
        assert_eq!(outcome, FrameOutcome::default());
    }

    #[test]
    fn test_capture_without_face() {
        let mut pipeline = FramePipeline::default();
        pipeline.handle_key(KeyAction::StartCalibration, None, 640, 480);
        let response = pipeline.handle_key(KeyAction::Capture(b'1'), None, 640, 480);
        assert_eq!(response, KeyResponse::Speak("I can't see your face.".to_string()));
    }

    #[test]
    fn test_capture_before_start_ignored() {
        let mut pipeline = FramePipeline::default();
        assert_eq!(pipeline.handle_key(KeyAction::Capture(b'1'), None, 640, 480), KeyResponse::Ignored);
    }
}
