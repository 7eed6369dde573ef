//! Five-point calibration and the camera-to-screen mapping.
//!
//! The user looks at the screen centre and then each corner, confirming every
//! position with a digit key. The captured nose positions bound the head's
//! range of motion; [`Calibration::map_to_screen`] stretches that box over the
//! whole screen.

use crate::utils::safe_cast::round_to_i32;
use crate::geometry::CameraPoint;
use std::fmt;

/// Reference positions in capture order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibrationLabel {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl CalibrationLabel {
    /// All labels in the order they are captured
    pub const ORDER: [Self; 5] = [
        Self::Center,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Center => "CENTER",
            Self::TopLeft => "TL",
            Self::TopRight => "TR",
            Self::BottomLeft => "BL",
            Self::BottomRight => "BR",
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Center => 0,
            Self::TopLeft => 1,
            Self::TopRight => 2,
            Self::BottomLeft => 3,
            Self::BottomRight => 4,
        }
    }
}

impl fmt::Display for CalibrationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the calibration sequence currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStage {
    /// Never started
    Inactive,
    /// Waiting for the point with this index (0..=4)
    AwaitingPoint(usize),
    /// All five points captured
    Complete,
}

impl CalibrationStage {
    /// Numeric stage: -1 inactive, 0-4 awaiting, 5 complete
    #[must_use]
    pub const fn index(self) -> i32 {
        match self {
            Self::Inactive => -1,
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)] // s <= 4
            Self::AwaitingPoint(s) => s as i32,
            Self::Complete => 5,
        }
    }
}

/// Screen resolution in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Sensitivity scalars; values below 1 compress movement toward the centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensitivity {
    pub x: f64,
    pub y: f64,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            x: crate::constants::DEFAULT_SENS_X,
            y: crate::constants::DEFAULT_SENS_Y,
        }
    }
}

/// Calibration state machine
#[derive(Debug, Clone)]
pub struct Calibration {
    stage: CalibrationStage,
    calibrated: bool,
    points: [Option<CameraPoint>; 5],
    screen: ScreenSize,
    sensitivity: Sensitivity,
}

impl Calibration {
    #[must_use]
    pub const fn new(screen: ScreenSize, sensitivity: Sensitivity) -> Self {
        Self {
            stage: CalibrationStage::Inactive,
            calibrated: false,
            points: [None; 5],
            screen,
            sensitivity,
        }
    }

    /// Reset and begin capturing from the centre point
    pub fn start(&mut self) -> String {
        self.stage = CalibrationStage::AwaitingPoint(0);
        self.calibrated = false;
        self.points = [None; 5];
        log::info!("Calibration started");
        "Calibration started. Look at center then corners and press 1 to 5.".to_string()
    }

    /// Store `point` for the current stage and advance.
    ///
    /// Returns the feedback message, or `None` when no point is expected.
    pub fn capture(&mut self, point: CameraPoint) -> Option<String> {
        let CalibrationStage::AwaitingPoint(s) = self.stage else {
            return None;
        };

        let label = CalibrationLabel::ORDER[s];
        self.points[label.slot()] = Some(point);
        log::info!("{} point captured: {:?}", label, point);

        let next = s + 1;
        if next == CalibrationLabel::ORDER.len() {
            self.stage = CalibrationStage::Complete;
            self.calibrated = true;
            log::info!("Calibration complete");
            Some("Calibration complete.".to_string())
        } else {
            self.stage = CalibrationStage::AwaitingPoint(next);
            Some(format!(
                "{label} captured. Look at {} and press {}.",
                CalibrationLabel::ORDER[next],
                next + 1
            ))
        }
    }

    /// Instruction text for the camera overlay
    #[must_use]
    pub fn overlay_prompt(&self) -> Option<String> {
        match self.stage {
            CalibrationStage::AwaitingPoint(s) => Some(format!("Look {} & press {}", CalibrationLabel::ORDER[s], s + 1)),
            _ if !self.calibrated => Some("Press 'c' to calibrate".to_string()),
            _ => None,
        }
    }

    /// Digit key (`b'1'..=b'5'`) that captures the current point
    #[must_use]
    pub fn expected_key(&self) -> Option<u8> {
        match self.stage {
            #[allow(clippy::cast_possible_truncation)] // s <= 4
            CalibrationStage::AwaitingPoint(s) => Some(b'1' + s as u8),
            _ => None,
        }
    }

    /// Map a camera-space anchor to an absolute screen position.
    ///
    /// The box spans TL.x..TR.x horizontally and TL.y..BL.y vertically; CENTER
    /// and BR are captured but do not shape the box. Returns `None` before
    /// calibration completes or when the box has zero width or height.
    #[must_use]
    pub fn map_to_screen(&self, x: i32, y: i32) -> Option<(i32, i32)> {
        if !self.calibrated {
            return None;
        }
        let tl = self.point(CalibrationLabel::TopLeft)?;
        let tr = self.point(CalibrationLabel::TopRight)?;
        let bl = self.point(CalibrationLabel::BottomLeft)?;
        self.point(CalibrationLabel::Center)?;
        self.point(CalibrationLabel::BottomRight)?;

        let (left, right) = (f64::from(tl.0), f64::from(tr.0));
        let (top, bottom) = (f64::from(tl.1), f64::from(bl.1));
        if tr.0 == tl.0 || bl.1 == tl.1 {
            return None;
        }

        let nx = (f64::from(x) - left) / (right - left);
        let ny = (f64::from(y) - top) / (bottom - top);

        let nx = (0.5 + (nx - 0.5) * self.sensitivity.x).clamp(0.0, 1.0);
        let ny = (0.5 + (ny - 0.5) * self.sensitivity.y).clamp(0.0, 1.0);

        let sx = round_to_i32(nx * f64::from(self.screen.width)).ok()?;
        let sy = round_to_i32(ny * f64::from(self.screen.height)).ok()?;
        Some((sx, sy))
    }

    /// Captured position for a label
    #[must_use]
    pub fn point(&self, label: CalibrationLabel) -> Option<CameraPoint> {
        self.points[label.slot()]
    }

    /// Captured points in capture order
    pub fn points(&self) -> impl Iterator<Item = (CalibrationLabel, CameraPoint)> + '_ {
        CalibrationLabel::ORDER
            .iter()
            .filter_map(|&label| self.point(label).map(|p| (label, p)))
    }

    #[must_use]
    pub const fn stage(&self) -> CalibrationStage {
        self.stage
    }

    #[must_use]
    pub const fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    #[must_use]
    pub const fn screen_size(&self) -> ScreenSize {
        self.screen
    }

    pub fn set_screen_size(&mut self, screen: ScreenSize) {
        self.screen = screen;
    }
}
