//! Calibration state machine and camera-to-screen mapping

use head_voice_mouse::calibration::{Calibration, CalibrationLabel, CalibrationStage, ScreenSize, Sensitivity};
use proptest::prelude::*;

const SCREEN: ScreenSize = ScreenSize::new(1920, 1080);

fn unit_sensitivity() -> Sensitivity {
    Sensitivity { x: 1.0, y: 1.0 }
}

/// CENTER, TL, TR, BL, BR in capture order
const CORNERS: [(i32, i32); 5] = [(200, 200), (100, 100), (300, 100), (100, 300), (300, 300)];

fn calibrated(sensitivity: Sensitivity) -> Calibration {
    let mut calib = Calibration::new(SCREEN, sensitivity);
    calib.start();
    for point in CORNERS {
        calib.capture(point);
    }
    calib
}

#[test]
fn test_full_calibration_maps_center_to_screen_center() {
    let calib = calibrated(unit_sensitivity());
    assert!(calib.is_calibrated());
    assert_eq!(calib.stage(), CalibrationStage::Complete);
    assert_eq!(calib.map_to_screen(200, 200), Some((960, 540)));
}

#[test]
fn test_corners_map_to_screen_corners() {
    let calib = calibrated(unit_sensitivity());
    assert_eq!(calib.map_to_screen(100, 100), Some((0, 0)));
    assert_eq!(calib.map_to_screen(300, 300), Some((1920, 1080)));
    assert_eq!(calib.map_to_screen(300, 100), Some((1920, 0)));
}

#[test]
fn test_default_sensitivity_compresses_toward_center() {
    let calib = calibrated(Sensitivity::default());
    // TL corner: 0.5 + (0 - 0.5) * 0.6 = 0.2
    assert_eq!(calib.map_to_screen(100, 100), Some((384, 216)));
    assert_eq!(calib.map_to_screen(200, 200), Some((960, 540)));
}

#[test]
fn test_outside_box_is_clamped() {
    let calib = calibrated(unit_sensitivity());
    assert_eq!(calib.map_to_screen(-500, 900), Some((0, 1080)));
}

#[test]
fn test_messages_follow_capture_order() {
    let mut calib = Calibration::new(SCREEN, unit_sensitivity());
    assert_eq!(calib.overlay_prompt().as_deref(), Some("Press 'c' to calibrate"));

    let started = calib.start();
    assert!(started.contains("center"));
    assert_eq!(calib.overlay_prompt().as_deref(), Some("Look CENTER & press 1"));
    assert_eq!(calib.expected_key(), Some(b'1'));

    assert_eq!(
        calib.capture(CORNERS[0]).as_deref(),
        Some("CENTER captured. Look at TL and press 2.")
    );
    assert_eq!(calib.capture(CORNERS[1]).as_deref(), Some("TL captured. Look at TR and press 3."));
    assert_eq!(calib.capture(CORNERS[2]).as_deref(), Some("TR captured. Look at BL and press 4."));
    assert_eq!(calib.capture(CORNERS[3]).as_deref(), Some("BL captured. Look at BR and press 5."));
    assert_eq!(calib.capture(CORNERS[4]).as_deref(), Some("Calibration complete."));
    assert_eq!(calib.overlay_prompt(), None);
    assert_eq!(calib.expected_key(), None);

    let labels: Vec<_> = calib.points().map(|(label, _)| label).collect();
    assert_eq!(labels, CalibrationLabel::ORDER.to_vec());
}

#[test]
fn test_map_requires_all_points() {
    let mut calib = Calibration::new(SCREEN, unit_sensitivity());
    assert_eq!(calib.map_to_screen(200, 200), None);

    calib.start();
    for point in &CORNERS[..4] {
        calib.capture(*point);
        assert_eq!(calib.map_to_screen(200, 200), None);
    }
}

#[test]
fn test_degenerate_box_maps_nothing() {
    let mut calib = Calibration::new(SCREEN, unit_sensitivity());
    calib.start();
    // TL.x == TR.x
    for point in [(200, 200), (100, 100), (100, 100), (100, 300), (300, 300)] {
        calib.capture(point);
    }
    assert!(calib.is_calibrated());
    assert_eq!(calib.map_to_screen(200, 200), None);

    // TL.y == BL.y
    calib.start();
    for point in [(200, 200), (100, 100), (300, 100), (100, 100), (300, 300)] {
        calib.capture(point);
    }
    assert_eq!(calib.map_to_screen(200, 200), None);
}

#[test]
fn test_capture_is_noop_outside_awaiting() {
    let mut calib = Calibration::new(SCREEN, unit_sensitivity());
    assert_eq!(calib.capture((1, 1)), None);
    assert_eq!(calib.stage().index(), -1);

    let mut calib = calibrated(unit_sensitivity());
    assert_eq!(calib.capture((1, 1)), None);
    assert_eq!(calib.stage().index(), 5);
    assert_eq!(calib.point(CalibrationLabel::Center), Some((200, 200)));
}

#[test]
fn test_restart_clears_previous_calibration() {
    let mut calib = calibrated(unit_sensitivity());
    calib.start();
    assert!(!calib.is_calibrated());
    assert_eq!(calib.points().count(), 0);
    assert_eq!(calib.map_to_screen(200, 200), None);
}

proptest! {
    #[test]
    fn prop_stage_stays_in_range(ops in prop::collection::vec(any::<bool>(), 0..40)) {
        let mut calib = Calibration::new(SCREEN, unit_sensitivity());
        for start in ops {
            if start {
                calib.start();
            } else {
                calib.capture((10, 10));
            }
            let stage = calib.stage().index();
            prop_assert!((-1..=5).contains(&stage));
            prop_assert_eq!(calib.is_calibrated(), stage == 5);
        }
    }

    #[test]
    fn prop_mapping_stays_on_screen(
        x in -10_000i32..10_000,
        y in -10_000i32..10_000,
        sx in 0.1f64..3.0,
        sy in 0.1f64..3.0,
    ) {
        let calib = calibrated(Sensitivity { x: sx, y: sy });
        let (px, py) = calib.map_to_screen(x, y).unwrap();
        prop_assert!((0..=1920).contains(&px));
        prop_assert!((0..=1080).contains(&py));
    }

    #[test]
    fn prop_mapping_is_monotonic_in_x(a in 0i32..400, b in 0i32..400, y in 100i32..300) {
        let calib = calibrated(Sensitivity::default());
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (x_lo, _) = calib.map_to_screen(lo, y).unwrap();
        let (x_hi, _) = calib.map_to_screen(hi, y).unwrap();
        prop_assert!(x_lo <= x_hi);
    }
}
