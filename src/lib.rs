//! Hands-free mouse control from a webcam and a microphone.
//!
//! The library provides:
//! - A five point calibration that maps the nose position to the screen
//! - Exponential smoothing of the cursor target
//! - Blink-to-click with a triple-blink toggle for voice mode
//! - A voice assistant that turns short phrases into desktop actions
//!
//! The frame loop runs on the main thread:
//! 1. Face-mesh landmarks are computed with ONNX Runtime
//! 2. The nose anchor and eye openness ratio are derived from them
//! 3. Blink gestures produce clicks; calibrated anchors move the cursor
//!
//! A second thread owns speech: it speaks queued feedback and, while voice
//! mode is on, listens for commands.
//!
//! # Examples
//!
//! ## Calibration and mapping
//!
//! ```
//! use head_voice_mouse::calibration::{Calibration, ScreenSize, Sensitivity};
//!
//! let mut calib = Calibration::new(ScreenSize::new(1920, 1080), Sensitivity { x: 1.0, y: 1.0 });
//! calib.start();
//! for point in [(320, 240), (220, 160), (420, 160), (220, 320), (420, 320)] {
//!     calib.capture(point);
//! }
//! assert_eq!(calib.map_to_screen(320, 240), Some((960, 540)));
//! ```
//!
//! ## Blink detection
//!
//! ```
//! use head_voice_mouse::blink::{BlinkDetector, BlinkEvent, BlinkSettings};
//! use std::time::Instant;
//!
//! let mut detector = BlinkDetector::new(BlinkSettings::default());
//! let now = Instant::now();
//! assert_eq!(detector.update(Some(8.0), now), BlinkEvent::Closed);
//! assert_eq!(detector.update(Some(8.0), now), BlinkEvent::Click);
//! ```
//!
//! ## Voice commands
//!
//! ```
//! use head_voice_mouse::config::Config;
//! use head_voice_mouse::voice::command::{parse_command, VoiceCommand};
//!
//! let config = Config::default();
//! assert_eq!(
//!     parse_command("please open chrome", &config.apps),
//!     Some(VoiceCommand::OpenApp("chrome".to_string()))
//! );
//! ```

/// Running application: camera loop and preview window
pub mod app;

/// Blink gesture detection
pub mod blink;

/// Calibration state machine and camera-to-screen mapping
pub mod calibration;

/// Command-line arguments
pub mod cli;

/// Configuration management
pub mod config;

/// Constants used throughout the application
pub mod constants;

/// Cursor control module for X11 systems
pub mod cursor_control;

/// Desktop actions behind voice commands
pub mod desktop;

/// Error types and result handling
pub mod error;

/// Cursor smoothing filters
pub mod filters;

/// Anchor and eye ratio geometry
pub mod geometry;

/// Face-mesh landmark detection
pub mod landmarks;

/// Per-frame processing and key handling
pub mod pipeline;

/// State shared between the frame loop and the voice thread
pub mod state;

/// Numeric helpers
pub mod utils;

/// Voice assistant
pub mod voice;

pub use error::{Error, Result};
