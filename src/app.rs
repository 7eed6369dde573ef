//! Main application module: camera loop, preview window and frame side effects.

use crate::{
    blink::BlinkEvent,
    calibration::ScreenSize,
    constants::{CAMERA_RETRY_MS, PREVIEW_WINDOW},
    desktop::Pointer,
    error::{Error, Result},
    landmarks::LandmarkSource,
    pipeline::{FrameOutcome, FramePipeline, KeyAction, KeyResponse},
    state::{ShutdownSignal, VoiceActivation},
    voice::Speaker,
};
use log::{debug, info, warn};
use opencv::{
    core::{self, Mat, Point, Scalar, Size},
    highgui::{self, WINDOW_NORMAL},
    imgproc::{self, InterpolationFlags, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE},
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Whether a camera read produced a frame; failed reads are only logged
fn frame_ready(read: opencv::Result<bool>, frame: &Mat) -> bool {
    match read {
        Ok(true) if !frame.empty() => true,
        Ok(_) => {
            warn!("Camera read failed");
            false
        }
        Err(e) => {
            warn!("Camera read failed: {}", e);
            false
        }
    }
}

/// Camera and preview settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraOptions {
    pub index: i32,
    pub preview_width: i32,
    pub preview_height: i32,
    /// Flip horizontally so the preview behaves like a mirror
    pub mirror: bool,
}

/// Perform the side effects of one processed frame.
///
/// Clicks and cursor moves go to `pointer` when there is one; failures are
/// logged and the loop carries on. A triple-blink flips voice mode and
/// announces the new state.
pub fn apply_outcome(
    outcome: &FrameOutcome,
    mut pointer: Option<&mut dyn Pointer>,
    activation: &VoiceActivation,
    speaker: &Speaker,
) {
    if outcome.blink.is_click() {
        if let Some(p) = pointer.as_deref_mut() {
            if let Err(e) = p.click() {
                warn!("Blink click failed: {}", e);
            }
        }
    }

    if outcome.blink == BlinkEvent::ClickAndToggle {
        let active = activation.toggle();
        info!("Triple blink: voice mode {}", if active { "on" } else { "off" });
        speaker.speak(if active {
            "Voice mode activated."
        } else {
            "Voice mode deactivated."
        });
    }

    if let (Some((x, y)), Some(p)) = (outcome.cursor, pointer) {
        if let Err(e) = p.move_to(x, y) {
            debug!("Cursor move failed: {}", e);
        }
    }
}

/// Head-tracking mouse with blink clicks
pub struct HeadMouseApp {
    capture: VideoCapture,
    landmarks: Box<dyn LandmarkSource>,
    pipeline: FramePipeline,
    pointer: Option<Box<dyn Pointer>>,
    activation: Arc<VoiceActivation>,
    shutdown: ShutdownSignal,
    speaker: Speaker,
    camera: CameraOptions,
    window_pos: (i32, i32),
}

impl HeadMouseApp {
    /// Open the camera and the preview window.
    ///
    /// `pointer` is `None` when cursor control is disabled or unavailable;
    /// `screen` sizes the calibration mapping and places the preview.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera cannot be opened or the window cannot
    /// be created
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        camera: CameraOptions,
        landmarks: Box<dyn LandmarkSource>,
        mut pipeline: FramePipeline,
        pointer: Option<Box<dyn Pointer>>,
        screen: ScreenSize,
        activation: Arc<VoiceActivation>,
        shutdown: ShutdownSignal,
        speaker: Speaker,
    ) -> Result<Self> {
        info!("Opening camera {}", camera.index);
        let mut capture = VideoCapture::new(camera.index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::InvalidInput(format!("Could not open camera {}", camera.index)));
        }
        // Latest frame only
        capture.set(CAP_PROP_BUFFERSIZE, 1.0)?;
        info!("Camera {} opened", camera.index);

        pipeline.set_screen_size(screen);

        let screen_w = i32::try_from(screen.width).unwrap_or(i32::MAX);
        let window_pos = (screen_w - camera.preview_width - 10, 10);
        highgui::named_window(PREVIEW_WINDOW, WINDOW_NORMAL)?;
        highgui::resize_window(PREVIEW_WINDOW, camera.preview_width, camera.preview_height)?;
        highgui::move_window(PREVIEW_WINDOW, window_pos.0, window_pos.1)?;

        Ok(Self {
            capture,
            landmarks,
            pipeline,
            pointer,
            activation,
            shutdown,
            speaker,
            camera,
            window_pos,
        })
    }

    /// Run until `q`/`Esc` is pressed or shutdown is requested
    pub fn run(&mut self) -> Result<()> {
        info!("Smoothing cursor with {}", self.pipeline.filter_name());
        info!("Press 'c' to calibrate. Press 'q' to quit.");
        self.speaker.speak("Assistant ready.");

        let mut frame = Mat::default();
        while !self.shutdown.is_requested() {
            if !frame_ready(self.capture.read(&mut frame), &frame) {
                thread::sleep(Duration::from_millis(CAMERA_RETRY_MS));
                continue;
            }

            let mut display = if self.camera.mirror {
                let mut flipped = Mat::default();
                core::flip(&frame, &mut flipped, 1)?;
                flipped
            } else {
                frame.try_clone()?
            };
            let (width, height) = (display.cols(), display.rows());

            let landmarks = match self.landmarks.process(&display) {
                Ok(landmarks) => landmarks,
                Err(e) => {
                    warn!("Landmark detection failed: {}", e);
                    None
                }
            };

            let outcome = self
                .pipeline
                .process(landmarks.as_deref(), width, height, Instant::now());
            apply_outcome(
                &outcome,
                self.pointer.as_mut().map(|p| p.as_mut() as &mut dyn Pointer),
                &self.activation,
                &self.speaker,
            );

            self.draw_overlay(&mut display, &outcome)?;
            self.show_preview(&display)?;

            let key = highgui::wait_key(1)?;
            if let Some(action) = KeyAction::from_key(key) {
                match self.pipeline.handle_key(action, landmarks.as_deref(), width, height) {
                    KeyResponse::Quit => {
                        info!("Exit requested by user");
                        break;
                    }
                    KeyResponse::Speak(message) => self.speaker.speak(message),
                    KeyResponse::Ignored => {}
                }
            }
        }

        self.shutdown.request();
        self.capture.release()?;
        highgui::destroy_all_windows()?;
        info!("Frame loop stopped");
        Ok(())
    }

    fn draw_overlay(&self, frame: &mut Mat, outcome: &FrameOutcome) -> Result<()> {
        if let Some((x, y)) = outcome.anchor {
            imgproc::circle(frame, Point::new(x, y), 5, Scalar::new(0.0, 255.0, 255.0, 0.0), -1, LINE_8, 0)?;
        }

        if outcome.blink.eyes_closed() {
            put_label(frame, "BLINK", Point::new(10, 40), 1.0, Scalar::new(0.0, 0.0, 255.0, 0.0))?;
        }

        if self.activation.is_active() {
            put_label(frame, "VOICE", Point::new(10, 70), 0.8, Scalar::new(0.0, 255.0, 0.0, 0.0))?;
        }

        if let Some(prompt) = self.pipeline.calibration().overlay_prompt() {
            put_label(frame, &prompt, Point::new(10, 20), 0.6, Scalar::new(0.0, 255.0, 255.0, 0.0))?;
        }
        Ok(())
    }

    fn show_preview(&self, frame: &Mat) -> Result<()> {
        let mut preview = Mat::default();
        imgproc::resize(
            frame,
            &mut preview,
            Size::new(self.camera.preview_width, self.camera.preview_height),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;
        highgui::imshow(PREVIEW_WINDOW, &preview)?;
        // Window managers may move it; pin it back every frame
        highgui::move_window(PREVIEW_WINDOW, self.window_pos.0, self.window_pos.1)?;
        Ok(())
    }
}

fn put_label(frame: &mut Mat, text: &str, origin: Point, scale: f64, color: Scalar) -> Result<()> {
    imgproc::put_text(frame, text, origin, FONT_HERSHEY_SIMPLEX, scale, color, 2, LINE_8, false)?;
    Ok(())
}
