//! Helper functions and fakes shared by the integration tests
#![allow(dead_code)]

use head_voice_mouse::{
    constants::{LEFT_EYE_INDICES, NOSE_ANCHOR_INDICES, NUM_FACE_MESH_LANDMARKS, RIGHT_EYE_INDICES},
    desktop::{DesktopActions, Pointer, PointerAction, SystemAction},
    geometry::Landmark,
    voice::speech::{SpeechRecognizer, SpeechSynthesizer},
    Error, Result,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Frame size used with the synthetic faces
pub const FRAME_W: i32 = 640;
pub const FRAME_H: i32 = 480;

/// Eye width as a fraction of the frame
const EYE_WIDTH: f32 = 0.04;

fn place_eye(landmarks: &mut [Landmark], eye: &[usize; 6], cx: f32, cy: f32, openness: f32) {
    let h = EYE_WIDTH / 2.0;
    let v = h * openness;
    let points = [
        (cx - h, cy),
        (cx - h / 2.0, cy - v),
        (cx + h / 2.0, cy - v),
        (cx + h, cy),
        (cx + h / 2.0, cy + v),
        (cx - h / 2.0, cy + v),
    ];
    for (&idx, (x, y)) in eye.iter().zip(points) {
        landmarks[idx] = Landmark::new(x, y);
    }
}

/// Full 468-point face with the nose at `(nose_x, nose_y)` (fractions) and
/// both eyes open or shut
pub fn synthetic_face(nose_x: f32, nose_y: f32, eyes_closed: bool) -> Vec<Landmark> {
    let mut landmarks = vec![Landmark::new(nose_x, nose_y); NUM_FACE_MESH_LANDMARKS];
    for &idx in &NOSE_ANCHOR_INDICES {
        landmarks[idx] = Landmark::new(nose_x, nose_y);
    }
    let openness = if eyes_closed { 0.05 } else { 1.0 };
    place_eye(&mut landmarks, &LEFT_EYE_INDICES, nose_x - 0.06, nose_y - 0.08, openness);
    place_eye(&mut landmarks, &RIGHT_EYE_INDICES, nose_x + 0.06, nose_y - 0.08, openness);
    landmarks
}

/// Face whose nose sits at camera pixel `(x, y)` in a `FRAME_W` x `FRAME_H` frame
pub fn face_at_pixel(x: i32, y: i32) -> Vec<Landmark> {
    #[allow(clippy::cast_precision_loss)]
    synthetic_face(x as f32 / FRAME_W as f32, y as f32 / FRAME_H as f32, false)
}

/// Shared, inspectable call log
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Desktop that records every request instead of touching the system
pub struct RecordingDesktop {
    pub log: CallLog,
    /// Process names `terminate_process` reports as running
    pub running: Vec<String>,
    /// Make every primitive fail
    pub fail: bool,
}

impl RecordingDesktop {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            running: Vec::new(),
            fail: false,
        }
    }

    fn record(&self, call: String) -> Result<()> {
        self.log.lock().unwrap().push(call);
        if self.fail {
            Err(Error::Desktop("primitive failed".to_string()))
        } else {
            Ok(())
        }
    }
}

impl DesktopActions for RecordingDesktop {
    fn launch(&mut self, path: &str) -> Result<()> {
        self.record(format!("launch {path}"))
    }

    fn terminate_process(&mut self, name: &str) -> Result<bool> {
        self.record(format!("terminate {name}"))?;
        Ok(self.running.iter().any(|p| p == name))
    }

    fn restart_shell(&mut self, name: &str) -> Result<()> {
        self.record(format!("restart_shell {name}"))
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        self.record(format!("open_url {url}"))
    }

    fn pointer(&mut self, action: PointerAction) -> Result<()> {
        self.record(format!("pointer {action:?}"))
    }

    fn system(&mut self, action: SystemAction) -> Result<()> {
        self.record(format!("system {action:?}"))
    }
}

/// Pointer that records moves and clicks
#[derive(Default)]
pub struct RecordingPointer {
    pub moves: Vec<(i32, i32)>,
    pub clicks: usize,
    pub fail: bool,
}

impl Pointer for RecordingPointer {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        self.moves.push((x, y));
        if self.fail {
            Err(Error::CursorControl("no display".to_string()))
        } else {
            Ok(())
        }
    }

    fn click(&mut self) -> Result<()> {
        self.clicks += 1;
        if self.fail {
            Err(Error::CursorControl("no display".to_string()))
        } else {
            Ok(())
        }
    }

    fn double_click(&mut self) -> Result<()> {
        self.clicks += 2;
        Ok(())
    }

    fn scroll(&mut self, _clicks: u32, _up: bool) -> Result<()> {
        Ok(())
    }
}

/// Synthesizer that records what it was asked to say
pub struct RecordingSynthesizer {
    pub spoken: CallLog,
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn say(&mut self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Recognizer that replays a script, then hears nothing
pub struct ScriptedRecognizer {
    pub script: VecDeque<Option<String>>,
    pub listens: Arc<Mutex<usize>>,
}

impl ScriptedRecognizer {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            script: lines.iter().map(|l| Some((*l).to_string())).collect(),
            listens: Arc::new(Mutex::new(0)),
        }
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn listen(&mut self, _timeout: Duration, _phrase_limit: Duration) -> Result<Option<String>> {
        *self.listens.lock().unwrap() += 1;
        Ok(self.script.pop_front().flatten())
    }
}
