//! Configuration management for the head-voice mouse

use crate::{
    blink::BlinkSettings,
    calibration::{ScreenSize, Sensitivity},
    constants::*,
    landmarks::{InputLayout, ScoreKind},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera configuration
    pub camera: CameraConfig,

    /// Cursor mapping and smoothing
    pub tracking: TrackingConfig,

    /// Blink gesture configuration
    pub blink: BlinkConfig,

    /// Landmark model and index configuration
    pub landmarks: LandmarkConfig,

    /// Screen size used when X11 cannot report one
    pub screen: ScreenConfig,

    /// Voice assistant configuration
    pub voice: VoiceConfig,

    /// Applications that can be opened and closed by voice, in match order
    pub apps: Vec<AppEntry>,
}

/// Camera parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera index
    pub index: i32,

    /// Preview window width
    pub preview_width: i32,

    /// Preview window height
    pub preview_height: i32,

    /// Mirror the frame horizontally
    pub mirror: bool,
}

/// Cursor mapping parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Exponential smoothing factor (0.0-1.0)
    pub smoothing: f64,

    /// Horizontal sensitivity scalar
    pub sens_x: f64,

    /// Vertical sensitivity scalar
    pub sens_y: f64,

    /// Cursor filter (`exponential`, `exponential:<alpha>` or `none`)
    pub filter: String,
}

/// Blink detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// Eye ratio above which the eyes count as closed
    pub threshold: f64,

    /// Consecutive closed frames per click
    pub frame_limit: u32,

    /// Seconds in which three clicks toggle voice mode
    pub triple_blink_window: f64,
}

/// Face-mesh model and the landmark indices the tracker reads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkConfig {
    /// Path to the face-mesh ONNX model
    pub model: PathBuf,

    /// Square model input size
    pub input_size: i32,

    /// Tensor layout expected by the model (`nchw` or `nhwc`)
    pub input_layout: String,

    /// Minimum face presence probability
    pub presence_threshold: f32,

    /// How the model reports presence (`probability` or `logit`)
    pub score_kind: String,

    /// Indices averaged into the anchor point
    pub anchor: Vec<usize>,

    /// Left eye contour (outer, upper1, upper2, inner, lower1, lower2)
    pub left_eye: [usize; 6],

    /// Right eye contour (outer, upper1, upper2, inner, lower1, lower2)
    pub right_eye: [usize; 6],
}

/// Fallback screen size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,
}

/// Voice assistant parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Run the voice thread at all
    pub enabled: bool,

    /// Speech synthesis program
    pub tts_program: String,

    /// Arguments before the spoken text
    pub tts_args: Vec<String>,

    /// Speech recognition program; prints the transcript on stdout
    pub stt_program: String,

    /// Arguments; `{timeout}` and `{phrase_limit}` are replaced by seconds
    pub stt_args: Vec<String>,

    /// Seconds to wait for speech to begin
    pub listen_timeout: f64,

    /// Maximum seconds of one phrase
    pub phrase_time_limit: f64,

    /// Seconds queued speech gets before shutdown
    pub quit_grace: f64,

    /// Poll interval while voice mode is off
    pub idle_poll_ms: u64,

    /// App name whose close command restarts the desktop shell instead
    pub shell_process: String,

    /// Directory for screenshots
    pub screenshot_dir: PathBuf,

    /// Wheel clicks per scroll command
    pub scroll_clicks: u32,

    /// Search URL prefix; the encoded query is appended
    pub search_url: String,
}

/// One application in the voice table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    /// Spoken name, lower case
    pub name: String,

    /// Executable or shell command
    pub path: String,
}

impl AppEntry {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            tracking: TrackingConfig::default(),
            blink: BlinkConfig::default(),
            landmarks: LandmarkConfig::default(),
            screen: ScreenConfig::default(),
            voice: VoiceConfig::default(),
            apps: default_apps(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: DEFAULT_CAMERA_INDEX,
            preview_width: DEFAULT_PREVIEW_WIDTH,
            preview_height: DEFAULT_PREVIEW_HEIGHT,
            mirror: true,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            sens_x: DEFAULT_SENS_X,
            sens_y: DEFAULT_SENS_Y,
            filter: "exponential".to_string(),
        }
    }
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_BLINK_THRESH,
            frame_limit: DEFAULT_BLINK_LIMIT,
            triple_blink_window: DEFAULT_TRIPLE_BLINK_WINDOW,
        }
    }
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("assets/face_mesh.onnx"),
            input_size: DEFAULT_FACE_MESH_INPUT_SIZE,
            input_layout: "nchw".to_string(),
            presence_threshold: 0.5,
            score_kind: "logit".to_string(),
            anchor: NOSE_ANCHOR_INDICES.to_vec(),
            left_eye: LEFT_EYE_INDICES,
            right_eye: RIGHT_EYE_INDICES,
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tts_program: "espeak".to_string(),
            tts_args: vec!["-s".to_string(), DEFAULT_SPEECH_RATE.to_string()],
            stt_program: "voice-transcribe".to_string(),
            stt_args: vec![
                "--timeout".to_string(),
                "{timeout}".to_string(),
                "--phrase-limit".to_string(),
                "{phrase_limit}".to_string(),
            ],
            listen_timeout: DEFAULT_LISTEN_TIMEOUT,
            phrase_time_limit: DEFAULT_PHRASE_TIME_LIMIT,
            quit_grace: DEFAULT_QUIT_GRACE,
            idle_poll_ms: DEFAULT_IDLE_POLL_MS,
            shell_process: "explorer".to_string(),
            screenshot_dir: PathBuf::from("."),
            scroll_clicks: DEFAULT_SCROLL_CLICKS,
            search_url: GOOGLE_SEARCH_URL.to_string(),
        }
    }
}

fn default_apps() -> Vec<AppEntry> {
    vec![
        AppEntry::new("chrome", "google-chrome"),
        AppEntry::new("vscode", "code"),
        AppEntry::new("cmd", "x-terminal-emulator"),
        AppEntry::new("notepad", "gedit"),
        AppEntry::new("explorer", "nautilus"),
        AppEntry::new("settings", "gnome-control-center"),
        AppEntry::new("calculator", "gnome-calculator"),
    ]
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Create the cursor filter from configuration
    pub fn create_filter(&self) -> Result<Box<dyn crate::filters::CursorFilter>> {
        crate::filters::create_filter(&self.tracking.filter, self.tracking.smoothing)
    }

    #[must_use]
    pub fn sensitivity(&self) -> Sensitivity {
        Sensitivity {
            x: self.tracking.sens_x,
            y: self.tracking.sens_y,
        }
    }

    #[must_use]
    pub fn blink_settings(&self) -> BlinkSettings {
        BlinkSettings {
            threshold: self.blink.threshold,
            frame_limit: self.blink.frame_limit,
            triple_window: seconds_or(self.blink.triple_blink_window, DEFAULT_TRIPLE_BLINK_WINDOW),
        }
    }

    #[must_use]
    pub const fn fallback_screen(&self) -> ScreenSize {
        ScreenSize::new(self.screen.width, self.screen.height)
    }

    /// Path configured for an app name
    #[must_use]
    pub fn app_path(&self, name: &str) -> Option<&str> {
        self.apps.iter().find(|a| a.name == name).map(|a| a.path.as_str())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Validate tracking
        if !(0.0..=1.0).contains(&self.tracking.smoothing) {
            return Err(Error::ConfigError("Smoothing must be between 0.0 and 1.0".to_string()));
        }
        if !(self.tracking.sens_x > 0.0 && self.tracking.sens_y > 0.0) {
            return Err(Error::ConfigError("Sensitivity must be greater than 0".to_string()));
        }
        self.create_filter()?;

        // Validate blink settings
        if !(self.blink.threshold > 0.0) {
            return Err(Error::ConfigError("Blink threshold must be greater than 0".to_string()));
        }
        if self.blink.frame_limit == 0 {
            return Err(Error::ConfigError("Blink frame limit must be at least 1".to_string()));
        }
        if seconds("blink.triple_blink_window", self.blink.triple_blink_window)?.is_zero() {
            return Err(Error::ConfigError("Triple blink window must be greater than 0".to_string()));
        }

        // Validate landmarks
        if self.landmarks.anchor.is_empty() {
            return Err(Error::ConfigError("Anchor index list must not be empty".to_string()));
        }
        if self.landmarks.input_size <= 0 {
            return Err(Error::ConfigError("Model input size must be greater than 0".to_string()));
        }
        if InputLayout::parse(&self.landmarks.input_layout).is_err() {
            return Err(Error::ConfigError(format!(
                "Unknown input layout '{}', expected nchw or nhwc",
                self.landmarks.input_layout
            )));
        }
        if ScoreKind::parse(&self.landmarks.score_kind).is_err() {
            return Err(Error::ConfigError(format!(
                "Unknown presence score kind '{}', expected probability or logit",
                self.landmarks.score_kind
            )));
        }

        // Validate camera and screen
        if self.camera.preview_width <= 0 || self.camera.preview_height <= 0 {
            return Err(Error::ConfigError("Preview size must be greater than 0".to_string()));
        }
        if self.screen.width == 0 || self.screen.height == 0 {
            return Err(Error::ConfigError("Screen size must be greater than 0".to_string()));
        }

        // Validate voice
        let v = &self.voice;
        if seconds("voice.listen_timeout", v.listen_timeout)?.is_zero()
            || seconds("voice.phrase_time_limit", v.phrase_time_limit)?.is_zero()
        {
            return Err(Error::ConfigError("Listen timeouts must be greater than 0".to_string()));
        }
        seconds("voice.quit_grace", v.quit_grace)?;
        if v.idle_poll_ms == 0 {
            return Err(Error::ConfigError("Idle poll interval must be at least 1 ms".to_string()));
        }

        // Validate app table
        let mut seen = HashSet::new();
        for app in &self.apps {
            if app.name.trim().is_empty() {
                return Err(Error::ConfigError("App names must not be empty".to_string()));
            }
            if app.name != app.name.to_lowercase() {
                return Err(Error::ConfigError(format!("App name '{}' must be lower case", app.name)));
            }
            if !seen.insert(app.name.as_str()) {
                return Err(Error::ConfigError(format!("Duplicate app name '{}'", app.name)));
            }
        }

        Ok(())
    }
}

/// A seconds field as a `Duration`
///
/// # Errors
///
/// Returns `ConfigError` for negative, NaN or out-of-range values
pub fn seconds(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| Error::ConfigError(format!("{field} is not a usable number of seconds ({value}): {e}")))
}

/// Like [`seconds`] but falls back to `default` for unusable values
#[must_use]
pub fn seconds_or(value: f64, default: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_else(|_| Duration::from_secs_f64(default))
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Head + Voice Mouse Configuration

# Camera
camera:
  index: 0
  preview_width: 320
  preview_height: 240
  mirror: true

# Cursor mapping
tracking:
  smoothing: 0.2
  sens_x: 0.6
  sens_y: 0.6
  filter: "exponential"

# Blink gestures
blink:
  threshold: 5.5
  frame_limit: 2
  triple_blink_window: 2.0

# Face-mesh model and landmark indices
landmarks:
  model: "assets/face_mesh.onnx"
  input_size: 192
  input_layout: "nchw"
  presence_threshold: 0.5
  score_kind: "logit"
  anchor: [1, 2, 4]
  left_eye: [33, 160, 158, 133, 153, 144]
  right_eye: [362, 385, 387, 263, 373, 380]

# Used when the X11 screen size is unavailable
screen:
  width: 1920
  height: 1080

# Voice assistant
voice:
  enabled: true
  tts_program: "espeak"
  tts_args: ["-s", "170"]
  stt_program: "voice-transcribe"
  stt_args: ["--timeout", "{timeout}", "--phrase-limit", "{phrase_limit}"]
  listen_timeout: 4.0
  phrase_time_limit: 4.0
  quit_grace: 2.0
  idle_poll_ms: 100
  shell_process: "explorer"
  screenshot_dir: "."
  scroll_clicks: 5
  search_url: "https://www.google.com/search?q="

# Applications, matched in this order
apps:
  - { name: chrome, path: google-chrome }
  - { name: vscode, path: code }
  - { name: cmd, path: x-terminal-emulator }
  - { name: notepad, path: gedit }
  - { name: explorer, path: nautilus }
  - { name: settings, path: gnome-control-center }
  - { name: calculator, path: gnome-calculator }
"#;
