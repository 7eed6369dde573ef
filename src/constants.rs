//! Constants used throughout the application

/// Exponential smoothing factor for the cursor
pub const DEFAULT_SMOOTHING: f64 = 0.2;

/// Sensitivity scalars applied around the screen centre
pub const DEFAULT_SENS_X: f64 = 0.6;
pub const DEFAULT_SENS_Y: f64 = 0.6;

/// Eye openness ratio above which the eyes count as closed
pub const DEFAULT_BLINK_THRESH: f64 = 5.5;

/// Consecutive closed frames needed for one click
pub const DEFAULT_BLINK_LIMIT: u32 = 2;

/// Seconds in which three clicks toggle voice mode
pub const DEFAULT_TRIPLE_BLINK_WINDOW: f64 = 2.0;

/// Clicks inside the window that make a triple-blink
pub const TRIPLE_BLINK_COUNT: usize = 3;

/// Guards the eye ratio against touching eyelids
pub const EYE_RATIO_EPSILON: f64 = 1e-6;

/// Face-mesh indices averaged into the nose anchor
pub const NOSE_ANCHOR_INDICES: [usize; 3] = [1, 2, 4];

/// Left eye contour: outer, upper1, upper2, inner, lower1, lower2
pub const LEFT_EYE_INDICES: [usize; 6] = [33, 160, 158, 133, 153, 144];

/// Right eye contour: outer, upper1, upper2, inner, lower1, lower2
pub const RIGHT_EYE_INDICES: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Number of landmarks produced by the face-mesh model
pub const NUM_FACE_MESH_LANDMARKS: usize = 468;

/// Face-mesh model input resolution
pub const DEFAULT_FACE_MESH_INPUT_SIZE: i32 = 192;

/// Camera defaults
pub const DEFAULT_CAMERA_INDEX: i32 = 0;
pub const DEFAULT_PREVIEW_WIDTH: i32 = 320;
pub const DEFAULT_PREVIEW_HEIGHT: i32 = 240;

/// Voice listening bounds in seconds
pub const DEFAULT_LISTEN_TIMEOUT: f64 = 4.0;
pub const DEFAULT_PHRASE_TIME_LIMIT: f64 = 4.0;

/// Seconds queued speech gets before the assistant shuts down
pub const DEFAULT_QUIT_GRACE: f64 = 2.0;

/// Voice thread sleep while voice mode is off
pub const DEFAULT_IDLE_POLL_MS: u64 = 100;

/// Voice thread sleep after a listen cycle heard nothing
pub const NOTHING_HEARD_SLEEP_MS: u64 = 50;

/// Wheel clicks sent per scroll command
pub const DEFAULT_SCROLL_CLICKS: u32 = 5;

/// Frame loop back-off after a camera read failure
pub const CAMERA_RETRY_MS: u64 = 500;

/// Speech rate for the default synthesizer (words per minute)
pub const DEFAULT_SPEECH_RATE: u32 = 170;

pub const GOOGLE_SEARCH_URL: &str = "https://www.google.com/search?q=";
pub const YOUTUBE_URL: &str = "https://www.youtube.com";

/// Title of the camera preview window
pub const PREVIEW_WINDOW: &str = "Head + Voice Mouse";
