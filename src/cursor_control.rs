//! Cursor control module for X11-based systems.
//!
//! Positions the pointer with `WarpPointer` and synthesizes button and key
//! events through the XTest extension. Screenshots read the root window with
//! `GetImage`.

use crate::{
    calibration::ScreenSize,
    desktop::Pointer,
    error::{AppError, Result},
};
use log::{debug, info};
use std::path::Path;
use x11rb::{
    connection::Connection,
    protocol::xproto::{
        ConnectionExt as _, ImageFormat, Keycode, Keysym, Screen, BUTTON_PRESS_EVENT, BUTTON_RELEASE_EVENT,
        KEY_PRESS_EVENT, KEY_RELEASE_EVENT,
    },
    protocol::xtest::ConnectionExt as _,
    rust_connection::RustConnection,
};

/// X11 pointer buttons
const BUTTON_LEFT: u8 = 1;
const BUTTON_WHEEL_UP: u8 = 4;
const BUTTON_WHEEL_DOWN: u8 = 5;

/// Keysyms used by voice system actions
mod keysym {
    pub const ALT_L: u32 = 0xffe9;
    pub const SUPER_L: u32 = 0xffeb;
    pub const F4: u32 = 0xffc1;
    pub const LOWER_D: u32 = 0x0064;
    pub const AUDIO_LOWER_VOLUME: u32 = 0x1008_ff11;
    pub const AUDIO_MUTE: u32 = 0x1008_ff12;
    pub const AUDIO_RAISE_VOLUME: u32 = 0x1008_ff13;
}

/// Key combinations the assistant can press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyChord {
    /// Alt+F4
    CloseWindow,
    /// Super+D
    ShowDesktop,
    VolumeUp,
    VolumeDown,
    Mute,
}

impl KeyChord {
    /// Keysyms pressed in order and released in reverse
    #[must_use]
    pub const fn keysyms(self) -> &'static [u32] {
        match self {
            Self::CloseWindow => &[keysym::ALT_L, keysym::F4],
            Self::ShowDesktop => &[keysym::SUPER_L, keysym::LOWER_D],
            Self::VolumeUp => &[keysym::AUDIO_RAISE_VOLUME],
            Self::VolumeDown => &[keysym::AUDIO_LOWER_VOLUME],
            Self::Mute => &[keysym::AUDIO_MUTE],
        }
    }
}

/// Cursor control implementation for X11
pub struct CursorController {
    connection: RustConnection,
    screen: Screen,
    screen_width: u16,
    screen_height: u16,
}

impl CursorController {
    /// Create a new cursor controller
    pub fn new() -> Result<Self> {
        info!("Initializing X11 cursor controller");

        let (connection, screen_num) = RustConnection::connect(None)
            .map_err(|e| AppError::X11(format!("Failed to connect: {e}")))?;

        let screen = connection
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| AppError::CursorControl("Failed to get screen".to_string()))?
            .clone();

        let screen_width = screen.width_in_pixels;
        let screen_height = screen.height_in_pixels;

        info!("Connected to X11 display, screen: {}x{}", screen_width, screen_height);

        Ok(Self {
            connection,
            screen,
            screen_width,
            screen_height,
        })
    }

    /// Set cursor position (absolute)
    pub fn set_position(&self, x: i16, y: i16) -> Result<()> {
        let max_x = i16::try_from(self.screen_width.saturating_sub(1)).unwrap_or(i16::MAX);
        let max_y = i16::try_from(self.screen_height.saturating_sub(1)).unwrap_or(i16::MAX);
        let x = x.clamp(0, max_x);
        let y = y.clamp(0, max_y);

        debug!("Setting cursor position to ({}, {})", x, y);

        self.connection
            .warp_pointer(x11rb::NONE, self.screen.root, 0, 0, 0, 0, x, y)
            .map_err(|e| AppError::CursorControl(format!("Failed to warp pointer: {e}")))?;

        self.flush()
    }

    /// Screen dimensions
    #[must_use]
    pub const fn screen_size(&self) -> ScreenSize {
        ScreenSize::new(self.screen_width as u32, self.screen_height as u32)
    }

    fn flush(&self) -> Result<()> {
        self.connection
            .flush()
            .map_err(|e| AppError::CursorControl(format!("Failed to flush connection: {e}")))
    }

    fn fake_input(&self, event_type: u8, detail: u8) -> Result<()> {
        self.connection
            .xtest_fake_input(event_type, detail, x11rb::CURRENT_TIME, self.screen.root, 0, 0, 0)
            .map_err(|e| AppError::CursorControl(format!("XTest fake input failed: {e}")))?;
        Ok(())
    }

    fn button(&self, button: u8) -> Result<()> {
        self.fake_input(BUTTON_PRESS_EVENT, button)?;
        self.fake_input(BUTTON_RELEASE_EVENT, button)?;
        self.flush()
    }

    /// Left click at the current position
    pub fn click(&self) -> Result<()> {
        debug!("Click");
        self.button(BUTTON_LEFT)
    }

    pub fn double_click(&self) -> Result<()> {
        debug!("Double click");
        self.button(BUTTON_LEFT)?;
        self.button(BUTTON_LEFT)
    }

    /// Scroll by `clicks` wheel steps
    pub fn scroll(&self, clicks: u32, up: bool) -> Result<()> {
        let button = if up { BUTTON_WHEEL_UP } else { BUTTON_WHEEL_DOWN };
        for _ in 0..clicks {
            self.button(button)?;
        }
        Ok(())
    }

    fn keycode_for(&self, sym: Keysym) -> Result<Keycode> {
        let setup = self.connection.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let reply = self
            .connection
            .get_keyboard_mapping(min, max.saturating_sub(min).saturating_add(1))
            .map_err(|e| AppError::CursorControl(format!("Failed to request keyboard mapping: {e}")))?
            .reply()
            .map_err(|e| AppError::CursorControl(format!("Failed to read keyboard mapping: {e}")))?;

        find_keycode(&reply.keysyms, reply.keysyms_per_keycode, min, sym)
            .ok_or_else(|| AppError::CursorControl(format!("No keycode for keysym {sym:#x}")))
    }

    /// Press a key combination
    pub fn press_chord(&self, chord: KeyChord) -> Result<()> {
        debug!("Pressing {:?}", chord);
        let keycodes = chord
            .keysyms()
            .iter()
            .map(|&sym| self.keycode_for(sym))
            .collect::<Result<Vec<_>>>()?;

        for &code in &keycodes {
            self.fake_input(KEY_PRESS_EVENT, code)?;
        }
        for &code in keycodes.iter().rev() {
            self.fake_input(KEY_RELEASE_EVENT, code)?;
        }
        self.flush()
    }

    /// Save the whole screen as a PNG
    pub fn screenshot(&self, path: &Path) -> Result<()> {
        let reply = self
            .connection
            .get_image(
                ImageFormat::Z_PIXMAP,
                self.screen.root,
                0,
                0,
                self.screen_width,
                self.screen_height,
                u32::MAX,
            )
            .map_err(|e| AppError::CursorControl(format!("Failed to request screen image: {e}")))?
            .reply()
            .map_err(|e| AppError::CursorControl(format!("Failed to read screen image: {e}")))?;

        let (w, h) = (u32::from(self.screen_width), u32::from(self.screen_height));
        let rgb = bgrx_to_rgb(&reply.data, w, h)
            .ok_or_else(|| AppError::CursorControl(format!("Unexpected image depth {}", reply.depth)))?;
        let image = image::RgbImage::from_raw(w, h, rgb)
            .ok_or_else(|| AppError::CursorControl("Screen image buffer too small".to_string()))?;
        image.save(path)?;

        info!("Screenshot saved to {}", path.display());
        Ok(())
    }
}

impl Pointer for CursorController {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        let clamp = |v: i32| i16::try_from(v.clamp(0, i32::from(i16::MAX))).unwrap_or(i16::MAX);
        self.set_position(clamp(x), clamp(y))
    }

    fn click(&mut self) -> Result<()> {
        CursorController::click(self)
    }

    fn double_click(&mut self) -> Result<()> {
        CursorController::double_click(self)
    }

    fn scroll(&mut self, clicks: u32, up: bool) -> Result<()> {
        CursorController::scroll(self, clicks, up)
    }
}

/// Find the first keycode whose mapping row contains `sym`
#[must_use]
pub fn find_keycode(keysyms: &[Keysym], per_keycode: u8, min_keycode: Keycode, sym: Keysym) -> Option<Keycode> {
    if per_keycode == 0 {
        return None;
    }
    keysyms
        .chunks(usize::from(per_keycode))
        .position(|row| row.contains(&sym))
        .and_then(|row| u8::try_from(row).ok())
        .and_then(|row| min_keycode.checked_add(row))
}

/// Convert a 32-bit-per-pixel BGRX buffer into packed RGB
#[must_use]
pub fn bgrx_to_rgb(data: &[u8], width: u32, height: u32) -> Option<Vec<u8>> {
    let pixels = (width as usize).checked_mul(height as usize)?;
    if data.len() < pixels.checked_mul(4)? {
        return None;
    }
    let mut rgb = Vec::with_capacity(pixels * 3);
    for px in data.chunks_exact(4).take(pixels) {
        rgb.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    Some(rgb)
}
