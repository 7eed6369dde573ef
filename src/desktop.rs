//! Operating-system primitives behind the voice commands.
//!
//! The router only sees [`DesktopActions`]; [`LinuxDesktop`] implements it
//! with child processes, `sysinfo` process lookup and the X11 cursor
//! controller.

use crate::{
    cursor_control::{CursorController, KeyChord},
    error::{AppError, Result},
};
use chrono::Local;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use sysinfo::System;

/// Mouse actions available by voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Click,
    DoubleClick,
    ScrollUp,
    ScrollDown,
}

/// Whole-system actions available by voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemAction {
    CloseWindow,
    Lock,
    Shutdown,
    Restart,
    Screenshot,
    VolumeUp,
    VolumeDown,
    Mute,
    ShowDesktop,
}

/// Cursor movement and clicks used by the frame loop
pub trait Pointer {
    /// Move the cursor to an absolute screen position
    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;

    /// Single left click at the current position
    fn click(&mut self) -> Result<()>;

    fn double_click(&mut self) -> Result<()>;

    /// Wheel `clicks` notches up or down
    fn scroll(&mut self, clicks: u32, up: bool) -> Result<()>;
}

/// Everything the voice router can ask of the desktop
pub trait DesktopActions: Send {
    /// Start a program or shell command
    fn launch(&mut self, path: &str) -> Result<()>;

    /// Kill the first process whose name matches; `Ok(false)` if none runs
    fn terminate_process(&mut self, name: &str) -> Result<bool>;

    /// Kill and relaunch the desktop shell process
    fn restart_shell(&mut self, name: &str) -> Result<()>;

    /// Open a URL in the default browser
    fn open_url(&mut self, url: &str) -> Result<()>;

    fn pointer(&mut self, action: PointerAction) -> Result<()>;

    fn system(&mut self, action: SystemAction) -> Result<()>;
}

/// True when a running process name refers to `app`
#[must_use]
pub fn process_matches(process_name: &str, app: &str) -> bool {
    let process_name = process_name.to_lowercase();
    let app = app.to_lowercase();
    process_name.contains(&app) || process_name.contains(&format!("{app}.exe"))
}

/// File name for a screenshot taken now
#[must_use]
pub fn screenshot_file_name() -> String {
    format!("screenshot_{}.png", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Linux desktop driven through X11 and child processes
pub struct LinuxDesktop {
    cursor: Option<CursorController>,
    shell_command: String,
    screenshot_dir: PathBuf,
    scroll_clicks: u32,
}

impl LinuxDesktop {
    /// Create a desktop adapter; works without X11 but pointer and key
    /// actions then fail with `CursorControl`
    #[must_use]
    pub fn new(shell_command: String, screenshot_dir: PathBuf, scroll_clicks: u32) -> Self {
        let cursor = match CursorController::new() {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("Voice desktop actions without X11: {}", e);
                None
            }
        };
        Self {
            cursor,
            shell_command,
            screenshot_dir,
            scroll_clicks,
        }
    }

    fn cursor(&self) -> Result<&CursorController> {
        self.cursor
            .as_ref()
            .ok_or_else(|| AppError::CursorControl("X11 display not available".to_string()))
    }

    fn run(program: &str, args: &[&str]) -> Result<()> {
        debug!("Running {} {:?}", program, args);
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| AppError::Desktop(format!("Failed to run {program}: {e}")))?;
        if status.success() {
            Ok(())
        } else {
            Err(AppError::Desktop(format!("{program} exited with {status}")))
        }
    }

    fn spawn_detached(program: &str, args: &[&str]) -> Result<()> {
        Self::spawn_reaped(program, args).map(|_| ())
    }

    /// Start `program` without waiting for it; a background thread collects
    /// its exit status so it never lingers as a zombie
    fn spawn_reaped(program: &str, args: &[&str]) -> Result<JoinHandle<Option<ExitStatus>>> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AppError::Desktop(format!("Failed to start {program}: {e}")))?;

        let name = program.to_string();
        thread::Builder::new()
            .name("reaper".to_string())
            .spawn(move || match child.wait() {
                Ok(status) => {
                    debug!("{} exited with {}", name, status);
                    Some(status)
                }
                Err(e) => {
                    warn!("Failed to wait for {}: {}", name, e);
                    None
                }
            })
            .map_err(|e| AppError::Desktop(format!("Failed to watch {program}: {e}")))
    }
}

impl DesktopActions for LinuxDesktop {
    fn launch(&mut self, path: &str) -> Result<()> {
        info!("Launching {}", path);
        // Table entries may be shell snippets ("start ...", pipelines, args)
        if path.starts_with("start ") || path.contains(' ') {
            Self::spawn_detached("sh", &["-c", path])
        } else {
            Self::spawn_detached(path, &[])
        }
    }

    fn terminate_process(&mut self, name: &str) -> Result<bool> {
        let mut system = System::new();
        system.refresh_processes();

        let found = system
            .processes()
            .values()
            .find(|process| process_matches(process.name(), name));

        match found {
            Some(process) => {
                info!("Killing {} (pid {})", process.name(), process.pid());
                if process.kill() {
                    Ok(true)
                } else {
                    Err(AppError::Desktop(format!("Could not kill {}", process.name())))
                }
            }
            None => Ok(false),
        }
    }

    fn restart_shell(&mut self, name: &str) -> Result<()> {
        info!("Restarting shell process {}", name);
        if !self.terminate_process(name)? {
            debug!("{} was not running", name);
        }
        let shell_command = self.shell_command.clone();
        self.launch(&shell_command)
    }

    fn open_url(&mut self, url: &str) -> Result<()> {
        info!("Opening {}", url);
        Self::spawn_detached("xdg-open", &[url])
    }

    fn pointer(&mut self, action: PointerAction) -> Result<()> {
        let cursor = self.cursor()?;
        match action {
            PointerAction::Click => cursor.click(),
            PointerAction::DoubleClick => cursor.double_click(),
            PointerAction::ScrollUp => cursor.scroll(self.scroll_clicks, true),
            PointerAction::ScrollDown => cursor.scroll(self.scroll_clicks, false),
        }
    }

    fn system(&mut self, action: SystemAction) -> Result<()> {
        match action {
            SystemAction::CloseWindow => self.cursor()?.press_chord(KeyChord::CloseWindow),
            SystemAction::ShowDesktop => self.cursor()?.press_chord(KeyChord::ShowDesktop),
            SystemAction::VolumeUp => self.cursor()?.press_chord(KeyChord::VolumeUp),
            SystemAction::VolumeDown => self.cursor()?.press_chord(KeyChord::VolumeDown),
            SystemAction::Mute => self.cursor()?.press_chord(KeyChord::Mute),
            SystemAction::Lock => Self::run("loginctl", &["lock-session"]),
            SystemAction::Shutdown => Self::run("systemctl", &["poweroff"]),
            SystemAction::Restart => Self::run("systemctl", &["reboot"]),
            SystemAction::Screenshot => {
                let path = self.screenshot_dir.join(screenshot_file_name());
                self.cursor()?.screenshot(&path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_children_are_reaped() {
        for _ in 0..3 {
            let status = LinuxDesktop::spawn_reaped("true", &[]).unwrap().join().unwrap();
            assert!(status.is_some_and(|s| s.success()));
        }
    }

    #[test]
    fn test_spawn_missing_program_fails() {
        assert!(matches!(
            LinuxDesktop::spawn_detached("no-such-program-head-voice-mouse", &[]),
            Err(AppError::Desktop(_))
        ));
    }

    #[test]
    fn test_process_matches() {
        assert!(process_matches("chrome", "chrome"));
        assert!(process_matches("Google-Chrome", "chrome"));
        assert!(process_matches("notepad.exe", "notepad"));
        assert!(!process_matches("bash", "chrome"));
    }

    #[test]
    fn test_screenshot_file_name() {
        let name = screenshot_file_name();
        assert!(name.starts_with("screenshot_"));
        assert!(name.ends_with(".png"));
        // screenshot_YYYYmmdd_HHMMSS.png
        assert_eq!(name.len(), "screenshot_".len() + 15 + ".png".len());
    }
}
