//! Executes parsed voice commands against the desktop.
//!
//! Every outcome is reported by queuing speech; failures are logged and
//! spoken, never returned.

use super::command::VoiceCommand;
use super::Speaker;
use crate::config::AppEntry;
use crate::constants::YOUTUBE_URL;
use crate::desktop::{DesktopActions, PointerAction, SystemAction};
use chrono::{Local, NaiveTime};
use log::{debug, warn};

/// Speakable 12-hour clock, e.g. `03:15 PM`
#[must_use]
pub fn format_clock(time: NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}

/// Form-encode a search query (`rust lifetimes` -> `rust+lifetimes`)
#[must_use]
pub fn encode_query(query: &str) -> String {
    url::form_urlencoded::byte_serialize(query.as_bytes()).collect()
}

/// Routes non-meta commands to desktop primitives
pub struct CommandRouter {
    apps: Vec<AppEntry>,
    shell_process: String,
    search_url: String,
    desktop: Box<dyn DesktopActions>,
    speaker: Speaker,
}

impl CommandRouter {
    #[must_use]
    pub fn new(
        apps: Vec<AppEntry>,
        shell_process: String,
        search_url: String,
        desktop: Box<dyn DesktopActions>,
        speaker: Speaker,
    ) -> Self {
        Self {
            apps,
            shell_process,
            search_url,
            desktop,
            speaker,
        }
    }

    /// The application table, in match order
    #[must_use]
    pub fn apps(&self) -> &[AppEntry] {
        &self.apps
    }

    /// Run one command. Meta commands are ignored here.
    pub fn execute(&mut self, command: &VoiceCommand) {
        debug!("Executing {:?}", command);
        match command {
            VoiceCommand::OpenApp(name) => self.open_app(name),
            VoiceCommand::CloseApp(name) => self.close_app(name),
            VoiceCommand::WebSearch(query) => {
                self.speaker.speak(format!("Searching Google for {query}"));
                let url = format!("{}{}", self.search_url, encode_query(query));
                if let Err(e) = self.desktop.open_url(&url) {
                    warn!("Search failed: {}", e);
                    self.speaker.speak("Failed to open the browser.");
                }
            }
            VoiceCommand::OpenYoutube => {
                self.speaker.speak("Opening YouTube");
                if let Err(e) = self.desktop.open_url(YOUTUBE_URL) {
                    warn!("Opening YouTube failed: {}", e);
                    self.speaker.speak("Failed to open the browser.");
                }
            }
            VoiceCommand::TellTime => {
                let now = format_clock(Local::now().time());
                self.speaker.speak(format!("The time is {now}"));
            }
            VoiceCommand::Pointer(action) => self.pointer(*action),
            VoiceCommand::System(action) => self.system(*action),
            VoiceCommand::ExitVoice | VoiceCommand::QuitAssistant => {
                debug!("Meta command {:?} reached the router", command);
            }
        }
    }

    fn open_app(&mut self, name: &str) {
        let Some(path) = self.apps.iter().find(|a| a.name == name).map(|a| a.path.clone()) else {
            self.speaker.speak(format!("I don't know how to open {name}"));
            return;
        };

        self.speaker.speak(format!("Opening {name}"));
        if let Err(e) = self.desktop.launch(&path) {
            warn!("Open error for {}: {}", name, e);
            self.speaker.speak(format!("Failed to open {name}"));
        }
    }

    fn close_app(&mut self, name: &str) {
        if name == self.shell_process {
            match self.desktop.restart_shell(name) {
                Ok(()) => self.speaker.speak(format!("Restarting {name}.")),
                Err(e) => {
                    warn!("Shell restart failed: {}", e);
                    self.speaker.speak(format!("Failed to restart {name}"));
                }
            }
            return;
        }

        match self.desktop.terminate_process(name) {
            Ok(true) => self.speaker.speak(format!("Closing {name}")),
            Ok(false) => self.speaker.speak(format!("{name} is not running.")),
            Err(e) => {
                warn!("Close error for {}: {}", name, e);
                self.speaker.speak(format!("Failed to close {name}"));
            }
        }
    }

    fn pointer(&mut self, action: PointerAction) {
        let done = match action {
            PointerAction::Click => "Clicked.",
            PointerAction::DoubleClick => "Double clicked.",
            PointerAction::ScrollUp => "Scrolled up.",
            PointerAction::ScrollDown => "Scrolled down.",
        };
        match self.desktop.pointer(action) {
            Ok(()) => self.speaker.speak(done),
            Err(e) => {
                warn!("Mouse action {:?} failed: {}", action, e);
                self.speaker.speak("Mouse action failed.");
            }
        }
    }

    fn system(&mut self, action: SystemAction) {
        // Power actions announce themselves before the system goes away
        let (before, after) = match action {
            SystemAction::CloseWindow => (None, "Window closed."),
            SystemAction::Lock => (Some("Locking the system."), ""),
            SystemAction::Shutdown => (Some("Shutting down."), ""),
            SystemAction::Restart => (Some("Restarting system."), ""),
            SystemAction::Screenshot => (None, "Screenshot saved."),
            SystemAction::VolumeUp => (None, "Volume up."),
            SystemAction::VolumeDown => (None, "Volume down."),
            SystemAction::Mute => (None, "Volume muted."),
            SystemAction::ShowDesktop => (None, "Showing desktop."),
        };

        if let Some(before) = before {
            self.speaker.speak(before);
        }
        match self.desktop.system(action) {
            Ok(()) if !after.is_empty() => self.speaker.speak(after),
            Ok(()) => {}
            Err(e) => {
                warn!("System action {:?} failed: {}", action, e);
                self.speaker.speak("System action failed.");
            }
        }
    }
}
