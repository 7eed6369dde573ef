//! Spoken command grammar.
//!
//! Recognized text is lower-cased and matched by substring, in a fixed order;
//! the first rule that matches decides the command. Meta commands (leaving
//! voice mode, quitting) come before everything else.

use crate::config::AppEntry;
use crate::desktop::{PointerAction, SystemAction};

const SEARCH_PREFIX: &str = "search google for";

/// A recognized command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCommand {
    /// Leave voice mode
    ExitVoice,
    /// Shut the whole assistant down
    QuitAssistant,
    /// Launch an application from the table
    OpenApp(String),
    /// Terminate an application from the table
    CloseApp(String),
    /// Google search for the query
    WebSearch(String),
    OpenYoutube,
    TellTime,
    Pointer(PointerAction),
    System(SystemAction),
}

impl VoiceCommand {
    /// Commands handled by the voice thread itself rather than the router
    #[must_use]
    pub const fn is_meta(&self) -> bool {
        matches!(self, Self::ExitVoice | Self::QuitAssistant)
    }
}

/// Fixed phrases in priority order
const POINTER_PHRASES: &[(&[&str], PointerAction)] = &[
    (&["double click", "double-click"], PointerAction::DoubleClick),
    (&["scroll up"], PointerAction::ScrollUp),
    (&["scroll down"], PointerAction::ScrollDown),
];

const SYSTEM_PHRASES: &[(&[&str], SystemAction)] = &[
    (&["close window"], SystemAction::CloseWindow),
    (&["lock"], SystemAction::Lock),
    (&["shutdown"], SystemAction::Shutdown),
    (&["restart"], SystemAction::Restart),
    (&["screenshot"], SystemAction::Screenshot),
    (&["volume up"], SystemAction::VolumeUp),
    (&["volume down"], SystemAction::VolumeDown),
    (&["mute"], SystemAction::Mute),
    (&["show desktop", "minimize all"], SystemAction::ShowDesktop),
];

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| text.contains(p))
}

fn find_app<'a>(text: &str, apps: &'a [AppEntry]) -> Option<&'a AppEntry> {
    apps.iter().find(|app| text.contains(app.name.as_str()))
}

/// Parse recognized speech into a command.
///
/// Returns `None` for anything the grammar does not cover.
#[must_use]
pub fn parse_command(text: &str, apps: &[AppEntry]) -> Option<VoiceCommand> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    if contains_any(&text, &["exit voice", "stop listening"]) {
        return Some(VoiceCommand::ExitVoice);
    }
    if contains_any(&text, &["quit assistant", "shutdown assistant"]) {
        return Some(VoiceCommand::QuitAssistant);
    }

    if text.contains("open") {
        if let Some(app) = find_app(&text, apps) {
            return Some(VoiceCommand::OpenApp(app.name.clone()));
        }
    }

    // "close" never falls through to later rules
    if text.contains("close") {
        if let Some(app) = find_app(&text, apps) {
            return Some(VoiceCommand::CloseApp(app.name.clone()));
        }
        if text.contains("window") {
            return Some(VoiceCommand::System(SystemAction::CloseWindow));
        }
        return None;
    }

    if let Some((_, query)) = text.split_once(SEARCH_PREFIX) {
        let query = query.trim();
        if !query.is_empty() {
            return Some(VoiceCommand::WebSearch(query.to_string()));
        }
    }

    if text.contains("youtube") && text.contains("open") {
        return Some(VoiceCommand::OpenYoutube);
    }

    if contains_any(&text, &["what time", "time is it"]) {
        return Some(VoiceCommand::TellTime);
    }

    if text.contains("click") && !text.contains("double") {
        return Some(VoiceCommand::Pointer(PointerAction::Click));
    }
    if let Some(&(_, action)) = POINTER_PHRASES.iter().find(|(phrases, _)| contains_any(&text, phrases)) {
        return Some(VoiceCommand::Pointer(action));
    }

    SYSTEM_PHRASES
        .iter()
        .find(|(phrases, _)| contains_any(&text, phrases))
        .map(|&(_, action)| VoiceCommand::System(action))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apps() -> Vec<AppEntry> {
        vec![
            AppEntry::new("chrome", "google-chrome"),
            AppEntry::new("notepad", "gedit"),
            AppEntry::new("explorer", "nautilus"),
        ]
    }

    #[test]
    fn test_meta_commands_win() {
        assert_eq!(parse_command("please stop listening", &apps()), Some(VoiceCommand::ExitVoice));
        assert_eq!(parse_command("Exit Voice", &apps()), Some(VoiceCommand::ExitVoice));
        assert_eq!(parse_command("shutdown assistant", &apps()), Some(VoiceCommand::QuitAssistant));
        assert!(VoiceCommand::QuitAssistant.is_meta());
    }

    #[test]
    fn test_open_and_close_apps() {
        assert_eq!(
            parse_command("open chrome", &apps()),
            Some(VoiceCommand::OpenApp("chrome".into()))
        );
        assert_eq!(
            parse_command("close notepad please", &apps()),
            Some(VoiceCommand::CloseApp("notepad".into()))
        );
        assert_eq!(
            parse_command("close the window", &apps()),
            Some(VoiceCommand::System(SystemAction::CloseWindow))
        );
        assert_eq!(parse_command("close everything", &apps()), None);
    }

    #[test]
    fn test_first_table_entry_wins() {
        assert_eq!(
            parse_command("open notepad and chrome", &apps()),
            Some(VoiceCommand::OpenApp("chrome".into()))
        );
    }

    #[test]
    fn test_search_and_info() {
        assert_eq!(
            parse_command("search google for rust lifetimes", &apps()),
            Some(VoiceCommand::WebSearch("rust lifetimes".into()))
        );
        assert_eq!(parse_command("search google for", &apps()), None);
        assert_eq!(parse_command("open youtube", &apps()), Some(VoiceCommand::OpenYoutube));
        assert_eq!(parse_command("what time is it", &apps()), Some(VoiceCommand::TellTime));
    }

    #[test]
    fn test_mouse_phrases() {
        assert_eq!(parse_command("click", &apps()), Some(VoiceCommand::Pointer(PointerAction::Click)));
        assert_eq!(
            parse_command("double click", &apps()),
            Some(VoiceCommand::Pointer(PointerAction::DoubleClick))
        );
        assert_eq!(
            parse_command("double-click that", &apps()),
            Some(VoiceCommand::Pointer(PointerAction::DoubleClick))
        );
        assert_eq!(
            parse_command("scroll down", &apps()),
            Some(VoiceCommand::Pointer(PointerAction::ScrollDown))
        );
    }

    #[test]
    fn test_system_phrases() {
        let cases = [
            ("lock the computer", SystemAction::Lock),
            ("shutdown", SystemAction::Shutdown),
            ("restart now", SystemAction::Restart),
            ("take a screenshot", SystemAction::Screenshot),
            ("volume up", SystemAction::VolumeUp),
            ("volume down", SystemAction::VolumeDown),
            ("mute", SystemAction::Mute),
            ("minimize all", SystemAction::ShowDesktop),
        ];
        for (text, action) in cases {
            assert_eq!(parse_command(text, &apps()), Some(VoiceCommand::System(action)), "{text}");
        }
    }

    #[test]
    fn test_unmatched_is_dropped() {
        assert_eq!(parse_command("", &apps()), None);
        assert_eq!(parse_command("   ", &apps()), None);
        assert_eq!(parse_command("tell me a joke", &apps()), None);
    }
}
