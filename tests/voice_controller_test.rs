//! Voice thread: speech queue, listening and meta commands

mod test_helpers;

use head_voice_mouse::{
    config::Config,
    state::{ShutdownSignal, VoiceActivation},
    voice::{router::CommandRouter, SpeechQueue, VoiceController, VoiceSettings},
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use test_helpers::*;

fn fast_settings() -> VoiceSettings {
    VoiceSettings {
        listen_timeout: Duration::from_millis(10),
        phrase_limit: Duration::from_millis(10),
        quit_grace: Duration::from_millis(10),
        idle_poll: Duration::from_millis(5),
    }
}

struct Fixture {
    controller: VoiceController,
    activation: Arc<VoiceActivation>,
    shutdown: ShutdownSignal,
    spoken: CallLog,
    calls: CallLog,
    listens: Arc<Mutex<usize>>,
    speaker: head_voice_mouse::voice::Speaker,
}

fn fixture(active: bool, script: &[&str]) -> Fixture {
    let activation = Arc::new(VoiceActivation::new(active));
    let shutdown = ShutdownSignal::new();
    let queue = SpeechQueue::new();
    let speaker = queue.speaker();
    let spoken = new_log();
    let calls = new_log();
    let recognizer = ScriptedRecognizer::new(script);
    let listens = Arc::clone(&recognizer.listens);
    let config = Config::default();

    let router = CommandRouter::new(
        config.apps.clone(),
        config.voice.shell_process.clone(),
        config.voice.search_url.clone(),
        Box::new(RecordingDesktop::new(calls.clone())),
        queue.speaker(),
    );
    let controller = VoiceController::new(
        fast_settings(),
        Arc::clone(&activation),
        shutdown.clone(),
        queue,
        Box::new(RecordingSynthesizer { spoken: spoken.clone() }),
        Box::new(recognizer),
        router,
    );

    Fixture {
        controller,
        activation,
        shutdown,
        spoken,
        calls,
        listens,
        speaker,
    }
}

#[test]
fn test_queued_speech_is_spoken_in_order() {
    let mut f = fixture(false, &[]);
    f.speaker.speak("one");
    f.speaker.speak("two");
    f.controller.step();
    f.controller.step();
    assert_eq!(entries(&f.spoken), vec!["one", "two"]);
}

#[test]
fn test_inactive_never_listens() {
    let mut f = fixture(false, &["open chrome"]);
    for _ in 0..5 {
        f.controller.step();
    }
    assert_eq!(*f.listens.lock().unwrap(), 0);
    assert!(entries(&f.calls).is_empty());
}

#[test]
fn test_speech_comes_before_listening() {
    let mut f = fixture(true, &["open chrome"]);
    f.speaker.speak("hello");
    f.controller.step();
    assert_eq!(*f.listens.lock().unwrap(), 0);
    assert_eq!(entries(&f.spoken), vec!["hello"]);
}

#[test]
fn test_active_command_is_routed_and_answered() {
    let mut f = fixture(true, &["open chrome"]);
    f.controller.step();
    assert_eq!(entries(&f.calls), vec!["launch google-chrome"]);

    // The feedback is queued, then spoken on the next step
    f.controller.step();
    assert_eq!(entries(&f.spoken), vec!["Opening chrome"]);
}

#[test]
fn test_nothing_heard_is_retried() {
    let mut f = fixture(true, &[]);
    f.controller.step();
    f.controller.step();
    assert_eq!(*f.listens.lock().unwrap(), 2);
    assert!(entries(&f.spoken).is_empty());
}

#[test]
fn test_exit_voice_clears_activation() {
    let mut f = fixture(true, &[]);
    f.controller.handle_heard("stop listening");
    assert!(!f.activation.is_active());
    f.controller.step();
    assert_eq!(entries(&f.spoken), vec!["Voice mode deactivated."]);
    assert!(entries(&f.calls).is_empty());
}

#[test]
fn test_quit_flushes_speech_and_requests_shutdown() {
    let mut f = fixture(true, &[]);
    f.speaker.speak("pending");
    f.controller.handle_heard("quit assistant");
    assert!(f.shutdown.is_requested());
    assert_eq!(entries(&f.spoken), vec!["pending", "Shutting down assistant."]);
}

#[test]
fn test_thread_runs_until_voice_quit() {
    let f = fixture(true, &["what time is it", "quit assistant"]);
    let spoken = f.spoken.clone();
    let shutdown = f.shutdown.clone();

    let handle = f.controller.spawn().unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !shutdown.is_requested() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    handle.join().unwrap();

    assert!(shutdown.is_requested());
    let spoken = entries(&spoken);
    assert_eq!(spoken.first().map(String::as_str), Some("Voice assistant thread started."));
    assert!(spoken.iter().any(|s| s.starts_with("The time is ")));
    assert_eq!(spoken.last().map(String::as_str), Some("Shutting down assistant."));
}

#[test]
fn test_external_shutdown_stops_thread() {
    let f = fixture(false, &[]);
    let handle = f.controller.spawn().unwrap();
    f.shutdown.request();
    handle.join().unwrap();
}
