//! Voice assistant context.
//!
//! One background thread owns the speech engines. It speaks whatever the
//! rest of the program queued and, while voice mode is on, listens for one
//! command at a time. The frame loop never waits on it: [`Speaker::speak`]
//! only enqueues.

/// Command grammar
pub mod command;

/// Command execution
pub mod router;

/// Speech synthesis and recognition backends
pub mod speech;

use crate::{
    config::{seconds_or, VoiceConfig},
    constants::{DEFAULT_LISTEN_TIMEOUT, DEFAULT_PHRASE_TIME_LIMIT, DEFAULT_QUIT_GRACE, NOTHING_HEARD_SLEEP_MS},
    error::{AppError, Result},
    state::{ShutdownSignal, VoiceActivation},
};
use command::{parse_command, VoiceCommand};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use router::CommandRouter;
use speech::{SpeechRecognizer, SpeechSynthesizer};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Non-blocking handle for queuing speech
#[derive(Debug, Clone)]
pub struct Speaker {
    tx: Sender<String>,
}

impl Speaker {
    /// Queue text to be spoken by the voice thread
    pub fn speak(&self, text: impl Into<String>) {
        let text = text.into();
        info!("Assistant (queued): {}", text);
        if self.tx.send(text).is_err() {
            debug!("Speech queue closed, dropping utterance");
        }
    }
}

/// The speech FIFO. Unbounded: producers never block, and the queue only
/// grows if speech is requested faster than it can be said.
pub struct SpeechQueue {
    speaker: Speaker,
    rx: Receiver<String>,
}

impl SpeechQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            speaker: Speaker { tx },
            rx,
        }
    }

    #[must_use]
    pub fn speaker(&self) -> Speaker {
        self.speaker.clone()
    }

    /// Receiving end, for consumers other than the voice thread
    #[must_use]
    pub fn receiver(&self) -> Receiver<String> {
        self.rx.clone()
    }
}

impl Default for SpeechQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Timing of the voice loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSettings {
    pub listen_timeout: Duration,
    pub phrase_limit: Duration,
    pub quit_grace: Duration,
    pub idle_poll: Duration,
}

impl From<&VoiceConfig> for VoiceSettings {
    fn from(config: &VoiceConfig) -> Self {
        Self {
            listen_timeout: seconds_or(config.listen_timeout, DEFAULT_LISTEN_TIMEOUT),
            phrase_limit: seconds_or(config.phrase_time_limit, DEFAULT_PHRASE_TIME_LIMIT),
            quit_grace: seconds_or(config.quit_grace, DEFAULT_QUIT_GRACE),
            idle_poll: Duration::from_millis(config.idle_poll_ms),
        }
    }
}

/// Background voice context
pub struct VoiceController {
    settings: VoiceSettings,
    activation: Arc<VoiceActivation>,
    shutdown: ShutdownSignal,
    queue: SpeechQueue,
    synthesizer: Box<dyn SpeechSynthesizer>,
    recognizer: Box<dyn SpeechRecognizer>,
    router: CommandRouter,
}

impl VoiceController {
    #[must_use]
    pub fn new(
        settings: VoiceSettings,
        activation: Arc<VoiceActivation>,
        shutdown: ShutdownSignal,
        queue: SpeechQueue,
        synthesizer: Box<dyn SpeechSynthesizer>,
        recognizer: Box<dyn SpeechRecognizer>,
        router: CommandRouter,
    ) -> Self {
        Self {
            settings,
            activation,
            shutdown,
            queue,
            synthesizer,
            recognizer,
            router,
        }
    }

    /// Start the voice thread
    pub fn spawn(self) -> Result<VoiceHandle> {
        let speaker = self.queue.speaker();
        let thread = thread::Builder::new()
            .name("voice".to_string())
            .spawn(move || self.run())?;
        Ok(VoiceHandle { speaker, thread })
    }

    fn run(mut self) {
        info!("Voice assistant thread started");
        self.queue.speaker.speak("Voice assistant thread started.");

        while !self.shutdown.is_requested() {
            self.step();
        }

        info!("Voice assistant thread stopped");
    }

    /// One loop iteration: speak one queued utterance, or listen once
    pub fn step(&mut self) {
        if let Ok(text) = self.queue.rx.try_recv() {
            self.say(&text);
            return;
        }

        if !self.activation.is_active() {
            match self.queue.rx.recv_timeout(self.settings.idle_poll) {
                Ok(text) => self.say(&text),
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {}
            }
            return;
        }

        match self
            .recognizer
            .listen(self.settings.listen_timeout, self.settings.phrase_limit)
        {
            Ok(Some(text)) => self.handle_heard(&text),
            Ok(None) => thread::sleep(Duration::from_millis(NOTHING_HEARD_SLEEP_MS)),
            Err(e) => {
                warn!("Voice recognition error: {}", e);
                thread::sleep(Duration::from_millis(NOTHING_HEARD_SLEEP_MS));
            }
        }
    }

    /// Act on one recognized phrase
    pub fn handle_heard(&mut self, text: &str) {
        info!("You said: {}", text);
        match parse_command(text, self.router.apps()) {
            Some(VoiceCommand::ExitVoice) => {
                self.activation.set_active(false);
                self.queue.speaker.speak("Voice mode deactivated.");
            }
            Some(VoiceCommand::QuitAssistant) => self.quit(),
            Some(command) => self.router.execute(&command),
            None => debug!("No command matched '{}'", text),
        }
    }

    fn quit(&mut self) {
        self.queue.speaker.speak("Shutting down assistant.");
        while let Ok(text) = self.queue.rx.try_recv() {
            self.say(&text);
        }
        thread::sleep(self.settings.quit_grace);
        info!("Shutdown requested by voice");
        self.shutdown.request();
    }

    fn say(&mut self, text: &str) {
        debug!("Assistant (speaking): {}", text);
        if let Err(e) = self.synthesizer.say(text) {
            warn!("Speech synthesis error: {}", e);
        }
    }
}

/// Running voice thread
pub struct VoiceHandle {
    speaker: Speaker,
    thread: JoinHandle<()>,
}

impl VoiceHandle {
    #[must_use]
    pub fn speaker(&self) -> Speaker {
        self.speaker.clone()
    }

    /// Wait for the thread to finish (after shutdown was requested)
    pub fn join(self) -> Result<()> {
        self.thread
            .join()
            .map_err(|_| AppError::Speech("Voice thread panicked".to_string()))
    }
}
