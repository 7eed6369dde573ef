//! Speech engines.
//!
//! Both directions shell out to external programs: the synthesizer blocks
//! until the utterance has been spoken, the recognizer waits for one phrase
//! and reads its transcript from stdout.

use crate::error::{AppError, Result};
use log::{debug, warn};
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Turns text into audible speech
pub trait SpeechSynthesizer: Send {
    /// Speak `text`, returning once it has been said
    fn say(&mut self, text: &str) -> Result<()>;
}

/// Turns one spoken phrase into text
pub trait SpeechRecognizer: Send {
    /// Listen for a phrase; `Ok(None)` when nothing intelligible was heard
    fn listen(&mut self, timeout: Duration, phrase_limit: Duration) -> Result<Option<String>>;
}

/// Speaks through an external program such as `espeak`
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
}

impl CommandSynthesizer {
    #[must_use]
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn say(&mut self, text: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|e| AppError::Speech(format!("Failed to run {}: {e}", self.program)))?;
        if status.success() {
            Ok(())
        } else {
            Err(AppError::Speech(format!("{} exited with {status}", self.program)))
        }
    }
}

/// Recognizes speech through an external transcription program
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    #[must_use]
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }

    /// Arguments with `{timeout}` and `{phrase_limit}` filled in
    #[must_use]
    pub fn expand_args(&self, timeout: Duration, phrase_limit: Duration) -> Vec<String> {
        let timeout = format!("{}", timeout.as_secs_f64());
        let phrase_limit = format!("{}", phrase_limit.as_secs_f64());
        self.args
            .iter()
            .map(|arg| arg.replace("{timeout}", &timeout).replace("{phrase_limit}", &phrase_limit))
            .collect()
    }

    fn wait_with_deadline(child: &mut Child, deadline: Instant) -> Result<bool> {
        loop {
            if child.try_wait()?.is_some() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                // Best effort: the child may exit between try_wait and kill
                let _ = child.kill();
                let _ = child.wait();
                return Ok(false);
            }
            thread::sleep(Duration::from_millis(20));
        }
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn listen(&mut self, timeout: Duration, phrase_limit: Duration) -> Result<Option<String>> {
        debug!("Listening for command...");
        let mut child = Command::new(&self.program)
            .args(self.expand_args(timeout, phrase_limit))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AppError::Speech(format!("Failed to start {}: {e}", self.program)))?;

        if !Self::wait_with_deadline(&mut child, Instant::now() + timeout + phrase_limit)? {
            warn!("{} did not finish in time", self.program);
            return Ok(None);
        }

        let mut transcript = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            stdout.read_to_string(&mut transcript)?;
        }
        Ok(normalize_transcript(&transcript))
    }
}

/// Recognizer used when voice input is disabled
pub struct NullRecognizer;

impl SpeechRecognizer for NullRecognizer {
    fn listen(&mut self, timeout: Duration, _phrase_limit: Duration) -> Result<Option<String>> {
        thread::sleep(timeout.min(Duration::from_millis(100)));
        Ok(None)
    }
}

/// Lower-case, trimmed transcript; `None` when empty
#[must_use]
pub fn normalize_transcript(raw: &str) -> Option<String> {
    let text = raw.trim().to_lowercase();
    (!text.is_empty()).then_some(text)
}
