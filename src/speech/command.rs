//! Speech backend that runs an external speech-to-text program
//!
//! The program records one utterance and prints the transcript on stdout.
//! The first non-empty line is the result; the process is killed after it.
//! The recognition locale is exported as `DISOL_SPEECH_LOCALE`.

use super::input::{RecognitionBackend, RecognitionEvent, RecognitionSink};
use crate::config::SpeechConfig;
use crate::{DisolError, Result};
use parking_lot::Mutex;
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use tracing::{debug, warn};

/// Environment variable carrying the locale to the child process
pub const LOCALE_ENV: &str = "DISOL_SPEECH_LOCALE";

/// Error identifier when the program exits without printing anything
pub const NO_SPEECH: &str = "no-speech";

type ChildSlot = Arc<Mutex<Option<Child>>>;

pub struct CommandRecognizer {
    argv: Vec<String>,
    running: Option<ChildSlot>,
}

impl CommandRecognizer {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            running: None,
        }
    }
}

impl RecognitionBackend for CommandRecognizer {
    fn begin(&mut self, config: &SpeechConfig, sink: RecognitionSink) -> Result<()> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| DisolError::Speech("no speech command configured".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .env(LOCALE_ENV, &config.locale)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| DisolError::Speech(format!("failed to start {program}: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DisolError::Speech("speech command has no stdout".to_string()))?;

        let slot: ChildSlot = Arc::new(Mutex::new(Some(child)));
        self.running = Some(Arc::clone(&slot));

        std::thread::Builder::new()
            .name("disol-speech".to_string())
            .spawn(move || read_utterance(stdout, slot, sink))
            .map_err(|e| DisolError::Speech(format!("failed to spawn speech reader: {e}")))?;

        Ok(())
    }

    fn abort(&mut self) {
        if let Some(slot) = self.running.take() {
            if let Some(child) = slot.lock().as_mut() {
                if let Err(e) = child.kill() {
                    debug!("speech command already exited: {}", e);
                }
            }
        }
    }
}

fn read_utterance(stdout: std::process::ChildStdout, slot: ChildSlot, sink: RecognitionSink) {
    let mut utterance = None;
    for line in BufReader::new(stdout).lines() {
        match line {
            Ok(line) if !line.trim().is_empty() => {
                utterance = Some(line.trim().to_string());
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!("failed to read speech command output: {}", e);
                break;
            }
        }
    }

    let child = slot.lock().take();
    let status = child.and_then(|mut child| {
        if utterance.is_some() {
            // single-shot mode: stop listening after the first utterance
            let _ = child.kill();
        }
        child.wait().ok()
    });

    let event = match (utterance, status) {
        (Some(text), _) => RecognitionEvent::Result(text),
        (None, Some(status)) if !status.success() => {
            RecognitionEvent::Error(format!("speech command failed: {}", status))
        }
        (None, _) => RecognitionEvent::Error(NO_SPEECH.to_string()),
    };
    sink.deliver(event);
    sink.deliver(RecognitionEvent::End);
}
