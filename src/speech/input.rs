//! Single-capture speech input wrapper
//!
//! Wraps an optional [`RecognitionBackend`]. At most one capture runs at a
//! time; results from a capture that was stopped or superseded are dropped.

use super::command::CommandRecognizer;
use crate::config::SpeechConfig;
use crate::Result;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Error text reported when no backend is available
pub const UNSUPPORTED_MESSAGE: &str = "speech recognition is not supported";

type Handler = Box<dyn FnOnce(String) + Send>;

/// Value of the active-capture slot when nothing is listening
const IDLE: u64 = 0;

/// Events a backend reports for one capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// A recognized utterance
    Result(String),
    /// Platform error identifier
    Error(String),
    /// Capture ended (with or without a result)
    End,
}

/// Platform speech recognizer
pub trait RecognitionBackend: Send {
    /// Begin one capture; report through `sink` from any thread
    fn begin(&mut self, config: &SpeechConfig, sink: RecognitionSink) -> Result<()>;

    /// Abort the running capture, if any
    fn abort(&mut self);
}

#[derive(Default)]
struct Handlers {
    on_result: Option<Handler>,
    on_error: Option<Handler>,
}

/// One-shot delivery handle given to a backend for a single capture
#[derive(Clone)]
pub struct RecognitionSink {
    handlers: Arc<Mutex<Handlers>>,
    active: Arc<AtomicU64>,
    generation: u64,
}

impl RecognitionSink {
    /// Whether this capture is still the active one
    pub fn is_current(&self) -> bool {
        self.active.load(Ordering::SeqCst) == self.generation
    }

    pub fn deliver(&self, event: RecognitionEvent) {
        // only the active capture may end listening
        if self
            .active
            .compare_exchange(self.generation, IDLE, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(generation = self.generation, "dropping event from stale capture");
            return;
        }

        let mut handlers = self.handlers.lock();
        let (handler, payload) = match event {
            RecognitionEvent::Result(text) => (handlers.on_result.take(), Some(text)),
            RecognitionEvent::Error(error) => (handlers.on_error.take(), Some(error)),
            RecognitionEvent::End => (None, None),
        };
        handlers.on_result = None;
        handlers.on_error = None;
        drop(handlers);

        if let (Some(handler), Some(payload)) = (handler, payload) {
            handler(payload);
        }
    }
}

/// Speech input with a fixed non-continuous, final-results-only mode
pub struct SpeechInput {
    config: SpeechConfig,
    backend: Option<Box<dyn RecognitionBackend>>,
    /// Generation of the running capture, or [`IDLE`]
    active: Arc<AtomicU64>,
    generation: u64,
}

impl SpeechInput {
    pub fn new(config: SpeechConfig, backend: Option<Box<dyn RecognitionBackend>>) -> Self {
        let config = SpeechConfig {
            continuous: false,
            interim_results: false,
            ..config
        };

        Self {
            config,
            backend,
            active: Arc::new(AtomicU64::new(IDLE)),
            generation: IDLE,
        }
    }

    /// Build the wrapper from configuration; no command means unsupported
    pub fn from_config(config: &SpeechConfig) -> Self {
        let backend = config.command.clone().filter(|argv| !argv.is_empty()).map(|argv| {
            info!(program = %argv[0], "voice input via external command");
            Box::new(CommandRecognizer::new(argv)) as Box<dyn RecognitionBackend>
        });
        Self::new(config.clone(), backend)
    }

    pub fn unsupported() -> Self {
        Self::new(SpeechConfig::default(), None)
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    pub fn is_supported(&self) -> bool {
        self.backend.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.active.load(Ordering::SeqCst) != IDLE
    }

    /// Start a capture
    ///
    /// Reports [`UNSUPPORTED_MESSAGE`] through `on_error` when there is no
    /// backend. Does nothing while a capture is already running.
    pub fn start<R, E>(&mut self, on_result: R, on_error: E)
    where
        R: FnOnce(String) + Send + 'static,
        E: FnOnce(String) + Send + 'static,
    {
        let Some(backend) = self.backend.as_mut() else {
            on_error(UNSUPPORTED_MESSAGE.to_string());
            return;
        };

        if self.active.load(Ordering::SeqCst) != IDLE {
            debug!("capture already running, ignoring start");
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let sink = RecognitionSink {
            handlers: Arc::new(Mutex::new(Handlers {
                on_result: Some(Box::new(on_result)),
                on_error: Some(Box::new(on_error)),
            })),
            active: Arc::clone(&self.active),
            generation,
        };

        self.active.store(generation, Ordering::SeqCst);
        debug!(generation, locale = %self.config.locale, "speech capture started");

        if let Err(e) = backend.begin(&self.config, sink.clone()) {
            sink.deliver(RecognitionEvent::Error(e.to_string()));
        }
    }

    /// Cancel the running capture; no-op when idle
    pub fn stop(&mut self) {
        if self.active.swap(IDLE, Ordering::SeqCst) == IDLE {
            return;
        }
        if let Some(backend) = self.backend.as_mut() {
            backend.abort();
        }
        debug!("speech capture stopped");
    }
}

impl Drop for SpeechInput {
    fn drop(&mut self) {
        self.stop();
    }
}
