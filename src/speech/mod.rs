//! Voice input
//!
//! - **input**: the single-capture wrapper the UI talks to
//! - **command**: backend that runs an external speech-to-text program

pub mod command;
pub mod input;

pub use command::CommandRecognizer;
pub use input::{
    RecognitionBackend, RecognitionEvent, RecognitionSink, SpeechInput, UNSUPPORTED_MESSAGE,
};
