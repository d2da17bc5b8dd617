pub mod config;
pub mod gateway;
pub mod messages;
pub mod session;
pub mod speech;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DisolError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Channel error: {0}")]
    Channel(String),
}

impl From<std::io::Error> for DisolError {
    fn from(e: std::io::Error) -> Self {
        DisolError::Storage(e.to_string())
    }
}

impl From<reqwest::Error> for DisolError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            DisolError::Parse(e.to_string())
        } else {
            DisolError::Transport(e.to_string())
        }
    }
}

impl DisolError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The user can simply retry the action
            DisolError::Transport(_) => true,
            DisolError::Parse(_) => true,
            DisolError::Speech(_) => true,
            // Disk and config problems need user intervention
            DisolError::Storage(_) => false,
            DisolError::Config(_) => false,
            // The worker is gone
            DisolError::Channel(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            DisolError::Transport(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            DisolError::Parse(_) => {
                "The server sent an unexpected response. Please try again.".to_string()
            }
            DisolError::Storage(_) => "Could not save local session data.".to_string(),
            DisolError::Config(_) => "Configuration error. Please check settings.".to_string(),
            DisolError::Speech(_) => "Speech recognition failed. Please try again.".to_string(),
            DisolError::Channel(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DisolError>;
