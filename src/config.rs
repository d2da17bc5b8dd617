//! Application configuration
//!
//! Loaded from a TOML file; every field has a default so a missing file
//! yields a working configuration.

use crate::{DisolError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "DISOL_CONFIG";

/// Remote endpoint URLs, one per gateway capability
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub auth_url: String,
    pub chat_url: String,
    pub generate_url: String,
    pub projects_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            auth_url: "https://functions.poehali.dev/38c2fe06-0fb3-43ee-bc43-c466aecb16f4"
                .to_string(),
            chat_url: "https://functions.poehali.dev/655f6f08-9a5d-4dd9-954d-e2b46e0685b6"
                .to_string(),
            generate_url: "https://functions.poehali.dev/0925db52-3515-4beb-9169-a522581e1976"
                .to_string(),
            projects_url: "https://functions.poehali.dev/20e501af-5b76-411d-93a6-47d8fd5aaef6"
                .to_string(),
        }
    }
}

impl GatewayConfig {
    /// Point every endpoint at one base URL (`{base}/auth`, `{base}/chat`, ...)
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{base}/auth"),
            chat_url: format!("{base}/chat"),
            generate_url: format!("{base}/generate"),
            projects_url: format!("{base}/projects"),
        }
    }

    fn urls(&self) -> [(&'static str, &str); 4] {
        [
            ("auth_url", &self.auth_url),
            ("chat_url", &self.chat_url),
            ("generate_url", &self.generate_url),
            ("projects_url", &self.projects_url),
        ]
    }
}

/// Speech recognition settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Recognition locale
    pub locale: String,

    /// Keep listening after the first utterance (always off in this client)
    pub continuous: bool,

    /// Report partial results (always off in this client)
    pub interim_results: bool,

    /// External speech-to-text command; `None` means voice input is unsupported
    pub command: Option<Vec<String>>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: "ru-RU".to_string(),
            continuous: false,
            interim_results: false,
            command: None,
        }
    }
}

/// Local storage settings
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the durable session entries
    pub dir: Option<PathBuf>,
}

/// Top-level configuration
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub speech: SpeechConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load from `$DISOL_CONFIG` or the platform config directory
    pub fn load_default() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|dir| dir.join("disol").join("config.toml")));

        match path {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load a configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| DisolError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml(&content)
            .map_err(|e| DisolError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| DisolError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Directory holding `session.json` and `auth_token`
    pub fn storage_dir(&self) -> PathBuf {
        self.storage
            .dir
            .clone()
            .or_else(|| dirs::config_dir().map(|dir| dir.join("disol")))
            .unwrap_or_else(|| PathBuf::from(".disol"))
    }

    /// Set the gateway endpoints
    pub fn with_gateway(mut self, gateway: GatewayConfig) -> Self {
        self.gateway = gateway;
        self
    }

    /// Set the storage directory
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage.dir = Some(dir.into());
        self
    }

    /// Set the external speech-to-text command
    pub fn with_speech_command(mut self, argv: Vec<String>) -> Self {
        self.speech.command = Some(argv);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, url) in self.gateway.urls() {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(DisolError::Config(format!(
                    "gateway.{name} must be an http(s) URL, got {url:?}"
                )));
            }
        }

        if let Some(command) = &self.speech.command {
            if command.first().map_or(true, |program| program.trim().is_empty()) {
                return Err(DisolError::Config(
                    "speech.command must name a program".to_string(),
                ));
            }
        }

        if self.speech.locale.trim().is_empty() {
            return Err(DisolError::Config("speech.locale is empty".to_string()));
        }

        Ok(())
    }
}
