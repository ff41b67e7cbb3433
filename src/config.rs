use crate::error::ConfigError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Scrybe backend base URL.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Bearer token for the backend (also settable via `SCRYBE_API_TOKEN`).
    #[serde(default)]
    pub api_token: Option<String>,

    /// Hosted transcription endpoint the raw audio is uploaded to.
    #[serde(default = "default_transcription_url")]
    pub transcription_url: String,

    /// Token for the transcription endpoint (`SCRYBE_TRANSCRIPTION_TOKEN`).
    #[serde(default)]
    pub transcription_token: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_ai_name")]
    pub default_ai_name: String,

    #[serde(default = "default_genre")]
    pub default_genre: String,
}

fn default_backend_url() -> String {
    "http://localhost:8000".into()
}

fn default_transcription_url() -> String {
    "https://api-inference.huggingface.co/models/openai/whisper-large-v3".into()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_ai_name() -> String {
    "Orion".into()
}

fn default_genre() -> String {
    "Mystery".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_ai_name: default_ai_name(),
            default_genre: default_genre(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            backend_url: default_backend_url(),
            api_token: None,
            transcription_url: default_transcription_url(),
            transcription_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Loads config.toml from the platform config dir, writing a default
    /// file on first run. Environment variables override stored tokens.
    pub fn load_or_init() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("", "", "scrybe").ok_or(ConfigError::NoConfigDir)?;
        let config_path = dirs.config_dir().join("config.toml");
        Self::load_or_init_at(&config_path)
    }

    pub fn load_or_init_at(config_path: &Path) -> Result<Self, ConfigError> {
        let mut config = if config_path.exists() {
            let raw = std::fs::read_to_string(config_path)?;
            toml::from_str(&raw).map_err(|e| ConfigError::Load(e.to_string()))?
        } else {
            let config = Self::default();
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let raw = toml::to_string_pretty(&config)
                .map_err(|e| ConfigError::Load(e.to_string()))?;
            std::fs::write(config_path, raw)?;
            config
        };

        config.config_path = config_path.to_path_buf();
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SCRYBE_BACKEND_URL") {
            if !url.is_empty() {
                self.backend_url = url;
            }
        }
        if let Ok(token) = std::env::var("SCRYBE_API_TOKEN") {
            if !token.is_empty() {
                self.api_token = Some(token);
            }
        }
        if let Ok(token) = std::env::var("SCRYBE_TRANSCRIPTION_TOKEN") {
            if !token.is_empty() {
                self.transcription_token = Some(token);
            }
        }
    }
}
