//! Studio Shot Configuration Module
//!
//! Manages persistent configuration for the API key and defaults.
//! Config is stored in `~/.config/studio-shot/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`GEMINI_API_KEY`, `GOOGLE_API_KEY`, `STUDIO_SHOT_*`)
//! 2. Config file (`~/.config/studio-shot/config.toml`)
//! 3. Defaults

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, StudioError};
use crate::instruction::BackgroundOption;
use crate::util::{DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StudioConfig {
    /// API keys for remote transformers
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Default transformer and option settings
    #[serde(default)]
    pub defaults: Defaults,
}

/// API keys configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApiKeys {
    /// Google Gemini API key
    pub gemini: Option<String>,
}

/// Default settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Defaults {
    /// Default transformer (gemini, mock)
    pub transformer: Option<String>,

    /// Image model identifier
    pub model: Option<String>,

    /// API base URL
    pub endpoint: Option<String>,

    /// Background option preselected for new sessions
    pub background: Option<BackgroundOption>,
}

impl StudioConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/studio-shot/` on Unix, `%APPDATA%/studio-shot/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("studio-shot")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns error if the file exists but is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| StudioError::ConfigError {
            reason: format!("Failed to read config file: {}", e),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| StudioError::ConfigError {
            reason: format!("Failed to parse config file: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| StudioError::ConfigError {
                    reason: format!("Failed to create config directory: {}", e),
                })?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| StudioError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| StudioError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })?;

        Ok(())
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    pub fn with_env(mut self) -> Self {
        let key = env_non_empty("GEMINI_API_KEY").or_else(|| env_non_empty("GOOGLE_API_KEY"));
        if key.is_some() {
            self.api_keys.gemini = key;
        }

        if let Some(model) = env_non_empty("STUDIO_SHOT_MODEL") {
            self.defaults.model = Some(model);
        }

        if let Some(endpoint) = env_non_empty("STUDIO_SHOT_ENDPOINT") {
            self.defaults.endpoint = Some(endpoint);
        }

        self
    }

    /// Check the endpoint is an absolute http(s) URL
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.defaults.endpoint {
            let url = Url::parse(endpoint).map_err(|e| StudioError::ConfigError {
                reason: format!("Invalid endpoint '{}': {}", endpoint, e),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(StudioError::ConfigError {
                    reason: format!("Endpoint must use http or https, got '{}'", url.scheme()),
                });
            }
        }
        Ok(())
    }

    pub fn gemini_key(&self) -> Option<&str> {
        self.api_keys.gemini.as_deref()
    }

    /// Default transformer (or auto-detect from available keys)
    ///
    /// `None` when nothing is configured; the mock is never picked implicitly.
    pub fn transformer(&self) -> Option<&str> {
        self.defaults
            .transformer
            .as_deref()
            .or_else(|| self.api_keys.gemini.as_ref().map(|_| "gemini"))
    }

    pub fn model(&self) -> &str {
        self.defaults.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    pub fn endpoint(&self) -> &str {
        self.defaults
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_GEMINI_ENDPOINT)
            .trim_end_matches('/')
    }

    pub fn background(&self) -> BackgroundOption {
        self.defaults.background.unwrap_or_default()
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Mask an API key for display
///
/// Shows first N chars + asterisks, e.g. "AIzaSy***"
pub fn mask_api_key(key: &str, visible_chars: usize) -> String {
    if key.is_empty() {
        return String::new();
    }

    let visible = key
        .char_indices()
        .nth(visible_chars)
        .map(|(i, _)| i)
        .unwrap_or(key.len());
    format!("{}***", &key[..visible])
}
