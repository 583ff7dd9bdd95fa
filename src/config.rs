//! Configuration management for Uplevel
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from a YAML file, environment variables, and CLI
//! overrides.

use crate::cli::Cli;
use crate::error::{Result, UplevelError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Uplevel
///
/// Holds the relay server settings, the completion provider settings,
/// and the terminal client settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Relay server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Completion provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Terminal chat client configuration
    #[serde(default)]
    pub chat: ChatClientConfig,
}

/// Relay server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the relay binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// OpenAI provider configuration
    #[serde(default)]
    pub openai: OpenAiConfig,
}

fn default_provider_type() -> String {
    "openai".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            openai: OpenAiConfig::default(),
        }
    }
}

/// OpenAI provider configuration
///
/// `max_tokens` and `temperature` are fixed per deployment; they are
/// not tunable per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL (tests point this at a mock server)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key; falls back to the `OPENAI_API_KEY` env var when unset
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Response length cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Generation temperature, moderate by default
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Terminal chat client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatClientConfig {
    /// Base URL of the relay the client talks to
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    /// User identity sent on every request
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

fn default_relay_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

fn default_user_id() -> String {
    "local".to_string()
}

impl Default for ChatClientConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            user_id: default_user_id(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file with CLI overrides
    ///
    /// A missing file is not an error; defaults are used so the binary
    /// works out of the box.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    /// * `cli` - Parsed CLI arguments whose overrides are applied on top
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    ///
    /// # Examples
    ///
    /// ```
    /// use uplevel::config::Config;
    ///
    /// let config = Config::load("nonexistent.yaml", &Default::default()).unwrap();
    /// assert_eq!(config.provider.openai.model, "gpt-4o");
    /// ```
    pub fn load(path: impl AsRef<Path>, cli: &Cli) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| UplevelError::Config(format!("Failed to read {:?}: {}", path, e)))?;
            serde_yaml::from_str(&contents)
                .map_err(|e| UplevelError::Config(format!("Failed to parse {:?}: {}", path, e)))?
        } else {
            tracing::debug!("Config file {:?} not found, using defaults", path);
            Self::default()
        };

        if let Some(relay_url) = &cli.relay_url {
            config.chat.relay_url = relay_url.clone();
        }
        if let Some(user) = &cli.user {
            config.chat.user_id = user.clone();
        }

        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `UplevelError::Config` describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(UplevelError::Config(format!(
                "Invalid server.bind address: {}",
                self.server.bind
            ))
            .into());
        }

        if self.provider.provider_type != "openai" {
            return Err(UplevelError::Config(format!(
                "Unknown provider type: {}",
                self.provider.provider_type
            ))
            .into());
        }

        let openai = &self.provider.openai;
        if openai.max_tokens == 0 {
            return Err(
                UplevelError::Config("provider.openai.max_tokens must be positive".into()).into(),
            );
        }
        if !(openai.temperature > 0.0 && openai.temperature < 2.0) {
            return Err(UplevelError::Config(format!(
                "provider.openai.temperature out of range: {}",
                openai.temperature
            ))
            .into());
        }

        if self.chat.user_id.trim().is_empty() {
            return Err(UplevelError::Config("chat.user_id must not be empty".into()).into());
        }

        Ok(())
    }
}
