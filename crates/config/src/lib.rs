//! Configuration loading, validation, and management for huurwijzer.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides. Validates all settings at startup. Also carries the rental
//! domain data (cities, price table, document checklist, scam warnings)
//! the system prompt is rendered from.

pub mod domain;

pub use domain::{CityPrices, DomainData, PriceRange};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for remote backends (not needed for local inference)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Generation backend: "local", "openai", "ollama", or a custom URL
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Model identifier (preset alias, GGUF path, or remote model name)
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL override for remote backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Max new tokens per chat reply
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    /// Max new tokens for contract analysis (longer expected output)
    #[serde(default = "default_analysis_max_new_tokens")]
    pub analysis_max_new_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Character budget for uploaded contract text embedded in the prompt
    #[serde(default = "default_contract_max_chars")]
    pub contract_max_chars: usize,

    /// Optional character bound on rendered conversation history.
    /// `None` preserves unbounded growth; when set, oldest turns are
    /// evicted first until the rendered history fits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_history_chars: Option<usize>,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Rental domain data used to render the system prompt
    #[serde(default)]
    pub domain: DomainData,
}

fn default_backend() -> String {
    "local".into()
}
fn default_model() -> String {
    "qwen:1.5b".into()
}
fn default_max_new_tokens() -> u32 {
    150
}
fn default_analysis_max_new_tokens() -> u32 {
    400
}
fn default_temperature() -> f32 {
    0.7
}
fn default_contract_max_chars() -> usize {
    2000
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("max_new_tokens", &self.max_new_tokens)
            .field("analysis_max_new_tokens", &self.analysis_max_new_tokens)
            .field("temperature", &self.temperature)
            .field("contract_max_chars", &self.contract_max_chars)
            .field("max_history_chars", &self.max_history_chars)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// CORS allow-list. `["*"]` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.huurwijzer/config.toml)
    /// with environment variable overrides applied on top:
    ///
    /// - `HUURWIJZER_BACKEND`, `HUURWIJZER_MODEL`, `HUURWIJZER_API_URL`
    /// - `HUURWIJZER_API_KEY` (falls back to `OPENAI_API_KEY`)
    /// - `HUURWIJZER_MAX_NEW_TOKENS`, `HUURWIJZER_TEMPERATURE`
    /// - `HUURWIJZER_HOST`, `HUURWIJZER_PORT`
    /// - `HUURWIJZER_CORS_ORIGINS` (comma-separated)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path. Missing file = defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(backend) = std::env::var("HUURWIJZER_BACKEND") {
            self.backend = backend;
        }
        if let Ok(model) = std::env::var("HUURWIJZER_MODEL") {
            self.model = model;
        }
        if let Ok(url) = std::env::var("HUURWIJZER_API_URL") {
            self.api_url = Some(url);
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("HUURWIJZER_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }
        if let Ok(v) = std::env::var("HUURWIJZER_MAX_NEW_TOKENS") {
            self.max_new_tokens = v.parse().map_err(|_| {
                ConfigError::ValidationError(format!("HUURWIJZER_MAX_NEW_TOKENS: invalid integer '{v}'"))
            })?;
        }
        if let Ok(v) = std::env::var("HUURWIJZER_TEMPERATURE") {
            self.temperature = v.parse().map_err(|_| {
                ConfigError::ValidationError(format!("HUURWIJZER_TEMPERATURE: invalid float '{v}'"))
            })?;
        }
        if let Ok(host) = std::env::var("HUURWIJZER_HOST") {
            self.gateway.host = host;
        }
        if let Ok(v) = std::env::var("HUURWIJZER_PORT") {
            self.gateway.port = v.parse().map_err(|_| {
                ConfigError::ValidationError(format!("HUURWIJZER_PORT: invalid port '{v}'"))
            })?;
        }
        if let Ok(origins) = std::env::var("HUURWIJZER_CORS_ORIGINS") {
            self.gateway.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".huurwijzer")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.max_new_tokens == 0 || self.analysis_max_new_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "token budgets must be greater than zero".into(),
            ));
        }

        if self.contract_max_chars == 0 {
            return Err(ConfigError::ValidationError(
                "contract_max_chars must be greater than zero".into(),
            ));
        }

        self.domain
            .validate()
            .map_err(ConfigError::ValidationError)?;

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            backend: default_backend(),
            model: default_model(),
            api_url: None,
            max_new_tokens: default_max_new_tokens(),
            analysis_max_new_tokens: default_analysis_max_new_tokens(),
            temperature: default_temperature(),
            contract_max_chars: default_contract_max_chars(),
            max_history_chars: None,
            gateway: GatewayConfig::default(),
            domain: DomainData::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
