//! Configuration file parsing for the server.
//!
//! Loads settings from TOML: bind address, JWT secret, token expiry, model,
//! pipeline and quality settings, the session cache and the history database.

use caseforge_extractor::ExtractorConfig;
use caseforge_gatekeeper::QualityConfig;
use caseforge_llm::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding the model API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// Field present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (e.g., 5000)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// JWT secret for signing session tokens
    pub jwt_secret: String,

    /// Token expiry in seconds (default: 86400 = 1 day)
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,

    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Model API key; the environment variable takes precedence
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// SQLite file for saved batches; history is disabled without it
    #[serde(default)]
    pub history_db_path: Option<PathBuf>,

    /// Model settings
    #[serde(default)]
    pub llm: LlmSettings,

    /// Chunking, fan-out and retry settings
    #[serde(default)]
    pub pipeline: ExtractorConfig,

    /// Quality check settings
    #[serde(default)]
    pub quality: QualityConfig,

    /// Per-session document cache settings
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Model settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model name
    pub model: String,

    /// API base URL
    pub endpoint: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Per-session document cache settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum number of sessions kept
    pub max_sessions: u64,

    /// Entries unused for this long are evicted (seconds)
    pub idle_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_sessions: 1024,
            idle_ttl_secs: 3600,
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    5000
}

/// Default token expiry: 1 day
fn default_token_expiry() -> u64 {
    86_400
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and nested settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingField("jwt_secret".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::MissingField("llm.model".to_string()));
        }
        if self.cache.max_sessions == 0 {
            return Err(ConfigError::Invalid(
                "cache.max_sessions must be greater than 0".to_string(),
            ));
        }
        self.pipeline.validate().map_err(ConfigError::Invalid)
    }

    /// Create a default configuration for local development
    pub fn default_dev_config() -> Self {
        ServerConfig {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            jwt_secret: "dev-secret-key-do-not-use-in-production".to_string(),
            token_expiry_secs: default_token_expiry(),
            log_level: default_log_level(),
            gemini_api_key: None,
            history_db_path: None,
            llm: LlmSettings::default(),
            pipeline: ExtractorConfig::default(),
            quality: QualityConfig::default(),
            cache: CacheSettings::default(),
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }

    /// API key from the environment, falling back to the file
    pub fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .or_else(|| self.gemini_api_key.clone())
            .filter(|key| !key.trim().is_empty())
    }
}
