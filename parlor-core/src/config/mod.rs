//! Configuration management for Parlor
//!
//! Environment-based configuration with defaults, TOML file loading and
//! validation.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::core_bus::DEFAULT_BUS_CAPACITY;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    FileRead(String),

    #[error("Failed to write configuration file: {0}")]
    FileWrite(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Store configuration
    pub store: StoreConfig,

    /// Chat service configuration
    pub chat: ChatConfig,

    /// Enrichment worker configuration
    pub enrichment: EnrichmentConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the SQLite database file
    pub db_path: PathBuf,
}

/// Chat service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Event bus buffer capacity per subscriber
    pub bus_capacity: usize,

    /// Maximum accepted channel password length
    pub password_max_len: usize,
}

/// Enrichment worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Enable the enrichment pipeline
    pub enabled: bool,

    /// Number of worker tasks in the pool
    pub workers: usize,

    /// Bounded job queue capacity
    pub queue_capacity: usize,

    /// Timeout for a single URL fetch
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,

    /// Maximum bytes read from a fetched response
    pub max_response_bytes: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./parlor.db"),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            bus_capacity: DEFAULT_BUS_CAPACITY,
            password_max_len: 64,
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            workers: 2,
            queue_capacity: 64,
            fetch_timeout: Duration::from_secs(10),
            max_response_bytes: 2 * 1024 * 1024, // 2 MB
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: PARLOR_<SECTION>_<KEY>
    /// Example: PARLOR_STORE_DB_PATH=/var/lib/parlor/chat.db
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Store config
        if let Ok(db_path) = env::var("PARLOR_STORE_DB_PATH") {
            config.store.db_path = PathBuf::from(db_path);
        }

        // Chat config
        if let Ok(capacity) = env::var("PARLOR_CHAT_BUS_CAPACITY") {
            config.chat.bus_capacity = capacity
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid bus capacity: {}", e)))?;
        }
        if let Ok(max_len) = env::var("PARLOR_CHAT_PASSWORD_MAX_LEN") {
            config.chat.password_max_len = max_len.parse().map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid password max length: {}", e))
            })?;
        }

        // Enrichment config
        if let Ok(enabled) = env::var("PARLOR_ENRICH_ENABLED") {
            config.enrichment.enabled = enabled
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid enrichment flag: {}", e)))?;
        }
        if let Ok(workers) = env::var("PARLOR_ENRICH_WORKERS") {
            config.enrichment.workers = workers
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid worker count: {}", e)))?;
        }
        if let Ok(capacity) = env::var("PARLOR_ENRICH_QUEUE_CAPACITY") {
            config.enrichment.queue_capacity = capacity
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid queue capacity: {}", e)))?;
        }

        // Logging config
        if let Ok(level) = env::var("PARLOR_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = env::var("PARLOR_LOG_JSON") {
            config.logging.json_format = json
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid JSON flag: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chat.bus_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "bus_capacity must be greater than 0".to_string(),
            ));
        }

        if self.chat.password_max_len == 0 {
            return Err(ConfigError::ValidationFailed(
                "password_max_len must be greater than 0".to_string(),
            ));
        }

        if self.enrichment.workers == 0 {
            return Err(ConfigError::ValidationFailed(
                "workers must be greater than 0".to_string(),
            ));
        }

        if self.enrichment.queue_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }

        if self.enrichment.max_response_bytes == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_response_bytes must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }
}
