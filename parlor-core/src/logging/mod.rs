//! Logging subsystem
//!
//! Structured logging over the `tracing` crate. Hosts initialize it once
//! at startup; `RUST_LOG` overrides the configured level when set.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod error;
mod level;

pub use error::LoggingError;
pub use level::LogLevel;

use crate::config::LoggingConfig;

/// Configuration for the logging subsystem
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// The minimum log level to display
    pub level: LogLevel,
    /// Whether to include timestamps
    pub with_timestamp: bool,
    /// Whether to include target module information
    pub with_target: bool,
    /// Whether to use JSON formatting
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            with_timestamp: true,
            with_target: true,
            json_format: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Bridge from the file/env configuration section.
    pub fn from_settings(settings: &LoggingConfig) -> Result<Self, LoggingError> {
        let level = LogLevel::parse(&settings.level).ok_or_else(|| {
            LoggingError::InvalidConfiguration(format!("unknown log level '{}'", settings.level))
        })?;

        Ok(Self {
            level,
            with_timestamp: settings.with_timestamp,
            with_target: settings.with_target,
            json_format: settings.json_format,
        })
    }

    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.with_timestamp = enabled;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }
}

/// Initialize logging with default configuration.
pub fn init_logging() -> Result<(), LoggingError> {
    init_logging_with_config(LogConfig::default())
}

/// Initialize logging with custom configuration. Fails if a global
/// subscriber is already installed.
pub fn init_logging_with_config(config: LogConfig) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let fmt_layer = fmt::layer().with_target(config.with_target);

    let result = match (config.json_format, config.with_timestamp) {
        (true, true) => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .try_init(),
        (true, false) => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json().without_time())
            .try_init(),
        (false, true) => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init(),
        (false, false) => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.without_time())
            .try_init(),
    };

    result.map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}
