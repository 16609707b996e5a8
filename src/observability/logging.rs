//! Logging setup: text or JSON output, level from config, `RUST_LOG` wins.

use crate::config::LoggingConfig;
use crate::error::{Result, UserStoreError};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Log format type
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LogFormat {
    /// Plain text format (default)
    #[default]
    Text,
    /// JSON structured format
    Json,
}

impl LogFormat {
    /// Parse log format from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Log configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Text,
        }
    }
}

impl LogConfig {
    /// Parse log level from string
    pub fn parse_level(s: &str) -> Option<Level> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }

    /// Build from the `[logging]` section; unknown values are errors.
    pub fn from_config(config: &LoggingConfig) -> Result<Self> {
        let level = Self::parse_level(&config.level).ok_or_else(|| {
            UserStoreError::Config(format!("invalid log level '{}'", config.level))
        })?;
        let format = LogFormat::parse(&config.format).ok_or_else(|| {
            UserStoreError::Config(format!("invalid log format '{}'", config.format))
        })?;
        Ok(Self { level, format })
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.level).into())
        .from_env_lossy();

    match config.format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_target(false)
            .with_level(true)
            .with_env_filter(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_current_span(false)
            .with_env_filter(filter)
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::parse("text"), Some(LogFormat::Text));
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("plain"), Some(LogFormat::Text));
        assert_eq!(LogFormat::parse("invalid"), None);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogConfig::parse_level("trace"), Some(Level::TRACE));
        assert_eq!(LogConfig::parse_level("Warning"), Some(Level::WARN));
        assert_eq!(LogConfig::parse_level("error"), Some(Level::ERROR));
        assert_eq!(LogConfig::parse_level("invalid"), None);
    }

    #[test]
    fn test_from_config() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: "json".to_string(),
        };
        let log = LogConfig::from_config(&config).unwrap();
        assert_eq!(log.level, Level::DEBUG);
        assert_eq!(log.format, LogFormat::Json);

        let config = LoggingConfig {
            level: "loud".to_string(),
            format: "text".to_string(),
        };
        assert!(LogConfig::from_config(&config).is_err());
    }
}
