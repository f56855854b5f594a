//! Configuration loading for the sync controller.
//!
//! Configuration is loaded from a TOML file. Every field has a default, so
//! an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tunables for a [`SyncController`](crate::SyncController).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Delay in milliseconds between losing every reason to sync and
    /// stopping the engine (default: 10000).
    ///
    /// One window is shared by all reasons.
    #[serde(default = "default_debounce_window_ms")]
    pub debounce_window_ms: u64,
    /// Capacity of the worker's merged event queue (default: 64).
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_debounce_window_ms() -> u64 {
    10_000
}

fn default_event_buffer() -> usize {
    64
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce_window_ms: default_debounce_window_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds
    /// invalid values.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_buffer == 0 {
            return Err(ConfigError::Invalid(
                "event_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The debounce window as a [`Duration`].
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }

    /// Set the debounce window.
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the event queue capacity.
    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_matches_reference_window() {
        let config = ControllerConfig::default();
        assert_eq!(config.debounce_window(), Duration::from_secs(10));
        assert_eq!(config.event_buffer, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
debounce_window_ms = 2500
event_buffer = 8
"#;

        let config: ControllerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.debounce_window(), Duration::from_millis(2500));
        assert_eq!(config.event_buffer, 8);
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let config: ControllerConfig = toml::from_str("").unwrap();
        assert_eq!(config, ControllerConfig::default());
    }

    #[test]
    fn zero_event_buffer_is_rejected() {
        let config = ControllerConfig::default().with_event_buffer(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn builder_sets_window() {
        let config = ControllerConfig::default().with_debounce_window(Duration::from_secs(3));
        assert_eq!(config.debounce_window_ms, 3000);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debounce_window_ms = 500").unwrap();

        let config = ControllerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.debounce_window(), Duration::from_millis(500));
        assert_eq!(config.event_buffer, 64);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = ControllerConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debounce_window_ms = \"soon\"").unwrap();

        let err = ControllerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn invalid_file_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "event_buffer = 0").unwrap();

        let err = ControllerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
