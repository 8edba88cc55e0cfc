//! Driver configuration
//!
//! Defaults, optionally overridden by a TOML file, then by command-line
//! flags through the `with_*` methods.
//!
//! ```toml
//! orchestration_uri = "mongodb://127.0.0.1:27017/"
//! database = "test"
//! collection = "test"
//! command_timeout_ms = 60000
//! log_format = "json"
//! ```

use crate::client::Namespace;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Address of the orchestration service when none is given
pub const DEFAULT_ORCHESTRATION_URI: &str = "mongodb://127.0.0.1/";

/// Log line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable single lines
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Invalid(format!("unknown log format '{other}'"))),
        }
    }
}

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// Connection string of the orchestration service
    pub orchestration_uri: String,
    /// Database the orchestration commands are run against
    pub orchestration_database: String,
    /// Default database for client operations
    pub database: String,
    /// Default collection for client operations
    pub collection: String,
    /// Bound on every orchestration and database call
    pub command_timeout_ms: u64,
    /// Log line layout
    pub log_format: LogFormat,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            orchestration_uri: DEFAULT_ORCHESTRATION_URI.to_string(),
            orchestration_database: "test".to_string(),
            database: "test".to_string(),
            collection: "test".to_string(),
            command_timeout_ms: 120_000,
            log_format: LogFormat::Compact,
        }
    }
}

impl DriverConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file, or defaults when `path` is `None`
    ///
    /// # Errors
    /// [`ConfigError`] when the file cannot be read, does not parse, or
    /// holds out-of-range values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the driver cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command_timeout_ms == 0 {
            return Err(ConfigError::Invalid("command_timeout_ms must be positive".into()));
        }
        if self.database.is_empty() || self.collection.is_empty() {
            return Err(ConfigError::Invalid(
                "database and collection names must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// With orchestration service URI
    #[inline]
    #[must_use]
    pub fn with_orchestration_uri(mut self, uri: impl Into<String>) -> Self {
        self.orchestration_uri = uri.into();
        self
    }

    /// With default database
    #[inline]
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// With default collection
    #[inline]
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// With per-call timeout
    #[inline]
    #[must_use]
    pub fn with_command_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.command_timeout_ms = timeout_ms;
        self
    }

    /// With log format
    #[inline]
    #[must_use]
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Per-call timeout
    #[inline]
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Default namespace of client operations
    #[must_use]
    pub fn namespace(&self) -> Namespace {
        Namespace::new(&self.database, &self.collection)
    }
}
