//! Error types for the driver
//!
//! Every layer has its own enum; [`DriverError`] wraps them for the run:
//! - [`InputError`] / [`SpecError`]: the test document is unusable
//! - [`OrchestrationError`]: the orchestration service failed or replied
//!   without what the run needs
//! - [`ClientOperationError`]: a database operation did not produce its
//!   declared outcome
//! - [`ConfigError`]: the driver configuration is unusable

use bson::Document;
use mo_spec::{InputError, LoadError, SpecError};
use std::path::PathBuf;

/// Main driver error type
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Specification file unreadable or not a document
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// Specification document invalid
    #[error("specification error: {0}")]
    Specification(#[from] SpecError),

    /// Orchestration service failure
    #[error("orchestration error: {0}")]
    Orchestration(#[from] OrchestrationError),

    /// Database operation outcome differs from the declared one
    #[error("client operation error: {0}")]
    ClientOperation(#[from] ClientOperationError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DriverError {
    /// Process exit status for this error
    ///
    /// Configuration and input problems exit with 2, specification problems
    /// with 3, orchestration failures with 4 and outcome mismatches with 5.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Input(_) | Self::Config(_) => 2,
            Self::Specification(_) => 3,
            Self::Orchestration(_) => 4,
            Self::ClientOperation(_) => 5,
        }
    }

    /// Reply document carried by an orchestration failure, if any
    #[must_use]
    pub fn reply(&self) -> Option<&Document> {
        match self {
            Self::Orchestration(
                OrchestrationError::CommandFailed { reply, .. }
                | OrchestrationError::MissingConnectionEndpoint { reply, .. },
            ) => Some(reply),
            _ => None,
        }
    }
}

impl From<LoadError> for DriverError {
    fn from(value: LoadError) -> Self {
        match value {
            LoadError::Input(e) => Self::Input(e),
            LoadError::Spec(e) => Self::Specification(e),
        }
    }
}

/// Orchestration service errors
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    /// Command could not be completed; `reply` holds whatever came back
    #[error("{verb} {path} failed: {message}")]
    CommandFailed {
        verb: String,
        path: String,
        message: String,
        reply: Document,
    },

    /// Provisioning reply lacks `mongodb_uri`
    #[error("provisioning reply from {path} has no mongodb_uri")]
    MissingConnectionEndpoint { path: String, reply: Document },

    /// A client could not be created for an endpoint
    #[error("failed to connect to {endpoint}: {message}")]
    ConnectFailed { endpoint: String, message: String },
}

/// Client operation errors
#[derive(Debug, thiserror::Error)]
pub enum ClientOperationError {
    /// Actual result or error differs from the declared outcome
    #[error("{operation}: outcome mismatch at {path}: expected {expected}, got {actual}")]
    OutcomeMismatch {
        operation: String,
        path: String,
        expected: String,
        actual: String,
    },

    /// Reading a collection to check `outcome.collection` failed
    #[error("{operation}: reading collection {collection} failed: {message}")]
    CollectionReadFailed {
        operation: String,
        collection: String,
        message: String,
    },

    /// Operation did not answer in time
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during config read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for the config schema
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Value out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
