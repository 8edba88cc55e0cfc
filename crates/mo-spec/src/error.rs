//! Error types for specification loading
//!
//! Two layers:
//! - [`InputError`]: the file could not be read or is not a document
//! - [`SpecError`]: the document is not a valid test specification

use std::path::PathBuf;

/// Errors while reading a specification file (ingress)
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid JSON
    #[error("invalid JSON in {origin}: {source}")]
    InvalidJson {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// JSON is valid but not valid extended JSON
    #[error("invalid extended JSON in {origin}: {message}")]
    InvalidExtendedJson { origin: String, message: String },

    /// Top-level value is not a document
    #[error("{origin}: top-level value must be a document")]
    NotADocument { origin: String },
}

impl InputError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors in the structure of a test specification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    /// Required top-level field absent
    #[error("missing {0}")]
    MissingField(&'static str),

    /// Field present with the wrong BSON type
    #[error("{field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    /// `type` names no known topology
    #[error("unrecognized topology type: '{0}'")]
    UnrecognizedTopologyType(String),

    /// `initConfig.id` absent or not a string
    #[error("couldn't parse config id from initConfig")]
    MissingDeploymentId,

    /// Phase element is not a single recognized key
    #[error("malformed phase {index}: {reason}")]
    MalformedPhase { index: usize, reason: String },

    /// `MOOperation` body lacks a field or has the wrong type
    #[error("malformed MOOperation in phase {index}: {reason}")]
    MalformedOrchestrationOperation { index: usize, reason: String },

    /// `clientOperation` body cannot be interpreted
    #[error("malformed clientOperation in phase {index}: {reason}")]
    MalformedClientOperation { index: usize, reason: String },
}

impl SpecError {
    /// Create malformed phase error
    pub fn malformed_phase(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedPhase {
            index,
            reason: reason.into(),
        }
    }
}

/// Either failure from [`crate::TestSpecification::load`]
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File could not be read or decoded
    #[error(transparent)]
    Input(#[from] InputError),

    /// Document is not a valid specification
    #[error(transparent)]
    Spec(#[from] SpecError),
}
