//! Topology test specifications
//!
//! Model of a declarative test run against a deployment provisioned by
//! mongo-orchestration.
//!
//! # Core Concepts
//!
//! - [`TestSpecification`]: the parsed test document
//! - [`TopologyType`]: `Standalone`, `Sharded` or `ReplicaSet`
//! - [`resolve_path`]: orchestration resource path of a deployment
//! - [`Phase`]: one `MOOperation` or `clientOperation` step
//! - [`CommandEnvelope`]: `{verb, path, body}` sent to the orchestration service
//!
//! # Example
//!
//! ```rust,ignore
//! use mo_spec::{resolve_path, TestSpecification};
//!
//! let spec = TestSpecification::load("tests/replica_set.json")?;
//! assert_eq!(resolve_path(&spec, false)?, "/v1/replica_sets");
//! assert_eq!(resolve_path(&spec, true)?, "/v1/replica_sets/repl0");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod command;
pub mod document;
mod error;
pub mod operation;
pub mod phase;
mod specification;
mod topology;

// Re-exports
pub use command::{CommandEnvelope, ReplyDocument, VERB_DELETE, VERB_POST};
pub use error::{InputError, LoadError, SpecError};
pub use operation::{CollectionOutcome, DatabaseOperation, Outcome};
pub use phase::{
    ClientOperation, OrchestrationOperation, Phase, CLIENT_OPERATION_KEY, MO_OPERATION_KEY,
};
pub use specification::TestSpecification;
pub use topology::{resolve_path, TopologyType, API_PREFIX};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
