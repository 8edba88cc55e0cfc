//! mo-driver kernel (mo-kernel)
//!
//! Executes topology test specifications against a deployment provisioned by
//! mongo-orchestration:
//! 1. **Provision**: POST `initConfig` to `/v1/{collection}`, read `mongodb_uri`
//! 2. **Phases**: run each `MOOperation` / `clientOperation` in order
//! 3. **Deprovision**: DELETE `/v1/{collection}/{id}`, on every exit path
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mo_kernel::prelude::*;
//! use std::sync::Arc;
//!
//! let config = DriverConfig::new();
//! let service = MongoOrchestrationService::connect(&config.orchestration_uri, "test").await?;
//! let executor = Arc::new(CommandExecutor::new(Arc::new(service), config.command_timeout()));
//! let runner = TestRunner::new(config, executor, Arc::new(MongoConnector));
//!
//! let spec = TestSpecification::load("tests/standalone.json")?;
//! let summary = runner.run(&spec).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod lifecycle;
pub mod logging;
pub mod runner;

// Re-exports
pub use error::*;

/// Commonly used types
pub mod prelude {
    pub use crate::client::{ClientConnector, DatabaseClient, MongoConnector, Namespace};
    pub use crate::config::{DriverConfig, LogFormat};
    pub use crate::dispatch::{PhaseDispatcher, PhaseSummary};
    pub use crate::error::{ClientOperationError, ConfigError, DriverError, OrchestrationError};
    pub use crate::executor::{CommandExecutor, MongoOrchestrationService, OrchestrationService};
    pub use crate::lifecycle::{DeploymentHandle, TopologyLifecycle};
    pub use crate::runner::{RunSummary, TestRunner};
    pub use mo_spec::{CommandEnvelope, TestSpecification, TopologyType};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
