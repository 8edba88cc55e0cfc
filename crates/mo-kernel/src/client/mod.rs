//! Database client seam
//!
//! Client operations reach the provisioned deployment through
//! [`DatabaseClient`]; [`ClientConnector`] opens one from the
//! `mongodb_uri` the orchestration service returned.

mod mongo;
pub mod outcome;

pub use mongo::{MongoConnector, MongoDatabaseClient};

use crate::error::OrchestrationError;
use bson::Bson;
use mo_spec::DatabaseOperation;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Database and collection an operation targets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Replace the parts a phase overrides
    #[must_use]
    pub fn with_overrides(&self, database: Option<&str>, collection: Option<&str>) -> Self {
        Self {
            database: database.unwrap_or(self.database.as_str()).to_string(),
            collection: collection.unwrap_or(self.collection.as_str()).to_string(),
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Error reported by the database for an operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct DatabaseFailure(pub String);

/// Executes [`DatabaseOperation`]s against a deployment
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Run one operation and return its result value
    async fn execute(
        &self,
        namespace: &Namespace,
        operation: &DatabaseOperation,
    ) -> Result<Bson, DatabaseFailure>;
}

/// Opens clients for provisioned deployments
#[async_trait::async_trait]
pub trait ClientConnector: Send + Sync {
    /// Open a client for `endpoint`
    async fn connect(&self, endpoint: &str) -> Result<Arc<dyn DatabaseClient>, OrchestrationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_parts() {
        let base = Namespace::new("test", "test");
        assert_eq!(base.with_overrides(None, Some("c")), Namespace::new("test", "c"));
        assert_eq!(base.with_overrides(Some("d"), None), Namespace::new("d", "test"));
        assert_eq!(base.with_overrides(None, None), base);
        assert_eq!(base.to_string(), "test.test");
    }
}
