//! Topology Lifecycle
//!
//! Provision, use and deprovision of one deployment:
//! - [`TopologyLifecycle::provision`] POSTs `initConfig` to the collection
//!   path and reads `mongodb_uri` from the reply
//! - [`TopologyLifecycle::deprovision`] DELETEs `/{collection}/{id}`, once
//! - [`TopologyLifecycle::run`] wraps a body between the two so the
//!   deployment is released on every exit path

use crate::error::{DriverError, OrchestrationError};
use crate::executor::CommandExecutor;
use mo_spec::{resolve_path, CommandEnvelope, TestSpecification};
use std::future::Future;
use std::sync::Arc;

/// Reply field carrying the deployment's connection string
pub const CONNECTION_ENDPOINT_FIELD: &str = "mongodb_uri";

/// A provisioned deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentHandle {
    resource_path: String,
    deployment_path: String,
    deployment_id: String,
    connection_endpoint: String,
}

impl DeploymentHandle {
    pub fn new(
        resource_path: impl Into<String>,
        deployment_id: impl Into<String>,
        connection_endpoint: impl Into<String>,
    ) -> Self {
        let resource_path = resource_path.into();
        let deployment_id = deployment_id.into();
        Self {
            deployment_path: format!("{resource_path}/{deployment_id}"),
            resource_path,
            deployment_id,
            connection_endpoint: connection_endpoint.into(),
        }
    }

    /// Collection path used for provisioning, e.g. `/v1/servers`
    #[inline]
    #[must_use]
    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    #[inline]
    #[must_use]
    pub fn deployment_id(&self) -> &str {
        &self.deployment_id
    }

    /// Connection string returned by the orchestration service
    #[inline]
    #[must_use]
    pub fn connection_endpoint(&self) -> &str {
        &self.connection_endpoint
    }

    /// Path of this deployment, e.g. `/v1/servers/s0`
    #[inline]
    #[must_use]
    pub fn deployment_path(&self) -> &str {
        &self.deployment_path
    }
}

/// Drives provisioning and teardown through a [`CommandExecutor`]
#[derive(Debug, Clone)]
pub struct TopologyLifecycle {
    executor: Arc<CommandExecutor>,
}

impl TopologyLifecycle {
    pub fn new(executor: Arc<CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Create the deployment described by `spec`
    ///
    /// Both paths are resolved first, so a specification without an `id`
    /// fails before anything is sent. When the reply lacks a string
    /// `mongodb_uri` the deployment is deleted again before
    /// [`OrchestrationError::MissingConnectionEndpoint`] is returned.
    pub async fn provision(
        &self,
        spec: &TestSpecification,
    ) -> Result<DeploymentHandle, DriverError> {
        let resource_path = resolve_path(spec, false)?;
        let deployment_path = resolve_path(spec, true)?;
        let deployment_id = spec.deployment_id()?;

        tracing::info!(
            topology = %spec.topology,
            path = %resource_path,
            id = deployment_id,
            "provisioning deployment"
        );
        let envelope = CommandEnvelope::post(resource_path.as_str(), spec.init_config.clone());
        let reply = self.executor.execute(&envelope).await?;

        let Ok(endpoint) = reply.get_str(CONNECTION_ENDPOINT_FIELD) else {
            tracing::error!(
                path = %resource_path,
                "provisioning reply has no {}",
                CONNECTION_ENDPOINT_FIELD
            );
            if let Err(e) = self.delete(deployment_path).await {
                tracing::error!(error = %e, "deprovisioning after bad provisioning reply failed");
            }
            return Err(OrchestrationError::MissingConnectionEndpoint {
                path: resource_path,
                reply,
            }
            .into());
        };

        Ok(DeploymentHandle {
            connection_endpoint: endpoint.to_string(),
            deployment_id: deployment_id.to_string(),
            resource_path,
            deployment_path,
        })
    }

    /// Delete the deployment described by `spec`
    pub async fn deprovision(&self, spec: &TestSpecification) -> Result<(), DriverError> {
        self.delete(resolve_path(spec, true)?).await
    }

    async fn delete(&self, path: String) -> Result<(), DriverError> {
        tracing::info!(path = %path, "deprovisioning deployment");
        self.executor.execute(&CommandEnvelope::delete(path)).await?;
        Ok(())
    }

    /// Provision, run `body`, then deprovision
    ///
    /// Deprovisioning is attempted exactly once whenever provisioning
    /// succeeded. An error from `body` takes precedence over a
    /// deprovisioning error, which is then only logged.
    pub async fn run<T, F, Fut>(
        &self,
        spec: &TestSpecification,
        body: F,
    ) -> Result<T, DriverError>
    where
        F: FnOnce(DeploymentHandle) -> Fut,
        Fut: Future<Output = Result<T, DriverError>>,
    {
        let handle = self.provision(spec).await?;
        let deployment_path = handle.deployment_path().to_string();
        let outcome = body(handle).await;
        let released = self.delete(deployment_path).await;

        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup)) => {
                tracing::error!(error = %cleanup, "deprovisioning failed after phase failure");
                Err(e)
            }
        }
    }
}
