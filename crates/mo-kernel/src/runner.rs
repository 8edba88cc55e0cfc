//! One complete test run
//!
//! provision → connect → phases → deprovision

use crate::client::ClientConnector;
use crate::config::DriverConfig;
use crate::dispatch::{PhaseDispatcher, PhaseSummary};
use crate::error::{DriverError, OrchestrationError};
use crate::executor::CommandExecutor;
use crate::lifecycle::TopologyLifecycle;
use mo_spec::TestSpecification;
use std::sync::Arc;

/// Result of a passing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub description: String,
    pub deployment_id: String,
    pub connection_endpoint: String,
    pub phases: PhaseSummary,
}

/// Runs test specifications against one orchestration service
pub struct TestRunner {
    config: DriverConfig,
    executor: Arc<CommandExecutor>,
    connector: Arc<dyn ClientConnector>,
}

impl TestRunner {
    pub fn new(
        config: DriverConfig,
        executor: Arc<CommandExecutor>,
        connector: Arc<dyn ClientConnector>,
    ) -> Self {
        Self {
            config,
            executor,
            connector,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Run `spec` end to end
    ///
    /// The deployment is deprovisioned whenever it was provisioned, whether
    /// connecting or any phase failed.
    pub async fn run(&self, spec: &TestSpecification) -> Result<RunSummary, DriverError> {
        tracing::info!(
            description = %spec.description,
            topology = %spec.topology,
            "starting test run"
        );

        let lifecycle = TopologyLifecycle::new(Arc::clone(&self.executor));
        let dispatcher = PhaseDispatcher::new(
            Arc::clone(&self.executor),
            self.config.namespace(),
            self.config.command_timeout(),
        );
        let timeout = self.config.command_timeout();

        lifecycle
            .run(spec, |deployment| async move {
                let endpoint = deployment.connection_endpoint();
                let client = tokio::time::timeout(timeout, self.connector.connect(endpoint))
                    .await
                    .map_err(|_| OrchestrationError::ConnectFailed {
                        endpoint: endpoint.to_string(),
                        message: format!("timed out after {}ms", timeout.as_millis()),
                    })??;

                let phases = dispatcher
                    .run_phases(&deployment, client.as_ref(), &spec.phases)
                    .await?;

                Ok::<_, DriverError>(RunSummary {
                    description: spec.description.clone(),
                    deployment_id: deployment.deployment_id().to_string(),
                    connection_endpoint: endpoint.to_string(),
                    phases,
                })
            })
            .await
    }
}

impl std::fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestRunner")
            .field("config", &self.config)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}
