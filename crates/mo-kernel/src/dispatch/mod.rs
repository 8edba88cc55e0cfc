//! Phase Dispatcher
//!
//! Runs a specification's phases in order against a provisioned deployment.
//! Each phase is parsed right before it runs; the first malformed or failing
//! phase stops the sequence.

use crate::client::{DatabaseClient, Namespace};
use crate::error::DriverError;
use crate::executor::CommandExecutor;
use crate::handlers::{execute_client_operation, execute_orchestration_operation};
use crate::lifecycle::DeploymentHandle;
use bson::Bson;
use mo_spec::Phase;
use std::sync::Arc;
use std::time::Duration;

/// Counts of phases run by [`PhaseDispatcher::run_phases`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseSummary {
    pub orchestration_operations: usize,
    pub client_operations: usize,
}

impl PhaseSummary {
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.orchestration_operations + self.client_operations
    }
}

/// Sends each phase to its handler
#[derive(Debug, Clone)]
pub struct PhaseDispatcher {
    executor: Arc<CommandExecutor>,
    namespace: Namespace,
    timeout: Duration,
}

impl PhaseDispatcher {
    /// `namespace` is used by client operations that name no database or
    /// collection; `timeout` bounds each database call.
    pub fn new(executor: Arc<CommandExecutor>, namespace: Namespace, timeout: Duration) -> Self {
        Self {
            executor,
            namespace,
            timeout,
        }
    }

    /// Run `phases` in order
    ///
    /// # Errors
    /// The first phase error; no later phase runs.
    pub async fn run_phases(
        &self,
        deployment: &DeploymentHandle,
        client: &dyn DatabaseClient,
        phases: &[Bson],
    ) -> Result<PhaseSummary, DriverError> {
        let mut summary = PhaseSummary::default();

        for (index, element) in phases.iter().enumerate() {
            let phase = Phase::parse(index, element)?;
            tracing::info!(
                index,
                kind = phase.kind(),
                deployment = deployment.deployment_id(),
                "running phase"
            );

            match &phase {
                Phase::Orchestration(operation) => {
                    execute_orchestration_operation(&self.executor, operation).await?;
                    summary.orchestration_operations += 1;
                }
                Phase::Client(operation) => {
                    execute_client_operation(client, &self.namespace, operation, self.timeout)
                        .await?;
                    summary.client_operations += 1;
                }
            }
        }

        tracing::info!(phases = summary.total(), "all phases passed");
        Ok(summary)
    }
}
