use crate::error::OrchestrationError;
use crate::executor::CommandExecutor;
use mo_spec::{OrchestrationOperation, ReplyDocument};

/// Send an `MOOperation` phase to the orchestration service
///
/// The payload travels wrapped as `{body: payload}`.
pub async fn execute_orchestration_operation(
    executor: &CommandExecutor,
    operation: &OrchestrationOperation,
) -> Result<ReplyDocument, OrchestrationError> {
    let envelope = operation.to_envelope();
    tracing::debug!(verb = envelope.verb(), path = envelope.path(), "orchestration operation");
    executor.execute(&envelope).await
}
