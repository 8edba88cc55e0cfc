//! Command Executor
//!
//! All orchestration traffic goes through [`CommandExecutor::execute`]:
//! - the outbound command is logged before it is sent
//! - the call is bounded by the configured timeout
//! - the reply is logged, on success and on failure
//!
//! A failure still carries a reply document (possibly empty) so callers can
//! inspect what the service answered.

mod mongo;

pub use mongo::MongoOrchestrationService;

use crate::error::OrchestrationError;
use crate::logging::WIRE_TARGET;
use bson::Document;
use mo_spec::document::to_relaxed_json;
use mo_spec::{CommandEnvelope, ReplyDocument};
use std::sync::Arc;
use std::time::Duration;

/// Orchestration service transport
///
/// Implement this trait to define how a command document reaches the
/// service.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait OrchestrationService: Send + Sync {
    /// Submit one command document
    async fn run_command(&self, command: Document) -> Result<ReplyDocument, ServiceFailure>;
}

/// Transport or protocol failure reported by an [`OrchestrationService`]
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceFailure {
    pub message: String,
    /// Error reply from the service, when it answered at all
    pub reply: Option<Document>,
}

impl ServiceFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reply: None,
        }
    }

    #[must_use]
    pub fn with_reply(mut self, reply: Document) -> Self {
        self.reply = Some(reply);
        self
    }
}

/// Sends envelopes to the orchestration service
#[derive(Clone)]
pub struct CommandExecutor {
    service: Arc<dyn OrchestrationService>,
    timeout: Duration,
}

impl CommandExecutor {
    /// Create a new executor
    pub fn new(service: Arc<dyn OrchestrationService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    /// Run one envelope and return the reply
    ///
    /// # Errors
    /// [`OrchestrationError::CommandFailed`] on transport failure, error
    /// reply or timeout.
    pub async fn execute(
        &self,
        envelope: &CommandEnvelope,
    ) -> Result<ReplyDocument, OrchestrationError> {
        let command = envelope.to_command();
        tracing::info!(
            target: WIRE_TARGET,
            direction = "outbound",
            "{} -->",
            to_relaxed_json(&command)
        );

        let sent = tokio::time::timeout(self.timeout, self.service.run_command(command)).await;
        let result = match sent {
            Ok(result) => result,
            Err(_) => Err(ServiceFailure::new(format!(
                "timed out after {}ms",
                self.timeout.as_millis()
            ))),
        };

        match result {
            Ok(reply) => {
                tracing::info!(
                    target: WIRE_TARGET,
                    direction = "inbound",
                    "\t<-- {}",
                    to_relaxed_json(&reply)
                );
                Ok(reply)
            }
            Err(failure) => {
                let reply = failure.reply.unwrap_or_default();
                tracing::error!(
                    verb = envelope.verb(),
                    path = envelope.path(),
                    "orchestration command failure: {}",
                    failure.message
                );
                tracing::info!(
                    target: WIRE_TARGET,
                    direction = "inbound",
                    "\t<-- {}",
                    to_relaxed_json(&reply)
                );
                Err(OrchestrationError::CommandFailed {
                    verb: envelope.verb().to_string(),
                    path: envelope.path().to_string(),
                    message: failure.message,
                    reply,
                })
            }
        }
    }
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
