//! Orchestration transport over the MongoDB wire protocol
//!
//! The Conduction server speaks the MongoDB protocol; each envelope is sent
//! as a database command.

use super::{OrchestrationService, ServiceFailure};
use crate::error::OrchestrationError;
use bson::{doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::{Client, Database};

/// [`OrchestrationService`] backed by a `mongodb` client
#[derive(Debug, Clone)]
pub struct MongoOrchestrationService {
    database: Database,
}

impl MongoOrchestrationService {
    /// Create a client for `uri` that sends commands to `database`
    ///
    /// The client connects lazily; only an unparsable URI fails here.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, OrchestrationError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| OrchestrationError::ConnectFailed {
                endpoint: uri.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            database: client.database(database),
        })
    }
}

#[async_trait::async_trait]
impl OrchestrationService for MongoOrchestrationService {
    async fn run_command(&self, command: Document) -> Result<Document, ServiceFailure> {
        self.database
            .run_command(command, None)
            .await
            .map_err(failure_from)
    }
}

/// Keep the server's error reply when there was one
fn failure_from(error: MongoError) -> ServiceFailure {
    let failure = ServiceFailure::new(error.to_string());
    match error.kind.as_ref() {
        ErrorKind::Command(command_error) => failure.with_reply(doc! {
            "ok": 0.0,
            "errmsg": command_error.message.clone(),
            "code": command_error.code,
            "codeName": command_error.code_name.clone(),
        }),
        _ => failure,
    }
}
