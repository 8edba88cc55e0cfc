//! Testing utilities for the mo-driver workspace
//!
//! Recording test doubles for the orchestration service and the database
//! client, plus specification fixtures.

#![allow(missing_docs)]

use bson::{doc, Bson, Document};
use mo_kernel::client::{ClientConnector, DatabaseClient, DatabaseFailure, Namespace};
use mo_kernel::config::DriverConfig;
use mo_kernel::error::OrchestrationError;
use mo_kernel::executor::{CommandExecutor, OrchestrationService, ServiceFailure};
use mo_spec::{CommandEnvelope, DatabaseOperation, TestSpecification};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// How a double answers a call
#[derive(Debug, Clone)]
pub enum Scripted<T> {
    Reply(T),
    Fail {
        message: String,
        reply: Option<Document>,
    },
    /// Never answers
    Hang,
}

/// Orchestration service double
///
/// Commands and replies pass through BSON bytes the way they would on the
/// wire. Unscripted commands get `{ok: 1}`.
#[derive(Debug, Default)]
pub struct RecordingOrchestrationService {
    rules: Mutex<HashMap<(String, String), Scripted<Document>>>,
    commands: Mutex<Vec<Document>>,
}

impl RecordingOrchestrationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `verb path` with `script`
    #[must_use]
    pub fn on(self, verb: &str, path: &str, script: Scripted<Document>) -> Self {
        self.rules
            .lock()
            .insert((verb.to_lowercase(), path.to_string()), script);
        self
    }

    /// Answer the provisioning POST with `mongodb_uri: endpoint`
    #[must_use]
    pub fn provisioning(self, path: &str, endpoint: &str) -> Self {
        self.on(
            "post",
            path,
            Scripted::Reply(doc! { "ok": 1, "id": "fixture", "mongodb_uri": endpoint }),
        )
    }

    /// Every command received, in order
    pub fn commands(&self) -> Vec<Document> {
        self.commands.lock().clone()
    }

    /// Received commands decoded as envelopes
    pub fn envelopes(&self) -> Vec<CommandEnvelope> {
        self.commands
            .lock()
            .iter()
            .filter_map(CommandEnvelope::from_command)
            .collect()
    }

    /// Number of received commands with `verb`
    pub fn count(&self, verb: &str) -> usize {
        self.envelopes().iter().filter(|e| e.verb() == verb).count()
    }
}

fn through_wire(document: &Document) -> Result<Document, ServiceFailure> {
    let mut bytes = Vec::new();
    document
        .to_writer(&mut bytes)
        .map_err(|e| ServiceFailure::new(format!("encode: {e}")))?;
    Document::from_reader(&mut bytes.as_slice())
        .map_err(|e| ServiceFailure::new(format!("decode: {e}")))
}

#[async_trait::async_trait]
impl OrchestrationService for RecordingOrchestrationService {
    async fn run_command(&self, command: Document) -> Result<Document, ServiceFailure> {
        let received = through_wire(&command)?;
        self.commands.lock().push(received.clone());

        let script = CommandEnvelope::from_command(&received).and_then(|envelope| {
            self.rules
                .lock()
                .get(&(envelope.verb().to_string(), envelope.path().to_string()))
                .cloned()
        });

        match script {
            None => through_wire(&doc! { "ok": 1 }),
            Some(Scripted::Reply(reply)) => through_wire(&reply),
            Some(Scripted::Fail { message, reply }) => {
                let failure = ServiceFailure::new(message);
                Err(match reply {
                    Some(reply) => failure.with_reply(reply),
                    None => failure,
                })
            }
            Some(Scripted::Hang) => std::future::pending().await,
        }
    }
}

/// Database client double
///
/// Results are scripted per operation name and consumed in order; an
/// operation with nothing scripted returns an empty array.
#[derive(Debug, Default)]
pub struct RecordingDatabaseClient {
    results: Mutex<HashMap<String, VecDeque<Scripted<Bson>>>>,
    calls: Mutex<Vec<(Namespace, DatabaseOperation)>>,
}

impl RecordingDatabaseClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `script` for the next `operation` call
    #[must_use]
    pub fn then(self, operation: &str, script: Scripted<Bson>) -> Self {
        self.results
            .lock()
            .entry(operation.to_string())
            .or_default()
            .push_back(script);
        self
    }

    /// Queue a successful result
    #[must_use]
    pub fn returning(self, operation: &str, value: Bson) -> Self {
        self.then(operation, Scripted::Reply(value))
    }

    /// Queue a failure
    #[must_use]
    pub fn failing(self, operation: &str, message: &str) -> Self {
        self.then(
            operation,
            Scripted::Fail {
                message: message.to_string(),
                reply: None,
            },
        )
    }

    /// Every call received, in order
    pub fn calls(&self) -> Vec<(Namespace, DatabaseOperation)> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl DatabaseClient for RecordingDatabaseClient {
    async fn execute(
        &self,
        namespace: &Namespace,
        operation: &DatabaseOperation,
    ) -> Result<Bson, DatabaseFailure> {
        self.calls.lock().push((namespace.clone(), operation.clone()));

        let script = self
            .results
            .lock()
            .get_mut(operation.name())
            .and_then(VecDeque::pop_front);

        match script {
            None => Ok(Bson::Array(Vec::new())),
            Some(Scripted::Reply(value)) => Ok(value),
            Some(Scripted::Fail { message, .. }) => Err(DatabaseFailure(message)),
            Some(Scripted::Hang) => std::future::pending().await,
        }
    }
}

/// Connector handing out one shared [`RecordingDatabaseClient`]
#[derive(Debug)]
pub struct RecordingConnector {
    client: Arc<RecordingDatabaseClient>,
    endpoints: Mutex<Vec<String>>,
    refuse: bool,
}

impl RecordingConnector {
    pub fn new(client: Arc<RecordingDatabaseClient>) -> Self {
        Self {
            client,
            endpoints: Mutex::new(Vec::new()),
            refuse: false,
        }
    }

    /// Connector whose every connection attempt fails
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::new(Arc::new(RecordingDatabaseClient::new()))
        }
    }

    /// Endpoints connected to, in order
    pub fn endpoints(&self) -> Vec<String> {
        self.endpoints.lock().clone()
    }
}

#[async_trait::async_trait]
impl ClientConnector for RecordingConnector {
    async fn connect(&self, endpoint: &str) -> Result<Arc<dyn DatabaseClient>, OrchestrationError> {
        self.endpoints.lock().push(endpoint.to_string());
        if self.refuse {
            return Err(OrchestrationError::ConnectFailed {
                endpoint: endpoint.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(Arc::clone(&self.client) as Arc<dyn DatabaseClient>)
    }
}

// Fixtures

/// Specification document with the given topology, id and phases
pub fn spec_document(topology: &str, id: &str, phases: Vec<Bson>) -> Document {
    doc! {
        "description": format!("{topology} fixture"),
        "type": topology,
        "initConfig": { "id": id, "name": "mongod" },
        "phases": phases,
    }
}

/// Parsed specification with the given topology, id and phases
pub fn spec(topology: &str, id: &str, phases: Vec<Bson>) -> TestSpecification {
    TestSpecification::from_document(&spec_document(topology, id, phases)).unwrap()
}

/// `MOOperation` phase element
pub fn mo_phase(method: &str, uri: &str, payload: Document) -> Bson {
    Bson::Document(doc! {
        "MOOperation": { "method": method, "uri": uri, "payload": payload },
    })
}

/// `clientOperation` phase element
pub fn client_phase(body: Document) -> Bson {
    Bson::Document(doc! { "clientOperation": body })
}

/// Configuration with a short call timeout
pub fn test_config() -> DriverConfig {
    DriverConfig::new().with_command_timeout_ms(200)
}

/// Executor over `service` with the [`test_config`] timeout
pub fn executor(service: Arc<RecordingOrchestrationService>) -> Arc<CommandExecutor> {
    Arc::new(CommandExecutor::new(service, Duration::from_millis(200)))
}
