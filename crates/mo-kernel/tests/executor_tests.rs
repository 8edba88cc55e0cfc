//! Command Executor Tests
//!
//! Wire form of envelopes, reply handling and the per-call timeout.

use bson::{doc, Bson};
use mo_kernel::error::OrchestrationError;
use mo_kernel::executor::CommandExecutor;
use mo_spec::CommandEnvelope;
use mo_test_utils::{RecordingOrchestrationService, Scripted};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_envelope_survives_wire_round_trip() {
    let reply = doc! {
        "ok": 1,
        "mongodb_uri": "mongodb://localhost:27017",
        "members": [{ "_id": 0, "host": "localhost:27017" }],
        "ratio": 0.5,
        "size": 9_000_000_000_i64,
    };
    let service = Arc::new(RecordingOrchestrationService::new().on(
        "post",
        "/v1/replica_sets",
        Scripted::Reply(reply.clone()),
    ));
    let executor = CommandExecutor::new(service.clone(), Duration::from_secs(1));

    let body = doc! { "id": "repl0", "members": [{ "procParams": { "port": 27017 } }] };
    let received = executor
        .execute(&CommandEnvelope::post("/v1/replica_sets", body.clone()))
        .await
        .unwrap();

    assert_eq!(received, reply);
    assert_eq!(received.get("size"), Some(&Bson::Int64(9_000_000_000)));
    let envelopes = service.envelopes();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].verb(), "post");
    assert_eq!(envelopes[0].path(), "/v1/replica_sets");
    assert_eq!(envelopes[0].body(), Some(&body));
}

#[tokio::test]
async fn test_verb_is_lowercased_on_the_wire() {
    let service = Arc::new(RecordingOrchestrationService::new());
    let executor = CommandExecutor::new(service.clone(), Duration::from_secs(1));

    executor
        .execute(&CommandEnvelope::new("DELETE", "/v1/servers/s0"))
        .await
        .unwrap();

    assert_eq!(service.commands(), vec![doc! { "delete": "/v1/servers/s0" }]);
}

#[tokio::test]
async fn test_hanging_service_times_out() {
    let service = Arc::new(RecordingOrchestrationService::new().on(
        "post",
        "/v1/servers",
        Scripted::Hang,
    ));
    let executor = CommandExecutor::new(service, Duration::from_millis(50));

    let err = executor
        .execute(&CommandEnvelope::post("/v1/servers", doc! { "id": "s0" }))
        .await
        .unwrap_err();

    match err {
        OrchestrationError::CommandFailed { message, reply, .. } => {
            assert!(message.contains("timed out"), "{message}");
            assert!(reply.is_empty());
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unscripted_command_gets_ok() {
    let service = Arc::new(RecordingOrchestrationService::new());
    let executor = CommandExecutor::new(service, Duration::from_secs(1));

    let reply = executor
        .execute(&CommandEnvelope::post("/v1/servers/s0", doc! { "action": "restart" }))
        .await
        .unwrap();

    assert_eq!(reply, doc! { "ok": 1 });
}
