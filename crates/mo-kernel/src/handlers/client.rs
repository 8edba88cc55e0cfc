use crate::client::outcome::{check_result, match_value};
use crate::client::{DatabaseClient, DatabaseFailure, Namespace};
use crate::error::{ClientOperationError, DriverError};
use bson::{doc, Bson, Document};
use mo_spec::{ClientOperation, CollectionOutcome, DatabaseOperation};
use std::time::Duration;

/// Run a `clientOperation` phase and check its declared outcome
///
/// The phase's `database`/`collection` override `defaults`. Each database
/// call is bounded by `timeout`.
///
/// # Errors
/// - [`ClientOperationError::OutcomeMismatch`] when the result, the error
///   or the collection contents differ from the outcome
/// - [`ClientOperationError::CollectionReadFailed`] when the collection
///   cannot be read back
/// - [`ClientOperationError::Timeout`] when a call does not answer in time
pub async fn execute_client_operation(
    client: &dyn DatabaseClient,
    defaults: &Namespace,
    operation: &ClientOperation,
    timeout: Duration,
) -> Result<(), DriverError> {
    let name = operation.operation.name();
    let namespace =
        defaults.with_overrides(operation.database.as_deref(), operation.collection.as_deref());
    tracing::debug!(operation = name, namespace = %namespace, "client operation");

    let actual = call(client, &namespace, &operation.operation, name, timeout).await?;
    check_result(name, &operation.outcome, &actual)?;

    if let Some(expected) = &operation.outcome.collection {
        check_collection(client, &namespace, name, expected, timeout).await?;
    }
    Ok(())
}

async fn call(
    client: &dyn DatabaseClient,
    namespace: &Namespace,
    operation: &DatabaseOperation,
    name: &str,
    timeout: Duration,
) -> Result<Result<Bson, DatabaseFailure>, ClientOperationError> {
    tokio::time::timeout(timeout, client.execute(namespace, operation))
        .await
        .map_err(|_| ClientOperationError::Timeout {
            operation: name.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
}

/// Read the whole collection in `_id` order and compare with `expected.data`
async fn check_collection(
    client: &dyn DatabaseClient,
    namespace: &Namespace,
    name: &str,
    expected: &CollectionOutcome,
    timeout: Duration,
) -> Result<(), ClientOperationError> {
    let target = namespace.with_overrides(None, expected.name.as_deref());
    let read = DatabaseOperation::Find {
        filter: Document::new(),
        sort: Some(doc! { "_id": 1 }),
        limit: None,
    };

    let actual = call(client, &target, &read, name, timeout)
        .await?
        .map_err(|failure| ClientOperationError::CollectionReadFailed {
            operation: name.to_string(),
            collection: target.to_string(),
            message: failure.0,
        })?;

    let expected = Bson::Array(expected.data.iter().cloned().map(Bson::Document).collect());
    match_value(&expected, &actual, "collection.data").map_err(|m| m.into_error(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockDatabaseClient;
    use bson::bson;
    use mo_spec::Outcome;

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn defaults() -> Namespace {
        Namespace::new("test", "test")
    }

    fn insert_one(outcome: Outcome) -> ClientOperation {
        ClientOperation {
            operation: DatabaseOperation::InsertOne {
                document: doc! { "_id": 1, "x": 11 },
            },
            outcome,
            collection: None,
            database: None,
        }
    }

    #[tokio::test]
    async fn test_matching_result_passes() {
        let mut client = MockDatabaseClient::new();
        client
            .expect_execute()
            .withf(|ns, op| ns == &Namespace::new("test", "test") && op.name() == "insertOne")
            .times(1)
            .returning(|_, _| Ok(bson!({ "insertedId": 1 })));

        let op = insert_one(Outcome {
            result: Some(bson!({ "insertedId": 1 })),
            ..Outcome::default()
        });
        execute_client_operation(&client, &defaults(), &op, TIMEOUT)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_phase_namespace_overrides_defaults() {
        let mut client = MockDatabaseClient::new();
        client
            .expect_execute()
            .withf(|ns, _| ns == &Namespace::new("other", "things"))
            .times(1)
            .returning(|_, _| Ok(bson!({ "insertedId": 1 })));

        let mut op = insert_one(Outcome::default());
        op.database = Some("other".into());
        op.collection = Some("things".into());
        execute_client_operation(&client, &defaults(), &op, TIMEOUT)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_collection_data_is_read_sorted_by_id() {
        let mut client = MockDatabaseClient::new();
        let mut seq = mockall::Sequence::new();
        client
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(bson!({ "insertedId": 2 })));
        client
            .expect_execute()
            .withf(|_, op| {
                op == &DatabaseOperation::Find {
                    filter: Document::new(),
                    sort: Some(doc! { "_id": 1 }),
                    limit: None,
                }
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(bson!([{ "_id": 1, "x": 11 }, { "_id": 2, "x": 22 }])));

        let op = insert_one(Outcome {
            collection: Some(CollectionOutcome {
                name: None,
                data: vec![doc! { "_id": 1, "x": 11 }, doc! { "_id": 2, "x": 22 }],
            }),
            ..Outcome::default()
        });
        execute_client_operation(&client, &defaults(), &op, TIMEOUT)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_collection_data_mismatch_fails() {
        let mut client = MockDatabaseClient::new();
        let mut seq = mockall::Sequence::new();
        client
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(bson!({ "insertedId": 1 })));
        client
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(bson!([])));

        let op = insert_one(Outcome {
            collection: Some(CollectionOutcome {
                name: None,
                data: vec![doc! { "_id": 1 }],
            }),
            ..Outcome::default()
        });
        let err = execute_client_operation(&client, &defaults(), &op, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::ClientOperation(ClientOperationError::OutcomeMismatch { ref path, .. })
                if path == "collection.data"
        ));
    }

    #[tokio::test]
    async fn test_unreadable_collection_is_reported() {
        let mut client = MockDatabaseClient::new();
        let mut seq = mockall::Sequence::new();
        client
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(bson!({ "insertedId": 1 })));
        client
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(DatabaseFailure("not authorized".into())));

        let op = insert_one(Outcome {
            collection: Some(CollectionOutcome {
                name: Some("audit".into()),
                data: vec![],
            }),
            ..Outcome::default()
        });
        let err = execute_client_operation(&client, &defaults(), &op, TIMEOUT)
            .await
            .unwrap_err();
        match err {
            DriverError::ClientOperation(ClientOperationError::CollectionReadFailed {
                collection,
                message,
                ..
            }) => {
                assert_eq!(collection, "test.audit");
                assert_eq!(message, "not authorized");
            }
            other => panic!("expected CollectionReadFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expected_error_passes() {
        let mut client = MockDatabaseClient::new();
        client
            .expect_execute()
            .times(1)
            .returning(|_, _| Err(DatabaseFailure("E11000 duplicate key error".into())));

        let op = insert_one(Outcome {
            error: Some(true),
            ..Outcome::default()
        });
        execute_client_operation(&client, &defaults(), &op, TIMEOUT)
            .await
            .unwrap();
    }
}
