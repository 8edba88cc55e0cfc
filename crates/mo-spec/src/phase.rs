//! Test phases
//!
//! Each element of `phases` is a document with exactly one key naming the
//! phase kind, matched ignoring case:
//!
//! ```json
//! { "MOOperation": { "method": "POST", "uri": "/v1/servers/A", "payload": { "action": "restart" } } }
//! { "clientOperation": { "operation": "insertOne", "document": { "_id": 1 }, "outcome": {} } }
//! ```

use crate::command::CommandEnvelope;
use crate::document::get_case_insensitive;
use crate::error::SpecError;
use crate::operation::{DatabaseOperation, Outcome};
use bson::{doc, Bson, Document};

/// Key of an orchestration-service phase
pub const MO_OPERATION_KEY: &str = "MOOperation";
/// Key of a database-client phase
pub const CLIENT_OPERATION_KEY: &str = "clientOperation";

/// One step of a test
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Request against the orchestration service
    Orchestration(OrchestrationOperation),
    /// Operation against the provisioned deployment
    Client(ClientOperation),
}

impl Phase {
    /// Parse the phase at `index`
    ///
    /// # Errors
    /// [`SpecError::MalformedPhase`] unless the element is a document with
    /// exactly one recognized key; the handler-specific malformed errors when
    /// the body is incomplete.
    pub fn parse(index: usize, element: &Bson) -> Result<Self, SpecError> {
        let Bson::Document(doc) = element else {
            return Err(SpecError::malformed_phase(index, "phase must be a document"));
        };

        let mut entries = doc.iter();
        let (key, body) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            (None, _) => {
                return Err(SpecError::malformed_phase(index, "phase has no operation key"))
            }
            (Some(_), Some(_)) => {
                return Err(SpecError::malformed_phase(
                    index,
                    format!("phase has {} top-level keys, expected exactly one", doc.len()),
                ))
            }
        };

        if key.eq_ignore_ascii_case(MO_OPERATION_KEY) {
            OrchestrationOperation::parse(index, body).map(Self::Orchestration)
        } else if key.eq_ignore_ascii_case(CLIENT_OPERATION_KEY) {
            ClientOperation::parse(index, body).map(Self::Client)
        } else {
            Err(SpecError::malformed_phase(
                index,
                format!("unrecognized phase key '{key}'"),
            ))
        }
    }

    /// Kind name used in logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Orchestration(_) => MO_OPERATION_KEY,
            Self::Client(_) => CLIENT_OPERATION_KEY,
        }
    }
}

/// `MOOperation`: a raw request to the orchestration service
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestrationOperation {
    pub method: String,
    pub uri: String,
    pub payload: Document,
}

impl OrchestrationOperation {
    fn parse(index: usize, body: &Bson) -> Result<Self, SpecError> {
        let malformed = |reason: &str| SpecError::MalformedOrchestrationOperation {
            index,
            reason: reason.to_string(),
        };

        let Bson::Document(body) = body else {
            return Err(malformed("body must be a document"));
        };

        let method = match get_case_insensitive(body, "method") {
            Some(Bson::String(s)) => s.clone(),
            Some(_) => return Err(malformed("method must be a string")),
            None => return Err(malformed("missing method")),
        };
        let uri = match get_case_insensitive(body, "uri") {
            Some(Bson::String(s)) => s.clone(),
            Some(_) => return Err(malformed("uri must be a string")),
            None => return Err(malformed("missing uri")),
        };
        let payload = match get_case_insensitive(body, "payload") {
            Some(Bson::Document(d)) => d.clone(),
            Some(_) => return Err(malformed("payload must be a document")),
            None => return Err(malformed("missing payload")),
        };

        Ok(Self {
            method,
            uri,
            payload,
        })
    }

    /// Envelope for this request; the payload travels under `body`
    #[must_use]
    pub fn to_envelope(&self) -> CommandEnvelope {
        CommandEnvelope::new(&self.method, self.uri.clone())
            .with_body(doc! { "body": self.payload.clone() })
    }
}

/// `clientOperation`: a database call plus its expected outcome
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOperation {
    pub operation: DatabaseOperation,
    pub outcome: Outcome,
    /// Overrides the configured collection
    pub collection: Option<String>,
    /// Overrides the configured database
    pub database: Option<String>,
}

/// Keys a `clientOperation` body may carry, in their canonical spelling
const CLIENT_OPERATION_FIELDS: &[&str] = &[
    "operation",
    "outcome",
    "collection",
    "database",
    "filter",
    "sort",
    "limit",
    "document",
    "documents",
    "update",
    "upsert",
    "fieldName",
    "pipeline",
    "command",
];

/// Respell known keys canonically; two keys naming the same field are an error
fn canonical_client_body(body: &Document) -> Result<Document, String> {
    let mut canonical = Document::new();
    for (key, value) in body {
        let name = CLIENT_OPERATION_FIELDS
            .iter()
            .find(|field| field.eq_ignore_ascii_case(key))
            .copied()
            .unwrap_or(key.as_str());
        if canonical.contains_key(name) {
            return Err(format!("'{key}' repeats field '{name}'"));
        }
        canonical.insert(name, value.clone());
    }
    Ok(canonical)
}

impl ClientOperation {
    fn parse(index: usize, body: &Bson) -> Result<Self, SpecError> {
        let malformed = |reason: String| SpecError::MalformedClientOperation { index, reason };

        let Bson::Document(body) = body else {
            return Err(malformed("body must be a document".to_string()));
        };
        let body = canonical_client_body(body).map_err(&malformed)?;

        let operation: DatabaseOperation =
            bson::from_document(body.clone()).map_err(|e| malformed(e.to_string()))?;

        let outcome = match get_case_insensitive(&body, "outcome") {
            Some(value @ Bson::Document(_)) => {
                bson::from_bson(value.clone()).map_err(|e| malformed(format!("outcome: {e}")))?
            }
            Some(_) => return Err(malformed("outcome must be a document".to_string())),
            None => Outcome::default(),
        };

        let name_field = |field: &str| match get_case_insensitive(&body, field) {
            Some(Bson::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(malformed(format!("{field} must be a string"))),
            None => Ok(None),
        };
        let collection = name_field("collection")?;
        let database = name_field("database")?;

        Ok(Self {
            operation,
            outcome,
            collection,
            database,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::bson;

    #[test]
    fn parses_orchestration_phase() {
        let element = bson!({
            "MOOperation": { "method": "POST", "uri": "/servers/A", "payload": { "action": "restart" } }
        });
        let Phase::Orchestration(op) = Phase::parse(0, &element).unwrap() else {
            panic!("expected orchestration phase");
        };
        let env = op.to_envelope();
        assert_eq!(env.verb(), "post");
        assert_eq!(env.path(), "/servers/A");
        assert_eq!(env.body(), Some(&doc! { "body": { "action": "restart" } }));
    }

    #[test]
    fn phase_key_ignores_case() {
        let element = bson!({ "mooperation": { "method": "delete", "uri": "/u", "payload": {} } });
        assert_eq!(Phase::parse(0, &element).unwrap().kind(), MO_OPERATION_KEY);

        let element = bson!({ "CLIENTOPERATION": { "operation": "find" } });
        assert_eq!(Phase::parse(0, &element).unwrap().kind(), CLIENT_OPERATION_KEY);
    }

    #[test]
    fn two_keys_are_malformed() {
        let element = bson!({
            "MOOperation": { "method": "POST", "uri": "/u", "payload": {} },
            "clientOperation": { "operation": "find" },
        });
        assert!(matches!(
            Phase::parse(3, &element).unwrap_err(),
            SpecError::MalformedPhase { index: 3, .. }
        ));
    }

    #[test]
    fn empty_and_unknown_keys_are_malformed() {
        for element in [bson!({}), bson!({ "sleep": 5 }), bson!("MOOperation")] {
            assert!(matches!(
                Phase::parse(0, &element).unwrap_err(),
                SpecError::MalformedPhase { .. }
            ));
        }
    }

    #[test]
    fn orchestration_fields_are_required() {
        let element = bson!({ "MOOperation": { "method": "POST", "uri": "/u" } });
        let err = Phase::parse(1, &element).unwrap_err();
        assert_eq!(
            err,
            SpecError::MalformedOrchestrationOperation {
                index: 1,
                reason: "missing payload".into()
            }
        );
    }

    #[test]
    fn client_phase_reads_overrides_and_outcome() {
        let element = bson!({
            "clientOperation": {
                "operation": "countDocuments",
                "collection": "c",
                "database": "d",
                "outcome": { "result": 0 },
            }
        });
        let Phase::Client(op) = Phase::parse(0, &element).unwrap() else {
            panic!("expected client phase");
        };
        assert_eq!(op.operation.name(), "countDocuments");
        assert_eq!(op.collection.as_deref(), Some("c"));
        assert_eq!(op.database.as_deref(), Some("d"));
        assert_eq!(op.outcome.result, Some(Bson::Int32(0)));
    }

    #[test]
    fn unknown_client_operation_is_malformed() {
        let element = bson!({ "clientOperation": { "operation": "teleport" } });
        assert!(matches!(
            Phase::parse(0, &element).unwrap_err(),
            SpecError::MalformedClientOperation { .. }
        ));
    }

    #[test]
    fn client_keys_ignore_case() {
        let element = bson!({
            "clientOperation": {
                "Operation": "countDocuments",
                "Outcome": { "result": 5 },
                "COLLECTION": "c",
                "Database": "d",
            }
        });
        let Phase::Client(op) = Phase::parse(0, &element).unwrap() else {
            panic!("expected client phase");
        };
        assert_eq!(op.operation.name(), "countDocuments");
        assert_eq!(op.outcome.result, Some(Bson::Int32(5)));
        assert_eq!(op.collection.as_deref(), Some("c"));
        assert_eq!(op.database.as_deref(), Some("d"));
    }

    #[test]
    fn operation_arguments_ignore_case() {
        let element = bson!({
            "clientOperation": { "operation": "distinct", "FieldName": "x", "Filter": { "y": 1 } }
        });
        let Phase::Client(op) = Phase::parse(0, &element).unwrap() else {
            panic!("expected client phase");
        };
        assert_eq!(
            op.operation,
            DatabaseOperation::Distinct {
                field_name: "x".into(),
                filter: doc! { "y": 1 },
            }
        );
    }

    #[test]
    fn keys_differing_only_in_case_are_malformed() {
        let element = bson!({
            "clientOperation": {
                "operation": "countDocuments",
                "outcome": { "result": 0 },
                "Outcome": { "result": 5 },
            }
        });
        let err = Phase::parse(2, &element).unwrap_err();
        assert_eq!(
            err,
            SpecError::MalformedClientOperation {
                index: 2,
                reason: "'Outcome' repeats field 'outcome'".into()
            }
        );
    }
}
