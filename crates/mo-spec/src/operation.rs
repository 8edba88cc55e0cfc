//! Database-level operations a `clientOperation` phase can request, and the
//! outcome it expects

use bson::{Bson, Document};
use serde::Deserialize;

/// A call against the provisioned deployment, keyed by `operation`
///
/// Arguments are read from the same document as the `operation` name; other
/// keys (`outcome`, `collection`, `database`) are ignored here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum DatabaseOperation {
    Find {
        #[serde(default)]
        filter: Document,
        #[serde(default)]
        sort: Option<Document>,
        #[serde(default)]
        limit: Option<i64>,
    },
    InsertOne {
        document: Document,
    },
    InsertMany {
        documents: Vec<Document>,
    },
    UpdateOne {
        filter: Document,
        update: Document,
        #[serde(default)]
        upsert: bool,
    },
    UpdateMany {
        filter: Document,
        update: Document,
        #[serde(default)]
        upsert: bool,
    },
    DeleteOne {
        filter: Document,
    },
    DeleteMany {
        filter: Document,
    },
    CountDocuments {
        #[serde(default)]
        filter: Document,
    },
    Distinct {
        #[serde(rename = "fieldName")]
        field_name: String,
        #[serde(default)]
        filter: Document,
    },
    Aggregate {
        pipeline: Vec<Document>,
    },
    RunCommand {
        command: Document,
    },
}

impl DatabaseOperation {
    /// Operation name as written in a specification
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Find { .. } => "find",
            Self::InsertOne { .. } => "insertOne",
            Self::InsertMany { .. } => "insertMany",
            Self::UpdateOne { .. } => "updateOne",
            Self::UpdateMany { .. } => "updateMany",
            Self::DeleteOne { .. } => "deleteOne",
            Self::DeleteMany { .. } => "deleteMany",
            Self::CountDocuments { .. } => "countDocuments",
            Self::Distinct { .. } => "distinct",
            Self::Aggregate { .. } => "aggregate",
            Self::RunCommand { .. } => "runCommand",
        }
    }
}

/// What a client operation is expected to produce
///
/// Every field is optional; an empty outcome accepts any success.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Outcome {
    /// Expected return value, matched structurally
    pub result: Option<Bson>,
    /// Whether the operation must fail (`true`) or succeed (`false`)
    pub error: Option<bool>,
    /// Substring the failure message must contain, case-insensitive
    pub error_contains: Option<String>,
    /// Expected collection contents after the operation
    pub collection: Option<CollectionOutcome>,
}

impl Outcome {
    /// Whether the outcome says anything about failure
    #[must_use]
    pub fn expects_error(&self) -> bool {
        self.error == Some(true) || self.error_contains.is_some()
    }

    /// Whether the outcome constrains success or failure at all
    #[must_use]
    pub fn declares_result_or_error(&self) -> bool {
        self.result.is_some() || self.error.is_some() || self.error_contains.is_some()
    }
}

/// Expected contents of a collection, compared in `_id` order
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectionOutcome {
    /// Collection to read; defaults to the operation's collection
    #[serde(default)]
    pub name: Option<String>,
    /// Documents expected, in `_id` order
    pub data: Vec<Document>,
}
