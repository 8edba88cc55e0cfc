//! `mongodb` driver implementation of the client seam

use super::{ClientConnector, DatabaseClient, DatabaseFailure, Namespace};
use crate::error::OrchestrationError;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mo_spec::DatabaseOperation;
use mongodb::options::{FindOptions, UpdateOptions};
use mongodb::results::UpdateResult;
use mongodb::Client;
use std::sync::Arc;

/// Opens [`MongoDatabaseClient`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoConnector;

#[async_trait::async_trait]
impl ClientConnector for MongoConnector {
    async fn connect(&self, endpoint: &str) -> Result<Arc<dyn DatabaseClient>, OrchestrationError> {
        let client = Client::with_uri_str(endpoint)
            .await
            .map_err(|e| OrchestrationError::ConnectFailed {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;
        Ok(Arc::new(MongoDatabaseClient::new(client)))
    }
}

/// [`DatabaseClient`] over a `mongodb::Client`
#[derive(Debug, Clone)]
pub struct MongoDatabaseClient {
    client: Client,
}

impl MongoDatabaseClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl DatabaseClient for MongoDatabaseClient {
    async fn execute(
        &self,
        namespace: &Namespace,
        operation: &DatabaseOperation,
    ) -> Result<Bson, DatabaseFailure> {
        let db = self.client.database(&namespace.database);
        let coll = db.collection::<Document>(&namespace.collection);

        let value = match operation {
            DatabaseOperation::Find {
                filter,
                sort,
                limit,
            } => {
                let options = FindOptions::builder()
                    .sort(sort.clone())
                    .limit(*limit)
                    .build();
                let docs: Vec<Document> = coll
                    .find(filter.clone(), options)
                    .await
                    .map_err(failure)?
                    .try_collect()
                    .await
                    .map_err(failure)?;
                documents_to_array(docs)
            }
            DatabaseOperation::InsertOne { document } => {
                let result = coll.insert_one(document.clone(), None).await.map_err(failure)?;
                Bson::Document(doc! { "insertedId": result.inserted_id })
            }
            DatabaseOperation::InsertMany { documents } => {
                let result = coll
                    .insert_many(documents.clone(), None)
                    .await
                    .map_err(failure)?;
                let mut ids: Vec<_> = result.inserted_ids.into_iter().collect();
                ids.sort_by_key(|(index, _)| *index);
                let inserted: Document = ids
                    .into_iter()
                    .map(|(index, id)| (index.to_string(), id))
                    .collect();
                Bson::Document(doc! { "insertedIds": inserted })
            }
            DatabaseOperation::UpdateOne {
                filter,
                update,
                upsert,
            } => {
                let options = UpdateOptions::builder().upsert(*upsert).build();
                let result = coll
                    .update_one(filter.clone(), update.clone(), options)
                    .await
                    .map_err(failure)?;
                update_result(result)
            }
            DatabaseOperation::UpdateMany {
                filter,
                update,
                upsert,
            } => {
                let options = UpdateOptions::builder().upsert(*upsert).build();
                let result = coll
                    .update_many(filter.clone(), update.clone(), options)
                    .await
                    .map_err(failure)?;
                update_result(result)
            }
            DatabaseOperation::DeleteOne { filter } => {
                let result = coll.delete_one(filter.clone(), None).await.map_err(failure)?;
                Bson::Document(doc! { "deletedCount": count(result.deleted_count) })
            }
            DatabaseOperation::DeleteMany { filter } => {
                let result = coll.delete_many(filter.clone(), None).await.map_err(failure)?;
                Bson::Document(doc! { "deletedCount": count(result.deleted_count) })
            }
            DatabaseOperation::CountDocuments { filter } => {
                let n = coll
                    .count_documents(filter.clone(), None)
                    .await
                    .map_err(failure)?;
                Bson::Int64(count(n))
            }
            DatabaseOperation::Distinct { field_name, filter } => {
                let values = coll
                    .distinct(field_name.as_str(), filter.clone(), None)
                    .await
                    .map_err(failure)?;
                Bson::Array(values)
            }
            DatabaseOperation::Aggregate { pipeline } => {
                let docs: Vec<Document> = coll
                    .aggregate(pipeline.clone(), None)
                    .await
                    .map_err(failure)?
                    .try_collect()
                    .await
                    .map_err(failure)?;
                documents_to_array(docs)
            }
            DatabaseOperation::RunCommand { command } => {
                let reply = db.run_command(command.clone(), None).await.map_err(failure)?;
                Bson::Document(reply)
            }
        };

        Ok(value)
    }
}

fn failure(error: mongodb::error::Error) -> DatabaseFailure {
    DatabaseFailure(error.to_string())
}

fn count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn documents_to_array(docs: Vec<Document>) -> Bson {
    Bson::Array(docs.into_iter().map(Bson::Document).collect())
}

fn update_result(result: UpdateResult) -> Bson {
    let mut reply = doc! {
        "matchedCount": count(result.matched_count),
        "modifiedCount": count(result.modified_count),
        "upsertedCount": i64::from(result.upserted_id.is_some()),
    };
    if let Some(id) = result.upserted_id {
        reply.insert("upsertedId", id);
    }
    Bson::Document(reply)
}
