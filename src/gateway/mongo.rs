//! MongoDB implementation of the gateway

use super::{redact_credentials, Connector, Document, Gateway, GatewayResult, LoggingGateway};
use crate::error::ConsoleError;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document as BsonDocument};
use mongodb::Client;
use serde_json::Value;
use std::sync::Arc;

/// Gateway over one `mongodb::Client`
pub struct MongoGateway {
    client: Client,
}

impl MongoGateway {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn collection(&self, db: &str, coll: &str) -> mongodb::Collection<BsonDocument> {
        self.client.database(db).collection::<BsonDocument>(coll)
    }
}

#[allow(clippy::needless_pass_by_value)] // used as a map_err adapter
fn db_error(e: mongodb::error::Error) -> ConsoleError {
    ConsoleError::database(e.to_string())
}

/// Parse relaxed/canonical extended JSON into a BSON document
fn to_bson(document: Document) -> GatewayResult<BsonDocument> {
    match Bson::try_from(Value::Object(document)) {
        Ok(Bson::Document(parsed)) => Ok(parsed),
        Ok(other) => Err(ConsoleError::malformed_input(format!(
            "expected a document, got {other}"
        ))),
        Err(e) => Err(ConsoleError::malformed_input(e.to_string())),
    }
}

fn to_json(document: BsonDocument) -> Document {
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        other => {
            let mut map = Document::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

fn filter_or_all(filter: Option<&Document>) -> GatewayResult<BsonDocument> {
    filter.map_or_else(|| Ok(doc! {}), |f| to_bson(f.clone()))
}

#[async_trait]
impl Gateway for MongoGateway {
    async fn ping(&self) -> GatewayResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn list_databases(&self) -> GatewayResult<Vec<String>> {
        self.client.list_database_names().await.map_err(db_error)
    }

    async fn list_collections(&self, db: &str) -> GatewayResult<Vec<String>> {
        self.client
            .database(db)
            .list_collection_names()
            .await
            .map_err(db_error)
    }

    async fn count_documents(
        &self,
        db: &str,
        coll: &str,
        filter: Option<&Document>,
    ) -> GatewayResult<u64> {
        let filter = filter_or_all(filter)?;
        self.collection(db, coll)
            .count_documents(filter)
            .await
            .map_err(db_error)
    }

    async fn find_documents(
        &self,
        db: &str,
        coll: &str,
        filter: Option<&Document>,
        skip: u64,
        limit: u64,
    ) -> GatewayResult<Vec<Document>> {
        let filter = filter_or_all(filter)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let cursor = self
            .collection(db, coll)
            .find(filter)
            .skip(skip)
            .limit(limit)
            .await
            .map_err(db_error)?;
        let documents: Vec<BsonDocument> = cursor.try_collect().await.map_err(db_error)?;
        Ok(documents.into_iter().map(to_json).collect())
    }

    async fn insert_one(&self, db: &str, coll: &str, document: Document) -> GatewayResult<Value> {
        let document = to_bson(document)?;
        let result = self
            .collection(db, coll)
            .insert_one(document)
            .await
            .map_err(db_error)?;
        Ok(result.inserted_id.into_relaxed_extjson())
    }

    async fn update_one(
        &self,
        db: &str,
        coll: &str,
        filter: Document,
        update: Document,
    ) -> GatewayResult<u64> {
        let filter = to_bson(filter)?;
        let update = to_bson(update)?;
        let result = self
            .collection(db, coll)
            .update_one(filter, update)
            .await
            .map_err(db_error)?;
        Ok(result.modified_count)
    }

    async fn delete_one(&self, db: &str, coll: &str, filter: Document) -> GatewayResult<u64> {
        let filter = to_bson(filter)?;
        let result = self
            .collection(db, coll)
            .delete_one(filter)
            .await
            .map_err(db_error)?;
        Ok(result.deleted_count)
    }

    async fn delete_many(&self, db: &str, coll: &str) -> GatewayResult<u64> {
        let result = self
            .collection(db, coll)
            .delete_many(doc! {})
            .await
            .map_err(db_error)?;
        Ok(result.deleted_count)
    }

    async fn drop_collection(&self, db: &str, coll: &str) -> GatewayResult<()> {
        self.collection(db, coll).drop().await.map_err(db_error)
    }

    async fn drop_database(&self, db: &str) -> GatewayResult<()> {
        self.client.database(db).drop().await.map_err(db_error)
    }

    async fn create_collection(&self, db: &str, coll: &str) -> GatewayResult<()> {
        self.client
            .database(db)
            .create_collection(coll)
            .await
            .map_err(db_error)
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}

/// Connects with `Client::with_uri_str` and verifies liveness with a ping
#[derive(Debug, Default, Clone)]
pub struct MongoConnector;

#[async_trait]
impl Connector for MongoConnector {
    async fn connect(&self, url: &str) -> GatewayResult<Arc<dyn Gateway>> {
        tracing::info!(url = %redact_credentials(url), "Opening cluster connection");
        let client = Client::with_uri_str(url)
            .await
            .map_err(|e| ConsoleError::connection(e.to_string()))?;
        let gateway = MongoGateway::new(client);
        if let Err(e) = gateway.ping().await {
            gateway.close().await;
            return Err(ConsoleError::connection(e.message));
        }
        Ok(Arc::new(LoggingGateway::new(Arc::new(gateway))))
    }
}
