//! Database gateway
//!
//! Thin adapter over a connected cluster handle. Each operation performs
//! exactly one driver call and never retries; failures surface as
//! `ErrorKind::Database` with the driver message passed through.

mod mongo;

pub use mongo::MongoConnector;

use crate::error::ConsoleError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// A stored document in relaxed extended JSON form
pub type Document = Map<String, Value>;

pub type GatewayResult<T> = Result<T, ConsoleError>;

/// Operations the console invokes against one cluster handle
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Verify the cluster answers
    async fn ping(&self) -> GatewayResult<()>;

    async fn list_databases(&self) -> GatewayResult<Vec<String>>;

    async fn list_collections(&self, db: &str) -> GatewayResult<Vec<String>>;

    /// Count documents matching `filter` (all documents when `None`)
    async fn count_documents(
        &self,
        db: &str,
        coll: &str,
        filter: Option<&Document>,
    ) -> GatewayResult<u64>;

    /// Fetch one page of documents
    async fn find_documents(
        &self,
        db: &str,
        coll: &str,
        filter: Option<&Document>,
        skip: u64,
        limit: u64,
    ) -> GatewayResult<Vec<Document>>;

    /// Insert one document, returning the generated identifier
    async fn insert_one(&self, db: &str, coll: &str, document: Document) -> GatewayResult<Value>;

    /// Update the first matching document, returning the modified count
    async fn update_one(
        &self,
        db: &str,
        coll: &str,
        filter: Document,
        update: Document,
    ) -> GatewayResult<u64>;

    /// Delete the first matching document, returning the deleted count
    async fn delete_one(&self, db: &str, coll: &str, filter: Document) -> GatewayResult<u64>;

    /// Delete every document in the collection, returning the deleted count
    async fn delete_many(&self, db: &str, coll: &str) -> GatewayResult<u64>;

    async fn drop_collection(&self, db: &str, coll: &str) -> GatewayResult<()>;

    async fn drop_database(&self, db: &str) -> GatewayResult<()>;

    async fn create_collection(&self, db: &str, coll: &str) -> GatewayResult<()>;

    /// Release the underlying connection
    async fn close(&self);
}

/// Opens cluster handles from operator-supplied connection URLs
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a handle and verify liveness; failures are `ErrorKind::Connection`
    async fn connect(&self, url: &str) -> GatewayResult<Arc<dyn Gateway>>;
}

// ============================================================================
// Logging decorator
// ============================================================================

/// Logs duration and outcome of every gateway call
pub struct LoggingGateway {
    inner: Arc<dyn Gateway>,
}

impl LoggingGateway {
    pub fn new(inner: Arc<dyn Gateway>) -> Self {
        Self { inner }
    }
}

fn log_call<T>(operation: &str, target: &str, started: Instant, result: &GatewayResult<T>) {
    let duration_ms = started.elapsed().as_millis();
    match result {
        Ok(_) => tracing::info!(operation, target, duration_ms, "Gateway call completed"),
        Err(e) => tracing::warn!(
            operation,
            target,
            duration_ms,
            kind = e.kind.as_str(),
            error = %e.message,
            "Gateway call failed"
        ),
    }
}

#[async_trait]
impl Gateway for LoggingGateway {
    async fn ping(&self) -> GatewayResult<()> {
        let started = Instant::now();
        let result = self.inner.ping().await;
        log_call("ping", "", started, &result);
        result
    }

    async fn list_databases(&self) -> GatewayResult<Vec<String>> {
        let started = Instant::now();
        let result = self.inner.list_databases().await;
        log_call("list_databases", "", started, &result);
        result
    }

    async fn list_collections(&self, db: &str) -> GatewayResult<Vec<String>> {
        let started = Instant::now();
        let result = self.inner.list_collections(db).await;
        log_call("list_collections", db, started, &result);
        result
    }

    async fn count_documents(
        &self,
        db: &str,
        coll: &str,
        filter: Option<&Document>,
    ) -> GatewayResult<u64> {
        let started = Instant::now();
        let result = self.inner.count_documents(db, coll, filter).await;
        log_call("count_documents", &format!("{db}.{coll}"), started, &result);
        result
    }

    async fn find_documents(
        &self,
        db: &str,
        coll: &str,
        filter: Option<&Document>,
        skip: u64,
        limit: u64,
    ) -> GatewayResult<Vec<Document>> {
        let started = Instant::now();
        let result = self.inner.find_documents(db, coll, filter, skip, limit).await;
        log_call("find_documents", &format!("{db}.{coll}"), started, &result);
        result
    }

    async fn insert_one(&self, db: &str, coll: &str, document: Document) -> GatewayResult<Value> {
        let started = Instant::now();
        let result = self.inner.insert_one(db, coll, document).await;
        log_call("insert_one", &format!("{db}.{coll}"), started, &result);
        result
    }

    async fn update_one(
        &self,
        db: &str,
        coll: &str,
        filter: Document,
        update: Document,
    ) -> GatewayResult<u64> {
        let started = Instant::now();
        let result = self.inner.update_one(db, coll, filter, update).await;
        log_call("update_one", &format!("{db}.{coll}"), started, &result);
        result
    }

    async fn delete_one(&self, db: &str, coll: &str, filter: Document) -> GatewayResult<u64> {
        let started = Instant::now();
        let result = self.inner.delete_one(db, coll, filter).await;
        log_call("delete_one", &format!("{db}.{coll}"), started, &result);
        result
    }

    async fn delete_many(&self, db: &str, coll: &str) -> GatewayResult<u64> {
        let started = Instant::now();
        let result = self.inner.delete_many(db, coll).await;
        log_call("delete_many", &format!("{db}.{coll}"), started, &result);
        result
    }

    async fn drop_collection(&self, db: &str, coll: &str) -> GatewayResult<()> {
        let started = Instant::now();
        let result = self.inner.drop_collection(db, coll).await;
        log_call("drop_collection", &format!("{db}.{coll}"), started, &result);
        result
    }

    async fn drop_database(&self, db: &str) -> GatewayResult<()> {
        let started = Instant::now();
        let result = self.inner.drop_database(db).await;
        log_call("drop_database", db, started, &result);
        result
    }

    async fn create_collection(&self, db: &str, coll: &str) -> GatewayResult<()> {
        let started = Instant::now();
        let result = self.inner.create_collection(db, coll).await;
        log_call("create_collection", &format!("{db}.{coll}"), started, &result);
        result
    }

    async fn close(&self) {
        self.inner.close().await;
        tracing::debug!("Gateway connection released");
    }
}

/// Mask the password component of a connection URL for logging
pub fn redact_credentials(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return "[unparseable url]".to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    match authority.rsplit_once('@') {
        Some((userinfo, host)) => {
            let user = userinfo.split(':').next().unwrap_or_default();
            format!("{scheme}://{user}:***@{host}{tail}")
        }
        None => url.to_string(),
    }
}
