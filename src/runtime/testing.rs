//! Mock implementations for testing
//!
//! These mocks enable integration testing without a running cluster.

use crate::error::ConsoleError;
use crate::gateway::{Connector, Document, Gateway, GatewayResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

// ============================================================================
// Mock Gateway
// ============================================================================

type Collections = BTreeMap<String, Vec<Document>>;

/// In-memory cluster with equality-only filters
#[allow(dead_code)]
#[derive(Default)]
pub struct MockGateway {
    databases: Mutex<BTreeMap<String, Collections>>,
    failures: Mutex<VecDeque<ConsoleError>>,
    next_id: Mutex<u64>,
    closes: Mutex<usize>,
    /// Record of every call as `operation:target`
    pub calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next call with `error`
    pub fn fail_next(&self, error: ConsoleError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn seed(&self, db: &str, coll: &str, documents: Vec<Value>) {
        let mut databases = self.databases.lock().unwrap();
        let docs = databases
            .entry(db.to_string())
            .or_default()
            .entry(coll.to_string())
            .or_default();
        for doc in documents {
            if let Value::Object(map) = doc {
                docs.push(map);
            }
        }
    }

    pub fn documents(&self, db: &str, coll: &str) -> Vec<Document> {
        self.databases
            .lock()
            .unwrap()
            .get(db)
            .and_then(|colls| colls.get(coll))
            .cloned()
            .unwrap_or_default()
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, operation: &str) -> bool {
        self.recorded_calls()
            .iter()
            .any(|c| c.split(':').next() == Some(operation))
    }

    pub fn close_count(&self) -> usize {
        *self.closes.lock().unwrap()
    }

    fn record(&self, operation: &str, target: &str) -> GatewayResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{operation}:{target}"));
        match self.failures.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn matching(&self, db: &str, coll: &str, filter: Option<&Document>) -> Vec<Document> {
        self.documents(db, coll)
            .into_iter()
            .filter(|doc| filter.is_none_or(|f| matches(doc, f)))
            .collect()
    }
}

fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(k, v)| doc.get(k) == Some(v))
}

fn apply_update(doc: &mut Document, update: &Document) {
    if let Some(Value::Object(set)) = update.get("$set") {
        for (k, v) in set {
            doc.insert(k.clone(), v.clone());
        }
    }
    if let Some(Value::Object(inc)) = update.get("$inc") {
        for (k, by) in inc {
            let current = doc.get(k).and_then(Value::as_i64).unwrap_or(0);
            doc.insert(k.clone(), json!(current + by.as_i64().unwrap_or(0)));
        }
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn ping(&self) -> GatewayResult<()> {
        self.record("ping", "")
    }

    async fn list_databases(&self) -> GatewayResult<Vec<String>> {
        self.record("list_databases", "")?;
        Ok(self.databases.lock().unwrap().keys().cloned().collect())
    }

    async fn list_collections(&self, db: &str) -> GatewayResult<Vec<String>> {
        self.record("list_collections", db)?;
        Ok(self
            .databases
            .lock()
            .unwrap()
            .get(db)
            .map(|colls| colls.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn count_documents(
        &self,
        db: &str,
        coll: &str,
        filter: Option<&Document>,
    ) -> GatewayResult<u64> {
        self.record("count_documents", &format!("{db}.{coll}"))?;
        Ok(u64::try_from(self.matching(db, coll, filter).len()).unwrap())
    }

    async fn find_documents(
        &self,
        db: &str,
        coll: &str,
        filter: Option<&Document>,
        skip: u64,
        limit: u64,
    ) -> GatewayResult<Vec<Document>> {
        self.record("find_documents", &format!("{db}.{coll}"))?;
        Ok(self
            .matching(db, coll, filter)
            .into_iter()
            .skip(usize::try_from(skip).unwrap())
            .take(usize::try_from(limit).unwrap())
            .collect())
    }

    async fn insert_one(&self, db: &str, coll: &str, mut document: Document) -> GatewayResult<Value> {
        self.record("insert_one", &format!("{db}.{coll}"))?;
        let id = document.get("_id").cloned().unwrap_or_else(|| {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            json!({ "$oid": format!("{:024x}", *next) })
        });
        document.insert("_id".to_string(), id.clone());
        self.seed(db, coll, vec![Value::Object(document)]);
        Ok(id)
    }

    async fn update_one(
        &self,
        db: &str,
        coll: &str,
        filter: Document,
        update: Document,
    ) -> GatewayResult<u64> {
        self.record("update_one", &format!("{db}.{coll}"))?;
        let mut databases = self.databases.lock().unwrap();
        let Some(doc) = databases
            .get_mut(db)
            .and_then(|colls| colls.get_mut(coll))
            .and_then(|docs| docs.iter_mut().find(|d| matches(d, &filter)))
        else {
            return Ok(0);
        };
        apply_update(doc, &update);
        Ok(1)
    }

    async fn delete_one(&self, db: &str, coll: &str, filter: Document) -> GatewayResult<u64> {
        self.record("delete_one", &format!("{db}.{coll}"))?;
        let mut databases = self.databases.lock().unwrap();
        let Some(docs) = databases.get_mut(db).and_then(|colls| colls.get_mut(coll)) else {
            return Ok(0);
        };
        match docs.iter().position(|d| matches(d, &filter)) {
            Some(i) => {
                docs.remove(i);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, db: &str, coll: &str) -> GatewayResult<u64> {
        self.record("delete_many", &format!("{db}.{coll}"))?;
        let mut databases = self.databases.lock().unwrap();
        Ok(databases
            .get_mut(db)
            .and_then(|colls| colls.get_mut(coll))
            .map_or(0, |docs| u64::try_from(docs.drain(..).count()).unwrap()))
    }

    async fn drop_collection(&self, db: &str, coll: &str) -> GatewayResult<()> {
        self.record("drop_collection", &format!("{db}.{coll}"))?;
        let mut databases = self.databases.lock().unwrap();
        if let Some(colls) = databases.get_mut(db) {
            colls.remove(coll);
            // A database without collections no longer exists
            if colls.is_empty() {
                databases.remove(db);
            }
        }
        Ok(())
    }

    async fn drop_database(&self, db: &str) -> GatewayResult<()> {
        self.record("drop_database", db)?;
        self.databases.lock().unwrap().remove(db);
        Ok(())
    }

    async fn create_collection(&self, db: &str, coll: &str) -> GatewayResult<()> {
        self.record("create_collection", &format!("{db}.{coll}"))?;
        let mut databases = self.databases.lock().unwrap();
        let colls = databases.entry(db.to_string()).or_default();
        if colls.contains_key(coll) {
            return Err(ConsoleError::database(format!(
                "Collection {db}.{coll} already exists."
            )));
        }
        colls.insert(coll.to_string(), Vec::new());
        Ok(())
    }

    async fn close(&self) {
        *self.closes.lock().unwrap() += 1;
    }
}

// ============================================================================
// Mock Connector
// ============================================================================

/// Accepts `mongodb://` URLs and hands out one shared mock cluster
#[allow(dead_code)]
pub struct MockConnector {
    gateway: Arc<MockGateway>,
    pub urls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockConnector {
    pub fn new(gateway: Arc<MockGateway>) -> Self {
        Self {
            gateway,
            urls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, url: &str) -> GatewayResult<Arc<dyn Gateway>> {
        self.urls.lock().unwrap().push(url.to_string());
        if !(url.starts_with("mongodb://") || url.starts_with("mongodb+srv://")) {
            return Err(ConsoleError::connection(
                "connection string must start with mongodb:// or mongodb+srv://",
            ));
        }
        Ok(self.gateway.clone())
    }
}

// ============================================================================
// Console tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{self, NavToken};
    use crate::runtime::{Console, Inbound, Outbound, BUSY, NO_SESSION, STOPPED};
    use crate::paginate::transport_len;
    use crate::session::{InMemorySessions, UserId};
    use crate::state_machine::{ConvContext, ConvState};

    const USER: UserId = UserId(42);
    const URL: &str = "mongodb://localhost:27017";

    fn console_with(page_size: u64, max_message_len: usize) -> (Console, Arc<MockGateway>) {
        let gateway = Arc::new(MockGateway::new());
        let console = Console::new(
            Arc::new(InMemorySessions::new()),
            Arc::new(MockConnector::new(gateway.clone())),
            ConvContext::new(page_size),
            max_message_len,
        );
        (console, gateway)
    }

    fn console() -> (Console, Arc<MockGateway>) {
        console_with(2, 4096)
    }

    async fn connected() -> (Console, Arc<MockGateway>) {
        let (console, gateway) = console();
        console.handle(USER, Inbound::Start).await;
        let out = console.handle(USER, Inbound::Text(URL.to_string())).await;
        assert!(last(&out).text.contains("Connected successfully!"));
        (console, gateway)
    }

    async fn state(console: &Console) -> ConvState {
        let handle = console.sessions().get(USER).await.unwrap();
        let session = handle.lock().await;
        session.conversation.state
    }

    async fn press(console: &Console, token: NavToken) -> Vec<Outbound> {
        console.handle(USER, Inbound::Button(token.encode())).await
    }

    async fn send(console: &Console, text: &str) -> Vec<Outbound> {
        console.handle(USER, Inbound::Text(text.to_string())).await
    }

    fn last(out: &[Outbound]) -> &Outbound {
        out.last().unwrap()
    }

    fn labels(out: &[Outbound]) -> Vec<String> {
        last(out)
            .menu
            .as_ref()
            .map(|m| m.entries().map(|e| e.label.clone()).collect())
            .unwrap_or_default()
    }

    fn users(coll: &str) -> NavToken {
        NavToken::Collection {
            db: "shop".to_string(),
            coll: coll.to_string(),
        }
    }

    #[tokio::test]
    async fn test_events_without_session_are_rejected() {
        let (console, _) = console();
        for inbound in [
            Inbound::Text("hello".to_string()),
            Inbound::Cancel,
            Inbound::Button(NavToken::MainMenu.encode()),
            Inbound::Stop,
        ] {
            let out = console.handle(USER, inbound).await;
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].text, NO_SESSION);
        }
        assert_eq!(console.sessions().len().await, 0);
    }

    #[tokio::test]
    async fn test_connection_failure_allows_retry() {
        let (console, _) = console();
        let out = console.handle(USER, Inbound::Start).await;
        assert!(out[0].text.starts_with("Welcome to the MongoDB Management Bot!"));

        let out = send(&console, "localhost:27017").await;
        assert!(last(&out).text.starts_with("Connection failed:"));
        assert_eq!(state(&console).await, ConvState::AwaitingConnection);

        let out = send(&console, URL).await;
        assert_eq!(last(&out).menu, Some(menu::root_menu()));
        assert_eq!(state(&console).await, ConvState::MainMenu);
    }

    #[tokio::test]
    async fn test_buttons_before_connecting_are_refused() {
        let (console, gateway) = console();
        console.handle(USER, Inbound::Start).await;

        let out = press(&console, NavToken::ListDatabases).await;

        assert!(last(&out).text.contains("Not connected yet"));
        assert_eq!(state(&console).await, ConvState::AwaitingConnection);
        assert!(gateway.recorded_calls().is_empty());
    }

    #[tokio::test]
    async fn test_insert_then_search_round_trip() {
        let (console, gateway) = connected().await;
        gateway.seed("shop", "users", vec![]);

        let out = press(&console, users("users")).await;
        assert!(labels(&out).contains(&"Insert Document".to_string()));

        press(
            &console,
            NavToken::Insert {
                db: "shop".to_string(),
                coll: "users".to_string(),
            },
        )
        .await;
        assert_eq!(state(&console).await, ConvState::AwaitingInsertDocument);

        let out = send(&console, r#"{"name": "John", "age": 30}"#).await;
        assert!(last(&out)
            .text
            .starts_with("Document inserted successfully. Inserted ID: "));
        assert_eq!(state(&console).await, ConvState::MainMenu);

        press(
            &console,
            NavToken::Search {
                db: "shop".to_string(),
                coll: "users".to_string(),
            },
        )
        .await;
        let out = send(&console, r#"{"name": "John"}"#).await;
        let text = &last(&out).text;
        let (header, body) = text.split_once("\n\n").unwrap();
        assert!(header.contains("first 1 of 1 matches"), "{header}");

        let mut found: Document = serde_json::from_str(body).unwrap();
        assert!(found.remove("_id").is_some());
        assert_eq!(Value::Object(found), json!({"name": "John", "age": 30}));
    }

    #[tokio::test]
    async fn test_cancel_drop_collection_makes_no_gateway_call() {
        let (console, gateway) = connected().await;
        gateway.seed("shop", "users", vec![json!({"name": "John"})]);

        let out = press(
            &console,
            NavToken::ConfirmDropCollection {
                db: "shop".to_string(),
                coll: "users".to_string(),
            },
        )
        .await;
        assert_eq!(labels(&out), vec!["Yes, delete collection", "No, cancel"]);

        let before = gateway.recorded_calls().len();
        let out = press(&console, NavToken::ManageCollections).await;

        assert_eq!(last(&out).text, "Collection Management Options:");
        assert_eq!(gateway.recorded_calls().len(), before);
        assert!(!gateway.called("drop_collection"));
        assert_eq!(gateway.documents("shop", "users").len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_delete_all_makes_no_gateway_call() {
        let (console, gateway) = connected().await;
        gateway.seed("shop", "users", vec![json!({"name": "John"}), json!({"name": "Ann"})]);

        let out = press(
            &console,
            NavToken::ConfirmDeleteAll {
                db: "shop".to_string(),
                coll: "users".to_string(),
            },
        )
        .await;
        assert_eq!(labels(&out), vec!["Yes, delete all", "No, cancel"]);

        let before = gateway.recorded_calls().len();
        let out = press(&console, users("users")).await;

        assert_eq!(last(&out).text, "Options for shop.users:");
        assert_eq!(gateway.recorded_calls().len(), before);
        assert!(!gateway.called("delete_many"));
        assert_eq!(gateway.documents("shop", "users").len(), 2);
    }

    #[tokio::test]
    async fn test_drop_database_needs_confirmation() {
        let (console, gateway) = connected().await;
        gateway.seed("shop", "users", vec![json!({"name": "John"})]);

        let out = press(&console, NavToken::DeleteDatabase).await;
        assert_eq!(labels(&out), vec!["shop", "Cancel"]);

        let out = press(
            &console,
            NavToken::ConfirmDropDatabase {
                db: "shop".to_string(),
            },
        )
        .await;
        assert!(last(&out).text.contains("cannot be undone"));
        assert_eq!(labels(&out), vec!["Yes, delete database", "No, cancel"]);
        assert!(!gateway.called("drop_database"));

        // Cancelling performs no gateway work at all
        let before = gateway.recorded_calls().len();
        let out = press(&console, NavToken::ManageDatabases).await;
        assert_eq!(last(&out).text, "Database Management Options:");
        assert_eq!(gateway.recorded_calls().len(), before);
        assert!(!gateway.documents("shop", "users").is_empty());

        let out = press(
            &console,
            NavToken::DropDatabase {
                db: "shop".to_string(),
            },
        )
        .await;
        assert_eq!(last(&out).text, "Database 'shop' has been deleted.");
        assert!(gateway.called("drop_database"));
        assert!(gateway.documents("shop", "users").is_empty());
    }

    #[tokio::test]
    async fn test_create_database_makes_placeholder_collection() {
        let (console, gateway) = connected().await;

        press(&console, NavToken::CreateDatabase).await;
        assert_eq!(state(&console).await, ConvState::AwaitingNewDatabaseName);
        let out = send(&console, "inventory").await;

        assert_eq!(last(&out).text, "Database 'inventory' has been created.");
        assert!(gateway
            .recorded_calls()
            .contains(&"create_collection:inventory.dummy_collection".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_token_leaves_session_unchanged() {
        let (console, gateway) = connected().await;
        press(
            &console,
            NavToken::Search {
                db: "shop".to_string(),
                coll: "users".to_string(),
            },
        )
        .await;
        let before = gateway.recorded_calls().len();

        let out = console
            .handle(USER, Inbound::Button("format_disk:all".to_string()))
            .await;

        assert!(last(&out).text.starts_with("Unsupported action:"));
        assert_eq!(state(&console).await, ConvState::AwaitingSearchFilter);
        assert_eq!(gateway.recorded_calls().len(), before);
    }

    #[tokio::test]
    async fn test_second_event_while_busy_is_refused() {
        let (console, _) = connected().await;
        let handle = console.sessions().get(USER).await.unwrap();
        let _in_flight = handle.lock().await;

        let out = press(&console, NavToken::ManageDatabases).await;

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, BUSY);
    }

    #[tokio::test]
    async fn test_malformed_json_returns_to_main_menu() {
        let (console, gateway) = connected().await;
        press(
            &console,
            NavToken::Insert {
                db: "shop".to_string(),
                coll: "users".to_string(),
            },
        )
        .await;

        let out = send(&console, "{name: John").await;

        assert!(last(&out).text.starts_with("Invalid JSON format. Please try again."));
        assert_eq!(last(&out).menu, Some(menu::root_menu()));
        assert_eq!(state(&console).await, ConvState::MainMenu);
        assert!(!gateway.called("insert_one"));
    }

    #[tokio::test]
    async fn test_update_collects_filter_then_document() {
        let (console, gateway) = connected().await;
        gateway.seed("shop", "users", vec![json!({"name": "John", "age": 30})]);

        press(
            &console,
            NavToken::Update {
                db: "shop".to_string(),
                coll: "users".to_string(),
            },
        )
        .await;
        let out = send(&console, r#"{"name": "John"}"#).await;
        assert!(last(&out).text.starts_with("Now enter the update data"));
        assert_eq!(state(&console).await, ConvState::AwaitingUpdateDocument);
        assert!(!gateway.called("update_one"));

        let out = send(&console, r#"{"age": 31}"#).await;
        assert_eq!(last(&out).text, "Update complete. Modified 1 document(s).");
        assert_eq!(gateway.documents("shop", "users")[0]["age"], json!(31));
    }

    #[tokio::test]
    async fn test_view_pages_through_documents() {
        let (console, gateway) = connected().await;
        gateway.seed(
            "shop",
            "users",
            (1..=5).map(|n| json!({ "n": n })).collect(),
        );
        let view = |offset| NavToken::View {
            db: "shop".to_string(),
            coll: "users".to_string(),
            offset,
        };

        let out = press(&console, view(0)).await;
        assert!(last(&out).text.contains("Showing 1-2 of 5"));
        assert_eq!(labels(&out), vec!["Next", "Back to Collection Options"]);

        let out = press(&console, view(2)).await;
        assert!(last(&out).text.contains("Showing 3-4 of 5"));
        assert_eq!(
            labels(&out),
            vec!["Previous", "Next", "Back to Collection Options"]
        );

        let out = press(&console, view(4)).await;
        assert!(last(&out).text.contains("Showing 5-5 of 5"));
        assert_eq!(labels(&out), vec!["Previous", "Back to Collection Options"]);
    }

    #[tokio::test]
    async fn test_long_results_are_split_with_menu_last() {
        let (console, gateway) = console_with(5, 120);
        console.handle(USER, Inbound::Start).await;
        send(&console, URL).await;
        gateway.seed(
            "shop",
            "users",
            (0..5)
                .map(|n| json!({ "n": n, "bio": "x".repeat(60) }))
                .collect(),
        );

        let out = press(
            &console,
            NavToken::View {
                db: "shop".to_string(),
                coll: "users".to_string(),
                offset: 0,
            },
        )
        .await;

        assert!(out.len() > 1);
        assert!(out.iter().all(|o| transport_len(&o.text) <= 120));
        assert!(out[..out.len() - 1].iter().all(|o| o.menu.is_none()));
        assert!(last(&out).menu.is_some());
    }

    #[tokio::test]
    async fn test_database_failure_settles_at_main_menu() {
        let (console, gateway) = connected().await;
        gateway.fail_next(ConsoleError::database("not authorized on shop"));

        let out = press(
            &console,
            NavToken::View {
                db: "shop".to_string(),
                coll: "users".to_string(),
                offset: 0,
            },
        )
        .await;

        assert!(last(&out)
            .text
            .starts_with("An error occurred: not authorized on shop"));
        assert_eq!(last(&out).menu, Some(menu::root_menu()));
        assert_eq!(state(&console).await, ConvState::MainMenu);
    }

    #[tokio::test]
    async fn test_cancel_abandons_prompt() {
        let (console, gateway) = connected().await;
        press(
            &console,
            NavToken::Delete {
                db: "shop".to_string(),
                coll: "users".to_string(),
            },
        )
        .await;

        let out = console.handle(USER, Inbound::Cancel).await;

        assert!(last(&out).text.starts_with("Cancelled."));
        assert_eq!(state(&console).await, ConvState::MainMenu);
        assert!(!gateway.called("delete_one"));
    }

    #[tokio::test]
    async fn test_stop_releases_connection_and_session() {
        let (console, gateway) = connected().await;

        let out = console.handle(USER, Inbound::Stop).await;

        assert_eq!(out[0].text, STOPPED);
        assert_eq!(gateway.close_count(), 1);
        assert!(console.sessions().get(USER).await.is_none());
        let out = send(&console, "anything").await;
        assert_eq!(out[0].text, NO_SESSION);
    }

    #[tokio::test]
    async fn test_restart_releases_previous_connection() {
        let (console, gateway) = connected().await;

        console.handle(USER, Inbound::Start).await;

        assert_eq!(gateway.close_count(), 1);
        assert_eq!(state(&console).await, ConvState::AwaitingConnection);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated_per_user() {
        let (console, _) = connected().await;
        let other = UserId(7);

        console.handle(other, Inbound::Start).await;
        press(&console, NavToken::CreateDatabase).await;

        let handle = console.sessions().get(other).await.unwrap();
        assert_eq!(
            handle.lock().await.conversation.state,
            ConvState::AwaitingConnection
        );
        assert_eq!(state(&console).await, ConvState::AwaitingNewDatabaseName);
    }
}
