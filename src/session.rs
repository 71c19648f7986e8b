//! Session store
//!
//! One session per operator, keyed by the transport's stable user id. A
//! session owns its cluster handle exclusively; handles are never pooled or
//! shared and are released when the session is replaced or evicted.

mod memory;

pub use memory::InMemorySessions;

use crate::gateway::Gateway;
use crate::state_machine::Conversation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Opaque stable identifier from the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable record for one operator
pub struct Session {
    pub user_id: UserId,
    pub conversation: Conversation,
    pub connection: Option<Arc<dyn Gateway>>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            conversation: Conversation::default(),
            connection: None,
            last_active: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = now;
    }

    pub fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        // A TTL too large for chrono never elapses
        chrono::Duration::from_std(ttl)
            .is_ok_and(|ttl| now.signed_duration_since(self.last_active) >= ttl)
    }

    /// Take ownership of a new handle, releasing any previous one
    pub async fn attach(&mut self, connection: Arc<dyn Gateway>) {
        self.release().await;
        self.connection = Some(connection);
    }

    /// Close and drop the owned handle, if any
    pub async fn release(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close().await;
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("conversation", &self.conversation)
            .field("connected", &self.connection.is_some())
            .field("last_active", &self.last_active)
            .finish()
    }
}

/// A session guarded for single-flight access
pub type SessionHandle = Arc<Mutex<Session>>;

/// Storage for sessions, independent of the backing store
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Return the user's session, creating an empty one if absent
    async fn get_or_create(&self, user_id: UserId) -> SessionHandle;

    async fn get(&self, user_id: UserId) -> Option<SessionHandle>;

    async fn remove(&self, user_id: UserId) -> Option<SessionHandle>;

    /// Evict sessions idle for at least `ttl`, returning them for release
    ///
    /// Sessions with an operation in flight are never evicted.
    async fn expire(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<SessionHandle>;

    async fn len(&self) -> usize;
}
