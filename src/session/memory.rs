//! In-memory session repository

use super::{Session, SessionHandle, SessionRepository, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Process-local sessions; lost on restart
#[derive(Default)]
pub struct InMemorySessions {
    sessions: RwLock<HashMap<UserId, SessionHandle>>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessions {
    async fn get_or_create(&self, user_id: UserId) -> SessionHandle {
        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(&user_id) {
                return handle.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user_id)
            .or_insert_with(|| {
                tracing::info!(user_id = %user_id, "Creating session");
                Arc::new(Mutex::new(Session::new(user_id, Utc::now())))
            })
            .clone()
    }

    async fn get(&self, user_id: UserId) -> Option<SessionHandle> {
        self.sessions.read().await.get(&user_id).cloned()
    }

    async fn remove(&self, user_id: UserId) -> Option<SessionHandle> {
        self.sessions.write().await.remove(&user_id)
    }

    async fn expire(&self, now: DateTime<Utc>, ttl: Duration) -> Vec<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let expired: Vec<UserId> = sessions
            .iter()
            .filter(|(_, handle)| {
                // A locked session is mid-operation, so it is active by definition
                handle
                    .try_lock()
                    .is_ok_and(|session| session.is_idle(now, ttl))
            })
            .map(|(user_id, _)| *user_id)
            .collect();

        expired
            .into_iter()
            .filter_map(|user_id| {
                tracing::info!(user_id = %user_id, "Evicting idle session");
                sessions.remove(&user_id)
            })
            .collect()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
