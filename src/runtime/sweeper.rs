//! Idle session eviction

use crate::session::SessionRepository;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Evict sessions idle for at least `ttl` and release their handles
pub async fn sweep(sessions: &dyn SessionRepository, now: DateTime<Utc>, ttl: Duration) -> usize {
    let evicted = sessions.expire(now, ttl).await;
    for handle in &evicted {
        let mut session = handle.lock().await;
        tracing::info!(user_id = %session.user_id, "Evicting idle session");
        session.release().await;
    }
    evicted.len()
}

/// Run `sweep` every `every` until `shutdown` fires
pub fn spawn_sweeper(
    sessions: Arc<dyn SessionRepository>,
    ttl: Duration,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let evicted = sweep(sessions.as_ref(), Utc::now(), ttl).await;
                    if evicted > 0 {
                        let remaining = sessions.len().await;
                        tracing::info!(evicted, remaining, "Session sweep complete");
                    }
                }
                () = shutdown.cancelled() => {
                    tracing::debug!("Session sweeper stopped");
                    break;
                }
            }
        }
    })
}
