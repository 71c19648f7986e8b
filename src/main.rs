//! Mongo Console - MongoDB administration over Telegram
//!
//! A conversation state machine per operator drives menu navigation,
//! JSON prompts and confirmed destructive operations against the
//! operator's own MongoDB cluster.

mod config;
mod error;
mod gateway;
mod health;
mod menu;
mod paginate;
mod runtime;
mod session;
mod state_machine;
mod telegram;

use config::AppConfig;
use gateway::MongoConnector;
use runtime::{spawn_sweeper, Console};
use session::{InMemorySessions, SessionRepository};
use state_machine::ConvContext;
use std::sync::Arc;
use teloxide::Bot;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mongo_console=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!(
        port = config.port,
        page_size = config.page_size,
        session_ttl_secs = config.session_ttl.as_secs(),
        allowlist = config.allowed_users.len(),
        "Configuration loaded"
    );

    let sessions: Arc<dyn SessionRepository> = Arc::new(InMemorySessions::new());
    let console = Arc::new(Console::new(
        sessions.clone(),
        Arc::new(MongoConnector),
        ConvContext::new(config.page_size),
        config.max_message_len,
    ));

    let shutdown = CancellationToken::new();
    let sweeper = spawn_sweeper(
        sessions.clone(),
        config.session_ttl,
        config.sweep_interval,
        shutdown.clone(),
    );
    let liveness = tokio::spawn(health::serve(config.port, shutdown.clone()));

    let bot = Bot::new(config.bot_token.clone());
    telegram::run(bot, console, config).await;

    // Dispatcher returned on Ctrl-C: stop background work and close every handle
    shutdown.cancel();
    sweeper.await?;
    if let Err(e) = liveness.await? {
        tracing::warn!(error = %e, "Liveness endpoint failed");
    }
    let released = runtime::sweep(sessions.as_ref(), chrono::Utc::now(), std::time::Duration::ZERO).await;
    tracing::info!(released, "Shutdown complete");

    Ok(())
}
