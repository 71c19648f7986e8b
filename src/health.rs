//! Liveness endpoint for the hosting platform

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

pub const ALIVE: &str = "Bot is running";

pub fn router() -> Router {
    Router::new()
        .route("/", get(|| async { ALIVE }))
        .layer(TraceLayer::new_for_http())
}

/// Serve `GET /` on `port` until `shutdown` fires
pub async fn serve(port: u16, shutdown: CancellationToken) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Liveness endpoint listening");

    axum::serve(listener, router())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
