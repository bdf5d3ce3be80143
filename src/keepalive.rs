//! Liveness endpoint for uptime pingers
//!
//! Serves `GET /` with a plain `running` body so external monitors can keep
//! hosted instances awake.

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tracing::{error, info};

/// Router exposing the liveness route
pub fn router() -> Router {
    Router::new().route("/", get(liveness))
}

async fn liveness() -> &'static str {
    "running"
}

/// Serve the liveness endpoint on `addr` until the process exits.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Keep-alive endpoint listening on http://{addr}");
    axum::serve(listener, router()).await
}

/// Spawn the liveness server in the background; failures are only logged.
pub fn spawn(addr: SocketAddr) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = serve(addr).await {
            error!("Keep-alive server on {addr} stopped: {e}");
        }
    })
}
