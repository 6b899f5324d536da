//! Liveness HTTP server
//!
//! A minimal endpoint so uptime monitors can probe the process while the bot
//! itself only talks to the Telegram API. Runs on HEALTH_PORT (default 8080).

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Start the health HTTP server.
///
/// # Arguments
/// * `port` - Port to listen on
pub async fn start_health_server(port: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler));

    log::info!("Starting health server on http://{}", addr);
    log::info!("  /health  - Health check (liveness)");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn root_handler() -> impl IntoResponse {
    (StatusCode::OK, "Bot is alive!")
}
