//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    broadcaster::Broadcaster,
    handler::{AppState, websocket_handler},
    registry::SessionRegistry,
    signal::shutdown_signal,
};

/// Build the relay router: a single WebSocket endpoint at `/chat`.
///
/// Split out from [`run_server`] so integration tests can serve the app on
/// an ephemeral port.
pub fn app() -> Router {
    let registry = Arc::new(SessionRegistry::new());
    let broadcaster = Broadcaster::new(registry.clone());
    let app_state = Arc::new(AppState {
        registry,
        broadcaster,
    });

    Router::new()
        .route("/chat", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Run the WebSocket relay server
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "0.0.0.0")
/// * `port` - The port number to bind to (e.g., 8080)
pub async fn run_server(host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!(
        "WebSocket relay server listening on {}",
        listener.local_addr()?
    );
    tracing::info!("Connect to: ws://{}/chat", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    // Set up graceful shutdown signal handler
    axum::serve(listener, app())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
