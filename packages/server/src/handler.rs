//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    broadcaster::Broadcaster,
    registry::{RegistrationGuard, Session, SessionRegistry},
};

/// Shared collaborators injected into every connection handler.
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub broadcaster: Broadcaster,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives payloads from the rx channel and pushes them
/// to the WebSocket sender.
///
/// This is the session's delivery context: broadcast enqueues into rx's
/// channel, and this task alone writes to the socket, so one stalled
/// recipient never blocks a publisher.
///
/// # Arguments
///
/// * `rx` - Channel receiver for broadcast payloads addressed to this client
/// * `sender` - WebSocket sink to send payloads to this client
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this client to receive broadcast payloads
    let (tx, rx) = mpsc::unbounded_channel();
    let session = Session::new(tx);
    let session_id = session.id();

    state.registry.register(session);

    // Unregisters on every exit path of this function, including abort
    // and panic unwind.
    let _guard = RegistrationGuard::new(&state.registry, session_id);

    let broadcaster = state.broadcaster.clone();

    // Spawn a task to receive frames from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on session {}: {}", session_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    // The payload is opaque to the server: no parsing, no
                    // schema, forwarded verbatim to every session.
                    broadcaster.publish(text.as_str());
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Session {} requested close", session_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to receive payloads from other sessions and send to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };
}
