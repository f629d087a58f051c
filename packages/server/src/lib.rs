//! Idobata relay server.
//!
//! Relays text frames between all connected WebSocket clients: every frame a
//! client sends on `/chat` is forwarded verbatim to every connected client,
//! including the sender. Payloads are opaque to the server; any message
//! schema lives entirely in the clients.

pub mod broadcaster;
pub mod handler;
pub mod registry;
pub mod runner;
mod signal;

pub use runner::{app, run_server};
