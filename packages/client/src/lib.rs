//! Idobata CLI chat client.
//!
//! Connects to the relay server, renders incoming chat payloads, and sends
//! lines typed at the prompt. The payload schema lives here, not in the
//! server: the relay forwards frames verbatim and never parses them.

pub mod error;
pub mod formatter;
pub mod message;
pub mod runner;
pub mod session;
pub mod ui;

pub use runner::run_client;
