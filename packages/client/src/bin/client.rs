//! Simple WebSocket chat client with reconnection support.
//!
//! Connects to a WebSocket relay server and sends messages from stdin.
//! Displays a "{sender}> " prompt and waits for input; '/image <path>'
//! sends a base64-encoded image payload.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin idobata-client
//! cargo run --bin idobata-client -- --sender-id Alice
//! ```

use clap::Parser;

use idobata_client::{message::default_sender_tag, run_client};
use idobata_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "WebSocket chat client with broadcast support", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/chat")]
    url: String,

    /// Sender tag embedded in outgoing messages (default: random User_NN)
    #[arg(short = 's', long)]
    sender_id: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let sender_id = args.sender_id.unwrap_or_else(default_sender_tag);

    // Run the client
    if let Err(e) = run_client(args.url, sender_id).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
