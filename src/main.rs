//! WebSocket Chat Relay - Entry Point
//!
//! Loads configuration, starts the room hub and accepts connections
//! until Ctrl-C.

use std::env;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::{serve, Config, RoomHub};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    let config = Config::load(env::args())?;

    let listener = TcpListener::bind(&config.bind_addr).await?;

    let (hub, room) = RoomHub::new(&config.room);
    tokio::spawn(hub.run());

    info!(
        room_id = %room.id().as_string(),
        log_path = %config.room.log_path.display(),
        "Room created"
    );

    tokio::select! {
        _ = serve(listener, room.clone(), config.room.client_queue_capacity) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutting down");
        }
    }

    Ok(())
}
