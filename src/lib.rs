//! WebSocket Chat Relay Library
//!
//! A single-room chat relay built with tokio-tungstenite using the Actor
//! pattern for membership and broadcast.
//!
//! # Features
//! - WebSocket connection handling
//! - Join notices to every member
//! - Broadcast of opaque text/binary payloads to all members
//! - Append-only message log
//! - Drop-on-full backpressure for slow clients
//! - Room close notice
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `RoomHub` owns the member set and applies register, unregister and
//!   broadcast one at a time
//! - Each connection has a read pump and a write pump task
//! - The hub never waits on a client: a full outbound queue gets the client
//!   dropped instead
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_relay::{serve, RoomConfig, RoomHub};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RoomConfig::default();
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let (hub, room) = RoomHub::new(&config);
//!
//!     tokio::spawn(hub.run());
//!     serve(listener, room, config.client_queue_capacity).await;
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod hub;
pub mod message;
pub mod persist;
pub mod pump;
pub mod room;
pub mod server;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use config::{ClosePolicy, Config, RoomConfig};
pub use error::{AppError, SendError, TransportError};
pub use handler::{accept_client, handle_connection};
pub use hub::{spawn_room, RoomHandle, RoomHub, RoomInfo};
pub use message::{Notice, Payload};
pub use persist::MessageLog;
pub use room::Room;
pub use server::serve;
pub use types::{ClientId, RoomId};
