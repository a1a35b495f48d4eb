//! Connection acceptor
//!
//! Upgrades an inbound TCP stream to a WebSocket, registers a new client
//! with the room and launches its pumps.

use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::client::Client;
use crate::error::AppError;
use crate::hub::RoomHandle;
use crate::pump::{read_pump, write_pump};
use crate::transport::{Connection, WsConnection};
use crate::types::ClientId;

/// Handle a new TCP connection
///
/// On handshake failure nothing is registered and
/// `TransportError::Handshake` is returned for the caller to log. Returns
/// once the pumps are running.
pub async fn handle_connection(
    stream: TcpStream,
    room: RoomHandle,
    queue_capacity: usize,
) -> Result<ClientId, AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    let conn = WsConnection::accept(stream).await?;

    let client_id = accept_client(conn, &room, queue_capacity).await?;
    info!(%client_id, room_id = %room.id(), "Client connected from {}", peer_addr);

    Ok(client_id)
}

/// Register a connection as a new client and start its pumps
///
/// Registration is awaited before either pump starts, so the hub always
/// sees the join ahead of anything the client sends. The pumps are not
/// joined.
pub async fn accept_client<C: Connection>(
    conn: C,
    room: &RoomHandle,
    queue_capacity: usize,
) -> Result<ClientId, AppError> {
    let client_id = ClientId::new();
    let (client, queue) = Client::new(client_id, queue_capacity);

    room.register(client).await?;

    let (reader, writer) = conn.split();
    tokio::spawn(write_pump(client_id, writer, queue));
    tokio::spawn(read_pump(client_id, reader, room.clone()));

    Ok(client_id)
}
