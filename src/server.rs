//! Accept loop
//!
//! Hands every inbound TCP connection to the acceptor on its own task.

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::handler::handle_connection;
use crate::hub::RoomHandle;

/// Accept connections forever, relaying all of them into `room`
///
/// Accept errors are logged and the loop carries on.
pub async fn serve(listener: TcpListener, room: RoomHandle, queue_capacity: usize) {
    if let Ok(addr) = listener.local_addr() {
        info!(room_id = %room.id(), "Relay listening on {}", addr);
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let room = room.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, room, queue_capacity).await {
                        error!("Connection from {} failed: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
