//! Per-connection pumps
//!
//! Each client runs two independent tasks. The read pump forwards inbound
//! frames to the hub; the write pump drains the client's outbound queue to
//! the connection. They share nothing except the connection itself, which
//! both may close.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::hub::RoomHandle;
use crate::message::Payload;
use crate::transport::{FrameReader, FrameWriter};
use crate::types::ClientId;

/// Connection → hub
///
/// Runs until the connection fails, the peer closes, or the hub is gone.
/// Always unregisters the client and closes the connection on the way out.
pub async fn read_pump<R: FrameReader>(client_id: ClientId, mut reader: R, room: RoomHandle) {
    loop {
        match reader.recv().await {
            Ok(Some(data)) => {
                debug!(%client_id, bytes = data.len(), "Inbound message");
                if room.broadcast(Payload::from(data)).await.is_err() {
                    debug!(%client_id, "Room hub gone, ending read pump");
                    break;
                }
            }
            Ok(None) => {
                debug!(%client_id, "Peer closed connection");
                break;
            }
            Err(e) => {
                warn!(%client_id, error = %e, "Read failed");
                break;
            }
        }
    }

    if room.unregister(client_id).await.is_err() {
        debug!(%client_id, "Room hub gone, skipping unregister");
    }
    reader.close().await;
    debug!(%client_id, "Read pump ended");
}

/// Outbound queue → connection
///
/// A closed queue means the hub dropped this client: send a close frame
/// and stop. Any send failure also stops the pump. Always closes the
/// connection on the way out.
pub async fn write_pump<W: FrameWriter>(
    client_id: ClientId,
    mut writer: W,
    mut queue: mpsc::Receiver<Payload>,
) {
    loop {
        match queue.recv().await {
            Some(payload) => {
                if let Err(e) = writer.send(payload).await {
                    warn!(%client_id, error = %e, "Write failed");
                    break;
                }
            }
            None => {
                if let Err(e) = writer.send_close().await {
                    debug!(%client_id, error = %e, "Close frame not sent");
                }
                break;
            }
        }
    }

    writer.close().await;
    debug!(%client_id, "Write pump ended");
}
