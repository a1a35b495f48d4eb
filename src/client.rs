//! Client struct definition
//!
//! The hub-side half of a connected client: its identity plus the sending
//! end of its bounded outbound queue. The write pump owns the receiving end.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::Payload;
use crate::types::ClientId;

/// Reference outbound queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Connected client as seen by the room hub
///
/// The hub holds the only `Sender`, so dropping a `Client` closes its
/// outbound queue and tells the write pump to shut the connection.
#[derive(Debug)]
pub struct Client {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Hub → write pump queue
    sender: mpsc::Sender<Payload>,
}

impl Client {
    /// Create a client with a fresh bounded outbound queue
    ///
    /// Returns the client (for the hub) and the queue's receiving end
    /// (for the write pump).
    pub fn new(id: ClientId, capacity: usize) -> (Self, mpsc::Receiver<Payload>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { id, sender }, receiver)
    }

    /// Try to enqueue a message without waiting
    ///
    /// Fails with `QueueFull` when the consumer is behind and with
    /// `ChannelClosed` when the write pump is already gone.
    pub fn try_deliver(&self, payload: Payload) -> Result<(), SendError> {
        self.sender.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }
}
