//! Room hub actor implementation
//!
//! One hub task per room owns the member set and processes commands from
//! a single ordered queue, so membership changes and broadcasts are applied
//! strictly one at a time. Everything outside talks to it via `RoomHandle`.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};

use crate::client::Client;
use crate::config::{ClosePolicy, RoomConfig};
use crate::error::AppError;
use crate::message::{Notice, Payload};
use crate::persist::MessageLog;
use crate::room::Room;
use crate::types::{ClientId, RoomId};

/// Commands sent from handles to the hub actor
#[derive(Debug)]
pub enum RoomCommand {
    /// Add a client and notify every member
    Register(Client),
    /// Remove a client if present
    Unregister(ClientId),
    /// Persist then deliver to every member
    Broadcast(Payload),
    /// Mark the room closed and notify every member
    Close { reply: oneshot::Sender<()> },
    /// Report current membership
    Info { reply: oneshot::Sender<RoomInfo> },
}

/// Snapshot of room state taken inside the control loop
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub id: RoomId,
    pub members: Vec<ClientId>,
    pub closed: bool,
}

impl RoomInfo {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn contains(&self, client_id: ClientId) -> bool {
        self.members.contains(&client_id)
    }
}

/// Cloneable handle to a running room hub
///
/// Holds the command sender plus the room's closed flag. The flag lives
/// behind its own lock because `close` is the one operation that starts
/// outside the control loop.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
    closed: Arc<Mutex<bool>>,
}

impl RoomHandle {
    /// Returns the room's identifier
    pub fn id(&self) -> RoomId {
        self.id
    }

    /// Hand a client to the hub
    ///
    /// Delivery problems surface as membership changes, never as errors.
    /// Fails only when the hub task has stopped.
    pub async fn register(&self, client: Client) -> Result<(), AppError> {
        self.send(RoomCommand::Register(client)).await
    }

    /// Remove a client; unknown ids are ignored by the hub
    pub async fn unregister(&self, client_id: ClientId) -> Result<(), AppError> {
        self.send(RoomCommand::Unregister(client_id)).await
    }

    /// Queue a message for persistence and fan-out
    pub async fn broadcast(&self, payload: Payload) -> Result<(), AppError> {
        self.send(RoomCommand::Broadcast(payload)).await
    }

    /// Close the room
    ///
    /// Flips the closed flag under the room lock, then waits for the hub to
    /// send the close notice. Closing twice is a no-op. Members are not
    /// disconnected and the hub keeps running.
    pub async fn close(&self) -> Result<(), AppError> {
        let mut closed = self.closed.lock().await;
        if *closed {
            return Ok(());
        }
        *closed = true;

        let (reply, done) = oneshot::channel();
        self.send(RoomCommand::Close { reply }).await?;
        done.await.map_err(|_| AppError::HubUnavailable)
    }

    /// Whether `close` has been called on this room
    pub async fn is_closed(&self) -> bool {
        *self.closed.lock().await
    }

    /// Membership snapshot, ordered after every command sent before it
    pub async fn info(&self) -> Result<RoomInfo, AppError> {
        let (reply, info) = oneshot::channel();
        self.send(RoomCommand::Info { reply }).await?;
        info.await.map_err(|_| AppError::HubUnavailable)
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), AppError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| AppError::HubUnavailable)
    }
}

/// The room hub actor
///
/// Owns the room's membership. Processes commands until every
/// `RoomHandle` has been dropped.
pub struct RoomHub {
    room: Room,
    log: MessageLog,
    close_policy: ClosePolicy,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomHub {
    /// Create a hub and its handle; call `run` to start processing
    pub fn new(config: &RoomConfig) -> (Self, RoomHandle) {
        let id = RoomId::generate();
        let (sender, receiver) = mpsc::channel(config.hub_queue_capacity);

        let hub = Self {
            room: Room::new(id),
            log: MessageLog::new(config.log_path.clone()),
            close_policy: config.close_policy,
            receiver,
        };
        let handle = RoomHandle {
            id,
            sender,
            closed: Arc::new(Mutex::new(false)),
        };
        (hub, handle)
    }

    /// Run the hub event loop
    pub async fn run(mut self) {
        info!(room_id = %self.room.id, "Room hub started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd).await;
        }

        info!(room_id = %self.room.id, "Room hub stopped");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Register(client) => self.handle_register(client),
            RoomCommand::Unregister(client_id) => self.handle_unregister(client_id),
            RoomCommand::Broadcast(payload) => self.handle_broadcast(payload).await,
            RoomCommand::Close { reply } => {
                self.handle_close();
                let _ = reply.send(());
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(RoomInfo {
                    id: self.room.id,
                    members: self.room.member_ids(),
                    closed: self.room.closed,
                });
            }
        }
    }

    fn handle_register(&mut self, client: Client) {
        let client_id = client.id;

        if self.is_sealed() {
            // Dropping the client closes its queue
            info!(room_id = %self.room.id, %client_id, "Refusing join, room is closed");
            return;
        }

        if !self.room.insert(client) {
            warn!(room_id = %self.room.id, %client_id, "Client already registered");
            return;
        }

        info!(room_id = %self.room.id, %client_id, "Client joined");
        self.deliver(&Notice::Joined.payload());
        debug!(room_id = %self.room.id, members = self.room.len(), "Membership changed");
    }

    fn handle_unregister(&mut self, client_id: ClientId) {
        if self.room.remove(client_id).is_some() {
            info!(room_id = %self.room.id, %client_id, "Client left");
            if self.room.is_empty() {
                debug!(room_id = %self.room.id, "Room is empty");
            } else {
                debug!(room_id = %self.room.id, members = self.room.len(), "Membership changed");
            }
        }
    }

    async fn handle_broadcast(&mut self, payload: Payload) {
        if self.is_sealed() {
            debug!(room_id = %self.room.id, "Dropping message, room is closed");
            return;
        }

        if let Err(e) = self.log.save(&payload).await {
            error!(
                room_id = %self.room.id,
                path = %self.log.path().display(),
                error = %e,
                "Failed to persist message"
            );
        }

        debug!(room_id = %self.room.id, bytes = payload.as_bytes().len(), "Broadcasting message");
        self.deliver(&payload);
    }

    fn handle_close(&mut self) {
        self.room.closed = true;
        info!(room_id = %self.room.id, members = self.room.len(), "Room closed");
        self.deliver(&Notice::Closed.payload());
    }

    /// Drop-on-full fan-out to the current members
    fn deliver(&mut self, payload: &Payload) {
        for client_id in self.room.fan_out(payload) {
            warn!(room_id = %self.room.id, %client_id, "Dropping unresponsive client");
        }
    }

    fn is_sealed(&self) -> bool {
        self.room.closed && self.close_policy == ClosePolicy::Seal
    }
}

/// Create a room and start its hub on the current runtime
pub fn spawn_room(config: &RoomConfig) -> RoomHandle {
    let (hub, handle) = RoomHub::new(config);
    tokio::spawn(hub.run());
    handle
}
