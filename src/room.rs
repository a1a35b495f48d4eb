//! Room struct definition
//!
//! Membership state of one room. Owned exclusively by the room's hub
//! task; nothing here is shared or locked.

use std::collections::HashMap;

use crate::client::Client;
use crate::message::Payload;
use crate::types::{ClientId, RoomId};

/// Broadcast domain: one identifier, one member set
#[derive(Debug)]
pub struct Room {
    /// Identifier assigned at creation
    pub id: RoomId,
    /// Current members: ClientId -> Client
    members: HashMap<ClientId, Client>,
    /// Set once the room has been closed
    pub closed: bool,
}

impl Room {
    /// Create an empty room
    pub fn new(id: RoomId) -> Self {
        Self {
            id,
            members: HashMap::new(),
            closed: false,
        }
    }

    /// Add a client to the room
    ///
    /// Returns false if a client with the same id is already a member; the
    /// existing member is kept and the new `Client` is dropped.
    pub fn insert(&mut self, client: Client) -> bool {
        if self.members.contains_key(&client.id) {
            return false;
        }
        self.members.insert(client.id, client);
        true
    }

    /// Remove a client from the room
    ///
    /// Dropping the returned `Client` closes its outbound queue. Removing
    /// an absent client is a no-op and returns `None`.
    pub fn remove(&mut self, client_id: ClientId) -> Option<Client> {
        self.members.remove(&client_id)
    }

    /// Check if a client is in this room
    pub fn contains(&self, client_id: ClientId) -> bool {
        self.members.contains_key(&client_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Ids of the current members, in no particular order
    pub fn member_ids(&self) -> Vec<ClientId> {
        self.members.keys().copied().collect()
    }

    /// Offer a payload to every member without blocking
    ///
    /// A member whose queue is full or already closed is removed during
    /// the same pass and its queue is closed. Returns the removed ids.
    pub fn fan_out(&mut self, payload: &Payload) -> Vec<ClientId> {
        let mut dropped = Vec::new();
        self.members.retain(|id, client| match client.try_deliver(payload.clone()) {
            Ok(()) => true,
            Err(_) => {
                dropped.push(*id);
                false
            }
        });
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_creation() {
        let id = RoomId::generate();
        let room = Room::new(id);

        assert_eq!(room.id, id);
        assert!(room.is_empty());
        assert!(!room.closed);
    }

    #[test]
    fn test_room_insert_and_contains() {
        let mut room = Room::new(RoomId::generate());
        let (client, _rx) = Client::new(ClientId::new(), 4);
        let id = client.id;

        assert!(room.insert(client));
        assert!(room.contains(id));
        assert_eq!(room.len(), 1);
        assert_eq!(room.member_ids(), vec![id]);
    }

    #[test]
    fn test_room_duplicate_insert_keeps_one() {
        let mut room = Room::new(RoomId::generate());
        let id = ClientId::new();
        let (first, _rx1) = Client::new(id, 4);
        let (second, _rx2) = Client::new(id, 4);

        assert!(room.insert(first));
        assert!(!room.insert(second));
        assert_eq!(room.len(), 1);
    }

    #[tokio::test]
    async fn test_room_remove_closes_queue() {
        let mut room = Room::new(RoomId::generate());
        let (client, mut rx) = Client::new(ClientId::new(), 4);
        let id = client.id;
        room.insert(client);

        drop(room.remove(id));

        assert!(!room.contains(id));
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn test_room_remove_absent_is_noop() {
        let mut room = Room::new(RoomId::generate());
        let (client, _rx) = Client::new(ClientId::new(), 4);
        room.insert(client);

        assert!(room.remove(ClientId::new()).is_none());
        assert_eq!(room.len(), 1);
    }

    #[tokio::test]
    async fn test_fan_out_reaches_every_member() {
        let mut room = Room::new(RoomId::generate());
        let (a, mut rx_a) = Client::new(ClientId::new(), 4);
        let (b, mut rx_b) = Client::new(ClientId::new(), 4);
        room.insert(a);
        room.insert(b);

        let dropped = room.fan_out(&Payload::from("hi"));

        assert!(dropped.is_empty());
        assert_eq!(rx_a.recv().await.unwrap(), Payload::from("hi"));
        assert_eq!(rx_b.recv().await.unwrap(), Payload::from("hi"));
    }

    #[tokio::test]
    async fn test_fan_out_drops_full_member() {
        let mut room = Room::new(RoomId::generate());
        let (fast, mut rx_fast) = Client::new(ClientId::new(), 4);
        let (slow, mut rx_slow) = Client::new(ClientId::new(), 1);
        let slow_id = slow.id;
        room.insert(fast);
        room.insert(slow);

        assert!(room.fan_out(&Payload::from("one")).is_empty());
        let dropped = room.fan_out(&Payload::from("two"));

        assert_eq!(dropped, vec![slow_id]);
        assert!(!room.contains(slow_id));
        assert_eq!(room.len(), 1);

        // The slow member keeps what was already queued, then sees the close
        assert_eq!(rx_slow.recv().await.unwrap(), Payload::from("one"));
        assert!(rx_slow.recv().await.is_none());

        assert_eq!(rx_fast.recv().await.unwrap(), Payload::from("one"));
        assert_eq!(rx_fast.recv().await.unwrap(), Payload::from("two"));
    }

    #[test]
    fn test_fan_out_drops_member_whose_pump_is_gone() {
        let mut room = Room::new(RoomId::generate());
        let (client, rx) = Client::new(ClientId::new(), 4);
        let id = client.id;
        room.insert(client);
        drop(rx);

        assert_eq!(room.fan_out(&Payload::from("x")), vec![id]);
        assert!(room.is_empty());
    }
}
