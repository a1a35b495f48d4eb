//! Basic type definitions for the chat relay
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: UUID-based identifier, one per live connection
//! - `RoomId`: UUID-based identifier, one per room instance

use uuid::Uuid;

/// Unique client identifier (newtype pattern)
///
/// Wraps a UUID v4. Never reused, so a stale id can't hit a newer client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque room identifier
///
/// Assigned once when the room is created and never changed. Exposed to
/// external routing as a plain string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomId(pub Uuid);

impl RoomId {
    /// Generate a new random room ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// String form handed to external routing
    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_unique() {
        let id1 = ClientId::new();
        let id2 = ClientId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_room_id_unique() {
        assert_ne!(RoomId::generate(), RoomId::generate());
    }

    #[test]
    fn test_room_id_string_is_uuid() {
        let id = RoomId::generate();
        let parsed = Uuid::parse_str(&id.as_string()).unwrap();
        assert_eq!(parsed, id.0);
        assert_eq!(id.to_string(), id.as_string());
    }
}
