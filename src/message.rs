//! Wire unit definitions
//!
//! A chat message is an opaque byte payload. The relay never looks inside
//! it; it only decides which WebSocket frame type carries it outbound.

use std::sync::Arc;

use tokio_tungstenite::tungstenite::Message;

/// Payload of the notice sent to every member when someone joins
pub const JOIN_NOTICE: &[u8] = b"New chat started";

/// Payload of the notice sent to every member when the room is closed
pub const CLOSE_NOTICE: &[u8] = b"Chat closed";

/// Opaque message payload
///
/// Backed by a shared slice so that fanning out to many members is a
/// refcount bump per member instead of a copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(Arc<[u8]>);

impl Payload {
    /// Borrow the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert into an outbound WebSocket frame
    ///
    /// UTF-8 payloads go out as text frames, anything else as binary.
    pub fn to_frame(&self) -> Message {
        match std::str::from_utf8(&self.0) {
            Ok(text) => Message::Text(text.to_owned().into()),
            Err(_) => Message::Binary(self.0.to_vec().into()),
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().into())
    }
}

/// Synthetic notices generated by the hub itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// A client joined the room
    Joined,
    /// The room was closed
    Closed,
}

impl Notice {
    pub fn payload(self) -> Payload {
        match self {
            Notice::Joined => Payload::from(JOIN_NOTICE),
            Notice::Closed => Payload::from(CLOSE_NOTICE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_payload_becomes_text_frame() {
        let payload = Payload::from("hello");
        match payload.to_frame() {
            Message::Text(text) => assert_eq!(text.as_str(), "hello"),
            other => panic!("Wrong frame: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_becomes_binary_frame() {
        let payload = Payload::from(vec![0xff, 0xfe, 0x00]);
        match payload.to_frame() {
            Message::Binary(data) => assert_eq!(data.to_vec(), vec![0xff, 0xfe, 0x00]),
            other => panic!("Wrong frame: {:?}", other),
        }
    }

    #[test]
    fn test_clone_shares_bytes() {
        let payload = Payload::from("shared");
        let copy = payload.clone();
        assert!(std::ptr::eq(payload.as_bytes(), copy.as_bytes()));
    }

    #[test]
    fn test_notice_payloads() {
        assert_eq!(Notice::Joined.payload().as_bytes(), b"New chat started");
        assert_eq!(Notice::Closed.payload().as_bytes(), b"Chat closed");
    }
}
