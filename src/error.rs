//! Error types for the chat relay
//!
//! Defines application-level errors, transport errors and the outcome of
//! a non-blocking enqueue onto a client's outbound queue.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// None of these ever reach a message sender. They either abort a single
/// connection or stop the process during startup.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration file could not be parsed
    #[error("JSON configuration error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (bind, config file, log file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport connection failure, including a failed upgrade
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The room's control loop has stopped and no longer accepts events
    #[error("Room hub is no longer running")]
    HubUnavailable,

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised by a transport connection
///
/// Every variant is terminal for the connection that produced it.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Protocol upgrade failed
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Receiving a frame failed
    #[error("receive failed: {0}")]
    Receive(String),

    /// Sending a frame failed
    #[error("send failed: {0}")]
    Send(String),

    /// The connection was already closed locally
    #[error("connection closed")]
    Closed,
}

/// Outbound queue enqueue errors
///
/// Returned by a non-blocking enqueue. Either way the hub treats the
/// member as gone.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The queue is at capacity (consumer too slow)
    #[error("Outbound queue full")]
    QueueFull,

    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
