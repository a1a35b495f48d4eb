//! Transport abstraction
//!
//! A connection is a duplex channel of opaque byte frames. The pumps only
//! need receive-one, send-one and close, so they are written against the
//! [`Connection`] trait rather than a concrete WebSocket type.
//!
//! A connection is split into a reader (owned by the read pump) and a
//! writer (owned by the write pump). Either half may close the underlying
//! connection; closing is idempotent.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::TransportError;
use crate::message::Payload;

pub mod memory;
mod websocket;

pub use websocket::{WsConnection, WsReader, WsWriter};

/// A live duplex connection that can be split between two pumps
pub trait Connection: Send + 'static {
    type Reader: FrameReader;
    type Writer: FrameWriter;

    /// Split into independently owned halves
    fn split(self) -> (Self::Reader, Self::Writer);
}

/// Receiving half of a connection
pub trait FrameReader: Send + 'static {
    /// Receive the next data frame
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly.
    fn recv(&mut self) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Close the underlying connection. Safe to call more than once.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Sending half of a connection
pub trait FrameWriter: Send + 'static {
    /// Send one data frame
    fn send(&mut self, payload: Payload) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Send a close frame to the peer
    fn send_close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Close the underlying connection. Safe to call more than once.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Closed flag shared by both halves of one connection
///
/// Setting it wakes a reader blocked in `recv`, which then fails with
/// `TransportError::Closed` instead of waiting on the peer.
#[derive(Debug, Clone)]
pub(crate) struct CloseSignal(Arc<watch::Sender<bool>>);

impl CloseSignal {
    pub(crate) fn new() -> Self {
        let (closed, _) = watch::channel(false);
        Self(Arc::new(closed))
    }

    /// Mark closed; true only for the call that made the transition
    pub(crate) fn close(&self) -> bool {
        !self.0.send_replace(true)
    }

    pub(crate) fn is_closed(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once the connection is closed
    pub(crate) async fn closed(&self) {
        let mut rx = self.0.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
