//! In-process transport
//!
//! [`MemoryConnection`] is the server side, [`MemoryPeer`] plays the remote
//! end. Used to drive the pumps and the acceptor without a socket.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::{CloseSignal, Connection, FrameReader, FrameWriter};
use crate::error::TransportError;
use crate::message::Payload;

/// What the peer observes on its side of the connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(Payload),
    Close,
}

/// Close state shared by both halves and the peer
#[derive(Debug)]
struct CloseState {
    signal: CloseSignal,
    close_count: AtomicUsize,
}

impl CloseState {
    fn close(&self) {
        if self.signal.close() {
            self.close_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_closed(&self) -> bool {
        self.signal.is_closed()
    }
}

/// Server side of an in-memory connection
pub struct MemoryConnection {
    inbound: mpsc::UnboundedReceiver<Result<Vec<u8>, TransportError>>,
    outbound: mpsc::UnboundedSender<Frame>,
    state: Arc<CloseState>,
}

/// Remote end of an in-memory connection
pub struct MemoryPeer {
    inbound: Option<mpsc::UnboundedSender<Result<Vec<u8>, TransportError>>>,
    outbound: mpsc::UnboundedReceiver<Frame>,
    state: Arc<CloseState>,
}

impl MemoryConnection {
    /// Create a connected pair
    pub fn pair() -> (MemoryConnection, MemoryPeer) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let state = Arc::new(CloseState {
            signal: CloseSignal::new(),
            close_count: AtomicUsize::new(0),
        });

        (
            MemoryConnection {
                inbound: inbound_rx,
                outbound: outbound_tx,
                state: Arc::clone(&state),
            },
            MemoryPeer {
                inbound: Some(inbound_tx),
                outbound: outbound_rx,
                state,
            },
        )
    }
}

impl MemoryPeer {
    /// Send a data frame to the server; false if the reader is gone
    pub fn send(&self, data: impl Into<Vec<u8>>) -> bool {
        match &self.inbound {
            Some(tx) => tx.send(Ok(data.into())).is_ok(),
            None => false,
        }
    }

    /// Make the server's next read fail
    pub fn fail(&self) -> bool {
        match &self.inbound {
            Some(tx) => tx
                .send(Err(TransportError::Receive("connection reset".to_string())))
                .is_ok(),
            None => false,
        }
    }

    /// Close cleanly from the peer side; the server reads end-of-stream
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }

    /// Next frame written by the server, `None` once the writer is gone
    pub async fn next_frame(&mut self) -> Option<Frame> {
        self.outbound.recv().await
    }

    /// Wait until the server closes the connection
    pub async fn closed(&self) {
        self.state.signal.closed().await;
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    /// How many times the connection actually transitioned to closed
    pub fn close_count(&self) -> usize {
        self.state.close_count.load(Ordering::SeqCst)
    }
}

impl Connection for MemoryConnection {
    type Reader = MemoryReader;
    type Writer = MemoryWriter;

    fn split(self) -> (Self::Reader, Self::Writer) {
        (
            MemoryReader {
                inbound: self.inbound,
                state: Arc::clone(&self.state),
            },
            MemoryWriter {
                outbound: self.outbound,
                state: self.state,
            },
        )
    }
}

/// Read half of a [`MemoryConnection`]
pub struct MemoryReader {
    inbound: mpsc::UnboundedReceiver<Result<Vec<u8>, TransportError>>,
    state: Arc<CloseState>,
}

impl FrameReader for MemoryReader {
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        tokio::select! {
            biased;
            _ = self.state.signal.closed() => Err(TransportError::Closed),
            frame = self.inbound.recv() => frame.transpose(),
        }
    }

    async fn close(&mut self) {
        self.state.close();
    }
}

/// Write half of a [`MemoryConnection`]
pub struct MemoryWriter {
    outbound: mpsc::UnboundedSender<Frame>,
    state: Arc<CloseState>,
}

impl MemoryWriter {
    fn push(&self, frame: Frame) -> Result<(), TransportError> {
        if self.state.is_closed() {
            return Err(TransportError::Closed);
        }
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::Send("peer gone".to_string()))
    }
}

impl FrameWriter for MemoryWriter {
    async fn send(&mut self, payload: Payload) -> Result<(), TransportError> {
        self.push(Frame::Data(payload))
    }

    async fn send_close(&mut self) -> Result<(), TransportError> {
        self.push(Frame::Close)
    }

    async fn close(&mut self) {
        self.state.close();
    }
}
