//! WebSocket transport using `tokio-tungstenite`.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::debug;

use super::{CloseSignal, Connection, FrameReader, FrameWriter};
use crate::error::TransportError;
use crate::message::Payload;

/// Upper bound on flushing the close frame to a peer that stopped reading
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Sink half plus a flag so only one close frame reaches the socket
struct SharedSink<S> {
    sink: SplitSink<WebSocketStream<S>, Message>,
    closed: bool,
}

impl<S> SharedSink<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        match tokio::time::timeout(CLOSE_TIMEOUT, self.sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("WebSocket close: {}", e),
            Err(_) => debug!("WebSocket close timed out"),
        }
    }
}

/// An upgraded WebSocket connection
pub struct WsConnection<S = TcpStream> {
    ws: WebSocketStream<S>,
}

impl<S> WsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(ws: WebSocketStream<S>) -> Self {
        Self { ws }
    }

    /// Perform the server side of the WebSocket handshake
    pub async fn accept(stream: S) -> Result<Self, TransportError> {
        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;
        Ok(Self::new(ws))
    }
}

impl<S> Connection for WsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Reader = WsReader<S>;
    type Writer = WsWriter<S>;

    fn split(self) -> (Self::Reader, Self::Writer) {
        let (sink, stream) = self.ws.split();
        let sink = Arc::new(Mutex::new(SharedSink {
            sink,
            closed: false,
        }));
        let signal = CloseSignal::new();
        (
            WsReader {
                stream,
                sink: Arc::clone(&sink),
                signal: signal.clone(),
            },
            WsWriter { sink, signal },
        )
    }
}

/// Read half of a [`WsConnection`]
pub struct WsReader<S = TcpStream> {
    stream: SplitStream<WebSocketStream<S>>,
    sink: Arc<Mutex<SharedSink<S>>>,
    signal: CloseSignal,
}

impl<S> FrameReader for WsReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.signal.closed() => return Err(TransportError::Closed),
                next = self.stream.next() => next,
            };
            match next {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_bytes().to_vec())),
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.to_vec())),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Pong replies are queued by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::Receive(e.to_string())),
            }
        }
    }

    async fn close(&mut self) {
        // Once the writer has flagged the close it owns the socket shutdown
        if self.signal.close() {
            self.sink.lock().await.close().await;
        }
    }
}

/// Write half of a [`WsConnection`]
pub struct WsWriter<S = TcpStream> {
    sink: Arc<Mutex<SharedSink<S>>>,
    signal: CloseSignal,
}

impl<S> FrameWriter for WsWriter<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&mut self, payload: Payload) -> Result<(), TransportError> {
        if self.signal.is_closed() {
            return Err(TransportError::Closed);
        }
        let mut shared = self.sink.lock().await;
        if shared.closed {
            return Err(TransportError::Closed);
        }
        shared
            .sink
            .send(payload.to_frame())
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn send_close(&mut self) -> Result<(), TransportError> {
        // Stop the reader first so nothing more is relayed from this peer
        self.signal.close();
        let mut shared = self.sink.lock().await;
        if shared.closed {
            return Err(TransportError::Closed);
        }
        shared.closed = true;
        match tokio::time::timeout(CLOSE_TIMEOUT, shared.sink.send(Message::Close(None))).await {
            Ok(result) => result.map_err(|e| TransportError::Send(e.to_string())),
            Err(_) => Err(TransportError::Send("close frame timed out".to_string())),
        }
    }

    async fn close(&mut self) {
        self.signal.close();
        self.sink.lock().await.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncWriteExt, DuplexStream};

    type PeerWs = WebSocketStream<DuplexStream>;

    const WAIT: Duration = Duration::from_secs(2);

    async fn ws_pair() -> (WsConnection<DuplexStream>, PeerWs) {
        let (server_io, peer_io) = tokio::io::duplex(64 * 1024);
        let (server, peer) = tokio::join!(
            WsConnection::accept(server_io),
            tokio_tungstenite::client_async("ws://localhost/", peer_io),
        );
        (server.unwrap(), peer.unwrap().0)
    }

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (conn, mut peer) = ws_pair().await;
        let (mut reader, mut writer) = conn.split();

        peer.send(Message::Text("ping".into())).await.unwrap();
        assert_eq!(reader.recv().await.unwrap(), Some(b"ping".to_vec()));

        writer.send(Payload::from("pong")).await.unwrap();
        match peer.next().await.unwrap().unwrap() {
            Message::Text(text) => assert_eq!(text.as_str(), "pong"),
            other => panic!("Wrong frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_writer_close_unblocks_pending_read() {
        // The peer stays idle and never answers the close
        let (conn, _peer) = ws_pair().await;
        let (mut reader, mut writer) = conn.split();

        let pending = tokio::spawn(async move { reader.recv().await });
        tokio::task::yield_now().await;
        writer.close().await;

        let result = tokio::time::timeout(WAIT, pending)
            .await
            .expect("read still blocked after close")
            .unwrap();
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_close_frame_unblocks_pending_read() {
        let (conn, _peer) = ws_pair().await;
        let (mut reader, mut writer) = conn.split();

        let pending = tokio::spawn(async move { reader.recv().await });
        tokio::task::yield_now().await;
        writer.send_close().await.unwrap();

        let result = tokio::time::timeout(WAIT, pending).await.unwrap().unwrap();
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_close_from_both_halves_sends_one_close_frame() {
        let (conn, mut peer) = ws_pair().await;
        let (mut reader, mut writer) = conn.split();

        writer.close().await;
        reader.close().await;
        writer.close().await;
        assert!(matches!(
            writer.send(Payload::from("late")).await,
            Err(TransportError::Closed)
        ));
        drop(reader);
        drop(writer);

        let mut close_frames = 0;
        loop {
            match tokio::time::timeout(WAIT, peer.next()).await.unwrap() {
                Some(Ok(Message::Close(_))) => close_frames += 1,
                Some(Ok(other)) => panic!("unexpected frame: {:?}", other),
                Some(Err(_)) | None => break,
            }
        }
        assert_eq!(close_frames, 1);
    }

    #[tokio::test]
    async fn test_failed_handshake() {
        let (server_io, mut peer_io) = tokio::io::duplex(1024);
        peer_io
            .write_all(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n")
            .await
            .unwrap();
        drop(peer_io);

        assert!(matches!(
            WsConnection::accept(server_io).await,
            Err(TransportError::Handshake(_))
        ));
    }
}
