//! Live connection handle and frame classification.
//!
//! # Responsibilities
//! - Own one established WebSocket stream
//! - Generate unique connection IDs for tracing
//! - Classify each receive outcome (payload, control, end of stream, failure)
//! - Close the stream on shutdown

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Stream type produced by the connector.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Outcome of waiting for one inbound frame.
#[derive(Debug)]
pub enum Frame {
    /// A text or binary frame carrying an envelope.
    Payload(Vec<u8>),
    /// Ping, pong or raw frame; nothing to decode.
    Control,
    /// The server ended the stream (close frame, EOF or reset without close).
    Ended,
    /// Receiving failed for any other reason.
    Failed(tungstenite::Error),
}

/// An established connection to a coma server.
///
/// Exclusively owned; a reconnect produces a new `Connection` and the old one
/// is dropped.
pub struct Connection {
    id: ConnectionId,
    stream: WsStream,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").field("id", &self.id).finish()
    }
}

impl Connection {
    pub(crate) fn new(stream: WsStream) -> Self {
        Self {
            id: ConnectionId::new(),
            stream,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Wait for the next inbound frame.
    pub async fn next_frame(&mut self) -> Frame {
        match self.stream.next().await {
            Some(Ok(Message::Text(text))) => Frame::Payload(text.as_bytes().to_vec()),
            Some(Ok(Message::Binary(data))) => Frame::Payload(data.to_vec()),
            Some(Ok(Message::Close(frame))) => {
                tracing::debug!(connection_id = %self.id, close_frame = ?frame, "Close frame received");
                Frame::Ended
            }
            Some(Ok(_)) => Frame::Control,
            Some(Err(e)) if is_end_of_stream(&e) => Frame::Ended,
            Some(Err(e)) => Frame::Failed(e),
            None => Frame::Ended,
        }
    }

    /// Send a close frame. A stream that is already closed counts as closed.
    pub async fn close(&mut self) -> Result<(), tungstenite::Error> {
        match self.stream.close(None).await {
            Ok(()) => Ok(()),
            Err(e) if is_end_of_stream(&e) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Errors that mean the server ended the stream rather than the transport failing.
pub fn is_end_of_stream(error: &tungstenite::Error) -> bool {
    matches!(
        error,
        tungstenite::Error::ConnectionClosed
            | tungstenite::Error::AlreadyClosed
            | tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id2.0 > id1.0);
        assert!(id1.to_string().starts_with("conn-"));
    }

    #[test]
    fn end_of_stream_classification() {
        assert!(is_end_of_stream(&tungstenite::Error::ConnectionClosed));
        assert!(is_end_of_stream(&tungstenite::Error::AlreadyClosed));
        assert!(is_end_of_stream(&tungstenite::Error::Protocol(
            ProtocolError::ResetWithoutClosingHandshake
        )));
        assert!(!is_end_of_stream(&tungstenite::Error::Protocol(
            ProtocolError::HandshakeIncomplete
        )));
        assert!(!is_end_of_stream(&tungstenite::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset"
        ))));
    }
}
