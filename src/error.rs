//! Client error definitions.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::config::validation::{join_errors, ValidationError};

/// Errors that can occur while connecting to or observing a coma server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration failed semantic validation.
    #[error("Invalid configuration: {}", join_errors(.0))]
    Config(Vec<ValidationError>),

    /// Endpoint or handshake request could not be built.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Every connection attempt failed; carries the last underlying failure.
    #[error("Connection failed after {attempts} attempt(s): {source}")]
    Connect {
        attempts: u32,
        #[source]
        source: tungstenite::Error,
    },

    /// `observe` was called without a live connection.
    #[error("Connection not found")]
    NoConnection,

    /// The client already runs its observer loop.
    #[error("Observer already running for this client")]
    AlreadyObserving,

    /// `observe` was called outside a Tokio runtime.
    #[error("Observer requires a Tokio runtime")]
    NoRuntime,

    /// The observer target panicked while applying a document.
    #[error("Observer panicked: {0}")]
    ObserverPanicked(String),

    /// The observer task was cancelled or could not be joined.
    #[error("Observer task failed: {0}")]
    ObserverTask(String),

    /// The stream ended and the reconnection attempt failed.
    #[error("Reconnecting error: {0}")]
    Reconnect(#[source] Box<ClientError>),

    /// Receiving a frame failed for a reason other than the stream ending.
    #[error("Receive error: {0}")]
    Receive(#[source] tungstenite::Error),

    /// A frame payload could not be decoded into the observer target.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Closing the connection failed.
    #[error("Shutdown error: {0}")]
    Shutdown(#[source] tungstenite::Error),

    /// The observer loop did not stop before the shutdown deadline.
    #[error("Shutdown did not complete within {0} ms")]
    ShutdownTimeout(u128),
}

/// Errors produced while decoding a pushed document.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame is not a valid envelope.
    #[error("invalid envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The envelope carries no `data` member.
    #[error("envelope has no data")]
    MissingData,

    /// The document does not fit the target's shape.
    #[error("document does not match target: {0}")]
    Document(#[source] serde_json::Error),

    /// The target's lock was poisoned by a panicking reader.
    #[error("observer target is poisoned")]
    Poisoned,
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::Connect {
            attempts: 3,
            source: tungstenite::Error::ConnectionClosed,
        };
        assert!(err.to_string().starts_with("Connection failed after 3 attempt(s)"));

        let err = ClientError::Config(vec![
            ValidationError::EmptyHost,
            ValidationError::InvalidPort,
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid configuration: host must not be empty, port must be non-zero"
        );
    }

    #[test]
    fn test_reconnect_wraps_connect_error() {
        let err = ClientError::Reconnect(Box::new(ClientError::NoConnection));
        assert_eq!(err.to_string(), "Reconnecting error: Connection not found");
    }
}
