//! Connection establishment with bounded retry.
//!
//! # Responsibilities
//! - Perform the WebSocket handshake against the configured endpoint
//! - Retry failed handshakes up to the configured bound with a fixed wait
//! - Enforce the optional per-attempt connect timeout
//! - Surface the last underlying failure once every attempt is spent

use std::fmt;
use std::time::Duration;

use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::net::connection::{Connection, WsStream};
use crate::net::endpoint::Endpoint;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;

/// Retry-aware connection establishment for one coma endpoint.
#[derive(Debug, Clone)]
pub struct Connector {
    endpoint: Endpoint,
    policy: RetryPolicy,
    connect_timeout: Option<Duration>,
}

impl Connector {
    /// Create a connector from an already normalized configuration.
    ///
    /// Fails with [`ClientError::InvalidEndpoint`] when no handshake request can
    /// be built for the configured address.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let endpoint = Endpoint::from_config(config)?;
        endpoint.request()?;
        Ok(Self {
            endpoint,
            policy: RetryPolicy::from(&config.retry),
            connect_timeout: config.retry.connect_timeout(),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Open a new connection, retrying per the policy.
    ///
    /// Returns [`ClientError::Connect`] carrying the last handshake error when
    /// every attempt fails. A request that cannot be built is returned as is,
    /// without further attempts.
    pub async fn connect(&self) -> ClientResult<Connection> {
        let result = self
            .policy
            .run_while(
                move |attempt| async move {
                    tracing::debug!(attempt, url = %self.endpoint.redacted(), "Connecting");
                    let outcome = self.dial().await;
                    metrics::record_connect_attempt(if outcome.is_ok() { "success" } else { "failure" });
                    outcome
                },
                |e: &DialError| matches!(e, DialError::Handshake(_)),
            )
            .await;

        match result {
            Ok(stream) => {
                let connection = Connection::new(stream);
                tracing::info!(
                    connection_id = %connection.id(),
                    url = %self.endpoint.redacted(),
                    "Connected"
                );
                Ok(connection)
            }
            Err(exhausted) => {
                tracing::error!(
                    attempts = exhausted.attempts,
                    url = %self.endpoint.redacted(),
                    error = %exhausted.last_error,
                    "Giving up on connection"
                );
                match exhausted.last_error {
                    DialError::Request(e) => Err(e),
                    DialError::Handshake(source) => Err(ClientError::Connect {
                        attempts: exhausted.attempts,
                        source,
                    }),
                }
            }
        }
    }

    /// One handshake attempt.
    async fn dial(&self) -> Result<WsStream, DialError> {
        let request = self.endpoint.request().map_err(DialError::Request)?;

        let handshake = connect_async(request);
        let (stream, _response) = match self.connect_timeout {
            Some(limit) => timeout(limit, handshake)
                .await
                .map_err(|_| {
                    tungstenite::Error::Io(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("handshake timed out after {} ms", limit.as_millis()),
                    ))
                })
                .and_then(|handshake| handshake)
                .map_err(DialError::Handshake)?,
            None => handshake.await.map_err(DialError::Handshake)?,
        };
        Ok(stream)
    }
}

/// Failure of a single connection attempt.
#[derive(Debug)]
enum DialError {
    /// The handshake request could not be built; retrying cannot help.
    Request(ClientError),
    /// The server could not be reached or refused the handshake.
    Handshake(tungstenite::Error),
}

impl fmt::Display for DialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialError::Request(e) => e.fmt(f),
            DialError::Handshake(e) => e.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn unused_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_refused_connection_reports_attempts() {
        let port = unused_port().await;
        let config = ClientConfig::new("http://localhost/", "127.0.0.1", port, "k")
            .with_retry(2)
            .with_retry_wait(Duration::from_millis(5));
        let connector = Connector::new(&config).unwrap();

        match connector.connect().await {
            Err(ClientError::Connect { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected connect error, got {:?}", other),
        }
    }

    #[test]
    fn test_unbuildable_endpoint_is_rejected_up_front() {
        let config = ClientConfig::new("http://localhost/", "bad host", 3001, "k");
        match Connector::new(&config) {
            Err(ClientError::InvalidEndpoint(msg)) => assert!(msg.contains("bad host")),
            other => panic!("expected invalid endpoint, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_timeout_bounds_attempt() {
        // Accepts TCP but never answers the handshake.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = ClientConfig::new("http://localhost/", "127.0.0.1", port, "k")
            .with_connect_timeout(Duration::from_millis(50));
        let connector = Connector::new(&config).unwrap();

        let err = connector.connect().await.unwrap_err();
        assert!(err.to_string().contains("timed out"), "unexpected error: {}", err);
    }
}
