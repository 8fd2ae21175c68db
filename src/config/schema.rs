//! Configuration schema definitions.
//!
//! All types derive Serde traits so a client can be configured from a file as
//! well as through the builder methods.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete configuration of a coma client.
///
/// Immutable once a [`Client`](crate::Client) has been built from it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Provenance sent as the `Origin` header of the handshake (an absolute URL).
    pub origin: String,

    /// Server host name or address.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Shared secret passed as the `authorization` query parameter.
    pub key: String,

    /// Connection retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ClientConfig {
    /// Create a configuration with the default retry policy (one attempt, no wait).
    pub fn new(
        origin: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        key: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            host: host.into(),
            port,
            key: key.into(),
            retry: RetryConfig::default(),
        }
    }

    /// Set the number of connection attempts (first attempt included).
    pub fn with_retry(mut self, attempts: u32) -> Self {
        self.retry.attempts = attempts;
        self
    }

    /// Set the delay between failed connection attempts.
    pub fn with_retry_wait(mut self, wait: Duration) -> Self {
        self.retry.wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Bound each individual handshake attempt.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.retry.connect_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }
}

/// Retry configuration for connection establishment.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total connection attempts, first one included. Zero is normalized to one.
    pub attempts: u32,

    /// Fixed delay between failed attempts in milliseconds.
    pub wait_ms: u64,

    /// Optional timeout for a single handshake attempt in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

impl RetryConfig {
    /// Delay between failed attempts.
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    /// Timeout for a single attempt, if configured.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 1,
            wait_ms: 0,
            connect_timeout_ms: None,
        }
    }
}
