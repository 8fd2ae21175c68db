//! Client library for coma configuration-push servers.
//!
//! A [`Client`] keeps one WebSocket connection to a coma server and merges every
//! pushed configuration document into a caller-owned target on a background task.
//! When the server ends the stream the task reconnects in place and keeps merging
//! into the same target.
//!
//! # Wire format
//! ```text
//! GET ws://<host>:<port>/websocket?authorization=<key>
//! Origin: <origin>
//!
//! ← {"data": <document>}            document inline
//! ← {"data": "<serialized document>"}
//! ```
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use arc_swap::ArcSwap;
//! use coma_client::{Client, ClientConfig};
//!
//! # async fn example() -> Result<(), coma_client::ClientError> {
//! let config = ClientConfig::new("http://localhost:3001/", "localhost", 3001, "secret")
//!     .with_retry(10)
//!     .with_retry_wait(Duration::from_secs(5));
//!
//! let settings = Arc::new(ArcSwap::from_pointee(serde_json::json!({})));
//! let mut client = Client::new(config).await?;
//! client.observe(Arc::clone(&settings))?;
//!
//! println!("{}", settings.load_full());
//! client.shutdown(Duration::from_secs(5)).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod observer;
pub mod resilience;

pub use client::Client;
pub use config::{ClientConfig, RetryConfig};
pub use error::{ClientError, ClientResult, DecodeError};
pub use observer::{ObserverStatus, ObserverTarget};
