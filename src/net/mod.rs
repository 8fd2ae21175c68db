//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ClientConfig (host, port, key, origin)
//!     → endpoint.rs (ws URL + handshake request with Origin header)
//!     → connector.rs (handshake, bounded fixed-delay retry)
//!     → connection.rs (live connection handle, frame classification)
//!     → Hand off to the observer loop
//! ```
//!
//! # Design Decisions
//! - At most one live connection per client; reconnect replaces it wholesale
//! - The shared key never appears in logs
//! - End of stream is a distinct frame outcome so the loop can reconnect

pub mod connection;
pub mod connector;
pub mod endpoint;

pub use connection::{Connection, ConnectionId, Frame};
pub use connector::Connector;
pub use endpoint::Endpoint;
