//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Connection attempt:
//!     → net/connector.rs (single handshake, optional timeout)
//!     → On failure: retries.rs (fixed wait, bounded attempts)
//!     → Exhausted: last error surfaced to the caller
//! ```

pub mod retries;

pub use retries::RetryPolicy;
