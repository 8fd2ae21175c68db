//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Client::shutdown → signal observer loop → close frame → loop exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → hosting binary begins its own shutdown
//! ```
//!
//! # Design Decisions
//! - Closing the connection is the only way to stop the observer loop
//! - Shutdown has a deadline: the task is aborted after it

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
