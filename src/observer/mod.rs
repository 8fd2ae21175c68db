//! Observer subsystem.
//!
//! # Data Flow
//! ```text
//! Connection::next_frame
//!     → message.rs (envelope → document)
//!     → merge.rs (document merged into the current value)
//!     → target.rs (caller-owned, caller-synchronized state)
//!
//! On end of stream:
//!     task.rs → Connector::connect → replace connection → keep receiving
//! ```
//!
//! # Design Decisions
//! - One loop per client, frames applied strictly in arrival order
//! - Decode failures are terminal and never trigger a reconnect
//! - Loop death is published on a watch channel, never by exiting the process

use std::sync::Arc;

use crate::error::ClientError;

pub mod merge;
pub mod message;
pub mod target;
pub(crate) mod task;

pub use message::Message;
pub use target::ObserverTarget;

/// Lifecycle of a client's observer loop.
#[derive(Debug, Clone, Default)]
pub enum ObserverStatus {
    /// No loop has been started.
    #[default]
    Idle,
    /// Receiving frames.
    Running,
    /// The stream ended and a new connection is being established.
    Reconnecting,
    /// Stopped by shutdown.
    Stopped,
    /// Terminated by an unrecoverable error.
    Failed(Arc<ClientError>),
}

impl ObserverStatus {
    /// Whether a loop is currently alive.
    pub fn is_active(&self) -> bool {
        matches!(self, ObserverStatus::Running | ObserverStatus::Reconnecting)
    }

    /// Whether the loop has ended, for any reason.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ObserverStatus::Stopped | ObserverStatus::Failed(_))
    }

    /// The error that ended the loop, if any.
    pub fn error(&self) -> Option<&Arc<ClientError>> {
        match self {
            ObserverStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_predicates() {
        assert!(!ObserverStatus::Idle.is_active());
        assert!(ObserverStatus::Reconnecting.is_active());
        assert!(ObserverStatus::Stopped.is_terminal());

        let failed = ObserverStatus::Failed(Arc::new(ClientError::NoConnection));
        assert!(failed.is_terminal());
        assert!(matches!(
            failed.error().map(|e| e.as_ref()),
            Some(ClientError::NoConnection)
        ));
    }
}
