//! Shutdown signalling for the observer loop.

use tokio::sync::broadcast;

/// Coordinator for stopping a client's background loop.
///
/// The loop subscribes before it is spawned, so a trigger can never be missed.
#[derive(Debug)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Returns false when nothing is listening.
    pub fn trigger(&self) -> bool {
        tracing::debug!(receivers = self.tx.receiver_count(), "Shutdown signalled");
        self.tx.send(()).is_ok()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
