//! The background observer loop.
//!
//! # Responsibilities
//! - Receive one frame at a time from the active connection
//! - Decode each payload and merge it into the caller's target
//! - Reconnect in place when the server ends the stream
//! - Close the connection and exit when shutdown is signalled
//! - Publish the final outcome on the status channel

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::{broadcast, watch};

use crate::error::{ClientError, ClientResult};
use crate::net::{Connection, Connector, Frame};
use crate::observability::metrics;
use crate::observer::message::Message;
use crate::observer::target::ObserverTarget;
use crate::observer::ObserverStatus;

/// How the loop ended.
enum Exit {
    /// Shutdown was requested; carries the result of closing the connection.
    Shutdown(ClientResult<()>),
    /// An unrecoverable error stopped the loop.
    Failed(ClientError),
}

pub(crate) struct ObserverLoop<T> {
    connector: Arc<Connector>,
    connection: Connection,
    target: T,
    shutdown: broadcast::Receiver<()>,
    status: Arc<watch::Sender<ObserverStatus>>,
}

impl<T: ObserverTarget> ObserverLoop<T> {
    pub(crate) fn new(
        connector: Arc<Connector>,
        connection: Connection,
        target: T,
        shutdown: broadcast::Receiver<()>,
        status: Arc<watch::Sender<ObserverStatus>>,
    ) -> Self {
        Self {
            connector,
            connection,
            target,
            shutdown,
            status,
        }
    }

    /// Run the loop, converting a panic anywhere inside it (the caller's
    /// target included) into a `Failed` status.
    pub(crate) async fn supervise(self) -> ClientResult<()> {
        let status = Arc::clone(&self.status);
        match AssertUnwindSafe(self.run()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                metrics::set_observer_running(false);
                let e = ClientError::ObserverPanicked(panic_message(panic.as_ref()));
                tracing::error!(error = %e, "Observer loop terminated");
                status.send_replace(ObserverStatus::Failed(Arc::new(e)));
                Ok(())
            }
        }
    }

    /// Run until shutdown or an unrecoverable error.
    ///
    /// Returns the result of closing the connection when stopped by shutdown;
    /// loop failures are reported through the status channel instead.
    async fn run(mut self) -> ClientResult<()> {
        tracing::info!(connection_id = %self.connection.id(), "Observer loop started");
        metrics::set_observer_running(true);

        let exit = self.observe().await;
        metrics::set_observer_running(false);

        match exit {
            Exit::Shutdown(closed) => {
                tracing::info!("Observer loop stopped");
                self.status.send_replace(ObserverStatus::Stopped);
                closed
            }
            Exit::Failed(e) => {
                tracing::error!(error = %e, "Observer loop terminated");
                self.status.send_replace(ObserverStatus::Failed(Arc::new(e)));
                Ok(())
            }
        }
    }

    async fn observe(&mut self) -> Exit {
        loop {
            let frame = tokio::select! {
                biased;
                _ = self.shutdown.recv() => None,
                frame = self.connection.next_frame() => Some(frame),
            };
            let Some(frame) = frame else {
                return Exit::Shutdown(self.connection.close().await.map_err(ClientError::Shutdown));
            };

            let step = match frame {
                Frame::Payload(bytes) => self.apply(&bytes).map(|()| true),
                Frame::Control => Ok(true),
                Frame::Ended => self.reconnect().await,
                Frame::Failed(e) => Err(ClientError::Receive(e)),
            };

            match step {
                Ok(true) => {}
                Ok(false) => return Exit::Shutdown(Ok(())),
                Err(e) => return Exit::Failed(e),
            }
        }
    }

    fn apply(&self, frame: &[u8]) -> ClientResult<()> {
        let result = Message::decode(frame)
            .and_then(Message::into_document)
            .and_then(|document| self.target.apply(document));

        match result {
            Ok(()) => {
                metrics::record_frame_received();
                tracing::debug!(
                    connection_id = %self.connection.id(),
                    bytes = frame.len(),
                    "Document merged"
                );
                Ok(())
            }
            Err(e) => {
                metrics::record_decode_failure();
                Err(e.into())
            }
        }
    }

    /// Replace the ended connection. Returns false when shutdown interrupted it.
    async fn reconnect(&mut self) -> ClientResult<bool> {
        tracing::warn!(connection_id = %self.connection.id(), "Stream ended, reconnecting");
        self.status.send_replace(ObserverStatus::Reconnecting);

        let result = tokio::select! {
            biased;
            _ = self.shutdown.recv() => None,
            result = self.connector.connect() => Some(result),
        };

        match result {
            None => Ok(false),
            Some(Ok(connection)) => {
                self.connection = connection;
                metrics::record_reconnect();
                self.status.send_replace(ObserverStatus::Running);
                Ok(true)
            }
            Some(Err(e)) => Err(ClientError::Reconnect(Box::new(e))),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_extraction() {
        let literal: Box<dyn Any + Send> = Box::new("target exploded");
        assert_eq!(panic_message(literal.as_ref()), "target exploded");

        let formatted: Box<dyn Any + Send> = Box::new(format!("bad version {}", 7));
        assert_eq!(panic_message(formatted.as_ref()), "bad version 7");

        let opaque: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(opaque.as_ref()), "unknown panic");
    }
}
