//! The client handle.
//!
//! # Responsibilities
//! - Validate configuration and perform the first connection synchronously
//! - Hand the connection to a single background observer loop
//! - Expose the loop's status so callers can detect its death
//! - Close the connection on shutdown, within a deadline
//!
//! # Design Decisions
//! - At most one live connection; the observer loop owns it while running
//! - A second `observe` while a loop is alive is rejected
//! - Dropping the client aborts its loop, so no task outlives it

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};

use crate::config::validation::{normalize, validate_config};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::lifecycle::Shutdown;
use crate::net::{Connection, Connector};
use crate::observer::task::ObserverLoop;
use crate::observer::{ObserverStatus, ObserverTarget};

/// A connection to a coma server that merges pushed configuration into a target.
pub struct Client {
    config: ClientConfig,
    connector: Arc<Connector>,
    /// Idle connection, present until an observer loop takes it.
    connection: Option<Connection>,
    observer: Option<JoinHandle<ClientResult<()>>>,
    shutdown: Shutdown,
    status: Arc<watch::Sender<ObserverStatus>>,
}

impl Client {
    /// Build a client and connect to the server.
    ///
    /// A retry bound of zero is normalized to one attempt. Fails when the
    /// configuration is invalid or every connection attempt fails.
    pub async fn new(mut config: ClientConfig) -> ClientResult<Self> {
        normalize(&mut config);
        validate_config(&config).map_err(ClientError::Config)?;

        let connector = Connector::new(&config)?;
        let connection = connector.connect().await?;
        let (status, _) = watch::channel(ObserverStatus::Idle);

        Ok(Self {
            config,
            connector: Arc::new(connector),
            connection: Some(connection),
            observer: None,
            shutdown: Shutdown::new(),
            status: Arc::new(status),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether the client holds a live connection, idle or observed.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some() || self.status.borrow().is_active()
    }

    /// Start merging pushed documents into `target` on a background task.
    ///
    /// Returns once the loop is started. Failures inside the loop are reported
    /// through [`status`](Self::status), [`status_watch`](Self::status_watch) and
    /// [`last_error`](Self::last_error).
    ///
    /// The loop writes to `target` concurrently with the caller's code; reads must
    /// go through the target's own guard (lock or snapshot).
    ///
    /// Must be called from within a Tokio runtime; otherwise
    /// [`ClientError::NoRuntime`] is returned and the connection stays idle.
    pub fn observe<T: ObserverTarget>(&mut self, target: T) -> ClientResult<()> {
        if self.observer_running() {
            return Err(ClientError::AlreadyObserving);
        }
        let runtime = Handle::try_current().map_err(|_| ClientError::NoRuntime)?;
        self.observer = None;
        let connection = self.connection.take().ok_or(ClientError::NoConnection)?;

        let observer = ObserverLoop::new(
            Arc::clone(&self.connector),
            connection,
            target,
            self.shutdown.subscribe(),
            Arc::clone(&self.status),
        );
        self.status.send_replace(ObserverStatus::Running);
        self.observer = Some(runtime.spawn(observer.supervise()));
        Ok(())
    }

    /// Establish a fresh idle connection after the observer loop has died.
    ///
    /// Rejected with [`ClientError::AlreadyObserving`] while a loop is alive.
    pub async fn reconnect(&mut self) -> ClientResult<()> {
        if self.observer_running() {
            return Err(ClientError::AlreadyObserving);
        }
        self.observer = None;
        let connection = self.connector.connect().await?;
        self.connection = Some(connection);
        Ok(())
    }

    /// Stop the observer loop and close the connection, waiting at most `deadline`.
    ///
    /// Both the loop and any idle connection are closed; the first failure is
    /// returned. A task that does not finish in time is aborted and
    /// [`ClientError::ShutdownTimeout`] is returned.
    pub async fn shutdown(&mut self, deadline: Duration) -> ClientResult<()> {
        let expires = Instant::now() + deadline;
        let mut outcome = Ok(());

        if let Some(handle) = self.observer.take() {
            outcome = self.stop_observer(handle, expires, deadline).await;
        }

        if let Some(mut connection) = self.connection.take() {
            tracing::info!(connection_id = %connection.id(), "Closing idle connection");
            let closed = match timeout_at(expires, connection.close()).await {
                Ok(closed) => closed.map_err(ClientError::Shutdown),
                Err(_) => Err(ClientError::ShutdownTimeout(deadline.as_millis())),
            };
            if outcome.is_ok() {
                outcome = closed;
            }
        }

        outcome
    }

    async fn stop_observer(
        &self,
        mut handle: JoinHandle<ClientResult<()>>,
        expires: Instant,
        deadline: Duration,
    ) -> ClientResult<()> {
        self.shutdown.trigger();
        match timeout_at(expires, &mut handle).await {
            Ok(Ok(closed)) => closed,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Observer task ended abnormally");
                self.status.send_replace(ObserverStatus::Failed(Arc::new(
                    ClientError::ObserverTask(e.to_string()),
                )));
                Err(ClientError::ObserverTask(e.to_string()))
            }
            Err(_) => {
                handle.abort();
                self.status.send_replace(ObserverStatus::Stopped);
                Err(ClientError::ShutdownTimeout(deadline.as_millis()))
            }
        }
    }

    /// Current status of the observer loop.
    pub fn status(&self) -> ObserverStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn status_watch(&self) -> watch::Receiver<ObserverStatus> {
        self.status.subscribe()
    }

    /// The error that terminated the observer loop, if it failed.
    pub fn last_error(&self) -> Option<Arc<ClientError>> {
        self.status.borrow().error().cloned()
    }

    fn observer_running(&self) -> bool {
        self.observer
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.connector.endpoint().redacted())
            .field("origin", &self.config.origin)
            .field("retry", &self.config.retry)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(handle) = self.observer.take() {
            handle.abort();
        }
    }
}
