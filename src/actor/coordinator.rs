//! Coordinator - owns the running pieces of a dev server session
//!
//! The host wires things up, hands each background piece to the
//! coordinator, then waits. Shutdown happens in one place and in a fixed
//! order: app, static watcher, browser sessions, aux server.

use std::io;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::app::AppTask;
use super::error::DevServerError;
use super::task::WatchTask;
use crate::logger::Logger;
use crate::reload::registry::ConnectionRegistry;

const SERVER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Why [`Coordinator::wait`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Interrupted,
    Failed,
}

pub struct Coordinator {
    /// Cancelled by any task that ends with an error
    failed: CancellationToken,
    /// Cancelled to stop the aux server
    shutdown: CancellationToken,
    app: Option<AppTask>,
    static_watch: Option<WatchTask>,
    server: Option<JoinHandle<io::Result<()>>>,
    registry: ConnectionRegistry,
    logger: Logger,
}

impl Coordinator {
    pub fn new(registry: ConnectionRegistry, logger: Logger) -> Self {
        Self {
            failed: CancellationToken::new(),
            shutdown: CancellationToken::new(),
            app: None,
            static_watch: None,
            server: None,
            registry,
            logger,
        }
    }

    pub fn failure_token(&self) -> CancellationToken {
        self.failed.clone()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn set_app(&mut self, task: AppTask) {
        self.app = Some(task);
    }

    pub fn set_static_watch(&mut self, task: WatchTask) {
        self.static_watch = Some(task);
    }

    /// Track the aux server task. A server error counts as a failure.
    pub fn set_server(&mut self, server: JoinHandle<io::Result<()>>) {
        self.server = Some(server);
    }

    /// Block until Ctrl+C or until some task fails.
    pub async fn wait(&self) -> Exit {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    crate::error!(self.logger; "cannot listen for Ctrl+C: {}", e);
                    return Exit::Failed;
                }
                Exit::Interrupted
            }
            _ = self.failed.cancelled() => Exit::Failed,
        }
    }

    /// Tear everything down, returning the first error seen.
    pub async fn close(mut self) -> Result<(), DevServerError> {
        let mut first_error = None;

        if let Some(mut app) = self.app.take() {
            crate::debug!(self.logger; "stopping app ({:?})", app.state());
            if let Err(e) = app.close().await {
                first_error.get_or_insert(e);
            }
        }
        if let Some(mut watch) = self.static_watch.take()
            && let Err(e) = watch.close().await
        {
            first_error.get_or_insert(e);
        }

        let sessions = self.registry.close_all();
        crate::debug!(self.logger; "closed {} websocket session{}",
            sessions, crate::utils::format::plural_s(sessions));

        self.shutdown.cancel();
        if let Some(server) = self.server.take() {
            match tokio::time::timeout(SERVER_SHUTDOWN_TIMEOUT, server).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => crate::error!(self.logger; "aux server error: {}", e),
                Ok(Err(_)) => {
                    first_error.get_or_insert(DevServerError::TaskPanicked("aux server"));
                }
                Err(_) => crate::debug!(self.logger; "aux server did not stop in time"),
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
