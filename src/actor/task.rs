//! Background watch tasks.
//!
//! A [`WatchTask`] owns a spawned loop plus the token that stops it. Closing
//! cancels, waits for the loop to wind down, and hands back whatever error
//! ended it, so failures are never dropped on the floor.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::error::DevServerError;
use crate::logger::Logger;

pub struct WatchTask {
    name: &'static str,
    stop: CancellationToken,
    handle: Option<JoinHandle<Result<(), DevServerError>>>,
    logger: Logger,
}

impl WatchTask {
    /// Spawn `body` with a fresh stop token.
    ///
    /// If the loop ends with an error it is logged and `failed` is cancelled,
    /// letting the host notice without polling every task.
    pub fn spawn<F, Fut>(
        name: &'static str,
        logger: Logger,
        failed: CancellationToken,
        body: F,
    ) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<(), DevServerError>> + Send + 'static,
    {
        let stop = CancellationToken::new();
        let fut = body(stop.clone());
        let task_logger = logger.clone();
        let handle = tokio::spawn(async move {
            let result = fut.await;
            if let Err(e) = &result {
                crate::error!(task_logger; "error in {} watch loop: {:?}", name, e);
                failed.cancel();
            }
            result
        });

        Self {
            name,
            stop,
            handle: Some(handle),
            logger,
        }
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the loop and wait for it. Safe to call more than once.
    pub async fn close(&mut self) -> Result<(), DevServerError> {
        self.stop.cancel();
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        crate::debug!(self.logger; "closing {} task", self.name);
        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(()),
            Err(_) => Err(DevServerError::TaskPanicked(self.name)),
        }
    }
}

impl Drop for WatchTask {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::Level;

    #[tokio::test]
    async fn test_close_stops_loop() {
        let (logger, _) = Logger::capture("watch");
        let failed = CancellationToken::new();
        let mut task = WatchTask::spawn("demo", logger, failed.clone(), |stop| async move {
            stop.cancelled().await;
            Ok(())
        });

        assert!(!task.is_finished());
        assert!(task.close().await.is_ok());
        assert!(task.is_finished());
        assert!(!failed.is_cancelled());
        // second close is a no-op
        assert!(task.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_error_surfaces_on_close() {
        let (logger, capture) = Logger::capture("watch");
        let failed = CancellationToken::new();
        let mut task = WatchTask::spawn("demo", logger, failed.clone(), |_stop| async move {
            Err(DevServerError::WatcherClosed)
        });

        failed.cancelled().await;
        assert!(matches!(task.close().await, Err(DevServerError::WatcherClosed)));
        assert!(capture.contains(Level::Error, "error in demo watch loop"));
    }

    #[tokio::test]
    async fn test_panic_surfaces_on_close() {
        let (logger, _) = Logger::capture("watch");
        let mut task = WatchTask::spawn("demo", logger, CancellationToken::new(), |_stop| async move {
            if true {
                panic!("boom");
            }
            Ok(())
        });

        assert!(matches!(
            task.close().await,
            Err(DevServerError::TaskPanicked("demo"))
        ));
    }
}
