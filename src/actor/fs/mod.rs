//! Change Watcher
//!
//! Watches a directory tree and yields debounced [`ChangeBatch`]es.
//!
//! ```text
//! notify (own thread) → unbounded channel → Debouncer (timing) → ChangeBatch
//! ```
//!
//! The watcher starts when constructed, so events that happen while the
//! caller finishes its own startup are buffered rather than lost.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::DevServerError;
use crate::logger::Logger;

mod debouncer;
mod types;

#[cfg(test)]
mod tests;

use debouncer::Debouncer;
pub use debouncer::DEFAULT_DEBOUNCE_MS;
pub use types::ChangeBatch;

/// Anything that yields batches of file changes until cancelled.
///
/// `Ok(None)` means `stop` fired; an `Err` ends the consumer's loop.
pub trait ChangeSource: Send + 'static {
    fn next_batch(
        &mut self,
        stop: &CancellationToken,
    ) -> impl Future<Output = Result<Option<ChangeBatch>, DevServerError>> + Send;
}

/// Recursive watcher over one directory.
pub struct ChangeWatcher {
    root: PathBuf,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    /// notify callback → async bridge
    events: mpsc::UnboundedReceiver<notify::Result<notify::Event>>,
    debouncer: Debouncer,
    logger: Logger,
}

impl ChangeWatcher {
    /// Start watching `root` recursively.
    pub fn new(root: &Path, debounce: Duration, logger: Logger) -> Result<Self, DevServerError> {
        let (tx, events) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        crate::debug!(logger; "watching {}", root.display());

        Ok(Self {
            root: root.to_path_buf(),
            _watcher: watcher,
            events,
            debouncer: Debouncer::new(debounce, logger.clone()),
            logger,
        })
    }
}

impl ChangeSource for ChangeWatcher {
    async fn next_batch(
        &mut self,
        stop: &CancellationToken,
    ) -> Result<Option<ChangeBatch>, DevServerError> {
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => return Ok(None),
                event = self.events.recv() => match event {
                    Some(Ok(event)) => self.debouncer.add_event(&event),
                    Some(Err(e)) => return Err(e.into()),
                    None => return Err(DevServerError::WatcherClosed),
                },
                _ = tokio::time::sleep(self.debouncer.sleep_duration()) => {
                    if let Some(batch) = self.debouncer.take_if_ready() {
                        crate::debug!(self.logger; "{} change{} under {}",
                            batch.len(), crate::utils::format::plural_s(batch.len()), self.root.display());
                        return Ok(Some(batch));
                    }
                }
            }
        }
    }
}

/// Batches fed through a channel. Closing the sender ends the stream.
impl ChangeSource for mpsc::UnboundedReceiver<ChangeBatch> {
    async fn next_batch(
        &mut self,
        stop: &CancellationToken,
    ) -> Result<Option<ChangeBatch>, DevServerError> {
        tokio::select! {
            biased;
            _ = stop.cancelled() => Ok(None),
            batch = self.recv() => Ok(batch),
        }
    }
}
