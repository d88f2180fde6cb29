//! Static directory watcher.
//!
//! Reloads browsers when files under the static directory change. Never
//! touches the app process.

use tokio_util::sync::CancellationToken;

use super::error::DevServerError;
use super::fs::ChangeSource;
use super::task::WatchTask;
use crate::logger::Logger;
use crate::reload::broadcast::ReloadBroadcaster;
use crate::reload::classify::{Classifier, ReloadAction};

pub struct LiveReloadTask;

impl LiveReloadTask {
    pub fn spawn<S: ChangeSource>(
        changes: S,
        broadcaster: ReloadBroadcaster,
        logger: Logger,
        failed: CancellationToken,
    ) -> WatchTask {
        WatchTask::spawn("livereload", logger, failed, move |stop| {
            watch_static(changes, broadcaster, stop)
        })
    }
}

async fn watch_static<S: ChangeSource>(
    mut changes: S,
    broadcaster: ReloadBroadcaster,
    stop: CancellationToken,
) -> Result<(), DevServerError> {
    while let Some(batch) = changes.next_batch(&stop).await? {
        match Classifier::static_action(&batch) {
            ReloadAction::AssetReload(path) => broadcaster.broadcast(Some(&path)),
            ReloadAction::FullReload | ReloadAction::Restart => broadcaster.broadcast(None),
        };
    }
    Ok(())
}
