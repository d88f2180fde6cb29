use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::AppRunner;
use super::probe::ReadinessProbe;
use crate::actor::error::DevServerError;
use crate::actor::fs::ChangeSource;
use crate::actor::task::WatchTask;
use crate::logger::Logger;
use crate::reload::broadcast::ReloadBroadcaster;
use crate::reload::classify::{Classifier, ReloadAction};
use crate::utils::format::plural_s;

/// Where the supervised app is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Stopped,
    Starting,
    Running,
    Restarting,
}

/// Watch loop that owns the app runner.
pub struct AppSupervisor<R, S> {
    runner: R,
    changes: S,
    classifier: Classifier,
    broadcaster: ReloadBroadcaster,
    probe: ReadinessProbe,
    /// `http://host:port`, for the start banner
    app_url: String,
    starts: u32,
    state: watch::Sender<AppState>,
    logger: Logger,
}

impl<R: AppRunner, S: ChangeSource> AppSupervisor<R, S> {
    pub fn new(
        runner: R,
        changes: S,
        classifier: Classifier,
        broadcaster: ReloadBroadcaster,
        probe: ReadinessProbe,
        app_url: String,
        logger: Logger,
    ) -> Self {
        let (state, _) = watch::channel(AppState::Stopped);
        Self {
            runner,
            changes,
            classifier,
            broadcaster,
            probe,
            app_url,
            starts: 0,
            state,
            logger,
        }
    }

    /// Start the app and watch for changes in the background.
    pub fn spawn(self, failed: CancellationToken) -> AppTask {
        let state = self.state.subscribe();
        let logger = self.logger.clone();
        let task = WatchTask::spawn("app", logger, failed, move |stop| self.run(stop));
        AppTask { task, state }
    }

    async fn run(mut self, stop: CancellationToken) -> Result<(), DevServerError> {
        let result = self.supervise(&stop).await;
        self.runner.stop().await;
        self.state.send_replace(AppState::Stopped);
        result
    }

    async fn supervise(&mut self, stop: &CancellationToken) -> Result<(), DevServerError> {
        self.start_app().await?;

        while let Some(batch) = self.changes.next_batch(stop).await? {
            match self.classifier.app_action(&batch) {
                ReloadAction::Restart => {
                    crate::debug!(self.logger; "{} change{}, restarting server",
                        batch.len(), plural_s(batch.len()));
                    self.state.send_replace(AppState::Restarting);
                    self.runner.stop().await;
                    self.start_app().await?;
                    self.reload_when_live(stop).await;
                }
                ReloadAction::FullReload => {
                    self.broadcaster.broadcast(None);
                }
                ReloadAction::AssetReload(path) => {
                    self.broadcaster.broadcast(Some(&path));
                }
            }
        }
        Ok(())
    }

    async fn start_app(&mut self) -> Result<(), DevServerError> {
        let verb = if self.starts == 0 { "Starting" } else { "Restarting" };
        crate::log!(self.logger; "{} dev server at {} ●", verb, self.app_url);
        self.state.send_replace(AppState::Starting);
        self.runner.start().await?;
        self.starts += 1;
        self.state.send_replace(AppState::Running);
        Ok(())
    }

    /// Reload browsers once the restarted app answers.
    async fn reload_when_live(&mut self, stop: &CancellationToken) {
        if self.broadcaster.registry().is_empty() {
            crate::debug!(self.logger; "no browsers connected, not waiting for the app");
            return;
        }
        if self.probe.wait_until_live(stop).await {
            self.broadcaster.broadcast(None);
        }
    }
}

/// Handle to a running [`AppSupervisor`].
pub struct AppTask {
    task: WatchTask,
    state: watch::Receiver<AppState>,
}

impl AppTask {
    pub fn state(&self) -> AppState {
        *self.state.borrow()
    }

    /// Receiver following state changes.
    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.clone()
    }

    /// Stop watching and stop the app, surfacing any loop error.
    pub async fn close(&mut self) -> Result<(), DevServerError> {
        self.task.close().await
    }
}
