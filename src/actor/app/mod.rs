//! App Supervisor
//!
//! Runs the served app as a subprocess and reacts to code changes:
//!
//! ```text
//! ChangeSource --batch--> Classifier --Restart------> stop → start → probe → broadcast
//!                                   --FullReload---> broadcast(None)
//!                                   --AssetReload--> broadcast(path)
//! ```
//!
//! # Modules
//!
//! - `process` - subprocess handle (spawn, signal, wait, kill)
//! - `probe` - HTTP readiness probe after a restart
//! - `supervisor` - the watch loop and its state machine

use std::future::Future;
use std::time::Duration;

use crate::actor::error::DevServerError;
use crate::logger::Logger;

pub mod probe;
pub mod process;
mod supervisor;


pub use probe::ReadinessProbe;
pub use process::{AppCommand, ProcessHandle, StopSignal};
pub use supervisor::{AppSupervisor, AppTask};

pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(1);

/// Lifecycle of the served app as seen by the supervisor.
pub trait AppRunner: Send + 'static {
    /// Launch the app. Fails if it could not be started at all.
    fn start(&mut self) -> impl Future<Output = Result<(), DevServerError>> + Send;

    /// Stop the app if it is running. Never fails; problems are logged.
    fn stop(&mut self) -> impl Future<Output = ()> + Send;
}

/// [`AppRunner`] backed by a real subprocess.
pub struct SubprocessRunner {
    command: AppCommand,
    stop_grace: Duration,
    kill_grace: Duration,
    process: Option<ProcessHandle>,
    logger: Logger,
}

impl SubprocessRunner {
    pub fn new(command: AppCommand, logger: Logger) -> Self {
        Self {
            command,
            stop_grace: DEFAULT_STOP_GRACE,
            kill_grace: DEFAULT_KILL_GRACE,
            process: None,
            logger,
        }
    }

    pub fn with_grace(mut self, stop_grace: Duration, kill_grace: Duration) -> Self {
        self.stop_grace = stop_grace;
        self.kill_grace = kill_grace;
        self
    }
}

impl AppRunner for SubprocessRunner {
    async fn start(&mut self) -> Result<(), DevServerError> {
        let process = ProcessHandle::spawn(&self.command)?;
        crate::debug!(self.logger; "started `{}` (pid {})",
            self.command.display(), process.pid().unwrap_or_default());
        self.process = Some(process);
        Ok(())
    }

    /// Interrupt, wait `stop_grace`, kill, wait `kill_grace`.
    async fn stop(&mut self) {
        let Some(mut process) = self.process.take() else {
            crate::debug!(self.logger; "no app process to stop");
            return;
        };
        let pid = process.pid().unwrap_or_default();

        if !process.is_alive() {
            let code = process
                .exit_code()
                .map_or_else(|| "none (killed by signal)".to_string(), |c| c.to_string());
            crate::warn!(self.logger; "server process already dead, exit code: {}", code);
            return;
        }

        crate::debug!(self.logger; "stopping server process {}...", pid);
        if let Err(e) = process.request_stop(StopSignal::Interrupt) {
            crate::warn!(self.logger; "{}", e);
        }
        if process.wait(self.stop_grace).await {
            crate::debug!(self.logger; "process {} stopped", pid);
            return;
        }

        crate::warn!(self.logger; "process {} did not stop within {:?}, killing", pid, self.stop_grace);
        if let Err(e) = process.force_kill() {
            crate::error!(self.logger; "{}", e);
        }
        if !process.wait(self.kill_grace).await {
            crate::error!(self.logger; "process {} still running after kill", pid);
        }
    }
}

#[cfg(all(test, unix))]
mod subprocess_tests {
    use std::path::PathBuf;
    use std::time::Instant;

    use super::*;
    use crate::logger::{Level, LogCapture};

    fn runner(script: &str) -> (SubprocessRunner, LogCapture) {
        let (logger, capture) = Logger::capture("app");
        let command = AppCommand {
            program: PathBuf::from("sh"),
            args: vec!["-c".into(), script.into()],
            env: vec![],
            cwd: std::env::temp_dir(),
        };
        (SubprocessRunner::new(command, logger), capture)
    }

    #[tokio::test]
    async fn test_stop_interrupts_running_app() {
        let (mut runner, capture) = runner("sleep 30");
        runner.start().await.unwrap();

        runner.stop().await;
        assert!(capture.contains(Level::Debug, "stopping server process"));
        assert!(capture.contains(Level::Debug, "stopped"));
        assert!(!capture.contains(Level::Warn, "did not stop within"));

        runner.stop().await;
        assert!(capture.contains(Level::Debug, "no app process to stop"));
    }

    #[tokio::test]
    async fn test_stop_reports_already_dead_app() {
        let (mut runner, capture) = runner("exit 3");
        runner.start().await.unwrap();
        let process = runner.process.as_mut().unwrap();
        assert!(process.wait(Duration::from_secs(5)).await);

        runner.stop().await;
        assert!(capture.contains(Level::Warn, "server process already dead, exit code: 3"));
        assert!(!capture.contains(Level::Debug, "stopping server process"));
    }

    #[tokio::test]
    async fn test_stop_kills_app_ignoring_interrupt() {
        let (runner, capture) = runner("trap '' INT; sleep 5");
        let mut runner = runner.with_grace(Duration::from_millis(100), Duration::from_secs(1));
        runner.start().await.unwrap();
        // let the shell install its trap
        tokio::time::sleep(Duration::from_millis(100)).await;

        let started = Instant::now();
        runner.stop().await;
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(capture.contains(Level::Warn, "did not stop within"));
        assert!(!capture.contains(Level::Error, "still running after kill"));
        assert!(runner.process.is_none());
    }
}
