//! App subprocess handle.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::actor::error::DevServerError;

/// How to launch the served app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: PathBuf,
}

impl AppCommand {
    /// `program arg1 arg2`, for log lines.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Signal used to ask the app to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// Keyboard interrupt, the app gets to shut down cleanly
    Interrupt,
}

/// A running (or exited) app process.
pub struct ProcessHandle {
    child: Child,
    pid: Option<u32>,
    status: Option<ExitStatus>,
}

impl ProcessHandle {
    pub fn spawn(command: &AppCommand) -> Result<Self, DevServerError> {
        let child = Command::new(&command.program)
            .args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&command.cwd)
            .stdin(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DevServerError::Spawn {
                program: command.program.display().to_string(),
                source,
            })?;
        let pid = child.id();
        Ok(Self {
            child,
            pid,
            status: None,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Check without blocking whether the process is still running.
    pub fn is_alive(&mut self) -> bool {
        if self.status.is_some() {
            return false;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.status = Some(status);
                false
            }
            Ok(None) => true,
            Err(_) => false,
        }
    }

    /// Exit code once the process has exited (`None` if killed by a signal).
    pub fn exit_code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }

    pub fn request_stop(&mut self, signal: StopSignal) -> Result<(), DevServerError> {
        let Some(pid) = self.pid else {
            return Ok(());
        };
        send_signal(pid, signal).map_err(|source| DevServerError::Signal { pid, source })
    }

    /// Wait up to `timeout` for exit. Returns `true` if the process exited.
    pub async fn wait(&mut self, timeout: Duration) -> bool {
        if self.status.is_some() {
            return true;
        }
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(Ok(status)) => {
                self.status = Some(status);
                true
            }
            Ok(Err(_)) => !self.is_alive(),
            Err(_) => false,
        }
    }

    /// Kill without giving the process a chance to clean up.
    pub fn force_kill(&mut self) -> Result<(), DevServerError> {
        let pid = self.pid.unwrap_or_default();
        self.child
            .start_kill()
            .map_err(|source| DevServerError::Signal { pid, source })
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: StopSignal) -> std::io::Result<()> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let signal = match signal {
        StopSignal::Interrupt => Signal::SIGINT,
    };
    let pid = i32::try_from(pid)
        .map_err(|_| std::io::Error::from(std::io::ErrorKind::InvalidInput))?;
    kill(Pid::from_raw(pid), signal).map_err(std::io::Error::from)
}

// No interrupt signal to deliver; the escalation step kills the process.
#[cfg(not(unix))]
fn send_signal(_pid: u32, _signal: StopSignal) -> std::io::Result<()> {
    Ok(())
}
