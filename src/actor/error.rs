//! Errors raised by the watch tasks and the dev server lifecycle.

use std::io;

use thiserror::Error;

/// Failure that ends a watch task or prevents the server from starting.
#[derive(Debug, Error)]
pub enum DevServerError {
    #[error("file watcher failed: {0}")]
    Watch(#[from] notify::Error),

    #[error("file watcher stopped delivering events")]
    WatcherClosed,

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to signal app process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: io::Error,
    },

    #[error("the port {0} is already in use")]
    PortInUse(u16),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid probe url: {0}")]
    ProbeUrl(#[from] url::ParseError),

    #[error("{0} task panicked")]
    TaskPanicked(&'static str),
}
