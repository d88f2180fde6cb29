//! Connection Registry
//!
//! Browser sessions that completed the `info` step, keyed by session, each
//! with the page path it reported. Shared between the websocket endpoint
//! (adds/removes) and the broadcaster (reads).
//!
//! Writes to a session go through its [`SessionHandle`], a channel to the
//! task owning the socket's write half. A send never suspends, so a
//! broadcast walks a consistent snapshot of the registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;

/// Identity of one websocket connection.
pub type SessionId = u64;

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Frame queued for a session's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close,
}

/// Writer side of a session is gone (socket closed or closing).
#[derive(Debug, Error)]
#[error("websocket session {0} is closed")]
pub struct SendError(pub SessionId);

/// Cloneable sending half of a browser session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    tx: mpsc::UnboundedSender<Outbound>,
}

impl SessionHandle {
    /// New handle plus the receiver the writer task drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn send_text(&self, text: impl Into<String>) -> Result<(), SendError> {
        self.tx
            .send(Outbound::Text(text.into()))
            .map_err(|_| SendError(self.id))
    }

    /// Ask the writer to close the socket. No-op if already gone.
    pub fn close(&self) {
        let _ = self.tx.send(Outbound::Close);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

struct Entry {
    session: SessionHandle,
    url: String,
}

/// Registered sessions with the page path each one is showing.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session, or update its path if already present.
    ///
    /// Returns `true` when the session was not registered before.
    pub fn register(&self, session: &SessionHandle, url: impl Into<String>) -> bool {
        let url = url.into();
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.iter_mut().find(|e| e.session.id == session.id) {
            entry.url = url;
            return false;
        }
        entries.push(Entry {
            session: session.clone(),
            url,
        });
        true
    }

    /// Remove a session, returning the path it was registered with.
    pub fn remove(&self, id: SessionId) -> Option<String> {
        let mut entries = self.entries.lock();
        let index = entries.iter().position(|e| e.session.id == id)?;
        Some(entries.remove(index).url)
    }

    pub fn url_of(&self, id: SessionId) -> Option<String> {
        self.entries
            .lock()
            .iter()
            .find(|e| e.session.id == id)
            .map(|e| e.url.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Consistent copy of the current entries.
    pub fn snapshot(&self) -> Vec<(SessionHandle, String)> {
        self.entries
            .lock()
            .iter()
            .map(|e| (e.session.clone(), e.url.clone()))
            .collect()
    }

    /// Remove every session and ask each to close. Returns how many there were.
    pub fn close_all(&self) -> usize {
        let drained: Vec<Entry> = self.entries.lock().drain(..).collect();
        for entry in &drained {
            entry.session.close();
        }
        drained.len()
    }
}
