use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::{ChangeBatch, ChangeKind};
use crate::logger::Logger;
use crate::utils::path::normalize_path;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Directories whose contents never trigger a reload.
const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    "node_modules",
    "site-packages",
    ".mypy_cache",
    ".pytest_cache",
    ".idea",
    ".tox",
];

/// Timing and deduplication of raw notify events.
pub(super) struct Debouncer {
    window: Duration,
    /// Path → ChangeKind (dedup is free via HashMap key uniqueness)
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
    logger: Logger,
}

impl Debouncer {
    pub(super) fn new(window: Duration, logger: Logger) -> Self {
        Self {
            window,
            changes: FxHashMap::default(),
            last_event: None,
            logger,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Remove + Create/Modify → Create/Modify (file was restored)
    /// - Modify + Remove → Remove (file was deleted)
    /// - Create + Remove → dropped (never really existed)
    /// - Same type events: first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(modify) => {
                // chmod/atime noise
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
                ChangeKind::Modified
            }
            _ => return,
        };

        for path in &event.paths {
            if is_ignored(path) {
                continue;
            }
            let path = normalize_path(path);
            self.last_event = Some(Instant::now());

            let Some(&existing) = self.changes.get(&path) else {
                crate::debug!(self.logger; "{}: {}", kind.label(), path.display());
                self.changes.insert(path, kind);
                continue;
            };

            match (existing, kind) {
                (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                    self.changes.insert(path, kind);
                }
                (ChangeKind::Modified, ChangeKind::Removed) => {
                    self.changes.insert(path, ChangeKind::Removed);
                }
                (ChangeKind::Created, ChangeKind::Removed) => {
                    self.changes.remove(&path);
                }
                _ => {}
            }
        }
    }

    /// Take the pending batch once the window has passed since the last event.
    pub(super) fn take_if_ready(&mut self) -> Option<ChangeBatch> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        let changes = std::mem::take(&mut self.changes);
        if changes.is_empty() {
            return None;
        }
        Some(ChangeBatch::new(
            changes.into_iter().map(|(path, kind)| (kind, path)).collect(),
        ))
    }

    pub(super) fn is_ready(&self) -> bool {
        match self.last_event {
            Some(last) => last.elapsed() >= self.window,
            None => false,
        }
    }

    /// Sleep until the pending batch may be ready.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };
        self.window
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Editor artifacts, compiled python, and files under tool directories.
pub(super) fn is_ignored(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    if matches!(
        ext,
        "bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp" | "pyc" | "pyo" | "pyd"
    ) || name.ends_with('~')
        || name.starts_with('.')
        || name.ends_with("___jb_tmp___")
        || name.ends_with("___jb_old___")
    {
        return true;
    }

    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|part| IGNORED_DIRS.contains(&part))
    })
}
