use std::path::{Path, PathBuf};

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// One debounced group of file changes, sorted by path.
///
/// Never empty when produced by a watcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch(Vec<(ChangeKind, PathBuf)>);

impl ChangeBatch {
    pub fn new(mut changes: Vec<(ChangeKind, PathBuf)>) -> Self {
        changes.sort_by(|a, b| a.1.cmp(&b.1));
        Self(changes)
    }

    /// Batch of `Modified` events, handy for tests and scripted sources.
    pub fn modified<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self::new(
            paths
                .into_iter()
                .map(|p| (ChangeKind::Modified, p.into()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.0.iter().map(|(_, p)| p.as_path())
    }

    /// The changed path if the batch holds exactly one change.
    pub fn single(&self) -> Option<&Path> {
        match self.0.as_slice() {
            [(_, path)] => Some(path),
            _ => None,
        }
    }
}
