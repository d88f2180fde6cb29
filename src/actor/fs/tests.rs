use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::debouncer::{Debouncer, is_ignored};
use super::types::ChangeKind;
use super::{ChangeBatch, ChangeSource, ChangeWatcher};
use crate::logger::Logger;
use crate::utils::path::normalize_path;

fn debouncer(window_ms: u64) -> Debouncer {
    let (logger, _) = Logger::capture("watch");
    Debouncer::new(Duration::from_millis(window_ms), logger)
}

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

// ----------------------------------------------------------------------------
// Debouncer
// ----------------------------------------------------------------------------

#[test]
fn test_debouncer_empty() {
    let debouncer = debouncer(10);
    assert!(!debouncer.is_ready());
    assert!(debouncer.sleep_duration() >= Duration::from_secs(60));
}

#[test]
fn test_event_kinds_recorded() {
    let mut debouncer = debouncer(10);
    debouncer.add_event(&make_event(vec!["/watch/a.py"], create_kind()));
    debouncer.add_event(&make_event(vec!["/watch/b.py"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/watch/c.py"], remove_kind()));

    assert_eq!(debouncer.changes.len(), 3);
    assert_eq!(debouncer.changes[Path::new("/watch/a.py")], ChangeKind::Created);
    assert_eq!(debouncer.changes[Path::new("/watch/b.py")], ChangeKind::Modified);
    assert_eq!(debouncer.changes[Path::new("/watch/c.py")], ChangeKind::Removed);
}

#[test]
fn test_created_then_removed_is_dropped() {
    let mut debouncer = debouncer(10);
    debouncer.add_event(&make_event(vec!["/watch/tmp.html"], create_kind()));
    debouncer.add_event(&make_event(vec!["/watch/tmp.html"], remove_kind()));
    assert!(debouncer.changes.is_empty());
}

#[test]
fn test_removed_then_restored() {
    let mut debouncer = debouncer(10);
    debouncer.add_event(&make_event(vec!["/watch/app.py"], remove_kind()));
    debouncer.add_event(&make_event(vec!["/watch/app.py"], create_kind()));
    assert_eq!(debouncer.changes[Path::new("/watch/app.py")], ChangeKind::Created);
}

#[test]
fn test_metadata_changes_ignored() {
    let mut debouncer = debouncer(10);
    let kind = notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::Permissions,
    ));
    debouncer.add_event(&make_event(vec!["/watch/app.py"], kind));
    assert!(debouncer.changes.is_empty());
}

#[test]
fn test_take_if_ready_after_window() {
    let mut debouncer = debouncer(5);
    debouncer.add_event(&make_event(vec!["/watch/b.css", "/watch/a.css"], modify_kind()));
    assert!(debouncer.take_if_ready().is_none());

    std::thread::sleep(Duration::from_millis(10));
    let batch = debouncer.take_if_ready().unwrap();
    let paths: Vec<_> = batch.paths().collect();
    assert_eq!(paths, vec![Path::new("/watch/a.css"), Path::new("/watch/b.css")]);
    assert!(!debouncer.is_ready());
}

#[test]
fn test_ignored_paths() {
    assert!(is_ignored(Path::new("/p/app/.#main.py")));
    assert!(is_ignored(Path::new("/p/app/main.py~")));
    assert!(is_ignored(Path::new("/p/app/main.pyc")));
    assert!(is_ignored(Path::new("/p/app/.main.py.swp")));
    assert!(is_ignored(Path::new("/p/app/__pycache__/main.cpython-312.py")));
    assert!(is_ignored(Path::new("/p/node_modules/x/index.js")));
    assert!(!is_ignored(Path::new("/p/app/main.py")));
    assert!(!is_ignored(Path::new("/p/static/css/app.css")));
}

// ----------------------------------------------------------------------------
// ChangeBatch
// ----------------------------------------------------------------------------

#[test]
fn test_batch_single() {
    let one = ChangeBatch::modified(["/p/a.css"]);
    assert_eq!(one.single(), Some(Path::new("/p/a.css")));

    let two = ChangeBatch::modified(["/p/a.css", "/p/b.css"]);
    assert_eq!(two.single(), None);
    assert_eq!(two.len(), 2);
}

// ----------------------------------------------------------------------------
// Sources
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_channel_source_stops_on_cancel() {
    let (tx, mut rx) = mpsc::unbounded_channel::<ChangeBatch>();
    let stop = CancellationToken::new();

    tx.send(ChangeBatch::modified(["/p/a.py"])).unwrap();
    assert!(rx.next_batch(&stop).await.unwrap().is_some());

    stop.cancel();
    assert!(rx.next_batch(&stop).await.unwrap().is_none());
}

#[tokio::test]
async fn test_watcher_reports_written_file() {
    let temp = TempDir::new().unwrap();
    let root = normalize_path(temp.path());
    let (logger, _) = Logger::capture("watch");
    let mut watcher = ChangeWatcher::new(&root, Duration::from_millis(50), logger).unwrap();
    let stop = CancellationToken::new();

    let target = root.join("main.py");
    std::fs::write(&target, "print('hi')\n").unwrap();

    let batch = tokio::time::timeout(Duration::from_secs(5), watcher.next_batch(&stop))
        .await
        .expect("watcher produced no batch")
        .unwrap()
        .unwrap();
    assert!(batch.paths().any(|p| p == target));
}

#[tokio::test]
async fn test_watcher_cancel_returns_none() {
    let temp = TempDir::new().unwrap();
    let (logger, _) = Logger::capture("watch");
    let mut watcher =
        ChangeWatcher::new(temp.path(), Duration::from_millis(50), logger).unwrap();
    let stop = CancellationToken::new();
    stop.cancel();

    assert!(watcher.next_batch(&stop).await.unwrap().is_none());
}
