//! File watching.
//!
//! Pipeline:
//! ```text
//! notify (sync) → bridge thread → tokio channel → Debouncer → FileChange batch
//! ```
//!
//! The watcher is registered before the consumer starts so that changes made
//! during the initial build buffer in the channel instead of being lost.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::utils::path::normalize_path;

pub mod debounce;
pub mod filter;

pub use debounce::{DEFAULT_DEBOUNCE_MS, Debouncer};
pub use filter::{ChangeKind, EventFilter, resolve_kind};

/// One settled file change, reported after the debounce window elapses.
#[derive(Debug, Clone)]
pub struct FileChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Predicate telling the watcher whether a path was already part of the
/// site before this change (distinguishes `Added` from `Changed`).
pub type KnownPaths = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Remote control for a running [`FileWatcher`]. Cloneable; `close` is
/// idempotent.
#[derive(Clone)]
pub struct WatcherHandle {
    close_tx: mpsc::Sender<()>,
    closed: Arc<AtomicBool>,
}

impl WatcherHandle {
    /// Stop the watch loop. Repeat calls are no-ops.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.close_tx.try_send(());
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Watches a set of root directories and emits debounced [`FileChange`]
/// batches.
pub struct FileWatcher {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    filter: EventFilter,
    debouncer: Debouncer,
    known: KnownPaths,
    close_tx: mpsc::Sender<()>,
    close_rx: mpsc::Receiver<()>,
}

impl FileWatcher {
    /// Create the watcher and attach all existing roots immediately.
    pub fn new(
        roots: &[PathBuf],
        filter: EventFilter,
        debounce_window: Duration,
        known: KnownPaths,
    ) -> Result<Self> {
        // Sync channel for notify (it doesn't support async)
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        // Skip non-existent roots to handle race conditions at startup
        for root in roots {
            if root.exists() {
                watcher.watch(root, RecursiveMode::Recursive)?;
                crate::debug!("watch"; "watching {}", root.display());
            }
        }

        let (close_tx, close_rx) = mpsc::channel(1);

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            filter,
            debouncer: Debouncer::new(debounce_window),
            known,
            close_tx,
            close_rx,
        })
    }

    pub fn handle(&self) -> WatcherHandle {
        WatcherHandle {
            close_tx: self.close_tx.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run the watch loop, sending settled change batches to `changes_tx`.
    /// Returns when the handle is closed or every consumer is gone.
    pub async fn run(mut self, changes_tx: mpsc::Sender<Vec<FileChange>>) {
        let notify_rx = self.notify_rx;
        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // Bridge thread: poll notify events and forward to the async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        // Paths this loop has already reported, so a create-then-write burst
        // settles as one Added and later bursts as Changed.
        let mut seen: FxHashSet<PathBuf> = FxHashSet::default();

        loop {
            tokio::select! {
                biased;
                _ = self.close_rx.recv() => {
                    crate::debug!("watch"; "watcher closed");
                    break;
                }
                Some(event) = async_rx.recv() => {
                    for path in &event.paths {
                        if self.filter.accepts(path) {
                            self.debouncer.record(normalize_path(path));
                        }
                    }
                }
                _ = tokio::time::sleep(self.debouncer.sleep_duration()) => {
                    let ready = self.debouncer.take_ready();
                    if ready.is_empty() {
                        continue;
                    }
                    let mut changes = Vec::with_capacity(ready.len());
                    for path in ready {
                        let was_known = seen.contains(&path) || (self.known)(&path);
                        let kind = resolve_kind(&path, was_known);
                        match kind {
                            ChangeKind::Removed => {
                                seen.remove(&path);
                            }
                            _ => {
                                seen.insert(path.clone());
                            }
                        }
                        changes.push(FileChange { path, kind });
                    }
                    if changes_tx.send(changes).await.is_err() {
                        break; // Receiver dropped
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_known() -> KnownPaths {
        Arc::new(|_: &Path| false)
    }

    #[tokio::test]
    async fn test_change_batch_delivery() {
        let dir = tempfile::TempDir::new().unwrap();
        let filter = EventFilter::new(&[], &["md".to_string()]);
        let watcher = FileWatcher::new(
            &[dir.path().to_path_buf()],
            filter,
            Duration::from_millis(30),
            no_known(),
        )
        .unwrap();
        let handle = watcher.handle();

        let (tx, mut rx) = mpsc::channel(8);
        let task = tokio::spawn(watcher.run(tx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        std::fs::write(dir.path().join("post.md"), "# hi").unwrap();

        let changes = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for change batch")
            .expect("watcher closed early");
        assert!(!changes.is_empty());
        assert!(
            changes
                .iter()
                .all(|c| c.path.file_name().unwrap() == "post.md")
        );
        assert_eq!(changes[0].kind, ChangeKind::Added);

        handle.close();
        let _ = task.await;
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let watcher = FileWatcher::new(
            &[dir.path().to_path_buf()],
            EventFilter::new(&[], &[]),
            Duration::from_millis(30),
            no_known(),
        )
        .unwrap();
        let handle = watcher.handle();

        let (tx, _rx) = mpsc::channel(8);
        let task = tokio::spawn(watcher.run(tx));

        handle.close();
        handle.close();
        assert!(handle.is_closed());
        let _ = tokio::time::timeout(Duration::from_secs(5), task).await;
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("not-yet");
        let watcher = FileWatcher::new(
            &[missing],
            EventFilter::new(&[], &[]),
            Duration::from_millis(30),
            no_known(),
        );
        assert!(watcher.is_ok());
    }
}
