//! Filesystem watcher collaborator, delivering change events into the
//! thread pool's `hot_reload` subsystem.
//!
//! Collects events per path and waits out a quiet window so an editor's
//! atomic-save burst collapses into one event, then pushes eagerly from a
//! dedicated thread instead of draining on a per-frame poll, since this
//! core has no render-loop tick of its own to piggyback on.

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dare_assets::WorkPriority;

use crate::thread_pool::ThreadPool;
use crate::work_item::WorkItem;

const DEBOUNCE_DURATION: Duration = Duration::from_millis(100);
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Wraps a `notify` watcher and a background debounce thread. Watch
/// registration failures are logged and non-fatal: the rest of the pipeline
/// keeps working, it just won't hot-reload that path.
pub struct FileWatcher {
    watcher: Option<RecommendedWatcher>,
    _debounce_thread: std::thread::JoinHandle<()>,
}

impl FileWatcher {
    pub fn new(pool: Arc<ThreadPool>) -> Self {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        });
        let watcher = match watcher {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::warn!("failed to start filesystem watcher: {e}, hot-reload disabled");
                None
            }
        };

        let debounce_thread = std::thread::Builder::new()
            .name("fs-watcher-debounce".to_string())
            .spawn(move || Self::run_debounce_loop(rx, pool))
            .expect("failed to spawn filesystem watcher debounce thread");

        Self {
            watcher,
            _debounce_thread: debounce_thread,
        }
    }

    /// Adds a path watch, file or directory. A no-op if the watcher failed
    /// to initialize.
    pub fn watch(&mut self, path: &Path, recursive: bool) {
        let Some(watcher) = &mut self.watcher else {
            return;
        };
        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        if let Err(e) = watcher.watch(path, mode) {
            tracing::warn!("failed to watch {}: {e}", path.display());
        }
    }

    fn run_debounce_loop(
        rx: mpsc::Receiver<Result<notify::Event, notify::Error>>,
        pool: Arc<ThreadPool>,
    ) {
        let mut pending: HashMap<PathBuf, Instant> = HashMap::new();
        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(event)) => {
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        for path in event.paths {
                            pending.insert(path, Instant::now());
                        }
                    }
                }
                Ok(Err(e)) => tracing::warn!("filesystem watcher error: {e}"),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => return,
            }

            let now = Instant::now();
            pending.retain(|path, timestamp| {
                if now.duration_since(*timestamp) >= DEBOUNCE_DURATION {
                    pool.submit(
                        "hot_reload",
                        WorkPriority::Normal,
                        WorkItem::HotReload { path: path.clone() },
                    );
                    false
                } else {
                    true
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_watch_file() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watched.txt");
        std::fs::File::create(&path).unwrap();
        (dir, path)
    }

    #[test]
    fn edit_to_watched_file_submits_a_hot_reload_job_once_debounced() {
        let pool = Arc::new(ThreadPool::new());
        let (tx, rx) = mpsc::channel();
        pool.register_subsystem("hot_reload", 0, 1, move |item| tx.send(item).unwrap());
        pool.request_workers("hot_reload", 1);

        let (_dir, path) = temp_watch_file();
        let mut watcher = FileWatcher::new(pool);
        watcher.watch(&path, false);

        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"changed")
            .unwrap();

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            WorkItem::HotReload { path: reported } => {
                assert_eq!(reported.canonicalize().unwrap(), path.canonicalize().unwrap());
            }
            _ => panic!("expected a HotReload job"),
        }
    }

    #[test]
    fn watching_a_nonexistent_path_does_not_panic() {
        let pool = Arc::new(ThreadPool::new());
        pool.register_subsystem("hot_reload", 0, 1, |_item| {});
        let mut watcher = FileWatcher::new(pool);
        watcher.watch(Path::new("/nowhere/does-not-exist.txt"), false);
    }
}
