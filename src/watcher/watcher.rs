//! File system watcher using notify-rs.

use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::events::{map_notify_event, WatchEvent};
use crate::error::WatcherError;
use crate::Result;

/// Capacity of the watch event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Recursive watcher on one directory. Events flow into the sender given
/// at construction until the watcher is dropped.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher").field("root", &self.root).finish()
    }
}

impl FileWatcher {
    /// Start watching `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory does not exist or cannot be watched.
    pub fn new(root: impl AsRef<Path>, tx: mpsc::Sender<WatchEvent>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(WatcherError::WatchFailed {
                path: root.display().to_string(),
                reason: "directory does not exist".to_string(),
            }
            .into());
        }

        let mut watcher = notify::recommended_watcher(
            move |result: std::result::Result<notify::Event, notify::Error>| match result {
                Ok(event) => {
                    for event in map_notify_event(event) {
                        if tx.blocking_send(event).is_err() {
                            tracing::debug!(error = %WatcherError::QueueClosed, "Dropping events");
                            break;
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Watch error");
                }
            },
        )
        .map_err(|e| WatcherError::WatchFailed {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| WatcherError::WatchFailed {
                path: root.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(path = %root.display(), "Watching directory");
        Ok(Self {
            _watcher: watcher,
            root,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}
