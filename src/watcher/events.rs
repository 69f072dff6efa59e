//! Watch event types and the mapping from raw notify events.

use std::fmt;
use std::path::PathBuf;

use notify::event::{EventKind, ModifyKind, RenameMode};

/// Kind of change observed for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventKind {
    Add,
    Change,
    Delete,
}

impl fmt::Display for FileEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Change => "change",
            Self::Delete => "delete",
        })
    }
}

/// One file-level change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: FileEventKind,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FileEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn add(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileEventKind::Add)
    }

    pub fn change(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileEventKind::Change)
    }

    pub fn delete(path: impl Into<PathBuf>) -> Self {
        Self::new(path, FileEventKind::Delete)
    }
}

/// Translate a notify event into file-level events.
///
/// Renames become a delete of the old path and an add of the new one.
/// Directories, access and metadata-only events produce nothing.
#[must_use]
pub fn map_notify_event(event: notify::Event) -> Vec<WatchEvent> {
    let notify::Event { kind, paths, .. } = event;

    match kind {
        EventKind::Create(_) => files_only(paths).map(WatchEvent::add).collect(),
        EventKind::Remove(_) => paths.into_iter().map(WatchEvent::delete).collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => paths.into_iter().map(WatchEvent::delete).collect(),
            RenameMode::To => files_only(paths).map(WatchEvent::add).collect(),
            RenameMode::Both => {
                let mut paths = paths.into_iter();
                let mut out = Vec::with_capacity(2);
                if let Some(from) = paths.next() {
                    out.push(WatchEvent::delete(from));
                }
                out.extend(files_only(paths.collect()).map(WatchEvent::add));
                out
            }
            RenameMode::Any | RenameMode::Other => paths
                .into_iter()
                .filter(|p| !p.is_dir())
                .map(|p| {
                    if p.exists() {
                        WatchEvent::add(p)
                    } else {
                        WatchEvent::delete(p)
                    }
                })
                .collect(),
        },
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => files_only(paths).map(WatchEvent::change).collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

fn files_only(paths: Vec<PathBuf>) -> impl Iterator<Item = PathBuf> {
    paths.into_iter().filter(|p| !p.is_dir())
}
