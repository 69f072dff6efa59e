//! File system watching for serve mode.
//!
//! This module provides:
//! - Directory watching using notify-rs
//! - Gitignore-aware filtering of the content directory
//! - The watch loop that feeds events to the build orchestrator

mod events;
mod filter;
mod handler;
mod scanner;
#[allow(clippy::module_inception)]
mod watcher;

pub use events::{map_notify_event, FileEventKind, WatchEvent};
pub use filter::IgnoreFilter;
pub use handler::{serve_events, EventHandler, WatcherStats, WatcherStatsSnapshot};
pub use scanner::{scan_sources, scan_sources_async};
pub use watcher::{FileWatcher, EVENT_QUEUE_CAPACITY};
