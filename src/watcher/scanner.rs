//! Source enumeration for full builds.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use super::filter::IgnoreFilter;
use crate::Result;

/// Walk `content_dir` and return every non-ignored file, sorted.
///
/// Unreadable entries are logged and skipped. A missing directory yields
/// no files.
#[must_use]
pub fn scan_sources(content_dir: &Path, filter: &IgnoreFilter) -> Vec<PathBuf> {
    if !content_dir.is_dir() {
        tracing::warn!(path = %content_dir.display(), "Content directory does not exist");
        return Vec::new();
    }

    let walker = WalkBuilder::new(content_dir)
        .standard_filters(false)
        .hidden(true)
        .follow_links(false)
        .build();

    let mut files = Vec::new();
    let mut skipped = 0_usize;
    for entry in walker {
        match entry {
            Ok(entry) => {
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                if filter.is_ignored(entry.path()) {
                    skipped += 1;
                    continue;
                }
                files.push(entry.into_path());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error walking content directory");
            }
        }
    }

    files.sort();
    tracing::debug!(
        path = %content_dir.display(),
        found = files.len(),
        skipped,
        "Content scan complete"
    );
    files
}

/// Run [`scan_sources`] on the blocking pool.
///
/// # Errors
///
/// Returns an error if the scan task panics.
pub async fn scan_sources_async(
    content_dir: PathBuf,
    filter: std::sync::Arc<IgnoreFilter>,
) -> Result<Vec<PathBuf>> {
    tokio::task::spawn_blocking(move || scan_sources(&content_dir, &filter))
        .await
        .map_err(|e| crate::Error::internal(format!("scan task failed: {e}")))
}
