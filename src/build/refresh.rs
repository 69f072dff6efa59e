//! Client-refresh signal fired once per rebuild cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Broadcasts a refresh to every connected preview client.
///
/// Clone is cheap; all clones share the same channel and counter.
#[derive(Debug, Clone)]
pub struct RefreshNotifier {
    tx: broadcast::Sender<u64>,
    count: Arc<AtomicU64>,
}

impl Default for RefreshNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshNotifier {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(16);
        Self {
            tx,
            count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Fire the signal. Having no subscribers is not an error.
    pub fn notify(&self) {
        let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        let receivers = self.tx.send(n).unwrap_or(0);
        tracing::trace!(signal = n, receivers, "Client refresh");
    }

    /// Subscribe to future signals.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<u64> {
        self.tx.subscribe()
    }

    /// Number of signals fired so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}
