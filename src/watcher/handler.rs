//! Watch loop: the single consumer of the event queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::events::WatchEvent;
use crate::build::{BuildOrchestrator, EventOutcome, RebuildOutcome};
use crate::server::observability::spans;

/// Counters for one watch session.
#[derive(Debug, Default)]
pub struct WatcherStats {
    pub events_received: AtomicU64,
    pub events_ignored: AtomicU64,
    pub rebuilds: AtomicU64,
    pub superseded: AtomicU64,
    pub errors: AtomicU64,
}

impl WatcherStats {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn snapshot(&self) -> WatcherStatsSnapshot {
        WatcherStatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_ignored: self.events_ignored.load(Ordering::Relaxed),
            rebuilds: self.rebuilds.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    fn record_rebuild(&self, outcome: &RebuildOutcome) {
        let counter = match outcome {
            RebuildOutcome::Ignored => &self.events_ignored,
            RebuildOutcome::AssetTracked | RebuildOutcome::Rebuilt(_) => &self.rebuilds,
            RebuildOutcome::Superseded => &self.superseded,
            RebuildOutcome::Failed(_) => &self.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of watcher stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherStatsSnapshot {
    pub events_received: u64,
    pub events_ignored: u64,
    pub rebuilds: u64,
    pub superseded: u64,
    pub errors: u64,
}

/// Dispatches events to the orchestrator's configured rebuild strategy.
///
/// Fine-grained events are applied one at a time in arrival order.
/// Debounced events each run as their own task and collapse on the
/// rebuild lock.
pub struct EventHandler {
    orchestrator: Arc<BuildOrchestrator>,
    stats: Arc<WatcherStats>,
    tasks: JoinSet<RebuildOutcome>,
}

impl EventHandler {
    #[must_use]
    pub fn new(orchestrator: Arc<BuildOrchestrator>) -> Self {
        Self {
            orchestrator,
            stats: WatcherStats::new(),
            tasks: JoinSet::new(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> Arc<WatcherStats> {
        Arc::clone(&self.stats)
    }

    /// Handle one event.
    pub async fn handle(&mut self, event: WatchEvent) {
        self.stats.events_received.fetch_add(1, Ordering::Relaxed);
        let span = spans::event_span(&event.path, &event.kind.to_string());

        if self.orchestrator.fast_rebuild() {
            match self.orchestrator.apply_event(&event).instrument(span).await {
                Ok(EventOutcome::Ignored) => {
                    self.stats.events_ignored.fetch_add(1, Ordering::Relaxed);
                }
                Ok(EventOutcome::Applied(_)) => {
                    self.stats.rebuilds.fetch_add(1, Ordering::Relaxed);
                }
                Err(_) => {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                }
            }
        } else {
            let orchestrator = Arc::clone(&self.orchestrator);
            self.tasks.spawn(
                async move { orchestrator.request_rebuild(&event).await }.instrument(span),
            );
        }
    }

    /// Consume `events` until the queue closes or `cancel` fires, then wait
    /// for in-flight rebuilds to finish.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<WatchEvent>,
        cancel: CancellationToken,
    ) -> WatcherStatsSnapshot {
        tracing::info!(
            fast_rebuild = self.orchestrator.fast_rebuild(),
            "Watching for changes"
        );

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::debug!("Watch loop cancelled");
                    break;
                }
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    self.reap(joined);
                }
                event = events.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => {
                        tracing::debug!("Watch queue closed");
                        break;
                    }
                },
            }
        }

        while let Some(joined) = self.tasks.join_next().await {
            self.reap(joined);
        }

        let snapshot = self.stats.snapshot();
        tracing::info!(
            received = snapshot.events_received,
            rebuilds = snapshot.rebuilds,
            superseded = snapshot.superseded,
            errors = snapshot.errors,
            "Watch loop stopped"
        );
        snapshot
    }

    fn reap(&self, joined: std::result::Result<RebuildOutcome, tokio::task::JoinError>) {
        match joined {
            Ok(outcome) => self.stats.record_rebuild(&outcome),
            Err(e) => {
                tracing::error!(error = %e, "Rebuild task panicked");
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Run the watch loop for `orchestrator` over `events`.
pub async fn serve_events(
    orchestrator: Arc<BuildOrchestrator>,
    events: mpsc::Receiver<WatchEvent>,
    cancel: CancellationToken,
) -> WatcherStatsSnapshot {
    EventHandler::new(orchestrator).run(events, cancel).await
}
