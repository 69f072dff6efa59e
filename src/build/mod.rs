//! Build orchestration: full builds, incremental rebuilds and their state.

mod context;
mod orchestrator;
mod perf;
mod refresh;
mod state;

pub use context::BuildContext;
pub use orchestrator::{BuildOrchestrator, BuildReport, BuildStrategy, EventOutcome, RebuildOutcome};
pub use perf::PerfTimer;
pub use refresh::RefreshNotifier;
pub use state::{BuildState, PendingChanges};
