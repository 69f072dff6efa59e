//! Mutable session state owned by the orchestrator.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::content::{ContentStore, FileIdentity, Slug};
use crate::graph::DependencyGraph;

/// Everything a serve session accumulates between builds.
#[derive(Debug, Default)]
pub struct BuildState {
    pub store: ContentStore,
    /// One graph per emitter, keyed by emitter name.
    pub graphs: BTreeMap<String, DependencyGraph>,
    /// Non-content files under the content root.
    pub tracked_assets: BTreeSet<FileIdentity>,
    /// Slugs of every known file, content or not.
    pub known_slugs: BTreeSet<Slug>,
    pub last_build_at: Option<DateTime<Utc>>,
}

impl BuildState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph of the named emitter, created empty on first use.
    pub fn graph_mut(&mut self, emitter: &str) -> &mut DependencyGraph {
        self.graphs.entry(emitter.to_string()).or_default()
    }

    /// Whether any emitter's graph references `id`.
    #[must_use]
    pub fn is_referenced(&self, id: &FileIdentity) -> bool {
        self.graphs.values().any(|g| g.has_node(id))
    }

    pub fn mark_built(&mut self) {
        self.last_build_at = Some(Utc::now());
    }
}

/// Content changes waiting for the next debounced rebuild.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingChanges {
    pub to_rebuild: BTreeSet<FileIdentity>,
    pub to_remove: BTreeSet<FileIdentity>,
}

impl PendingChanges {
    /// Mark `id` for re-parse. Cancels an earlier removal.
    pub fn rebuild(&mut self, id: FileIdentity) {
        self.to_remove.remove(&id);
        self.to_rebuild.insert(id);
    }

    /// Mark `id` for removal. Cancels an earlier re-parse.
    pub fn remove(&mut self, id: FileIdentity) {
        self.to_rebuild.remove(&id);
        self.to_remove.insert(id);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_rebuild.is_empty() && self.to_remove.is_empty()
    }
}
