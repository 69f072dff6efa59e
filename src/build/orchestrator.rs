//! Full builds and the two incremental rebuild strategies.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

use super::state::{BuildState, PendingChanges};
use super::{BuildContext, PerfTimer, RefreshNotifier};
use crate::config::Config;
use crate::content::{
    filter_content, filters_from_names, ContentFilter, ContentParser, FileIdentity,
    MarkdownParser, ParsedContent, Slug,
};
use crate::emit::{
    emit_content, run_emitter, Emitter, EmitterRegistry, OutputWriter, StaticResources,
};
use crate::error::{EmitError, GraphError};
use crate::graph::DependencyGraph;
use crate::server::metrics::{BUILDS_TOTAL, BUILD_DURATION, CONTENT_FILES};
use crate::watcher::{scan_sources_async, FileEventKind, IgnoreFilter, WatchEvent};
use crate::{Error, Result};

/// Which build path produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStrategy {
    Full,
    FineGrained,
    Debounced,
}

impl BuildStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::FineGrained => "fine_grained",
            Self::Debounced => "debounced",
        }
    }
}

/// What one build or rebuild cycle did.
#[derive(Debug)]
pub struct BuildReport {
    pub strategy: BuildStrategy,
    /// Files parsed in this cycle.
    pub parsed: usize,
    /// Artifacts written.
    pub emitted: usize,
    /// Artifacts deleted because nothing feeds them any more.
    pub removed: usize,
    /// Emitters that failed, tagged by name.
    pub failures: Vec<EmitError>,
    /// The graphs disagreed with the store and everything was re-emitted.
    pub full_reemit: bool,
    pub elapsed: Duration,
}

impl BuildReport {
    fn new(strategy: BuildStrategy) -> Self {
        Self {
            strategy,
            parsed: 0,
            emitted: 0,
            removed: 0,
            failures: Vec::new(),
            full_reemit: false,
            elapsed: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn outcome(&self) -> &'static str {
        if self.is_success() {
            "success"
        } else {
            "partial"
        }
    }
}

/// Result of one fine-grained event.
#[derive(Debug)]
pub enum EventOutcome {
    Ignored,
    Applied(BuildReport),
}

/// Result of one debounced rebuild request.
#[derive(Debug)]
pub enum RebuildOutcome {
    Ignored,
    /// A non-content file changed; only the asset set and clients were updated.
    AssetTracked,
    /// A newer request arrived while this one waited for the lock.
    Superseded,
    Rebuilt(BuildReport),
    /// The attempt failed; previous output is left in place.
    Failed(Error),
}

/// Owns the session state and runs every build path.
pub struct BuildOrchestrator {
    ctx: BuildContext,
    parser: Arc<dyn ContentParser>,
    filters: Vec<Arc<dyn ContentFilter>>,
    emitters: EmitterRegistry,
    ignore: Arc<IgnoreFilter>,
    writer: OutputWriter,
    resources: StaticResources,
    refresh: RefreshNotifier,
    state: Mutex<BuildState>,
    /// Guards the full build and every debounced rebuild.
    rebuild_lock: Mutex<()>,
    latest_request: AtomicU64,
    pending: parking_lot::Mutex<PendingChanges>,
}

impl std::fmt::Debug for BuildOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOrchestrator")
            .field("content_dir", &self.ctx.content_dir)
            .field("output_dir", &self.ctx.output_dir)
            .field("emitters", &self.emitters)
            .finish_non_exhaustive()
    }
}

impl BuildOrchestrator {
    /// Create an orchestrator with the built-in parser and the plugins named
    /// in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or names an unknown
    /// plugin.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let ctx = BuildContext::new(Arc::clone(&config))?;

        let filters = filters_from_names(&config.filters)?;
        let emitters = EmitterRegistry::from_names(&config.emitters)?;
        let ignore = Arc::new(
            IgnoreFilter::new(
                &ctx.content_dir,
                &config.ignore_patterns,
                &config.content_extensions,
            )?
            .excluding(&ctx.output_dir),
        );
        let writer = OutputWriter::new(&ctx.output_dir);
        let resources = StaticResources::from_static_dir(ctx.static_dir.as_deref());

        Ok(Self {
            ctx,
            parser: Arc::new(MarkdownParser::new()),
            filters,
            emitters,
            ignore,
            writer,
            resources,
            refresh: RefreshNotifier::new(),
            state: Mutex::new(BuildState::new()),
            rebuild_lock: Mutex::new(()),
            latest_request: AtomicU64::new(0),
            pending: parking_lot::Mutex::new(PendingChanges::default()),
        })
    }

    /// Replace the built-in Markdown parser.
    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn ContentParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Replace the configured filters. They run in the given order.
    #[must_use]
    pub fn with_filters(mut self, filters: Vec<Arc<dyn ContentFilter>>) -> Self {
        self.filters = filters;
        self
    }

    /// Replace the configured emitters.
    #[must_use]
    pub fn with_emitters(mut self, emitters: EmitterRegistry) -> Self {
        self.emitters = emitters;
        self
    }

    /// Share a refresh notifier with an already running server.
    #[must_use]
    pub fn with_refresh(mut self, refresh: RefreshNotifier) -> Self {
        self.refresh = refresh;
        self
    }

    /// Resolved directories and configuration.
    #[must_use]
    pub const fn context(&self) -> &BuildContext {
        &self.ctx
    }

    #[must_use]
    pub const fn refresh(&self) -> &RefreshNotifier {
        &self.refresh
    }

    #[must_use]
    pub fn ignore_filter(&self) -> &IgnoreFilter {
        &self.ignore
    }

    /// Whether events take the fine-grained path.
    #[must_use]
    pub fn fast_rebuild(&self) -> bool {
        self.ctx.config.fast_rebuild
    }

    /// Names of the active filters, in order.
    #[must_use]
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Lock and inspect the session state.
    pub async fn state(&self) -> MutexGuard<'_, BuildState> {
        self.state.lock().await
    }

    /// Hold the rebuild lock. Full and debounced rebuilds wait until the
    /// guard is dropped.
    pub async fn lock_rebuilds(&self) -> MutexGuard<'_, ()> {
        self.rebuild_lock.lock().await
    }

    /// Ticket of the most recent debounced rebuild request.
    #[must_use]
    pub fn latest_request(&self) -> u64 {
        self.latest_request.load(Ordering::SeqCst)
    }

    /// Identity of an event path. Relative paths resolve against the
    /// content root.
    #[must_use]
    pub fn identity(&self, path: &Path) -> FileIdentity {
        if path.is_absolute() {
            FileIdentity::new(path)
        } else {
            self.ctx.source_identity(path)
        }
    }

    /// Wipe the output directory and build everything from scratch.
    ///
    /// # Errors
    ///
    /// Returns an error if any file fails to parse, an emitter cannot
    /// compute its dependencies, or the output directory cannot be cleaned.
    /// Individual emitter failures are reported, not returned.
    pub async fn build(&self) -> Result<BuildReport> {
        let _guard = self.rebuild_lock.lock().await;
        let mut perf = PerfTimer::new();
        tracing::info!(
            content = %self.ctx.content_dir.display(),
            output = %self.ctx.output_dir.display(),
            "Starting full build"
        );
        if self.ctx.config.verbose {
            let filters = self.filter_names();
            let emitters = self.emitters.names();
            tracing::info!(
                count = filters.len() + emitters.len(),
                filters = %filters.join(", "),
                emitters = %emitters.join(", "),
                "Loaded plugins"
            );
        }

        let result = self.full_build(&mut perf).await;
        match &result {
            Ok(report) => {
                record(BuildStrategy::Full, report.outcome(), perf.elapsed());
                tracing::info!(
                    parsed = report.parsed,
                    emitted = report.emitted,
                    failures = report.failures.len(),
                    elapsed_ms = perf.elapsed_ms(),
                    "Done processing files"
                );
            }
            Err(_) => record(BuildStrategy::Full, "failure", perf.elapsed()),
        }
        result
    }

    async fn full_build(&self, perf: &mut PerfTimer) -> Result<BuildReport> {
        let mut report = BuildReport::new(BuildStrategy::Full);

        perf.add_event("clean");
        self.writer.clean().await?;
        tracing::debug!(elapsed_ms = perf.since_ms("clean"), "Cleaned output directory");

        perf.add_event("glob");
        let files =
            scan_sources_async(self.ctx.content_dir.clone(), Arc::clone(&self.ignore)).await?;
        let (content_files, assets): (Vec<FileIdentity>, Vec<FileIdentity>) = files
            .into_iter()
            .map(FileIdentity::new)
            .partition(|id| self.ctx.is_content(id));
        let known_slugs: BTreeSet<Slug> = content_files
            .iter()
            .chain(&assets)
            .map(|id| self.ctx.slug_for(id))
            .collect();
        tracing::info!(
            files = content_files.len() + assets.len(),
            content = content_files.len(),
            elapsed_ms = perf.since_ms("glob"),
            "Found input files"
        );

        let ctx = self.ctx_with(known_slugs.clone());
        let parsed = self.parser.parse(&ctx, &content_files).await?;
        report.parsed = parsed.len();

        let mut state = self.state.lock().await;
        state.store.clear();
        for content in parsed {
            state.store.insert(content);
        }
        state.tracked_assets = assets.into_iter().collect();
        state.known_slugs = known_slugs;

        let filtered = filter_content(&ctx, &self.filters, state.store.all());
        state.graphs = self.compute_graphs(&ctx, &filtered).await?;

        let summary =
            emit_content(&ctx, &self.emitters, &filtered, &self.resources, &self.writer).await;
        report.emitted = summary.emitted();
        report.failures = summary.failures;

        state.mark_built();
        set_content_gauge(&state);
        report.elapsed = perf.elapsed();
        Ok(report)
    }

    /// Apply one event with fine-grained invalidation: only artifacts whose
    /// inputs include the changed file are rewritten.
    ///
    /// # Errors
    ///
    /// Returns an error if the file fails to parse; the session is left as
    /// it was before the event. Also returns an error if the full re-emit
    /// after a graph inconsistency fails; clients are still refreshed.
    pub async fn apply_event(&self, event: &WatchEvent) -> Result<EventOutcome> {
        let id = self.identity(&event.path);
        if self.ignore.is_ignored(id.path()) {
            tracing::trace!(path = %id, "Ignoring event");
            return Ok(EventOutcome::Ignored);
        }

        let perf = PerfTimer::new();
        let result = self.apply_fine_grained(&id, event.kind, &perf).await;
        match &result {
            Ok(report) => {
                record(BuildStrategy::FineGrained, report.outcome(), perf.elapsed());
                tracing::info!(
                    path = %id,
                    kind = %event.kind,
                    emitted = report.emitted,
                    removed = report.removed,
                    failures = report.failures.len(),
                    elapsed_ms = perf.elapsed_ms(),
                    "Rebuilt changed file"
                );
            }
            Err(e) => {
                record(BuildStrategy::FineGrained, "failure", perf.elapsed());
                tracing::error!(
                    path = %id,
                    kind = %event.kind,
                    error = %e,
                    elapsed_ms = perf.elapsed_ms(),
                    "Rebuild failed, waiting for the next change"
                );
            }
        }
        result.map(EventOutcome::Applied)
    }

    async fn apply_fine_grained(
        &self,
        id: &FileIdentity,
        kind: FileEventKind,
        perf: &PerfTimer,
    ) -> Result<BuildReport> {
        let mut report = BuildReport::new(BuildStrategy::FineGrained);
        let mut state = self.state.lock().await;
        let is_content = self.ctx.is_content(id);
        let slug = self.ctx.slug_for(id);

        let parsed = if is_content && kind != FileEventKind::Delete {
            let mut slugs = state.known_slugs.clone();
            slugs.insert(slug.clone());
            let mut parsed = self
                .parser
                .parse(&self.ctx_with(slugs), std::slice::from_ref(id))
                .await?;
            report.parsed = parsed.len();
            Some(
                parsed
                    .pop()
                    .ok_or_else(|| Error::internal(format!("parser produced nothing for {id}")))?,
            )
        } else {
            None
        };

        let slug_changed = if kind == FileEventKind::Delete {
            state.known_slugs.remove(&slug)
        } else {
            state.known_slugs.insert(slug.clone())
        };
        let ctx = self.ctx_with(state.known_slugs.clone());

        // Pages linking to a slug that appeared or vanished render differently
        let link = self.ctx.link_identity(&slug);
        let mut leaves_before: BTreeMap<String, BTreeSet<FileIdentity>> = BTreeMap::new();
        for (name, graph) in &state.graphs {
            let mut leaves = graph.downstream_leaves(id);
            if slug_changed {
                leaves.extend(graph.downstream_leaves(&link));
            }
            if graph.has_node(id) || !leaves.is_empty() {
                leaves_before.insert(name.clone(), leaves);
            }
        }

        match (parsed, kind) {
            (Some(content), _) => {
                let previous = state.store.insert(content);
                let own = filter_content(&ctx, &self.filters, state.store.select([id]));
                let old = self.filtered(&ctx, previous);
                for emitter in self.emitters.iter() {
                    match self.single_graphs(emitter.as_ref(), &ctx, &old, &own).await {
                        Ok((before, after)) => {
                            let graph = state.graph_mut(emitter.name());
                            graph.merge_edges_for_node(&own_edges(&after, id), id)?;
                            graph.replace_edges(
                                &inbound_edges(&before, id),
                                &inbound_edges(&after, id),
                            );
                        }
                        Err(e) => report.failures.push(dependency_failure(emitter.name(), id, &e)),
                    }
                }
            }
            (None, FileEventKind::Delete) => {
                let previous = if is_content {
                    state.store.remove(id)
                } else {
                    state.tracked_assets.remove(id);
                    None
                };
                let old = self.filtered(&ctx, previous);
                if !old.is_empty() {
                    for emitter in self.emitters.iter() {
                        match emitter.dependency_graph(&ctx, &old, &self.resources).await {
                            Ok(before) => state
                                .graph_mut(emitter.name())
                                .replace_edges(&inbound_edges(&before, id), &DependencyGraph::new()),
                            Err(e) => report.failures.push(dependency_failure(emitter.name(), id, &e)),
                        }
                    }
                }
                for graph in state.graphs.values_mut() {
                    graph.remove_node(id);
                }
            }
            (None, _) => {
                state.tracked_assets.insert(id.clone());
            }
        }

        let mut inconsistency = None;
        for emitter in self.emitters.iter() {
            let name = emitter.name();
            let Some(graph) = state.graphs.get(name) else {
                continue;
            };
            let before = leaves_before.remove(name);
            if before.is_none() && !graph.has_node(id) {
                continue;
            }

            let mut affected = before.unwrap_or_default();
            affected.extend(graph.downstream_leaves(id));
            let (orphaned, live): (BTreeSet<_>, BTreeSet<_>) = affected
                .into_iter()
                .partition(|leaf| graph.upstream_count(leaf) == 0);

            let mut working = graph.upstreams_of_leaves(&live);
            working.insert(id.clone());

            // Link nodes name files that may not exist, so only real sources count
            if let Some(missing) = working
                .iter()
                .find(|u| *u != id && self.is_content_source(u) && !state.store.contains(u))
            {
                inconsistency = Some(GraphError::Inconsistent {
                    emitter: name.to_string(),
                    path: missing.to_string(),
                });
                break;
            }

            for artifact in orphaned.iter().chain(&live) {
                match self.writer.remove(artifact).await {
                    Ok(true) if orphaned.contains(artifact) => report.removed += 1,
                    Ok(_) => {}
                    Err(e) => tracing::warn!(emitter = name, path = %artifact, error = %e, "Could not delete artifact"),
                }
            }
            if live.is_empty() {
                continue;
            }

            let content = filter_content(&ctx, &self.filters, state.store.select(&working));
            tracing::debug!(
                emitter = name,
                leaves = live.len(),
                inputs = content.len(),
                "Re-emitting affected artifacts"
            );
            let result =
                run_emitter(emitter.as_ref(), &ctx, &content, &self.resources, &self.writer).await;
            match result {
                Ok(written) => report.emitted += written.len(),
                Err(e) => report.failures.push(e),
            }
        }

        let fallback = match inconsistency {
            Some(err) => {
                tracing::warn!(error = %err, "Dependency graph out of sync, re-emitting everything");
                self.reemit_everything(&ctx, &mut state, &mut report).await
            }
            None => Ok(()),
        };

        if fallback.is_ok() {
            state.mark_built();
        }
        set_content_gauge(&state);
        drop(state);

        // Clients reload even when the fallback failed
        self.refresh.notify();
        report.elapsed = perf.elapsed();
        fallback.map(|()| report)
    }

    /// Wipe the output and emit the whole store with freshly computed graphs.
    async fn reemit_everything(
        &self,
        ctx: &BuildContext,
        state: &mut BuildState,
        report: &mut BuildReport,
    ) -> Result<()> {
        self.writer.clean().await?;
        let filtered = filter_content(ctx, &self.filters, state.store.all());
        state.graphs = self.compute_graphs(ctx, &filtered).await?;
        let summary =
            emit_content(ctx, &self.emitters, &filtered, &self.resources, &self.writer).await;
        report.emitted = summary.emitted();
        report.failures.extend(summary.failures);
        report.full_reemit = true;
        Ok(())
    }

    /// Dependency graphs of one file's previous and current versions.
    async fn single_graphs(
        &self,
        emitter: &dyn Emitter,
        ctx: &BuildContext,
        old: &[Arc<ParsedContent>],
        new: &[Arc<ParsedContent>],
    ) -> Result<(DependencyGraph, DependencyGraph)> {
        let before = if old.is_empty() {
            DependencyGraph::new()
        } else {
            emitter.dependency_graph(ctx, old, &self.resources).await?
        };
        let after = emitter.dependency_graph(ctx, new, &self.resources).await?;
        Ok((before, after))
    }

    fn filtered(
        &self,
        ctx: &BuildContext,
        content: Option<Arc<ParsedContent>>,
    ) -> Vec<Arc<ParsedContent>> {
        content.map_or_else(Vec::new, |c| filter_content(ctx, &self.filters, vec![c]))
    }

    /// Queue a debounced full rebuild for one event.
    ///
    /// Requests that are overtaken by a newer one while waiting for the
    /// rebuild lock return [`RebuildOutcome::Superseded`]; their changes are
    /// carried by the request that wins.
    pub async fn request_rebuild(&self, event: &WatchEvent) -> RebuildOutcome {
        let id = self.identity(&event.path);
        if self.ignore.is_ignored(id.path()) {
            tracing::trace!(path = %id, "Ignoring event");
            return RebuildOutcome::Ignored;
        }

        if !self.ctx.is_content(&id) {
            {
                let mut state = self.state.lock().await;
                if event.kind == FileEventKind::Delete {
                    state.tracked_assets.remove(&id);
                } else {
                    state.tracked_assets.insert(id.clone());
                }
            }
            tracing::debug!(path = %id, kind = %event.kind, "Tracked asset changed");
            self.refresh.notify();
            return RebuildOutcome::AssetTracked;
        }

        {
            let mut pending = self.pending.lock();
            if event.kind == FileEventKind::Delete {
                pending.remove(id.clone());
            } else {
                pending.rebuild(id.clone());
            }
        }
        let ticket = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;

        let _guard = self.rebuild_lock.lock().await;
        if self.latest_request.load(Ordering::SeqCst) != ticket {
            tracing::debug!(path = %id, ticket, "Superseded by a newer change");
            record(BuildStrategy::Debounced, "superseded", Duration::ZERO);
            return RebuildOutcome::Superseded;
        }

        let changes = std::mem::take(&mut *self.pending.lock());
        let perf = PerfTimer::new();
        tracing::info!(
            changed = changes.to_rebuild.len(),
            removed = changes.to_remove.len(),
            "Detected change, rebuilding"
        );

        let outcome = match self.debounced_rebuild(changes, &perf).await {
            Ok(report) => {
                record(BuildStrategy::Debounced, report.outcome(), perf.elapsed());
                tracing::info!(
                    parsed = report.parsed,
                    emitted = report.emitted,
                    failures = report.failures.len(),
                    elapsed_ms = perf.elapsed_ms(),
                    "Rebuild complete"
                );
                RebuildOutcome::Rebuilt(report)
            }
            Err(e) => {
                record(BuildStrategy::Debounced, "failure", perf.elapsed());
                tracing::error!(
                    error = %e,
                    elapsed_ms = perf.elapsed_ms(),
                    "Rebuild failed, waiting for the next change"
                );
                RebuildOutcome::Failed(e)
            }
        };

        self.refresh.notify();
        outcome
    }

    async fn debounced_rebuild(
        &self,
        changes: PendingChanges,
        perf: &PerfTimer,
    ) -> Result<BuildReport> {
        let mut report = BuildReport::new(BuildStrategy::Debounced);
        let mut state = self.state.lock().await;

        let mut slugs = state.known_slugs.clone();
        slugs.extend(state.store.identities().map(|id| self.ctx.slug_for(id)));
        slugs.extend(changes.to_rebuild.iter().map(|id| self.ctx.slug_for(id)));
        slugs.extend(state.tracked_assets.iter().map(|id| self.ctx.slug_for(id)));
        for id in &changes.to_remove {
            slugs.remove(&self.ctx.slug_for(id));
        }
        let ctx = self.ctx_with(slugs.clone());

        let files: Vec<FileIdentity> = changes.to_rebuild.into_iter().collect();
        let parsed = self.parser.parse(&ctx, &files).await?;
        report.parsed = parsed.len();

        for content in parsed {
            state.store.insert(content);
        }
        for id in &changes.to_remove {
            state.store.remove(id);
        }
        state.known_slugs = slugs;

        let filtered = filter_content(&ctx, &self.filters, state.store.all());
        state.graphs = self.compute_graphs(&ctx, &filtered).await?;

        self.writer.clean().await?;
        let summary =
            emit_content(&ctx, &self.emitters, &filtered, &self.resources, &self.writer).await;
        report.emitted = summary.emitted();
        report.failures = summary.failures;

        state.mark_built();
        set_content_gauge(&state);
        report.elapsed = perf.elapsed();
        Ok(report)
    }

    async fn compute_graphs(
        &self,
        ctx: &BuildContext,
        content: &[Arc<ParsedContent>],
    ) -> Result<BTreeMap<String, DependencyGraph>> {
        let mut graphs = BTreeMap::new();
        for emitter in self.emitters.iter() {
            let graph = emitter
                .dependency_graph(ctx, content, &self.resources)
                .await
                .map_err(|e| EmitError::Dependencies {
                    emitter: emitter.name().to_string(),
                    reason: e.to_string(),
                })?;
            tracing::debug!(
                emitter = emitter.name(),
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                "Computed dependency graph"
            );
            graphs.insert(emitter.name().to_string(), graph);
        }
        Ok(graphs)
    }

    fn ctx_with(&self, all_slugs: BTreeSet<Slug>) -> BuildContext {
        let mut ctx = self.ctx.clone();
        ctx.all_slugs = all_slugs;
        ctx
    }

    fn is_content_source(&self, id: &FileIdentity) -> bool {
        self.ctx.is_content(id)
            && !self.ctx.is_link(id)
            && id.relative_to(&self.ctx.content_dir).is_some()
    }
}

/// Only the edges leaving `id`. Emitters may describe unrelated nodes
/// (static files, for one) regardless of the content they are given.
fn own_edges(graph: &DependencyGraph, id: &FileIdentity) -> DependencyGraph {
    let mut own = DependencyGraph::new();
    for target in graph.direct_targets(id) {
        own.add_edge(id.clone(), target);
    }
    own
}

/// Edges from other nodes into the artifacts of `id`, such as the link
/// nodes its page depends on.
fn inbound_edges(graph: &DependencyGraph, id: &FileIdentity) -> DependencyGraph {
    let targets = graph.direct_targets(id);
    let mut inbound = DependencyGraph::new();
    for (from, to) in graph.edges() {
        if &from != id && targets.contains(&to) {
            inbound.add_edge(from, to);
        }
    }
    inbound
}

fn dependency_failure(emitter: &str, id: &FileIdentity, e: &Error) -> EmitError {
    let err = EmitError::Dependencies {
        emitter: emitter.to_string(),
        reason: e.to_string(),
    };
    tracing::error!(emitter, path = %id, error = %err, "Could not update dependencies");
    err
}

fn record(strategy: BuildStrategy, outcome: &str, elapsed: Duration) {
    BUILDS_TOTAL
        .with_label_values(&[strategy.as_str(), outcome])
        .inc();
    BUILD_DURATION
        .with_label_values(&[strategy.as_str()])
        .observe(elapsed.as_secs_f64());
}

fn set_content_gauge(state: &BuildState) {
    CONTENT_FILES.set(i64::try_from(state.store.len()).unwrap_or(i64::MAX));
}
