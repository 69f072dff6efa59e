//! Integration tests for full builds and both incremental rebuild strategies.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use folio::build::{BuildContext, BuildOrchestrator, EventOutcome, RebuildOutcome};
use folio::content::{FileIdentity, ParsedContent, Slug};
use folio::emit::{
    ContentIndex, ContentPage, Emitter, EmitterRegistry, OutputWriter, StaticResources,
};
use folio::graph::DependencyGraph;
use folio::watcher::WatchEvent;
use folio::{Config, Error, Result};
use tempfile::TempDir;

/// A content directory and an output directory side by side.
struct Site {
    _tmp: TempDir,
    content: PathBuf,
    output: PathBuf,
}

impl Site {
    fn new(files: &[(&str, &str)]) -> Self {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        let output = tmp.path().join("public");
        fs::create_dir_all(&content).unwrap();

        let site = Self {
            _tmp: tmp,
            content,
            output,
        };
        for (path, body) in files {
            site.write(path, body);
        }
        site
    }

    fn write(&self, relative: &str, body: &str) {
        let path = self.content.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn source(&self, relative: &str) -> PathBuf {
        self.content.join(relative)
    }

    fn artifact(&self, relative: &str) -> PathBuf {
        self.output.join(relative)
    }

    fn config(&self, fast_rebuild: bool) -> Config {
        let mut config = Config::for_dirs(&self.content, &self.output);
        config.fast_rebuild = fast_rebuild;
        config
    }

    fn orchestrator(&self, fast_rebuild: bool) -> BuildOrchestrator {
        BuildOrchestrator::new(self.config(fast_rebuild)).unwrap()
    }

    fn with_emitters(&self, fast_rebuild: bool, emitters: EmitterRegistry) -> BuildOrchestrator {
        self.orchestrator(fast_rebuild).with_emitters(emitters)
    }

    /// Every file under the output directory with its bytes.
    fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        walkdir::WalkDir::new(&self.output)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
            .collect()
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// Files tagged `indexed` feed one shared `index.json`; every other file
/// gets its own `<slug>.html`.
struct IndexOrPage;

impl IndexOrPage {
    fn is_indexed(content: &ParsedContent) -> bool {
        content.frontmatter.tags.iter().any(|t| t == "indexed")
    }
}

#[async_trait]
impl Emitter for IndexOrPage {
    fn name(&self) -> &str {
        "IndexOrPage"
    }

    async fn dependency_graph(
        &self,
        ctx: &BuildContext,
        content: &[Arc<ParsedContent>],
        _resources: &StaticResources,
    ) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::new();
        for c in content {
            let target = if Self::is_indexed(c) {
                ctx.output_identity(&Slug::new("index"), ".json")
            } else {
                ctx.output_identity(&c.slug, ".html")
            };
            graph.add_edge(c.identity.clone(), target);
        }
        Ok(graph)
    }

    async fn emit(
        &self,
        _ctx: &BuildContext,
        content: &[Arc<ParsedContent>],
        _resources: &StaticResources,
        writer: &OutputWriter,
    ) -> Result<Vec<FileIdentity>> {
        let (indexed, pages): (Vec<_>, Vec<_>) =
            content.iter().partition(|c| Self::is_indexed(c));

        let mut written = Vec::new();
        if !indexed.is_empty() {
            let index: BTreeMap<&str, String> = indexed
                .iter()
                .map(|c| (c.slug.as_str(), c.document.plain_text()))
                .collect();
            let json = serde_json::to_string(&index).map_err(|e| Error::internal(e.to_string()))?;
            written.push(writer.write(&Slug::new("index"), ".json", json).await?);
        }
        for page in pages {
            written.push(
                writer
                    .write(&page.slug, ".html", page.document.plain_text())
                    .await?,
            );
        }
        Ok(written)
    }
}

/// Describes every file but always fails to write.
struct Broken;

#[async_trait]
impl Emitter for Broken {
    fn name(&self) -> &str {
        "Broken"
    }

    async fn dependency_graph(
        &self,
        ctx: &BuildContext,
        content: &[Arc<ParsedContent>],
        _resources: &StaticResources,
    ) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::new();
        for c in content {
            graph.add_edge(c.identity.clone(), ctx.output_identity(&c.slug, ".broken"));
        }
        Ok(graph)
    }

    async fn emit(
        &self,
        _ctx: &BuildContext,
        _content: &[Arc<ParsedContent>],
        _resources: &StaticResources,
        _writer: &OutputWriter,
    ) -> Result<Vec<FileIdentity>> {
        Err(Error::internal("disk on fire"))
    }
}

/// Computes dependencies until told to fail, and writes nothing.
struct FlakyGraph(Arc<AtomicBool>);

#[async_trait]
impl Emitter for FlakyGraph {
    fn name(&self) -> &str {
        "FlakyGraph"
    }

    async fn dependency_graph(
        &self,
        ctx: &BuildContext,
        content: &[Arc<ParsedContent>],
        _resources: &StaticResources,
    ) -> Result<DependencyGraph> {
        if self.0.load(Ordering::SeqCst) {
            return Err(Error::internal("graph unavailable"));
        }
        let mut graph = DependencyGraph::new();
        for c in content {
            graph.add_edge(c.identity.clone(), ctx.output_identity(&c.slug, ".flaky"));
        }
        Ok(graph)
    }

    async fn emit(
        &self,
        _ctx: &BuildContext,
        _content: &[Arc<ParsedContent>],
        _resources: &StaticResources,
        _writer: &OutputWriter,
    ) -> Result<Vec<FileIdentity>> {
        Ok(Vec::new())
    }
}

/// Formatted log output collected in memory.
#[derive(Clone, Default)]
struct LogBuffer(Arc<parking_lot::Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run a full build at the default `info` level and return what it logged.
async fn build_logs(site: &Site, verbose: bool) -> String {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut config = site.config(false);
    config.verbose = verbose;
    BuildOrchestrator::new(config).unwrap().build().await.unwrap();
    logs.contents()
}

fn registry(emitters: Vec<Arc<dyn Emitter>>) -> EmitterRegistry {
    let mut registry = EmitterRegistry::new();
    for emitter in emitters {
        registry.register(emitter).unwrap();
    }
    registry
}

fn shared_index_site() -> Site {
    Site::new(&[
        ("a.md", "---\ntags: [indexed]\n---\nalpha one\n"),
        ("b.md", "---\ntags: [indexed]\n---\nbeta\n"),
        ("c.md", "gamma\n"),
    ])
}

fn applied(outcome: EventOutcome) -> folio::build::BuildReport {
    match outcome {
        EventOutcome::Applied(report) => report,
        EventOutcome::Ignored => panic!("event was ignored"),
    }
}

/// Editing one input of a shared artifact re-emits it from every input and
/// leaves unrelated artifacts alone.
#[tokio::test]
async fn test_fine_grained_edit_reemits_shared_artifact_only() {
    let site = shared_index_site();
    let orchestrator = site.with_emitters(true, registry(vec![Arc::new(IndexOrPage)]));
    orchestrator.build().await.unwrap();

    let index = FileIdentity::new(site.artifact("index.json"));
    let c_page = FileIdentity::new(site.artifact("c.html"));
    {
        let state = orchestrator.state().await;
        let graph = &state.graphs["IndexOrPage"];
        assert_eq!(graph.sources().len(), 3);
        assert_eq!(graph.leaves(), BTreeSet::from([index.clone(), c_page.clone()]));
    }

    // Anything that rewrites c.html would clobber this
    fs::write(c_page.path(), "sentinel").unwrap();

    site.write("a.md", "---\ntags: [indexed]\n---\nalpha two\n");
    let report = applied(
        orchestrator
            .apply_event(&WatchEvent::change(site.source("a.md")))
            .await
            .unwrap(),
    );

    assert_eq!(report.emitted, 1);
    assert!(report.is_success());
    assert!(!report.full_reemit);

    let json = read(index.path());
    assert!(json.contains("alpha two"));
    assert!(json.contains("beta"));
    assert!(!json.contains("alpha one"));
    assert_eq!(read(c_page.path()), "sentinel");
}

/// Deleting an input drops it from the graph and from the shared artifact.
#[tokio::test]
async fn test_fine_grained_delete_shrinks_working_set() {
    let site = shared_index_site();
    let orchestrator = site.with_emitters(true, registry(vec![Arc::new(IndexOrPage)]));
    orchestrator.build().await.unwrap();

    let a = FileIdentity::new(site.source("a.md"));
    let b = FileIdentity::new(site.source("b.md"));
    {
        let state = orchestrator.state().await;
        assert_eq!(
            state.graphs["IndexOrPage"].get_upstreams_of_downstream_leaf_nodes(&a),
            BTreeSet::from([a.clone(), b.clone()])
        );
    }

    fs::remove_file(b.path()).unwrap();
    orchestrator
        .apply_event(&WatchEvent::delete(b.path()))
        .await
        .unwrap();

    let state = orchestrator.state().await;
    let graph = &state.graphs["IndexOrPage"];
    assert!(!graph.has_node(&b));
    assert_eq!(
        graph.get_upstreams_of_downstream_leaf_nodes(&a),
        BTreeSet::from([a])
    );
    assert!(!state.store.contains(&b));

    let json = read(&site.artifact("index.json"));
    assert!(json.contains("alpha one"));
    assert!(!json.contains("beta"));
}

/// Deleting the only input of an artifact deletes the artifact.
#[tokio::test]
async fn test_fine_grained_delete_removes_orphaned_page() {
    let site = Site::new(&[("a.md", "# A\n"), ("notes/b.md", "# B\n")]);
    let orchestrator = site.orchestrator(true);
    orchestrator.build().await.unwrap();
    assert!(site.artifact("notes/b.html").exists());

    fs::remove_file(site.source("notes/b.md")).unwrap();
    let report = applied(
        orchestrator
            .apply_event(&WatchEvent::delete(site.source("notes/b.md")))
            .await
            .unwrap(),
    );

    assert_eq!(report.removed, 1);
    assert!(!site.artifact("notes/b.html").exists());
    assert!(site.artifact("a.html").exists());

    let index = read(&site.artifact("static/contentIndex.json"));
    assert!(index.contains("\"a\""));
    assert!(!index.contains("notes/b"));
}

/// Removing then re-adding a file yields the same graphs as a fresh build.
#[tokio::test]
async fn test_remove_then_readd_matches_full_build() {
    let site = Site::new(&[
        ("a.md", "# A\nsee [[b]]\n"),
        ("b.md", "# B\n"),
        ("sub/c.md", "# C\n"),
    ]);
    let orchestrator = site.orchestrator(true);
    orchestrator.build().await.unwrap();

    fs::remove_file(site.source("b.md")).unwrap();
    orchestrator
        .apply_event(&WatchEvent::delete(site.source("b.md")))
        .await
        .unwrap();
    site.write("b.md", "# B\n");
    orchestrator
        .apply_event(&WatchEvent::add(site.source("b.md")))
        .await
        .unwrap();

    let fresh = site.orchestrator(true);
    fresh.build().await.unwrap();

    let incremental = orchestrator.state().await;
    let from_scratch = fresh.state().await;
    assert_eq!(
        incremental.graphs.keys().collect::<Vec<_>>(),
        from_scratch.graphs.keys().collect::<Vec<_>>()
    );
    for (name, graph) in &from_scratch.graphs {
        assert_eq!(incremental.graphs[name].edges(), graph.edges(), "{name}");
    }
}

/// Building twice without changes writes identical bytes.
#[tokio::test]
async fn test_full_build_is_idempotent() {
    let site = Site::new(&[
        ("a.md", "---\ntitle: Alpha\ntags: [x, y]\n---\n# Alpha\nlinks to [[b]] and [[missing]]\n"),
        ("b.md", "# B\n"),
    ]);
    let orchestrator = site.orchestrator(false);

    orchestrator.build().await.unwrap();
    let first = site.snapshot();
    orchestrator.build().await.unwrap();
    let second = site.snapshot();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

/// Two queued debounced requests for the same file collapse into one
/// rebuild reflecting the later content.
#[tokio::test]
async fn test_debounced_requests_collapse_to_latest() {
    let site = Site::new(&[("a.md", "# A\nversion zero\n")]);
    let orchestrator = Arc::new(site.orchestrator(false));
    orchestrator.build().await.unwrap();

    let guard = orchestrator.lock_rebuilds().await;

    let spawn_request = |event: WatchEvent| {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.request_rebuild(&event).await })
    };

    site.write("a.md", "# A\nversion one\n");
    let first = spawn_request(WatchEvent::change(site.source("a.md")));
    while orchestrator.latest_request() < 1 {
        tokio::task::yield_now().await;
    }

    site.write("a.md", "# A\nversion two\n");
    let second = spawn_request(WatchEvent::change(site.source("a.md")));
    while orchestrator.latest_request() < 2 {
        tokio::task::yield_now().await;
    }

    drop(guard);
    let outcomes = [first.await.unwrap(), second.await.unwrap()];

    let superseded = outcomes
        .iter()
        .filter(|o| matches!(o, RebuildOutcome::Superseded))
        .count();
    let rebuilt: Vec<_> = outcomes
        .iter()
        .filter_map(|o| match o {
            RebuildOutcome::Rebuilt(report) => Some(report),
            _ => None,
        })
        .collect();

    assert_eq!(superseded, 1);
    assert_eq!(rebuilt.len(), 1);
    assert_eq!(rebuilt[0].parsed, 1);

    let page = read(&site.artifact("a.html"));
    assert!(page.contains("version two"));
    assert!(!page.contains("version one"));
}

/// A debounced delete removes the file from the store and the output.
#[tokio::test]
async fn test_debounced_delete() {
    let site = Site::new(&[("a.md", "# A\n"), ("b.md", "# B\n")]);
    let orchestrator = site.orchestrator(false);
    orchestrator.build().await.unwrap();

    fs::remove_file(site.source("b.md")).unwrap();
    let outcome = orchestrator
        .request_rebuild(&WatchEvent::delete(site.source("b.md")))
        .await;

    assert!(matches!(outcome, RebuildOutcome::Rebuilt(_)));
    assert!(!site.artifact("b.html").exists());
    assert!(site.artifact("a.html").exists());
    assert_eq!(orchestrator.state().await.store.len(), 1);
}

/// Non-content changes in debounced mode only touch the asset set.
#[tokio::test]
async fn test_debounced_asset_change_skips_rebuild() {
    let site = Site::new(&[("a.md", "# A\n")]);
    let orchestrator = site.orchestrator(false);
    orchestrator.build().await.unwrap();
    let refreshes = orchestrator.refresh().count();

    site.write("images/cat.png", "png");
    let outcome = orchestrator
        .request_rebuild(&WatchEvent::add(site.source("images/cat.png")))
        .await;

    assert!(matches!(outcome, RebuildOutcome::AssetTracked));
    assert_eq!(orchestrator.latest_request(), 0);
    assert_eq!(orchestrator.refresh().count(), refreshes + 1);
    assert!(orchestrator
        .state()
        .await
        .tracked_assets
        .contains(&FileIdentity::new(site.source("images/cat.png"))));
}

/// One failing emitter does not stop the others, in any build path.
#[tokio::test]
async fn test_emitter_failure_is_isolated() {
    let site = Site::new(&[("a.md", "# A\none\n")]);
    let emitters = registry(vec![Arc::new(Broken), Arc::new(ContentPage::new())]);
    let orchestrator = site.with_emitters(true, emitters);

    let report = orchestrator.build().await.unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].emitter(), Some("Broken"));
    assert!(site.artifact("a.html").exists());

    let refreshes = orchestrator.refresh().count();
    site.write("a.md", "# A\ntwo\n");
    let report = applied(
        orchestrator
            .apply_event(&WatchEvent::change(site.source("a.md")))
            .await
            .unwrap(),
    );

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.emitted, 1);
    assert!(read(&site.artifact("a.html")).contains("two"));
    assert_eq!(orchestrator.refresh().count(), refreshes + 1);
}

/// A parse failure aborts only that event and keeps the previous output.
#[tokio::test]
async fn test_parse_failure_keeps_previous_output() {
    let site = Site::new(&[("a.md", "---\ntitle: Good\n---\nbody\n")]);
    let a = FileIdentity::new(site.source("a.md"));

    for fast_rebuild in [true, false] {
        let orchestrator = site.orchestrator(fast_rebuild);
        orchestrator.build().await.unwrap();
        let before = read(&site.artifact("a.html"));

        site.write("a.md", "---\ntitle: Broken\nbody without a closing fence\n");
        let event = WatchEvent::change(a.path());
        if fast_rebuild {
            let err = orchestrator.apply_event(&event).await.unwrap_err();
            assert!(err.to_string().contains("frontmatter"));
        } else {
            let outcome = orchestrator.request_rebuild(&event).await;
            assert!(matches!(outcome, RebuildOutcome::Failed(_)));
        }

        assert_eq!(read(&site.artifact("a.html")), before);
        let stored = orchestrator.state().await.store.get(&a).unwrap();
        assert_eq!(stored.frontmatter.title.as_deref(), Some("Good"));

        site.write("a.md", "---\ntitle: Good\n---\nbody\n");
    }
}

/// A working set naming content the store lost triggers a full re-emit.
#[tokio::test]
async fn test_graph_inconsistency_falls_back_to_full_reemit() {
    let site = Site::new(&[("a.md", "# A\n"), ("b.md", "# B\n")]);
    let orchestrator = site.orchestrator(true);
    orchestrator.build().await.unwrap();

    let b = FileIdentity::new(site.source("b.md"));
    orchestrator.state().await.store.remove(&b);

    site.write("a.md", "# A\nedited\n");
    let report = applied(
        orchestrator
            .apply_event(&WatchEvent::change(site.source("a.md")))
            .await
            .unwrap(),
    );

    assert!(report.full_reemit);
    assert!(read(&site.artifact("a.html")).contains("edited"));
    assert!(!site.artifact("b.html").exists());

    let state = orchestrator.state().await;
    assert!(!state.graphs["ContentIndex"].has_node(&b));
}

/// Drafts never reach emitters, and toggling `draft` in place removes and
/// restores their pages.
#[tokio::test]
async fn test_draft_toggle_in_fine_grained_mode() {
    let site = Site::new(&[
        ("a.md", "# A\n"),
        ("wip.md", "---\ndraft: true\n---\n# Work in progress\n"),
    ]);
    let orchestrator = site.orchestrator(true);
    orchestrator.build().await.unwrap();

    assert!(site.artifact("a.html").exists());
    assert!(!site.artifact("wip.html").exists());
    assert!(!read(&site.artifact("static/contentIndex.json")).contains("wip"));

    site.write("wip.md", "# Work in progress\n");
    orchestrator
        .apply_event(&WatchEvent::change(site.source("wip.md")))
        .await
        .unwrap();
    assert!(site.artifact("wip.html").exists());
    assert!(read(&site.artifact("static/contentIndex.json")).contains("wip"));

    site.write("a.md", "---\ndraft: true\n---\n# A\n");
    let report = applied(
        orchestrator
            .apply_event(&WatchEvent::change(site.source("a.md")))
            .await
            .unwrap(),
    );
    assert_eq!(report.removed, 1);
    assert!(!site.artifact("a.html").exists());
    assert!(!read(&site.artifact("static/contentIndex.json")).contains("\"a\""));
}

/// Ignored paths never produce work or refresh signals.
#[tokio::test]
async fn test_ignored_events_do_nothing() {
    let site = Site::new(&[("a.md", "# A\n"), ("private/secret.md", "# S\n")]);
    let orchestrator = site.orchestrator(true);
    orchestrator.build().await.unwrap();
    assert!(!site.artifact("private/secret.html").exists());

    let refreshes = orchestrator.refresh().count();
    let outcome = orchestrator
        .apply_event(&WatchEvent::change(site.source("private/secret.md")))
        .await
        .unwrap();
    assert!(matches!(outcome, EventOutcome::Ignored));

    let outcome = orchestrator
        .request_rebuild(&WatchEvent::change(site.source(".obsidian/workspace.json")))
        .await;
    assert!(matches!(outcome, RebuildOutcome::Ignored));
    assert_eq!(orchestrator.refresh().count(), refreshes);
}

/// Adding and deleting a link target re-renders the linking page without a
/// full re-emit, and the result matches a fresh build.
#[tokio::test]
async fn test_fine_grained_link_target_add_and_delete() {
    let site = Site::new(&[("a.md", "# A\nsee [[b]]\n")]);
    let orchestrator = site.orchestrator(true);
    orchestrator.build().await.unwrap();
    let page = site.artifact("a.html");
    assert!(read(&page).contains("<a class=\"internal broken\">b</a>"));

    // A link to a missing file is not a graph inconsistency
    site.write("a.md", "# A\nstill see [[b]]\n");
    let report = applied(
        orchestrator
            .apply_event(&WatchEvent::change(site.source("a.md")))
            .await
            .unwrap(),
    );
    assert!(!report.full_reemit);
    assert!(read(&page).contains("still see"));

    site.write("b.md", "# B\n");
    let report = applied(
        orchestrator
            .apply_event(&WatchEvent::add(site.source("b.md")))
            .await
            .unwrap(),
    );
    assert!(!report.full_reemit);
    assert!(read(&page).contains("<a class=\"internal\" href=\"/b\">b</a>"));
    assert!(site.artifact("b.html").exists());

    let incremental = site.snapshot();
    site.orchestrator(true).build().await.unwrap();
    assert_eq!(site.snapshot(), incremental);

    fs::remove_file(site.source("b.md")).unwrap();
    let report = applied(
        orchestrator
            .apply_event(&WatchEvent::delete(site.source("b.md")))
            .await
            .unwrap(),
    );
    assert!(!report.full_reemit);
    assert!(read(&page).contains("<a class=\"internal broken\">b</a>"));
    assert!(!site.artifact("b.html").exists());

    let incremental = site.snapshot();
    site.orchestrator(true).build().await.unwrap();
    assert_eq!(site.snapshot(), incremental);
}

/// Changing which files a page links to moves its link edges.
#[tokio::test]
async fn test_fine_grained_relink_updates_graph() {
    let site = Site::new(&[("a.md", "see [[b]]\n"), ("b.md", "# B\n"), ("c.md", "# C\n")]);
    let orchestrator = site.orchestrator(true);
    orchestrator.build().await.unwrap();

    site.write("a.md", "see [[c]]\n");
    orchestrator
        .apply_event(&WatchEvent::change(site.source("a.md")))
        .await
        .unwrap();

    let fresh = site.orchestrator(true);
    fresh.build().await.unwrap();
    let incremental = orchestrator.state().await;
    let from_scratch = fresh.state().await;
    assert_eq!(
        incremental.graphs["ContentPage"].edges(),
        from_scratch.graphs["ContentPage"].edges()
    );
}

/// An output directory inside the content root never feeds back into the
/// build.
#[tokio::test]
async fn test_output_inside_content_is_not_a_source() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("site");
    let output = root.join("public");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.md"), "# A\n").unwrap();

    let mut config = Config::for_dirs(&root, &output);
    config.fast_rebuild = true;
    let orchestrator = BuildOrchestrator::new(config).unwrap();
    orchestrator.build().await.unwrap();
    orchestrator.build().await.unwrap();
    assert!(output.join("a.html").exists());

    {
        let state = orchestrator.state().await;
        assert_eq!(state.store.len(), 1);
        assert!(state.tracked_assets.is_empty());
        assert_eq!(state.known_slugs, BTreeSet::from([Slug::new("a")]));
    }

    let refreshes = orchestrator.refresh().count();
    let outcome = orchestrator
        .apply_event(&WatchEvent::change(output.join("a.html")))
        .await
        .unwrap();
    assert!(matches!(outcome, EventOutcome::Ignored));
    let outcome = orchestrator
        .request_rebuild(&WatchEvent::add(output.join("static/contentIndex.json")))
        .await;
    assert!(matches!(outcome, RebuildOutcome::Ignored));
    assert_eq!(orchestrator.refresh().count(), refreshes);
}

/// A failed full re-emit after a graph inconsistency is reported and still
/// refreshes clients.
#[tokio::test]
async fn test_failed_inconsistency_fallback_still_refreshes() {
    let site = Site::new(&[("a.md", "# A\n"), ("b.md", "# B\n")]);
    let fail = Arc::new(AtomicBool::new(false));
    let emitters = registry(vec![
        Arc::new(ContentIndex::new()),
        Arc::new(FlakyGraph(Arc::clone(&fail))),
    ]);
    let orchestrator = site.with_emitters(true, emitters);
    orchestrator.build().await.unwrap();

    let b = FileIdentity::new(site.source("b.md"));
    orchestrator.state().await.store.remove(&b);
    fail.store(true, Ordering::SeqCst);
    let refreshes = orchestrator.refresh().count();

    site.write("a.md", "# A\nedited\n");
    let err = orchestrator
        .apply_event(&WatchEvent::change(site.source("a.md")))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("graph unavailable"));
    assert_eq!(orchestrator.refresh().count(), refreshes + 1);
}

/// `--verbose` output shows at the default level: the plugin listing and one
/// line per artifact.
#[tokio::test]
async fn test_verbose_build_lists_plugins_and_artifacts() {
    let site = Site::new(&[("a.md", "# A\n")]);

    let quiet = build_logs(&site, false).await;
    assert!(quiet.contains("Starting full build"));
    assert!(!quiet.contains("Loaded plugins"));
    assert!(!quiet.contains("[emit:"));

    let verbose = build_logs(&site, true).await;
    assert!(verbose.contains("Loaded plugins"));
    assert!(verbose.contains("RemoveDrafts"));
    assert!(verbose.contains("ContentPage, ContentIndex, Static"));
    assert!(verbose.contains(&format!(
        "[emit:ContentPage] {}",
        site.artifact("a.html").display()
    )));
    assert!(verbose.contains("Parsed file"));
}
