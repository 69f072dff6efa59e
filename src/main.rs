//! Folio - Incremental static site builder
//!
//! Entry point for the `folio` binary.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use folio::build::BuildOrchestrator;
use folio::config::{DEFAULT_EMITTERS, DEFAULT_FILTERS, DEFAULT_IGNORE_PATTERNS};
use folio::server::{init_metrics, init_tracing, App, ServerConfig};
use folio::watcher::{serve_events, FileWatcher, EVENT_QUEUE_CAPACITY};
use folio::Config;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Folio - Incremental static site builder
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Content directory to build
    #[arg(short = 'd', long, env = "FOLIO_DIRECTORY", default_value = "./content")]
    directory: PathBuf,

    /// Output directory for generated files
    #[arg(short, long, env = "FOLIO_OUTPUT", default_value = "./public")]
    output: PathBuf,

    /// Directory copied to `<output>/static`
    #[arg(long, env = "FOLIO_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Gitignore-style patterns excluded from the build
    #[arg(
        long,
        env = "FOLIO_IGNORE",
        value_delimiter = ',',
        default_values_t = to_strings(DEFAULT_IGNORE_PATTERNS)
    )]
    ignore: Vec<String>,

    /// Rebuild only the artifacts affected by each change
    #[arg(long, env = "FOLIO_FAST_REBUILD")]
    fast_rebuild: bool,

    /// Serve the output and rebuild on changes
    #[arg(long, env = "FOLIO_SERVE")]
    serve: bool,

    /// Log every emitted file
    #[arg(short, long, env = "FOLIO_VERBOSE")]
    verbose: bool,

    /// Host address to bind to
    #[arg(long, env = "FOLIO_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "FOLIO_PORT", default_value = "8080")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "FOLIO_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "FOLIO_LOG_JSON")]
    log_json: bool,

    /// Ordered filter plugins
    #[arg(
        long,
        env = "FOLIO_FILTERS",
        value_delimiter = ',',
        default_values_t = to_strings(DEFAULT_FILTERS)
    )]
    filters: Vec<String>,

    /// Ordered emitter plugins
    #[arg(
        long,
        env = "FOLIO_EMITTERS",
        value_delimiter = ',',
        default_values_t = to_strings(DEFAULT_EMITTERS)
    )]
    emitters: Vec<String>,

    /// Site title
    #[arg(long, env = "FOLIO_TITLE", default_value = "Folio")]
    title: String,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            content_dir: cli.directory,
            output_dir: cli.output,
            static_dir: cli.static_dir,
            ignore_patterns: cli.ignore,
            fast_rebuild: cli.fast_rebuild,
            serve: cli.serve,
            verbose: cli.verbose,
            host: cli.host,
            port: cli.port,
            log_level: cli.log_level,
            log_json: cli.log_json,
            filters: cli.filters,
            emitters: cli.emitters,
            site_title: cli.title,
            ..Self::default()
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.log_json);

    tracing::info!("Folio v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from(cli);
    tracing::debug!(?config, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Fatal error: {e:#}");
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    init_metrics();

    let server_config = ServerConfig::from(&config);
    let serve = config.serve;

    let orchestrator = Arc::new(
        BuildOrchestrator::new(config).context("failed to set up the build")?,
    );

    let report = orchestrator
        .build()
        .await
        .context("initial build failed")?;

    if !report.is_success() {
        tracing::warn!(
            failures = report.failures.len(),
            "Initial build finished with emitter failures"
        );
    }

    if !serve {
        return Ok(());
    }

    let content_dir = orchestrator.context().content_dir.clone();
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let _watcher = FileWatcher::new(&content_dir, tx)
        .with_context(|| format!("failed to watch {}", content_dir.display()))?;

    tracing::info!(
        path = %content_dir.display(),
        fast_rebuild = orchestrator.fast_rebuild(),
        "Watching for changes"
    );

    let cancel = CancellationToken::new();
    let watch_loop = tokio::spawn(serve_events(
        Arc::clone(&orchestrator),
        rx,
        cancel.clone(),
    ));

    let served = App::new(server_config, orchestrator)
        .run(cancel.clone())
        .await
        .context("preview server failed");

    cancel.cancel();
    match watch_loop.await {
        Ok(stats) => tracing::info!(?stats, "Watch loop stopped"),
        Err(e) => tracing::error!(error = %e, "Watch loop panicked"),
    }

    served
}
