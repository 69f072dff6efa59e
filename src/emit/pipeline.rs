//! Runs emitters with per-emitter failure isolation.

use std::sync::Arc;

use super::{Emitter, EmitterRegistry, OutputWriter, StaticResources};
use crate::build::{BuildContext, PerfTimer};
use crate::content::{FileIdentity, ParsedContent};
use crate::error::EmitError;
use crate::server::metrics::{EMITTED_FILES, EMIT_FAILURES};
use crate::Error;

/// Outcome of running a set of emitters over one content set.
#[derive(Debug, Default)]
pub struct EmitSummary {
    /// Artifacts written, in emitter order.
    pub written: Vec<FileIdentity>,
    /// One entry per failed emitter.
    pub failures: Vec<EmitError>,
}

impl EmitSummary {
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.written.len()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn absorb(&mut self, result: std::result::Result<Vec<FileIdentity>, EmitError>) {
        match result {
            Ok(mut written) => self.written.append(&mut written),
            Err(e) => self.failures.push(e),
        }
    }
}

/// Run one emitter, tagging any failure with its name.
///
/// # Errors
///
/// Returns the emitter's failure; nothing is retried.
pub async fn run_emitter(
    emitter: &dyn Emitter,
    ctx: &BuildContext,
    content: &[Arc<ParsedContent>],
    resources: &StaticResources,
    writer: &OutputWriter,
) -> std::result::Result<Vec<FileIdentity>, EmitError> {
    let name = emitter.name();
    let perf = PerfTimer::new();

    match emitter.emit(ctx, content, resources, writer).await {
        Ok(written) => {
            EMITTED_FILES
                .with_label_values(&[name])
                .inc_by(u64::try_from(written.len()).unwrap_or(u64::MAX));
            if ctx.config.verbose {
                for artifact in &written {
                    tracing::info!(emitter = name, path = %artifact, "[emit:{name}] {artifact}");
                }
            }
            tracing::debug!(
                emitter = name,
                inputs = content.len(),
                files = written.len(),
                elapsed_ms = perf.elapsed_ms(),
                "Emitter finished"
            );
            Ok(written)
        }
        Err(e) => {
            EMIT_FAILURES.with_label_values(&[name]).inc();
            let err = match e {
                Error::Emit(inner) if inner.emitter() == Some(name) => inner,
                other => EmitError::failed(name, other),
            };
            tracing::error!(
                emitter = name,
                error = %err,
                elapsed_ms = perf.elapsed_ms(),
                "Emitter failed"
            );
            Err(err)
        }
    }
}

/// Run every registered emitter over `content`. A failing emitter does not
/// stop the others.
pub async fn emit_content(
    ctx: &BuildContext,
    emitters: &EmitterRegistry,
    content: &[Arc<ParsedContent>],
    resources: &StaticResources,
    writer: &OutputWriter,
) -> EmitSummary {
    let perf = PerfTimer::new();
    let mut summary = EmitSummary::default();

    for emitter in emitters.iter() {
        let result = run_emitter(emitter.as_ref(), ctx, content, resources, writer).await;
        summary.absorb(result);
    }

    tracing::info!(
        files = summary.emitted(),
        failures = summary.failures.len(),
        output = %writer.output_dir().display(),
        elapsed_ms = perf.elapsed_ms(),
        "Emitted files"
    );
    summary
}
