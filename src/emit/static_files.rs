//! Copies the configured static directory into `<output>/static`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use walkdir::WalkDir;

use super::{url_path, Emitter, OutputWriter, StaticResources};
use crate::build::BuildContext;
use crate::content::{FileIdentity, ParsedContent};
use crate::error::EmitError;
use crate::graph::DependencyGraph;
use crate::Result;

const STATIC_PREFIX: &str = "static";

/// Static-directory copier. Independent of the content subset it is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticFiles;

impl StaticFiles {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Files of the static directory as `(source, path relative to it)`, sorted.
    fn files(&self, ctx: &BuildContext) -> Result<Vec<(PathBuf, PathBuf)>> {
        let Some(dir) = ctx.static_dir.as_deref() else {
            return Ok(Vec::new());
        };
        if !dir.is_dir() {
            tracing::warn!(path = %dir.display(), "Static directory does not exist");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| EmitError::failed(self.name(), e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(dir) {
                files.push((entry.path().to_path_buf(), relative.to_path_buf()));
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl Emitter for StaticFiles {
    fn name(&self) -> &str {
        "Static"
    }

    async fn dependency_graph(
        &self,
        ctx: &BuildContext,
        _content: &[Arc<ParsedContent>],
        _resources: &StaticResources,
    ) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::new();
        for (source, relative) in self.files(ctx)? {
            graph.add_edge(
                FileIdentity::new(source),
                FileIdentity::under(&ctx.output_dir, format!("{STATIC_PREFIX}/{}", url_path(&relative))),
            );
        }
        Ok(graph)
    }

    async fn emit(
        &self,
        ctx: &BuildContext,
        _content: &[Arc<ParsedContent>],
        _resources: &StaticResources,
        writer: &OutputWriter,
    ) -> Result<Vec<FileIdentity>> {
        let mut written = Vec::new();
        for (source, relative) in self.files(ctx)? {
            written.push(
                writer
                    .copy(&source, &PathBuf::from(STATIC_PREFIX).join(relative))
                    .await?,
            );
        }
        Ok(written)
    }
}
