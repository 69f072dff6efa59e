//! Emitters turn filtered content into output artifacts.
//!
//! Each emitter also describes which source files feed which of its
//! artifacts, so that a change to one file can be mapped to the minimal
//! set of artifacts to rewrite.

mod content_index;
mod content_page;
mod pipeline;
mod registry;
mod static_files;
mod writer;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::build::BuildContext;
use crate::content::{FileIdentity, ParsedContent};
use crate::graph::DependencyGraph;
use crate::Result;

pub use content_index::{ContentIndex, ContentIndexEntry, CONTENT_INDEX_SLUG};
pub use content_page::{ContentPage, REFRESH_ROUTE};
pub use pipeline::{emit_content, run_emitter, EmitSummary};
pub use registry::EmitterRegistry;
pub use static_files::StaticFiles;
pub use writer::OutputWriter;

/// Produces artifacts for any subset of the filtered content.
#[async_trait]
pub trait Emitter: Send + Sync {
    /// Unique plugin name.
    fn name(&self) -> &str;

    /// Edges from the given sources to the artifacts this emitter derives
    /// from them. Must not touch the filesystem under the output directory.
    async fn dependency_graph(
        &self,
        ctx: &BuildContext,
        content: &[Arc<ParsedContent>],
        resources: &StaticResources,
    ) -> Result<DependencyGraph>;

    /// Write artifacts for exactly `content`, returning what was written.
    async fn emit(
        &self,
        ctx: &BuildContext,
        content: &[Arc<ParsedContent>],
        resources: &StaticResources,
        writer: &OutputWriter,
    ) -> Result<Vec<FileIdentity>>;
}

/// Stylesheets and scripts every page links to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticResources {
    pub css: Vec<String>,
    pub js: Vec<String>,
}

impl StaticResources {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect `.css` and `.js` files of the static directory as
    /// `/static/...` URLs, sorted.
    #[must_use]
    pub fn from_static_dir(static_dir: Option<&Path>) -> Self {
        let mut resources = Self::default();
        let Some(dir) = static_dir else {
            return resources;
        };

        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let Ok(relative) = entry.path().strip_prefix(dir) else {
                continue;
            };
            let url = format!("/static/{}", url_path(relative));
            match entry.path().extension().and_then(|e| e.to_str()) {
                Some("css") => resources.css.push(url),
                Some("js") => resources.js.push(url),
                _ => {}
            }
        }

        resources
    }
}

/// Forward-slash form of a relative path.
pub(crate) fn url_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
