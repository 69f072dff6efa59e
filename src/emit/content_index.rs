//! Aggregated JSON index of all published content.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::{Emitter, OutputWriter, StaticResources};
use crate::build::BuildContext;
use crate::content::{FileIdentity, ParsedContent, Slug};
use crate::error::EmitError;
use crate::graph::DependencyGraph;
use crate::Result;

/// Slug of the index artifact, written with a `.json` extension.
pub const CONTENT_INDEX_SLUG: &str = "static/contentIndex";

/// One file's entry in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentIndexEntry {
    pub title: String,
    pub tags: Vec<String>,
    pub links: Vec<Slug>,
    pub content: String,
}

impl ContentIndexEntry {
    #[must_use]
    pub fn from_content(content: &ParsedContent) -> Self {
        let mut links: Vec<Slug> = content.document.links.iter().map(|l| l.slug.clone()).collect();
        links.sort();
        links.dedup();

        Self {
            title: content.title(),
            tags: content.frontmatter.tags.clone(),
            links,
            content: content.document.plain_text(),
        }
    }
}

/// Writes `static/contentIndex.json`, fed by every content file.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentIndex;

impl ContentIndex {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn index_identity(ctx: &BuildContext) -> FileIdentity {
        ctx.output_identity(&Slug::new(CONTENT_INDEX_SLUG), ".json")
    }
}

#[async_trait]
impl Emitter for ContentIndex {
    fn name(&self) -> &str {
        "ContentIndex"
    }

    async fn dependency_graph(
        &self,
        ctx: &BuildContext,
        content: &[Arc<ParsedContent>],
        _resources: &StaticResources,
    ) -> Result<DependencyGraph> {
        let index = Self::index_identity(ctx);
        let mut graph = DependencyGraph::new();
        for c in content {
            graph.add_edge(c.identity.clone(), index.clone());
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
        let index: BTreeMap<&Slug, ContentIndexEntry> = content
            .iter()
            .map(|c| (&c.slug, ContentIndexEntry::from_content(c)))
            .collect();

        let json = serde_json::to_string_pretty(&index)
            .map_err(|e| EmitError::failed(self.name(), e))?;
        let written = writer
            .write(&Slug::new(CONTENT_INDEX_SLUG), ".json", json)
            .await?;
        Ok(vec![written])
    }
}
