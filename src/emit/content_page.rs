//! One HTML page per content file.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Emitter, OutputWriter, StaticResources};
use crate::build::BuildContext;
use crate::content::{inlines, slug_for_link, Block, FileIdentity, Inline, ParsedContent, Slug};
use crate::graph::DependencyGraph;
use crate::Result;

const PAGE_EXT: &str = ".html";

/// Path of the preview server's refresh stream.
pub const REFRESH_ROUTE: &str = "/__folio/refresh";

/// Writes `<slug>.html` for every content file.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentPage;

impl ContentPage {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Render the page for `content`.
    #[must_use]
    pub fn render(ctx: &BuildContext, content: &ParsedContent, resources: &StaticResources) -> String {
        let title = content.title();
        let mut html = String::with_capacity(1024);

        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(
            html,
            "<title>{} | {}</title>",
            escape_html(&title),
            escape_html(&ctx.config.site_title)
        );
        for css in &resources.css {
            let _ = writeln!(html, "<link rel=\"stylesheet\" href=\"{}\">", escape_html(css));
        }
        html.push_str("</head>\n<body>\n<article>\n");
        let _ = writeln!(html, "<h1>{}</h1>", escape_html(&title));

        if !content.frontmatter.tags.is_empty() {
            html.push_str("<ul class=\"tags\">");
            for tag in &content.frontmatter.tags {
                let _ = write!(
                    html,
                    "<li><a href=\"/tags/{}\">#{}</a></li>",
                    escape_html(tag),
                    escape_html(tag)
                );
            }
            html.push_str("</ul>\n");
        }

        for block in &content.document.blocks {
            match block {
                Block::Heading { level, text } => {
                    let level = (*level).clamp(1, 6);
                    let _ = writeln!(html, "<h{level}>{}</h{level}>", render_inline(ctx, text));
                }
                Block::Paragraph(text) => {
                    let _ = writeln!(html, "<p>{}</p>", render_inline(ctx, text));
                }
            }
        }

        html.push_str("</article>\n");
        for js in &resources.js {
            let _ = writeln!(html, "<script src=\"{}\"></script>", escape_html(js));
        }
        if ctx.config.serve {
            let _ = writeln!(
                html,
                "<script>new EventSource(\"{REFRESH_ROUTE}\").addEventListener(\"refresh\", () => location.reload());</script>"
            );
        }
        html.push_str("</body>\n</html>\n");
        html
    }
}

#[async_trait]
impl Emitter for ContentPage {
    fn name(&self) -> &str {
        "ContentPage"
    }

    async fn dependency_graph(
        &self,
        ctx: &BuildContext,
        content: &[Arc<ParsedContent>],
        _resources: &StaticResources,
    ) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::new();
        for c in content {
            let page = page_identity(ctx, &c.slug);
            // Whether a link resolves depends on its target existing
            for link in &c.document.links {
                if link.slug != c.slug {
                    graph.add_edge(ctx.link_identity(&link.slug), page.clone());
                }
            }
            graph.add_edge(c.identity.clone(), page);
        }
        Ok(graph)
    }

    async fn emit(
        &self,
        ctx: &BuildContext,
        content: &[Arc<ParsedContent>],
        resources: &StaticResources,
        writer: &OutputWriter,
    ) -> Result<Vec<FileIdentity>> {
        let mut written = Vec::with_capacity(content.len());
        for c in content {
            let html = Self::render(ctx, c, resources);
            written.push(writer.write(&c.slug, PAGE_EXT, html).await?);
        }
        Ok(written)
    }
}

fn page_identity(ctx: &BuildContext, slug: &Slug) -> FileIdentity {
    ctx.output_identity(slug, PAGE_EXT)
}

fn render_inline(ctx: &BuildContext, text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for part in inlines(text) {
        match part {
            Inline::Text(t) => out.push_str(&escape_html(t)),
            Inline::WikiLink {
                target,
                label,
                embed,
            } => {
                let slug = slug_for_link(target, &ctx.config.content_extensions);
                let class = if embed { "internal transclude" } else { "internal" };
                if ctx.all_slugs.contains(&slug) {
                    let _ = write!(
                        out,
                        "<a class=\"{class}\" href=\"/{}\">{}</a>",
                        escape_html(slug.as_str()),
                        escape_html(label)
                    );
                } else {
                    let _ = write!(
                        out,
                        "<a class=\"{class} broken\">{}</a>",
                        escape_html(label)
                    );
                }
            }
        }
    }
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
