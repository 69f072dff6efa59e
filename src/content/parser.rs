//! Markdown parsing into `ParsedContent`.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::document::{inlines, Block, Document, Frontmatter, Inline, Link, ParsedContent};
use super::slug::slug_for_link;
use super::FileIdentity;
use crate::build::{BuildContext, PerfTimer};
use crate::error::ParseError;
use crate::Result;

/// Turns source files into parsed content.
///
/// A failure on any file fails the whole call; callers decide whether that
/// is fatal (full build) or scoped to one rebuild attempt.
#[async_trait]
pub trait ContentParser: Send + Sync {
    /// Parse every file in `files`, in order.
    async fn parse(&self, ctx: &BuildContext, files: &[FileIdentity]) -> Result<Vec<ParsedContent>>;
}

/// Default parser for Markdown with a `key: value` frontmatter block.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownParser;

impl MarkdownParser {
    /// Create a new parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parse already-loaded source text for `identity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file lies outside the content root or its
    /// frontmatter is malformed.
    pub fn parse_source(
        ctx: &BuildContext,
        identity: &FileIdentity,
        source: &str,
    ) -> Result<ParsedContent> {
        let relative_path =
            identity
                .relative_to(&ctx.content_dir)
                .ok_or_else(|| ParseError::OutsideRoot {
                    path: identity.to_string(),
                })?;

        let (frontmatter, body) = split_frontmatter(identity, source)?;
        let document = parse_body(body, &ctx.config.content_extensions);

        Ok(ParsedContent {
            identity: identity.clone(),
            slug: ctx.slug_for(identity),
            relative_path,
            frontmatter,
            document,
        })
    }
}

#[async_trait]
impl ContentParser for MarkdownParser {
    async fn parse(&self, ctx: &BuildContext, files: &[FileIdentity]) -> Result<Vec<ParsedContent>> {
        let perf = PerfTimer::new();
        let mut parsed = Vec::with_capacity(files.len());

        for identity in files {
            let source = tokio::fs::read_to_string(identity.path())
                .await
                .map_err(|e| ParseError::read(identity, e))?;
            let content = Self::parse_source(ctx, identity, &source)?;

            if ctx.config.verbose {
                tracing::info!(path = %identity, slug = %content.slug, "Parsed file");
            }
            parsed.push(content);
        }

        tracing::info!(
            files = parsed.len(),
            elapsed_ms = perf.elapsed_ms(),
            "Parsed source files"
        );
        Ok(parsed)
    }
}

fn split_frontmatter<'a>(
    identity: &FileIdentity,
    source: &'a str,
) -> Result<(Frontmatter, &'a str)> {
    let Some(rest) = source
        .strip_prefix("---\n")
        .or_else(|| source.strip_prefix("---\r\n"))
    else {
        return Ok((Frontmatter::default(), source));
    };

    let mut fields: Vec<(String, Vec<String>)> = Vec::new();
    let mut offset = 0;

    for line in rest.split_inclusive('\n') {
        offset += line.len();
        let trimmed = line.trim_end();

        if trimmed == "---" {
            return Ok((build_frontmatter(fields), &rest[offset..]));
        }
        if trimmed.trim().is_empty() || trimmed.trim_start().starts_with('#') {
            continue;
        }

        if let Some(item) = trimmed.trim_start().strip_prefix("- ") {
            let Some((_, values)) = fields.last_mut() else {
                return Err(ParseError::malformed(identity, "list item without a key").into());
            };
            values.push(unquote(item).to_string());
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            return Err(ParseError::malformed(
                identity,
                format!("expected `key: value`, found `{trimmed}`"),
            )
            .into());
        };
        fields.push((key.trim().to_lowercase(), split_values(value)));
    }

    Err(ParseError::malformed(identity, "unterminated frontmatter").into())
}

fn split_values(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .unwrap_or(raw);
    raw.split(',')
        .map(|v| unquote(v).to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}

fn build_frontmatter(fields: Vec<(String, Vec<String>)>) -> Frontmatter {
    let mut fm = Frontmatter::default();
    let mut extra = BTreeMap::new();

    for (key, values) in fields {
        match key.as_str() {
            "title" => fm.title = Some(values.join(", ")).filter(|t| !t.is_empty()),
            "tags" => fm.tags = values,
            "aliases" => fm.aliases = values,
            "draft" => fm.draft = is_truthy(&values),
            "publish" => fm.publish = is_truthy(&values),
            _ => {
                extra.insert(key, values.join(", "));
            }
        }
    }

    fm.extra = extra;
    fm
}

fn is_truthy(values: &[String]) -> bool {
    values
        .first()
        .is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "yes" | "1"))
}

fn parse_body(body: &str, content_extensions: &[String]) -> Document {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
        } else if let Some(heading) = parse_heading(trimmed) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(heading);
        } else {
            paragraph.push(trimmed);
        }
    }
    flush_paragraph(&mut paragraph, &mut blocks);

    let links = blocks
        .iter()
        .flat_map(|b| match b {
            Block::Heading { text, .. } | Block::Paragraph(text) => inlines(text),
        })
        .filter_map(|inline| match inline {
            Inline::WikiLink {
                target,
                label,
                embed,
            } if !target.is_empty() => Some(Link {
                target: target.split('#').next().unwrap_or(target).to_string(),
                slug: slug_for_link(target, content_extensions),
                label: label.to_string(),
                embed,
            }),
            _ => None,
        })
        .collect();

    Document { blocks, links }
}

fn flush_paragraph(paragraph: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if !paragraph.is_empty() {
        blocks.push(Block::Paragraph(paragraph.join(" ")));
        paragraph.clear();
    }
}

fn parse_heading(line: &str) -> Option<Block> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let text = line[hashes..].strip_prefix(' ')?;
    Some(Block::Heading {
        level: u8::try_from(hashes).ok()?,
        text: text.trim().to_string(),
    })
}
