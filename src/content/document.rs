//! Parsed representation of a content file.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use super::{FileIdentity, Slug};

/// Metadata block at the top of a content file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Frontmatter {
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub aliases: Vec<String>,
    pub draft: bool,
    pub publish: bool,
    /// Keys without dedicated handling, kept verbatim.
    pub extra: BTreeMap<String, String>,
}

/// A reference from one content file to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Target as written, without alias or heading.
    pub target: String,
    /// Slug the target resolves to.
    pub slug: Slug,
    /// Display label (`[[target|label]]`), defaults to the target.
    pub label: String,
    /// `![[target]]` embeds rather than links.
    pub embed: bool,
}

/// One block of body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
}

/// Inline segment of block text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inline<'a> {
    Text(&'a str),
    WikiLink {
        target: &'a str,
        label: &'a str,
        embed: bool,
    },
}

/// Split block text into plain text and `[[wikilink]]` segments.
///
/// An unterminated `[[` is kept as text.
#[must_use]
pub fn inlines(text: &str) -> Vec<Inline<'_>> {
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("[[") {
        let Some(close) = rest[open + 2..].find("]]") else {
            break;
        };
        let embed = open > 0 && rest.as_bytes()[open - 1] == b'!';
        let text_end = if embed { open - 1 } else { open };
        if text_end > 0 {
            out.push(Inline::Text(&rest[..text_end]));
        }

        let inner = &rest[open + 2..open + 2 + close];
        let (target, label) = match inner.split_once('|') {
            Some((t, l)) => (t.trim(), l.trim()),
            None => (inner.trim(), inner.trim()),
        };
        out.push(Inline::WikiLink {
            target,
            label,
            embed,
        });
        rest = &rest[open + 2 + close + 2..];
    }

    if !rest.is_empty() {
        out.push(Inline::Text(rest));
    }
    out
}

/// Syntax representation of a content file's body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
    pub links: Vec<Link>,
}

impl Document {
    /// Plain text of the body with markup stripped, blocks separated by newlines.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| match b {
                Block::Heading { text, .. } | Block::Paragraph(text) => inlines(text)
                    .into_iter()
                    .map(|inline| match inline {
                        Inline::Text(t) => t,
                        Inline::WikiLink { label, .. } => label,
                    })
                    .collect::<String>(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// First heading of the document, if any.
    #[must_use]
    pub fn first_heading(&self) -> Option<&str> {
        self.blocks.iter().find_map(|b| match b {
            Block::Heading { text, .. } => Some(text.as_str()),
            Block::Paragraph(_) => None,
        })
    }
}

/// Result of parsing one content file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedContent {
    pub identity: FileIdentity,
    /// Path relative to the content root.
    pub relative_path: PathBuf,
    pub slug: Slug,
    pub frontmatter: Frontmatter,
    pub document: Document,
}

impl ParsedContent {
    /// Display title: frontmatter title, then first heading, then file name.
    #[must_use]
    pub fn title(&self) -> String {
        self.frontmatter
            .title
            .clone()
            .or_else(|| self.document.first_heading().map(str::to_string))
            .unwrap_or_else(|| self.slug.file_name().to_string())
    }
}
