//! Filter stage: drops content by publishing policy.

use std::sync::Arc;

use super::ParsedContent;
use crate::build::BuildContext;
use crate::error::EmitError;
use crate::Result;

/// Decides whether a parsed file is published. Must be pure.
pub trait ContentFilter: Send + Sync {
    /// Unique plugin name.
    fn name(&self) -> &str;

    /// Keep `content` in the build.
    fn should_publish(&self, ctx: &BuildContext, content: &ParsedContent) -> bool;
}

/// Drops files with `draft: true`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoveDrafts;

impl ContentFilter for RemoveDrafts {
    fn name(&self) -> &str {
        "RemoveDrafts"
    }

    fn should_publish(&self, _ctx: &BuildContext, content: &ParsedContent) -> bool {
        !content.frontmatter.draft
    }
}

/// Keeps only files with `publish: true`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExplicitPublish;

impl ContentFilter for ExplicitPublish {
    fn name(&self) -> &str {
        "ExplicitPublish"
    }

    fn should_publish(&self, _ctx: &BuildContext, content: &ParsedContent) -> bool {
        content.frontmatter.publish
    }
}

/// Resolve filter plugins by name, in order.
///
/// # Errors
///
/// Returns an error for an unknown name.
pub fn filters_from_names(names: &[String]) -> Result<Vec<Arc<dyn ContentFilter>>> {
    names
        .iter()
        .map(|name| -> Result<Arc<dyn ContentFilter>> {
            match name.as_str() {
                "RemoveDrafts" => Ok(Arc::new(RemoveDrafts)),
                "ExplicitPublish" => Ok(Arc::new(ExplicitPublish)),
                other => Err(EmitError::UnknownPlugin(other.to_string()).into()),
            }
        })
        .collect()
}

/// Run every filter over `content`, keeping files all filters accept.
#[must_use]
pub fn filter_content(
    ctx: &BuildContext,
    filters: &[Arc<dyn ContentFilter>],
    content: Vec<Arc<ParsedContent>>,
) -> Vec<Arc<ParsedContent>> {
    let before = content.len();
    let kept: Vec<_> = content
        .into_iter()
        .filter(|c| filters.iter().all(|f| f.should_publish(ctx, c)))
        .collect();

    tracing::debug!(kept = kept.len(), dropped = before - kept.len(), "Filtered content");
    kept
}
