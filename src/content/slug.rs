//! Slug derivation from content-relative paths.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// URL-safe identifier derived from a file's path, stable across rebuilds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive the slug for a path relative to the content root.
    ///
    /// Content files lose their extension; other files keep it so that
    /// `img/a.png` and `img/a.md` never collide.
    #[must_use]
    pub fn from_relative_path(relative: &Path, is_content: bool) -> Self {
        let mut segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                std::path::Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if is_content {
            if let Some(last) = segments.last_mut() {
                if let Some((stem, _)) = last.rsplit_once('.') {
                    if !stem.is_empty() {
                        *last = stem.to_string();
                    }
                }
            }
        }

        let slug = segments
            .iter()
            .map(|s| sluggify_segment(s))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        Self(slug)
    }

    /// Create a slug from an already canonical string.
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    /// The slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment of the slug.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sluggify_segment(segment: &str) -> String {
    segment
        .trim()
        .replace(' ', "-")
        .replace('&', "-and-")
        .replace('%', "-percent")
        .replace(['?', '#'], "")
}

/// Turn a wikilink target (`Some Note`, `notes/a.md`, `a#heading`) into a slug.
#[must_use]
pub fn slug_for_link(target: &str, content_extensions: &[String]) -> Slug {
    let target = target.split('#').next().unwrap_or_default().trim();
    let is_content = Path::new(target)
        .extension()
        .and_then(|e| e.to_str())
        .map_or(true, |ext| {
            content_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
        });
    Slug::from_relative_path(Path::new(target), is_content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_slug_drops_extension() {
        let slug = Slug::from_relative_path(Path::new("notes/My Note.md"), true);
        assert_eq!(slug.as_str(), "notes/My-Note");
        assert_eq!(slug.file_name(), "My-Note");
    }

    #[test]
    fn test_asset_slug_keeps_extension() {
        let slug = Slug::from_relative_path(Path::new("img/cat pic.png"), false);
        assert_eq!(slug.as_str(), "img/cat-pic.png");
    }

    #[test]
    fn test_special_characters() {
        let slug = Slug::from_relative_path(Path::new("Q&A: 100% done?.md"), true);
        assert_eq!(slug.as_str(), "Q-and-A:-100-percent-done");
    }

    #[test]
    fn test_index_keeps_name() {
        let slug = Slug::from_relative_path(Path::new("folder/index.md"), true);
        assert_eq!(slug.as_str(), "folder/index");
    }

    #[test]
    fn test_slug_for_link() {
        let exts = vec!["md".to_string()];
        assert_eq!(slug_for_link("Some Note", &exts).as_str(), "Some-Note");
        assert_eq!(slug_for_link("notes/a.md#intro", &exts).as_str(), "notes/a");
        assert_eq!(slug_for_link("img/a.png", &exts).as_str(), "img/a.png");
    }
}
