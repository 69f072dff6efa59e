//! Ignore rules for the content directory.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::WatcherError;
use crate::Result;

/// Editor and OS files that are never part of a site.
const NOISE_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini", "4913"];

/// Gitignore-style matcher rooted at the content directory.
///
/// Combines the root's `.gitignore` with configured patterns. Hidden files,
/// editor swap files, excluded directories and anything outside the root are
/// always ignored.
#[derive(Debug)]
pub struct IgnoreFilter {
    root: PathBuf,
    gitignore: Gitignore,
    content_extensions: Vec<String>,
    excluded: Vec<PathBuf>,
}

impl IgnoreFilter {
    /// Build a filter for `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is invalid.
    pub fn new(
        root: impl AsRef<Path>,
        patterns: &[String],
        content_extensions: &[String],
    ) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut builder = GitignoreBuilder::new(&root);

        let gitignore_path = root.join(".gitignore");
        if gitignore_path.exists() {
            if let Some(e) = builder.add(&gitignore_path) {
                tracing::warn!(path = %gitignore_path.display(), error = %e, "Skipping unreadable .gitignore");
            }
        }

        for pattern in patterns {
            builder
                .add_line(None, pattern)
                .map_err(|e| WatcherError::Pattern(format!("{pattern}: {e}")))?;
        }

        let gitignore = builder
            .build()
            .map_err(|e| WatcherError::Pattern(e.to_string()))?;

        Ok(Self {
            root,
            gitignore,
            content_extensions: content_extensions.to_vec(),
            excluded: Vec::new(),
        })
    }

    /// Also ignore everything under `dir`. Used for an output directory
    /// that sits inside the content root.
    #[must_use]
    pub fn excluding(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded.push(dir.into());
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` is excluded from the build.
    #[must_use]
    pub fn is_ignored(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return true;
        };
        if relative.as_os_str().is_empty() {
            return true;
        }
        if self.excluded.iter().any(|dir| path.starts_with(dir)) {
            return true;
        }

        if relative
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        {
            return true;
        }

        if let Some(name) = relative.file_name().and_then(|n| n.to_str()) {
            if NOISE_FILES.contains(&name)
                || name.ends_with('~')
                || name.ends_with(".swp")
                || name.ends_with(".swx")
            {
                return true;
            }
        }

        self.gitignore
            .matched_path_or_any_parents(relative, false)
            .is_ignore()
    }

    /// Whether `path` has a content extension.
    #[must_use]
    pub fn is_content(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.content_extensions
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(ext))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn filter(root: &Path, patterns: &[&str]) -> IgnoreFilter {
        IgnoreFilter::new(root, &strings(patterns), &strings(&["md"])).unwrap()
    }

    #[test]
    fn test_patterns_match_directories() {
        let root = Path::new("/site/content");
        let filter = filter(root, &["private", ".obsidian", "*.tmp"]);

        assert!(filter.is_ignored(&root.join("private/secret.md")));
        assert!(filter.is_ignored(&root.join("notes/private/x.md")));
        assert!(filter.is_ignored(&root.join("draft.tmp")));
        assert!(!filter.is_ignored(&root.join("notes/a.md")));
    }

    #[test]
    fn test_hidden_noise_and_outside_root() {
        let root = Path::new("/site/content");
        let filter = filter(root, &[]);

        assert!(filter.is_ignored(&root.join(".obsidian/workspace.json")));
        assert!(filter.is_ignored(&root.join("notes/.a.md.swp")));
        assert!(filter.is_ignored(&root.join("a.md~")));
        assert!(filter.is_ignored(&root.join(".DS_Store")));
        assert!(filter.is_ignored(Path::new("/elsewhere/a.md")));
        assert!(filter.is_ignored(root));
    }

    #[test]
    fn test_excluded_output_inside_root() {
        let root = Path::new("/site");
        let filter = filter(root, &[]).excluding("/site/public");

        assert!(filter.is_ignored(Path::new("/site/public/a.html")));
        assert!(filter.is_ignored(Path::new("/site/public/static/contentIndex.json")));
        assert!(filter.is_ignored(Path::new("/site/public")));
        assert!(!filter.is_ignored(Path::new("/site/publications.md")));
        assert!(!filter.is_ignored(Path::new("/site/a.md")));
    }

    #[test]
    fn test_reads_root_gitignore() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".gitignore"), "*.log\nscratch/\n").unwrap();

        let filter = filter(tmp.path(), &[]);
        assert!(filter.is_ignored(&tmp.path().join("debug.log")));
        assert!(filter.is_ignored(&tmp.path().join("scratch/a.md")));
        assert!(!filter.is_ignored(&tmp.path().join("a.md")));
    }

    #[test]
    fn test_is_content() {
        let filter = filter(Path::new("/c"), &[]);
        assert!(filter.is_content(Path::new("/c/a.md")));
        assert!(filter.is_content(Path::new("/c/A.MD")));
        assert!(!filter.is_content(Path::new("/c/a.png")));
        assert!(!filter.is_content(Path::new("/c/README")));
    }
}
